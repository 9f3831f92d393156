fn main() {
    println!("cargo:rerun-if-changed=config/node.json");

    // Host builds (tests, tooling) carry no ESP-IDF environment.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
