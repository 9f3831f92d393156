//! WiFi station-mode bring-up.
//!
//! Credentials come from [`WifiConfig`] and are checked on every target;
//! the actual association only exists on `target_os = "espidf"`.
//!
//! ## Retry policy
//!
//! A failed association waits an exponential backoff (2 s → 4 s → 8 s …
//! capped at 60 s) before the next attempt.  The node has nothing useful
//! to do without the broker, so bring-up keeps trying.

use core::fmt;

use crate::config::WifiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

impl core::error::Error for WifiError {}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Reject credentials the WiFi stack would refuse anyway.
pub fn validate(wifi: &WifiConfig) -> Result<(), WifiError> {
    let ssid = wifi.ssid.as_str();
    if ssid.is_empty() || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    let password = wifi.password.as_str();
    if !password.is_empty() && password.len() < 8 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

/// Delay before the next attempt after `backoff_secs`.
pub fn next_backoff(backoff_secs: u32) -> u32 {
    backoff_secs.saturating_mul(2).min(MAX_BACKOFF_SECS)
}

#[cfg(target_os = "espidf")]
pub use esp::connect_station;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use anyhow::anyhow;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{INITIAL_BACKOFF_SECS, next_backoff, validate};
    use crate::config::WifiConfig;

    /// Associate with the configured access point and wait for an address.
    pub fn connect_station(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        creds: &WifiConfig,
    ) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
        validate(creds)?;

        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;

        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi ssid too long"))?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi password too long"))?,
            auth_method,
            ..Default::default()
        }))?;

        wifi.start()?;
        info!("WiFi: connecting to '{}'", creds.ssid);

        let mut backoff = INITIAL_BACKOFF_SECS;
        let mut attempt = 1u32;
        loop {
            match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
                Ok(()) => {
                    info!("WiFi: connected on attempt {}", attempt);
                    return Ok(wifi);
                }
                Err(e) => {
                    warn!("WiFi: attempt {} failed ({}), retry in {}s", attempt, e, backoff);
                    let _ = wifi.disconnect();
                    std::thread::sleep(Duration::from_secs(u64::from(backoff)));
                    backoff = next_backoff(backoff);
                    attempt += 1;
                }
            }
        }
    }
}
