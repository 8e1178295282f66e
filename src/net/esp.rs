//! ESP-IDF implementations of the radio and restart seams.

use super::{AccessPoint, NetError, Restart, Station};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};
use esp_idf_sys::EspError;
use log::{info, warn};

/// The one physical radio, in whichever role the boot cycle needs.
///
/// The join initiation is deliberately non-blocking: the station connector
/// owns the deadline and polls [`Station::is_connected`], so this wrapper
/// must not wait inside the driver.
pub struct EspRadio<'a> {
    wifi: EspWifi<'a>,
}

impl<'a> EspRadio<'a> {
    /// Take ownership of the modem and bring up the WiFi driver.
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, None)?;
        Ok(Self { wifi })
    }
}

impl Station for EspRadio<'_> {
    fn begin_join(&mut self, ssid: &str, password: &str) -> Result<(), NetError> {
        info!("joining network: {}", ssid);

        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| NetError::InvalidCredentials)?,
            password: password
                .try_into()
                .map_err(|_| NetError::InvalidCredentials)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });

        self.wifi.set_configuration(&config)?;
        self.wifi.start()?;
        self.wifi.connect()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}

impl AccessPoint for EspRadio<'_> {
    fn activate(&mut self, ssid: &str, password: &str) -> Result<(), NetError> {
        info!("starting access point: {}", ssid);

        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| NetError::InvalidCredentials)?,
            password: password
                .try_into()
                .map_err(|_| NetError::InvalidCredentials)?,
            auth_method: AuthMethod::WPAWPA2Personal,
            ..Default::default()
        });

        self.wifi.set_configuration(&config)?;
        self.wifi.start()?;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.wifi.is_started().unwrap_or(false)
            && matches!(
                self.wifi.get_configuration(),
                Ok(Configuration::AccessPoint(_))
            )
    }

    fn has_client(&self) -> bool {
        let mut stations = esp_idf_sys::wifi_sta_list_t::default();
        let err = unsafe { esp_idf_sys::esp_wifi_ap_get_sta_list(&mut stations) };
        err == esp_idf_sys::ESP_OK && stations.num > 0
    }
}

/// Restart by resetting the chip.
pub struct EspRestart;

impl Restart for EspRestart {
    fn restart(&self) -> ! {
        warn!("restarting device");
        unsafe { esp_idf_sys::esp_restart() };
        unreachable!("esp_restart does not return")
    }
}
