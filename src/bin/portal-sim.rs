//! Captive-portal simulator for host development.
//!
//! Runs the config portal on localhost against a simulated radio so the
//! whole form flow can be exercised with a browser, no hardware needed.
//!
//! Usage:
//!   cargo run --bin portal-sim
//!   open http://127.0.0.1:8080/config
//!
//! Submitting the form writes `portal-sim-config.json` in the working
//! directory and exits where the device would restart.

#[cfg(not(feature = "esp32"))]
fn main() -> anyhow::Result<()> {
    use bauble_esp32::net::{AccessPoint, NetError, Restart};
    use bauble_esp32::{ConfigPortal, ConfigStore, Credentials};

    /// Radio double: activation always works, an operator is always there.
    struct SimAp {
        active: bool,
    }

    impl AccessPoint for SimAp {
        fn activate(&mut self, ssid: &str, _password: &str) -> Result<(), NetError> {
            log::info!("simulated access point up: {}", ssid);
            self.active = true;
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn has_client(&self) -> bool {
            true
        }
    }

    struct ExitRestart;

    impl Restart for ExitRestart {
        fn restart(&self) -> ! {
            log::info!("device would restart here; exiting");
            std::process::exit(0)
        }
    }

    env_logger::init();

    let store = ConfigStore::new("portal-sim-config.json");
    let mut config = store.load()?;
    if config.hotspot.ssid.is_empty() {
        config.hotspot = Credentials::new("bauble-setup", "twinkle123");
    }
    log::info!("stored config: {:?}", config);

    let portal = ConfigPortal::new("127.0.0.1:8080".parse()?, "data/config.html");
    let mut ap = SimAp { active: false };
    portal.run(&mut ap, &ExitRestart, config, &store)
}

#[cfg(feature = "esp32")]
fn main() {
    println!("portal-sim is a host tool; build it without the 'esp32' feature.");
}
