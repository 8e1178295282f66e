//! Bauble ornament firmware binary.

#[cfg(feature = "esp32")]
fn main() -> anyhow::Result<()> {
    use bauble_esp32::light::{self, FRAME_PERIOD, LED_COUNT};
    use bauble_esp32::net::{EspRadio, EspRestart};
    use bauble_esp32::touch::{TouchPad, ORNAMENT_PAD};
    use bauble_esp32::{boot, portal, store, ConfigPortal, ConfigStore};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use smart_leds::SmartLedsWrite;
    use std::net::SocketAddr;
    use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();

    // Initialize ESP-IDF logger for log crate integration
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("=== bauble starting ===");

    store::mount_flash()?;
    let store = ConfigStore::new(store::DEVICE_CONFIG_PATH);

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut radio = EspRadio::new(peripherals.modem, sysloop)?;

    let config_portal = ConfigPortal::new(
        SocketAddr::from(([0, 0, 0, 0], portal::DEFAULT_PORT)),
        "/spiffs/config.html",
    );

    // Returns only once we're online; otherwise the portal owns the device
    // until it restarts.
    boot::run(&mut radio, &EspRestart, &store, config_portal)?;

    // Normal operation: the touch-dimmed light show, forever.
    let mut strip = Ws2812Esp32Rmt::new(peripherals.rmt.channel0, peripherals.pins.gpio14)?;
    let touch = TouchPad::new(ORNAMENT_PAD)?;

    let mut frame: usize = 0;
    loop {
        let raw = match touch.read() {
            Ok(raw) => raw,
            Err(e) => {
                // Skip the frame and retry on the next cycle.
                log::warn!("touch read failed: {}", e);
                std::thread::sleep(FRAME_PERIOD);
                continue;
            }
        };

        let mut pixels = light::render(frame, LED_COUNT);
        light::scale(&mut pixels, light::touch_brightness(raw));
        strip.write(pixels.into_iter())?;

        std::thread::sleep(FRAME_PERIOD);
        frame = frame.wrapping_add(1);
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo test' for host testing, or 'portal-sim' to try the portal locally.");
}
