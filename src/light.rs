//! Per-frame math for the ornament's light animation.
//!
//! A sine wave travels along the strip, red-shifted toward the far end and
//! blue-shifted toward the near end. Brightness comes from the capacitive
//! touch pad: an untouched pad runs at full brightness, a firm touch dims
//! the strip to black. Everything here is pure; the firmware loop in the
//! binary owns the hardware.

use smart_leds::RGB8;
use std::f32::consts::PI;
use std::time::Duration;

/// Pixels on the strip.
pub const LED_COUNT: usize = 128;

/// Delay between animation frames.
pub const FRAME_PERIOD: Duration = Duration::from_millis(10);

/// Touch reading at or above which the strip is fully dark.
pub const TOUCH_FULL_SCALE: f32 = 300.0;

/// Render one frame of the travelling wave.
pub fn render(frame: usize, count: usize) -> Vec<RGB8> {
    (0..count)
        .map(|i| {
            let phase = (i + frame) as f32 * 2.0 * PI / count as f32;
            let val = (phase.sin() + 0.5).clamp(0.0, 1.0);
            let along = i as f32 / count as f32;
            RGB8 {
                r: (val * 255.0 * along) as u8,
                g: 0,
                b: (val * 255.0 * (1.0 - along)) as u8,
            }
        })
        .collect()
}

/// Scale every channel by `factor`, clamped to `[0, 1]`.
pub fn scale(pixels: &mut [RGB8], factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    for pixel in pixels {
        pixel.r = (pixel.r as f32 * factor) as u8;
        pixel.g = (pixel.g as f32 * factor) as u8;
        pixel.b = (pixel.b as f32 * factor) as u8;
    }
}

/// Map a raw touch reading to a brightness factor in `[0, 1]`.
///
/// The pad reads low when touched, so reading 0 is full brightness and
/// anything at or past [`TOUCH_FULL_SCALE`] is dark.
pub fn touch_brightness(raw: u16) -> f32 {
    1.0 - (raw as f32 / TOUCH_FULL_SCALE).min(1.0)
}
