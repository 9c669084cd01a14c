//! Screen palette
//!
//! RGB565: red 5 bits (0-31), green 6 bits (0-63), blue 5 bits (0-31).

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::RgbColor;

pub const BLACK: Rgb565 = Rgb565::BLACK;
pub const WHITE: Rgb565 = Rgb565::WHITE;
pub const RED: Rgb565 = Rgb565::RED;
pub const GREEN: Rgb565 = Rgb565::GREEN;

/// Prompt and heading text
pub const CYAN: Rgb565 = Rgb565::new(0, 63, 31);
pub const DARK_CYAN: Rgb565 = Rgb565::new(0, 31, 15);
pub const DARK_GREEN: Rgb565 = Rgb565::new(0, 31, 0);

/// Help text and plot outline
pub const LIGHT_GREY: Rgb565 = Rgb565::new(24, 48, 24);
pub const DARK_GREY: Rgb565 = Rgb565::new(15, 31, 15);

/// Warnings and the scrolled symbol under the cursor
pub const ORANGE: Rgb565 = Rgb565::new(31, 41, 0);
