//! Screen output
//!
//! The session controller draws through the small [`Canvas`] trait so it never
//! owns pixels. [`DisplayCanvas`] adapts any `embedded-graphics` target, and
//! [`FrameBuffer`] gives a RAM target with dirty-region flushing.

mod canvas;
pub mod colors;
mod framebuffer;
pub mod screens;

pub use canvas::{Canvas, DisplayCanvas, TextSize};
pub use framebuffer::FrameBuffer;

/// Panel width in pixels
pub const DISPLAY_WIDTH_PX: u16 = 240;
/// Panel height in pixels
pub const DISPLAY_HEIGHT_PX: u16 = 135;
