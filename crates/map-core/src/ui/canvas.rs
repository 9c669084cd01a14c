use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X10, FONT_9X15, FONT_10X20},
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

/// Text sizes available to screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

impl TextSize {
    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Small => &FONT_6X10,
            Self::Medium => &FONT_9X15,
            Self::Large => &FONT_10X20,
        }
    }

    /// Horizontal advance of one character in pixels
    pub const fn char_width(self) -> u32 {
        match self {
            Self::Small => 6,
            Self::Medium => 9,
            Self::Large => 10,
        }
    }

    pub const fn line_height(self) -> u32 {
        match self {
            Self::Small => 10,
            Self::Medium => 15,
            Self::Large => 20,
        }
    }
}

/// Draw commands the session screens are built from.
///
/// Text positions are the top-left corner of the first glyph.
pub trait Canvas {
    type Error: core::fmt::Debug;

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error>;

    fn text(
        &mut self,
        text: &str,
        top_left: Point,
        size: TextSize,
        color: Rgb565,
    ) -> Result<(), Self::Error>;

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    fn outline_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    fn line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), Self::Error>;
}

/// [`Canvas`] over any `embedded-graphics` RGB565 target
pub struct DisplayCanvas<D> {
    display: D,
}

impl<D> DisplayCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn release(self) -> D {
        self.display
    }
}

impl<D> Canvas for DisplayCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: core::fmt::Debug,
{
    type Error = D::Error;

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.display.clear(color)
    }

    fn text(
        &mut self,
        text: &str,
        top_left: Point,
        size: TextSize,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        Text::with_baseline(
            text,
            top_left,
            MonoTextStyle::new(size.font(), color),
            Baseline::Top,
        )
        .draw(&mut self.display)?;
        Ok(())
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        area.into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.display)
    }

    fn outline_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        area.into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut self.display)
    }

    fn line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), Self::Error> {
        Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut self.display)
    }
}
