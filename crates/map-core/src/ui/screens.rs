//! Per-state screens
//!
//! Every function draws one screen through a [`Canvas`]. Static screens clear
//! and redraw everything; the live run and warm-up screens take a `full` flag
//! so the per-tick refresh only repaints the readouts that change.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;

use super::colors::{
    BLACK, CYAN, DARK_CYAN, DARK_GREEN, DARK_GREY, GREEN, LIGHT_GREY, ORANGE, RED, WHITE,
};
use super::{Canvas, DISPLAY_WIDTH_PX, TextSize};
use crate::sampling::{PlotSurface, SampleBuffer, TrendEndpoints};
use crate::session::{Peripheral, SessionState};

// ============================================================================
// Layout
// ============================================================================

/// Sample plot, one column per sample, right of the side panel
pub const PLOT_SURFACE: PlotSurface = PlotSurface::new(Point::new(46, 14), 118);

/// Box the trend indicator is drawn in, bottom of the side panel
pub const TREND_AREA: Rectangle = Rectangle::new(Point::new(2, 92), Size::new(40, 40));

const MARGIN_X: i32 = 4;
const ENTRY_ROW_Y: i32 = 40;
const HELP_ROW_Y: i32 = 100;

const HEADER_ELAPSED_X: i32 = 90;
const HEADER_LUX_X: i32 = 170;

// ============================================================================
// Formatting helpers
// ============================================================================

/// `MM:SS` of a millisecond duration
pub fn format_mmss(ms: u64) -> String<8> {
    let total_secs = ms / 1000;
    let mut text = String::new();
    let _ = write!(text, "{:02}:{:02}", total_secs / 60, total_secs % 60);
    text
}

/// Illuminance readout, fewer decimals for large values
pub fn format_lux(lux: f32) -> String<16> {
    let mut text = String::new();
    let _ = if lux >= 1000.0 {
        write!(text, "{:.0}", lux)
    } else {
        write!(text, "{:.2}", lux)
    };
    text
}

fn char_x(column: usize, size: TextSize) -> i32 {
    MARGIN_X + (column as u32 * size.char_width()) as i32
}

fn help_lines<C: Canvas>(canvas: &mut C, lines: &[(&str, Rgb565)]) -> Result<(), C::Error> {
    let mut y = HELP_ROW_Y;
    for (text, color) in lines {
        canvas.text(text, Point::new(MARGIN_X, y), TextSize::Small, *color)?;
        y += TextSize::Small.line_height() as i32 + 2;
    }
    Ok(())
}

fn caret<C: Canvas>(canvas: &mut C, column: usize) -> Result<(), C::Error> {
    let y = ENTRY_ROW_Y + TextSize::Large.line_height() as i32;
    canvas.text("^", Point::new(char_x(column, TextSize::Large), y), TextSize::Large, ORANGE)
}

// ============================================================================
// Entry screens
// ============================================================================

/// Name entry: slots with the scrolled symbol under the cursor
pub fn enter_name<C: Canvas>(
    canvas: &mut C,
    slots: &str,
    cursor: usize,
    preview: char,
) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("Enter file name:", Point::new(MARGIN_X, 4), TextSize::Medium, CYAN)?;

    let mut buf = [0u8; 4];
    for (column, symbol) in slots.chars().enumerate() {
        let (symbol, color) = if column == cursor {
            (preview, ORANGE)
        } else {
            (symbol, WHITE)
        };
        canvas.text(
            symbol.encode_utf8(&mut buf),
            Point::new(char_x(column, TextSize::Large), ENTRY_ROW_Y),
            TextSize::Large,
            color,
        )?;
    }
    canvas.text(
        ".txt",
        Point::new(char_x(slots.len(), TextSize::Large), ENTRY_ROW_Y),
        TextSize::Large,
        DARK_GREY,
    )?;
    if cursor < slots.len() {
        caret(canvas, cursor)?;
    }

    help_lines(
        canvas,
        &[
            ("[green] confirm   [red] go back", LIGHT_GREY),
            ("Asterisks will be ignored.", DARK_GREY),
        ],
    )
}

/// Duration entry as `MM:SS`
pub fn enter_time<C: Canvas>(
    canvas: &mut C,
    digits: &[u8; 4],
    cursor: usize,
    preview: u8,
) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("Enter time:", Point::new(MARGIN_X, 4), TextSize::Medium, CYAN)?;

    // Digits 0-1 are minutes, then the colon, then seconds
    let column_of = |digit: usize| if digit < 2 { digit } else { digit + 1 };
    let mut buf = [0u8; 4];
    for (index, &digit) in digits.iter().enumerate() {
        let (value, color) = if index == cursor {
            (preview, ORANGE)
        } else {
            (digit, WHITE)
        };
        let symbol = char::from(b'0' + value % 10);
        canvas.text(
            symbol.encode_utf8(&mut buf),
            Point::new(char_x(column_of(index), TextSize::Large), ENTRY_ROW_Y),
            TextSize::Large,
            color,
        )?;
    }
    canvas.text(
        ":",
        Point::new(char_x(2, TextSize::Large), ENTRY_ROW_Y),
        TextSize::Large,
        WHITE,
    )?;
    if cursor < digits.len() {
        caret(canvas, column_of(cursor))?;
    }

    canvas.text(
        "minutes : seconds",
        Point::new(char_x(6, TextSize::Large), ENTRY_ROW_Y + 5),
        TextSize::Small,
        DARK_GREY,
    )?;
    help_lines(canvas, &[("[green] confirm   [red] go back", LIGHT_GREY)])
}

/// Name exists in the log already
pub fn overwrite_confirm<C: Canvas>(canvas: &mut C, name: &str) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("WARNING:", Point::new(MARGIN_X, 4), TextSize::Large, ORANGE)?;

    let mut line: String<24> = String::new();
    let _ = write!(line, "{}.txt exists,", name);
    canvas.text(&line, Point::new(MARGIN_X, 34), TextSize::Medium, WHITE)?;
    canvas.text("overwrite file?", Point::new(MARGIN_X, 52), TextSize::Medium, WHITE)?;

    help_lines(
        canvas,
        &[("[green] overwrite", GREEN), ("[red] new name", RED)],
    )
}

// ============================================================================
// Run screens
// ============================================================================

pub fn test_ready<C: Canvas>(canvas: &mut C, name: &str, duration_ms: u32) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;

    let mut file: String<16> = String::new();
    let _ = write!(file, "{}.txt", name);
    canvas.text(&file, Point::new(MARGIN_X, 4), TextSize::Large, WHITE)?;

    let mut runtime: String<24> = String::new();
    let _ = write!(runtime, "Runtime: {}", format_mmss(duration_ms as u64));
    canvas.text(&runtime, Point::new(MARGIN_X, 34), TextSize::Medium, CYAN)?;

    canvas.text(
        "Hold green to START",
        Point::new(MARGIN_X, 70),
        TextSize::Medium,
        GREEN,
    )
}

/// First countdown frame
pub fn countdown_prompt<C: Canvas>(canvas: &mut C) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("Get ready to push", Point::new(MARGIN_X, 20), TextSize::Medium, CYAN)?;
    canvas.text("magnet in...", Point::new(MARGIN_X, 38), TextSize::Medium, CYAN)
}

/// Countdown progress such as `3...2.`
pub fn countdown<C: Canvas>(canvas: &mut C, progress: &str) -> Result<(), C::Error> {
    canvas.text(progress, Point::new(MARGIN_X, 70), TextSize::Large, WHITE)
}

pub fn countdown_go<C: Canvas>(canvas: &mut C) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("GO!", Point::new(100, 57), TextSize::Large, GREEN)
}

/// Everything the live run screen shows
pub struct LiveView<'a> {
    pub name: &'a str,
    pub duration_ms: u32,
    pub elapsed_ms: u64,
    pub lux: f32,
    pub samples: &'a SampleBuffer,
    pub trend: TrendEndpoints,
}

/// Live run: header readouts, sample plot and trend indicator
pub fn live<C: Canvas>(canvas: &mut C, view: &LiveView<'_>, full: bool) -> Result<(), C::Error> {
    let plot = PLOT_SURFACE;

    if full {
        canvas.clear(BLACK)?;
        canvas.text(view.name, Point::new(MARGIN_X, 2), TextSize::Small, WHITE)?;
        canvas.outline_rect(
            Rectangle::new(
                plot.bounds().top_left - Point::new(1, 1),
                plot.bounds().size + Size::new(2, 2),
            ),
            LIGHT_GREY,
        )?;
        canvas.text("Scale", Point::new(2, 16), TextSize::Small, DARK_GREY)?;
        canvas.text(
            &format_lux(view.samples.scale()),
            Point::new(2, 28),
            TextSize::Small,
            DARK_GREY,
        )?;
        canvas.text("Trend", Point::new(2, 80), TextSize::Small, DARK_GREY)?;
    }

    // Elapsed / configured
    let mut elapsed: String<16> = String::new();
    let _ = write!(
        elapsed,
        "{}/{}",
        format_mmss(view.elapsed_ms),
        format_mmss(view.duration_ms as u64)
    );
    let row = TextSize::Small.line_height();
    canvas.fill_rect(
        Rectangle::new(
            Point::new(HEADER_ELAPSED_X, 2),
            Size::new((HEADER_LUX_X - HEADER_ELAPSED_X) as u32, row),
        ),
        BLACK,
    )?;
    canvas.text(&elapsed, Point::new(HEADER_ELAPSED_X, 2), TextSize::Small, CYAN)?;

    canvas.fill_rect(
        Rectangle::new(
            Point::new(HEADER_LUX_X, 2),
            Size::new(DISPLAY_WIDTH_PX as u32 - HEADER_LUX_X as u32, row),
        ),
        BLACK,
    )?;
    canvas.text(
        &format_lux(view.lux),
        Point::new(HEADER_LUX_X, 2),
        TextSize::Small,
        WHITE,
    )?;

    // Markers are never erased; the scale is fixed for the run
    for (index, &value) in view.samples.samples().iter().enumerate() {
        let point = plot.point_for(index, value, view.samples.scale());
        canvas.fill_rect(Rectangle::new(point, Size::new(1, 1)), GREEN)?;
    }

    canvas.fill_rect(TREND_AREA, BLACK)?;
    canvas.outline_rect(TREND_AREA, DARK_GREY)?;
    for (start, end) in view.trend.segments() {
        canvas.line(start, end, ORANGE)?;
    }

    Ok(())
}

pub fn test_ended<C: Canvas>(
    canvas: &mut C,
    name: &str,
    elapsed_ms: u64,
    samples: usize,
) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("TEST ENDED", Point::new(MARGIN_X, 4), TextSize::Large, GREEN)?;

    let mut file: String<16> = String::new();
    let _ = write!(file, "{}.txt", name);
    canvas.text(&file, Point::new(MARGIN_X, 30), TextSize::Medium, WHITE)?;

    let secs = elapsed_ms / 1000;
    let mut runtime: String<32> = String::new();
    let _ = write!(runtime, "Actual Runtime: {}m {:02}s", secs / 60, secs % 60);
    canvas.text(&runtime, Point::new(MARGIN_X, 50), TextSize::Small, CYAN)?;

    let mut count: String<24> = String::new();
    let _ = write!(count, "{} samples", samples);
    canvas.text(&count, Point::new(MARGIN_X, 64), TextSize::Small, CYAN)?;

    help_lines(canvas, &[("[green] new test", LIGHT_GREY)])
}

// ============================================================================
// Fault screens
// ============================================================================

/// Error screen for `state`, naming the faulty peripheral when known
pub fn error<C: Canvas>(
    canvas: &mut C,
    state: SessionState,
    which: Option<Peripheral>,
) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text("ERROR:", Point::new(MARGIN_X, 4), TextSize::Large, RED)?;

    let (headline, hint) = match state {
        SessionState::ErrorLogger => ("File write failed", "Check micro SD card"),
        SessionState::ErrorSensor => ("Light sensor disconnected", "Check sensor connection"),
        _ => (
            match which {
                Some(Peripheral::ConfirmButton) => "Green button disconnected",
                Some(Peripheral::CancelButton) => "Red button disconnected",
                _ => "Button(s) disconnected",
            },
            "Check button(s) connection",
        ),
    };
    canvas.text(headline, Point::new(MARGIN_X, 34), TextSize::Small, WHITE)?;
    canvas.text(hint, Point::new(MARGIN_X, 50), TextSize::Small, LIGHT_GREY)?;

    help_lines(
        canvas,
        &[("Test resets once reconnected.", DARK_GREY)],
    )
}

/// Shown before the reset that follows a recovery
pub fn reconnect_notice<C: Canvas>(canvas: &mut C, what: &str) -> Result<(), C::Error> {
    canvas.clear(BLACK)?;
    canvas.text(what, Point::new(MARGIN_X, 20), TextSize::Medium, DARK_GREEN)?;
    canvas.text(
        "connection re-established",
        Point::new(MARGIN_X, 40),
        TextSize::Small,
        WHITE,
    )?;
    canvas.text(
        "Test resetting...",
        Point::new(MARGIN_X, 70),
        TextSize::Medium,
        ORANGE,
    )
}

// ============================================================================
// Warm-up
// ============================================================================

/// LED stabilisation screen with elapsed time and current reading
pub fn warm_up<C: Canvas>(
    canvas: &mut C,
    elapsed_ms: u64,
    lux: Option<f32>,
    full: bool,
) -> Result<(), C::Error> {
    if full {
        canvas.clear(BLACK)?;
        canvas.text("LED Warming Up", Point::new(MARGIN_X, 4), TextSize::Large, DARK_CYAN)?;
        canvas.text("Elapsed:", Point::new(MARGIN_X, 40), TextSize::Medium, LIGHT_GREY)?;
        canvas.text("Cur lux:", Point::new(MARGIN_X, 64), TextSize::Medium, LIGHT_GREY)?;
    }

    let value_x = MARGIN_X + 9 * TextSize::Medium.char_width() as i32 + 4;
    let value_size = Size::new(
        DISPLAY_WIDTH_PX as u32 - value_x as u32,
        TextSize::Medium.line_height(),
    );

    canvas.fill_rect(Rectangle::new(Point::new(value_x, 40), value_size), BLACK)?;
    canvas.text(
        &format_mmss(elapsed_ms),
        Point::new(value_x, 40),
        TextSize::Medium,
        WHITE,
    )?;

    canvas.fill_rect(Rectangle::new(Point::new(value_x, 64), value_size), BLACK)?;
    match lux {
        Some(lux) => canvas.text(&format_lux(lux), Point::new(value_x, 64), TextSize::Medium, WHITE),
        None => canvas.text("--", Point::new(value_x, 64), TextSize::Medium, RED),
    }
}
