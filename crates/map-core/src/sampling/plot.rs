use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use crate::config::SAMPLE_COUNT;

/// Pixel area samples are plotted into, one column per sample.
///
/// Y grows downwards, so full scale maps to the top row and zero to the
/// bottom row, both inside [`bounds`](Self::bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSurface {
    origin: Point,
    height: u32,
}

impl PlotSurface {
    pub const fn new(origin: Point, height: u32) -> Self {
        Self { origin, height }
    }

    pub const fn width(&self) -> u32 {
        SAMPLE_COUNT as u32
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.origin, Size::new(self.width(), self.height))
    }

    /// Pixel for sample `index` with value `intensity` against full-scale `scale`.
    ///
    /// Values outside `0..=scale` are clamped to the plot edges.
    pub fn point_for(&self, index: usize, intensity: f32, scale: f32) -> Point {
        let column = index.min(SAMPLE_COUNT - 1) as i32;

        let mut ratio = intensity / scale;
        if !ratio.is_finite() || ratio < 0.0 {
            ratio = 0.0;
        } else if ratio > 1.0 {
            ratio = 1.0;
        }

        // Last row inside the surface; the outline sits just below it
        let span = self.height.saturating_sub(1) as f32;
        let offset = libm::roundf(span - ratio * span) as i32;

        Point::new(self.origin.x + column, self.origin.y + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> PlotSurface {
        PlotSurface::new(Point::new(46, 14), 118)
    }

    #[test]
    fn test_x_is_sample_index() {
        let plot = surface();
        assert_eq!(plot.point_for(0, 1.0, 2.0).x, 46);
        assert_eq!(plot.point_for(100, 1.0, 2.0).x, 146);
        assert_eq!(plot.point_for(SAMPLE_COUNT + 10, 1.0, 2.0).x, 46 + 191);
    }

    #[test]
    fn test_y_is_inverted() {
        let plot = surface();
        assert_eq!(plot.point_for(0, 0.0, 100.0).y, 14 + 117);
        assert_eq!(plot.point_for(0, 100.0, 100.0).y, 14);
        assert_eq!(plot.point_for(0, 50.0, 100.0).y, 14 + 59);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let plot = surface();
        assert_eq!(plot.point_for(0, 500.0, 100.0).y, 14);
        assert_eq!(plot.point_for(0, -5.0, 100.0).y, 14 + 117);
        assert_eq!(plot.point_for(0, 1.0, 0.0).y, 14 + 117);
    }

    #[test]
    fn test_bounds_cover_every_sample_column() {
        let bounds = surface().bounds();
        assert_eq!(bounds.size, Size::new(SAMPLE_COUNT as u32, 118));
        assert!(bounds.contains(surface().point_for(191, 50.0, 100.0)));
    }

    #[test]
    fn test_extremes_stay_inside_bounds() {
        let plot = surface();
        let bounds = plot.bounds();
        for index in [0, SAMPLE_COUNT - 1] {
            assert!(bounds.contains(plot.point_for(index, 0.0, 100.0)));
            assert!(bounds.contains(plot.point_for(index, 100.0, 100.0)));
        }
    }
}
