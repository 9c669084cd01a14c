use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// End points of the trend indicator.
///
/// `primary` and `mirrored` are point reflections of each other through
/// `center`, so the two segments form one line crossing the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendEndpoints {
    pub center: Point,
    pub primary: Point,
    pub mirrored: Point,
}

impl TrendEndpoints {
    pub fn segments(&self) -> [(Point, Point); 2] {
        [(self.center, self.primary), (self.center, self.mirrored)]
    }
}

/// Box the trend indicator is drawn in.
///
/// The slope is a display aid supplied by the caller (math orientation,
/// positive rises to the right); no fitting happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendGeometry {
    center: Point,
    half_width: i32,
    half_height: i32,
}

impl TrendGeometry {
    pub const fn new(center: Point, half_width: i32, half_height: i32) -> Self {
        Self {
            center,
            half_width,
            half_height,
        }
    }

    /// Geometry centred in `area`
    pub fn from_bounds(area: Rectangle) -> Self {
        let half_width = (area.size.width / 2) as i32;
        let half_height = (area.size.height / 2) as i32;
        let center = area.top_left + Point::new(half_width, half_height);
        Self::new(center, half_width, half_height)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Indicator end points for `slope`.
    ///
    /// Steep slopes (`|slope| >= 1`) are clipped to the box height, shallow
    /// ones to the box width. NaN draws flat, infinities draw vertical.
    pub fn endpoints(&self, slope: f32) -> TrendEndpoints {
        let slope = if slope.is_nan() { 0.0 } else { slope };
        let magnitude = libm::fabsf(slope);

        let offset = if magnitude >= 1.0 {
            let dx = libm::roundf(self.half_height as f32 / slope) as i32;
            Point::new(dx, -self.half_height)
        } else {
            let dy = libm::roundf(self.half_width as f32 * slope) as i32;
            Point::new(self.half_width, -dy)
        };

        TrendEndpoints {
            center: self.center,
            primary: self.center + offset,
            mirrored: self.center - offset,
        }
    }
}
