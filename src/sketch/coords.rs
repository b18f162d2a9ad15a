use crate::sketch::model::Point;

/// Position carried by a raw input event, before any scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointer {
    /// Mouse position relative to the surface element.
    Mouse { offset_x: f32, offset_y: f32 },
    /// Primary touch position relative to the page.
    Touch { client_x: f32, client_y: f32 },
}

/// Where the surface is displayed and how its pixel buffer is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub left: f32,
    pub top: f32,
    pub display_width: f32,
    pub display_height: f32,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub device_scale: f32,
}

impl SurfaceGeometry {
    /// Geometry of a surface displayed at its logical size with no offset.
    pub fn unscaled(logical_size: (u32, u32), device_scale: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            display_width: logical_size.0 as f32,
            display_height: logical_size.1 as f32,
            buffer_width: (logical_size.0 as f32 * device_scale).round() as u32,
            buffer_height: (logical_size.1 as f32 * device_scale).round() as u32,
            device_scale,
        }
    }

    /// Maps a raw pointer position into logical canvas coordinates.
    ///
    /// Never fails: a collapsed display box or a non-positive device scale
    /// degrades to a factor of one on that axis.
    pub fn map(&self, raw: RawPointer, timestamp: i64) -> Point {
        let (dx, dy) = match raw {
            RawPointer::Mouse { offset_x, offset_y } => (offset_x, offset_y),
            RawPointer::Touch { client_x, client_y } => {
                (client_x - self.left, client_y - self.top)
            }
        };
        let device_scale = positive_or_one(self.device_scale);
        let scale_x = axis_scale(self.buffer_width, self.display_width);
        let scale_y = axis_scale(self.buffer_height, self.display_height);
        Point::new(
            dx * scale_x / device_scale,
            dy * scale_y / device_scale,
            timestamp,
        )
    }
}

fn axis_scale(buffer: u32, display: f32) -> f32 {
    if buffer == 0 || !(display > 0.0) {
        return 1.0;
    }
    buffer as f32 / display
}

fn positive_or_one(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
