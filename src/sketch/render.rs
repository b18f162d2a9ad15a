use crate::sketch::model::{Color, Drawing, Point, StrokeStyle, BACKGROUND, STROKE_STYLE};
use crate::sketch::snapshot::Snapshot;
use anyhow::Result;

/// Device coordinates are clamped to this magnitude before clipping.
const DEVICE_LIMIT: f64 = 1.0e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: (i32, i32), b: (i32, i32), pad: i32) -> Self {
        let min_x = a.0.min(b.0).saturating_sub(pad);
        let max_x = a.0.max(b.0).saturating_add(pad);
        let min_y = a.1.min(b.1).saturating_sub(pad);
        let max_y = a.1.max(b.1).saturating_add(pad);
        Self {
            x: min_x,
            y: min_y,
            width: max_x.saturating_sub(min_x).saturating_add(1).max(1),
            height: max_y.saturating_sub(min_y).saturating_add(1).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = self.right().clamp(0, max_w);
        let y1 = self.bottom().clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }
}

/// Part of the surface that changed since the front-end last uploaded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    Full,
    Rect(DirtyRect),
}

impl Damage {
    pub fn include(self, rect: DirtyRect) -> Damage {
        match self {
            Damage::Full => Damage::Full,
            Damage::Rect(prev) => Damage::Rect(prev.union(rect)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BrushMaskRow {
    dy: i32,
    min_dx: i32,
    max_dx: i32,
}

/// Precomputed disc used to stamp round caps and joins.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BrushMask {
    radius: i32,
    rows: Vec<BrushMaskRow>,
}

impl BrushMask {
    fn for_width(stroke_width: u32) -> Self {
        let radius = (stroke_width.saturating_sub(1) / 2) as i32;
        let mut rows = Vec::with_capacity((radius * 2 + 1) as usize);
        for dy in -radius..=radius {
            let mut max_dx = radius;
            while max_dx >= 0 && max_dx * max_dx + dy * dy > radius * radius {
                max_dx -= 1;
            }
            if max_dx >= 0 {
                rows.push(BrushMaskRow {
                    dy,
                    min_dx: -max_dx,
                    max_dx,
                });
            }
        }
        Self { radius, rows }
    }
}

/// Owns the RGBA pixel buffer behind the canvas.
///
/// All drawing commands take logical coordinates; the device pixel scale is
/// applied here, so the buffer is `logical_size * device_scale` pixels.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    logical_size: (u32, u32),
    device_scale: f32,
    size: (u32, u32),
    rgba: Vec<u8>,
    style: StrokeStyle,
    background: Color,
    brush: BrushMask,
}

impl RenderSurface {
    pub fn new(logical_size: (u32, u32), device_scale: f32) -> Self {
        let device_scale = if device_scale.is_finite() && device_scale > 0.0 {
            device_scale
        } else {
            1.0
        };
        let size = (
            (logical_size.0 as f32 * device_scale).round() as u32,
            (logical_size.1 as f32 * device_scale).round() as u32,
        );
        let style = STROKE_STYLE;
        let device_width = (style.width * device_scale).round().max(1.0) as u32;
        let mut surface = Self {
            logical_size,
            device_scale,
            size,
            rgba: vec![0; (size.0 as usize) * (size.1 as usize) * 4],
            style,
            background: BACKGROUND,
            brush: BrushMask::for_width(device_width),
        };
        surface.clear();
        tracing::debug!(
            width = size.0,
            height = size.1,
            device_scale,
            "render surface initialized"
        );
        surface
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical_size
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }

    /// Buffer size in device pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn rgba_pixels(&self) -> &[u8] {
        &self.rgba
    }

    /// Copies the pixels under `rect` out as tightly packed RGBA rows.
    /// `rect` must lie inside the surface, as every returned dirty rect does.
    pub fn region_rgba(&self, rect: DirtyRect) -> Vec<u8> {
        let stride = self.size.0 as usize * 4;
        let (x, width) = (rect.x.max(0) as usize, rect.width.max(0) as usize);
        let mut out = Vec::with_capacity(width * rect.height.max(0) as usize * 4);
        for y in rect.y.max(0)..rect.bottom() {
            let start = y as usize * stride + x * 4;
            out.extend_from_slice(&self.rgba[start..start + width * 4]);
        }
        out
    }

    pub fn clear(&mut self) {
        let fill = self.background.to_rgba_array();
        for px in self.rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&fill);
        }
    }

    /// Paints a round cap at a single point.
    pub fn draw_dot(&mut self, point: Point) -> Option<DirtyRect> {
        let center = round_device(self.to_device(point));
        let dirty = self.segment_bounds(center, center)?;
        self.stamp(center, dirty);
        Some(dirty)
    }

    /// Segments reaching past the surface are clipped before rasterizing,
    /// so the work done is bounded by the surface size.
    pub fn draw_segment(&mut self, from: Point, to: Point) -> Option<DirtyRect> {
        let (start, end) = self.clip_to_reach(self.to_device(from), self.to_device(to))?;
        let (start, end) = (round_device(start), round_device(end));
        let dirty = self.segment_bounds(start, end)?;
        self.stamp_line(start, end, dirty);
        Some(dirty)
    }

    /// Clears and repaints every stroke of `drawing` in order.
    pub fn redraw_all(&mut self, drawing: &Drawing) {
        self.clear();
        for stroke in drawing.strokes() {
            let points = stroke.points();
            match points {
                [] => continue,
                [only] => {
                    self.draw_dot(*only);
                }
                _ => {
                    for pair in points.windows(2) {
                        self.draw_segment(pair[0], pair[1]);
                    }
                }
            }
        }
    }

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        Snapshot::encode_rgba(self.size.0, self.size.1, &self.rgba)
    }

    fn to_device(&self, point: Point) -> (f64, f64) {
        let scale = f64::from(self.device_scale);
        let axis = |v: f32| {
            let v = f64::from(v) * scale;
            if v.is_nan() {
                0.0
            } else {
                v.clamp(-DEVICE_LIMIT, DEVICE_LIMIT)
            }
        };
        (axis(point.x), axis(point.y))
    }

    /// Liang-Barsky clip against the surface grown by the brush radius.
    /// Endpoints already inside are returned untouched.
    fn clip_to_reach(
        &self,
        a: (f64, f64),
        b: (f64, f64),
    ) -> Option<((f64, f64), (f64, f64))> {
        let pad = f64::from(self.brush.radius + 1);
        let (min_x, min_y) = (-pad, -pad);
        let max_x = f64::from(self.size.0) + pad;
        let max_y = f64::from(self.size.1) + pad;
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-dx, a.0 - min_x),
            (dx, max_x - a.0),
            (-dy, a.1 - min_y),
            (dy, max_y - a.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let start = if t0 > 0.0 { (a.0 + t0 * dx, a.1 + t0 * dy) } else { a };
        let end = if t1 < 1.0 { (a.0 + t1 * dx, a.1 + t1 * dy) } else { b };
        Some((start, end))
    }

    fn segment_bounds(&self, start: (i32, i32), end: (i32, i32)) -> Option<DirtyRect> {
        DirtyRect::from_points(start, end, self.brush.radius).clamp(self.size.0, self.size.1)
    }

    fn stamp_line(&mut self, start: (i32, i32), end: (i32, i32), clip: DirtyRect) {
        let (mut x0, mut y0) = start;
        let (x1, y1) = end;

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp((x0, y0), clip);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn stamp(&mut self, center: (i32, i32), clip: DirtyRect) {
        let color = self.style.color.to_rgba_array();
        let width = self.size.0;
        for row in &self.brush.rows {
            let y = center.1 + row.dy;
            if y < clip.y || y >= clip.y + clip.height {
                continue;
            }
            let x0 = (center.0 + row.min_dx).max(clip.x);
            let x1 = (center.0 + row.max_dx).min(clip.x + clip.width - 1);
            if x0 > x1 {
                continue;
            }
            let row_base = (y as usize) * (width as usize) * 4;
            for x in x0..=x1 {
                let idx = row_base + (x as usize) * 4;
                self.rgba[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }
}

fn round_device(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}
