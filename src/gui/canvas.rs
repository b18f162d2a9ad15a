use crate::sketch::coords::{RawPointer, SurfaceGeometry};
use crate::sketch::input::RecorderState;
use crate::sketch::render::{Damage, RenderSurface};
use crate::sketch::session::{PointerEvent, PointerPhase, SketchSession};
use eframe::egui::{self, Color32, Pos2, Rect, Sense, TextureOptions, Vec2};

const CANVAS_TEXTURE: &str = "sketch-canvas";

/// Shows the session's pixel buffer and feeds pointer input back into it.
#[derive(Default)]
pub struct CanvasView {
    texture: Option<egui::TextureHandle>,
}

impl CanvasView {
    pub fn ui(&mut self, ui: &mut egui::Ui, session: &mut SketchSession) {
        let logical = session.surface().logical_size();
        let display = egui::vec2(logical.0 as f32, logical.1 as f32);
        let (response, painter) = ui.allocate_painter(display, Sense::drag());
        let rect = response.rect;

        let (width, height) = session.surface().size();
        let geometry = SurfaceGeometry {
            left: rect.left(),
            top: rect.top(),
            display_width: rect.width(),
            display_height: rect.height(),
            buffer_width: width,
            buffer_height: height,
            device_scale: session.surface().device_scale(),
        };
        feed_pointer(ui, &response, rect, &geometry, session);

        let texture = self.upload(ui.ctx(), session);
        painter.image(
            texture,
            rect,
            Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );
        painter.rect_stroke(rect, 6.0, ui.visuals().widgets.noninteractive.bg_stroke);
    }

    /// Pushes pending damage to the GPU: the whole buffer after a clear or
    /// restore, only the touched rectangle while strokes are drawn.
    fn upload(&mut self, ctx: &egui::Context, session: &mut SketchSession) -> egui::TextureId {
        let damage = session.take_damage();
        let surface = session.surface();
        if let Some(texture) = self.texture.as_mut() {
            match damage {
                Some(Damage::Full) => texture.set(full_image(surface), TextureOptions::LINEAR),
                Some(Damage::Rect(dirty)) => {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [dirty.width as usize, dirty.height as usize],
                        &surface.region_rgba(dirty),
                    );
                    texture.set_partial(
                        [dirty.x as usize, dirty.y as usize],
                        image,
                        TextureOptions::LINEAR,
                    );
                }
                None => {}
            }
            return texture.id();
        }
        let texture = ctx.load_texture(CANVAS_TEXTURE, full_image(surface), TextureOptions::LINEAR);
        let id = texture.id();
        self.texture = Some(texture);
        id
    }
}

fn full_image(surface: &RenderSurface) -> egui::ColorImage {
    let (width, height) = surface.size();
    egui::ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        surface.rgba_pixels(),
    )
}

fn feed_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    rect: Rect,
    geometry: &SurfaceGeometry,
    session: &mut SketchSession,
) {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let event = |phase: PointerPhase, pos: Pos2| PointerEvent {
        phase,
        raw: RawPointer::Mouse {
            offset_x: pos.x - rect.left(),
            offset_y: pos.y - rect.top(),
        },
        timestamp,
    };

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            session.handle_pointer(event(PointerPhase::Down, pos), geometry);
        }
        return;
    }

    if response.dragged() && session.recorder_state() == RecorderState::Recording {
        let samples = ui.input(|i| {
            move_samples(&i.events, i.pointer.delta(), response.interact_pointer_pos())
        });
        for pos in samples {
            if !rect.contains(pos) {
                session.handle_pointer(event(PointerPhase::Leave, pos), geometry);
                break;
            }
            session.handle_pointer(event(PointerPhase::Move, pos), geometry);
        }
    }

    if response.drag_stopped() && session.recorder_state() == RecorderState::Recording {
        let pos = response.interact_pointer_pos().unwrap_or(rect.min);
        session.handle_pointer(event(PointerPhase::Up, pos), geometry);
    }
}

/// Every pointer position queued this frame. egui coalesces motion into one
/// position per frame, but the raw event queue still carries each sample.
fn move_samples(events: &[egui::Event], delta: Vec2, latest: Option<Pos2>) -> Vec<Pos2> {
    let samples: Vec<Pos2> = events
        .iter()
        .filter_map(|e| match e {
            egui::Event::PointerMoved(pos) => Some(*pos),
            _ => None,
        })
        .collect();
    if samples.is_empty() && delta != Vec2::ZERO {
        return latest.into_iter().collect();
    }
    samples
}
