use crate::sketch::history::{HistoryEntry, HistoryId, HistoryStore};
use eframe::egui;
use std::collections::HashMap;

const THUMBNAIL_SIDE: f32 = 64.0;

/// Column of clickable history thumbnails, decoded lazily from each entry's
/// PNG snapshot.
#[derive(Default)]
pub struct HistoryPanel {
    textures: HashMap<HistoryId, egui::TextureHandle>,
}

impl HistoryPanel {
    /// Returns the entry the user clicked, if any.
    pub fn ui(&mut self, ui: &mut egui::Ui, history: &HistoryStore) -> Option<HistoryId> {
        self.textures
            .retain(|id, _| history.restore(*id).is_some());

        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in history.iter() {
                let Some(texture) = self.texture_for(ui.ctx(), entry) else {
                    continue;
                };
                let image = egui::Image::new(texture)
                    .fit_to_exact_size(egui::vec2(THUMBNAIL_SIDE, THUMBNAIL_SIDE));
                let response = ui
                    .add(egui::ImageButton::new(image))
                    .on_hover_text(format!(
                        "{} ({})",
                        entry.prediction().label,
                        entry.model().label()
                    ));
                if response.clicked() {
                    clicked = Some(entry.id());
                }
            }
        });
        clicked
    }

    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        entry: &HistoryEntry,
    ) -> Option<&egui::TextureHandle> {
        if !self.textures.contains_key(&entry.id()) {
            let decoded = match entry.snapshot().decode_rgba() {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::warn!(id = entry.id().0, "history thumbnail unavailable: {err:#}");
                    return None;
                }
            };
            let size = [decoded.width() as usize, decoded.height() as usize];
            let texture = ctx.load_texture(
                format!("history-{}", entry.id().0),
                egui::ColorImage::from_rgba_unmultiplied(size, decoded.as_raw()),
                egui::TextureOptions::LINEAR,
            );
            self.textures.insert(entry.id(), texture);
        }
        self.textures.get(&entry.id())
    }
}
