mod canvas;
mod history_panel;

pub use canvas::CanvasView;
pub use history_panel::HistoryPanel;

use crate::settings::AppSettings;
use crate::sketch::catalog::{find_item, DRAWABLE_ITEMS};
use crate::sketch::classify::{ClassificationGateway, HttpTransport};
use crate::sketch::model::{format_percent, ModelKind, PredictionResult};
use crate::sketch::session::{SessionOptions, SketchSession};
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;

const PENDING_REPAINT: Duration = Duration::from_millis(50);

pub struct QuickDrawApp {
    session: SketchSession,
    canvas: CanvasView,
    history: HistoryPanel,
}

impl QuickDrawApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: &AppSettings) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(settings.endpoint.clone())?;
        tracing::info!(endpoint = %transport.endpoint(), "quick draw ready");
        let gateway = ClassificationGateway::new(Arc::new(transport));
        let options = SessionOptions {
            device_scale: cc.egui_ctx.pixels_per_point(),
            default_model: settings.default_model,
            clear_after_classify: settings.clear_after_classify,
        };
        Ok(Self {
            session: SketchSession::new(gateway, options),
            canvas: CanvasView::default(),
            history: HistoryPanel::default(),
        })
    }

    fn items_panel(&self, ui: &mut egui::Ui) {
        ui.heading("Drawable Items");
        ui.separator();
        let predicted = self
            .session
            .display()
            .prediction()
            .and_then(|p| find_item(&p.label))
            .map(|item| item.name);
        let accent = ui.visuals().selection.bg_fill;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in DRAWABLE_ITEMS.iter() {
                if predicted == Some(item.name) {
                    ui.colored_label(accent, egui::RichText::new(item.name).strong());
                } else {
                    ui.strong(item.name);
                }
                ui.small(item.description);
                ui.add_space(4.0);
            }
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Quick Draw");
            let mut model = self.session.model();
            egui::ComboBox::from_id_source("model_select")
                .selected_text(model.label())
                .show_ui(ui, |ui| {
                    for kind in ModelKind::ALL {
                        ui.selectable_value(&mut model, kind, kind.label());
                    }
                });
            self.session.select_model(model);
        });
        ui.add_space(6.0);

        self.canvas.ui(ui, &mut self.session);
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            if ui.button("Clear Canvas").clicked() {
                self.session.clear();
            }
            let label = if self.session.is_classifying() {
                "Processing...".to_owned()
            } else {
                format!("Classify with {}", self.session.model().as_str().to_uppercase())
            };
            let classify = ui.add_enabled(self.session.can_classify(), egui::Button::new(label));
            if self.session.is_classifying() {
                ui.spinner();
            }
            if classify.clicked() {
                self.session.classify();
            }
        });
    }

    fn results_panel(&self, ui: &mut egui::Ui) {
        ui.heading("Prediction Results");
        ui.separator();
        match self.session.display() {
            PredictionResult::Idle => {}
            PredictionResult::Pending => {
                ui.label("Classifying drawing...");
            }
            PredictionResult::Error(message) => {
                ui.colored_label(egui::Color32::RED, format!("Error: {message}"));
            }
            PredictionResult::Success(prediction) => {
                ui.strong(format!("Prediction: {}", prediction.label));
                ui.label(format!("Confidence: {}", format_percent(prediction.confidence)));
                ui.add_space(8.0);
                ui.strong("All Probabilities:");
                egui::Grid::new("probabilities").striped(true).show(ui, |ui| {
                    for (label, probability) in prediction.ranked() {
                        ui.label(format!("{label}:"));
                        ui.label(format_percent(probability));
                        ui.end_row();
                    }
                });
            }
        }
    }
}

impl eframe::App for QuickDrawApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.poll_classification();
        if self.session.is_classifying() {
            ctx.request_repaint_after(PENDING_REPAINT);
        }

        egui::SidePanel::left("items")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| self.items_panel(ui));

        egui::SidePanel::right("history")
            .resizable(false)
            .exact_width(96.0)
            .show(ctx, |ui| {
                ui.strong("History");
                ui.separator();
                if let Some(id) = self.history.ui(ui, self.session.history()) {
                    self.session.restore(id);
                }
            });

        egui::SidePanel::right("results")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| self.results_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.controls(ui));
    }
}
