use crate::sketch::classify::{ClassificationGateway, PendingClassification};
use crate::sketch::coords::{RawPointer, SurfaceGeometry};
use crate::sketch::history::{HistoryEntry, HistoryId, HistoryStore};
use crate::sketch::input::{LiveMark, RecorderState, StrokeRecorder};
use crate::sketch::model::{Drawing, ModelKind, Point, PredictionResult, CANVAS_LOGICAL_SIZE};
use crate::sketch::render::{Damage, RenderSurface};
use crate::sketch::snapshot::Snapshot;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub raw: RawPointer,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub device_scale: f32,
    pub default_model: ModelKind,
    /// Start a fresh drawing on the first stroke after a completed attempt.
    pub clear_after_classify: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device_scale: 1.0,
            default_model: ModelKind::default(),
            clear_after_classify: true,
        }
    }
}

/// Everything captured when a request is sent, so the eventual history
/// entry reflects the canvas as it was at that moment.
struct InFlight {
    job: PendingClassification,
    drawing: Drawing,
    model: ModelKind,
    snapshot: Option<Snapshot>,
}

/// State container for one sketching widget: live canvas, recorder,
/// display state, history and the single outstanding request.
pub struct SketchSession {
    recorder: StrokeRecorder,
    surface: RenderSurface,
    history: HistoryStore,
    gateway: ClassificationGateway,
    model: ModelKind,
    display: PredictionResult,
    in_flight: Option<InFlight>,
    clear_after_classify: bool,
    fresh_on_next_stroke: bool,
    damage: Option<Damage>,
}

impl SketchSession {
    pub fn new(gateway: ClassificationGateway, options: SessionOptions) -> Self {
        Self {
            recorder: StrokeRecorder::new(),
            surface: RenderSurface::new(
                (CANVAS_LOGICAL_SIZE, CANVAS_LOGICAL_SIZE),
                options.device_scale,
            ),
            history: HistoryStore::new(),
            gateway,
            model: options.default_model,
            display: PredictionResult::Idle,
            in_flight: None,
            clear_after_classify: options.clear_after_classify,
            fresh_on_next_stroke: false,
            damage: Some(Damage::Full),
        }
    }

    pub fn drawing(&self) -> &Drawing {
        self.recorder.drawing()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn display(&self) -> &PredictionResult {
        &self.display
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn select_model(&mut self, model: ModelKind) {
        if self.model != model {
            tracing::debug!(from = %self.model, to = %model, "model selected");
            self.model = model;
        }
    }

    pub fn is_classifying(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Geometry of the surface when shown at its logical size.
    pub fn default_geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry::unscaled(self.surface.logical_size(), self.surface.device_scale())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, geometry: &SurfaceGeometry) {
        match event.phase {
            PointerPhase::Down => self.pointer_down(geometry.map(event.raw, event.timestamp)),
            PointerPhase::Move => self.pointer_move(geometry.map(event.raw, event.timestamp)),
            PointerPhase::Up => self.pointer_up(),
            PointerPhase::Leave => self.pointer_leave(),
        }
    }

    pub fn pointer_down(&mut self, point: Point) {
        if self.fresh_on_next_stroke {
            self.fresh_on_next_stroke = false;
            if self.recorder.state() == RecorderState::Idle {
                tracing::debug!("starting a new drawing after classification");
                self.recorder.clear_drawing();
                self.surface.clear();
                self.damage = Some(Damage::Full);
            }
        }
        let mark = self.recorder.handle_down(point);
        self.paint(mark);
    }

    pub fn pointer_move(&mut self, point: Point) {
        if let Some(mark) = self.recorder.handle_move(point) {
            self.paint(mark);
        }
    }

    pub fn pointer_up(&mut self) {
        let _ = self.recorder.handle_up();
    }

    pub fn pointer_leave(&mut self) {
        let _ = self.recorder.handle_up();
    }

    /// Wipes canvas and drawing. An in-flight request keeps running.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.damage = Some(Damage::Full);
        self.recorder.clear_drawing();
        self.fresh_on_next_stroke = false;
        if !self.is_classifying() {
            self.display = PredictionResult::Idle;
        }
        tracing::debug!("canvas cleared");
    }

    pub fn can_classify(&self) -> bool {
        !self.is_classifying() && !self.recorder.drawing().is_empty()
    }

    /// Sends the current drawing for classification. Returns `false` without
    /// sending anything when guarded by [`can_classify`](Self::can_classify).
    pub fn classify(&mut self) -> bool {
        if !self.can_classify() {
            tracing::debug!(
                pending = self.is_classifying(),
                strokes = self.drawing().len(),
                "classify ignored"
            );
            return false;
        }

        let drawing = self.recorder.drawing().clone();
        let snapshot = match self.surface.export_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!("canvas snapshot failed: {err:#}");
                None
            }
        };
        let job = self.gateway.spawn(drawing.clone(), self.model);
        self.in_flight = Some(InFlight {
            job,
            drawing,
            model: self.model,
            snapshot,
        });
        self.display = PredictionResult::Pending;
        true
    }

    /// Applies a finished classification if one is ready. Returns whether the
    /// display state changed.
    pub fn poll_classification(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };
        match in_flight.job.try_result() {
            Some(result) => {
                self.complete(result);
                true
            }
            None => false,
        }
    }

    /// Blocks up to `timeout` for the outstanding classification.
    pub fn wait_for_classification(&mut self, timeout: Duration) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };
        match in_flight.job.wait(timeout) {
            Some(result) => {
                self.complete(result);
                true
            }
            None => false,
        }
    }

    fn complete(&mut self, result: PredictionResult) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        if let PredictionResult::Success(prediction) = &result {
            let snapshot = match in_flight.snapshot {
                Some(snapshot) => Ok(snapshot),
                None => self.replay_snapshot(&in_flight.drawing),
            };
            match snapshot {
                Ok(snapshot) => {
                    let id = self.history.issue_id(chrono::Utc::now().timestamp_millis());
                    self.history.record(HistoryEntry::new(
                        id,
                        snapshot,
                        prediction.clone(),
                        in_flight.model,
                        in_flight.drawing,
                    ));
                }
                Err(err) => tracing::error!("history snapshot unavailable: {err:#}"),
            }
            self.fresh_on_next_stroke = self.clear_after_classify;
        }
        self.display = result;
    }

    /// Puts a past attempt back on the canvas. Returns `false` for an
    /// unknown id.
    pub fn restore(&mut self, id: HistoryId) -> bool {
        let Some(entry) = self.history.restore(id) else {
            tracing::warn!(id = id.0, "history entry not found");
            return false;
        };
        let strokes = entry.strokes().clone();
        let model = entry.model();
        let result = entry.result();

        self.recorder.replace_drawing(strokes);
        self.surface.redraw_all(self.recorder.drawing());
        self.damage = Some(Damage::Full);
        self.model = model;
        self.display = result;
        self.fresh_on_next_stroke = self.clear_after_classify;
        tracing::debug!(id = id.0, "history entry restored");
        true
    }

    /// Renders `drawing` on a scratch surface shaped like the live one.
    fn replay_snapshot(&self, drawing: &Drawing) -> anyhow::Result<Snapshot> {
        let mut replay =
            RenderSurface::new(self.surface.logical_size(), self.surface.device_scale());
        replay.redraw_all(drawing);
        replay.export_snapshot()
    }

    /// Pixels changed since the last call. `None` when nothing moved.
    pub fn take_damage(&mut self) -> Option<Damage> {
        self.damage.take()
    }

    fn paint(&mut self, mark: LiveMark) {
        let dirty = match mark {
            LiveMark::Dot(point) => self.surface.draw_dot(point),
            LiveMark::Segment(from, to) => self.surface.draw_segment(from, to),
        };
        if let Some(rect) = dirty {
            self.damage = Some(match self.damage {
                Some(damage) => damage.include(rect),
                None => Damage::Rect(rect),
            });
        }
    }
}
