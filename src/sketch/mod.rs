pub mod catalog;
pub mod classify;
pub mod coords;
pub mod history;
pub mod input;
pub mod model;
pub mod render;
pub mod session;
pub mod snapshot;

pub use classify::{ClassificationGateway, ClassifierTransport, HttpTransport, TransportReply};
pub use history::{HistoryEntry, HistoryId, HistoryStore, HISTORY_CAPACITY};
pub use model::{Drawing, ModelKind, Point, Prediction, PredictionResult, Stroke};
pub use session::{PointerEvent, PointerPhase, SessionOptions, SketchSession};
