use quick_draw::sketch::classify::{ClassifierTransport, TransportReply, GENERIC_FAILURE};
use quick_draw::sketch::coords::{RawPointer, SurfaceGeometry};
use quick_draw::sketch::input::RecorderState;
use quick_draw::sketch::render::RenderSurface;
use quick_draw::sketch::{
    ClassificationGateway, ModelKind, Point, PointerEvent, PointerPhase, PredictionResult,
    SessionOptions, SketchSession, HISTORY_CAPACITY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CAT: &str =
    r#"{"prediction":"cat","confidence":0.87,"probabilities":{"cat":0.87,"dog":0.13}}"#;
const WAIT: Duration = Duration::from_secs(5);

/// Answers every request with the same reply and remembers what it was sent.
struct CannedTransport {
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
    last_request: Mutex<Option<serde_json::Value>>,
}

impl CannedTransport {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }
}

impl ClassifierTransport for CannedTransport {
    fn post(&self, body: Vec<u8>) -> anyhow::Result<TransportReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(serde_json::from_slice(&body)?);
        Ok(TransportReply {
            status: self.status,
            body: self.body.as_bytes().to_vec(),
        })
    }
}

/// Holds each request until the test releases it.
struct GatedTransport {
    gate: Mutex<Receiver<()>>,
}

impl GatedTransport {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { gate: Mutex::new(rx) }), tx)
    }
}

impl ClassifierTransport for GatedTransport {
    fn post(&self, _body: Vec<u8>) -> anyhow::Result<TransportReply> {
        self.gate.lock().unwrap().recv()?;
        Ok(TransportReply {
            status: 200,
            body: CAT.as_bytes().to_vec(),
        })
    }
}

fn session_with(
    transport: Arc<dyn ClassifierTransport>,
    clear_after_classify: bool,
) -> SketchSession {
    SketchSession::new(
        ClassificationGateway::new(transport),
        SessionOptions {
            clear_after_classify,
            ..SessionOptions::default()
        },
    )
}

fn stroke(session: &mut SketchSession, points: &[(f32, f32)], t0: i64) {
    let mut t = t0;
    let mut iter = points.iter();
    if let Some(&(x, y)) = iter.next() {
        session.pointer_down(Point::new(x, y, t));
    }
    for &(x, y) in iter {
        t += 16;
        session.pointer_move(Point::new(x, y, t));
    }
    session.pointer_up();
}

#[test]
fn cat_drawing_is_classified_and_recorded() {
    let transport = CannedTransport::new(200, CAT);
    let mut session = session_with(transport.clone(), true);

    stroke(&mut session, &[(10.0, 10.0), (20.0, 20.0), (30.0, 25.0)], 1_000);
    assert_eq!(session.drawing().len(), 1);
    assert_eq!(session.drawing().strokes()[0].len(), 3);

    session.select_model(ModelKind::Cnn);
    assert!(session.classify());
    assert_eq!(session.display(), &PredictionResult::Pending);
    assert!(session.wait_for_classification(WAIT));

    let prediction = session.display().prediction().expect("success");
    assert_eq!(prediction.label, "cat");
    assert_eq!(prediction.confidence, 0.87);
    assert_eq!(prediction.ranked(), vec![("cat", 0.87), ("dog", 0.13)]);

    assert_eq!(session.history().len(), 1);
    let entry = session.history().get(0).expect("entry");
    assert_eq!(entry.model(), ModelKind::Cnn);
    assert_eq!(entry.prediction().label, "cat");
    assert_eq!(entry.strokes(), session.drawing());

    let request = transport.last_request.lock().unwrap().clone().expect("request");
    assert_eq!(request["model_type"], "cnn");
    assert_eq!(request["drawing"][0][0]["x"], 10.0);
    assert_eq!(request["drawing"][0][2]["timestamp"], 1_032);
}

#[test]
fn server_error_shows_generic_failure_and_skips_history() {
    let mut session = session_with(CannedTransport::new(500, "oops"), true);
    stroke(&mut session, &[(5.0, 5.0), (50.0, 50.0)], 0);

    assert!(session.classify());
    assert!(session.wait_for_classification(WAIT));
    assert_eq!(
        session.display(),
        &PredictionResult::Error(GENERIC_FAILURE.to_owned())
    );
    assert!(session.history().is_empty());
    assert!(session.can_classify());
}

#[test]
fn service_error_message_is_shown_verbatim() {
    let mut session = session_with(
        CannedTransport::new(200, r#"{"error":"Drawing too small"}"#),
        true,
    );
    stroke(&mut session, &[(5.0, 5.0)], 0);

    assert!(session.classify());
    assert!(session.wait_for_classification(WAIT));
    assert_eq!(session.display().error(), Some("Drawing too small"));
    assert!(session.history().is_empty());
}

#[test]
fn cleared_canvas_sends_no_request() {
    let transport = CannedTransport::new(200, CAT);
    let mut session = session_with(transport.clone(), true);
    stroke(&mut session, &[(5.0, 5.0), (9.0, 9.0)], 0);

    session.clear();
    assert!(session.drawing().is_empty());
    assert!(!session.classify());
    assert_eq!(session.display(), &PredictionResult::Idle);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

    let blank = RenderSurface::new((400, 400), 1.0);
    assert_eq!(session.surface().rgba_pixels(), blank.rgba_pixels());
}

#[test]
fn clearing_during_flight_keeps_the_captured_attempt() {
    let (transport, release) = GatedTransport::new();
    let mut session = session_with(transport, true);
    stroke(&mut session, &[(40.0, 40.0), (120.0, 80.0)], 0);
    let sent = session.drawing().clone();

    assert!(session.classify());
    session.clear();
    assert!(session.display().is_pending());
    assert!(!session.classify(), "only one request may be outstanding");

    stroke(&mut session, &[(300.0, 300.0)], 500);
    release.send(()).unwrap();
    assert!(session.wait_for_classification(WAIT));

    let entry = session.history().get(0).expect("entry");
    assert_eq!(entry.strokes(), &sent);
    assert_ne!(entry.strokes(), session.drawing());
    assert_eq!(session.display().prediction().map(|p| p.label.as_str()), Some("cat"));
}

#[test]
fn restoring_an_entry_reproduces_its_canvas() {
    let mut session = session_with(CannedTransport::new(200, CAT), true);
    stroke(
        &mut session,
        &[(50.0, 60.0), (90.0, 140.0), (200.0, 150.0), (220.0, 300.0)],
        0,
    );
    stroke(&mut session, &[(320.0, 40.0)], 400);
    session.select_model(ModelKind::Mlp);
    assert!(session.classify());
    assert!(session.wait_for_classification(WAIT));
    let id = session.history().get(0).expect("entry").id();

    session.clear();
    session.select_model(ModelKind::Lstm);
    stroke(&mut session, &[(10.0, 390.0), (390.0, 10.0)], 900);

    assert!(session.restore(id));
    let entry = session.history().restore(id).expect("entry");
    assert_eq!(session.drawing(), entry.strokes());
    assert_eq!(session.model(), ModelKind::Mlp);
    assert_eq!(session.display(), &entry.result());
    assert_eq!(session.recorder_state(), RecorderState::Idle);

    let snapshot = entry.snapshot().decode_rgba().unwrap();
    assert_eq!(session.surface().rgba_pixels(), snapshot.as_raw().as_slice());
}

#[test]
fn live_strokes_match_a_full_redraw() {
    let mut session = session_with(CannedTransport::new(200, CAT), true);
    stroke(&mut session, &[(0.0, 0.0), (399.0, 399.0)], 0);
    stroke(&mut session, &[(200.0, 10.0)], 100);
    stroke(
        &mut session,
        &[(30.0, 300.0), (31.0, 301.0), (80.0, 250.0), (420.0, 250.0)],
        200,
    );

    let mut replay = RenderSurface::new((400, 400), 1.0);
    replay.redraw_all(session.drawing());
    assert_eq!(session.surface().rgba_pixels(), replay.rgba_pixels());
}

#[test]
fn history_keeps_only_the_newest_attempts() {
    let mut session = session_with(CannedTransport::new(200, CAT), false);
    stroke(&mut session, &[(1.0, 1.0)], 0);

    let attempts = HISTORY_CAPACITY + 3;
    let mut ids = Vec::new();
    for i in 0..attempts {
        stroke(&mut session, &[(i as f32, 20.0)], 10 + i as i64);
        assert!(session.classify());
        assert!(session.wait_for_classification(WAIT));
        ids.push(session.history().get(0).expect("entry").id());
    }

    assert_eq!(session.history().len(), HISTORY_CAPACITY);
    assert_eq!(session.history().get(0).map(|e| e.id()), ids.last().copied());
    for evicted in &ids[..3] {
        assert!(session.history().restore(*evicted).is_none());
    }
    let newest = session.history().get(0).expect("entry");
    assert_eq!(newest.strokes().len(), attempts + 1);
}

#[test]
fn collapsed_display_box_still_draws_within_the_canvas() {
    let mut session = session_with(CannedTransport::new(200, CAT), true);
    let geometry = SurfaceGeometry {
        display_width: 1.0e-30,
        ..SurfaceGeometry::unscaled((400, 400), 1.0)
    };
    let mouse = |x: f32, y: f32| RawPointer::Mouse {
        offset_x: x,
        offset_y: y,
    };
    for (phase, raw, timestamp) in [
        (PointerPhase::Down, mouse(0.0, 100.0), 0),
        (PointerPhase::Move, mouse(5.0, 100.0), 1),
        (PointerPhase::Move, mouse(-5.0, 300.0), 2),
        (PointerPhase::Up, mouse(-5.0, 300.0), 3),
    ] {
        session.handle_pointer(PointerEvent { phase, raw, timestamp }, &geometry);
    }

    assert_eq!(session.drawing().len(), 1);
    assert_eq!(session.drawing().strokes()[0].len(), 3);
    assert!(session.drawing().strokes()[0].points()[1].x > 1.0e30);

    let mut replay = RenderSurface::new((400, 400), 1.0);
    replay.redraw_all(session.drawing());
    assert_eq!(session.surface().rgba_pixels(), replay.rgba_pixels());
    assert!(session.classify());
    assert!(session.wait_for_classification(WAIT));
    assert_eq!(session.history().len(), 1);
}
