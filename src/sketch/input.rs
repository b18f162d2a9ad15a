use crate::sketch::model::{Drawing, Point, Stroke};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

/// Live feedback the render surface should paint after an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveMark {
    Dot(Point),
    Segment(Point, Point),
}

/// Accumulates pointer samples into strokes and owns the committed drawing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeRecorder {
    active: Option<Stroke>,
    drawing: Drawing,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn handle_down(&mut self, point: Point) -> LiveMark {
        // A second press without a release (multi-touch, lost mouse-up)
        // closes the previous stroke rather than dropping it.
        self.finish_active();
        self.active = Some(Stroke::new(point));
        LiveMark::Dot(point)
    }

    pub fn handle_move(&mut self, point: Point) -> Option<LiveMark> {
        let stroke = self.active.as_mut()?;
        let previous = stroke.last();
        stroke.push(point);
        Some(LiveMark::Segment(previous, point))
    }

    /// Pointer released or left the surface. Returns whether a stroke was
    /// committed to the drawing.
    pub fn handle_up(&mut self) -> bool {
        self.finish_active()
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn clear_drawing(&mut self) {
        self.active = None;
        self.drawing.clear();
    }

    pub fn replace_drawing(&mut self, drawing: Drawing) {
        self.active = None;
        self.drawing = drawing;
    }

    fn finish_active(&mut self) -> bool {
        match self.active.take() {
            Some(stroke) => {
                tracing::debug!(points = stroke.len(), "stroke committed");
                self.drawing.push(stroke);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f32, y: f32, t: i64) -> Point {
        Point::new(x, y, t)
    }

    #[test]
    fn down_move_up_commits_single_stroke() {
        let mut recorder = StrokeRecorder::new();
        assert_eq!(recorder.state(), RecorderState::Idle);

        assert_eq!(recorder.handle_down(p(10.0, 10.0, 0)), LiveMark::Dot(p(10.0, 10.0, 0)));
        assert_eq!(recorder.state(), RecorderState::Recording);
        assert_eq!(
            recorder.handle_move(p(20.0, 10.0, 1)),
            Some(LiveMark::Segment(p(10.0, 10.0, 0), p(20.0, 10.0, 1)))
        );
        let _ = recorder.handle_move(p(20.0, 20.0, 2));
        assert!(recorder.handle_up());

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.drawing().len(), 1);
        let points = recorder.drawing().strokes()[0].points();
        assert_eq!(
            points,
            &[p(10.0, 10.0, 0), p(20.0, 10.0, 1), p(20.0, 20.0, 2)]
        );
    }

    #[test]
    fn move_while_idle_is_ignored() {
        let mut recorder = StrokeRecorder::new();
        assert_eq!(recorder.handle_move(p(1.0, 1.0, 0)), None);
        assert!(!recorder.handle_up());
        assert!(recorder.drawing().is_empty());
    }

    #[test]
    fn every_move_is_recorded_without_filtering() {
        let mut recorder = StrokeRecorder::new();
        let _ = recorder.handle_down(p(5.0, 5.0, 0));
        for t in 1..=4 {
            let _ = recorder.handle_move(p(5.0, 5.0, t));
        }
        recorder.handle_up();
        assert_eq!(recorder.drawing().strokes()[0].len(), 5);
    }

    #[test]
    fn stroke_counts_follow_press_release_cycles() {
        let mut recorder = StrokeRecorder::new();
        let moves_per_stroke = [0usize, 3, 1, 7];
        for (i, moves) in moves_per_stroke.iter().enumerate() {
            let base = (i * 100) as i64;
            let _ = recorder.handle_down(p(0.0, 0.0, base));
            for m in 0..*moves {
                let _ = recorder.handle_move(p(m as f32, 1.0, base + m as i64 + 1));
            }
            recorder.handle_up();
            // Extra releases must not fabricate strokes.
            recorder.handle_up();
        }

        let lengths: Vec<usize> = recorder.drawing().strokes().iter().map(Stroke::len).collect();
        assert_eq!(lengths, vec![1, 4, 2, 8]);
    }

    #[test]
    fn second_press_closes_the_open_stroke() {
        let mut recorder = StrokeRecorder::new();
        let _ = recorder.handle_down(p(0.0, 0.0, 0));
        let _ = recorder.handle_move(p(1.0, 0.0, 1));
        let _ = recorder.handle_down(p(9.0, 9.0, 2));
        recorder.handle_up();
        assert_eq!(recorder.drawing().len(), 2);
        assert_eq!(recorder.drawing().strokes()[0].len(), 2);
        assert_eq!(recorder.drawing().strokes()[1].len(), 1);
    }

    #[test]
    fn reset_discards_in_progress_stroke_only() {
        let mut recorder = StrokeRecorder::new();
        let _ = recorder.handle_down(p(0.0, 0.0, 0));
        recorder.handle_up();
        let _ = recorder.handle_down(p(3.0, 3.0, 1));
        recorder.reset();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.drawing().len(), 1);
    }

    #[derive(Debug, Clone, Copy)]
    enum Gesture {
        Down,
        Move,
        Up,
        Leave,
    }

    fn gesture() -> impl Strategy<Value = (Gesture, f32, f32)> {
        (
            prop_oneof![
                Just(Gesture::Down),
                Just(Gesture::Move),
                Just(Gesture::Up),
                Just(Gesture::Leave),
            ],
            -50.0f32..450.0,
            -50.0f32..450.0,
        )
    }

    proptest! {
        #[test]
        fn strokes_follow_any_gesture_sequence(events in prop::collection::vec(gesture(), 0..200)) {
            let mut recorder = StrokeRecorder::new();
            let mut expected: Vec<usize> = Vec::new();
            let mut open: Option<usize> = None;

            for (t, (kind, x, y)) in events.into_iter().enumerate() {
                let point = p(x, y, t as i64);
                match kind {
                    Gesture::Down => {
                        expected.extend(open.take());
                        let _ = recorder.handle_down(point);
                        open = Some(1);
                    }
                    Gesture::Move => {
                        let mark = recorder.handle_move(point);
                        prop_assert_eq!(mark.is_some(), open.is_some());
                        if let Some(n) = open.as_mut() {
                            *n += 1;
                        }
                    }
                    Gesture::Up | Gesture::Leave => {
                        let committed = recorder.handle_up();
                        prop_assert_eq!(committed, open.is_some());
                        expected.extend(open.take());
                    }
                }
                let recording = recorder.state() == RecorderState::Recording;
                prop_assert_eq!(recording, open.is_some());
            }

            let lengths: Vec<usize> =
                recorder.drawing().strokes().iter().map(Stroke::len).collect();
            prop_assert_eq!(lengths, expected);
        }
    }
}
