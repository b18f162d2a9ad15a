use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Side length of the square drawing area in logical pixels.
pub const CANVAS_LOGICAL_SIZE: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line width in logical pixels. Caps and joins are always round.
    pub width: f32,
    pub color: Color,
}

/// Pen used for every stroke on the canvas.
pub const STROKE_STYLE: StrokeStyle = StrokeStyle {
    width: 3.0,
    color: Color::BLACK,
};

pub const BACKGROUND: Color = Color::WHITE;

/// A sampled pointer position in logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Point {
    pub const fn new(x: f32, y: f32, timestamp: i64) -> Self {
        Self { x, y, timestamp }
    }
}

/// One continuous pointer-down-to-release path. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    pub fn new(first: Point) -> Self {
        Self {
            points: vec![first],
        }
    }

    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self { points })
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Drawing {
    strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
}

impl FromIterator<Stroke> for Drawing {
    fn from_iter<I: IntoIterator<Item = Stroke>>(iter: I) -> Self {
        Self {
            strokes: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Lstm,
    Cnn,
    Mlp,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Lstm, ModelKind::Cnn, ModelKind::Mlp];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Lstm => "lstm",
            ModelKind::Cnn => "cnn",
            ModelKind::Mlp => "mlp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Lstm => "LSTM Model",
            ModelKind::Cnn => "CNN Model",
            ModelKind::Mlp => "MLP Model",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lstm" => Ok(ModelKind::Lstm),
            "cnn" => Ok(ModelKind::Cnn),
            "mlp" => Ok(ModelKind::Mlp),
            other => Err(anyhow::anyhow!("unknown model type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    pub probabilities: HashMap<String, f32>,
}

impl Prediction {
    /// Probabilities ordered for display: highest first, ties by label.
    pub fn ranked(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .probabilities
            .iter()
            .map(|(label, p)| (label.as_str(), *p))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PredictionResult {
    #[default]
    Idle,
    Pending,
    Error(String),
    Success(Prediction),
}

impl PredictionResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionResult::Pending)
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            PredictionResult::Success(prediction) => Some(prediction),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PredictionResult::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Formats a probability in `[0, 1]` as a percentage with two decimals.
pub fn format_percent(value: f32) -> String {
    format!("{:.2}%", value * 100.0)
}
