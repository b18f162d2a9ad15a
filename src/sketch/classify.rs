use crate::sketch::model::{Drawing, ModelKind, Prediction, PredictionResult};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/predict";

/// Message shown for every failure that is not an explicit service error.
pub const GENERIC_FAILURE: &str = "Failed to classify drawing";

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    drawing: &'a Drawing,
    model_type: ModelKind,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prediction: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    probabilities: HashMap<String, f32>,
}

#[derive(Debug)]
pub enum ClassifyFailure {
    /// Network error, non-success status, or an unreadable body.
    Transport(anyhow::Error),
    /// The service answered with an explicit error payload.
    Rejected(String),
}

impl ClassifyFailure {
    pub fn display_message(&self) -> String {
        match self {
            ClassifyFailure::Transport(_) => GENERIC_FAILURE.to_owned(),
            ClassifyFailure::Rejected(message) => message.clone(),
        }
    }
}

impl fmt::Display for ClassifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyFailure::Transport(err) => write!(f, "transport failure: {err:#}"),
            ClassifyFailure::Rejected(message) => write!(f, "classifier rejected drawing: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one serialized request to the classifier.
pub trait ClassifierTransport: Send + Sync {
    fn post(&self, body: Vec<u8>) -> Result<TransportReply>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("quick-draw classifier client")
            .build()
            .context("build classifier http client")?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ClassifierTransport for HttpTransport {
    fn post(&self, body: Vec<u8>) -> Result<TransportReply> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().context("read classifier response body")?;
        Ok(TransportReply {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Clone)]
pub struct ClassificationGateway {
    transport: Arc<dyn ClassifierTransport>,
}

impl ClassificationGateway {
    pub fn new(transport: Arc<dyn ClassifierTransport>) -> Self {
        Self { transport }
    }

    /// One request, no retries. Every failure is folded into
    /// [`PredictionResult::Error`].
    pub fn classify(&self, drawing: &Drawing, model: ModelKind) -> PredictionResult {
        match self.try_classify(drawing, model) {
            Ok(prediction) => {
                tracing::info!(
                    model = %model,
                    label = %prediction.label,
                    confidence = prediction.confidence,
                    "drawing classified"
                );
                PredictionResult::Success(prediction)
            }
            Err(failure) => {
                match &failure {
                    ClassifyFailure::Transport(_) => {
                        tracing::error!(model = %model, "error classifying drawing: {failure}")
                    }
                    ClassifyFailure::Rejected(_) => {
                        tracing::warn!(model = %model, "{failure}")
                    }
                }
                PredictionResult::Error(failure.display_message())
            }
        }
    }

    pub fn try_classify(
        &self,
        drawing: &Drawing,
        model: ModelKind,
    ) -> std::result::Result<Prediction, ClassifyFailure> {
        let body = serde_json::to_vec(&ClassifyRequest {
            drawing,
            model_type: model,
        })
        .context("serialize classification request")
        .map_err(ClassifyFailure::Transport)?;

        tracing::debug!(
            strokes = drawing.len(),
            points = drawing.point_count(),
            model = %model,
            "sending classification request"
        );
        let reply = self.transport.post(body).map_err(ClassifyFailure::Transport)?;
        interpret_reply(reply)
    }

    /// Runs [`classify`](Self::classify) on a worker thread. The worker owns
    /// `drawing`, so later edits to the live canvas cannot leak into the
    /// request.
    pub fn spawn(&self, drawing: Drawing, model: ModelKind) -> PendingClassification {
        let (tx, rx) = mpsc::channel();
        let gateway = self.clone();
        let spawned = std::thread::Builder::new()
            .name("classify".into())
            .spawn(move || {
                let result = gateway.classify(&drawing, model);
                let _ = tx.send(result);
            });
        let failed = match spawned {
            Ok(_) => None,
            Err(err) => {
                tracing::error!("failed to start classification worker: {err}");
                Some(PredictionResult::Error(GENERIC_FAILURE.to_owned()))
            }
        };
        PendingClassification { rx, failed }
    }
}

fn interpret_reply(reply: TransportReply) -> std::result::Result<Prediction, ClassifyFailure> {
    if !(200..300).contains(&reply.status) {
        return Err(ClassifyFailure::Transport(anyhow!(
            "classifier responded with http status {}",
            reply.status
        )));
    }
    let decoded: ClassifyResponse = serde_json::from_slice(&reply.body)
        .context("decode classifier response")
        .map_err(ClassifyFailure::Transport)?;
    // An empty message is not an error report.
    if let Some(error) = decoded.error.filter(|e| !e.is_empty()) {
        return Err(ClassifyFailure::Rejected(error));
    }
    match (decoded.prediction, decoded.confidence) {
        (Some(label), Some(confidence)) => Ok(Prediction {
            label,
            confidence,
            probabilities: decoded.probabilities,
        }),
        _ => Err(ClassifyFailure::Transport(anyhow!(
            "classifier response is missing prediction or confidence"
        ))),
    }
}

/// Handle to an in-flight classification.
pub struct PendingClassification {
    rx: Receiver<PredictionResult>,
    failed: Option<PredictionResult>,
}

impl PendingClassification {
    /// Non-blocking check, meant to be called once per frame.
    pub fn try_result(&mut self) -> Option<PredictionResult> {
        if let Some(result) = self.failed.take() {
            return Some(result);
        }
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(PredictionResult::Error(GENERIC_FAILURE.to_owned()))
            }
        }
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<PredictionResult> {
        if let Some(result) = self.failed.take() {
            return Some(result);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(PredictionResult::Error(GENERIC_FAILURE.to_owned()))
            }
        }
    }
}
