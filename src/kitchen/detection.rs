use base64::{engine::general_purpose, Engine as _};
use log::{debug, info, warn};
use serde_json::json;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use super::settings::normalize_endpoint;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PING_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("no detection endpoint configured")]
    NotConfigured,
    #[error("detection endpoint must be an http(s) URL, got {0:?}")]
    InvalidUrl(String),
    #[error("a detection request is already in flight")]
    Busy,
    #[error("detection request failed: {0}")]
    Transport(String),
    #[error("detection service answered with status {0}")]
    Status(u16),
    #[error("detection response was not valid JSON: {0}")]
    Decode(String),
}

impl From<ureq::Error> for DetectionError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => DetectionError::Status(code),
            ureq::Error::Transport(transport) => DetectionError::Transport(transport.to_string()),
        }
    }
}

/// A captured frame, either raw encoded bytes or an already base64-encoded
/// payload (optionally a `data:` URI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionImage {
    Bytes(Vec<u8>),
    Base64(String),
}

impl DetectionImage {
    pub fn to_base64(&self) -> String {
        match self {
            DetectionImage::Bytes(bytes) => general_purpose::STANDARD.encode(bytes),
            DetectionImage::Base64(encoded) => match encoded.split_once(";base64,") {
                Some((prefix, payload)) if prefix.starts_with("data:") => payload.to_string(),
                _ => encoded.clone(),
            },
        }
    }
}

/// Pull ingredient names out of a `/detect` body. A missing or malformed
/// `ingredients` field reads as nothing detected.
pub fn parse_ingredients(body: &serde_json::Value) -> Vec<String> {
    body.get("ingredients")
        .and_then(|value| value.as_array())
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.as_str())
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub trait IngredientDetector: Send + Sync {
    fn detect(&self, image: &DetectionImage) -> Result<Vec<String>, DetectionError>;

    /// Reachability probe; never fails, only answers.
    fn ping(&self) -> bool;

    fn endpoint(&self) -> &str;
}

/// Talks to a vision service over HTTP: `POST {base}/detect`, `GET {base}/ping`.
pub struct HttpDetector {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpDetector {
    pub fn new(url: &str) -> Result<Self, DetectionError> {
        let base_url =
            normalize_endpoint(url).ok_or_else(|| DetectionError::InvalidUrl(url.to_string()))?;
        info!(target: "detection", "endpoint {}", base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        Ok(Self { base_url, agent })
    }
}

impl IngredientDetector for HttpDetector {
    fn detect(&self, image: &DetectionImage) -> Result<Vec<String>, DetectionError> {
        let response = self
            .agent
            .post(&format!("{}/detect", self.base_url))
            .send_json(json!({ "image": image.to_base64() }))?;
        let body: serde_json::Value = response
            .into_json()
            .map_err(|err| DetectionError::Decode(err.to_string()))?;
        let names = parse_ingredients(&body);
        debug!(target: "detection", "detected {:?}", names);
        Ok(names)
    }

    fn ping(&self) -> bool {
        self.agent
            .get(&format!("{}/ping", self.base_url))
            .timeout(PING_TIMEOUT)
            .call()
            .is_ok()
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

/// One detection call running on a worker thread. Polled from the host loop.
#[derive(Debug)]
pub struct DetectionTask {
    receiver: Receiver<Result<Vec<String>, DetectionError>>,
}

pub enum TaskPoll {
    Pending,
    Finished(Result<Vec<String>, DetectionError>),
}

impl DetectionTask {
    pub fn spawn(detector: Arc<dyn IngredientDetector>, image: DetectionImage) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let result = detector.detect(&image);
            if sender.send(result).is_err() {
                warn!(target: "detection", "result dropped; nobody is waiting");
            }
        });
        Self { receiver }
    }

    pub fn poll(&self) -> TaskPoll {
        match self.receiver.try_recv() {
            Ok(result) => TaskPoll::Finished(result),
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => TaskPoll::Finished(Err(
                DetectionError::Transport("detection worker exited".to_string()),
            )),
        }
    }

    #[cfg(test)]
    fn wait(self) -> Result<Vec<String>, DetectionError> {
        self.receiver.recv().unwrap_or_else(|_| {
            Err(DetectionError::Transport(
                "detection worker exited".to_string(),
            ))
        })
    }
}
