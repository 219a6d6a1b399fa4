//! Boundaries to the remote persistence and classification services.
//!
//! Calls here are blocking; the controller runs each one on a detached
//! thread and never waits for it.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::drivers::BufferSnapshot;
use crate::types::{PredictionResult, Reading};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("service answered with status {0}")]
    Status(u16),
    #[error("no {0} endpoint configured")]
    Unconfigured(&'static str),
}

pub trait PersistenceGateway: Send + Sync {
    /// Upserts one labeled session under a fresh key.
    fn save(&self, label: &str, snapshot: &BufferSnapshot) -> Result<(), GatewayError>;
    /// Removes every persisted session.
    fn drop_all(&self) -> Result<(), GatewayError>;
}

pub trait ClassifierGateway: Send + Sync {
    /// Retrains the remote model on everything persisted so far.
    fn train(&self) -> Result<(), GatewayError>;
    fn predict(&self, snapshot: &BufferSnapshot) -> Result<PredictionResult, GatewayError>;
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    x: Vec<Reading>,
    y: &'a str,
    gyro: Vec<Reading>,
}

pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fresh session key: wall-clock millis plus a per-process counter, so two
/// saves in the same millisecond never share a key.
pub fn session_key() -> String {
    let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq:04}", unix_millis())
}

/// `{ "<key>": { "x": [...], "y": "<label>", "gyro": [...] } }`
pub fn session_payload(key: &str, label: &str, snapshot: &BufferSnapshot) -> Result<Value, GatewayError> {
    let record = SessionRecord {
        x: snapshot.accel_readings(),
        y: label,
        gyro: snapshot.gyro_readings(),
    };
    let mut body = serde_json::Map::new();
    body.insert(key.to_owned(), serde_json::to_value(record)?);
    Ok(Value::Object(body))
}

pub fn predict_payload(snapshot: &BufferSnapshot) -> Value {
    json!({
        "x": snapshot.accel_readings(),
        "gyro": snapshot.gyro_readings(),
    })
}

fn build_client(timeout: Duration) -> Result<Client, GatewayError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("motionlab/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Status(status.as_u16()))
    }
}

pub struct HttpPersistence {
    client: Client,
    url: String,
}

impl HttpPersistence {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

impl PersistenceGateway for HttpPersistence {
    fn save(&self, label: &str, snapshot: &BufferSnapshot) -> Result<(), GatewayError> {
        let key = session_key();
        let body = session_payload(&key, label, snapshot)?;
        let response = self
            .client
            .patch(&self.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()?;
        check(response)?;
        debug!("saved session {key} ({label}) to {}", self.url);
        Ok(())
    }

    fn drop_all(&self) -> Result<(), GatewayError> {
        check(self.client.delete(&self.url).send()?)?;
        Ok(())
    }
}

pub struct HttpClassifier {
    client: Client,
    train_url: Option<String>,
    predict_url: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        train_url: Option<String>,
        predict_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            train_url,
            predict_url,
        })
    }
}

impl ClassifierGateway for HttpClassifier {
    fn train(&self) -> Result<(), GatewayError> {
        let url = self.train_url.as_deref().ok_or(GatewayError::Unconfigured("train"))?;
        check(self.client.post(url).send()?)?;
        Ok(())
    }

    fn predict(&self, snapshot: &BufferSnapshot) -> Result<PredictionResult, GatewayError> {
        let url = self
            .predict_url
            .as_deref()
            .ok_or(GatewayError::Unconfigured("predict"))?;
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&predict_payload(snapshot))
            .send()?;
        Ok(check(response)?.json::<PredictionResult>()?)
    }
}

/// Stand-in when no classifier service is configured.
pub struct OfflineClassifier;

impl ClassifierGateway for OfflineClassifier {
    fn train(&self) -> Result<(), GatewayError> {
        Err(GatewayError::Unconfigured("train"))
    }

    fn predict(&self, _snapshot: &BufferSnapshot) -> Result<PredictionResult, GatewayError> {
        Err(GatewayError::Unconfigured("predict"))
    }
}
