// src/types.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drivers::BufferSnapshot;

// 工作模式：录制训练数据 / 实时预测
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Mode {
    Record,
    Predict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Record => f.write_str("recording"),
            Mode::Predict => f.write_str("prediction"),
        }
    }
}

// 两路传感器数据流
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum StreamKind {
    Acceleration,
    AngularVelocity,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Acceleration => f.write_str("accelerometer"),
            StreamKind::AngularVelocity => f.write_str("gyroscope"),
        }
    }
}

/// One raw 3-axis reading as delivered by a sensor source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Reading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ControllerState {
    #[default]
    Idle,
    Recording { label: String },
    Predicting,
}

impl ControllerState {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            ControllerState::Idle => None,
            ControllerState::Recording { .. } => Some(Mode::Record),
            ControllerState::Predicting => Some(Mode::Predict),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }
}

/// A finished (not cancelled) recording or prediction run.
#[derive(Clone, Debug)]
pub struct Session {
    /// `None` for prediction runs, which are never persisted.
    pub label: Option<String>,
    pub mode: Mode,
    pub samples: BufferSnapshot,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawPrediction")]
pub struct PredictionResult {
    pub label: String,
    pub confidence: Option<f64>,
}

// 分类服务的回复可能用 label / prediction / y 任一个键，优先 label
#[derive(Deserialize)]
struct RawPrediction {
    label: Option<String>,
    prediction: Option<String>,
    y: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl TryFrom<RawPrediction> for PredictionResult {
    type Error = String;

    fn try_from(raw: RawPrediction) -> Result<Self, Self::Error> {
        let label = raw
            .label
            .or(raw.prediction)
            .or(raw.y)
            .ok_or_else(|| "prediction response has no label".to_owned())?;
        Ok(Self {
            label,
            confidence: raw.confidence,
        })
    }
}

// 前端发给后台的命令
#[derive(Clone, Debug, PartialEq)]
pub enum UiCommand {
    ToggleRecording(String),
    TogglePredicting,
    Stop { cancel: bool },
    Train,
    DropStore,
    SetInterval(u32),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayOp {
    Save,
    Drop,
    Train,
    Predict,
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatewayOp::Save => "save",
            GatewayOp::Drop => "drop",
            GatewayOp::Train => "train",
            GatewayOp::Predict => "predict",
        };
        f.write_str(name)
    }
}

// 后台线程的输入：命令、传感器回调、网关结果，全部走同一个通道
#[derive(Clone, Debug)]
pub enum Inbound {
    Command(UiCommand),
    Sample {
        stream: StreamKind,
        epoch: u64,
        reading: Reading,
    },
    PredictionResolved(PredictionResult),
    GatewayFailed { op: GatewayOp, message: String },
}

/// Everything the front end needs to draw itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Status {
    pub state: ControllerState,
    pub count: u64,
    pub last_accel: Option<Reading>,
    pub last_gyro: Option<Reading>,
    pub last_prediction: Option<PredictionResult>,
    pub last_error: Option<String>,
}

// 后台发给前端的消息
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Status(Status),
    Prediction(PredictionResult),
}
