// src/view.rs
// 纯函数：状态 -> 文本，不持有任何状态
use std::fmt::Write;

use crate::types::{ControllerState, Reading, Status};

/// Truncates to two decimals; missing or NaN values show as 0.
pub fn round2(n: f64) -> f64 {
    if n.is_nan() {
        return 0.0;
    }
    (n * 100.0).floor() / 100.0
}

fn motion_line(name: &str, reading: Option<Reading>) -> String {
    let r = reading.unwrap_or_default();
    format!(
        "{name}: x: {} y: {} z: {}",
        round2(r.x),
        round2(r.y),
        round2(r.z)
    )
}

pub fn mode_line(state: &ControllerState) -> String {
    match state {
        ControllerState::Idle => "Idle".to_owned(),
        ControllerState::Recording { label } => format!("● Recording \"{label}\""),
        ControllerState::Predicting => "◆ Predicting".to_owned(),
    }
}

pub fn render(status: &Status) -> String {
    let mut out = String::new();
    writeln!(out, "{}", mode_line(&status.state)).ok();
    writeln!(out, "Count: {}", status.count).ok();
    writeln!(out, "{}", motion_line("Accelerometer", status.last_accel)).ok();
    writeln!(out, "{}", motion_line("Gyroscope", status.last_gyro)).ok();
    let prediction = match &status.last_prediction {
        Some(p) => match p.confidence {
            Some(c) => format!("{} ({:.0}%)", p.label, c * 100.0),
            None => p.label.clone(),
        },
        None => "-".to_owned(),
    };
    writeln!(out, "Prediction: {prediction}").ok();
    if let Some(err) = &status.last_error {
        writeln!(out, "Last error: {err}").ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PredictionResult;

    #[test]
    fn round2_truncates_towards_negative_infinity() {
        assert_eq!(round2(1.239), 1.23);
        assert_eq!(round2(-0.001), -0.01);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn idle_status_renders_zeroes() {
        let text = render(&Status::default());
        assert!(text.starts_with("Idle\n"));
        assert!(text.contains("Count: 0"));
        assert!(text.contains("Accelerometer: x: 0 y: 0 z: 0"));
        assert!(text.contains("Prediction: -"));
        assert!(!text.contains("Last error"));
    }

    #[test]
    fn active_status_shows_label_prediction_and_error() {
        let status = Status {
            state: ControllerState::Recording {
                label: "squat".into(),
            },
            count: 42,
            last_accel: Some(Reading::new(0.123, 9.81, -1.0)),
            last_gyro: None,
            last_prediction: Some(PredictionResult {
                label: "lunge".into(),
                confidence: Some(0.75),
            }),
            last_error: Some("save failed: io error".into()),
        };
        let text = render(&status);
        assert!(text.contains("Recording \"squat\""));
        assert!(text.contains("Count: 42"));
        assert!(text.contains("x: 0.12 y: 9.81 z: -1"));
        assert!(text.contains("Prediction: lunge (75%)"));
        assert!(text.contains("Last error: save failed"));
    }
}
