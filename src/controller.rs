// src/controller.rs
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::config;
use crate::drivers::{Listener, SampleBuffer, SampleStream, SensorSource, SessionError};
use crate::gateway::{ClassifierGateway, GatewayError, PersistenceGateway};
use crate::types::{
    ControllerState, GatewayOp, Inbound, Mode, PredictionResult, Reading, Session, Status,
    StreamKind,
};

/// Recording / prediction state machine.
///
/// Owns the sample buffer and both subscriptions. Sensor deliveries and
/// gateway outcomes arrive as [`Inbound`] messages and must be fed back
/// through [`SessionController::handle_sample`] and friends on the same
/// thread that issues commands, so the buffer is never mutated concurrently.
pub struct SessionController {
    state: ControllerState,
    buffer: SampleBuffer,
    accel: SampleStream,
    gyro: SampleStream,
    interval: Duration,
    persistence: Arc<dyn PersistenceGateway>,
    classifier: Arc<dyn ClassifierGateway>,
    inbound: Sender<Inbound>,
    last_accel: Option<Reading>,
    last_gyro: Option<Reading>,
    last_prediction: Option<PredictionResult>,
    last_error: Option<String>,
}

impl SessionController {
    pub fn new(
        accel: Arc<dyn SensorSource>,
        gyro: Arc<dyn SensorSource>,
        persistence: Arc<dyn PersistenceGateway>,
        classifier: Arc<dyn ClassifierGateway>,
        interval: Duration,
        inbound: Sender<Inbound>,
    ) -> Self {
        Self {
            state: ControllerState::Idle,
            buffer: SampleBuffer::new(),
            accel: SampleStream::new(accel),
            gyro: SampleStream::new(gyro),
            interval,
            persistence,
            classifier,
            inbound,
            last_accel: None,
            last_gyro: None,
            last_prediction: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn count(&self) -> u64 {
        self.buffer.count()
    }

    pub fn last_prediction(&self) -> Option<&PredictionResult> {
        self.last_prediction.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.state.clone(),
            count: self.buffer.count(),
            last_accel: self.last_accel,
            last_gyro: self.last_gyro,
            last_prediction: self.last_prediction.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn start_recording(&mut self, label: &str) -> Result<(), SessionError> {
        self.start(ControllerState::Recording {
            label: label.to_owned(),
        })
    }

    pub fn start_predicting(&mut self) -> Result<(), SessionError> {
        self.start(ControllerState::Predicting)
    }

    /// Record button: start when idle, finish when already recording.
    pub fn toggle_recording(&mut self, label: &str) -> Result<Option<Session>, SessionError> {
        match self.state {
            ControllerState::Recording { .. } => Ok(self.stop(false)),
            _ => self.start_recording(label).map(|_| None),
        }
    }

    pub fn toggle_predicting(&mut self) -> Result<Option<Session>, SessionError> {
        match self.state {
            ControllerState::Predicting => Ok(self.stop(false)),
            _ => self.start_predicting().map(|_| None),
        }
    }

    /// Ends the active run. With `cancel` the buffered samples are discarded
    /// and no gateway is called; otherwise the finished session is dispatched
    /// and returned.
    pub fn stop(&mut self, cancel: bool) -> Option<Session> {
        let previous = std::mem::take(&mut self.state);
        let Some(mode) = previous.mode() else {
            debug!("stop requested while idle");
            return None;
        };
        self.unsubscribe_all();
        if cancel {
            info!("{mode} cancelled after {} samples", self.buffer.count());
            return None;
        }
        // Snapshot before anything leaves this thread.
        let samples = self.buffer.snapshot();
        let session = match previous {
            ControllerState::Recording { label } => Session {
                label: Some(label),
                mode,
                samples,
            },
            _ => Session {
                label: None,
                mode,
                samples,
            },
        };
        info!(
            "{mode} finished: {} accel / {} gyro samples",
            session.samples.accel.len(),
            session.samples.gyro.len()
        );
        self.dispatch_session(&session);
        Some(session)
    }

    pub fn cancel(&mut self) {
        self.stop(true);
    }

    pub fn train(&self) {
        let classifier = Arc::clone(&self.classifier);
        self.detach(GatewayOp::Train, move || classifier.train().map(|_| None));
    }

    pub fn drop_store(&self) {
        let persistence = Arc::clone(&self.persistence);
        self.detach(GatewayOp::Drop, move || persistence.drop_all().map(|_| None));
    }

    /// Applies one sampling interval to both streams, live if subscribed.
    pub fn set_update_interval(&mut self, ms: u32) -> Result<(), SessionError> {
        let interval = config::interval(ms).inspect_err(|e| self.last_error = Some(e.to_string()))?;
        self.interval = interval;
        self.accel.set_interval(interval);
        self.gyro.set_interval(interval);
        debug!("update interval set to {ms} ms");
        Ok(())
    }

    /// Returns whether the delivery was accepted into the active session.
    pub fn handle_sample(&mut self, stream: StreamKind, epoch: u64, reading: Reading) -> bool {
        if self.state.is_idle() {
            trace!("ignoring {stream} sample while idle");
            return false;
        }
        if !self.buffer.append(stream, epoch, reading) {
            return false;
        }
        match stream {
            StreamKind::Acceleration => self.last_accel = Some(reading),
            StreamKind::AngularVelocity => self.last_gyro = Some(reading),
        }
        true
    }

    pub fn handle_prediction(&mut self, result: PredictionResult) {
        info!("prediction: {}", result.label);
        self.last_prediction = Some(result);
    }

    pub fn handle_gateway_failure(&mut self, op: GatewayOp, message: String) {
        warn!("{op} failed: {message}");
        self.last_error = Some(format!("{op} failed: {message}"));
    }

    /// Detaches both listeners. Safe to call in any state.
    pub fn shutdown(&mut self) {
        self.unsubscribe_all();
        self.state = ControllerState::Idle;
    }

    fn start(&mut self, next: ControllerState) -> Result<(), SessionError> {
        if let Some(active) = self.state.mode() {
            let err = SessionError::ModeConflict { active };
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        let mode = next.mode().unwrap_or(Mode::Record);
        self.buffer.reset();
        self.last_accel = None;
        self.last_gyro = None;
        if let Err(err) = self.subscribe_all() {
            self.unsubscribe_all();
            self.buffer.reset();
            warn!("{mode} aborted: {err}");
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.state = next;
        self.last_error = None;
        info!("{mode} started (epoch {})", self.buffer.epoch());
        Ok(())
    }

    fn subscribe_all(&mut self) -> Result<(), SessionError> {
        let epoch = self.buffer.epoch();
        let on_accel = self.listener(StreamKind::Acceleration, epoch);
        self.accel.subscribe(self.interval, on_accel)?;
        let on_gyro = self.listener(StreamKind::AngularVelocity, epoch);
        self.gyro.subscribe(self.interval, on_gyro)
    }

    fn unsubscribe_all(&mut self) {
        self.accel.unsubscribe();
        self.gyro.unsubscribe();
    }

    /// Every delivery is tagged with the epoch current at subscription time.
    fn listener(&self, stream: StreamKind, epoch: u64) -> Listener {
        let tx = Mutex::new(self.inbound.clone());
        Box::new(move |reading| {
            let tx = tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // The engine may already be gone; a dropped delivery is harmless.
            tx.send(Inbound::Sample {
                stream,
                epoch,
                reading,
            })
            .ok();
        })
    }

    fn dispatch_session(&self, session: &Session) {
        let samples = session.samples.clone();
        match (&session.mode, &session.label) {
            (Mode::Record, Some(label)) => {
                let persistence = Arc::clone(&self.persistence);
                let label = label.clone();
                self.detach(GatewayOp::Save, move || {
                    persistence.save(&label, &samples).map(|_| None)
                });
            }
            _ => {
                let classifier = Arc::clone(&self.classifier);
                self.detach(GatewayOp::Predict, move || {
                    classifier.predict(&samples).map(Some)
                });
            }
        }
    }

    /// Fire-and-forget: runs `call` on its own thread and reports back
    /// through the inbound channel. Nothing is retried.
    fn detach<F>(&self, op: GatewayOp, call: F)
    where
        F: FnOnce() -> Result<Option<PredictionResult>, GatewayError> + Send + 'static,
    {
        let tx = self.inbound.clone();
        let spawned = thread::Builder::new()
            .name(format!("gateway-{op}"))
            .spawn(move || {
                let outcome = match call() {
                    Ok(Some(result)) => Inbound::PredictionResolved(result),
                    Ok(None) => {
                        debug!("{op} completed");
                        return;
                    }
                    Err(e) => Inbound::GatewayFailed {
                        op,
                        message: e.to_string(),
                    },
                };
                tx.send(outcome).ok();
            });
        if let Err(e) = spawned {
            warn!("could not spawn {op} worker: {e}");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}
