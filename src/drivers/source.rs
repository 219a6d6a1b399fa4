use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use log::{debug, warn};
use rand::Rng;
use crate::drivers::SessionError;
use crate::types::{Reading, StreamKind};
/// Callback invoked by a sensor source for every reading it produces.
pub type Listener = Box<dyn Fn(Reading) + Send + Sync + 'static>;
/// Opaque handle returned by [`SensorSource::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);
/// External, asynchronously delivering motion sensor.
///
/// Sources may invoke a listener from any thread, and may still deliver one
/// in-flight reading after `remove_listener` returns.
pub trait SensorSource: Send + Sync {
    fn kind(&self) -> StreamKind;
    fn set_update_interval(&self, interval: Duration);
    fn add_listener(&self, listener: Listener) -> Result<ListenerId, SessionError>;
    fn remove_listener(&self, id: ListenerId);
}
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
/// Synthetic sensor: a slow sine per axis plus uniform noise.
pub struct SimulatedSensor {
    kind: StreamKind,
    amplitude: f64,
    noise: f64,
    interval_ms: Arc<AtomicU64>,
    next_id: AtomicU64,
    running: Mutex<HashMap<ListenerId, Arc<AtomicBool>>>,
}
impl SimulatedSensor {
    pub fn new(kind: StreamKind, amplitude: f64, noise: f64) -> Self {
        Self {
            kind,
            amplitude,
            noise: noise.abs(),
            interval_ms: Arc::new(AtomicU64::new(16)),
            next_id: AtomicU64::new(1),
            running: Mutex::new(HashMap::new()),
        }
    }
}
impl SensorSource for SimulatedSensor {
    fn kind(&self) -> StreamKind {
        self.kind
    }
    fn set_update_interval(&self, interval: Duration) {
        let ms = (interval.as_millis() as u64).max(1);
        self.interval_ms.store(ms, Ordering::Relaxed);
    }
    fn add_listener(&self, listener: Listener) -> Result<ListenerId, SessionError> {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let alive = Arc::new(AtomicBool::new(true));
        let interval_ms = Arc::clone(&self.interval_ms);
        let flag = Arc::clone(&alive);
        let (amplitude, noise) = (self.amplitude, self.noise);
        // 相位错开，让两路数据看起来不一样
        let phase_step = match self.kind {
            StreamKind::Acceleration => 0.05,
            StreamKind::AngularVelocity => 0.08,
        };
        thread::Builder::new()
            .name(format!("sim-{}-{}", self.kind, id.0))
            .spawn(move || {
                let mut rng = rand::thread_rng();
                let mut phase = 0.0f64;
                while flag.load(Ordering::Acquire) {
                    phase += phase_step;
                    let mut jitter = || {
                        if noise > 0.0 {
                            rng.gen_range(-noise..noise)
                        } else {
                            0.0
                        }
                    };
                    let reading = Reading::new(
                        amplitude * phase.sin() + jitter(),
                        amplitude * (phase * 0.7).cos() + jitter(),
                        amplitude * 0.5 * (phase * 1.3).sin() + jitter(),
                    );
                    listener(reading);
                    thread::sleep(Duration::from_millis(interval_ms.load(Ordering::Relaxed)));
                }
            })
            .map_err(|e| SessionError::SubscriptionFailure {
                stream: self.kind,
                reason: e.to_string(),
            })?;
        lock(&self.running).insert(id, alive);
        debug!("{} listener {} attached", self.kind, id.0);
        Ok(id)
    }
    fn remove_listener(&self, id: ListenerId) {
        match lock(&self.running).remove(&id) {
            Some(alive) => {
                alive.store(false, Ordering::Release);
                debug!("{} listener {} detached", self.kind, id.0);
            }
            None => warn!("{} listener {} was not attached", self.kind, id.0),
        }
    }
}
impl Drop for SimulatedSensor {
    fn drop(&mut self) {
        for alive in lock(&self.running).values() {
            alive.store(false, Ordering::Release);
        }
    }
}
/// Deterministic source for tests: readings are pushed by hand.
#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    #[derive(Default)]
    struct Inner {
        next_id: u64,
        listeners: HashMap<ListenerId, Arc<Listener>>,
        detached: Vec<Arc<Listener>>,
        fail_attach: bool,
        interval: Option<Duration>,
        attach_calls: usize,
    }
    pub struct ManualSensor {
        kind: StreamKind,
        inner: Mutex<Inner>,
    }
    impl ManualSensor {
        pub fn new(kind: StreamKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                inner: Mutex::new(Inner::default()),
            })
        }
        pub fn fail_attach(&self, fail: bool) {
            lock(&self.inner).fail_attach = fail;
        }
        /// Delivers a reading to every attached listener.
        pub fn emit(&self, reading: Reading) {
            let listeners: Vec<Arc<Listener>> = lock(&self.inner).listeners.values().cloned().collect();
            for listener in listeners {
                listener(reading);
            }
        }
        /// Replays a reading through the most recently detached listener,
        /// like a callback that was already in flight when it was removed.
        pub fn emit_late(&self, reading: Reading) {
            let late = lock(&self.inner).detached.last().cloned();
            if let Some(listener) = late {
                listener(reading);
            }
        }
        pub fn listener_count(&self) -> usize {
            lock(&self.inner).listeners.len()
        }
        pub fn attach_calls(&self) -> usize {
            lock(&self.inner).attach_calls
        }
        pub fn interval(&self) -> Option<Duration> {
            lock(&self.inner).interval
        }
    }
    impl SensorSource for ManualSensor {
        fn kind(&self) -> StreamKind {
            self.kind
        }
        fn set_update_interval(&self, interval: Duration) {
            lock(&self.inner).interval = Some(interval);
        }
        fn add_listener(&self, listener: Listener) -> Result<ListenerId, SessionError> {
            let mut inner = lock(&self.inner);
            inner.attach_calls += 1;
            if inner.fail_attach {
                return Err(SessionError::SubscriptionFailure {
                    stream: self.kind,
                    reason: "sensor unavailable".into(),
                });
            }
            inner.next_id += 1;
            let id = ListenerId(inner.next_id);
            inner.listeners.insert(id, Arc::new(listener));
            Ok(id)
        }
        fn remove_listener(&self, id: ListenerId) {
            let mut inner = lock(&self.inner);
            if let Some(listener) = inner.listeners.remove(&id) {
                inner.detached.push(listener);
            }
        }
    }
}
