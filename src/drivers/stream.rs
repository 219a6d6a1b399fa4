use std::sync::Arc;
use std::time::Duration;
use log::debug;
use crate::drivers::source::{Listener, ListenerId, SensorSource};
use crate::drivers::SessionError;
use crate::types::StreamKind;
/// Owned subscription to one external sensor source.
///
/// Attach and detach are both idempotent. The source itself is shared and
/// never owned; only the listener registration is.
pub struct SampleStream {
    source: Arc<dyn SensorSource>,
    handle: Option<ListenerId>,
}
impl SampleStream {
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self {
            source,
            handle: None,
        }
    }
    pub fn kind(&self) -> StreamKind {
        self.source.kind()
    }
    pub fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }
    pub fn set_interval(&self, interval: Duration) {
        self.source.set_update_interval(interval);
    }
    /// A second call while subscribed keeps the first callback.
    pub fn subscribe(&mut self, interval: Duration, on_sample: Listener) -> Result<(), SessionError> {
        if self.handle.is_some() {
            debug!("{} already subscribed", self.kind());
            return Ok(());
        }
        self.source.set_update_interval(interval);
        let id = self.source.add_listener(on_sample)?;
        self.handle = Some(id);
        Ok(())
    }
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.handle.take() {
            self.source.remove_listener(id);
        }
    }
}
impl Drop for SampleStream {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::source::manual::ManualSensor;
    use crate::types::Reading;
    use std::sync::atomic::{AtomicUsize, Ordering};
    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
    #[test]
    fn second_subscribe_keeps_first_callback() {
        let sensor = ManualSensor::new(StreamKind::Acceleration);
        let mut stream = SampleStream::new(sensor.clone());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        stream.subscribe(Duration::from_millis(16), counting(&first)).unwrap();
        stream.subscribe(Duration::from_millis(16), counting(&second)).unwrap();
        sensor.emit(Reading::default());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert_eq!(sensor.attach_calls(), 1);
        assert_eq!(sensor.interval(), Some(Duration::from_millis(16)));
    }
    #[test]
    fn unsubscribe_is_idempotent_and_stops_delivery() {
        let sensor = ManualSensor::new(StreamKind::AngularVelocity);
        let mut stream = SampleStream::new(sensor.clone());
        stream.unsubscribe();
        let hits = Arc::new(AtomicUsize::new(0));
        stream.subscribe(Duration::from_millis(5), counting(&hits)).unwrap();
        stream.unsubscribe();
        stream.unsubscribe();
        sensor.emit(Reading::default());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(sensor.listener_count(), 0);
        assert!(!stream.is_subscribed());
    }
    #[test]
    fn failed_attach_leaves_stream_unsubscribed() {
        let sensor = ManualSensor::new(StreamKind::Acceleration);
        sensor.fail_attach(true);
        let mut stream = SampleStream::new(sensor.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let err = stream
            .subscribe(Duration::from_millis(5), counting(&hits))
            .unwrap_err();
        assert!(matches!(err, SessionError::SubscriptionFailure { .. }));
        assert!(!stream.is_subscribed());
    }
}
