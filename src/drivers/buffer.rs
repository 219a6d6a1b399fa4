use log::trace;
use crate::types::{Reading, StreamKind};
/// A reading accepted into the buffer, stamped with its arrival position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Position among all samples (both streams) accepted since the last reset.
    pub arrival_seq: u64,
    pub epoch: u64,
}
impl Sample {
    pub fn reading(&self) -> Reading {
        Reading::new(self.x, self.y, self.z)
    }
}
/// Immutable copy of a buffer, safe to hand to another thread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferSnapshot {
    pub epoch: u64,
    pub accel: Vec<Sample>,
    pub gyro: Vec<Sample>,
    pub count: u64,
}
impl BufferSnapshot {
    pub fn accel_readings(&self) -> Vec<Reading> {
        self.accel.iter().map(Sample::reading).collect()
    }
    pub fn gyro_readings(&self) -> Vec<Reading> {
        self.gyro.iter().map(Sample::reading).collect()
    }
    pub fn is_empty(&self) -> bool {
        self.accel.is_empty() && self.gyro.is_empty()
    }
}
/// Two independently appended sample sequences for one session.
///
/// Every listener is handed the epoch that was current when it was attached.
/// Deliveries stamped with any other epoch come from a superseded session and
/// are dropped without touching the sequences or the counter.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    accel: Vec<Sample>,
    gyro: Vec<Sample>,
    count: u64,
    next_seq: u64,
    epoch: u64,
}
impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
    /// Number of acceleration arrivals since the last reset.
    pub fn count(&self) -> u64 {
        self.count
    }
    pub fn reset(&mut self) {
        // Replace wholesale so no partially cleared state is ever observable.
        *self = Self {
            epoch: self.epoch.wrapping_add(1),
            ..Self::default()
        };
    }
    pub fn append_accel(&mut self, epoch: u64, reading: Reading) -> bool {
        if !self.accept(StreamKind::Acceleration, epoch) {
            return false;
        }
        let sample = self.stamp(reading);
        self.accel.push(sample);
        self.count += 1;
        true
    }
    pub fn append_gyro(&mut self, epoch: u64, reading: Reading) -> bool {
        if !self.accept(StreamKind::AngularVelocity, epoch) {
            return false;
        }
        let sample = self.stamp(reading);
        self.gyro.push(sample);
        true
    }
    pub fn append(&mut self, stream: StreamKind, epoch: u64, reading: Reading) -> bool {
        match stream {
            StreamKind::Acceleration => self.append_accel(epoch, reading),
            StreamKind::AngularVelocity => self.append_gyro(epoch, reading),
        }
    }
    pub fn last(&self, stream: StreamKind) -> Option<Reading> {
        let samples = match stream {
            StreamKind::Acceleration => &self.accel,
            StreamKind::AngularVelocity => &self.gyro,
        };
        samples.last().map(Sample::reading)
    }
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            epoch: self.epoch,
            accel: self.accel.clone(),
            gyro: self.gyro.clone(),
            count: self.count,
        }
    }
    fn accept(&self, stream: StreamKind, epoch: u64) -> bool {
        if epoch != self.epoch {
            trace!(
                "dropping stale {stream} sample (epoch {epoch}, current {})",
                self.epoch
            );
            return false;
        }
        true
    }
    fn stamp(&mut self, reading: Reading) -> Sample {
        let sample = Sample {
            x: reading.x,
            y: reading.y,
            z: reading.z,
            arrival_seq: self.next_seq,
            epoch: self.epoch,
        };
        self.next_seq += 1;
        sample
    }
}
