// src/drivers/mod.rs
// 传感器接入层：数据源、订阅句柄、双流缓冲区
pub mod buffer;
pub mod error;
pub mod source;
pub mod stream;
pub use buffer::{BufferSnapshot, Sample, SampleBuffer};
pub use error::SessionError;
pub use source::{Listener, ListenerId, SensorSource, SimulatedSensor};
pub use stream::SampleStream;
