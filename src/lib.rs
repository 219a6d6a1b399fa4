//! Two-stream motion recorder: collects accelerometer and gyroscope readings
//! into labeled sessions and hands them to a persistence or classifier service.
pub mod config;
pub mod console;
pub mod controller;
pub mod drivers;
pub mod engine;
pub mod gateway;
pub mod recorder;
pub mod types;
pub mod view;
