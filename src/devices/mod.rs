//! Local capture devices
//!
//! This module provides:
//! - The `CaptureDevices` trait for acquiring microphone and camera tracks
//! - `VirtualDevices`, a synthetic implementation for headless runs and tests
//! - `LocalPublisher`, which owns the local tracks for one session

mod capture;
mod publisher;
mod virtual_devices;

pub use capture::{CaptureDevices, LocalCapture};
pub use publisher::{LocalPublisher, PublisherStatus};
pub use virtual_devices::VirtualDevices;
