//! Session controller for a button-driven 9-axis motion logger.

/// modules
pub mod calib_store;
pub mod config;
pub mod controller;
pub mod error;
pub mod hw;
pub mod protocol;
pub mod session_store;

pub use calib_store::CalibrationStore;
pub use config::{ButtonLayout, DeviceConfig, SessionNaming};
pub use controller::{Controller, State};
pub use error::{DeviceError, Result};
pub use hw::{Bias, Peripherals, SampleSource, Unconnected};
pub use session_store::{SessionHandle, SessionStore, SessionWriter};
