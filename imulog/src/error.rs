use imulog_common::calib::CalibrationParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("sensor error: {0}")]
    Sensor(String),

    #[error("serial error: {0:?}")]
    Serial(embedded_io::ErrorKind),

    #[error("invalid calibration file: {0}")]
    InvalidCalibration(#[from] CalibrationParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unreadable configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, DeviceError>;

pub(crate) fn sensor_err<E: core::fmt::Debug>(e: E) -> DeviceError {
    DeviceError::Sensor(format!("{:?}", e))
}

pub(crate) fn serial_err<E: embedded_io::Error>(e: E) -> DeviceError {
    DeviceError::Serial(e.kind())
}
