use std::fs;

use imulog::{Controller, DeviceConfig, DeviceError, State};
use imulog_common::CalibrationRecord;

use crate::common::{init_logging, test_config, Board, Delay, MAG_X};

const OFFSET: [f32; 3] = [29.04609, 34.06641, -52.03125];
const SCALE: [f32; 3] = [0.9980365, 1.032012, 0.9717683];

#[test]
fn test_startup_blink() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let controller = board.controller(&config);

    assert_eq!(controller.state(), State::Idle);
    assert_eq!(board.status_led.history(), vec![true, false]);
    assert_eq!(board.delay.calls(), vec![Delay::Ms(config.startup_blink_ms)]);
}

#[test]
fn test_missing_calibration_uses_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        default_mag_offset: OFFSET,
        default_mag_scale: SCALE,
        ..test_config(dir.path())
    };
    let board = Board::new(MAG_X);
    let controller = board.controller(&config);

    let expected = CalibrationRecord::new(OFFSET, SCALE);
    assert_eq!(controller.calibration(), &expected);
    assert_eq!(board.source.applied(), vec![expected]);
    assert!(!config.calibration_path.exists());
}

#[test]
fn test_offset_only_file_takes_default_scale() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        default_mag_scale: SCALE,
        ..test_config(dir.path())
    };
    fs::write(&config.calibration_path, "29.04609 34.06641 -52.03125\n").unwrap();

    let board = Board::new(MAG_X);
    let controller = board.controller(&config);
    assert_eq!(controller.calibration(), &CalibrationRecord::new(OFFSET, SCALE));
}

#[test]
fn test_full_file_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    fs::write(
        &config.calibration_path,
        "1.5 -2.25 3\n0.5 2 1.25\n",
    )
    .unwrap();

    let board = Board::new(MAG_X);
    let controller = board.controller(&config);
    assert_eq!(
        controller.calibration(),
        &CalibrationRecord::new([1.5, -2.25, 3.0], [0.5, 2.0, 1.25])
    );
}

#[test]
fn test_garbage_file_falls_back_to_default() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    fs::write(&config.calibration_path, "not a calibration").unwrap();

    let board = Board::new(MAG_X);
    let controller = board.controller(&config);
    assert_eq!(controller.calibration(), &config.default_calibration());
    assert_eq!(board.source.applied(), vec![config.default_calibration()]);
}

#[test]
fn test_session_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        session_dir: dir.path().join("sd").join("sessions"),
        ..test_config(dir.path())
    };
    let board = Board::new(MAG_X);
    let _controller = board.controller(&config);
    assert!(config.session_dir.is_dir());
}

#[test]
fn test_rejects_bad_frequency() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        sample_frequency_hz: 0.0,
        ..test_config(dir.path())
    };
    let board = Board::new(MAG_X);
    let result = Controller::new(&config, board.source.clone(), board.peripherals());
    assert!(matches!(result, Err(DeviceError::Config(_))));
}
