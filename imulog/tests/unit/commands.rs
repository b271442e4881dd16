use imulog::{DeviceError, State};
use imulog_common::{CalibrationRecord, RecordFormat, Sample};

use crate::common::{command, init_logging, record_session, test_config, Board, Delay, MAG_X};

#[test]
fn test_flash() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    assert_eq!(command(&mut controller, &board, "flash\n"), b"done\n");

    let mut expected = vec![true, false];
    for _ in 0..config.flash_count {
        expected.extend([true, false]);
    }
    assert_eq!(board.status_led.history(), expected);
    assert_eq!(
        board.delay.count(Delay::Ms(config.flash_interval_ms)),
        2 * config.flash_count as usize
    );
    assert_eq!(controller.state(), State::Idle);
}

#[test]
fn test_unknown_command_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    assert!(command(&mut controller, &board, "frobnicate\n").is_empty());
    assert_eq!(controller.state(), State::Idle);
    assert_eq!(board.status_led.history(), vec![true, false]);

    // the link still works afterwards
    assert_eq!(command(&mut controller, &board, "issetup\n"), b"false\n");
}

#[test]
fn test_line_endings_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    assert_eq!(command(&mut controller, &board, "  issetup \r\n"), b"false\n");
}

#[test]
fn test_calibmag_sets_up_device() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);
    let expected = board.source.mag_result();

    assert_eq!(command(&mut controller, &board, "issetup\n"), b"false\n");
    assert_eq!(command(&mut controller, &board, "calibmag\n"), b"start\ndone\n");
    assert_eq!(command(&mut controller, &board, "issetup\n"), b"true\n");

    let text = std::fs::read_to_string(&config.calibration_path).unwrap();
    assert_eq!(CalibrationRecord::parse(&text, [1.0; 3]).unwrap(), expected);
    assert_eq!(controller.calibration(), &expected);
    assert_eq!(board.source.applied(), vec![config.default_calibration(), expected]);
}

#[test]
fn test_new_calibration_applies_to_next_recording() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let raw = Sample::new([0.5, 0.0, -0.5], [0.0, 0.0, 1.0], [30.0, 35.0, -50.0]);
    let board = Board::new(raw);
    let mut controller = board.controller(&config);

    command(&mut controller, &board, "calibmag\n");
    record_session(&mut controller, &board, 1);

    let sessions = controller.sessions().list_valid_sessions().unwrap();
    let payload = controller.sessions().read(&sessions[0]).unwrap();
    let sample = RecordFormat::Binary.decode(&payload).unwrap();
    assert_eq!(sample.mag, board.source.mag_result().correct(raw.mag));
    assert_eq!(sample.accel, raw.accel);
}

#[test]
fn test_failed_calibmag_keeps_previous_calibration() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    board.source.fail_mag_calibration();
    let mut controller = board.controller(&config);

    board.serial.send("calibmag\n");
    assert!(matches!(controller.step(), Err(DeviceError::Sensor(_))));
    assert_eq!(board.serial.take_output(), b"start\n");
    assert_eq!(controller.state(), State::Idle);

    assert!(!config.calibration_path.exists());
    assert_eq!(controller.calibration(), &config.default_calibration());
    assert_eq!(command(&mut controller, &board, "issetup\n"), b"false\n");
}

#[test]
fn test_sendfiles_with_nothing_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    assert_eq!(command(&mut controller, &board, "sendfiles\n"), b"0\n");
}
