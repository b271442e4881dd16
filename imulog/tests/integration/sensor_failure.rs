use imulog::{DeviceError, State};
use imulog_common::transfer::read_listing;

use crate::common::{command, init_logging, run_steps, test_config, Board, MAG_X};

#[test]
fn test_read_failure_discards_session() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    board.source.fail_on_read(4);
    let mut controller = board.controller(&config);

    board.start_stop.script([true]);
    board.calibrate.script([true]);
    let states = run_steps(&mut controller, 6);
    assert_eq!(states.last(), Some(&State::Recording));
    assert_eq!(board.source.reads(), 3);

    assert!(matches!(controller.step(), Err(DeviceError::Sensor(_))));
    assert_eq!(controller.state(), State::Idle);

    // the partial file never shows up as a session
    assert!(config.session_dir.join("1.part").exists());
    assert!(!config.session_dir.join("1.bin").exists());
    assert_eq!(command(&mut controller, &board, "sendfiles\n"), b"0\n");
    assert!(!config.session_dir.join("1.part").exists());
}

#[test]
fn test_recovers_after_failure() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    board.source.fail_calibration();
    let mut controller = board.controller(&config);

    board.start_stop.script([true]);
    board.calibrate.script([true]);
    run_steps(&mut controller, 2);
    assert!(controller.step().is_err());
    assert_eq!(controller.state(), State::Idle);

    // the operator can arm again straight away
    board.start_stop.script([true]);
    assert_eq!(controller.step().unwrap(), State::ArmedForCalibration);
    assert!(board.status_led.is_on());
}

#[test]
fn test_failed_session_id_is_not_reused() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    board.source.fail_on_read(1);
    let mut controller = board.controller(&config);

    board.start_stop.script([true]);
    board.calibrate.script([true]);
    run_steps(&mut controller, 3);
    assert!(controller.step().is_err());

    assert_eq!(command(&mut controller, &board, "sendfiles\n"), b"0\n");
    assert_eq!(controller.sessions().next_session_id().unwrap(), 2);

    let output = command(&mut controller, &board, "sendfiles\n");
    assert!(read_listing(&mut output.as_slice()).unwrap().is_empty());
}
