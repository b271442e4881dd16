use imulog::{DeviceConfig, State};
use imulog_common::printable::from_printable;
use imulog_common::transfer::read_listing;
use imulog_common::{RecordFormat, Sample};

use crate::common::{command, init_logging, record_session, test_config, Board, Delay, MAG_X};

#[test]
fn test_record_and_download_at_5hz() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    assert_eq!(config.sample_frequency_hz, 5.0);

    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    let states = record_session(&mut controller, &board, 10);
    assert_eq!(states.last(), Some(&State::Idle));

    // 10 ticks of 200 ms
    assert_eq!(board.delay.count(Delay::Us(200_000)), 10);
    let on_disk = std::fs::read(config.session_dir.join("1.bin")).unwrap();
    assert_eq!(on_disk.len(), 10 * 36);

    let output = command(&mut controller, &board, "sendfiles\n");
    let sessions = read_listing(&mut output.as_slice()).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, 1);
    assert_eq!(sessions[0].payload, on_disk);

    let decoded: Vec<Sample> = RecordFormat::Binary
        .records(&sessions[0].payload)
        .unwrap()
        .map(|r| RecordFormat::Binary.decode(r).unwrap())
        .collect();
    assert_eq!(decoded, vec![MAG_X; 10]);

    // sent sessions are gone
    assert!(!config.session_dir.join("1.bin").exists());
    assert_eq!(command(&mut controller, &board, "sendfiles\n"), b"0\n");
}

#[test]
fn test_printable_sessions() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        record_format: RecordFormat::Printable,
        ..test_config(dir.path())
    };
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    record_session(&mut controller, &board, 3);
    assert!(config.session_dir.join("1.txt").is_file());

    let output = command(&mut controller, &board, "sendfiles\n");
    let sessions = read_listing(&mut output.as_slice()).unwrap();
    assert_eq!(sessions.len(), 1);

    let payload = &sessions[0].payload;
    assert_eq!(payload.len(), 3 * 48);
    assert!(payload.iter().all(u8::is_ascii_graphic));
    assert_eq!(
        &payload[..48],
        b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAgD8AAACA".as_slice()
    );

    for token in payload.chunks_exact(48) {
        let bytes = from_printable(token).unwrap();
        assert_eq!(Sample::from_bytes(&bytes), MAG_X);
    }
}

#[test]
fn test_ids_increase_across_downloads() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);

    record_session(&mut controller, &board, 2);
    record_session(&mut controller, &board, 1);

    let output = command(&mut controller, &board, "sendfiles\n");
    let sessions = read_listing(&mut output.as_slice()).unwrap();
    let ids: Vec<u64> = sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(sessions[0].payload.len(), 2 * 36);
    assert_eq!(sessions[1].payload.len(), 36);

    record_session(&mut controller, &board, 1);
    let output = command(&mut controller, &board, "sendfiles\n");
    let sessions = read_listing(&mut output.as_slice()).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, 3);
}

#[test]
fn test_sessions_survive_restart() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    {
        let board = Board::new(MAG_X);
        let mut controller = board.controller(&config);
        record_session(&mut controller, &board, 4);
    }

    let board = Board::new(MAG_X);
    let mut controller = board.controller(&config);
    let output = command(&mut controller, &board, "sendfiles\n");
    let sessions = read_listing(&mut output.as_slice()).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].payload.len(), 4 * 36);

    record_session(&mut controller, &board, 1);
    assert!(config.session_dir.join("2.bin").is_file());
}
