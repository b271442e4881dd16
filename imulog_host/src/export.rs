use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use imulog_common::transfer::TransferredSession;
use imulog_common::{RecordFormat, Sample};
use log::info;
use serde::Serialize;

/// One CSV row: a record in the stored, board-aligned frame.
#[derive(Debug, Serialize)]
struct CsvRow {
    index: usize,
    gyro_x: f32,
    gyro_y: f32,
    gyro_z: f32,
    accel_x: f32,
    accel_y: f32,
    accel_z: f32,
    mag_x: f32,
    mag_y: f32,
    mag_z: f32,
}

impl CsvRow {
    fn new(index: usize, sample: &Sample) -> Self {
        Self {
            index,
            gyro_x: sample.gyro[0],
            gyro_y: sample.gyro[1],
            gyro_z: sample.gyro[2],
            accel_x: sample.accel[0],
            accel_y: sample.accel[1],
            accel_z: sample.accel[2],
            mag_x: sample.mag[0],
            mag_y: sample.mag[1],
            mag_z: sample.mag[2],
        }
    }
}

pub fn export_to_csv(payload: &[u8], format: RecordFormat) -> Result<String> {
    let mut wtr = WriterBuilder::new().from_writer(vec![]);

    for (index, record) in format.records(payload)?.enumerate() {
        let bytes = format
            .record_bytes(record)
            .with_context(|| format!("record {}", index))?;
        wtr.serialize(CsvRow::new(index, &Sample::aligned_from_bytes(&bytes)))?;
    }

    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Write the raw payload as `<id>.<ext>` and its CSV export as `<id>.csv`.
pub fn write_session(out_dir: &Path, session: &TransferredSession, format: RecordFormat) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)?;

    let raw_path = out_dir.join(format!("{}.{}", session.id, format.extension()));
    fs::write(&raw_path, &session.payload)
        .with_context(|| format!("writing {}", raw_path.display()))?;

    let csv_path = out_dir.join(format!("{}.csv", session.id));
    let csv = export_to_csv(&session.payload, format)
        .with_context(|| format!("exporting session {}", session.id))?;
    fs::write(&csv_path, csv).with_context(|| format!("writing {}", csv_path.display()))?;

    info!(
        "Session {}: {} records -> {}",
        session.id,
        session.payload.len() / format.record_len(),
        csv_path.display()
    );
    Ok((raw_path, csv_path))
}
