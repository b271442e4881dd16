use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use imulog_common::{RecordFormat, BAUD_RATE};
use log::{error, info, warn};

mod export;
mod link;

#[derive(Parser, Debug)]
#[command(name = "imulog")]
#[command(about = "Talk to an imulog motion logger over its serial port", long_about = None)]
struct Args {
    /// Serial port of the device (first USB serial port if omitted)
    #[arg(long)]
    port: Option<String>,

    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Seconds to wait for a response
    #[arg(long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Blink the status indicator
    Flash,
    /// Calibrate the magnetometer while the device is rotated by hand
    Calibmag {
        /// Seconds to allow for the whole calibration
        #[arg(long, default_value = "120")]
        wait: u64,
    },
    /// Report whether a magnetometer calibration is stored
    Issetup,
    /// Download every session, removing them from the device
    Download {
        #[arg(long, default_value = "imulog_sessions")]
        out_dir: PathBuf,

        /// Record format the device is configured for: binary or printable
        #[arg(long, default_value = "binary")]
        format: RecordFormat,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let port = match args.port {
        Some(port) => port,
        None => link::find_device_port().ok_or_else(|| anyhow!("no USB serial port found, pass --port"))?,
    };
    let timeout = Duration::from_secs(args.timeout);
    let mut device = link::open(&port, args.baud, timeout)?;

    match args.command {
        Cmd::Flash => {
            device.flash(timeout)?;
            info!("done");
        }
        Cmd::Calibmag { wait } => {
            device.calibrate_magnetometer(Duration::from_secs(wait))?;
            info!("Magnetometer calibration stored on the device");
        }
        Cmd::Issetup => {
            let setup = device.is_setup(timeout)?;
            println!("{}", setup);
            if !setup {
                warn!("No magnetometer calibration, run calibmag");
            }
        }
        Cmd::Download { out_dir, format } => {
            let sessions = device.download()?;
            for session in &sessions {
                // already removed from the device, save what we can
                match export::write_session(&out_dir, session, format) {
                    Ok((raw, csv)) => println!("{} {}", raw.display(), csv.display()),
                    Err(e) => error!("Session {}: {:#}", session.id, e),
                }
            }
            info!("{} sessions written to {}", sessions.len(), out_dir.display());
        }
    }
    Ok(())
}
