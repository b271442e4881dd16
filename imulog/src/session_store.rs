//! Directory of session files.
//!
//! A session is recorded into `<id>.part` and renamed to `<id>.<ext>` once it
//! is closed, so a crash mid-recording never leaves a file that looks
//! complete. The last issued identifier is kept in `.last_id` so identifiers
//! keep increasing after sessions are deleted.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use imulog_common::RecordFormat;
use log::{debug, error, info, warn};

use crate::config::SessionNaming;
use crate::error::Result;

const PART_EXTENSION: &str = "part";
const LAST_ID_FILE: &str = ".last_id";

/// A closed session on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: u64,
    path: PathBuf,
    len: u64,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The session currently being recorded.
pub struct SessionWriter {
    id: u64,
    file: File,
    part_path: PathBuf,
    final_path: PathBuf,
    records: usize,
}

impl SessionWriter {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Append one encoded record.
    pub fn append(&mut self, record: &[u8]) -> Result<()> {
        self.file.write_all(record)?;
        self.records += 1;
        Ok(())
    }

    /// Close the session and publish it under its final name.
    pub fn finish(self) -> Result<SessionHandle> {
        self.file.sync_all()?;
        let len = self.file.metadata()?.len();
        drop(self.file);

        fs::rename(&self.part_path, &self.final_path)?;
        info!(
            "Closed session {} ({} records, {} bytes)",
            self.id, self.records, len
        );
        Ok(SessionHandle {
            id: self.id,
            path: self.final_path,
            len,
        })
    }

    /// Give up on the session. The partial file stays behind under its
    /// `.part` name and is cleared by the next enumeration.
    pub fn abandon(self) {
        warn!(
            "Abandoned session {} after {} records",
            self.id, self.records
        );
    }
}

pub struct SessionStore {
    dir: PathBuf,
    format: RecordFormat,
    naming: SessionNaming,
}

impl SessionStore {
    /// Open `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>, format: RecordFormat, naming: SessionNaming) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, format, naming })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Strictly greater than every identifier issued before.
    pub fn next_session_id(&self) -> Result<u64> {
        let floor = self.highest_file_id()?.max(self.last_issued_id()?);
        let next = match self.naming {
            SessionNaming::Sequential => floor + 1,
            SessionNaming::Timestamp => {
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                now.max(floor + 1)
            }
        };
        Ok(next)
    }

    /// Allocate the next identifier and open its file for writing.
    pub fn create(&self) -> Result<SessionWriter> {
        let id = self.next_session_id()?;
        fs::write(self.dir.join(LAST_ID_FILE), id.to_string())?;

        let part_path = self.dir.join(format!("{}.{}", id, PART_EXTENSION));
        let final_path = self.dir.join(format!("{}.{}", id, self.format.extension()));
        let file = File::create(&part_path)?;
        info!("Opened session {}", id);

        Ok(SessionWriter {
            id,
            file,
            part_path,
            final_path,
            records: 0,
        })
    }

    /// Closed sessions in identifier order. Zero-byte sessions and leftover
    /// `.part` files are deleted on the way; files that are not a whole
    /// number of records are skipped.
    pub fn list_valid_sessions(&self) -> Result<Vec<SessionHandle>> {
        let mut sessions = Vec::new();
        let record_len = self.format.record_len() as u64;

        for entry in fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    error!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let Some((id, ext)) = parse_session_name(&path) else {
                continue;
            };

            if ext == PART_EXTENSION {
                warn!("Removing unfinished session {}", id);
                remove_quietly(&path);
                continue;
            }
            if ext != self.format.extension() {
                debug!("Ignoring {} (not a .{} session)", path.display(), self.format.extension());
                continue;
            }

            let len = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    error!("Skipping session {}: {}", id, e);
                    continue;
                }
            };
            if len == 0 {
                warn!("Removing empty session {}", id);
                remove_quietly(&path);
                continue;
            }
            if len % record_len != 0 {
                warn!(
                    "Skipping corrupt session {}: {} bytes is not a multiple of {}",
                    id, len, record_len
                );
                continue;
            }

            sessions.push(SessionHandle { id, path, len });
        }

        sessions.sort_by_key(|s| s.id);
        Ok(sessions)
    }

    pub fn read(&self, handle: &SessionHandle) -> Result<Vec<u8>> {
        Ok(fs::read(&handle.path)?)
    }

    pub fn delete(&self, handle: &SessionHandle) -> Result<()> {
        fs::remove_file(&handle.path)?;
        debug!("Deleted session {}", handle.id);
        Ok(())
    }

    /// Highest closed session. Unfinished ids are already covered by
    /// `.last_id`, which `create` writes before opening the file.
    fn highest_file_id(&self) -> Result<u64> {
        let mut highest = 0;
        for entry in fs::read_dir(&self.dir)? {
            match parse_session_name(&entry?.path()) {
                Some((_, PART_EXTENSION)) | None => {}
                Some((id, _)) => highest = highest.max(id),
            }
        }
        Ok(highest)
    }

    fn last_issued_id(&self) -> Result<u64> {
        match fs::read_to_string(self.dir.join(LAST_ID_FILE)) {
            Ok(text) => Ok(text.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable {}", LAST_ID_FILE);
                0
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// `<id>.<ext>` -> `(id, ext)`.
fn parse_session_name(path: &Path) -> Option<(u64, &str)> {
    let id = path.file_stem()?.to_str()?.parse().ok()?;
    let ext = path.extension()?.to_str()?;
    Some((id, ext))
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        error!("Could not remove {}: {}", path.display(), e);
    }
}
