use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::Snapshot;

/// Read the whole document. A missing or empty file is an empty database;
/// anything else that fails to parse is an error and the file is left alone.
pub fn load(path: &Path) -> Result<Snapshot> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Snapshot::default());
    }

    Ok(serde_json::from_slice(&bytes)?)
}

/// Write the whole document atomically: temp file, fsync, rename over the
/// original. A crash leaves either the previous or the new snapshot.
pub fn persist(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let data = serde_json::to_vec_pretty(snapshot)?;

    let temp_path = temp_path(path);
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    debug!(
        "Wrote snapshot to {} ({} chirps, {} users)",
        path.display(),
        snapshot.chirps.len(),
        snapshot.users.len()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
