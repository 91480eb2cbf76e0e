//! Recording and replaying raw acquisition payloads, so frames captured on
//! hardware can be decoded again later with different settings.

use crate::base::{Error, Result};
use log::{debug, trace};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension used for recorded payloads.
pub const RAW_FRAME_EXTENSION: &str = "frame";

/// Writes a raw payload, as returned by `TauCamera::read_frame_raw`, to `path`.
pub fn save_raw_frame<P: AsRef<Path>>(path: P, raw: &[u8]) -> Result<()> {
    let path = path.as_ref();
    trace!("Saving {} byte frame to {}", raw.len(), path.display());
    fs::write(path, raw)?;
    Ok(())
}

/// Reads back a payload written by `save_raw_frame`.
///
/// An empty file is rejected, since an empty payload only stands for a
/// missed acquisition.
pub fn load_raw_frame<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    if raw.is_empty() {
        return Err(Error::MalformedFrame {
            expected: 1,
            actual: 0,
        });
    }
    trace!("Loaded {} byte frame from {}", raw.len(), path.display());
    Ok(raw)
}

/// Lists the recorded payloads in `dir`, sorted by file name.
pub fn list_raw_frames<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == RAW_FRAME_EXTENSION) {
            frames.push(path);
        }
    }
    frames.sort();
    debug!("Found {} recorded frames in {}", frames.len(), dir.as_ref().display());
    Ok(frames)
}
