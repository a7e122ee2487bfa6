//! Whole-file atomic replacement: write a sibling temp file, sync, rename.

use crate::error::StoreError;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replace `path` with `bytes`, creating parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    write_atomic_with(path, |writer| writer.write_all(bytes))
}

/// Replace `path` with the pretty-printed JSON form of `value`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut rendered =
        serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    rendered.push('\n');
    write_atomic(path, rendered.as_bytes())
}

/// Replace `path` with whatever `fill` writes.
pub(crate) fn write_atomic_with<F>(path: &Path, fill: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    ensure_parent(path)?;

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), StoreError> {
        let file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        fill(&mut writer).map_err(|e| StoreError::io(&tmp_path, e))?;
        commit(writer, &tmp_path)
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    rename_into_place(&tmp_path, path)
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    Ok(())
}

/// Flush and sync a temp-file writer.
pub(crate) fn commit(mut writer: BufWriter<File>, tmp_path: &Path) -> Result<(), StoreError> {
    writer.flush().map_err(|e| StoreError::io(tmp_path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| StoreError::io(tmp_path, e.error()))?;
    file.sync_all().map_err(|e| StoreError::io(tmp_path, e))
}

pub(crate) fn rename_into_place(tmp_path: &Path, path: &Path) -> Result<(), StoreError> {
    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        StoreError::Io {
            path: format!("{} -> {}", tmp_path.display(), path.display()),
            message: e.to_string(),
        }
    })
}

pub(crate) fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
