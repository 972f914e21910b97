// src/file.rs

use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use crate::csv::write_row;
use crate::error::StoreError;

pub fn ensure_directory(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() && !dir.is_dir() {
        return Err(StoreError::io(
            dir,
            std::io::Error::other("path exists but is not a directory"),
        ));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    Ok(())
}

/// Append rows to a CSV file, writing `headers` first when the file is new
/// or empty. The whole batch is flushed and synced before returning.
pub fn append_rows<S: AsRef<str>>(
    path: &Path,
    headers: Option<&[&str]>,
    rows: &[Vec<S>],
    sep: char,
) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let fresh = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    let mut out = BufWriter::new(file);

    let io = |e| StoreError::io(path, e);
    if fresh {
        if let Some(h) = headers {
            write_row(&mut out, h, sep).map_err(io)?;
        }
    }
    for row in rows {
        write_row(&mut out, row, sep).map_err(io)?;
    }
    out.flush().map_err(io)?;
    out.get_ref().sync_data().map_err(io)?;
    Ok(())
}

/// Replace `path` with `contents` via a temp file in the same directory and a
/// rename, so readers see either the old or the new file, never half of one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::Persist { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}

/// Read a file, treating "not found" as empty.
pub fn read_or_empty(path: &Path) -> Result<String, StoreError> {
    match fs::read_to_string(path) {
        Ok(t) => Ok(t),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(s!()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
