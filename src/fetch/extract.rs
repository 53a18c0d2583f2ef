use std::fs::{create_dir_all, remove_dir_all, rename};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::Result;


/// Sibling directory the archive is unpacked into before the final rename.
pub fn staging_dir(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());

    target.with_file_name(format!(".{}.partial", name))
}

/// Unzips `bytes` into `target`, replacing whatever was there.
///
/// Entries are written to a staging directory first which is only renamed
/// to `target` once every entry was extracted. On failure the staging
/// directory is removed and `target` is left untouched.
pub fn extract_archive(bytes: Vec<u8>, target: &Path) -> Result<PathBuf> {
    let staging = staging_dir(target);
    if staging.exists() {
        remove_dir_all(&staging)?;
    }
    create_dir_all(&staging)?;

    if let Err(e) = unzip_into(bytes, &staging) {
        let _ = remove_dir_all(&staging);
        return Err(e);
    }

    if target.exists() {
        remove_dir_all(target)?;
    }
    rename(&staging, target)?;

    Ok(target.to_path_buf())
}

fn unzip_into(bytes: Vec<u8>, dir: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    archive.extract(dir)?;

    Ok(())
}
