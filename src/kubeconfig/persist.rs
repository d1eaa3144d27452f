// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Loading and saving the kubeconfig file.
//!
//! A save validates and serializes the document first, then backs up the
//! existing file (the symlink target, if the path is a link), then writes through a temp file in the same directory that
//! is renamed over the target. A failure at any point leaves the original
//! file as it was.

use crate::constants::kubeconfig::TEMP_FILE_PREFIX;
use crate::error::{Result, UpdaterError};
use crate::kubeconfig::backup::create_backup;
use crate::kubeconfig::model::Kubeconfig;
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Write-only options that create files readable by the owner only
pub(crate) fn secure_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options
}

/// Load the kubeconfig at `path`.
///
/// A missing file yields an empty document so a first run can create it.
pub fn load_kubeconfig(path: &Path) -> Result<Kubeconfig> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No kubeconfig at {}, starting empty", path.display());
            return Ok(Kubeconfig::new());
        }
        Err(source) => {
            if path.is_dir() {
                return Err(UpdaterError::DirectoryNotFound(path.to_path_buf()));
            }
            return Err(UpdaterError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Kubeconfig::from_yaml(&data)
}

/// Validate, back up and atomically replace the kubeconfig at `path`.
///
/// A symlinked `path` is followed so the file it points at is replaced and
/// the link stays in place.
pub fn save_kubeconfig(config: &Kubeconfig, path: &Path) -> Result<SaveOutcome> {
    save_kubeconfig_with(config, path, |file, data| file.write_all(data))
}

pub(crate) fn save_kubeconfig_with<W>(config: &Kubeconfig, path: &Path, write: W) -> Result<SaveOutcome>
where
    W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let path = resolve_target(path)?;

    // Stale references already on disk are kept, new ones are refused
    let baseline = load_kubeconfig(&path).unwrap_or_default();
    config.validate_against(&baseline)?;
    let yaml = config.to_yaml()?;

    if path.is_dir() {
        return Err(UpdaterError::DirectoryNotFound(path));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir)?;

    let backup = create_backup(&path)?;
    if let Some(backup) = &backup {
        info!("Backed up {} to {}", path.display(), backup.display());
    }

    write_atomic(&path, &dir, yaml.as_bytes(), write)?;

    Ok(SaveOutcome { path, backup })
}

/// The file a save should replace: `path` itself, or its target if it is a symlink
fn resolve_target(path: &Path) -> Result<PathBuf> {
    let is_link = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return Ok(path.to_path_buf());
    }

    let io_error = |source: io::Error| UpdaterError::Io {
        path: path.to_path_buf(),
        source,
    };
    let target = match fs::canonicalize(path) {
        Ok(target) => target,
        // Link to a file that does not exist yet
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let link = fs::read_link(path).map_err(io_error)?;
            match path.parent() {
                Some(parent) => parent.join(link),
                None => link,
            }
        }
        Err(e) => return Err(io_error(e)),
    };
    debug!("{} is a symlink to {}", path.display(), target.display());
    Ok(target)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir).map_err(|source| UpdaterError::WriteFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!("Created directory {}", dir.display());
    Ok(())
}

fn write_atomic<W>(path: &Path, dir: &Path, data: &[u8], write: W) -> Result<()>
where
    W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let write_failed = |source: io::Error| UpdaterError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    // The temp file is removed on drop if anything below fails
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(dir)
        .map_err(write_failed)?;

    write(tmp.as_file_mut(), data).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;

    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(FILE_MODE))
        .map_err(write_failed)?;

    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    // Renaming keeps the temp file's mode, but an umask could have narrowed it
    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE)).map_err(write_failed)?;

    Ok(())
}
