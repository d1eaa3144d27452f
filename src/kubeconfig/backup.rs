// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Timestamped backups of the kubeconfig taken before it is overwritten.

use crate::constants::kubeconfig::{BACKUP_INFIX, BACKUP_TIMESTAMP_FORMAT};
use crate::error::{Result, UpdaterError};
use crate::kubeconfig::persist::secure_file_options;
use chrono::Local;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const MAX_NAME_ATTEMPTS: u32 = 16;

/// `<path>.backup.<YYYYMMDD-HHMMSS.uuuuuu>` for the current local time
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_INFIX);
    name.push(Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// Copy the current contents of `path` next to it.
///
/// Returns `None` when there is no file to back up. The backup is created
/// exclusively with owner-only permissions, so an existing backup is never
/// overwritten; a name collision waits for the clock to move on.
pub fn create_backup(path: &Path) -> Result<Option<PathBuf>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(UpdaterError::BackupFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if metadata.is_dir() {
        return Err(UpdaterError::DirectoryNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|source| UpdaterError::BackupFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut attempts = 0;
    loop {
        let backup_path = backup_path_for(path);
        match secure_file_options().create_new(true).open(&backup_path) {
            Ok(mut file) => {
                let written = file.write_all(&data).and_then(|_| file.sync_all());
                if let Err(source) = written {
                    drop(file);
                    let _ = fs::remove_file(&backup_path);
                    return Err(UpdaterError::BackupFailed {
                        path: backup_path,
                        source,
                    });
                }
                return Ok(Some(backup_path));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempts < MAX_NAME_ATTEMPTS => {
                attempts += 1;
                thread::sleep(Duration::from_micros(1));
            }
            Err(source) => {
                return Err(UpdaterError::BackupFailed {
                    path: backup_path,
                    source,
                })
            }
        }
    }
}
