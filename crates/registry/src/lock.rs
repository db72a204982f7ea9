// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory inter-process lock serializing registry read-modify-write.
//!
//! The lock lives on a sibling `.lock` file, never on the registry itself:
//! the atomic save renames over the registry path, which would unlink the
//! locked inode and silently drop the lock.

use crate::store::{Registry, RegistryError};
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Sibling lock-file path for a registry file.
pub fn lock_path(registry: &Path) -> PathBuf {
    let mut name = registry.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    registry.with_file_name(name)
}

/// Run `f` while holding the exclusive advisory lock for `registry_path`.
///
/// Acquisition is a non-blocking attempt with exponential backoff, cancelled
/// promptly when `cancel` fires. `f` must be short-lived: holding the lock
/// across network I/O is forbidden.
pub async fn with_lock<T, F>(
    cancel: &CancellationToken,
    registry_path: &Path,
    f: F,
) -> Result<T, RegistryError>
where
    F: FnOnce() -> Result<T, RegistryError>,
{
    let lock_file_path = lock_path(registry_path);
    if let Some(parent) = lock_file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    // Never truncate: the file may be locked by another process and its
    // contents are irrelevant, only the inode matters.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_file_path)
        .map_err(|source| RegistryError::Io { path: lock_file_path.clone(), source })?;

    let mut backoff = INITIAL_BACKOFF;
    loop {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled(lock_file_path));
        }
        match file.try_lock_exclusive() {
            Ok(()) => break,
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                tracing::debug!(
                    path = %lock_file_path.display(),
                    backoff_ms = backoff.as_millis() as u64,
                    "registry lock contended, backing off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(RegistryError::Cancelled(lock_file_path));
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(source) => {
                return Err(RegistryError::Io { path: lock_file_path, source });
            }
        }
    }

    let result = f();
    // The lock also releases when `file` drops; unlock explicitly so the
    // release is not at the mercy of drop order.
    let _ = FileExt::unlock(&file);
    result
}

/// Composite read-modify-write: lock, load, run `f`, save only when `f`
/// succeeded, unlock.
pub async fn with_locked_registry<T, F>(
    cancel: &CancellationToken,
    registry_path: &Path,
    f: F,
) -> Result<T, RegistryError>
where
    F: FnOnce(&mut Registry) -> Result<T, RegistryError>,
{
    with_lock(cancel, registry_path, || {
        let mut registry = Registry::load(registry_path)?;
        let value = f(&mut registry)?;
        registry.save(registry_path)?;
        Ok(value)
    })
    .await
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
