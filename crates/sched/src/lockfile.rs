// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::error::SchedError;
use crate::identity::Role;

/// Acquire the advisory whole-file lock for this role's instance in
/// `priv_dir` and record our PID. The lock is held for the life of the
/// returned file handle; a second daemon fails here.
pub fn acquire(priv_dir: &Path, role: Role) -> Result<File, SchedError> {
    let path = priv_dir.join(role.lock_file_name());
    // Avoid truncating before we hold the lock, which would wipe the
    // running daemon's PID.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    file.try_lock_exclusive().map_err(|e| SchedError::LockFailed(path.clone(), e))?;

    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
