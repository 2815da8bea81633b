#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use fs2::FileExt;

const LOCK_DIR: &str = "/var/lock";

/// Exclusive advisory lock held for as long as the guard lives.
pub struct PoolLock {
    file: File,
    path: PathBuf,
}

impl std::fmt::Debug for PoolLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolLock").field("path", &self.path).finish()
    }
}

impl Drop for PoolLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl PoolLock {
    pub fn try_acquire(pool: &str) -> Result<Self> {
        Self::try_acquire_at(&lock_path_for(pool))
    }

    fn try_acquire_at(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create lock dir {}", dir.display()))?;
        }
        let file = open_lockfile(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                file,
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                bail!("another run holds lock: {}", path.display())
            }
            Err(e) => Err(e).with_context(|| format!("flock {}", path.display())),
        }
    }
}

fn open_lockfile(path: &Path) -> Result<File> {
    let mut opts = OpenOptions::new();
    opts.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        opts.mode(0o644);
    }
    opts.open(path)
        .with_context(|| format!("open lockfile {}", path.display()))
}

fn lock_path_for(pool: &str) -> PathBuf {
    let file = format!("{}.lock", sanitize_name(pool));
    let dir = Path::new(LOCK_DIR);
    if writable_dir(dir) {
        dir.join(file)
    } else {
        std::env::temp_dir().join(file)
    }
}

fn writable_dir(dir: &Path) -> bool {
    dir.is_dir()
        && fs::metadata(dir)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
        && {
            let probe = dir.join(".zpoolctl_lock_probe");
            let ok = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&probe)
                .is_ok();
            let _ = fs::remove_file(probe);
            ok
        }
}

fn sanitize_name(pool: &str) -> String {
    let filtered: String = pool
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    format!("lock_zpoolctl-{filtered}")
}
