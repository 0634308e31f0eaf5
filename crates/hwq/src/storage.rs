use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use tempfile::NamedTempFile;

use hwq_core::store::{MemoryStore, RecordStore, StoreTx, Tables};
use hwq_core::CoreError;

/// Record store kept in a JSON file shared by every process using the same path.
///
/// Each read and transaction locks a sidecar `<file>.lock` (shared for reads, exclusive for
/// transactions) and reloads the tables from disk under that lock. The file is replaced
/// atomically: the tables are written into a temporary file in the same directory, which is
/// then renamed over the previous version. A transaction whose tables cannot be written is
/// not committed.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    pub fn open(path: &Path) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");
        let store = Self {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_path),
            memory: MemoryStore::new(),
        };
        let tables = {
            let _lock = store.lock(FlockArg::LockShared)?;
            read_tables(path)?
        };
        store.memory.replace_tables(tables)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, kind: FlockArg) -> crate::Result<Flock<File>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Flock::lock(file, kind).map_err(|(_, errno)| crate::Error::IoError(errno.into()))
    }

    /// Locks the record file and loads its current content into memory.
    fn refresh(&self, kind: FlockArg) -> hwq_core::Result<Flock<File>> {
        let (lock, tables) = self
            .lock(kind)
            .and_then(|lock| Ok((lock, read_tables(&self.path)?)))
            .map_err(|e| {
                log::error!("Cannot read record file {}: {e}", self.path.display());
                CoreError::UpstreamUnavailable(format!("cannot read record file: {e}"))
            })?;
        self.memory.replace_tables(tables)?;
        Ok(lock)
    }
}

fn read_tables(path: &Path) -> crate::Result<Tables> {
    if !path.exists() {
        log::debug!("Record file {} does not exist yet", path.display());
        return Ok(Tables::default());
    }
    let data = std::fs::read(path)?;
    serde_json::from_slice::<Tables>(&data).map_err(|e| {
        crate::Error::DeserializationError(format!("Invalid record file {}: {e}", path.display()))
    })
}

fn write_tables(path: &Path, tables: &Tables) -> crate::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, tables)?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecordStore for FileStore {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> hwq_core::Result<T>) -> hwq_core::Result<T> {
        let _lock = self.refresh(FlockArg::LockShared)?;
        self.memory.read(f)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> hwq_core::Result<T>,
    ) -> hwq_core::Result<T> {
        let _lock = self.refresh(FlockArg::LockExclusive)?;
        self.memory.transaction_with_hook(f, |tables| {
            write_tables(&self.path, tables).map_err(|e| {
                log::error!("Cannot write record file {}: {e}", self.path.display());
                CoreError::UpstreamUnavailable(format!("cannot write record file: {e}"))
            })
        })
    }
}
