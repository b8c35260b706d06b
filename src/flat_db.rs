use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spdlog::{debug, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error encoding record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record {0} not found")]
    NotFound(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: u64,
    pub data: T,
}

/// A directory holding one JSON-lines file per collection
pub struct FlatDb {
    root: PathBuf,
}

impl FlatDb {
    pub fn open(root: &Path) -> Result<FlatDb, DbError> {
        fs::create_dir_all(root).map_err(|source| DbError::Io { path: root.to_path_buf(), source })?;
        Ok(FlatDb { root: root.to_path_buf() })
    }

    pub fn collection<T: Serialize + DeserializeOwned>(&self, name: &str) -> Result<Collection<T>, DbError> {
        Collection::open(self.root.join(format!("{}.jsonl", name)))
    }
}

/// Append-only collection. Ids start at 1 and are never reused.
/// All access goes through the lock so readers never see a half written line.
pub struct Collection<T> {
    path: PathBuf,
    next_id: Mutex<u64>,
    _data: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    fn open(path: PathBuf) -> Result<Collection<T>, DbError> {
        let last_id = read_records::<T>(&path)?.iter().map(|r| r.id).max().unwrap_or(0);
        debug!("Opened collection {} (last id {})", path.display(), last_id);

        Ok(Collection {
            path,
            next_id: Mutex::new(last_id + 1),
            _data: PhantomData,
        })
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        // The counter is only advanced after a successful write, so a poisoned lock is still consistent
        self.next_id.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, data: T) -> Result<Record<T>, DbError> {
        let mut next_id = self.lock();
        let record = Record { id: *next_id, data };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let io_err = |source: io::Error| DbError::Io { path: self.path.clone(), source };
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(&self.path).map_err(io_err)?;
        if !ends_with_newline(&mut file).map_err(io_err)? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes()).map_err(io_err)?;

        *next_id += 1;
        Ok(record)
    }

    pub fn all(&self) -> Result<Vec<Record<T>>, DbError> {
        let _guard = self.lock();
        read_records(&self.path)
    }

    pub fn get(&self, id: u64) -> Result<Record<T>, DbError> {
        self.all()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(DbError::NotFound(id))
    }

    pub fn find<F>(&self, predicate: F) -> Result<Vec<Record<T>>, DbError>
    where
        F: Fn(&T) -> bool,
    {
        let records = self.all()?;
        Ok(records.into_iter().filter(|r| predicate(&r.data)).collect())
    }
}

/// An interrupted write can leave a partial line behind. New records must not be glued to it.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Lines that do not decode are skipped so one damaged record does not take the collection down
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<Record<T>>, DbError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(source) => return Err(DbError::Io { path: path.to_path_buf(), source }),
    };

    let mut records = vec![];
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| DbError::Io { path: path.to_path_buf(), source })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping corrupted record at {}:{}: {}", path.display(), idx + 1, e),
        }
    }

    Ok(records)
}
