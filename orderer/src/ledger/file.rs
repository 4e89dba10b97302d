use super::{validate_channel_id, Error, Factory, ReadWriter, Reader};
use orderer_lib::{codec, interfaces::Block};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

const BLOCK_EXTENSION: &str = "block";

/// ledger of one channel, stored as one file per block in a directory
pub struct FileLedger {
    dir: PathBuf,
    // also serializes the writers
    height: Mutex<u64>,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileLedger {
    /// open the ledger stored in `dir`, creating the directory if needed.
    /// The height is the number of consecutive block files from block 0.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let mut height = 0;
        while block_path(&dir, height).is_file() {
            height += 1;
        }

        Ok(FileLedger {
            dir,
            height: Mutex::new(height),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn block_path(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("{:020}.{}", number, BLOCK_EXTENSION))
}

impl Reader for FileLedger {
    fn height(&self) -> u64 {
        *self.height.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_block(&self, number: u64) -> Result<Option<Block>, Error> {
        if number >= self.height() {
            return Ok(None);
        }
        let path = block_path(&self.dir, number);
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        Ok(Some(codec::decode(&bytes)?))
    }
}

impl ReadWriter for FileLedger {
    fn append(&self, block: Block) -> Result<(), Error> {
        let mut height = self.height.lock().unwrap_or_else(PoisonError::into_inner);
        if block.number() != *height {
            return Err(Error::OutOfOrder {
                expected: *height,
                got: block.number(),
            });
        }

        let bytes = codec::encode(&block)?;
        let path = block_path(&self.dir, block.number());
        let staging = path.with_extension("tmp");
        fs::write(&staging, &bytes).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))?;

        *height += 1;
        Ok(())
    }
}

/// one [`FileLedger`] per channel, each in a sub-directory of `root`
/// named after the channel identifier
pub struct FileLedgerFactory {
    root: PathBuf,
    ledgers: Mutex<HashMap<String, Arc<FileLedger>>>,
}

impl FileLedgerFactory {
    /// open every ledger already present under `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_error(&root))?;

        let mut ledgers = HashMap::new();
        for entry in fs::read_dir(&root).map_err(io_error(&root))? {
            let entry = entry.map_err(io_error(&root))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let channel_id = match entry.file_name().into_string() {
                Ok(channel_id) if validate_channel_id(&channel_id).is_ok() => channel_id,
                _ => {
                    tracing::warn!("ignoring unexpected directory {:?} in the ledger", path);
                    continue;
                }
            };
            let ledger = FileLedger::open(path)?;
            tracing::debug!(
                "found ledger for channel {} at height {}",
                channel_id,
                ledger.height()
            );
            ledgers.insert(channel_id, Arc::new(ledger));
        }

        Ok(FileLedgerFactory {
            root,
            ledgers: Mutex::new(ledgers),
        })
    }
}

impl Factory for FileLedgerFactory {
    fn channel_ids(&self) -> Vec<String> {
        let ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = ledgers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get_or_create(&self, channel_id: &str) -> Result<Arc<dyn ReadWriter>, Error> {
        validate_channel_id(channel_id)?;
        let mut ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ledger) = ledgers.get(channel_id) {
            return Ok(Arc::clone(ledger) as Arc<dyn ReadWriter>);
        }
        let ledger = Arc::new(FileLedger::open(self.root.join(channel_id))?);
        ledgers.insert(channel_id.to_owned(), Arc::clone(&ledger));
        Ok(ledger)
    }

    fn remove(&self, channel_id: &str) -> Result<(), Error> {
        validate_channel_id(channel_id)?;
        let mut ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        ledgers.remove(channel_id);
        let dir = self.root.join(channel_id);
        match fs::remove_dir_all(&dir) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(io_error(&dir)(error)),
            _ => Ok(()),
        }
    }
}
