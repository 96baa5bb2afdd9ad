use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::config::ConfigProperties;
use crate::error::{AddContext, FFError};
use crate::storage::Storage;
use crate::Result;

/// Persistent storage with one gzip compressed file per key. File names are
/// the sha256 of the key so any string is a valid key.
pub struct FileStorage {
    config: Arc<dyn ConfigProperties>,
}

impl FileStorage {
    pub fn new(config: Arc<dyn ConfigProperties>) -> Self {
        FileStorage { config }
    }

    /// Create the storage directory if missing, then validate it.
    pub fn ensure_storage_location(&self) -> Result<()> {
        let location = self.config.storage_location();
        fs::create_dir_all(location).err_context(FFError::StorageLocationIsNotWriteable(
            format!("Cannot create storage directory: {location}"),
        ))?;
        self.validate_storage_location()
    }

    pub fn validate_storage_location(&self) -> Result<()> {
        let storage_location = self.config.storage_location();
        let path = Path::new(storage_location);

        if !path.exists() {
            return Err(FFError::StorageLocationDoesNotExist(format!(
                "Storage directory does not exist: {storage_location}"
            ))
            .into());
        }

        if !path.is_dir() {
            return Err(FFError::StorageLocationIsNotADirectory(format!(
                "Storage location is not a directory: {storage_location}"
            ))
            .into());
        }

        let test_file_path = path.join(".write_test_storage_file");
        match File::create(&test_file_path) {
            Ok(_) => {
                if let Err(e) = fs::remove_file(&test_file_path) {
                    return Err(FFError::StorageLocationWriteTestFailed(format!(
                        "Failed to remove storage test file {}: {}",
                        test_file_path.to_string_lossy(),
                        e
                    ))
                    .into());
                }
            }
            Err(e) => {
                return Err(FFError::StorageLocationIsNotWriteable(format!(
                    "No write permission for storage directory {storage_location}: {e}"
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn get_storage_file(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key);
        let hash = hasher.finalize();
        let storage_location = self.config.storage_location();
        let location = storage_location
            .strip_suffix('/')
            .unwrap_or(storage_location);
        format!("{location}/{hash:x}")
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total size in bytes of the stored (compressed) entries.
    pub fn size(&self) -> Result<u64> {
        let mut size = 0;
        for entry in self.entries()? {
            size += entry.metadata()?.len();
        }
        Ok(size)
    }

    fn entries(&self) -> Result<Vec<fs::DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.config.storage_location())? {
            let entry = entry?;
            if entry.file_type()?.is_file() && is_storage_file_name(&entry.file_name()) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn read_value(&self, reader: impl Read) -> Result<String> {
        let mut decoder = GzDecoder::new(BufReader::new(reader));
        let mut value = String::new();
        decoder.read_to_string(&mut value)?;
        Ok(value)
    }

    fn persist_value(&self, value: &str, f: BufWriter<File>) -> Result<()> {
        let mut encoder = GzEncoder::new(f, Compression::default());
        encoder.write_all(value.as_bytes())?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}

fn is_storage_file_name(name: &std::ffi::OsStr) -> bool {
    name.to_str()
        .map(|name| name.len() == 64 && name.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.get_storage_file(key);
        let f = match File::open(&path) {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(FFError::StorageIoError(format!(
                    "Cannot open stored value for key {key} at {path}: {err}"
                ))
                .into())
            }
        };
        let value = self
            .read_value(f)
            .err_context(FFError::StorageIoError(format!(
                "Cannot read stored value for key {key} at {path}"
            )))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.get_storage_file(key);
        let f = File::create(&path).err_context(FFError::StorageIoError(format!(
            "Cannot create storage file {path}"
        )))?;
        self.persist_value(value, BufWriter::new(f))
    }
}
