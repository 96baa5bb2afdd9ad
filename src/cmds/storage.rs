use crate::cli::storage::StorageOptions;
use crate::config::{Config, ConfigProperties};
use crate::freshness::StoredContent;
use crate::storage::{FileStorage, Storage};
use crate::time::{Clock, Seconds, SystemClock};
use crate::Result;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

pub fn execute(options: StorageOptions, config: Arc<Config>) -> Result<()> {
    let storage = FileStorage::new(config.clone());
    match options {
        StorageOptions::Info => {
            storage_info(&storage, config.storage_location(), std::io::stdout())
        }
        StorageOptions::Show { key } => show(
            &storage,
            &key,
            config.storage_expires(),
            &SystemClock,
            std::io::stdout(),
        ),
    }
}

fn storage_info<W: Write>(storage: &FileStorage, location: &str, mut writer: W) -> Result<()> {
    storage.validate_storage_location()?;
    writeln!(writer, "Location: {}", location)?;
    writeln!(writer, "Entries: {}", storage.len()?)?;
    writeln!(writer, "Size: {}", BytesToHumanReadable::from(storage.size()?))?;
    Ok(())
}

fn show<S: Storage, K: Clock, W: Write>(
    storage: &S,
    key: &str,
    storage_expires: Seconds,
    clock: &K,
    mut writer: W,
) -> Result<()> {
    let Some(data) = storage.get(key)? else {
        writeln!(writer, "No stored entry for key {}", key)?;
        return Ok(());
    };
    let stored_content = StoredContent::from_json(&data)?;
    let fresh = stored_content.is_fresh(clock.now(), storage_expires)?;
    writeln!(writer, "Key: {}", key)?;
    writeln!(
        writer,
        "Created: {}",
        stored_content.created.as_deref().unwrap_or("-")
    )?;
    writeln!(
        writer,
        "Expires: {}",
        stored_content.expires.as_deref().unwrap_or("-")
    )?;
    writeln!(writer, "Fresh: {}", if fresh { "yes" } else { "no" })?;
    match &stored_content.content {
        Some(content) => writeln!(writer, "Content:\n{}", content)?,
        None => writeln!(writer, "Content: null")?,
    }
    Ok(())
}

struct BytesToHumanReadable(u64);

impl From<u64> for BytesToHumanReadable {
    fn from(size: u64) -> Self {
        BytesToHumanReadable(size)
    }
}

impl fmt::Display for BytesToHumanReadable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let suffixes = ["B", "KB", "MB", "GB"];
        let mut size = self.0 as f64;
        let mut i = 0;
        while size >= 1024.0 && i < suffixes.len() - 1 {
            size /= 1024.0;
            i += 1;
        }
        write!(f, "{:.2} {}", size, suffixes[i])
    }
}
