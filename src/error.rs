use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FFError {
    #[error("Stored content parse error: {0}")]
    StoredContentParseError(String),
    #[error("JSON parse error: {0}")]
    JsonParseError(String),
    #[error("Time conversion error: {0}")]
    TimeConversionError(String),
    #[error("HTTP transport error: {0}")]
    HttpTransportError(String),
    #[error("Redirect error: {0}")]
    RedirectError(String),
    #[error("Integrity error: {0}")]
    IntegrityError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Storage location does not exist: {0}")]
    StorageLocationDoesNotExist(String),
    #[error("Storage location is not a directory: {0}")]
    StorageLocationIsNotADirectory(String),
    #[error("Storage location is not writeable: {0}")]
    StorageLocationIsNotWriteable(String),
    #[error("Storage location write test failed: {0}")]
    StorageLocationWriteTestFailed(String),
    #[error("Storage I/O error: {0}")]
    StorageIoError(String),
}

pub trait AddContext<T, E>: Context<T, E> {
    fn err_context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T, anyhow::Error>
    where
        Self: Sized,
    {
        self.with_context(|| msg.to_string())
    }
}

impl<U, T, E> AddContext<T, E> for U where U: Context<T, E> {}

pub fn gen<T: AsRef<str>>(msg: T) -> anyhow::Error {
    anyhow!(msg.as_ref().to_string())
}
