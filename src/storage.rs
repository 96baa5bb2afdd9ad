//! Key-value string storage backing the freshness slots.
//!
//! Implementors only store and return strings. They have no notion of expiry;
//! all freshness decisions are taken in [`crate::freshness`].

pub mod filesystem;
pub mod inmemory;
pub mod nostorage;

use crate::Result;
pub use filesystem::FileStorage;
pub use inmemory::InMemoryStorage;
pub use nostorage::NoStorage;

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
