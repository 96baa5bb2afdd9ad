use std::{cell::RefCell, collections::HashMap};

use crate::storage::Storage;

use crate::Result;

#[derive(Default)]
pub struct InMemoryStorage {
    storage: RefCell<HashMap<String, String>>,
    pub writes: RefCell<u32>,
}

impl InMemoryStorage {
    pub fn len(&self) -> usize {
        self.storage.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.borrow().is_empty()
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.storage.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        *self.writes.borrow_mut() += 1;
        self.storage
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
