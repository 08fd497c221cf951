use std::collections::HashMap;

use parking_lot::Mutex;

use crate::traits::KeyValueStore;
use crate::types::StoreKey;
use crate::DbResult;

#[derive(Debug, Default)]
pub struct StubKeyValueStore {
    entries: Mutex<HashMap<StoreKey, Vec<u8>>>,
}

impl StubKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for StubKeyValueStore {
    fn get(&self, key: StoreKey) -> DbResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(&key).cloned())
    }

    fn put(&self, key: StoreKey, value: Vec<u8>) -> DbResult<()> {
        self.entries.lock().insert(key, value);
        Ok(())
    }
}
