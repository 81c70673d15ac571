use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{StoreError, StoreResult};

/// The fixed, ordered set of field names a store declares.
///
/// Checked once when the store is built; every later access resolves its key
/// against the schema and fails with [`StoreError::UnknownKey`] on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    keys: Vec<Rc<str>>,
    index: HashMap<Rc<str>, usize>,
}

impl Schema {
    /// Declare `keys` in order. Repeated keys are rejected.
    pub fn new<I, K>(keys: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut schema = Schema {
            keys: Vec::new(),
            index: HashMap::new(),
        };
        for key in keys {
            schema.declare(key.as_ref())?;
        }
        Ok(schema)
    }

    /// Build from keys already known to be distinct.
    pub(crate) fn from_unique(keys: Vec<Rc<str>>) -> Self {
        let index = keys
            .iter()
            .enumerate()
            .map(|(position, key)| (Rc::clone(key), position))
            .collect();
        Schema { keys, index }
    }

    fn declare(&mut self, key: &str) -> StoreResult<usize> {
        if self.index.contains_key(key) {
            return Err(StoreError::duplicate_key(key));
        }
        let key: Rc<str> = Rc::from(key);
        let position = self.keys.len();
        self.keys.push(Rc::clone(&key));
        self.index.insert(key, position);
        Ok(position)
    }

    /// Position of `key`, or an unknown key error.
    pub fn resolve(&self, key: &str) -> StoreResult<usize> {
        self.position(key)
            .ok_or_else(|| StoreError::unknown_key(key))
    }

    /// Position of `key` in declaration order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Whether `key` is declared.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Declared keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(|key| &**key)
    }

    pub(crate) fn key_at(&self, position: usize) -> &Rc<str> {
        &self.keys[position]
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no key is declared.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
