//! Ring module
//!
//! Sorted ring of hash positions mapping to backends. A position is either
//! a primary key (where a backend registered) or a virtual key inserted by
//! the scaler and served by a donor. Positions move to the `offline` list
//! while their backend is quarantined. All mutation happens under the
//! write side of the gate; lookups under the read side.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::key::HashKey;
use std::collections::HashMap;
use std::sync::Arc;

/// The consistent-hash ring
#[derive(Debug)]
pub struct Ring {
    hash_max: HashKey,
    /// Sorted positions currently eligible to serve
    positions: Vec<HashKey>,
    /// Every known position (primary or virtual) to its owning backend
    owners: HashMap<HashKey, Arc<Backend>>,
    /// Sorted positions removed pending recovery
    offline: Vec<HashKey>,
    /// Backends in registration order
    backends: Vec<Arc<Backend>>,
}

impl Ring {
    /// Create an empty ring over `[0, hash_max]`
    pub fn new(hash_max: HashKey) -> Self {
        Self {
            hash_max,
            positions: Vec::new(),
            owners: HashMap::new(),
            offline: Vec::new(),
            backends: Vec::new(),
        }
    }

    /// Upper bound of the hash domain
    pub fn hash_max(&self) -> HashKey {
        self.hash_max
    }

    /// Active positions, sorted ascending
    pub fn positions(&self) -> &[HashKey] {
        &self.positions
    }

    /// Quarantined positions, sorted ascending
    pub fn offline(&self) -> &[HashKey] {
        &self.offline
    }

    /// Backends in registration order
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Backend owning `key`, if the key is known
    pub fn owner(&self, key: HashKey) -> Option<&Arc<Backend>> {
        self.owners.get(&key)
    }

    /// Whether `key` is an active position
    pub fn contains(&self, key: HashKey) -> bool {
        self.positions.binary_search(&key).is_ok()
    }

    /// Index of `key` among the active positions
    pub fn index_of(&self, key: HashKey) -> Option<usize> {
        self.positions.binary_search(&key).ok()
    }

    /// Index of the position owning lookup key `key`.
    ///
    /// The owner is the smallest position `>= key`; keys beyond the last
    /// position wrap to index 0. Fails with [`Error::NoBackend`] on an
    /// empty ring.
    pub fn owner_index(&self, key: HashKey) -> Result<usize> {
        let Some(&last) = self.positions.last() else {
            return Err(Error::NoBackend);
        };
        if key > last {
            return Ok(0);
        }
        Ok(self.positions.partition_point(|&p| p < key))
    }

    /// Failover order: every position index once, starting at `start`
    pub fn walk(&self, start: usize) -> impl Iterator<Item = usize> {
        let len = self.positions.len();
        (0..len).map(move |step| (start + step) % len)
    }

    /// Bounds of the interval preceding the position at `index`, for
    /// placing a virtual key: `(previous position, this position)`, with
    /// the wrap case at index 0 spanning from the last position up to
    /// `hash_max`.
    pub fn scale_bounds(&self, index: usize) -> Option<(HashKey, HashKey)> {
        let &last = self.positions.last()?;
        let (lo, hi) = if index == 0 {
            (last, self.hash_max)
        } else {
            (
                *self.positions.get(index - 1)?,
                *self.positions.get(index)?,
            )
        };
        Some((lo, hi))
    }

    /// Register a backend at primary key `key`.
    ///
    /// Rejects duplicates and keys beyond `hash_max`.
    pub fn add_primary(&mut self, key: HashKey, backend: Arc<Backend>) -> Result<()> {
        if key > self.hash_max {
            return Err(Error::Ring(format!("Key '{key}' exceeds maximum.")));
        }
        if self.owners.contains_key(&key) {
            return Err(Error::Ring(format!("Key '{key}' already exists.")));
        }
        match self.positions.binary_search(&key) {
            Ok(_) => return Err(Error::Ring(format!("Key '{key}' already exists."))),
            Err(index) => self.positions.insert(index, key),
        }
        self.owners.insert(key, backend.clone());
        self.backends.push(backend);
        Ok(())
    }

    /// Remove the backend registered at `key`, along with every virtual
    /// key it was serving. Works whether the primary is active or
    /// quarantined.
    pub fn remove_primary(&mut self, key: HashKey) -> Result<()> {
        let backend = match self.owners.get(&key) {
            Some(backend) if backend.primary_key() == key => backend.clone(),
            Some(_) => {
                return Err(Error::Ring(format!("Key '{key}' is not a primary key.")));
            }
            None => return Err(Error::Ring(format!("Key '{key}' does not exist."))),
        };

        self.remove_all_virtuals(&backend);

        if let Ok(index) = self.positions.binary_search(&key) {
            self.positions.remove(index);
        } else if let Ok(index) = self.offline.binary_search(&key) {
            self.offline.remove(index);
        }
        self.owners.remove(&key);
        self.backends.retain(|b| !Arc::ptr_eq(b, &backend));
        Ok(())
    }

    /// Insert a virtual key served by `donor`.
    ///
    /// Rejects keys already known to the ring, including quarantined
    /// primaries.
    pub fn add_virtual(&mut self, key: HashKey, donor: &Arc<Backend>) -> Result<()> {
        if self.owners.contains_key(&key) {
            return Err(Error::Ring(format!("Key '{key}' already exists.")));
        }
        match self.positions.binary_search(&key) {
            Ok(_) => Err(Error::Ring(format!("Key '{key}' already exists."))),
            Err(index) => {
                self.positions.insert(index, key);
                self.owners.insert(key, donor.clone());
                donor.register_vkey(key);
                Ok(())
            }
        }
    }

    /// Drop every virtual key `backend` serves
    pub fn remove_all_virtuals(&mut self, backend: &Arc<Backend>) {
        for key in backend.take_vkeys() {
            if let Ok(index) = self.positions.binary_search(&key) {
                self.positions.remove(index);
            }
            self.owners.remove(&key);
        }
    }

    /// Pull an active position into quarantine
    pub fn move_to_offline(&mut self, key: HashKey) {
        if let Ok(index) = self.positions.binary_search(&key) {
            self.positions.remove(index);
            if let Err(index) = self.offline.binary_search(&key) {
                self.offline.insert(index, key);
            }
        }
    }

    /// Reinstate a quarantined position
    pub fn move_to_online(&mut self, key: HashKey) {
        if let Ok(index) = self.offline.binary_search(&key) {
            self.offline.remove(index);
            if let Err(index) = self.positions.binary_search(&key) {
                self.positions.insert(index, key);
            }
        }
    }
}
