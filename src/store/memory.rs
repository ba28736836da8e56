use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use super::{CategoryRecord, CategoryRegistry, ParameterStore, StoreError};
use crate::config::Parameters;

/// In-process store. Single-threaded, like the engine that uses it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parameters: RefCell<BTreeMap<String, f64>>,
    categories: RefCell<Vec<CategoryRecord>>,
}

impl MemoryStore {
    /// An empty store: no parameters, no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the seed default parameters.
    pub fn seeded() -> Self {
        Self::with_parameters(Parameters::seed_defaults())
    }

    pub fn with_parameters(parameters: Parameters) -> Self {
        let store = Self::new();
        for (name, value) in parameters.entries() {
            store.set_parameter(name, value);
        }
        store
    }

    pub fn set_parameter(&self, name: &str, value: f64) {
        self.parameters.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove_parameter(&self, name: &str) -> Option<f64> {
        self.parameters.borrow_mut().remove(name)
    }

    /// All registered categories in registration order.
    pub fn categories(&self) -> Vec<CategoryRecord> {
        self.categories.borrow().clone()
    }
}

impl ParameterStore for MemoryStore {
    fn get(&self, name: &str) -> Result<f64, StoreError> {
        self.parameters
            .borrow()
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::ParameterNotFound(name.to_string()))
    }
}

impl CategoryRegistry for MemoryStore {
    fn list_all(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .categories
            .borrow()
            .iter()
            .map(|record| record.name.clone())
            .collect())
    }

    fn register(&self, name: &str) -> Result<bool, StoreError> {
        let mut categories = self.categories.borrow_mut();
        if categories.iter().any(|record| record.name == name) {
            return Ok(false);
        }
        categories.push(CategoryRecord {
            name: name.to_string(),
            usage_count: 0,
            registered_at: Utc::now(),
        });
        Ok(true)
    }

    fn usage_count(&self, name: &str) -> Result<u64, StoreError> {
        self.categories
            .borrow()
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.usage_count)
            .ok_or_else(|| StoreError::CategoryNotFound(name.to_string()))
    }

    fn set_usage_count(&self, name: &str, count: u64) -> Result<(), StoreError> {
        let mut categories = self.categories.borrow_mut();
        let record = categories
            .iter_mut()
            .find(|record| record.name == name)
            .ok_or_else(|| StoreError::CategoryNotFound(name.to_string()))?;
        record.usage_count = count;
        Ok(())
    }
}
