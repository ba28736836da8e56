//! Store seam: tunable parameters and the category registry.
//!
//! The decision engine only sees these two traits. Implementations own
//! their resources and must release anything they acquire before a method
//! returns, on the error path too.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),
    #[error("Category not registered: {0}")]
    CategoryNotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub trait ParameterStore {
    fn get(&self, name: &str) -> Result<f64, StoreError>;
}

pub trait CategoryRegistry {
    fn list_all(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Insert `name` with a usage count of 0. No-op if already present.
    /// Returns whether the category was newly inserted.
    fn register(&self, name: &str) -> Result<bool, StoreError>;

    fn usage_count(&self, name: &str) -> Result<u64, StoreError>;

    fn set_usage_count(&self, name: &str, count: u64) -> Result<(), StoreError>;
}

impl<T: ParameterStore + ?Sized> ParameterStore for &T {
    fn get(&self, name: &str) -> Result<f64, StoreError> {
        (**self).get(name)
    }
}

impl<T: CategoryRegistry + ?Sized> CategoryRegistry for &T {
    fn list_all(&self) -> Result<BTreeSet<String>, StoreError> {
        (**self).list_all()
    }

    fn register(&self, name: &str) -> Result<bool, StoreError> {
        (**self).register(name)
    }

    fn usage_count(&self, name: &str) -> Result<u64, StoreError> {
        (**self).usage_count(name)
    }

    fn set_usage_count(&self, name: &str, count: u64) -> Result<(), StoreError> {
        (**self).set_usage_count(name, count)
    }
}

/// A registered category as the concrete stores keep it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub usage_count: u64,
    pub registered_at: DateTime<Utc>, // informational only
}
