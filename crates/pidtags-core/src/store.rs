//! Pattern persistence port.
//!
//! The engine does not assume any specific persistence mechanism; hosts
//! inject a [`PatternStore`] that reads and writes the serializable
//! [`PatternSet`] snapshot. [`MemoryStore`] is the in-tree implementation,
//! useful for tests and for hosts that persist elsewhere.

use std::cell::RefCell;

use crate::error::PatternError;
use crate::registry::{PatternRegistry, PatternSet};

/// Storage seam for pattern rule sets.
pub trait PatternStore {
    /// Load the persisted rule set, or `Ok(None)` when nothing has been
    /// saved yet.
    fn load(&self) -> Result<Option<PatternSet>, PatternError>;

    /// Persist a rule set, replacing any previous snapshot.
    fn save(&self, set: &PatternSet) -> Result<(), PatternError>;
}

/// In-memory [`PatternStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternStore for MemoryStore {
    fn load(&self) -> Result<Option<PatternSet>, PatternError> {
        match self.snapshot.borrow().as_deref() {
            Some(json) => Ok(Some(PatternSet::from_json(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, set: &PatternSet) -> Result<(), PatternError> {
        *self.snapshot.borrow_mut() = Some(set.to_json()?);
        Ok(())
    }
}

/// Build a registry from a store: defaults plus whatever the store holds.
///
/// A store with no snapshot yields a pristine default registry. Import is
/// atomic, so a corrupt snapshot leaves the defaults intact and surfaces
/// the error to the caller.
pub fn load_registry(store: &dyn PatternStore) -> Result<PatternRegistry, PatternError> {
    let mut registry = PatternRegistry::new();
    if let Some(set) = store.load()? {
        registry.import(&set)?;
    }
    Ok(registry)
}

/// Persist a registry's effective rule set into a store.
pub fn save_registry(
    store: &dyn PatternStore,
    registry: &PatternRegistry,
) -> Result<(), PatternError> {
    store.save(&registry.export())
}
