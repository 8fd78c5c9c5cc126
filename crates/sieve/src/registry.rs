//! Process-wide cache of runtime-declared record types.
//!
//! Derived descriptors live in statics and need no registry. Types declared
//! from schema files are built once, then shared by name.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::RecordType;
use crate::error::Result;

/// Name-keyed store of immutable record types.
///
/// Safe for concurrent use. The first registration of a name wins.
#[derive(Debug, Default)]
pub struct Registry {
    types: RwLock<HashMap<String, Arc<RecordType>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<RecordType>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Stores `ty` under its name, returning whichever type is registered
    /// after the call.
    pub fn register(&self, ty: RecordType) -> Arc<RecordType> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = types.get(ty.name()) {
            tracing::debug!(record = ty.name(), "record type already registered");
            return Arc::clone(existing);
        }
        let ty = Arc::new(ty);
        types.insert(ty.name().to_string(), Arc::clone(&ty));
        ty
    }

    /// Returns the type named `name`, building it with `build` on first use.
    pub fn get_or_insert_with<F>(&self, name: &str, build: F) -> Result<Arc<RecordType>>
    where
        F: FnOnce() -> Result<RecordType>,
    {
        if let Some(found) = self.get(name) {
            return Ok(found);
        }
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = types.get(name) {
            return Ok(Arc::clone(found));
        }
        let ty = Arc::new(build()?);
        types.insert(name.to_string(), Arc::clone(&ty));
        Ok(ty)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDef;
    use std::thread;

    fn ty(name: &str, field: &str) -> RecordType {
        RecordType::builder(name).field(FieldDef::new(field)).build().unwrap()
    }

    #[test]
    fn first_registration_wins() {
        let reg = Registry::new();
        reg.register(ty("User", "a"));
        let kept = reg.register(ty("User", "b"));
        assert_eq!(kept.fields()[0].ident(), "a");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn builds_once() {
        let reg = Registry::new();
        let mut calls = 0;
        reg.get_or_insert_with("T", || {
            calls += 1;
            Ok(ty("T", "x"))
        })
        .unwrap();
        reg.get_or_insert_with("T", || {
            calls += 1;
            Ok(ty("T", "y"))
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(reg.names(), vec!["T".to_string()]);
    }

    #[test]
    fn concurrent_access() {
        let reg = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    reg.get_or_insert_with("Shared", || Ok(ty("Shared", "f"))).unwrap();
                    reg.register(ty(&format!("T{i}"), "f"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 9);
        assert!(reg.get("Shared").is_some());
    }
}
