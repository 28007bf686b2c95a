use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rowmap_api::RecordType;

use crate::resolve::FieldIndex;

/// Field indexes keyed by record type identity.
///
/// Shared by every scan of a [`Mapper`](crate::Mapper); a record type is
/// introspected and normalized once, then looked up by `TypeId`.
#[derive(Debug, Default)]
pub struct ShapeCache {
    indexes: RwLock<HashMap<TypeId, Arc<FieldIndex>>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self, record: &RecordType) -> Arc<FieldIndex> {
        {
            let guard = match self.indexes.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("shape cache read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(index) = guard.get(&record.id) {
                return Arc::clone(index);
            }
        }

        let built = Arc::new(FieldIndex::build(record));
        let mut guard = match self.indexes.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("shape cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        tracing::trace!(record = record.name, fields = built.fields().len(), "cached record shape");
        Arc::clone(guard.entry(record.id).or_insert(built))
    }

    /// Number of cached record types.
    pub fn len(&self) -> usize {
        match self.indexes.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
