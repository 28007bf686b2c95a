use std::collections::HashMap;

use rowmap_api::{FieldDef, RecordType};

use crate::error::{NameError, NameErrorKind};

/// Matching key for a column or field name: lowercase, underscores removed.
///
/// `based_on`, `BasedOn` and `basedon` all share the key `basedon`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized field lookup for one record type. Built once per type.
#[derive(Debug)]
pub struct FieldIndex {
    record: &'static str,
    fields: Vec<FieldDef>,
    by_key: HashMap<String, Vec<usize>>,
}

impl FieldIndex {
    pub fn build(record: &RecordType) -> Self {
        let fields = record.field_defs();
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            by_key.entry(normalize(field.name)).or_default().push(index);
        }
        Self {
            record: record.name,
            fields,
            by_key,
        }
    }

    /// Destination record type name.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Position of the single field matching `column`.
    pub fn resolve(&self, column: &str) -> Result<usize, NameError> {
        let fail = |kind| NameError {
            column: column.to_string(),
            target: self.record,
            kind,
        };
        match self.by_key.get(&normalize(column)).map(Vec::as_slice) {
            Some([index]) => Ok(*index),
            Some(many) if !many.is_empty() => Err(fail(NameErrorKind::Ambiguous(
                many.iter().map(|i| self.fields[*i].name).collect(),
            ))),
            _ => Err(fail(NameErrorKind::Missing)),
        }
    }
}
