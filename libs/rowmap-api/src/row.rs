use crate::value::Value;

/// One column of a result set. Identical for every row of that result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Position in `Row.0`.
    pub position: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// Build an ordered column list from names.
    pub fn list<I, S>(names: I) -> Vec<Column>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(position, name)| Column::new(name, position))
            .collect()
    }
}

/// Positional array of values. Order matches the column list.
///
/// Values only. Names live in [`Column`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_list_assigns_positions() {
        let cols = Column::list(["i1", "s1", "f1"]);
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[2], Column::new("f1", 2));
    }

    #[test]
    fn row_get() {
        let row = Row::new(vec![Value::Int32(1), Value::from("a")]);
        assert_eq!(row.get(1), Some(&Value::from("a")));
        assert_eq!(row.get(2), None);
        assert_eq!(row.len(), 2);
    }
}
