use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use crate::error::SourceError;
use crate::row::{Column, Row};
use crate::value::Value;

/// Query-execution side of a scan: columns plus a row cursor.
///
/// - `Ok(Some(row))`: next row, values ordered exactly as `columns()`.
/// - `Ok(None)`: rows exhausted.
/// - `Err(_)`: terminal failure, including cancellation. The engine stops
///   at the first error and never calls `next_row` again.
pub trait RowSource {
    fn columns(&self) -> &[Column];

    fn next_row(&mut self) -> Result<Option<Row>, SourceError>;
}

/// Async variant of [`RowSource`]. Only fetching a row suspends;
/// materialization itself stays synchronous.
pub trait AsyncRowSource: Send {
    fn columns(&self) -> &[Column];

    fn next_row(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Row>, SourceError>> + Send + '_>>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn columns(&self) -> &[Column] {
        (**self).columns()
    }

    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        (**self).next_row()
    }
}

/// Fully buffered result set.
///
/// Serves as a row source for callers that already hold decoded rows and
/// as a fixture in tests. `fail_after` injects a source error once that
/// many rows have been delivered.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<Column>,
    rows: VecDeque<Row>,
    delivered: usize,
    failure: Option<(usize, SourceError)>,
}

impl ResultSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Column::list(names),
            ..Self::default()
        }
    }

    /// Append a row (builder style).
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push_back(Row::new(values));
        self
    }

    /// Append a row to a result set that is already being read.
    pub fn push(&mut self, row: Row) {
        self.rows.push_back(row);
    }

    /// Fail with `error` after `rows` rows have been delivered.
    pub fn fail_after(mut self, rows: usize, error: SourceError) -> Self {
        self.failure = Some((rows, error));
        self
    }

    /// Rows not yet delivered.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    fn advance(&mut self) -> Result<Option<Row>, SourceError> {
        if let Some((after, error)) = &self.failure
            && self.delivered >= *after
        {
            return Err(error.clone());
        }
        let row = self.rows.pop_front();
        if row.is_some() {
            self.delivered += 1;
        }
        Ok(row)
    }
}

impl RowSource for ResultSet {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        self.advance()
    }
}

impl AsyncRowSource for ResultSet {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn next_row(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Row>, SourceError>> + Send + '_>> {
        let next = self.advance();
        Box::pin(async move { next })
    }
}
