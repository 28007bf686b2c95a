use rowmap_api::{AsyncRowSource, Column, Row, RowSource, Shaped, SourceError, Target, Value};

use crate::error::MapError;
use crate::materialize::Materializer;

/// Result of an exactly-one-row scan: at most one fetched row, bound to
/// caller-provided targets later.
///
/// Binding is positional: target `i` receives column `i`, whatever its name.
#[derive(Debug)]
pub struct OneRow<'m> {
    materializer: Materializer<'m>,
    columns: Vec<Column>,
    row: Option<Row>,
}

impl<'m> OneRow<'m> {
    pub(crate) fn fetch<S: RowSource + ?Sized>(
        materializer: Materializer<'m>,
        source: &mut S,
    ) -> Result<Self, MapError> {
        let columns = source.columns().to_vec();
        let row = source.next_row().map_err(MapError::Execution)?;
        if row.is_some() {
            let second = source.next_row().map_err(second_row_error)?;
            if second.is_some() {
                return Err(MapError::TooManyRows);
            }
        }
        Self::checked(materializer, columns, row)
    }

    pub(crate) async fn fetch_async<S: AsyncRowSource + ?Sized>(
        materializer: Materializer<'m>,
        source: &mut S,
    ) -> Result<Self, MapError> {
        let columns = source.columns().to_vec();
        let row = source.next_row().await.map_err(MapError::Execution)?;
        if row.is_some() {
            let second = source.next_row().await.map_err(second_row_error)?;
            if second.is_some() {
                return Err(MapError::TooManyRows);
            }
        }
        Self::checked(materializer, columns, row)
    }

    fn checked(
        materializer: Materializer<'m>,
        columns: Vec<Column>,
        row: Option<Row>,
    ) -> Result<Self, MapError> {
        if let Some(row) = &row
            && row.len() != columns.len()
        {
            return Err(MapError::Fetch {
                row: 1,
                source: SourceError::fetch(format!(
                    "row has {} values for {} columns",
                    row.len(),
                    columns.len()
                )),
            });
        }
        Ok(Self {
            materializer,
            columns,
            row,
        })
    }

    /// `true` when the source delivered no row.
    pub fn is_empty(&self) -> bool {
        self.row.is_none()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn values(&self) -> Option<&[Value]> {
        self.row.as_ref().map(Row::values)
    }

    fn values_or_no_rows(&self) -> Result<&[Value], MapError> {
        self.values().ok_or(MapError::NoRows)
    }

    /// Bind every column, in order, to `targets`.
    ///
    /// Null columns leave their target untouched.
    pub fn bind(&self, targets: &mut [&mut dyn Target]) -> Result<(), MapError> {
        let values = self.values_or_no_rows()?;
        if targets.len() != values.len() {
            return Err(MapError::Shape(format!(
                "{} destinations for {} columns",
                targets.len(),
                values.len()
            )));
        }
        for ((column, value), target) in self.columns.iter().zip(values).zip(targets.iter_mut()) {
            self.materializer.assign(&column.name, value, target.slot(), 0)?;
        }
        Ok(())
    }

    /// Decode column `index` into a fresh `T`.
    pub fn get<T: Shaped>(&self, index: usize) -> Result<T, MapError> {
        let values = self.values_or_no_rows()?;
        let (Some(column), Some(value)) = (self.columns.get(index), values.get(index)) else {
            return Err(MapError::Shape(format!(
                "column index {index} out of range for {} columns",
                values.len()
            )));
        };
        let mut out = T::default();
        self.materializer.assign(&column.name, value, out.slot(), 0)?;
        Ok(out)
    }
}

fn second_row_error(error: SourceError) -> MapError {
    MapError::Fetch {
        row: 2,
        source: error,
    }
}
