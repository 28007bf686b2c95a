use rowmap_api::{AsyncRowSource, Column, Row, RowSource, SourceError, Target};

use crate::config::MultiRowPolicy;
use crate::error::MapError;
use crate::materialize::Materializer;
use crate::navigate::{navigate, row_element, Settled};

/// Result of a structural scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Rows materialized.
    pub rows: usize,
    /// The source delivered no rows; the destination was not touched.
    pub empty: bool,
}

/// Per-call cursor feeding rows from a source into one destination.
struct Scan<'a, T: Target + ?Sized> {
    materializer: Materializer<'a>,
    dest: &'a mut T,
    sequence: bool,
    policy: MultiRowPolicy,
    rows: usize,
}

impl<'a, T: Target + ?Sized> Scan<'a, T> {
    fn new(materializer: Materializer<'a>, dest: &'a mut T, policy: MultiRowPolicy) -> Self {
        // Inspect the shape once, without allocating optional layers.
        let shape = dest.slot().shape();
        let sequence = shape.unwrap_optional().is_sequence();
        tracing::debug!(destination = %shape, sequence, "scan started");
        Self {
            materializer,
            dest,
            sequence,
            policy,
            rows: 0,
        }
    }

    /// Failure before the first row is an execution error, later ones are
    /// fetch errors for the row being fetched.
    fn source_error(&self, error: SourceError) -> MapError {
        if self.rows == 0 {
            MapError::Execution(error)
        } else {
            MapError::Fetch {
                row: self.rows + 1,
                source: error,
            }
        }
    }

    fn row(&mut self, columns: &[Column], row: Row) -> Result<(), MapError> {
        self.rows += 1;
        let current = self.rows;

        if row.len() != columns.len() {
            return Err(MapError::Fetch {
                row: current,
                source: SourceError::fetch(format!(
                    "row has {} values for {} columns",
                    row.len(),
                    columns.len()
                )),
            });
        }

        if self.sequence {
            let Settled::Sequence(seq) = navigate(self.dest) else {
                return Err(MapError::Shape("sequence destination changed shape".into()));
            };
            let slot = row_element(seq, current)?;
            self.materializer.fill(columns, row.values(), slot)?;
        } else {
            if current > 1 {
                match self.policy {
                    MultiRowPolicy::Fail => return Err(MapError::TooManyRows),
                    MultiRowPolicy::KeepLast => {
                        tracing::debug!(row = current, "single destination overwritten by a later row");
                    }
                }
            }
            self.materializer.fill(columns, row.values(), self.dest.slot())?;
        }

        tracing::trace!(row = current, "row materialized");
        Ok(())
    }

    /// A sequence destination that received rows ends with exactly one
    /// element per row.
    fn finish(self) -> Result<ScanOutcome, MapError> {
        if self.sequence && self.rows > 0 {
            let Settled::Sequence(seq) = navigate(self.dest) else {
                return Err(MapError::Shape("sequence destination changed shape".into()));
            };
            if seq.len() > self.rows {
                tracing::debug!(stale = seq.len() - self.rows, "dropping elements past the last row");
                seq.truncate(self.rows);
            }
        }
        let outcome = ScanOutcome {
            rows: self.rows,
            empty: self.rows == 0,
        };
        tracing::debug!(rows = outcome.rows, empty = outcome.empty, "scan finished");
        Ok(outcome)
    }
}

pub(crate) fn run<S, T>(
    materializer: Materializer<'_>,
    source: &mut S,
    dest: &mut T,
    policy: MultiRowPolicy,
) -> Result<ScanOutcome, MapError>
where
    S: RowSource + ?Sized,
    T: Target + ?Sized,
{
    let columns = source.columns().to_vec();
    let mut scan = Scan::new(materializer, dest, policy);
    loop {
        let next = source.next_row().map_err(|e| scan.source_error(e))?;
        let Some(row) = next else { break };
        scan.row(&columns, row)?;
    }
    scan.finish()
}

pub(crate) async fn run_async<S, T>(
    materializer: Materializer<'_>,
    source: &mut S,
    dest: &mut T,
    policy: MultiRowPolicy,
) -> Result<ScanOutcome, MapError>
where
    S: AsyncRowSource + ?Sized,
    T: Target + ?Sized,
{
    let columns = source.columns().to_vec();
    let mut scan = Scan::new(materializer, dest, policy);
    loop {
        let next = source.next_row().await.map_err(|e| scan.source_error(e))?;
        let Some(row) = next else { break };
        scan.row(&columns, row)?;
    }
    scan.finish()
}
