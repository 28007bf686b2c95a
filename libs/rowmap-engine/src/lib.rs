pub mod coerce;
pub mod config;
pub mod deferred;
pub mod driver;
pub mod error;
pub mod materialize;
pub mod navigate;
pub mod resolve;
pub mod shape;

pub use coerce::coerce;
pub use config::{MapperConfig, MultiRowPolicy};
pub use deferred::OneRow;
pub use driver::ScanOutcome;
pub use error::{CoercionError, MapError, NameError, NameErrorKind};
pub use materialize::Materializer;
pub use resolve::{normalize, FieldIndex};
pub use shape::ShapeCache;

use rowmap_api::{AsyncRowSource, Column, RowSource, Target, Value};

/// Entry point for every scan: maps dynamically typed result rows onto
/// statically typed destinations.
///
/// ```ignore
/// #[derive(Record, Default)]
/// struct Cocktail {
///     name: String,
///     based_on: Vec<String>,
/// }
///
/// let mut rs = ResultSet::new(["name", "based_on"])
///     .row(vec!["foo".into(), r#"["Vodka"]"#.into()]);
/// let mut out: Vec<Cocktail> = Vec::new();
/// let outcome = Mapper::default().query(&mut rs, &mut out)?;
/// ```
///
/// Holds the configuration and the record shape cache. Cheap to share:
/// scans take `&self`, so one mapper can serve concurrent calls as long as
/// each call writes to its own destination.
#[derive(Debug, Default)]
pub struct Mapper {
    config: MapperConfig,
    shapes: ShapeCache,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            shapes: ShapeCache::new(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn materializer(&self) -> Materializer<'_> {
        Materializer::new(&self.shapes, &self.config)
    }

    // ═══════════════════════════════════════════════════════════════
    //  Structural mapping
    // ═══════════════════════════════════════════════════════════════

    /// Map every row into `dest`.
    ///
    /// A sequence destination (`Vec<T>`, optionally wrapped) receives one
    /// element per row, reusing existing elements in place, and is cut back
    /// to the row count afterwards. An empty result leaves it as it was.
    /// Any other destination receives each row in turn and
    /// follows `config().multi_row` when more than one arrives.
    pub fn query<S, T>(&self, source: &mut S, dest: &mut T) -> Result<ScanOutcome, MapError>
    where
        S: RowSource + ?Sized,
        T: Target + ?Sized,
    {
        driver::run(self.materializer(), source, dest, self.config.multi_row)
    }

    /// Like [`query`](Self::query), but a single destination fails with
    /// [`MapError::TooManyRows`] on a second row regardless of configuration.
    pub fn query_one<S, T>(&self, source: &mut S, dest: &mut T) -> Result<ScanOutcome, MapError>
    where
        S: RowSource + ?Sized,
        T: Target + ?Sized,
    {
        driver::run(self.materializer(), source, dest, MultiRowPolicy::Fail)
    }

    pub async fn query_async<S, T>(
        &self,
        source: &mut S,
        dest: &mut T,
    ) -> Result<ScanOutcome, MapError>
    where
        S: AsyncRowSource + ?Sized,
        T: Target + ?Sized,
    {
        driver::run_async(self.materializer(), source, dest, self.config.multi_row).await
    }

    pub async fn query_one_async<S, T>(
        &self,
        source: &mut S,
        dest: &mut T,
    ) -> Result<ScanOutcome, MapError>
    where
        S: AsyncRowSource + ?Sized,
        T: Target + ?Sized,
    {
        driver::run_async(self.materializer(), source, dest, MultiRowPolicy::Fail).await
    }

    /// Materialize a single, already fetched row.
    pub fn materialize<T: Target + ?Sized>(
        &self,
        columns: &[Column],
        values: &[Value],
        dest: &mut T,
    ) -> Result<(), MapError> {
        self.materializer().fill(columns, values, dest.slot())
    }

    // ═══════════════════════════════════════════════════════════════
    //  Positional binding
    // ═══════════════════════════════════════════════════════════════

    /// Fetch exactly one row for positional binding. A second row fails
    /// immediately with [`MapError::TooManyRows`].
    pub fn query_row<S: RowSource + ?Sized>(&self, source: &mut S) -> Result<OneRow<'_>, MapError> {
        OneRow::fetch(self.materializer(), source)
    }

    pub async fn query_row_async<S: AsyncRowSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<OneRow<'_>, MapError> {
        OneRow::fetch_async(self.materializer(), source).await
    }
}

/// [`Mapper::query`] with the default configuration.
pub fn query<S, T>(source: &mut S, dest: &mut T) -> Result<ScanOutcome, MapError>
where
    S: RowSource + ?Sized,
    T: Target + ?Sized,
{
    Mapper::default().query(source, dest)
}

/// [`Mapper::query_one`] with the default configuration.
pub fn query_one<S, T>(source: &mut S, dest: &mut T) -> Result<ScanOutcome, MapError>
where
    S: RowSource + ?Sized,
    T: Target + ?Sized,
{
    Mapper::default().query_one(source, dest)
}
