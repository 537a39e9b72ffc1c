//! Capture of economy trace events as column tables.
//!
//! A `tracing` subscriber files every info-level event under its target
//! (`round`, `decision`, `clearing`, `synthetic`, ...) and turns each event
//! field into a column. Columns appear the first time a field is seen, so
//! the schema is whatever the economy happens to emit.
//!
//! ```ignore
//! // In economy code:
//! tracing::info!(target: "clearing", step, rate, imbalance);
//!
//! // In a test:
//! let (_, capture) = instrument::capture(|| economy.advance_round(false));
//! let rates = capture.table("clearing").unwrap().f64s("rate").unwrap();
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// === COLUMNS ===

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::U64(v) => v.len(),
            Column::I64(v) => v.len(),
            Column::F64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill with the column's zero value up to `rows`.
    fn fill_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            Column::U64(v) => v.resize(rows, 0),
            Column::I64(v) => v.resize(rows, 0),
            Column::F64(v) => v.resize(rows, 0.0),
            Column::Bool(v) => v.resize(rows, false),
            Column::Text(v) => v.resize(rows, String::new()),
        }
    }
}

// === TABLES ===

/// Rows of one event target. Every column has exactly `rows` entries once a
/// row is finished; fields an event did not carry read as zero/empty.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: BTreeMap<String, Column>,
    pub rows: usize,
}

impl Table {
    fn align(&mut self) {
        let rows = self.rows;
        for column in self.columns.values_mut() {
            column.fill_to(rows);
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn f64s(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            Column::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64s(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            Column::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn bools(&self, name: &str) -> Option<&[bool]> {
        match self.columns.get(name)? {
            Column::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn texts(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// All tables captured so far, keyed by event target.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub tables: HashMap<String, Table>,
}

impl Capture {
    pub fn table(&self, target: &str) -> Option<&Table> {
        self.tables.get(target)
    }

    /// Row count for `target`, zero when nothing was emitted.
    pub fn rows(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, |t| t.rows)
    }
}

thread_local! {
    static CAPTURE: RefCell<Capture> = RefCell::default();
}

// === SUBSCRIBER ===

struct RowWriter<'a> {
    table: &'a mut Table,
}

impl RowWriter<'_> {
    /// Column for `field`, created and back-filled on first sight.
    fn slot(&mut self, field: &Field, empty: impl FnOnce(usize) -> Column) -> &mut Column {
        let rows = self.table.rows;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| empty(rows))
    }
}

impl Visit for RowWriter<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let Column::U64(v) = self.slot(field, |n| Column::U64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let Column::I64(v) = self.slot(field, |n| Column::I64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Column::F64(v) = self.slot(field, |n| Column::F64(vec![0.0; n])) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let Column::Bool(v) = self.slot(field, |n| Column::Bool(vec![false; n])) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let Column::Text(v) = self.slot(field, |n| Column::Text(vec![String::new(); n])) {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Files info-level events into the thread-local [`Capture`]. Spans are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct CaptureSubscriber {
    /// When set, only these targets are kept.
    targets: Option<Vec<String>>,
}

impl CaptureSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: Some(targets.into_iter().map(Into::into).collect()),
        }
    }
}

impl Subscriber for CaptureSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event()
            && *metadata.level() <= tracing::Level::INFO
            && self
                .targets
                .as_ref()
                .is_none_or(|keep| keep.iter().any(|t| t == metadata.target()))
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        CAPTURE.with(|c| {
            let mut capture = c.borrow_mut();
            let table = capture.tables.entry(target).or_default();
            table.align();
            event.record(&mut RowWriter { table: &mut *table });
            table.rows += 1;
            table.align();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything captured on this thread, leaving it empty.
pub fn take() -> Capture {
    CAPTURE.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

pub fn clear() {
    CAPTURE.with(|c| *c.borrow_mut() = Capture::default());
}

/// Run `f` with a scoped capture subscriber and return what it emitted.
/// Anything captured earlier on this thread is discarded.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Capture) {
    clear();
    let out = tracing::subscriber::with_default(CaptureSubscriber::new(), f);
    (out, take())
}

// === Polars Integration ===

use polars::prelude::*;

impl Table {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| match col {
                Column::U64(v) => polars::prelude::Column::new(name.into(), v),
                Column::I64(v) => polars::prelude::Column::new(name.into(), v),
                Column::F64(v) => polars::prelude::Column::new(name.into(), v),
                Column::Bool(v) => polars::prelude::Column::new(name.into(), v),
                Column::Text(v) => polars::prelude::Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

impl Capture {
    pub fn to_dataframes(&self) -> PolarsResult<HashMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}
