use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Literal;

/// One physical row: column name to value. Missing columns read as null.
pub type Row = HashMap<String, Literal>;

/// In-memory rows per physical table.
///
/// ```json
/// { "country": [ { "code": "FRA", "name": "France", "population": 59225700 } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    tables: HashMap<String, Vec<Row>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn insert(&mut self, table: impl Into<String>, row: Row) {
        self.tables.entry(table.into()).or_default().push(row);
    }

    /// Builder form of [`Dataset::insert`].
    pub fn with_row<'c>(
        mut self,
        table: &str,
        columns: impl IntoIterator<Item = (&'c str, Literal)>,
    ) -> Self {
        let row = columns
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .collect();
        self.insert(table, row);
        self
    }

    /// Rows of `table`, empty when the table has none.
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}
