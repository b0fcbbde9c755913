use std::collections::BTreeMap;

use quarry_ast::Row;

/// Every table's rows, in insertion order. Cloned wholesale for transactions and savepoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    tables: BTreeMap<String, Vec<Row>>,
}

impl Store {
    pub fn rows(&self, table: &str) -> &[Row] { self.tables.get(table).map(Vec::as_slice).unwrap_or_default() }

    pub fn rows_mut(&mut self, table: &str) -> &mut Vec<Row> { self.tables.entry(table.to_owned()).or_default() }

    pub fn table_names(&self) -> impl Iterator<Item = &str> { self.tables.keys().map(String::as_str) }
}
