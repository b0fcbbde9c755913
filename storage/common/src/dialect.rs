use quarry_ast::OrderDirection;
use quarry_core::{AdapterCapabilities, TransactionOptions};
use tracing::warn;

/// How case-insensitive pattern matches are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IlikeStyle {
    /// `"col" ilike $1`
    Native,
    /// `lower("col") like lower(?)`
    LowerLike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `on conflict (...) do update set ...` / `do nothing`
    OnConflict,
    /// `on duplicate key update ...`
    OnDuplicateKey,
}

/// The parts of SQL rendering that differ between database families.
pub trait Dialect: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn quote_char(&self) -> char;

    /// Placeholder for the `index`th bound value, counting from 1.
    fn placeholder(&self, index: usize) -> String;

    fn capabilities(&self) -> AdapterCapabilities;

    /// Case-sensitive pattern match operator.
    fn like_operator(&self) -> &'static str { "like" }

    fn ilike_style(&self) -> IlikeStyle { IlikeStyle::LowerLike }

    /// Order-by direction keyword(s). Nulls sort before every value in ascending order.
    fn order_direction(&self, direction: OrderDirection) -> &'static str {
        match direction {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }

    /// Literal limit to emit when only an offset was given, for dialects that cannot parse a bare offset.
    fn unbounded_limit(&self) -> Option<&'static str> { None }

    fn upsert_style(&self) -> UpsertStyle { UpsertStyle::OnConflict }

    /// Suffix for an insert that names no columns.
    fn empty_insert(&self) -> &'static str { " default values" }

    /// Whether `?` placeholders in raw SQL must be rewritten to this dialect's placeholder syntax.
    fn rewrites_raw_placeholders(&self) -> bool { false }

    /// Statements that open a transaction with the given options, in execution order.
    fn begin_script(&self, options: &TransactionOptions) -> Vec<String>;

    fn quote(&self, identifier: &str) -> String {
        if identifier == "*" {
            return identifier.to_owned();
        }
        let quote = self.quote_char();
        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quote each dot-separated segment of `table.column` style paths.
    fn quote_path(&self, path: &str) -> String { path.split('.').map(|segment| self.quote(segment)).collect::<Vec<_>>().join(".") }

    fn savepoint(&self, name: &str) -> String { format!("savepoint {}", self.quote(name)) }

    fn rollback_to_savepoint(&self, name: &str) -> String { format!("rollback to savepoint {}", self.quote(name)) }

    fn release_savepoint(&self, name: &str) -> String { format!("release savepoint {}", self.quote(name)) }
}

fn transaction_characteristics(options: &TransactionOptions) -> Option<String> {
    let mut modes = Vec::new();
    if let Some(level) = options.isolation_level {
        modes.push(format!("isolation level {}", level.as_sql()));
    }
    if options.read_only {
        modes.push("read only".to_owned());
    }
    if modes.is_empty() {
        None
    } else {
        Some(format!("set transaction {}", modes.join(", ")))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str { "postgres" }

    fn quote_char(&self) -> char { '"' }

    fn placeholder(&self, index: usize) -> String { format!("${index}") }

    fn capabilities(&self) -> AdapterCapabilities { AdapterCapabilities::ALL }

    fn ilike_style(&self) -> IlikeStyle { IlikeStyle::Native }

    // Postgres treats null as larger than every value.
    fn order_direction(&self, direction: OrderDirection) -> &'static str {
        match direction {
            OrderDirection::Asc => "asc nulls first",
            OrderDirection::Desc => "desc nulls last",
        }
    }

    fn rewrites_raw_placeholders(&self) -> bool { true }

    // `set transaction` only applies inside an open transaction.
    fn begin_script(&self, options: &TransactionOptions) -> Vec<String> {
        let mut script = vec!["begin".to_owned()];
        script.extend(transaction_characteristics(options));
        script
    }
}

/// MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str { "mysql" }

    fn quote_char(&self) -> char { '`' }

    fn placeholder(&self, _index: usize) -> String { "?".to_owned() }

    fn capabilities(&self) -> AdapterCapabilities { AdapterCapabilities { returning: false, savepoints: true, upsert: true } }

    fn like_operator(&self) -> &'static str { "like binary" }

    fn unbounded_limit(&self) -> Option<&'static str> { Some("18446744073709551615") }

    fn upsert_style(&self) -> UpsertStyle { UpsertStyle::OnDuplicateKey }

    fn empty_insert(&self) -> &'static str { " () values ()" }

    // `set transaction` applies to the next transaction only.
    fn begin_script(&self, options: &TransactionOptions) -> Vec<String> {
        let mut script: Vec<String> = transaction_characteristics(options).into_iter().collect();
        script.push("start transaction".to_owned());
        script
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str { "sqlite" }

    fn quote_char(&self) -> char { '"' }

    fn placeholder(&self, _index: usize) -> String { "?".to_owned() }

    fn capabilities(&self) -> AdapterCapabilities { AdapterCapabilities::ALL }

    fn unbounded_limit(&self) -> Option<&'static str> { Some("-1") }

    fn begin_script(&self, options: &TransactionOptions) -> Vec<String> {
        if !options.is_default() {
            warn!("sqlite: ignoring transaction options {:?}, transactions are always serializable", options);
        }
        vec!["begin".to_owned()]
    }
}
