use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(column_type: ColumnType) -> Self { Self { column_type, nullable: true } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, ColumnSchema>,
    pub primary_key: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), columns: IndexMap::new(), primary_key: Vec::new() } }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name.into(), ColumnSchema::new(column_type));
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// The primary key column when the key is not composite.
    pub fn single_primary_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// The primary key column that may be assigned automatically on insert: a single integer column.
    pub fn auto_increment_key(&self) -> Option<&str> {
        let key = self.single_primary_key()?;
        match self.columns.get(key) {
            Some(schema) if schema.column_type == ColumnType::Integer => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    ILike,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A literal, bound as a parameter.
    Value(Value),
    /// A list of literals for `In`/`NotIn`.
    List(Vec<Value>),
    /// Another column, rendered as an identifier.
    Column(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullOperator {
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison { column: String, operator: ComparisonOperator, operand: Operand },
    /// Inclusive on both bounds.
    Between { column: String, lower: Value, upper: Value },
    Null { column: String, operator: NullOperator },
    Logical { operator: LogicalOperator, predicates: Vec<Predicate> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Table,
    pub on: Predicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumn {
    pub column: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    All,
    Columns(Vec<SelectColumn>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Returning {
    #[default]
    None,
    All,
    Columns(Vec<String>),
}

impl Returning {
    pub fn is_requested(&self) -> bool { !matches!(self, Returning::None) }

    /// Whether the returned rows carry `column`. An empty column list returns every column.
    pub fn includes(&self, column: &str) -> bool {
        match self {
            Returning::None => false,
            Returning::All => true,
            Returning::Columns(columns) => columns.is_empty() || columns.iter().any(|c| c.rsplit('.').next() == Some(column)),
        }
    }
}

/// The parts shared by every read: source, joins, filters and grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadStatement {
    pub table: Table,
    pub joins: Vec<Join>,
    /// The `where` list. Entries are implicitly AND-ed.
    pub filter: Vec<Predicate>,
    pub group_by: Vec<String>,
    pub having: Vec<Predicate>,
}

impl ReadStatement {
    pub fn new(table: Table) -> Self { Self { table, joins: Vec::new(), filter: Vec::new(), group_by: Vec::new(), having: Vec::new() } }

    pub fn join(mut self, kind: JoinKind, table: Table, on: Predicate) -> Self {
        self.joins.push(Join { kind, table, on });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub read: ReadStatement,
    pub distinct: bool,
    pub projection: Projection,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement {
    pub fn new(read: ReadStatement) -> Self {
        Self { read, distinct: false, projection: Projection::All, order_by: Vec::new(), limit: None, offset: None }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column(self, column: impl Into<String>) -> Self { self.push_column(column.into(), None) }

    pub fn column_as(self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        self.push_column(column.into(), Some(alias.into()))
    }

    fn push_column(mut self, column: String, alias: Option<String>) -> Self {
        match &mut self.projection {
            Projection::All => self.projection = Projection::Columns(vec![SelectColumn { column, alias }]),
            Projection::Columns(columns) => columns.push(SelectColumn { column, alias }),
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy { column: column.into(), direction });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: Table,
    pub values: Row,
    pub returning: Returning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertManyStatement {
    pub table: Table,
    pub values: Vec<Row>,
    pub returning: Returning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table: Table,
    pub changes: Row,
    pub filter: Vec<Predicate>,
    pub returning: Returning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table: Table,
    pub filter: Vec<Predicate>,
    pub returning: Returning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertStatement {
    pub table: Table,
    pub values: Row,
    /// Defaults to the table's primary key.
    pub conflict_target: Option<Vec<String>>,
    /// Defaults to `values`.
    pub update: Option<Row>,
    pub returning: Returning,
}

impl UpsertStatement {
    pub fn conflict_columns(&self) -> &[String] { self.conflict_target.as_deref().unwrap_or(&self.table.primary_key) }

    /// The assignments applied when a conflicting row exists. Empty means "do nothing".
    pub fn update_values(&self) -> &Row { self.update.as_ref().unwrap_or(&self.values) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// One database operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Raw(RawStatement),
    Select(SelectStatement),
    Count(ReadStatement),
    Exists(ReadStatement),
    Insert(InsertStatement),
    InsertMany(InsertManyStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Upsert(UpsertStatement),
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Raw(_) => "raw",
            Statement::Select(_) => "select",
            Statement::Count(_) => "count",
            Statement::Exists(_) => "exists",
            Statement::Insert(_) => "insert",
            Statement::InsertMany(_) => "insertMany",
            Statement::Update(_) => "update",
            Statement::Delete(_) => "delete",
            Statement::Upsert(_) => "upsert",
        }
    }

    /// The target table, if the statement has one.
    pub fn table(&self) -> Option<&Table> {
        match self {
            Statement::Raw(_) => None,
            Statement::Select(select) => Some(&select.read.table),
            Statement::Count(read) | Statement::Exists(read) => Some(&read.table),
            Statement::Insert(insert) => Some(&insert.table),
            Statement::InsertMany(insert) => Some(&insert.table),
            Statement::Update(update) => Some(&update.table),
            Statement::Delete(delete) => Some(&delete.table),
            Statement::Upsert(upsert) => Some(&upsert.table),
        }
    }

    /// The `returning` clause of a write. `None` for reads and raw statements.
    pub fn returning_clause(&self) -> Option<&Returning> {
        match self {
            Statement::Insert(s) => Some(&s.returning),
            Statement::InsertMany(s) => Some(&s.returning),
            Statement::Update(s) => Some(&s.returning),
            Statement::Delete(s) => Some(&s.returning),
            Statement::Upsert(s) => Some(&s.returning),
            Statement::Raw(_) | Statement::Select(_) | Statement::Count(_) | Statement::Exists(_) => None,
        }
    }

    /// Whether the statement creates rows and may therefore report an `insert_id`.
    pub fn is_insert(&self) -> bool { matches!(self, Statement::Insert(_) | Statement::InsertMany(_) | Statement::Upsert(_)) }

    pub fn raw(sql: impl Into<String>, values: Vec<Value>) -> Self { Statement::Raw(RawStatement { sql: sql.into(), values }) }

    pub fn insert(table: Table, values: Row) -> Self { Statement::Insert(InsertStatement { table, values, returning: Returning::None }) }

    pub fn insert_many(table: Table, values: Vec<Row>) -> Self {
        Statement::InsertMany(InsertManyStatement { table, values, returning: Returning::None })
    }

    pub fn update(table: Table, changes: Row, filter: Vec<Predicate>) -> Self {
        Statement::Update(UpdateStatement { table, changes, filter, returning: Returning::None })
    }

    pub fn delete(table: Table, filter: Vec<Predicate>) -> Self { Statement::Delete(DeleteStatement { table, filter, returning: Returning::None }) }

    pub fn upsert(table: Table, values: Row) -> Self {
        Statement::Upsert(UpsertStatement { table, values, conflict_target: None, update: None, returning: Returning::None })
    }

    /// Replace the `returning` clause of a write. Reads and raw statements are returned unchanged.
    pub fn returning(mut self, returning: Returning) -> Self {
        match &mut self {
            Statement::Insert(s) => s.returning = returning,
            Statement::InsertMany(s) => s.returning = returning,
            Statement::Update(s) => s.returning = returning,
            Statement::Delete(s) => s.returning = returning,
            Statement::Upsert(s) => s.returning = returning,
            Statement::Raw(_) | Statement::Select(_) | Statement::Count(_) | Statement::Exists(_) => {}
        }
        self
    }
}

impl From<SelectStatement> for Statement {
    fn from(select: SelectStatement) -> Self { Statement::Select(select) }
}
