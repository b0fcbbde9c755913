use std::collections::HashSet;

use quarry_ast::{
    ComparisonOperator, Join, JoinKind, LogicalOperator, NullOperator, Operand, Predicate, Projection, ReadStatement, Returning, Row,
    SelectStatement, Statement, Table, UpsertStatement, Value,
};
use quarry_core::{AdapterError, COUNT_COLUMN};

use crate::dialect::{Dialect, IlikeStyle, UpsertStyle};

/// SQL text plus its bound values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub text: String,
    pub values: Vec<Value>,
}

pub enum SqlExpr {
    Sql(String),
    Argument(Value),
}

/// Accumulates SQL fragments and arguments. Placeholders are numbered once, in order, on [`SqlBuilder::build`].
#[derive(Default)]
pub struct SqlBuilder {
    expressions: Vec<SqlExpr>,
}

impl SqlBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, expr: SqlExpr) { self.expressions.push(expr); }

    pub fn arg(&mut self, value: Value) { self.push(SqlExpr::Argument(value)); }

    pub fn sql(&mut self, s: impl AsRef<str>) { self.push(SqlExpr::Sql(s.as_ref().to_owned())); }

    pub fn build(self, dialect: &dyn Dialect) -> CompiledQuery {
        let mut counter = 1;
        let mut text = String::new();
        let mut values = Vec::new();
        for expr in self.expressions {
            match expr {
                SqlExpr::Argument(value) => {
                    text += &dialect.placeholder(counter);
                    values.push(value);
                    counter += 1;
                }
                SqlExpr::Sql(s) => text += &s,
            }
        }
        CompiledQuery { text, values }
    }
}

/// Compile with the dialect's default capabilities.
pub fn compile(dialect: &dyn Dialect, statement: &Statement) -> Result<CompiledQuery, AdapterError> {
    Compiler::new(dialect).compile(statement)
}

/// Renders one [`Statement`] for one dialect.
pub struct Compiler<'a> {
    dialect: &'a dyn Dialect,
    returning: bool,
    builder: SqlBuilder,
}

impl<'a> Compiler<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self { Self { dialect, returning: dialect.capabilities().returning, builder: SqlBuilder::new() } }

    /// Whether `returning` clauses are emitted. When disabled they are silently dropped.
    pub fn with_returning(mut self, returning: bool) -> Self {
        self.returning = returning;
        self
    }

    pub fn compile(mut self, statement: &Statement) -> Result<CompiledQuery, AdapterError> {
        match statement {
            Statement::Raw(raw) => {
                let text = if self.dialect.rewrites_raw_placeholders() { rewrite_placeholders(&raw.sql, self.dialect) } else { raw.sql.clone() };
                return Ok(CompiledQuery { text, values: raw.values.clone() });
            }
            Statement::Select(select) => self.select(select)?,
            Statement::Count(read) | Statement::Exists(read) => self.count(read)?,
            Statement::Insert(insert) => {
                self.insert(&insert.table, std::slice::from_ref(&insert.values))?;
                self.returning(&insert.returning);
            }
            Statement::InsertMany(insert) => {
                if insert.values.is_empty() {
                    return Err(AdapterError::invalid("insert of zero rows has no SQL form"));
                }
                self.insert(&insert.table, &insert.values)?;
                self.returning(&insert.returning);
            }
            Statement::Update(update) => {
                if update.changes.is_empty() {
                    return Err(AdapterError::invalid(format!("update of {} has no changes", update.table.name)));
                }
                self.sql("update ");
                self.table(&update.table);
                self.sql(" set ");
                self.assignments(&update.changes);
                self.filter(&update.filter)?;
                self.returning(&update.returning);
            }
            Statement::Delete(delete) => {
                self.sql("delete from ");
                self.table(&delete.table);
                self.filter(&delete.filter)?;
                self.returning(&delete.returning);
            }
            Statement::Upsert(upsert) => {
                self.insert(&upsert.table, std::slice::from_ref(&upsert.values))?;
                self.upsert(upsert)?;
                self.returning(&upsert.returning);
            }
        }
        Ok(self.builder.build(self.dialect))
    }

    fn sql(&mut self, s: impl AsRef<str>) { self.builder.sql(s); }

    fn arg(&mut self, value: Value) { self.builder.arg(value); }

    fn ident(&mut self, path: &str) {
        let quoted = self.dialect.quote_path(path);
        self.sql(quoted);
    }

    fn table(&mut self, table: &Table) { self.ident(&table.name); }

    fn comma_separated<T>(&mut self, items: &[T], mut render: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql(", ");
            }
            render(self, item);
        }
    }

    fn select(&mut self, select: &SelectStatement) -> Result<(), AdapterError> {
        self.sql("select ");
        if select.distinct {
            self.sql("distinct ");
        }
        match &select.projection {
            Projection::All => self.sql("*"),
            Projection::Columns(columns) if columns.is_empty() => self.sql("*"),
            Projection::Columns(columns) => self.comma_separated(columns, |this, column| {
                this.ident(&column.column);
                if let Some(alias) = &column.alias {
                    let alias = this.dialect.quote(alias);
                    this.sql(format!(" as {alias}"));
                }
            }),
        }
        self.sql(" from ");
        self.read(&select.read)?;

        if !select.order_by.is_empty() {
            self.sql(" order by ");
            self.comma_separated(&select.order_by, |this, order| {
                this.ident(&order.column);
                let direction = this.dialect.order_direction(order.direction);
                this.sql(format!(" {direction}"));
            });
        }

        match (select.limit, select.offset) {
            (Some(limit), _) => {
                self.sql(" limit ");
                self.arg(bound_integer(limit)?);
            }
            (None, Some(_)) => {
                if let Some(unbounded) = self.dialect.unbounded_limit() {
                    self.sql(format!(" limit {unbounded}"));
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = select.offset {
            self.sql(" offset ");
            self.arg(bound_integer(offset)?);
        }
        Ok(())
    }

    fn count(&mut self, read: &ReadStatement) -> Result<(), AdapterError> {
        let count = self.dialect.quote(COUNT_COLUMN);
        self.sql(format!("select count(*) as {count} from (select 1 from "));
        self.read(read)?;
        let alias = self.dialect.quote("q");
        self.sql(format!(") as {alias}"));
        Ok(())
    }

    /// `<table> <joins> [where] [group by] [having]`
    fn read(&mut self, read: &ReadStatement) -> Result<(), AdapterError> {
        self.table(&read.table);
        for join in &read.joins {
            self.join(join)?;
        }
        self.filter(&read.filter)?;
        if !read.group_by.is_empty() {
            self.sql(" group by ");
            self.comma_separated(&read.group_by, |this, column| this.ident(column));
        }
        if !read.having.is_empty() {
            self.sql(" having ");
            self.conjunction(&read.having)?;
        }
        Ok(())
    }

    fn join(&mut self, join: &Join) -> Result<(), AdapterError> {
        self.sql(match join.kind {
            JoinKind::Inner => " inner join ",
            JoinKind::Left => " left join ",
            JoinKind::Right => " right join ",
            JoinKind::Full => " full join ",
        });
        self.table(&join.table);
        self.sql(" on ");
        self.predicate(&join.on)
    }

    fn filter(&mut self, filter: &[Predicate]) -> Result<(), AdapterError> {
        if filter.is_empty() {
            return Ok(());
        }
        self.sql(" where ");
        self.conjunction(filter)
    }

    /// Top-level predicate lists: a single entry renders bare, several are parenthesized and AND-ed.
    fn conjunction(&mut self, predicates: &[Predicate]) -> Result<(), AdapterError> {
        match predicates {
            [only] => self.predicate(only),
            _ => self.children(predicates, " and "),
        }
    }

    fn children(&mut self, predicates: &[Predicate], separator: &str) -> Result<(), AdapterError> {
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                self.sql(separator);
            }
            self.sql("(");
            self.predicate(predicate)?;
            self.sql(")");
        }
        Ok(())
    }

    pub fn predicate(&mut self, predicate: &Predicate) -> Result<(), AdapterError> {
        match predicate {
            Predicate::Comparison { column, operator, operand } => self.comparison(column, *operator, operand)?,
            Predicate::Between { column, lower, upper } => {
                self.ident(column);
                self.sql(" between ");
                self.arg(lower.clone());
                self.sql(" and ");
                self.arg(upper.clone());
            }
            Predicate::Null { column, operator } => {
                self.ident(column);
                self.sql(match operator {
                    NullOperator::IsNull => " is null",
                    NullOperator::IsNotNull => " is not null",
                });
            }
            Predicate::Logical { operator, predicates } => match (operator, predicates.is_empty()) {
                (LogicalOperator::And, true) => self.sql("1 = 1"),
                (LogicalOperator::Or, true) => self.sql("1 = 0"),
                (LogicalOperator::And, false) => self.children(predicates, " and ")?,
                (LogicalOperator::Or, false) => self.children(predicates, " or ")?,
            },
        }
        Ok(())
    }

    fn comparison(&mut self, column: &str, operator: ComparisonOperator, operand: &Operand) -> Result<(), AdapterError> {
        use ComparisonOperator::*;

        if let In | NotIn = operator {
            let values = match operand {
                Operand::List(values) => values.as_slice(),
                Operand::Value(value) => std::slice::from_ref(value),
                Operand::Column(_) => return Err(AdapterError::invalid(format!("{column}: in/not in requires a list of values"))),
            };
            if values.is_empty() {
                self.sql(if operator == In { "1 = 0" } else { "1 = 1" });
                return Ok(());
            }
            self.ident(column);
            self.sql(if operator == In { " in (" } else { " not in (" });
            self.comma_separated(values, |this, value| this.arg(value.clone()));
            self.sql(")");
            return Ok(());
        }

        if let Operand::List(_) = operand {
            return Err(AdapterError::invalid(format!("{column}: only in/not in accept a list of values")));
        }

        match (operator, operand) {
            (Eq, Operand::Value(Value::Null)) => {
                self.ident(column);
                self.sql(" is null");
                return Ok(());
            }
            (Ne, Operand::Value(Value::Null)) => {
                self.ident(column);
                self.sql(" is not null");
                return Ok(());
            }
            _ => {}
        }

        if operator == ILike && self.dialect.ilike_style() == IlikeStyle::LowerLike {
            self.sql("lower(");
            self.ident(column);
            self.sql(") like lower(");
            self.operand(operand);
            self.sql(")");
            return Ok(());
        }

        self.ident(column);
        let op = match operator {
            Eq => "=",
            Ne => "<>",
            Gt => ">",
            Gte => ">=",
            Lt => "<",
            Lte => "<=",
            Like => self.dialect.like_operator(),
            ILike => "ilike",
            In | NotIn => unreachable!("handled above"),
        };
        self.sql(format!(" {op} "));
        self.operand(operand);
        Ok(())
    }

    fn operand(&mut self, operand: &Operand) {
        match operand {
            Operand::Value(value) => self.arg(value.clone()),
            Operand::Column(column) => self.ident(column),
            Operand::List(values) => {
                self.sql("(");
                self.comma_separated(values, |this, value| this.arg(value.clone()));
                self.sql(")");
            }
        }
    }

    fn insert(&mut self, table: &Table, rows: &[Row]) -> Result<(), AdapterError> {
        let columns = column_union(rows);
        self.sql("insert into ");
        self.table(table);
        if columns.is_empty() {
            if rows.len() > 1 {
                return Err(AdapterError::invalid(format!("insert of {} rows into {} names no columns", rows.len(), table.name)));
            }
            self.sql(self.dialect.empty_insert());
            return Ok(());
        }
        self.sql(" (");
        self.comma_separated(&columns, |this, column| {
            let quoted = this.dialect.quote(column);
            this.sql(quoted);
        });
        self.sql(") values ");
        self.comma_separated(rows, |this, row| {
            this.sql("(");
            this.comma_separated(&columns, |this, column| this.arg(row.get(column.as_str()).cloned().unwrap_or(Value::Null)));
            this.sql(")");
        });
        Ok(())
    }

    fn assignments(&mut self, changes: &Row) {
        let changes: Vec<(&String, &Value)> = changes.iter().collect();
        self.comma_separated(&changes, |this, (column, value)| {
            let quoted = this.dialect.quote(column);
            this.sql(format!("{quoted} = "));
            this.arg((*value).clone());
        });
    }

    fn upsert(&mut self, upsert: &UpsertStatement) -> Result<(), AdapterError> {
        let targets = upsert.conflict_columns();
        let updates = upsert.update_values();
        match self.dialect.upsert_style() {
            UpsertStyle::OnConflict => {
                self.sql(" on conflict");
                if !targets.is_empty() {
                    self.sql(" (");
                    self.comma_separated(targets, |this, column| {
                        let quoted = this.dialect.quote(column);
                        this.sql(quoted);
                    });
                    self.sql(")");
                }
                if updates.is_empty() {
                    self.sql(" do nothing");
                } else if targets.is_empty() {
                    return Err(AdapterError::invalid(format!("upsert into {} needs a conflict target to update", upsert.table.name)));
                } else {
                    self.sql(" do update set ");
                    self.assignments(updates);
                }
            }
            UpsertStyle::OnDuplicateKey => {
                self.sql(" on duplicate key update ");
                if updates.is_empty() {
                    // No-op assignment, the only way to spell "do nothing".
                    let column = targets
                        .first()
                        .or_else(|| upsert.values.keys().next())
                        .ok_or_else(|| AdapterError::invalid(format!("upsert into {} names no columns", upsert.table.name)))?;
                    let quoted = self.dialect.quote(column);
                    self.sql(format!("{quoted} = {quoted}"));
                } else {
                    self.assignments(updates);
                }
            }
        }
        Ok(())
    }

    fn returning(&mut self, returning: &Returning) {
        if !self.returning {
            return;
        }
        match returning {
            Returning::None => {}
            Returning::All => self.sql(" returning *"),
            Returning::Columns(columns) if columns.is_empty() => self.sql(" returning *"),
            Returning::Columns(columns) => {
                self.sql(" returning ");
                self.comma_separated(columns, |this, column| this.ident(column));
            }
        }
    }
}

fn bound_integer(n: u64) -> Result<Value, AdapterError> {
    i64::try_from(n).map(Value::Integer).map_err(|_| AdapterError::invalid(format!("{n} is out of range for a bound integer")))
}

/// Union of the rows' keys, in first-seen order.
fn column_union(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for column in rows.iter().flat_map(|row| row.keys()) {
        if seen.insert(column.as_str()) {
            columns.push(column.clone());
        }
    }
    columns
}

/// Rewrite `?` placeholders outside single-quoted literals.
fn rewrite_placeholders(sql: &str, dialect: &dyn Dialect) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;
    let mut counter = 0;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                counter += 1;
                out += &dialect.placeholder(counter);
            }
            _ => out.push(c),
        }
    }
    out
}
