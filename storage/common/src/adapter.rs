use std::sync::Arc;

use async_trait::async_trait;
use quarry_ast::{Returning, Row, Statement, Table, Value};
use quarry_core::{
    Adapter, AdapterCapabilities, AdapterError, AdapterResult, CapabilityOverrides, ExecuteRequest, Registry, TransactionOptions,
    TransactionToken, COUNT_COLUMN,
};
use tracing::{debug, warn};

use crate::compiler::{CompiledQuery, Compiler};
use crate::dialect::{Dialect, MySqlDialect};
use crate::driver::{Client, Connection, Lease, QueryOutput};

/// MySQL-family adapter over any driver implementing [`Client`].
pub type MySql<C> = SqlAdapter<MySqlDialect, C>;

struct Held<C> {
    connection: Arc<C>,
    dedicated: bool,
}

impl<C> Clone for Held<C> {
    fn clone(&self) -> Self { Self { connection: self.connection.clone(), dedicated: self.dedicated } }
}

/// Executes statements by compiling them for dialect `D` and running them through client `C`.
pub struct SqlAdapter<D: Dialect, C: Client> {
    dialect: D,
    client: C,
    capabilities: AdapterCapabilities,
    transactions: Registry<Held<C::Connection>>,
}

impl<D: Dialect + Default, C: Client> SqlAdapter<D, C> {
    pub fn new(client: C) -> Self { Self::with_dialect(D::default(), client) }
}

impl<D: Dialect, C: Client> SqlAdapter<D, C> {
    pub fn with_dialect(dialect: D, client: C) -> Self {
        let capabilities = dialect.capabilities();
        Self { dialect, client, capabilities, transactions: Registry::new() }
    }

    pub fn with_capabilities(mut self, overrides: &CapabilityOverrides) -> Self {
        self.capabilities = self.capabilities.with_overrides(overrides);
        self
    }

    pub fn dialect(&self) -> &D { &self.dialect }

    pub fn client(&self) -> &C { &self.client }

    /// Compile with this adapter's capabilities.
    pub fn compile(&self, statement: &Statement) -> Result<CompiledQuery, AdapterError> {
        Compiler::new(&self.dialect).with_returning(self.capabilities.returning).compile(statement)
    }

    fn held(&self, token: TransactionToken) -> Result<Held<C::Connection>, AdapterError> {
        self.transactions.get(token).ok_or(AdapterError::UnknownTransaction(token))
    }

    async fn run(&self, transaction: Option<TransactionToken>, query: &CompiledQuery) -> Result<QueryOutput, AdapterError> {
        match transaction {
            Some(token) => {
                debug!("{} [{}]: SQL: {} with args: {:?}", self.dialect.name(), token, query.text, query.values);
                let held = self.held(token)?;
                held.connection.query(&query.text, &query.values).await
            }
            None => {
                debug!("{}: SQL: {} with args: {:?}", self.dialect.name(), query.text, query.values);
                self.client.query(&query.text, &query.values).await
            }
        }
    }

    async fn finish(&self, token: TransactionToken, commit: bool) -> Result<(), AdapterError> {
        let held = self.held(token)?;
        let outcome = if commit { held.connection.commit().await } else { held.connection.rollback().await };
        self.transactions.remove(token);
        if held.dedicated {
            held.connection.release().await;
        }
        match &outcome {
            Ok(()) => debug!("{}: {} transaction {}", self.dialect.name(), if commit { "committed" } else { "rolled back" }, token),
            Err(err) => warn!("{}: ending transaction {} failed: {}", self.dialect.name(), token, err),
        }
        outcome
    }

    async fn savepoint_statement(&self, token: TransactionToken, sql: String) -> Result<(), AdapterError> {
        if !self.capabilities.savepoints {
            return Err(AdapterError::Unsupported("savepoints"));
        }
        let held = self.held(token)?;
        debug!("{} [{}]: {}", self.dialect.name(), token, sql);
        held.connection.batch(&sql).await
    }
}

/// Coerce the count column to an integer. Some drivers report `count(*)` as a decimal string.
fn coerce_count(mut row: Row) -> Row {
    if let Some(value) = row.get_mut(COUNT_COLUMN) {
        *value = match std::mem::replace(value, Value::Null) {
            Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).unwrap_or(Value::String(s)),
            Value::Float(float) => Value::Integer(float as i64),
            Value::Bool(b) => Value::Integer(b as i64),
            other => other,
        };
    }
    row
}

fn without(mut row: Row, column: &str) -> Row {
    row.shift_remove(column);
    row
}

#[async_trait]
impl<D: Dialect, C: Client> Adapter for SqlAdapter<D, C> {
    async fn execute(&self, request: ExecuteRequest<'_>) -> Result<AdapterResult, AdapterError> {
        let statement = request.statement;
        match statement {
            Statement::InsertMany(insert) if insert.values.is_empty() => return Ok(AdapterResult::affected(0)),
            Statement::Upsert(_) if !self.capabilities.upsert => return Err(AdapterError::Unsupported("upsert")),
            _ => {}
        }

        let returning = statement.returning_clause();
        let requested = returning.is_some_and(Returning::is_requested);
        if requested && !self.capabilities.returning {
            return Err(AdapterError::Unsupported("returning"));
        }

        let key = if statement.is_insert() { statement.table().and_then(Table::single_primary_key) } else { None };
        // Ask for the key back so inserts can report it. It is stripped from the rows the caller sees.
        let added_key = key.filter(|key| self.capabilities.returning && !returning.is_some_and(|r| r.includes(key)));
        let query = match added_key {
            Some(key) => {
                let mut columns = match returning {
                    Some(Returning::Columns(columns)) => columns.clone(),
                    _ => Vec::new(),
                };
                columns.push(key.to_owned());
                self.compile(&statement.clone().returning(Returning::Columns(columns)))?
            }
            None => self.compile(statement)?,
        };

        let output = self.run(request.transaction, &query).await?;
        let result = match (statement, output) {
            (Statement::Count(_) | Statement::Exists(_), QueryOutput::Rows(rows)) => {
                AdapterResult::with_rows(rows.into_iter().map(coerce_count).collect())
            }
            (Statement::Select(_) | Statement::Raw(_), QueryOutput::Rows(rows)) => AdapterResult::with_rows(rows),
            (_, QueryOutput::Rows(rows)) => {
                let insert_id = key.and_then(|key| rows.last()?.get(key).cloned());
                let affected_rows = Some(rows.len() as u64);
                let rows = match added_key {
                    _ if !requested => None,
                    Some(key) => Some(rows.into_iter().map(|row| without(row, key)).collect()),
                    None => Some(rows),
                };
                AdapterResult { affected_rows, insert_id, rows }
            }
            (_, QueryOutput::Written { affected_rows, last_insert_id }) => AdapterResult {
                rows: None,
                affected_rows: Some(affected_rows),
                insert_id: key.and(last_insert_id).filter(|id| !id.is_null()),
            },
        };
        Ok(result)
    }

    async fn begin_transaction(&self, options: TransactionOptions) -> Result<TransactionToken, AdapterError> {
        let held = match self.client.acquire().await? {
            Lease::Dedicated(connection) => Held { connection: Arc::new(connection), dedicated: true },
            Lease::Shared(connection) => Held { connection, dedicated: false },
        };

        for (i, sql) in self.dialect.begin_script(&options).iter().enumerate() {
            debug!("{}: {}", self.dialect.name(), sql);
            if let Err(err) = held.connection.batch(sql).await {
                if i > 0 {
                    if let Err(rollback_err) = held.connection.rollback().await {
                        warn!("{}: rollback after failed begin failed: {}", self.dialect.name(), rollback_err);
                    }
                }
                if held.dedicated {
                    held.connection.release().await;
                }
                return Err(err);
            }
        }

        let token = self.transactions.insert(held);
        debug!("{}: began transaction {}", self.dialect.name(), token);
        Ok(token)
    }

    async fn commit_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> { self.finish(token, true).await }

    async fn rollback_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> { self.finish(token, false).await }

    async fn create_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.savepoint_statement(token, self.dialect.savepoint(name)).await
    }

    async fn rollback_to_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.savepoint_statement(token, self.dialect.rollback_to_savepoint(name)).await
    }

    async fn release_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.savepoint_statement(token, self.dialect.release_savepoint(name)).await
    }

    fn capabilities(&self) -> AdapterCapabilities { self.capabilities }
}
