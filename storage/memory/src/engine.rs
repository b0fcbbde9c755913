use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use quarry_ast::{Row, Statement};
use quarry_core::{
    Adapter, AdapterCapabilities, AdapterError, AdapterResult, ExecuteRequest, Registry, TransactionOptions, TransactionToken,
};
use tracing::debug;

use crate::mutation;
use crate::pipeline;
use crate::store::Store;

/// A transaction's private copy of the store, plus the copies taken at each savepoint.
struct TransactionState {
    store: Store,
    savepoints: Vec<(String, Store)>,
}

/// In-memory reference executor. Every adapter is expected to agree with it on rows and counts.
pub struct MemoryEngine {
    store: Mutex<Store>,
    transactions: Registry<TransactionState>,
}

impl Default for MemoryEngine {
    fn default() -> Self { Self::new() }
}

fn run(store: &mut Store, statement: &Statement) -> Result<AdapterResult, AdapterError> {
    match statement {
        Statement::Raw(_) => Err(AdapterError::Unsupported("raw statements")),
        Statement::Select(select) => Ok(AdapterResult::with_rows(pipeline::select(store, select)?)),
        Statement::Count(read) | Statement::Exists(read) => Ok(AdapterResult::with_rows(pipeline::count(store, read)?)),
        Statement::Insert(insert) => mutation::insert(store, insert),
        Statement::InsertMany(insert) => mutation::insert_many(store, insert),
        Statement::Update(update) => mutation::update(store, update),
        Statement::Delete(delete) => mutation::delete(store, delete),
        Statement::Upsert(upsert) => mutation::upsert(store, upsert),
    }
}

impl MemoryEngine {
    pub fn new() -> Self { Self { store: Mutex::new(Store::default()), transactions: Registry::new() } }

    fn lock(&self) -> MutexGuard<'_, Store> { self.store.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Append rows to a table as-is, bypassing key assignment.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) { self.lock().rows_mut(table).extend(rows); }

    /// A snapshot of a table's committed rows.
    pub fn rows(&self, table: &str) -> Vec<Row> { self.lock().rows(table).to_vec() }

    fn with_transaction<R>(&self, token: TransactionToken, f: impl FnOnce(&mut TransactionState) -> R) -> Result<R, AdapterError> {
        self.transactions.with_mut(token, f).ok_or(AdapterError::UnknownTransaction(token))
    }

    fn savepoint_index(state: &TransactionState, name: &str) -> Result<usize, AdapterError> {
        state.savepoints.iter().rposition(|(savepoint, _)| savepoint == name).ok_or_else(|| AdapterError::UnknownSavepoint(name.to_owned()))
    }
}

#[async_trait]
impl Adapter for MemoryEngine {
    async fn execute(&self, request: ExecuteRequest<'_>) -> Result<AdapterResult, AdapterError> {
        let statement = request.statement;
        match request.transaction {
            Some(token) => self.with_transaction(token, |state| run(&mut state.store, statement))?,
            None => run(&mut self.lock(), statement),
        }
    }

    async fn begin_transaction(&self, options: TransactionOptions) -> Result<TransactionToken, AdapterError> {
        // Transactions see a snapshot taken here, so every isolation level behaves as serializable.
        let snapshot = self.lock().clone();
        let token = self.transactions.insert(TransactionState { store: snapshot, savepoints: Vec::new() });
        debug!("memory begin {} ({:?})", token, options);
        Ok(token)
    }

    async fn commit_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> {
        let state = self.transactions.remove(token).ok_or(AdapterError::UnknownTransaction(token))?;
        *self.lock() = state.store;
        debug!("memory commit {}", token);
        Ok(())
    }

    async fn rollback_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> {
        self.transactions.remove(token).ok_or(AdapterError::UnknownTransaction(token))?;
        debug!("memory rollback {}", token);
        Ok(())
    }

    async fn create_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.with_transaction(token, |state| state.savepoints.push((name.to_owned(), state.store.clone())))?;
        debug!("memory savepoint {} in {}", name, token);
        Ok(())
    }

    async fn rollback_to_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.with_transaction(token, |state| {
            let index = Self::savepoint_index(state, name)?;
            // Savepoints taken after this one are gone; this one survives.
            state.savepoints.truncate(index + 1);
            state.store = state.savepoints[index].1.clone();
            Ok::<_, AdapterError>(())
        })??;
        debug!("memory rollback to savepoint {} in {}", name, token);
        Ok(())
    }

    async fn release_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        self.with_transaction(token, |state| {
            let index = Self::savepoint_index(state, name)?;
            state.savepoints.truncate(index);
            Ok::<_, AdapterError>(())
        })??;
        debug!("memory release savepoint {} in {}", name, token);
        Ok(())
    }

    fn capabilities(&self) -> AdapterCapabilities { AdapterCapabilities::ALL }
}
