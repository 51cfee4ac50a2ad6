//! Connection handle and units of work.
//!
//! A [`Transaction`] wraps one `PostgreSQL` transaction. It first takes a
//! transaction-scoped advisory lock keyed by the tenant, so units of work of
//! one tenant apply one after another while other tenants proceed in parallel.
//! Dropping a [`Transaction`] without committing rolls it back and discards its
//! buffered events.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, Statement, TransactionTrait,
};

use tally_core::{Clock, EventSink, LedgerEvent, LedgerResult, SystemClock, TracingEventSink};
use tally_shared::LedgerConfig;
use tally_shared::types::TenantId;

use crate::mapping::StorageResultExt;

const TENANT_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

/// Handle to the ledger database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: DatabaseConnection,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: LedgerConfig,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Wraps a connection pool, using the system clock and logging events through `tracing`.
    #[must_use]
    pub fn new(conn: DatabaseConnection, config: LedgerConfig) -> Self {
        Self {
            conn,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
            config,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Ledger settings.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current date according to the clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The underlying pool, for single-statement reads.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Opens a unit of work holding the tenant's write lock.
    pub async fn begin(&self, tenant_id: TenantId) -> LedgerResult<Transaction> {
        let txn = self.conn.begin().await.storage()?;
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            TENANT_LOCK_SQL,
            [tenant_id.to_string().into()],
        ))
        .await
        .storage()?;

        Ok(Transaction {
            txn,
            events: Vec::new(),
            sink: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        })
    }

    /// Opens a read-only snapshot, for reads spanning several queries.
    pub(crate) async fn snapshot(&self) -> LedgerResult<DatabaseTransaction> {
        self.conn
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .storage()
    }
}

/// A unit of work: one database transaction plus the events it will publish.
pub struct Transaction {
    txn: DatabaseTransaction,
    events: Vec<LedgerEvent>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// The transaction all statements of this unit of work run on.
    #[must_use]
    pub fn connection(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Buffers an event for publication after commit.
    pub fn publish(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    /// Current instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Ledger settings.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Commits, then publishes buffered events.
    pub async fn commit(self) -> LedgerResult<()> {
        let Self {
            txn, events, sink, ..
        } = self;
        txn.commit().await.storage()?;
        for event in &events {
            sink.publish(event);
        }
        Ok(())
    }
}
