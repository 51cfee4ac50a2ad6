//! ReconciliationSessions: the bank reconciliation workflow.
//!
//! Matches are re-checked against committed state inside the unit of work
//! that applies them, and `reconciliation_matches` holds each bank
//! transaction and ledger line at most once, so two sessions can never
//! reconcile the same item.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};

use tally_core::bank::{
    BankTransaction, MatchPair, MatchedPair, Reconciliation, ReconciliationStatus,
};
use tally_core::events::LedgerEvent;
use tally_core::ledger::LedgerLine;
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{
    BankAccountId, BankTransactionId, LedgerLineId, ReconciliationId, TenantId,
};

use crate::entities::{bank_accounts, bank_transactions, ledger_lines, reconciliation_matches};
use crate::mapping::{self, StorageResultExt};
use crate::queries;
use crate::store::{Database, Transaction};

/// Bank reconciliation sessions.
#[derive(Debug, Clone)]
pub struct ReconciliationSessions {
    db: Database,
}

impl ReconciliationSessions {
    /// Creates a new session manager.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Starts a session for a bank statement. The session opens in `in_progress`.
    pub async fn start(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        statement_balance: Decimal,
        statement_date: NaiveDate,
    ) -> LedgerResult<Reconciliation> {
        let tx = self.db.begin(tenant_id).await?;
        queries::bank_account(tx.connection(), tenant_id, bank_account_id).await?;

        let mut session = Reconciliation::new(
            tenant_id,
            bank_account_id,
            statement_balance,
            statement_date,
            tx.now(),
        );
        session.transition(ReconciliationStatus::InProgress)?;
        mapping::reconciliation_row(&session)
            .insert(tx.connection())
            .await
            .storage()?;
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            reconciliation_id = %session.id,
            bank_account_id = %bank_account_id,
            statement_balance = %statement_balance,
            "Reconciliation started"
        );
        Ok(session)
    }

    /// Applies matched pairs. Every pair is applied or none is.
    ///
    /// Items already reconciled (by this or any other session) fail the whole
    /// call with `AlreadyReconciled` naming every conflicting item.
    pub async fn apply_matches(
        &self,
        tenant_id: TenantId,
        id: ReconciliationId,
        pairs: &[MatchPair],
    ) -> LedgerResult<Reconciliation> {
        if pairs.is_empty() {
            return Err(LedgerError::validation("no matches to apply"));
        }
        let mut seen_banks = HashSet::new();
        let mut seen_lines = HashSet::new();
        for pair in pairs {
            if !seen_banks.insert(pair.bank_transaction_id)
                || !seen_lines.insert(pair.ledger_line_id)
            {
                return Err(LedgerError::validation(format!(
                    "bank transaction {} or ledger line {} appears more than once",
                    pair.bank_transaction_id, pair.ledger_line_id
                )));
            }
        }

        let tx = self.db.begin(tenant_id).await?;
        let mut session = queries::reconciliation(tx.connection(), tenant_id, id).await?;
        session.ensure_in_progress()?;
        let bank_account_id = session.bank_account_id;
        let ledger_account_id = queries::bank_account(tx.connection(), tenant_id, bank_account_id)
            .await?
            .ledger_account_id;

        let transactions = bank_transactions_by_id(&tx, pairs).await?;
        let lines = ledger_lines_by_id(&tx, pairs).await?;

        let mut matched = Vec::with_capacity(pairs.len());
        let mut conflicting_banks = Vec::new();
        let mut conflicting_lines = Vec::new();
        for pair in pairs {
            let txn = transactions
                .get(&pair.bank_transaction_id)
                .filter(|t| t.tenant_id == tenant_id && t.bank_account_id == bank_account_id)
                .ok_or_else(|| {
                    LedgerError::validation(format!(
                        "bank transaction {} is not on this bank account",
                        pair.bank_transaction_id
                    ))
                })?;
            let line = lines
                .get(&pair.ledger_line_id)
                .filter(|l| l.tenant_id == tenant_id && l.account_id == ledger_account_id)
                .ok_or_else(|| {
                    LedgerError::validation(format!(
                        "ledger line {} is not on the linked ledger account",
                        pair.ledger_line_id
                    ))
                })?;
            if txn.amount != line.signed_amount() {
                return Err(LedgerError::validation(format!(
                    "bank transaction {} amount {} does not equal ledger line {} amount {}",
                    txn.id,
                    txn.amount.normalize(),
                    line.id,
                    line.signed_amount().normalize()
                )));
            }
            if txn.is_reconciled() {
                conflicting_banks.push(txn.id);
            }
            if line.is_reconciled() {
                conflicting_lines.push(line.id);
            }
            matched.push(MatchedPair {
                bank_transaction_id: txn.id,
                ledger_line_id: line.id,
                amount: txn.amount,
            });
        }

        if !conflicting_banks.is_empty() || !conflicting_lines.is_empty() {
            warn!(
                tenant_id = %tenant_id,
                reconciliation_id = %id,
                bank_transactions = ?conflicting_banks,
                ledger_lines = ?conflicting_lines,
                "Match conflict: items already reconciled"
            );
            return Err(LedgerError::AlreadyReconciled {
                bank_transactions: conflicting_banks,
                ledger_lines: conflicting_lines,
            });
        }

        link(&tx, &matched, Some(id)).await?;
        for pair in &matched {
            mapping::match_row(id, pair)
                .insert(tx.connection())
                .await
                .storage()?;
        }
        tx.commit().await?;

        session.matches.extend(matched.iter().copied());
        info!(
            tenant_id = %tenant_id,
            reconciliation_id = %id,
            applied = matched.len(),
            matched_total = %session.matched_total(),
            "Matches applied"
        );
        Ok(session)
    }

    /// Releases the matches of the given bank transactions.
    pub async fn unmatch(
        &self,
        tenant_id: TenantId,
        id: ReconciliationId,
        bank_transaction_ids: &[BankTransactionId],
    ) -> LedgerResult<Reconciliation> {
        let tx = self.db.begin(tenant_id).await?;
        let mut session = queries::reconciliation(tx.connection(), tenant_id, id).await?;
        session.ensure_in_progress()?;

        let mut released = Vec::with_capacity(bank_transaction_ids.len());
        for bank_transaction_id in bank_transaction_ids {
            let pair = session
                .matches
                .iter()
                .find(|m| m.bank_transaction_id == *bank_transaction_id)
                .copied()
                .ok_or_else(|| {
                    LedgerError::validation(format!(
                        "bank transaction {bank_transaction_id} is not matched in this reconciliation"
                    ))
                })?;
            released.push(pair);
        }

        release(&tx, id, &released).await?;
        tx.commit().await?;

        session
            .matches
            .retain(|m| !bank_transaction_ids.contains(&m.bank_transaction_id));
        info!(tenant_id = %tenant_id, reconciliation_id = %id, released = released.len(), "Matches released");
        Ok(session)
    }

    /// Completes the session once opening balance plus matched amounts equals
    /// the statement balance. On mismatch the session stays `in_progress`.
    pub async fn complete(
        &self,
        tenant_id: TenantId,
        id: ReconciliationId,
    ) -> LedgerResult<Reconciliation> {
        let mut tx = self.db.begin(tenant_id).await?;
        let mut session = queries::reconciliation(tx.connection(), tenant_id, id).await?;
        session.ensure_in_progress()?;
        let opening_balance =
            queries::bank_account(tx.connection(), tenant_id, session.bank_account_id)
                .await?
                .reconciliation_opening_balance();

        let book_balance = session.check_balance(opening_balance)?;
        session.transition(ReconciliationStatus::Completed)?;
        session.opening_balance = Some(opening_balance);
        session.book_balance = Some(book_balance);
        session.finished_at = Some(tx.now());
        mapping::reconciliation_row(&session)
            .update(tx.connection())
            .await
            .storage()?;

        bank_accounts::ActiveModel {
            id: Set(session.bank_account_id.into_inner()),
            last_reconciled_balance: Set(Some(session.statement_balance)),
            last_reconciled_date: Set(Some(session.statement_date)),
            ..Default::default()
        }
        .update(tx.connection())
        .await
        .storage()?;

        tx.publish(LedgerEvent::ReconciliationCompleted {
            tenant_id,
            reconciliation_id: id,
            bank_account_id: session.bank_account_id,
        });
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            reconciliation_id = %id,
            book_balance = %book_balance,
            matches = session.matches.len(),
            "Reconciliation completed"
        );
        Ok(session)
    }

    /// Cancels the session and releases every match.
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        id: ReconciliationId,
    ) -> LedgerResult<Reconciliation> {
        let mut tx = self.db.begin(tenant_id).await?;
        let mut session = queries::reconciliation(tx.connection(), tenant_id, id).await?;
        session.transition(ReconciliationStatus::Cancelled)?;

        release(&tx, id, &session.matches).await?;
        let released = session.matches.len();
        session.matches.clear();
        session.finished_at = Some(tx.now());
        mapping::reconciliation_row(&session)
            .update(tx.connection())
            .await
            .storage()?;

        tx.publish(LedgerEvent::ReconciliationCancelled {
            tenant_id,
            reconciliation_id: id,
        });
        tx.commit().await?;

        info!(tenant_id = %tenant_id, reconciliation_id = %id, released, "Reconciliation cancelled");
        Ok(session)
    }

    /// Gets a session.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        id: ReconciliationId,
    ) -> LedgerResult<Reconciliation> {
        let snapshot = self.db.snapshot().await?;
        queries::reconciliation(&snapshot, tenant_id, id).await
    }

    /// Lists a bank account's sessions, oldest first.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
    ) -> LedgerResult<Vec<Reconciliation>> {
        let snapshot = self.db.snapshot().await?;
        queries::bank_account(&snapshot, tenant_id, bank_account_id).await?;
        queries::reconciliations_of(&snapshot, bank_account_id).await
    }
}

async fn bank_transactions_by_id(
    tx: &Transaction,
    pairs: &[MatchPair],
) -> LedgerResult<HashMap<BankTransactionId, BankTransaction>> {
    let models = bank_transactions::Entity::find()
        .filter(
            bank_transactions::Column::Id
                .is_in(pairs.iter().map(|p| p.bank_transaction_id.into_inner())),
        )
        .all(tx.connection())
        .await
        .storage()?;
    Ok(models
        .into_iter()
        .map(BankTransaction::from)
        .map(|t| (t.id, t))
        .collect())
}

async fn ledger_lines_by_id(
    tx: &Transaction,
    pairs: &[MatchPair],
) -> LedgerResult<HashMap<LedgerLineId, LedgerLine>> {
    let models = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::Id.is_in(pairs.iter().map(|p| p.ledger_line_id.into_inner())))
        .all(tx.connection())
        .await
        .storage()?;
    Ok(models
        .into_iter()
        .map(LedgerLine::from)
        .map(|l| (l.id, l))
        .collect())
}

/// Sets or clears the reconciliation link on both sides of each pair.
async fn link(
    tx: &Transaction,
    pairs: &[MatchedPair],
    reconciliation_id: Option<ReconciliationId>,
) -> LedgerResult<()> {
    let link = reconciliation_id.map(ReconciliationId::into_inner);
    bank_transactions::Entity::update_many()
        .col_expr(bank_transactions::Column::ReconciliationId, Expr::value(link))
        .filter(
            bank_transactions::Column::Id
                .is_in(pairs.iter().map(|p| p.bank_transaction_id.into_inner())),
        )
        .exec(tx.connection())
        .await
        .storage()?;
    ledger_lines::Entity::update_many()
        .col_expr(ledger_lines::Column::ReconciliationId, Expr::value(link))
        .filter(ledger_lines::Column::Id.is_in(pairs.iter().map(|p| p.ledger_line_id.into_inner())))
        .exec(tx.connection())
        .await
        .storage()?;
    Ok(())
}

/// Unlinks the pairs and deletes their match rows.
async fn release(
    tx: &Transaction,
    reconciliation_id: ReconciliationId,
    pairs: &[MatchedPair],
) -> LedgerResult<()> {
    if pairs.is_empty() {
        return Ok(());
    }
    link(tx, pairs, None).await?;
    reconciliation_matches::Entity::delete_many()
        .filter(reconciliation_matches::Column::ReconciliationId.eq(reconciliation_id.into_inner()))
        .filter(
            reconciliation_matches::Column::BankTransactionId
                .is_in(pairs.iter().map(|p| p.bank_transaction_id.into_inner())),
        )
        .exec(tx.connection())
        .await
        .storage()?;
    Ok(())
}
