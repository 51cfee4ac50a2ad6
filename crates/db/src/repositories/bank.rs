//! BankStatementMatcher: bank accounts, statement import and match proposals.

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use tally_core::bank::{
    BankAccount, BankTransaction, MatchSuggestions, MatchingEngine, RegisterBankAccountInput,
    StatementLineInput,
};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{BankAccountId, TenantId};

use crate::entities::{bank_accounts, bank_transactions};
use crate::mapping::{self, StorageResultExt};
use crate::queries;
use crate::store::Database;

/// Bank account and statement operations.
#[derive(Debug, Clone)]
pub struct BankStatementMatcher {
    db: Database,
}

impl BankStatementMatcher {
    /// Creates a new matcher.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Registers a bank account linked to a postable ledger account.
    pub async fn register_bank_account(
        &self,
        tenant_id: TenantId,
        input: RegisterBankAccountInput,
    ) -> LedgerResult<BankAccount> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::validation("bank account name cannot be empty"));
        }
        let tx = self.db.begin(tenant_id).await?;
        queries::account(tx.connection(), tenant_id, input.ledger_account_id)
            .await?
            .ensure_postable()?;

        let bank_account = BankAccount {
            id: BankAccountId::new(),
            tenant_id,
            name: input.name,
            ledger_account_id: input.ledger_account_id,
            opening_balance: input.opening_balance,
            last_reconciled_balance: None,
            last_reconciled_date: None,
            created_at: tx.now(),
        };
        mapping::bank_account_row(&bank_account)
            .insert(tx.connection())
            .await
            .storage()?;
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            bank_account_id = %bank_account.id,
            ledger_account_id = %bank_account.ledger_account_id,
            "Bank account registered"
        );
        Ok(bank_account)
    }

    /// Gets a bank account.
    pub async fn get_bank_account(
        &self,
        tenant_id: TenantId,
        id: BankAccountId,
    ) -> LedgerResult<BankAccount> {
        queries::bank_account(self.db.connection(), tenant_id, id).await
    }

    /// Lists a tenant's bank accounts by name.
    pub async fn list_bank_accounts(&self, tenant_id: TenantId) -> LedgerResult<Vec<BankAccount>> {
        let models = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(bank_accounts::Column::Name)
            .all(self.db.connection())
            .await
            .storage()?;
        Ok(models.into_iter().map(BankAccount::from).collect())
    }

    /// Imports statement lines. All lines are stored or none are.
    pub async fn import_statement_lines(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        lines: Vec<StatementLineInput>,
    ) -> LedgerResult<Vec<BankTransaction>> {
        for line in &lines {
            line.validate()?;
        }

        let tx = self.db.begin(tenant_id).await?;
        queries::bank_account(tx.connection(), tenant_id, bank_account_id).await?;

        let mut imported = Vec::with_capacity(lines.len());
        for line in lines {
            let row = bank_transactions::ActiveModel {
                id: NotSet,
                tenant_id: Set(tenant_id.into_inner()),
                bank_account_id: Set(bank_account_id.into_inner()),
                txn_date: Set(line.date),
                amount: Set(line.amount),
                reference: Set(line.reference),
                description: Set(line.description),
                reconciliation_id: Set(None),
            }
            .insert(tx.connection())
            .await
            .storage()?;
            imported.push(BankTransaction::from(row));
        }
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            bank_account_id = %bank_account_id,
            lines = imported.len(),
            "Statement lines imported"
        );
        Ok(imported)
    }

    /// Unreconciled statement lines of a bank account in import order.
    pub async fn list_unreconciled(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
    ) -> LedgerResult<Vec<BankTransaction>> {
        let snapshot = self.db.snapshot().await?;
        queries::bank_account(&snapshot, tenant_id, bank_account_id).await?;
        queries::unreconciled_transactions(&snapshot, bank_account_id).await
    }

    /// Proposes pairings between unreconciled statement lines and unreconciled
    /// activity on the linked ledger account. Changes nothing.
    ///
    /// `window_days` defaults to the configured match window.
    pub async fn suggest_matches(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        window_days: Option<u32>,
    ) -> LedgerResult<MatchSuggestions> {
        let window_days = window_days.unwrap_or(self.db.config().match_window_days);
        let snapshot = self.db.snapshot().await?;
        let bank_account = queries::bank_account(&snapshot, tenant_id, bank_account_id).await?;
        let transactions = queries::unreconciled_transactions(&snapshot, bank_account_id).await?;
        let activity = queries::unreconciled_activity(&snapshot, bank_account.ledger_account_id).await?;
        Ok(MatchingEngine::suggest(&transactions, &activity, window_days))
    }
}
