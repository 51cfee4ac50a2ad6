//! Conversions between database rows and ledger domain types.

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::DbErr;

use tally_core::account::{Account, AccountType};
use tally_core::bank::{BankAccount, BankTransaction, MatchedPair, Reconciliation};
use tally_core::fiscal::{FiscalPeriod, FiscalYear};
use tally_core::ledger::{EntrySource, JournalEntry, LedgerLine};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{
    AccountId, BankAccountId, BankTransactionId, FiscalPeriodId, FiscalYearId, JournalEntryId,
    LedgerLineId, ReconciliationId, TenantId,
};

use crate::entities::{
    account_types, accounts, bank_accounts, bank_transactions, fiscal_periods, fiscal_years,
    journal_entries, ledger_lines, reconciliation_matches, reconciliations,
    sea_orm_active_enums as db_enums,
};

/// Maps database failures into [`LedgerError::Storage`].
pub(crate) trait StorageResultExt<T> {
    fn storage(self) -> LedgerResult<T>;
}

impl<T> StorageResultExt<T> for Result<T, DbErr> {
    fn storage(self) -> LedgerResult<T> {
        self.map_err(|err| LedgerError::Storage(err.to_string()))
    }
}

// ----------------------------------------------------------------------
// Chart of accounts
// ----------------------------------------------------------------------

impl From<account_types::Model> for AccountType {
    fn from(model: account_types::Model) -> Self {
        Self {
            tenant_id: TenantId::from_uuid(model.tenant_id),
            code: model.code,
            category: model.category.into(),
            normal_balance: model.normal_balance.into(),
        }
    }
}

pub(crate) fn account_type_row(account_type: &AccountType) -> account_types::ActiveModel {
    account_types::ActiveModel {
        tenant_id: Set(account_type.tenant_id.into_inner()),
        code: Set(account_type.code.clone()),
        category: Set(account_type.category.into()),
        normal_balance: Set(account_type.normal_balance.into()),
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            code: model.code,
            name: model.name,
            account_type: model.account_type,
            category: model.category.into(),
            normal_balance: model.normal_balance.into(),
            parent_id: model.parent_id.map(AccountId::from_uuid),
            is_header: model.is_header,
            is_active: model.is_active,
            current_balance: model.current_balance,
            version: model.version,
            created_at: model.created_at,
        }
    }
}

pub(crate) fn account_row(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        tenant_id: Set(account.tenant_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.clone()),
        category: Set(account.category.into()),
        normal_balance: Set(account.normal_balance.into()),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        is_header: Set(account.is_header),
        is_active: Set(account.is_active),
        current_balance: Set(account.current_balance),
        version: Set(account.version),
        created_at: Set(account.created_at),
    }
}

/// Update row carrying an account's running balance.
pub(crate) fn account_balance_row(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        current_balance: Set(account.current_balance),
        version: Set(account.version),
        ..Default::default()
    }
}

// ----------------------------------------------------------------------
// Fiscal calendar
// ----------------------------------------------------------------------

impl From<fiscal_years::Model> for FiscalYear {
    fn from(model: fiscal_years::Model) -> Self {
        Self {
            id: FiscalYearId::from_uuid(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status.into(),
            closed_at: model.closed_at,
        }
    }
}

pub(crate) fn fiscal_year_row(year: &FiscalYear) -> fiscal_years::ActiveModel {
    fiscal_years::ActiveModel {
        id: Set(year.id.into_inner()),
        tenant_id: Set(year.tenant_id.into_inner()),
        name: Set(year.name.clone()),
        start_date: Set(year.start_date),
        end_date: Set(year.end_date),
        status: Set(year.status.into()),
        closed_at: Set(year.closed_at),
    }
}

impl From<fiscal_periods::Model> for FiscalPeriod {
    fn from(model: fiscal_periods::Model) -> Self {
        Self {
            id: FiscalPeriodId::from_uuid(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            fiscal_year_id: FiscalYearId::from_uuid(model.fiscal_year_id),
            period_number: model.period_number,
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status.into(),
            closed_at: model.closed_at,
        }
    }
}

pub(crate) fn fiscal_period_row(period: &FiscalPeriod) -> fiscal_periods::ActiveModel {
    fiscal_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        tenant_id: Set(period.tenant_id.into_inner()),
        fiscal_year_id: Set(period.fiscal_year_id.into_inner()),
        period_number: Set(period.period_number),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        status: Set(period.status.into()),
        closed_at: Set(period.closed_at),
    }
}

// ----------------------------------------------------------------------
// Journal
// ----------------------------------------------------------------------

/// Rebuilds an entry from its row and the ids of its lines.
pub(crate) fn journal_entry(
    model: journal_entries::Model,
    line_ids: Vec<LedgerLineId>,
) -> LedgerResult<JournalEntry> {
    let source = match model.source {
        db_enums::EntrySource::Manual => EntrySource::Manual,
        db_enums::EntrySource::OpeningBalance => EntrySource::OpeningBalance,
        db_enums::EntrySource::Reversal => EntrySource::Reversal {
            of: model
                .reversal_of
                .map(JournalEntryId::from_uuid)
                .ok_or_else(|| missing_column("journal_entries.reversal_of", model.id))?,
        },
        db_enums::EntrySource::YearEndClose => EntrySource::YearEndClose {
            fiscal_year_id: model
                .closes_fiscal_year_id
                .map(FiscalYearId::from_uuid)
                .ok_or_else(|| missing_column("journal_entries.closes_fiscal_year_id", model.id))?,
        },
    };

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        entry_number: model.entry_number,
        date: model.entry_date,
        source,
        reference: model.reference,
        description: model.description,
        line_ids,
        total: model.total,
        reversed_by: model.reversed_by.map(JournalEntryId::from_uuid),
        posted_at: model.posted_at,
    })
}

fn missing_column(column: &str, id: uuid::Uuid) -> LedgerError {
    LedgerError::Storage(format!("{column} is null for row {id}"))
}

pub(crate) fn journal_entry_row(entry: &JournalEntry) -> journal_entries::ActiveModel {
    let (source, reversal_of, closes_fiscal_year_id) = match entry.source {
        EntrySource::Manual => (db_enums::EntrySource::Manual, None, None),
        EntrySource::OpeningBalance => (db_enums::EntrySource::OpeningBalance, None, None),
        EntrySource::Reversal { of } => (db_enums::EntrySource::Reversal, Some(of.into_inner()), None),
        EntrySource::YearEndClose { fiscal_year_id } => (
            db_enums::EntrySource::YearEndClose,
            None,
            Some(fiscal_year_id.into_inner()),
        ),
    };

    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        tenant_id: Set(entry.tenant_id.into_inner()),
        entry_number: Set(entry.entry_number),
        entry_date: Set(entry.date),
        source: Set(source),
        reversal_of: Set(reversal_of),
        closes_fiscal_year_id: Set(closes_fiscal_year_id),
        reference: Set(entry.reference.clone()),
        description: Set(entry.description.clone()),
        total: Set(entry.total),
        reversed_by: Set(entry.reversed_by.map(JournalEntryId::into_inner)),
        posted_at: Set(entry.posted_at),
    }
}

impl From<ledger_lines::Model> for LedgerLine {
    fn from(model: ledger_lines::Model) -> Self {
        Self {
            id: LedgerLineId::from_raw(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            entry_id: JournalEntryId::from_uuid(model.entry_id),
            date: model.entry_date,
            account_id: AccountId::from_uuid(model.account_id),
            debit: model.debit,
            credit: model.credit,
            memo: model.memo,
            cost_center: model.cost_center,
            reference: model.reference,
            account_version: model.account_version,
            running_balance: model.running_balance,
            reconciliation_id: model.reconciliation_id.map(ReconciliationId::from_uuid),
        }
    }
}

// ----------------------------------------------------------------------
// Bank
// ----------------------------------------------------------------------

impl From<bank_accounts::Model> for BankAccount {
    fn from(model: bank_accounts::Model) -> Self {
        Self {
            id: BankAccountId::from_uuid(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            name: model.name,
            ledger_account_id: AccountId::from_uuid(model.ledger_account_id),
            opening_balance: model.opening_balance,
            last_reconciled_balance: model.last_reconciled_balance,
            last_reconciled_date: model.last_reconciled_date,
            created_at: model.created_at,
        }
    }
}

pub(crate) fn bank_account_row(bank_account: &BankAccount) -> bank_accounts::ActiveModel {
    bank_accounts::ActiveModel {
        id: Set(bank_account.id.into_inner()),
        tenant_id: Set(bank_account.tenant_id.into_inner()),
        name: Set(bank_account.name.clone()),
        ledger_account_id: Set(bank_account.ledger_account_id.into_inner()),
        opening_balance: Set(bank_account.opening_balance),
        last_reconciled_balance: Set(bank_account.last_reconciled_balance),
        last_reconciled_date: Set(bank_account.last_reconciled_date),
        created_at: Set(bank_account.created_at),
    }
}

impl From<bank_transactions::Model> for BankTransaction {
    fn from(model: bank_transactions::Model) -> Self {
        Self {
            id: BankTransactionId::from_raw(model.id),
            tenant_id: TenantId::from_uuid(model.tenant_id),
            bank_account_id: BankAccountId::from_uuid(model.bank_account_id),
            date: model.txn_date,
            amount: model.amount,
            reference: model.reference,
            description: model.description,
            reconciliation_id: model.reconciliation_id.map(ReconciliationId::from_uuid),
        }
    }
}

impl From<reconciliation_matches::Model> for MatchedPair {
    fn from(model: reconciliation_matches::Model) -> Self {
        Self {
            bank_transaction_id: BankTransactionId::from_raw(model.bank_transaction_id),
            ledger_line_id: LedgerLineId::from_raw(model.ledger_line_id),
            amount: model.amount,
        }
    }
}

pub(crate) fn match_row(
    reconciliation_id: ReconciliationId,
    pair: &MatchedPair,
) -> reconciliation_matches::ActiveModel {
    reconciliation_matches::ActiveModel {
        id: NotSet,
        reconciliation_id: Set(reconciliation_id.into_inner()),
        bank_transaction_id: Set(pair.bank_transaction_id.into_inner()),
        ledger_line_id: Set(pair.ledger_line_id.into_inner()),
        amount: Set(pair.amount),
    }
}

/// Rebuilds a session from its row and its matches in apply order.
pub(crate) fn reconciliation(
    model: reconciliations::Model,
    matches: Vec<MatchedPair>,
) -> Reconciliation {
    Reconciliation {
        id: ReconciliationId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        bank_account_id: BankAccountId::from_uuid(model.bank_account_id),
        statement_balance: model.statement_balance,
        statement_date: model.statement_date,
        opening_balance: model.opening_balance,
        book_balance: model.book_balance,
        status: model.status.into(),
        matches,
        created_at: model.created_at,
        finished_at: model.finished_at,
    }
}

pub(crate) fn reconciliation_row(session: &Reconciliation) -> reconciliations::ActiveModel {
    reconciliations::ActiveModel {
        id: Set(session.id.into_inner()),
        tenant_id: Set(session.tenant_id.into_inner()),
        bank_account_id: Set(session.bank_account_id.into_inner()),
        statement_balance: Set(session.statement_balance),
        statement_date: Set(session.statement_date),
        opening_balance: Set(session.opening_balance),
        book_balance: Set(session.book_balance),
        status: Set(session.status.into()),
        created_at: Set(session.created_at),
        finished_at: Set(session.finished_at),
    }
}
