//! Tenant-scoped lookups shared by the repositories.
//!
//! Every function runs on any connection, so the same lookup serves a unit of
//! work, a read snapshot or the pool.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use tally_core::account::{Account, AccountActivity, AccountType, ChildIndex, HierarchyNode};
use tally_core::bank::{BankAccount, BankTransaction, LedgerActivity, MatchedPair, Reconciliation};
use tally_core::fiscal::{FiscalPeriod, FiscalYear};
use tally_core::ledger::{JournalEntry, LedgerLine, PostedEntry};
use tally_core::reports::{TrialBalanceRow, TrialBalanceTotals};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{
    AccountId, BankAccountId, FiscalPeriodId, FiscalYearId, JournalEntryId, LedgerLineId,
    ReconciliationId, TenantId,
};

use crate::entities::{
    account_types, accounts, bank_accounts, bank_transactions, fiscal_periods, fiscal_years,
    journal_entries, ledger_lines, reconciliation_matches, reconciliations, tenant_settings,
};
use crate::mapping::{self, StorageResultExt};

// ----------------------------------------------------------------------
// Accounts
// ----------------------------------------------------------------------

pub(crate) async fn account_type<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    code: &str,
) -> LedgerResult<Option<AccountType>> {
    let model = account_types::Entity::find_by_id((tenant_id.into_inner(), code.to_string()))
        .one(conn)
        .await
        .storage()?;
    Ok(model.map(AccountType::from))
}

pub(crate) async fn account<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: AccountId,
) -> LedgerResult<Account> {
    accounts::Entity::find_by_id(id.into_inner())
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .map(Account::from)
        .ok_or(LedgerError::UnknownAccount(id))
}

pub(crate) async fn account_by_code<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    code: &str,
) -> LedgerResult<Option<Account>> {
    let model = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(accounts::Column::Code.eq(code))
        .one(conn)
        .await
        .storage()?;
    Ok(model.map(Account::from))
}

/// The tenant's accounts among `ids`, keyed by id.
pub(crate) async fn accounts_by_ids<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    ids: impl IntoIterator<Item = AccountId>,
) -> LedgerResult<HashMap<AccountId, Account>> {
    let models = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(accounts::Column::Id.is_in(ids.into_iter().map(AccountId::into_inner)))
        .all(conn)
        .await
        .storage()?;
    Ok(models
        .into_iter()
        .map(|m| (AccountId::from_uuid(m.id), Account::from(m)))
        .collect())
}

/// Every account of the tenant, ordered by code.
pub(crate) async fn tenant_accounts<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> LedgerResult<Vec<Account>> {
    let models = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .order_by_asc(accounts::Column::Code)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(Account::from).collect())
}

/// Hierarchy nodes of the tenant's accounts, plus `extra` whatever its tenant.
///
/// `extra` lets the parent check see a parent that belongs to another tenant.
pub(crate) async fn hierarchy_nodes<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    extra: Option<AccountId>,
) -> LedgerResult<HashMap<AccountId, HierarchyNode>> {
    let mut nodes: HashMap<AccountId, HierarchyNode> = tenant_accounts(conn, tenant_id)
        .await?
        .into_iter()
        .map(|a| (a.id, node(&a)))
        .collect();
    if let Some(id) = extra.filter(|id| !nodes.contains_key(id)) {
        if let Some(model) = accounts::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await
            .storage()?
        {
            nodes.insert(id, node(&Account::from(model)));
        }
    }
    Ok(nodes)
}

fn node(account: &Account) -> HierarchyNode {
    HierarchyNode {
        tenant_id: account.tenant_id,
        parent_id: account.parent_id,
    }
}

pub(crate) fn child_index(accounts: &[Account]) -> ChildIndex {
    ChildIndex::build(accounts.iter().map(|a| (a.id, a.parent_id)))
}

pub(crate) async fn retained_earnings<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> LedgerResult<Option<AccountId>> {
    let settings = tenant_settings::Entity::find_by_id(tenant_id.into_inner())
        .one(conn)
        .await
        .storage()?;
    Ok(settings.map(|s| AccountId::from_uuid(s.retained_earnings_account_id)))
}

// ----------------------------------------------------------------------
// Activity
// ----------------------------------------------------------------------

/// Debit/credit totals per account over lines dated within `[from, to]`.
///
/// Accounts without lines in range are absent from the map.
pub(crate) async fn account_activity<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    from: Option<NaiveDate>,
    to: NaiveDate,
) -> LedgerResult<HashMap<AccountId, AccountActivity>> {
    let mut query = ledger_lines::Entity::find()
        .select_only()
        .column(ledger_lines::Column::AccountId)
        .column_as(ledger_lines::Column::Debit.sum(), "debit_total")
        .column_as(ledger_lines::Column::Credit.sum(), "credit_total")
        .filter(ledger_lines::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(ledger_lines::Column::EntryDate.lte(to));
    if let Some(from) = from {
        query = query.filter(ledger_lines::Column::EntryDate.gte(from));
    }

    let totals: Vec<(Uuid, Decimal, Decimal)> = query
        .group_by(ledger_lines::Column::AccountId)
        .into_tuple()
        .all(conn)
        .await
        .storage()?;

    Ok(totals
        .into_iter()
        .map(|(account_id, debit_total, credit_total)| {
            (
                AccountId::from_uuid(account_id),
                AccountActivity {
                    debit_total,
                    credit_total,
                },
            )
        })
        .collect())
}

/// One row per postable account of the tenant, including zero rows, over
/// lines dated within `[from, to]`.
pub(crate) async fn trial_balance_rows<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    from: Option<NaiveDate>,
    to: NaiveDate,
) -> LedgerResult<Vec<TrialBalanceRow>> {
    let activity = account_activity(conn, tenant_id, from, to).await?;
    let rows = tenant_accounts(conn, tenant_id)
        .await?
        .into_iter()
        .filter(|a| !a.is_header)
        .map(|a| {
            let totals = activity.get(&a.id).copied().unwrap_or_default();
            TrialBalanceRow {
                account_id: a.id,
                balance: totals.balance(a.normal_balance),
                code: a.code,
                name: a.name,
                category: a.category,
                normal_balance: a.normal_balance,
                debit_total: totals.debit_total,
                credit_total: totals.credit_total,
            }
        })
        .collect();
    Ok(rows)
}

/// Debit and credit totals over every line of every tenant.
pub(crate) async fn ledger_totals<C: ConnectionTrait>(conn: &C) -> LedgerResult<TrialBalanceTotals> {
    let totals: Option<(Option<Decimal>, Option<Decimal>)> = ledger_lines::Entity::find()
        .select_only()
        .column_as(ledger_lines::Column::Debit.sum(), "debit_total")
        .column_as(ledger_lines::Column::Credit.sum(), "credit_total")
        .into_tuple()
        .one(conn)
        .await
        .storage()?;
    let (debit, credit) = totals.unwrap_or_default();
    Ok(TrialBalanceTotals::new(
        debit.unwrap_or_default(),
        credit.unwrap_or_default(),
    ))
}

// ----------------------------------------------------------------------
// Journal
// ----------------------------------------------------------------------

pub(crate) async fn next_entry_number<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> LedgerResult<i64> {
    let last = journal_entries::Entity::find()
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .order_by_desc(journal_entries::Column::EntryNumber)
        .limit(1)
        .one(conn)
        .await
        .storage()?;
    Ok(last.map_or(1, |e| e.entry_number + 1))
}

pub(crate) async fn entry_with_lines<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    entry_id: JournalEntryId,
) -> LedgerResult<PostedEntry> {
    let model = journal_entries::Entity::find_by_id(entry_id.into_inner())
        .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .ok_or_else(|| LedgerError::not_found("journal entry", entry_id))?;

    let lines: Vec<LedgerLine> = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::EntryId.eq(entry_id.into_inner()))
        .order_by_asc(ledger_lines::Column::Id)
        .all(conn)
        .await
        .storage()?
        .into_iter()
        .map(LedgerLine::from)
        .collect();

    let entry = mapping::journal_entry(model, lines.iter().map(|l| l.id).collect())?;
    Ok(PostedEntry { entry, lines })
}

/// Rebuilds entries from their rows, attaching line ids in posting order.
pub(crate) async fn entries_from_models<C: ConnectionTrait>(
    conn: &C,
    models: Vec<journal_entries::Model>,
) -> LedgerResult<Vec<JournalEntry>> {
    let line_ids: Vec<(i64, Uuid)> = ledger_lines::Entity::find()
        .select_only()
        .column(ledger_lines::Column::Id)
        .column(ledger_lines::Column::EntryId)
        .filter(ledger_lines::Column::EntryId.is_in(models.iter().map(|m| m.id)))
        .order_by_asc(ledger_lines::Column::Id)
        .into_tuple()
        .all(conn)
        .await
        .storage()?;

    let mut by_entry: HashMap<Uuid, Vec<LedgerLineId>> = HashMap::new();
    for (line_id, entry_id) in line_ids {
        by_entry
            .entry(entry_id)
            .or_default()
            .push(LedgerLineId::from_raw(line_id));
    }

    models
        .into_iter()
        .map(|m| {
            let ids = by_entry.remove(&m.id).unwrap_or_default();
            mapping::journal_entry(m, ids)
        })
        .collect()
}

/// Lines of one account in posting order.
pub(crate) async fn lines_of<C: ConnectionTrait>(
    conn: &C,
    account_id: AccountId,
) -> LedgerResult<Vec<LedgerLine>> {
    let models = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::AccountId.eq(account_id.into_inner()))
        .order_by_asc(ledger_lines::Column::AccountVersion)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(LedgerLine::from).collect())
}

// ----------------------------------------------------------------------
// Fiscal calendar
// ----------------------------------------------------------------------

pub(crate) async fn fiscal_year<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: FiscalYearId,
) -> LedgerResult<FiscalYear> {
    fiscal_years::Entity::find_by_id(id.into_inner())
        .filter(fiscal_years::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .map(FiscalYear::from)
        .ok_or_else(|| LedgerError::not_found("fiscal year", id))
}

pub(crate) async fn tenant_fiscal_years<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> LedgerResult<Vec<FiscalYear>> {
    let models = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::TenantId.eq(tenant_id.into_inner()))
        .order_by_desc(fiscal_years::Column::StartDate)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(FiscalYear::from).collect())
}

pub(crate) async fn period<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: FiscalPeriodId,
) -> LedgerResult<FiscalPeriod> {
    fiscal_periods::Entity::find_by_id(id.into_inner())
        .filter(fiscal_periods::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .map(FiscalPeriod::from)
        .ok_or_else(|| LedgerError::not_found("fiscal period", id))
}

/// Periods of a year in chronological order.
pub(crate) async fn periods_of_year<C: ConnectionTrait>(
    conn: &C,
    year_id: FiscalYearId,
) -> LedgerResult<Vec<FiscalPeriod>> {
    let models = fiscal_periods::Entity::find()
        .filter(fiscal_periods::Column::FiscalYearId.eq(year_id.into_inner()))
        .order_by_asc(fiscal_periods::Column::StartDate)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(FiscalPeriod::from).collect())
}

pub(crate) async fn period_for_date<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    date: NaiveDate,
) -> LedgerResult<Option<FiscalPeriod>> {
    let model = fiscal_periods::Entity::find()
        .filter(fiscal_periods::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(fiscal_periods::Column::StartDate.lte(date))
        .filter(fiscal_periods::Column::EndDate.gte(date))
        .one(conn)
        .await
        .storage()?;
    Ok(model.map(FiscalPeriod::from))
}

// ----------------------------------------------------------------------
// Bank
// ----------------------------------------------------------------------

pub(crate) async fn bank_account<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: BankAccountId,
) -> LedgerResult<BankAccount> {
    bank_accounts::Entity::find_by_id(id.into_inner())
        .filter(bank_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .map(BankAccount::from)
        .ok_or_else(|| LedgerError::not_found("bank account", id))
}

/// Unreconciled statement lines of a bank account in import order.
pub(crate) async fn unreconciled_transactions<C: ConnectionTrait>(
    conn: &C,
    bank_account_id: BankAccountId,
) -> LedgerResult<Vec<BankTransaction>> {
    let models = bank_transactions::Entity::find()
        .filter(bank_transactions::Column::BankAccountId.eq(bank_account_id.into_inner()))
        .filter(bank_transactions::Column::ReconciliationId.is_null())
        .order_by_asc(bank_transactions::Column::Id)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(BankTransaction::from).collect())
}

/// Unreconciled lines of a ledger account, in posting order.
pub(crate) async fn unreconciled_activity<C: ConnectionTrait>(
    conn: &C,
    ledger_account_id: AccountId,
) -> LedgerResult<Vec<LedgerActivity>> {
    let models = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::AccountId.eq(ledger_account_id.into_inner()))
        .filter(ledger_lines::Column::ReconciliationId.is_null())
        .order_by_asc(ledger_lines::Column::Id)
        .all(conn)
        .await
        .storage()?;
    Ok(models
        .into_iter()
        .map(LedgerLine::from)
        .map(|line| LedgerActivity::from(&line))
        .collect())
}

async fn matches_of<C: ConnectionTrait>(
    conn: &C,
    reconciliation_id: Uuid,
) -> LedgerResult<Vec<MatchedPair>> {
    let models = reconciliation_matches::Entity::find()
        .filter(reconciliation_matches::Column::ReconciliationId.eq(reconciliation_id))
        .order_by_asc(reconciliation_matches::Column::Id)
        .all(conn)
        .await
        .storage()?;
    Ok(models.into_iter().map(MatchedPair::from).collect())
}

pub(crate) async fn reconciliation<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: ReconciliationId,
) -> LedgerResult<Reconciliation> {
    let model = reconciliations::Entity::find_by_id(id.into_inner())
        .filter(reconciliations::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .storage()?
        .ok_or_else(|| LedgerError::not_found("reconciliation", id))?;
    let matches = matches_of(conn, model.id).await?;
    Ok(mapping::reconciliation(model, matches))
}

/// Sessions of a bank account, oldest first.
pub(crate) async fn reconciliations_of<C: ConnectionTrait>(
    conn: &C,
    bank_account_id: BankAccountId,
) -> LedgerResult<Vec<Reconciliation>> {
    let models = reconciliations::Entity::find()
        .filter(reconciliations::Column::BankAccountId.eq(bank_account_id.into_inner()))
        .order_by_asc(reconciliations::Column::CreatedAt)
        .order_by_asc(reconciliations::Column::Id)
        .all(conn)
        .await
        .storage()?;

    let mut sessions = Vec::with_capacity(models.len());
    for model in models {
        let matches = matches_of(conn, model.id).await?;
        sessions.push(mapping::reconciliation(model, matches));
    }
    Ok(sessions)
}
