//! LedgerPoster: the single writer of journal entries.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use tally_core::account::{Account, RunningBalance};
use tally_core::events::LedgerEvent;
use tally_core::fiscal::{PostingPolicy, check_posting};
use tally_core::ledger::{
    AccountInfo, EntrySource, JournalEntry, JournalEntryInput, LedgerLine, LedgerService,
    PostedEntry, reversal_description, reversing_lines,
};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{AccountId, JournalEntryId, TenantId};

use crate::entities::{journal_entries, ledger_lines};
use crate::mapping::{self, StorageResultExt};
use crate::queries;
use crate::store::{Database, Transaction};

/// Posts balanced journal entries atomically.
#[derive(Debug, Clone)]
pub struct LedgerPoster {
    db: Database,
}

impl LedgerPoster {
    /// Creates a new poster.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validates and posts an entry.
    ///
    /// Either the entry, all its lines and every affected account balance are
    /// committed together, or nothing is.
    pub async fn post(
        &self,
        tenant_id: TenantId,
        input: JournalEntryInput,
    ) -> LedgerResult<PostedEntry> {
        let mut tx = self.db.begin(tenant_id).await?;
        let posted = post_in(
            &mut tx,
            tenant_id,
            input,
            EntrySource::Manual,
            PostingPolicy::Standard,
        )
        .await?;
        tx.commit().await?;
        log_posted(&posted);
        Ok(posted)
    }

    /// Posts an entry that swaps every debit and credit of `entry_id`.
    ///
    /// An entry can be reversed once.
    pub async fn reverse(
        &self,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
        date: NaiveDate,
        reason: &str,
    ) -> LedgerResult<PostedEntry> {
        if reason.trim().is_empty() {
            return Err(LedgerError::validation("reversal reason cannot be empty"));
        }

        let mut tx = self.db.begin(tenant_id).await?;
        let original = queries::entry_with_lines(tx.connection(), tenant_id, entry_id).await?;
        if let Some(reversed_by) = original.entry.reversed_by {
            return Err(LedgerError::validation(format!(
                "entry #{} was already reversed by {reversed_by}",
                original.entry.entry_number
            )));
        }

        let input = JournalEntryInput {
            date,
            reference: original.entry.reference.clone(),
            description: Some(reversal_description(original.entry.entry_number, reason)),
            lines: reversing_lines(&original.lines),
        };
        let reversal = post_in(
            &mut tx,
            tenant_id,
            input,
            EntrySource::Reversal { of: entry_id },
            PostingPolicy::Standard,
        )
        .await?;

        journal_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            reversed_by: Set(Some(reversal.entry.id.into_inner())),
            ..Default::default()
        }
        .update(tx.connection())
        .await
        .storage()?;

        tx.commit().await?;
        log_posted(&reversal);
        Ok(reversal)
    }

    /// Gets an entry with its lines.
    pub async fn get_entry(
        &self,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
    ) -> LedgerResult<PostedEntry> {
        let snapshot = self.db.snapshot().await?;
        queries::entry_with_lines(&snapshot, tenant_id, entry_id).await
    }

    /// Lists entries dated within the optional bounds, by date then number.
    pub async fn list_entries(
        &self,
        tenant_id: TenantId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(from) = from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let snapshot = self.db.snapshot().await?;
        let models = query
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&snapshot)
            .await
            .storage()?;
        queries::entries_from_models(&snapshot, models).await
    }

    /// Lines posted to an account, in posting order.
    pub async fn account_lines(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> LedgerResult<Vec<LedgerLine>> {
        let snapshot = self.db.snapshot().await?;
        queries::account(&snapshot, tenant_id, account_id).await?;
        queries::lines_of(&snapshot, account_id).await
    }
}

/// Logs a committed entry.
pub(crate) fn log_posted(posted: &PostedEntry) {
    info!(
        tenant_id = %posted.entry.tenant_id,
        entry_id = %posted.entry.id,
        entry_number = posted.entry.entry_number,
        source = ?posted.entry.source,
        date = %posted.entry.date,
        amount = %posted.entry.total,
        lines = posted.lines.len(),
        "Journal entry posted"
    );
}

/// Validates and writes an entry inside an open unit of work.
///
/// Every component that needs to post (opening balances, reversals, year-end
/// closing) goes through here.
pub(crate) async fn post_in(
    tx: &mut Transaction,
    tenant_id: TenantId,
    input: JournalEntryInput,
    source: EntrySource,
    policy: PostingPolicy,
) -> LedgerResult<PostedEntry> {
    let mut accounts: HashMap<AccountId, Account> = queries::accounts_by_ids(
        tx.connection(),
        tenant_id,
        input.lines.iter().map(|l| l.account_id),
    )
    .await?;
    let period = queries::period_for_date(tx.connection(), tenant_id, input.date).await?;

    let totals = LedgerService::validate_entry(
        &input,
        |id| {
            accounts.get(&id).map(|a| AccountInfo {
                id,
                is_active: a.is_active,
                is_header: a.is_header,
            })
        },
        |date| check_posting(period.as_ref(), date, policy),
    )?;

    let entry_id = JournalEntryId::new();
    let mut entry = JournalEntry {
        id: entry_id,
        tenant_id,
        entry_number: queries::next_entry_number(tx.connection(), tenant_id).await?,
        date: input.date,
        source,
        reference: input.reference,
        description: input.description,
        line_ids: Vec::with_capacity(input.lines.len()),
        total: totals.debit,
        reversed_by: None,
        posted_at: tx.now(),
    };
    mapping::journal_entry_row(&entry)
        .insert(tx.connection())
        .await
        .storage()?;

    let mut lines = Vec::with_capacity(input.lines.len());
    for line in input.lines {
        let account = accounts
            .get_mut(&line.account_id)
            .ok_or(LedgerError::UnknownAccount(line.account_id))?;
        let running = RunningBalance::resume(account.version, account.current_balance)
            .next(account.normal_balance.signed(line.debit, line.credit));
        account.version = running.account_version;
        account.current_balance = running.current_balance;

        let row = ledger_lines::ActiveModel {
            id: NotSet,
            tenant_id: Set(tenant_id.into_inner()),
            entry_id: Set(entry_id.into_inner()),
            entry_date: Set(entry.date),
            account_id: Set(line.account_id.into_inner()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            memo: Set(line.memo),
            cost_center: Set(line.cost_center),
            reference: Set(entry.reference.clone()),
            account_version: Set(running.account_version),
            running_balance: Set(running.current_balance),
            reconciliation_id: Set(None),
        }
        .insert(tx.connection())
        .await
        .storage()?;
        lines.push(LedgerLine::from(row));
    }

    for account in accounts.values() {
        mapping::account_balance_row(account)
            .update(tx.connection())
            .await
            .storage()?;
    }

    entry.line_ids = lines.iter().map(|l| l.id).collect();
    tx.publish(LedgerEvent::EntryPosted {
        tenant_id,
        entry_id,
        date: entry.date,
        amount: totals.debit,
    });

    Ok(PostedEntry { entry, lines })
}
