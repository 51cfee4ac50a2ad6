//! AccountRegistry: chart of accounts and account type taxonomy.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::sea_query::OnConflict;
use tracing::info;

use tally_core::account::{
    Account, AccountCategory, AccountFilter, AccountType, AccountTypeInput, CreateAccountInput,
    NormalBalance, OpeningBalance, UpdateAccountInput, merge_update, validate_parent,
};
use tally_core::fiscal::PostingPolicy;
use tally_core::ledger::{EntrySource, JournalEntryInput, LedgerLineInput, PostedEntry};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{AccountId, TenantId};

use super::ledger::{log_posted, post_in};
use crate::entities::{account_types, accounts, tenant_settings};
use crate::mapping::{self, StorageResultExt};
use crate::queries;
use crate::store::{Database, Transaction};

/// Account with its created opening-balance entry, if any.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    /// The new account (balance includes the opening balance).
    pub account: Account,
    /// Opening balance entry.
    pub opening_entry: Option<PostedEntry>,
}

/// Chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    db: Database,
}

impl AccountRegistry {
    /// Creates a new registry.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Account types
    // ------------------------------------------------------------------

    /// Defines an account type, unique by code per tenant.
    pub async fn define_account_type(
        &self,
        tenant_id: TenantId,
        input: AccountTypeInput,
    ) -> LedgerResult<AccountType> {
        let account_type = input.into_account_type(tenant_id)?;
        let tx = self.db.begin(tenant_id).await?;
        if queries::account_type(tx.connection(), tenant_id, &account_type.code)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateCode(account_type.code));
        }
        mapping::account_type_row(&account_type)
            .insert(tx.connection())
            .await
            .storage()?;
        tx.commit().await?;
        info!(tenant_id = %tenant_id, code = %account_type.code, "Account type defined");
        Ok(account_type)
    }

    /// Defines the five standard types (coded by category name) that are missing.
    pub async fn install_standard_account_types(
        &self,
        tenant_id: TenantId,
    ) -> LedgerResult<Vec<AccountType>> {
        let tx = self.db.begin(tenant_id).await?;
        let mut installed = Vec::new();
        for category in AccountCategory::ALL {
            let account_type = AccountTypeInput::standard(category).into_account_type(tenant_id)?;
            if queries::account_type(tx.connection(), tenant_id, &account_type.code)
                .await?
                .is_none()
            {
                mapping::account_type_row(&account_type)
                    .insert(tx.connection())
                    .await
                    .storage()?;
                installed.push(account_type);
            }
        }
        tx.commit().await?;
        Ok(installed)
    }

    /// Changes an account type's category or normal balance.
    ///
    /// Fails with `AccountTypeInUse` once any account references the type.
    pub async fn update_account_type(
        &self,
        tenant_id: TenantId,
        code: &str,
        category: AccountCategory,
        normal_balance: Option<NormalBalance>,
    ) -> LedgerResult<AccountType> {
        let tx = self.db.begin(tenant_id).await?;
        let mut account_type = queries::account_type(tx.connection(), tenant_id, code)
            .await?
            .ok_or_else(|| LedgerError::not_found("account type", code))?;

        let references = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(accounts::Column::AccountType.eq(code))
            .count(tx.connection())
            .await
            .storage()?;
        if references > 0 {
            return Err(LedgerError::AccountTypeInUse(code.to_string()));
        }

        account_type.category = category;
        account_type.normal_balance =
            normal_balance.unwrap_or_else(|| category.default_normal_balance());
        mapping::account_type_row(&account_type)
            .update(tx.connection())
            .await
            .storage()?;
        tx.commit().await?;
        Ok(account_type)
    }

    /// Lists a tenant's account types ordered by code.
    pub async fn list_account_types(&self, tenant_id: TenantId) -> LedgerResult<Vec<AccountType>> {
        let models = account_types::Entity::find()
            .filter(account_types::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(account_types::Column::Code)
            .all(self.db.connection())
            .await
            .storage()?;
        Ok(models.into_iter().map(AccountType::from).collect())
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Creates an account, posting its opening balance in the same unit of work.
    pub async fn create_account(
        &self,
        tenant_id: TenantId,
        input: CreateAccountInput,
    ) -> LedgerResult<CreatedAccount> {
        input.validate()?;
        let mut tx = self.db.begin(tenant_id).await?;

        let account_type = queries::account_type(tx.connection(), tenant_id, &input.account_type)
            .await?
            .ok_or_else(|| LedgerError::not_found("account type", &input.account_type))?;

        if queries::account_by_code(tx.connection(), tenant_id, &input.code)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateCode(input.code));
        }

        let id = AccountId::new();
        if let Some(parent_id) = input.parent_id {
            let nodes = queries::hierarchy_nodes(tx.connection(), tenant_id, Some(parent_id)).await?;
            validate_parent(tenant_id, id, parent_id, |a| nodes.get(&a).copied())?;
        }

        let account = Account {
            id,
            tenant_id,
            code: input.code,
            name: input.name,
            account_type: account_type.code,
            category: account_type.category,
            normal_balance: account_type.normal_balance,
            parent_id: input.parent_id,
            is_header: input.is_header,
            is_active: true,
            current_balance: Decimal::ZERO,
            version: 0,
            created_at: tx.now(),
        };
        mapping::account_row(&account)
            .insert(tx.connection())
            .await
            .storage()?;

        let opening_entry = match input.opening_balance {
            Some(opening) => Some(post_opening_balance(&mut tx, &account, &opening).await?),
            None => None,
        };

        let account = queries::account(tx.connection(), tenant_id, id).await?;
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            account_id = %account.id,
            code = %account.code,
            "Account created"
        );
        if let Some(entry) = &opening_entry {
            log_posted(entry);
        }
        Ok(CreatedAccount {
            account,
            opening_entry,
        })
    }

    /// Applies an explicit update descriptor.
    pub async fn update_account(
        &self,
        tenant_id: TenantId,
        id: AccountId,
        update: UpdateAccountInput,
    ) -> LedgerResult<Account> {
        let tx = self.db.begin(tenant_id).await?;
        let current = queries::account(tx.connection(), tenant_id, id).await?;
        let tenant_accounts = queries::tenant_accounts(tx.connection(), tenant_id).await?;
        let codes: HashSet<&str> = tenant_accounts.iter().map(|a| a.code.as_str()).collect();
        let parent = update.parent_id.flatten();
        let nodes = queries::hierarchy_nodes(tx.connection(), tenant_id, parent).await?;

        let merged = merge_update(
            &current,
            &update,
            |code| codes.contains(code),
            |a| nodes.get(&a).copied(),
        )?;

        accounts::ActiveModel {
            id: Set(id.into_inner()),
            code: Set(merged.code.clone()),
            name: Set(merged.name.clone()),
            parent_id: Set(merged.parent_id.map(AccountId::into_inner)),
            is_header: Set(merged.is_header),
            ..Default::default()
        }
        .update(tx.connection())
        .await
        .storage()?;
        tx.commit().await?;
        info!(tenant_id = %tenant_id, account_id = %id, "Account updated");
        Ok(merged)
    }

    /// Gets an account.
    pub async fn get_account(&self, tenant_id: TenantId, id: AccountId) -> LedgerResult<Account> {
        queries::account(self.db.connection(), tenant_id, id).await
    }

    /// Gets an account by code.
    pub async fn get_account_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> LedgerResult<Account> {
        queries::account_by_code(self.db.connection(), tenant_id, code)
            .await?
            .ok_or_else(|| LedgerError::not_found("account", code))
    }

    /// Lists accounts matching the filter, ordered by code.
    pub async fn list_accounts(
        &self,
        tenant_id: TenantId,
        filter: &AccountFilter,
    ) -> LedgerResult<Vec<Account>> {
        let accounts = queries::tenant_accounts(self.db.connection(), tenant_id).await?;
        Ok(accounts.into_iter().filter(|a| filter.matches(a)).collect())
    }

    /// Balance of postings dated on or before `as_of`, signed per the account's
    /// normal balance. Header accounts aggregate their whole subtree.
    pub async fn compute_balance(
        &self,
        tenant_id: TenantId,
        id: AccountId,
        as_of: NaiveDate,
    ) -> LedgerResult<Decimal> {
        let snapshot = self.db.snapshot().await?;
        let account = queries::account(&snapshot, tenant_id, id).await?;
        let activity = queries::account_activity(&snapshot, tenant_id, None, as_of).await?;

        let mut total = activity.get(&id).copied().unwrap_or_default();
        if account.is_header {
            let accounts = queries::tenant_accounts(&snapshot, tenant_id).await?;
            for descendant in queries::child_index(&accounts).descendants(id) {
                if let Some(own) = activity.get(&descendant) {
                    total.merge(own);
                }
            }
        }
        Ok(total.balance(account.normal_balance))
    }

    /// Marks the tenant's retained-earnings account used by year-end closing.
    pub async fn designate_retained_earnings(
        &self,
        tenant_id: TenantId,
        id: AccountId,
    ) -> LedgerResult<()> {
        let tx = self.db.begin(tenant_id).await?;
        let account = queries::account(tx.connection(), tenant_id, id).await?;
        account.ensure_postable()?;
        if account.category != AccountCategory::Equity {
            return Err(LedgerError::validation(format!(
                "retained earnings account {} must be an equity account",
                account.code
            )));
        }

        tenant_settings::Entity::insert(tenant_settings::ActiveModel {
            tenant_id: Set(tenant_id.into_inner()),
            retained_earnings_account_id: Set(id.into_inner()),
            updated_at: Set(tx.now()),
        })
        .on_conflict(
            OnConflict::column(tenant_settings::Column::TenantId)
                .update_columns([
                    tenant_settings::Column::RetainedEarningsAccountId,
                    tenant_settings::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(tx.connection())
        .await
        .storage()?;
        tx.commit().await?;
        info!(tenant_id = %tenant_id, account_id = %id, "Retained earnings designated");
        Ok(())
    }

    /// The tenant's designated retained-earnings account.
    pub async fn retained_earnings(&self, tenant_id: TenantId) -> LedgerResult<Option<AccountId>> {
        queries::retained_earnings(self.db.connection(), tenant_id).await
    }

    /// Soft-deletes an account.
    ///
    /// Refuses with `AccountInUse` while the balance is non-zero or any
    /// descendant is still active.
    pub async fn deactivate(&self, tenant_id: TenantId, id: AccountId) -> LedgerResult<Account> {
        let tx = self.db.begin(tenant_id).await?;
        let mut account = queries::account(tx.connection(), tenant_id, id).await?;
        if !account.current_balance.is_zero() {
            return Err(LedgerError::AccountInUse {
                account_id: id,
                reason: format!("balance is {}", account.current_balance.normalize()),
            });
        }

        let accounts = queries::tenant_accounts(tx.connection(), tenant_id).await?;
        let descendants: HashSet<AccountId> =
            queries::child_index(&accounts).descendants(id).into_iter().collect();
        let active_descendant = accounts
            .iter()
            .filter(|a| descendants.contains(&a.id) && a.is_active)
            .map(|a| a.code.clone())
            .min();
        if let Some(code) = active_descendant {
            return Err(LedgerError::AccountInUse {
                account_id: id,
                reason: format!("descendant {code} is still active"),
            });
        }

        accounts::ActiveModel {
            id: Set(id.into_inner()),
            is_active: Set(false),
            ..Default::default()
        }
        .update(tx.connection())
        .await
        .storage()?;
        tx.commit().await?;

        account.is_active = false;
        info!(tenant_id = %tenant_id, account_id = %id, "Account deactivated");
        Ok(account)
    }
}

async fn post_opening_balance(
    tx: &mut Transaction,
    account: &Account,
    opening: &OpeningBalance,
) -> LedgerResult<PostedEntry> {
    let (debit, credit) = account.normal_balance.to_sides(opening.amount);
    let lines = if debit.is_zero() {
        vec![
            LedgerLineInput::credit(account.id, credit),
            LedgerLineInput::debit(opening.offset_account_id, credit),
        ]
    } else {
        vec![
            LedgerLineInput::debit(account.id, debit),
            LedgerLineInput::credit(opening.offset_account_id, debit),
        ]
    };
    let input = JournalEntryInput::new(opening.date, lines).with_description("Opening balance");
    post_in(
        tx,
        account.tenant_id,
        input,
        EntrySource::OpeningBalance,
        PostingPolicy::Standard,
    )
    .await
}
