//! Chart of accounts domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{AccountId, TenantId};

use super::balance::NormalBalance;
use crate::error::{LedgerError, LedgerResult};

/// Maximum length of an account or account type code.
pub const MAX_CODE_LEN: usize = 32;

/// Account category in the accounting equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owners' residual interest.
    Equity,
    /// Income earned (temporary).
    Revenue,
    /// Costs incurred (temporary).
    Expense,
}

impl AccountCategory {
    /// All categories in statement order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// The side on which accounts of this category naturally increase.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Revenue and expense accounts are zeroed at year end.
    #[must_use]
    pub const fn is_temporary(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }

    /// Lowercase name, also the code of the standard account type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountCategory {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(LedgerError::validation(format!("unknown account category: {s}"))),
        }
    }
}

/// Account type in a tenant's taxonomy.
///
/// Immutable once an account references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountType {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Code, unique per tenant (e.g. "asset", "contra_asset").
    pub code: String,
    /// Category.
    pub category: AccountCategory,
    /// Side on which balances increase.
    pub normal_balance: NormalBalance,
}

/// Input for defining or redefining an account type.
#[derive(Debug, Clone)]
pub struct AccountTypeInput {
    /// Code, unique per tenant.
    pub code: String,
    /// Category.
    pub category: AccountCategory,
    /// Overrides the category's default normal balance (contra accounts).
    pub normal_balance: Option<NormalBalance>,
}

impl AccountTypeInput {
    /// Standard type for a category, coded by the category name.
    #[must_use]
    pub fn standard(category: AccountCategory) -> Self {
        Self {
            code: category.as_str().to_string(),
            category,
            normal_balance: None,
        }
    }

    /// Validates shape and resolves the normal balance.
    pub fn into_account_type(self, tenant_id: TenantId) -> LedgerResult<AccountType> {
        validate_code(&self.code)?;
        Ok(AccountType {
            tenant_id,
            normal_balance: self
                .normal_balance
                .unwrap_or_else(|| self.category.default_normal_balance()),
            code: self.code,
            category: self.category,
        })
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Code, unique per tenant.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type code.
    pub account_type: String,
    /// Category copied from the account type.
    pub category: AccountCategory,
    /// Normal balance copied from the account type.
    pub normal_balance: NormalBalance,
    /// Parent in the hierarchy.
    pub parent_id: Option<AccountId>,
    /// Header accounts aggregate children and take no postings.
    pub is_header: bool,
    /// Inactive accounts take no postings.
    pub is_active: bool,
    /// Running balance, signed per the normal balance.
    pub current_balance: Decimal,
    /// Number of ledger lines posted to this account.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns an error unless the account can take postings.
    pub fn ensure_postable(&self) -> LedgerResult<()> {
        if !self.is_active {
            return Err(LedgerError::AccountInactive(self.id));
        }
        if self.is_header {
            return Err(LedgerError::HeaderAccountNotPostable(self.id));
        }
        Ok(())
    }

    /// Returns true if ledger lines have been posted to the account.
    #[must_use]
    pub fn has_postings(&self) -> bool {
        self.version > 0
    }
}

/// Balance established when an account is created.
///
/// Posted as a balanced opening-balance entry against `offset_account_id`.
#[derive(Debug, Clone)]
pub struct OpeningBalance {
    /// Amount, signed per the new account's normal balance.
    pub amount: Decimal,
    /// Account taking the other side (usually opening balance equity).
    pub offset_account_id: AccountId,
    /// Entry date.
    pub date: NaiveDate,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Code, unique per tenant.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type code.
    pub account_type: String,
    /// Parent account.
    pub parent_id: Option<AccountId>,
    /// Whether the account is a non-postable aggregator.
    pub is_header: bool,
    /// Optional opening balance.
    pub opening_balance: Option<OpeningBalance>,
}

impl CreateAccountInput {
    /// Postable account with no parent and no opening balance.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type: account_type.into(),
            parent_id: None,
            is_header: false,
            opening_balance: None,
        }
    }

    /// Places the account under `parent_id`.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as a header.
    #[must_use]
    pub fn header(mut self) -> Self {
        self.is_header = true;
        self
    }

    /// Attaches an opening balance.
    #[must_use]
    pub fn with_opening_balance(mut self, opening_balance: OpeningBalance) -> Self {
        self.opening_balance = Some(opening_balance);
        self
    }

    /// Validates input shape.
    pub fn validate(&self) -> LedgerResult<()> {
        validate_code(&self.code)?;
        validate_name(&self.name)?;
        if let Some(opening) = &self.opening_balance {
            if self.is_header {
                return Err(LedgerError::validation(
                    "header accounts cannot carry an opening balance",
                ));
            }
            if opening.amount.is_zero() {
                return Err(LedgerError::validation("opening balance cannot be zero"));
            }
        }
        Ok(())
    }
}

/// Explicit update descriptor for an account.
///
/// Every field is optional; `None` leaves the current value. `parent_id` is doubly
/// optional so a caller can detach an account (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<Option<AccountId>>,
    /// New header flag.
    pub is_header: Option<bool>,
}

impl UpdateAccountInput {
    /// Returns true when the descriptor changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.parent_id.is_none()
            && self.is_header.is_none()
    }
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by category.
    pub category: Option<AccountCategory>,
    /// Filter by active flag.
    pub is_active: Option<bool>,
    /// Filter by parent (`Some(None)` = root accounts only).
    pub parent_id: Option<Option<AccountId>>,
}

impl AccountFilter {
    /// Returns true if the account passes every set criterion.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.category.is_none_or(|c| account.category == c)
            && self.is_active.is_none_or(|a| account.is_active == a)
            && self.parent_id.is_none_or(|p| account.parent_id == p)
    }
}

/// Validates an account or account type code.
pub fn validate_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::validation("code cannot be empty"));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(LedgerError::validation(format!(
            "code cannot exceed {MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(LedgerError::validation(format!(
            "code '{code}' may only contain letters, digits, '-', '_' and '.'"
        )));
    }
    Ok(())
}

/// Validates an account name.
pub fn validate_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name cannot be empty"));
    }
    Ok(())
}
