//! Validated merge of an [`UpdateAccountInput`] into an account.

use tally_shared::types::AccountId;

use super::hierarchy::{HierarchyNode, validate_parent};
use super::types::{Account, UpdateAccountInput, validate_code, validate_name};
use crate::error::{LedgerError, LedgerResult};

/// Applies `update` to a copy of `account`.
///
/// `code_taken` reports whether another account of the tenant already uses a
/// code; `lookup` resolves hierarchy nodes for the cycle check.
pub fn merge_update<C, L>(
    account: &Account,
    update: &UpdateAccountInput,
    code_taken: C,
    lookup: L,
) -> LedgerResult<Account>
where
    C: Fn(&str) -> bool,
    L: Fn(AccountId) -> Option<HierarchyNode>,
{
    let mut merged = account.clone();

    if let Some(name) = &update.name {
        validate_name(name)?;
        merged.name.clone_from(name);
    }

    if let Some(code) = &update.code {
        validate_code(code)?;
        if *code != account.code && code_taken(code) {
            return Err(LedgerError::DuplicateCode(code.clone()));
        }
        merged.code.clone_from(code);
    }

    if let Some(parent) = update.parent_id {
        if let Some(parent_id) = parent {
            validate_parent(account.tenant_id, account.id, parent_id, &lookup)?;
        }
        merged.parent_id = parent;
    }

    if let Some(is_header) = update.is_header {
        if is_header && !account.is_header && account.has_postings() {
            return Err(LedgerError::validation(format!(
                "account {} has postings and cannot become a header",
                account.code
            )));
        }
        merged.is_header = is_header;
    }

    Ok(merged)
}
