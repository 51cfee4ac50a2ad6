//! Account hierarchy checks.

use std::collections::{HashMap, HashSet};

use tally_shared::types::{AccountId, TenantId};

use crate::error::{LedgerError, LedgerResult};

/// The parts of an account the hierarchy rules look at.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyNode {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent link.
    pub parent_id: Option<AccountId>,
}

/// Checks that `account_id` may be placed under `parent_id`.
///
/// The parent must exist and belong to the same tenant, and walking up from the
/// parent must never reach `account_id`.
pub fn validate_parent<F>(
    tenant_id: TenantId,
    account_id: AccountId,
    parent_id: AccountId,
    lookup: F,
) -> LedgerResult<()>
where
    F: Fn(AccountId) -> Option<HierarchyNode>,
{
    let parent = lookup(parent_id).ok_or(LedgerError::UnknownAccount(parent_id))?;
    if parent.tenant_id != tenant_id {
        return Err(LedgerError::Cycle {
            account_id,
            parent_id,
        });
    }

    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == account_id || !seen.insert(current) {
            return Err(LedgerError::Cycle {
                account_id,
                parent_id,
            });
        }
        cursor = lookup(current).and_then(|node| node.parent_id);
    }
    Ok(())
}

/// Parent to children index.
#[derive(Debug, Default)]
pub struct ChildIndex {
    children: HashMap<AccountId, Vec<AccountId>>,
}

impl ChildIndex {
    /// Builds the index from `(id, parent)` pairs.
    pub fn build<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (AccountId, Option<AccountId>)>,
    {
        let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
        for (id, parent) in accounts {
            if let Some(parent) = parent {
                children.entry(parent).or_default().push(id);
            }
        }
        Self { children }
    }

    /// Direct children of an account.
    #[must_use]
    pub fn children(&self, id: AccountId) -> &[AccountId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// All descendants of `root`, excluding `root` itself.
    #[must_use]
    pub fn descendants(&self, root: AccountId) -> Vec<AccountId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in self.children(id) {
                if seen.insert(*child) {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }
        out
    }
}
