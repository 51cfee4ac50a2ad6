//! Chart of accounts: types, hierarchy rules and balance arithmetic.

pub mod balance;
pub mod hierarchy;
pub mod types;
pub mod update;

pub use balance::{AccountActivity, NormalBalance, RunningBalance};
pub use hierarchy::{ChildIndex, HierarchyNode, validate_parent};
pub use types::*;
pub use update::merge_update;
