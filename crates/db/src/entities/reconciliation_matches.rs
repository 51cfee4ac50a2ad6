//! `SeaORM` Entity for reconciliation_matches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub reconciliation_id: Uuid,
    #[sea_orm(unique)]
    pub bank_transaction_id: i64,
    #[sea_orm(unique)]
    pub ledger_line_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliations::Entity",
        from = "Column::ReconciliationId",
        to = "super::reconciliations::Column::Id",
        on_delete = "Cascade"
    )]
    Reconciliations,
    #[sea_orm(
        belongs_to = "super::bank_transactions::Entity",
        from = "Column::BankTransactionId",
        to = "super::bank_transactions::Column::Id"
    )]
    BankTransactions,
    #[sea_orm(
        belongs_to = "super::ledger_lines::Entity",
        from = "Column::LedgerLineId",
        to = "super::ledger_lines::Column::Id"
    )]
    LedgerLines,
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
