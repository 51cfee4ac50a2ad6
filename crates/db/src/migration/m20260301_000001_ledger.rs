//! Ledger schema.
//!
//! Creates the chart of accounts, the fiscal calendar, the journal and the
//! bank reconciliation tables. Every row carries its `tenant_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;
        db.execute_unprepared(FISCAL_CALENDAR_SQL).await?;
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_SQL).await?;
        db.execute_unprepared(BANK_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TENANT_SETTINGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_category AS ENUM ('asset', 'liability', 'equity', 'revenue', 'expense');
CREATE TYPE normal_balance AS ENUM ('debit', 'credit');
CREATE TYPE fiscal_status AS ENUM ('open', 'closed');
CREATE TYPE entry_source AS ENUM ('manual', 'opening_balance', 'reversal', 'year_end_close');
CREATE TYPE reconciliation_status AS ENUM ('draft', 'in_progress', 'completed', 'cancelled');
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE account_types (
    tenant_id UUID NOT NULL,
    code VARCHAR(50) NOT NULL,
    category account_category NOT NULL,
    normal_balance normal_balance NOT NULL,
    PRIMARY KEY (tenant_id, code)
);

CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(50) NOT NULL,
    category account_category NOT NULL,
    normal_balance normal_balance NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_header BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    current_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_tenant_code UNIQUE (tenant_id, code),
    CONSTRAINT fk_accounts_type FOREIGN KEY (tenant_id, account_type)
        REFERENCES account_types(tenant_id, code),
    CONSTRAINT chk_accounts_not_own_parent CHECK (parent_id IS NULL OR parent_id <> id),
    CONSTRAINT chk_accounts_version CHECK (version >= 0)
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const FISCAL_CALENDAR_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status fiscal_status NOT NULL DEFAULT 'open',
    closed_at TIMESTAMPTZ,
    CONSTRAINT chk_fiscal_years_dates CHECK (end_date > start_date)
);

CREATE INDEX idx_fiscal_years_tenant ON fiscal_years(tenant_id, start_date);

CREATE TABLE fiscal_periods (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    period_number INTEGER NOT NULL,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status fiscal_status NOT NULL DEFAULT 'open',
    closed_at TIMESTAMPTZ,
    CONSTRAINT uq_fiscal_periods_number UNIQUE (fiscal_year_id, period_number),
    CONSTRAINT chk_fiscal_periods_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_fiscal_periods_number CHECK (period_number > 0)
);

CREATE INDEX idx_fiscal_periods_dates ON fiscal_periods(tenant_id, start_date, end_date);
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    ledger_account_id UUID NOT NULL REFERENCES accounts(id),
    opening_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    last_reconciled_balance NUMERIC(19, 4),
    last_reconciled_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE reconciliations (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    statement_balance NUMERIC(19, 4) NOT NULL,
    statement_date DATE NOT NULL,
    opening_balance NUMERIC(19, 4),
    book_balance NUMERIC(19, 4),
    status reconciliation_status NOT NULL DEFAULT 'draft',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    finished_at TIMESTAMPTZ
);

CREATE INDEX idx_reconciliations_bank ON reconciliations(bank_account_id, created_at);
";

const JOURNAL_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    entry_number BIGINT NOT NULL,
    entry_date DATE NOT NULL,
    source entry_source NOT NULL,
    reversal_of UUID REFERENCES journal_entries(id),
    closes_fiscal_year_id UUID REFERENCES fiscal_years(id),
    reference VARCHAR(100),
    description TEXT,
    total NUMERIC(19, 4) NOT NULL,
    reversed_by UUID REFERENCES journal_entries(id),
    posted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_journal_entries_number UNIQUE (tenant_id, entry_number),
    CONSTRAINT uq_journal_entries_reversal UNIQUE (reversal_of),
    CONSTRAINT chk_journal_entries_total CHECK (total > 0),
    CONSTRAINT chk_journal_entries_source CHECK (
        (source = 'reversal') = (reversal_of IS NOT NULL)
        AND (source = 'year_end_close') = (closes_fiscal_year_id IS NOT NULL)
    )
);

CREATE INDEX idx_journal_entries_date ON journal_entries(tenant_id, entry_date, entry_number);

CREATE TABLE ledger_lines (
    id BIGSERIAL PRIMARY KEY,
    tenant_id UUID NOT NULL,
    entry_id UUID NOT NULL REFERENCES journal_entries(id),
    entry_date DATE NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    memo TEXT,
    cost_center VARCHAR(50),
    reference VARCHAR(100),
    account_version BIGINT NOT NULL,
    running_balance NUMERIC(19, 4) NOT NULL,
    reconciliation_id UUID REFERENCES reconciliations(id),
    CONSTRAINT uq_ledger_lines_account_version UNIQUE (account_id, account_version),
    CONSTRAINT chk_ledger_lines_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT chk_ledger_lines_one_sided CHECK ((debit = 0) <> (credit = 0))
);

CREATE INDEX idx_ledger_lines_entry ON ledger_lines(entry_id);
CREATE INDEX idx_ledger_lines_account_date ON ledger_lines(account_id, entry_date);
";

const BANK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE bank_transactions (
    id BIGSERIAL PRIMARY KEY,
    tenant_id UUID NOT NULL,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    txn_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    reference VARCHAR(100),
    description TEXT NOT NULL DEFAULT '',
    reconciliation_id UUID REFERENCES reconciliations(id),
    CONSTRAINT chk_bank_transactions_amount CHECK (amount <> 0)
);

CREATE INDEX idx_bank_transactions_unreconciled
    ON bank_transactions(bank_account_id, txn_date) WHERE reconciliation_id IS NULL;

-- One row per matched pair; an item can be matched in at most one session
CREATE TABLE reconciliation_matches (
    id BIGSERIAL PRIMARY KEY,
    reconciliation_id UUID NOT NULL REFERENCES reconciliations(id) ON DELETE CASCADE,
    bank_transaction_id BIGINT NOT NULL REFERENCES bank_transactions(id),
    ledger_line_id BIGINT NOT NULL REFERENCES ledger_lines(id),
    amount NUMERIC(19, 4) NOT NULL,
    CONSTRAINT uq_reconciliation_matches_bank UNIQUE (bank_transaction_id),
    CONSTRAINT uq_reconciliation_matches_line UNIQUE (ledger_line_id)
);

CREATE INDEX idx_reconciliation_matches_session ON reconciliation_matches(reconciliation_id);
";

const TENANT_SETTINGS_SQL: &str = r"
CREATE TABLE tenant_settings (
    tenant_id UUID PRIMARY KEY,
    retained_earnings_account_id UUID NOT NULL REFERENCES accounts(id),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS tenant_settings CASCADE;
DROP TABLE IF EXISTS reconciliation_matches CASCADE;
DROP TABLE IF EXISTS bank_transactions CASCADE;
DROP TABLE IF EXISTS ledger_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS reconciliations CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS fiscal_periods CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS account_types CASCADE;

DROP TYPE IF EXISTS reconciliation_status;
DROP TYPE IF EXISTS entry_source;
DROP TYPE IF EXISTS fiscal_status;
DROP TYPE IF EXISTS normal_balance;
DROP TYPE IF EXISTS account_category;
";
