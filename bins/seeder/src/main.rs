//! Demo seeder for Tally.
//!
//! Migrates the configured database, then builds one tenant end to end: chart
//! of accounts, last calendar year as the fiscal year, a year of postings, a
//! bank reconciliation and the year-end close. Prints the trial balance.
//!
//! Usage: cargo run --bin seeder

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use tally_core::account::{AccountCategory, CreateAccountInput, OpeningBalance};
use tally_core::bank::{MatchPair, RegisterBankAccountInput, StatementLineInput};
use tally_core::ledger::{JournalEntryInput, LedgerLineInput};
use tally_core::reports::TrialBalanceReport;
use tally_db::migration::Migrator;
use tally_db::{CreateFiscalYearInput, Database, Ledger};
use tally_shared::types::{AccountId, TenantId};
use tally_shared::{AppConfig, telemetry};

struct Chart {
    cash: AccountId,
    fixed_assets: AccountId,
    capital: AccountId,
    retained_earnings: AccountId,
    sales: AccountId,
    rent: AccountId,
    wages: AccountId,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;
    if let Err(err) = telemetry::init(&config.logging) {
        warn!(error = %err, "Tracing subscriber already installed; keeping it");
    }

    println!("Connecting to database...");
    let conn = tally_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&conn, None)
        .await
        .context("failed to run migrations")?;

    let db = Database::new(conn, config.ledger);
    let ledger = Ledger::new(&db);
    let tenant = TenantId::new();
    let year = db.today().year() - 1;
    info!(tenant_id = %tenant, year, "Seeding demo tenant");

    println!("Seeding chart of accounts...");
    let chart = seed_chart(&ledger, tenant).await?;

    println!("Seeding fiscal year {year}...");
    let fiscal_year = ledger
        .fiscal
        .create_fiscal_year(
            tenant,
            CreateFiscalYearInput {
                name: format!("FY{year}"),
                start_date: ymd(year, 1, 1)?,
                end_date: ymd(year, 12, 31)?,
            },
        )
        .await?;

    println!("Seeding opening balances...");
    ledger
        .accounts
        .create_account(
            tenant,
            CreateAccountInput::new("1500", "Equipment", "asset")
                .with_parent(chart.fixed_assets)
                .with_opening_balance(OpeningBalance {
                    amount: Decimal::from(12_000),
                    offset_account_id: chart.capital,
                    date: ymd(year, 1, 1)?,
                }),
        )
        .await?;

    println!("Seeding postings...");
    let mut deposits = Vec::new();
    for month in 1..=12 {
        let sale = JournalEntryInput::new(
            ymd(year, month, 10)?,
            vec![
                LedgerLineInput::debit(chart.cash, Decimal::from(8_500)),
                LedgerLineInput::credit(chart.sales, Decimal::from(8_500)),
            ],
        )
        .with_reference(format!("INV-{year}-{month:02}"))
        .with_description("Monthly sales");
        deposits.push(ledger.poster.post(tenant, sale).await?);

        let expenses = JournalEntryInput::new(
            ymd(year, month, 25)?,
            vec![
                LedgerLineInput::debit(chart.rent, Decimal::from(2_000)).with_memo("Office"),
                LedgerLineInput::debit(chart.wages, Decimal::from(4_250)).with_cost_center("OPS"),
                LedgerLineInput::credit(chart.cash, Decimal::from(6_250)),
            ],
        )
        .with_description("Rent and payroll");
        ledger.poster.post(tenant, expenses).await?;
    }

    println!("Reconciling first-quarter deposits...");
    let bank = ledger
        .bank
        .register_bank_account(
            tenant,
            RegisterBankAccountInput {
                name: "Operating account".to_string(),
                ledger_account_id: chart.cash,
                opening_balance: Decimal::ZERO,
            },
        )
        .await?;
    let statement: Vec<StatementLineInput> = deposits
        .iter()
        .take(3)
        .filter_map(|d| d.entry.date.succ_opt().map(|on| (d, on)))
        .map(|(d, on)| {
            StatementLineInput::new(on, d.entry.total, "Deposit")
                .with_reference(d.entry.reference.clone().unwrap_or_default())
        })
        .collect();
    let statement_total: Decimal = statement.iter().map(|l| l.amount).sum();
    ledger
        .bank
        .import_statement_lines(tenant, bank.id, statement)
        .await?;

    let suggestions = ledger.bank.suggest_matches(tenant, bank.id, None).await?;
    let pairs: Vec<MatchPair> = suggestions
        .proposals
        .iter()
        .map(|p| MatchPair {
            bank_transaction_id: p.candidate.bank_transaction_id,
            ledger_line_id: p.candidate.ledger_line_id,
        })
        .collect();
    let session = ledger
        .reconciliations
        .start(tenant, bank.id, statement_total, ymd(year, 3, 31)?)
        .await?;
    ledger
        .reconciliations
        .apply_matches(tenant, session.id, &pairs)
        .await?;
    ledger.reconciliations.complete(tenant, session.id).await?;

    println!("Closing fiscal year...");
    for period in &fiscal_year.periods {
        ledger.fiscal.close_period(tenant, period.id, false).await?;
    }
    let result = ledger
        .year_end
        .close_year(tenant, fiscal_year.fiscal_year.id)
        .await?;
    println!("  Net income: {}", result.net_income);

    let year_end = ymd(year, 12, 31)?;
    let report = ledger.reports.trial_balance(tenant, year_end, false).await?;
    print_trial_balance(&report);
    let retained = ledger
        .accounts
        .compute_balance(tenant, chart.retained_earnings, year_end)
        .await?;
    println!("  Retained earnings: {retained}");

    println!("Seeding complete!");
    Ok(())
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {year}-{month}-{day}"))
}

async fn seed_chart(ledger: &Ledger, tenant: TenantId) -> Result<Chart> {
    ledger.accounts.install_standard_account_types(tenant).await?;

    let assets = ledger
        .accounts
        .create_account(tenant, CreateAccountInput::new("1", "Assets", "asset").header())
        .await?
        .account
        .id;
    let fixed_assets = ledger
        .accounts
        .create_account(
            tenant,
            CreateAccountInput::new("15", "Fixed Assets", "asset")
                .header()
                .with_parent(assets),
        )
        .await?
        .account
        .id;

    let cash = create(ledger, tenant, "1000", "Cash at Bank", Some(assets)).await?;
    let capital = create(ledger, tenant, "3000", "Owner Capital", None).await?;
    let retained_earnings = create(ledger, tenant, "3100", "Retained Earnings", None).await?;
    let sales = create(ledger, tenant, "4000", "Sales", None).await?;
    let rent = create(ledger, tenant, "5000", "Rent Expense", None).await?;
    let wages = create(ledger, tenant, "5100", "Wages", None).await?;

    ledger
        .accounts
        .designate_retained_earnings(tenant, retained_earnings)
        .await?;

    Ok(Chart {
        cash,
        fixed_assets,
        capital,
        retained_earnings,
        sales,
        rent,
        wages,
    })
}

/// Creates a postable account whose type follows the leading digit of its code.
async fn create(
    ledger: &Ledger,
    tenant: TenantId,
    code: &str,
    name: &str,
    parent: Option<AccountId>,
) -> Result<AccountId> {
    let category = match code.chars().next() {
        Some('1') => AccountCategory::Asset,
        Some('2') => AccountCategory::Liability,
        Some('3') => AccountCategory::Equity,
        Some('4') => AccountCategory::Revenue,
        _ => AccountCategory::Expense,
    };
    let mut input = CreateAccountInput::new(code, name, category.as_str());
    if let Some(parent) = parent {
        input = input.with_parent(parent);
    }
    let created = ledger.accounts.create_account(tenant, input).await?;
    Ok(created.account.id)
}

fn print_trial_balance(report: &TrialBalanceReport) {
    println!("Trial balance as of {}:", report.as_of);
    println!("  {:<8} {:<24} {:>14} {:>14}", "Code", "Account", "Debit", "Credit");
    for row in &report.rows {
        println!(
            "  {:<8} {:<24} {:>14} {:>14}",
            row.code, row.name, row.debit_total, row.credit_total
        );
    }
    println!(
        "  {:<33} {:>14} {:>14}  balanced: {}",
        "Total", report.totals.total_debit, report.totals.total_credit, report.totals.is_balanced
    );
}
