//! These structs provide the CLI interface for the penny CLI.

use crate::commands::OutputFormat;
use crate::config::MailConfig;
use crate::db::TransactionFilter;
use crate::import::ColumnOverrides;
use crate::model::{Amount, CategoryKind, JobKind, TradeSide};
use crate::model::{CategoryUpdates, GoalUpdates, TransactionUpdates};
use crate::utils;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// penny: A command-line personal finance tracker.
///
/// Records transactions, categories, budgets, savings goals and investment trades in a local
/// SQLite book, then reports on them: a monthly dashboard, yearly and per-category reports,
/// budget and goal progress, and a portfolio view replayed from your trades. Bank statements
/// can be imported from CSV with duplicate detection, and a monthly summary can be emailed
/// through a transactional-mail HTTP endpoint.
///
/// Data lives in the penny home directory, `~/pennybook` by default. Override it with
/// --penny-home or the PENNY_HOME environment variable. Run `penny init` once to create it.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the penny home directory, config file and an empty database.
    ///
    /// This is the first command you should run. Decide where you want your data to live and
    /// pass it as --penny-home; by default it will be $HOME/pennybook.
    ///
    /// The outgoing mail settings are optional at this point. `penny email` will refuse to
    /// run until `mail.endpoint`, `mail.from` and `mail.to` are filled in (here or by editing
    /// config.json later) and an API key has been placed in .secrets/mail_key. Everything
    /// else works without them.
    Init(InitArgs),
    /// Add a transaction, category, budget, goal or trade to the book.
    Insert(InsertArgs),
    /// Change fields of rows already in the book.
    Update(UpdateArgs),
    /// Remove rows from the book.
    Delete(DeleteArgs),
    /// Print rows of the book.
    List(ListArgs),
    /// Import transactions from a bank statement CSV file.
    Import(ImportArgs),
    /// Write transactions to a CSV file.
    Export(ExportArgs),
    /// Print a one-month snapshot: income, expenses, category totals and budget status.
    Dashboard(DashboardArgs),
    /// Longer-form reports: monthly, categories, budget, goals.
    Report(ReportArgs),
    /// Print holdings with average cost and realized P&L, replayed from recorded trades.
    Portfolio(PortfolioArgs),
    /// Email a month's dashboard summary.
    Email(EmailArgs),
    /// Manage recurring monthly jobs and run the ones that are due.
    Jobs(JobsArgs),
    /// Snapshot the whole book into the backups directory.
    Backup,
    /// Get and set the internal key-value properties.
    Property(PropertyArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where penny data and configuration is held. Defaults to ~/pennybook
    #[arg(long, env = "PENNY_HOME", default_value_t = default_penny_home())]
    penny_home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn penny_home(&self) -> &DisplayPath {
        &self.penny_home
    }
}

/// Args for the `penny init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The transactional-mail HTTP endpoint that `penny email` POSTs messages to, e.g.
    /// https://api.mailprovider.example/v1/send
    #[arg(long)]
    mail_endpoint: Option<String>,

    /// The sender address for summary emails.
    #[arg(long)]
    mail_from: Option<String>,

    /// The recipient address for summary emails.
    #[arg(long)]
    mail_to: Option<String>,
}

impl InitArgs {
    /// The outgoing mail settings to seed config.json with. Unset flags become empty fields.
    pub fn mail(&self) -> MailConfig {
        MailConfig {
            endpoint: self.mail_endpoint.clone().unwrap_or_default(),
            from: self.mail_from.clone().unwrap_or_default(),
            to: self.mail_to.clone().unwrap_or_default(),
        }
    }
}

/// Args for the `penny insert` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Add one transaction, optionally split into monthly installments.
    Transaction(Box<InsertTransactionArgs>),
    /// Add a category.
    Category(InsertCategoryArgs),
    /// Plan an amount for one category in one month.
    Budget(InsertBudgetArgs),
    /// Add a savings goal funded by a category.
    Goal(InsertGoalArgs),
    /// Record a buy or a sell.
    Trade(Box<InsertTradeArgs>),
}

/// Args for `penny insert transaction`.
#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    /// The date of the transaction, e.g. 2025-06-30.
    #[arg(long, value_parser = utils::parse_date)]
    pub date: NaiveDate,

    /// The signed amount: negative for expenses, positive for income. e.g. `-42.50`.
    #[arg(long, value_parser = utils::parse_amount, allow_hyphen_values = true)]
    pub amount: Amount,

    /// What the money was for.
    #[arg(long)]
    pub description: Option<String>,

    /// The account the money moved through, e.g. "Chase Checking".
    #[arg(long)]
    pub account: Option<String>,

    /// The category name. It must already exist.
    #[arg(long)]
    pub category: Option<String>,

    /// A free-form note.
    #[arg(long)]
    pub note: Option<String>,

    /// Comma-separated tags, e.g. "vacation,reimbursable".
    #[arg(long)]
    pub tags: Option<String>,

    /// Split the amount into this many monthly rows. The rows sum exactly to the amount and
    /// their dates advance one calendar month at a time.
    #[arg(long, default_value_t = 1)]
    pub installments: u32,
}

/// Args for `penny insert category`.
#[derive(Debug, Parser, Clone)]
pub struct InsertCategoryArgs {
    /// The category name. Must be unique.
    #[arg(long)]
    pub name: String,

    /// A free-form grouping, e.g. "Living" or "Discretionary".
    #[arg(long = "group")]
    pub category_group: Option<String>,

    /// Whether transactions in this category are income or expenses.
    #[arg(long, value_enum, default_value_t)]
    pub kind: CategoryKind,

    /// Hide the category from the dashboard and from reports.
    #[arg(long)]
    pub hidden: bool,
}

/// Args for `penny insert budget`.
#[derive(Debug, Parser, Clone)]
pub struct InsertBudgetArgs {
    /// The category the budget applies to.
    #[arg(long)]
    pub category: String,

    /// The month the budget applies to, e.g. 2025-06.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: String,

    /// The planned amount. Must not be negative.
    #[arg(long, value_parser = utils::parse_amount)]
    pub amount: Amount,
}

/// Args for `penny insert goal`.
#[derive(Debug, Parser, Clone)]
pub struct InsertGoalArgs {
    /// The goal name. Must be unique.
    #[arg(long)]
    pub name: String,

    /// The amount to save, e.g. 20000. Must be greater than zero.
    #[arg(long, value_parser = utils::parse_amount)]
    pub target_amount: Amount,

    /// The date the goal should be reached, e.g. 2027-01-01.
    #[arg(long, value_parser = utils::parse_date)]
    pub target_date: Option<NaiveDate>,

    /// The category whose transactions fund the goal.
    #[arg(long)]
    pub category: String,
}

/// Args for `penny insert trade`.
#[derive(Debug, Parser, Clone)]
pub struct InsertTradeArgs {
    /// The date of the trade, e.g. 2025-03-14.
    #[arg(long, value_parser = utils::parse_date)]
    pub date: NaiveDate,

    /// The ticker symbol, e.g. VTI. Stored uppercase.
    #[arg(long)]
    pub symbol: String,

    /// Whether the trade was a buy or a sell.
    #[arg(long, value_enum)]
    pub side: TradeSide,

    /// The number of units traded. Fractional quantities are allowed.
    #[arg(long, value_parser = utils::parse_decimal)]
    pub quantity: Decimal,

    /// The per-unit price paid or received.
    #[arg(long, value_parser = utils::parse_decimal)]
    pub price: Decimal,

    /// Commissions and fees for the trade.
    #[arg(long, value_parser = utils::parse_decimal, default_value_t = Decimal::ZERO)]
    pub fees: Decimal,

    /// A free-form note.
    #[arg(long)]
    pub note: Option<String>,
}

/// Args for the `penny update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[command(subcommand)]
    entity: UpdateSubcommand,
}

impl UpdateArgs {
    pub fn entity(&self) -> &UpdateSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Change fields of one or more transactions.
    Transaction(Box<UpdateTransactionArgs>),
    /// Change fields of a category.
    Category(UpdateCategoryArgs),
    /// Change the amount of a budget.
    Budget(UpdateBudgetArgs),
    /// Change fields of a goal.
    Goal(UpdateGoalArgs),
}

/// Args for `penny update transaction`. Only the fields given change; the rest keep their
/// values. When several ids are given, the same changes apply to every row.
#[derive(Debug, Parser, Clone)]
pub struct UpdateTransactionArgs {
    /// The transaction to change. Repeat to change several rows at once.
    #[arg(long = "id", required = true)]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub updates: TransactionUpdates,
}

/// Args for `penny update category`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateCategoryArgs {
    /// The category to change.
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub updates: CategoryUpdates,
}

/// Args for `penny update budget`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateBudgetArgs {
    /// The category of the budget to change.
    #[arg(long)]
    pub category: String,

    /// The month of the budget to change, e.g. 2025-06.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: String,

    /// The new planned amount. Must not be negative.
    #[arg(long, value_parser = utils::parse_amount)]
    pub amount: Amount,
}

/// Args for `penny update goal`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateGoalArgs {
    /// The goal to change.
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub updates: GoalUpdates,
}

/// Args for the `penny delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete one or more transactions. Either all of them delete or none do.
    Transaction(DeleteTransactionArgs),
    /// Delete a category. Its transactions become uncategorized; the category cannot be
    /// deleted while budgets or goals still reference it.
    Category(DeleteCategoryArgs),
    /// Delete a budget.
    Budget(DeleteBudgetArgs),
    /// Delete a goal.
    Goal(DeleteGoalArgs),
    /// Delete a trade.
    Trade(DeleteTradeArgs),
}

/// Args for `penny delete transaction`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteTransactionArgs {
    /// The transaction to delete. Repeat to delete several rows at once.
    #[arg(long = "id", required = true)]
    pub ids: Vec<String>,
}

/// Args for `penny delete category`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteCategoryArgs {
    /// The category to delete.
    #[arg(long)]
    pub name: String,
}

/// Args for `penny delete budget`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteBudgetArgs {
    /// The category of the budget to delete.
    #[arg(long)]
    pub category: String,

    /// The month of the budget to delete, e.g. 2025-06.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: String,
}

/// Args for `penny delete goal`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteGoalArgs {
    /// The goal to delete.
    #[arg(long)]
    pub name: String,
}

/// Args for `penny delete trade`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteTradeArgs {
    /// The trade to delete, by the ID shown in `penny list trades`.
    #[arg(long)]
    pub id: String,
}

/// Args for the `penny list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    #[command(subcommand)]
    entity: ListSubcommand,
}

impl ListArgs {
    pub fn entity(&self) -> &ListSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListSubcommand {
    /// Print transactions, newest first.
    Transactions(ListTransactionsArgs),
    /// Print the categories.
    Categories,
    /// Print budgets.
    Budgets(ListBudgetsArgs),
    /// Print the savings goals.
    Goals,
    /// Print trades in date order.
    Trades(ListTradesArgs),
}

/// Args for `penny list transactions`.
#[derive(Debug, Parser, Clone)]
pub struct ListTransactionsArgs {
    #[command(flatten)]
    pub filter: TransactionFilterArgs,
}

/// Args for `penny list budgets`.
#[derive(Debug, Parser, Clone)]
pub struct ListBudgetsArgs {
    /// Only budgets for this month, e.g. 2025-06.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: Option<String>,
}

/// Args for `penny list trades`.
#[derive(Debug, Parser, Clone)]
pub struct ListTradesArgs {
    /// Only trades in this symbol.
    #[arg(long)]
    pub symbol: Option<String>,
}

/// Transaction row filters, shared by `penny list transactions` and `penny export`. All of
/// the given filters must match.
#[derive(Debug, Default, Parser, Clone)]
pub struct TransactionFilterArgs {
    /// Only rows on or after this date, e.g. 2025-01-01.
    #[arg(long, value_parser = utils::parse_date)]
    pub from: Option<NaiveDate>,

    /// Only rows on or before this date.
    #[arg(long, value_parser = utils::parse_date)]
    pub to: Option<NaiveDate>,

    /// Only rows in this month, e.g. 2025-06.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: Option<String>,

    /// Only rows in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// Only rows in this account.
    #[arg(long)]
    pub account: Option<String>,

    /// Only rows whose description contains this text, case-insensitively.
    #[arg(long)]
    pub search: Option<String>,

    /// At most this many rows.
    #[arg(long)]
    pub limit: Option<u32>,
}

impl TransactionFilterArgs {
    pub(crate) fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            from: self.from,
            to: self.to,
            month: self.month.clone(),
            category: self.category.clone(),
            account: self.account.clone(),
            search: self.search.clone(),
            limit: self.limit,
        }
    }
}

/// Args for the `penny import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The statement CSV file to read.
    #[arg(long)]
    pub file: PathBuf,

    /// The account name recorded on every imported row, e.g. "Chase Checking".
    #[arg(long)]
    pub account: String,

    /// A category assigned to every imported row. It must already exist.
    #[arg(long)]
    pub category: Option<String>,

    /// Negate every imported amount. Use for statements that record charges as positive
    /// numbers, as credit card statements usually do.
    #[arg(long)]
    pub flip_signs: bool,

    /// Parse and deduplicate the statement, print what would be imported, and write nothing.
    #[arg(long)]
    pub preview: bool,

    #[command(flatten)]
    pub columns: ColumnOverrides,
}

/// Args for the `penny export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The file to write, or `-` for stdout.
    #[arg(long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub filter: TransactionFilterArgs,
}

/// Args for the `penny dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// The month to summarize, e.g. 2025-06. Defaults to the current month.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: Option<String>,
}

/// Args for the `penny report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    entity: ReportSubcommand,
}

impl ReportArgs {
    /// Builds the args without going through the command line.
    pub fn new(format: OutputFormat, entity: ReportSubcommand) -> Self {
        Self { format, entity }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn entity(&self) -> &ReportSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportSubcommand {
    /// Income, expenses and net for each month of one year.
    Monthly(ReportMonthlyArgs),
    /// Per-category totals and transaction counts over a date range.
    Categories(ReportCategoriesArgs),
    /// Budgeted versus spent for one month.
    Budget(ReportBudgetArgs),
    /// Progress toward each savings goal.
    Goals,
}

/// Args for `penny report monthly`.
#[derive(Debug, Parser, Clone)]
pub struct ReportMonthlyArgs {
    /// The year to report, e.g. 2025.
    #[arg(long)]
    pub year: i32,
}

/// Args for `penny report categories`.
#[derive(Debug, Parser, Clone)]
pub struct ReportCategoriesArgs {
    /// The start of the date range, inclusive.
    #[arg(long, value_parser = utils::parse_date)]
    pub from: NaiveDate,

    /// The end of the date range, inclusive.
    #[arg(long, value_parser = utils::parse_date)]
    pub to: NaiveDate,
}

/// Args for `penny report budget`.
#[derive(Debug, Parser, Clone)]
pub struct ReportBudgetArgs {
    /// The month to report, e.g. 2025-06. Defaults to the current month.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: Option<String>,
}

/// Args for the `penny portfolio` command.
#[derive(Debug, Parser, Clone)]
pub struct PortfolioArgs {
    /// Only this symbol.
    #[arg(long)]
    pub symbol: Option<String>,
}

/// Args for the `penny email` command.
#[derive(Debug, Parser, Clone)]
pub struct EmailArgs {
    /// The month to summarize, e.g. 2025-06. Defaults to the current month.
    #[arg(long, value_parser = utils::parse_month)]
    pub month: Option<String>,
}

/// Args for the `penny jobs` command.
#[derive(Debug, Parser, Clone)]
pub struct JobsArgs {
    #[command(subcommand)]
    entity: JobsSubcommand,
}

impl JobsArgs {
    pub fn entity(&self) -> &JobsSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum JobsSubcommand {
    /// Register a recurring monthly job.
    Add(JobsAddArgs),
    /// Print the job registry.
    List,
    /// Delete a job.
    Remove(JobsIdArgs),
    /// Re-enable a disabled job.
    Enable(JobsIdArgs),
    /// Stop a job from firing without deleting it.
    Disable(JobsIdArgs),
    /// Run every job that is due today. Intended to be invoked once a day by cron or a
    /// similar scheduler; running it more often is harmless because a job fires at most
    /// once per month.
    RunDue,
}

/// Args for `penny jobs add`.
#[derive(Debug, Parser, Clone)]
pub struct JobsAddArgs {
    /// The work the job performs.
    #[arg(long, value_enum)]
    pub kind: JobKind,

    /// The day of the month on or after which the job fires, between 1 and 28.
    #[arg(long, value_parser = utils::parse_job_day)]
    pub day: u32,
}

/// Identifies a job by the ID shown in `penny jobs list`.
#[derive(Debug, Parser, Clone)]
pub struct JobsIdArgs {
    /// The job ID.
    #[arg(long)]
    pub id: i64,
}

/// Args for the `penny property` command.
#[derive(Debug, Parser, Clone)]
pub struct PropertyArgs {
    #[command(subcommand)]
    entity: PropertySubcommand,
}

impl PropertyArgs {
    pub fn entity(&self) -> &PropertySubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum PropertySubcommand {
    /// Print one property value.
    Get(PropertyKeyArgs),
    /// Store a property value.
    Set(PropertySetArgs),
    /// Delete a property.
    Delete(PropertyKeyArgs),
    /// Print every property.
    List,
}

/// Identifies a property by key.
#[derive(Debug, Parser, Clone)]
pub struct PropertyKeyArgs {
    /// The property key, e.g. `last_import`.
    pub key: String,
}

/// Args for `penny property set`.
#[derive(Debug, Parser, Clone)]
pub struct PropertySetArgs {
    /// The property key.
    pub key: String,

    /// The value to store.
    pub value: String,
}

fn default_penny_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pennybook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --penny-home or PENNY_HOME instead of relying on the default \
                penny home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("pennybook")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
