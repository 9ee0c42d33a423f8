use clap::Parser;
use pennybook::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, JobsSubcommand, ListSubcommand,
    PropertySubcommand, UpdateSubcommand,
};
use pennybook::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().penny_home().path();

    // This allows for running the whole program without a mail provider. When
    // PENNY_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test and
    // outgoing mail lands in the outbox directory, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Hand off to the subcommand's handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.mail()).await?.print(),

        Command::Insert(insert_args) => {
            let config = Config::load(home).await?;
            match insert_args.entity() {
                InsertSubcommand::Transaction(args) => {
                    commands::insert_transaction(config, *args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Category(args) => commands::insert_category(config, args.clone())
                    .await?
                    .print(),
                InsertSubcommand::Budget(args) => commands::insert_budget(config, args.clone())
                    .await?
                    .print(),
                InsertSubcommand::Goal(args) => commands::insert_goal(config, args.clone())
                    .await?
                    .print(),
                InsertSubcommand::Trade(args) => commands::insert_trade(config, *args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Update(update_args) => {
            let config = Config::load(home).await?;
            match update_args.entity() {
                UpdateSubcommand::Transaction(args) => {
                    commands::update_transactions(config, *args.clone())
                        .await?
                        .print()
                }
                UpdateSubcommand::Category(args) => commands::update_category(config, args.clone())
                    .await?
                    .print(),
                UpdateSubcommand::Budget(args) => commands::update_budget(config, args.clone())
                    .await?
                    .print(),
                UpdateSubcommand::Goal(args) => commands::update_goal(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            match delete_args.entity() {
                DeleteSubcommand::Transaction(args) => {
                    commands::delete_transactions(config, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Category(args) => commands::delete_category(config, args.clone())
                    .await?
                    .print(),
                DeleteSubcommand::Budget(args) => commands::delete_budget(config, args.clone())
                    .await?
                    .print(),
                DeleteSubcommand::Goal(args) => commands::delete_goal(config, args.clone())
                    .await?
                    .print(),
                DeleteSubcommand::Trade(args) => commands::delete_trade(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::List(list_args) => {
            let config = Config::load(home).await?;
            match list_args.entity() {
                ListSubcommand::Transactions(args) => {
                    commands::list_transactions(config, args.clone())
                        .await?
                        .print()
                }
                ListSubcommand::Categories => commands::list_categories(config).await?.print(),
                ListSubcommand::Budgets(args) => commands::list_budgets(config, args.clone())
                    .await?
                    .print(),
                ListSubcommand::Goals => commands::list_goals(config).await?.print(),
                ListSubcommand::Trades(args) => commands::list_trades(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            commands::import(config, import_args.clone()).await?.print()
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, export_args.clone()).await?.print()
        }

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            commands::dashboard(config, dashboard_args.clone())
                .await?
                .print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(config, report_args.clone()).await?.print()
        }

        Command::Portfolio(portfolio_args) => {
            let config = Config::load(home).await?;
            commands::portfolio(config, portfolio_args.clone())
                .await?
                .print()
        }

        Command::Email(email_args) => {
            let config = Config::load(home).await?;
            commands::email(config, email_args.clone(), mode)
                .await?
                .print()
        }

        Command::Jobs(jobs_args) => {
            let config = Config::load(home).await?;
            match jobs_args.entity() {
                JobsSubcommand::Add(args) => {
                    commands::jobs_add(config, args.clone()).await?.print()
                }
                JobsSubcommand::List => commands::jobs_list(config).await?.print(),
                JobsSubcommand::Remove(args) => {
                    commands::jobs_remove(config, args.clone()).await?.print()
                }
                JobsSubcommand::Enable(args) => {
                    commands::jobs_enable(config, args.clone()).await?.print()
                }
                JobsSubcommand::Disable(args) => {
                    commands::jobs_disable(config, args.clone()).await?.print()
                }
                JobsSubcommand::RunDue => commands::jobs_run_due(config, mode).await?.print(),
            }
        }

        Command::Backup => {
            let config = Config::load(home).await?;
            commands::backup(config).await?.print()
        }

        Command::Property(property_args) => {
            let config = Config::load(home).await?;
            match property_args.entity() {
                PropertySubcommand::Get(args) => {
                    commands::property_get(config, args.clone()).await?.print()
                }
                PropertySubcommand::Set(args) => {
                    commands::property_set(config, args.clone()).await?.print()
                }
                PropertySubcommand::Delete(args) => {
                    commands::property_delete(config, args.clone())
                        .await?
                        .print()
                }
                PropertySubcommand::List => commands::property_list(config).await?.print(),
            }
        }
    };
    Ok(())
}

/// Points tracing at stderr with the requested filter.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // The caller set RUST_LOG, let it win.
            EnvFilter::from_default_env()
        }
        None => {
            // Apply --log-level to this crate's targets only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
