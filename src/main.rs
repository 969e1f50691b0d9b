use clap::Parser;
use ynamazon::adapters::prompt::ConsoleConfirm;
use ynamazon::app::commands;
use ynamazon::config::settings::AmazonAccount;
use ynamazon::core::retriever::RetrieverOptions;
use ynamazon::utils::error::ErrorSeverity;
use ynamazon::utils::logger;
use ynamazon::utils::validation::{validate_email, Validate};
use ynamazon::{CliConfig, Command, Settings, YnaError};

fn exit_with(e: &YnaError) -> ! {
    tracing::error!(
        "❌ yna failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn run(cli: CliConfig, mut settings: Settings) -> Result<(), YnaError> {
    match cli.command.unwrap_or(Command::Ynamazon {
        ynab_api_key: None,
        ynab_budget_id: None,
    }) {
        Command::Ynamazon {
            ynab_api_key,
            ynab_budget_id,
        } => {
            if let Some(key) = ynab_api_key {
                settings.ynab_api_key = Some(key);
            }
            if let Some(budget) = ynab_budget_id {
                settings.ynab_budget_id = Some(budget);
            }
            settings.validate()?;

            println!("🚀 Starting YNAmazon processing...");
            let report =
                commands::run_reconcile(&settings, cli.force_refresh_amazon, ConsoleConfirm::stdin())
                    .await?;
            println!(
                "✅ Done: {} updated, {} skipped, {} without a match ({} pending).",
                report.updated, report.skipped, report.unmatched, report.pending
            );
        }
        Command::PrintYnab { api_key, budget_id } => {
            if let Some(key) = api_key {
                settings.ynab_api_key = Some(key);
            }
            if let Some(budget) = budget_id {
                settings.ynab_budget_id = Some(budget);
            }
            settings.validate_ynab()?;

            if commands::print_ynab(&settings).await? == 0 {
                println!("❌ No transactions found.");
                std::process::exit(1);
            }
        }
        Command::PrintAmazon {
            user_email,
            user_password,
            years,
            days,
        } => {
            let account = match (user_email, user_password) {
                (Some(email), Some(password)) => {
                    validate_email("user_email", &email)?;
                    AmazonAccount {
                        name: "Account 1".to_string(),
                        username: email,
                        password,
                    }
                }
                (email, password) => {
                    settings.validate_amazon()?;
                    let mut account = settings.amazon_accounts[0].clone();
                    if let Some(email) = email {
                        validate_email("user_email", &email)?;
                        account.username = email;
                    }
                    if let Some(password) = password {
                        account.password = password;
                    }
                    account
                }
            };

            let options = RetrieverOptions {
                order_years: years,
                transaction_days: days.unwrap_or(settings.transaction_days),
                force_refresh: cli.force_refresh_amazon,
            };
            if commands::print_amazon(&settings, &account, options).await? == 0 {
                println!("❌ No transactions found.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // .env 不會覆蓋已存在的環境變數
    let env_loaded = dotenvy::from_path(&cli.env_file).is_ok();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            exit_with(&e);
        }
    };

    if settings.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting yna");
    if env_loaded {
        tracing::debug!("Loaded environment from {}", cli.env_file.display());
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
        tracing::debug!("Settings: {:?}", settings);
    }

    if let Err(e) = run(cli, settings).await {
        exit_with(&e);
    }

    Ok(())
}
