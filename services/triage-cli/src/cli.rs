use crate::commands::{
    run_rules_check, run_rules_evaluate, run_suggest, run_train, RulesCheckArgs,
    RulesEvaluateArgs, SuggestArgs, TrainArgs,
};
use clap::{Parser, Subcommand};
use risk_triage::config::AppConfig;
use risk_triage::error::AppError;
use risk_triage::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "risk-triage",
    about = "Classify incident reports and inspect the triage rules from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the triage cascade on one incident payload
    Suggest(SuggestArgs),
    /// Inspect or exercise the declarative rule set
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Train the classifier on a case export and report the outcome
    Train(TrainArgs),
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Evaluate the rules against a JSON fact object
    Evaluate(RulesEvaluateArgs),
    /// Validate the configured rule source and list rules in evaluation order
    Check(RulesCheckArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    tracing::debug!(environment = ?config.environment, "configuration loaded");

    match cli.command {
        Command::Suggest(args) => run_suggest(config, args).await,
        Command::Rules {
            command: RulesCommand::Evaluate(args),
        } => run_rules_evaluate(config, args).await,
        Command::Rules {
            command: RulesCommand::Check(args),
        } => run_rules_check(config, args),
        Command::Train(args) => run_train(config, args).await,
    }
}
