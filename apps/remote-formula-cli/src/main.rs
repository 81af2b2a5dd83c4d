//! `remote-formula`: run formulas on a remote execution service.
//!
//! Run with: cargo run -p remote-formula-cli -- exec

mod prompt;

use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use remote_formula_client::{
    ApiClient, ClientConfig,
    config::{DEFAULT_BASE_URL, DEFAULT_ORG},
};
use remote_formula_core::{Context, ExecutionId, Prompter};
use remote_formula_runner::{
    CheckOutcome, ConsoleSink, Credentials, ExecOptions, ExecOutcome, FormulaRunner, PollConfig,
    presenter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::prompt::TerminalPrompter;

#[derive(Debug, Parser)]
#[command(name = "remote-formula", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Base URL of the execution service
    #[arg(long, global = true, env = "REMOTE_FORMULA_HOST", default_value = DEFAULT_BASE_URL)]
    host: String,

    /// Organization sent with every request
    #[arg(long, global = true, env = "REMOTE_FORMULA_ORG", default_value = DEFAULT_ORG)]
    org: String,

    /// Login name; prompted for when absent
    #[arg(long, global = true, env = "USERNAME")]
    username: Option<String>,

    /// Login password; prompted for when absent
    #[arg(long, global = true, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pick a formula, submit it and wait for the result
    Exec {
        /// Seconds to wait for the result before giving up
        #[arg(long, env = "POLL_BUDGET_SECS", default_value_t = 60)]
        budget: u64,

        /// Seconds between status checks
        #[arg(long, env = "POLL_CADENCE_SECS", default_value_t = 6)]
        cadence: u64,

        /// Send the local address as an `IPAddr` input
        #[arg(long)]
        tag_origin: bool,

        /// Never run two status checks at once
        #[arg(long)]
        coalesce: bool,
    },
    /// Show the result of an earlier execution
    Check {
        #[arg(long, env = "EXECUTION_ID")]
        execution_id: String,

        #[arg(long, env = "CONTEXT")]
        context: String,
    },
    /// Store a provider credential
    SetCredential {
        /// Provider name, e.g. github or aws
        #[arg(long, env = "PROVIDER")]
        provider: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn credentials(global: &GlobalArgs, prompter: &dyn Prompter) -> Result<Credentials> {
    let username = match &global.username {
        Some(username) => username.clone(),
        None => prompter.text("Username", true)?,
    };
    let password = match &global.password {
        Some(password) => password.clone(),
        None => prompter.password("Password")?,
    };
    Ok(Credentials::new(username, password))
}

async fn run(cli: Cli) -> Result<()> {
    let client = ApiClient::new(ClientConfig::new(&cli.global.host).org(&cli.global.org))?;
    let prompter = TerminalPrompter;
    let sink = Arc::new(ConsoleSink);

    match cli.command {
        Command::Exec {
            budget,
            cadence,
            tag_origin,
            coalesce,
        } => {
            let poll = PollConfig {
                coalesce_attempts: coalesce,
                ..PollConfig::with_timing(Duration::from_secs(budget), Duration::from_secs(cadence))
            };
            let runner = FormulaRunner::new(client, poll, sink)?;
            let credentials = credentials(&cli.global, &prompter)?;

            match runner
                .exec_formula(&credentials, &prompter, ExecOptions { tag_origin })
                .await?
            {
                ExecOutcome::Completed(report) => println!("{}", presenter::render_report(&report)),
                ExecOutcome::TimedOut {
                    execution_id,
                    context,
                } => println!("{}", presenter::render_timed_out(&execution_id, &context)),
            }
        }
        Command::Check {
            execution_id,
            context,
        } => {
            let runner = FormulaRunner::new(client, PollConfig::default(), sink)?;
            let credentials = credentials(&cli.global, &prompter)?;

            match runner
                .check_execution(
                    &credentials,
                    &ExecutionId::new(execution_id),
                    &Context::new(context),
                )
                .await?
            {
                CheckOutcome::Ready(report) => println!("{}", presenter::render_check(&report)),
                CheckOutcome::NotReady => println!("{}", presenter::NOT_READY_MESSAGE),
            }
        }
        Command::SetCredential { provider } => {
            let runner = FormulaRunner::new(client, PollConfig::default(), sink)?;
            let credentials = credentials(&cli.global, &prompter)?;

            runner
                .set_credential(&credentials, &prompter, &provider)
                .await?;
            println!("Credential for {provider} stored");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
