//! pillarscore CLI — score pillar diagnostics and share the results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pillarscore",
    version,
    about = "Pillar diagnostic scoring and bottleneck analysis"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an answer set and record the diagnostic
    Score {
        /// Form definition (.toml); defaults to `default_form` from the config
        #[arg(long)]
        form: Option<PathBuf>,

        /// Answer set (.json or .toml table of question id = points)
        #[arg(long)]
        answers: PathBuf,

        /// Respondent id; omit for an anonymous response
        #[arg(long)]
        user: Option<String>,

        /// Compute and print only, do not record
        #[arg(long)]
        no_save: bool,

        /// Also write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show a recorded diagnostic by its share token
    Show {
        /// Share token
        #[arg(long)]
        token: String,

        /// Form definition used to label the result
        #[arg(long)]
        form: Option<PathBuf>,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List recorded responses for a form or a user
    Responses {
        /// Form definition (.toml)
        #[arg(long, conflicts_with = "user")]
        form: Option<PathBuf>,

        /// Respondent id
        #[arg(long)]
        user: Option<String>,
    },

    /// Validate form definition files
    Validate {
        /// Path to form file or directory
        #[arg(long)]
        form: PathBuf,
    },

    /// Create starter config and the three-pillar form
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pillarscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Score {
            form,
            answers,
            user,
            no_save,
            output,
            format,
        } => {
            commands::score::execute(
                config,
                form,
                answers,
                user,
                no_save,
                output,
                format,
            )
            .await
        }
        Commands::Show {
            token,
            form,
            format,
        } => commands::show::execute(config, token, form, format).await,
        Commands::Responses { form, user } => {
            commands::responses::execute(config, form, user).await
        }
        Commands::Validate { form } => commands::validate::execute(form),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
