mod cli;
mod cmd;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskform::config::Config;

use cli::Cli;
use cmd::*;

/// Log to stderr so command output stays machine readable.
fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if cli.assignee_nullable {
        config.schema.config.assignee_nullable = true;
    }

    match cli.command {
        Commands::Check { record, sets, all, json } => cmd_check(&config, record, sets, all, json),
        Commands::Submit { record, sets, output } => cmd_submit(&config, record, sets, output),
        Commands::Replay { record, events } => cmd_replay(&config, record, events),
        Commands::Templates => cmd_templates(&config),
        Commands::Rules => cmd_rules(&config),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}
