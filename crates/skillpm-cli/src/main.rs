use clap::Parser;
use std::process::ExitCode;

use skillpm_cli::{classify, usage_outcome, Cli, Config, Outcome, SkillpmService};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return usage_outcome(&e).into();
        }
    };

    match run(cli).await {
        Ok(()) => Outcome::Success.into(),
        Err(e) => {
            eprintln!("error: {:#}", e);
            classify(&e).into()
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    let level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    skillpm_logging::init_logging(level, config.logging.json)?;

    let service = SkillpmService::new(config, cli.skills_dirs.clone());
    service.run(cli).await
}
