use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use codexu::update::platform::{ArchKey, OsKey};
use codexu::update::{self, ReleaseAsset};
use codexu::{Config, Error};

#[derive(Parser, Debug)]
#[command(name = "codexu", version)]
#[command(about = "Keep the codex CLI on its latest GitHub release", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Do not start the tool when it is already up to date
    #[arg(long, global = true)]
    no_launch: bool,

    /// Binary to replace (defaults to the one found on PATH)
    #[arg(long, value_name = "PATH", global = true)]
    install_path: Option<PathBuf>,

    /// Executable name of the managed tool
    #[arg(long, value_name = "NAME", global = true)]
    tool: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare installed and latest versions without installing
    Check,

    /// Install the latest release if the installed version differs
    Update {
        /// Reinstall even when versions match
        #[arg(long)]
        force: bool,
    },

    /// Show which of the given asset names would be downloaded
    Select {
        /// Operating system (windows, darwin, linux)
        #[arg(long, default_value = std::env::consts::OS)]
        os: String,

        /// Machine architecture (x86_64, arm64, ...)
        #[arg(long, default_value = std::env::consts::ARCH)]
        arch: String,

        /// Release asset file names
        #[arg(required = true)]
        assets: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Failure inside the update workflow, after the version check passed
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct UpdateFailed(Error);

fn failure_label(e: &anyhow::Error) -> &'static str {
    if e.is::<UpdateFailed>() {
        "Update failed:"
    } else {
        "Error:"
    }
}

fn report(e: &anyhow::Error) {
    let label = failure_label(e);
    let err = match e.downcast_ref::<UpdateFailed>() {
        Some(UpdateFailed(err)) => Some(err),
        None => e.downcast_ref::<Error>(),
    };
    match err {
        Some(err) => {
            eprintln!("{} {}", label.red(), err);
            eprintln!("  {}", err.category().advice().dimmed());
        }
        None => eprintln!("{} {:#}", label.red(), e),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if quiet { log::LevelFilter::Error } else { level })
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(path) = &cli.install_path {
        config.install_path = Some(path.clone());
    }
    if let Some(tool) = &cli.tool {
        config.tool_name = tool.clone();
    }
    if cli.no_launch {
        config.launch_when_current = false;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    match cli.command {
        None => run_default_command(&config),
        Some(Command::Check) => run_check_command(&config),
        Some(Command::Update { force }) => run_update_command(&config, force),
        Some(Command::Select { os, arch, assets }) => run_select_command(&config, &os, &arch, assets),
    }
}

fn run_default_command(config: &Config) -> Result<ExitCode> {
    let check = update::check_for_update(config)?;

    if check.needs_update(false) {
        update::update(config, &check).map_err(UpdateFailed)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{} {} is up to date ({})",
        "✓".green(),
        config.tool_name,
        check.installed
    );
    if !config.launch_when_current {
        return Ok(ExitCode::SUCCESS);
    }

    println!("Starting {}...", config.tool_name);
    let code = update::launch(&update::tool_program(config))?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn run_check_command(config: &Config) -> Result<ExitCode> {
    let check = update::check_for_update(config)?;

    if check.is_up_to_date() {
        println!(
            "{} {} is up to date ({})",
            "✓".green(),
            config.tool_name,
            check.installed
        );
    } else {
        println!(
            "{} New version available: {} → {} ({})",
            "↑".yellow(),
            check.installed.to_string().dimmed(),
            check.latest.version.to_string().green(),
            check.latest.tag
        );
        println!("  Run `codexu update` to install");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_update_command(config: &Config, force: bool) -> Result<ExitCode> {
    let check = update::check_for_update(config)?;

    if !check.needs_update(force) {
        println!(
            "{} {} is up to date ({})",
            "✓".green(),
            config.tool_name,
            check.installed
        );
        return Ok(ExitCode::SUCCESS);
    }

    update::update(config, &check).map_err(UpdateFailed)?;
    Ok(ExitCode::SUCCESS)
}

fn run_select_command(config: &Config, os: &str, arch: &str, names: Vec<String>) -> Result<ExitCode> {
    let os = OsKey::from_system(os);
    let arch = ArchKey::from_machine(arch);
    let assets: Vec<ReleaseAsset> = names
        .into_iter()
        .map(|name| ReleaseAsset::new(name, String::new()))
        .collect();

    match config.selector().select_with_group(&assets, os, arch.as_ref()) {
        Some((group, asset)) => {
            println!("{} {}", "→".green(), asset.name.bold());
            println!("  {}", format!("matched by {:?}", group).dimmed());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{}", "No assets given".dimmed());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_label_follows_phase() {
        let during_update = anyhow::Error::from(UpdateFailed(Error::ToolNotFound("codex".into())));
        assert_eq!(failure_label(&during_update), "Update failed:");

        let during_check = anyhow::Error::from(Error::ToolNotFound("codex".into()));
        assert_eq!(failure_label(&during_check), "Error:");

        let other = anyhow::anyhow!("bad config");
        assert_eq!(failure_label(&other), "Error:");
    }
}
