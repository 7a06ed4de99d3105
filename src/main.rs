use anyhow::Result;
use clap::{CommandFactory, Parser};
use emoverlay::app::{OverlayArgs, run_overlay_command, run_probe_command};
use emoverlay::cli::{Cli, Commands, ConfigAction};
use emoverlay::config::Config;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        None => {
            let Some(input) = cli.input else {
                Cli::command().print_help()?;
                std::process::exit(2);
            };
            let config = load_config(cli.config.as_deref())?;
            let args = OverlayArgs {
                input,
                output: cli.output,
                videos_dir: cli.videos_dir,
                sample: cli.sample,
                limit: cli.limit,
                window: cli.window,
                min_conf: cli.min_conf,
                hold_frames: cli.hold_frames,
                icons: cli.icons,
                classifier_url: cli.classifier_url,
                join_timeout: cli.join_timeout,
                json: cli.json,
                quiet: cli.quiet,
                verbosity: cli.verbose,
            };
            run_overlay_command(config, args).await?;
        }
        Some(Commands::Probe { input }) => {
            run_probe_command(&input, &cli.videos_dir, cli.json)?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "emoverlay", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-q` shows errors only and each `-v`
/// raises the level one step from `info`.
fn init_logging(quiet: bool, verbosity: u8) {
    let level = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("emoverlay={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/emoverlay/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
        ConfigAction::Init { force } => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml_string()?)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
    }
    Ok(())
}
