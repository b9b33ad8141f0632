use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mokumoku")]
#[command(about = "LINE survey webhook for the mokumoku co-working session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: MOKUMOKU_CONFIG_PATH or ~/.mokumoku/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook server. Needs LINE_CHANNEL_SECRET and LINE_CHANNEL_TOKEN (or the config fields).
    Serve {
        /// Config file path (default: MOKUMOKU_CONFIG_PATH or ~/.mokumoku/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the X-Line-Signature for a file's bytes, using the configured channel secret.
    Sign {
        /// Config file path (default: MOKUMOKU_CONFIG_PATH or ~/.mokumoku/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// File holding the exact request body
        #[arg(value_name = "FILE")]
        body: PathBuf,
    },

    /// Print the survey reply template as JSON.
    Template,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("mokumoku {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Sign { config, body }) => {
            if let Err(e) = run_sign(config, body) {
                log::error!("sign failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Template) => {
            if let Err(e) = run_template() {
                log::error!("template failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(mokumoku::config::default_config_path);
    let dir = mokumoku::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = mokumoku::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    mokumoku::gateway::run_gateway(config).await
}

fn run_sign(config_path: Option<PathBuf>, body_path: PathBuf) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _) = mokumoku::config::load_config(config_path)?;
    let secret = mokumoku::config::resolve_line_channel_secret(&config)
        .context("LINE channel secret not configured")?;
    let body = std::fs::read(&body_path)
        .with_context(|| format!("reading {}", body_path.display()))?;
    println!("{}", mokumoku::line::signature::sign(&secret, &body));
    Ok(())
}

fn run_template() -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&mokumoku::survey::survey_template())?;
    println!("{}", json);
    Ok(())
}
