use bookshelf::commands::{self, Command};
use bookshelf::config::Config;
use bookshelf::BookApi;
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(about = "Manage a remote book catalog from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./bookshelf.yaml or $XDG_CONFIG_HOME/bookshelf/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog server URL, overrides the config file and BOOKSHELF_URL
  #[arg(short, long)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  // Logs go to stderr so command output stays clean on stdout
  let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("BOOKSHELF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(writer)
    .init();

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Override server if specified on command line
  if let Some(url) = args.url {
    config.server.url = url;
  }

  let api = BookApi::from_config(&config)?;
  let mut stdout = std::io::stdout().lock();
  commands::run(&api, args.command, &mut stdout).await?;

  Ok(())
}
