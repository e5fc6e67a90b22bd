use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use vk_harvest::config::Config;
use vk_harvest::export::Exporter;
use vk_harvest::harvest::Harvester;
use vk_harvest::logging;
use vk_harvest::vk::CachedVkClient;

#[derive(Parser, Debug)]
#[command(name = "vk-harvest")]
#[command(about = "Harvest VK profiles, groups and wall engagement into CSV files")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./vk-harvest.yaml or $XDG_CONFIG_HOME/vk-harvest/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// User id or screen name to harvest (repeatable, replaces the configured list)
  #[arg(short, long = "user")]
  users: Vec<String>,

  /// Directory the CSV files are written to
  #[arg(short, long)]
  output_dir: Option<PathBuf>,

  /// Number of groups per user to scan for engagement
  #[arg(short, long)]
  group_limit: Option<usize>,

  /// Also export each user's audio list
  #[arg(long)]
  audio: bool,
}

impl Args {
  fn apply(self, mut config: Config) -> Config {
    if !self.users.is_empty() {
      config.harvest.user_ids = self.users;
    }
    if let Some(dir) = self.output_dir {
      config.harvest.output_dir = dir;
    }
    if let Some(limit) = self.group_limit {
      config.harvest.group_limit = limit;
    }
    config.harvest.fetch_audio |= self.audio;
    config
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let config = args.apply(config);

  let _log_guard = logging::init(&config.log)?;

  let client = CachedVkClient::new(&config)?;
  let mut exporter = Exporter::create(&config.harvest.output_dir, config.harvest.fetch_audio)?;

  let harvester = Harvester::new(client, config.harvest.clone());
  let summary = harvester.run(&mut exporter).await?;
  exporter.flush()?;

  info!(
    output_dir = %config.harvest.output_dir.display(),
    users = summary.users,
    groups = summary.groups,
    activity_records = summary.activity_records,
    "export written"
  );

  Ok(())
}
