use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "comment-feed",
    about = "Watch comments change in an in-memory context",
    version
)]
pub struct Cli {
    /// Number of comments to seed the discussion with
    #[arg(short, long, default_value_t = 3)]
    pub comments: usize,

    /// Identifier of the comment the entity observer follows
    #[arg(long, default_value = "C1")]
    pub watch: String,

    /// Ignore insertions; report only updates and deletions
    #[arg(long)]
    pub updates_only: bool,

    /// Mirror configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
