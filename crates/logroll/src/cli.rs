//! CLI argument definitions

use clap::Parser;
use logroll_core::{constants, CompressionKind, RotatorConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logroll")]
#[command(version, about = "Write stdin to a log file, rotating it by size")]
pub struct Cli {
    /// Log file to write
    pub path: PathBuf,

    /// Rotation threshold in kilobytes
    #[arg(short, long = "size", value_name = "KB", default_value_t = constants::DEFAULT_THRESHOLD_KB)]
    pub size_kb: u64,

    /// Also copy input to stdout
    #[arg(short, long)]
    pub tee: bool,

    /// Number of backups to keep (0 or negative keeps all)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub keep: i64,

    /// Backup compression: gzip or none
    #[arg(short, long, default_value = "gzip", value_parser = parse_compression)]
    pub compress: CompressionKind,

    /// Suffix for compressed backups (default: gz)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Gzip compression level (0-9)
    #[arg(long, default_value_t = constants::DEFAULT_GZIP_LEVEL)]
    pub level: u32,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Build the rotator config described by the arguments
    pub fn config(&self) -> RotatorConfig {
        let mut config = RotatorConfig::new(&self.path)
            .threshold_kb(self.size_kb)
            .tee(self.tee)
            .max_backups_signed(self.keep)
            .compression(self.compress)
            .gzip_level(self.level);
        if let Some(suffix) = &self.suffix {
            config = config.suffix(suffix.as_str());
        }
        config
    }
}

fn parse_compression(s: &str) -> Result<CompressionKind, String> {
    s.parse::<CompressionKind>().map_err(|e| e.to_string())
}
