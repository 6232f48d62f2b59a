//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::archive::JsonLinesArchive;
use crate::bulletin::create_bulletin_registry;
use crate::catalog::HttpCatalog;
use crate::config::{ParseFailurePolicy, SyncConfig};
use crate::error::{HarvesterError, Result};
use crate::sync::{SyncReport, SyncRequest, Synchronizer};
use crate::types::{Encoding, Family};

/// Default archive file for `sync`.
const DEFAULT_ARCHIVE: &str = "iers-archive.jsonl";

/// IERS Harvester - Extract bulletin metadata and discover new bulletins.
#[derive(Parser)]
#[command(name = "iers-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover bulletins missing from the archive and record them.
    Sync {
        /// Families to synchronize (A, B, C, D; default: all)
        families: Vec<Family>,

        /// Bulletin encoding to look for: text or xml
        #[arg(long)]
        encoding: Option<Encoding>,

        /// Maximum requests per minute, 0 disables throttling
        #[arg(long)]
        rate_limit: Option<u32>,

        /// Base URL of the data center
        #[arg(long)]
        base_url: Option<String>,

        /// JSON Lines archive file
        #[arg(long, default_value = DEFAULT_ARCHIVE)]
        archive: PathBuf,

        /// Download found bulletins into this directory and extract their dates
        #[arg(long)]
        download: Option<PathBuf>,

        /// What to do with downloaded bulletins that cannot be parsed: abort or skip
        #[arg(long)]
        on_parse_error: Option<ParseFailurePolicy>,

        /// First index to synchronize (not supported)
        #[arg(long)]
        start: Option<String>,

        /// Last index to synchronize (not supported)
        #[arg(long)]
        end: Option<String>,

        /// Re-synchronize indices already archived (not supported)
        #[arg(long)]
        force: bool,
    },

    /// Extract the metadata of a local bulletin file.
    Analyze {
        /// Bulletin file, e.g. bulletinb-443.txt
        path: PathBuf,

        /// Only use the file name, do not read the content
        #[arg(long)]
        filename_only: bool,

        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            families,
            encoding,
            rate_limit,
            base_url,
            archive,
            download,
            on_parse_error,
            start,
            end,
            force,
        } => {
            let request = SyncRequest {
                families,
                start,
                end,
                force,
            };
            // Environment first, flags override.
            let mut config = SyncConfig::from_env()?;
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url)?;
            }
            if let Some(encoding) = encoding {
                config = config.with_encoding(encoding);
            }
            if let Some(rate_limit) = rate_limit {
                config = config.with_rate_limit(rate_limit);
            }
            if let Some(policy) = on_parse_error {
                config = config.with_parse_failure_policy(policy);
            }
            if let Some(dir) = download {
                config = config.with_download_dir(dir);
            }
            sync_command(&request, config, &archive)
        }
        Commands::Analyze {
            path,
            filename_only,
            json,
        } => analyze_command(&path, filename_only, json),
    }
}

/// Execute the sync command.
fn sync_command(request: &SyncRequest, config: SyncConfig, archive_path: &Path) -> Result<()> {
    // Reject unsupported options before touching the archive or the network.
    request.ensure_supported()?;

    let mut archive = JsonLinesArchive::open(archive_path)?;
    let registry = create_bulletin_registry();
    let catalog = HttpCatalog::new()?;

    println!(
        "{} {} ({} bulletins, archive {})",
        style("Synchronizing").bold(),
        style(&config.base_url).cyan(),
        config.encoding.as_str(),
        style(archive_path.display()).green()
    );
    println!();

    let synchronizer = Synchronizer::new(&registry, catalog, config);

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Probing the remote catalog...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = synchronizer.run(&mut archive, request);
    pb.finish_and_clear();

    print_report(&result?);
    Ok(())
}

fn print_report(report: &SyncReport) {
    for family in &report.families {
        println!(
            "  {}: {} new, stopped at {}",
            style(family.family.product_type()).bold(),
            style(family.created.len()).green(),
            family.stopped_at
        );
        if !family.skipped_gaps.is_empty() {
            println!("    Known gaps skipped: {}", family.skipped_gaps.len());
        }
        if !family.skipped_unparseable.is_empty() {
            println!(
                "    Unparseable: {}",
                style(family.skipped_unparseable.len()).yellow().bold()
            );
        }
    }
    println!();
    println!(
        "{} {} record(s)",
        style("Archived").green().bold(),
        report.total_created()
    );
}

/// Execute the analyze command.
fn analyze_command(path: &Path, filename_only: bool, json: bool) -> Result<()> {
    let registry = create_bulletin_registry();
    let format = registry.identify(&[path]).ok_or_else(|| {
        HarvesterError::InvalidInput(format!(
            "'{}' is not a recognised IERS bulletin file name",
            path.display()
        ))
    })?;

    if !filename_only && !path.is_file() {
        return Err(HarvesterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File does not exist: {}", path.display()),
        )));
    }

    let record = format.extract_metadata(&[path], !filename_only)?;

    let output = if json {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_yaml_ng::to_string(&record)?
    };
    println!("{}", output.trim_end());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sync_defaults() {
        let cli = Cli::parse_from(["iers-harvester", "sync"]);

        let Commands::Sync {
            families,
            encoding,
            archive,
            force,
            ..
        } = cli.command
        else {
            panic!("expected sync");
        };
        assert!(families.is_empty());
        assert!(encoding.is_none());
        assert_eq!(archive, PathBuf::from(DEFAULT_ARCHIVE));
        assert!(!force);
    }

    #[test]
    fn test_cli_parse_sync_with_options() {
        let cli = Cli::parse_from([
            "iers-harvester",
            "sync",
            "B",
            "iers_c",
            "--encoding",
            "text",
            "--rate-limit",
            "0",
            "--on-parse-error",
            "skip",
        ]);

        let Commands::Sync {
            families,
            encoding,
            rate_limit,
            on_parse_error,
            ..
        } = cli.command
        else {
            panic!("expected sync");
        };
        assert_eq!(families, vec![Family::B, Family::C]);
        assert_eq!(encoding, Some(Encoding::Text));
        assert_eq!(rate_limit, Some(0));
        assert_eq!(on_parse_error, Some(ParseFailurePolicy::Skip));
    }

    #[test]
    fn test_cli_rejects_unknown_family() {
        assert!(Cli::try_parse_from(["iers-harvester", "sync", "E"]).is_err());
    }

    #[test]
    fn test_cli_parse_analyze() {
        let cli = Cli::parse_from(["iers-harvester", "analyze", "bulletinb-443.txt", "--json"]);

        let Commands::Analyze {
            path,
            filename_only,
            json,
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(path, PathBuf::from("bulletinb-443.txt"));
        assert!(!filename_only);
        assert!(json);
    }
}
