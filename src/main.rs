mod collect;
mod db;
mod error;
mod fallback;
mod loader;
mod output;
mod parser;
mod record;
mod settings;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use collect::Mode;
use record::EntryType;
use settings::Settings;

#[derive(Parser)]
#[command(name = "cantodict", about = "Cantodict HTML scrapes to dictionary records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from per-entry detail pages
    Detail {
        #[command(flatten)]
        args: ExtractArgs,
    },
    /// Extract records from summary listing pages
    Summary {
        #[command(flatten)]
        args: ExtractArgs,
    },
    /// Load the extracted JSON files into SQLite
    Sqlite {
        /// Export summary-mode output instead of detail-mode
        #[arg(short, long)]
        summary: bool,
        /// Database file (default from settings)
        #[arg(long = "db")]
        database: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Pages or directories to process; the merged records are printed as JSON.
    /// Without paths, `<data_dir>/<mode>/<type>s` is processed into `<output_dir>`.
    paths: Vec<PathBuf>,
    /// Process documents one at a time
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Detail { args } => extract(Mode::Detail, args, &settings),
        Commands::Summary { args } => extract(Mode::Summary, args, &settings),
        Commands::Sqlite { summary, database } => {
            let mode = if summary { Mode::Summary } else { Mode::Detail };
            let path = database.unwrap_or_else(|| settings.database.clone());
            export_sqlite(mode, path, &settings)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn extract(mode: Mode, args: ExtractArgs, settings: &Settings) -> Result<()> {
    let explicit = !args.paths.is_empty();
    let roots = if explicit {
        args.paths
    } else {
        let base = settings.data_dir.join(mode.as_str());
        EntryType::ALL
            .iter()
            .map(|t| base.join(t.plural()))
            .filter(|dir| {
                let exists = dir.is_dir();
                if !exists {
                    warn!(dir = %dir.display(), "No such data directory, skipping");
                }
                exists
            })
            .collect()
    };

    let files = loader::discover(&roots)?;
    if files.is_empty() {
        info!("No pages found");
    } else {
        info!("Processing {} {} pages", files.len(), mode);
    }

    let report = collect::collect(&files, mode, settings.parallel && !args.sequential);
    info!(
        records = report.collection.len(),
        documents = report.documents,
        failures = report.failures.len(),
        fallbacks = report.fallbacks,
        "Extraction finished"
    );

    if report.collection.is_empty() {
        warn!("No records extracted");
    }
    if !report.failures.is_empty() {
        let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
        let mut failed_files = BTreeSet::new();
        for failure in &report.failures {
            *by_kind.entry(failure.error.kind()).or_default() += 1;
            failed_files.insert(&failure.path);
        }
        warn!(files = failed_files.len(), "Skipped {} documents or rows: {:?}", report.failures.len(), by_kind);
    }

    if explicit {
        output::print_collection(&report.collection)?;
    } else {
        for path in output::write_collection(&settings.output_dir, mode, &report.collection)? {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn export_sqlite(mode: Mode, path: PathBuf, settings: &Settings) -> Result<()> {
    let data = EntryType::ALL
        .iter()
        .map(|&t| Ok((t, output::read_entries(&settings.output_dir, mode, t)?)))
        .collect::<Result<Vec<_>>>()?;

    let conn = db::connect(&path)?;
    db::init_schema(&conn, mode)?;
    let counts = db::export(&conn, mode, data.iter().map(|(t, entries)| (*t, entries)))?;
    println!(
        "Saved {} entries ({} skipped), {} variants, {} similars, {} related links to {}.",
        counts.entries,
        counts.skipped,
        counts.variants,
        counts.similars,
        counts.related,
        path.display()
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
