use crate::cli::args::{Cli, Commands, DatabaseArgs};
use crate::config::LoaderConfig;
use crate::processors::{discover_archives, ParallelProcessor};
use crate::utils::constants::ROW_COUNT_SQL;
use crate::utils::progress::ProgressReporter;
use crate::writers::{create_database, open_connection, query_results};
use anyhow::Context;
use std::path::Path;
use tracing::info;
use validator::Validate;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Load {
            input_dir,
            db,
            batch_size,
            min_workers,
            json,
            quiet,
        } => {
            let mut config = resolve_config(&db)?;
            if let Some(batch_size) = batch_size {
                config = config.with_batch_size(batch_size);
            }
            if let Some(min_workers) = min_workers {
                config = config.with_min_workers(min_workers);
            }
            config.validate().context("Invalid loader configuration")?;

            load(&input_dir, config, json, quiet)
        }
        Commands::Query { sql, db } => {
            let config = resolve_config(&db)?;
            print_query(&config, &sql)
        }
    }
}

/// Defaults, config file and environment, then the `--database` override.
fn resolve_config(args: &DatabaseArgs) -> anyhow::Result<LoaderConfig> {
    let mut config = LoaderConfig::load(args.config.as_deref())
        .context("Unable to load configuration")?;

    if let Some(ref path) = args.database {
        config = config.with_database_path(path.display().to_string());
    }

    Ok(config)
}

fn load(input_dir: &Path, config: LoaderConfig, json: bool, quiet: bool) -> anyhow::Result<()> {
    info!(input = %input_dir.display(), database = %config.database.path, "Loading IGRA archives");

    let conn = open_connection(&config.database)
        .with_context(|| format!("Unable to open database {}", config.database.path))?;
    create_database(&conn).context("Unable to create the igra_data table")?;

    let archives = discover_archives(input_dir, &config.ingest.archive_suffix)
        .with_context(|| format!("Unable to list archives in {}", input_dir.display()))?;
    info!(count = archives.len(), "Found archives");

    let progress = ProgressReporter::new(archives.len() as u64, "Loading IGRA archives...", quiet);
    let processor = ParallelProcessor::new(config);
    let report = processor.process_archives(&archives, Some(&progress))?;
    progress.finish_with_message(&format!(
        "Loaded {} of {} archives",
        report.files_processed, report.files_found
    ));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", report.generate_summary());
    }

    for row in query_results(&conn, ROW_COUNT_SQL)? {
        println!("{}", row);
    }

    Ok(())
}

fn print_query(config: &LoaderConfig, sql: &str) -> anyhow::Result<()> {
    let conn = open_connection(&config.database)
        .with_context(|| format!("Unable to open database {}", config.database.path))?;

    for row in query_results(&conn, sql).with_context(|| format!("Query failed: {}", sql))? {
        println!("{}", row);
    }

    Ok(())
}
