use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "igra-loader")]
#[command(about = "Parallel loader for IGRA radiosonde sounding archives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every zip archive of a directory into the igra_data table
    Load {
        #[arg(short, long, help = "Directory containing IGRA zip archives")]
        input_dir: PathBuf,

        #[command(flatten)]
        db: DatabaseArgs,

        #[arg(long, help = "Unflushed data lines that trigger a commit")]
        batch_size: Option<usize>,

        #[arg(long, help = "Minimum number of worker threads")]
        min_workers: Option<usize>,

        #[arg(long, default_value = "false", help = "Print the load report as JSON")]
        json: bool,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Run a query against the database and print each row
    Query {
        #[arg(short, long, help = "SQL statement to run")]
        sql: String,

        #[command(flatten)]
        db: DatabaseArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    #[arg(short, long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "SQLite database file [default: igra.db]")]
    pub database: Option<PathBuf>,
}
