use crate::types::{LogLevel, OutputFormat, SortField};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "precos")]
#[command(about = "Consult public purchase prices by product, territory, and year", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the config file")]
    pub config: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive query session (default)
    Query,

    /// One-shot product lookup
    Products {
        #[arg(long)]
        term: String,
    },

    /// List planning regions
    Regions,

    /// List municipalities, optionally scoped to one region
    Municipalities {
        #[arg(long)]
        region: Option<String>,
    },

    /// One-shot price history for a product
    History {
        #[arg(long, help = "Product id")]
        product: String,

        #[arg(long, value_delimiter = ',', help = "Scope to these region codes")]
        regions: Option<Vec<String>>,

        #[arg(
            long,
            value_delimiter = ',',
            conflicts_with = "regions",
            help = "Scope to these municipality codes"
        )]
        municipalities: Option<Vec<String>>,

        #[arg(long, help = "Restrict to one purchase year")]
        year: Option<String>,

        #[arg(long, default_value = "date")]
        sort: SortField,

        #[arg(long)]
        desc: bool,

        #[arg(long, help = "Write the records to a CSV file")]
        csv: Option<PathBuf>,

        #[arg(long, help = "Print the export URL instead of the records")]
        url: bool,
    },
}
