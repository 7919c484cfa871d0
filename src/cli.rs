use crate::list_model::GroupBy;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(long, value_parser, default_value_t = false)]
    pub verbose: bool,

    #[clap(long, value_parser)]
    pub log: Option<PathBuf>,

    #[clap(long, value_parser)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one search and print the grouped results
    Search {
        library: PathBuf,

        query: String,

        #[clap(long, value_parser, default_value_t = false)]
        pinned_only: bool,

        #[clap(long, value_enum)]
        group_by: Option<GroupBy>,

        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[clap(long, value_parser, default_value_t = false)]
        metrics: bool,
    },
    /// Read queries from stdin and re-search as they arrive
    Interactive {
        library: PathBuf,

        #[clap(long, value_parser, default_value_t = false)]
        pinned_only: bool,

        #[clap(long, value_enum)]
        group_by: Option<GroupBy>,
    },
    /// Print shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
