use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

use modelmatcher::output::OutputFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Protein alignment in fasta format, "-" reads from stdin
    #[arg(value_name = "ALIGNMENT")]
    pub(super) alignment: PathBuf,

    /// Number of sequence pairs to sample, 0 uses all pairs
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub(super) sample_size: i64,

    /// Seed for pair sampling
    #[arg(long)]
    pub(super) seed: Option<u64>,

    /// Additional model in PAML format, named after the file
    #[arg(short, long, value_name = "MODEL_FILE")]
    pub(super) model: Option<PathBuf>,

    /// Directory of PAML model files (.dat, .paml) added to the built-in models
    #[arg(short = 'd', long, value_name = "DIR")]
    pub(super) model_dir: Option<PathBuf>,

    /// Comma-separated built-in models to test, all of them by default
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub(super) models: Vec<String>,

    /// Do not test models with observed amino acid frequencies (+F)
    #[arg(long)]
    pub(super) no_frequencies: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub(super) format: Format,

    /// Only rank models with their own frequencies
    #[arg(long)]
    pub(super) simple: bool,

    /// Only print the best model supported by this tool: phyml, iqtree, raxml or mrbayes
    #[arg(long, value_name = "TOOL")]
    pub(super) tool: Option<String>,

    /// More logging on stderr, repeat for debug output
    #[arg(short, long, action = ArgAction::Count)]
    pub(super) verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> OutputFormat {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    pub(super) fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}
