use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hoaxcorpus",
    version,
    about = "Integrate and deduplicate scraped news and fact-check tables into a labelled corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Integrate(IntegrateArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IntegrateArgs {
    #[arg(long, default_value = "data/raw/news/AllMetadata_Cleaned_v3.csv")]
    pub news_csv: PathBuf,

    #[arg(
        long,
        default_value = "data/raw/turnbackhoax/metadata/tbh_BERSIH_POLITIK_SAJA.csv"
    )]
    pub fact_check_csv: PathBuf,

    #[arg(long, default_value = "data/processed")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Estimated Jaccard similarity at or above which a record counts as a near duplicate.
    #[arg(long, default_value_t = 0.95)]
    pub similarity_threshold: f64,

    #[arg(long, default_value_t = 128)]
    pub num_perm: usize,

    #[arg(long, default_value_t = 5)]
    pub shingle_size: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 50)]
    pub min_text_chars: usize,

    #[arg(long, default_value_t = 20)]
    pub min_title_chars: usize,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/processed/dataset_manifest.json")]
    pub manifest_path: PathBuf,
}
