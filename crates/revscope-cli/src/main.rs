mod crawl;
mod eda;
mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revscope_core::ReviewSite;
use revscope_processing::TableChart;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revscope-cli")]
#[command(about = "Review crawling, cleaning and analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a captured review feed through the scroll loop and save the reviews
    Crawl {
        /// JSON capture of the review feed
        #[arg(long)]
        capture: PathBuf,
        /// Site the capture was taken from (google, kakao, tripdotcom)
        #[arg(long)]
        site: ReviewSite,
        /// Stop once this many reviews are loaded (overrides `REVSCOPE_CRAWL_TARGET`)
        #[arg(long)]
        target: Option<usize>,
        /// Reviews revealed per scroll
        #[arg(long, default_value = "20")]
        page_size: usize,
        /// Treat the capture as a feed that never shows an end marker
        #[arg(long)]
        no_end_signal: bool,
        /// Directory for `reviews_<site>.csv` (overrides `REVSCOPE_OUTPUT_DIR`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Clean a raw review table and write the processed table and embeddings
    Process {
        #[arg(long)]
        site: ReviewSite,
        /// Raw review table (CSV)
        #[arg(long)]
        input: PathBuf,
        /// Overrides `REVSCOPE_OUTPUT_DIR`
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Skip the TF-IDF matrix even if the site profile enables it
        #[arg(long)]
        no_embeddings: bool,
        /// YAML file with site profile overrides
        #[arg(long)]
        sites_config: Option<PathBuf>,
    },
    /// Write PNG charts (with CSV data) for processed tables or embedding matrices
    Eda {
        /// Processed tables (or embedding matrices with `--embeddings`)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Comma-separated charts: rating, length, month, weekday
        #[arg(long, value_delimiter = ',')]
        charts: Option<Vec<TableChart>>,
        /// Inputs are TF-IDF embedding matrices, compared together
        #[arg(long)]
        embeddings: bool,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = revscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Crawl {
            capture,
            site,
            target,
            page_size,
            no_end_signal,
            output_dir,
        }) => {
            let mut crawl_config = config.crawl.clone();
            if let Some(target) = target {
                crawl_config.target_count = target;
            }
            let mut pipeline = config.pipeline.clone();
            if let Some(dir) = output_dir {
                pipeline.output_dir = dir;
            }
            let options = crawl::CrawlOptions {
                capture,
                site,
                page_size,
                end_signal: !no_end_signal,
            };
            crawl::run_crawl(&options, &crawl_config, &pipeline).await?;
        }
        Some(Commands::Process {
            site,
            input,
            output_dir,
            no_embeddings,
            sites_config,
        }) => {
            let mut pipeline = config.pipeline.clone();
            if let Some(dir) = output_dir {
                pipeline.output_dir = dir;
            }
            let mut profile = process::resolve_profile(site, sites_config.as_deref())?;
            if no_embeddings {
                profile.embeddings = false;
            }
            process::run_process(profile, pipeline, &input)?;
        }
        Some(Commands::Eda {
            inputs,
            charts,
            embeddings,
            output_dir,
        }) => {
            let options = eda::build_options(charts, output_dir);
            eda::run_eda(&inputs, embeddings, &options)?;
        }
        None => println!("no command given; see `revscope-cli --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
