use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tokio::runtime::{self, Runtime};

mod config;
mod error;
mod logging;
mod name;
mod pipeline;
mod utils;

use crate::config::{Config, Options};
use crate::error::PipelineError;
use crate::pipeline::ConversionPipeline;
use crate::utils::http::HttpFetcher;

/// Fetch an image from a URL and save it under a normalized name
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of the source image
    url: String,

    /// Output base name (defaults to the URL's file name without extension)
    #[arg(long)]
    name: Option<String>,

    /// JPEG quality, ignored for gif and png
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Output format: gif, jpg or png
    #[arg(long, default_value = "jpg")]
    format: String,

    /// Output directory (defaults to ~/img)
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        Self {
            dir: args.dir,
            name: args.name,
            format: args.format,
            quality: args.quality,
        }
    }
}

/// One conversion, one thread.
fn build_runtime() -> std::io::Result<Runtime> {
    runtime::Builder::new_current_thread().enable_all().build()
}

async fn convert(
    source: &str,
    options: &Options,
    config: &Config,
) -> Result<PathBuf, PipelineError> {
    let fetcher = HttpFetcher::new()?;
    ConversionPipeline::new(fetcher, config)
        .run(source, options)
        .await
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    logging::init_logging();

    let config = Config::from_env();
    let source = args.url.clone();
    let options = Options::from(args);

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("wimg: failed to start runtime: {}", err);
            process::exit(1);
        }
    };

    match runtime.block_on(convert(&source, &options, &config)) {
        Ok(path) => println!("{}", path.display()),
        Err(err) => {
            eprintln!("wimg: {}", err);
            process::exit(1);
        }
    }
}
