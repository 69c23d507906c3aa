use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::Level;
use unmap_core::{run_decoder, run_downloader, DecoderOptions, DownloadOptions, LogReporter, MapUrlMode};

#[derive(Parser)]
#[command(version, about = "Rebuild original source trees from JavaScript source maps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode source maps into directory trees
    Decode {
        /// A .map file or a directory containing .map files
        #[arg(short = 'I', long, value_name = "PATH")]
        input: PathBuf,

        /// Directory receiving one sub-directory per bundle
        #[arg(short = 'O', long, value_name = "DIR", default_value = "output")]
        output: PathBuf,
    },
    /// Download source maps listed in a file of URLs
    Download {
        /// File with one URL per line
        #[arg(short = 'I', long, value_name = "FILE")]
        input: PathBuf,

        /// Regular expression a URL must match to be downloaded
        #[arg(short = 'F', long, default_value = "")]
        filter: String,

        /// What the listed URLs point at
        #[arg(short = 'T', long = "type", value_enum, default_value_t = UrlType::Auto)]
        url_type: UrlType,

        /// Directory the maps are saved to
        #[arg(short = 'O', long, value_name = "DIR", default_value = "maps_files")]
        output: PathBuf,

        /// Number of parallel downloads
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UrlType {
    Js,
    Map,
    Auto,
}

impl From<UrlType> for MapUrlMode {
    fn from(value: UrlType) -> Self {
        match value {
            UrlType::Js => MapUrlMode::Js,
            UrlType::Map => MapUrlMode::Map,
            UrlType::Auto => MapUrlMode::Auto,
        }
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let tag = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARNING",
                Level::Info => "INFO",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };
            writeln!(buf, "[{tag}] {}", record.args())
        })
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    let reporter = LogReporter;

    let outcome = match cli.command {
        Command::Decode { input, output } => {
            let options = DecoderOptions { input, output };
            run_decoder(&options, &reporter).map(|_| ()).map_err(|e| e.to_string())
        }
        Command::Download {
            input,
            filter,
            url_type,
            output,
            concurrency,
        } => {
            let options = DownloadOptions {
                input,
                filter,
                mode: url_type.into(),
                output,
                concurrency,
            };
            run_downloader(&options, &reporter)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{message}");
            ExitCode::FAILURE
        }
    }
}
