use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use widecrop::batch::{BatchSession, ErrorPolicy, ItemStatus};
use widecrop::imaging::{RustBackend, plan_crop};
use widecrop::{archive, config, output, scan};

/// Shared flags for commands that read images.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Image files or directories (directories are walked recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Write a JSON report of every item's final state
    #[arg(long)]
    report: Option<PathBuf>,

    /// JPEG quality (1-100), overrides the config file
    #[arg(long)]
    quality: Option<u32>,

    /// Give failed images one more attempt before packaging
    #[arg(long)]
    retry_failed: bool,
}

#[derive(Parser)]
#[command(name = "widecrop")]
#[command(about = "Batch center-crop images to 16:9 and bundle them into a ZIP")]
#[command(long_about = "\
Batch center-crop images to 16:9 and bundle them into a ZIP

Every image is cut to the largest centered 16:9 region. Nothing is scaled:
wide images lose their sides, tall images lose their top and bottom.
Results are re-encoded as JPEG and written to one archive:

  cropped_images_16_9.zip
  └── 16-9-images/
      ├── beach.jpg
      └── city.png          # original name kept, content is JPEG

Images that fail to decode are reported and left out of the archive.

Run 'widecrop gen-config' to generate a documented widecrop.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./widecrop.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop every input and write the archive
    Run(RunArgs),
    /// Show the crop each input would get, without encoding anything
    Plan(InputArgs),
    /// Print a stock widecrop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(quality) = args.quality {
                config.output.quality = quality;
            }
            config.validate()?;

            let paths = scan::collect_inputs(&args.input.inputs)?;
            let sources = scan::read_sources(&paths)?;
            info!(count = sources.len(), aspect = %config.aspect(), "inputs collected");

            let mut session = BatchSession::new(config.session_config());
            session.add_files(sources)?;

            run_with_printer(&mut session)?;
            if args.retry_failed && session.count(ItemStatus::Error) > 0 {
                println!("==> Retrying failed images");
                session.set_error_policy(ErrorPolicy::Retry);
                run_with_printer(&mut session)?;
            }

            if let Some(report) = &args.report {
                let json = serde_json::to_string_pretty(&session.snapshot())?;
                std::fs::write(report, json)?;
                info!(path = %report.display(), "report written");
            }

            let archive = session.package(&config.archive)?;
            if archive.is_empty() {
                warn!("no image was cropped successfully, archive not written");
            } else {
                let path = archive::save_archive(&archive, &args.out, &config.archive)?;
                println!("==> Archive: {} ({} images)", path.display(), archive.len());
            }
        }
        Command::Plan(args) => {
            let config = load_config(cli.config.as_deref())?;
            let paths = scan::collect_inputs(&args.inputs)?;
            let backend = RustBackend::new();
            for (i, source) in scan::read_sources(&paths)?.iter().enumerate() {
                let lines = match plan_crop(&backend, &source.bytes, config.aspect()) {
                    Ok((dims, rect)) => output::format_plan(i + 1, &source.name, dims, &rect),
                    Err(e) => output::format_plan_error(i + 1, &source.name, &e.to_string()),
                };
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the session, printing events from a separate thread as they arrive.
fn run_with_printer(session: &mut BatchSession) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = session.run(Some(tx));
    printer.join().map_err(|_| "printer thread panicked")?;
    result?;
    Ok(())
}

/// Load the explicit config file, or `widecrop.toml` from the working
/// directory when present.
fn load_config(explicit: Option<&Path>) -> Result<config::Config, config::ConfigError> {
    match explicit {
        Some(path) if !path.exists() => Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        ))),
        Some(path) => config::load_config(path),
        None => config::load_config(Path::new(config::DEFAULT_CONFIG_FILE)),
    }
}
