use clap::{ArgAction, Parser, Subcommand};
use photofilter::config::{self, AppConfig};
use photofilter::feedback::UsageTracker;
use photofilter::filters::{FilterKind, ParamName, RustBackend};
use photofilter::pipeline::{FilterPipeline, PipelineEvent};
use photofilter::store::PreferenceStore;
use photofilter::{output, script};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;

#[derive(Parser)]
#[command(name = "photofilter")]
#[command(about = "Apply photo filters from the command line")]
#[command(long_about = "\
Apply photo filters from the command line

Seven filters are available: Crystallize, Edges, Gaussian Blur, Pixellate,
Sepia Tone, Unsharp Mask and Vignette. A single intensity slider (0 to 1)
drives every filter; radius and scale follow it at x200 and x10.

Every filter change is counted in a small preferences file. After a few
changes the tool suggests leaving feedback.

Run 'photofilter filters' to list filters and their sliders.
Run 'photofilter gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the preferences file
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Keep the usage counter in memory; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply one filter to an image and save the result
    Apply {
        /// Image to filter (JPEG, PNG, TIFF or WebP)
        input: PathBuf,
        /// Where to write the result; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,
        /// Filter name, e.g. sepia, gaussian-blur, "Unsharp Mask"
        #[arg(short, long, default_value = "sepia")]
        filter: FilterKind,
        /// Intensity slider value (0 to 1); overrides config
        #[arg(short, long)]
        intensity: Option<f32>,
    },
    /// Replay a TOML event script through the pipeline
    Replay {
        /// Script file; relative paths inside it resolve against its directory
        script: PathBuf,
    },
    /// List filters and the sliders each one exposes
    Filters,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Apply {
            input,
            output: out_path,
            filter,
            intensity,
        } => {
            let mut app_config = config::load_config(&cli.config_dir)?;
            if let Some(value) = intensity
                && !app_config.parameters.set(ParamName::Intensity, value)
            {
                return Err(format!("invalid intensity: {value}").into());
            }
            init_thread_pool(&app_config.processing);
            let bytes = std::fs::read(&input)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = spawn_printer(rx);
            let rendered = {
                let mut pipeline = build_pipeline(&app_config, &cli.config_dir, cli.ephemeral, tx);
                pipeline.select_filter(filter);
                pipeline.try_select_image(bytes)?;
                match pipeline.output().cloned() {
                    Some(rendered) => rendered,
                    None => pipeline.render()?,
                }
            };
            join_printer(printer);

            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            rendered.save(&out_path)?;
            output::print_saved(&[out_path]);
        }
        Command::Replay { script: script_path } => {
            let app_config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&app_config.processing);
            let events = script::Script::load(&script_path)?;
            let base_dir = script_path.parent().unwrap_or(Path::new("."));

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = spawn_printer(rx);
            let saved = {
                let mut pipeline = build_pipeline(&app_config, &cli.config_dir, cli.ephemeral, tx);
                script::replay(&events, base_dir, &mut pipeline)
            };
            join_printer(printer);
            output::print_saved(&saved?);
        }
        Command::Filters => {
            output::print_filters();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `log` output through env_logger.
///
/// `RUST_LOG` wins; otherwise `-v` raises the default `warn` level.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn build_pipeline(
    app_config: &AppConfig,
    config_dir: &Path,
    ephemeral: bool,
    events: Sender<PipelineEvent>,
) -> FilterPipeline<RustBackend> {
    let store = if ephemeral {
        PreferenceStore::in_memory()
    } else {
        PreferenceStore::load(&app_config.preferences.resolve(config_dir))
    };
    let usage = UsageTracker::new(
        store,
        app_config.feedback.threshold,
        app_config.feedback.policy,
    );
    FilterPipeline::new(Arc::new(RustBackend::new()))
        .with_parameters(app_config.parameters)
        .with_scaling(app_config.scaling)
        .with_usage_tracker(usage)
        .with_events(events)
}

/// Print pipeline events as they arrive. Ends when every sender is dropped.
fn spawn_printer(rx: std::sync::mpsc::Receiver<PipelineEvent>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for event in rx {
            output::print_event(&event);
        }
    })
}

fn join_printer(printer: std::thread::JoinHandle<()>) {
    if printer.join().is_err() {
        log::warn!("event printer panicked");
    }
}
