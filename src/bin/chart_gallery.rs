use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chart_gallery::app::{App, ManifestState, Resolution};
use chart_gallery::config::{ConfigLoader, ResolvedConfig, StoreSettings};
use chart_gallery::domain::{GalleryMode, Threshold};
use chart_gallery::drive::DriveHttpClient;
use chart_gallery::error::GalleryError;
use chart_gallery::output::{
    JsonOutput, LabelResult, LabeledOption, ModesResult, OptionsResult, OutputMode, ResolveResult,
};
use chart_gallery::render::render_page;
use chart_gallery::selection::Selection;
use chart_gallery::store::{DirectoryStore, FileStore, SavedImages, write_atomic};
use chart_gallery::tui::Tui;

#[derive(Parser)]
#[command(name = "chart-gallery")]
#[command(about = "Browse pre-rendered chart images by variable pair, filter and bin threshold")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Interactive terminal browser (default)")]
    Browse(BrowseArgs),
    #[command(about = "Print the selectable options of a gallery")]
    Options(OptionsArgs),
    #[command(about = "Resolve one selection to its image")]
    Resolve(ResolveArgs),
    #[command(about = "Show display labels for raw variable tokens")]
    Label(LabelArgs),
    #[command(about = "Show the configured galleries")]
    Modes,
}

#[derive(Args)]
struct BrowseArgs {
    #[arg(long, value_enum, default_value_t = GalleryMode::Hexbin)]
    mode: GalleryMode,
}

#[derive(Args)]
struct OptionsArgs {
    #[arg(long, value_enum, default_value_t = GalleryMode::Hexbin)]
    mode: GalleryMode,

    #[arg(long)]
    var1: Option<String>,

    #[arg(long, requires = "var1")]
    var2: Option<String>,
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(long, value_enum, default_value_t = GalleryMode::Hexbin)]
    mode: GalleryMode,

    #[arg(long)]
    var1: String,

    #[arg(long)]
    var2: String,

    #[arg(long)]
    filter: String,

    #[arg(long, default_value = "0")]
    threshold: Threshold,

    #[arg(long)]
    save: Option<Utf8PathBuf>,

    #[arg(long)]
    html: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct LabelArgs {
    #[arg(required = true)]
    tokens: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<GalleryError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GalleryError) -> u8 {
    match error {
        GalleryError::GraphNotFound(_)
        | GalleryError::UnknownSelection(_)
        | GalleryError::InvalidThreshold(_)
        | GalleryError::InvalidMode(_) => 2,
        GalleryError::ManifestUnavailable(_)
        | GalleryError::Authentication(_)
        | GalleryError::StoreHttp(_)
        | GalleryError::StoreStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Label(args)) => run_label(args),
        Some(Commands::Modes) => {
            let app = App::new(build_store(&config)?, config);
            JsonOutput::print_modes(&ModesResult { modes: app.modes() }).into_diagnostic()
        }
        Some(Commands::Options(args)) => {
            let app = App::new(build_store(&config)?, config);
            run_options(args, app)
        }
        Some(Commands::Resolve(args)) => {
            let app = App::new(build_store(&config)?, config);
            run_resolve(args, app)
        }
        Some(Commands::Browse(args)) => run_browse(args.mode, config, output_mode),
        None => run_browse(GalleryMode::Hexbin, config, output_mode),
    }
}

fn build_store(config: &ResolvedConfig) -> miette::Result<Box<dyn FileStore>> {
    match &config.store {
        StoreSettings::Drive {
            api_base,
            token_env,
        } => {
            let token = std::env::var(token_env).ok();
            if token.is_none() {
                warn!(token_env, "no Drive access token in environment");
            }
            let client = DriveHttpClient::new(api_base, token)?;
            Ok(Box::new(client))
        }
        StoreSettings::Directory { root } => Ok(Box::new(DirectoryStore::new(root.clone()))),
    }
}

fn run_browse(
    mode: GalleryMode,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    if matches!(output_mode, OutputMode::NonInteractive) {
        return Err(miette::Report::msg(
            "command required (try `chart-gallery --help`)",
        ));
    }
    let saved = SavedImages::new()?;
    let app = App::new(build_store(&config)?, config);
    let mut tui = Tui::new(mode);
    tui.run(&app, &saved)
}

fn run_label(args: LabelArgs) -> miette::Result<()> {
    let labels = args
        .tokens
        .iter()
        .map(|token| LabeledOption::new(token))
        .collect();
    JsonOutput::print_labels(&LabelResult { labels }).into_diagnostic()
}

fn run_options<S: FileStore>(args: OptionsArgs, app: App<S>) -> miette::Result<()> {
    let state = app.manifest(args.mode, &JsonOutput);
    let ManifestState::Ready(report) = &state else {
        let message = state.error_message().unwrap_or_default().to_string();
        JsonOutput::print_options(&OptionsResult::unavailable(args.mode, &message))
            .into_diagnostic()?;
        return Err(GalleryError::ManifestUnavailable(message).into());
    };

    let mut result = OptionsResult::ready(args.mode, report);
    let scoped = result.scope(&report.table, args.var1.as_deref(), args.var2.as_deref());
    JsonOutput::print_options(&result).into_diagnostic()?;
    scoped?;
    Ok(())
}

fn run_resolve<S: FileStore>(args: ResolveArgs, app: App<S>) -> miette::Result<()> {
    let selection = Selection::new(args.var1, args.var2, args.filter, args.threshold);
    let resolution = app.resolve(args.mode, &selection, &JsonOutput);
    let mut result = ResolveResult::new(args.mode, &selection, &resolution);

    if let (Some(path), Some(bytes)) = (&args.save, resolution.bytes()) {
        write_atomic(path, bytes)?;
        result.saved_to = Some(path.to_string());
    }
    if let Some(path) = &args.html {
        let page = render_page(args.mode, &selection, &resolution);
        write_atomic(path, page.as_bytes())?;
        result.html = Some(path.to_string());
    }

    JsonOutput::print_resolve(&result).into_diagnostic()?;

    match resolution {
        Resolution::Found { .. } => Ok(()),
        Resolution::FetchFailed { message, .. } => {
            Err(GalleryError::StoreHttp(message).into())
        }
        Resolution::NotFound { filename, .. } => {
            Err(GalleryError::GraphNotFound(filename).into())
        }
    }
}
