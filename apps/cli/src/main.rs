use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use shotlist_core::{
    AnalysisReport, GeminiAnalyzer, GeminiClient, MarkerSegmenter, MediaDownloader,
    ModelSegmenter, Pipeline, Provider, SequenceFormatter, Settings, ShotlistError,
    TemplateKind, VideoSource, YtDlpDownloader, analyze_video, generate_sequences, load_dotenv,
    paths::new_run_id, read_url_file,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod ui;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Pro,
    Flash,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Pro => Provider::GeminiPro,
            CliProvider::Flash => Provider::GeminiFlash,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Split at timestamp markers in the report (deterministic)
    #[default]
    Markers,
    /// Ask the model for the shot list
    Model,
}

#[derive(Parser)]
#[command(name = "shotlist")]
#[command(
    about = "Download videos, analyze them with Gemini, and turn the analysis into first-frame, last-frame and motion prompts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini model used for analysis
    #[arg(short, long, global = true, default_value = "pro")]
    provider: CliProvider,

    /// Directory for downloaded videos
    #[arg(long, global = true)]
    downloads_dir: Option<PathBuf>,

    /// Directory for analysis reports
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    /// Directory for sequence documents
    #[arg(long, global = true)]
    sequences_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Download one or more videos with yt-dlp
    Download {
        /// Video URLs
        urls: Vec<String>,

        /// Text file with one URL per line (# starts a comment)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Analyze a local video and save the report
    Analyze {
        /// Video file
        video: PathBuf,
    },

    /// Turn an analysis report into prompt sequences
    #[command(name = "generate_sequences")]
    GenerateSequences {
        /// Analysis report (markdown)
        report: PathBuf,

        #[arg(short, long, value_enum, default_value_t)]
        strategy: Strategy,

        /// Motion prompt template: t2v or i2v
        #[arg(short, long, default_value = "t2v")]
        template: TemplateKind,
    },

    /// Download (for URLs), analyze and generate sequences for each input
    #[command(name = "run_pipeline")]
    RunPipeline {
        /// URLs or local video paths
        #[arg(required = true)]
        inputs: Vec<String>,

        #[arg(short, long, value_enum, default_value_t)]
        strategy: Strategy,

        /// Motion prompt template: t2v or i2v
        #[arg(short, long, default_value = "t2v")]
        template: TemplateKind,
    },
}

impl Command {
    fn needs_api_key(&self) -> bool {
        match self {
            Command::Download { .. } => false,
            Command::Analyze { .. } | Command::RunPipeline { .. } => true,
            Command::GenerateSequences { strategy, .. } => *strategy == Strategy::Model,
        }
    }
}

/// `RUST_LOG` wins over `-v`; without either only warnings are shown.
fn filter_directive(verbose: bool, rust_log: Option<String>) -> String {
    match rust_log.filter(|v| !v.trim().is_empty()) {
        Some(directive) => directive,
        None if verbose => "debug".to_string(),
        None => "warn".to_string(),
    }
}

/// Must run after `load_dotenv` so a `RUST_LOG` from `.env` applies.
fn init_tracing(verbose: bool) {
    let directive = filter_directive(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn settings(cli: &Cli) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(dir) = &cli.downloads_dir {
        settings.downloads_dir = dir.clone();
    }
    if let Some(dir) = &cli.reports_dir {
        settings.reports_dir = dir.clone();
    }
    if let Some(dir) = &cli.sequences_dir {
        settings.sequences_dir = dir.clone();
    }
    settings
}

fn formatter(
    strategy: Strategy,
    template: TemplateKind,
    provider: &Provider,
    api_key: Option<&str>,
    settings: &Settings,
) -> Result<SequenceFormatter> {
    let formatter = match (strategy, api_key) {
        (Strategy::Markers, _) => SequenceFormatter::new(Box::new(MarkerSegmenter), template),
        (Strategy::Model, Some(key)) => {
            let client = GeminiClient::new(provider, key.to_string(), settings)?;
            SequenceFormatter::new(Box::new(ModelSegmenter::new(client)), template)
        }
        (Strategy::Model, None) => bail!("the model strategy needs an API key"),
    };
    Ok(formatter)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env_files = load_dotenv();
    init_tracing(cli.verbose);
    debug!(?env_files, "environment loaded");

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        if let Some(err) = e.downcast_ref::<ShotlistError>() {
            debug!(kind = %err.kind(), "run failed");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let provider: Provider = cli.provider.into();
    let settings = settings(&cli);
    debug!(?settings, "settings loaded");

    // Validate API key early
    let api_key = if cli.command.needs_api_key() {
        Some(provider.validate_api_key()?)
    } else {
        None
    };

    match cli.command {
        Command::Download { urls, file } => download(urls, file, &settings).await,
        Command::Analyze { video } => {
            let key = api_key.context("missing API key")?;
            analyze(video, &provider, key, &settings).await
        }
        Command::GenerateSequences {
            report,
            strategy,
            template,
        } => {
            let formatter = formatter(strategy, template, &provider, api_key.as_deref(), &settings)?;
            sequences(report, formatter, &settings).await
        }
        Command::RunPipeline {
            inputs,
            strategy,
            template,
        } => {
            let key = api_key.context("missing API key")?;
            let formatter = formatter(strategy, template, &provider, Some(&key), &settings)?;
            pipeline(inputs, formatter, &provider, key, &settings).await
        }
    }
}

async fn download(urls: Vec<String>, file: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let mut urls = urls;
    if let Some(file) = file {
        let listed = read_url_file(&file)
            .await
            .with_context(|| format!("reading URL list {}", file.display()))?;
        urls.extend(listed);
    }
    if urls.is_empty() {
        bail!("no URLs given; pass them as arguments or with --file");
    }

    ui::banner("Downloader");
    ui::rule();

    let downloader = YtDlpDownloader::new(settings);
    let total = urls.len();
    let mut failed = 0;

    for (i, url) in urls.iter().enumerate() {
        let step_start = Instant::now();
        let spinner = ui::create_spinner(&format!("[{}/{}] Downloading {}...", i + 1, total, url));
        match downloader.download(url).await {
            Ok(path) => ui::done(
                &spinner,
                &format!("Downloaded: {}", style(ui::file_name(&path)).dim()),
                step_start.elapsed(),
            ),
            Err(e) => {
                ui::failed(&spinner, url, &e);
                failed += 1;
            }
        }
    }

    if total > 1 {
        ui::summary("Downloads", total - failed, failed);
    }
    if failed > 0 {
        bail!("{} of {} downloads failed", failed, total);
    }
    Ok(())
}

async fn analyze(
    video: PathBuf,
    provider: &Provider,
    api_key: String,
    settings: &Settings,
) -> Result<()> {
    ui::banner("Video Analyzer");
    ui::rule();

    let analyzer = GeminiAnalyzer::new(GeminiClient::new(provider, api_key, settings)?);
    let step_start = Instant::now();
    let spinner = ui::create_spinner(&format!(
        "Analyzing {} with {}...",
        ui::file_name(&video),
        provider.name()
    ));

    let report = match analyze_video(&analyzer, &video, &settings.reports_dir, &new_run_id()).await
    {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    ui::done(
        &spinner,
        &format!("Analysis complete ({})", provider.name()),
        step_start.elapsed(),
    );

    if let Some(path) = &report.path {
        println!();
        ui::saved("Report", path);
    }
    Ok(())
}

async fn sequences(report: PathBuf, formatter: SequenceFormatter, settings: &Settings) -> Result<()> {
    ui::banner("Sequence Generator");
    ui::rule();

    let loaded = AnalysisReport::load(&report)
        .await
        .with_context(|| format!("reading report {}", report.display()))?;

    let step_start = Instant::now();
    let spinner = ui::create_spinner(&format!(
        "Generating sequences ({} strategy, {})...",
        formatter.segmenter_name(),
        formatter.template()
    ));
    let (doc, path) =
        match generate_sequences(&formatter, &loaded, &settings.sequences_dir, &new_run_id()).await
        {
            Ok(out) => out,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };
    ui::done(
        &spinner,
        &format!(
            "{} sequences, {} total",
            doc.sequences.len(),
            doc.total_duration
        ),
        step_start.elapsed(),
    );

    println!();
    ui::saved("Sequences", &path);
    Ok(())
}

async fn pipeline(
    inputs: Vec<String>,
    formatter: SequenceFormatter,
    provider: &Provider,
    api_key: String,
    settings: &Settings,
) -> Result<()> {
    ui::banner("Video → Sequences");
    ui::rule();

    let analyzer = GeminiAnalyzer::new(GeminiClient::new(provider, api_key, settings)?);
    let pipeline = Pipeline::new(
        Box::new(YtDlpDownloader::new(settings)),
        Box::new(analyzer),
        formatter,
        settings.reports_dir.clone(),
        settings.sequences_dir.clone(),
    );

    let total = inputs.len();
    let total_start = Instant::now();
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        let source = VideoSource::parse(input);
        let step_start = Instant::now();
        let prefix = format!("[{}/{}]", i + 1, total);
        let spinner = ui::create_spinner(&format!("{} {}", prefix, source));

        let progress = spinner.clone();
        let stage_prefix = prefix.clone();
        let result = pipeline
            .run_with(&source, move |stage| {
                progress.set_message(format!("{} {}", stage_prefix, stage))
            })
            .await;

        match result {
            Ok(output) => {
                ui::done(
                    &spinner,
                    &format!(
                        "{} {}: {} sequences",
                        prefix,
                        ui::file_name(&output.video),
                        output.sequence_count
                    ),
                    step_start.elapsed(),
                );
                ui::saved("Video", &output.video);
                ui::saved("Report", &output.report);
                ui::saved("Sequences", &output.sequences);
            }
            Err(e) => {
                ui::failed(&spinner, &format!("{} {}", prefix, source), &e);
                failed += 1;
            }
        }
    }

    println!(
        "\n{} {}",
        style("Total time:").dim(),
        style(ui::format_duration(total_start.elapsed())).cyan().bold()
    );

    if total > 1 {
        ui::summary("Pipeline", total - failed, failed);
    }
    if failed > 0 {
        bail!("{} of {} inputs failed", failed, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_verbosity() {
        assert_eq!(filter_directive(false, Some("shotlist_core=info".into())), "shotlist_core=info");
        assert_eq!(filter_directive(true, Some("error".into())), "error");
    }

    #[test]
    fn verbosity_picks_the_default_level() {
        assert_eq!(filter_directive(true, None), "debug");
        assert_eq!(filter_directive(false, Some("  ".into())), "warn");
    }
}
