use anyhow::{Context, Result};
use clap::Parser;
use narravid::config::Config;
use narravid::pipeline::{build_render_plan, print_summary, PipelineConfig};
use narravid::plan::SegmentDef;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "narravid")]
#[command(version, about = "Turn an audio narration into an illustrated, captioned video plan")]
#[command(
    long_about = "Transcribe an audio narration, split it into speaker turns, align each turn \
to the transcript, fetch illustrative images, and write the render props for the video \
composition stage."
)]
struct Cli {
    /// Input narration audio file
    input: PathBuf,

    /// Output render-props JSON file (defaults to input name with .props.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Segment definitions JSON file (skips the LLM planner)
    #[arg(short, long)]
    defs: Option<PathBuf>,

    /// Source language code (e.g., en, ja, es)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Skip image search
    #[arg(long)]
    no_images: bool,

    /// Number of concurrent image lookups
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!("{}.props.json", stem.to_string_lossy()));
    output
}

fn load_segment_defs(path: &Path) -> Result<Vec<SegmentDef>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read segment definitions: {}", path.display()))?;
    let defs: Vec<SegmentDef> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid segment definitions JSON: {}", path.display()))?;
    anyhow::ensure!(!defs.is_empty(), "Segment definitions file is empty");
    Ok(defs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let segment_defs = cli.defs.as_deref().map(load_segment_defs).transpose()?;
    let output = cli.output.unwrap_or_else(|| derive_output_path(&cli.input));

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate(segment_defs.is_none(), !cli.no_images)
        .context("Configuration validation failed")?;

    info!("Input:    {}", cli.input.display());
    info!("Output:   {}", output.display());
    info!("Language: {}", cli.language);
    if let Some(ref defs) = segment_defs {
        info!("Segments: {} (from file)", defs.len());
    }
    if cli.no_images {
        info!("Images:   disabled");
    }

    let pipeline_config = PipelineConfig {
        language: cli.language,
        segment_defs,
        with_images: !cli.no_images,
        concurrency: cli.concurrency,
        show_progress: true,
    };

    let result = build_render_plan(&cli.input, &output, &config, pipeline_config)
        .await
        .context("Pipeline failed")?;

    print_summary(&result);

    Ok(())
}
