use crate::align::{create_segments, Segment};
use crate::config::Config;
use crate::error::{NarravidError, Result};
use crate::images::{GoogleImageClient, ImagePlanner, ImageSlot};
use crate::plan::{OpenRouterClient, SegmentDef, SegmentPlanner};
use crate::render::RenderProps;
use crate::transcribe::{Caption, Transcriber, WhisperClient};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Configuration for the narration-to-video pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source language code for transcription.
    pub language: String,
    /// Pre-made segment definitions; when set, the LLM planner is skipped.
    pub segment_defs: Option<Vec<SegmentDef>>,
    /// Fetch illustrative images.
    pub with_images: bool,
    /// Number of concurrent image lookups.
    pub concurrency: usize,
    /// Show progress spinners.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            segment_defs: None,
            with_images: true,
            concurrency: 4,
            show_progress: true,
        }
    }
}

/// Statistics from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub transcription_time: Duration,
    pub planning_time: Duration,
    pub alignment_time: Duration,
    pub image_time: Duration,
    pub caption_count: usize,
    pub segment_count: usize,
    pub image_count: usize,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path of the written render-props document.
    pub output_path: PathBuf,
    pub props: RenderProps,
    pub stats: PipelineStats,
}

fn spinner(mp: Option<&MultiProgress>, message: &str) -> Option<ProgressBar> {
    mp.map(|mp| {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    })
}

/// Build the render plan for one narration.
///
/// Stages:
/// 1. Transcribe the audio into word-level captions
/// 2. Plan segment definitions (LLM speaker turns, unless supplied)
/// 3. Align each definition to a transcript time range
/// 4. Optionally fetch illustrative images
/// 5. Assemble and write the render props
pub async fn build_render_plan(
    audio: &Path,
    output: &Path,
    config: &Config,
    pipeline_config: PipelineConfig,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    if !audio.exists() {
        return Err(NarravidError::FileNotFound(audio.display().to_string()));
    }

    let multi_progress = if pipeline_config.show_progress {
        Some(MultiProgress::new())
    } else {
        None
    };

    // Stage 1: transcription
    info!("Stage 1/5: Transcribing {:?}", audio);
    let transcription_start = Instant::now();
    let pb = spinner(multi_progress.as_ref(), "Transcribing audio...");

    let captions = transcribe_audio(audio, config, &pipeline_config).await?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ Transcribed {} words", captions.len()));
    }
    let transcription_time = transcription_start.elapsed();
    info!(
        "Transcription complete: {} words in {:.2}s",
        captions.len(),
        transcription_time.as_secs_f64()
    );

    // Stage 2: segment planning
    info!("Stage 2/5: Planning segment definitions");
    let planning_start = Instant::now();

    let defs = match pipeline_config.segment_defs.clone() {
        Some(defs) => {
            info!("Using {} caller-supplied segment definitions", defs.len());
            defs
        }
        None => {
            let pb = spinner(multi_progress.as_ref(), "Planning speaker turns...");
            let llm = openrouter_client(config)?;
            let defs = SegmentPlanner::new(llm).plan(&captions).await?;
            if let Some(pb) = pb {
                pb.finish_with_message(format!("✓ Planned {} speaker turns", defs.len()));
            }
            defs
        }
    };
    let planning_time = planning_start.elapsed();

    // Stage 3: alignment. A boundary failure here is fatal for the run:
    // partial segments would desync the composition stage.
    info!("Stage 3/5: Aligning {} definitions", defs.len());
    let alignment_start = Instant::now();
    let segments: Vec<Segment> = create_segments(&captions, &defs)?;
    let alignment_time = alignment_start.elapsed();
    info!(
        "Alignment complete: {} segments in {:.3}s",
        segments.len(),
        alignment_time.as_secs_f64()
    );

    // Stage 4: images
    let image_start = Instant::now();
    let images: Vec<ImageSlot> = if pipeline_config.with_images {
        info!("Stage 4/5: Fetching illustrative images");
        let pb = spinner(multi_progress.as_ref(), "Searching images...");
        let planner = image_planner(config, pipeline_config.concurrency)?;
        let slots = planner.illustrate(&captions).await?;
        if let Some(pb) = pb {
            pb.finish_with_message(format!("✓ Resolved {} image slots", slots.len()));
        }
        slots
    } else {
        info!("Stage 4/5: Image fetching disabled, skipping");
        Vec::new()
    };
    let image_time = image_start.elapsed();

    // Stage 5: props assembly
    info!("Stage 5/5: Writing render props to {:?}", output);
    let props = RenderProps::new(
        audio.display().to_string(),
        captions,
        segments,
        images,
    );
    props.write_props(output)?;

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        transcription_time,
        planning_time,
        alignment_time,
        image_time,
        caption_count: props.captions.len(),
        segment_count: props.segments.len(),
        image_count: props.images.len(),
    };

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        props,
        stats,
    })
}

async fn transcribe_audio(
    audio: &Path,
    config: &Config,
    pipeline_config: &PipelineConfig,
) -> Result<Vec<Caption>> {
    let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
        NarravidError::Config(
            "OpenAI API key not set. Set OPENAI_API_KEY environment variable.".to_string(),
        )
    })?;

    let transcriber =
        WhisperClient::new(api_key.clone()).with_language(pipeline_config.language.clone());
    transcriber.transcribe(audio).await
}

fn openrouter_client(config: &Config) -> Result<OpenRouterClient> {
    let api_key = config.openrouter_api_key.as_ref().ok_or_else(|| {
        NarravidError::Config(
            "OpenRouter API key not set. Set OPENROUTER_API_KEY environment variable.".to_string(),
        )
    })?;
    Ok(OpenRouterClient::new(
        api_key.clone(),
        config.llm_model.clone(),
    ))
}

fn image_planner(config: &Config, concurrency: usize) -> Result<ImagePlanner> {
    let google_key = config.google_api_key.as_ref().ok_or_else(|| {
        NarravidError::Config("GOOGLE_API_KEY not set (required for image search)".to_string())
    })?;
    let engine_id = config.search_engine_id.as_ref().ok_or_else(|| {
        NarravidError::Config("SEARCH_ENGINE_ID not set (required for image search)".to_string())
    })?;

    let llm = openrouter_client(config)?;
    let search = GoogleImageClient::new(google_key.clone(), engine_id.clone());
    Ok(ImagePlanner::new(llm, search).with_concurrency(concurrency))
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Render Plan Complete                       ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:    {}", result.output_path.display());
    println!("  Captions:  {}", result.stats.caption_count);
    println!("  Segments:  {}", result.stats.segment_count);
    println!("  Images:    {}", result.stats.image_count);
    println!();
    println!("  Timing:");
    println!(
        "    Transcribe:  {:.2}s",
        result.stats.transcription_time.as_secs_f64()
    );
    println!(
        "    Plan:        {:.2}s",
        result.stats.planning_time.as_secs_f64()
    );
    println!(
        "    Align:       {:.3}s",
        result.stats.alignment_time.as_secs_f64()
    );
    println!(
        "    Images:      {:.2}s",
        result.stats.image_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
