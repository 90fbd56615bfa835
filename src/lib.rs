pub mod align;
pub mod config;
pub mod error;
pub mod images;
pub mod pipeline;
pub mod plan;
pub mod render;
pub mod transcribe;

pub use align::{create_segments, Segment};
pub use config::Config;
pub use error::{NarravidError, Result};
pub use pipeline::{build_render_plan, print_summary, PipelineConfig, PipelineResult, PipelineStats};
