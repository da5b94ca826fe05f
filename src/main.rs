use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use accident_trends::pipeline;
use accident_trends::visualize::NullVisualizer;

/// The dataset the run consumes, in the working directory.
const INPUT_FILE: &str = "data.csv";

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // Rendering is an external collaborator; the headless sink keeps
    // the run self-contained
    let mut renderer = NullVisualizer;
    pipeline::run(INPUT_FILE, pipeline::ANALYSIS_COLUMN, &mut renderer)
        .with_context(|| format!("analysis of {INPUT_FILE} failed"))?;
    Ok(())
}
