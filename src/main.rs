use anyhow::Result;
use regional_etl::{config::PipelinePaths, pipeline};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure paths ──────────────────────────────────────────
    let paths = PipelinePaths::default();
    info!(base = %paths.base_dir.display(), "using data directory");

    // ─── 3) run every stage ──────────────────────────────────────────
    pipeline::run(&paths)
}
