use std::time::Instant;

use cavity_post::AnalysisConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Cases and paths are fixed for this study
    let config = AnalysisConfig::default();

    let start_time = Instant::now();
    let samples = cavity_post::run(&config)?;
    let elapsed_time = start_time.elapsed();

    for sample in &samples {
        info!("Re = {:>5}  Fe = {:.6}", sample.re, sample.fe);
    }
    info!("{} cases took: {:?}", samples.len(), elapsed_time);

    Ok(())
}
