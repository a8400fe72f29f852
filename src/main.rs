use std::sync::Arc;

use diskmark::config::persistence::{JsonRunStore, MemoryRunStore, RunStore};
use diskmark::config::{BenchmarkConfig, BenchmarkSettings};
use diskmark::console::{ask_config, completion_report, run_benchmark, ConsoleUi};
use diskmark::error::user_friendly_message;
use diskmark::util::format_bytes;
use diskmark::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = BenchmarkConfig::load().unwrap_or_else(|e| {
        warn!("{}", user_friendly_message(&e));
        BenchmarkConfig::default()
    });

    println!("Data directory: {}", config.data_dir.display());
    println!(
        "{} marks x {} blocks x {} KB ({} per mark), {}, write {} / read {}",
        config.num_marks,
        config.num_blocks,
        config.block_size_kb,
        format_bytes(config.block_size_bytes() * u64::from(config.num_blocks)),
        config.block_sequence,
        config.write_test,
        config.read_test
    );
    println!("Press Enter to accept this configuration or type 'c' to change:");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if input.trim().eq_ignore_ascii_case("c") {
        config = ask_config(config)?;
    }

    let store: Arc<dyn RunStore> = match JsonRunStore::new() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("{}; runs will not be saved", user_friendly_message(&e));
            Arc::new(MemoryRunStore::new())
        }
    };

    let mut ui = ConsoleUi::new();
    let outcome = run_benchmark(config, store, &mut ui).await?;

    println!();
    println!("{}", completion_report(ui.runs(), outcome.failure.as_ref()));

    // Persist the advanced mark cursor for the next invocation
    if let Err(e) = outcome.settings.config().save() {
        warn!("{}", user_friendly_message(&e));
    }
    Ok(())
}
