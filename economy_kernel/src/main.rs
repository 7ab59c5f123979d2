/// Economy Kernel v1: Replay Harness
///
/// Loads an operation stream (JSON array of envelopes), replays it twice
/// through the engine and prints the canonical hash of the final state.
///
/// Usage: economy_replay <operations.json> [config.json]

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use economy_kernel::config::EconomyConfig;
use economy_kernel::engine::EconomyEngine;
use economy_kernel::events::OperationEnvelope;
use economy_kernel::hashing::canonical_hash;

fn load_operations(path: &Path) -> Result<Vec<OperationEnvelope>, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let envelopes: Vec<OperationEnvelope> = serde_json::from_str(&data)?;
    Ok(envelopes)
}

fn run(ops_path: &Path, config_path: Option<&Path>) -> Result<bool, Box<dyn Error>> {
    let config = EconomyConfig::load_or_builtin(config_path)?;
    let envelopes = load_operations(ops_path)?;
    tracing::info!(
        target: "economy::replay",
        path = %ops_path.display(),
        operations = envelopes.len(),
        "replay.loaded"
    );

    // Run 1
    let mut engine = EconomyEngine::new(config.clone());
    engine.replay(&envelopes)?;
    let state = engine.state();
    let h1 = canonical_hash(state)?;

    // Run 2 (determinism check)
    let mut engine2 = EconomyEngine::new(config);
    let h2 = canonical_hash(engine2.replay(&envelopes)?)?;

    println!(
        "operations={} resources={} locations={} processors={} storages={} units={}",
        envelopes.len(),
        state.resources.len(),
        state.locations.len(),
        state.processors.len(),
        state.storages.len(),
        state.units.len()
    );
    println!("hash={}", h1);

    if h1 != h2 {
        println!("[FAIL] Determinism: run1={} run2={}", h1, h2);
        return Ok(false);
    }
    println!("[OK] Replay deterministic.");
    Ok(true)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(ops_path) = args.first() else {
        eprintln!("usage: economy_replay <operations.json> [config.json]");
        return ExitCode::from(2);
    };
    let config_path = args.get(1).map(Path::new);

    match run(Path::new(ops_path), config_path) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("economy_replay: {}", err);
            ExitCode::FAILURE
        }
    }
}
