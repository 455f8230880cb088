//! Arch Explorer CLI - Run an architecture search from JSON configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arch_explorer::{
    evaluator::CommandEvaluator,
    evolution::{EvolutionEngine, ProgressReport},
    schema::{ExplorerConfig, GenomeSnapshot, StopReason},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Search FPGA architecture parameters (K, N, W) with a genetic algorithm.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to exploration configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = ExplorerConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    println!("Arch Explorer");
    println!("=============");
    println!("Benchmarks: {}", config.benchmarks.len());
    println!(
        "Population: {} ({} elites, {} selected)",
        config.evolution.population_size,
        config.evolution.elite_count,
        config.evolution.selection_count
    );
    println!(
        "Bounds: K {:?}, N {:?}, W {:?}",
        config.evolution.bounds.k, config.evolution.bounds.n, config.evolution.bounds.w
    );
    match config.max_generations {
        Some(max) => println!("Generations: {}", max),
        None => println!("Generations: until stopped"),
    }
    println!("Press Ctrl-C to stop after the current generation");
    if let Some(stop_file) = &config.stop_file {
        println!("Or create {} to do the same", stop_file.display());
    }
    println!();

    let mut report = config.report.output_dir.as_ref().map(|dir| {
        ProgressReport::create(dir).unwrap_or_else(|e| {
            eprintln!("Error creating report in {}: {}", dir.display(), e);
            std::process::exit(1);
        })
    });

    let evaluator = CommandEvaluator::new(config.evaluator.clone());
    let mut engine = EvolutionEngine::new(
        config.evolution.clone(),
        evaluator,
        config.benchmarks.clone(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error creating engine: {}", e);
        std::process::exit(1);
    });

    let cancel = engine.cancel_handle();
    if let Err(e) = install_interrupt_handler(Arc::clone(&cancel)) {
        eprintln!("Warning: Ctrl-C will abort without a final result: {}", e);
    }
    let interval = config.report.interval;

    let result = engine.run_with_callback(config.max_generations, |summary| {
        if summary.generation % interval == 0 {
            println!(
                "Generation {}: best {} score {:.4}, {} survivors, {} failures, {} evaluations",
                summary.generation,
                describe(&summary.best),
                summary.best.score,
                summary.survivors,
                summary.failures,
                summary.total_evaluations
            );
        }

        if let Some(writer) = report.as_mut()
            && let Err(e) = writer.record(summary)
        {
            eprintln!("Error writing progress report: {}", e);
            report = None;
        }

        if let Some(stop_file) = &config.stop_file
            && stop_file.exists()
        {
            println!("Found {}, stopping", stop_file.display());
            cancel.store(true, Ordering::Relaxed);
        }
    });

    println!();
    println!("Final result:");
    println!("  Best: {}", describe(&result.best));
    println!("  Score: {:.4}", result.best.score);
    for (benchmark, measured) in config.benchmarks.iter().zip(&result.best.results) {
        println!(
            "  {}: area={:.4e}, delay={:.4e}",
            benchmark, measured.area, measured.delay
        );
    }
    println!(
        "  Generations: {} ({} evaluations)",
        result.stats.generations, result.stats.total_evaluations
    );
    println!(
        "  Stopped: {}",
        match result.stats.stop_reason {
            StopReason::MaxGenerations => "generation limit reached",
            StopReason::Cancelled => "stop requested",
        }
    );
    println!("  Time: {:.2}s", result.stats.elapsed_seconds);
}

/// The first interrupt asks the engine to stop between generations, a
/// second one aborts immediately.
fn install_interrupt_handler(cancel: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if cancel.swap(true, Ordering::Relaxed) {
            eprintln!("Interrupted again, aborting");
            std::process::exit(130);
        }
        eprintln!("Interrupted, stopping after the current generation (Ctrl-C again to abort)");
    })
}

fn describe(snapshot: &GenomeSnapshot) -> String {
    format!("K={} N={} W={}", snapshot.k, snapshot.n, snapshot.w)
}

fn print_example_config() {
    let config = ExplorerConfig::default();

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_interrupt_sets_cancel_flag() {
        let cancel = Arc::new(AtomicBool::new(false));
        install_interrupt_handler(Arc::clone(&cancel)).unwrap();

        let status = Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !cancel.load(Ordering::Relaxed) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(cancel.load(Ordering::Relaxed));
    }
}
