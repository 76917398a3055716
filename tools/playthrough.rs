/// Playthrough — runs a scripted walkthrough against gamebook content.
///
/// Usage: playthrough <content_dir_or_bundle.json> <script.ron>

use gamebook_engine::runner::{load_script, run_script};
use gamebook_engine::schema::content::ContentStore;
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: playthrough <content_dir_or_bundle.json> <script.ron>");
        process::exit(0);
    }

    let content_path = Path::new(&args[1]);
    let content = if content_path.is_file() {
        ContentStore::load_from_file(content_path)
    } else {
        ContentStore::load_from_dir(content_path)
    };
    let content = match content {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("ERROR: Failed to load content: {}", e);
            process::exit(1);
        }
    };

    let script = match load_script(Path::new(&args[2])) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("ERROR: Failed to load script: {}", e);
            process::exit(1);
        }
    };

    println!("Running script '{}'...", script.name);

    match run_script(content, &script) {
        Ok(report) => {
            println!("\n=== Playthrough Report ===\n");
            println!("Steps executed: {}", report.steps_executed);
            println!("Final scene:    {}", report.final_scene);
            if report.ending_reached {
                println!("Ending criteria satisfied");
            }
            for warning in &report.warnings {
                println!("WARNING: {}", warning);
            }
            println!(
                "\nSummary: {} softlock warnings",
                report.warnings.len()
            );
            if report.warnings.is_empty() {
                process::exit(0);
            } else {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("FAILED: {}", e);
            process::exit(1);
        }
    }
}
