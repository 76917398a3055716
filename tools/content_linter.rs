/// Content Linter — validates gamebook content and the scene graph.
///
/// Usage: content_linter <content_dir_or_bundle.json>

use gamebook_engine::core::softlock::analyze_graph;
use gamebook_engine::schema::content::ContentStore;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: content_linter <content_dir_or_bundle.json>");
        process::exit(0);
    }

    let path = Path::new(&args[1]);
    let content = if path.is_file() {
        ContentStore::load_from_file(path)
    } else if path.is_dir() {
        ContentStore::load_from_dir(path)
    } else {
        eprintln!("ERROR: Path '{}' does not exist", path.display());
        process::exit(1);
    };

    let content = match content {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: Failed to load content: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} scenes (start: '{}')",
        content.scene_count(),
        content.start_scene()
    );

    println!("\n=== Content Lint Report ===\n");

    let findings = content.validate();
    for finding in &findings {
        println!("ERROR: {}", finding);
    }

    let report = analyze_graph(&content);
    for finding in &report.findings {
        println!("WARNING: {}", finding);
    }
    println!(
        "\nReachability: {}/{} scenes reachable from start",
        report.reachable, report.total
    );

    println!(
        "Summary: {} errors, {} warnings",
        findings.len(),
        report.findings.len()
    );

    if findings.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}
