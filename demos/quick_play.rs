/// Quick play — drives the demo gamebook to an ending by always taking
/// the first enabled choice, printing each scene along the way.
///
/// Run with: cargo run --example quick_play

use gamebook_engine::core::resolver::Session;
use gamebook_engine::schema::content::ContentStore;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let content = Arc::new(ContentStore::load_from_file(Path::new(
        "tests/fixtures/demo_content.json",
    ))?);
    let mut session = Session::start(content)?;

    loop {
        let view = session.current_view()?;
        println!("== {} ==", view.title);
        println!("{}\n", view.text);

        if view.is_ending {
            println!("(the end)");
            break;
        }
        for choice in &view.choices {
            let marker = if choice.enabled { " " } else { "x" };
            let hint = choice
                .disabled_hint
                .as_deref()
                .map(|h| format!("  [{h}]"))
                .unwrap_or_default();
            println!("  [{marker}] {}. {}{hint}", choice.index, choice.label);
        }
        println!();

        let Some(pick) = view.choices.iter().find(|c| c.enabled) else {
            println!("(stuck: no enabled choices)");
            break;
        };
        session.choose(pick.index)?;
    }

    let state = session.state();
    println!("\nVisited {} scenes.", state.scene_history.len());
    let mut flags: Vec<_> = state.flags.iter().collect();
    flags.sort();
    println!("Flags: {flags:?}");

    Ok(())
}
