//! `chatrelay extract`: Run the reply extractor on raw model output.

use chatrelay_extractor::extract_detailed;
use std::path::Path;

pub async fn run(
    file: Option<&Path>,
    json: bool,
    raw_fallback: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let extraction = extract_detailed(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    match extraction.joined() {
        Some(text) => println!("{text}"),
        None if raw_fallback => println!("{}", raw.trim()),
        None => eprintln!("No messages found."),
    }

    Ok(())
}
