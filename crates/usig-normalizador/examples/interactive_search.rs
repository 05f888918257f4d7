//! Interactive address autocomplete on the terminal
//!
//! Every line typed on stdin is treated as the new content of a search field:
//! - plain text updates the query (debounced like keystrokes)
//! - `:N` picks the N-th result (1-based)
//! - `:q` cancels the search
//!
//! Run with `cargo run --example interactive_search`.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use usig_normalizador::{Address, Normalizador, SearchOutcome, SessionEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    usig_normalizador::init_logging(tracing::Level::WARN)?;

    let normalizador = Normalizador::new()?;
    let mut session = normalizador.session();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut query = String::new();
    let mut spinner: Option<ProgressBar> = None;
    let mut stdin_open = true;

    println!("Type an address (':N' to pick a result, ':q' to quit):");

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    session.close();
                    continue;
                };
                let command = line.trim().to_string();
                match command.as_str() {
                    ":q" => session.close(),
                    command if command.starts_with(':') => match command[1..].parse::<usize>() {
                        Ok(n) if n > 0 => session.select(n - 1)?,
                        _ => println!("Unknown command {command:?}"),
                    },
                    _ => {
                        query = line.clone();
                        session.input(line)?;
                    }
                }
            }
            event = session.next_event() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Searching(true) => spinner = Some(start_spinner(&query)),
                    SessionEvent::Searching(false) => {
                        if let Some(spinner) = spinner.take() {
                            spinner.finish_and_clear();
                        }
                    }
                    SessionEvent::Outcome(outcome) => print_outcome(&outcome, &query),
                    SessionEvent::Reseeded(text) => {
                        println!("Refining search with {text:?}");
                        query = text;
                    }
                    SessionEvent::Committed(address) => print_committed(&address),
                    SessionEvent::Closed => break,
                }
            }
        }
    }

    Ok(())
}

fn start_spinner(query: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Searching {:?}", query.trim()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_outcome(outcome: &SearchOutcome, query: &str) {
    match outcome {
        SearchOutcome::Empty => {}
        SearchOutcome::NotFound => println!("No Encontrado: la búsqueda no tuvo resultados."),
        SearchOutcome::Error(message) => println!("Error: {message}"),
        SearchOutcome::Results(addresses) => {
            for (i, address) in addresses.iter().enumerate() {
                let marker = if address.is_selectable() { ' ' } else { '…' };
                println!("  {}.{marker} {}", i + 1, highlight(address, query));
            }
        }
    }
}

/// Wraps the part of the address matching the query in brackets.
fn highlight(address: &Address, query: &str) -> String {
    let text = address.display_text();
    match address.match_range(query) {
        Some(range) => format!(
            "{}[{}]{}",
            &text[..range.start],
            &text[range.clone()],
            &text[range.end..]
        ),
        None => text.to_string(),
    }
}

fn print_committed(address: &Address) {
    println!("Selected: {}", address.full_text());
    if let Some(coordinates) = address.coordinates() {
        println!("  x={} y={} srid={:?}", coordinates.x, coordinates.y, coordinates.srid);
    }
}
