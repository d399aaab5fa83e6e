//! Interactive terminal walk through one query's suggestions.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use wander_core::{DetailProvider, Venue, UNKNOWN_RATING};
use wander_suggest::{suggest_near, Position, QueryOptions, SuggestionSession};

use crate::{user_facing, Providers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Current,
    Next,
    Previous,
    Restart,
    Quit,
}

fn parse_action(input: &str) -> Option<Action> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "c" | "current" => Some(Action::Current),
        "n" | "next" => Some(Action::Next),
        "p" | "prev" | "previous" => Some(Action::Previous),
        "r" | "restart" => Some(Action::Restart),
        "q" | "quit" | "exit" => Some(Action::Quit),
        _ => None,
    }
}

/// Runs a query and then reads navigation commands from stdin until `q` or
/// end of input.
///
/// # Errors
///
/// Returns an error if the location cannot be resolved, the search fails or
/// finds nothing, or the terminal cannot be read.
pub(crate) async fn run_suggest(
    providers: &Providers,
    options: &QueryOptions,
    query: &str,
    location_file: Option<&Path>,
) -> anyhow::Result<()> {
    let location = providers.location(location_file).await?;
    let suggestions = suggest_near(location, &providers.foursquare, query, options)
        .await
        .map_err(user_facing)?;
    let mut session = suggestions.session;

    step(&mut session, &providers.foursquare, Action::Current).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_action(&line) {
            Some(Action::Quit) => break,
            Some(action) => step(&mut session, &providers.foursquare, action).await,
            None => println!("unknown command '{}'", line.trim()),
        }
    }
    Ok(())
}

async fn step(session: &mut SuggestionSession, details: &dyn DetailProvider, action: Action) {
    let navigator = session.navigator_mut();
    let moved = match action {
        Action::Current | Action::Quit => navigator.current(details).await,
        Action::Next => navigator.next(details).await,
        Action::Previous => navigator.previous(details).await,
        Action::Restart => navigator.restart(details).await,
    }
    .map(render_venue);

    match moved {
        Ok(text) => {
            println!("{text}");
            println!("{}", render_position(navigator.position()));
        }
        Err(e) => {
            tracing::warn!(error = %e, ?action, "navigation failed");
            println!("{}", e.user_message());
        }
    }
}

fn render_venue(venue: &Venue) -> String {
    let record = venue.to_plain_record();
    let mut lines = vec![record.name.clone()];
    if !record.location.formatted_address.is_empty() {
        lines.push(format!("  {}", record.location.formatted_address.join(", ")));
    }
    match record.rating {
        Some(rating) if (rating - UNKNOWN_RATING).abs() > f64::EPSILON => {
            lines.push(format!("  Rating: {rating:.1}/10"));
        }
        _ => lines.push("  Rating: not rated".to_string()),
    }
    if let Some(hours) = record.hours.as_deref() {
        lines.push(format!("  Hours: {hours}"));
    }
    for (label, value) in record.contacts.iter().flatten() {
        lines.push(format!("  {label}: {value}"));
    }
    let optional = [
        ("About", record.description.as_deref()),
        ("Website", record.url.as_deref()),
        ("Foursquare", record.canonical_url.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(format!("  {label}: {value}"));
        }
    }
    lines.push(format!("  Map: {}", venue.maps_link()));
    lines.join("\n")
}

fn render_position(position: Position) -> String {
    let mut hints = Vec::new();
    if position.has_next {
        hints.push("n: next");
    }
    if position.has_previous {
        hints.push("p: previous");
        hints.push("r: restart");
    }
    if !position.has_next {
        hints.push("no further suggestions");
    }
    hints.push("q: quit");
    format!(
        "[{}/{}]  {}",
        position.position + 1,
        position.total,
        hints.join("  ")
    )
}
