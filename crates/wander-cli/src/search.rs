use std::path::Path;

use wander_core::{Coordinates, PlainVenue, Venue};
use wander_suggest::{suggest_near, QueryOptions};

use crate::{dump, user_facing, Providers};

/// Kilometres per degree of latitude; good enough for a display column.
const KM_PER_DEGREE: f64 = 111.32;

/// Runs one search and dumps `venues.json` (provider order) and
/// `reordered_venues.json` (suggestion order) into `out_dir`.
///
/// # Errors
///
/// Returns an error if the location cannot be resolved, the search fails or
/// finds nothing, or a dump file cannot be written.
pub(crate) async fn run_search(
    providers: &Providers,
    options: &QueryOptions,
    query: &str,
    location_file: Option<&Path>,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let location = providers.location(location_file).await?;
    let suggestions = suggest_near(location, &providers.foursquare, query, options)
        .await
        .map_err(user_facing)?;

    std::fs::create_dir_all(out_dir)?;
    dump::write_json(&out_dir.join("venues.json"), &suggestions.raw_venues)?;

    let sequence = suggestions.session.navigator().sequence();
    let reordered: Vec<PlainVenue> = sequence.iter().map(Venue::to_plain_record).collect();
    dump::write_json(&out_dir.join("reordered_venues.json"), &reordered)?;

    let reference = suggestions.session.reference();
    println!("{:<5}{:<42}{:>8}", "#", "VENUE", "~KM");
    for (index, venue) in sequence.iter().enumerate() {
        println!(
            "{:<5}{:<42}{:>8.2}",
            index + 1,
            truncate(venue.name(), 40),
            approx_km(reference, venue)
        );
    }
    println!(
        "{} venues for '{query}' written to {}",
        sequence.len(),
        out_dir.display()
    );
    Ok(())
}

fn approx_km(reference: Coordinates, venue: &Venue) -> f64 {
    reference.planar_distance(&venue.coordinates()) * KM_PER_DEGREE
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars - 3).collect::<String>())
    } else {
        text.to_string()
    }
}
