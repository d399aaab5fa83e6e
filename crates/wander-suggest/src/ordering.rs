//! Distance-weighted random ordering of venues.
//!
//! Each venue is weighted by the inverse of its planar distance from the
//! reference point, the weights are blended toward uniform by a smoothing
//! coefficient, and a full permutation is drawn by weighted sampling without
//! replacement. Closer venues tend to come first; every venue appears exactly
//! once.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use wander_core::{Coordinates, RawVenue, Venue};

/// Default blend toward uniform ordering.
pub const DEFAULT_SMOOTHING: f64 = 0.25;

/// Distance floor in degrees (about 11 cm at the equator). A venue at the
/// reference point gets a large but finite weight.
const MIN_DISTANCE: f64 = 1e-6;

/// Tolerance for "sums to one" and "all probabilities equal".
const TOLERANCE: f64 = 1e-9;

/// Reasons a distance distribution could not be computed. Never surfaced to
/// users: [`distance_weighted_order`] logs it and orders uniformly instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegenerateWeighting {
    #[error("smoothing coefficient {0} is outside [0, 1]")]
    InvalidSmoothing(f64),

    #[error("reference location has non-finite coordinates")]
    NonFiniteReference,

    #[error("venue {0} has non-finite coordinates")]
    NonFiniteVenue(String),

    #[error("weights do not form a distribution (sum = {0})")]
    InvalidTotal(f64),
}

/// Selection probability for each venue, index-aligned with `venues`.
///
/// `p_i = w'_i / Σw'` where `w'_i = (1 - s) · w_i + s · Σw` and
/// `w_i = 1 / max(distance_i, MIN_DISTANCE)`. At `s = 0` this is pure
/// inverse-distance; at `s = 1` every venue is equally likely.
///
/// # Errors
///
/// Returns [`DegenerateWeighting`] if `smoothing` is outside `[0, 1]`, any
/// coordinate is non-finite, or the weights do not sum to a positive finite
/// value.
pub fn latlng_distribution(
    venues: &[Venue],
    reference: Coordinates,
    smoothing: f64,
) -> Result<Vec<f64>, DegenerateWeighting> {
    if !(0.0..=1.0).contains(&smoothing) {
        return Err(DegenerateWeighting::InvalidSmoothing(smoothing));
    }
    if !reference.is_finite() {
        return Err(DegenerateWeighting::NonFiniteReference);
    }
    if venues.is_empty() {
        return Ok(Vec::new());
    }

    let weights = venues
        .iter()
        .map(|venue| {
            let coords = venue.coordinates();
            if !coords.is_finite() {
                return Err(DegenerateWeighting::NonFiniteVenue(venue.id().to_string()));
            }
            Ok(1.0 / reference.planar_distance(&coords).max(MIN_DISTANCE))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let total = checked_total(&weights)?;
    let blended: Vec<f64> = weights
        .iter()
        .map(|w| (1.0 - smoothing) * w + smoothing * total)
        .collect();
    let blended_total = checked_total(&blended)?;

    let probabilities: Vec<f64> = blended.iter().map(|w| w / blended_total).collect();
    let sum: f64 = probabilities.iter().sum();
    if (sum - 1.0).abs() > TOLERANCE {
        return Err(DegenerateWeighting::InvalidTotal(sum));
    }
    Ok(probabilities)
}

/// Orders `venues` into a distance-biased random permutation.
///
/// When the distribution is uniform the input is shuffled directly; when it
/// cannot be computed at all the failure is logged and a uniform shuffle is
/// used. The output always contains every input venue exactly once.
pub fn distance_weighted_order<R: Rng + ?Sized>(
    venues: Vec<Venue>,
    reference: Coordinates,
    smoothing: f64,
    rng: &mut R,
) -> Vec<Venue> {
    if venues.len() < 2 {
        return venues;
    }

    let probabilities = latlng_distribution(&venues, reference, smoothing).unwrap_or_else(|e| {
        tracing::warn!(
            error = %e,
            venues = venues.len(),
            "distance weighting failed, falling back to uniform order"
        );
        uniform(venues.len())
    });

    if is_uniform(&probabilities) {
        let mut shuffled = venues;
        shuffled.shuffle(rng);
        return shuffled;
    }

    sample_without_replacement(venues, probabilities, rng)
}

/// Builds venue records from raw search results and orders them with the
/// thread-local RNG.
#[must_use]
pub fn order_suggestions(
    raw_venues: Vec<RawVenue>,
    reference: Coordinates,
    smoothing: f64,
) -> Vec<Venue> {
    let venues = raw_venues.into_iter().map(Venue::from).collect();
    distance_weighted_order(venues, reference, smoothing, &mut rand::rng())
}

fn checked_total(weights: &[f64]) -> Result<f64, DegenerateWeighting> {
    let total: f64 = weights.iter().sum();
    if total.is_finite() && total > 0.0 {
        Ok(total)
    } else {
        Err(DegenerateWeighting::InvalidTotal(total))
    }
}

fn uniform(n: usize) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let share = 1.0 / n as f64;
    vec![share; n]
}

fn is_uniform(probabilities: &[f64]) -> bool {
    probabilities.first().is_none_or(|first| {
        probabilities
            .iter()
            .all(|p| (p - first).abs() <= TOLERANCE)
    })
}

/// Draws venues one at a time. After each draw the remaining probabilities are
/// divided by `1 - p_drawn`, which keeps each draw proportional to the
/// original weights among the venues still in play.
fn sample_without_replacement<R: Rng + ?Sized>(
    venues: Vec<Venue>,
    probabilities: Vec<f64>,
    rng: &mut R,
) -> Vec<Venue> {
    let mut candidates: Vec<(Venue, f64)> = venues.into_iter().zip(probabilities).collect();
    let mut ordered = Vec::with_capacity(candidates.len());

    while !candidates.is_empty() {
        let index = draw_index(&candidates, rng.random::<f64>());
        let (venue, drawn) = candidates.remove(index);
        ordered.push(venue);
        renormalize(&mut candidates, drawn);
    }

    ordered
}

fn draw_index(candidates: &[(Venue, f64)], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, (_, p)) in candidates.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return index;
        }
    }
    // Rounding can leave the cumulative sum a hair under one.
    candidates.len() - 1
}

fn renormalize(candidates: &mut [(Venue, f64)], drawn: f64) {
    if candidates.is_empty() {
        return;
    }

    let remaining = 1.0 - drawn;
    let actual: f64 = candidates.iter().map(|(_, p)| p).sum();
    // Repeated division drifts; fall back to the real sum when it does.
    let divisor = if remaining.is_finite()
        && remaining > TOLERANCE
        && (actual - remaining).abs() <= TOLERANCE
    {
        remaining
    } else {
        actual
    };

    if divisor.is_finite() && divisor > 0.0 {
        for (_, p) in candidates.iter_mut() {
            *p /= divisor;
        }
    } else {
        tracing::warn!(
            remaining = candidates.len(),
            "remaining probabilities vanished, drawing the rest uniformly"
        );
        let share = uniform(candidates.len())[0];
        for (_, p) in candidates.iter_mut() {
            *p = share;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wander_core::VenueLocation;

    use super::*;

    fn venue_at(id: &str, lat: f64, lng: f64) -> Venue {
        Venue::from(RawVenue {
            id: id.to_string(),
            name: format!("Venue {id}"),
            location: VenueLocation {
                lat,
                lng,
                formatted_address: Vec::new(),
            },
        })
    }

    fn ids(venues: &[Venue]) -> Vec<String> {
        venues.iter().map(|v| v.id().to_string()).collect()
    }

    const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    #[test]
    fn output_is_a_permutation_of_the_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let venues: Vec<Venue> = (0..25u32)
            .map(|i| venue_at(&format!("v{i}"), f64::from(i) * 0.003 + 0.001, 0.002))
            .collect();
        let expected: HashSet<String> = ids(&venues).into_iter().collect();

        for smoothing in [0.0, 0.1, DEFAULT_SMOOTHING, 0.9, 1.0] {
            let ordered = distance_weighted_order(venues.clone(), ORIGIN, smoothing, &mut rng);
            assert_eq!(ordered.len(), venues.len());
            let got: HashSet<String> = ids(&ordered).into_iter().collect();
            assert_eq!(got, expected, "smoothing {smoothing}");
        }
    }

    #[test]
    fn empty_and_single_inputs_pass_through() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(distance_weighted_order(Vec::new(), ORIGIN, 0.25, &mut rng).is_empty());

        let one = vec![venue_at("solo", 0.01, 0.01)];
        let ordered = distance_weighted_order(one, ORIGIN, 0.25, &mut rng);
        assert_eq!(ids(&ordered), vec!["solo"]);
    }

    #[test]
    fn inverse_distance_probabilities_for_two_venues() {
        // "a" is 1 unit away, "b" is 5 units away.
        let venues = vec![venue_at("a", 0.01, 0.0), venue_at("b", 0.05, 0.0)];
        let p = latlng_distribution(&venues, ORIGIN, 0.0).unwrap();
        assert!((p[0] - 5.0 / 6.0).abs() < 1e-9, "p_a = {}", p[0]);
        assert!((p[1] - 1.0 / 6.0).abs() < 1e-9, "p_b = {}", p[1]);
    }

    #[test]
    fn nearer_venue_is_drawn_first_in_proportion_to_its_weight() {
        let mut rng = StdRng::seed_from_u64(42);
        let venues = vec![venue_at("a", 0.01, 0.0), venue_at("b", 0.05, 0.0)];
        let trials = 10_000;
        let a_first = (0..trials)
            .filter(|_| {
                distance_weighted_order(venues.clone(), ORIGIN, 0.0, &mut rng)[0].id() == "a"
            })
            .count();
        #[allow(clippy::cast_precision_loss)]
        let share = a_first as f64 / f64::from(trials);
        assert!((0.80..0.87).contains(&share), "a drawn first {share}");
    }

    #[test]
    fn closest_of_three_leads_more_often_than_farthest() {
        let mut rng = StdRng::seed_from_u64(2024);
        let venues = vec![
            venue_at("far", 0.03, 0.0),
            venue_at("near", 0.01, 0.0),
            venue_at("mid", 0.0, 0.02),
        ];
        let mut near_first = 0;
        let mut far_first = 0;
        for _ in 0..3_000 {
            match distance_weighted_order(venues.clone(), ORIGIN, 0.0, &mut rng)[0].id() {
                "near" => near_first += 1,
                "far" => far_first += 1,
                _ => {}
            }
        }
        assert!(
            near_first > far_first,
            "near first {near_first} times, far first {far_first} times"
        );
    }

    #[test]
    fn full_smoothing_is_uniform() {
        let venues = vec![
            venue_at("a", 0.01, 0.0),
            venue_at("b", 0.05, 0.0),
            venue_at("c", 0.2, 0.3),
        ];
        let p = latlng_distribution(&venues, ORIGIN, 1.0).unwrap();
        assert!(is_uniform(&p), "{p:?}");
    }

    #[test]
    fn equidistant_venues_take_the_shuffle_path() {
        let venues = vec![
            venue_at("n", 1.0, 0.0),
            venue_at("e", 0.0, 1.0),
            venue_at("s", -1.0, 0.0),
            venue_at("w", 0.0, -1.0),
        ];
        let p = latlng_distribution(&venues, ORIGIN, 0.0).unwrap();
        assert!(is_uniform(&p));

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let ordered = distance_weighted_order(venues.clone(), ORIGIN, 0.0, &mut rng);
            let mut got = ids(&ordered);
            got.sort();
            assert_eq!(got, vec!["e", "n", "s", "w"]);
        }
    }

    #[test]
    fn venue_at_the_reference_point_gets_a_finite_weight() {
        let venues = vec![venue_at("here", 0.0, 0.0), venue_at("there", 0.01, 0.0)];
        let p = latlng_distribution(&venues, ORIGIN, 0.0).unwrap();
        assert!(p.iter().all(|x| x.is_finite()));
        assert!(p[0] > 0.99);

        let mut rng = StdRng::seed_from_u64(9);
        let ordered = distance_weighted_order(venues, ORIGIN, 0.0, &mut rng);
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn invalid_inputs_are_degenerate() {
        let venues = vec![venue_at("a", 0.01, 0.0), venue_at("b", f64::NAN, 0.0)];
        assert_eq!(
            latlng_distribution(&venues, ORIGIN, 0.0),
            Err(DegenerateWeighting::NonFiniteVenue("b".to_string()))
        );
        assert!(matches!(
            latlng_distribution(&venues[..1], ORIGIN, 1.5),
            Err(DegenerateWeighting::InvalidSmoothing(_))
        ));
        assert_eq!(
            latlng_distribution(&venues[..1], Coordinates::new(f64::INFINITY, 0.0), 0.0),
            Err(DegenerateWeighting::NonFiniteReference)
        );
    }

    #[test]
    fn degenerate_weighting_falls_back_to_a_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let venues = vec![
            venue_at("a", 0.01, 0.0),
            venue_at("b", f64::NAN, 0.0),
            venue_at("c", 0.02, 0.0),
        ];
        let ordered = distance_weighted_order(venues, ORIGIN, 0.0, &mut rng);
        let mut got = ids(&ordered);
        got.sort();
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn draw_index_clamps_to_the_last_candidate() {
        let candidates = vec![(venue_at("a", 0.0, 0.0), 0.5), (venue_at("b", 0.0, 0.0), 0.499_999)];
        assert_eq!(draw_index(&candidates, 0.2), 0);
        assert_eq!(draw_index(&candidates, 0.7), 1);
        assert_eq!(draw_index(&candidates, 0.999_999_9), 1);
    }

    #[test]
    fn renormalize_restores_a_distribution() {
        let mut candidates = vec![(venue_at("b", 0.0, 0.0), 0.3), (venue_at("c", 0.0, 0.0), 0.2)];
        renormalize(&mut candidates, 0.5);
        assert!((candidates[0].1 - 0.6).abs() < 1e-12);
        assert!((candidates[1].1 - 0.4).abs() < 1e-12);

        let mut vanished = vec![(venue_at("x", 0.0, 0.0), 0.0), (venue_at("y", 0.0, 0.0), 0.0)];
        renormalize(&mut vanished, 1.0);
        assert!((vanished[0].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn order_suggestions_builds_unhydrated_records() {
        let raw = vec![
            RawVenue {
                id: "a".to_string(),
                name: "A".to_string(),
                location: VenueLocation {
                    lat: 0.01,
                    lng: 0.0,
                    formatted_address: Vec::new(),
                },
            },
            RawVenue {
                id: "b".to_string(),
                name: "B".to_string(),
                location: VenueLocation {
                    lat: 0.02,
                    lng: 0.0,
                    formatted_address: Vec::new(),
                },
            },
        ];
        let ordered = order_suggestions(raw, ORIGIN, DEFAULT_SMOOTHING);
        assert_eq!(ordered.len(), 2);
        assert!(ordered.iter().all(|v| !v.is_hydrated()));
    }
}
