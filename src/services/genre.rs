use crate::models::Thresholds;
use crate::services::normalize::normalize_key;

/// Query words that select the horror threshold
const HORROR_MARKERS: [&str; 6] = ["horreur", "epouvante", "frisson", "gore", "peur", "horror"];

/// Query words meaning "no genre filter"
const ALL_GENRES_MARKERS: [&str; 4] = ["tous", "toutes", "all", "any"];

pub fn is_horror_query(genre: &str) -> bool {
    let key = normalize_key(genre);
    HORROR_MARKERS.iter().any(|marker| key.contains(marker))
}

pub fn is_all_genres_query(genre: &str) -> bool {
    normalize_key(genre)
        .split('-')
        .any(|word| ALL_GENRES_MARKERS.contains(&word))
}

/// Spectator rating a candidate must strictly exceed for this query
pub fn spectator_threshold(thresholds: &Thresholds, genre: &str) -> f64 {
    if is_horror_query(genre) {
        thresholds.horror
    } else {
        thresholds.default
    }
}

/// Case-insensitive substring match of the query against any candidate genre
pub fn genre_matches(genre: &str, candidate_genres: &[String]) -> bool {
    if is_all_genres_query(genre) {
        return true;
    }
    let needle = genre.trim().to_lowercase();
    candidate_genres
        .iter()
        .any(|g| g.to_lowercase().contains(&needle))
}
