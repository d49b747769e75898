//! Catalog sources for recommendation candidates
//!
//! The selector only needs a fresh pool of candidates for a (type, genre)
//! query. Sources pre-filter what they return, and never fail: an upstream
//! error is logged and reported as an empty pool.

use crate::models::{Candidate, MediaType, Thresholds};
use crate::services::genre::spectator_threshold;

pub mod allocine;

pub use allocine::AllocineSource;

/// Provider of raw catalog candidates
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Candidates of `media_type` matching the free-text `genre`
    ///
    /// Every returned candidate has a poster and a spectator rating strictly
    /// above the threshold for `genre`. Errors yield an empty vector.
    async fn fetch_candidates(
        &self,
        media_type: MediaType,
        genre: &str,
        thresholds: &Thresholds,
    ) -> Vec<Candidate>;

    /// Source name for logging and diagnostics
    fn name(&self) -> &'static str;
}

/// Drops candidates a source must not return
pub fn retain_eligible(
    candidates: Vec<Candidate>,
    media_type: MediaType,
    genre: &str,
    thresholds: &Thresholds,
) -> Vec<Candidate> {
    let threshold = spectator_threshold(thresholds, genre);
    candidates
        .into_iter()
        .filter(|c| c.media_type == media_type)
        .filter(|c| c.has_poster())
        .filter(|c| c.spectateurs.is_some_and(|s| s > threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, media_type: MediaType, spectateurs: Option<f64>, poster: bool) -> Candidate {
        Candidate {
            titre: key.to_string(),
            annee: "2001".to_string(),
            media_type,
            genres: vec!["Horreur".to_string()],
            presse: Some(3.0),
            spectateurs,
            accroche: String::new(),
            affiche_url: poster.then(|| format!("https://img.example/{}.jpg", key)),
            cast: vec![],
            crew: vec![],
            canonical_key: key.to_string(),
            duree: None,
        }
    }

    #[test]
    fn test_retain_eligible_applies_contract() {
        let pool = vec![
            candidate("ok", MediaType::Film, Some(3.1), true),
            candidate("at-threshold", MediaType::Film, Some(3.0), true),
            candidate("no-rating", MediaType::Film, None, true),
            candidate("no-poster", MediaType::Film, Some(4.5), false),
            candidate("serie", MediaType::Serie, Some(4.5), true),
        ];

        let kept = retain_eligible(pool, MediaType::Film, "drame", &Thresholds::default());
        let keys: Vec<_> = kept.iter().map(|c| c.canonical_key.as_str()).collect();
        assert_eq!(keys, vec!["ok"]);
    }

    #[test]
    fn test_retain_eligible_uses_horror_threshold() {
        let pool = vec![candidate("scream", MediaType::Film, Some(2.8), true)];
        let kept = retain_eligible(pool, MediaType::Film, "épouvante", &Thresholds::default());
        assert_eq!(kept.len(), 1);
    }
}
