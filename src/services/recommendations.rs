use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::KvStore;
use crate::error::{AppError, AppResult};
use crate::models::{Candidate, MediaType, Settings, Thresholds};
use crate::services::card::{format_note, pick_intro, render_card};
use crate::services::genre::{genre_matches, spectator_threshold};
use crate::services::lists::ListStore;
use crate::services::normalize::normalize_key;
use crate::services::providers::CandidateSource;
use crate::services::scoring::{EffectiveWeights, ScoreComponents, ScoringEngine};
use crate::services::settings::load_settings;

const NO_RECOMMENDATION: &str = "no valid recommendation";

/// Candidate with its score, as returned under `raw`
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
    pub components: ScoreComponents,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notes {
    pub spectateurs: String,
    pub presse: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub weights: EffectiveWeights,
    pub components: ScoreComponents,
}

/// The single "next recommendation"
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub titre: String,
    pub formatted_card: String,
    pub poster_url: Option<String>,
    pub notes: Notes,
    pub score_breakdown: ScoreBreakdown,
    pub raw: ScoredCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
}

/// Picks the next title to suggest
///
/// Holds no state between calls: lists and settings are read fresh and the
/// catalog is queried every time.
pub struct RecommendationSelector {
    lists: ListStore,
    store: Arc<dyn KvStore>,
    source: Arc<dyn CandidateSource>,
}

impl RecommendationSelector {
    pub fn new(lists: ListStore, store: Arc<dyn KvStore>, source: Arc<dyn CandidateSource>) -> Self {
        Self {
            lists,
            store,
            source,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn recommend(
        &self,
        media_type: Option<&str>,
        genre: Option<&str>,
    ) -> AppResult<Recommendation> {
        let (media_type, genre) = parse_request(media_type, genre)?;

        let (settings, lists) = tokio::try_join!(
            load_settings(self.store.as_ref()),
            self.lists.read_all()
        )?;
        let exclusions = lists.exclusion_set();

        let pool = self
            .source
            .fetch_candidates(media_type, &genre, &settings.thresholds)
            .await;
        let pool_size = pool.len();

        let candidates = filter_pool(pool, media_type, &genre, &exclusions, &settings.thresholds);
        tracing::debug!(
            media_type = %media_type,
            genre = %genre,
            pool_size,
            eligible = candidates.len(),
            excluded = exclusions.len(),
            "Candidate pool filtered"
        );
        if candidates.is_empty() {
            return Err(AppError::NotFound(NO_RECOMMENDATION.to_string()));
        }

        let engine = ScoringEngine::new(&settings, &lists.ratings);
        let best = select_best(&engine, candidates, &exclusions)
            .ok_or_else(|| AppError::NotFound(NO_RECOMMENDATION.to_string()))?;

        tracing::info!(
            media_type = %media_type,
            genre = %genre,
            canonical_key = %best.candidate.canonical_key,
            score = best.score,
            "Recommendation selected"
        );

        Ok(build_recommendation(&settings, engine.weights(), best))
    }
}

/// Validates the query; `genre` is kept trimmed
pub fn parse_request(media_type: Option<&str>, genre: Option<&str>) -> AppResult<(MediaType, String)> {
    let media_type = media_type
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default()
        .parse::<MediaType>()
        .map_err(|_| AppError::Validation("type must be 'film' or 'serie'".to_string()))?;

    let genre = genre.map(str::trim).unwrap_or_default();
    if genre.is_empty() {
        return Err(AppError::Validation("genre required".to_string()));
    }

    Ok((media_type, genre.to_string()))
}

/// Keeps candidates that may be recommended, in pool order
pub fn filter_pool(
    pool: Vec<Candidate>,
    media_type: MediaType,
    genre: &str,
    exclusions: &HashSet<String>,
    thresholds: &Thresholds,
) -> Vec<Candidate> {
    let threshold = spectator_threshold(thresholds, genre);
    pool.into_iter()
        .filter(|c| c.media_type == media_type)
        .filter(|c| genre_matches(genre, &c.genres))
        .filter(|c| !exclusions.contains(&normalize_key(&c.canonical_key)))
        .filter(|c| c.spectateurs.is_some_and(|s| s > threshold))
        .filter(|c| c.has_poster())
        .filter(|c| c.presse.is_some())
        .collect()
}

/// Highest score wins; ties keep pool order
pub fn select_best(
    engine: &ScoringEngine<'_>,
    candidates: Vec<Candidate>,
    exclusions: &HashSet<String>,
) -> Option<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let (score, components) = engine.score(&candidate);
            ScoredCandidate {
                candidate,
                score,
                components,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    scored
        .into_iter()
        .find(|s| !exclusions.contains(&normalize_key(&s.candidate.canonical_key)))
}

pub fn build_recommendation(
    settings: &Settings,
    weights: EffectiveWeights,
    best: ScoredCandidate,
) -> Recommendation {
    let candidate = &best.candidate;
    let seed = if candidate.canonical_key.is_empty() {
        candidate.titre.as_str()
    } else {
        candidate.canonical_key.as_str()
    };

    Recommendation {
        titre: candidate.titre.clone(),
        formatted_card: render_card(&settings.templates.l1_card, candidate),
        poster_url: candidate.affiche_url.clone(),
        notes: Notes {
            spectateurs: format_note(candidate.spectateurs),
            presse: format_note(candidate.presse),
        },
        score_breakdown: ScoreBreakdown {
            weights,
            components: best.components,
        },
        intro: pick_intro(&settings.ux_prompts.l1_intro_pool, seed),
        raw: best,
    }
}
