use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Candidate, CastCrewPreferences, ListItem, Settings, Weights};
use crate::services::normalize::normalize_key;

/// User-preference score when history says nothing about the candidate
const NEUTRAL_USER_PREF: f64 = 0.2;
const CASTCREW_BASELINE: f64 = 0.5;
const FAVORITE_BONUS_CAP: f64 = 0.4;
const BLACKLIST_MALUS_CAP: f64 = 0.5;

/// Clamps to [0, 1]; non-finite values become 0
pub fn clamp01(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Weights actually applied, always summing to 1
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EffectiveWeights {
    pub allocine: f64,
    pub user_pref: f64,
    pub castcrew: f64,
}

impl EffectiveWeights {
    /// Renormalizes configured weights
    ///
    /// Negative or non-finite weights count as 0. If nothing positive is left,
    /// the built-in defaults apply.
    pub fn from_config(weights: &Weights) -> Self {
        let sanitize = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let allocine = sanitize(weights.allocine);
        let user_pref = sanitize(weights.user_pref);
        let castcrew = sanitize(weights.castcrew);
        let total = allocine + user_pref + castcrew;

        if !(total.is_finite() && total > 0.0) {
            return Self::from_config(&Weights::default());
        }

        Self {
            allocine: allocine / total,
            user_pref: user_pref / total,
            castcrew: castcrew / total,
        }
    }

    pub fn sum(&self) -> f64 {
        self.allocine + self.user_pref + self.castcrew
    }
}

/// Per-component values, each in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoreComponents {
    pub allocine: f64,
    pub user_pref: f64,
    pub castcrew: f64,
}

/// Catalog quality: spectators weigh 0.7, press 0.3
///
/// Without a press rating the spectator value stands in for it.
pub fn quality_component(candidate: &Candidate) -> f64 {
    let spectators = clamp01(candidate.spectateurs.unwrap_or(f64::NAN) / 5.0);
    let press = match candidate.presse {
        Some(value) if value.is_finite() => clamp01(value / 5.0),
        _ => spectators,
    };
    clamp01(spectators * 0.7 + press * 0.3)
}

/// Affinity from the user's ratings of same-type titles sharing a genre
pub fn user_preference_component(history: &[ListItem], candidate: &Candidate) -> f64 {
    if history.is_empty() {
        return NEUTRAL_USER_PREF;
    }
    let candidate_genres: HashSet<String> =
        candidate.genres.iter().map(|g| g.to_lowercase()).collect();
    if candidate_genres.is_empty() {
        return NEUTRAL_USER_PREF;
    }

    let relevant: Vec<&ListItem> = history
        .iter()
        .filter(|item| item.media_type == Some(candidate.media_type))
        .filter(|item| {
            item.genres
                .iter()
                .any(|g| candidate_genres.contains(&g.to_lowercase()))
        })
        .collect();
    if relevant.is_empty() {
        return NEUTRAL_USER_PREF;
    }

    let count = relevant.len() as f64;
    let sum: f64 = relevant
        .iter()
        .map(|item| item.rating.filter(|r| r.is_finite()).unwrap_or(0.0))
        .sum();
    // [2, 5] -> [0, 1]
    let mean = clamp01((sum / count - 2.0) / 3.0);

    let shared: usize = relevant
        .iter()
        .map(|item| {
            item.genres
                .iter()
                .filter(|g| candidate_genres.contains(&g.to_lowercase()))
                .count()
        })
        .sum();
    let coverage = clamp01(shared as f64 / (candidate_genres.len() as f64 * count));

    clamp01(mean * 0.8 + coverage * 0.2)
}

/// Normalized favorite and blacklisted names
#[derive(Debug, Clone, Default)]
pub struct PeoplePreferences {
    favorites: HashSet<String>,
    favorites_len: usize,
    blacklist: HashSet<String>,
    blacklist_len: usize,
}

impl PeoplePreferences {
    pub fn from_config(prefs: &CastCrewPreferences) -> Self {
        let normalize_all = |names: &[String]| -> Vec<String> {
            names
                .iter()
                .map(|name| normalize_key(name))
                .filter(|name| !name.is_empty())
                .collect()
        };
        let favorites = normalize_all(&prefs.favorites);
        let blacklist = normalize_all(&prefs.blacklist);

        Self {
            favorites_len: favorites.len(),
            favorites: favorites.into_iter().collect(),
            blacklist_len: blacklist.len(),
            blacklist: blacklist.into_iter().collect(),
        }
    }
}

/// Bonus for favorite people in cast or crew, malus for blacklisted ones
pub fn cast_crew_component(candidate: &Candidate, people: &PeoplePreferences) -> f64 {
    let participants: Vec<String> = candidate
        .cast
        .iter()
        .chain(candidate.crew.iter())
        .map(|name| normalize_key(name))
        .filter(|name| !name.is_empty())
        .collect();

    if participants.is_empty() {
        return if people.favorites_len > 0 {
            0.0
        } else {
            CASTCREW_BASELINE
        };
    }

    let mut score = CASTCREW_BASELINE;
    if people.favorites_len > 0 {
        let matches = participants
            .iter()
            .filter(|p| people.favorites.contains(*p))
            .count();
        score += (matches as f64 / people.favorites_len as f64).min(FAVORITE_BONUS_CAP);
    }
    if people.blacklist_len > 0 {
        let matches = participants
            .iter()
            .filter(|p| people.blacklist.contains(*p))
            .count();
        score -= (matches as f64 / people.blacklist_len as f64).min(BLACKLIST_MALUS_CAP);
    }
    clamp01(score)
}

/// Scores candidates against one user's history and settings
pub struct ScoringEngine<'a> {
    weights: EffectiveWeights,
    people: PeoplePreferences,
    history: &'a [ListItem],
}

impl<'a> ScoringEngine<'a> {
    pub fn new(settings: &Settings, history: &'a [ListItem]) -> Self {
        Self {
            weights: EffectiveWeights::from_config(&settings.weights),
            people: PeoplePreferences::from_config(settings.castcrew_preferences()),
            history,
        }
    }

    pub fn weights(&self) -> EffectiveWeights {
        self.weights
    }

    /// Final score in [0, 1] and the components it was built from
    pub fn score(&self, candidate: &Candidate) -> (f64, ScoreComponents) {
        let components = ScoreComponents {
            allocine: quality_component(candidate),
            user_pref: user_preference_component(self.history, candidate),
            castcrew: cast_crew_component(candidate, &self.people),
        };
        let score = self.weights.allocine * components.allocine
            + self.weights.user_pref * components.user_pref
            + self.weights.castcrew * components.castcrew;
        (clamp01(score), components)
    }
}
