use serde::{Deserialize, Serialize};

use super::MediaType;

/// A title proposed by the catalog, before filtering and scoring
///
/// Ratings are on a 0-5 scale. `presse` is absent when the catalog has no
/// press aggregate for the title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub titre: String,
    #[serde(default)]
    pub annee: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub genres: Vec<String>,
    pub presse: Option<f64>,
    pub spectateurs: Option<f64>,
    #[serde(default)]
    pub accroche: String,
    pub affiche_url: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
    pub canonical_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duree: Option<String>,
}

impl Candidate {
    pub fn has_poster(&self) -> bool {
        self.affiche_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}
