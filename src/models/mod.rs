use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod candidate;
pub mod list_item;
pub mod settings;

pub use candidate::Candidate;
pub use list_item::ListItem;
pub use settings::{
    CastCrewPreferences, IntroPool, Settings, Templates, Thresholds, UxPrompts, Weights,
};

/// Kind of title handled by the recommender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Film,
    Serie,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Film => "film",
            MediaType::Serie => "serie",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "film" => Ok(MediaType::Film),
            "serie" => Ok(MediaType::Serie),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// One of the three user lists. Each list lives under its own store key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Ratings,
    Parked,
    Rejects,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Ratings, Collection::Parked, Collection::Rejects];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Ratings => "ratings",
            Collection::Parked => "parked",
            Collection::Rejects => "rejects",
        }
    }

    /// Ratings items carry `rated_at`, the other lists `added_at`
    pub fn requires_rating(&self) -> bool {
        matches!(self, Collection::Ratings)
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ratings" => Ok(Collection::Ratings),
            "parked" => Ok(Collection::Parked),
            "rejects" => Ok(Collection::Rejects),
            other => Err(format!("unknown collection '{}'", other)),
        }
    }
}
