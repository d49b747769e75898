//! Allociné v3 search API
//!
//! One call per request: `/search` with the genre as free text, filtered to
//! movies or TV series. Ratings in the feed are already on a 0-5 scale.

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, MediaType, Thresholds},
    services::normalize::normalize_key,
    services::providers::{retain_eligible, CandidateSource},
};

#[derive(Clone)]
pub struct AllocineSource {
    http_client: HttpClient,
    api_url: String,
    partner_code: Option<String>,
    result_count: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    feed: Option<Feed>,
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    movie: Vec<FeedItem>,
    #[serde(default)]
    tvseries: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    title: Option<String>,
    original_title: Option<String>,
    production_year: Option<Value>,
    year_start: Option<Value>,
    #[serde(default)]
    genre: Vec<GenreEntry>,
    statistics: Option<Statistics>,
    synopsis_short: Option<String>,
    synopsis: Option<String>,
    poster: Option<Poster>,
    casting_short: Option<CastingShort>,
    runtime: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenreEntry {
    Labeled {
        #[serde(rename = "$")]
        label: String,
    },
    Named {
        name: String,
    },
    Plain(String),
}

impl GenreEntry {
    fn into_label(self) -> String {
        match self {
            GenreEntry::Labeled { label } => label,
            GenreEntry::Named { name } => name,
            GenreEntry::Plain(label) => label,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    press_rating: Option<Value>,
    user_rating: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Poster {
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CastingShort {
    actors: Option<String>,
    directors: Option<String>,
}

impl AllocineSource {
    pub fn new(
        api_url: String,
        partner_code: Option<String>,
        result_count: u32,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        let partner_code = partner_code.filter(|code| !code.trim().is_empty());

        if partner_code.is_none() {
            tracing::warn!("No Allociné partner code configured, candidate pools will be empty");
        }

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            partner_code,
            result_count,
        })
    }

    async fn search(&self, partner: &str, media_type: MediaType, genre: &str) -> AppResult<Vec<Candidate>> {
        let url = format!("{}/search", self.api_url);
        let filter = match media_type {
            MediaType::Film => "movie",
            MediaType::Serie => "tvseries",
        };
        let count = self.result_count.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("partner", partner),
                ("filter", filter),
                ("count", count.as_str()),
                ("q", genre),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Allociné API returned status {}: {}",
                status, body
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to deserialize Allociné response");
            AppError::ExternalApi(format!("Failed to parse Allociné response: {}", e))
        })?;
        let candidates = feed_candidates(body, media_type);

        tracing::info!(
            genre = %genre,
            media_type = %media_type,
            results = candidates.len(),
            provider = "allocine",
            "Catalog search completed"
        );

        Ok(candidates)
    }
}

#[async_trait::async_trait]
impl CandidateSource for AllocineSource {
    async fn fetch_candidates(
        &self,
        media_type: MediaType,
        genre: &str,
        thresholds: &Thresholds,
    ) -> Vec<Candidate> {
        let Some(partner) = self.partner_code.as_deref() else {
            tracing::debug!("Skipping catalog search, no partner code");
            return Vec::new();
        };

        match self.search(partner, media_type, genre).await {
            Ok(candidates) => retain_eligible(candidates, media_type, genre, thresholds),
            Err(e) => {
                tracing::warn!(error = %e, genre = %genre, provider = "allocine", "Catalog search failed");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "allocine"
    }
}

fn feed_candidates(response: SearchResponse, media_type: MediaType) -> Vec<Candidate> {
    let feed = response.feed.unwrap_or_default();
    let items = match media_type {
        MediaType::Film => feed.movie,
        MediaType::Serie => feed.tvseries,
    };

    items
        .into_iter()
        .filter_map(|item| parse_item(item, media_type))
        .collect()
}

fn parse_item(item: FeedItem, media_type: MediaType) -> Option<Candidate> {
    let titre = item
        .title
        .filter(|t| !t.trim().is_empty())
        .or(item.original_title)?
        .trim()
        .to_string();
    let annee = item
        .production_year
        .or(item.year_start)
        .map(|year| match year {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    let (presse, spectateurs) = match item.statistics {
        Some(stats) => (
            stats.press_rating.as_ref().and_then(rating_value),
            stats.user_rating.as_ref().and_then(rating_value),
        ),
        None => (None, None),
    };
    let (cast, crew) = match item.casting_short {
        Some(casting) => (
            split_names(casting.actors.as_deref().unwrap_or_default()),
            split_names(casting.directors.as_deref().unwrap_or_default()),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let canonical_key = normalize_key(&format!("{} {}", titre, annee));

    Some(Candidate {
        genres: item.genre.into_iter().map(GenreEntry::into_label).collect(),
        accroche: item.synopsis_short.or(item.synopsis).unwrap_or_default(),
        affiche_url: item.poster.and_then(|p| p.href),
        duree: item.runtime.and_then(format_runtime),
        titre,
        annee,
        media_type,
        presse,
        spectateurs,
        cast,
        crew,
        canonical_key,
    })
}

/// Positive rating from a number or numeric string, rounded to one decimal
fn rating_value(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (rating.is_finite() && rating > 0.0).then(|| (rating * 10.0).round() / 10.0)
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split([',', '/', '•'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Runtime in seconds as "XhYY"
fn format_runtime(seconds: u64) -> Option<String> {
    if seconds == 0 {
        return None;
    }
    let minutes = seconds / 60;
    Some(format!("{}h{:02}", minutes / 60, minutes % 60))
}
