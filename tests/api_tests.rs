use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use recommandateur_api::api::{create_router, AppState};
use recommandateur_api::db::{KvStore, MemoryStore, StoreKey};
use recommandateur_api::models::Collection;
use recommandateur_api::models::{Candidate, MediaType, Thresholds};
use recommandateur_api::services::providers::{retain_eligible, CandidateSource};

/// Catalog returning a fixed pool
struct StaticSource {
    pool: Vec<Candidate>,
}

#[async_trait::async_trait]
impl CandidateSource for StaticSource {
    async fn fetch_candidates(
        &self,
        media_type: MediaType,
        genre: &str,
        thresholds: &Thresholds,
    ) -> Vec<Candidate> {
        retain_eligible(self.pool.clone(), media_type, genre, thresholds)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn film(titre: &str, annee: &str, spectateurs: f64, presse: f64, genres: &[&str]) -> Candidate {
    Candidate {
        titre: titre.to_string(),
        annee: annee.to_string(),
        media_type: MediaType::Film,
        genres: genres.iter().map(|g| g.to_string()).collect(),
        presse: Some(presse),
        spectateurs: Some(spectateurs),
        accroche: format!("À propos de {}", titre),
        affiche_url: Some(format!("https://img.example/{}.jpg", annee)),
        cast: vec!["Jean Reno".to_string()],
        crew: vec!["Luc Besson".to_string()],
        canonical_key: recommandateur_api::services::normalize::normalize_key(&format!(
            "{} {}",
            titre, annee
        )),
        duree: Some("1h50".to_string()),
    }
}

fn create_test_server(pool: Vec<Candidate>) -> TestServer {
    create_test_server_with_store(Arc::new(MemoryStore::new()), pool)
}

fn create_test_server_with_store(store: Arc<dyn KvStore>, pool: Vec<Candidate>) -> TestServer {
    let (state, _writer) = AppState::new(store, Arc::new(StaticSource { pool }));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn default_pool() -> Vec<Candidate> {
    vec![
        film("Léon", "1994", 4.4, 3.9, &["Drame", "Thriller"]),
        film("Nikita", "1990", 4.0, 3.5, &["Action", "Drame"]),
        film("Le Grand Bleu", "1988", 2.9, 3.0, &["Drame"]),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(vec![]);
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "ok": true }));
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let server = create_test_server(vec![]);

    let generated = server.get("/health").await;
    let id = generated.header("x-request-id");
    assert!(!id.is_empty());

    let echoed = server
        .get("/lists/unknown")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("turn-7"),
        )
        .await;
    echoed.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(echoed.header("x-request-id"), "turn-7");
}

#[tokio::test]
async fn test_insert_conflict_and_duplicate() {
    let server = create_test_server(vec![]);

    let response = server
        .post("/lists/ratings")
        .json(&json!({ "canonical_key": "Matrix, The", "rating": 4 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>(), json!({ "ok": true, "added": true }));

    let response = server
        .post("/lists/parked")
        .json(&json!({ "canonical_key": "matrix-the" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "ok": false, "conflict_with": "ratings" })
    );

    let response = server
        .post("/lists/ratings")
        .json(&json!({ "canonical_key": "Matrix, The", "rating": 4 }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "ok": true, "added": false, "reason": "duplicate" })
    );

    let parked: Value = server.get("/lists/parked").await.json();
    assert_eq!(parked["total"], 0);

    let ratings: Value = server.get("/lists/ratings").await.json();
    assert_eq!(ratings["total"], 1);
    assert_eq!(ratings["items"][0]["canonical_key"], "matrix-the");
    assert!(ratings["items"][0]["rated_at"].is_string());
}

#[tokio::test]
async fn test_insert_validation_errors() {
    let server = create_test_server(vec![]);

    let missing_rating = server
        .post("/lists/ratings")
        .json(&json!({ "canonical_key": "heat-1995" }))
        .await;
    missing_rating.assert_status(StatusCode::BAD_REQUEST);
    assert!(missing_rating.json::<Value>()["error"].is_string());

    let rating_on_rejects = server
        .post("/lists/rejects")
        .json(&json!({ "canonical_key": "heat-1995", "rating": 2 }))
        .await;
    rating_on_rejects.assert_status(StatusCode::BAD_REQUEST);

    let oversized = server
        .post("/lists/parked")
        .json(&json!({ "canonical_key": "heat-1995", "notes": "x".repeat(40 * 1024) }))
        .await;
    oversized.assert_status(StatusCode::BAD_REQUEST);

    let not_json = server.post("/lists/parked").text("canonical_key=heat").await;
    not_json.assert_status(StatusCode::BAD_REQUEST);

    let unknown = server
        .post("/lists/watchlist")
        .json(&json!({ "canonical_key": "heat-1995" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_stored_items_are_tolerated() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    store
        .put(
            StoreKey::List(Collection::Ratings),
            json!([{ "canonical_key": "heat-1995", "type": "film", "genres": ["Policier"], "rating": "4.5" }])
                .to_string(),
        )
        .await
        .unwrap();
    let server = create_test_server_with_store(store, vec![]);

    server
        .post("/lists/parked")
        .json(&json!({ "canonical_key": "alien" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .get("/l1")
        .add_query_param("type", "film")
        .add_query_param("genre", "drame")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let ratings = server.get("/lists/ratings").await;
    ratings.assert_status_ok();
    let body: Value = ratings.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["rating"], 4.5);

    server.get("/diag").await.assert_status_ok();
}

#[tokio::test]
async fn test_list_pagination() {
    let server = create_test_server(vec![]);
    for key in ["a", "b", "c", "d"] {
        server
            .post("/lists/rejects")
            .json(&json!({ "canonical_key": key, "titre": key.to_uppercase() }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page: Value = server
        .get("/lists/rejects")
        .add_query_param("offset", 1)
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(page["total"], 4);
    assert_eq!(page["offset"], 1);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["canonical_key"], "b");
    assert_eq!(page["items"][0]["titre"], "B");

    let lenient: Value = server
        .get("/lists/rejects")
        .add_query_param("offset", -3)
        .add_query_param("limit", "many")
        .await
        .json();
    assert_eq!(lenient["offset"], 0);
    assert_eq!(lenient["limit"], 1000);

    let prefixed: Value = server
        .get("/lists/rejects")
        .add_query_param("offset", "2.5")
        .add_query_param("limit", "10abc")
        .await
        .json();
    assert_eq!(prefixed["offset"], 2);
    assert_eq!(prefixed["limit"], 10);
    assert_eq!(prefixed["items"][0]["canonical_key"], "c");
}

#[tokio::test]
async fn test_cache_pool() {
    let server = create_test_server(vec![]);
    server
        .post("/lists/parked")
        .json(&json!({ "canonical_key": "alien-1979" }))
        .await
        .assert_status(StatusCode::CREATED);

    let partial: Value = server
        .get("/cache/pool")
        .add_query_param("key", "ratings")
        .add_query_param("key", "bogus")
        .await
        .json();
    assert_eq!(partial["ratings"], json!([]));
    assert!(partial.get("bogus").is_none());
    assert!(partial.get("parked").is_none());
    assert!(partial["synced_at"].is_string());

    let json_keys: Value = server
        .get("/cache/pool")
        .add_query_param("keys", r#"["PARKED","rejects"]"#)
        .await
        .json();
    assert_eq!(json_keys["parked"].as_array().unwrap().len(), 1);
    assert_eq!(json_keys["rejects"], json!([]));

    let everything: Value = server.get("/cache/pool").await.json();
    for name in ["ratings", "parked", "rejects"] {
        assert!(everything[name].is_array(), "missing {}", name);
    }
}

#[tokio::test]
async fn test_settings_merge_patch() {
    let server = create_test_server(vec![]);

    let defaults: Value = server.get("/settings").await.json();
    assert_eq!(defaults["thresholds"]["default"], 3.0);
    assert_eq!(defaults["weights"]["allocine"], 0.6);
    assert_eq!(
        defaults["behaviors"]["global"]["cache_pool_keys"],
        json!(["ratings", "parked", "rejects"])
    );
    assert!(defaults["ux_prompts"]["l1_cta"].is_string());

    let response = server
        .put("/settings")
        .json(&json!({
            "thresholds": { "default": 3.5 },
            "behaviors": { "l1": { "castcrew_preferences": { "favorites": ["Jean Reno"] } } }
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["settings"]["thresholds"]["default"], 3.5);
    assert_eq!(body["settings"]["thresholds"]["horror"], 2.5);
    assert!(body["settings"]["updated_at"].is_string());

    let stored: Value = server.get("/settings").await.json();
    assert_eq!(
        stored["behaviors"]["l1"]["castcrew_preferences"]["favorites"],
        json!(["Jean Reno"])
    );

    let invalid = server.put("/settings").json(&json!(["not", "an", "object"])).await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendation_flow() {
    let server = create_test_server(default_pool());

    let response = server
        .get("/l1")
        .add_query_param("type", "film")
        .add_query_param("genre", "drame")
        .await;
    response.assert_status_ok();
    let rec: Value = response.json();
    assert_eq!(rec["titre"], "Léon");
    assert_eq!(rec["notes"]["spectateurs"], "4.4");
    assert_eq!(rec["notes"]["presse"], "3.9");
    assert_eq!(rec["poster_url"], "https://img.example/1994.jpg");
    assert_eq!(rec["raw"]["canonical_key"], "leon-1994");
    assert!(rec["formatted_card"]
        .as_str()
        .unwrap()
        .starts_with("**Léon (1994)** • Drame • Thriller"));
    assert!(rec["intro"].is_string());
    let weights = &rec["score_breakdown"]["weights"];
    let sum = weights["allocine"].as_f64().unwrap()
        + weights["user_pref"].as_f64().unwrap()
        + weights["castcrew"].as_f64().unwrap();
    assert!((sum - 1.0).abs() < 1e-9);

    // Rejecting the top pick moves on to the next one
    server
        .post("/lists/rejects")
        .json(&json!({ "canonical_key": "leon-1994" }))
        .await
        .assert_status(StatusCode::CREATED);
    let next: Value = server
        .get("/l1")
        .add_query_param("type", "film")
        .add_query_param("genre", "drame")
        .await
        .json();
    assert_eq!(next["titre"], "Nikita");

    // Le Grand Bleu is below the spectator threshold
    server
        .post("/lists/parked")
        .json(&json!({ "canonical_key": "nikita-1990" }))
        .await
        .assert_status(StatusCode::CREATED);
    let exhausted = server
        .get("/l1")
        .add_query_param("type", "film")
        .add_query_param("genre", "drame")
        .await;
    exhausted.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendation_validation() {
    let server = create_test_server(default_pool());

    server
        .get("/l1")
        .add_query_param("type", "documentaire")
        .add_query_param("genre", "drame")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/l1")
        .add_query_param("type", "film")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/l1")
        .add_query_param("type", "serie")
        .add_query_param("genre", "drame")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_diag_reports_counts() {
    let server = create_test_server(vec![]);
    server
        .post("/lists/ratings")
        .json(&json!({ "canonical_key": "heat-1995", "rating": 5 }))
        .await
        .assert_status(StatusCode::CREATED);

    let diag: Value = server.get("/diag").await.json();
    assert_eq!(diag["store_backend"], "memory");
    assert_eq!(diag["candidate_source"], "static");
    assert_eq!(diag["counts"]["ratings"], 1);
    assert_eq!(diag["counts"]["parked"], 0);
    assert_eq!(diag["config_version"], 4);
}
