use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CONFIG_VERSION: u32 = 4;

const DEFAULT_CARD_TEMPLATE: &str = "**{titre} ({annee})** • {genres}\n\
    P {presse}/5 • S {spectateurs}/5\n\
    {resume}\n\
    ![Affiche]({affiche_url})";

const DEFAULT_INTRO_LINES: [&str; 10] = [
    "Hop ! Voici une reco taillée pour toi.",
    "Allez, un titre pile dans tes goûts.",
    "On tente ça pour ta soirée ?",
    "Je pense que celui-ci va te plaire.",
    "Essai instantané : regarde ça.",
    "Petit shot ciné rien que pour toi.",
    "J’ai un bon pressentiment pour celui-là.",
    "Coup d’œil express :",
    "Celui-ci coche toutes les cases.",
    "Prêt à découvrir une pépite ?",
];

const DEFAULT_ALGO_SUMMARY: &str = "Objectif : proposer un titre noté strictement >3,5/5. \
    Filtres Allociné (S≥3,0 ; horreur S≥2,5), exclusions (notés, mis de côté, pas intéressé), \
    dédup VO/VF/VQ/remakes/sagas. Scoring : préférences (récence mesurée) + cast/crew \
    (chevauchement pondéré) + Allociné (P/S normalisés) + interprétation des listes \
    (parked=bonus mesuré ; rejects=malus fort étendu). Diversité contrôlée. \
    Rendus : L1 carte complète ; L3 “**Titre** — Genres — Année”.";

/// Settings document served when nothing is stored
///
/// Holds every section the conversational client reads, not only the ones
/// typed by `Settings`. The typed sections agree with `Settings::default()`.
pub fn default_document() -> Value {
    let formats = json!(["10F+5S", "20F", "10S"]);
    let cache_keys = json!(["ratings", "parked", "rejects"]);
    let global = json!({
        "cache_pool_enabled": true,
        "cache_pool_keys": cache_keys,
        "cache_pool_strategy": "always_fresh",
        "cache_pool_resync_if_empty": true,
        "cache_keys": cache_keys,
        "cache_sync_each_action": false,
        "cache_flush_on_write": false,
        "aggregate_writes": true,
        "flush_strategy": "end_of_turn",
        "flush_endpoint": "/backup/import",
        "flush_fallback": "per_item",
        "confirm_writes_mode": "verified",
        "write_verify": true,
        "verify_endpoint": "/backup/export",
        "verify_timeout_ms": 4000,
        "resync_before_each_action": true,
        "retry_on_sync_fail": 2,
        "backoff_ms": 400,
        "show_menu_after_action": true,
        "show_onboarding": false,
        "suppress_connector_logs": true
    });
    let l3 = json!({
        "generate_immediately": true,
        "ask_followups": false,
        "formats_allowed": formats,
        "parse_shorthand": true,
        "shorthand_patterns": [
            { "re": "^\\s*10\\s*/\\s*5\\s*$", "format": "10F+5S" },
            { "re": "^\\s*10\\s*f\\s*\\+\\s*5\\s*s\\s*$", "format": "10F+5S" },
            { "re": "^\\s*20\\s*$", "format": "20F" },
            { "re": "^\\s*10\\s*$", "format": "10S" }
        ],
        "format_profiles": {
            "10F+5S": { "films": 10, "series": 5, "enforce": true },
            "20F": { "films": 20, "series": 0, "enforce": true },
            "10S": { "films": 0, "series": 10, "enforce": true }
        },
        "auto_complete_missing": true,
        "render_mode": "template_only",
        "item_fields_allowed": ["titre", "annee", "genres"],
        "compact": true,
        "show_sources": false,
        "show_notes": false
    });
    let ux_prompts = json!({
        "l1_intro_pool": DEFAULT_INTRO_LINES,
        "l1_genre_hint": "Tu préfères tenter : {genre_cible} ou tous genres confondus ?",
        "l1_card_template": "**{titre} ({annee})** — {type} • {duree} • Genres : {genres}\n**P** {note_presse} / **S** {note_spectateurs}\n*{accroche}*",
        "l1_cta": "Réponds : \"x,x/5\" pour noter • \"met de côté\" • \"pas intéressé\" • \"suivant\".",
        "l1_on_no_pool": "Aucun titre ne correspond pour l’instant. Essaie un autre genre ou lance une salve (L3).",
        "l2_intro": "Voici tes titres mis de côté, classés par genre (les plus récents en premier).",
        "l2_empty": "Aucun titre mis de côté pour le moment.",
        "l3_item_template_film": "**{titre}** — {genres} — {annee}",
        "l3_item_template_serie": "**{titre}** — {genres} — {annee}",
        "l4_intro": "Voici ta base de notation. Podium des 5 meilleurs films et des 5 meilleures séries :",
        "l4_genre_select": "Choisis un genre pour afficher les titres (tri note ↓ puis date d’ajout ↓).",
        "write_summary_template": "✅ Enregistré (vérifié) : {ratings} notes • {parked} mis de côté • {rejects} rejets.",
        "write_summary_soft_template": "✅ Enregistré. ⚠️ Vérification impossible pour le moment.",
        "write_summary_error_template": "⚠️ Échec d’enregistrement. Réessaye.",
        "sync_error": "⚠️ Sync indisponible.",
        "auth_error": "⚠️ Accès non autorisé à la base distante."
    });

    json!({
        "config_version": CONFIG_VERSION,
        "thresholds": { "default": 3.0, "horror": 2.5 },
        "weights": { "user_pref": 0.2, "allocine": 0.6, "castcrew": 0.2 },
        "list_interpretation": { "parked_bonus": 0.10, "reject_malus": -1.0, "recency_weight": 0.15 },
        "exclusions": { "rated": true, "parked": true, "rejects": true },
        "dedup": { "alias_vo_vf_vq": true, "remakes": true, "sagas": true },
        "templates": {
            "l1_card": DEFAULT_CARD_TEMPLATE,
            "l3_item": "**{titre}** — {genres} — {annee}",
            "genres": { "case": "title", "joiner": " • " }
        },
        "genre_aliases": {
            "comédie romantique": ["romcom", "rom com", "rom-com", "comedie romantique"],
            "science-fiction": ["sf", "science fiction", "anticipation", "space opera", "space-opera"]
        },
        "salves": { "formats_allowed": formats, "autocomplete_missing": true },
        "behaviors": {
            "global": global,
            "l1": {
                "ask_type_first": true,
                "intro_random_from_pool": true,
                "loop_on_response": true,
                "auto_commit_actions": true,
                "next_after_action": "immediate",
                "show_card_always": true,
                "accept_synonyms": ["suivant", "next", "skip"],
                "rating_regex": "^(?:[0-5](?:[\\.,][0-9])?)\\/5$",
                "accroche": { "source": "synopsis_web", "max_chars": 180, "fallback": "Pitch bref indisponible." },
                "castcrew_preferences": { "favorites": [], "blacklist": [] }
            },
            "l2": { "group_by": "genre", "order": "added_at_desc" },
            "l3": l3,
            "l4": {
                "podium_sizes": { "films": 5, "series": 5 },
                "sort": { "primary": "note_desc", "tiebreak": ["added_at_desc"] }
            },
            "l5": { "allow_natural_commands": true }
        },
        "ux_prompts": ux_prompts,
        "algo_summary": {
            "version": "v1",
            "current": DEFAULT_ALGO_SUMMARY,
            "changelog": []
        }
    })
}

/// Algorithm settings stored under the `settings` key
///
/// Only the fields the recommender reads are typed. Every field falls back to
/// its built-in default, so a stored document may be partial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub config_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub thresholds: Thresholds,
    pub weights: Weights,
    pub templates: Templates,
    pub behaviors: Behaviors,
    pub ux_prompts: UxPrompts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            updated_at: None,
            thresholds: Thresholds::default(),
            weights: Weights::default(),
            templates: Templates::default(),
            behaviors: Behaviors::default(),
            ux_prompts: UxPrompts::default(),
        }
    }
}

impl Settings {
    pub fn castcrew_preferences(&self) -> &CastCrewPreferences {
        &self.behaviors.l1.castcrew_preferences
    }
}

/// Minimum spectator rating a candidate must strictly exceed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub default: f64,
    pub horror: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            default: 3.0,
            horror: 2.5,
        }
    }
}

/// Configured score weights; renormalized before use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Weights {
    pub allocine: f64,
    pub user_pref: f64,
    pub castcrew: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            allocine: 0.6,
            user_pref: 0.2,
            castcrew: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Templates {
    pub l1_card: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            l1_card: DEFAULT_CARD_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Behaviors {
    pub l1: L1Behavior,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct L1Behavior {
    pub castcrew_preferences: CastCrewPreferences,
}

/// Names of people the user likes or wants to avoid
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CastCrewPreferences {
    pub favorites: Vec<String>,
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UxPrompts {
    pub l1_intro_pool: IntroPool,
}

/// Intro lines shown above a recommendation. Older documents store a single string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IntroPool {
    Lines(Vec<String>),
    Single(String),
}

impl Default for IntroPool {
    fn default() -> Self {
        IntroPool::Lines(DEFAULT_INTRO_LINES.iter().map(|s| s.to_string()).collect())
    }
}
