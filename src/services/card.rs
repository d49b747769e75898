use crate::models::{Candidate, IntroPool};

const MISSING: &str = "N/A";
const MISSING_NOTE: &str = "–";
const MISSING_SUMMARY: &str = "Résumé indisponible.";
const PLACEHOLDER_POSTER: &str = "https://dummyimage.com/600x800/cccccc/000000&text=Affiche";

/// Rating as shown to the user, one decimal or a dash
pub fn format_note(note: Option<f64>) -> String {
    match note {
        Some(value) if value.is_finite() => format!("{:.1}", value),
        _ => MISSING_NOTE.to_string(),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(value)
}

/// Fills the card template by literal substitution, in a fixed order
///
/// Unknown placeholders are left as they are. `{note_presse}` and `{presse}`
/// are aliases, as are `{note_spectateurs}` and `{spectateurs}`.
pub fn render_card(template: &str, candidate: &Candidate) -> String {
    let presse = format_note(candidate.presse);
    let spectateurs = format_note(candidate.spectateurs);
    let summary = non_empty(&candidate.accroche).unwrap_or(MISSING_SUMMARY);
    let poster = candidate
        .affiche_url
        .as_deref()
        .and_then(non_empty)
        .unwrap_or(PLACEHOLDER_POSTER);
    let genres = candidate.genres.join(" • ");

    let substitutions: [(&str, &str); 12] = [
        ("{titre}", candidate.titre.as_str()),
        ("{annee}", non_empty(&candidate.annee).unwrap_or(MISSING)),
        ("{type}", candidate.media_type.as_str()),
        ("{duree}", candidate.duree.as_deref().and_then(non_empty).unwrap_or(MISSING)),
        ("{genres}", genres.as_str()),
        ("{note_presse}", presse.as_str()),
        ("{note_spectateurs}", spectateurs.as_str()),
        ("{presse}", presse.as_str()),
        ("{spectateurs}", spectateurs.as_str()),
        ("{resume}", summary),
        ("{accroche}", summary),
        ("{affiche_url}", poster),
    ];

    substitutions
        .iter()
        .fold(template.to_string(), |card, (placeholder, value)| {
            card.replace(placeholder, value)
        })
}

/// 32-bit wrapping `h * 31 + unit` over UTF-16 code units
fn seed_hash(seed: &str) -> i32 {
    seed.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Picks the intro line for a recommendation
///
/// The same seed always yields the same line. An empty seed picks the first
/// line; an empty pool yields nothing.
pub fn pick_intro(pool: &IntroPool, seed: &str) -> Option<String> {
    match pool {
        IntroPool::Lines(lines) if !lines.is_empty() => {
            let index = if seed.is_empty() {
                0
            } else {
                (i64::from(seed_hash(seed)).abs() % lines.len() as i64) as usize
            };
            Some(lines[index].trim().to_string())
        }
        IntroPool::Single(line) if !line.trim().is_empty() => Some(line.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;

    fn candidate() -> Candidate {
        Candidate {
            titre: "Heat".to_string(),
            annee: "1995".to_string(),
            media_type: MediaType::Film,
            genres: vec!["Policier".to_string(), "Thriller".to_string()],
            presse: Some(4.2),
            spectateurs: Some(4.6),
            accroche: "Un flic et un braqueur.".to_string(),
            affiche_url: Some("https://img.example/heat.jpg".to_string()),
            cast: vec![],
            crew: vec![],
            canonical_key: "heat-1995".to_string(),
            duree: Some("2h50".to_string()),
        }
    }

    fn pool(n: usize) -> IntroPool {
        IntroPool::Lines((0..n).map(|i| format!("line {}", i)).collect())
    }

    #[test]
    fn test_render_default_template() {
        let card = render_card(
            &crate::models::Templates::default().l1_card,
            &candidate(),
        );
        assert_eq!(
            card,
            "**Heat (1995)** • Policier • Thriller\n\
             P 4.2/5 • S 4.6/5\n\
             Un flic et un braqueur.\n\
             ![Affiche](https://img.example/heat.jpg)"
        );
    }

    #[test]
    fn test_render_fallbacks() {
        let mut c = candidate();
        c.annee = String::new();
        c.duree = None;
        c.presse = None;
        c.accroche = "  ".to_string();
        c.affiche_url = None;

        let card = render_card(
            "{annee}|{duree}|{note_presse}|{type}|{resume}|{affiche_url}",
            &c,
        );
        assert_eq!(
            card,
            "N/A|N/A|–|film|Résumé indisponible.|https://dummyimage.com/600x800/cccccc/000000&text=Affiche"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let card = render_card("{titre} {inconnu}", &candidate());
        assert_eq!(card, "Heat {inconnu}");
    }

    #[test]
    fn test_format_note() {
        assert_eq!(format_note(Some(3.0)), "3.0");
        assert_eq!(format_note(Some(3.86)), "3.9");
        assert_eq!(format_note(None), "–");
        assert_eq!(format_note(Some(f64::NAN)), "–");
    }

    #[test]
    fn test_intro_is_deterministic() {
        let pool = pool(10);
        assert_eq!(pick_intro(&pool, "a").as_deref(), Some("line 7"));
        assert_eq!(pick_intro(&pool, "ab").as_deref(), Some("line 5"));
        assert_eq!(pick_intro(&pool, "heat-1995"), pick_intro(&pool, "heat-1995"));
    }

    #[test]
    fn test_intro_handles_overflowing_hash() {
        let pool = pool(7);
        let long_seed = "the-lord-of-the-rings-the-return-of-the-king-2003";
        assert!(pick_intro(&pool, long_seed).is_some());
    }

    #[test]
    fn test_intro_edge_cases() {
        assert_eq!(pick_intro(&pool(3), "").as_deref(), Some("line 0"));
        assert_eq!(pick_intro(&IntroPool::Lines(vec![]), "a"), None);
        assert_eq!(
            pick_intro(&IntroPool::Single("  Regarde ça.  ".to_string()), "a").as_deref(),
            Some("Regarde ça.")
        );
        assert_eq!(pick_intro(&IntroPool::Single("   ".to_string()), "a"), None);
    }
}
