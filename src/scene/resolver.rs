//! Picks the best catalog candidate for a planned element.
//!
//! V1 is a transparent lexical heuristic over title and category. The
//! signature is deliberately narrow so a semantic or visual scorer can
//! replace it later without touching the surrounding pipeline.

use tracing::debug;

use super::SceneElementSpec;
use crate::catalog::AssetCandidate;

/// Score every candidate against the element's search query and return the
/// first maximal one. `None` when `candidates` is empty.
pub fn choose_best_model<'a>(
    element: &SceneElementSpec,
    candidates: &'a [AssetCandidate],
) -> Option<&'a AssetCandidate> {
    if candidates.is_empty() {
        return None;
    }

    let query = element.search_query.to_lowercase();
    let query = query.trim();
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let mut best: Option<(&AssetCandidate, f32)> = None;
    for candidate in candidates {
        let score = score_candidate(query, &tokens, candidate);
        match best {
            // Ties keep the earlier candidate, so selection is deterministic.
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }

    let (chosen, score) = best?;
    debug!(
        title = %chosen.title,
        query = %element.search_query,
        score = %format!("{score:.2}"),
        "resolver picked candidate"
    );
    Some(chosen)
}

fn score_candidate(query: &str, tokens: &[&str], candidate: &AssetCandidate) -> f32 {
    let title = candidate.title.to_lowercase();
    let category = candidate
        .category
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let mut score = 0.0_f32;

    // Exact match on title is very strong.
    if title == query {
        score += 10.0;
    }

    // Title contains the full query.
    if !query.is_empty() && title.contains(query) {
        score += 6.0;
    }

    // Token overlap between query and title/category.
    for token in tokens {
        if title.contains(token) {
            score += 2.0;
        }
        if !category.is_empty() && category.contains(token) {
            score += 1.0;
        }
    }

    // Small preference for shorter, simpler titles. Bounded below 1.0 so it
    // only breaks near-ties and never overturns a token or phrase match.
    score -= title.len().min(60) as f32 / 60.0;

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Vec3;

    fn element(search_query: &str) -> SceneElementSpec {
        SceneElementSpec {
            search_query: search_query.to_string(),
            name: search_query.to_string(),
            description: String::new(),
            position: Vec3::new(0.0, 0.0, 5.0),
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }

    fn candidate(id: &str, title: &str, category: Option<&str>) -> AssetCandidate {
        AssetCandidate {
            id: id.to_string(),
            title: title.to_string(),
            author: "test".to_string(),
            download_url: format!("https://example.com/{id}.glb"),
            thumbnail: String::new(),
            license: "CC0".to_string(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn empty_candidates_yield_none() {
        assert!(choose_best_model(&element("fox"), &[]).is_none());
    }

    #[test]
    fn exact_title_match_beats_substring_match() {
        let candidates = vec![
            candidate("foxglove", "foxglove plant", Some("nature")),
            candidate("fox", "fox", Some("animal")),
        ];
        let chosen = choose_best_model(&element("fox"), &candidates).unwrap();
        assert_eq!(chosen.id, "fox");
    }

    #[test]
    fn selection_is_deterministic() {
        let candidates = vec![
            candidate("a", "red fox", None),
            candidate("b", "arctic fox", Some("animal")),
            candidate("c", "fox terrier", None),
        ];
        let first = choose_best_model(&element("arctic fox"), &candidates).unwrap();
        for _ in 0..10 {
            let again = choose_best_model(&element("arctic fox"), &candidates).unwrap();
            assert_eq!(again.id, first.id);
        }
    }

    #[test]
    fn ties_break_in_input_order() {
        let candidates = vec![
            candidate("first", "oak tree", None),
            candidate("second", "oak tree", None),
        ];
        let chosen = choose_best_model(&element("oak tree"), &candidates).unwrap();
        assert_eq!(chosen.id, "first");
    }

    #[test]
    fn category_tokens_contribute_to_the_score() {
        let candidates = vec![
            candidate("plain", "runner", None),
            candidate("tagged", "runner", Some("dog")),
        ];
        let chosen = choose_best_model(&element("dog"), &candidates).unwrap();
        assert_eq!(chosen.id, "tagged");
    }

    #[test]
    fn length_penalty_only_breaks_near_ties() {
        // Both titles contain the query; the shorter one wins.
        let near_tie = vec![
            candidate("long", "duck with an extremely elaborate descriptive title", None),
            candidate("short", "duck", None),
        ];
        let chosen = choose_best_model(&element("duck"), &near_tie).unwrap();
        assert_eq!(chosen.id, "short");

        // But a long title with a real match still beats a short one without.
        let no_contest = vec![
            candidate("short", "rock", None),
            candidate("long", "mallard duck swimming in a pond", None),
        ];
        let chosen = choose_best_model(&element("duck"), &no_contest).unwrap();
        assert_eq!(chosen.id, "long");
    }

    #[test]
    fn scoring_is_case_insensitive() {
        let candidates = vec![candidate("fox", "FOX", Some("Animal"))];
        let chosen = choose_best_model(&element("Fox"), &candidates).unwrap();
        assert_eq!(chosen.id, "fox");
    }
}
