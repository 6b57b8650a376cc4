use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tsuzuki_api::CatalogMedia;

use crate::normalize::normalize;

/// Minimum fuzzy score (0.0–1.0) to consider a match valid.
const FUZZY_THRESHOLD: f64 = 0.6;

/// Scores catalog entries against one guessed title.
pub struct TitleMatcher {
    matcher: SkimMatcherV2,
    query: String,
    max_possible: i64,
}

impl TitleMatcher {
    pub fn new(title: &str) -> Self {
        let matcher = SkimMatcherV2::default();
        let query = normalize(title);
        let max_possible = matcher
            .fuzzy_match(&query, &query)
            .unwrap_or(1)
            .max(1);
        Self {
            matcher,
            query,
            max_possible,
        }
    }

    /// Confidence (0.0–1.0) that `media` is the guessed title, taking the
    /// best of all its title variants and synonyms.
    pub fn confidence(&self, media: &CatalogMedia) -> f64 {
        if self.query.is_empty() {
            return 0.0;
        }
        let mut best: i64 = 0;
        for title in media.all_titles() {
            let candidate = normalize(title);
            if candidate == self.query {
                return 1.0;
            }
            if let Some(score) = self.matcher.fuzzy_match(&candidate, &self.query) {
                best = best.max(score);
            }
        }
        (best as f64 / self.max_possible as f64).min(1.0)
    }

    pub fn is_match(&self, media: &CatalogMedia) -> bool {
        self.confidence(media) >= FUZZY_THRESHOLD
    }
}
