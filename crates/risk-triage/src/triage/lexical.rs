use std::sync::OnceLock;

use super::domain::PredictedRisk;
use super::lexicon::category_keywords;

/// Categories in the order they are tested: most severe first.
pub const SEVERITY_ORDER: [PredictedRisk; 4] = [
    PredictedRisk::Sexual,
    PredictedRisk::Physical,
    PredictedRisk::Psychological,
    PredictedRisk::Economic,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalMatch {
    pub category: PredictedRisk,
    pub matched_keyword: String,
}

/// Bilingual keyword scan over lower-cased incident text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMatcher;

impl LexicalMatcher {
    /// Category comes from the first severity tier with any hit. The reported phrase is
    /// the longest keyword found across every tier, so it may belong to a less severe
    /// category than the one selected.
    pub fn scan(&self, description: &str) -> Option<LexicalMatch> {
        let text = description.to_lowercase();

        let category = SEVERITY_ORDER.into_iter().find(|category| {
            category_keywords(*category).any(|keyword| text.contains(keyword))
        })?;

        let matched_keyword = keywords_by_length()
            .iter()
            .find(|keyword| text.contains(*keyword))
            .map(|keyword| keyword.to_string())?;

        Some(LexicalMatch {
            category,
            matched_keyword,
        })
    }
}

/// All surface forms, longest first. Equal lengths keep catalog order.
fn keywords_by_length() -> &'static [&'static str] {
    static SORTED: OnceLock<Vec<&'static str>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut keywords: Vec<&'static str> = PredictedRisk::ALL
            .iter()
            .flat_map(|category| category_keywords(*category))
            .collect();
        keywords.sort_by(|left, right| right.len().cmp(&left.len()));
        keywords
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_beats_text_order() {
        let matcher = LexicalMatcher;
        let found = matcher
            .scan("Walang sustento mula noong Enero at hinipuan pa ako ng asawa ko")
            .expect("keyword hit");
        assert_eq!(found.category, PredictedRisk::Sexual);
    }

    #[test]
    fn longest_phrase_is_reported_even_across_categories() {
        let matcher = LexicalMatcher;
        let found = matcher
            .scan("He raped me. He also refuses to give support to our kids.")
            .expect("keyword hit");
        assert_eq!(found.category, PredictedRisk::Sexual);
        assert_eq!(found.matched_keyword, "refuses to give support");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let found = LexicalMatcher
            .scan("SINAMPAL niya ako kagabi")
            .expect("keyword hit");
        assert_eq!(found.category, PredictedRisk::Physical);
        assert_eq!(found.matched_keyword, "sinampal");
    }

    #[test]
    fn no_hit_returns_none() {
        assert_eq!(LexicalMatcher.scan("Nag-away kami tungkol sa bahay"), None);
        assert_eq!(LexicalMatcher.scan(""), None);
    }

    #[test]
    fn sorted_keywords_are_descending() {
        let keywords = keywords_by_length();
        assert!(keywords.windows(2).all(|pair| pair[0].len() >= pair[1].len()));
    }
}
