use std::collections::HashSet;

use curator_core::types::{Analysis, FetchedContent};

const SUMMARY_CHARS: usize = 200;
/// Shorter keywords ("ai") only match whole words.
const PREFIX_MATCH_MIN_CHARS: usize = 3;

/// Keyword relevance check used when the relevance classifier is down.
///
/// Keywords are matched case-insensitively against the words of the title
/// and content. A keyword of three or more characters matches any word it
/// prefixes, so "agent" accepts "agents". Pages whose URL contains one of
/// `always_relevant` are accepted even without a keyword hit.
pub fn heuristic_analysis(content: &FetchedContent, keywords: &[String], always_relevant: &[String]) -> Analysis {
    let words: HashSet<String> = content
        .title
        .split(|c: char| !c.is_alphanumeric())
        .chain(content.content.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let matched: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && mentions(&words, k))
        .collect();
    let url = content.url.to_lowercase();
    let allowed = always_relevant
        .iter()
        .map(|u| u.trim().to_lowercase())
        .any(|u| !u.is_empty() && url.contains(&u));
    if matched.is_empty() && !allowed {
        return Analysis::rejected();
    }

    let summary: String = content.content.trim().chars().take(SUMMARY_CHARS).collect();
    Analysis {
        relevant: true,
        title: None,
        summary: Some(summary).filter(|s| !s.is_empty()),
        concepts: matched,
        tech_stack: Vec::new(),
        recommended_reason: None,
        author: None,
    }
}

fn mentions(words: &HashSet<String>, keyword: &str) -> bool {
    if keyword.chars().count() < PREFIX_MATCH_MIN_CHARS {
        words.contains(keyword)
    } else {
        words.iter().any(|w| w.starts_with(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::config::IngestionSettings;
    use curator_core::types::ResourceKind;

    fn page(title: &str, content: &str) -> FetchedContent {
        FetchedContent {
            url: "https://example.com".into(),
            title: title.into(),
            content: content.into(),
            raw_markup: None,
            author: None,
            published_at: None,
            kind: ResourceKind::Article,
        }
    }

    #[test]
    fn short_keywords_match_whole_words_only() {
        let keywords = vec!["ai".to_string(), "LLM".to_string()];
        assert!(!heuristic_analysis(&page("He said", "Plain text"), &keywords, &[]).relevant);

        let hit = heuristic_analysis(&page("Serving an LLM", "Batching requests."), &keywords, &[]);
        assert!(hit.relevant);
        assert_eq!(hit.concepts, vec!["llm"]);
        assert_eq!(hit.summary.as_deref(), Some("Batching requests."));
    }

    #[test]
    fn plural_and_inflected_forms_match() {
        let settings = IngestionSettings::default();
        let hit = heuristic_analysis(
            &page("Building LLMs and agents", "Transformers, prompts and models for production pipelines"),
            &settings.fallback_keywords,
            &[],
        );
        assert!(hit.relevant);
        for expected in ["llm", "transformer", "model", "prompt", "agent"] {
            assert!(hit.concepts.iter().any(|c| c == expected), "missing {expected}: {:?}", hit.concepts);
        }
        assert!(!hit.concepts.iter().any(|c| c == "ai"));
    }

    #[test]
    fn allow_listed_urls_skip_the_keyword_check() {
        let settings = IngestionSettings::default();
        let mut trending = page("Trending repositories", "Daily most starred projects");
        trending.url = "https://github.com/trending?since=daily".into();

        let hit = heuristic_analysis(&trending, &settings.fallback_keywords, &settings.always_relevant_urls);
        assert!(hit.relevant);
        assert!(hit.concepts.is_empty());

        trending.url = "https://github.com/explore".into();
        assert!(!heuristic_analysis(&trending, &settings.fallback_keywords, &settings.always_relevant_urls).relevant);
    }
}
