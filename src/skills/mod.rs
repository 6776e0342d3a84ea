//! Skill tagging of posting descriptions

mod stop_words;

pub use stop_words::ENGLISH_STOP_WORDS;

use crate::error::{Error, Result};
use crate::store::{PostingRow, SkillLink};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Words of two or more word characters
const TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Matches description n-grams against a fixed skill vocabulary
pub struct SkillTagger {
    vocabulary: HashMap<String, i64>,
    stop_words: HashSet<&'static str>,
    token: Regex,
}

impl SkillTagger {
    /// Tagger over `vocabulary` (term -> skill id). Terms are matched
    /// case-insensitively with single spaces between words.
    pub fn new(vocabulary: HashMap<String, i64>) -> Result<Self> {
        let token = Regex::new(TOKEN_PATTERN)
            .map_err(|e| Error::Other(format!("Invalid token pattern: {}", e)))?;

        let vocabulary = vocabulary
            .into_iter()
            .map(|(term, id)| (normalize_term(&term), id))
            .filter(|(term, _)| !term.is_empty())
            .collect();

        Ok(Self {
            vocabulary,
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            token,
        })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Unigrams and bigrams of `text` after stop-word removal, in order of
    /// first appearance
    pub fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = self
            .token
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|w| !self.stop_words.contains(*w))
            .collect();

        let mut seen = HashSet::new();
        let unigrams = words.iter().map(|w| w.to_string());
        let bigrams = words.windows(2).map(|pair| pair.join(" "));
        unigrams
            .chain(bigrams)
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }

    /// Skill ids mentioned in `description`, each once
    pub fn tag(&self, description: &str) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .terms(description)
            .iter()
            .filter_map(|term| self.vocabulary.get(term).copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// One link per skill mentioned by each posting
    pub fn links(&self, postings: &[PostingRow]) -> Vec<SkillLink> {
        let mut links = Vec::new();
        for posting in postings {
            let ids = self.tag(&posting.description);
            debug!("Posting {} mentions {} skills", posting.job_id, ids.len());
            links.extend(ids.into_iter().map(|skill_id| SkillLink {
                job_id: posting.job_id.clone(),
                skill_id,
            }));
        }
        links
    }
}

fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger(terms: &[(&str, i64)]) -> SkillTagger {
        SkillTagger::new(terms.iter().map(|(t, id)| (t.to_string(), *id)).collect()).unwrap()
    }

    #[test]
    fn test_unigrams_and_bigrams() {
        let tagger = tagger(&[("python", 0), ("machine learning", 1)]);
        let ids = tagger.tag("Looking for Python and machine learning skills");
        assert_eq!(ids, vec![0, 1]);

        let ids = tagger.tag("Machine learning, then PYTHON");
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_stop_words_removed_before_bigrams() {
        let t = tagger(&[("data science", 7)]);
        assert_eq!(t.tag("data for science"), vec![7]);
        assert!(t.terms("the and of").is_empty());
    }

    #[test]
    fn test_single_characters_are_not_tokens() {
        let t = tagger(&[("c", 1), ("r", 2), ("sql", 3)]);
        assert_eq!(t.tag("C, R and SQL"), vec![3]);
    }

    #[test]
    fn test_repeated_mentions_tag_once() {
        let t = tagger(&[("spark", 4)]);
        assert_eq!(t.tag("Spark spark SPARK"), vec![4]);
        assert_eq!(t.terms("Spark spark"), vec!["spark", "spark spark"]);
    }

    #[test]
    fn test_vocabulary_terms_are_normalized() {
        let t = tagger(&[("Machine  Learning", 1), ("  ", 9)]);
        assert_eq!(t.vocabulary_len(), 1);
        assert_eq!(t.tag("machine learning"), vec![1]);
    }

    #[test]
    fn test_links() {
        let t = tagger(&[("python", 0), ("sql", 1)]);
        let posting = |id: &str, description: &str| PostingRow {
            job_id: id.to_string(),
            title: "Analyst".to_string(),
            description: description.to_string(),
            scraped_at: "2021-03-04T10:00:00+00:00".to_string(),
            company: "Initech".to_string(),
            country: "Israel".to_string(),
            city: "Haifa".to_string(),
        };

        let links = t.links(&[posting("1", "Python and SQL"), posting("2", "None")]);
        assert_eq!(
            links,
            vec![
                SkillLink {
                    job_id: "1".to_string(),
                    skill_id: 0
                },
                SkillLink {
                    job_id: "1".to_string(),
                    skill_id: 1
                },
            ]
        );
    }
}
