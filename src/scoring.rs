//! Picks the rotation whose recognized text looks most like a receipt.
//!
//! `score = chars(text) + keyword_weight * distinct keyword hits`, where a
//! hit is a case-insensitive substring match. A candidate only displaces the
//! current best when its score is strictly greater, so ties go to whichever
//! rotation was evaluated first.

use crate::ocr::TextFragment;
use crate::rotation::Rotation;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    pub keyword_weight: usize,
    /// Lower-case, distinct.
    pub keywords: Vec<String>,
}

impl ScoringConfig {
    pub fn new(keyword_weight: usize, keywords: &[&str]) -> Self {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keyword_weight,
            keywords: normalized,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ScoringConfig {
    fn from(settings: &Settings) -> Self {
        let keywords = settings.keywords.iter().map(String::as_str).collect::<Vec<_>>();
        Self::new(settings.keyword_weight, &keywords)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub rotation: Rotation,
    pub text: String,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub text: String,
    pub score: usize,
    /// `None` when no candidate scored above zero.
    pub rotation: Option<Rotation>,
    pub candidates: Vec<CandidateResult>,
}

pub fn concatenate(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn keyword_hits(text: &str, config: &ScoringConfig) -> usize {
    let lower = text.to_lowercase();
    config
        .keywords
        .iter()
        .filter(|keyword| lower.contains(keyword.as_str()))
        .count()
}

pub fn score_text(text: &str, config: &ScoringConfig) -> usize {
    text.chars().count() + config.keyword_weight * keyword_hits(text, config)
}

pub fn select_best<I>(candidates: I, config: &ScoringConfig) -> Selection
where
    I: IntoIterator<Item = (Rotation, Vec<TextFragment>)>,
{
    let mut best = Selection {
        text: String::new(),
        score: 0,
        rotation: None,
        candidates: Vec::new(),
    };

    for (rotation, fragments) in candidates {
        let text = concatenate(&fragments);
        let score = score_text(&text, config);
        if score > best.score {
            best.text = text.clone();
            best.score = score;
            best.rotation = Some(rotation);
        }
        best.candidates.push(CandidateResult {
            rotation,
            text,
            score,
        });
    }

    best
}
