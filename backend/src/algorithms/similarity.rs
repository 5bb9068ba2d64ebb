//! String similarity scorers for fuzzy region matching.
//!
//! Scores are normalised to `[0, 1]`, 1 meaning identical. The resolver only
//! sees the [`SimilarityScorer`] trait, so the algorithm and its threshold can
//! be swapped through configuration.

use crate::config::ScorerKind;

/// Normalised similarity between two strings.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;

    fn name(&self) -> &'static str;
}

/// `2 * LCS(a, b) / (|a| + |b|)` over characters, with LCS the longest
/// common subsequence. Two empty strings score 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl SimilarityScorer for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
    }

    fn name(&self) -> &'static str {
        "sequence_ratio"
    }
}

/// `1 - levenshtein(a, b) / max(|a|, |b|)`. Two empty strings score 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl SimilarityScorer for LevenshteinRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 1.0;
        }
        1.0 - levenshtein(&a, &b) as f64 / longest as f64
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Build the scorer selected in configuration.
pub fn scorer_for(kind: ScorerKind) -> Box<dyn SimilarityScorer> {
    match kind {
        ScorerKind::SequenceRatio => Box::new(SequenceRatio),
        ScorerKind::Levenshtein => Box::new(LevenshteinRatio),
    }
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
