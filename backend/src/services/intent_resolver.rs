//! Mapping of free-text questions to a single known region.
//!
//! Three stages run in order and the first one that produces any candidate
//! decides the outcome:
//!
//! 1. **Alias**: the first alias token (in catalog order) contained in the
//!    lower-cased utterance wins outright.
//! 2. **Token overlap**: a region matches when one of the utterance's
//!    alphanumeric tokens is a substring of its lower-cased name, or the other
//!    way around.
//! 3. **Fuzzy**: regions scoring at least the threshold against any single
//!    token under the configured [`SimilarityScorer`].
//!
//! Zero candidates is [`ResolutionOutcome::NotFound`], one is `Resolved`, more
//! than one is `Ambiguous` with the candidates in discovery order.

use tracing::debug;

use crate::algorithms::{scorer_for, SimilarityScorer};
use crate::config::ResolverSettings;
use crate::models::{MatchStage, RegionCatalog, ResolutionOutcome};

pub struct IntentResolver {
    catalog: RegionCatalog,
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
}

impl IntentResolver {
    pub fn new(catalog: RegionCatalog, scorer: Box<dyn SimilarityScorer>, threshold: f64) -> Self {
        Self {
            catalog,
            scorer,
            threshold,
        }
    }

    /// Build a resolver with the scorer and threshold from configuration.
    pub fn from_settings(catalog: RegionCatalog, settings: &ResolverSettings) -> Self {
        Self::new(catalog, scorer_for(settings.scorer), settings.fuzzy_threshold)
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn resolve(&self, utterance: &str) -> ResolutionOutcome {
        let lowered = utterance.to_lowercase();

        if let Some(region) = self.match_alias(&lowered) {
            debug!(region, "resolved by alias");
            return ResolutionOutcome::Resolved {
                region: region.to_string(),
                stage: MatchStage::Alias,
            };
        }

        let tokens = tokenize(&lowered);
        if tokens.is_empty() {
            return ResolutionOutcome::NotFound;
        }

        let overlap = self.match_tokens(&tokens);
        if !overlap.is_empty() {
            return decide(overlap, MatchStage::TokenOverlap);
        }

        // Nothing overlapped, so every region is eligible for the fuzzy stage.
        decide(self.match_fuzzy(&tokens), MatchStage::Fuzzy)
    }

    fn match_alias(&self, lowered: &str) -> Option<&str> {
        self.catalog
            .aliases()
            .iter()
            .find(|alias| lowered.contains(alias.token.as_str()))
            .map(|alias| alias.region.as_str())
    }

    fn match_tokens(&self, tokens: &[String]) -> Vec<String> {
        self.catalog
            .regions()
            .iter()
            .filter(|region| {
                let name = region.to_lowercase();
                tokens
                    .iter()
                    .any(|t| name.contains(t.as_str()) || t.contains(name.as_str()))
            })
            .cloned()
            .collect()
    }

    fn match_fuzzy(&self, tokens: &[String]) -> Vec<String> {
        self.catalog
            .regions()
            .iter()
            .filter(|region| {
                let name = region.to_lowercase();
                tokens.iter().any(|t| {
                    let score = self.scorer.score(t, &name);
                    if score >= self.threshold {
                        debug!(token = %t, region = %region, score, scorer = self.scorer.name(), "fuzzy hit");
                        true
                    } else {
                        false
                    }
                })
            })
            .cloned()
            .collect()
    }
}

fn decide(mut candidates: Vec<String>, stage: MatchStage) -> ResolutionOutcome {
    match candidates.len() {
        0 => ResolutionOutcome::NotFound,
        1 => ResolutionOutcome::Resolved {
            region: candidates.remove(0),
            stage,
        },
        _ => ResolutionOutcome::Ambiguous(candidates),
    }
}

/// Maximal runs of alphanumeric characters, in utterance order.
fn tokenize(lowered: &str) -> Vec<String> {
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "intent_resolver_tests.rs"]
mod tests;
