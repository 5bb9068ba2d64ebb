//! Known regions and resolver outcomes.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::QueryError;

/// Maps a foreign-language token to a canonical region name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub token: String,
    pub region: String,
}

impl AliasEntry {
    pub fn new(token: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            region: region.into(),
        }
    }
}

/// Region names from the input data plus the alias table.
///
/// Built once at start-up and read-only afterwards. Both lists keep their
/// insertion order because the resolver's tie-breaking depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<String>,
    aliases: Vec<AliasEntry>,
}

impl RegionCatalog {
    /// Build a catalog. Duplicate and blank region names are dropped, alias
    /// tokens are lower-cased.
    pub fn new<I, S>(regions: I, aliases: Vec<AliasEntry>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for region in regions {
            let region = region.into();
            if !region.trim().is_empty() && !unique.contains(&region) {
                unique.push(region);
            }
        }

        let aliases: Vec<AliasEntry> = aliases
            .into_iter()
            .filter(|a| !a.token.trim().is_empty())
            .map(|a| AliasEntry::new(a.token.trim().to_lowercase(), a.region))
            .collect();

        for alias in &aliases {
            if !unique.contains(&alias.region) {
                warn!(
                    token = %alias.token,
                    region = %alias.region,
                    "alias points to a region absent from the input data"
                );
            }
        }

        Self {
            regions: unique,
            aliases,
        }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }
}

/// Which resolver stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Alias,
    TokenOverlap,
    Fuzzy,
}

/// Result of resolving an utterance against a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Resolved { region: String, stage: MatchStage },
    /// Competing candidates in discovery order.
    Ambiguous(Vec<String>),
    NotFound,
}

impl ResolutionOutcome {
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::Resolved { region, .. } => Some(region),
            _ => None,
        }
    }

    /// Convert into the user-facing error taxonomy.
    pub fn into_result(self, catalog: &RegionCatalog) -> Result<String, QueryError> {
        match self {
            Self::Resolved { region, .. } => Ok(region),
            Self::Ambiguous(candidates) => Err(QueryError::Ambiguous { candidates }),
            Self::NotFound => Err(QueryError::NotFound {
                known: catalog.regions().to_vec(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_dedups_and_keeps_order() {
        let catalog = RegionCatalog::new(
            ["European Region", "African Region", "European Region", " "],
            vec![],
        );
        assert_eq!(catalog.regions(), &["European Region", "African Region"]);
    }

    #[test]
    fn test_alias_tokens_lowercased() {
        let catalog = RegionCatalog::new(
            ["African Region"],
            vec![AliasEntry::new(" Africa ", "African Region")],
        );
        assert_eq!(catalog.aliases()[0].token, "africa");
        assert!(catalog.contains("African Region"));
    }

    #[test]
    fn test_into_result_not_found_lists_regions() {
        let catalog = RegionCatalog::new(["A Region", "B Region"], vec![]);
        let err = ResolutionOutcome::NotFound.into_result(&catalog).unwrap_err();
        assert_eq!(
            err,
            QueryError::NotFound {
                known: vec!["A Region".into(), "B Region".into()]
            }
        );
    }

    #[test]
    fn test_into_result_resolved() {
        let catalog = RegionCatalog::default();
        let outcome = ResolutionOutcome::Resolved {
            region: "A Region".into(),
            stage: MatchStage::Alias,
        };
        assert_eq!(outcome.region(), Some("A Region"));
        assert_eq!(outcome.into_result(&catalog).unwrap(), "A Region");
    }
}
