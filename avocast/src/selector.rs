//! Region/series selection from a multi-series table
//!
//! Which region gets analysed is decided by an explicit, ordered list of
//! [`MatchStrategy`] values. The first strategy that resolves to a region
//! wins. Anything resolved by a strategy other than the first is a
//! *substitution*: it changes the scope of the analysis, so it is logged and
//! can be refused outright with `allow_substitution = false`.

use crate::data::MarketTable;
use crate::error::{AvocastError, Result};
use crate::series::{PriceSeries, SeriesKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// One way of resolving a region name against the regions in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Region name equals the value
    Exact(String),
    /// Region name contains the value, ignoring case; first match in sorted order
    Substring(String),
    /// Region with the most rows; ties go to the first in sorted order
    MostPopulated,
}

impl MatchStrategy {
    /// Resolve against per-region row counts
    pub fn resolve(&self, counts: &BTreeMap<String, usize>) -> Option<String> {
        match self {
            MatchStrategy::Exact(name) => counts.contains_key(name).then(|| name.clone()),
            MatchStrategy::Substring(pattern) => {
                let pattern = pattern.to_lowercase();
                counts
                    .keys()
                    .find(|region| region.to_lowercase().contains(&pattern))
                    .cloned()
            }
            MatchStrategy::MostPopulated => {
                let mut best: Option<(&String, usize)> = None;
                for (region, &count) in counts {
                    if best.map_or(true, |(_, top)| count > top) {
                        best = Some((region, count));
                    }
                }
                best.map(|(region, _)| region.clone())
            }
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact(name) => write!(f, "exact '{}'", name),
            MatchStrategy::Substring(pattern) => write!(f, "substring '{}'", pattern),
            MatchStrategy::MostPopulated => write!(f, "most populated"),
        }
    }
}

/// Ordered resolution policy for the target region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    pub strategies: Vec<MatchStrategy>,
    /// Whether a strategy after the first may pick the region
    pub allow_substitution: bool,
}

impl Default for SelectionPolicy {
    /// The Washington D.C. area, falling back to neighbouring names, then
    /// the national aggregate, then the largest region
    fn default() -> Self {
        Self::with_fallbacks(
            "Washington",
            &["Washington", "DC", "District", "Baltimore"],
            Some("TotalUS"),
        )
    }
}

impl SelectionPolicy {
    /// Only the named region, no substitution
    pub fn exact(region: &str) -> Self {
        Self {
            strategies: vec![MatchStrategy::Exact(region.to_string())],
            allow_substitution: false,
        }
    }

    /// The named region, then each substring pattern, then `aggregate`, then
    /// the most populated region
    pub fn with_fallbacks(target: &str, patterns: &[&str], aggregate: Option<&str>) -> Self {
        let mut strategies = vec![MatchStrategy::Exact(target.to_string())];
        strategies.extend(
            patterns
                .iter()
                .map(|pattern| MatchStrategy::Substring(pattern.to_string())),
        );
        if let Some(aggregate) = aggregate {
            strategies.push(MatchStrategy::Exact(aggregate.to_string()));
        }
        strategies.push(MatchStrategy::MostPopulated);

        Self {
            strategies,
            allow_substitution: true,
        }
    }

    /// The region the caller asked for
    pub fn requested(&self) -> String {
        match self.strategies.first() {
            Some(MatchStrategy::Exact(name)) | Some(MatchStrategy::Substring(name)) => name.clone(),
            Some(MatchStrategy::MostPopulated) => "<most populated>".to_string(),
            None => String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(AvocastError::InvalidParameter(
                "Selection policy needs at least one strategy".to_string(),
            ));
        }
        for strategy in &self.strategies {
            if let MatchStrategy::Exact(value) | MatchStrategy::Substring(value) = strategy {
                if value.trim().is_empty() {
                    return Err(AvocastError::InvalidParameter(format!(
                        "Selection strategy {} has an empty value",
                        strategy
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The chosen series and how it was chosen
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub series: PriceSeries,
    /// Strategy that resolved the region
    pub resolved_by: MatchStrategy,
    /// Region the policy asked for first
    pub requested: String,
    /// True when a fallback strategy picked the region
    pub substituted: bool,
}

/// Pick one region/category series out of `table` following `policy`
pub fn select_series(
    table: &MarketTable,
    category: &str,
    policy: &SelectionPolicy,
) -> Result<Selection> {
    policy.validate()?;
    let requested = policy.requested();
    let selection_error = |reason: String| AvocastError::Selection {
        region: requested.clone(),
        category: category.to_string(),
        reason,
    };

    if table.is_empty() {
        return Err(selection_error("table is empty".to_string()));
    }

    let filtered = table.filter_category(category)?;
    if filtered.is_empty() {
        return Err(selection_error("no rows for this category".to_string()));
    }

    let counts = filtered.region_counts()?;
    for (position, strategy) in policy.strategies.iter().enumerate() {
        let Some(region) = strategy.resolve(&counts) else {
            continue;
        };

        let substituted = position > 0;
        if substituted {
            if !policy.allow_substitution {
                return Err(selection_error(format!(
                    "requested region is absent and substitution by {} ('{}') is disabled",
                    strategy, region
                )));
            }
            warn!(
                requested = %requested,
                chosen = %region,
                strategy = %strategy,
                "Requested region not found, substituting"
            );
        }

        let series = filtered.series_for(&SeriesKey::new(region.as_str(), category))?;
        info!(
            series = %series.key(),
            observations = series.len(),
            strategy = %strategy,
            "Selected series"
        );

        return Ok(Selection {
            series,
            resolved_by: strategy.clone(),
            requested,
            substituted,
        });
    }

    Err(selection_error(format!(
        "none of {} strategies matched {} regions",
        policy.strategies.len(),
        counts.len()
    )))
}
