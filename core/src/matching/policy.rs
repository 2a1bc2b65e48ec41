use crate::matching::candidate::MatchCandidate;
use crate::prelude::{CandidateFilter, WddResult};
use crate::records::WaggleRun;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many candidates a run may keep after the tolerance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every candidate within tolerance.
    #[default]
    All,
    /// Only the candidate closest in time, then in space.
    Nearest,
}

impl CandidateFilter for MatchPolicy {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn apply(
        &self,
        _run: &WaggleRun,
        candidates: Vec<MatchCandidate>,
    ) -> WddResult<Vec<MatchCandidate>> {
        match self {
            MatchPolicy::All => Ok(candidates),
            MatchPolicy::Nearest => Ok(candidates
                .into_iter()
                .min_by(|a, b| {
                    a.time_delta_sec
                        .abs()
                        .total_cmp(&b.time_delta_sec.abs())
                        .then_with(|| {
                            a.distance_px
                                .unwrap_or(f64::INFINITY)
                                .total_cmp(&b.distance_px.unwrap_or(f64::INFINITY))
                        })
                })
                .into_iter()
                .collect()),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::All => f.write_str("all"),
            MatchPolicy::Nearest => f.write_str("nearest"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MatchPolicy::All),
            "nearest" => Ok(MatchPolicy::Nearest),
            other => Err(format!(
                "unknown match policy `{}` (expected all or nearest)",
                other
            )),
        }
    }
}
