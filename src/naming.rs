// src/naming.rs

//! Job naming and hierarchical queries.
//!
//! Every submitted job is named `<profile>_C_<computeId>_E_<eventId>_M_<manifestId>`.
//! Backends keep no other index from a compute to its jobs, so status,
//! termination and log recovery all go through this encoding:
//!
//! - COMPUTE queries match every job name starting with `<profile>_C_<computeId>`
//! - EVENT queries additionally pin `_E_<eventId>`
//! - MANIFEST queries match one exact job name

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ComputeError, Result};
use crate::types::QueryLevel;

/// Namespace prefix used when none is configured.
pub const DEFAULT_PROFILE: &str = "CC";

const COMPUTE_TOKEN: &str = "_C_";
const EVENT_TOKEN: &str = "_E_";
const MANIFEST_TOKEN: &str = "_M_";

/// Canonical hyphenated 36-character UUID form.
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("static id pattern is valid")
});

/// The three identifiers carried by a job name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobNameParts {
    pub compute: String,
    pub event: String,
    pub manifest: String,
}

impl JobNameParts {
    pub fn new(
        compute: impl Into<String>,
        event: impl Into<String>,
        manifest: impl Into<String>,
    ) -> Self {
        Self {
            compute: compute.into(),
            event: event.into(),
            manifest: manifest.into(),
        }
    }

    /// Encode these parts into a job name under `profile`.
    pub fn job_name(&self, profile: &str) -> String {
        job_name(profile, &self.compute, &self.event, &self.manifest)
    }

    /// Recover the compute, event and manifest ids from a concrete job name.
    ///
    /// The name must contain exactly three identifiers in canonical UUID
    /// form, in compute / event / manifest order.
    pub fn parse(job_name: &str) -> Result<Self> {
        let ids: Vec<&str> = ID_PATTERN
            .find_iter(job_name)
            .map(|m| m.as_str())
            .collect();

        match ids.as_slice() {
            [compute, event, manifest] => Ok(Self::new(*compute, *event, *manifest)),
            _ => Err(ComputeError::InvalidJobName(format!(
                "expected 3 identifiers in '{job_name}', found {}",
                ids.len()
            ))),
        }
    }
}

/// Compose a job name from its parts.
pub fn job_name(profile: &str, compute: &str, event: &str, manifest: &str) -> String {
    format!("{profile}{COMPUTE_TOKEN}{compute}{EVENT_TOKEN}{event}{MANIFEST_TOKEN}{manifest}")
}

/// Hierarchical status / termination query.
///
/// Build one with [`JobsSummaryQuery::compute`], [`JobsSummaryQuery::event`]
/// or [`JobsSummaryQuery::manifest`]; the level is implied by the constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsSummaryQuery {
    pub profile: String,
    pub level: QueryLevel,
    pub compute: String,
    pub event: Option<String>,
    pub manifest: Option<String>,
}

impl JobsSummaryQuery {
    pub fn compute(profile: impl Into<String>, compute: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            level: QueryLevel::Compute,
            compute: compute.into(),
            event: None,
            manifest: None,
        }
    }

    pub fn event(
        profile: impl Into<String>,
        compute: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            level: QueryLevel::Event,
            compute: compute.into(),
            event: Some(event.into()),
            manifest: None,
        }
    }

    pub fn manifest(profile: impl Into<String>, parts: JobNameParts) -> Self {
        Self {
            profile: profile.into(),
            level: QueryLevel::Manifest,
            compute: parts.compute,
            event: Some(parts.event),
            manifest: Some(parts.manifest),
        }
    }

    /// Translate the query into a job-name pattern.
    ///
    /// Fails with [`ComputeError::Query`] when an identifier required by the
    /// level is missing.
    pub fn pattern(&self) -> Result<QueryPattern> {
        let base = format!("{}{COMPUTE_TOKEN}{}", self.profile, self.compute);
        match self.level {
            QueryLevel::Compute => Ok(QueryPattern::Prefix(base)),
            QueryLevel::Event => {
                let event = self.required(self.event.as_deref(), "event")?;
                Ok(QueryPattern::Prefix(format!("{base}{EVENT_TOKEN}{event}")))
            }
            QueryLevel::Manifest => {
                let event = self.required(self.event.as_deref(), "event")?;
                let manifest = self.required(self.manifest.as_deref(), "manifest")?;
                Ok(QueryPattern::Exact(format!(
                    "{base}{EVENT_TOKEN}{event}{MANIFEST_TOKEN}{manifest}"
                )))
            }
        }
    }

    fn required<'a>(&self, value: Option<&'a str>, what: &str) -> Result<&'a str> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ComputeError::Query(format!(
                "{} query for compute {} requires a {what} id",
                self.level, self.compute
            ))),
        }
    }
}

/// Job-name matcher produced from a [`JobsSummaryQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPattern {
    /// Matches any name starting with the prefix.
    Prefix(String),
    /// Matches exactly one name.
    Exact(String),
}

impl QueryPattern {
    pub fn matches(&self, job_name: &str) -> bool {
        match self {
            QueryPattern::Prefix(prefix) => job_name.starts_with(prefix.as_str()),
            QueryPattern::Exact(name) => job_name == name,
        }
    }
}

/// Renders the vendor filter string: prefixes carry a trailing `*` wildcard.
impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPattern::Prefix(prefix) => write!(f, "{prefix}*"),
            QueryPattern::Exact(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: &str = "0ed5647b-62d1-4f10-9f8d-f63821953889";
    const E: &str = "132f9720-bb85-4c23-b0af-ec4fe388fb13";
    const M: &str = "9b2f3b8e-1c8e-4e4e-9a51-4c1d2b2f6a10";

    #[test]
    fn job_name_layout() {
        let name = job_name("CC", C, E, M);
        assert_eq!(name, format!("CC_C_{C}_E_{E}_M_{M}"));
    }

    #[test]
    fn parse_recovers_parts() {
        let name = job_name("WAT", C, E, M);
        let parts = JobNameParts::parse(&name).unwrap();
        assert_eq!(parts, JobNameParts::new(C, E, M));
    }

    #[test]
    fn parse_rejects_names_without_three_ids() {
        let err = JobNameParts::parse(&format!("CC_C_{C}_E_{E}_M_plain")).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidJobName(_)));

        let err = JobNameParts::parse(&format!("{C}{E}{M}{C}")).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidJobName(_)));
    }

    #[test]
    fn compute_query_is_a_prefix_over_all_events() {
        let pattern = JobsSummaryQuery::compute("CC", C).pattern().unwrap();
        assert_eq!(pattern.to_string(), format!("CC_C_{C}*"));
        assert!(pattern.matches(&job_name("CC", C, E, M)));
        assert!(!pattern.matches(&job_name("CC", E, C, M)));
        assert!(!pattern.matches(&job_name("OTHER", C, E, M)));
    }

    #[test]
    fn event_query_pins_the_event() {
        let pattern = JobsSummaryQuery::event("CC", C, E).pattern().unwrap();
        assert_eq!(pattern.to_string(), format!("CC_C_{C}_E_{E}*"));
        assert!(pattern.matches(&job_name("CC", C, E, M)));
        assert!(!pattern.matches(&job_name("CC", C, M, E)));
    }

    #[test]
    fn manifest_query_is_exact() {
        let parts = JobNameParts::new(C, E, M);
        let pattern = JobsSummaryQuery::manifest("CC", parts.clone())
            .pattern()
            .unwrap();
        assert_eq!(pattern, QueryPattern::Exact(parts.job_name("CC")));
        assert!(!pattern.matches(&format!("{}-retry", parts.job_name("CC"))));
    }

    #[test]
    fn query_missing_required_id_is_rejected() {
        let mut query = JobsSummaryQuery::compute("CC", C);
        query.level = QueryLevel::Event;
        assert!(matches!(query.pattern(), Err(ComputeError::Query(_))));

        query.level = QueryLevel::Manifest;
        query.event = Some(E.to_string());
        assert!(matches!(query.pattern(), Err(ComputeError::Query(_))));
    }
}
