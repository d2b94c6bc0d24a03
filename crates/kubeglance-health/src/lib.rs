//! Namespace health aggregation for kubeglance
//!
//! This crate queries every resource kind of a namespace concurrently,
//! classifies the results and folds them into a capped health summary.

mod aggregator;
mod classify;
mod error;
mod policy;
mod reader;

#[cfg(test)]
mod testing;

pub use aggregator::{KindOutcome, assemble, collect_outcomes, summarize_namespace};
pub use classify::{Contribution, HELM_RELEASE_SELECTOR, KindReport};
pub use error::HealthError;
pub use policy::{Criticality, DEFAULT_POLICY, DEFAULT_PROBLEM_CAP, HealthOptions, KindPolicy};
pub use reader::NamespaceReader;

// Re-export types used in our public API
pub use kubeglance_types::{NamespaceHealthSummary, ProblematicResource, ReleaseInfo, ResourceKind};
