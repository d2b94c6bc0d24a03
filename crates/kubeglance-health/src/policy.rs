use std::time::Duration;

use kubeglance_types::ResourceKind;

/// Default number of problematic resources kept in a summary
pub const DEFAULT_PROBLEM_CAP: usize = 10;

/// Whether a failed query aborts the summary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criticality {
    /// Failure fails the whole summary
    Critical,
    /// Failure leaves the kind's fields at zero
    BestEffort,
}

/// One row of the criticality table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindPolicy {
    pub kind: ResourceKind,
    pub criticality: Criticality,
}

impl KindPolicy {
    pub const fn critical(kind: ResourceKind) -> Self {
        Self {
            kind,
            criticality: Criticality::Critical,
        }
    }

    pub const fn best_effort(kind: ResourceKind) -> Self {
        Self {
            kind,
            criticality: Criticality::BestEffort,
        }
    }
}

/// Queried kinds in problem-list priority order
pub const DEFAULT_POLICY: [KindPolicy; 12] = [
    KindPolicy::critical(ResourceKind::Pod),
    KindPolicy::critical(ResourceKind::Deployment),
    KindPolicy::critical(ResourceKind::Job),
    KindPolicy::best_effort(ResourceKind::StatefulSet),
    KindPolicy::best_effort(ResourceKind::DaemonSet),
    KindPolicy::best_effort(ResourceKind::CronJob),
    KindPolicy::best_effort(ResourceKind::Service),
    KindPolicy::best_effort(ResourceKind::Ingress),
    KindPolicy::best_effort(ResourceKind::PersistentVolumeClaim),
    KindPolicy::best_effort(ResourceKind::ConfigMap),
    KindPolicy::best_effort(ResourceKind::Secret),
    KindPolicy::best_effort(ResourceKind::Release),
];

/// Settings for one namespace summary
#[derive(Clone, Debug)]
pub struct HealthOptions {
    /// Maximum number of problematic resources returned
    pub problem_cap: usize,

    /// Abort the whole summary after this long
    pub timeout: Option<Duration>,

    /// Query the release inventory
    pub include_releases: bool,

    /// Kinds to query, in problem-list priority order
    pub policy: Vec<KindPolicy>,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            problem_cap: DEFAULT_PROBLEM_CAP,
            timeout: None,
            include_releases: true,
            policy: DEFAULT_POLICY.to_vec(),
        }
    }
}

impl HealthOptions {
    /// Mark exactly `kinds` as critical, everything else as best effort
    pub fn with_critical_kinds(mut self, kinds: &[ResourceKind]) -> Self {
        for entry in &mut self.policy {
            entry.criticality = if kinds.contains(&entry.kind) {
                Criticality::Critical
            } else {
                Criticality::BestEffort
            };
        }
        self
    }

    /// Kinds that will actually be queried
    pub fn queried(&self) -> impl Iterator<Item = KindPolicy> + '_ {
        self.policy
            .iter()
            .copied()
            .filter(|entry| self.include_releases || entry.kind != ResourceKind::Release)
    }

    /// Position of `kind` in the table, used to order problems
    pub fn priority(&self, kind: ResourceKind) -> usize {
        self.policy
            .iter()
            .position(|entry| entry.kind == kind)
            .unwrap_or(self.policy.len())
    }
}
