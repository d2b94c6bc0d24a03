//! Shared types for kubeglance
//!
//! This crate contains the data structures passed between the connection layer,
//! the health aggregator and whatever presents the results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Context Types
// ============================================================================

/// Kubernetes context information
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub is_current: bool,
}

impl ContextInfo {
    pub fn new(
        name: String,
        cluster: String,
        user: String,
        namespace: Option<String>,
        is_current: bool,
    ) -> Self {
        Self {
            name,
            cluster,
            user,
            namespace,
            is_current,
        }
    }
}

// ============================================================================
// Resource Kinds
// ============================================================================

/// Resource kinds that take part in a namespace summary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pod,
    Deployment,
    Job,
    StatefulSet,
    DaemonSet,
    CronJob,
    Service,
    Ingress,
    PersistentVolumeClaim,
    ConfigMap,
    Secret,
    Release,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        Self::Pod,
        Self::Deployment,
        Self::Job,
        Self::StatefulSet,
        Self::DaemonSet,
        Self::CronJob,
        Self::Service,
        Self::Ingress,
        Self::PersistentVolumeClaim,
        Self::ConfigMap,
        Self::Secret,
        Self::Release,
    ];

    /// Lowercase tag used in JSON and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Deployment => "deployment",
            Self::Job => "job",
            Self::StatefulSet => "statefulset",
            Self::DaemonSet => "daemonset",
            Self::CronJob => "cronjob",
            Self::Service => "service",
            Self::Ingress => "ingress",
            Self::PersistentVolumeClaim => "persistentvolumeclaim",
            Self::ConfigMap => "configmap",
            Self::Secret => "secret",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Returned when a string does not name a [`ResourceKind`]
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("unknown resource kind '{0}'")]
pub struct UnknownKind(pub String);

// ============================================================================
// Health Buckets
// ============================================================================

/// Pod lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PodStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Pod counts per lifecycle phase
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PodHealth {
    pub running: usize,
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl PodHealth {
    pub fn record(&mut self, status: PodStatus) {
        match status {
            PodStatus::Running => self.running += 1,
            PodStatus::Pending => self.pending += 1,
            PodStatus::Succeeded => self.succeeded += 1,
            PodStatus::Failed => self.failed += 1,
            PodStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.running + self.pending + self.succeeded + self.failed + self.unknown
    }
}

/// Coarse deployment state derived from replica counts and conditions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentStatus {
    Paused,
    ScaledToZero,
    Available,
    Progressing,
    Unknown,
}

impl DeploymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::ScaledToZero => "scaled to zero",
            Self::Available => "available",
            Self::Progressing => "progressing",
            Self::Unknown => "unknown",
        }
    }
}

/// Deployment counts per [`DeploymentStatus`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentHealth {
    pub available: usize,
    pub progressing: usize,
    pub paused: usize,
    pub scaled_to_zero: usize,
    pub unknown: usize,
}

impl DeploymentHealth {
    pub fn record(&mut self, status: DeploymentStatus) {
        match status {
            DeploymentStatus::Available => self.available += 1,
            DeploymentStatus::Progressing => self.progressing += 1,
            DeploymentStatus::Paused => self.paused += 1,
            DeploymentStatus::ScaledToZero => self.scaled_to_zero += 1,
            DeploymentStatus::Unknown => self.unknown += 1,
        }
    }
}

/// Job counts by completion state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JobHealth {
    pub active: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Inventory counters per resource kind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    pub pods: usize,
    pub deployments: usize,
    pub jobs: usize,
    pub stateful_sets: usize,
    pub daemon_sets: usize,
    pub cron_jobs: usize,
    pub services: usize,
    pub ingresses: usize,
    pub persistent_volume_claims: usize,
    pub config_maps: usize,
    pub secrets: usize,
    pub releases: usize,
}

impl ResourceCounts {
    pub fn set(&mut self, kind: ResourceKind, count: usize) {
        *self.slot(kind) = count;
    }

    pub fn get(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Pod => self.pods,
            ResourceKind::Deployment => self.deployments,
            ResourceKind::Job => self.jobs,
            ResourceKind::StatefulSet => self.stateful_sets,
            ResourceKind::DaemonSet => self.daemon_sets,
            ResourceKind::CronJob => self.cron_jobs,
            ResourceKind::Service => self.services,
            ResourceKind::Ingress => self.ingresses,
            ResourceKind::PersistentVolumeClaim => self.persistent_volume_claims,
            ResourceKind::ConfigMap => self.config_maps,
            ResourceKind::Secret => self.secrets,
            ResourceKind::Release => self.releases,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut usize {
        match kind {
            ResourceKind::Pod => &mut self.pods,
            ResourceKind::Deployment => &mut self.deployments,
            ResourceKind::Job => &mut self.jobs,
            ResourceKind::StatefulSet => &mut self.stateful_sets,
            ResourceKind::DaemonSet => &mut self.daemon_sets,
            ResourceKind::CronJob => &mut self.cron_jobs,
            ResourceKind::Service => &mut self.services,
            ResourceKind::Ingress => &mut self.ingresses,
            ResourceKind::PersistentVolumeClaim => &mut self.persistent_volume_claims,
            ResourceKind::ConfigMap => &mut self.config_maps,
            ResourceKind::Secret => &mut self.secrets,
            ResourceKind::Release => &mut self.releases,
        }
    }
}

// ============================================================================
// Summary Types
// ============================================================================

/// A resource flagged as unhealthy
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProblematicResource {
    pub kind: ResourceKind,
    pub name: String,
    pub reason: String,
}

impl ProblematicResource {
    pub fn new(kind: ResourceKind, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Latest revision of an installed release
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub name: String,
    pub revision: u32,
    pub status: String,
}

/// Health and inventory report for one namespace
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceHealthSummary {
    pub namespace: String,
    pub generated_at: DateTime<Utc>,
    pub counts: ResourceCounts,
    pub pods: PodHealth,
    pub deployments: DeploymentHealth,
    pub jobs: JobHealth,
    pub problems: Vec<ProblematicResource>,
    pub releases: Option<Vec<ReleaseInfo>>,
}

impl NamespaceHealthSummary {
    pub fn new(namespace: String) -> Self {
        Self {
            namespace,
            generated_at: Utc::now(),
            counts: ResourceCounts::default(),
            pods: PodHealth::default(),
            deployments: DeploymentHealth::default(),
            jobs: JobHealth::default(),
            problems: Vec::new(),
            releases: None,
        }
    }

    /// Whether no problem was found
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }
}
