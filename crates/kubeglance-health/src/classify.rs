//! Per-kind classification of listed resources into health buckets and problems.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ContainerStatus, PersistentVolumeClaim, Pod, Secret};
use kube::ResourceExt;

use kubeglance_types::{
    DeploymentHealth, DeploymentStatus, JobHealth, PodHealth, PodStatus, ProblematicResource,
    ReleaseInfo, ResourceKind,
};

/// Label selector matching helm release records
pub const HELM_RELEASE_SELECTOR: &str = "owner=helm";

/// What one kind adds to the summary beyond its count
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Contribution {
    #[default]
    None,
    Pods(PodHealth),
    Deployments(DeploymentHealth),
    Jobs(JobHealth),
    Releases(Vec<ReleaseInfo>),
}

/// Classified result of a single kind's query
#[derive(Clone, Debug, PartialEq)]
pub struct KindReport {
    pub kind: ResourceKind,
    pub count: usize,
    pub contribution: Contribution,
    pub problems: Vec<ProblematicResource>,
}

impl KindReport {
    /// Report carrying only an inventory count
    pub fn counted(kind: ResourceKind, count: usize) -> Self {
        Self {
            kind,
            count,
            contribution: Contribution::None,
            problems: Vec::new(),
        }
    }
}

// ============================================================================
// Pods
// ============================================================================

pub fn pods(pods: &[Pod]) -> KindReport {
    let mut health = PodHealth::default();
    let mut problems = Vec::new();

    for pod in pods {
        let status = pod.status.as_ref();
        let phase = status
            .and_then(|s| s.phase.as_deref())
            .map(PodStatus::from)
            .unwrap_or(PodStatus::Unknown);
        health.record(phase);

        let containers = status
            .and_then(|s| s.container_statuses.as_deref())
            .unwrap_or_default();
        let init_containers = status
            .and_then(|s| s.init_container_statuses.as_deref())
            .unwrap_or_default();
        let status_reason = status.and_then(|s| s.reason.clone());

        let reason = match phase {
            PodStatus::Failed => Some(status_reason.unwrap_or_else(|| "Failed".to_string())),
            PodStatus::Pending => Some(
                first_waiting_reason(init_containers)
                    .map(|reason| format!("Init:{reason}"))
                    .or_else(|| first_waiting_reason(containers))
                    .or(status_reason)
                    .unwrap_or_else(|| "Pending".to_string()),
            ),
            PodStatus::Running => containers
                .iter()
                .find(|c| !c.ready)
                .map(|c| waiting_reason(c).unwrap_or_else(|| "not ready".to_string())),
            PodStatus::Succeeded | PodStatus::Unknown => None,
        };

        if let Some(reason) = reason {
            problems.push(ProblematicResource::new(ResourceKind::Pod, pod.name_any(), reason));
        }
    }

    KindReport {
        kind: ResourceKind::Pod,
        count: pods.len(),
        contribution: Contribution::Pods(health),
        problems,
    }
}

fn waiting_reason(container: &ContainerStatus) -> Option<String> {
    container
        .state
        .as_ref()
        .and_then(|s| s.waiting.as_ref())
        .and_then(|w| w.reason.clone())
}

fn first_waiting_reason(containers: &[ContainerStatus]) -> Option<String> {
    containers.iter().find_map(waiting_reason)
}

// ============================================================================
// Deployments
// ============================================================================

pub fn deployments(deployments: &[Deployment]) -> KindReport {
    let mut health = DeploymentHealth::default();
    let mut problems = Vec::new();

    for deployment in deployments {
        let state = deployment_status(deployment);
        health.record(state);

        let desired = desired_replicas(deployment);
        if state != DeploymentStatus::Available && desired > 0 {
            problems.push(ProblematicResource::new(
                ResourceKind::Deployment,
                deployment.name_any(),
                deployment_reason(deployment, state),
            ));
        }
    }

    KindReport {
        kind: ResourceKind::Deployment,
        count: deployments.len(),
        contribution: Contribution::Deployments(health),
        problems,
    }
}

fn desired_replicas(deployment: &Deployment) -> i32 {
    deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1)
}

/// Derive the coarse state of a deployment
pub fn deployment_status(deployment: &Deployment) -> DeploymentStatus {
    let spec = deployment.spec.as_ref();
    let status = deployment.status.as_ref();

    if spec.and_then(|s| s.paused).unwrap_or(false) {
        return DeploymentStatus::Paused;
    }

    let desired = desired_replicas(deployment);
    if desired == 0 {
        return DeploymentStatus::ScaledToZero;
    }

    let available = status.and_then(|s| s.available_replicas).unwrap_or(0);
    let unavailable = status.and_then(|s| s.unavailable_replicas).unwrap_or(0);
    if available >= desired && unavailable == 0 {
        return DeploymentStatus::Available;
    }

    let progressing = status
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Progressing" && c.status == "True")
        });
    if progressing {
        DeploymentStatus::Progressing
    } else {
        DeploymentStatus::Unknown
    }
}

fn deployment_reason(deployment: &Deployment, state: DeploymentStatus) -> String {
    let status = deployment.status.as_ref();

    let unavailable = status.and_then(|s| s.unavailable_replicas).unwrap_or(0);
    if unavailable > 0 {
        let plural = if unavailable == 1 { "" } else { "s" };
        return format!("{unavailable} unavailable replica{plural}");
    }

    status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| {
            conditions
                .iter()
                .find(|c| c.status == "False")
                .and_then(|c| c.reason.clone())
        })
        .unwrap_or_else(|| state.label().to_string())
}

// ============================================================================
// Jobs
// ============================================================================

pub fn jobs(jobs: &[Job]) -> KindReport {
    let mut health = JobHealth::default();
    let mut problems = Vec::new();

    for job in jobs {
        let status = job.status.as_ref();
        let conditions = status
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default();
        let failed = conditions
            .iter()
            .find(|c| c.type_ == "Failed" && c.status == "True");
        let complete = conditions
            .iter()
            .any(|c| c.type_ == "Complete" && c.status == "True");

        if let Some(condition) = failed {
            health.failed += 1;
            let reason = condition.reason.clone().unwrap_or_else(|| "Failed".to_string());
            problems.push(ProblematicResource::new(ResourceKind::Job, job.name_any(), reason));
        } else if complete {
            health.succeeded += 1;
        } else if status.and_then(|s| s.active).unwrap_or(0) > 0 {
            health.active += 1;
        } else if status.and_then(|s| s.succeeded).unwrap_or(0) > 0 {
            health.succeeded += 1;
        }
    }

    KindReport {
        kind: ResourceKind::Job,
        count: jobs.len(),
        contribution: Contribution::Jobs(health),
        problems,
    }
}

// ============================================================================
// Workloads and storage
// ============================================================================

fn readiness(kind: ResourceKind, name: String, ready: i32, desired: i32) -> Option<ProblematicResource> {
    (ready < desired).then(|| ProblematicResource::new(kind, name, format!("{ready}/{desired} ready")))
}

pub fn stateful_sets(sets: &[StatefulSet]) -> KindReport {
    let problems = sets
        .iter()
        .filter_map(|set| {
            let desired = set.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
            let ready = set.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0);
            readiness(ResourceKind::StatefulSet, set.name_any(), ready, desired)
        })
        .collect();

    KindReport {
        problems,
        ..KindReport::counted(ResourceKind::StatefulSet, sets.len())
    }
}

pub fn daemon_sets(sets: &[DaemonSet]) -> KindReport {
    let problems = sets
        .iter()
        .filter_map(|set| {
            let status = set.status.as_ref();
            let desired = status.map(|s| s.desired_number_scheduled).unwrap_or(0);
            let ready = status.map(|s| s.number_ready).unwrap_or(0);
            readiness(ResourceKind::DaemonSet, set.name_any(), ready, desired)
        })
        .collect();

    KindReport {
        problems,
        ..KindReport::counted(ResourceKind::DaemonSet, sets.len())
    }
}

pub fn persistent_volume_claims(claims: &[PersistentVolumeClaim]) -> KindReport {
    let problems = claims
        .iter()
        .filter_map(|claim| {
            let phase = claim.status.as_ref().and_then(|s| s.phase.as_deref());
            match phase {
                Some("Bound") => None,
                other => Some(ProblematicResource::new(
                    ResourceKind::PersistentVolumeClaim,
                    claim.name_any(),
                    other.unwrap_or("Unknown"),
                )),
            }
        })
        .collect();

    KindReport {
        problems,
        ..KindReport::counted(ResourceKind::PersistentVolumeClaim, claims.len())
    }
}

// ============================================================================
// Releases
// ============================================================================

/// Latest revision of each helm release stored as a secret
pub fn releases(secrets: &[Secret]) -> KindReport {
    let mut latest: BTreeMap<String, ReleaseInfo> = BTreeMap::new();

    for secret in secrets {
        let labels = secret.labels();
        let Some(name) = labels.get("name") else {
            continue;
        };
        let revision = labels
            .get("version")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let status = labels.get("status").cloned().unwrap_or_default();

        match latest.get(name) {
            Some(existing) if existing.revision >= revision => {}
            _ => {
                latest.insert(
                    name.clone(),
                    ReleaseInfo {
                        name: name.clone(),
                        revision,
                        status,
                    },
                );
            }
        }
    }

    let releases: Vec<ReleaseInfo> = latest.into_values().collect();
    KindReport {
        kind: ResourceKind::Release,
        count: releases.len(),
        contribution: Contribution::Releases(releases),
        problems: Vec::new(),
    }
}
