use std::sync::Arc;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolumeClaim, Pod, Secret, Service,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ListParams;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use kubeglance_types::{NamespaceHealthSummary, ResourceKind};

use crate::classify::{self, Contribution, HELM_RELEASE_SELECTOR, KindReport};
use crate::error::HealthError;
use crate::policy::{Criticality, HealthOptions};
use crate::reader::NamespaceReader;

/// Tagged result of one kind's query
#[derive(Debug)]
pub struct KindOutcome {
    pub kind: ResourceKind,
    pub criticality: Criticality,
    pub result: Result<KindReport, kube::Error>,
}

// ============================================================================
// Summary
// ============================================================================

/// Summarize the health of `namespace`.
///
/// Every kind in the policy table is queried concurrently. A failed critical
/// query is returned as the only error; failed best-effort queries leave
/// their fields at zero. Cancelling `cancel` or exceeding the configured
/// timeout aborts all outstanding queries.
pub async fn summarize_namespace<R: NamespaceReader>(
    reader: Arc<R>,
    namespace: &str,
    options: &HealthOptions,
    cancel: &CancellationToken,
) -> Result<NamespaceHealthSummary, HealthError> {
    let scope = cancel.child_token();
    let _scope_guard = scope.clone().drop_guard();

    tracing::debug!(namespace, "summarizing namespace");
    let collect = collect_outcomes(reader, namespace, options, &scope);
    let outcomes = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| HealthError::Timeout(limit))??,
        None => collect.await?,
    };

    assemble(namespace, outcomes, options)
}

/// Run one query task per kind and gather the outcomes in completion order
pub async fn collect_outcomes<R: NamespaceReader>(
    reader: Arc<R>,
    namespace: &str,
    options: &HealthOptions,
    cancel: &CancellationToken,
) -> Result<Vec<KindOutcome>, HealthError> {
    let mut tasks = JoinSet::new();

    for policy in options.queried() {
        let reader = Arc::clone(&reader);
        let namespace = namespace.to_string();

        tasks.spawn(async move {
            let result = query_kind(reader.as_ref(), &namespace, policy.kind).await;
            KindOutcome {
                kind: policy.kind,
                criticality: policy.criticality,
                result,
            }
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tasks.shutdown().await;
                return Err(HealthError::Cancelled);
            }
            next = tasks.join_next() => match next {
                Some(joined) => outcomes.push(joined?),
                None => break,
            },
        }
    }

    Ok(outcomes)
}

/// Fold outcomes into a summary
pub fn assemble(
    namespace: &str,
    outcomes: Vec<KindOutcome>,
    options: &HealthOptions,
) -> Result<NamespaceHealthSummary, HealthError> {
    let mut summary = NamespaceHealthSummary::new(namespace.to_string());

    for outcome in outcomes {
        let report = match (outcome.result, outcome.criticality) {
            (Ok(report), _) => report,
            (Err(source), Criticality::Critical) => {
                tracing::warn!(namespace, kind = %outcome.kind, error = %source, "critical query failed");
                return Err(HealthError::Critical {
                    kind: outcome.kind,
                    source,
                });
            }
            (Err(source), Criticality::BestEffort) => {
                tracing::debug!(namespace, kind = %outcome.kind, error = %source, "skipping failed query");
                continue;
            }
        };

        summary.counts.set(report.kind, report.count);
        match report.contribution {
            Contribution::None => {}
            Contribution::Pods(pods) => summary.pods = pods,
            Contribution::Deployments(deployments) => summary.deployments = deployments,
            Contribution::Jobs(jobs) => summary.jobs = jobs,
            Contribution::Releases(releases) => summary.releases = Some(releases),
        }
        summary.problems.extend(report.problems);
    }

    summary.problems.sort_by(|a, b| {
        options
            .priority(a.kind)
            .cmp(&options.priority(b.kind))
            .then_with(|| a.name.cmp(&b.name))
    });
    summary.problems.truncate(options.problem_cap);

    Ok(summary)
}

// ============================================================================
// Queries
// ============================================================================

async fn query_kind<R: NamespaceReader>(
    reader: &R,
    namespace: &str,
    kind: ResourceKind,
) -> Result<KindReport, kube::Error> {
    let all = ListParams::default();

    let report = match kind {
        ResourceKind::Pod => classify::pods(&reader.list::<Pod>(namespace, &all).await?),
        ResourceKind::Deployment => {
            classify::deployments(&reader.list::<Deployment>(namespace, &all).await?)
        }
        ResourceKind::Job => classify::jobs(&reader.list::<Job>(namespace, &all).await?),
        ResourceKind::StatefulSet => {
            classify::stateful_sets(&reader.list::<StatefulSet>(namespace, &all).await?)
        }
        ResourceKind::DaemonSet => {
            classify::daemon_sets(&reader.list::<DaemonSet>(namespace, &all).await?)
        }
        ResourceKind::PersistentVolumeClaim => classify::persistent_volume_claims(
            &reader.list::<PersistentVolumeClaim>(namespace, &all).await?,
        ),
        ResourceKind::CronJob => {
            KindReport::counted(kind, reader.list::<CronJob>(namespace, &all).await?.len())
        }
        ResourceKind::Service => {
            KindReport::counted(kind, reader.list::<Service>(namespace, &all).await?.len())
        }
        ResourceKind::Ingress => {
            KindReport::counted(kind, reader.list::<Ingress>(namespace, &all).await?.len())
        }
        ResourceKind::ConfigMap => {
            KindReport::counted(kind, reader.list::<ConfigMap>(namespace, &all).await?.len())
        }
        ResourceKind::Secret => {
            KindReport::counted(kind, reader.list::<Secret>(namespace, &all).await?.len())
        }
        ResourceKind::Release => {
            let params = ListParams::default().labels(HELM_RELEASE_SELECTOR);
            classify::releases(&reader.list::<Secret>(namespace, &params).await?)
        }
    };

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::policy::{DEFAULT_POLICY, DEFAULT_PROBLEM_CAP};
    use crate::testing::{FakeReader, api_error};
    use kubeglance_types::ProblematicResource;

    fn failed_pod(name: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name },
            "status": { "phase": "Failed", "reason": "Evicted" }
        }))
        .unwrap()
    }

    fn running_pod(name: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name },
            "status": { "phase": "Running" }
        }))
        .unwrap()
    }

    fn stuck_deployment(name: &str) -> Deployment {
        serde_json::from_value(json!({
            "metadata": { "name": name },
            "spec": { "replicas": 2, "selector": {}, "template": {} },
            "status": { "unavailableReplicas": 2 }
        }))
        .unwrap()
    }

    fn service(name: &str) -> Service {
        serde_json::from_value(json!({ "metadata": { "name": name } })).unwrap()
    }

    async fn summarize(
        reader: FakeReader,
        options: &HealthOptions,
    ) -> Result<NamespaceHealthSummary, HealthError> {
        summarize_namespace(Arc::new(reader), "apps", options, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_problem_cap_keeps_true_counts() {
        let pods = (0..12).map(|i| failed_pod(&format!("worker-{i:02}"))).collect();
        let reader = FakeReader::new().with::<Pod>(pods);

        let summary = summarize(reader, &HealthOptions::default()).await.unwrap();

        assert_eq!(summary.problems.len(), DEFAULT_PROBLEM_CAP);
        assert!(summary.problems.iter().all(|p| p.kind == ResourceKind::Pod));
        assert_eq!(summary.pods.failed, 12);
        assert_eq!(summary.counts.pods, 12);
        assert_eq!(summary.problems[0].name, "worker-00");
        assert_eq!(summary.problems[9].name, "worker-09");
    }

    #[tokio::test]
    async fn test_critical_failure_returns_no_summary() {
        let reader = FakeReader::new()
            .with::<Pod>(vec![running_pod("web")])
            .failing::<Deployment>(403);

        let result = summarize(reader, &HealthOptions::default()).await;

        match result {
            Err(error @ HealthError::Critical { kind, .. }) => {
                assert_eq!(kind, ResourceKind::Deployment);
                assert_eq!(error.status_code(), http::StatusCode::FORBIDDEN);
            }
            other => panic!("expected critical error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_best_effort_failures_are_absorbed() {
        let reader = FakeReader::new()
            .with::<Pod>(vec![running_pod("web")])
            .with::<Service>(vec![service("web"), service("db")])
            .failing::<Secret>(403)
            .failing::<StatefulSet>(500);

        let summary = summarize(reader, &HealthOptions::default()).await.unwrap();

        assert_eq!(summary.counts.pods, 1);
        assert_eq!(summary.counts.services, 2);
        assert_eq!(summary.counts.secrets, 0);
        assert_eq!(summary.counts.stateful_sets, 0);
        assert_eq!(summary.releases, None);
        assert!(summary.problems.is_empty());
    }

    #[tokio::test]
    async fn test_empty_namespace() {
        let summary = summarize(FakeReader::new(), &HealthOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.namespace, "apps");
        assert!(summary.problems.is_empty());
        assert_eq!(summary.releases, Some(Vec::new()));
        assert!(summary.is_healthy());
    }

    #[tokio::test]
    async fn test_release_listing_can_be_skipped() {
        let reader = Arc::new(FakeReader::new());
        let options = HealthOptions {
            include_releases: false,
            ..Default::default()
        };

        let summary = summarize_namespace(
            Arc::clone(&reader),
            "apps",
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.releases, None);
        assert_eq!(reader.calls(), DEFAULT_POLICY.len() - 1);
    }

    #[tokio::test]
    async fn test_problems_ordered_by_kind_then_name() {
        let reader = FakeReader::new()
            .with::<Deployment>(vec![stuck_deployment("api")])
            .with::<Pod>(vec![failed_pod("b"), failed_pod("a")]);
        let options = HealthOptions {
            problem_cap: 2,
            ..Default::default()
        };

        let summary = summarize(reader, &options).await.unwrap();

        assert_eq!(
            summary.problems,
            vec![
                ProblematicResource::new(ResourceKind::Pod, "a", "Evicted"),
                ProblematicResource::new(ResourceKind::Pod, "b", "Evicted"),
            ]
        );
        assert_eq!(summary.deployments.unknown, 1);
    }

    #[tokio::test]
    async fn test_timeout_aborts_queries() {
        let reader = FakeReader::new()
            .with::<Pod>(vec![running_pod("web")])
            .hanging::<ConfigMap>();
        let options = HealthOptions {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };

        let result = summarize(reader, &options).await;

        assert!(matches!(result, Err(HealthError::Timeout(limit)) if limit == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_queries() {
        let reader = Arc::new(FakeReader::new().hanging::<Pod>());
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let reader = Arc::clone(&reader);
            let cancel = cancel.clone();
            async move {
                summarize_namespace(reader, "apps", &HealthOptions::default(), &cancel).await
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(HealthError::Cancelled)));
    }

    #[test]
    fn test_first_critical_error_in_completion_order_wins() {
        let outcomes = vec![
            KindOutcome {
                kind: ResourceKind::Pod,
                criticality: Criticality::Critical,
                result: Ok(KindReport::counted(ResourceKind::Pod, 3)),
            },
            KindOutcome {
                kind: ResourceKind::Job,
                criticality: Criticality::Critical,
                result: Err(api_error(500)),
            },
            KindOutcome {
                kind: ResourceKind::Deployment,
                criticality: Criticality::Critical,
                result: Err(api_error(403)),
            },
        ];

        let result = assemble("apps", outcomes, &HealthOptions::default());

        assert!(matches!(
            result,
            Err(HealthError::Critical {
                kind: ResourceKind::Job,
                ..
            })
        ));
    }
}
