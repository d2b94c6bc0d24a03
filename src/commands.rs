use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use kubeglance_health::{HealthError, NamespaceHealthSummary, ResourceKind, summarize_namespace};
use kubeglance_k8s::{ContextInfo, KubeClient};

use crate::cli::SummaryArgs;
use crate::settings::Settings;

const FALLBACK_NAMESPACE: &str = "default";

// ============================================================================
// Contexts
// ============================================================================

pub fn contexts(client: &KubeClient, json: bool) -> Result<()> {
    let mut contexts = client.get_contexts();
    contexts.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        println!("{}", serde_json::to_string_pretty(&contexts)?);
    } else {
        print!("{}", format_contexts(&contexts));
    }

    Ok(())
}

/// Render contexts as a table, marking the current one
pub fn format_contexts(contexts: &[ContextInfo]) -> String {
    let name_width = column_width(contexts.iter().map(|ctx| ctx.name.as_str()), "NAME");
    let cluster_width = column_width(contexts.iter().map(|ctx| ctx.cluster.as_str()), "CLUSTER");
    let user_width = column_width(contexts.iter().map(|ctx| ctx.user.as_str()), "USER");

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:name_width$}  {:cluster_width$}  {:user_width$}  NAMESPACE",
        "NAME", "CLUSTER", "USER"
    );
    for ctx in contexts {
        let _ = writeln!(
            out,
            "{} {:name_width$}  {:cluster_width$}  {:user_width$}  {}",
            if ctx.is_current { '*' } else { ' ' },
            ctx.name,
            ctx.cluster,
            ctx.user,
            ctx.namespace.as_deref().unwrap_or(""),
        );
    }
    out
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values.map(str::len).max().unwrap_or_default().max(header.len())
}

// ============================================================================
// Summary
// ============================================================================

pub async fn summary(client: &KubeClient, settings: &Settings, args: SummaryArgs) -> Result<()> {
    if let Some(context) = &args.context {
        client.switch_context(context).map_err(HealthError::from)?;
    }

    let namespace = resolve_namespace(client, settings, args.namespace.as_deref());
    let options = settings.health_options(&args);
    let interval = args.watch.map(Duration::from_secs);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    loop {
        let bundle = client.active_client().await.map_err(HealthError::from)?;
        let context = bundle.context().to_string();

        match summarize_namespace(Arc::clone(&bundle), &namespace, &options, &cancel).await {
            Ok(summary) if args.json => println!("{}", serde_json::to_string_pretty(&summary)?),
            Ok(summary) => print!("{}", format_summary(&context, &summary)),
            Err(HealthError::Cancelled) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to summarize namespace '{namespace}' in context '{context}'")
                });
            }
        }

        let Some(interval) = interval else {
            break;
        };
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    Ok(())
}

/// Render a summary as text
pub fn format_summary(context: &str, summary: &NamespaceHealthSummary) -> String {
    let mut out = String::new();

    let status = if summary.is_healthy() {
        "healthy".to_string()
    } else {
        format!("{} problems", summary.problems.len())
    };
    let _ = writeln!(out, "{}/{} ({status})", context, summary.namespace);

    let pods = &summary.pods;
    let _ = writeln!(
        out,
        "Pods:        {} total, {} running, {} pending, {} succeeded, {} failed, {} unknown",
        pods.total(),
        pods.running,
        pods.pending,
        pods.succeeded,
        pods.failed,
        pods.unknown
    );
    let deployments = &summary.deployments;
    let _ = writeln!(
        out,
        "Deployments: {} available, {} progressing, {} paused, {} scaled to zero, {} unknown",
        deployments.available,
        deployments.progressing,
        deployments.paused,
        deployments.scaled_to_zero,
        deployments.unknown
    );
    let jobs = &summary.jobs;
    let _ = writeln!(
        out,
        "Jobs:        {} active, {} succeeded, {} failed",
        jobs.active, jobs.succeeded, jobs.failed
    );

    let counted: Vec<_> = ResourceKind::ALL
        .into_iter()
        .map(|kind| (kind, summary.counts.get(kind)))
        .filter(|(_, count)| *count > 0)
        .collect();
    if !counted.is_empty() {
        let _ = writeln!(out, "Resources:");
        for (kind, count) in counted {
            let _ = writeln!(out, "  {:<22} {count}", kind.as_str());
        }
    }

    if !summary.problems.is_empty() {
        let _ = writeln!(out, "Problems:");
        for problem in &summary.problems {
            let _ = writeln!(out, "  {}/{}: {}", problem.kind, problem.name, problem.reason);
        }
    }

    if let Some(releases) = summary.releases.as_ref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "Releases:");
        for release in releases {
            let _ = writeln!(
                out,
                "  {} (revision {}, {})",
                release.name, release.revision, release.status
            );
        }
    }

    out
}

/// Namespace argument, else the context's namespace, else the configured default
fn resolve_namespace(client: &KubeClient, settings: &Settings, explicit: Option<&str>) -> String {
    if let Some(namespace) = explicit {
        return namespace.to_string();
    }

    client
        .current_context()
        .and_then(|name| client.registry().context(&name))
        .and_then(|ctx| ctx.namespace)
        .or_else(|| settings.default_namespace.clone())
        .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string())
}

// ============================================================================
// Info
// ============================================================================

pub async fn info(client: &KubeClient, context: Option<&str>) -> Result<()> {
    let bundle = match context {
        Some(name) => client.client_for_context(name).await,
        None => client.active_client().await,
    }
    .map_err(HealthError::from)?;

    let discovery = bundle.discovery();
    let version = discovery
        .server_version()
        .await
        .with_context(|| format!("failed to get server version for '{}'", bundle.context()))?;
    let resources = discovery
        .resources()
        .await
        .with_context(|| format!("failed to discover API resources for '{}'", bundle.context()))?;

    println!("Context:       {}", bundle.context());
    println!("Server:        {}", bundle.config().cluster_url);
    println!("Version:       {}", version.git_version);
    println!("Platform:      {}", version.platform);
    println!("API resources: {}", resources.len());

    Ok(())
}
