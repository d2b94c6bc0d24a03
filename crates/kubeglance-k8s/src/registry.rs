use parking_lot::RwLock;

use kubeglance_types::ContextInfo;

use crate::error::ConnectionError;
use crate::sources::CredentialSources;

/// Contexts of the merged kubeconfig and the currently selected one
pub struct ContextRegistry {
    sources: CredentialSources,
    active: RwLock<Option<String>>,
}

impl ContextRegistry {
    /// Create a registry, selecting the kubeconfig's current context
    pub fn new(sources: CredentialSources) -> Self {
        let active = sources
            .kubeconfig
            .current_context
            .clone()
            .filter(|name| !name.is_empty());

        Self {
            sources,
            active: RwLock::new(active),
        }
    }

    /// Get all available contexts
    pub fn list_contexts(&self) -> Vec<ContextInfo> {
        let active = self.active.read().clone();

        self.sources
            .kubeconfig
            .contexts
            .iter()
            .map(|ctx| {
                let context = ctx.context.as_ref();
                ContextInfo::new(
                    ctx.name.clone(),
                    context.map(|c| c.cluster.clone()).unwrap_or_default(),
                    context.and_then(|c| c.user.clone()).unwrap_or_default(),
                    context.and_then(|c| c.namespace.clone()),
                    Some(&ctx.name) == active.as_ref(),
                )
            })
            .collect()
    }

    /// Get a single context by name
    pub fn context(&self, name: &str) -> Option<ContextInfo> {
        self.list_contexts().into_iter().find(|ctx| ctx.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.kubeconfig.contexts.iter().any(|ctx| ctx.name == name)
    }

    /// Get the active context name
    pub fn active_context(&self) -> Option<String> {
        self.active.read().clone()
    }

    /// Make `name` the active context; unknown names leave the selection as is
    pub fn select_context(&self, name: &str) -> Result<(), ConnectionError> {
        if !self.contains(name) {
            return Err(ConnectionError::ContextNotFound(name.to_string()));
        }

        let mut active = self.active.write();
        if active.as_deref() != Some(name) {
            tracing::info!(context = name, "switching active context");
            *active = Some(name.to_string());
        }

        Ok(())
    }

    pub fn sources(&self) -> &CredentialSources {
        &self.sources
    }
}
