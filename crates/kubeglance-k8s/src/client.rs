//! Kubernetes client bundles, cached per context

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::Discovery;
use kube::api::ApiResource;
use kube::config::KubeConfigOptions;
use kube::discovery::ApiCapabilities;
use parking_lot::RwLock;
use tokio::sync::OnceCell;

use kubeglance_types::ContextInfo;

use crate::error::ConnectionError;
use crate::exec_env::ExecDefaults;
use crate::registry::ContextRegistry;
use crate::sources::CredentialSources;

pub type DiscoveryList = Vec<(ApiResource, ApiCapabilities)>;

type Slot<B> = Arc<OnceCell<Arc<B>>>;

// ============================================================================
// Client Bundle
// ============================================================================

/// Transport configuration, typed client and discovery client for one context
pub struct ClientBundle {
    context: String,
    config: kube::Config,
    client: kube::Client,
    discovery: DiscoveryClient,
}

impl ClientBundle {
    /// Build the bundle for `context` from the merged kubeconfig
    pub async fn connect(
        sources: &CredentialSources,
        context: &str,
    ) -> Result<Self, ConnectionError> {
        let mut config = kube::Config::from_custom_kubeconfig(
            sources.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|source| ConnectionError::Config {
            context: context.to_string(),
            source,
        })?;

        // Exec plugins run when the client is created, so defaults go in first
        if let Some(exec) = config.auth_info.exec.as_mut() {
            ExecDefaults::for_sources(sources).apply(exec);
        }

        let client =
            kube::Client::try_from(config.clone()).map_err(|source| ConnectionError::Client {
                context: context.to_string(),
                source,
            })?;

        Ok(Self {
            context: context.to_string(),
            discovery: DiscoveryClient::new(client.clone()),
            config,
            client,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn config(&self) -> &kube::Config {
        &self.config
    }

    /// Typed client; cloning it is cheap
    pub fn client(&self) -> &kube::Client {
        &self.client
    }

    pub fn discovery(&self) -> &DiscoveryClient {
        &self.discovery
    }
}

/// API server version and resource discovery
#[derive(Clone)]
pub struct DiscoveryClient {
    client: kube::Client,
}

impl DiscoveryClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    pub async fn server_version(&self) -> Result<Info, kube::Error> {
        self.client.apiserver_version().await
    }

    /// Run a full discovery and flatten it to resource/capability pairs
    pub async fn resources(&self) -> Result<DiscoveryList, kube::Error> {
        let discovery = Discovery::new(self.client.clone()).run().await?;

        Ok(discovery
            .groups()
            .flat_map(|group| {
                group
                    .versions()
                    .flat_map(move |version| group.versioned_resources(version))
            })
            .collect())
    }
}

// ============================================================================
// Client Cache
// ============================================================================

/// Builds the bundle cached for a context
pub trait BundleFactory: Send + Sync + 'static {
    type Bundle: Send + Sync + 'static;

    fn build(
        &self,
        sources: &CredentialSources,
        context: &str,
    ) -> impl Future<Output = Result<Self::Bundle, ConnectionError>> + Send;
}

/// Factory producing real [`ClientBundle`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct KubeBundleFactory;

impl BundleFactory for KubeBundleFactory {
    type Bundle = ClientBundle;

    fn build(
        &self,
        sources: &CredentialSources,
        context: &str,
    ) -> impl Future<Output = Result<ClientBundle, ConnectionError>> + Send {
        ClientBundle::connect(sources, context)
    }
}

/// Lazily built bundles, at most one per context name.
///
/// The map lock is held only to find or insert a slot. Construction happens
/// inside the slot's `OnceCell`, so concurrent first use of one context waits
/// for a single build while other contexts proceed. A failed build leaves the
/// slot empty and the next call tries again.
pub struct ClientCache<F: BundleFactory = KubeBundleFactory> {
    registry: Arc<ContextRegistry>,
    factory: F,
    slots: RwLock<HashMap<String, Slot<F::Bundle>>>,
}

impl<F: BundleFactory> ClientCache<F> {
    pub fn new(registry: Arc<ContextRegistry>, factory: F) -> Self {
        Self {
            registry,
            factory,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the bundle for `context`, building it on first use
    pub async fn get(&self, context: &str) -> Result<Arc<F::Bundle>, ConnectionError> {
        let slot = self.slot(context)?;

        let bundle = slot
            .get_or_try_init(|| async {
                tracing::info!(context, "building client");
                let bundle = self.factory.build(self.registry.sources(), context).await;
                if let Err(error) = &bundle {
                    tracing::warn!(context, error = ?error, "client construction failed");
                }
                bundle.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(bundle))
    }

    /// Already built bundle for `context`, if any
    pub fn cached(&self, context: &str) -> Option<Arc<F::Bundle>> {
        self.slots
            .read()
            .get(context)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of built bundles
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, context: &str) -> Result<Slot<F::Bundle>, ConnectionError> {
        if let Some(slot) = self.slots.read().get(context) {
            return Ok(Arc::clone(slot));
        }

        if !self.registry.contains(context) {
            return Err(ConnectionError::ContextNotFound(context.to_string()));
        }

        // Another caller may have inserted the slot between the two locks
        let mut slots = self.slots.write();
        Ok(Arc::clone(slots.entry(context.to_string()).or_default()))
    }
}

// ============================================================================
// Kube Client
// ============================================================================

/// Context registry and client cache behind one handle
pub struct KubeClient<F: BundleFactory = KubeBundleFactory> {
    registry: Arc<ContextRegistry>,
    cache: ClientCache<F>,
}

impl KubeClient {
    /// Create a new KubeClient from already loaded kubeconfig files
    pub fn new(sources: CredentialSources) -> Self {
        Self::with_factory(sources, KubeBundleFactory)
    }

    /// Create a new KubeClient from the files named by `KUBECONFIG`
    pub fn from_env() -> Result<Self, ConnectionError> {
        Ok(Self::new(CredentialSources::from_env()?))
    }
}

impl<F: BundleFactory> KubeClient<F> {
    pub fn with_factory(sources: CredentialSources, factory: F) -> Self {
        let registry = Arc::new(ContextRegistry::new(sources));
        let cache = ClientCache::new(Arc::clone(&registry), factory);
        Self { registry, cache }
    }

    /// Get all available contexts from kubeconfig
    pub fn get_contexts(&self) -> Vec<ContextInfo> {
        self.registry.list_contexts()
    }

    /// Get the current context name
    pub fn current_context(&self) -> Option<String> {
        self.registry.active_context()
    }

    /// Select another context; cached bundles are kept
    pub fn switch_context(&self, name: &str) -> Result<(), ConnectionError> {
        self.registry.select_context(name)
    }

    /// Get the bundle for a specific context
    pub async fn client_for_context(&self, name: &str) -> Result<Arc<F::Bundle>, ConnectionError> {
        self.cache.get(name).await
    }

    /// Get the bundle for the active context
    pub async fn active_client(&self) -> Result<Arc<F::Bundle>, ConnectionError> {
        let context = self
            .current_context()
            .ok_or(ConnectionError::NoActiveContext)?;
        self.cache.get(&context).await
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ClientCache<F> {
        &self.cache
    }
}
