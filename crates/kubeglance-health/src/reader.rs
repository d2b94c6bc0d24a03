use std::fmt::Debug;
use std::future::Future;

use k8s_openapi::NamespaceResourceScope;
use kube::api::ListParams;
use kube::{Api, Resource};
use serde::de::DeserializeOwned;

use kubeglance_k8s::ClientBundle;

/// Read access to namespaced resources
pub trait NamespaceReader: Send + Sync + 'static {
    /// List every `K` in `namespace` matching `params`
    fn list<K>(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> impl Future<Output = Result<Vec<K>, kube::Error>> + Send
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static;
}

impl NamespaceReader for ClientBundle {
    fn list<K>(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> impl Future<Output = Result<Vec<K>, kube::Error>> + Send
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
    {
        let api: Api<K> = Api::namespaced(self.client().clone(), namespace);
        let params = params.clone();

        async move { api.list(&params).await.map(|list| list.items) }
    }
}
