use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use kube::api::ListParams;
use serde::de::DeserializeOwned;

use crate::reader::NamespaceReader;

/// Build an API error with the given HTTP status code
pub fn api_error(code: u16) -> kube::Error {
    kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("request failed with {code}"),
        reason: if code == 403 { "Forbidden" } else { "InternalError" }.to_string(),
        code,
    })
}

enum Response {
    Items(Arc<dyn Any + Send + Sync>),
    Fail(u16),
    Hang,
}

/// In-memory [`NamespaceReader`] keyed by resource kind
#[derive(Default)]
pub struct FakeReader {
    responses: HashMap<String, Response>,
    calls: AtomicUsize,
}

impl FakeReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<K: Resource<DynamicType = ()>>() -> String {
        K::kind(&()).into_owned()
    }

    pub fn with<K>(mut self, items: Vec<K>) -> Self
    where
        K: Resource<DynamicType = ()> + Send + Sync + 'static,
    {
        self.responses.insert(Self::key::<K>(), Response::Items(Arc::new(items)));
        self
    }

    pub fn failing<K: Resource<DynamicType = ()>>(mut self, code: u16) -> Self {
        self.responses.insert(Self::key::<K>(), Response::Fail(code));
        self
    }

    pub fn hanging<K: Resource<DynamicType = ()>>(mut self) -> Self {
        self.responses.insert(Self::key::<K>(), Response::Hang);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NamespaceReader for FakeReader {
    fn list<K>(
        &self,
        _namespace: &str,
        _params: &ListParams,
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
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (hang, result) = match self.responses.get(&Self::key::<K>()) {
            Some(Response::Items(items)) => (
                false,
                Ok(items.downcast_ref::<Vec<K>>().cloned().unwrap_or_default()),
            ),
            Some(Response::Fail(code)) => (false, Err(api_error(*code))),
            Some(Response::Hang) => (true, Ok(Vec::new())),
            None => (false, Ok(Vec::new())),
        };

        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }
}
