//! Kubernetes connection layer for kubeglance
//!
//! This crate discovers and merges kubeconfig files, tracks the active context
//! and lazily builds one cached client bundle per context.

mod client;
mod error;
mod exec_env;
mod registry;
mod sources;

#[cfg(test)]
mod testing;

pub use client::{
    BundleFactory, ClientBundle, ClientCache, DiscoveryClient, DiscoveryList, KubeBundleFactory,
    KubeClient,
};
pub use error::ConnectionError;
pub use exec_env::ExecDefaults;
pub use registry::ContextRegistry;
pub use sources::{CredentialSources, KUBECONFIG_ENV};

// Re-export types that are used in our public API
pub use kubeglance_types::ContextInfo;
