//! Helpers shared by the unit tests of this crate

use std::fs;
use std::path::{Path, PathBuf};

/// Temporary directory removed on drop
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("kubeglance-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a file relative to the directory and return its full path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Kubeconfig with one token-authenticated context per `(context, namespace)` pair
pub fn kubeconfig(contexts: &[(&str, Option<&str>)], current: Option<&str>) -> String {
    let mut yaml = String::from("apiVersion: v1\nkind: Config\nclusters:\n");
    for (name, _) in contexts {
        yaml.push_str(&format!(
            "- name: {name}-cluster\n  cluster:\n    server: http://127.0.0.1:6443\n"
        ));
    }

    yaml.push_str("users:\n");
    for (name, _) in contexts {
        yaml.push_str(&format!("- name: {name}-user\n  user:\n    token: {name}-token\n"));
    }

    yaml.push_str("contexts:\n");
    for (name, namespace) in contexts {
        yaml.push_str(&format!(
            "- name: {name}\n  context:\n    cluster: {name}-cluster\n    user: {name}-user\n"
        ));
        if let Some(namespace) = namespace {
            yaml.push_str(&format!("    namespace: {namespace}\n"));
        }
    }

    if let Some(current) = current {
        yaml.push_str(&format!("current-context: {current}\n"));
    }

    yaml
}
