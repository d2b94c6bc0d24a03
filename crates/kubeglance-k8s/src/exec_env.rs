//! Default environment for exec credential plugins
//!
//! Plugins such as OIDC login helpers are spawned with the process environment
//! plus the variables declared in the kubeconfig. When kubeglance is started
//! outside a login shell those are often missing, so a few defaults are added
//! for anything not already set.

use std::collections::HashMap;
use std::path::PathBuf;

use kube::config::ExecConfig;

use crate::sources::{CredentialSources, KUBECONFIG_ENV};

const BROWSER_ENV: &str = "BROWSER";
const XDG_CACHE_HOME_ENV: &str = "XDG_CACHE_HOME";
const KUBECACHEDIR_ENV: &str = "KUBECACHEDIR";

/// Variables handed to exec plugins when they are not set already
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecDefaults {
    vars: Vec<(String, String)>,
}

impl ExecDefaults {
    pub fn new(vars: Vec<(String, String)>) -> Self {
        Self { vars }
    }

    /// Defaults for the current platform and the loaded kubeconfig files
    pub fn for_sources(sources: &CredentialSources) -> Self {
        let mut vars = Vec::new();

        if !sources.files.is_empty() {
            vars.push((KUBECONFIG_ENV.to_string(), sources.joined_files()));
        }

        vars.push((BROWSER_ENV.to_string(), browser_command().to_string()));

        if let Some(cache) = dirs::cache_dir() {
            vars.push((XDG_CACHE_HOME_ENV.to_string(), path_string(cache)));
        }

        if let Some(home) = dirs::home_dir() {
            vars.push((
                KUBECACHEDIR_ENV.to_string(),
                path_string(home.join(".kube").join("cache")),
            ));
        }

        Self { vars }
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    /// Add defaults missing from both the process environment and `exec.env`
    pub fn apply(&self, exec: &mut ExecConfig) {
        self.apply_with(exec, |name| {
            std::env::var_os(name).is_some_and(|value| !value.is_empty())
        });
    }

    /// Same as [`ExecDefaults::apply`] with a custom process environment lookup
    pub fn apply_with<F>(&self, exec: &mut ExecConfig, is_set: F)
    where
        F: Fn(&str) -> bool,
    {
        let env = exec.env.get_or_insert_with(Vec::new);

        for (name, value) in &self.vars {
            let declared = env
                .iter()
                .any(|entry| entry.get("name").is_some_and(|n| n == name));
            if declared || is_set(name) {
                continue;
            }

            tracing::debug!(%name, "adding exec plugin default");
            env.push(HashMap::from([
                ("name".to_string(), name.clone()),
                ("value".to_string(), value.clone()),
            ]));
        }
    }
}

/// Command that opens a URL in the user's browser
fn browser_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::config::Kubeconfig;

    fn exec_config(env: &str) -> ExecConfig {
        let yaml = format!(
            "apiVersion: v1
kind: Config
users:
- name: oidc
  user:
    exec:
      apiVersion: client.authentication.k8s.io/v1beta1
      command: kubectl-oidc_login
{env}"
        );
        let kubeconfig = Kubeconfig::from_yaml(&yaml).unwrap();
        kubeconfig.auth_infos[0]
            .auth_info
            .as_ref()
            .and_then(|auth| auth.exec.clone())
            .unwrap()
    }

    fn value_of(exec: &ExecConfig, name: &str) -> Option<String> {
        exec.env
            .as_ref()?
            .iter()
            .find(|entry| entry.get("name").map(String::as_str) == Some(name))
            .and_then(|entry| entry.get("value").cloned())
    }

    fn defaults() -> ExecDefaults {
        ExecDefaults::new(vec![
            (KUBECONFIG_ENV.to_string(), "/a:/b".to_string()),
            (BROWSER_ENV.to_string(), "xdg-open".to_string()),
            (XDG_CACHE_HOME_ENV.to_string(), "/home/me/.cache".to_string()),
        ])
    }

    #[test]
    fn test_adds_unset_variables() {
        let mut exec = exec_config("");
        defaults().apply_with(&mut exec, |_| false);

        assert_eq!(value_of(&exec, KUBECONFIG_ENV).as_deref(), Some("/a:/b"));
        assert_eq!(value_of(&exec, BROWSER_ENV).as_deref(), Some("xdg-open"));
        assert_eq!(value_of(&exec, XDG_CACHE_HOME_ENV).as_deref(), Some("/home/me/.cache"));
    }

    #[test]
    fn test_keeps_declared_variables() {
        let mut exec = exec_config(
            "      env:
      - name: BROWSER
        value: firefox
",
        );
        defaults().apply_with(&mut exec, |_| false);

        assert_eq!(value_of(&exec, BROWSER_ENV).as_deref(), Some("firefox"));
        let browsers = exec
            .env
            .as_ref()
            .unwrap()
            .iter()
            .filter(|entry| entry.get("name").map(String::as_str) == Some(BROWSER_ENV))
            .count();
        assert_eq!(browsers, 1);
    }

    #[test]
    fn test_skips_variables_set_in_process() {
        let mut exec = exec_config("");
        defaults().apply_with(&mut exec, |name| name == KUBECONFIG_ENV);

        assert_eq!(value_of(&exec, KUBECONFIG_ENV), None);
        assert!(value_of(&exec, BROWSER_ENV).is_some());
    }

    #[test]
    fn test_applying_twice_changes_nothing() {
        let mut exec = exec_config("");
        defaults().apply_with(&mut exec, |_| false);
        let once = exec.env.clone();
        defaults().apply_with(&mut exec, |_| false);

        assert_eq!(exec.env, once);
    }

    #[test]
    fn test_platform_defaults_include_files() {
        let sources = CredentialSources {
            files: vec![PathBuf::from("/one"), PathBuf::from("/two")],
            ..Default::default()
        };
        let defaults = ExecDefaults::for_sources(&sources);

        let kubeconfig = defaults
            .vars()
            .iter()
            .find(|(name, _)| name == KUBECONFIG_ENV)
            .map(|(_, value)| value.clone());
        assert_eq!(kubeconfig, Some(sources.joined_files()));
        assert!(defaults.vars().iter().any(|(name, _)| name == BROWSER_ENV));
    }
}
