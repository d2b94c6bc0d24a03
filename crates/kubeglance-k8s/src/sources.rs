//! Kubeconfig discovery and merging
//!
//! Locations come from `KUBECONFIG` (a single path or a list split on the
//! platform separator) or default to `~/.kube/config`. Directories expand to
//! their files in name order. Later files win over earlier ones.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use kube::config::{Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext};

use crate::error::ConnectionError;

/// Environment variable naming the kubeconfig locations
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Merged kubeconfig together with the files it was built from
#[derive(Clone, Debug, Default)]
pub struct CredentialSources {
    /// Union of every successfully parsed file
    pub kubeconfig: Kubeconfig,

    /// Files that were parsed, in load order
    pub files: Vec<PathBuf>,
}

impl CredentialSources {
    /// Load from the locations named by `KUBECONFIG`
    pub fn from_env() -> Result<Self, ConnectionError> {
        let input = std::env::var_os(KUBECONFIG_ENV);
        Self::load(input.as_deref())
    }

    /// Load from a path list; `None` or a list without paths uses `~/.kube/config`
    pub fn load(input: Option<&OsStr>) -> Result<Self, ConnectionError> {
        let (candidates, explicit) = candidate_locations(input)?;
        Self::load_locations(&candidates, explicit)
    }

    /// Load and merge the given candidate locations in order.
    ///
    /// Unreadable or unparsable files are skipped, except for the first
    /// candidate when `first_required` is set and it is a regular file.
    pub fn load_locations(
        candidates: &[PathBuf],
        first_required: bool,
    ) -> Result<Self, ConnectionError> {
        let required = candidates
            .first()
            .filter(|path| first_required && path.is_file())
            .cloned();

        let mut kubeconfig = Kubeconfig::default();
        let mut files = Vec::new();

        for path in expand_locations(candidates) {
            match load_file(&path) {
                Ok(next) => {
                    tracing::debug!(
                        path = %path.display(),
                        contexts = next.contexts.len(),
                        "loaded kubeconfig"
                    );
                    kubeconfig = merge(kubeconfig, next);
                    files.push(path);
                }
                Err(error) if required.as_deref() == Some(path.as_path()) => return Err(error),
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = ?error, "skipping kubeconfig");
                }
            }
        }

        if files.is_empty() {
            return Err(ConnectionError::NoUsableSource {
                locations: join_paths(candidates),
            });
        }

        Ok(Self { kubeconfig, files })
    }

    /// Loaded files joined with the platform path-list separator
    pub fn joined_files(&self) -> String {
        join_paths(&self.files)
    }
}

/// Locations named by a path list, or the default location when it names none.
/// The flag tells whether the locations were given explicitly.
fn candidate_locations(input: Option<&OsStr>) -> Result<(Vec<PathBuf>, bool), ConnectionError> {
    let named: Vec<PathBuf> = input
        .map(|list| {
            std::env::split_paths(list)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if named.is_empty() {
        Ok((vec![default_location()?], false))
    } else {
        Ok((named, true))
    }
}

/// Default kubeconfig location: `~/.kube/config`
pub fn default_location() -> Result<PathBuf, ConnectionError> {
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .ok_or(ConnectionError::HomeDirNotFound)
}

/// Resolve candidate locations to the ordered list of files to load
pub fn expand_locations(candidates: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for candidate in candidates {
        match fs::metadata(candidate) {
            Ok(meta) if meta.is_dir() => files.extend(directory_files(candidate)),
            Ok(_) => files.push(candidate.clone()),
            Err(error) => {
                tracing::debug!(path = %candidate.display(), %error, "skipping kubeconfig location");
            }
        }
    }

    files
}

/// Immediate regular files of `dir`, sorted by file name
fn directory_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(path = %dir.display(), %error, "cannot read kubeconfig directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

fn load_file(path: &Path) -> Result<Kubeconfig, ConnectionError> {
    let content = fs::read_to_string(path).map_err(|source| ConnectionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut kubeconfig = Kubeconfig::from_yaml(&content).map_err(|source| ConnectionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(dir) = path.parent() {
        resolve_relative_paths(&mut kubeconfig, dir);
    }

    Ok(kubeconfig)
}

/// Merge `next` over `base`: same-named entries are replaced whole and a
/// non-empty `current-context` in `next` takes over.
pub fn merge(mut base: Kubeconfig, next: Kubeconfig) -> Kubeconfig {
    replace_named(&mut base.clusters, next.clusters);
    replace_named(&mut base.auth_infos, next.auth_infos);
    replace_named(&mut base.contexts, next.contexts);

    if let Some(current) = next.current_context.filter(|name| !name.is_empty()) {
        base.current_context = Some(current);
    }

    base
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for NamedCluster {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for NamedAuthInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for NamedContext {
    fn name(&self) -> &str {
        &self.name
    }
}

fn replace_named<T: Named>(entries: &mut Vec<T>, incoming: Vec<T>) {
    for entry in incoming {
        match entries.iter().position(|existing| existing.name() == entry.name()) {
            Some(idx) => entries[idx] = entry,
            None => entries.push(entry),
        }
    }
}

/// Make file references inside a kubeconfig absolute against its directory
fn resolve_relative_paths(kubeconfig: &mut Kubeconfig, dir: &Path) {
    for cluster in kubeconfig.clusters.iter_mut().filter_map(|c| c.cluster.as_mut()) {
        absolutize(&mut cluster.certificate_authority, dir);
    }

    for auth in kubeconfig.auth_infos.iter_mut().filter_map(|a| a.auth_info.as_mut()) {
        absolutize(&mut auth.client_certificate, dir);
        absolutize(&mut auth.client_key, dir);
        absolutize(&mut auth.token_file, dir);

        if let Some(exec) = auth.exec.as_mut() {
            // Bare command names are looked up on PATH
            let is_path = exec
                .command
                .as_deref()
                .is_some_and(|command| command.contains('/') || command.contains('\\'));
            if is_path {
                absolutize(&mut exec.command, dir);
            }
        }
    }
}

fn absolutize(field: &mut Option<String>, dir: &Path) {
    if let Some(value) = field.as_mut() {
        if !value.is_empty() && Path::new(value.as_str()).is_relative() {
            *value = dir.join(value.as_str()).to_string_lossy().into_owned();
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.to_string_lossy())
        .collect::<Vec<_>>()
        .join(&PATH_LIST_SEPARATOR.to_string())
}
