//! Discovery of external providers from on-disk manifests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

use omnisearch_provider_api::{ProviderInfo, SearchProvider};

use crate::remote::{RemoteProvider, TransportFactory};
use crate::settings::SearchSettings;

/// Continuation receiving a discovered provider batch.
pub type DiscoveryCallback = Box<dyn FnOnce(Vec<Arc<dyn SearchProvider>>) + Send>;

/// Enumerates the external provider set. Best-effort and asynchronous: the
/// callback may fire from any thread, and enumeration failures surface as an
/// absent provider, never as an error.
pub trait ProviderDiscovery: Send + Sync {
    fn discover(&self, settings: &SearchSettings, on_discovered: DiscoveryCallback);
}

/// One provider manifest file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderManifest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub can_launch_search: bool,
    #[serde(default)]
    pub default_disabled: bool,
}

impl ProviderManifest {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Discovery backed by JSON manifest directories plus a transport factory
/// for the actual provider connections.
pub struct ManifestDiscovery {
    dirs: Vec<PathBuf>,
    transports: Arc<dyn TransportFactory>,
}

impl ManifestDiscovery {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>, transports: Arc<dyn TransportFactory>) -> Self {
        Self { dirs, transports }
    }

    /// Read every parseable manifest, in directory order then file-name order
    /// within a directory. Unreadable directories and malformed files are
    /// skipped.
    fn read_manifests(&self) -> Vec<ProviderManifest> {
        let mut manifests = Vec::new();
        for dir in &self.dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("skipping manifest directory {}: {err}", dir.display());
                    continue;
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            paths.sort();

            for path in paths {
                let raw = match fs::read_to_string(&path) {
                    Ok(raw) => raw,
                    Err(err) => {
                        warn!("unreadable provider manifest {}: {err}", path.display());
                        continue;
                    }
                };
                match serde_json::from_str::<ProviderManifest>(&raw) {
                    Ok(manifest) => manifests.push(manifest),
                    Err(err) => {
                        warn!("malformed provider manifest {}: {err}", path.display());
                    }
                }
            }
        }
        manifests
    }
}

impl ProviderDiscovery for ManifestDiscovery {
    fn discover(&self, settings: &SearchSettings, on_discovered: DiscoveryCallback) {
        if settings.disable_external {
            on_discovered(Vec::new());
            return;
        }

        let mut manifests: Vec<ProviderManifest> = self
            .read_manifests()
            .into_iter()
            .filter(|manifest| settings.allows(&manifest.id, manifest.default_disabled))
            .collect();

        let order = settings.sort(manifests.iter().map(|m| m.id.clone()).collect());
        manifests.sort_by_key(|manifest| {
            order
                .iter()
                .position(|id| *id == manifest.id)
                .unwrap_or(usize::MAX)
        });

        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            match self.transports.connect(&manifest.id) {
                Some(transport) => providers.push(Arc::new(RemoteProvider::new(
                    manifest.id.clone(),
                    manifest.info(),
                    manifest.can_launch_search,
                    transport,
                ))),
                None => debug!("search provider {} is unreachable, skipping", manifest.id),
            }
        }
        on_discovered(providers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    use omnisearch_provider_api::{MetaCallback, ResultCallback, ResultId};

    use crate::remote::RemoteTransport;

    struct NullTransport;

    impl RemoteTransport for NullTransport {
        fn query(&self, _terms: &[String], reply: ResultCallback) {
            reply(Vec::new());
        }

        fn query_within(&self, _previous: &[ResultId], _terms: &[String], reply: ResultCallback) {
            reply(Vec::new());
        }

        fn fetch_metas(&self, _ids: &[ResultId], reply: MetaCallback) {
            reply(Vec::new());
        }
    }

    struct SelectiveFactory {
        reachable: Vec<String>,
    }

    impl TransportFactory for SelectiveFactory {
        fn connect(&self, provider_id: &str) -> Option<Arc<dyn RemoteTransport>> {
            self.reachable
                .iter()
                .any(|id| id == provider_id)
                .then(|| Arc::new(NullTransport) as Arc<dyn RemoteTransport>)
        }
    }

    fn write_manifest(dir: &std::path::Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).expect("write manifest");
    }

    fn discover_ids(discovery: &ManifestDiscovery, settings: &SearchSettings) -> Vec<String> {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        discovery.discover(
            settings,
            Box::new(move |providers| {
                *sink.lock().expect("sink lock") =
                    providers.iter().map(|p| p.id().to_string()).collect();
            }),
        );
        let ids = seen.lock().expect("seen lock").clone();
        ids
    }

    #[test]
    fn manifests_are_filtered_sorted_and_connected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(
            dir.path(),
            "a-files.json",
            r#"{"id": "files", "name": "Files", "can_launch_search": true}"#,
        );
        write_manifest(
            dir.path(),
            "b-settings.json",
            r#"{"id": "settings", "name": "Settings"}"#,
        );
        write_manifest(
            dir.path(),
            "c-web.json",
            r#"{"id": "web", "name": "Web", "default_disabled": true}"#,
        );
        write_manifest(dir.path(), "broken.json", "{ not json");
        write_manifest(dir.path(), "ignored.txt", "not a manifest");

        let discovery = ManifestDiscovery::new(
            vec![dir.path().to_path_buf()],
            Arc::new(SelectiveFactory {
                reachable: vec!["files".to_string(), "settings".to_string()],
            }),
        );

        let settings = SearchSettings {
            sort_order: vec!["settings".to_string()],
            ..SearchSettings::default()
        };
        // `web` is default-disabled and not re-enabled; the broken manifest
        // is skipped; sort_order puts settings first.
        assert_eq!(discover_ids(&discovery, &settings), ["settings", "files"]);
    }

    #[test]
    fn unreachable_providers_are_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(dir.path(), "files.json", r#"{"id": "files", "name": "Files"}"#);

        let discovery = ManifestDiscovery::new(
            vec![dir.path().to_path_buf()],
            Arc::new(SelectiveFactory { reachable: Vec::new() }),
        );
        assert!(discover_ids(&discovery, &SearchSettings::default()).is_empty());
    }

    #[test]
    fn disable_external_yields_an_empty_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(dir.path(), "files.json", r#"{"id": "files", "name": "Files"}"#);

        let discovery = ManifestDiscovery::new(
            vec![dir.path().to_path_buf()],
            Arc::new(SelectiveFactory {
                reachable: vec!["files".to_string()],
            }),
        );
        let settings = SearchSettings {
            disable_external: true,
            ..SearchSettings::default()
        };
        assert!(discover_ids(&discovery, &settings).is_empty());
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let discovery = ManifestDiscovery::new(
            vec![PathBuf::from("/nonexistent/omnisearch-manifests")],
            Arc::new(SelectiveFactory { reachable: Vec::new() }),
        );
        assert!(discover_ids(&discovery, &SearchSettings::default()).is_empty());
    }
}
