//! Endpoint registry - indexed lookup over loaded descriptors
//!
//! # Reload
//!
//! The registry is built once at startup. `reload()` re-reads the same
//! catalog source, rebuilds the whole index and swaps it in; there is no
//! incremental update.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::{CatalogLoader, EndpointDescriptor, builtin_endpoints};
use crate::protocol::Tool;

/// Immutable snapshot of the loaded catalog
#[derive(Default)]
struct Index {
    /// Descriptors in catalog order
    ordered: Vec<Arc<EndpointDescriptor>>,
    /// Tool name -> descriptor
    by_name: HashMap<String, Arc<EndpointDescriptor>>,
}

impl Index {
    /// Build an index, keeping the first descriptor for each tool name
    fn build(descriptors: Vec<EndpointDescriptor>) -> Self {
        let mut index = Self::default();
        for descriptor in descriptors {
            if index.by_name.contains_key(&descriptor.tool_name) {
                warn!(tool = %descriptor.tool_name, "Duplicate endpoint descriptor ignored");
                continue;
            }
            let descriptor = Arc::new(descriptor);
            index
                .by_name
                .insert(descriptor.tool_name.clone(), Arc::clone(&descriptor));
            index.ordered.push(descriptor);
        }
        index
    }
}

/// Registry of endpoint descriptors keyed by tool name
pub struct EndpointRegistry {
    /// Catalog file this registry was loaded from (`None` for fixed sets)
    source: Option<PathBuf>,
    /// Current index (swapped wholesale on reload)
    index: RwLock<Index>,
}

impl EndpointRegistry {
    /// Create a registry over a fixed descriptor set
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<EndpointDescriptor>) -> Self {
        Self {
            source: None,
            index: RwLock::new(Index::build(descriptors)),
        }
    }

    /// Create a registry holding only the built-in fallback endpoints
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_descriptors(builtin_endpoints())
    }

    /// Load the catalog at `path`
    ///
    /// Never fails: if the file cannot be read or parsed, the built-in
    /// endpoint set is used and a warning is logged.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let descriptors = Self::read_or_fallback(&path).await;
        let registry = Self {
            source: Some(path),
            index: RwLock::new(Index::build(descriptors)),
        };
        info!(
            count = registry.len(),
            source = ?registry.source,
            "Loaded endpoint registry"
        );
        registry
    }

    /// Rebuild the index from the original source
    ///
    /// Registries created from a fixed descriptor set have nothing to
    /// re-read and keep their contents. Returns the endpoint count.
    pub async fn reload(&self) -> usize {
        let Some(ref path) = self.source else {
            return self.len();
        };

        let rebuilt = Index::build(Self::read_or_fallback(path).await);
        let count = rebuilt.ordered.len();
        *self.index.write() = rebuilt;

        info!(count, source = %path.display(), "Reloaded endpoint registry");
        count
    }

    async fn read_or_fallback(path: &Path) -> Vec<EndpointDescriptor> {
        match CatalogLoader::load_file(path).await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %path.display(),
                    "Endpoint catalog unavailable, using built-in endpoints"
                );
                builtin_endpoints()
            }
        }
    }

    /// Look up a descriptor by tool name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<EndpointDescriptor>> {
        self.index.read().by_name.get(name).cloned()
    }

    /// Check if a tool name is registered
    #[must_use]
    pub fn has_endpoint(&self, name: &str) -> bool {
        self.index.read().by_name.contains_key(name)
    }

    /// Tool names in catalog order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.index
            .read()
            .ordered
            .iter()
            .map(|d| d.tool_name.clone())
            .collect()
    }

    /// Descriptors tagged with the given API family
    #[must_use]
    pub fn filter_by_family(&self, family: &str) -> Vec<Arc<EndpointDescriptor>> {
        self.index
            .read()
            .ordered
            .iter()
            .filter(|d| d.api_family == family)
            .cloned()
            .collect()
    }

    /// MCP tool definitions for every registered endpoint
    #[must_use]
    pub fn to_tools(&self) -> Vec<Tool> {
        self.index
            .read()
            .ordered
            .iter()
            .map(|d| d.to_mcp_tool())
            .collect()
    }

    /// Number of registered endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().ordered.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().ordered.is_empty()
    }

    /// Catalog file backing this registry
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DATA_FAMILY, ParameterSpec};
    use tempfile::TempDir;

    fn endpoint(name: &str, path: &str, family: &str) -> EndpointDescriptor {
        EndpointDescriptor {
            tool_name: name.to_string(),
            path: path.to_string(),
            method: "GET".to_string(),
            parameters: vec![ParameterSpec::new("count", "integer", false)],
            default_body: None,
            api_family: family.to_string(),
            requires_site_selector: false,
            description: String::new(),
        }
    }

    #[test]
    fn get_round_trips_loaded_descriptors() {
        let registry = EndpointRegistry::from_descriptors(vec![
            endpoint("get_catalogs", "/catalogs", DATA_FAMILY),
            endpoint("get_sites", "/sites", DATA_FAMILY),
        ]);

        let found = registry.get("get_sites").unwrap();
        assert_eq!(found.path, "/sites");
        assert!(registry.has_endpoint("get_catalogs"));
        assert!(registry.get("get_widgets").is_none());
        assert_eq!(registry.names(), vec!["get_catalogs", "get_sites"]);
    }

    #[test]
    fn duplicate_names_keep_first() {
        // GIVEN: two descriptors sharing a tool name
        let registry = EndpointRegistry::from_descriptors(vec![
            endpoint("get_sites", "/sites", DATA_FAMILY),
            endpoint("get_sites", "/sites/v2", DATA_FAMILY),
        ]);

        // THEN: one entry, the first one
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("get_sites").unwrap().path, "/sites");
    }

    #[test]
    fn filter_by_family() {
        let registry = EndpointRegistry::from_descriptors(vec![
            endpoint("get_catalogs", "/catalogs", DATA_FAMILY),
            endpoint("shop_get_basket", "/baskets/{basket_id}", "shop"),
        ]);

        let shop = registry.filter_by_family("shop");
        assert_eq!(shop.len(), 1);
        assert_eq!(shop[0].tool_name, "shop_get_basket");
        assert!(registry.filter_by_family("meta").is_empty());
    }

    #[tokio::test]
    async fn missing_catalog_falls_back_to_builtin() {
        // GIVEN: a path that does not exist
        let dir = TempDir::new().unwrap();
        let registry = EndpointRegistry::load(dir.path().join("missing.json")).await;

        // THEN: built-in endpoints are available
        assert!(!registry.is_empty());
        assert!(registry.has_endpoint("get_catalogs"));
        assert!(registry.has_endpoint("get_product"));
    }

    #[tokio::test]
    async fn corrupt_catalog_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("endpoints.json");
        std::fs::write(&path, "{ not json").unwrap();

        let registry = EndpointRegistry::load(&path).await;
        assert_eq!(registry.len(), builtin_endpoints().len());
    }

    #[tokio::test]
    async fn reload_replaces_index() {
        // GIVEN: a registry loaded from a one-endpoint catalog
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("endpoints.json");
        std::fs::write(
            &path,
            r#"{"endpoints": [{"toolName": "get_sites", "path": "/sites"}]}"#,
        )
        .unwrap();
        let registry = EndpointRegistry::load(&path).await;
        assert_eq!(registry.names(), vec!["get_sites"]);

        // WHEN: the catalog changes and the registry reloads
        std::fs::write(
            &path,
            r#"{"endpoints": [
                {"toolName": "get_catalogs", "path": "/catalogs"},
                {"toolName": "get_site", "path": "/sites/{site_id}"}
            ]}"#,
        )
        .unwrap();
        let count = registry.reload().await;

        // THEN: the old entry is gone, the new ones are present
        assert_eq!(count, 2);
        assert!(!registry.has_endpoint("get_sites"));
        assert!(registry.has_endpoint("get_site"));
    }

    #[tokio::test]
    async fn reload_without_source_keeps_contents() {
        let registry =
            EndpointRegistry::from_descriptors(vec![endpoint("get_sites", "/sites", DATA_FAMILY)]);
        assert_eq!(registry.reload().await, 1);
        assert!(registry.source().is_none());
    }
}
