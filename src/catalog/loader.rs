//! Endpoint catalog loader

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use super::{EndpointCatalog, EndpointDescriptor};
use crate::{Error, Result};

/// Loader for endpoint catalog files
pub struct CatalogLoader;

impl CatalogLoader {
    /// Read and parse a catalog file, skipping invalid descriptors
    ///
    /// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    pub async fn load_file(path: &Path) -> Result<Vec<EndpointDescriptor>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read catalog {}: {e}", path.display())))?;

        let catalog = Self::parse(&content, path)?;
        let total = catalog.endpoints.len();

        let endpoints: Vec<EndpointDescriptor> = catalog
            .endpoints
            .into_iter()
            .filter(|d| match validate_descriptor(d) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Skipping invalid endpoint descriptor");
                    false
                }
            })
            .collect();

        if endpoints.is_empty() {
            return Err(Error::Config(format!(
                "Catalog {} contains no valid endpoints ({total} declared)",
                path.display()
            )));
        }

        debug!(count = endpoints.len(), path = %path.display(), "Parsed endpoint catalog");
        Ok(endpoints)
    }

    /// Parse catalog text, choosing the format from the file extension
    pub fn parse(content: &str, path: &Path) -> Result<EndpointCatalog> {
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");

        if is_yaml {
            Ok(serde_yaml::from_str(content)?)
        } else {
            Ok(serde_json::from_str(content)?)
        }
    }
}

/// Validate a single descriptor
pub fn validate_descriptor(descriptor: &EndpointDescriptor) -> Result<()> {
    if descriptor.tool_name.trim().is_empty() {
        return Err(Error::Config("Endpoint toolName is required".to_string()));
    }

    if descriptor.path.trim().is_empty() {
        return Err(Error::Config(format!(
            "Endpoint '{}' has an empty path",
            descriptor.tool_name
        )));
    }

    Ok(())
}

/// Strict validation of a whole catalog file
///
/// Unlike [`CatalogLoader::load_file`], every problem is reported: invalid
/// descriptors, duplicate tool names, unsupported verbs, and path
/// placeholders with no declared parameter. Returns the endpoint count.
pub async fn validate_catalog(path: &Path) -> Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Config(format!("Failed to read catalog {}: {e}", path.display())))?;
    let catalog = CatalogLoader::parse(&content, path)?;

    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for (index, descriptor) in catalog.endpoints.iter().enumerate() {
        if let Err(e) = validate_descriptor(descriptor) {
            problems.push(format!("#{index}: {e}"));
            continue;
        }
        if !seen.insert(descriptor.tool_name.as_str()) {
            problems.push(format!("#{index}: duplicate toolName '{}'", descriptor.tool_name));
        }
        if let Err(e) = descriptor.http_method() {
            problems.push(format!("{}: {e}", descriptor.tool_name));
        }
        for placeholder in descriptor.path_placeholders() {
            if !descriptor.parameters.iter().any(|p| p.name == placeholder) {
                problems.push(format!(
                    "{}: path placeholder '{{{placeholder}}}' has no declared parameter",
                    descriptor.tool_name
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(catalog.endpoints.len())
    } else {
        Err(Error::Config(format!(
            "Catalog {} has {} problem(s):\n  {}",
            path.display(),
            problems.len(),
            problems.join("\n  ")
        )))
    }
}
