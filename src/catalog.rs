// Endpoint catalog from an OpenAPI document
// Reads the `paths` section into an ordered endpoint -> methods map

use crate::error::ConfigError;
use crate::models::Method;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub path: String,
    pub methods: Vec<Method>,
}

/// Ordered endpoint -> methods map, iterated in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointCatalog {
    entries: Vec<CatalogEntry>,
}

impl EndpointCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, methods: Vec<Method>) {
        self.entries.push(CatalogEntry {
            path: path.into(),
            methods,
        });
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Number of (endpoint, method) pairs
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|e| e.methods.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>> FromIterator<(P, Vec<Method>)> for EndpointCatalog {
    fn from_iter<I: IntoIterator<Item = (P, Vec<Method>)>>(iter: I) -> Self {
        let mut catalog = EndpointCatalog::new();
        for (path, methods) in iter {
            catalog.push(path, methods);
        }
        catalog
    }
}

pub fn load_catalog(file_path: impl AsRef<Path>) -> Result<EndpointCatalog, ConfigError> {
    let file_path = file_path.as_ref();
    let data = std::fs::read_to_string(file_path).map_err(|source| ConfigError::Read {
        path: file_path.to_path_buf(),
        source,
    })?;
    let json: Value = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: file_path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&json).ok_or_else(|| ConfigError::MissingPaths {
        path: file_path.to_path_buf(),
    })?;
    tracing::info!(endpoints = catalog.len(), pairs = catalog.pair_count(), "loaded endpoint catalog");
    Ok(catalog)
}

/// None when the document has no `paths` object.
pub fn parse_catalog(json: &Value) -> Option<EndpointCatalog> {
    let paths = json.get("paths")?.as_object()?;
    let mut catalog = EndpointCatalog::new();
    for (path, item) in paths {
        // path items also carry `parameters`, `summary`, `servers`...
        let mut methods = Vec::new();
        for key in item.as_object().into_iter().flat_map(|ops| ops.keys()) {
            match key.parse::<Method>() {
                Ok(method) => methods.push(method),
                Err(_) => tracing::debug!(%path, key = %key, "skipping non-operation key"),
            }
        }
        catalog.push(path.clone(), methods);
    }
    Some(catalog)
}
