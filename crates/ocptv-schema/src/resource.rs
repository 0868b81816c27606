//! # Schema Resources
//!
//! Loading of schema documents from disk, canonical identifier derivation,
//! and the [`ResourceSet`] that collects auxiliary documents before the root
//! schema is compiled.
//!
//! ## Identifier Conventions
//!
//! Two on-disk conventions exist for extension schemas and both are
//! supported:
//!
//! - [`IdentifierStrategy::RelativePath`]: the identifier is the document's
//!   path relative to the schema directory, rooted at `/`, with the file
//!   extension stripped. `extensions/memory.json` becomes
//!   `/extensions/memory`, which the root schema references as
//!   `{"$ref": "/extensions/memory"}`.
//! - [`IdentifierStrategy::SelfDeclared`]: the identifier is the document's
//!   own `$id`.
//!
//! Either way the identifier is resolved against the root schema's base URI
//! before registration, exactly as a `$ref` in the root would be resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{AssembleError, CompileError};

/// Which files under the schema directory are auxiliary schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryLayout {
    /// Only `.json` files under the `extensions/` subdirectory.
    #[default]
    Extensions,
    /// Every `.json` file anywhere under the schema directory.
    Tree,
}

impl DiscoveryLayout {
    /// Subdirectory name scanned by [`DiscoveryLayout::Extensions`].
    pub const EXTENSIONS_DIR: &'static str = "extensions";
}

impl fmt::Display for DiscoveryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscoveryLayout::Extensions => "extensions",
            DiscoveryLayout::Tree => "tree",
        })
    }
}

impl FromStr for DiscoveryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extensions" => Ok(DiscoveryLayout::Extensions),
            "tree" => Ok(DiscoveryLayout::Tree),
            other => Err(format!(
                "unknown discovery layout '{other}' (expected 'extensions' or 'tree')"
            )),
        }
    }
}

/// How an auxiliary document's canonical identifier is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierStrategy {
    /// `/` + path relative to the schema directory, extension stripped.
    #[default]
    #[serde(rename = "path")]
    RelativePath,
    /// The document's own `$id` field.
    #[serde(rename = "declared")]
    SelfDeclared,
}

impl fmt::Display for IdentifierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentifierStrategy::RelativePath => "path",
            IdentifierStrategy::SelfDeclared => "declared",
        })
    }
}

impl FromStr for IdentifierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(IdentifierStrategy::RelativePath),
            "declared" => Ok(IdentifierStrategy::SelfDeclared),
            other => Err(format!(
                "unknown identifier strategy '{other}' (expected 'path' or 'declared')"
            )),
        }
    }
}

/// A schema document read from disk.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    path: PathBuf,
    content: Value,
}

impl SchemaDocument {
    /// Read and parse the document at `path`. The file is closed before
    /// this returns.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AssembleError> {
        let path = path.into();
        let raw = std::fs::read(&path).map_err(|source| AssembleError::Io {
            path: path.clone(),
            source,
        })?;
        let content = serde_json::from_slice(&raw).map_err(|e| {
            CompileError::MalformedDocument {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { path, content })
    }

    /// Build a document from an already-parsed value.
    pub fn from_value(path: impl Into<PathBuf>, content: Value) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// Where the document was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed schema.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// The document's `$id`, if it declares one.
    pub fn declared_id(&self) -> Option<&str> {
        self.content.get("$id").and_then(Value::as_str)
    }

    /// The canonical identifier under `strategy`, before base-URI resolution.
    pub fn identifier(
        &self,
        schema_dir: &Path,
        strategy: IdentifierStrategy,
    ) -> Result<String, CompileError> {
        match strategy {
            IdentifierStrategy::RelativePath => relative_identifier(schema_dir, &self.path)
                .ok_or_else(|| CompileError::InvalidIdentifier {
                    id: self.path.display().to_string(),
                    reason: format!("not located under {}", schema_dir.display()),
                }),
            IdentifierStrategy::SelfDeclared => self
                .declared_id()
                .map(str::to_string)
                .ok_or_else(|| CompileError::MissingIdentifier {
                    path: self.path.clone(),
                }),
        }
    }

    pub(crate) fn into_content(self) -> Value {
        self.content
    }
}

/// Derive `/dir/name` from `<schema_dir>/dir/name.json`.
///
/// Returns `None` if `path` is not under `schema_dir` or contains a
/// component that is not valid UTF-8.
pub fn relative_identifier(schema_dir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(schema_dir).ok()?.with_extension("");
    let mut id = String::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                id.push('/');
                id.push_str(part.to_str()?);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Auxiliary schema documents keyed by canonical URI.
///
/// The root schema's URI is reserved at construction so that no auxiliary
/// document can shadow it. Entries are ordered by URI, which makes the set
/// independent of the order documents were discovered in.
#[derive(Debug)]
pub struct ResourceSet {
    base: Url,
    root_path: PathBuf,
    entries: BTreeMap<String, SchemaDocument>,
}

impl ResourceSet {
    /// Create an empty set for a root schema whose canonical URI is `base`.
    pub fn new(base: Url, root_path: impl Into<PathBuf>) -> Self {
        Self {
            base,
            root_path: root_path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// The root schema's canonical URI, against which identifiers resolve.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve an identifier against the base URI.
    pub fn resolve(&self, id: &str) -> Result<Url, CompileError> {
        self.base
            .join(id)
            .map_err(|e| CompileError::InvalidIdentifier {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Register `doc` under `id`, returning the canonical URI it now
    /// occupies.
    pub fn register(&mut self, id: &str, doc: SchemaDocument) -> Result<String, CompileError> {
        let uri = self.resolve(id)?.to_string();

        let existing = if uri == self.base.as_str() {
            Some(self.root_path.clone())
        } else {
            self.entries.get(&uri).map(|d| d.path.clone())
        };
        if let Some(existing) = existing {
            return Err(CompileError::DuplicateResource {
                uri,
                path: doc.path,
                existing,
            });
        }

        self.entries.insert(uri.clone(), doc);
        Ok(uri)
    }

    /// Number of registered auxiliary documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no auxiliary document has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered URIs, sorted.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up a registered document by canonical URI.
    pub fn get(&self, uri: &str) -> Option<&SchemaDocument> {
        self.entries.get(uri)
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, SchemaDocument)> {
        self.entries.into_iter()
    }
}
