//! # Schema Assembly
//!
//! Builds one [`CompiledSchema`] from a root schema file plus the auxiliary
//! ("extension") schemas found next to it.
//!
//! ## Steps
//!
//! 1. Read the root schema. Its canonical URI is its own `$id` or, failing
//!    that, its `file://` URI.
//! 2. Walk the schema directory according to the [`DiscoveryLayout`] and
//!    register every auxiliary document in a [`ResourceSet`] under the
//!    identifier chosen by the [`IdentifierStrategy`].
//! 3. Compile the root against the registered resources. Only registered
//!    resources are resolvable: a `$ref` to anything else fails compilation
//!    instead of reaching out to the filesystem or network.
//!
//! Each registration is announced through a [`RegistrationReporter`], which
//! is the only side effect of assembly.

use std::path::{Path, PathBuf};

use jsonschema::{Resource, Retrieve, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::compiled::CompiledSchema;
use crate::error::{AssembleError, CompileError};
use crate::resource::{DiscoveryLayout, IdentifierStrategy, ResourceSet, SchemaDocument};

/// Receives one notification per registered auxiliary schema.
pub trait RegistrationReporter {
    /// `path` was registered under the canonical `uri`.
    fn registered(&self, uri: &str, path: &Path);
}

impl<R: RegistrationReporter + ?Sized> RegistrationReporter for &R {
    fn registered(&self, uri: &str, path: &Path) {
        (**self).registered(uri, path)
    }
}

/// Reports registrations as `tracing` events at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl RegistrationReporter for TracingReporter {
    fn registered(&self, uri: &str, path: &Path) {
        tracing::info!(uri, path = %path.display(), "registered extension schema");
    }
}

/// Discovery and identifier settings for an assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerOptions {
    /// Which files count as auxiliary schemas.
    pub layout: DiscoveryLayout,
    /// How their identifiers are obtained.
    #[serde(rename = "ids")]
    pub identifiers: IdentifierStrategy,
}

/// Refuses every retrieval. All resolvable documents are registered up front.
struct RegisteredOnly;

impl Retrieve for RegisteredOnly {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("no schema registered for {}", uri.as_str()).into())
    }
}

/// Assembles compiled schemas. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct SchemaAssembler<R = TracingReporter> {
    options: AssemblerOptions,
    reporter: R,
}

impl SchemaAssembler {
    /// An assembler that reports registrations through `tracing`.
    pub fn new(options: AssemblerOptions) -> Self {
        Self::with_reporter(options, TracingReporter)
    }
}

impl<R: RegistrationReporter> SchemaAssembler<R> {
    /// An assembler that reports registrations to `reporter`.
    pub fn with_reporter(options: AssemblerOptions, reporter: R) -> Self {
        Self { options, reporter }
    }

    /// The options this assembler was created with.
    pub fn options(&self) -> AssemblerOptions {
        self.options
    }

    /// The reporter receiving registration notifications.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Compile the schema graph rooted at `root`.
    ///
    /// # Errors
    ///
    /// - [`AssembleError::NotFound`] if `root` does not exist.
    /// - [`AssembleError::Io`] if a schema file or directory cannot be read.
    /// - [`AssembleError::Compile`] for malformed documents, missing or
    ///   colliding identifiers, and unresolvable references.
    pub fn assemble(&self, root: impl AsRef<Path>) -> Result<CompiledSchema, AssembleError> {
        let root = root.as_ref();
        let root_path = std::fs::canonicalize(root).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssembleError::NotFound {
                    path: root.to_path_buf(),
                }
            } else {
                AssembleError::Io {
                    path: root.to_path_buf(),
                    source,
                }
            }
        })?;
        let schema_dir = root_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root_path.clone());

        let root_doc = SchemaDocument::load(&root_path)?;
        let file_uri = Url::from_file_path(&root_path).map_err(|()| {
            CompileError::InvalidIdentifier {
                id: root_path.display().to_string(),
                reason: "cannot express path as a file URI".to_string(),
            }
        })?;
        let base = match root_doc.declared_id() {
            Some(id) => file_uri
                .join(id)
                .map_err(|e| CompileError::InvalidIdentifier {
                    id: id.to_string(),
                    reason: e.to_string(),
                })?,
            None => file_uri,
        };

        let mut resources = ResourceSet::new(base, &root_path);
        for path in discover(&schema_dir, &root_path, self.options.layout)? {
            let doc = SchemaDocument::load(&path)?;
            let id = doc.identifier(&schema_dir, self.options.identifiers)?;
            let uri = resources.register(&id, doc)?;
            self.reporter.registered(&uri, &path);
        }

        Ok(compile(root_doc, resources)?)
    }
}

/// Compile `root` with the default discovery settings and `tracing`
/// reporting.
pub fn assemble(root: impl AsRef<Path>) -> Result<CompiledSchema, AssembleError> {
    SchemaAssembler::new(AssemblerOptions::default()).assemble(root)
}

/// Hand the root document and registered resources to the engine.
fn compile(root: SchemaDocument, resources: ResourceSet) -> Result<CompiledSchema, CompileError> {
    let root_uri = resources.base().to_string();

    let mut schema = root.into_content();
    if let Value::Object(map) = &mut schema {
        map.insert("$id".to_string(), Value::String(root_uri.clone()));
    }

    let mut opts = jsonschema::options();
    let mut registered = Vec::with_capacity(resources.len());
    for (uri, doc) in resources.into_entries() {
        let path = doc.path().to_path_buf();
        let resource = Resource::from_contents(doc.into_content()).map_err(|e| {
            CompileError::Build {
                schema: uri.clone(),
                reason: format!("{} ({})", e, path.display()),
            }
        })?;
        opts.with_resource(uri.as_str(), resource);
        registered.push(uri);
    }
    opts.with_retriever(RegisteredOnly);

    let validator = opts.build(&schema).map_err(|e| CompileError::Build {
        schema: root_uri.clone(),
        reason: e.to_string(),
    })?;

    Ok(CompiledSchema::new(root_uri, registered, validator))
}

/// Collect auxiliary schema paths for `layout`, sorted, excluding `root`.
fn discover(
    schema_dir: &Path,
    root: &Path,
    layout: DiscoveryLayout,
) -> Result<Vec<PathBuf>, AssembleError> {
    let start = match layout {
        DiscoveryLayout::Tree => schema_dir.to_path_buf(),
        DiscoveryLayout::Extensions => schema_dir.join(DiscoveryLayout::EXTENSIONS_DIR),
    };
    if !start.is_dir() {
        tracing::debug!(dir = %start.display(), "no extension directory");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    walk_for_schemas(&start, &mut found)?;
    // A file symlinked to the root is still the root.
    found.retain(|p| std::fs::canonicalize(p).map_or(true, |canonical| canonical != root));
    found.sort();
    Ok(found)
}

/// Collect `.json` files below `dir`. Symlinked directories are not entered.
fn walk_for_schemas(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), AssembleError> {
    let io_err = |source| AssembleError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        let path = entry.path();
        if file_type.is_dir() {
            walk_for_schemas(&path, acc)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            acc.push(path);
        }
    }
    Ok(())
}
