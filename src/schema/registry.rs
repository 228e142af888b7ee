//! Published type registries and the loader that builds them

use super::convert::JSchemaConverter;
use super::inference::TypeInferrer;
use super::types::{Diagnostic, InferredType};
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::loader::{discover_sources, SourceUnit};
use crate::parser::parse_document;
use crate::types::SourceKind;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

// ============================================================================
// Type Registry
// ============================================================================

/// Immutable result of one inference pass
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<InferredType>>,
    files: IndexMap<String, Vec<String>>,
    namespaces: BTreeSet<String>,
    generation: u64,
}

impl TypeRegistry {
    pub(crate) fn new(
        types: IndexMap<String, InferredType>,
        files: IndexMap<String, Vec<String>>,
        generation: u64,
    ) -> Self {
        let mut namespaces = BTreeSet::new();
        for name in types.keys() {
            let mut prefix = name.as_str();
            while let Some(idx) = prefix.rfind('.') {
                prefix = &prefix[..idx];
                namespaces.insert(prefix.to_string());
            }
        }
        Self {
            types: types
                .into_iter()
                .map(|(name, ty)| (name, Arc::new(ty)))
                .collect(),
            files,
            namespaces,
            generation,
        }
    }

    /// Look up a type by full name
    pub fn get(&self, name: &str) -> Option<Arc<InferredType>> {
        self.types.get(name).cloned()
    }

    /// Look up a type, failing with `UnknownType`
    pub fn require(&self, name: &str) -> Result<Arc<InferredType>> {
        self.get(name).ok_or_else(|| Error::unknown_type(name))
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All types in registration order
    pub fn types(&self) -> impl Iterator<Item = &Arc<InferredType>> {
        self.types.values()
    }

    /// All type names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no type was registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of the types a source produced
    pub fn types_for_source(&self, source: &str) -> &[String] {
        self.files.get(source).map(Vec::as_slice).unwrap_or_default()
    }

    /// Logical names of all processed sources
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Every dotted prefix of every type name
    pub fn namespaces(&self) -> &BTreeSet<String> {
        &self.namespaces
    }

    /// Check if `name` is a namespace
    pub fn is_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(name)
    }

    /// Pass counter of the loader that built this registry
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All diagnostics paired with the type that carries them
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.types
            .values()
            .flat_map(|ty| ty.diagnostics.iter().map(move |d| (ty.name.as_str(), d)))
    }
}

// ============================================================================
// Type Loader
// ============================================================================

/// Owns the published registry and runs inference passes.
///
/// Readers call [`registry`](Self::registry) and keep the snapshot they got;
/// a pass in progress never changes it. Only one pass may run at a time.
#[derive(Debug)]
pub struct TypeLoader {
    config: LoaderConfig,
    published: RwLock<Arc<TypeRegistry>>,
    building: AtomicBool,
    generation: AtomicU64,
}

impl Default for TypeLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl TypeLoader {
    /// Create a loader with an empty published registry
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            published: RwLock::new(Arc::new(TypeRegistry::default())),
            building: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Currently published registry
    pub fn registry(&self) -> Arc<TypeRegistry> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if a pass is running
    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::Acquire)
    }

    /// Claim the build slot; fails with `BuildInProgress` if it is taken
    pub fn begin_build(&self) -> Result<BuildGuard<'_>> {
        self.building
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::BuildInProgress)?;
        Ok(BuildGuard { loader: self })
    }

    /// Run a full inference pass over `sources` and publish the result
    pub fn rebuild(&self, sources: &[SourceUnit]) -> Result<Arc<TypeRegistry>> {
        let guard = self.begin_build()?;
        let registry = guard.build(sources);
        Ok(guard.publish(registry))
    }

    /// Discover sources under `root` and rebuild from them
    pub fn rebuild_from_dir(&self, root: impl AsRef<Path>) -> Result<Arc<TypeRegistry>> {
        let sources = discover_sources(root.as_ref(), &self.config.discovery)?;
        self.rebuild(&sources)
    }
}

/// Exclusive right to build and publish a registry.
///
/// Dropping the guard without publishing releases the slot and keeps the
/// previous registry.
#[derive(Debug)]
pub struct BuildGuard<'a> {
    loader: &'a TypeLoader,
}

impl BuildGuard<'_> {
    /// Infer a registry from `sources` without publishing it
    pub fn build(&self, sources: &[SourceUnit]) -> TypeRegistry {
        let generation = self.loader.generation.load(Ordering::Acquire) + 1;
        info!(
            "Building type registry generation {} from {} sources",
            generation,
            sources.len()
        );

        let mut ordered: Vec<&SourceUnit> = sources.iter().collect();
        ordered.sort_by_key(|unit| unit.kind != SourceKind::JSchema);

        let converter = JSchemaConverter::new();
        let mut inferrer = TypeInferrer::new(self.loader.config.markers.clone());
        for unit in ordered {
            match unit.read_text() {
                Ok(text) => {
                    let doc = parse_document(&text);
                    debug!(
                        "Parsed source '{}' ({}) with {} errors",
                        unit.name,
                        unit.kind,
                        doc.errors.len()
                    );
                    let value = match unit.kind {
                        SourceKind::JSchema => doc.value,
                        SourceKind::Json => doc.value.map(|v| converter.convert(&v)),
                    };
                    inferrer.infer_source(&unit.name, value.as_ref(), doc.errors);
                }
                Err(e) => {
                    inferrer.add_unreadable(
                        &unit.name,
                        format!("Unable to open {} file {}: {}", unit.kind, unit.name, e),
                    );
                }
            }
        }

        let registry = inferrer.finish(generation);
        info!(
            "Built {} types from {} sources",
            registry.len(),
            registry.sources().count()
        );
        registry
    }

    /// Swap `registry` in as the published one
    pub fn publish(self, registry: TypeRegistry) -> Arc<TypeRegistry> {
        let registry = Arc::new(registry);
        self.loader
            .generation
            .store(registry.generation(), Ordering::Release);
        *self
            .loader
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = registry.clone();
        registry
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.loader.building.store(false, Ordering::Release);
    }
}
