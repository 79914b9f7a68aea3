//! The compiler front door.
//!
//! A [`Compiler`] owns the registries, the configuration and both caches.
//! Compiling a template goes memory cache, then disk cache, then the full
//! pipeline; the result is linked once and shared by every renderer handle
//! for the same key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use fpath_accum::Accumulator;
use fpath_codegen::Unit;
use fpath_ir::{FunctionRegistry, Record, SchemaRegistry};
use tracing::{debug, warn};

use crate::artifact::ArtifactCache;
use crate::cache::RenderCache;
use crate::hash::{combine_hashes, hash_str, KeyParts};
use crate::link::link;
use crate::pipeline::compile_unit;
use crate::sweeper::Sweeper;
use crate::{
    AccumulatorFactory, CacheError, CompilerConfig, ContentHash, Error, Program, Renderer,
};

struct Shared {
    schema: SchemaRegistry,
    functions: FunctionRegistry,
    config: CompilerConfig,
    memory: RenderCache,
    disk: Option<ArtifactCache>,
    disk_hits: AtomicUsize,
    generated: AtomicUsize,
}

impl Shared {
    fn sweep(&self) -> Result<usize, CacheError> {
        let mut removed = self.memory.sweep(Instant::now());
        if let Some(disk) = &self.disk {
            removed += disk.sweep(SystemTime::now())?;
        }
        Ok(removed)
    }
}

/// Compiles templates into cached renderers.
///
/// ```ignore
/// let compiler = Compiler::new(schema, functions, CompilerConfig::from_env()?)?;
/// let greet = compiler.compile::<User, TextAccumulator>("Hello, ${name}!")?;
/// assert_eq!(greet.render(&user), "Hello, World!");
/// ```
pub struct Compiler {
    shared: Arc<Shared>,
    /// Stops the background thread on drop.
    _sweeper: Option<Sweeper>,
}

impl Compiler {
    /// Opens the disk cache and starts the sweeper when configured.
    pub fn new(
        schema: SchemaRegistry,
        functions: FunctionRegistry,
        config: CompilerConfig,
    ) -> Result<Self, Error> {
        let disk = config.disk.as_ref().map(ArtifactCache::open).transpose()?;
        let shared = Arc::new(Shared {
            memory: RenderCache::new(config.capacity, config.ttl),
            schema,
            functions,
            config,
            disk,
            disk_hits: AtomicUsize::new(0),
            generated: AtomicUsize::new(0),
        });

        let sweeper = match shared.config.sweep_interval {
            Some(interval) => {
                let weak = Arc::downgrade(&shared);
                Some(Sweeper::spawn(interval, move || {
                    let Some(shared) = weak.upgrade() else { return };
                    if let Err(err) = shared.sweep() {
                        warn!(error = %err, "cache sweep failed");
                    }
                })?)
            }
            None => None,
        };
        debug!(
            policy = %shared.config.policy,
            optimize = shared.config.optimize,
            disk = shared.disk.is_some(),
            "compiler ready"
        );
        Ok(Compiler { shared, _sweeper: sweeper })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.shared.config
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.shared.schema
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.shared.functions
    }

    /// Renderer for `template` over `T`, with `A::default()` as the
    /// accumulator of each render.
    pub fn compile<T, A>(&self, template: &str) -> Result<Renderer<T, A>, Error>
    where
        T: Record,
        A: Accumulator + Default,
    {
        self.compile_with(template, Arc::new(A::default))
    }

    /// Renderer whose accumulators come from `factory`, for configured
    /// accumulators such as a text accumulator with a custom date pattern.
    pub fn compile_with<T, A>(
        &self,
        template: &str,
        factory: AccumulatorFactory<A>,
    ) -> Result<Renderer<T, A>, Error>
    where
        T: Record,
        A: Accumulator,
    {
        let input = self.input_name::<T>()?;
        let key = self.key(template, input, A::KIND);
        let program = self
            .shared
            .memory
            .get_or_compile(key, template, || self.build(template, input, A::KIND, key))?;
        Ok(Renderer::new(program, factory))
    }

    /// Generate the unit for `template` without touching either cache.
    pub fn unit<T, A>(&self, template: &str) -> Result<Unit, Error>
    where
        T: Record,
        A: Accumulator,
    {
        let input = self.input_name::<T>()?;
        let key = self.key(template, input, A::KIND);
        Ok(self.generate(template, input, A::KIND, key)?)
    }

    fn input_name<T: Record>(&self) -> Result<&'static str, Error> {
        self.shared
            .schema
            .shape_of::<T>()
            .map(|shape| shape.name())
            .ok_or(Error::UnregisteredType { name: T::NAME })
    }

    fn key(&self, template: &str, input: &str, accumulator: &str) -> ContentHash {
        let config = &self.shared.config;
        KeyParts {
            template,
            input,
            accumulator,
            policy: config.policy,
            optimize: config.optimize,
            max_depth: config.max_depth,
        }
        .hash()
    }

    fn generate(
        &self,
        template: &str,
        input: &str,
        accumulator: &str,
        key: ContentHash,
    ) -> Result<Unit, Error> {
        let shared = &self.shared;
        let name = format!("render_{key}");
        let unit = compile_unit(
            template,
            input,
            accumulator,
            &name,
            &shared.schema,
            &shared.functions,
            &shared.config,
        )?;
        Ok(unit)
    }

    fn build(
        &self,
        template: &str,
        input: &str,
        accumulator: &str,
        key: ContentHash,
    ) -> Result<Arc<Program>, Error> {
        let shared = &self.shared;
        let disk_key = combine_hashes(&[
            key,
            ContentHash::new(shared.schema.fingerprint()),
            ContentHash::new(shared.functions.fingerprint()),
        ]);
        let source_hash = hash_str(template);

        let stored = shared.disk.as_ref().and_then(|disk| disk.load(disk_key, source_hash));
        let unit = match stored {
            Some(unit) => {
                shared.disk_hits.fetch_add(1, Ordering::Relaxed);
                unit
            }
            None => {
                let unit = self.generate(template, input, accumulator, key)?;
                shared.generated.fetch_add(1, Ordering::Relaxed);
                if let Some(disk) = &shared.disk {
                    if let Err(err) = disk.store(disk_key, source_hash, &unit) {
                        warn!(%key, error = %err, "could not store artifact");
                    }
                }
                unit
            }
        };

        let program = link(&unit, template, &shared.schema, &shared.functions)?;
        debug!(%key, input, accumulator, "compiled renderer");
        Ok(Arc::new(program))
    }

    /// Units generated by the full pipeline for memory-cache misses.
    pub fn compilations(&self) -> usize {
        self.shared.generated.load(Ordering::Relaxed)
    }

    /// Units loaded from the disk cache instead of generated.
    pub fn disk_hits(&self) -> usize {
        self.shared.disk_hits.load(Ordering::Relaxed)
    }

    /// Renderers currently held in memory.
    pub fn cached(&self) -> usize {
        self.shared.memory.len()
    }

    /// Evict expired renderers and artifacts now. Returns how many went.
    pub fn sweep(&self) -> Result<usize, Error> {
        Ok(self.shared.sweep()?)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.shared.config)
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}
