//! The type processor registry.
//!
//! A [`TypeProcessor`] converts one value type to and from an [`Element`]. The
//! registry maps declared types to processors and resolves a runtime type to
//! the most specific processor registered for it or for one of its declared
//! ancestors (see [`TypeGraph`]).
//!
//! The registry has two phases. A [`RegistryBuilder`] collects processors and
//! ancestry edges; [`RegistryBuilder::build`] then adds the default processors
//! for every type not already covered and precomputes a resolution table, after
//! which the [`Registry`] is immutable and can be shared between threads.
//!
//! ```rust
//! use treebind::{Element, ProcessorOptions, Registry, UuidMode};
//! use uuid::Uuid;
//!
//! let registry = Registry::builder(ProcessorOptions::new().with_uuid_mode(UuidMode::LongArray))
//!     .build()
//!     .unwrap();
//!
//! let id = Uuid::new_v4();
//! let element = registry.to_element(Some(&id)).unwrap();
//! assert_eq!(element.as_array().unwrap().len(), 2);
//! assert_eq!(registry.to_object::<Uuid>(&element).unwrap(), Some(id));
//! assert_eq!(registry.to_element::<Uuid>(None).unwrap(), Element::null());
//! ```

use crate::processors;
use crate::types::{lift_along, upcast_along, TypeGraph, Upcast};
use crate::{Element, Error, ProcessorOptions, Result, TypeKey};
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A bidirectional converter between `T` and [`Element`].
///
/// `None` must map to a null primitive and a null primitive back to `None`.
///
/// # Examples
///
/// ```rust
/// use treebind::{Element, Error, Primitive, Result, TypeProcessor};
///
/// struct Celsius(f64);
///
/// struct CelsiusProcessor;
///
/// impl TypeProcessor<Celsius> for CelsiusProcessor {
///     fn to_element(&self, value: Option<&Celsius>) -> Result<Element> {
///         Ok(value.map_or(Element::null(), |c| Element::from(format!("{}C", c.0))))
///     }
///
///     fn to_object(&self, element: &Element) -> Result<Option<Celsius>> {
///         if element.is_null() {
///             return Ok(None);
///         }
///         let text = element.as_str()?;
///         let degrees = text
///             .strip_suffix('C')
///             .and_then(|d| d.parse().ok())
///             .ok_or_else(|| Error::conversion("Celsius", "degrees like 21.5C", text))?;
///         Ok(Some(Celsius(degrees)))
///     }
/// }
/// ```
pub trait TypeProcessor<T>: Send + Sync {
    fn to_element(&self, value: Option<&T>) -> Result<Element>;

    fn to_object(&self, element: &Element) -> Result<Option<T>>;
}

pub(crate) trait ErasedProcessor: Send + Sync {
    fn target(&self) -> TypeKey;

    fn encode_any(&self, value: Option<&dyn Any>) -> Result<Element>;

    fn decode_any(&self, element: &Element) -> Result<Option<Box<dyn Any>>>;
}

struct Erased<T, P> {
    processor: P,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, P: TypeProcessor<T>> ErasedProcessor for Erased<T, P> {
    fn target(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn encode_any(&self, value: Option<&dyn Any>) -> Result<Element> {
        match value {
            None => self.processor.to_element(None),
            Some(any) => {
                let typed = any.downcast_ref::<T>().ok_or_else(|| {
                    Error::conversion(self.target().name(), self.target().name(), "value of another type")
                })?;
                self.processor.to_element(Some(typed))
            }
        }
    }

    fn decode_any(&self, element: &Element) -> Result<Option<Box<dyn Any>>> {
        Ok(self
            .processor
            .to_object(element)?
            .map(|value| Box::new(value) as Box<dyn Any>))
    }
}

pub(crate) fn erase<T: 'static, P: TypeProcessor<T> + 'static>(processor: P) -> Arc<dyn ErasedProcessor> {
    Arc::new(Erased {
        processor,
        _marker: PhantomData::<fn() -> T>,
    })
}

/// Collects processors and ancestry before the registry is frozen.
pub struct RegistryBuilder {
    options: ProcessorOptions,
    processors: IndexMap<TypeKey, Arc<dyn ErasedProcessor>>,
    graph: TypeGraph,
    defaults: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new(ProcessorOptions::default())
    }
}

impl RegistryBuilder {
    #[must_use]
    pub fn new(options: ProcessorOptions) -> Self {
        RegistryBuilder {
            options,
            processors: IndexMap::new(),
            graph: TypeGraph::new(),
            defaults: true,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Registers `processor` for `T`. A type that already has a processor keeps it.
    #[must_use]
    pub fn register<T: 'static>(mut self, processor: impl TypeProcessor<T> + 'static) -> Self {
        let key = TypeKey::of::<T>();
        if self.processors.contains_key(&key) {
            debug!(type_name = %key, "processor already registered, keeping the first");
        } else {
            debug!(type_name = %key, "registering processor");
            self.processors.insert(key, erase::<T, _>(processor));
        }
        self
    }

    /// Registers `processor` for `T`, replacing any previous one.
    #[must_use]
    pub fn register_override<T: 'static>(
        mut self,
        processor: impl TypeProcessor<T> + 'static,
    ) -> Self {
        let key = TypeKey::of::<T>();
        debug!(type_name = %key, "registering processor (override)");
        self.processors.insert(key, erase::<T, _>(processor));
        self
    }

    /// Removes the processor for `T`, if any.
    #[must_use]
    pub fn remove<T: 'static>(mut self) -> Self {
        self.processors.shift_remove(&TypeKey::of::<T>());
        self
    }

    #[must_use]
    pub fn has<T: 'static>(&self) -> bool {
        self.processors.contains_key(&TypeKey::of::<T>())
    }

    /// Declares that `C` extends `P`; see [`TypeGraph::declare`].
    #[must_use]
    pub fn extends<C: 'static, P: 'static>(
        mut self,
        project: impl Fn(&C) -> &P + Send + Sync + 'static,
    ) -> Self {
        self.graph.declare::<C, P>(project);
        self
    }

    /// Declares that `C` extends `P` and can be rebuilt from a `P`.
    #[must_use]
    pub fn extends_with_lift<C: 'static, P: 'static>(
        mut self,
        project: impl Fn(&C) -> &P + Send + Sync + 'static,
        lift: fn(P) -> C,
    ) -> Self {
        self.graph.declare_with_lift::<C, P>(project, lift);
        self
    }

    pub(crate) fn add_edge(&mut self, child: TypeKey, parent: TypeKey, upcast: Arc<dyn Upcast>) {
        self.graph.insert_edge(child, parent, upcast);
    }

    /// Skips the built-in processors at build time.
    #[must_use]
    pub fn without_defaults(mut self) -> Self {
        self.defaults = false;
        self
    }

    /// Adds the default processors for uncovered types and freezes the registry.
    pub fn build(mut self) -> Result<Registry> {
        self.options.validate()?;

        if self.defaults {
            for processor in processors::defaults(&self.options) {
                let key = processor.target();
                if self.processors.contains_key(&key) {
                    debug!(type_name = %key, "custom processor covers default type");
                } else {
                    self.processors.insert(key, processor);
                }
            }
        }

        let mut nodes: Vec<TypeKey> = self.processors.keys().copied().collect();
        nodes.extend(self.graph.children().filter(|k| !self.processors.contains_key(k)));

        let mut table = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let mut best: Option<(usize, Resolution)> = None;
            for (key, processor) in &self.processors {
                let Some(hops) = self.graph.path(node, *key) else {
                    continue;
                };
                if best.as_ref().map_or(true, |(distance, _)| hops.len() < *distance) {
                    best = Some((
                        hops.len(),
                        Resolution {
                            processor: Arc::clone(processor),
                            hops,
                        },
                    ));
                }
            }
            if let Some((_, resolution)) = best {
                table.insert(node, resolution);
            }
        }

        debug!(
            processors = self.processors.len(),
            resolvable = table.len(),
            "registry built"
        );

        Ok(Registry {
            options: self.options,
            registered: self.processors,
            graph: self.graph,
            table,
        })
    }
}

struct Resolution {
    processor: Arc<dyn ErasedProcessor>,
    hops: Vec<Arc<dyn Upcast>>,
}

/// A frozen mapping from types to processors with precomputed resolution.
pub struct Registry {
    options: ProcessorOptions,
    registered: IndexMap<TypeKey, Arc<dyn ErasedProcessor>>,
    graph: TypeGraph,
    table: HashMap<TypeKey, Resolution>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("options", &self.options)
            .field(
                "registered",
                &self.registered.keys().map(TypeKey::name).collect::<Vec<_>>(),
            )
            .field("graph", &self.graph)
            .finish()
    }
}

/// A processor chosen for a runtime type, together with the upcasts that
/// lead from that type to the processor's declared type.
pub struct Resolved<'r> {
    runtime: TypeKey,
    processor: &'r dyn ErasedProcessor,
    hops: &'r [Arc<dyn Upcast>],
}

impl<'r> Resolved<'r> {
    /// The type the processor was registered for.
    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.processor.target()
    }

    /// Hops between the runtime type and [`Resolved::target`].
    #[must_use]
    pub fn distance(&self) -> usize {
        self.hops.len()
    }

    /// Converts a value of the runtime type.
    pub fn encode(&self, value: Option<&dyn Any>) -> Result<Element> {
        match value {
            None => self.processor.encode_any(None),
            Some(value) => {
                let viewed = upcast_along(self.hops, value).ok_or_else(|| {
                    Error::conversion(self.runtime.name(), self.target().name(), "value of another type")
                })?;
                self.processor.encode_any(Some(viewed))
            }
        }
    }

    /// Materializes a value of the runtime type.
    pub fn decode(&self, element: &Element) -> Result<Option<Box<dyn Any>>> {
        let Some(value) = self.processor.decode_any(element)? else {
            return Ok(None);
        };
        if self.hops.is_empty() {
            return Ok(Some(value));
        }
        lift_along(self.hops, value).map(Some).ok_or_else(|| {
            Error::conversion(
                self.runtime.name(),
                format!("a lift from {}", self.target().name()),
                "an ancestor edge without one",
            )
        })
    }
}

impl Registry {
    #[must_use]
    pub fn builder(options: ProcessorOptions) -> RegistryBuilder {
        RegistryBuilder::new(options)
    }

    /// A registry with only the default processors.
    pub fn with_defaults(options: ProcessorOptions) -> Result<Self> {
        RegistryBuilder::new(options).build()
    }

    #[must_use]
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    #[must_use]
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Returns `true` when a processor is registered for exactly `T`.
    #[must_use]
    pub fn has<T: 'static>(&self) -> bool {
        self.has_key(TypeKey::of::<T>())
    }

    #[must_use]
    pub fn has_key(&self, key: TypeKey) -> bool {
        self.registered.contains_key(&key)
    }

    /// Finds the most specific processor for `runtime`, if any.
    #[must_use]
    pub fn lookup(&self, runtime: TypeKey) -> Option<Resolved<'_>> {
        self.table.get(&runtime).map(|resolution| Resolved {
            runtime,
            processor: resolution.processor.as_ref(),
            hops: &resolution.hops,
        })
    }

    /// Like [`Registry::lookup`], failing with [`Error::UnknownType`].
    pub fn resolve(&self, runtime: TypeKey) -> Result<Resolved<'_>> {
        self.lookup(runtime)
            .ok_or_else(|| Error::unknown_type(runtime.name()))
    }

    /// Hop count between two types over the declared ancestry.
    #[must_use]
    pub fn distance(&self, from: TypeKey, to: TypeKey) -> i32 {
        self.graph.distance(from, to)
    }

    pub fn to_element<T: 'static>(&self, value: Option<&T>) -> Result<Element> {
        let resolved = self.resolve(TypeKey::of::<T>())?;
        resolved.encode(value.map(|v| v as &dyn Any))
    }

    pub fn to_object<T: 'static>(&self, element: &Element) -> Result<Option<T>> {
        let key = TypeKey::of::<T>();
        let resolved = self.resolve(key)?;
        match resolved.decode(element)? {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(|v| Some(*v))
                .map_err(|_| Error::conversion(key.name(), key.name(), "value of another type")),
        }
    }
}
