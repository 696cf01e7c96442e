//! The object binder.
//!
//! A [`Binder`] converts any [`Bind`] value to an [`Element`] tree and back.
//! For every value it first asks the [`Registry`] for the most specific
//! processor; failing that, the value's own [`Bind`] implementation runs,
//! which for structs and enumerations means the [`Schema`] layout or the
//! [`EnumTable`] registered with the binder.
//!
//! The binder is built once and then shared; each call walks the object graph
//! with its own [`Encoder`] or [`Decoder`], so nothing is retained between
//! calls. Object graphs that loop back through shared pointers fail with
//! [`Error::CycleDetected`] instead of recursing forever.
//!
//! ```rust
//! use treebind::{Bind, Binder, BinderOptions, Element, FieldPolicy, Schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Server { host: String, port: u16, tags: Vec<String> }
//!
//! impl Bind for Server {}
//!
//! let binder = Binder::builder()
//!     .with_options(BinderOptions::new().with_ignore_empty_objects(true))
//!     .schema(
//!         Schema::<Server>::new()
//!             .field("host", |s| &s.host, |s| &mut s.host)
//!             .field_with("port", |s| &s.port, |s| &mut s.port, FieldPolicy::new().default_value(8080))
//!             .field("tags", |s| &s.tags, |s| &mut s.tags),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let server = Server { host: "db1".into(), port: 5432, tags: vec![] };
//! let element = binder.to_element(&server).unwrap();
//! assert!(element.get("tags").is_err());
//!
//! let mut partial = treebind::ElementMap::new();
//! partial.set("host", Element::from("db2"));
//! let read: Server = binder.to_object(&Element::Object(partial)).unwrap();
//! assert_eq!(read.port, 8080);
//! ```

use crate::schema::{flatten_all, ErasedLayout, ErasedSchema, FieldSlot, Layout};
use crate::{
    Bind, BinderOptions, Element, ElementMap, EnumTable, Error, MissingFieldPolicy, Primitive,
    Registry, RegistryBuilder, Result, Schema, TypeKey, TypeProcessor,
};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Collects schemas, enumerations and processors before the binder is frozen.
pub struct BinderBuilder {
    registry: RegistryBuilder,
    options: BinderOptions,
    schemas: IndexMap<TypeKey, Box<dyn ErasedSchema>>,
    enums: HashMap<TypeKey, Arc<dyn Any + Send + Sync>>,
}

impl Default for BinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinderBuilder {
    #[must_use]
    pub fn new() -> Self {
        BinderBuilder {
            registry: RegistryBuilder::default(),
            options: BinderOptions::default(),
            schemas: IndexMap::new(),
            enums: HashMap::new(),
        }
    }

    /// Replaces the registry configuration, including processor options.
    #[must_use]
    pub fn with_registry(mut self, registry: RegistryBuilder) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: BinderOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a processor; see [`RegistryBuilder::register`].
    #[must_use]
    pub fn register<T: 'static>(mut self, processor: impl TypeProcessor<T> + 'static) -> Self {
        self.registry = self.registry.register(processor);
        self
    }

    /// Adds the field table for `T`. A second schema for the same type is ignored.
    #[must_use]
    pub fn schema<T: 'static>(mut self, schema: Schema<T>) -> Self {
        let key = TypeKey::of::<T>();
        if self.schemas.contains_key(&key) {
            debug!(type_name = %key, "schema already registered, keeping the first");
        } else {
            self.schemas.insert(key, Box::new(schema));
        }
        self
    }

    #[must_use]
    pub fn enumeration<T: 'static>(mut self, table: EnumTable<T>) -> Self {
        self.enums.insert(TypeKey::of::<T>(), Arc::new(table));
        self
    }

    /// Declares schema ancestry to the registry, builds it, and flattens every schema.
    pub fn build(self) -> Result<Binder> {
        let BinderBuilder {
            mut registry,
            options,
            schemas,
            enums,
        } = self;

        for schema in schemas.values() {
            if let Some((parent, upcast)) = schema.edge() {
                registry.add_edge(schema.key(), parent, upcast);
            }
        }
        let registry = registry.build()?;
        let layouts = flatten_all(&schemas)?;

        debug!(
            schemas = layouts.len(),
            enumerations = enums.len(),
            ignore_nulls = options.ignore_nulls,
            ignore_empty_objects = options.ignore_empty_objects,
            ignore_defaults = options.ignore_defaults,
            "binder built"
        );

        Ok(Binder {
            registry,
            options,
            layouts,
            enums,
        })
    }
}

/// Converts [`Bind`] values to and from element trees.
pub struct Binder {
    registry: Registry,
    options: BinderOptions,
    layouts: HashMap<TypeKey, ErasedLayout>,
    enums: HashMap<TypeKey, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("schemas", &self.layouts.keys().map(TypeKey::name).collect::<Vec<_>>())
            .field("enumerations", &self.enums.keys().map(TypeKey::name).collect::<Vec<_>>())
            .finish()
    }
}

impl Binder {
    #[must_use]
    pub fn builder() -> BinderBuilder {
        BinderBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> &BinderOptions {
        &self.options
    }

    #[must_use]
    pub fn has_schema<T: 'static>(&self) -> bool {
        self.layouts.contains_key(&TypeKey::of::<T>())
    }

    /// Converts `value` into a fresh element tree.
    pub fn to_element<T: Bind>(&self, value: &T) -> Result<Element> {
        Encoder::new(self).encode(value)
    }

    /// Materializes a `T` from `element`; nothing partial is returned on failure.
    pub fn to_object<T: Bind>(&self, element: &Element) -> Result<T> {
        Decoder::new(self).decode(element)
    }

    fn layout<T: 'static>(&self) -> Option<&Layout<T>> {
        self.layouts.get(&TypeKey::of::<T>())?.downcast_ref()
    }

    fn enum_table<T: 'static>(&self) -> Option<&EnumTable<T>> {
        self.enums.get(&TypeKey::of::<T>())?.downcast_ref()
    }
}

/// State of one `to_element` walk.
pub struct Encoder<'b> {
    binder: &'b Binder,
    visiting: HashSet<(usize, TypeId)>,
}

impl<'b> Encoder<'b> {
    fn new(binder: &'b Binder) -> Self {
        Encoder {
            binder,
            visiting: HashSet::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &'b BinderOptions {
        &self.binder.options
    }

    /// Converts a nested value: registry first, then its [`Bind`] implementation.
    pub fn encode<T: Bind>(&mut self, value: &T) -> Result<Element> {
        if let Some(resolved) = self.binder.registry.lookup(TypeKey::of::<T>()) {
            return resolved.encode(Some(value as &dyn Any));
        }
        value.to_element(self)
    }

    /// Converts a value through its schema layout or enumeration table.
    pub fn structural<T: Bind>(&mut self, value: &T) -> Result<Element> {
        let binder = self.binder;
        let key = TypeKey::of::<T>();
        trace!(type_name = %key, "no processor registered, binding structurally");

        if let Some(layout) = binder.layout::<T>() {
            let identity = (value as *const T as usize, key.id());
            if !self.visiting.insert(identity) {
                return Err(Error::cycle(key.name()));
            }
            let result = self.encode_fields(layout, value);
            self.visiting.remove(&identity);
            return result;
        }

        if let Some(table) = binder.enum_table::<T>() {
            return table
                .name_of(value)
                .map(Element::from)
                .ok_or_else(|| Error::conversion(key.name(), "a registered variant", "unnamed variant"));
        }

        Err(Error::unknown_type(key.name()))
    }

    fn encode_fields<T>(&mut self, layout: &Layout<T>, value: &T) -> Result<Element> {
        let options = self.options();
        let mut fresh: Option<Option<T>> = None;
        let mut object = ElementMap::with_capacity(layout.fields.len());

        for slot in &layout.fields {
            let in_field = |e: Error| Error::in_field(slot.declaring_type(), slot.name(), e);
            let element = slot.encode(value, self).map_err(in_field)?;

            if !slot.policy().always {
                if options.ignore_nulls && element.is_null() {
                    continue;
                }
                if options.ignore_empty_objects && element.is_empty_container() {
                    continue;
                }
                if options.ignore_defaults {
                    if let Some(p) = element.as_primitive().ok().filter(|p| !p.is_null()) {
                        let blank = fresh.get_or_insert_with(|| {
                            layout
                                .init
                                .instantiate(layout.type_name, options.allow_unsafe_initialization)
                                .ok()
                        });
                        if self.is_default(slot.as_ref(), p, blank.as_ref()).map_err(in_field)? {
                            continue;
                        }
                    }
                }
            }
            object.set(slot.key(), element);
        }
        Ok(Element::Object(object))
    }

    /// Equal to the declared default literal, or to the field of a blank instance.
    fn is_default<T>(&mut self, slot: &dyn FieldSlot<T>, value: &Primitive, blank: Option<&T>) -> Result<bool> {
        if let Some(literal) = &slot.policy().default {
            if value.loosely_equals(literal) {
                return Ok(true);
            }
        }
        match blank {
            Some(blank) => match slot.encode(blank, self)? {
                Element::Primitive(initial) => Ok(value.loosely_equals(&initial)),
                _ => Ok(false),
            },
            None => Ok(false),
        }
    }
}

/// State of one `to_object` walk.
pub struct Decoder<'b> {
    binder: &'b Binder,
}

impl<'b> Decoder<'b> {
    fn new(binder: &'b Binder) -> Self {
        Decoder { binder }
    }

    #[must_use]
    pub fn options(&self) -> &'b BinderOptions {
        &self.binder.options
    }

    /// Materializes a nested value: registry first, then its [`Bind`] implementation.
    pub fn decode<T: Bind>(&mut self, element: &Element) -> Result<T> {
        let key = TypeKey::of::<T>();
        if let Some(resolved) = self.binder.registry.lookup(key) {
            return match resolved.decode(element)? {
                Some(value) => value
                    .downcast::<T>()
                    .map(|v| *v)
                    .map_err(|_| Error::conversion(key.name(), key.name(), "value of another type")),
                None => Err(Error::conversion(key.name(), "non-null value", "null")),
            };
        }
        T::from_element(element, self)
    }

    /// Materializes a value through its schema layout or enumeration table.
    pub fn structural<T: Bind>(&mut self, element: &Element) -> Result<T> {
        let binder = self.binder;
        let key = TypeKey::of::<T>();
        trace!(type_name = %key, "no processor registered, binding structurally");

        if let Some(layout) = binder.layout::<T>() {
            return self.decode_fields(layout, element);
        }

        if let Some(table) = binder.enum_table::<T>() {
            let name = element.as_str()?;
            return table
                .parse(name, binder.options.case_sensitive_enums)
                .ok_or_else(|| Error::conversion(key.name(), "a registered variant name", format!("{:?}", name)));
        }

        Err(Error::unknown_type(key.name()))
    }

    fn decode_fields<T>(&mut self, layout: &Layout<T>, element: &Element) -> Result<T> {
        let object = element.as_object()?;
        let mut value = layout
            .init
            .instantiate(layout.type_name, self.binder.options.allow_unsafe_initialization)?;

        for slot in &layout.fields {
            self.decode_field(slot.as_ref(), &mut value, object)
                .map_err(|e| Error::in_field(slot.declaring_type(), slot.name(), e))?;
        }
        Ok(value)
    }

    fn decode_field<T>(&mut self, slot: &dyn FieldSlot<T>, owner: &mut T, object: &ElementMap) -> Result<()> {
        let policy = slot.policy();
        match (object.find(slot.key()), &policy.default) {
            (Some(element), _) if self.binder.options.skips(element) => {}
            (Some(element), _) => slot.decode_into(owner, element, self)?,
            (None, Some(literal)) => slot.decode_into(owner, &Element::Primitive(literal.clone()), self)?,
            (None, None) if self.binder.options.missing_fields == MissingFieldPolicy::Error => {
                return Err(Error::key_not_found(slot.key()));
            }
            (None, None) => {}
        }

        if !policy.expectations.is_empty() {
            let actual = slot.encode(owner, &mut Encoder::new(self.binder))?;
            for expectation in &policy.expectations {
                expectation
                    .check(&actual)
                    .map_err(|message| Error::expectation_failed(slot.declaring_type(), slot.name(), message))?;
            }
        }
        Ok(())
    }
}
