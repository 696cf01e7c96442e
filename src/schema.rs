//! Per-type field tables for structural binding.
//!
//! A [`Schema`] lists the fields of a struct as accessor pairs, each with a
//! [`FieldPolicy`], plus at most one parent type the struct embeds. When the
//! binder is built, every schema is flattened once into a layout: the type's
//! own fields first, then the parent's flattened fields whose names are not
//! declared again by the child. Skipped fields take part in shadowing but are
//! never bound.
//!
//! ```rust
//! use treebind::{Expectation, FieldPolicy, Schema};
//!
//! #[derive(Default)]
//! struct Entity { id: u64 }
//!
//! #[derive(Default)]
//! struct User { entity: Entity, name: String, age: i32, session: String }
//!
//! let entity = Schema::<Entity>::new().field("id", |e| &e.id, |e| &mut e.id);
//!
//! let user = Schema::<User>::new()
//!     .extends(|u| &u.entity, |u| &mut u.entity)
//!     .field_with("name", |u| &u.name, |u| &mut u.name, FieldPolicy::new().rename("userName"))
//!     .field_with(
//!         "age",
//!         |u| &u.age,
//!         |u| &mut u.age,
//!         FieldPolicy::new()
//!             .default_value(18)
//!             .expect(Expectation::greater_than(0, false)),
//!     )
//!     .field_with("session", |u| &u.session, |u| &mut u.session, FieldPolicy::new().skip());
//! # let _ = (entity, user);
//! ```

use crate::binder::{Decoder, Encoder};
use crate::types::{ProjectFn, ProjectMutFn, Projection, Upcast};
use crate::{Bind, Element, Error, Initializer, Primitive, Result, TypeKey};
use indexmap::IndexMap;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A validation predicate evaluated on a field after it has been read.
#[derive(Clone, Debug, PartialEq)]
pub enum Expectation {
    GreaterThan { bound: Primitive, inclusive: bool },
    LessThan { bound: Primitive, inclusive: bool },
    IsNull,
}

impl Expectation {
    #[must_use]
    pub fn greater_than(bound: impl Into<Primitive>, inclusive: bool) -> Self {
        Expectation::GreaterThan {
            bound: bound.into(),
            inclusive,
        }
    }

    #[must_use]
    pub fn less_than(bound: impl Into<Primitive>, inclusive: bool) -> Self {
        Expectation::LessThan {
            bound: bound.into(),
            inclusive,
        }
    }

    #[must_use]
    pub fn is_null() -> Self {
        Expectation::IsNull
    }

    /// Checks an encoded field value; the bound is compared at the value's own width.
    pub(crate) fn check(&self, value: &Element) -> std::result::Result<(), String> {
        let (bound, inclusive, wanted, relation) = match self {
            Expectation::IsNull if value.is_null() => return Ok(()),
            Expectation::IsNull => return Err(format!("expected null, found {}", value)),
            Expectation::GreaterThan { bound, inclusive } => (bound, *inclusive, Ordering::Greater, "greater than"),
            Expectation::LessThan { bound, inclusive } => (bound, *inclusive, Ordering::Less, "less than"),
        };
        let qualifier = if inclusive { " or equal to" } else { "" };
        let ordering = match value {
            Element::Primitive(p) => p.compare_numeric(bound),
            _ => None,
        };
        match ordering {
            Some(o) if o == wanted || (inclusive && o == Ordering::Equal) => Ok(()),
            Some(_) => Err(format!("{} is not {}{} {}", value, relation, qualifier, bound)),
            None => Err(format!("{} cannot be compared with {}", value, bound)),
        }
    }
}

/// How a single field is written and read.
///
/// # Examples
///
/// ```rust
/// use treebind::{Expectation, FieldPolicy};
///
/// let policy = FieldPolicy::new()
///     .rename("max_connections")
///     .default_value(16)
///     .expect(Expectation::less_than(1024, true));
/// assert_eq!(policy.rename.as_deref(), Some("max_connections"));
/// assert!(!policy.skip);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPolicy {
    /// Object key to use instead of the field name.
    pub rename: Option<String>,
    /// Never write or read this field.
    pub skip: bool,
    /// Write this field even when an `ignore_*` binder option would drop it.
    pub always: bool,
    /// Literal used on read when the key is absent.
    pub default: Option<Primitive>,
    pub expectations: Vec<Expectation>,
}

impl FieldPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    #[must_use]
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    #[must_use]
    pub fn always(mut self) -> Self {
        self.always = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, literal: impl Into<Primitive>) -> Self {
        self.default = Some(literal.into());
        self
    }

    #[must_use]
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// One bindable field of `T`, possibly reached through embedded parents.
pub(crate) trait FieldSlot<T>: Send + Sync {
    fn name(&self) -> &str;

    fn policy(&self) -> &FieldPolicy;

    /// The type that declared the field.
    fn declaring_type(&self) -> &'static str;

    fn encode(&self, owner: &T, enc: &mut Encoder<'_>) -> Result<Element>;

    fn decode_into(&self, owner: &mut T, element: &Element, dec: &mut Decoder<'_>) -> Result<()>;

    fn key(&self) -> &str {
        self.policy().rename.as_deref().unwrap_or_else(|| self.name())
    }
}

struct Field<T, F> {
    name: &'static str,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
    policy: FieldPolicy,
}

impl<T: 'static, F: Bind> FieldSlot<T> for Field<T, F> {
    fn name(&self) -> &str {
        self.name
    }

    fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    fn declaring_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self, owner: &T, enc: &mut Encoder<'_>) -> Result<Element> {
        enc.encode((self.get)(owner))
    }

    fn decode_into(&self, owner: &mut T, element: &Element, dec: &mut Decoder<'_>) -> Result<()> {
        *(self.get_mut)(owner) = dec.decode::<F>(element)?;
        Ok(())
    }
}

/// A parent's field seen from the child that embeds the parent.
struct Inherited<C, P> {
    inner: Arc<dyn FieldSlot<P>>,
    project: ProjectFn<C, P>,
    project_mut: ProjectMutFn<C, P>,
}

impl<C: 'static, P: 'static> FieldSlot<C> for Inherited<C, P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn policy(&self) -> &FieldPolicy {
        self.inner.policy()
    }

    fn declaring_type(&self) -> &'static str {
        self.inner.declaring_type()
    }

    fn encode(&self, owner: &C, enc: &mut Encoder<'_>) -> Result<Element> {
        self.inner.encode((self.project)(owner), enc)
    }

    fn decode_into(&self, owner: &mut C, element: &Element, dec: &mut Decoder<'_>) -> Result<()> {
        self.inner.decode_into((self.project_mut)(owner), element, dec)
    }
}

trait ParentLink<C>: Send + Sync {
    fn parent(&self) -> TypeKey;

    fn upcast(&self) -> Arc<dyn Upcast>;

    /// Rebases the parent's flattened fields onto `C`.
    fn inherit(&self, parent: &(dyn Any + Send + Sync)) -> Option<Vec<Arc<dyn FieldSlot<C>>>>;
}

struct Parent<C, P> {
    project: ProjectFn<C, P>,
    project_mut: ProjectMutFn<C, P>,
}

impl<C: 'static, P: 'static> ParentLink<C> for Parent<C, P> {
    fn parent(&self) -> TypeKey {
        TypeKey::of::<P>()
    }

    fn upcast(&self) -> Arc<dyn Upcast> {
        Arc::new(Projection::<C, P>::new(Arc::clone(&self.project), None))
    }

    fn inherit(&self, parent: &(dyn Any + Send + Sync)) -> Option<Vec<Arc<dyn FieldSlot<C>>>> {
        let layout = parent.downcast_ref::<Layout<P>>()?;
        Some(
            layout
                .fields
                .iter()
                .map(|slot| {
                    Arc::new(Inherited {
                        inner: Arc::clone(slot),
                        project: Arc::clone(&self.project),
                        project_mut: Arc::clone(&self.project_mut),
                    }) as Arc<dyn FieldSlot<C>>
                })
                .collect(),
        )
    }
}

/// Declared fields, parent and initializer of a structural type.
pub struct Schema<T> {
    init: Initializer<T>,
    fields: Vec<Arc<dyn FieldSlot<T>>>,
    parent: Option<Arc<dyn ParentLink<T>>>,
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type", &std::any::type_name::<T>())
            .field("init", &self.init)
            .field("fields", &self.fields.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("parent", &self.parent.as_ref().map(|p| p.parent().name()))
            .finish()
    }
}

impl<T: Default + 'static> Default for Schema<T> {
    fn default() -> Self {
        Self::with_initializer(Initializer::default())
    }
}

impl<T: 'static> Schema<T> {
    /// A schema whose instances come from `T::default()`.
    #[must_use]
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::default()
    }

    #[must_use]
    pub fn with_initializer(init: Initializer<T>) -> Self {
        Schema {
            init,
            fields: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn constructed(ctor: fn() -> T) -> Self {
        Self::with_initializer(Initializer::Constructor(ctor))
    }

    /// A type that belongs inside an `outer` value; see [`Initializer::Enclosed`].
    #[must_use]
    pub fn enclosed(outer: &'static str, detached: fn() -> T) -> Self {
        Self::with_initializer(Initializer::Enclosed { outer, detached })
    }

    /// A type that can be written but never read.
    #[must_use]
    pub fn unconstructible() -> Self {
        Self::with_initializer(Initializer::Unavailable)
    }

    #[must_use]
    pub fn field<F: Bind>(self, name: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self {
        self.field_with(name, get, get_mut, FieldPolicy::default())
    }

    /// Adds a field; declaring a name twice replaces the first declaration.
    #[must_use]
    pub fn field_with<F: Bind>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
        policy: FieldPolicy,
    ) -> Self {
        let slot: Arc<dyn FieldSlot<T>> = Arc::new(Field {
            name,
            get,
            get_mut,
            policy,
        });
        match self.fields.iter().position(|s| s.name() == name) {
            Some(index) => self.fields[index] = slot,
            None => self.fields.push(slot),
        }
        self
    }

    /// Declares the embedded parent `P`, whose schema contributes the fields
    /// this type does not declare itself.
    ///
    /// The edge is also added to the registry, so a processor registered for
    /// `P` applies to `T` when no closer one exists.
    #[must_use]
    pub fn extends<P: 'static>(
        mut self,
        project: impl Fn(&T) -> &P + Send + Sync + 'static,
        project_mut: impl Fn(&mut T) -> &mut P + Send + Sync + 'static,
    ) -> Self {
        self.parent = Some(Arc::new(Parent::<T, P> {
            project: Arc::new(project),
            project_mut: Arc::new(project_mut),
        }));
        self
    }

    /// Own fields, then unshadowed parent fields, minus skipped ones.
    fn flatten(&self, parent: Option<&(dyn Any + Send + Sync)>) -> Result<Layout<T>> {
        let mut fields: Vec<Arc<dyn FieldSlot<T>>> = self.fields.clone();

        if let Some(link) = &self.parent {
            let layout = parent.ok_or_else(|| Error::unknown_type(link.parent().name()))?;
            let inherited = link
                .inherit(layout)
                .ok_or_else(|| Error::unknown_type(link.parent().name()))?;
            let own: HashSet<&str> = self.fields.iter().map(|s| s.name()).collect();
            fields.extend(inherited.into_iter().filter(|s| !own.contains(s.name())));
        }

        fields.retain(|slot| !slot.policy().skip);
        Ok(Layout {
            type_name: std::any::type_name::<T>(),
            init: self.init.clone(),
            fields,
        })
    }
}

/// The flattened, bind-ready form of a [`Schema`].
pub(crate) struct Layout<T> {
    pub(crate) type_name: &'static str,
    pub(crate) init: Initializer<T>,
    pub(crate) fields: Vec<Arc<dyn FieldSlot<T>>>,
}

pub(crate) type ErasedLayout = Arc<dyn Any + Send + Sync>;

pub(crate) trait ErasedSchema: Send + Sync {
    fn key(&self) -> TypeKey;

    fn parent(&self) -> Option<TypeKey>;

    fn edge(&self) -> Option<(TypeKey, Arc<dyn Upcast>)>;

    fn flatten_erased(&self, parent: Option<&(dyn Any + Send + Sync)>) -> Result<ErasedLayout>;
}

impl<T: 'static> ErasedSchema for Schema<T> {
    fn key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn parent(&self) -> Option<TypeKey> {
        self.parent.as_ref().map(|link| link.parent())
    }

    fn edge(&self) -> Option<(TypeKey, Arc<dyn Upcast>)> {
        self.parent.as_ref().map(|link| (link.parent(), link.upcast()))
    }

    fn flatten_erased(&self, parent: Option<&(dyn Any + Send + Sync)>) -> Result<ErasedLayout> {
        Ok(Arc::new(self.flatten(parent)?))
    }
}

/// Flattens every schema, parents before children.
pub(crate) fn flatten_all(
    schemas: &IndexMap<TypeKey, Box<dyn ErasedSchema>>,
) -> Result<HashMap<TypeKey, ErasedLayout>> {
    let mut done = HashMap::with_capacity(schemas.len());
    for key in schemas.keys() {
        flatten_one(*key, schemas, &mut done, &mut HashSet::new())?;
    }
    Ok(done)
}

fn flatten_one(
    key: TypeKey,
    schemas: &IndexMap<TypeKey, Box<dyn ErasedSchema>>,
    done: &mut HashMap<TypeKey, ErasedLayout>,
    visiting: &mut HashSet<TypeKey>,
) -> Result<ErasedLayout> {
    if let Some(layout) = done.get(&key) {
        return Ok(Arc::clone(layout));
    }
    let schema = schemas
        .get(&key)
        .ok_or_else(|| Error::unknown_type(key.name()))?;
    if !visiting.insert(key) {
        return Err(Error::cycle(key.name()));
    }

    let parent = match schema.parent() {
        Some(parent) => Some(flatten_one(parent, schemas, done, visiting)?),
        None => None,
    };
    let layout = schema.flatten_erased(parent.as_deref())?;

    visiting.remove(&key);
    done.insert(key, Arc::clone(&layout));
    Ok(layout)
}

trait Variants<T>: Send + Sync {
    fn name_of(&self, value: &T) -> Option<&'static str>;

    fn parse(&self, name: &str, case_sensitive: bool) -> Option<T>;
}

struct VariantList<T>(Vec<(&'static str, T)>);

impl<T: Clone + PartialEq + Send + Sync> Variants<T> for VariantList<T> {
    fn name_of(&self, value: &T) -> Option<&'static str> {
        self.0.iter().find(|(_, v)| v == value).map(|(name, _)| *name)
    }

    fn parse(&self, name: &str, case_sensitive: bool) -> Option<T> {
        let exact = self.0.iter().find(|(n, _)| *n == name);
        let found = match exact {
            Some(found) => Some(found),
            None if case_sensitive => None,
            None => self.0.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)),
        };
        found.map(|(_, v)| v.clone())
    }
}

/// Names of the variants of an enumeration, written as strings.
///
/// # Examples
///
/// ```rust
/// use treebind::EnumTable;
///
/// #[derive(Clone, PartialEq)]
/// enum Level { Low, High }
///
/// let table = EnumTable::new([("LOW", Level::Low), ("HIGH", Level::High)]);
/// assert_eq!(table.name_of(&Level::High), Some("HIGH"));
/// assert!(table.parse("high", false).is_some());
/// assert!(table.parse("high", true).is_none());
/// ```
pub struct EnumTable<T> {
    variants: Box<dyn Variants<T>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> EnumTable<T> {
    #[must_use]
    pub fn new(variants: impl IntoIterator<Item = (&'static str, T)>) -> Self {
        EnumTable {
            variants: Box::new(VariantList(variants.into_iter().collect())),
        }
    }
}

impl<T> EnumTable<T> {
    #[must_use]
    pub fn name_of(&self, value: &T) -> Option<&'static str> {
        self.variants.name_of(value)
    }

    /// Finds a variant by name, ignoring ASCII case unless `case_sensitive`.
    #[must_use]
    pub fn parse(&self, name: &str, case_sensitive: bool) -> Option<T> {
        self.variants.parse(name, case_sensitive)
    }
}
