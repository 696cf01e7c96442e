//! Type identities and declared ancestry.
//!
//! Rust has no class inheritance, so "B extends A" is declared explicitly as
//! an edge in a [`TypeGraph`]: a projection from `&B` to the `&A` it embeds,
//! plus optionally a lift from an owned `A` back to a `B`. Multiple parents
//! are allowed, which covers both a base type and any number of interface-like
//! views.
//!
//! The graph answers one question: how many hops separate a type from one of
//! its ancestors. `0` is the type itself, `N` is N hops up, and `-1` means the
//! two are unrelated.
//!
//! ```rust
//! use treebind::{TypeGraph, TypeKey};
//!
//! struct Animal { name: String }
//! struct Dog { animal: Animal }
//! struct Puppy { dog: Dog }
//!
//! let mut graph = TypeGraph::new();
//! graph.declare::<Dog, Animal>(|d| &d.animal);
//! graph.declare::<Puppy, Dog>(|p| &p.dog);
//!
//! let puppy = TypeKey::of::<Puppy>();
//! assert_eq!(graph.distance(puppy, puppy), 0);
//! assert_eq!(graph.distance(puppy, TypeKey::of::<Animal>()), 2);
//! assert_eq!(graph.distance(TypeKey::of::<Animal>(), puppy), -1);
//! ```

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a Rust type together with its readable name.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One hop from a type to a declared parent.
pub trait Upcast: Send + Sync {
    /// Views a child value as its parent.
    fn upcast<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any>;

    /// Builds a child from an owned parent, when the edge declares how.
    fn lift(&self, value: Box<dyn Any>) -> Option<Box<dyn Any>>;
}

pub(crate) type ProjectFn<C, P> = Arc<dyn Fn(&C) -> &P + Send + Sync>;
pub(crate) type ProjectMutFn<C, P> = Arc<dyn Fn(&mut C) -> &mut P + Send + Sync>;

pub(crate) struct Projection<C, P> {
    project: ProjectFn<C, P>,
    lift: Option<fn(P) -> C>,
}

impl<C, P> Projection<C, P> {
    pub(crate) fn new(project: ProjectFn<C, P>, lift: Option<fn(P) -> C>) -> Self {
        Projection { project, lift }
    }
}

impl<C: 'static, P: 'static> Upcast for Projection<C, P> {
    fn upcast<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        let child = value.downcast_ref::<C>()?;
        Some((self.project)(child))
    }

    fn lift(&self, value: Box<dyn Any>) -> Option<Box<dyn Any>> {
        let lift = self.lift?;
        let parent = value.downcast::<P>().ok()?;
        Some(Box::new(lift(*parent)))
    }
}

#[derive(Clone)]
pub(crate) struct Edge {
    pub(crate) parent: TypeKey,
    pub(crate) upcast: Arc<dyn Upcast>,
}

/// Declared child-to-parent edges between types.
#[derive(Clone, Default)]
pub struct TypeGraph {
    parents: HashMap<TypeKey, Vec<Edge>>,
}

impl fmt::Debug for TypeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (child, edges) in &self.parents {
            let parents: Vec<_> = edges.iter().map(|e| e.parent.name()).collect();
            map.entry(&child.name(), &parents);
        }
        map.finish()
    }
}

impl TypeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `C` extends `P`, reachable through `project`.
    pub fn declare<C: 'static, P: 'static>(
        &mut self,
        project: impl Fn(&C) -> &P + Send + Sync + 'static,
    ) -> &mut Self {
        let upcast = Projection::<C, P>::new(Arc::new(project), None);
        self.insert_edge(TypeKey::of::<C>(), TypeKey::of::<P>(), Arc::new(upcast));
        self
    }

    /// Like [`TypeGraph::declare`], and also lets a processor registered for
    /// `P` materialize a `C` through `lift`.
    pub fn declare_with_lift<C: 'static, P: 'static>(
        &mut self,
        project: impl Fn(&C) -> &P + Send + Sync + 'static,
        lift: fn(P) -> C,
    ) -> &mut Self {
        let upcast = Projection::<C, P>::new(Arc::new(project), Some(lift));
        self.insert_edge(TypeKey::of::<C>(), TypeKey::of::<P>(), Arc::new(upcast));
        self
    }

    /// Adds an edge unless `child` already declares `parent`.
    pub(crate) fn insert_edge(&mut self, child: TypeKey, parent: TypeKey, upcast: Arc<dyn Upcast>) {
        let edges = self.parents.entry(child).or_default();
        if edges.iter().all(|edge| edge.parent != parent) {
            edges.push(Edge { parent, upcast });
        }
    }

    /// Direct parents of `key`, in declaration order.
    pub fn parents(&self, key: TypeKey) -> impl Iterator<Item = TypeKey> + '_ {
        self.parents
            .get(&key)
            .into_iter()
            .flatten()
            .map(|edge| edge.parent)
    }

    /// Every type that declares at least one parent.
    pub fn children(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.parents.keys().copied()
    }

    /// Hop count from `from` up to `to`: `0` when equal, `-1` when unrelated.
    #[must_use]
    pub fn distance(&self, from: TypeKey, to: TypeKey) -> i32 {
        match self.path(from, to) {
            Some(hops) => i32::try_from(hops.len()).unwrap_or(i32::MAX),
            None => -1,
        }
    }

    /// Shortest chain of upcasts from `from` to `to`, breadth first.
    pub(crate) fn path(&self, from: TypeKey, to: TypeKey) -> Option<Vec<Arc<dyn Upcast>>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut previous: HashMap<TypeKey, (TypeKey, Arc<dyn Upcast>)> = HashMap::new();
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for edge in self.parents.get(&current).into_iter().flatten() {
                let next = edge.parent;
                if !seen.insert(next) {
                    continue;
                }
                previous.insert(next, (current, Arc::clone(&edge.upcast)));
                if next == to {
                    let mut hops = Vec::new();
                    let mut cursor = next;
                    while let Some((back, upcast)) = previous.get(&cursor) {
                        hops.push(Arc::clone(upcast));
                        cursor = *back;
                    }
                    hops.reverse();
                    return Some(hops);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Orders candidates `a` and `b` by how specific they are for `ty`.
    ///
    /// `Less` means `a` is closer to `ty` than `b`. Unrelated candidates sort last.
    #[must_use]
    pub fn sort_distance(&self, ty: TypeKey, a: TypeKey, b: TypeKey) -> Ordering {
        match (self.distance(ty, a), self.distance(ty, b)) {
            (-1, -1) => Ordering::Equal,
            (-1, _) => Ordering::Greater,
            (_, -1) => Ordering::Less,
            (left, right) => left.cmp(&right),
        }
    }
}

/// Walks `value` up a chain of upcasts.
pub(crate) fn upcast_along<'a>(
    hops: &[Arc<dyn Upcast>],
    value: &'a dyn Any,
) -> Option<&'a dyn Any> {
    hops.iter().try_fold(value, |current, hop| hop.upcast(current))
}

/// Walks an owned ancestor value back down a chain of upcasts.
pub(crate) fn lift_along(hops: &[Arc<dyn Upcast>], value: Box<dyn Any>) -> Option<Box<dyn Any>> {
    hops.iter().rev().try_fold(value, |current, hop| hop.lift(current))
}
