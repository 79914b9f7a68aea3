//! Schema registry.
//!
//! Every input type is described once at start-up by implementing [`Record`].
//! The resolver reads member names and [`Resolved`] types from the registry;
//! the linker binds the [`Accessor`] closures the registry stores.
//!
//! ```text
//! impl Record for User {
//!     const NAME: &'static str = "User";
//!     fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
//!         shape
//!             .field_ref("name", |u: &User| &u.name)
//!             .field("age", |u: &User| u.age)
//!             .method("initials", |u: &User| u.initials())
//!             .field_ref("nickname", |u: &User| &u.nickname)
//!             .nullable()
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use crate::{Describe, IntoValue, Resolved, Value};

/// Reads one member from a type-erased record.
///
/// Returns [`Value::Null`] when handed a record of another type.
pub type Accessor = Arc<dyn for<'a> Fn(&'a dyn Any) -> Value<'a> + Send + Sync>;

// Pins the higher-ranked signature for closure inference.
fn accessor<F>(f: F) -> Accessor
where
    F: for<'a> Fn(&'a dyn Any) -> Value<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An input type with a registered shape.
pub trait Record: Any + Send + Sync + Sized {
    /// Name used in type descriptors and diagnostics. Unique per registry.
    const NAME: &'static str;

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Stored data.
    Field,
    /// Zero-argument accessor.
    Method,
}

/// One registered field or method.
#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub resolved: Resolved,
    accessor: Accessor,
}

impl Member {
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// The member table of one record type.
#[derive(Debug)]
pub struct Shape {
    name: &'static str,
    type_id: TypeId,
    members: Vec<Member>,
    fields: FxHashMap<String, usize>,
    methods: FxHashMap<String, usize>,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn field(&self, name: &str) -> Option<&Member> {
        self.fields.get(name).map(|&i| &self.members[i])
    }

    pub fn method(&self, name: &str) -> Option<&Member> {
        self.methods.get(name).map(|&i| &self.members[i])
    }

    /// Members in registration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    fn hash_into(&self, state: &mut FxHasher) {
        self.name.hash(state);
        for m in &self.members {
            m.name.hash(state);
            m.kind.hash(state);
            m.resolved.hash(state);
        }
    }
}

/// Builds a [`Shape`] for `T`.
pub struct ShapeBuilder<T> {
    members: Vec<Member>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Record> ShapeBuilder<T> {
    fn new() -> Self {
        ShapeBuilder { members: Vec::new(), _marker: PhantomData }
    }

    fn push(
        mut self,
        name: &str,
        kind: MemberKind,
        resolved: Resolved,
        accessor: Accessor,
    ) -> Self {
        self.members.push(Member { name: name.to_owned(), kind, resolved, accessor });
        self
    }

    /// Field read by value (`Copy` scalars and other cheap values).
    #[must_use]
    pub fn field<V, F>(self, name: &str, f: F) -> Self
    where
        V: Describe + IntoValue,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let acc = accessor(move |obj: &dyn Any| match obj.downcast_ref::<T>() {
            Some(t) => f(t).into_value(),
            None => Value::Null,
        });
        self.push(name, MemberKind::Field, V::resolved(), acc)
    }

    /// Field borrowed from the record. Required for strings, nested records,
    /// lists and maps so nothing is cloned per render.
    #[must_use]
    pub fn field_ref<V, F>(self, name: &str, f: F) -> Self
    where
        V: Describe + 'static,
        F: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
    {
        let acc = accessor(move |obj: &dyn Any| match obj.downcast_ref::<T>() {
            Some(t) => f(t).to_value(),
            None => Value::Null,
        });
        self.push(name, MemberKind::Field, V::resolved(), acc)
    }

    /// Zero-argument method computing an owned result.
    #[must_use]
    pub fn method<R, F>(self, name: &str, f: F) -> Self
    where
        R: Describe + IntoValue,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let acc = accessor(move |obj: &dyn Any| match obj.downcast_ref::<T>() {
            Some(t) => f(t).into_value(),
            None => Value::Null,
        });
        self.push(name, MemberKind::Method, R::resolved(), acc)
    }

    /// Zero-argument method returning a borrow of the record.
    #[must_use]
    pub fn method_ref<R, F>(self, name: &str, f: F) -> Self
    where
        R: Describe + 'static,
        F: for<'a> Fn(&'a T) -> &'a R + Send + Sync + 'static,
    {
        let acc = accessor(move |obj: &dyn Any| match obj.downcast_ref::<T>() {
            Some(t) => f(t).to_value(),
            None => Value::Null,
        });
        self.push(name, MemberKind::Method, R::resolved(), acc)
    }

    /// Mark the most recently added member as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        if let Some(last) = self.members.last_mut() {
            last.resolved = last.resolved.clone().nullable();
        }
        self
    }

    fn build(self) -> Result<Shape, SchemaError> {
        let mut fields = FxHashMap::default();
        let mut methods = FxHashMap::default();
        for (i, m) in self.members.iter().enumerate() {
            let table = match m.kind {
                MemberKind::Field => &mut fields,
                MemberKind::Method => &mut methods,
            };
            if table.insert(m.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateMember {
                    record: T::NAME,
                    member: m.name.clone(),
                });
            }
        }
        Ok(Shape {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            members: self.members,
            fields,
            methods,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("record name `{name}` is already registered for another type")]
    DuplicateName { name: &'static str },

    #[error("record `{record}` declares `{member}` twice")]
    DuplicateMember { record: &'static str, member: String },
}

/// All registered record shapes, by name and by Rust type.
///
/// Filled once at start-up and read-only afterwards.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    by_name: FxHashMap<&'static str, Arc<Shape>>,
    by_type: FxHashMap<TypeId, &'static str>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`. Registering the same type again is a no-op.
    pub fn register<T: Record>(&mut self) -> Result<&mut Self, SchemaError> {
        if let Some(existing) = self.by_name.get(T::NAME) {
            if existing.type_id == TypeId::of::<T>() {
                return Ok(self);
            }
            return Err(SchemaError::DuplicateName { name: T::NAME });
        }
        let shape = T::describe(ShapeBuilder::new()).build()?;
        self.by_type.insert(shape.type_id, T::NAME);
        self.by_name.insert(T::NAME, Arc::new(shape));
        Ok(self)
    }

    pub fn shape(&self, name: &str) -> Option<&Arc<Shape>> {
        self.by_name.get(name)
    }

    pub fn shape_of<T: Any>(&self) -> Option<&Arc<Shape>> {
        self.by_type.get(&TypeId::of::<T>()).and_then(|name| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Hash of every registered name, member and type.
    ///
    /// Artifacts compiled against a different schema are not reused.
    pub fn fingerprint(&self) -> u64 {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        let mut hasher = FxHasher::default();
        for name in names {
            if let Some(shape) = self.by_name.get(name) {
                shape.hash_into(&mut hasher);
            }
        }
        hasher.finish()
    }
}
