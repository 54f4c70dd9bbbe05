//! Association sets between an owning entity and its targets.
//!
//! The set algebra here is pure over the in-memory member list. Callers load a
//! set, apply `replace`/`add`/`remove`, and persist the finished set once.

pub mod keyword;

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use async_trait::async_trait;
use sea_orm::DbErr;
use serde::{Deserialize, Deserializer};

/// A request field that distinguishes "omitted" from "present".
///
/// * field absent        => `NotProvided` (leave untouched)
/// * field = `[]`        => `Provided(vec![])` (clear)
/// * field = `[1, 2]`    => `Provided(vec![1, 2])` (replace)
///
/// Use with `#[serde(default)]` so absent fields fall back to `NotProvided`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    NotProvided,
    Provided(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_provided(&self) -> bool {
        matches!(self, Self::Provided(_))
    }

    pub fn as_ref(&self) -> FieldUpdate<&T> {
        match self {
            Self::NotProvided => FieldUpdate::NotProvided,
            Self::Provided(v) => FieldUpdate::Provided(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            Self::NotProvided => FieldUpdate::NotProvided,
            Self::Provided(v) => FieldUpdate::Provided(f(v)),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::NotProvided => None,
            Self::Provided(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Provided(v),
            None => Self::NotProvided,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(FieldUpdate::Provided)
    }
}

/// A record that can be a member of an association set.
pub trait Associated {
    type Id: Clone + Eq + Hash + Display + Send + Sync;

    fn target_id(&self) -> Self::Id;
}

/// Turns requested IDs into the target records that exist.
///
/// Implementations return whatever subset exists, in any order; unknown IDs
/// are simply absent from the result.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    type Target: Associated + Send;

    /// Target type name used in error messages.
    fn target_name(&self) -> &'static str;

    async fn resolve(
        &self,
        ids: &[<Self::Target as Associated>::Id],
    ) -> Result<Vec<Self::Target>, DbErr>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("{target} not found: {}", .ids.join(", "))]
    Unresolved {
        target: &'static str,
        ids: Vec<String>,
    },
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Ordered, duplicate-free members of one owner's association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationSet<T: Associated> {
    members: Vec<T>,
}

impl<T: Associated> Default for AssociationSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Associated> AssociationSet<T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Build a set from stored members, keeping the first occurrence of each ID.
    pub fn from_members(members: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        set.extend_unique(members);
        set
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn into_members(self) -> Vec<T> {
        self.members
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.members.iter().map(Associated::target_id).collect()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.members.iter().any(|m| &m.target_id() == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Replace the whole set.
    ///
    /// `NotProvided` leaves the set untouched and `Provided([])` clears it.
    /// Otherwise every requested ID must resolve or nothing changes. Returns
    /// whether the set was reassigned and needs saving.
    pub async fn replace<R>(
        &mut self,
        requested: FieldUpdate<Vec<T::Id>>,
        resolver: &R,
    ) -> Result<bool, RelationError>
    where
        R: TargetResolver<Target = T> + ?Sized,
    {
        let FieldUpdate::Provided(ids) = requested else {
            return Ok(false);
        };
        let resolved = resolve_strict(resolver, &ids).await?;
        self.members = resolved;
        Ok(true)
    }

    /// Union with the given IDs.
    ///
    /// Existing members keep their order; newly introduced IDs are appended in
    /// input order. Every ID must resolve, including ones already present.
    pub async fn add<R>(&mut self, ids: &[T::Id], resolver: &R) -> Result<(), RelationError>
    where
        R: TargetResolver<Target = T> + ?Sized,
    {
        let resolved = resolve_strict(resolver, ids).await?;
        self.extend_unique(resolved);
        Ok(())
    }

    /// Drop members whose ID is listed. Unknown IDs are ignored.
    pub fn remove(&mut self, ids: &[T::Id]) {
        let drop: HashSet<&T::Id> = ids.iter().collect();
        self.members.retain(|m| !drop.contains(&m.target_id()));
    }

    fn extend_unique(&mut self, items: impl IntoIterator<Item = T>) {
        let mut seen: HashSet<T::Id> = self.members.iter().map(Associated::target_id).collect();
        for item in items {
            if seen.insert(item.target_id()) {
                self.members.push(item);
            }
        }
    }
}

/// Resolve `ids` in request order, deduplicated, failing on any unknown ID.
async fn resolve_strict<R>(
    resolver: &R,
    ids: &[<R::Target as Associated>::Id],
) -> Result<Vec<R::Target>, RelationError>
where
    R: TargetResolver + ?Sized,
{
    let mut seen = HashSet::new();
    let wanted: Vec<_> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let mut found: HashMap<_, _> = resolver
        .resolve(&wanted)
        .await?
        .into_iter()
        .map(|target| (target.target_id(), target))
        .collect();

    let mut resolved = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for id in wanted {
        match found.remove(&id) {
            Some(target) => resolved.push(target),
            None => missing.push(id.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(RelationError::Unresolved {
            target: resolver.target_name(),
            ids: missing,
        });
    }
    Ok(resolved)
}
