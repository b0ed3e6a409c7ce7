// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Materialization of wire trees into typed domain entities.
//!
//! Every successful API call ends up here: the response body is first
//! normalized into a [`WireNode`] tree (see the [`wire`][crate::wire]
//! module), then handed to a [`Materializer`], which converts it into one of
//! the domain entities of this crate. The conversion is a pure recursive
//! descent driven by two pieces of static data:
//!
//! - the [`Registry`], which maps a wire type tag (`"status"`, `"users"`,
//!   `"direct-message"`, ...) to an [`EntityKind`]; and
//! - a per-kind field schema declaring, for every field an entity may carry,
//!   whether it is text, a number, a boolean flag, or a nested entity.
//!
//! Materialization is strict: an unrecognized tag or a field outside the
//! target schema aborts the whole call rather than producing a partially
//! filled entity that bot logic could act on. Coercion of boolean flags is
//! deliberately lenient instead — the API only ever promises the strings
//! `"true"` and `"false"`, so anything else is kept verbatim as a string
//! (see [`WireBool`]).
//!
//! ```
//! use tweetbot::entity::{Entity, Materializer};
//! use tweetbot::wire::WireNode;
//!
//! let node = WireNode::new("status")
//!     .leaf("id", "42")
//!     .leaf("text", "hello")
//!     .child(WireNode::new("user").leaf("screen_name", "rustlang"));
//!
//! match Materializer::new().materialize(&node).unwrap() {
//!     Entity::Status(tweet) => {
//!         assert_eq!(tweet.id, Some(42));
//!         assert_eq!(tweet.user.unwrap().screen_name.unwrap(), "rustlang");
//!     }
//!     other => panic!("unexpected entity: {:?}", other),
//! }
//! ```

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

use crate::direct::DirectMessage;
use crate::error::{Error, Result};
use crate::tweet::Tweet;
use crate::user::TwitterUser;
use crate::wire::{WireNode, WireValue};

/// The closed set of domain shapes an API response can materialize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A single status update.
    Status,
    /// An ordered sequence of status updates.
    StatusCollection,
    /// A single user profile.
    User,
    /// An ordered sequence of user profiles.
    UserCollection,
    /// A single direct message.
    DirectMessage,
    /// An ordered sequence of direct messages.
    DirectMessageCollection,
}

impl EntityKind {
    /// Whether this kind wraps an ordered sequence of entities.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            EntityKind::StatusCollection
                | EntityKind::UserCollection
                | EntityKind::DirectMessageCollection
        )
    }

    /// The kind of a single element, for collection kinds.
    pub fn element(self) -> Option<EntityKind> {
        match self {
            EntityKind::StatusCollection => Some(EntityKind::Status),
            EntityKind::UserCollection => Some(EntityKind::User),
            EntityKind::DirectMessageCollection => Some(EntityKind::DirectMessage),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EntityKind::Status => "status",
            EntityKind::StatusCollection => "statuses",
            EntityKind::User => "user",
            EntityKind::UserCollection => "users",
            EntityKind::DirectMessage => "direct_message",
            EntityKind::DirectMessageCollection => "direct_messages",
        };
        write!(f, "{}", name)
    }
}

/// The mapping from wire type tags to entity kinds.
///
/// The registry is immutable once constructed and safe to share across
/// threads. [`Registry::default`] covers every tag the Twitter API is known
/// to emit; a custom mapping can be injected through [`Registry::new`], which
/// is mainly useful in tests.
#[derive(Debug, Clone)]
pub struct Registry {
    map: HashMap<String, EntityKind>,
}

impl Registry {
    /// Creates a registry from an explicit tag mapping.
    pub fn new(map: HashMap<String, EntityKind>) -> Self {
        Registry { map }
    }

    /// Resolves a wire tag to an entity kind.
    ///
    /// Matching trims surrounding whitespace and is case-insensitive,
    /// mirroring the casing inconsistencies between API versions. An
    /// unmapped tag is `Error::UnsupportedType`.
    pub fn resolve(&self, tag: &str) -> Result<EntityKind> {
        let normalized = tag.trim().to_ascii_lowercase();
        self.map
            .get(&normalized)
            .copied()
            .ok_or(Error::UnsupportedType(normalized))
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("status".to_string(), EntityKind::Status);
        map.insert("statuses".to_string(), EntityKind::StatusCollection);
        map.insert("user".to_string(), EntityKind::User);
        map.insert("users".to_string(), EntityKind::UserCollection);
        map.insert("direct_message".to_string(), EntityKind::DirectMessage);
        map.insert("direct-message".to_string(), EntityKind::DirectMessage);
        map.insert(
            "direct_messages".to_string(),
            EntityKind::DirectMessageCollection,
        );
        map.insert(
            "direct-messages".to_string(),
            EntityKind::DirectMessageCollection,
        );
        map.insert("sender".to_string(), EntityKind::User);
        map.insert("recipient".to_string(), EntityKind::User);
        Registry { map }
    }
}

/// A boolean flag as reported on the wire.
///
/// The XML-era API spells booleans as the strings `"true"` and `"false"`,
/// but not every response honors that. A flag field therefore keeps anything
/// else verbatim instead of failing the whole materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireBool {
    /// The field carried a recognizable boolean.
    Bool(bool),
    /// The field carried some other marker, preserved as-is.
    Raw(String),
}

impl WireBool {
    /// The boolean value, if the wire value was one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireBool::Bool(value) => Some(*value),
            WireBool::Raw(_) => None,
        }
    }

    /// Whether the field carried a literal `true`.
    pub fn is_true(&self) -> bool {
        self.as_bool() == Some(true)
    }
}

/// Coerces a leaf wire value per the boolean leniency rule: `"true"` and
/// `"false"` (case-insensitive) become booleans, anything else stays a
/// string.
pub(crate) fn coerce_scalar(raw: &str) -> WireBool {
    if raw.eq_ignore_ascii_case("true") {
        WireBool::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        WireBool::Bool(false)
    } else {
        WireBool::Raw(raw.to_string())
    }
}

/// Parses a decimal integer field, failing with `MalformedField` when the
/// raw value is not a valid integer literal.
pub(crate) fn coerce_numeric(field: &'static str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| Error::MalformedField {
        field,
        value: raw.to_string(),
    })
}

/// The declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldType {
    /// An opaque string (timestamps, screen names, HTML snippets, ...).
    Text,
    /// A decimal integer (ids, counts).
    Number,
    /// A boolean flag, with the [`WireBool`] leniency.
    Flag,
    /// A nested entity of the given kind.
    Nested(EntityKind),
}

/// One entry of a per-kind field schema.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) ty: FieldType,
}

impl FieldSpec {
    pub(crate) const fn text(name: &'static str) -> Self {
        FieldSpec {
            name,
            ty: FieldType::Text,
        }
    }

    pub(crate) const fn number(name: &'static str) -> Self {
        FieldSpec {
            name,
            ty: FieldType::Number,
        }
    }

    pub(crate) const fn flag(name: &'static str) -> Self {
        FieldSpec {
            name,
            ty: FieldType::Flag,
        }
    }

    pub(crate) const fn nested(name: &'static str, kind: EntityKind) -> Self {
        FieldSpec {
            name,
            ty: FieldType::Nested(kind),
        }
    }
}

/// A field value coerced against a schema entry, ready to be assigned.
#[derive(Debug)]
pub(crate) enum FieldValue {
    Text(String),
    Number(u64),
    Flag(WireBool),
    Nested(Entity),
}

/// Implemented by the domain entities so one generic routine can build all
/// of them. `assign` receives values already coerced against `SCHEMA`, so
/// the name/variant pairing is guaranteed by the materializer.
pub(crate) trait Materialize: Default {
    const KIND: EntityKind;
    const SCHEMA: &'static [FieldSpec];

    fn assign(&mut self, name: &str, value: FieldValue);

    /// Post-construction validation hook; the default accepts everything.
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// An ordered, homogeneous sequence of materialized entities.
///
/// Element order exactly mirrors the order of the source tree: index 0 is
/// the first element the API delivered, which timelines and search results
/// treat as the most recent or most relevant one. Duplicates are allowed
/// and a collection may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    /// The number of entities stored.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no entities.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The entity at the given index, or `Error::Index` when out of bounds.
    pub fn at(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(Error::Index {
            index,
            len: self.items.len(),
        })
    }

    /// The entity at the given index, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// The first entity, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Iterates over the entities in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection { items: Vec::new() }
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Collection { items }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An ordered sequence of tweets.
pub type TweetCollection = Collection<Tweet>;
/// An ordered sequence of user profiles.
pub type UserCollection = Collection<TwitterUser>;
/// An ordered sequence of direct messages.
pub type DirectMessageCollection = Collection<DirectMessage>;

/// A fully materialized domain entity, as returned by
/// [`Materializer::materialize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A single status update.
    Status(Box<Tweet>),
    /// A timeline or search result.
    Statuses(TweetCollection),
    /// A single user profile.
    User(Box<TwitterUser>),
    /// A list of user profiles.
    Users(UserCollection),
    /// A single direct message.
    DirectMessage(Box<DirectMessage>),
    /// An inbox or outbox of direct messages.
    DirectMessages(DirectMessageCollection),
}

impl Entity {
    /// The kind of this entity.
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Status(_) => EntityKind::Status,
            Entity::Statuses(_) => EntityKind::StatusCollection,
            Entity::User(_) => EntityKind::User,
            Entity::Users(_) => EntityKind::UserCollection,
            Entity::DirectMessage(_) => EntityKind::DirectMessage,
            Entity::DirectMessages(_) => EntityKind::DirectMessageCollection,
        }
    }
}

macro_rules! entity_try_from {
    ($target:ty, $variant:ident, $expect:expr, boxed) => {
        impl TryFrom<Entity> for $target {
            type Error = Error;

            fn try_from(entity: Entity) -> Result<Self> {
                match entity {
                    Entity::$variant(inner) => Ok(*inner),
                    other => Err(Error::InvalidResponse(
                        $expect,
                        Some(other.kind().to_string()),
                    )),
                }
            }
        }
    };
    ($target:ty, $variant:ident, $expect:expr) => {
        impl TryFrom<Entity> for $target {
            type Error = Error;

            fn try_from(entity: Entity) -> Result<Self> {
                match entity {
                    Entity::$variant(inner) => Ok(inner),
                    other => Err(Error::InvalidResponse(
                        $expect,
                        Some(other.kind().to_string()),
                    )),
                }
            }
        }
    };
}

entity_try_from!(Tweet, Status, "expected a status", boxed);
entity_try_from!(TwitterUser, User, "expected a user", boxed);
entity_try_from!(DirectMessage, DirectMessage, "expected a direct message", boxed);
entity_try_from!(TweetCollection, Statuses, "expected a status collection");
entity_try_from!(UserCollection, Users, "expected a user collection");
entity_try_from!(
    DirectMessageCollection,
    DirectMessages,
    "expected a direct message collection"
);

/// Converts normalized wire trees into domain entities.
///
/// A materializer holds nothing but its (read-only) registry, so one
/// instance can serve any number of calls, concurrently if needed. Every
/// call reprocesses its full subtree; entities are never interned or
/// deduplicated by id.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    registry: Registry,
}

impl Materializer {
    /// Creates a materializer with the default tag registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a materializer with an injected registry.
    pub fn with_registry(registry: Registry) -> Self {
        Materializer { registry }
    }

    /// Converts a wire tree into the entity its tag designates.
    ///
    /// Any failure in the descent — an unsupported tag, a field outside the
    /// target schema, a malformed numeric value — aborts the whole call; a
    /// partial entity is never returned.
    pub fn materialize(&self, node: &WireNode) -> Result<Entity> {
        let kind = self.registry.resolve(node.tag())?;
        self.materialize_kind(kind, node)
    }

    fn materialize_kind(&self, kind: EntityKind, node: &WireNode) -> Result<Entity> {
        match kind {
            EntityKind::Status => Ok(Entity::Status(Box::new(self.build::<Tweet>(node)?))),
            EntityKind::StatusCollection => Ok(Entity::Statuses(self.collect::<Tweet>(node)?)),
            EntityKind::User => Ok(Entity::User(Box::new(self.build::<TwitterUser>(node)?))),
            EntityKind::UserCollection => Ok(Entity::Users(self.collect::<TwitterUser>(node)?)),
            EntityKind::DirectMessage => Ok(Entity::DirectMessage(Box::new(
                self.build::<DirectMessage>(node)?,
            ))),
            EntityKind::DirectMessageCollection => {
                Ok(Entity::DirectMessages(self.collect::<DirectMessage>(node)?))
            }
        }
    }

    /// Builds a single entity, walking the node's fields in source order.
    fn build<T: Materialize>(&self, node: &WireNode) -> Result<T> {
        let mut entity = T::default();
        for (name, value) in node.fields() {
            let spec = T::SCHEMA
                .iter()
                .find(|spec| spec.name == name)
                .ok_or_else(|| Error::UnknownField {
                    field: name.to_string(),
                    kind: T::KIND,
                })?;
            let coerced = self.coerce_field(spec, value)?;
            entity.assign(spec.name, coerced);
        }
        entity.finish()?;
        Ok(entity)
    }

    /// Builds a collection, materializing each child sub-node as one element.
    /// An empty source yields an empty collection.
    fn collect<T: Materialize>(&self, node: &WireNode) -> Result<Collection<T>> {
        let mut items = Vec::new();
        for (name, value) in node.fields() {
            match value {
                WireValue::Node(element) => items.push(self.build::<T>(element)?),
                WireValue::Leaf(raw) => {
                    return Err(Error::InvalidResponse(
                        "collection element is not a subtree",
                        Some(format!("{}: {}", name, raw)),
                    ));
                }
            }
        }
        Ok(Collection::from(items))
    }

    fn coerce_field(&self, spec: &FieldSpec, value: &WireValue) -> Result<FieldValue> {
        match (spec.ty, value) {
            (FieldType::Nested(kind), WireValue::Node(sub)) => {
                Ok(FieldValue::Nested(self.materialize_kind(kind, sub)?))
            }
            // A registry-tagged entity field is never coerced as a scalar.
            (FieldType::Nested(_), WireValue::Leaf(raw)) => Err(Error::InvalidResponse(
                "expected a subtree for a nested entity field",
                Some(format!("{}: {}", spec.name, raw)),
            )),
            (FieldType::Text, WireValue::Leaf(raw)) => Ok(FieldValue::Text(raw.clone())),
            (FieldType::Number, WireValue::Leaf(raw)) => {
                Ok(FieldValue::Number(coerce_numeric(spec.name, raw)?))
            }
            (FieldType::Flag, WireValue::Leaf(raw)) => Ok(FieldValue::Flag(coerce_scalar(raw))),
            (_, WireValue::Node(_)) => Err(Error::InvalidResponse(
                "expected a scalar for a leaf field",
                Some(spec.name.to_string()),
            )),
        }
    }
}
