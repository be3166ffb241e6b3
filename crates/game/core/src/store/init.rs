//! Initializer values supplied when an actor is created.
//!
//! Values are keyed by name and read by the traits that declared the key in
//! [`TraitInfo::uses_inits`](super::TraitInfo::uses_inits). Whether an absent
//! key falls back to a default or fails assembly is each trait's decision.
use std::collections::BTreeMap;

use crate::error::AssemblyError;
use crate::store::TraitDeclaration;
use crate::types::{ActorId, CellPos, PlayerId, WorldPos};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Cell(CellPos),
    Position(WorldPos),
    Player(PlayerId),
}

impl From<i32> for InitValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for InitValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for InitValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for InitValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<CellPos> for InitValue {
    fn from(value: CellPos) -> Self {
        Self::Cell(value)
    }
}

impl From<WorldPos> for InitValue {
    fn from(value: WorldPos) -> Self {
        Self::Position(value)
    }
}

impl From<PlayerId> for InitValue {
    fn from(value: PlayerId) -> Self {
        Self::Player(value)
    }
}

/// Conversion out of an [`InitValue`] for typed getters.
pub trait FromInitValue: Sized {
    const EXPECTED: &'static str;
    fn from_init(value: &InitValue) -> Option<Self>;
}

impl FromInitValue for i64 {
    const EXPECTED: &'static str = "an integer";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromInitValue for i32 {
    const EXPECTED: &'static str = "a 32-bit integer";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromInitValue for bool {
    const EXPECTED: &'static str = "a boolean";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromInitValue for String {
    const EXPECTED: &'static str = "a string";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromInitValue for CellPos {
    const EXPECTED: &'static str = "a cell";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Cell(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromInitValue for WorldPos {
    const EXPECTED: &'static str = "a world position";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Position(v) => Some(*v),
            InitValue::Cell(c) => Some(c.center()),
            _ => None,
        }
    }
}

impl FromInitValue for PlayerId {
    const EXPECTED: &'static str = "a player";
    fn from_init(value: &InitValue) -> Option<Self> {
        match value {
            InitValue::Player(v) => Some(*v),
            _ => None,
        }
    }
}

/// Named initializer values for one actor creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InitValues(BTreeMap<String, InitValue>);

impl InitValues {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<InitValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<InitValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&InitValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Read access to initializer values for one trait under construction.
pub struct ActorInitializer<'a> {
    actor_type: &'a str,
    declaration: &'a TraitDeclaration,
    values: &'a InitValues,
    actor: ActorId,
    owner: PlayerId,
}

impl<'a> ActorInitializer<'a> {
    pub(crate) fn new(
        actor_type: &'a str,
        declaration: &'a TraitDeclaration,
        values: &'a InitValues,
        actor: ActorId,
        owner: PlayerId,
    ) -> Self {
        Self {
            actor_type,
            declaration,
            values,
            actor,
            owner,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn actor_type(&self) -> &str {
        self.actor_type
    }

    pub fn contains(&self, key: &str) -> bool {
        self.is_declared(key) && self.values.contains(key)
    }

    /// Value for `key` if supplied.
    pub fn get<T: FromInitValue>(&self, key: &str) -> Result<Option<T>, AssemblyError> {
        if !self.is_declared(key) {
            return Err(AssemblyError::UndeclaredInitializer {
                actor: self.actor_type.to_string(),
                declaration: self.declaration.id.clone(),
                key: key.to_string(),
            });
        }
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => T::from_init(value).map(Some).ok_or_else(|| {
                AssemblyError::InvalidInitializer {
                    actor: self.actor_type.to_string(),
                    declaration: self.declaration.id.clone(),
                    key: key.to_string(),
                    expected: T::EXPECTED,
                }
            }),
        }
    }

    /// Value for `key`, failing assembly when absent.
    pub fn require<T: FromInitValue>(&self, key: &str) -> Result<T, AssemblyError> {
        self.get(key)?
            .ok_or_else(|| AssemblyError::MissingInitializer {
                actor: self.actor_type.to_string(),
                declaration: self.declaration.id.clone(),
                key: key.to_string(),
            })
    }

    pub fn get_or<T: FromInitValue>(&self, key: &str, default: T) -> Result<T, AssemblyError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn is_declared(&self, key: &str) -> bool {
        self.declaration
            .info
            .uses_inits()
            .iter()
            .any(|declared| *declared == key)
    }
}
