//! Error infrastructure for rts-core.
//!
//! Configuration problems (broken templates, missing initializers) surface as
//! [`AssemblyError`] at load or assembly time and never reach a running
//! simulation. Stale references are not errors at all: a [`Target`](crate::Target)
//! that no longer resolves simply means "no target".
//!
//! Every error enum implements [`GameError`] so callers can classify failures
//! without matching on individual variants.

use crate::capability::Capability;
use crate::lifecycle::Lifecycle;
use crate::types::{ActorId, PlayerId};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may retry or pick another action
/// - **Validation**: bad input, reject without retry
/// - **Internal**: inconsistent use of the mechanism, indicates a bug
/// - **Fatal**: the ruleset or actor composition is broken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a bug or broken content.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all rts-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Failure to build a template or assemble an actor from one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("actor `{actor}`: trait `{declaration}` requires {capability}, which no earlier trait provides")]
    DependencyUnsatisfied {
        actor: String,
        declaration: String,
        capability: Capability,
    },

    #[error("actor `{actor}`: trait `{declaration}` provides {capability}, already provided by `{existing}`")]
    DuplicateUnique {
        actor: String,
        declaration: String,
        existing: String,
        capability: Capability,
    },

    #[error("actor `{actor}`: trait `{declaration}` requires initializer `{key}`")]
    MissingInitializer {
        actor: String,
        declaration: String,
        key: String,
    },

    #[error("actor `{actor}`: initializer `{key}` for trait `{declaration}` must be {expected}")]
    InvalidInitializer {
        actor: String,
        declaration: String,
        key: String,
        expected: &'static str,
    },

    #[error("actor `{actor}`: trait `{declaration}` reads initializer `{key}` without declaring it")]
    UndeclaredInitializer {
        actor: String,
        declaration: String,
        key: String,
    },

    #[error("actor `{actor}`: trait `{declaration}` declares {capability} but its instance does not implement it")]
    CapabilityMismatch {
        actor: String,
        declaration: String,
        capability: Capability,
    },

    #[error("actor `{actor}`: duplicate trait id `{declaration}`")]
    DuplicateDeclaration { actor: String, declaration: String },

    #[error("unknown actor type `{0}`")]
    UnknownActorType(String),
}

impl GameError for AssemblyError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownActorType(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DependencyUnsatisfied { .. } => "ASSEMBLY_DEPENDENCY_UNSATISFIED",
            Self::DuplicateUnique { .. } => "ASSEMBLY_DUPLICATE_UNIQUE",
            Self::MissingInitializer { .. } => "ASSEMBLY_MISSING_INITIALIZER",
            Self::InvalidInitializer { .. } => "ASSEMBLY_INVALID_INITIALIZER",
            Self::UndeclaredInitializer { .. } => "ASSEMBLY_UNDECLARED_INITIALIZER",
            Self::CapabilityMismatch { .. } => "ASSEMBLY_CAPABILITY_MISMATCH",
            Self::DuplicateDeclaration { .. } => "ASSEMBLY_DUPLICATE_DECLARATION",
            Self::UnknownActorType(_) => "ASSEMBLY_UNKNOWN_ACTOR_TYPE",
        }
    }
}

/// A mandatory single-provider lookup found zero or several providers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("actor {actor} has {found} providers of {capability}, expected exactly one")]
pub struct MissingTraitError {
    pub actor: ActorId,
    pub capability: Capability,
    pub found: usize,
}

impl GameError for MissingTraitError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        "MISSING_TRAIT"
    }
}

/// Errors returned by explicit [`World`](crate::World) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    MissingTrait(#[from] MissingTraitError),

    #[error("actor {0} does not exist")]
    UnknownActor(ActorId),

    #[error("actor {actor} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        actor: ActorId,
        from: Lifecycle,
        to: Lifecycle,
    },

    #[error("player {0} does not exist")]
    UnknownPlayer(PlayerId),

    #[error("player table is full ({0} players)")]
    TooManyPlayers(usize),
}

impl GameError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Assembly(e) => e.severity(),
            Self::MissingTrait(e) => e.severity(),
            Self::UnknownActor(_) | Self::UnknownPlayer(_) | Self::TooManyPlayers(_) => {
                ErrorSeverity::Validation
            }
            Self::InvalidTransition { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Assembly(e) => e.error_code(),
            Self::MissingTrait(e) => e.error_code(),
            Self::UnknownActor(_) => "WORLD_UNKNOWN_ACTOR",
            Self::InvalidTransition { .. } => "WORLD_INVALID_TRANSITION",
            Self::UnknownPlayer(_) => "WORLD_UNKNOWN_PLAYER",
            Self::TooManyPlayers(_) => "WORLD_TOO_MANY_PLAYERS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_errors_are_fatal_except_unknown_types() {
        let err = AssemblyError::MissingInitializer {
            actor: "tank".into(),
            declaration: "Facing".into(),
            key: "facing".into(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(
            AssemblyError::UnknownActorType("x".into()).severity(),
            ErrorSeverity::Validation
        );
    }

    #[test]
    fn world_error_delegates_classification() {
        let err = WorldError::from(MissingTraitError {
            actor: ActorId(3),
            capability: Capability::Health,
            found: 0,
        });
        assert_eq!(err.error_code(), "MISSING_TRAIT");
        assert!(err.severity().is_internal());
        assert_eq!(
            err.to_string(),
            "actor #3 has 0 providers of Health, expected exactly one"
        );
    }
}
