//! Trait instance storage for one actor.
//!
//! [`TraitStore::assemble`] walks a template in declaration order, checks each
//! trait's requirements against what earlier traits actually implement, builds
//! the instance and records it in the [`CapabilityRegistry`]. Once assembled
//! the set of traits and their capabilities never change.
mod init;
mod registry;
mod template;

pub use init::{ActorInitializer, FromInitValue, InitValue, InitValues};
pub use registry::CapabilityRegistry;
pub use template::{ActorTemplate, Ruleset, TraitDeclaration, TraitInfo};

use std::fmt;

use strum::IntoEnumIterator;

use crate::capability::{self, ActorTrait, Capability};
use crate::error::{AssemblyError, MissingTraitError};
use crate::types::{ActorId, PlayerId};

/// Position of a trait in its actor's declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraitIndex(pub usize);

impl fmt::Display for TraitIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One constructed trait with its declaration.
pub struct TraitSlot {
    declaration: TraitDeclaration,
    /// `None` only while the world is running one of this trait's callbacks.
    instance: Option<Box<dyn ActorTrait>>,
    capabilities: Vec<Capability>,
}

impl TraitSlot {
    pub fn declaration(&self) -> &TraitDeclaration {
        &self.declaration
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

impl fmt::Debug for TraitSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitSlot")
            .field("id", &self.declaration.id)
            .field("kind", &self.declaration.info.kind())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[derive(Debug)]
pub struct TraitStore {
    actor: ActorId,
    slots: Vec<TraitSlot>,
    registry: CapabilityRegistry,
}

impl TraitStore {
    /// Builds every trait of `template` in order.
    pub fn assemble(
        template: &ActorTemplate,
        values: &InitValues,
        actor: ActorId,
        owner: PlayerId,
    ) -> Result<Self, AssemblyError> {
        let mut slots: Vec<TraitSlot> = Vec::with_capacity(template.traits().len());
        let mut registry = CapabilityRegistry::new();

        for declaration in template.traits() {
            if let Some(&capability) = declaration
                .info
                .requires()
                .iter()
                .find(|cap| registry.implementers(**cap).is_empty())
            {
                return Err(AssemblyError::DependencyUnsatisfied {
                    actor: template.name().to_string(),
                    declaration: declaration.id.clone(),
                    capability,
                });
            }

            let init =
                ActorInitializer::new(template.name(), declaration, values, actor, owner);
            let mut instance = declaration.info.create(&init)?;

            let capabilities: Vec<Capability> = Capability::iter()
                .filter(|cap| capability::implements(instance.as_mut(), *cap))
                .collect();

            if let Some(&capability) = declaration
                .info
                .provides()
                .iter()
                .find(|cap| !capabilities.contains(*cap))
            {
                return Err(AssemblyError::CapabilityMismatch {
                    actor: template.name().to_string(),
                    declaration: declaration.id.clone(),
                    capability,
                });
            }

            for &capability in capabilities.iter().filter(|cap| cap.is_unique()) {
                if let Some(existing) = registry.first(capability) {
                    return Err(AssemblyError::DuplicateUnique {
                        actor: template.name().to_string(),
                        declaration: declaration.id.clone(),
                        existing: slots[existing.0].declaration.id.clone(),
                        capability,
                    });
                }
            }

            let index = TraitIndex(slots.len());
            for &capability in &capabilities {
                registry.insert(capability, index);
            }
            slots.push(TraitSlot {
                declaration: declaration.clone(),
                instance: Some(instance),
                capabilities,
            });
        }

        Ok(Self {
            actor,
            slots,
            registry,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[TraitSlot] {
        &self.slots
    }

    pub fn slot(&self, index: TraitIndex) -> Option<&TraitSlot> {
        self.slots.get(index.0)
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Index of the declaration with the given id.
    pub fn index_of(&self, id: &str) -> Option<TraitIndex> {
        self.slots
            .iter()
            .position(|slot| slot.declaration.id == id)
            .map(TraitIndex)
    }

    pub fn get(&self, index: TraitIndex) -> Option<&dyn ActorTrait> {
        self.slots.get(index.0)?.instance.as_deref()
    }

    pub fn get_mut(&mut self, index: TraitIndex) -> Option<&mut dyn ActorTrait> {
        let instance: &mut dyn ActorTrait = self.slots.get_mut(index.0)?.instance.as_deref_mut()?;
        Some(instance)
    }

    /// Implementers of `capability` in declaration order.
    pub fn implementers(&self, capability: Capability) -> &[TraitIndex] {
        self.registry.implementers(capability)
    }

    pub fn has(&self, capability: Capability) -> bool {
        !self.implementers(capability).is_empty()
    }

    /// The single provider of `capability`.
    pub fn single(&self, capability: Capability) -> Result<TraitIndex, MissingTraitError> {
        match self.implementers(capability) {
            [index] => Ok(*index),
            other => Err(MissingTraitError {
                actor: self.actor,
                capability,
                found: other.len(),
            }),
        }
    }

    /// The provider of a capability that may be absent. Several providers
    /// are still an error.
    pub fn single_or_none(
        &self,
        capability: Capability,
    ) -> Result<Option<TraitIndex>, MissingTraitError> {
        match self.implementers(capability) {
            [] => Ok(None),
            [index] => Ok(Some(*index)),
            other => Err(MissingTraitError {
                actor: self.actor,
                capability,
                found: other.len(),
            }),
        }
    }

    /// Implementers of `capability` viewed through `access`, in declaration
    /// order. Traits currently running a callback are skipped.
    pub fn query<'a, C, F>(
        &'a self,
        capability: Capability,
        access: F,
    ) -> impl Iterator<Item = (TraitIndex, &'a C)> + 'a
    where
        C: ?Sized + 'a,
        F: Fn(&'a dyn ActorTrait) -> Option<&'a C> + 'a,
    {
        self.implementers(capability).iter().filter_map(move |&index| {
            let instance = self.slots[index.0].instance.as_deref()?;
            access(instance).map(|c| (index, c))
        })
    }

    /// Like [`query`](Self::query) but skips traits whose upgrade conditions
    /// currently disable them.
    pub fn query_enabled<'a, C, F>(
        &'a self,
        capability: Capability,
        access: F,
    ) -> impl Iterator<Item = (TraitIndex, &'a C)> + 'a
    where
        C: ?Sized + 'a,
        F: Fn(&'a dyn ActorTrait) -> Option<&'a C> + 'a,
    {
        self.query(capability, access)
            .filter(move |(index, _)| self.is_enabled(*index))
    }

    /// Instance of `capability` through `access` for a single provider.
    pub fn unique<'a, C, F>(&'a self, capability: Capability, access: F) -> Option<&'a C>
    where
        C: ?Sized + 'a,
        F: Fn(&'a dyn ActorTrait) -> Option<&'a C>,
    {
        let index = self.single(capability).ok()?;
        access(self.get(index)?)
    }

    /// False only for traits that are upgradable and currently disabled.
    pub fn is_enabled(&self, index: TraitIndex) -> bool {
        self.get(index)
            .and_then(|t| t.as_upgradable())
            .is_none_or(|u| u.conditional().is_enabled())
    }

    /// First trait of concrete type `T`.
    pub fn trait_of<T: ActorTrait>(&self) -> Option<&T> {
        self.slots
            .iter()
            .filter_map(|slot| slot.instance.as_deref())
            .find_map(|instance| instance.as_any().downcast_ref::<T>())
    }

    pub fn trait_of_mut<T: ActorTrait>(&mut self) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.instance.as_deref_mut())
            .find_map(|instance| instance.as_any_mut().downcast_mut::<T>())
    }

    pub(crate) fn take(&mut self, index: TraitIndex) -> Option<Box<dyn ActorTrait>> {
        self.slots.get_mut(index.0)?.instance.take()
    }

    pub(crate) fn restore(&mut self, index: TraitIndex, instance: Box<dyn ActorTrait>) {
        if let Some(slot) = self.slots.get_mut(index.0) {
            slot.instance = Some(instance);
        }
    }
}
