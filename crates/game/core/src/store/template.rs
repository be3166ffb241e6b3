//! Immutable trait templates and the ruleset that holds them.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::capability::{ActorTrait, Capability};
use crate::error::AssemblyError;
use crate::store::ActorInitializer;

/// Static description of a trait: what it provides, what it needs and how to
/// build an instance. Shared by every actor of a type.
pub trait TraitInfo: fmt::Debug + Send + Sync {
    /// Kind name used by loaders and lint output.
    fn kind(&self) -> &'static str;

    /// Capabilities every instance implements. Checked against the instance
    /// at assembly.
    fn provides(&self) -> &[Capability];

    /// Capabilities that must be provided by traits declared earlier.
    fn requires(&self) -> &[Capability] {
        &[]
    }

    /// Initializer keys the trait may read.
    fn uses_inits(&self) -> &[&'static str] {
        &[]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError>;
}

/// One entry of a template: a trait info under a per-template id.
#[derive(Clone, Debug)]
pub struct TraitDeclaration {
    pub id: String,
    pub info: Arc<dyn TraitInfo>,
}

impl TraitDeclaration {
    pub fn new(id: impl Into<String>, info: Arc<dyn TraitInfo>) -> Self {
        Self {
            id: id.into(),
            info,
        }
    }
}

/// Ordered trait declarations for one actor type.
#[derive(Clone, Debug)]
pub struct ActorTemplate {
    name: String,
    traits: Vec<TraitDeclaration>,
}

impl ActorTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            traits: Vec::new(),
        }
    }

    /// Appends a declaration whose id is the info's kind.
    #[must_use]
    pub fn with<I: TraitInfo + 'static>(self, info: I) -> Self {
        let id = info.kind().to_string();
        self.with_named(id, info)
    }

    #[must_use]
    pub fn with_named<I: TraitInfo + 'static>(mut self, id: impl Into<String>, info: I) -> Self {
        self.traits.push(TraitDeclaration::new(id, Arc::new(info)));
        self
    }

    pub fn push(&mut self, declaration: TraitDeclaration) {
        self.traits.push(declaration);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> &[TraitDeclaration] {
        &self.traits
    }

    pub fn declaration(&self, id: &str) -> Option<&TraitDeclaration> {
        self.traits.iter().find(|d| d.id == id)
    }

    /// Static composition check over the declared capability sets:
    /// requirements must be met by earlier declarations, unique capabilities
    /// may be declared once, and ids must be distinct.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let mut provided: BTreeMap<Capability, &str> = BTreeMap::new();
        let mut ids = BTreeSet::new();

        for decl in &self.traits {
            if !ids.insert(decl.id.as_str()) {
                return Err(AssemblyError::DuplicateDeclaration {
                    actor: self.name.clone(),
                    declaration: decl.id.clone(),
                });
            }

            if let Some(&capability) = decl
                .info
                .requires()
                .iter()
                .find(|cap| !provided.contains_key(*cap))
            {
                return Err(AssemblyError::DependencyUnsatisfied {
                    actor: self.name.clone(),
                    declaration: decl.id.clone(),
                    capability,
                });
            }

            for &capability in decl.info.provides() {
                match provided.get(&capability) {
                    Some(existing) if capability.is_unique() => {
                        return Err(AssemblyError::DuplicateUnique {
                            actor: self.name.clone(),
                            declaration: decl.id.clone(),
                            existing: existing.to_string(),
                            capability,
                        });
                    }
                    Some(_) => {}
                    None => {
                        provided.insert(capability, decl.id.as_str());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Validated templates by actor type name.
#[derive(Clone, Debug, Default)]
pub struct Ruleset {
    actors: BTreeMap<String, Arc<ActorTemplate>>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a template, replacing any previous one with the
    /// same name.
    pub fn insert(&mut self, template: ActorTemplate) -> Result<(), AssemblyError> {
        template.validate()?;
        self.actors
            .insert(template.name().to_string(), Arc::new(template));
        Ok(())
    }

    pub fn with(mut self, template: ActorTemplate) -> Result<Self, AssemblyError> {
        self.insert(template)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&Arc<ActorTemplate>, AssemblyError> {
        self.actors
            .get(name)
            .ok_or_else(|| AssemblyError::UnknownActorType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actors.contains_key(name)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Arc<ActorTemplate>> {
        self.actors.values()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
