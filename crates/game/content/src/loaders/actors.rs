//! Actor catalog loader.
//!
//! Loads actor templates from RON catalogs into a validated [`Ruleset`].
//!
//! # Catalog format
//!
//! ```ron
//! {
//!     "^vehicle": (
//!         traits: [
//!             (kind: "Health", params: (hp: 200)),
//!             (kind: "Mobile", params: (speed: 512)),
//!         ],
//!     ),
//!     "jeep": (
//!         inherits: ["^vehicle"],
//!         traits: [
//!             (kind: "Multiplier", id: Some("armor"), params: (axis: Damage, percent: 80)),
//!         ],
//!     ),
//! }
//! ```
//!
//! Names starting with `^` are abstract: they can be inherited but are never
//! instantiated. A trait's id defaults to its kind. Inherited traits come
//! first, in parent order; an own trait whose id matches an inherited one
//! replaces it in place, and `removes` drops inherited ids.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use ron::value::RawValue;
use rts_core::{ActorTemplate, Ruleset, TraitDeclaration};
use serde::Deserialize;
use tracing::debug;

use crate::loaders::{LoadResult, TraitFactory, read_file, ron_options};

/// Prefix of actor names that only serve as inheritance parents.
pub const ABSTRACT_PREFIX: char = '^';

const EMPTY_PARAMS: &str = "()";

#[derive(Debug, Deserialize)]
struct ActorEntry {
    #[serde(default)]
    inherits: Vec<String>,
    #[serde(default)]
    removes: Vec<String>,
    #[serde(default)]
    traits: Vec<TraitEntry>,
}

#[derive(Debug, Deserialize)]
struct TraitEntry {
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    params: Option<Box<RawValue>>,
}

/// A trait entry after inheritance, still in source form.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ResolvedTrait {
    id: String,
    kind: String,
    params: String,
}

type Catalog = BTreeMap<String, ActorEntry>;

/// Loader for actor catalogs.
pub struct RulesetLoader;

impl RulesetLoader {
    /// Load a ruleset from a single RON catalog.
    pub fn load(path: &Path, factory: &TraitFactory) -> LoadResult<Ruleset> {
        Self::load_all(&[path], factory)
    }

    /// Load one ruleset from several catalogs. Inheritance may cross files;
    /// an actor name may only be defined once.
    pub fn load_all<P: AsRef<Path>>(paths: &[P], factory: &TraitFactory) -> LoadResult<Ruleset> {
        let mut catalog = Catalog::new();
        for path in paths {
            let path = path.as_ref();
            let content = read_file(path)?;
            let entries = parse_catalog(&content)
                .with_context(|| format!("Failed to parse actor catalog {}", path.display()))?;
            for (name, entry) in entries {
                if catalog.contains_key(&name) {
                    anyhow::bail!("Actor `{}` redefined in {}", name, path.display());
                }
                catalog.insert(name, entry);
            }
        }
        build_ruleset(&catalog, factory)
    }

    /// Load a ruleset from catalog text.
    pub fn parse(content: &str, factory: &TraitFactory) -> LoadResult<Ruleset> {
        let catalog = parse_catalog(content).context("Failed to parse actor catalog")?;
        build_ruleset(&catalog, factory)
    }
}

fn parse_catalog(content: &str) -> LoadResult<Catalog> {
    ron_options()
        .from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid actor catalog RON: {}", e))
}

fn build_ruleset(catalog: &Catalog, factory: &TraitFactory) -> LoadResult<Ruleset> {
    let mut resolved = BTreeMap::new();
    let mut ruleset = Ruleset::new();

    for name in catalog.keys() {
        let traits = resolve(name, catalog, &mut resolved, &mut Vec::new())?;
        if name.starts_with(ABSTRACT_PREFIX) {
            continue;
        }

        let mut template = ActorTemplate::new(name.as_str());
        for t in traits {
            let info = factory
                .build(&t.kind, &t.params)
                .with_context(|| format!("Actor `{}`: trait `{}` ({})", name, t.id, t.kind))?;
            template.push(TraitDeclaration::new(t.id, info));
        }
        ruleset
            .insert(template)
            .with_context(|| format!("Actor `{}` failed validation", name))?;
    }

    debug!(
        target: "rts_content::loaders",
        entries = catalog.len(),
        actors = ruleset.len(),
        "ruleset loaded"
    );
    Ok(ruleset)
}

/// Flattens the inheritance chain of `name`. Results are memoized in `done`;
/// `stack` holds the names currently being resolved.
fn resolve(
    name: &str,
    catalog: &Catalog,
    done: &mut BTreeMap<String, Vec<ResolvedTrait>>,
    stack: &mut Vec<String>,
) -> LoadResult<Vec<ResolvedTrait>> {
    if let Some(traits) = done.get(name) {
        return Ok(traits.clone());
    }
    if stack.iter().any(|n| n == name) {
        anyhow::bail!("Inheritance cycle: {} -> {}", stack.join(" -> "), name);
    }
    let entry = catalog.get(name).ok_or_else(|| match stack.last() {
        Some(child) => anyhow::anyhow!("Actor `{}` inherits unknown actor `{}`", child, name),
        None => anyhow::anyhow!("Unknown actor `{}`", name),
    })?;

    stack.push(name.to_string());
    let mut traits: Vec<ResolvedTrait> = Vec::new();
    for parent in &entry.inherits {
        for t in resolve(parent, catalog, done, stack)? {
            upsert(&mut traits, t);
        }
    }
    stack.pop();

    for id in &entry.removes {
        let Some(index) = traits.iter().position(|t| t.id == *id) else {
            anyhow::bail!("Actor `{}` removes `{}`, which it does not inherit", name, id);
        };
        traits.remove(index);
    }

    let mut own_ids = BTreeSet::new();
    for t in &entry.traits {
        let id = t.id.clone().unwrap_or_else(|| t.kind.clone());
        if !own_ids.insert(id.clone()) {
            anyhow::bail!("Actor `{}` declares trait `{}` twice", name, id);
        }
        let params = t
            .params
            .as_ref()
            .map_or(EMPTY_PARAMS, |raw| raw.get_ron())
            .to_string();
        upsert(
            &mut traits,
            ResolvedTrait {
                id,
                kind: t.kind.clone(),
                params,
            },
        );
    }

    done.insert(name.to_string(), traits.clone());
    Ok(traits)
}

fn upsert(traits: &mut Vec<ResolvedTrait>, t: ResolvedTrait) {
    match traits.iter_mut().find(|existing| existing.id == t.id) {
        Some(existing) => *existing = t,
        None => traits.push(t),
    }
}
