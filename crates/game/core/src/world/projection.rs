use crate::capability::Capability;
use crate::render::{
    ActorProjection, HealthProjection, PipType, RenderSnapshot, Renderable, TagType,
};
use crate::types::{ActorId, PlayerId};
use crate::world::{ActorView, World};

impl World {
    /// Renderables of every `Render` provider in registry order, passed
    /// through each `RenderModifier` in registry order.
    pub fn render_actor(&self, id: ActorId) -> Vec<Renderable> {
        let Some(actor) = self.view().actor(id) else {
            return Vec::new();
        };
        render(&actor)
    }

    /// Unique `DefaultVisibility` (absent means visible) and every
    /// `VisibilityModifier`. Upgrade state is ignored here.
    pub fn is_visible_to(&self, id: ActorId, viewer: PlayerId) -> bool {
        self.view()
            .actor(id)
            .is_some_and(|actor| is_visible(&actor, viewer))
    }

    pub fn project_actor(&self, id: ActorId, viewer: PlayerId) -> Option<ActorProjection> {
        let actor = self.view().actor(id)?;
        Some(project(&actor, viewer))
    }

    /// Everything `viewer` can currently see, in actor id order. The world
    /// actor is never part of a snapshot.
    pub fn snapshot(&self, viewer: PlayerId) -> RenderSnapshot {
        let view = self.view();
        let visible: Vec<ActorView<'_>> = view
            .actors()
            .filter(|actor| actor.id() != self.world_actor && is_visible(actor, viewer))
            .collect();
        RenderSnapshot {
            tick: self.tick,
            viewer,
            renderables: visible.iter().flat_map(render).collect(),
            actors: visible.iter().map(|actor| project(actor, viewer)).collect(),
        }
    }
}

fn render(actor: &ActorView<'_>) -> Vec<Renderable> {
    let store = actor.traits();
    let renderables: Vec<Renderable> = store
        .query(Capability::Render, |t| t.as_render())
        .flat_map(|(_, r)| r.render(actor))
        .collect();
    store
        .query(Capability::RenderModifier, |t| t.as_render_modifier())
        .fold(renderables, |acc, (_, m)| m.modify_render(actor, acc))
}

fn is_visible(actor: &ActorView<'_>, viewer: PlayerId) -> bool {
    let store = actor.traits();
    let default = store
        .unique(Capability::DefaultVisibility, |t| t.as_default_visibility())
        .is_none_or(|v| v.is_visible(actor, viewer));
    default
        && store
            .query(Capability::VisibilityModifier, |t| t.as_visibility_modifier())
            .all(|(_, v)| v.is_visible(actor, viewer))
}

fn project(actor: &ActorView<'_>, viewer: PlayerId) -> ActorProjection {
    let store = actor.traits();
    let owner = actor.effective_owner();
    let stance = actor.world().stance(owner, viewer);

    let health = actor.health().map(|h| HealthProjection {
        hp: h.hp(),
        max_hp: h.max_hp(),
        display_hp: h.display_hp(),
        damage_state: h.damage_state(),
    });
    let pips: Vec<PipType> = store
        .query_enabled(Capability::Pips, |t| t.as_pips())
        .flat_map(|(_, p)| p.pips(actor))
        .collect();
    let tags: Vec<TagType> = store
        .query_enabled(Capability::Tags, |t| t.as_tags())
        .flat_map(|(_, t)| t.tags(actor))
        .collect();
    let tooltip = store
        .query_enabled(Capability::Tooltip, |t| t.as_tooltip())
        .next()
        .map(|(_, t)| (t.tooltip_name(stance), t.is_owner_row_visible()));

    ActorProjection {
        id: actor.id(),
        actor_type: actor.actor_type().to_string(),
        owner,
        health,
        pips,
        tags,
        show_owner: tooltip.as_ref().is_some_and(|(_, visible)| *visible),
        tooltip: tooltip.map(|(name, _)| name),
        position: actor.center_position(),
    }
}
