//! Read-only projections consumed by renderers and UI.
//!
//! Everything here is computed from `&World` and returned as owned values,
//! so a frame's snapshot can be handed to another thread between ticks.
use crate::health::DamageState;
use crate::player::Stance;
use crate::types::{ActorId, PlayerId, Tick, WorldPos, WorldVec};
use crate::world::ActorView;

/// A sprite draw request. Asset playback itself is the renderer's concern.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Renderable {
    pub image: String,
    pub sequence: String,
    pub palette: String,
    pub pos: WorldPos,
    pub offset: WorldVec,
    pub z_offset: i32,
}

impl Renderable {
    pub fn new(image: &str, sequence: &str, palette: &str, pos: WorldPos) -> Self {
        Self {
            image: image.to_string(),
            sequence: sequence.to_string(),
            palette: palette.to_string(),
            pos,
            offset: WorldVec::ZERO,
            z_offset: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipType {
    Transparent,
    Green,
    Yellow,
    Red,
    Gray,
    Blue,
    Ammo,
    AmmoEmpty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagType {
    Fake,
    Primary,
}

pub trait Render {
    fn render(&self, actor: &ActorView<'_>) -> Vec<Renderable>;
}

/// Post-processes the renderables of every [`Render`] provider, in
/// registry order.
pub trait RenderModifier {
    fn modify_render(&self, actor: &ActorView<'_>, renderables: Vec<Renderable>)
    -> Vec<Renderable>;
}

pub trait Pips {
    fn pips(&self, actor: &ActorView<'_>) -> Vec<PipType>;
}

pub trait Tags {
    fn tags(&self, actor: &ActorView<'_>) -> Vec<TagType>;
}

pub trait Tooltip {
    /// Name shown to a viewer the owner holds `stance` toward.
    fn tooltip_name(&self, stance: Stance) -> String;

    fn is_owner_row_visible(&self) -> bool {
        true
    }
}

pub trait DefaultVisibility {
    fn is_visible(&self, actor: &ActorView<'_>, viewer: PlayerId) -> bool;
}

/// Extra veto on visibility; every modifier must agree.
pub trait VisibilityModifier {
    fn is_visible(&self, actor: &ActorView<'_>, viewer: PlayerId) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthProjection {
    pub hp: i32,
    pub max_hp: i32,
    pub display_hp: i32,
    pub damage_state: DamageState,
}

/// Per-actor UI data as seen by one viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorProjection {
    pub id: ActorId,
    pub actor_type: String,
    /// Owner as presented to the viewer (disguises applied).
    pub owner: PlayerId,
    pub health: Option<HealthProjection>,
    pub pips: Vec<PipType>,
    pub tags: Vec<TagType>,
    pub tooltip: Option<String>,
    pub show_owner: bool,
    pub position: Option<WorldPos>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderSnapshot {
    pub tick: Tick,
    pub viewer: PlayerId,
    pub renderables: Vec<Renderable>,
    pub actors: Vec<ActorProjection>,
}
