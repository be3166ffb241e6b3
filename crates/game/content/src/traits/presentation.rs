//! Rendering, UI projection and visibility traits.
use rts_core::contract::Targetable;
use rts_core::render::{
    DefaultVisibility, Pips, Render, RenderModifier, Tooltip, VisibilityModifier,
};
use rts_core::{
    ActorInitializer, ActorTrait, ActorView, AssemblyError, Capability, Conditional,
    ConditionalInfo, DamageState, PipType, PlayerId, Renderable, Stance, TraitInfo, Upgradable,
};

// ---------------------------------------------------------------------------
// Tooltip
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct TooltipInfo {
    pub name: String,
    /// Shown instead of `name` to viewers in `generic_visibility`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub generic_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default = "Stance::empty"))]
    pub generic_visibility: Stance,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub show_owner_row: bool,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

impl TooltipInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            generic_name: None,
            generic_visibility: Stance::empty(),
            show_owner_row: true,
        }
    }
}

impl TraitInfo for TooltipInfo {
    fn kind(&self) -> &'static str {
        "Tooltip"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Tooltip]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(TooltipTrait {
            info: self.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct TooltipTrait {
    info: TooltipInfo,
}

impl Tooltip for TooltipTrait {
    fn tooltip_name(&self, stance: Stance) -> String {
        match &self.info.generic_name {
            Some(generic) if self.info.generic_visibility.has_stance(stance) => generic.clone(),
            _ => self.info.name.clone(),
        }
    }

    fn is_owner_row_visible(&self) -> bool {
        self.info.show_owner_row
    }
}

impl ActorTrait for TooltipTrait {
    fn as_tooltip(&self) -> Option<&dyn Tooltip> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Targetable
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetableInfo {
    pub target_types: Vec<String>,
    pub requires_force_fire: bool,
    pub conditional: ConditionalInfo,
}

impl TargetableInfo {
    pub fn new(target_types: &[&str]) -> Self {
        Self {
            target_types: target_types.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl TraitInfo for TargetableInfo {
    fn kind(&self) -> &'static str {
        "Targetable"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Targetable, Capability::Upgradable]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(TargetableTrait {
            target_types: self.target_types.clone(),
            requires_force_fire: self.requires_force_fire,
            conditional: Conditional::new(self.conditional.clone()),
        }))
    }
}

#[derive(Debug)]
pub struct TargetableTrait {
    target_types: Vec<String>,
    requires_force_fire: bool,
    conditional: Conditional,
}

impl Targetable for TargetableTrait {
    fn target_types(&self) -> &[String] {
        &self.target_types
    }

    fn requires_force_fire(&self) -> bool {
        self.requires_force_fire
    }
}

impl Upgradable for TargetableTrait {
    fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        &mut self.conditional
    }
}

impl ActorTrait for TargetableTrait {
    fn as_targetable(&self) -> Option<&dyn Targetable> {
        Some(self)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Sprites
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderSpritesInfo {
    /// Defaults to the actor type name.
    pub image: Option<String>,
    pub sequence: String,
    pub palette: String,
    pub z_offset: i32,
}

impl Default for RenderSpritesInfo {
    fn default() -> Self {
        Self {
            image: None,
            sequence: "idle".to_string(),
            palette: "player".to_string(),
            z_offset: 0,
        }
    }
}

impl TraitInfo for RenderSpritesInfo {
    fn kind(&self) -> &'static str {
        "RenderSprites"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Render]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(RenderSpritesTrait {
            image: self
                .image
                .clone()
                .unwrap_or_else(|| init.actor_type().to_string()),
            sequence: self.sequence.clone(),
            palette: self.palette.clone(),
            z_offset: self.z_offset,
        }))
    }
}

#[derive(Debug)]
pub struct RenderSpritesTrait {
    image: String,
    sequence: String,
    palette: String,
    z_offset: i32,
}

impl Render for RenderSpritesTrait {
    fn render(&self, actor: &ActorView<'_>) -> Vec<Renderable> {
        let Some(pos) = actor.center_position() else {
            return Vec::new();
        };
        let mut sprite = Renderable::new(&self.image, &self.sequence, &self.palette, pos);
        sprite.z_offset = self.z_offset;
        vec![sprite]
    }
}

impl ActorTrait for RenderSpritesTrait {
    fn as_render(&self) -> Option<&dyn Render> {
        Some(self)
    }
}

/// Swaps the palette of every renderable once the actor is damaged enough.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamagedPaletteInfo {
    pub palette: String,
    pub min_damage_state: DamageState,
}

impl Default for DamagedPaletteInfo {
    fn default() -> Self {
        Self {
            palette: "damaged".to_string(),
            min_damage_state: DamageState::Heavy,
        }
    }
}

impl TraitInfo for DamagedPaletteInfo {
    fn kind(&self) -> &'static str {
        "DamagedPalette"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::RenderModifier]
    }

    fn requires(&self) -> &[Capability] {
        &[Capability::Health]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(DamagedPaletteTrait {
            info: self.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct DamagedPaletteTrait {
    info: DamagedPaletteInfo,
}

impl RenderModifier for DamagedPaletteTrait {
    fn modify_render(
        &self,
        actor: &ActorView<'_>,
        mut renderables: Vec<Renderable>,
    ) -> Vec<Renderable> {
        let damaged = actor
            .health()
            .is_some_and(|h| h.damage_state() >= self.info.min_damage_state);
        if damaged {
            for r in &mut renderables {
                r.palette.clone_from(&self.info.palette);
            }
        }
        renderables
    }
}

impl ActorTrait for DamagedPaletteTrait {
    fn as_render_modifier(&self) -> Option<&dyn RenderModifier> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Pips
// ---------------------------------------------------------------------------

/// A row of pips coloured by remaining health.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealthPipsInfo {
    pub count: u32,
}

impl Default for HealthPipsInfo {
    fn default() -> Self {
        Self { count: 5 }
    }
}

impl TraitInfo for HealthPipsInfo {
    fn kind(&self) -> &'static str {
        "HealthPips"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Pips]
    }

    fn requires(&self) -> &[Capability] {
        &[Capability::Health]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(HealthPipsTrait { count: self.count }))
    }
}

#[derive(Debug)]
pub struct HealthPipsTrait {
    count: u32,
}

impl Pips for HealthPipsTrait {
    fn pips(&self, actor: &ActorView<'_>) -> Vec<PipType> {
        let Some(health) = actor.health() else {
            return Vec::new();
        };
        let max = health.max_hp().max(1) as u64;
        let lit = (health.hp().max(0) as u64 * self.count as u64).div_ceil(max) as u32;
        let colour = match health.damage_state() {
            DamageState::Undamaged | DamageState::Light => PipType::Green,
            DamageState::Medium | DamageState::Heavy => PipType::Yellow,
            DamageState::Critical | DamageState::Dead => PipType::Red,
        };
        (0..self.count)
            .map(|i| if i < lit { colour } else { PipType::Transparent })
            .collect()
    }
}

impl ActorTrait for HealthPipsTrait {
    fn as_pips(&self) -> Option<&dyn Pips> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Visible to viewers the owner holds a stance in `visible_to` toward.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StanceVisibilityInfo {
    pub visible_to: Stance,
}

impl Default for StanceVisibilityInfo {
    fn default() -> Self {
        Self {
            visible_to: Stance::all(),
        }
    }
}

impl TraitInfo for StanceVisibilityInfo {
    fn kind(&self) -> &'static str {
        "StanceVisibility"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::DefaultVisibility]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(StanceVisibilityTrait {
            visible_to: self.visible_to,
        }))
    }
}

#[derive(Debug)]
pub struct StanceVisibilityTrait {
    visible_to: Stance,
}

impl DefaultVisibility for StanceVisibilityTrait {
    fn is_visible(&self, actor: &ActorView<'_>, viewer: PlayerId) -> bool {
        self.visible_to.has_stance(actor.stance_toward(viewer))
    }
}

impl ActorTrait for StanceVisibilityTrait {
    fn as_default_visibility(&self) -> Option<&dyn DefaultVisibility> {
        Some(self)
    }
}

/// Hides the actor from non-allied viewers while enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CloakInfo {
    pub conditional: ConditionalInfo,
}

impl TraitInfo for CloakInfo {
    fn kind(&self) -> &'static str {
        "Cloak"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::VisibilityModifier, Capability::Upgradable]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(CloakTrait {
            conditional: Conditional::new(self.conditional.clone()),
        }))
    }
}

#[derive(Debug)]
pub struct CloakTrait {
    conditional: Conditional,
}

impl VisibilityModifier for CloakTrait {
    // Visibility queries ignore upgrade state, so the cloak checks its own.
    fn is_visible(&self, actor: &ActorView<'_>, viewer: PlayerId) -> bool {
        self.conditional.is_disabled() || actor.stance_toward(viewer).has_stance(Stance::ALLY)
    }
}

impl Upgradable for CloakTrait {
    fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        &mut self.conditional
    }
}

impl ActorTrait for CloakTrait {
    fn as_visibility_modifier(&self) -> Option<&dyn VisibilityModifier> {
        Some(self)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        Some(self)
    }
}
