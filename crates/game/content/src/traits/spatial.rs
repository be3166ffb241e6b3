//! Cell placement: static footprints and movable units.
use rts_core::contract::{OccupySpace, Positionable};
use rts_core::{
    Activity, ActivityState, ActorId, ActorInitializer, ActorTrait, ActorView, AssemblyError,
    CELL_SIZE, Capability, CellPos, IssueOrder, ModifierAxis, Order, OrderTargeter, ResolveOrder,
    SyncHasher, SyncState, Target, TargetModifiers, TraitContext, TraitInfo, WorldPos, WorldVec,
};

use super::LOCATION_INIT;

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Static rectangular footprint anchored at the `location` initializer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildingInfo {
    pub width: i32,
    pub height: i32,
}

impl Default for BuildingInfo {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

impl TraitInfo for BuildingInfo {
    fn kind(&self) -> &'static str {
        "Building"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::OccupySpace]
    }

    fn uses_inits(&self) -> &[&'static str] {
        &[LOCATION_INIT]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(BuildingTrait {
            top_left: init.require(LOCATION_INIT)?,
            width: self.width.max(1),
            height: self.height.max(1),
        }))
    }
}

#[derive(Debug)]
pub struct BuildingTrait {
    top_left: CellPos,
    width: i32,
    height: i32,
}

impl OccupySpace for BuildingTrait {
    fn top_left(&self) -> CellPos {
        self.top_left
    }

    fn center_position(&self) -> WorldPos {
        self.top_left.center()
            + WorldVec::new(
                (self.width - 1) * CELL_SIZE / 2,
                (self.height - 1) * CELL_SIZE / 2,
                0,
            )
    }

    fn occupied_cells(&self) -> Vec<CellPos> {
        (0..self.height)
            .flat_map(|dy| (0..self.width).map(move |dx| self.top_left.offset(dx, dy)))
            .collect()
    }
}

impl ActorTrait for BuildingTrait {
    fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Mobile
// ---------------------------------------------------------------------------

/// Single-cell unit that accepts `Move` and `Stop` orders.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MobileInfo {
    /// World units per tick before speed modifiers.
    pub speed: i32,
    pub move_priority: i32,
}

impl MobileInfo {
    pub const MOVE_ORDER: &'static str = "Move";
    pub const STOP_ORDER: &'static str = "Stop";
}

impl Default for MobileInfo {
    fn default() -> Self {
        Self {
            speed: CELL_SIZE,
            move_priority: 5,
        }
    }
}

impl TraitInfo for MobileInfo {
    fn kind(&self) -> &'static str {
        "Mobile"
    }

    fn provides(&self) -> &[Capability] {
        &[
            Capability::OccupySpace,
            Capability::Positionable,
            Capability::IssueOrder,
            Capability::ResolveOrder,
            Capability::SyncState,
        ]
    }

    fn uses_inits(&self) -> &[&'static str] {
        &[LOCATION_INIT]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(MobileTrait {
            cell: init.get_or(LOCATION_INIT, CellPos::ORIGIN)?,
            speed: self.speed,
            move_targeter: MoveTargeter {
                priority: self.move_priority,
            },
        }))
    }
}

#[derive(Debug)]
struct MoveTargeter {
    priority: i32,
}

impl OrderTargeter for MoveTargeter {
    fn order_id(&self) -> &str {
        MobileInfo::MOVE_ORDER
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_target(
        &self,
        _actor: &ActorView<'_>,
        target: &Target,
        _others_at_target: &[ActorId],
        modifiers: &mut TargetModifiers,
        cursor: &mut String,
    ) -> bool {
        let accepted = match target {
            Target::Terrain(_) => true,
            Target::Actor(_) => modifiers.contains(TargetModifiers::FORCE_MOVE),
            Target::Invalid => false,
        };
        if accepted {
            modifiers.remove(TargetModifiers::FORCE_MOVE);
            *cursor = "move".to_string();
        }
        accepted
    }
}

#[derive(Debug)]
pub struct MobileTrait {
    cell: CellPos,
    speed: i32,
    move_targeter: MoveTargeter,
}

impl MobileTrait {
    pub fn speed(&self) -> i32 {
        self.speed
    }
}

impl OccupySpace for MobileTrait {
    fn top_left(&self) -> CellPos {
        self.cell
    }

    fn center_position(&self) -> WorldPos {
        self.cell.center()
    }
}

impl Positionable for MobileTrait {
    fn set_position(&mut self, cell: CellPos) {
        self.cell = cell;
    }
}

impl IssueOrder for MobileTrait {
    fn orders(&self) -> Vec<&dyn OrderTargeter> {
        vec![&self.move_targeter]
    }
}

impl ResolveOrder for MobileTrait {
    fn resolve_order(&mut self, ctx: &mut TraitContext<'_>, order: &Order) -> bool {
        match order.order_id.as_str() {
            MobileInfo::MOVE_ORDER => {
                let destination = order
                    .target
                    .center_position(ctx.world())
                    .map(WorldPos::cell)
                    .or(order.extra_location);
                let Some(destination) = destination else {
                    return false;
                };
                ctx.queue_activity(Box::new(MoveTo::new(destination)), order.queued);
                true
            }
            MobileInfo::STOP_ORDER => {
                ctx.cancel_activities();
                true
            }
            _ => false,
        }
    }
}

impl SyncState for MobileTrait {
    fn sync_state(&self, hasher: &mut SyncHasher) {
        hasher.write_i32(self.cell.x);
        hasher.write_i32(self.cell.y);
    }
}

impl ActorTrait for MobileTrait {
    fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
        Some(self)
    }

    fn as_positionable_mut(&mut self) -> Option<&mut dyn Positionable> {
        Some(self)
    }

    fn as_issue_order(&self) -> Option<&dyn IssueOrder> {
        Some(self)
    }

    fn as_resolve_order_mut(&mut self) -> Option<&mut dyn ResolveOrder> {
        Some(self)
    }

    fn as_sync_state(&self) -> Option<&dyn SyncState> {
        Some(self)
    }
}

/// Walks one axis at a time toward `destination`, a whole cell per
/// `CELL_SIZE` units of accumulated speed.
#[derive(Debug)]
pub struct MoveTo {
    destination: CellPos,
    progress: i32,
}

impl MoveTo {
    pub fn new(destination: CellPos) -> Self {
        Self {
            destination,
            progress: 0,
        }
    }
}

/// Facing for a single-cell step, counter-clockwise from north.
fn step_facing(dx: i32, dy: i32) -> i32 {
    match (dx.signum(), dy.signum()) {
        (0, -1) => 0,
        (-1, _) => 64,
        (0, 1) => 128,
        _ => 192,
    }
}

impl Activity for MoveTo {
    fn name(&self) -> &str {
        "MoveTo"
    }

    fn tick(&mut self, ctx: &mut TraitContext<'_>) -> ActivityState {
        let Some(actor) = ctx.this() else {
            return ActivityState::Done;
        };
        let Some(mobile) = actor.traits().trait_of::<MobileTrait>() else {
            return ActivityState::Done;
        };
        let Some(start) = actor.location() else {
            return ActivityState::Done;
        };
        let has_facing = actor.facing().is_some();

        self.progress += actor.apply_modifiers(ModifierAxis::Speed, mobile.speed()).max(0);
        let mut cell = start;
        let mut last_step = None;
        while self.progress >= CELL_SIZE && cell != self.destination {
            let dx = (self.destination.x - cell.x).signum();
            let dy = if dx == 0 {
                (self.destination.y - cell.y).signum()
            } else {
                0
            };
            cell = cell.offset(dx, dy);
            last_step = Some((dx, dy));
            self.progress -= CELL_SIZE;
        }

        if cell != start {
            ctx.set_position(cell);
        }
        if let Some((dx, dy)) = last_step.filter(|_| has_facing) {
            ctx.set_facing(step_facing(dx, dy));
        }
        if cell == self.destination {
            ActivityState::Done
        } else {
            ActivityState::Running
        }
    }
}
