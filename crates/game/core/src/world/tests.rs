use std::fmt;
use std::sync::{Arc, Mutex};

use super::*;
use crate::conditional::{Conditional, ConditionalInfo, EnablementChange, Upgradable};
use crate::contract::*;
use crate::error::AssemblyError;
use crate::health::{AttackInfo, DamageState, HealthInfo};
use crate::modifier::ModifierAxis;
use crate::order::{IssueOrder, Order, OrderTargeter, ResolveOrder, TargetModifiers, ValidateOrder};
use crate::player::Stance;
use crate::store::{ActorInitializer, TraitInfo};
use crate::target::Target;
use crate::types::WorldPos;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

type Log = Arc<Mutex<Vec<String>>>;

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

fn record(log: &Log, label: &str, event: &str) {
    log.lock().unwrap().push(format!("{label}:{event}"));
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Labels that logged `event`, in order.
fn seen(log: &Log, event: &str) -> Vec<String> {
    entries(log)
        .into_iter()
        .filter_map(|entry| {
            let (label, e) = entry.split_once(':')?;
            (e == event).then(|| label.to_string())
        })
        .collect()
}

fn players() -> Players {
    let mut players = Players::new();
    players.add("Alice", "alice").unwrap();
    players.add("Bob", "bob").unwrap();
    players
}

fn world_with_config(templates: Vec<ActorTemplate>, config: SimConfig) -> World {
    let mut ruleset = Ruleset::new();
    for template in templates {
        ruleset.insert(template).unwrap();
    }
    World::new(Arc::new(ruleset), players(), config, 7).unwrap()
}

fn world_with(templates: Vec<ActorTemplate>) -> World {
    world_with_config(templates, SimConfig::default())
}

fn hp(world: &World, id: ActorId) -> i32 {
    world.view().actor(id).unwrap().health().unwrap().hp()
}

/// Logs every lifecycle and notification callback it receives.
#[derive(Debug)]
struct ProbeInfo {
    label: &'static str,
    log: Log,
    requires: Vec<Capability>,
}

impl ProbeInfo {
    fn new(label: &'static str, log: &Log) -> Self {
        Self {
            label,
            log: Arc::clone(log),
            requires: Vec::new(),
        }
    }

    fn requiring(label: &'static str, log: &Log, capability: Capability) -> Self {
        Self {
            requires: vec![capability],
            ..Self::new(label, log)
        }
    }
}

impl TraitInfo for ProbeInfo {
    fn kind(&self) -> &'static str {
        "Probe"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::NotifyCreated, Capability::Tick]
    }

    fn requires(&self) -> &[Capability] {
        &self.requires
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Probe {
            label: self.label,
            log: Arc::clone(&self.log),
        }))
    }
}

struct Probe {
    label: &'static str,
    log: Log,
}

impl Probe {
    fn note(&self, event: &str) {
        record(&self.log, self.label, event);
    }
}

impl NotifyCreated for Probe {
    fn created(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("created");
    }
}

impl NotifyAddedToWorld for Probe {
    fn added_to_world(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("added");
    }
}

impl NotifyRemovedFromWorld for Probe {
    fn removed_from_world(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("removed");
    }
}

impl NotifyActorDisposing for Probe {
    fn disposing(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("disposing");
    }
}

impl Tickable for Probe {
    fn tick(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("tick");
    }
}

impl NotifyBecomingIdle for Probe {
    fn becoming_idle(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("becoming_idle");
    }
}

impl NotifyIdle for Probe {
    fn tick_idle(&mut self, _ctx: &mut TraitContext<'_>) {
        self.note("idle");
    }
}

impl NotifyDamage for Probe {
    fn damaged(&mut self, _ctx: &mut TraitContext<'_>, _attack: &AttackInfo) {
        self.note("damaged");
    }
}

impl NotifyDamageStateChanged for Probe {
    fn damage_state_changed(&mut self, _ctx: &mut TraitContext<'_>, attack: &AttackInfo) {
        self.note(&format!("state={}", attack.damage_state));
    }
}

impl NotifyKilled for Probe {
    fn killed(&mut self, _ctx: &mut TraitContext<'_>, _attack: &AttackInfo) {
        self.note("killed");
    }
}

impl NotifyOwnerChanged for Probe {
    fn owner_changed(&mut self, ctx: &mut TraitContext<'_>, old: PlayerId, new: PlayerId) {
        assert_eq!(ctx.owner(), new);
        self.note(&format!("owner={old}->{new}"));
    }
}

impl NotifyCapture for Probe {
    fn captured(
        &mut self,
        _ctx: &mut TraitContext<'_>,
        captor: ActorId,
        _old: PlayerId,
        _new: PlayerId,
    ) {
        self.note(&format!("captured_by={captor}"));
    }
}

impl NotifyStanceChanged for Probe {
    fn stance_changed(
        &mut self,
        _ctx: &mut TraitContext<'_>,
        _player: PlayerId,
        _other: PlayerId,
        _old: Stance,
        _new: Stance,
    ) {
        self.note("stance");
    }
}

impl NotifyOtherProduction for Probe {
    fn unit_produced_by_other(
        &mut self,
        _ctx: &mut TraitContext<'_>,
        _producer: ActorId,
        _produced: ActorId,
    ) {
        self.note("other_production");
    }
}

impl ActorTrait for Probe {
    fn as_notify_created_mut(&mut self) -> Option<&mut dyn NotifyCreated> {
        Some(self)
    }

    fn as_notify_added_to_world_mut(&mut self) -> Option<&mut dyn NotifyAddedToWorld> {
        Some(self)
    }

    fn as_notify_removed_from_world_mut(&mut self) -> Option<&mut dyn NotifyRemovedFromWorld> {
        Some(self)
    }

    fn as_notify_disposing_mut(&mut self) -> Option<&mut dyn NotifyActorDisposing> {
        Some(self)
    }

    fn as_tick_mut(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }

    fn as_notify_becoming_idle_mut(&mut self) -> Option<&mut dyn NotifyBecomingIdle> {
        Some(self)
    }

    fn as_notify_idle_mut(&mut self) -> Option<&mut dyn NotifyIdle> {
        Some(self)
    }

    fn as_notify_damage_mut(&mut self) -> Option<&mut dyn NotifyDamage> {
        Some(self)
    }

    fn as_notify_damage_state_changed_mut(
        &mut self,
    ) -> Option<&mut dyn NotifyDamageStateChanged> {
        Some(self)
    }

    fn as_notify_killed_mut(&mut self) -> Option<&mut dyn NotifyKilled> {
        Some(self)
    }

    fn as_notify_owner_changed_mut(&mut self) -> Option<&mut dyn NotifyOwnerChanged> {
        Some(self)
    }

    fn as_notify_capture_mut(&mut self) -> Option<&mut dyn NotifyCapture> {
        Some(self)
    }

    fn as_notify_stance_changed_mut(&mut self) -> Option<&mut dyn NotifyStanceChanged> {
        Some(self)
    }

    fn as_notify_other_production_mut(&mut self) -> Option<&mut dyn NotifyOtherProduction> {
        Some(self)
    }
}

type ScriptFn = dyn Fn(&mut TraitContext<'_>) + Send + Sync;

/// Runs a closure on every tick.
struct ScriptInfo {
    script: Arc<ScriptFn>,
}

impl ScriptInfo {
    fn new(script: impl Fn(&mut TraitContext<'_>) + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
        }
    }
}

impl fmt::Debug for ScriptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScriptInfo")
    }
}

impl TraitInfo for ScriptInfo {
    fn kind(&self) -> &'static str {
        "Script"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Tick]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Script {
            script: Arc::clone(&self.script),
        }))
    }
}

struct Script {
    script: Arc<ScriptFn>,
}

impl Tickable for Script {
    fn tick(&mut self, ctx: &mut TraitContext<'_>) {
        (self.script)(ctx);
    }
}

impl ActorTrait for Script {
    fn as_tick_mut(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }
}

/// Damages its own actor by 1 every time it is damaged.
#[derive(Debug)]
struct EchoInfo;

impl TraitInfo for EchoInfo {
    fn kind(&self) -> &'static str {
        "Echo"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::NotifyDamage]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Echo))
    }
}

struct Echo;

impl NotifyDamage for Echo {
    fn damaged(&mut self, ctx: &mut TraitContext<'_>, _attack: &AttackInfo) {
        let me = Target::Actor(ctx.actor_id());
        ctx.inflict_damage(me, 1, None);
    }
}

impl ActorTrait for Echo {
    fn as_notify_damage_mut(&mut self) -> Option<&mut dyn NotifyDamage> {
        Some(self)
    }
}

/// Fixed percentage on one axis, optionally gated by an upgrade.
#[derive(Debug)]
struct PercentInfo {
    axis: ModifierAxis,
    percent: i32,
    gate: Option<ConditionalInfo>,
}

impl PercentInfo {
    fn new(axis: ModifierAxis, percent: i32) -> Self {
        Self {
            axis,
            percent,
            gate: None,
        }
    }

    fn gated(axis: ModifierAxis, percent: i32, upgrade: &str) -> Self {
        Self {
            gate: Some(ConditionalInfo::requiring(&[upgrade])),
            ..Self::new(axis, percent)
        }
    }
}

impl TraitInfo for PercentInfo {
    fn kind(&self) -> &'static str {
        "Percent"
    }

    fn provides(&self) -> &[Capability] {
        &[]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Percent {
            axis: self.axis,
            percent: self.percent,
            gate: self.gate.clone().map(Conditional::new),
        }))
    }
}

struct Percent {
    axis: ModifierAxis,
    percent: i32,
    gate: Option<Conditional>,
}

impl DamageModifier for Percent {
    fn damage_modifier(
        &self,
        _attacker: Option<&ActorView<'_>>,
        _warhead: Option<&crate::health::Warhead>,
    ) -> i32 {
        self.percent
    }
}

impl FirepowerModifier for Percent {
    fn firepower_modifier(&self) -> i32 {
        self.percent
    }
}

impl Upgradable for Percent {
    fn conditional(&self) -> &Conditional {
        self.gate.as_ref().expect("only gated modifiers expose Upgradable")
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        self.gate.as_mut().expect("only gated modifiers expose Upgradable")
    }
}

impl ActorTrait for Percent {
    fn as_damage_modifier(&self) -> Option<&dyn DamageModifier> {
        (self.axis == ModifierAxis::Damage).then_some(self as &dyn DamageModifier)
    }

    fn as_firepower_modifier(&self) -> Option<&dyn FirepowerModifier> {
        (self.axis == ModifierAxis::Firepower).then_some(self as &dyn FirepowerModifier)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        self.gate.as_ref()?;
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        self.gate.as_ref()?;
        Some(self)
    }
}

/// Counts ticks while its upgrade condition holds.
#[derive(Debug)]
struct GatedInfo {
    upgrade: &'static str,
    log: Log,
}

impl TraitInfo for GatedInfo {
    fn kind(&self) -> &'static str {
        "Gated"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Tick, Capability::Upgradable]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Gated {
            conditional: Conditional::new(ConditionalInfo::requiring(&[self.upgrade])),
            ticks: 0,
            log: Arc::clone(&self.log),
        }))
    }
}

struct Gated {
    conditional: Conditional,
    ticks: u32,
    log: Log,
}

impl Tickable for Gated {
    fn tick(&mut self, _ctx: &mut TraitContext<'_>) {
        if self.is_trait_enabled() {
            self.ticks += 1;
        }
    }
}

impl Upgradable for Gated {
    fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        &mut self.conditional
    }

    fn upgrade_enabled(&mut self, _ctx: &mut TraitContext<'_>) {
        record(&self.log, "gated", "enabled");
    }

    fn upgrade_disabled(&mut self, _ctx: &mut TraitContext<'_>) {
        record(&self.log, "gated", "disabled");
    }
}

impl ActorTrait for Gated {
    fn as_tick_mut(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        Some(self)
    }
}

/// Accepts every target; the cursor is the order id.
struct Fixed {
    order_id: &'static str,
    priority: i32,
}

impl OrderTargeter for Fixed {
    fn order_id(&self) -> &str {
        self.order_id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_target(
        &self,
        _actor: &ActorView<'_>,
        _target: &Target,
        _others_at_target: &[ActorId],
        _modifiers: &mut TargetModifiers,
        cursor: &mut String,
    ) -> bool {
        cursor.push_str(self.order_id);
        true
    }
}

/// Offers fixed targeters and claims `Stop` orders, which cancel activities.
#[derive(Debug)]
struct OrdersInfo {
    targeters: Vec<(&'static str, i32)>,
    log: Log,
}

impl TraitInfo for OrdersInfo {
    fn kind(&self) -> &'static str {
        "Orders"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::IssueOrder, Capability::ResolveOrder]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Orders {
            targeters: self
                .targeters
                .iter()
                .map(|&(order_id, priority)| Fixed { order_id, priority })
                .collect(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct Orders {
    targeters: Vec<Fixed>,
    log: Log,
}

impl IssueOrder for Orders {
    fn orders(&self) -> Vec<&dyn OrderTargeter> {
        self.targeters
            .iter()
            .map(|t| t as &dyn OrderTargeter)
            .collect()
    }
}

impl ResolveOrder for Orders {
    fn resolve_order(&mut self, ctx: &mut TraitContext<'_>, order: &Order) -> bool {
        if order.order_id != "Stop" {
            return false;
        }
        record(&self.log, "orders", "stop");
        ctx.cancel_activities();
        true
    }
}

impl ActorTrait for Orders {
    fn as_issue_order(&self) -> Option<&dyn IssueOrder> {
        Some(self)
    }

    fn as_resolve_order_mut(&mut self) -> Option<&mut dyn ResolveOrder> {
        Some(self)
    }
}

/// World-actor validator refusing one order id.
#[derive(Debug)]
struct VetoInfo(&'static str);

impl TraitInfo for VetoInfo {
    fn kind(&self) -> &'static str {
        "Veto"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::ValidateOrder]
    }

    fn create(&self, _init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Veto(self.0)))
    }
}

struct Veto(&'static str);

impl ValidateOrder for Veto {
    fn order_validation(&self, _world: &WorldView<'_>, order: &Order) -> bool {
        order.order_id != self.0
    }
}

impl ActorTrait for Veto {
    fn as_validate_order(&self) -> Option<&dyn ValidateOrder> {
        Some(self)
    }
}

/// Single-cell occupant placed by the `location` initializer.
#[derive(Debug)]
struct CellInfo;

impl TraitInfo for CellInfo {
    fn kind(&self) -> &'static str {
        "Cell"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::OccupySpace, Capability::Positionable]
    }

    fn uses_inits(&self) -> &[&'static str] {
        &["location"]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(Cell {
            cell: init.require("location")?,
        }))
    }
}

struct Cell {
    cell: CellPos,
}

impl OccupySpace for Cell {
    fn top_left(&self) -> CellPos {
        self.cell
    }

    fn center_position(&self) -> WorldPos {
        self.cell.center()
    }
}

impl Positionable for Cell {
    fn set_position(&mut self, cell: CellPos) {
        self.cell = cell;
    }
}

impl ActorTrait for Cell {
    fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
        Some(self)
    }

    fn as_positionable_mut(&mut self) -> Option<&mut dyn Positionable> {
        Some(self)
    }
}

#[derive(Debug)]
struct Countdown {
    name: &'static str,
    remaining: u32,
    log: Log,
}

impl Countdown {
    fn boxed(name: &'static str, ticks: u32, log: &Log) -> Box<dyn Activity> {
        Box::new(Self {
            name,
            remaining: ticks,
            log: Arc::clone(log),
        })
    }
}

impl Activity for Countdown {
    fn name(&self) -> &str {
        self.name
    }

    fn tick(&mut self, _ctx: &mut TraitContext<'_>) -> ActivityState {
        record(&self.log, self.name, "tick");
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            ActivityState::Done
        } else {
            ActivityState::Running
        }
    }

    fn cancel(&mut self) {
        record(&self.log, self.name, "cancel");
    }
}

/// Supersedes itself with a fresh countdown on its first tick.
#[derive(Debug)]
struct Relay {
    log: Log,
}

impl Activity for Relay {
    fn name(&self) -> &str {
        "Relay"
    }

    fn tick(&mut self, ctx: &mut TraitContext<'_>) -> ActivityState {
        ctx.queue_activity(Countdown::boxed("Next", 1, &self.log), false);
        ActivityState::Running
    }

    fn cancel(&mut self) {
        record(&self.log, "Relay", "cancel");
    }
}

// ---------------------------------------------------------------------------
// Composition and registry order
// ---------------------------------------------------------------------------

#[test]
fn world_actor_exists_from_the_start() {
    let world = world_with(vec![ActorTemplate::new("world").with(VetoInfo("Never"))]);
    let world_actor = world.view().world_actor().unwrap();
    assert_eq!(world_actor.actor_type(), "world");
    assert_eq!(world_actor.owner(), PlayerId::NEUTRAL);
    assert!(world_actor.is_in_world());
}

#[test]
fn registry_order_follows_declaration_order() {
    let log = Log::default();
    let template = ActorTemplate::new("probe")
        .with_named("a", ProbeInfo::new("a", &log))
        .with_named("b", ProbeInfo::new("b", &log))
        .with_named("c", ProbeInfo::new("c", &log));
    let mut world = world_with(vec![template]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();

    let store = world.actor(id).unwrap().traits();
    let first: Vec<TraitIndex> = store.implementers(Capability::Tick).to_vec();
    let second: Vec<TraitIndex> = store.implementers(Capability::Tick).to_vec();
    assert_eq!(first, vec![TraitIndex(0), TraitIndex(1), TraitIndex(2)]);
    assert_eq!(first, second);

    world.tick();
    world.tick();
    assert_eq!(seen(&log, "tick"), ["a", "b", "c", "a", "b", "c"]);
}

#[test]
fn provider_after_dependent_is_rejected_and_reordering_fixes_it() {
    let log = Log::default();
    let broken = ActorTemplate::new("needy")
        .with_named("needs", ProbeInfo::requiring("needs", &log, Capability::Health))
        .with(HealthInfo::new(100));
    let err = Ruleset::new().with(broken).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::DependencyUnsatisfied {
            capability: Capability::Health,
            ..
        }
    ));

    let fixed = ActorTemplate::new("needy")
        .with(HealthInfo::new(100))
        .with_named("needs", ProbeInfo::requiring("needs", &log, Capability::Health));
    let mut world = world_with(vec![fixed]);
    assert!(world.spawn("needy", ALICE, &InitValues::new()).is_ok());
}

#[test]
fn unknown_type_and_missing_initializer_never_enter_the_world() {
    let mut world = world_with(vec![ActorTemplate::new("crate").with(CellInfo)]);
    let before: Vec<ActorId> = world.actor_ids().collect();

    let err = world.spawn("tank", ALICE, &InitValues::new()).unwrap_err();
    assert!(matches!(
        err,
        WorldError::Assembly(AssemblyError::UnknownActorType(_))
    ));

    let err = world.spawn("crate", ALICE, &InitValues::new()).unwrap_err();
    assert!(matches!(
        err,
        WorldError::Assembly(AssemblyError::MissingInitializer { .. })
    ));
    assert_eq!(world.actor_ids().collect::<Vec<_>>(), before);
}

#[test]
fn unknown_owner_is_rejected() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let err = world
        .spawn("probe", PlayerId(9), &InitValues::new())
        .unwrap_err();
    assert_eq!(err, WorldError::UnknownPlayer(PlayerId(9)));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn lifecycle_notifications_fire_in_order() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);

    let id = world.create_actor("probe", ALICE, &InitValues::new()).unwrap();
    assert_eq!(world.actor(id).unwrap().lifecycle(), Lifecycle::Created);
    world.add_to_world(id).unwrap();
    assert_eq!(world.actor(id).unwrap().lifecycle(), Lifecycle::InWorld);
    assert!(matches!(
        world.add_to_world(id),
        Err(WorldError::InvalidTransition { .. })
    ));

    world.destroy(id).unwrap();
    assert_eq!(entries(&log), ["p:created", "p:added", "p:removed", "p:disposing"]);
    assert!(world.actor(id).is_none());
    assert!(Target::Actor(id).resolve(&world.view()).is_none());

    world.tick();
    assert_eq!(entries(&log).len(), 4);
    assert!(world.destroy(id).is_ok());
    assert_eq!(world.dispose(id), Err(WorldError::UnknownActor(id)));
}

#[test]
fn created_actor_can_be_disposed_without_entering_the_world() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.create_actor("probe", ALICE, &InitValues::new()).unwrap();

    world.dispose(id).unwrap();
    assert_eq!(entries(&log), ["p:created", "p:disposing"]);
}

#[test]
fn actor_disposed_mid_tick_gets_no_further_callbacks() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("killer").with(ScriptInfo::new(|ctx| ctx.destroy(ActorId(2)))),
        ActorTemplate::new("probe").with(ProbeInfo::new("victim", &log)),
    ]);
    let killer = world.spawn("killer", ALICE, &InitValues::new()).unwrap();
    let victim = world.spawn("probe", BOB, &InitValues::new()).unwrap();
    assert!(killer < victim);
    assert_eq!(victim, ActorId(2));

    world.tick();
    world.tick();
    assert!(seen(&log, "tick").is_empty());
    assert_eq!(seen(&log, "disposing"), ["victim"]);
    assert!(!Target::Actor(victim).is_valid_for(&world.view()));
}

#[test]
fn remaining_effects_are_dropped_once_their_origin_is_gone() {
    let mut world = world_with(vec![
        ActorTemplate::new("suicide").with(ScriptInfo::new(|ctx| {
            let me = ctx.actor_id();
            ctx.destroy(me);
            ctx.inflict_damage(Target::Actor(ActorId(2)), 10, None);
        })),
        ActorTemplate::new("dummy").with(HealthInfo::new(100)),
    ]);
    let suicide = world.spawn("suicide", ALICE, &InitValues::new()).unwrap();
    let dummy = world.spawn("dummy", BOB, &InitValues::new()).unwrap();
    assert_eq!(dummy, ActorId(2));

    world.tick();
    assert!(world.actor(suicide).is_none());
    assert_eq!(hp(&world, dummy), 100);
}

#[test]
fn actors_spawned_during_a_tick_start_ticking_on_the_next() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("factory").with(ScriptInfo::new(|ctx| {
            if ctx.tick() == Tick::ZERO {
                let owner = ctx.owner();
                ctx.spawn("probe", owner, InitValues::new());
            }
        })),
        ActorTemplate::new("probe").with(ProbeInfo::new("fresh", &log)),
    ]);
    world.spawn("factory", ALICE, &InitValues::new()).unwrap();

    world.tick();
    assert_eq!(entries(&log), ["fresh:created", "fresh:added"]);
    world.tick();
    assert_eq!(seen(&log, "tick"), ["fresh"]);
}

#[test]
fn shutdown_disposes_everything() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.spawn("probe", BOB, &InitValues::new()).unwrap();

    world.shutdown();
    assert_eq!(world.actor_ids().count(), 0);
    assert_eq!(seen(&log, "disposing"), ["p", "p"]);
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

#[test]
fn damage_walks_through_thresholds_to_death() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("tank")
            .with(HealthInfo {
                remove_on_death: false,
                ..HealthInfo::new(100)
            })
            .with(ProbeInfo::new("tank", &log)),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();

    let attack = world
        .inflict_damage(tank, Target::Invalid, 60, None, false)
        .unwrap();
    assert_eq!(attack.damage_state, DamageState::Heavy);
    assert_eq!(attack.previous_damage_state, DamageState::Undamaged);
    assert_eq!(hp(&world, tank), 40);

    let attack = world.kill(tank, Target::Invalid).unwrap();
    assert_eq!(attack.damage, 40);
    assert_eq!(attack.damage_state, DamageState::Dead);

    let view = world.view();
    let actor = view.actor(tank).unwrap();
    assert!(actor.is_dead());
    assert!(Target::Actor(tank).resolve(&view).is_none());
    assert_eq!(
        seen(&log, "damaged").len(),
        2,
        "one damage notification per hit"
    );
    assert_eq!(seen(&log, "state=Heavy"), ["tank"]);
    assert_eq!(seen(&log, "killed"), ["tank"]);

    assert!(world.inflict_damage(tank, Target::Invalid, 10, None, false).is_none());
}

#[test]
fn killed_actors_are_removed_by_default() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("tank")
            .with(HealthInfo::new(50))
            .with(ProbeInfo::new("tank", &log)),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();

    world.inflict_damage(tank, Target::Invalid, 500, None, true);
    assert!(world.actor(tank).is_none());
    assert_eq!(
        entries(&log)[2..],
        [
            "tank:damaged",
            "tank:state=Dead",
            "tank:killed",
            "tank:removed",
            "tank:disposing",
        ]
    );
}

#[test]
fn attacker_and_victim_modifiers_share_one_stack() {
    let mut world = world_with(vec![
        ActorTemplate::new("bunker")
            .with(HealthInfo::new(100))
            .with_named("half", PercentInfo::new(ModifierAxis::Damage, 50))
            .with_named("double", PercentInfo::new(ModifierAxis::Damage, 200)),
        ActorTemplate::new("gunner").with(PercentInfo::new(ModifierAxis::Firepower, 50)),
    ]);
    let bunker = world.spawn("bunker", ALICE, &InitValues::new()).unwrap();
    let gunner = world.spawn("gunner", BOB, &InitValues::new()).unwrap();

    for _ in 0..2 {
        let view = world.view();
        assert_eq!(
            view.actor(bunker)
                .unwrap()
                .apply_modifiers(ModifierAxis::Damage, 100),
            100
        );
    }

    world.inflict_damage(bunker, Target::Invalid, 40, None, false);
    assert_eq!(hp(&world, bunker), 60);

    world.inflict_damage(bunker, Target::Actor(gunner), 40, None, false);
    assert_eq!(hp(&world, bunker), 40);

    world.inflict_damage(bunker, Target::Actor(gunner), 15, None, true);
    assert_eq!(hp(&world, bunker), 25);
}

// ---------------------------------------------------------------------------
// Conditional enablement
// ---------------------------------------------------------------------------

#[test]
fn disabled_trait_stays_registered_but_stops_ticking() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("trooper").with(GatedInfo {
        upgrade: "veteran",
        log: Arc::clone(&log),
    })]);
    let id = world.spawn("trooper", ALICE, &InitValues::new()).unwrap();

    world.tick();
    assert_eq!(world.trait_of::<Gated>(id).unwrap().ticks, 0);
    assert_eq!(
        world.actor(id).unwrap().traits().implementers(Capability::Tick),
        &[TraitIndex(0)]
    );

    assert!(world.grant_upgrade(id, "veteran"));
    assert!(!world.grant_upgrade(id, "veteran"), "max accepted level is 1");
    assert!(!world.grant_upgrade(id, "elite"));
    world.tick();
    assert_eq!(world.trait_of::<Gated>(id).unwrap().ticks, 1);

    assert!(world.revoke_upgrade(id, "veteran"));
    assert!(!world.revoke_upgrade(id, "veteran"));
    world.tick();
    assert_eq!(world.trait_of::<Gated>(id).unwrap().ticks, 1);
    assert_eq!(entries(&log), ["gated:enabled", "gated:disabled"]);
}

#[test]
fn direct_level_changes_report_crossings_once() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("trooper").with(GatedInfo {
        upgrade: "veteran",
        log: Arc::clone(&log),
    })]);
    let id = world.spawn("trooper", ALICE, &InitValues::new()).unwrap();

    assert_eq!(
        world.set_upgrade_level(id, TraitIndex(0), 3),
        Ok(Some(EnablementChange::Enabled))
    );
    assert_eq!(world.set_upgrade_level(id, TraitIndex(0), 2), Ok(None));
    assert_eq!(
        world.set_upgrade_level(id, TraitIndex(0), 0),
        Ok(Some(EnablementChange::Disabled))
    );
    assert_eq!(entries(&log), ["gated:enabled", "gated:disabled"]);
    assert_eq!(
        world.set_upgrade_level(ActorId(42), TraitIndex(0), 1),
        Err(WorldError::UnknownActor(ActorId(42)))
    );
}

#[test]
fn disabled_modifiers_are_left_out_of_aggregation() {
    let mut world = world_with(vec![
        ActorTemplate::new("tank")
            .with(HealthInfo::new(100))
            .with(PercentInfo::gated(ModifierAxis::Damage, 50, "armor")),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();
    let modified = |world: &World| {
        world
            .view()
            .actor(tank)
            .unwrap()
            .apply_modifiers(ModifierAxis::Damage, 100)
    };

    assert_eq!(modified(&world), 100);
    world.grant_upgrade(tank, "armor");
    assert_eq!(modified(&world), 50);
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

fn orders(targeters: Vec<(&'static str, i32)>, log: &Log) -> OrdersInfo {
    OrdersInfo {
        targeters,
        log: Arc::clone(log),
    }
}

#[test]
fn highest_priority_targeter_wins() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("tank").with(orders(vec![("Move", 5), ("Attack", 10)], &log)),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();

    let resolved = world
        .resolve_order(tank, &Target::cell(CellPos::new(3, 3)), TargetModifiers::empty())
        .unwrap();
    assert_eq!(resolved.order.order_id, "Attack");
    assert_eq!(resolved.cursor, "Attack");
    assert!(!resolved.order.queued);
}

#[test]
fn equal_priority_goes_to_the_first_declared_targeter() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("tank")
            .with_named("primary", orders(vec![("First", 5), ("Second", 5)], &log))
            .with_named("secondary", orders(vec![("Third", 5)], &log)),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();

    let resolved = world
        .resolve_order(tank, &Target::Invalid, TargetModifiers::FORCE_QUEUE)
        .unwrap();
    assert_eq!(resolved.order.order_id, "First");
    assert_eq!(resolved.trait_index, TraitIndex(0));
    assert!(resolved.order.queued);
}

#[test]
fn dispatch_reports_handled_unclaimed_rejected_and_missing() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("world").with(VetoInfo("Forbidden")),
        ActorTemplate::new("tank").with(orders(Vec::new(), &log)),
    ]);
    let tank = world.spawn("tank", ALICE, &InitValues::new()).unwrap();
    let order = |id: &str| Order::new(id, tank, Target::Invalid, false);

    assert_eq!(world.dispatch_order(&order("Stop")), OrderOutcome::Handled);
    assert_eq!(world.dispatch_order(&order("Dance")), OrderOutcome::Unclaimed);
    assert_eq!(world.dispatch_order(&order("Forbidden")), OrderOutcome::Rejected);
    assert_eq!(
        world.dispatch_order(&Order::new("Stop", ActorId(77), Target::Invalid, false)),
        OrderOutcome::SubjectMissing
    );
    assert_eq!(entries(&log), ["orders:stop"]);
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

#[test]
fn non_queued_activity_supersedes_the_queue() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();

    world.queue_activity(id, Countdown::boxed("A", 2, &log), false).unwrap();
    world.queue_activity(id, Countdown::boxed("B", 1, &log), true).unwrap();
    assert_eq!(world.actor(id).unwrap().activity_names(), ["A", "B"]);

    world.queue_activity(id, Countdown::boxed("C", 1, &log), false).unwrap();
    assert_eq!(world.actor(id).unwrap().activity_names(), ["C"]);
    assert_eq!(seen(&log, "cancel"), ["A", "B"]);
}

#[test]
fn queued_activities_run_in_order_then_the_actor_idles() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.queue_activity(id, Countdown::boxed("A", 2, &log), true).unwrap();
    world.queue_activity(id, Countdown::boxed("B", 1, &log), true).unwrap();

    for _ in 0..3 {
        world.tick();
    }
    assert_eq!(
        entries(&log)
            .into_iter()
            .filter(|e| e.ends_with(":tick") && !e.starts_with("p:"))
            .collect::<Vec<_>>(),
        ["A:tick", "A:tick", "B:tick"]
    );
    assert_eq!(seen(&log, "becoming_idle"), ["p"]);
    assert!(seen(&log, "idle").is_empty());

    world.tick();
    world.tick();
    assert_eq!(seen(&log, "becoming_idle"), ["p"]);
    assert_eq!(seen(&log, "idle"), ["p", "p"]);
    assert!(world.actor(id).unwrap().is_idle());
}

#[test]
fn stop_order_fires_becoming_idle_once() {
    let log = Log::default();
    let mut world = world_with(vec![
        ActorTemplate::new("probe")
            .with(ProbeInfo::new("p", &log))
            .with(orders(Vec::new(), &log)),
    ]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.queue_activity(id, Countdown::boxed("A", 5, &log), false).unwrap();
    world.tick();

    let stop = Order::new("Stop", id, Target::Invalid, false);
    assert_eq!(world.dispatch_order(&stop), OrderOutcome::Handled);
    assert_eq!(seen(&log, "cancel"), ["A"]);
    assert_eq!(seen(&log, "becoming_idle"), ["p"]);

    assert_eq!(world.dispatch_order(&stop), OrderOutcome::Handled);
    assert_eq!(seen(&log, "becoming_idle"), ["p"], "already idle");
}

#[test]
fn cancel_then_tick_does_not_fire_becoming_idle_twice() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.queue_activity(id, Countdown::boxed("A", 5, &log), false).unwrap();
    world.tick();

    world.cancel_activities(id).unwrap();
    world.tick();
    world.tick();
    assert!(world.actor(id).unwrap().is_idle());
    assert_eq!(seen(&log, "becoming_idle"), ["p"]);
    assert_eq!(seen(&log, "idle"), ["p", "p"]);
}

#[test]
fn superseding_a_busy_queue_keeps_the_actor_busy() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.queue_activity(id, Countdown::boxed("A", 5, &log), false).unwrap();
    world.queue_activity(id, Countdown::boxed("B", 5, &log), false).unwrap();
    assert_eq!(seen(&log, "cancel"), ["A"]);
    assert!(seen(&log, "becoming_idle").is_empty());
}

#[test]
fn activity_superseded_by_its_own_tick_is_cancelled() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world
        .queue_activity(id, Box::new(Relay { log: Arc::clone(&log) }), false)
        .unwrap();

    world.tick();
    assert_eq!(seen(&log, "cancel"), ["Relay"]);
    assert_eq!(world.actor(id).unwrap().activity_names(), ["Next"]);
}

// ---------------------------------------------------------------------------
// Ownership, stances, events
// ---------------------------------------------------------------------------

#[test]
fn owner_change_and_capture_notify_in_order() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let building = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    let engineer = world.spawn("probe", BOB, &InitValues::new()).unwrap();
    log.lock().unwrap().clear();

    world.capture(building, engineer, BOB).unwrap();
    assert_eq!(world.actor(building).unwrap().owner(), BOB);
    assert_eq!(
        entries(&log),
        ["p:owner=P1->P2".to_string(), format!("p:captured_by={engineer}")]
    );

    world.change_owner(building, BOB).unwrap();
    assert_eq!(entries(&log).len(), 2, "unchanged owner is a no-op");
    assert_eq!(
        world.change_owner(building, PlayerId(12)),
        Err(WorldError::UnknownPlayer(PlayerId(12)))
    );
}

#[test]
fn stance_changes_are_directional_and_fan_out_world_wide() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.spawn("probe", BOB, &InitValues::new()).unwrap();

    world.set_stance(ALICE, BOB, Stance::ALLY).unwrap();
    assert_eq!(world.players().stance(ALICE, BOB), Stance::ALLY);
    assert_eq!(world.players().stance(BOB, ALICE), Stance::ENEMY);
    assert_eq!(seen(&log, "stance").len(), 2);

    world.set_stance(ALICE, BOB, Stance::ALLY).unwrap();
    assert_eq!(seen(&log, "stance").len(), 2);
}

#[test]
fn production_reaches_every_actor_in_the_world() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let factory = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    let unit = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    world.spawn("probe", BOB, &InitValues::new()).unwrap();

    world
        .notify_production(factory, unit, CellPos::new(1, 1))
        .unwrap();
    assert_eq!(seen(&log, "other_production").len(), 3);
}

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

#[test]
fn occupancy_follows_position_changes() {
    let mut world = world_with(vec![ActorTemplate::new("crate").with(CellInfo)]);
    let start = CellPos::new(2, 3);
    let id = world
        .spawn("crate", ALICE, &InitValues::new().with("location", start))
        .unwrap();
    assert_eq!(world.occupancy().at(start), &[id]);
    assert_eq!(world.view().actor(id).unwrap().location(), Some(start));

    let next = start.offset(1, 0);
    world.set_position(id, next).unwrap();
    assert!(!world.occupancy().is_occupied(start));
    assert_eq!(world.occupancy().at(next), &[id]);

    world.destroy(id).unwrap();
    assert!(!world.occupancy().is_occupied(next));
}

#[test]
fn set_position_requires_a_positionable() {
    let log = Log::default();
    let mut world = world_with(vec![ActorTemplate::new("probe").with(ProbeInfo::new("p", &log))]);
    let id = world.spawn("probe", ALICE, &InitValues::new()).unwrap();
    assert!(matches!(
        world.set_position(id, CellPos::new(0, 0)),
        Err(WorldError::MissingTrait(_))
    ));
}

// ---------------------------------------------------------------------------
// Dispatch depth and determinism
// ---------------------------------------------------------------------------

#[test]
fn feedback_loops_stop_at_the_depth_limit() {
    let mut world = world_with_config(
        vec![
            ActorTemplate::new("echo")
                .with(HealthInfo::new(1000))
                .with(EchoInfo),
        ],
        SimConfig::default().with_max_dispatch_depth(4),
    );
    let id = world.spawn("echo", ALICE, &InitValues::new()).unwrap();

    world.inflict_damage(id, Target::Invalid, 1, None, false);
    assert_eq!(hp(&world, id), 995);

    world.inflict_damage(id, Target::Invalid, 1, None, false);
    assert_eq!(hp(&world, id), 990);
}

fn scripted_world(seed: u64) -> World {
    let mut ruleset = Ruleset::new();
    ruleset
        .insert(ActorTemplate::new("roller").with(HealthInfo::new(1000)).with(ScriptInfo::new(
            |ctx| {
                let roll = ctx.rng().next_range(0, 10);
                let me = Target::Actor(ctx.actor_id());
                ctx.inflict_damage(me, roll, None);
            },
        )))
        .unwrap();
    World::new(Arc::new(ruleset), players(), SimConfig::default(), seed).unwrap()
}

#[test]
fn sync_hash_is_reproducible() {
    let run = |seed: u64| {
        let mut world = scripted_world(seed);
        world.spawn("roller", ALICE, &InitValues::new()).unwrap();
        world.spawn("roller", BOB, &InitValues::new()).unwrap();
        for _ in 0..20 {
            world.tick();
        }
        world
    };

    let a = run(11);
    let b = run(11);
    assert_eq!(a.sync_hash(), b.sync_hash());
    assert_eq!(a.rng_state(), b.rng_state());

    let mut c = run(11);
    c.inflict_damage(ActorId(1), Target::Invalid, 1, None, true);
    assert_ne!(a.sync_hash(), c.sync_hash());
}
