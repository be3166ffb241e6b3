/// Simulation configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Maximum nesting of effect application. Effects emitted deeper than
    /// this are dropped and logged.
    pub max_dispatch_depth: usize,
    /// Activities beyond this many per actor are dropped.
    pub max_queued_activities: usize,
    /// Ruleset entry used to build the world actor.
    pub world_actor_type: String,
}

impl SimConfig {
    // ===== compile-time constants =====
    /// Player slots including the neutral player.
    pub const MAX_PLAYERS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;
    pub const DEFAULT_MAX_QUEUED_ACTIVITIES: usize = 32;
    pub const DEFAULT_WORLD_ACTOR_TYPE: &'static str = "world";

    pub fn new() -> Self {
        Self {
            max_dispatch_depth: Self::DEFAULT_MAX_DISPATCH_DEPTH,
            max_queued_activities: Self::DEFAULT_MAX_QUEUED_ACTIVITIES,
            world_actor_type: Self::DEFAULT_WORLD_ACTOR_TYPE.to_string(),
        }
    }

    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
