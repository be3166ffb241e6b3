/// Per-actor lifecycle. States only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifecycle {
    /// Traits are being constructed; not yet visible to anyone.
    Constructed,
    /// Assembled and notified, not yet placed in the world.
    Created,
    InWorld,
    Removed,
    Disposed,
}

impl Lifecycle {
    /// Legal transitions. Besides the forward chain, assembly failure goes
    /// straight to `Disposed` and an actor that never entered the world may be
    /// disposed directly.
    pub fn can_advance_to(self, next: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, next),
            (Constructed, Created)
                | (Created, InWorld)
                | (InWorld, Removed)
                | (Removed, Disposed)
                | (Created, Disposed)
                | (Constructed, Disposed)
        )
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
