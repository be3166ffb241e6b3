//! Players and the stance matrix between them.
use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::config::SimConfig;
use crate::error::WorldError;
use crate::types::PlayerId;

bitflags! {
    /// Diplomatic relationship of one player toward another.
    ///
    /// Queries test containment, so `Stance::ENEMY | Stance::NEUTRAL` reads as
    /// "enemy or neutral".
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Stance: u8 {
        const ENEMY = 1;
        const NEUTRAL = 1 << 1;
        const ALLY = 1 << 2;
    }
}

impl Stance {
    /// True when every stance in `stance` is part of `self`.
    pub fn has_stance(self, stance: Stance) -> bool {
        self.contains(stance)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub internal_name: String,
    /// Spectator-like slots (the neutral player) that never fight.
    pub non_combatant: bool,
}

/// Player table. Slot 0 is always the neutral player.
#[derive(Clone, Debug)]
pub struct Players {
    players: ArrayVec<Player, { SimConfig::MAX_PLAYERS }>,
    stances: BTreeMap<(PlayerId, PlayerId), Stance>,
}

impl Players {
    pub fn new() -> Self {
        let mut players = ArrayVec::new();
        players.push(Player {
            id: PlayerId::NEUTRAL,
            name: "Neutral".to_string(),
            internal_name: "neutral".to_string(),
            non_combatant: true,
        });
        Self {
            players,
            stances: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, name: &str, internal_name: &str) -> Result<PlayerId, WorldError> {
        self.push(name, internal_name, false)
    }

    pub fn add_non_combatant(
        &mut self,
        name: &str,
        internal_name: &str,
    ) -> Result<PlayerId, WorldError> {
        self.push(name, internal_name, true)
    }

    fn push(
        &mut self,
        name: &str,
        internal_name: &str,
        non_combatant: bool,
    ) -> Result<PlayerId, WorldError> {
        let id = PlayerId(self.players.len() as u32);
        self.players
            .try_push(Player {
                id,
                name: name.to_string(),
                internal_name: internal_name.to_string(),
                non_combatant,
            })
            .map_err(|_| WorldError::TooManyPlayers(SimConfig::MAX_PLAYERS))?;
        Ok(id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0 as usize)
    }

    pub fn by_internal_name(&self, internal_name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.internal_name == internal_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Stance of `from` toward `to`.
    pub fn stance(&self, from: PlayerId, to: PlayerId) -> Stance {
        if from == to {
            return Stance::ALLY;
        }
        if let Some(stance) = self.stances.get(&(from, to)) {
            return *stance;
        }
        let non_combatant = |id| self.get(id).is_none_or(|p: &Player| p.non_combatant);
        if non_combatant(from) || non_combatant(to) {
            Stance::NEUTRAL
        } else {
            Stance::ENEMY
        }
    }

    /// Sets the stance of `from` toward `to`, returning the previous stance
    /// when it actually changed.
    pub(crate) fn set_stance(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        stance: Stance,
    ) -> Option<Stance> {
        let old = self.stance(from, to);
        if old == stance || from == to {
            return None;
        }
        self.stances.insert((from, to), stance);
        Some(old)
    }
}

impl Default for Players {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stances() {
        let mut players = Players::new();
        let a = players.add("Alice", "multi0").unwrap();
        let b = players.add("Bob", "multi1").unwrap();

        assert_eq!(players.stance(a, a), Stance::ALLY);
        assert_eq!(players.stance(a, b), Stance::ENEMY);
        assert_eq!(players.stance(a, PlayerId::NEUTRAL), Stance::NEUTRAL);
    }

    #[test]
    fn stance_is_directional_and_reports_changes() {
        let mut players = Players::new();
        let a = players.add("Alice", "multi0").unwrap();
        let b = players.add("Bob", "multi1").unwrap();

        assert_eq!(players.set_stance(a, b, Stance::ALLY), Some(Stance::ENEMY));
        assert_eq!(players.set_stance(a, b, Stance::ALLY), None);
        assert_eq!(players.stance(a, b), Stance::ALLY);
        assert_eq!(players.stance(b, a), Stance::ENEMY);
    }

    #[test]
    fn containment_queries() {
        let hostile = Stance::ENEMY | Stance::NEUTRAL;
        assert!(hostile.has_stance(Stance::ENEMY));
        assert!(hostile.has_stance(Stance::NEUTRAL));
        assert!(!hostile.has_stance(Stance::ALLY));
        assert!(!hostile.has_stance(Stance::ENEMY | Stance::ALLY));
        assert!(hostile.has_stance(hostile));
    }

    #[test]
    fn table_is_bounded() {
        let mut players = Players::new();
        for i in 1..SimConfig::MAX_PLAYERS {
            players.add("p", &format!("multi{i}")).unwrap();
        }
        assert!(matches!(
            players.add("overflow", "overflow"),
            Err(WorldError::TooManyPlayers(_))
        ));
    }
}
