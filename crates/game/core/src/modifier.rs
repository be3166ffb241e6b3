//! Percentage modifier aggregation.
//!
//! Contributors return integer percentages (100 = unchanged). The combined
//! value is the exact rational `base * m1 * ... * mn / 100^n`, kept reduced at
//! every step and truncated toward zero once, so the result does not depend
//! on contributor order.
use crate::capability::Capability;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierAxis {
    Speed,
    Firepower,
    Damage,
    Reload,
    Inaccuracy,
    Range,
    Power,
}

impl ModifierAxis {
    pub fn capability(self) -> Capability {
        match self {
            Self::Speed => Capability::SpeedModifier,
            Self::Firepower => Capability::FirepowerModifier,
            Self::Damage => Capability::DamageModifier,
            Self::Reload => Capability::ReloadModifier,
            Self::Inaccuracy => Capability::InaccuracyModifier,
            Self::Range => Capability::RangeModifier,
            Self::Power => Capability::PowerModifier,
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Applies every percentage in `modifiers` to `base`.
pub fn apply_percentage_modifiers(base: i32, modifiers: impl IntoIterator<Item = i32>) -> i32 {
    let mut numerator = base as i128;
    let mut denominator: i128 = 1;

    for modifier in modifiers {
        let (num, den) = match (
            numerator.checked_mul(modifier as i128),
            denominator.checked_mul(100),
        ) {
            (Some(num), Some(den)) => (num, den),
            // Saturated precision: settle the running quotient and continue.
            _ => ((numerator / denominator).saturating_mul(modifier as i128), 100),
        };
        let divisor = gcd(num.unsigned_abs(), den as u128).max(1) as i128;
        numerator = num / divisor;
        denominator = den / divisor;
    }

    (numerator / denominator).clamp(i32::MIN as i128, i32::MAX as i128) as i32
}
