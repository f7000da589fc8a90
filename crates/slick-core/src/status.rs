//! Particle status codes and the [`FateFlags`] bitset.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Physical state of a particle.
///
/// Discriminants match the numeric codes used in trajectory output so
/// they can be written without a lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LeStatus {
    /// Not yet released. Only seen in freshly allocated rows.
    NotReleased = 0,
    /// Floating or suspended in the water column. The only status that moves.
    #[default]
    InWater = 2,
    /// Beached.
    OnLand = 3,
    /// Left the spatial domain of a gridded field.
    OffMap = 7,
    /// All mass evaporated.
    Evaporated = 10,
    /// Scheduled for compaction at the end of the step.
    ToBeRemoved = 12,
}

impl LeStatus {
    /// Numeric code of this status.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether particles with this status are still part of the live
    /// population (moved and weathered).
    pub fn is_active(self) -> bool {
        self == Self::InWater
    }
}

impl fmt::Display for LeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotReleased => "not_released",
            Self::InWater => "in_water",
            Self::OnLand => "on_land",
            Self::OffMap => "off_map",
            Self::Evaporated => "evaporated",
            Self::ToBeRemoved => "to_be_removed",
        };
        f.write_str(name)
    }
}

/// Which weathering processes currently claim a particle.
///
/// A small bitset; flags combine with `|`. Weatherers scope their
/// reads and writes through [`FateFlags::intersects`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FateFlags(u8);

impl FateFlags {
    /// Substance does not weather.
    pub const NON_WEATHERING: Self = Self(1);
    /// Floating slick, subject to surface weathering.
    pub const SURFACE_WEATHER: Self = Self(2);
    /// Droplets in the water column.
    pub const SUBSURFACE: Self = Self(4);
    /// Marked for skimming.
    pub const SKIM: Self = Self(8);
    /// Marked for in-situ burning.
    pub const BURN: Self = Self(16);
    /// Marked for chemical dispersion.
    pub const DISPERSE: Self = Self(32);

    const ALL_BITS: u8 = 0b0011_1111;

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every defined flag.
    pub const fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Build from raw bits, dropping undefined ones.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one flag.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set every flag in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear every flag in `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Flags set in `self` but not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Number of flags set.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for FateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FateFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for FateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(FateFlags, &str); 6] = [
            (FateFlags::NON_WEATHERING, "NON_WEATHERING"),
            (FateFlags::SURFACE_WEATHER, "SURFACE_WEATHER"),
            (FateFlags::SUBSURFACE, "SUBSURFACE"),
            (FateFlags::SKIM, "SKIM"),
            (FateFlags::BURN, "BURN"),
            (FateFlags::DISPERSE, "DISPERSE"),
        ];
        if self.is_empty() {
            return f.write_str("FateFlags(empty)");
        }
        f.write_str("FateFlags(")?;
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_codes_are_stable() {
        assert_eq!(LeStatus::InWater.code(), 2);
        assert_eq!(LeStatus::OffMap.code(), 7);
        assert_eq!(LeStatus::ToBeRemoved.code(), 12);
        assert!(LeStatus::InWater.is_active());
        assert!(!LeStatus::OnLand.is_active());
    }

    #[test]
    fn marking_adds_without_clearing() {
        let mut fate = FateFlags::SURFACE_WEATHER;
        fate.insert(FateFlags::SKIM);
        assert!(fate.contains(FateFlags::SURFACE_WEATHER));
        assert!(fate.intersects(FateFlags::SKIM | FateFlags::BURN));
        assert!(!fate.contains(FateFlags::SKIM | FateFlags::BURN));
        fate.remove(FateFlags::SKIM);
        assert_eq!(fate, FateFlags::SURFACE_WEATHER);
    }

    #[test]
    fn debug_lists_flag_names() {
        let fate = FateFlags::SURFACE_WEATHER | FateFlags::BURN;
        assert_eq!(format!("{fate:?}"), "FateFlags(SURFACE_WEATHER | BURN)");
        assert_eq!(format!("{:?}", FateFlags::empty()), "FateFlags(empty)");
    }

    fn arb_flags() -> impl Strategy<Value = FateFlags> {
        any::<u8>().prop_map(FateFlags::from_bits_truncate)
    }

    proptest! {
        #[test]
        fn union_contains_both(a in arb_flags(), b in arb_flags()) {
            let u = a | b;
            prop_assert!(u.contains(a));
            prop_assert!(u.contains(b));
        }

        #[test]
        fn difference_is_disjoint(a in arb_flags(), b in arb_flags()) {
            prop_assert!(!a.difference(b).intersects(b));
        }

        #[test]
        fn truncate_stays_within_all(bits in any::<u8>()) {
            prop_assert!(FateFlags::all().contains(FateFlags::from_bits_truncate(bits)));
        }
    }
}
