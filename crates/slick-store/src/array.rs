//! Declarations for optional per-particle columns.

/// Names of the optional columns used across the workspace.
pub mod names {
    /// Per-particle windage fraction.
    pub const WINDAGES: &str = "windages";
    /// `[min, max]` windage range each particle samples from.
    pub const WINDAGE_RANGE: &str = "windage_range";
    /// Seconds a sampled windage persists; `-1` means forever.
    pub const WINDAGE_PERSIST: &str = "windage_persist";
    /// Vertical rise velocity in m/s, positive upward.
    pub const RISE_VEL: &str = "rise_vel";
    /// Droplet diameter in meters.
    pub const DROPLET_DIAMETER: &str = "droplet_diameter";
    /// Water fraction of an emulsified particle.
    pub const FRAC_WATER: &str = "frac_water";
}

/// Layout of an optional column.
///
/// Declared once by each component that needs it. Two declarations of
/// the same name must agree on `components`; the first default wins.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDef {
    /// Column name.
    pub name: &'static str,
    /// Number of `f64` values per particle.
    pub components: usize,
    /// Value given to rows that nothing initializes.
    pub default: f64,
}

impl ArrayDef {
    /// A one-value-per-particle column.
    pub const fn scalar(name: &'static str, default: f64) -> Self {
        Self {
            name,
            components: 1,
            default,
        }
    }

    /// A fixed-width vector column.
    pub const fn vector(name: &'static str, components: usize, default: f64) -> Self {
        Self {
            name,
            components,
            default,
        }
    }

    /// The `windages` column.
    pub const fn windages() -> Self {
        Self::scalar(names::WINDAGES, 0.0)
    }

    /// The `windage_range` column.
    pub const fn windage_range() -> Self {
        Self::vector(names::WINDAGE_RANGE, 2, 0.0)
    }

    /// The `windage_persist` column.
    pub const fn windage_persist() -> Self {
        Self::scalar(names::WINDAGE_PERSIST, 900.0)
    }

    /// The `rise_vel` column.
    pub const fn rise_vel() -> Self {
        Self::scalar(names::RISE_VEL, 0.0)
    }

    /// The `droplet_diameter` column.
    pub const fn droplet_diameter() -> Self {
        Self::scalar(names::DROPLET_DIAMETER, 0.0)
    }

    /// The `frac_water` column.
    pub const fn frac_water() -> Self {
        Self::scalar(names::FRAC_WATER, 0.0)
    }
}
