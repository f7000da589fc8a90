//! The [`ParticleStore`]: synchronized columns, one row per particle.
//!
//! # Invariants
//!
//! - Every column has exactly `len()` rows (`len() * components` values
//!   for flat multi-component columns).
//! - [`append`](ParticleStore::append) grows every column in one call and
//!   places the new rows at the end, so the most recent release is always
//!   the tail of the store.
//! - [`compact`](ParticleStore::compact) removes rows from every column
//!   at once and preserves the relative order of survivors.

use std::ops::Range;

use indexmap::IndexMap;
use slick_core::{
    FateFlags, LeStatus, ParticleId, SpillId, StoreError, SubstanceId, WorldPoint,
};

use crate::array::ArrayDef;
use crate::view::FateView;

// ── Columns ────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Column {
    def: ArrayDef,
    data: Vec<f64>,
}

/// Keep the entries of `v` whose row is not masked, treating `v` as
/// `width` values per row.
fn retain_rows<T: Copy>(v: &mut Vec<T>, width: usize, remove: &[bool]) {
    if width == 0 {
        return;
    }
    let mut write = 0;
    for (row, &drop) in remove.iter().enumerate() {
        if drop {
            continue;
        }
        if write != row {
            v.copy_within(row * width..(row + 1) * width, write * width);
        }
        write += 1;
    }
    v.truncate(write * width);
}

// ── Selection ──────────────────────────────────────────────────────

/// Row filter for [`ParticleStore::select`].
///
/// All set criteria must hold. A fate filter matches rows sharing at
/// least one flag with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Match rows whose fate intersects this set.
    pub fate: Option<FateFlags>,
    /// Match rows of this substance.
    pub substance: Option<SubstanceId>,
    /// Match rows released by this spill.
    pub spill: Option<SpillId>,
    /// Only rows with [`LeStatus::InWater`].
    pub in_water_only: bool,
}

impl Selector {
    /// Every in-water row.
    pub fn in_water() -> Self {
        Self {
            in_water_only: true,
            ..Self::default()
        }
    }

    /// Restrict to a fate.
    pub fn with_fate(mut self, fate: FateFlags) -> Self {
        self.fate = Some(fate);
        self
    }

    /// Restrict to a substance.
    pub fn with_substance(mut self, substance: SubstanceId) -> Self {
        self.substance = Some(substance);
        self
    }

    /// Restrict to a spill.
    pub fn with_spill(mut self, spill: SpillId) -> Self {
        self.spill = Some(spill);
        self
    }
}

/// Row indices chosen by a [`Selector`], in ascending (release) order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Selection {
    pub(crate) indices: Vec<usize>,
    pub(crate) store_len: usize,
}

impl Selection {
    /// Selected row indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ── ParticleStore ──────────────────────────────────────────────────

/// Parallel columns holding every particle of one population.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    num_components: usize,
    positions: Vec<WorldPoint>,
    status: Vec<LeStatus>,
    fate: Vec<FateFlags>,
    mass: Vec<f64>,
    mass_components: Vec<f64>,
    age: Vec<f64>,
    spill_num: Vec<SpillId>,
    substance: Vec<SubstanceId>,
    id: Vec<ParticleId>,
    arrays: IndexMap<&'static str, Column>,
    next_id: u64,
}

impl ParticleStore {
    /// An empty store whose particles carry `num_components` mass components.
    pub fn new(num_components: usize) -> Self {
        Self {
            num_components,
            positions: Vec::new(),
            status: Vec::new(),
            fate: Vec::new(),
            mass: Vec::new(),
            mass_components: Vec::new(),
            age: Vec::new(),
            spill_num: Vec::new(),
            substance: Vec::new(),
            id: Vec::new(),
            arrays: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the store holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Mass components per particle.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Declare an optional column.
    ///
    /// Existing rows are filled with the column default. Redeclaring with
    /// the same width is a no-op.
    pub fn declare(&mut self, def: &ArrayDef) -> Result<(), StoreError> {
        if let Some(existing) = self.arrays.get(def.name) {
            if existing.def.components != def.components {
                return Err(StoreError::DuplicateArray {
                    name: def.name.to_string(),
                    existing: existing.def.components,
                    requested: def.components,
                });
            }
            return Ok(());
        }
        let data = vec![def.default; self.len() * def.components];
        self.arrays.insert(
            def.name,
            Column {
                def: def.clone(),
                data,
            },
        );
        Ok(())
    }

    /// Whether an optional column is declared.
    pub fn has_array(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Layout of a declared optional column.
    pub fn array_def(&self, name: &str) -> Option<&ArrayDef> {
        self.arrays.get(name).map(|c| &c.def)
    }

    /// Names of declared optional columns, in declaration order.
    pub fn array_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.arrays.keys().copied()
    }

    /// Append `n` rows for `spill`/`substance` and return their range.
    ///
    /// New rows are in water, have no fate, zero mass and age, fresh ids,
    /// and column defaults everywhere else. The caller fills in positions
    /// and masses through the `*_mut` accessors.
    pub fn append(&mut self, n: usize, spill: SpillId, substance: SubstanceId) -> Range<usize> {
        let start = self.len();
        let end = start + n;
        self.positions.resize(end, [0.0; 3]);
        self.status.resize(end, LeStatus::InWater);
        self.fate.resize(end, FateFlags::empty());
        self.mass.resize(end, 0.0);
        self.mass_components.resize(end * self.num_components, 0.0);
        self.age.resize(end, 0.0);
        self.spill_num.resize(end, spill);
        self.substance.resize(end, substance);
        self.id.extend((self.next_id..self.next_id + n as u64).map(ParticleId));
        self.next_id += n as u64;
        for col in self.arrays.values_mut() {
            col.data.resize(end * col.def.components, col.def.default);
        }
        start..end
    }

    /// Remove every row where `remove[row]` is true. Returns the number
    /// of rows removed.
    pub fn compact(&mut self, remove: &[bool]) -> Result<usize, StoreError> {
        if remove.len() != self.len() {
            return Err(StoreError::LengthMismatch {
                name: "compaction mask".to_string(),
                expected: self.len(),
                actual: remove.len(),
            });
        }
        let removed = remove.iter().filter(|&&r| r).count();
        if removed == 0 {
            return Ok(0);
        }
        retain_rows(&mut self.positions, 1, remove);
        retain_rows(&mut self.status, 1, remove);
        retain_rows(&mut self.fate, 1, remove);
        retain_rows(&mut self.mass, 1, remove);
        retain_rows(&mut self.mass_components, self.num_components, remove);
        retain_rows(&mut self.age, 1, remove);
        retain_rows(&mut self.spill_num, 1, remove);
        retain_rows(&mut self.substance, 1, remove);
        retain_rows(&mut self.id, 1, remove);
        for col in self.arrays.values_mut() {
            retain_rows(&mut col.data, col.def.components, remove);
        }
        Ok(removed)
    }

    /// Compact out rows marked [`LeStatus::ToBeRemoved`].
    pub fn compact_removed(&mut self) -> usize {
        let mask: Vec<bool> = self
            .status
            .iter()
            .map(|&s| s == LeStatus::ToBeRemoved)
            .collect();
        // Mask length equals len() by construction.
        match self.compact(&mask) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(error = %err, "compaction skipped");
                0
            }
        }
    }

    /// Drop all rows but keep column declarations. Ids restart at zero.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.status.clear();
        self.fate.clear();
        self.mass.clear();
        self.mass_components.clear();
        self.age.clear();
        self.spill_num.clear();
        self.substance.clear();
        self.id.clear();
        for col in self.arrays.values_mut() {
            col.data.clear();
        }
        self.next_id = 0;
    }

    /// Rows matching `selector`, in store order.
    pub fn select(&self, selector: &Selector) -> Selection {
        let indices = (0..self.len())
            .filter(|&i| {
                (!selector.in_water_only || self.status[i] == LeStatus::InWater)
                    && selector.fate.is_none_or(|f| self.fate[i].intersects(f))
                    && selector.substance.is_none_or(|s| self.substance[i] == s)
                    && selector.spill.is_none_or(|s| self.spill_num[i] == s)
            })
            .collect();
        Selection {
            indices,
            store_len: self.len(),
        }
    }

    /// Gather the selected rows and the named optional columns into a view.
    pub fn view(&self, selection: &Selection, arrays: &[&'static str]) -> Result<FateView, StoreError> {
        FateView::gather(self, selection, arrays)
    }

    /// Scatter a view's rows back into the store.
    pub fn write_back(&mut self, view: &FateView) -> Result<(), StoreError> {
        view.scatter(self)
    }

    /// Check `sum(mass_components) == mass` for every row within
    /// `rel_tol` relative (or 1e-12 absolute) tolerance.
    pub fn check_mass_invariant(&self, rel_tol: f64) -> Result<(), StoreError> {
        for row in 0..self.len() {
            let sum: f64 = self.component_row(row).iter().sum();
            let mass = self.mass[row];
            let tol = (rel_tol * mass.abs()).max(1e-12);
            if (sum - mass).abs() > tol {
                tracing::warn!(row, mass, component_sum = sum, "mass invariant violated");
                return Err(StoreError::MassInvariant {
                    row,
                    mass,
                    component_sum: sum,
                });
            }
        }
        Ok(())
    }

    /// Sum of `mass` over all rows.
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    // ── Column access ──────────────────────────────────────────────

    /// Particle positions.
    pub fn positions(&self) -> &[WorldPoint] {
        &self.positions
    }

    /// Mutable particle positions.
    pub fn positions_mut(&mut self) -> &mut [WorldPoint] {
        &mut self.positions
    }

    /// Status codes.
    pub fn status(&self) -> &[LeStatus] {
        &self.status
    }

    /// Mutable status codes.
    pub fn status_mut(&mut self) -> &mut [LeStatus] {
        &mut self.status
    }

    /// Fate flags.
    pub fn fate(&self) -> &[FateFlags] {
        &self.fate
    }

    /// Mutable fate flags.
    pub fn fate_mut(&mut self) -> &mut [FateFlags] {
        &mut self.fate
    }

    /// Total mass per particle (kg).
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Mutable total mass.
    pub fn mass_mut(&mut self) -> &mut [f64] {
        &mut self.mass
    }

    /// Flat `len() * num_components()` component masses, row-major.
    pub fn mass_components(&self) -> &[f64] {
        &self.mass_components
    }

    /// Mutable flat component masses.
    pub fn mass_components_mut(&mut self) -> &mut [f64] {
        &mut self.mass_components
    }

    /// Component masses of one row.
    pub fn component_row(&self, row: usize) -> &[f64] {
        let w = self.num_components;
        &self.mass_components[row * w..(row + 1) * w]
    }

    /// Set both `mass_components` and `mass` of a row from total mass and
    /// fractions. Extra or missing fractions are ignored/zeroed.
    pub fn set_row_mass(&mut self, row: usize, mass: f64, fractions: &[f64]) {
        let w = self.num_components;
        let comps = &mut self.mass_components[row * w..(row + 1) * w];
        for (i, c) in comps.iter_mut().enumerate() {
            *c = mass * fractions.get(i).copied().unwrap_or(0.0);
        }
        self.mass[row] = comps.iter().sum();
    }

    /// Seconds since release.
    pub fn age(&self) -> &[f64] {
        &self.age
    }

    /// Mutable ages.
    pub fn age_mut(&mut self) -> &mut [f64] {
        &mut self.age
    }

    /// Releasing spill of each row.
    pub fn spill_num(&self) -> &[SpillId] {
        &self.spill_num
    }

    /// Substance of each row.
    pub fn substance_ids(&self) -> &[SubstanceId] {
        &self.substance
    }

    /// Particle ids.
    pub fn ids(&self) -> &[ParticleId] {
        &self.id
    }

    /// Values of a declared optional column, `components` per row.
    pub fn array(&self, name: &str) -> Result<&[f64], StoreError> {
        self.arrays
            .get(name)
            .map(|c| c.data.as_slice())
            .ok_or_else(|| StoreError::UnknownArray {
                name: name.to_string(),
            })
    }

    /// Mutable values of a declared optional column.
    pub fn array_mut(&mut self, name: &str) -> Result<&mut [f64], StoreError> {
        self.arrays
            .get_mut(name)
            .map(|c| c.data.as_mut_slice())
            .ok_or_else(|| StoreError::UnknownArray {
                name: name.to_string(),
            })
    }

    pub(crate) fn column_mut_with_width(
        &mut self,
        name: &str,
    ) -> Result<(&mut Vec<f64>, usize), StoreError> {
        self.arrays
            .get_mut(name)
            .map(|c| (&mut c.data, c.def.components))
            .ok_or_else(|| StoreError::UnknownArray {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::names;
    use proptest::prelude::*;

    fn store_with(n: usize) -> ParticleStore {
        let mut s = ParticleStore::new(2);
        let rows = s.append(n, SpillId(0), SubstanceId(0));
        for row in rows {
            s.positions_mut()[row] = [row as f64, 0.0, 0.0];
            s.set_row_mass(row, 1.0 + row as f64, &[0.25, 0.75]);
        }
        s
    }

    #[test]
    fn append_grows_every_column() {
        let mut s = ParticleStore::new(3);
        s.declare(&ArrayDef::windages()).unwrap();
        let r = s.append(4, SpillId(1), SubstanceId(0));
        assert_eq!(r, 0..4);
        assert_eq!(s.len(), 4);
        assert_eq!(s.mass_components().len(), 12);
        assert_eq!(s.array(names::WINDAGES).unwrap().len(), 4);
        assert!(s.status().iter().all(|&st| st == LeStatus::InWater));
        assert!(s.spill_num().iter().all(|&sp| sp == SpillId(1)));
    }

    #[test]
    fn appended_rows_are_the_tail() {
        let mut s = store_with(3);
        let r = s.append(2, SpillId(0), SubstanceId(0));
        assert_eq!(r, 3..5);
        assert_eq!(s.ids()[3..], [ParticleId(3), ParticleId(4)]);
    }

    #[test]
    fn late_declaration_fills_defaults() {
        let mut s = store_with(3);
        s.declare(&ArrayDef::windage_persist()).unwrap();
        assert_eq!(s.array(names::WINDAGE_PERSIST).unwrap(), &[900.0; 3]);
    }

    #[test]
    fn conflicting_declaration_is_rejected() {
        let mut s = ParticleStore::new(1);
        s.declare(&ArrayDef::scalar("x", 0.0)).unwrap();
        assert!(s.declare(&ArrayDef::scalar("x", 5.0)).is_ok());
        let err = s.declare(&ArrayDef::vector("x", 2, 0.0)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateArray { .. }));
    }

    #[test]
    fn unknown_array_is_a_configuration_error() {
        let s = store_with(1);
        let err = s.array("rise_vel").unwrap_err();
        assert_eq!(
            err,
            StoreError::UnknownArray {
                name: "rise_vel".to_string()
            }
        );
    }

    #[test]
    fn compact_keeps_order_and_alignment() {
        let mut s = store_with(5);
        s.declare(&ArrayDef::windage_range()).unwrap();
        for row in 0..5 {
            let r = s.array_mut(names::WINDAGE_RANGE).unwrap();
            r[row * 2] = row as f64;
            r[row * 2 + 1] = 10.0 * row as f64;
        }
        let removed = s.compact(&[false, true, false, true, false]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(s.len(), 3);
        let xs: Vec<f64> = s.positions().iter().map(|p| p[0]).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        assert_eq!(s.ids(), &[ParticleId(0), ParticleId(2), ParticleId(4)]);
        assert_eq!(s.component_row(1), &[0.75, 2.25]);
        assert_eq!(
            s.array(names::WINDAGE_RANGE).unwrap(),
            &[0.0, 0.0, 2.0, 20.0, 4.0, 40.0]
        );
    }

    #[test]
    fn compact_rejects_wrong_mask_length() {
        let mut s = store_with(2);
        assert!(s.compact(&[true]).is_err());
    }

    #[test]
    fn compact_removed_uses_status() {
        let mut s = store_with(3);
        s.status_mut()[1] = LeStatus::ToBeRemoved;
        assert_eq!(s.compact_removed(), 1);
        assert_eq!(s.len(), 2);
        assert!(s.status().iter().all(|&st| st == LeStatus::InWater));
    }

    #[test]
    fn select_filters_by_fate_substance_and_status() {
        let mut s = ParticleStore::new(1);
        s.append(2, SpillId(0), SubstanceId(0));
        s.append(2, SpillId(1), SubstanceId(1));
        s.fate_mut()[0] = FateFlags::SURFACE_WEATHER;
        s.fate_mut()[1] = FateFlags::SURFACE_WEATHER | FateFlags::SKIM;
        s.fate_mut()[2] = FateFlags::SKIM;
        s.status_mut()[2] = LeStatus::OnLand;

        let skim = s.select(&Selector::in_water().with_fate(FateFlags::SKIM));
        assert_eq!(skim.indices(), &[1]);

        let sub1 = s.select(&Selector::default().with_substance(SubstanceId(1)));
        assert_eq!(sub1.indices(), &[2, 3]);

        let spill0 = s.select(&Selector::default().with_spill(SpillId(0)));
        assert_eq!(spill0.len(), 2);
    }

    #[test]
    fn mass_invariant_detects_divergence() {
        let mut s = store_with(3);
        assert!(s.check_mass_invariant(1e-9).is_ok());
        s.mass_mut()[2] += 0.5;
        let err = s.check_mass_invariant(1e-9).unwrap_err();
        assert!(matches!(err, StoreError::MassInvariant { row: 2, .. }));
    }

    #[test]
    fn clear_keeps_declarations() {
        let mut s = store_with(3);
        s.declare(&ArrayDef::rise_vel()).unwrap();
        s.clear();
        assert!(s.is_empty());
        assert!(s.has_array(names::RISE_VEL));
        let r = s.append(1, SpillId(0), SubstanceId(0));
        assert_eq!(s.ids()[r.start], ParticleId(0));
    }

    proptest! {
        #[test]
        fn compaction_preserves_column_lengths(
            mask in prop::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut s = store_with(mask.len());
            s.declare(&ArrayDef::windage_range()).unwrap();
            let kept = mask.iter().filter(|&&m| !m).count();
            s.compact(&mask).unwrap();
            prop_assert_eq!(s.len(), kept);
            prop_assert_eq!(s.mass_components().len(), kept * 2);
            prop_assert_eq!(s.array(names::WINDAGE_RANGE).unwrap().len(), kept * 2);
            prop_assert!(s.check_mass_invariant(1e-12).is_ok());
        }
    }
}
