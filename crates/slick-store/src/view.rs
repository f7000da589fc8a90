//! [`FateView`]: a gathered, writable subset of store rows.
//!
//! Views copy the selected rows out of the store so a weatherer can work
//! on dense arrays, then scatter them back with
//! [`ParticleStore::write_back`]. A view remembers the store length it was
//! taken at and refuses to write into a store that has since grown or
//! been compacted.

use indexmap::IndexMap;
use slick_core::{FateFlags, LeStatus, StoreError, WorldPoint};

use crate::store::{ParticleStore, Selection};

/// Dense copy of selected rows: core mass/fate columns plus any
/// requested optional columns.
#[derive(Clone, Debug)]
pub struct FateView {
    indices: Vec<usize>,
    store_len: usize,
    num_components: usize,
    positions: Vec<WorldPoint>,
    status: Vec<LeStatus>,
    fate: Vec<FateFlags>,
    mass: Vec<f64>,
    mass_components: Vec<f64>,
    arrays: IndexMap<&'static str, (usize, Vec<f64>)>,
}

impl FateView {
    pub(crate) fn gather(
        store: &ParticleStore,
        selection: &Selection,
        arrays: &[&'static str],
    ) -> Result<Self, StoreError> {
        if selection.store_len != store.len() {
            return Err(StoreError::StaleView {
                view_len: selection.store_len,
                store_len: store.len(),
            });
        }
        let idx = &selection.indices;
        let w = store.num_components();
        let mut mass_components = Vec::with_capacity(idx.len() * w);
        for &i in idx {
            mass_components.extend_from_slice(store.component_row(i));
        }
        let mut gathered = IndexMap::with_capacity(arrays.len());
        for &name in arrays {
            let width = store
                .array_def(name)
                .map(|d| d.components)
                .ok_or_else(|| StoreError::UnknownArray {
                    name: name.to_string(),
                })?;
            let src = store.array(name)?;
            let mut data = Vec::with_capacity(idx.len() * width);
            for &i in idx {
                data.extend_from_slice(&src[i * width..(i + 1) * width]);
            }
            gathered.insert(name, (width, data));
        }
        Ok(Self {
            indices: idx.clone(),
            store_len: store.len(),
            num_components: w,
            positions: idx.iter().map(|&i| store.positions()[i]).collect(),
            status: idx.iter().map(|&i| store.status()[i]).collect(),
            fate: idx.iter().map(|&i| store.fate()[i]).collect(),
            mass: idx.iter().map(|&i| store.mass()[i]).collect(),
            mass_components,
            arrays: gathered,
        })
    }

    pub(crate) fn scatter(&self, store: &mut ParticleStore) -> Result<(), StoreError> {
        if self.store_len != store.len() {
            return Err(StoreError::StaleView {
                view_len: self.store_len,
                store_len: store.len(),
            });
        }
        let w = self.num_components;
        for (k, &i) in self.indices.iter().enumerate() {
            store.status_mut()[i] = self.status[k];
            store.fate_mut()[i] = self.fate[k];
            store.mass_mut()[i] = self.mass[k];
            store.mass_components_mut()[i * w..(i + 1) * w]
                .copy_from_slice(&self.mass_components[k * w..(k + 1) * w]);
        }
        for (&name, (width, data)) in &self.arrays {
            let (dst, _) = store.column_mut_with_width(name)?;
            for (k, &i) in self.indices.iter().enumerate() {
                dst[i * width..(i + 1) * width]
                    .copy_from_slice(&data[k * width..(k + 1) * width]);
            }
        }
        Ok(())
    }

    /// Number of rows in the view.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Store row of each view row.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Mass components per row.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Positions (read-only; movers own position updates).
    pub fn positions(&self) -> &[WorldPoint] {
        &self.positions
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

    /// Total mass per row.
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Flat component masses, `num_components` per row.
    pub fn mass_components(&self) -> &[f64] {
        &self.mass_components
    }

    /// Mutable flat component masses. Call
    /// [`recompute_mass`](Self::recompute_mass) after editing.
    pub fn mass_components_mut(&mut self) -> &mut [f64] {
        &mut self.mass_components
    }

    /// Component masses of one row.
    pub fn component_row(&self, row: usize) -> &[f64] {
        let w = self.num_components;
        &self.mass_components[row * w..(row + 1) * w]
    }

    /// Values of a gathered optional column.
    pub fn array(&self, name: &str) -> Result<&[f64], StoreError> {
        self.arrays
            .get(name)
            .map(|(_, d)| d.as_slice())
            .ok_or_else(|| StoreError::UnknownArray {
                name: name.to_string(),
            })
    }

    /// Mutable values of a gathered optional column.
    pub fn array_mut(&mut self, name: &str) -> Result<&mut [f64], StoreError> {
        self.arrays
            .get_mut(name)
            .map(|(_, d)| d.as_mut_slice())
            .ok_or_else(|| StoreError::UnknownArray {
                name: name.to_string(),
            })
    }

    /// Sum of `mass` over the view.
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    /// Reset each row's `mass` to the sum of its components.
    pub fn recompute_mass(&mut self) {
        let w = self.num_components;
        for (k, m) in self.mass.iter_mut().enumerate() {
            *m = self.mass_components[k * w..(k + 1) * w].iter().sum();
        }
    }

    /// Remove `fraction` (clamped to `[0, 1]`) of every component of every
    /// row, preserving component ratios. Returns the mass removed.
    pub fn remove_fraction(&mut self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        let before = self.total_mass();
        for c in &mut self.mass_components {
            *c *= 1.0 - fraction;
        }
        self.recompute_mass();
        before - self.total_mass()
    }

    /// Mass-weighted mean of an optional scalar column. `None` when the
    /// view holds no mass.
    pub fn mass_weighted_mean(&self, name: &str) -> Result<Option<f64>, StoreError> {
        let values = self.array(name)?;
        let total = self.total_mass();
        if total <= 0.0 {
            return Ok(None);
        }
        let weighted: f64 = self.mass.iter().zip(values).map(|(m, v)| m * v).sum();
        Ok(Some(weighted / total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{names, ArrayDef};
    use crate::store::Selector;
    use approx::assert_relative_eq;
    use slick_core::{SpillId, SubstanceId};

    fn store() -> ParticleStore {
        let mut s = ParticleStore::new(2);
        s.declare(&ArrayDef::frac_water()).unwrap();
        for row in s.append(4, SpillId(0), SubstanceId(0)) {
            s.set_row_mass(row, 10.0, &[0.4, 0.6]);
            s.fate_mut()[row] = FateFlags::SURFACE_WEATHER;
        }
        s.fate_mut()[1] |= FateFlags::BURN;
        s.fate_mut()[3] |= FateFlags::BURN;
        s.array_mut(names::FRAC_WATER).unwrap()[3] = 0.5;
        s
    }

    #[test]
    fn gather_and_write_back_touch_only_selected_rows() {
        let mut s = store();
        let sel = s.select(&Selector::in_water().with_fate(FateFlags::BURN));
        let mut view = s.view(&sel, &[names::FRAC_WATER]).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.array(names::FRAC_WATER).unwrap(), &[0.0, 0.5]);

        let removed = view.remove_fraction(0.5);
        assert_relative_eq!(removed, 10.0);
        view.array_mut(names::FRAC_WATER).unwrap()[0] = 0.2;
        s.write_back(&view).unwrap();

        assert_eq!(s.mass(), &[10.0, 5.0, 10.0, 5.0]);
        assert_eq!(s.component_row(1), &[2.0, 3.0]);
        assert_eq!(s.array(names::FRAC_WATER).unwrap()[1], 0.2);
        assert!(s.check_mass_invariant(1e-12).is_ok());
    }

    #[test]
    fn view_of_undeclared_array_fails() {
        let s = store();
        let sel = s.select(&Selector::default());
        let err = s.view(&sel, &[names::RISE_VEL]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownArray { .. }));
    }

    #[test]
    fn stale_view_is_rejected() {
        let mut s = store();
        let sel = s.select(&Selector::default());
        let view = s.view(&sel, &[]).unwrap();
        s.append(1, SpillId(0), SubstanceId(0));
        assert!(matches!(
            s.write_back(&view),
            Err(StoreError::StaleView { .. })
        ));
    }

    #[test]
    fn remove_fraction_is_clamped() {
        let s = store();
        let sel = s.select(&Selector::default());
        let mut view = s.view(&sel, &[]).unwrap();
        let removed = view.remove_fraction(2.0);
        assert_relative_eq!(removed, 40.0);
        assert_eq!(view.total_mass(), 0.0);
    }

    #[test]
    fn mass_weighted_mean_of_frac_water() {
        let s = store();
        let sel = s.select(&Selector::default());
        let view = s.view(&sel, &[names::FRAC_WATER]).unwrap();
        let mean = view.mass_weighted_mean(names::FRAC_WATER).unwrap().unwrap();
        assert_relative_eq!(mean, 0.125);
    }
}
