//! [`SpillContainer`]: one particle population plus its substances.
//!
//! The container is the only gateway weatherers use to read and write
//! particle arrays. [`itersubstancedata`](SpillContainer::itersubstancedata)
//! hands out one [`FateView`] per substance; the caller edits the views
//! and flushes them with
//! [`update_from_fatedataview`](SpillContainer::update_from_fatedataview)
//! before the next weatherer runs.

use std::sync::Arc;

use slick_core::{FateFlags, StoreError, Substance, SubstanceId};

use crate::array::ArrayDef;
use crate::store::{ParticleStore, Selector};
use crate::view::FateView;

/// A gathered view together with the substance it belongs to.
#[derive(Debug)]
pub struct SubstanceData {
    /// Index of the substance in the container.
    pub id: SubstanceId,
    /// The substance itself.
    pub substance: Arc<dyn Substance>,
    /// Rows of this substance matching the requested fate.
    pub view: FateView,
}

/// One population (certain or uncertain) of particles.
#[derive(Debug)]
pub struct SpillContainer {
    store: ParticleStore,
    substances: Vec<Arc<dyn Substance>>,
    uncertain: bool,
    num_released: usize,
}

impl SpillContainer {
    /// Build a container for `substances`. All substances must share one
    /// component count, which fixes the store's component width.
    pub fn new(substances: Vec<Arc<dyn Substance>>, uncertain: bool) -> Result<Self, StoreError> {
        let width = substances.first().map_or(1, |s| s.num_components());
        if let Some(bad) = substances.iter().find(|s| s.num_components() != width) {
            return Err(StoreError::ComponentMismatch {
                expected: width,
                actual: bad.num_components(),
            });
        }
        Ok(Self {
            store: ParticleStore::new(width),
            substances,
            uncertain,
            num_released: 0,
        })
    }

    /// Whether this is the uncertain population.
    pub fn uncertain(&self) -> bool {
        self.uncertain
    }

    /// Particles released so far, including ones since compacted away.
    pub fn num_released(&self) -> usize {
        self.num_released
    }

    /// Record `n` newly released particles.
    pub fn note_released(&mut self, n: usize) {
        self.num_released += n;
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Registered substances, indexed by [`SubstanceId`].
    pub fn substances(&self) -> &[Arc<dyn Substance>] {
        &self.substances
    }

    /// Look up a substance.
    pub fn substance(&self, id: SubstanceId) -> Option<&Arc<dyn Substance>> {
        self.substances.get(id.0 as usize)
    }

    /// Read access to the store.
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Write access to the store, for releases, movers and the orchestrator.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    /// Declare every column in `defs`.
    pub fn declare_all<'a>(
        &mut self,
        defs: impl IntoIterator<Item = &'a ArrayDef>,
    ) -> Result<(), StoreError> {
        for def in defs {
            self.store.declare(def)?;
        }
        Ok(())
    }

    /// One view per substance over in-water rows whose fate intersects
    /// `fate` (all fates when `None`), carrying the named optional columns.
    ///
    /// Substances with no matching rows still get an empty view so callers
    /// can iterate uniformly.
    pub fn itersubstancedata(
        &self,
        arrays: &[&'static str],
        fate: Option<FateFlags>,
    ) -> Result<Vec<SubstanceData>, StoreError> {
        let mut out = Vec::with_capacity(self.substances.len());
        for (i, substance) in self.substances.iter().enumerate() {
            let id = SubstanceId(i as u32);
            let view = self.substancefatedata(id, arrays, fate)?;
            out.push(SubstanceData {
                id,
                substance: Arc::clone(substance),
                view,
            });
        }
        Ok(out)
    }

    /// View for a single substance.
    pub fn substancefatedata(
        &self,
        id: SubstanceId,
        arrays: &[&'static str],
        fate: Option<FateFlags>,
    ) -> Result<FateView, StoreError> {
        let mut selector = Selector::in_water().with_substance(id);
        selector.fate = fate;
        let selection = self.store.select(&selector);
        self.store.view(&selection, arrays)
    }

    /// Flush edited views back into the store.
    pub fn update_from_fatedataview<'a>(
        &mut self,
        data: impl IntoIterator<Item = &'a SubstanceData>,
    ) -> Result<(), StoreError> {
        for d in data {
            self.store.write_back(&d.view)?;
        }
        Ok(())
    }

    /// Drop all particles and reset the release counter.
    pub fn rewind(&mut self) {
        self.store.clear();
        self.num_released = 0;
    }
}
