//! The certain population and its optional uncertain twin.

use std::sync::Arc;

use slick_core::{StoreError, Substance, SubstanceId};
use slick_store::{ArrayDef, SpillContainer};
use slick_weatherers::MassBalance;

/// One population's particles together with its mass-balance ledger.
#[derive(Debug)]
pub struct Population {
    /// The particles.
    pub sc: SpillContainer,
    /// Mass released into and removed from this population.
    pub ledger: MassBalance,
}

impl Population {
    fn new(substances: Vec<Arc<dyn Substance>>, uncertain: bool) -> Result<Self, StoreError> {
        Ok(Self {
            sc: SpillContainer::new(substances, uncertain)?,
            ledger: MassBalance::new(),
        })
    }

    /// Whether this is the uncertain population.
    pub fn uncertain(&self) -> bool {
        self.sc.uncertain()
    }
}

/// Certain population plus, when uncertainty is enabled, an uncertain
/// population with the same substances and release schedule.
#[derive(Debug)]
pub struct SpillContainerPair {
    certain: Population,
    uncertain: Option<Population>,
}

impl SpillContainerPair {
    /// Containers for `substances`, with an uncertain twin if `uncertain`.
    pub fn new(substances: Vec<Arc<dyn Substance>>, uncertain: bool) -> Result<Self, StoreError> {
        let twin = if uncertain {
            Some(Population::new(substances.clone(), true)?)
        } else {
            None
        };
        Ok(Self {
            certain: Population::new(substances, false)?,
            uncertain: twin,
        })
    }

    /// The certain population.
    pub fn certain(&self) -> &Population {
        &self.certain
    }

    /// The uncertain population, if enabled.
    pub fn uncertain(&self) -> Option<&Population> {
        self.uncertain.as_ref()
    }

    /// Whether an uncertain population exists.
    pub fn has_uncertain(&self) -> bool {
        self.uncertain.is_some()
    }

    /// Populations in processing order: certain first.
    pub fn iter(&self) -> impl Iterator<Item = &Population> + '_ {
        std::iter::once(&self.certain).chain(self.uncertain.as_ref())
    }

    /// Mutable populations in processing order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Population> + '_ {
        std::iter::once(&mut self.certain).chain(self.uncertain.as_mut())
    }

    /// Index of `substance` in the containers, by identity.
    pub fn substance_id(&self, substance: &Arc<dyn Substance>) -> Option<SubstanceId> {
        self.certain
            .sc
            .substances()
            .iter()
            .position(|s| Arc::ptr_eq(s, substance))
            .map(|i| SubstanceId(i as u32))
    }

    /// Declare `defs` in every population.
    pub fn declare_all(&mut self, defs: &[ArrayDef]) -> Result<(), StoreError> {
        for p in self.iter_mut() {
            p.sc.declare_all(defs)?;
        }
        Ok(())
    }

    /// Drop every particle and clear the ledgers.
    pub fn rewind(&mut self) {
        for p in self.iter_mut() {
            p.sc.rewind();
            p.ledger.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slick_core::SimpleSubstance;

    fn oil() -> Arc<dyn Substance> {
        Arc::new(SimpleSubstance::builder("oil").build().unwrap())
    }

    #[test]
    fn uncertain_twin_is_optional() {
        let pair = SpillContainerPair::new(vec![oil()], false).unwrap();
        assert!(!pair.has_uncertain());
        assert_eq!(pair.iter().count(), 1);

        let pair = SpillContainerPair::new(vec![oil()], true).unwrap();
        let flags: Vec<bool> = pair.iter().map(Population::uncertain).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn substances_are_found_by_identity() {
        let a = oil();
        let b = oil();
        let pair = SpillContainerPair::new(vec![a.clone(), b.clone()], false).unwrap();
        assert_eq!(pair.substance_id(&b), Some(SubstanceId(1)));
        assert_eq!(pair.substance_id(&oil()), None);
    }

    #[test]
    fn declare_reaches_both_populations() {
        let mut pair = SpillContainerPair::new(vec![oil()], true).unwrap();
        pair.declare_all(&[ArrayDef::rise_vel()]).unwrap();
        assert!(pair.iter().all(|p| p.sc.store().has_array("rise_vel")));
    }
}
