//! [`MassBalance`]: per-process totals of removed mass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered ledger of kilograms removed per process, plus the total mass
/// released into the population.
///
/// Entries keep their registration order so reports list processes in
/// the order the weatherers run. Entries are reset only when a run is
/// prepared.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBalance {
    amount_released: f64,
    entries: IndexMap<String, f64>,
}

impl MassBalance {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the release counter and drop every entry.
    pub fn clear(&mut self) {
        self.amount_released = 0.0;
        self.entries.clear();
    }

    /// Register `key` at zero, or reset it if present.
    pub fn reset(&mut self, key: &str) {
        self.entries.insert(key.to_string(), 0.0);
    }

    /// Add `kg` to `key`, registering it if needed.
    pub fn add(&mut self, key: &str, kg: f64) {
        *self.entries.entry(key.to_string()).or_insert(0.0) += kg;
    }

    /// Total booked under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// Record `kg` newly released.
    pub fn record_release(&mut self, kg: f64) {
        self.amount_released += kg;
    }

    /// Total mass released so far.
    pub fn amount_released(&self) -> f64 {
        self.amount_released
    }

    /// Sum of every entry.
    pub fn total_removed(&self) -> f64 {
        self.entries.values().sum()
    }

    /// `(process, kg)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Released minus removed minus `live_mass`. Zero when every
    /// kilogram is accounted for.
    pub fn conservation_error(&self, live_mass: f64) -> f64 {
        self.amount_released - self.total_removed() - live_mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_registration_order() {
        let mut mb = MassBalance::new();
        mb.reset("skimmed");
        mb.add("burned", 2.0);
        mb.add("skimmed", 1.5);
        let keys: Vec<&str> = mb.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["skimmed", "burned"]);
        assert_eq!(mb.get("skimmed"), Some(1.5));
        assert_eq!(mb.get("evaporated"), None);
    }

    #[test]
    fn reset_zeroes_one_entry() {
        let mut mb = MassBalance::new();
        mb.add("burned", 4.0);
        mb.add("skimmed", 1.0);
        mb.reset("burned");
        assert_eq!(mb.get("burned"), Some(0.0));
        assert_eq!(mb.total_removed(), 1.0);
    }

    #[test]
    fn conservation_error_balances() {
        let mut mb = MassBalance::new();
        mb.record_release(100.0);
        mb.add("burned", 30.0);
        mb.add("skimmed", 20.0);
        assert_eq!(mb.conservation_error(50.0), 0.0);
        assert_eq!(mb.conservation_error(49.0), 1.0);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let mut mb = MassBalance::new();
        mb.record_release(10.0);
        mb.add("skimmed", 1.0);
        mb.add("burned", 2.0);
        let back: MassBalance =
            serde_json::from_str(&serde_json::to_string(&mb).unwrap()).unwrap();
        assert_eq!(back, mb);
    }
}
