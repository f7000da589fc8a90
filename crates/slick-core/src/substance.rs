//! The [`Substance`] collaborator trait and a table-driven implementation.
//!
//! Substances are external to the engine: the oil-property database that
//! normally backs them is out of scope. The engine only needs density at
//! a temperature and the pseudo-component breakdown used to split mass.

use std::fmt;

use smallvec::SmallVec;

/// Chemical class of a pseudo-component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Saturated hydrocarbons.
    Saturate,
    /// Aromatic hydrocarbons.
    Aromatic,
    /// Resins.
    Resin,
    /// Asphaltenes.
    Asphaltene,
}

/// A spilled substance as seen by the engine.
///
/// # Contract
///
/// - `mass_fractions()` sums to 1.0 and has one entry per pseudo-component.
/// - `component_kinds()` and `boiling_points()` are either empty or the
///   same length as `mass_fractions()`.
pub trait Substance: Send + Sync + fmt::Debug {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Density in kg/m³ at `temperature` kelvin.
    fn density_at_temp(&self, temperature: f64) -> f64;

    /// Mass fraction of each pseudo-component.
    fn mass_fractions(&self) -> &[f64];

    /// Number of pseudo-components.
    fn num_components(&self) -> usize {
        self.mass_fractions().len()
    }

    /// Chemical class of each component. Empty if unknown.
    fn component_kinds(&self) -> &[ComponentKind] {
        &[]
    }

    /// Boiling point of each component in kelvin. Empty if unknown.
    fn boiling_points(&self) -> &[f64] {
        &[]
    }

    /// Whether the substance takes part in weathering at all.
    fn is_weathering(&self) -> bool {
        true
    }
}

/// Substance defined by a reference density and a component table.
///
/// Density varies linearly with temperature:
/// `rho(T) = rho_ref * (1 - k_rho * (T - T_ref))`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleSubstance {
    name: String,
    reference_density: f64,
    reference_temperature: f64,
    k_rho: f64,
    fractions: SmallVec<[f64; 8]>,
    kinds: SmallVec<[ComponentKind; 8]>,
    boiling_points: SmallVec<[f64; 8]>,
    weathering: bool,
}

/// Builder for [`SimpleSubstance`].
pub struct SimpleSubstanceBuilder {
    name: String,
    reference_density: f64,
    reference_temperature: f64,
    k_rho: f64,
    components: Vec<(f64, ComponentKind, f64)>,
    weathering: bool,
}

impl SimpleSubstance {
    /// Start a builder. Defaults: 900 kg/m³ at 288.15 K, `k_rho` 0.0008,
    /// one saturate component boiling at 500 K.
    pub fn builder(name: impl Into<String>) -> SimpleSubstanceBuilder {
        SimpleSubstanceBuilder {
            name: name.into(),
            reference_density: 900.0,
            reference_temperature: 288.15,
            k_rho: 0.0008,
            components: Vec::new(),
            weathering: true,
        }
    }

    /// A single-component substance that never weathers.
    pub fn non_weathering(name: impl Into<String>, density: f64) -> Self {
        Self {
            name: name.into(),
            reference_density: density,
            reference_temperature: 288.15,
            k_rho: 0.0,
            fractions: SmallVec::from_slice(&[1.0]),
            kinds: SmallVec::new(),
            boiling_points: SmallVec::new(),
            weathering: false,
        }
    }
}

impl SimpleSubstanceBuilder {
    /// Density in kg/m³ at the reference temperature.
    pub fn density(mut self, density: f64) -> Self {
        self.reference_density = density;
        self
    }

    /// Reference temperature in kelvin.
    pub fn reference_temperature(mut self, kelvin: f64) -> Self {
        self.reference_temperature = kelvin;
        self
    }

    /// Thermal expansion coefficient (1/K).
    pub fn k_rho(mut self, k_rho: f64) -> Self {
        self.k_rho = k_rho;
        self
    }

    /// Append a pseudo-component: mass fraction, class, boiling point (K).
    pub fn component(mut self, fraction: f64, kind: ComponentKind, boiling_point: f64) -> Self {
        self.components.push((fraction, kind, boiling_point));
        self
    }

    /// Mark the substance as non-weathering.
    pub fn weathering(mut self, weathering: bool) -> Self {
        self.weathering = weathering;
        self
    }

    /// Build, validating densities and fractions.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the density is not finite and positive, a fraction
    /// is negative, or fractions do not sum to 1 within 1e-6.
    pub fn build(self) -> Result<SimpleSubstance, String> {
        if !self.reference_density.is_finite() || self.reference_density <= 0.0 {
            return Err(format!(
                "density must be finite and > 0, got {}",
                self.reference_density
            ));
        }
        let components = if self.components.is_empty() {
            vec![(1.0, ComponentKind::Saturate, 500.0)]
        } else {
            self.components
        };
        if let Some((f, _, _)) = components.iter().find(|(f, _, _)| f.is_nan() || *f < 0.0) {
            return Err(format!("mass fraction must be >= 0, got {f}"));
        }
        let total: f64 = components.iter().map(|(f, _, _)| f).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(format!("mass fractions must sum to 1, got {total}"));
        }
        Ok(SimpleSubstance {
            name: self.name,
            reference_density: self.reference_density,
            reference_temperature: self.reference_temperature,
            k_rho: self.k_rho,
            fractions: components.iter().map(|c| c.0).collect(),
            kinds: components.iter().map(|c| c.1).collect(),
            boiling_points: components.iter().map(|c| c.2).collect(),
            weathering: self.weathering,
        })
    }
}

impl Substance for SimpleSubstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn density_at_temp(&self, temperature: f64) -> f64 {
        self.reference_density * (1.0 - self.k_rho * (temperature - self.reference_temperature))
    }

    fn mass_fractions(&self) -> &[f64] {
        &self.fractions
    }

    fn component_kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    fn boiling_points(&self) -> &[f64] {
        &self.boiling_points
    }

    fn is_weathering(&self) -> bool {
        self.weathering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_builder_has_one_component() {
        let oil = SimpleSubstance::builder("oil").build().unwrap();
        assert_eq!(oil.num_components(), 1);
        assert_eq!(oil.mass_fractions(), &[1.0]);
        assert!(oil.is_weathering());
    }

    #[test]
    fn density_falls_with_temperature() {
        let oil = SimpleSubstance::builder("oil").density(900.0).build().unwrap();
        assert_relative_eq!(oil.density_at_temp(288.15), 900.0);
        assert!(oil.density_at_temp(300.0) < 900.0);
    }

    #[test]
    fn fractions_must_sum_to_one() {
        let err = SimpleSubstance::builder("bad")
            .component(0.5, ComponentKind::Saturate, 400.0)
            .component(0.4, ComponentKind::Aromatic, 600.0)
            .build()
            .unwrap_err();
        assert!(err.contains("sum to 1"));
    }

    #[test]
    fn rejects_non_positive_density() {
        assert!(SimpleSubstance::builder("x").density(0.0).build().is_err());
        assert!(SimpleSubstance::builder("x").density(f64::NAN).build().is_err());
    }

    #[test]
    fn non_weathering_substance() {
        let s = SimpleSubstance::non_weathering("tracer", 1000.0);
        assert!(!s.is_weathering());
        assert_eq!(s.density_at_temp(350.0), 1000.0);
    }
}
