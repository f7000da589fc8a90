//! Pieces shared by the response operations: amount units, efficiency
//! validation, per-population activity and the cumulative-mass marking
//! pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slick_core::{ActiveWindow, EnvError, FateFlags, LeStatus, Substance};
use slick_env::{Quantity, Water};
use slick_store::{names, FateView, Selector, SpillContainer};

use crate::error::WeathererError;
use crate::weatherer::WeatherContext;

/// Temperature (K) used for volume/mass conversion when no water is
/// attached: 15 °C, the API reference temperature.
pub const REFERENCE_TEMPERATURE: f64 = 288.15;

/// Whether an operation's amount is a mass or a volume of oil.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    /// Kilograms once converted.
    Mass,
    /// Cubic meters once converted; turned into mass with the oil density.
    Volume,
}

impl AmountUnit {
    /// Classify `units` and convert `amount` to SI.
    pub fn parse(amount: f64, units: &str) -> Result<(Self, f64), WeathererError> {
        if Quantity::Mass.accepts(units) {
            Ok((Self::Mass, Quantity::Mass.to_si(amount, units)?))
        } else if Quantity::Volume.accepts(units) {
            Ok((Self::Volume, Quantity::Volume.to_si(amount, units)?))
        } else {
            Err(EnvError::InvalidUnit {
                unit: units.to_string(),
                quantity: "mass or volume",
            }
            .into())
        }
    }

    /// Kilograms for an SI `amount` of this kind at `density` kg/m³.
    pub fn to_kg(self, amount: f64, density: f64) -> f64 {
        match self {
            Self::Mass => amount,
            Self::Volume => amount * density,
        }
    }
}

pub(crate) fn validate_efficiency(value: f64) -> Result<f64, WeathererError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(WeathererError::InvalidEfficiency { value })
    }
}

/// Index of a container's population in per-population state arrays.
pub(crate) fn population(sc: &SpillContainer) -> usize {
    usize::from(sc.uncertain())
}

/// Whether a population is active this step and for how many seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Activity {
    pub active: bool,
    pub timestep: f64,
}

impl Activity {
    pub fn from_window(window: &ActiveWindow, ctx: &WeatherContext) -> Self {
        Self {
            active: window.overlaps(ctx.model_time, ctx.dt),
            timestep: window.active_timestep(ctx.model_time, ctx.dt),
        }
    }
}

/// The substance amounts are converted with. Operations only know a
/// total amount, so multi-substance populations use the first one.
pub(crate) fn primary_substance(
    sc: &SpillContainer,
    weatherer: &str,
) -> Result<Arc<dyn Substance>, WeathererError> {
    match sc.substances() {
        [] => Err(WeathererError::MissingSubstance {
            weatherer: weatherer.to_string(),
        }),
        [only] => Ok(Arc::clone(only)),
        [first, ..] => {
            tracing::error!(
                weatherer,
                substances = sc.substances().len(),
                "multiple substances not supported; using the first"
            );
            Ok(Arc::clone(first))
        }
    }
}

/// Oil density at the water temperature, or at
/// [`REFERENCE_TEMPERATURE`] without water.
pub(crate) fn oil_density(substance: &dyn Substance, water: Option<&Water>) -> f64 {
    substance.density_at_temp(water.map_or(REFERENCE_TEMPERATURE, Water::temperature))
}

/// Whether any in-water particle already carries `flag`.
pub(crate) fn any_marked(sc: &SpillContainer, flag: FateFlags) -> bool {
    let store = sc.store();
    store
        .fate()
        .iter()
        .zip(store.status())
        .any(|(f, s)| *s == LeStatus::InWater && f.intersects(flag))
}

/// Flags set by the response operations.
pub const CLEANUP_FLAGS: FateFlags = FateFlags::from_bits_truncate(
    FateFlags::SKIM.bits() | FateFlags::BURN.bits() | FateFlags::DISPERSE.bits(),
);

/// Set `new_fate` on surface particles in release order until their
/// cumulative mass reaches `target` kg. Returns the number marked.
///
/// Particles already claimed by another operation are skipped. With
/// `oilwater_mix` the target is a mass of emulsion, so each particle
/// counts as `mass / (1 - frac_water)`. When the target is at least the
/// available total, every eligible particle is marked and a warning is
/// logged.
pub fn mark_for_cleanup(
    sc: &mut SpillContainer,
    new_fate: FateFlags,
    target: f64,
    oilwater_mix: bool,
    weatherer: &str,
) -> Result<usize, WeathererError> {
    let store = sc.store();
    let selection = store.select(&Selector::in_water().with_fate(FateFlags::SURFACE_WEATHER));
    let mut view = store.view(&selection, &[names::FRAC_WATER])?;
    let eligible: Vec<usize> = view
        .fate()
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.intersects(CLEANUP_FLAGS))
        .map(|(i, _)| i)
        .collect();
    if eligible.is_empty() {
        return Ok(0);
    }
    let frac_water = view.array(names::FRAC_WATER)?;
    let weights: Vec<f64> = eligible
        .iter()
        .map(|&i| {
            let m = view.mass()[i];
            if oilwater_mix {
                m / (1.0 - frac_water[i]).max(f64::MIN_POSITIVE)
            } else {
                m
            }
        })
        .collect();
    let count = match count_to_mark(&weights, target) {
        Some(count) => count,
        None => {
            tracing::warn!(
                weatherer,
                target,
                available = weights.iter().sum::<f64>(),
                particles = eligible.len(),
                "insufficient mass released for cleanup; marked all surface particles"
            );
            eligible.len()
        }
    };
    let fates = view.fate_mut();
    for &i in &eligible[..count] {
        fates[i] = new_fate;
    }
    sc.store_mut().write_back(&view)?;
    tracing::debug!(weatherer, marked = count, target, "particles marked for cleanup");
    Ok(count)
}

/// Leading particles whose cumulative weight first reaches `target`, or
/// `None` when the weights sum to less than the target.
fn count_to_mark(weights: &[f64], target: f64) -> Option<usize> {
    let mut cumsum = 0.0;
    weights
        .iter()
        .position(|w| {
            cumsum += w;
            cumsum >= target
        })
        .map(|ix| ix + 1)
}

/// `1 - mass-weighted frac_water` over the view. An empty view counts as
/// pure oil, with a warning.
pub(crate) fn avg_frac_oil(view: &FateView, weatherer: &str) -> Result<f64, WeathererError> {
    match view.mass_weighted_mean(names::FRAC_WATER)? {
        Some(fw) => Ok(1.0 - fw),
        None => {
            tracing::warn!(weatherer, "no mass to average frac_water over; assuming 0");
            Ok(1.0)
        }
    }
}

/// Remove up to `kg` from the view, spread over every component of
/// every row. Returns the mass actually removed.
pub(crate) fn remove_mass(view: &mut FateView, kg: f64) -> f64 {
    let total = view.total_mass();
    if total <= 0.0 || kg <= 0.0 {
        return 0.0;
    }
    view.remove_fraction((kg / total).min(1.0))
}
