//! Unit conversion at the boundary of the environment objects.
//!
//! Values are stored in SI. A [`Quantity`] knows which unit strings it
//! accepts and how to move a value between one of them and SI.

use slick_core::EnvError;

/// Physical quantities with convertible units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// SI: kelvin.
    Temperature,
    /// SI: m/s.
    Speed,
    /// SI: m.
    Length,
    /// SI: m².
    Area,
    /// SI: m³.
    Volume,
    /// SI: kg.
    Mass,
    /// SI: m²/s.
    KinematicViscosity,
    /// SI: psu (practical salinity units).
    Salinity,
    /// SI: kg/m³.
    Concentration,
    /// SI: s.
    Time,
}

// Linear factors to SI. Temperature is affine and handled separately.
const SPEED: &[(&str, f64)] = &[
    ("m/s", 1.0),
    ("m s-1", 1.0),
    ("cm/s", 0.01),
    ("km/h", 1.0 / 3.6),
    ("knots", 1852.0 / 3600.0),
    ("knot", 1852.0 / 3600.0),
    ("mph", 0.44704),
];
const LENGTH: &[(&str, f64)] = &[
    ("m", 1.0),
    ("cm", 0.01),
    ("mm", 0.001),
    ("micron", 1e-6),
    ("km", 1000.0),
    ("ft", 0.3048),
    ("nm", 1852.0),
    ("mile", 1609.344),
];
const AREA: &[(&str, f64)] = &[
    ("m^2", 1.0),
    ("m2", 1.0),
    ("cm^2", 1e-4),
    ("km^2", 1e6),
    ("ft^2", 0.09290304),
];
const VOLUME: &[(&str, f64)] = &[
    ("m^3", 1.0),
    ("m3", 1.0),
    ("l", 1e-3),
    ("liter", 1e-3),
    ("bbl", 0.158987294928),
    ("gal", 0.003785411784),
];
const MASS: &[(&str, f64)] = &[
    ("kg", 1.0),
    ("g", 1e-3),
    ("ton", 907.18474),
    ("metric ton", 1000.0),
    ("tonne", 1000.0),
    ("lb", 0.45359237),
];
const VISCOSITY: &[(&str, f64)] = &[("m^2/s", 1.0), ("cSt", 1e-6), ("St", 1e-4)];
const SALINITY: &[(&str, f64)] = &[("psu", 1.0), ("ppt", 1.0)];
const CONCENTRATION: &[(&str, f64)] = &[("kg/m^3", 1.0), ("mg/l", 1e-3), ("g/l", 1.0)];
const TIME: &[(&str, f64)] = &[
    ("s", 1.0),
    ("sec", 1.0),
    ("min", 60.0),
    ("hour", 3600.0),
    ("hr", 3600.0),
    ("day", 86400.0),
];

impl Quantity {
    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Speed => "speed",
            Quantity::Length => "length",
            Quantity::Area => "area",
            Quantity::Volume => "volume",
            Quantity::Mass => "mass",
            Quantity::KinematicViscosity => "kinematic viscosity",
            Quantity::Salinity => "salinity",
            Quantity::Concentration => "concentration",
            Quantity::Time => "time",
        }
    }

    /// The SI unit string.
    pub fn si_unit(self) -> &'static str {
        match self {
            Quantity::Temperature => "K",
            _ => self.table()[0].0,
        }
    }

    fn table(self) -> &'static [(&'static str, f64)] {
        match self {
            Quantity::Temperature => &[],
            Quantity::Speed => SPEED,
            Quantity::Length => LENGTH,
            Quantity::Area => AREA,
            Quantity::Volume => VOLUME,
            Quantity::Mass => MASS,
            Quantity::KinematicViscosity => VISCOSITY,
            Quantity::Salinity => SALINITY,
            Quantity::Concentration => CONCENTRATION,
            Quantity::Time => TIME,
        }
    }

    fn invalid(self, unit: &str) -> EnvError {
        EnvError::InvalidUnit {
            unit: unit.to_string(),
            quantity: self.name(),
        }
    }

    fn factor(self, unit: &str) -> Result<f64, EnvError> {
        self.table()
            .iter()
            .find(|(u, _)| u.eq_ignore_ascii_case(unit))
            .map(|&(_, f)| f)
            .ok_or_else(|| self.invalid(unit))
    }

    /// Whether `unit` is accepted for this quantity.
    pub fn accepts(self, unit: &str) -> bool {
        match self {
            Quantity::Temperature => matches!(unit, "K" | "C" | "F"),
            _ => self.factor(unit).is_ok(),
        }
    }

    /// Convert `value` in `unit` to SI.
    pub fn to_si(self, value: f64, unit: &str) -> Result<f64, EnvError> {
        match self {
            Quantity::Temperature => match unit {
                "K" => Ok(value),
                "C" => Ok(value + 273.15),
                "F" => Ok((value - 32.0) * 5.0 / 9.0 + 273.15),
                _ => Err(self.invalid(unit)),
            },
            _ => Ok(value * self.factor(unit)?),
        }
    }

    /// Convert an SI `value` to `unit`.
    pub fn from_si(self, value: f64, unit: &str) -> Result<f64, EnvError> {
        match self {
            Quantity::Temperature => match unit {
                "K" => Ok(value),
                "C" => Ok(value - 273.15),
                "F" => Ok((value - 273.15) * 9.0 / 5.0 + 32.0),
                _ => Err(self.invalid(unit)),
            },
            _ => Ok(value / self.factor(unit)?),
        }
    }

    /// Convert between two units of this quantity.
    pub fn convert(self, value: f64, from: &str, to: &str) -> Result<f64, EnvError> {
        self.from_si(self.to_si(value, from)?, to)
    }
}
