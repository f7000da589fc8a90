//! [`NumMethod`]: time integration of a sampled velocity field.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use slick_core::{add_seconds, EnvError, FlatEarth, WorldPoint};

/// Integration scheme used by velocity-field movers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumMethod {
    /// One evaluation at the start of the step.
    Euler,
    /// Midpoint method: evaluate at the start, step half-way, evaluate again.
    #[default]
    Rk2,
    /// Classic fourth-order Runge-Kutta.
    Rk4,
}

/// Result of integrating over one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Integrated {
    /// Displacement `(dx, dy)` in meters per point.
    pub meters: Vec<[f64; 2]>,
    /// Points where some stage sampled outside the field's domain.
    pub off_map: Vec<bool>,
}

fn offset(pos: &WorldPoint, v: [f64; 2], h: f64) -> WorldPoint {
    let d = FlatEarth::meters_to_lonlat([v[0] * h, v[1] * h, 0.0], pos);
    [pos[0] + d[0], pos[1] + d[1], pos[2]]
}

impl NumMethod {
    /// Integrate `sample` from `positions` at `t` over `dt` seconds.
    ///
    /// `sample` returns `None` for points outside its domain; such points
    /// are flagged off-map and get a zero displacement.
    pub fn integrate<F>(
        self,
        positions: &[WorldPoint],
        t: NaiveDateTime,
        dt: f64,
        mut sample: F,
    ) -> Result<Integrated, EnvError>
    where
        F: FnMut(&[WorldPoint], NaiveDateTime) -> Result<Vec<Option<[f64; 2]>>, EnvError>,
    {
        let n = positions.len();
        let mut off_map = vec![false; n];
        let mut stage = |pts: &[WorldPoint], time: NaiveDateTime, off: &mut [bool]| {
            sample(pts, time).map(|vals| {
                vals.into_iter()
                    .zip(off.iter_mut())
                    .map(|(v, o)| {
                        if v.is_none() {
                            *o = true;
                        }
                        v.unwrap_or([0.0; 2])
                    })
                    .collect::<Vec<[f64; 2]>>()
            })
        };
        let shifted = |vs: &[[f64; 2]], h: f64| -> Vec<WorldPoint> {
            positions
                .iter()
                .zip(vs)
                .map(|(p, v)| offset(p, *v, h))
                .collect()
        };

        let v0 = stage(positions, t, &mut off_map)?;
        let combined: Vec<[f64; 2]> = match self {
            NumMethod::Euler => v0,
            NumMethod::Rk2 => {
                let p1 = shifted(&v0, dt / 2.0);
                stage(&p1, add_seconds(t, dt / 2.0), &mut off_map)?
            }
            NumMethod::Rk4 => {
                let half = add_seconds(t, dt / 2.0);
                let v1 = stage(&shifted(&v0, dt / 2.0), half, &mut off_map)?;
                let v2 = stage(&shifted(&v1, dt / 2.0), half, &mut off_map)?;
                let v3 = stage(&shifted(&v2, dt), add_seconds(t, dt), &mut off_map)?;
                (0..n)
                    .map(|i| {
                        [
                            (v0[i][0] + 2.0 * v1[i][0] + 2.0 * v2[i][0] + v3[i][0]) / 6.0,
                            (v0[i][1] + 2.0 * v1[i][1] + 2.0 * v2[i][1] + v3[i][1]) / 6.0,
                        ]
                    })
                    .collect()
            }
        };
        let meters = combined
            .iter()
            .zip(&off_map)
            .map(|(v, off)| if *off { [0.0; 2] } else { [v[0] * dt, v[1] * dt] })
            .collect();
        Ok(Integrated { meters, off_map })
    }
}
