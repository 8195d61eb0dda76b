// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Light-curve models attached to catalog objects.
//!
//! A catalog carries a variability parameter string per object, e.g.
//!
//! ```json
//! {"m": "periodic", "p": {"period": 0.5, "t0": 59000.0, "amplitude": 0.3}}
//! {"m": "linear", "p": {"t0": 59000.0, "rate": {"g": 0.01, "r": 0.02}}}
//! ```
//!
//! Amplitudes and rates are either a single number (used for all bands) or a
//! per-band map. The strings "None", "null" and "" mean "no variability".

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Band, Magnitudes};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerBand {
    Scalar(f64),
    Bands(Magnitudes),
}

impl PerBand {
    fn get(&self, band: Band) -> f64 {
        match self {
            PerBand::Scalar(v) => *v,
            PerBand::Bands(m) => m.get(band),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            PerBand::Scalar(v) => v.is_finite(),
            PerBand::Bands(m) => m.is_finite(),
        }
    }
}

/// A deterministic light-curve model. Deltas are in magnitudes and are added
/// to an object's quiescent magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "m", content = "p", rename_all = "lowercase")]
pub enum Variability {
    /// `amplitude * sin(2pi (t - t0) / period)`
    Periodic {
        /// \[days\]
        period: f64,
        /// \[MJD\]
        t0: f64,
        amplitude: PerBand,
    },

    /// `rate * (t - t0)` after `t0`, zero before.
    Linear {
        /// \[MJD\]
        t0: f64,
        /// \[mag/day\]
        rate: PerBand,
    },
}

impl Variability {
    /// Parse a variability parameter string. `Ok(None)` means the object isn't
    /// variable.
    pub fn parse(s: &str) -> Result<Option<Variability>, VariabilityError> {
        let s = s.trim();
        if s.is_empty() || s == "None" || s == "null" {
            return Ok(None);
        }

        let v: Variability =
            serde_json::from_str(s).map_err(|e| VariabilityError::Parse {
                input: s.to_string(),
                err: e.to_string(),
            })?;
        match &v {
            Variability::Periodic {
                period,
                t0,
                amplitude,
            } => {
                if !(period.is_finite() && *period > 0.0) {
                    return Err(VariabilityError::BadPeriod(*period));
                }
                if !t0.is_finite() {
                    return Err(VariabilityError::NotFinite("t0"));
                }
                if !amplitude.is_finite() {
                    return Err(VariabilityError::NotFinite("amplitude"));
                }
            }
            Variability::Linear { t0, rate } => {
                if !t0.is_finite() {
                    return Err(VariabilityError::NotFinite("t0"));
                }
                if !rate.is_finite() {
                    return Err(VariabilityError::NotFinite("rate"));
                }
            }
        }

        Ok(Some(v))
    }

    /// The magnitude delta in `band` at time `mjd`.
    pub fn delta(&self, band: Band, mjd: f64) -> f64 {
        match self {
            Variability::Periodic {
                period,
                t0,
                amplitude,
            } => amplitude.get(band) * (TAU * (mjd - t0) / period).sin(),
            Variability::Linear { t0, rate } => {
                if mjd < *t0 {
                    0.0
                } else {
                    rate.get(band) * (mjd - t0)
                }
            }
        }
    }

    /// The magnitude deltas in all bands at time `mjd`.
    pub fn deltas(&self, mjd: f64) -> Magnitudes {
        Magnitudes::default().map(|b, _| self.delta(b, mjd))
    }
}

#[derive(Error, Debug)]
pub enum VariabilityError {
    #[error("Couldn't parse variability parameters '{input}': {err}")]
    Parse { input: String, err: String },

    #[error("Periodic variability requires a positive period, but got {0}")]
    BadPeriod(f64),

    #[error("Variability parameter '{0}' is not finite")]
    NotFinite(&'static str),
}
