// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Photometric bands, magnitudes and fluxes.
//!
//! All magnitudes are AB magnitudes and all fluxes are in nJy.

mod variability;

pub use variability::{Variability, VariabilityError};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::constants::AB_ZERO_POINT_NJY;

lazy_static::lazy_static! {
    pub(crate) static ref BANDS_COMMA_SEPARATED: String = Band::iter().join(", ");
}

/// A survey filter band.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
    Y,
}

/// One value per [`Band`]. Used for quiescent magnitudes, magnitude deltas and
/// per-band variability parameters. Missing bands deserialise as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Magnitudes {
    pub u: f64,
    pub g: f64,
    pub r: f64,
    pub i: f64,
    pub z: f64,
    pub y: f64,
}

impl Magnitudes {
    /// The same value in every band.
    pub fn splat(v: f64) -> Magnitudes {
        Magnitudes {
            u: v,
            g: v,
            r: v,
            i: v,
            z: v,
            y: v,
        }
    }

    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::U => self.u,
            Band::G => self.g,
            Band::R => self.r,
            Band::I => self.i,
            Band::Z => self.z,
            Band::Y => self.y,
        }
    }

    /// Apply `f` to every band.
    pub fn map<F: Fn(Band, f64) -> f64>(&self, f: F) -> Magnitudes {
        Magnitudes {
            u: f(Band::U, self.u),
            g: f(Band::G, self.g),
            r: f(Band::R, self.r),
            i: f(Band::I, self.i),
            z: f(Band::Z, self.z),
            y: f(Band::Y, self.y),
        }
    }

    /// Are all of the values finite?
    pub fn is_finite(&self) -> bool {
        Band::iter().all(|b| self.get(b).is_finite())
    }
}

impl std::ops::Add for Magnitudes {
    type Output = Magnitudes;

    fn add(self, rhs: Magnitudes) -> Magnitudes {
        self.map(|b, v| v + rhs.get(b))
    }
}

/// Convert an AB magnitude to a flux density \[nJy\].
pub fn flux_from_mag(mag: f64) -> f64 {
    10.0_f64.powf(-0.4 * (mag - AB_ZERO_POINT_NJY))
}

/// The signal-to-noise ratio of a source with magnitude `mag` observed in a
/// visit with a 5-sigma limiting magnitude of `m5`.
pub fn snr_from_m5(mag: f64, m5: f64) -> f64 {
    5.0 * 10.0_f64.powf(-0.4 * (mag - m5))
}

/// Photometry of one object in one visit. `tot_mag` is what was observed,
/// `quiescent_mag` is the reference (template) magnitude in the same band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotometricSample {
    pub band: Band,
    pub tot_mag: f64,
    pub quiescent_mag: f64,
    /// The 5-sigma limiting magnitude of the visit.
    pub m5: f64,
}

impl PhotometricSample {
    /// The total (direct-image) flux \[nJy\].
    pub fn tot_flux(&self) -> f64 {
        flux_from_mag(self.tot_mag)
    }

    /// The difference-image flux: observed minus quiescent \[nJy\].
    pub fn diff_flux(&self) -> f64 {
        flux_from_mag(self.tot_mag) - flux_from_mag(self.quiescent_mag)
    }

    pub fn snr(&self) -> f64 {
        snr_from_m5(self.tot_mag, self.m5)
    }

    /// The uncertainty on the total flux \[nJy\].
    pub fn tot_flux_err(&self) -> f64 {
        self.tot_flux() / self.snr()
    }

    /// The uncertainty on the difference flux; the total and quiescent flux
    /// errors added in quadrature \[nJy\].
    pub fn diff_flux_err(&self) -> f64 {
        let quiescent_err =
            flux_from_mag(self.quiescent_mag) / snr_from_m5(self.quiescent_mag, self.m5);
        self.tot_flux_err().hypot(quiescent_err)
    }
}
