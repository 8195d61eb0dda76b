// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Catalog objects seen by a pointing.
//!
//! A query returns the objects inside the cone-search radius around a
//! pointing centre that are bright enough to be detected in that pointing's
//! filter, given the pointing's 5-sigma depth.

mod error;
mod file;

pub use error::QueryError;
pub use file::{Catalog, CatalogObject};

use crate::{
    coord::RADec,
    photometry::{Band, Magnitudes, PhotometricSample, Variability},
    survey::Pointing,
};

/// Which catalog objects are wanted.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSelection {
    /// Only return objects with a light-curve model.
    pub variable_only: bool,

    /// Objects must be at least this bright in each listed band, at the epoch
    /// of the pointing.
    pub mag_limits: Vec<(Band, f64)>,
}

impl Default for CatalogSelection {
    fn default() -> Self {
        Self {
            variable_only: true,
            mag_limits: vec![],
        }
    }
}

/// One object as observed by a particular pointing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub id: u64,
    pub radec: RADec,
    pub quiescent: Magnitudes,
    pub chip_name: Option<String>,
    pub variability: Option<Variability>,
}

impl ObjectRecord {
    /// The photometry of this object in any pointing; the object's light curve
    /// is evaluated mid-exposure in the pointing's filter.
    pub fn sample(&self, pointing: &Pointing) -> PhotometricSample {
        let band = pointing.filter;
        let mjd = pointing.mid_exposure().to_mjd_tai_days();
        let delta = self
            .variability
            .as_ref()
            .map(|v| v.delta(band, mjd))
            .unwrap_or(0.0);
        let quiescent_mag = self.quiescent.get(band);
        PhotometricSample {
            band,
            tot_mag: quiescent_mag + delta,
            quiescent_mag,
            m5: pointing.five_sigma_depth,
        }
    }
}

/// An object inside a pointing's field of view whose variability parameters
/// couldn't be understood.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedObject {
    pub id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Sorted by object ID.
    pub objects: Vec<ObjectRecord>,
    pub malformed: Vec<MalformedObject>,
}

/// Anything that can find the objects observed by a pointing.
pub trait ObjectQuery {
    fn query(
        &self,
        pointing: &Pointing,
        selection: &CatalogSelection,
    ) -> Result<QueryOutcome, QueryError>;
}
