// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Handle (right ascension, declination) coordinates.
 */

use serde::{Deserialize, Serialize};

/// A struct containing a Right Ascension and Declination. All units are in
/// radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RADec {
    /// Right ascension \[radians\]
    pub ra: f64,
    /// Declination \[radians\]
    pub dec: f64,
}

impl RADec {
    /// Make a new `RADec` struct from values in radians.
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Make a new `RADec` struct from values in degrees.
    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self::new(ra.to_radians(), dec.to_radians())
    }

    /// Get the unit vector pointing at these coordinates.
    fn to_unit_vector(self) -> [f64; 3] {
        let (s_ra, c_ra) = self.ra.sin_cos();
        let (s_dec, c_dec) = self.dec.sin_cos();
        [c_dec * c_ra, c_dec * s_ra, s_dec]
    }

    /// Calculate the angular distance between two sets of coordinates
    /// \[radians\].
    ///
    /// Uses the ratio of the cross and dot products of the unit vectors, which
    /// is well-conditioned for both tiny and near-antipodal separations (this
    /// is the same approach as ERFA's `eraSeps`).
    pub fn separation(&self, b: &Self) -> f64 {
        let [ax, ay, az] = self.to_unit_vector();
        let [bx, by, bz] = b.to_unit_vector();
        let cross = [ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx];
        let sin_sep = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
        let cos_sep = ax * bx + ay * by + az * bz;
        if sin_sep == 0.0 && cos_sep == 0.0 {
            0.0
        } else {
            sin_sep.atan2(cos_sep)
        }
    }
}

impl std::fmt::Display for RADec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}°, {}°)", self.ra.to_degrees(), self.dec.to_degrees())
    }
}
