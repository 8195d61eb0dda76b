// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A catalog read from a json or yaml table of stars.

use std::path::Path;

use log::{debug, trace, warn};
use serde::Deserialize;

use super::{
    MalformedObject, ObjectQuery, ObjectRecord, QueryError, QueryOutcome, CatalogSelection,
};
use crate::{
    coord::RADec,
    io::read::read_table,
    photometry::{Magnitudes, Variability},
    survey::Pointing,
};

/// A row of the catalog table; column names follow the simulated star tables.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "simobjid", alias = "id")]
    id: u64,

    /// \[degrees\]
    ra: f64,

    /// \[degrees\]
    decl: f64,

    umag: f64,
    gmag: f64,
    rmag: f64,
    imag: f64,
    zmag: f64,
    ymag: f64,

    #[serde(rename = "varParamStr", default)]
    var_param_str: Option<String>,

    #[serde(rename = "chipName", default)]
    chip_name: Option<String>,
}

/// A catalog object independent of any pointing. Variability parameters are
/// parsed once; objects with parameters that can't be parsed keep the reason.
#[derive(Debug, Clone)]
pub struct CatalogObject {
    pub id: u64,
    pub radec: RADec,
    pub quiescent: Magnitudes,
    pub chip_name: Option<String>,
    pub variability: Result<Option<Variability>, String>,
}

impl CatalogObject {
    fn from_row(row: CatalogRow) -> Result<CatalogObject, QueryError> {
        let CatalogRow {
            id,
            ra,
            decl,
            umag,
            gmag,
            rmag,
            imag,
            zmag,
            ymag,
            var_param_str,
            chip_name,
        } = row;

        if !(0.0..360.0).contains(&ra) {
            return Err(QueryError::InvalidRa { id, ra });
        }
        if !(-90.0..=90.0).contains(&decl) {
            return Err(QueryError::InvalidDec { id, dec: decl });
        }
        let quiescent = Magnitudes {
            u: umag,
            g: gmag,
            r: rmag,
            i: imag,
            z: zmag,
            y: ymag,
        };
        if !quiescent.is_finite() {
            return Err(QueryError::NonFiniteMagnitudes { id });
        }

        let variability =
            Variability::parse(var_param_str.as_deref().unwrap_or("")).map_err(|e| e.to_string());
        Ok(CatalogObject {
            id,
            radec: RADec::from_degrees(ra, decl),
            quiescent,
            chip_name,
            variability,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Sorted by ID.
    objects: Vec<CatalogObject>,

    /// The cone-search radius \[radians\].
    radius: f64,
}

impl Catalog {
    /// Open a catalog table. A missing or unreadable file means the catalog is
    /// unreachable.
    pub fn from_file<P: AsRef<Path>>(file: P, radius_deg: f64) -> Result<Catalog, QueryError> {
        let rows: Vec<CatalogRow> = read_table(file.as_ref())?;
        let objects = rows
            .into_iter()
            .map(CatalogObject::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(objects, radius_deg)
    }

    pub fn new(mut objects: Vec<CatalogObject>, radius_deg: f64) -> Result<Catalog, QueryError> {
        if !(radius_deg > 0.0 && radius_deg <= 180.0) {
            return Err(QueryError::BadRadius(radius_deg));
        }

        objects.sort_by_key(|o| o.id);
        let num_objects = objects.len();
        objects.dedup_by(|b, a| {
            let dup = a.id == b.id;
            if dup {
                warn!("Ignoring repeated catalog object {}", b.id);
            }
            dup
        });
        debug!(
            "Catalog has {} objects ({} repeats dropped)",
            objects.len(),
            num_objects - objects.len()
        );

        Ok(Catalog {
            objects,
            radius: radius_deg.to_radians(),
        })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectQuery for Catalog {
    fn query(
        &self,
        pointing: &Pointing,
        selection: &CatalogSelection,
    ) -> Result<QueryOutcome, QueryError> {
        let centre = pointing.radec();
        let mid_mjd = pointing.mid_exposure().to_mjd_tai_days();
        let mut outcome = QueryOutcome::default();

        for object in self
            .objects
            .iter()
            .filter(|o| o.radec.separation(&centre) <= self.radius)
        {
            let variability = match &object.variability {
                Ok(v) => v,
                Err(reason) => {
                    outcome.malformed.push(MalformedObject {
                        id: object.id,
                        reason: reason.clone(),
                    });
                    continue;
                }
            };
            if selection.variable_only && variability.is_none() {
                continue;
            }

            let deltas = variability
                .as_ref()
                .map(|v| v.deltas(mid_mjd))
                .unwrap_or_default();
            let mags = object.quiescent + deltas;
            if mags.get(pointing.filter) > pointing.five_sigma_depth {
                trace!(
                    "Object {} too faint for visit {}",
                    object.id,
                    pointing.visit_id
                );
                continue;
            }
            if selection
                .mag_limits
                .iter()
                .any(|&(band, limit)| mags.get(band) > limit)
            {
                continue;
            }

            outcome.objects.push(ObjectRecord {
                id: object.id,
                radec: object.radec,
                quiescent: object.quiescent,
                chip_name: object.chip_name.clone(),
                variability: variability.clone(),
            });
        }

        trace!(
            "Visit {}: {} objects, {} malformed",
            pointing.visit_id,
            outcome.objects.len(),
            outcome.malformed.len()
        );
        Ok(outcome)
    }
}
