// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read in a survey table.

use std::{collections::HashSet, path::Path};

use log::{debug, warn};

use super::{
    build_histories, ObservationHistory, Pointing, PointingSource, SurveyConstraint, SurveyError,
};
use crate::io::read::read_table;

/// Every visit in a survey database, in the order they were read, without
/// duplicate visit IDs.
#[derive(Debug, Clone)]
pub struct SurveyTable {
    pointings: Vec<Pointing>,
}

impl SurveyTable {
    /// Read a survey table from a json or yaml file.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<SurveyTable, SurveyError> {
        let pointings: Vec<Pointing> = read_table(file.as_ref())?;
        SurveyTable::new(pointings)
    }

    /// Validate `pointings` and drop any repeated visit IDs. The first
    /// occurrence of a visit ID wins.
    pub fn new(pointings: Vec<Pointing>) -> Result<SurveyTable, SurveyError> {
        let mut seen = HashSet::with_capacity(pointings.len());
        let mut unique = Vec::with_capacity(pointings.len());
        for p in pointings {
            if !(0.0..360.0).contains(&p.ra) {
                return Err(SurveyError::InvalidRa {
                    visit_id: p.visit_id,
                    ra: p.ra,
                });
            }
            if !(-90.0..=90.0).contains(&p.dec) {
                return Err(SurveyError::InvalidDec {
                    visit_id: p.visit_id,
                    dec: p.dec,
                });
            }
            if !p.mjd.is_finite() {
                return Err(SurveyError::NotFinite {
                    visit_id: p.visit_id,
                    column: "expMJD",
                });
            }
            if !p.five_sigma_depth.is_finite() {
                return Err(SurveyError::NotFinite {
                    visit_id: p.visit_id,
                    column: "fiveSigmaDepth",
                });
            }

            if seen.insert(p.visit_id) {
                unique.push(p);
            } else {
                warn!("Ignoring repeated survey visit {}", p.visit_id);
            }
        }
        debug!("Survey table has {} visits", unique.len());

        Ok(SurveyTable { pointings: unique })
    }

    pub fn pointings(&self) -> &[Pointing] {
        &self.pointings
    }
}

impl PointingSource for SurveyTable {
    fn histories(
        &self,
        constraint: &SurveyConstraint,
        lookback_days: f64,
    ) -> Result<Vec<ObservationHistory>, SurveyError> {
        build_histories(&self.pointings, constraint, lookback_days)
    }
}
