// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Survey pointings and the observation history of each sky field.
//!
//! The survey database is a table of visits (the "Summary" table of a survey
//! scheduler run). For every visit that satisfies a [`SurveyConstraint`], an
//! [`ObservationHistory`] is built: the visit itself followed by every earlier
//! visit of the same field within a lookback window, newest first.

mod error;
mod table;

pub use error::SurveyError;
pub use table::SurveyTable;

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use hifitime::{Duration, Epoch};
use log::trace;
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use crate::{coord::RADec, constants::MID_EXPOSURE_OFFSET_SECONDS, photometry::Band};

/// One visit of the telescope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pointing {
    #[serde(rename = "obsHistID")]
    pub visit_id: u32,

    #[serde(rename = "fieldID")]
    pub field_id: u32,

    /// \[degrees\]
    #[serde(rename = "fieldRA")]
    pub ra: f64,

    /// \[degrees\]
    #[serde(rename = "fieldDec")]
    pub dec: f64,

    pub filter: Band,

    /// The start of the exposure \[TAI MJD\].
    #[serde(rename = "expMJD")]
    pub mjd: f64,

    pub night: u32,

    /// \[arcsec\]
    #[serde(rename = "rawSeeing")]
    pub seeing: f64,

    /// The 5-sigma limiting magnitude.
    #[serde(rename = "fiveSigmaDepth")]
    pub five_sigma_depth: f64,
}

impl Pointing {
    pub fn radec(&self) -> RADec {
        RADec::from_degrees(self.ra, self.dec)
    }

    pub fn epoch(&self) -> Epoch {
        Epoch::from_mjd_tai(self.mjd)
    }

    /// The middle of the exposure. Sources are timestamped and light curves
    /// are sampled here.
    pub fn mid_exposure(&self) -> Epoch {
        self.epoch() + Duration::from_seconds(MID_EXPOSURE_OFFSET_SECONDS)
    }
}

/// Either a single value or an inclusive range, parsed from "100" or
/// "100,200".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberOrRange<T> {
    Single(T),
    Range(T, T),
}

impl<T: PartialOrd> NumberOrRange<T> {
    pub fn contains(&self, v: &T) -> bool {
        match self {
            NumberOrRange::Single(s) => v == s,
            NumberOrRange::Range(lo, hi) => lo <= v && v <= hi,
        }
    }
}

impl<T> FromStr for NumberOrRange<T>
where
    T: FromStr + PartialOrd,
    T::Err: Display,
{
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: String| SurveyError::BadConstraint {
            input: s.to_string(),
            reason,
        };
        let parse = |v: &str| v.trim().parse::<T>().map_err(|e| bad(e.to_string()));

        match s.split(',').collect::<Vec<_>>().as_slice() {
            [v] => Ok(NumberOrRange::Single(parse(v)?)),
            [lo, hi] => {
                let (lo, hi) = (parse(lo)?, parse(hi)?);
                if lo > hi {
                    return Err(bad("the lower bound is bigger than the upper bound".to_string()));
                }
                Ok(NumberOrRange::Range(lo, hi))
            }
            _ => Err(bad("expected at most two comma-separated values".to_string())),
        }
    }
}

/// Which visits are "current" visits, i.e. which visits generate alerts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyConstraint {
    pub night: Option<NumberOrRange<u32>>,
    pub filter: Option<Band>,
    pub mjd: Option<NumberOrRange<f64>>,
}

impl SurveyConstraint {
    pub fn matches(&self, p: &Pointing) -> bool {
        self.night.map(|n| n.contains(&p.night)).unwrap_or(true)
            && self.filter.map(|f| f == p.filter).unwrap_or(true)
            && self.mjd.map(|m| m.contains(&p.mjd)).unwrap_or(true)
    }
}

/// The pointings of a single field, newest first. The head is the current
/// pointing, the rest are earlier visits inside the lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationHistory {
    pointings: Vec1<Pointing>,
}

impl ObservationHistory {
    pub fn new(pointings: Vec1<Pointing>) -> Result<ObservationHistory, SurveyError> {
        let field_id = pointings.first().field_id;
        if let Some(p) = pointings.iter().find(|p| p.field_id != field_id) {
            return Err(SurveyError::MixedFields {
                expected: field_id,
                got: p.field_id,
            });
        }
        if pointings.windows(2).any(|w| w[0].mjd <= w[1].mjd) {
            return Err(SurveyError::NotNewestFirst { field_id });
        }
        Ok(ObservationHistory { pointings })
    }

    pub fn current(&self) -> &Pointing {
        self.pointings.first()
    }

    /// The earlier pointings, newest first.
    pub fn previous(&self) -> &[Pointing] {
        &self.pointings[1..]
    }

    pub fn field_id(&self) -> u32 {
        self.current().field_id
    }

    pub fn len(&self) -> usize {
        self.pointings.len()
    }

    pub fn iter(&self) -> std::slice::Iter<Pointing> {
        self.pointings.iter()
    }
}

/// Anything that can supply observation histories.
pub trait PointingSource {
    /// One [`ObservationHistory`] per pointing that satisfies `constraint`,
    /// ordered by the current pointing's (MJD, visit ID). No match is an empty
    /// collection.
    fn histories(
        &self,
        constraint: &SurveyConstraint,
        lookback_days: f64,
    ) -> Result<Vec<ObservationHistory>, SurveyError>;
}

/// Build observation histories from `pointings`, which must already be free of
/// duplicate visit IDs.
pub(crate) fn build_histories(
    pointings: &[Pointing],
    constraint: &SurveyConstraint,
    lookback_days: f64,
) -> Result<Vec<ObservationHistory>, SurveyError> {
    let mut by_field: BTreeMap<u32, Vec<&Pointing>> = BTreeMap::new();
    for p in pointings {
        by_field.entry(p.field_id).or_default().push(p);
    }
    for field in by_field.values_mut() {
        field.sort_by(|a, b| a.mjd.total_cmp(&b.mjd).then(a.visit_id.cmp(&b.visit_id)));
    }

    let mut histories = vec![];
    for current in pointings.iter().filter(|p| constraint.matches(p)) {
        let earliest = current.mjd - lookback_days;
        let mut h = Vec1::new(current.clone());
        if let Some(field) = by_field.get(&current.field_id) {
            for &prev in field
                .iter()
                .rev()
                .filter(|q| q.mjd < current.mjd && q.mjd >= earliest)
            {
                // Visits at the same instant can't be ordered; keep the first.
                if h.last().mjd == prev.mjd {
                    trace!(
                        "Ignoring visit {} in the history of visit {}; same MJD as visit {}",
                        prev.visit_id,
                        current.visit_id,
                        h.last().visit_id
                    );
                    continue;
                }
                h.push(prev.clone());
            }
        }
        histories.push(ObservationHistory::new(h)?);
    }

    histories.sort_by(|a, b| {
        let (a, b) = (a.current(), b.current());
        a.mjd.total_cmp(&b.mjd).then(a.visit_id.cmp(&b.visit_id))
    });
    Ok(histories)
}
