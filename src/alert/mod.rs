// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Alerts: one object's current difference-image source plus its earlier
//! sources in the same field.

pub mod ids;

pub use ids::IdError;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    catalog::ObjectRecord,
    constants::CCD_VISIT_CHIP_FACTOR,
    photometry::Band,
    survey::{ObservationHistory, Pointing},
};

lazy_static::lazy_static! {
    pub(crate) static ref HISTORY_MODES_COMMA_SEPARATED: String = HistoryMode::iter().join(", ");
}

/// How much history goes into each alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum HistoryMode {
    /// No previous sources.
    #[strum(serialize = "none")]
    None,

    /// One alert per object per pointing; previous sources are the earlier
    /// pointings of the field.
    #[default]
    #[strum(serialize = "incremental")]
    Incremental,

    /// One alert per object per field, carrying the whole light curve inside
    /// the lookback window.
    #[strum(serialize = "full")]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    pub history: HistoryMode,

    /// Include flux errors, signal-to-noise and total fluxes.
    pub full_dia: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            history: HistoryMode::Incremental,
            full_dia: true,
        }
    }
}

/// A single detection of an object on a difference image. Only the magnitude
/// in the visit's filter is carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaSource {
    #[serde(rename = "diaSourceId")]
    pub dia_source_id: u64,

    #[serde(rename = "ccdVisitId")]
    pub ccd_visit_id: u64,

    #[serde(rename = "diaObjectId")]
    pub dia_object_id: u64,

    /// The middle of the exposure \[TAI MJD\].
    #[serde(rename = "midPointTai")]
    pub mid_point_tai: f64,

    #[serde(rename = "filterName")]
    pub filter_name: Band,

    /// \[degrees\]
    pub ra: f64,

    /// \[degrees\]
    pub decl: f64,

    pub mag: f64,

    /// Difference-image flux \[nJy\].
    #[serde(rename = "apFlux")]
    pub ap_flux: f64,

    #[serde(rename = "apFluxErr")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_flux_err: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,

    #[serde(rename = "totFlux")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tot_flux: Option<f64>,

    #[serde(rename = "totFluxErr")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tot_flux_err: Option<f64>,
}

/// What gets sent: the current source first, then earlier sources of the same
/// object, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertBundle {
    #[serde(rename = "alertId")]
    pub alert_id: u64,

    #[serde(rename = "diaSource")]
    pub dia_source: DiaSource,

    #[serde(rename = "prvDiaSources")]
    pub prv_dia_sources: Vec<DiaSource>,
}

impl AlertBundle {
    /// The chip that detected the current source.
    pub fn chip_num(&self) -> u32 {
        // Always less than 10^4.
        (self.dia_source.ccd_visit_id % CCD_VISIT_CHIP_FACTOR) as u32
    }
}

/// Derive the source of `object` as seen by `pointing`.
pub fn dia_source(
    object: &ObjectRecord,
    pointing: &Pointing,
    chip_num: u32,
    full_dia: bool,
) -> Result<DiaSource, IdError> {
    let sample = object.sample(pointing);
    let mid_point = pointing.mid_exposure();

    let mut source = DiaSource {
        dia_source_id: ids::dia_source_id(object.id, pointing.visit_id)?,
        ccd_visit_id: ids::ccd_visit_id(pointing.visit_id, chip_num)?,
        dia_object_id: object.id,
        mid_point_tai: mid_point.to_mjd_tai_days(),
        filter_name: sample.band,
        ra: object.radec.ra.to_degrees(),
        decl: object.radec.dec.to_degrees(),
        mag: sample.tot_mag,
        ap_flux: sample.diff_flux(),
        ap_flux_err: None,
        snr: None,
        tot_flux: None,
        tot_flux_err: None,
    };
    if full_dia {
        source.ap_flux_err = Some(sample.diff_flux_err());
        source.snr = Some(sample.snr());
        source.tot_flux = Some(sample.tot_flux());
        source.tot_flux_err = Some(sample.tot_flux_err());
    }
    Ok(source)
}

/// Build the alert for `object` at the current pointing of `history`.
pub fn assemble(
    object: &ObjectRecord,
    history: &ObservationHistory,
    options: AssembleOptions,
) -> Result<AlertBundle, AssembleError> {
    let current = history.current();
    let id_err = |visit_id: u32| {
        move |err: IdError| AssembleError::Id {
            object_id: object.id,
            visit_id,
            err,
        }
    };

    let chip_num = ids::chip_num(object.chip_name.as_deref()).map_err(id_err(current.visit_id))?;
    let current_source = dia_source(object, current, chip_num, options.full_dia)
        .map_err(id_err(current.visit_id))?;

    let prv_dia_sources = match options.history {
        HistoryMode::None => vec![],
        HistoryMode::Incremental | HistoryMode::Full => history
            .previous()
            .iter()
            .map(|p| dia_source(object, p, chip_num, options.full_dia).map_err(id_err(p.visit_id)))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(AlertBundle {
        alert_id: current_source.dia_source_id,
        dia_source: current_source,
        prv_dia_sources,
    })
}

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Object {object_id}, visit {visit_id}: {err}")]
    Id {
        object_id: u64,
        visit_id: u32,
        err: IdError,
    },
}
