// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing alerts into Avro object container files.
//!
//! Every field of the record is required; optional photometry that wasn't
//! computed is written as NaN.

use std::io::Write;

use apache_avro::{Schema, Writer};
use serde::{Deserialize, Serialize};

use super::AlertWriteError;
use crate::alert::{AlertBundle, DiaSource};

pub(crate) const ALERT_SCHEMA: &str = r#"
{
  "type": "record",
  "name": "alert",
  "namespace": "alertsim",
  "fields": [
    {"name": "alertId", "type": "long"},
    {"name": "diaSource", "type": {
      "type": "record",
      "name": "diaSource",
      "fields": [
        {"name": "diaSourceId", "type": "long"},
        {"name": "ccdVisitId", "type": "long"},
        {"name": "diaObjectId", "type": "long"},
        {"name": "midPointTai", "type": "double"},
        {"name": "filterName", "type": "string"},
        {"name": "ra", "type": "double"},
        {"name": "decl", "type": "double"},
        {"name": "mag", "type": "double"},
        {"name": "apFlux", "type": "double"},
        {"name": "apFluxErr", "type": "double"},
        {"name": "snr", "type": "double"},
        {"name": "totFlux", "type": "double"},
        {"name": "totFluxErr", "type": "double"}
      ]
    }},
    {"name": "prvDiaSources", "type": {"type": "array", "items": "diaSource"}}
  ]
}
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AvroDiaSource {
    #[serde(rename = "diaSourceId")]
    pub(crate) dia_source_id: i64,
    #[serde(rename = "ccdVisitId")]
    pub(crate) ccd_visit_id: i64,
    #[serde(rename = "diaObjectId")]
    pub(crate) dia_object_id: i64,
    #[serde(rename = "midPointTai")]
    pub(crate) mid_point_tai: f64,
    #[serde(rename = "filterName")]
    pub(crate) filter_name: String,
    pub(crate) ra: f64,
    pub(crate) decl: f64,
    pub(crate) mag: f64,
    #[serde(rename = "apFlux")]
    pub(crate) ap_flux: f64,
    #[serde(rename = "apFluxErr")]
    pub(crate) ap_flux_err: f64,
    pub(crate) snr: f64,
    #[serde(rename = "totFlux")]
    pub(crate) tot_flux: f64,
    #[serde(rename = "totFluxErr")]
    pub(crate) tot_flux_err: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AvroAlert {
    #[serde(rename = "alertId")]
    pub(crate) alert_id: i64,
    #[serde(rename = "diaSource")]
    pub(crate) dia_source: AvroDiaSource,
    #[serde(rename = "prvDiaSources")]
    pub(crate) prv_dia_sources: Vec<AvroDiaSource>,
}

fn long(id: u64) -> Result<i64, AlertWriteError> {
    i64::try_from(id).map_err(|_| AlertWriteError::IdTooBigForAvro(id))
}

impl TryFrom<&DiaSource> for AvroDiaSource {
    type Error = AlertWriteError;

    fn try_from(s: &DiaSource) -> Result<Self, Self::Error> {
        Ok(AvroDiaSource {
            dia_source_id: long(s.dia_source_id)?,
            ccd_visit_id: long(s.ccd_visit_id)?,
            dia_object_id: long(s.dia_object_id)?,
            mid_point_tai: s.mid_point_tai,
            filter_name: s.filter_name.to_string(),
            ra: s.ra,
            decl: s.decl,
            mag: s.mag,
            ap_flux: s.ap_flux,
            ap_flux_err: s.ap_flux_err.unwrap_or(f64::NAN),
            snr: s.snr.unwrap_or(f64::NAN),
            tot_flux: s.tot_flux.unwrap_or(f64::NAN),
            tot_flux_err: s.tot_flux_err.unwrap_or(f64::NAN),
        })
    }
}

impl TryFrom<&AlertBundle> for AvroAlert {
    type Error = AlertWriteError;

    fn try_from(a: &AlertBundle) -> Result<Self, Self::Error> {
        Ok(AvroAlert {
            alert_id: long(a.alert_id)?,
            dia_source: AvroDiaSource::try_from(&a.dia_source)?,
            prv_dia_sources: a
                .prv_dia_sources
                .iter()
                .map(AvroDiaSource::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Write `alerts` as one Avro object container into `w`, with the schema
/// embedded in the header.
pub(crate) fn write_avro<W: Write>(w: W, alerts: &[AlertBundle]) -> Result<W, AlertWriteError> {
    let schema = Schema::parse_str(ALERT_SCHEMA)?;
    let mut writer = Writer::new(&schema, w);
    for alert in alerts {
        writer.append_ser(AvroAlert::try_from(alert)?)?;
    }
    Ok(writer.into_inner()?)
}
