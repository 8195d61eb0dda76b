// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::io::read::ReadTableError;

/// Errors associated with reading the survey database and building observation
/// histories.
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("Survey database error: {0}")]
    Read(#[from] ReadTableError),

    #[error("Visit {visit_id}: field RA {ra}° is out of range (0° <= RA < 360°)")]
    InvalidRa { visit_id: u32, ra: f64 },

    #[error("Visit {visit_id}: field Dec {dec}° is out of range (-90° <= Dec <= 90°)")]
    InvalidDec { visit_id: u32, dec: f64 },

    #[error("Visit {visit_id}: {column} is not finite")]
    NotFinite {
        visit_id: u32,
        column: &'static str,
    },

    #[error("Couldn't parse '{input}' as a number or a range like '100,200': {reason}")]
    BadConstraint { input: String, reason: String },

    #[error("Observation history for field {field_id} isn't strictly newest first")]
    NotNewestFirst { field_id: u32 },

    #[error("Observation history mixes fields {expected} and {got}")]
    MixedFields { expected: u32, got: u32 },
}
