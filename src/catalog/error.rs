// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::io::read::ReadTableError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Catalog database is unreachable: {0}")]
    Unreachable(#[from] ReadTableError),

    #[error("Object {id}: RA {ra}° is out of range (0° <= RA < 360°)")]
    InvalidRa { id: u64, ra: f64 },

    #[error("Object {id}: Dec {dec}° is out of range (-90° <= Dec <= 90°)")]
    InvalidDec { id: u64, dec: f64 },

    #[error("Object {id}: quiescent magnitudes must be finite")]
    NonFiniteMagnitudes { id: u64 },

    #[error("The cone-search radius must be positive and at most 180°, but got {0}°")]
    BadRadius(f64),
}
