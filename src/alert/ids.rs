// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identifiers derived from visit IDs, object IDs and chip names.
//!
//! All of these are pure functions of their inputs. Inputs that would make two
//! different sources share an identifier are rejected rather than wrapped.

use thiserror::Error;

use crate::constants::{CCD_VISIT_CHIP_FACTOR, SOURCE_ID_VISIT_FACTOR};

/// `objectId * 10^7 + visitId`.
pub fn dia_source_id(object_id: u64, visit_id: u32) -> Result<u64, IdError> {
    let visit_id = u64::from(visit_id);
    if visit_id >= SOURCE_ID_VISIT_FACTOR {
        return Err(IdError::VisitIdTooBig(visit_id));
    }
    object_id
        .checked_mul(SOURCE_ID_VISIT_FACTOR)
        .and_then(|v| v.checked_add(visit_id))
        .ok_or(IdError::ObjectIdTooBig(object_id))
}

/// `visitId * 10^4 + chipNum`.
pub fn ccd_visit_id(visit_id: u32, chip_num: u32) -> Result<u64, IdError> {
    let chip_num = u64::from(chip_num);
    if chip_num >= CCD_VISIT_CHIP_FACTOR {
        return Err(IdError::ChipNumTooBig(chip_num));
    }
    // A u32 times 10^4 always fits in a u64.
    Ok(u64::from(visit_id) * CCD_VISIT_CHIP_FACTOR + chip_num)
}

/// The digits of a chip name read as one number, e.g. "R:2,2 S:1,1" is 2211.
/// No chip name is chip 0.
pub fn chip_num(chip_name: Option<&str>) -> Result<u32, IdError> {
    let name = match chip_name {
        None => return Ok(0),
        Some(n) => n,
    };
    let mut num: u64 = 0;
    for d in name.chars().filter_map(|c| c.to_digit(10)) {
        num = num * 10 + u64::from(d);
        if num >= CCD_VISIT_CHIP_FACTOR {
            return Err(IdError::ChipName(name.to_string()));
        }
    }
    // Less than 10^4.
    Ok(num as u32)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("Visit ID {0} is too big to make a unique source ID (must be less than {SOURCE_ID_VISIT_FACTOR})")]
    VisitIdTooBig(u64),

    #[error("Object ID {0} is too big to make a unique source ID")]
    ObjectIdTooBig(u64),

    #[error("Chip number {0} is too big to make a unique CCD visit ID (must be less than {CCD_VISIT_CHIP_FACTOR})")]
    ChipNumTooBig(u64),

    #[error("Chip name '{0}' has too many digits to make a unique CCD visit ID")]
    ChipName(String),
}
