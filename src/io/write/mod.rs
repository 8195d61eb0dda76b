// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle serialising alerts.

pub(crate) mod avro;
mod error;
pub(crate) mod voevent;

pub use error::{AlertWriteError, FileWriteError};

use std::path::Path;

use itertools::Itertools;
use log::trace;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{alert::AlertBundle, cli::Warn};

/// How a single alert is encoded when it's sent over the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum PayloadFormat {
    /// VOEvent 2.0 XML.
    #[default]
    #[strum(serialize = "voevent")]
    VoEvent,

    /// A JSON alert record.
    #[strum(serialize = "json")]
    Json,
}

lazy_static::lazy_static! {
    pub(crate) static ref PAYLOAD_FORMATS_COMMA_SEPARATED: String = PayloadFormat::iter().join(", ");
}

/// Encode one alert.
pub fn encode_payload(alert: &AlertBundle, format: PayloadFormat) -> Result<Vec<u8>, AlertWriteError> {
    match format {
        PayloadFormat::VoEvent => {
            let mut buf = Vec::with_capacity(4096);
            voevent::write_voevent(&mut buf, alert)?;
            Ok(buf)
        }
        PayloadFormat::Json => Ok(serde_json::to_vec(alert)?),
    }
}

/// Make sure an output directory exists and that we can write into it. A
/// non-empty existing directory generates a warning, because files in it may
/// be appended to or overwritten.
pub(crate) fn can_write_to_dir(dir: &Path) -> Result<(), FileWriteError> {
    trace!("Testing whether we can write to {}", dir.display());

    if dir.exists() {
        if !dir.is_dir() {
            return Err(FileWriteError::NotADirectory(dir.to_path_buf()));
        }
        let metadata = std::fs::metadata(dir)?;
        if metadata.permissions().readonly() {
            return Err(FileWriteError::DirNotWritable(dir.to_path_buf()));
        }
        if std::fs::read_dir(dir)?.next().is_some() {
            format!(
                "Output directory '{}' is not empty; existing files may be appended to",
                dir.display()
            )
            .warn();
        }
    } else {
        match std::fs::DirBuilder::new()
            .recursive(true)
            .create(dir)
            .map_err(|e| e.kind())
        {
            Ok(()) => (),
            Err(std::io::ErrorKind::PermissionDenied) => {
                return Err(FileWriteError::NewDirectory(dir.to_path_buf()))
            }
            Err(e) => return Err(FileWriteError::IO(e.into())),
        }
    }

    Ok(())
}
