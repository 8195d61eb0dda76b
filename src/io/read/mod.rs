// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read the tables standing in for the survey and catalog databases.

mod error;

pub use error::ReadTableError;

use std::{fs::File, io::BufReader, path::Path, str::FromStr};

use itertools::Itertools;
use log::debug;
use serde::de::DeserializeOwned;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

lazy_static::lazy_static! {
    pub static ref TABLE_FILE_TYPES_COMMA_SEPARATED: String = TableFileType::iter().join(", ");
}

/// All supported table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum TableFileType {
    #[strum(serialize = "json")]
    Json,

    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
}

impl TableFileType {
    pub(crate) fn from_path(path: &Path) -> Option<TableFileType> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| TableFileType::from_str(&e).ok())
    }
}

/// Read every row of a json or yaml table. The format is determined by the
/// file extension.
pub(crate) fn read_table<T: DeserializeOwned>(file: &Path) -> Result<Vec<T>, ReadTableError> {
    let file_type = TableFileType::from_path(file)
        .ok_or_else(|| ReadTableError::UnrecognisedExtension(file.to_path_buf()))?;
    debug!("Reading {file_type} table {}", file.display());

    let buf = BufReader::new(File::open(file).map_err(|err| ReadTableError::IO {
        file: file.to_path_buf(),
        err,
    })?);
    let rows = match file_type {
        TableFileType::Json => {
            serde_json::from_reader(buf).map_err(|err| ReadTableError::Json {
                file: file.to_path_buf(),
                err,
            })?
        }
        TableFileType::Yaml => {
            serde_yaml::from_reader(buf).map_err(|err| ReadTableError::Yaml {
                file: file.to_path_buf(),
                err,
            })?
        }
    };
    Ok(rows)
}
