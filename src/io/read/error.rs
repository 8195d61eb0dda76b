// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use super::TABLE_FILE_TYPES_COMMA_SEPARATED;

#[derive(Error, Debug)]
pub enum ReadTableError {
    #[error("Table '{}' doesn't have a recognised file extension! Valid extensions are: {}", .0.display(), *TABLE_FILE_TYPES_COMMA_SEPARATED)]
    UnrecognisedExtension(PathBuf),

    #[error("Couldn't read '{}': {err}", .file.display())]
    IO { file: PathBuf, err: std::io::Error },

    #[error("Couldn't decode json structure from '{}': {err}", .file.display())]
    Json {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't decode yaml structure from '{}': {err}", .file.display())]
    Yaml {
        file: PathBuf,
        err: serde_yaml::Error,
    },
}
