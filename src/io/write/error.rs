// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from encoding alerts.
#[derive(Error, Debug)]
pub enum AlertWriteError {
    #[error("ID {0} doesn't fit into an Avro long")]
    IdTooBigForAvro(u64),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FileWriteError {
    #[error("'{}' exists but isn't a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Directory '{}' is not writable", .0.display())]
    DirNotWritable(PathBuf),

    #[error("Couldn't create directory '{}'; permission denied", .0.display())]
    NewDirectory(PathBuf),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
