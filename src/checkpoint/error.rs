// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Couldn't open the checkpoint store '{}': {err}", dir.display())]
    Open { dir: PathBuf, err: sled::Error },

    #[error("There is no checkpoint store in '{}'", .0.display())]
    NoStore(PathBuf),

    #[error("There is no checkpoint for '{0}'")]
    NoCheckpoint(String),

    #[error("The stored checkpoint '{token}' is corrupt: {err}")]
    Corrupt {
        token: String,
        err: serde_json::Error,
    },

    #[error("Couldn't encode a checkpoint: {0}")]
    Encode(serde_json::Error),

    #[error("Checkpoint store error: {0}")]
    Store(#[from] sled::Error),
}
