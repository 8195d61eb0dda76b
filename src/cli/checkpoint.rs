// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Show what has been delivered under a checkpoint token.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use super::common::STATE_DIR_HELP;
use crate::{
    checkpoint::{CheckpointError, CheckpointStore},
    constants::DEFAULT_STATE_DIR,
    AlertsimError,
};

#[derive(Parser, Debug)]
pub(super) struct CheckpointArgs {
    /// The token of the checkpoint to print. If not given, all stored tokens
    /// are listed.
    token: Option<String>,

    #[clap(long, help = STATE_DIR_HELP.as_str())]
    state_dir: Option<PathBuf>,
}

impl CheckpointArgs {
    pub(super) fn run(self) -> Result<(), AlertsimError> {
        let CheckpointArgs { token, state_dir } = self;
        let state_dir = state_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        // Opening a store that isn't there would create it.
        if !state_dir.is_dir() {
            return Err(CheckpointError::NoStore(state_dir).into());
        }
        let store = CheckpointStore::open(&state_dir)?;

        match token {
            Some(token) => {
                let checkpoint = store
                    .load(&token)?
                    .ok_or(CheckpointError::NoCheckpoint(token))?;
                let json =
                    serde_json::to_string_pretty(&checkpoint).map_err(CheckpointError::Encode)?;
                println!("{json}");
            }

            None => {
                let tokens = store.tokens()?;
                if tokens.is_empty() {
                    info!("No checkpoints in {}", state_dir.display());
                }
                for token in tokens {
                    println!("{token}");
                }
            }
        }

        Ok(())
    }
}
