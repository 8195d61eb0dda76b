// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Checkpoints let an interrupted run continue where it stopped.
//!
//! A checkpoint is identified by a user-chosen token. It remembers the last
//! visit whose alerts were all delivered and, for full-history runs, the
//! fields that have been completely processed. Stored checkpoints only ever
//! move forward: saving merges with what is already stored.

mod error;

pub use error::CheckpointError;

use std::{collections::BTreeSet, path::Path};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

const CHECKPOINTS_TREE: &str = "checkpoints";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub token: String,

    /// The newest visit whose alerts have all been delivered. `None` until
    /// the first pointing completes.
    #[serde(rename = "last_obsHistID")]
    pub last_obs_hist_id: Option<u32>,

    /// Fields whose whole light curves have been delivered.
    #[serde(rename = "fieldIDs")]
    #[serde(default)]
    pub field_ids: BTreeSet<u32>,
}

impl Checkpoint {
    pub fn new<S: Into<String>>(token: S) -> Checkpoint {
        Checkpoint {
            token: token.into(),
            last_obs_hist_id: None,
            field_ids: BTreeSet::new(),
        }
    }

    /// Has the pointing with this visit ID already been delivered?
    pub fn skip_pointing(&self, visit_id: u32) -> bool {
        matches!(self.last_obs_hist_id, Some(last) if visit_id <= last)
    }

    /// Has this field's whole light curve already been delivered?
    pub fn skip_field(&self, field_id: u32) -> bool {
        self.field_ids.contains(&field_id)
    }

    /// Note that all alerts for a pointing were delivered. `completed_field`
    /// is given when the whole field is done.
    pub fn record_pointing(&mut self, visit_id: u32, completed_field: Option<u32>) {
        self.last_obs_hist_id = Some(self.last_obs_hist_id.map_or(visit_id, |l| l.max(visit_id)));
        if let Some(field_id) = completed_field {
            self.field_ids.insert(field_id);
        }
    }

    /// Combine with another checkpoint of the same token. The last visit ID
    /// can't go backwards and completed fields are never forgotten.
    pub fn merge(&mut self, other: &Checkpoint) {
        if let Some(visit_id) = other.last_obs_hist_id {
            self.record_pointing(visit_id, None);
        }
        self.field_ids.extend(other.field_ids.iter().copied());
    }
}

/// Checkpoints stored in a `sled` database, as JSON keyed by token.
pub struct CheckpointStore {
    db: sled::Db,
    checkpoints: sled::Tree,
}

impl CheckpointStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<CheckpointStore, CheckpointError> {
        let dir = dir.as_ref();
        debug!("Opening checkpoint store {}", dir.display());
        let db = sled::open(dir).map_err(|err| CheckpointError::Open {
            dir: dir.to_path_buf(),
            err,
        })?;
        let checkpoints = db.open_tree(CHECKPOINTS_TREE)?;
        Ok(CheckpointStore { db, checkpoints })
    }

    pub fn load(&self, token: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        match self.checkpoints.get(token.as_bytes())? {
            None => Ok(None),
            Some(bytes) => {
                let checkpoint =
                    serde_json::from_slice(&bytes).map_err(|err| CheckpointError::Corrupt {
                        token: token.to_string(),
                        err,
                    })?;
                Ok(Some(checkpoint))
            }
        }
    }

    /// The stored checkpoint for `token`, or a fresh one.
    pub fn load_or_new(&self, token: &str) -> Result<Checkpoint, CheckpointError> {
        Ok(self
            .load(token)?
            .unwrap_or_else(|| Checkpoint::new(token)))
    }

    /// Merge `checkpoint` into what is stored under its token, persist the
    /// result and return it.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<Checkpoint, CheckpointError> {
        let mut merged = self.load_or_new(&checkpoint.token)?;
        merged.merge(checkpoint);
        let bytes = serde_json::to_vec(&merged).map_err(CheckpointError::Encode)?;
        self.checkpoints.insert(merged.token.as_bytes(), bytes)?;
        self.db.flush()?;
        trace!(
            "Saved checkpoint '{}': last visit {:?}, {} completed fields",
            merged.token,
            merged.last_obs_hist_id,
            merged.field_ids.len()
        );
        Ok(merged)
    }

    /// All stored tokens.
    pub fn tokens(&self) -> Result<Vec<String>, CheckpointError> {
        self.checkpoints
            .iter()
            .keys()
            .map(|k| -> Result<String, CheckpointError> {
                Ok(String::from_utf8_lossy(&k?).into_owned())
            })
            .collect()
    }
}
