// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Alerts as JSON documents in an embedded `sled` database, keyed by the
//! big-endian alert ID so that keys iterate in alert-ID order.

use std::path::Path;

use log::debug;

use super::{AlertSink, SinkError};
use crate::{alert::AlertBundle, io::write::AlertWriteError};

pub(crate) const ALERTS_TREE: &str = "alerts";

pub(super) struct DocStoreSink {
    db: sled::Db,
    alerts: sled::Tree,
}

impl DocStoreSink {
    pub(super) fn open(path: &Path) -> Result<DocStoreSink, SinkError> {
        debug!("Opening document store {}", path.display());
        let db = sled::open(path)?;
        let alerts = db.open_tree(ALERTS_TREE)?;
        Ok(DocStoreSink { db, alerts })
    }
}

impl AlertSink for DocStoreSink {
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError> {
        let mut batch = sled::Batch::default();
        for alert in alerts {
            let doc = serde_json::to_vec(alert).map_err(AlertWriteError::from)?;
            batch.insert(alert.alert_id.to_be_bytes().to_vec(), doc);
        }
        self.alerts.apply_batch(batch)?;
        self.alerts.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        debug!("{} alerts in the document store", self.alerts.len());
        self.db.flush()?;
        Ok(())
    }
}
