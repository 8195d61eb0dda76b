// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One Avro object container file per batch, named after the batch's first
//! alert ID.

use std::{fs::File, io::BufWriter, path::PathBuf};

use log::debug;

use super::{AlertSink, SinkError};
use crate::{
    alert::AlertBundle,
    io::write::{avro::write_avro, can_write_to_dir},
};

pub(super) struct AvroFileSink {
    dir: PathBuf,
    checked_dir: bool,
    num_files: usize,
}

impl AvroFileSink {
    pub(super) fn new(dir: PathBuf) -> AvroFileSink {
        AvroFileSink {
            dir,
            checked_dir: false,
            num_files: 0,
        }
    }
}

impl AlertSink for AvroFileSink {
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError> {
        let first = match alerts.first() {
            Some(a) => a,
            None => return Ok(()),
        };
        if !self.checked_dir {
            can_write_to_dir(&self.dir)?;
            self.checked_dir = true;
        }

        let path = self.dir.join(format!("alerts_{}.avro", first.alert_id));
        debug!("Writing {} alerts to {}", alerts.len(), path.display());
        let f = File::create(&path).map_err(|err| SinkError::File {
            file: path.clone(),
            err,
        })?;
        let writer = write_avro(BufWriter::new(f), alerts)?;
        writer
            .into_inner()
            .map_err(|e| SinkError::File {
                file: path,
                err: e.into_error(),
            })?
            .sync_all()?;
        self.num_files += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        debug!("Wrote {} Avro files to {}", self.num_files, self.dir.display());
        Ok(())
    }
}
