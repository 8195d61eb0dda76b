// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newline-delimited JSON files, one per detector chip, named
//! `<chip number>.json`. Files are appended to, so a resumed run continues
//! the files of the interrupted one.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

use log::debug;

use super::{AlertSink, SinkError};
use crate::{
    alert::AlertBundle,
    io::write::{can_write_to_dir, AlertWriteError},
};

pub(super) struct JsonFileSink {
    dir: PathBuf,
    files: BTreeMap<u32, BufWriter<File>>,
    checked_dir: bool,
}

impl JsonFileSink {
    pub(super) fn new(dir: PathBuf) -> JsonFileSink {
        JsonFileSink {
            dir,
            files: BTreeMap::new(),
            checked_dir: false,
        }
    }

    fn file_for_chip(&mut self, chip_num: u32) -> Result<&mut BufWriter<File>, SinkError> {
        match self.files.entry(chip_num) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let path = self.dir.join(format!("{chip_num}.json"));
                debug!("Opening {}", path.display());
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|err| SinkError::File { file: path, err })?;
                Ok(e.insert(BufWriter::new(f)))
            }
        }
    }

    fn flush_all(&mut self) -> Result<(), SinkError> {
        for (chip_num, f) in self.files.iter_mut() {
            f.flush().map_err(|err| SinkError::File {
                file: self.dir.join(format!("{chip_num}.json")),
                err,
            })?;
        }
        Ok(())
    }
}

impl AlertSink for JsonFileSink {
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError> {
        if !self.checked_dir {
            can_write_to_dir(&self.dir)?;
            self.checked_dir = true;
        }

        for alert in alerts {
            let line = serde_json::to_vec(alert).map_err(AlertWriteError::from)?;
            let chip_num = alert.chip_num();
            let f = self.file_for_chip(chip_num)?;
            f.write_all(&line)?;
            f.write_all(b"\n")?;
        }
        self.flush_all()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.flush_all()?;
        self.files.clear();
        Ok(())
    }
}
