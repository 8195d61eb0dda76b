// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Batching alerts on their way to a sink.
//!
//! Alerts accumulate until the batch reaches the threshold, at which point the
//! whole batch is handed to the sink in one call. When a pointing has been
//! exhausted, the partial batch is drained and the checkpoint moves forward.
//! Only then is the pointing considered delivered.
//!
//! If the sink fails, the batch is kept and the error is returned; the
//! checkpoint is not touched.


use std::num::NonZeroUsize;

use log::{debug, trace};
use strum_macros::Display;
use thiserror::Error;

use crate::{
    alert::AlertBundle,
    checkpoint::{Checkpoint, CheckpointError, CheckpointStore},
    io::sink::{AlertSink, SinkError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DispatchState {
    Accumulating,
    Flushing,
    Draining,
    Done,
}

/// What the dispatcher did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub num_flushes: usize,
    pub num_records: usize,
}

pub struct ChunkedDispatcher {
    sink: Box<dyn AlertSink>,
    threshold: NonZeroUsize,
    batch: Vec<AlertBundle>,
    state: DispatchState,
    summary: DispatchSummary,

    checkpoint: Checkpoint,
    /// Where the checkpoint is persisted. Without a store, the checkpoint
    /// only lives as long as the run.
    store: Option<CheckpointStore>,
}

impl ChunkedDispatcher {
    pub fn new(
        sink: Box<dyn AlertSink>,
        threshold: NonZeroUsize,
        checkpoint: Checkpoint,
        store: Option<CheckpointStore>,
    ) -> ChunkedDispatcher {
        ChunkedDispatcher {
            sink,
            threshold,
            batch: Vec::with_capacity(threshold.get()),
            state: DispatchState::Accumulating,
            summary: DispatchSummary::default(),
            checkpoint,
            store,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn summary(&self) -> DispatchSummary {
        self.summary
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// The number of alerts waiting to be flushed.
    pub fn num_pending(&self) -> usize {
        self.batch.len()
    }

    pub fn push(&mut self, alert: AlertBundle) -> Result<(), DispatchError> {
        self.check_running()?;
        self.batch.push(alert);
        if self.batch.len() >= self.threshold.get() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DispatchError> {
        let previous = self.state;
        self.state = DispatchState::Flushing;
        trace!("Flushing {} alerts", self.batch.len());
        self.sink
            .write_batch(&self.batch)
            .map_err(|err| DispatchError::Sink {
                num_records: self.batch.len(),
                err,
            })?;

        self.summary.num_flushes += 1;
        self.summary.num_records += self.batch.len();
        self.batch.clear();
        self.state = previous;
        Ok(())
    }

    /// The current pointing is exhausted: flush what's left and record that
    /// `visit_id` (and, if given, the whole of `completed_field`) has been
    /// delivered.
    pub fn drain(&mut self, visit_id: u32, completed_field: Option<u32>) -> Result<(), DispatchError> {
        self.check_running()?;
        self.state = DispatchState::Draining;
        if !self.batch.is_empty() {
            self.flush()?;
        }

        self.checkpoint.record_pointing(visit_id, completed_field);
        if let Some(store) = &self.store {
            self.checkpoint = store.save(&self.checkpoint)?;
        }
        self.state = DispatchState::Accumulating;
        Ok(())
    }

    /// Flush anything left over and close the sink.
    pub fn finish(&mut self) -> Result<DispatchSummary, DispatchError> {
        self.check_running()?;
        if !self.batch.is_empty() {
            self.state = DispatchState::Draining;
            self.flush()?;
        }
        self.sink.close().map_err(|err| DispatchError::Sink {
            num_records: 0,
            err,
        })?;
        self.state = DispatchState::Done;
        debug!(
            "Dispatched {} alerts in {} flushes",
            self.summary.num_records, self.summary.num_flushes
        );
        Ok(self.summary)
    }

    fn check_running(&self) -> Result<(), DispatchError> {
        match self.state {
            DispatchState::Done => Err(DispatchError::Finished),
            DispatchState::Flushing => Err(DispatchError::FailedFlush),
            DispatchState::Accumulating | DispatchState::Draining => Ok(()),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("The sink failed while handling a batch of {num_records} alerts: {err}")]
    Sink { num_records: usize, err: SinkError },

    #[error("The dispatcher has already finished")]
    Finished,

    #[error("A previous flush failed; the dispatcher can't continue")]
    FailedFlush,

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
