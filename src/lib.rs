// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate an astronomical alert stream.
//!
//! For every pointing of a survey, the objects of a catalog that the pointing
//! saw become alerts: a detection of the object in the pointing's filter plus
//! the object's earlier detections in the same field. Alerts are batched and
//! handed to a sink (TCP, UDP, files or a document store), and a checkpoint
//! records which pointings have been delivered so that an interrupted run can
//! be resumed.

pub mod alert;
pub mod catalog;
pub mod checkpoint;
mod cli;
pub mod constants;
pub mod coord;
pub mod dispatch;
pub mod io;
mod params;
pub mod photometry;
pub mod survey;

// Re-exports.
pub use cli::{Alertsim, AlertsimError};

use crossbeam_utils::atomic::AtomicCell;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
