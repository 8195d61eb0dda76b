// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Input/output: reading survey and catalog tables, encoding alerts, and
//! handing alerts to their destinations.

pub(crate) mod read;
pub(crate) mod receive;
pub mod sink;
pub(crate) mod write;
