// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::io::write::{AlertWriteError, FileWriteError};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Couldn't resolve '{host}': {err}")]
    Resolve { host: String, err: std::io::Error },

    #[error("Couldn't connect to {addr}: {err}")]
    Connect {
        addr: SocketAddr,
        err: std::io::Error,
    },

    #[error("Sending alert {alert_id} to {addr} failed: {err}")]
    Send {
        alert_id: u64,
        addr: SocketAddr,
        err: std::io::Error,
    },

    #[error("{addr} acknowledged {got} bytes for alert {alert_id}, but {expected} bytes were sent")]
    BadAck {
        alert_id: u64,
        addr: SocketAddr,
        expected: usize,
        got: String,
    },

    #[error("Alert {alert_id} is {size} bytes; too big for one {limit}-byte message")]
    TooBig {
        alert_id: u64,
        size: usize,
        limit: usize,
    },

    #[error("Couldn't write '{}': {err}", file.display())]
    File { file: PathBuf, err: std::io::Error },

    #[error("Document store error: {0}")]
    DocStore(#[from] sled::Error),

    #[error(transparent)]
    Encode(#[from] AlertWriteError),

    #[error(transparent)]
    OutputDir(#[from] FileWriteError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
