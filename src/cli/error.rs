// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all alertsim-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use super::simulate::SimulateArgsError;
use crate::{
    alert::{AssembleError, IdError},
    catalog::QueryError,
    checkpoint::CheckpointError,
    dispatch::DispatchError,
    io::{
        read::ReadTableError,
        receive::ReceiveError,
        sink::SinkError,
        write::{AlertWriteError, FileWriteError},
    },
    params::SimulateError,
    survey::SurveyError,
};

/// The *only* publicly visible error from alertsim. Most variants carry a hint
/// on what to try next.
#[derive(Error, Debug)]
pub enum AlertsimError {
    /// An error related to the arguments of `simulate`.
    #[error("{0}\n\nSee `alertsim simulate --help` for the available options.")]
    Simulate(String),

    /// An error related to the survey (opsim) database.
    #[error("{0}\n\nThe survey database is a JSON or YAML array of opsim summary rows (obsHistID, fieldID, fieldRA, fieldDec, filter, expMJD, night, rawSeeing, fiveSigmaDepth).")]
    Survey(String),

    /// An error related to the object catalog.
    #[error("{0}\n\nThe catalog is a JSON or YAML array of objects (id, ra, decl, umag..ymag, varParamStr, chipName).")]
    Catalog(String),

    /// An error made while building an alert.
    #[error("{0}")]
    Alert(String),

    /// An error from an alert destination.
    #[error("{0}\n\nIs anything listening? `alertsim receive` can stand in for a broker.")]
    Sink(String),

    /// An error related to the checkpoint store.
    #[error("{0}\n\nCheckpoints live in the state directory (--state-dir); only one run can use a state directory at a time.")]
    Checkpoint(String),

    /// An error from the test receiver.
    #[error("{0}")]
    Receive(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files hold the same options as the command line; `--save-toml` writes one out.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<SimulateArgsError> for AlertsimError {
    fn from(e: SimulateArgsError) -> Self {
        Self::Simulate(e.to_string())
    }
}

impl From<SimulateError> for AlertsimError {
    fn from(e: SimulateError) -> Self {
        match e {
            SimulateError::Survey(e) => Self::from(e),
            SimulateError::Query(e) => Self::from(e),
            SimulateError::Assemble(e) => Self::from(e),
            SimulateError::Sink(e) => Self::from(e),
            SimulateError::Dispatch(e) => Self::from(e),
            SimulateError::Checkpoint(e) => Self::from(e),
        }
    }
}

impl From<ReceiveError> for AlertsimError {
    fn from(e: ReceiveError) -> Self {
        let s = e.to_string();
        match e {
            ReceiveError::Bind { .. }
            | ReceiveError::NotMulticast(_)
            | ReceiveError::Join { .. }
            | ReceiveError::TooLong { .. } => Self::Receive(s),
            ReceiveError::IO(e) => Self::from(e),
        }
    }
}

// Library errors.

impl From<SurveyError> for AlertsimError {
    fn from(e: SurveyError) -> Self {
        Self::Survey(e.to_string())
    }
}

impl From<QueryError> for AlertsimError {
    fn from(e: QueryError) -> Self {
        Self::Catalog(e.to_string())
    }
}

impl From<AssembleError> for AlertsimError {
    fn from(e: AssembleError) -> Self {
        Self::Alert(e.to_string())
    }
}

impl From<IdError> for AlertsimError {
    fn from(e: IdError) -> Self {
        Self::Alert(e.to_string())
    }
}

impl From<AlertWriteError> for AlertsimError {
    fn from(e: AlertWriteError) -> Self {
        let s = e.to_string();
        match e {
            AlertWriteError::IdTooBigForAvro(_)
            | AlertWriteError::Avro(_)
            | AlertWriteError::Json(_) => Self::Alert(s),
            AlertWriteError::IO(e) => Self::from(e),
        }
    }
}

impl From<SinkError> for AlertsimError {
    fn from(e: SinkError) -> Self {
        let s = e.to_string();
        match e {
            SinkError::Resolve { .. }
            | SinkError::Connect { .. }
            | SinkError::Send { .. }
            | SinkError::BadAck { .. }
            | SinkError::TooBig { .. }
            | SinkError::File { .. }
            | SinkError::DocStore(_) => Self::Sink(s),
            SinkError::Encode(e) => Self::from(e),
            SinkError::OutputDir(e) => Self::from(e),
            SinkError::IO(e) => Self::from(e),
        }
    }
}

impl From<DispatchError> for AlertsimError {
    fn from(e: DispatchError) -> Self {
        let s = e.to_string();
        match e {
            DispatchError::Sink { .. } => Self::Sink(s),
            DispatchError::Finished | DispatchError::FailedFlush => Self::Generic(s),
            DispatchError::Checkpoint(e) => Self::from(e),
        }
    }
}

impl From<CheckpointError> for AlertsimError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e.to_string())
    }
}

impl From<ReadTableError> for AlertsimError {
    fn from(e: ReadTableError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<FileWriteError> for AlertsimError {
    fn from(e: FileWriteError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for AlertsimError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(format!("Couldn't serialise arguments to toml: {e}"))
    }
}

impl From<std::io::Error> for AlertsimError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
