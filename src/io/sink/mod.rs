// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Destinations for alerts.
//!
//! Every destination implements [`AlertSink`]; the dispatcher hands it whole
//! batches. Which sink is used is decided once, when the parameters are
//! parsed, from a [`SinkType`].

mod avro_files;
mod docstore;
mod error;
mod json_files;
mod tcp;
#[cfg(test)]
mod tests;
mod udp;

pub use error::SinkError;

use std::{
    net::{SocketAddr, ToSocketAddrs},
    path::PathBuf,
};

use itertools::Itertools;
use log::debug;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{alert::AlertBundle, io::write::PayloadFormat};
use avro_files::AvroFileSink;
use docstore::DocStoreSink;
use json_files::JsonFileSink;
use tcp::TcpSink;
use udp::UdpSink;

lazy_static::lazy_static! {
    pub(crate) static ref SINK_TYPES_COMMA_SEPARATED: String = SinkType::iter().join(", ");
}

/// Something that accepts batches of alerts.
pub trait AlertSink {
    /// Deliver every alert in `alerts`. On error, the caller still owns the
    /// batch; nothing is assumed to have been delivered.
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError>;

    /// Flush anything buffered and release the destination.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// All supported kinds of sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum SinkType {
    /// One persistent TCP connection with per-message acknowledgements.
    #[strum(serialize = "tcp")]
    Tcp,

    /// UDP datagrams to a multicast group.
    #[strum(serialize = "multicast")]
    Multicast,

    /// UDP datagrams to a single host.
    #[strum(serialize = "unicast")]
    Unicast,

    /// Newline-delimited JSON files, one per detector chip.
    #[strum(serialize = "json")]
    Json,

    /// Avro object container files, one per batch.
    #[strum(serialize = "avro")]
    Avro,

    /// An embedded document store.
    #[strum(serialize = "docstore")]
    DocStore,
}

impl SinkType {
    /// Does this sink send alerts over the network?
    pub fn is_network(self) -> bool {
        matches!(self, SinkType::Tcp | SinkType::Multicast | SinkType::Unicast)
    }
}

/// Everything needed to open a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkParams {
    Tcp {
        addr: SocketAddr,
        header: bool,
        format: PayloadFormat,
    },

    Multicast {
        addr: SocketAddr,
        ttl: u32,
        format: PayloadFormat,
    },

    Unicast {
        addr: SocketAddr,
        format: PayloadFormat,
    },

    JsonFiles {
        dir: PathBuf,
    },

    AvroFiles {
        dir: PathBuf,
    },

    DocStore {
        path: PathBuf,
    },
}

impl SinkParams {
    pub fn sink_type(&self) -> SinkType {
        match self {
            SinkParams::Tcp { .. } => SinkType::Tcp,
            SinkParams::Multicast { .. } => SinkType::Multicast,
            SinkParams::Unicast { .. } => SinkType::Unicast,
            SinkParams::JsonFiles { .. } => SinkType::Json,
            SinkParams::AvroFiles { .. } => SinkType::Avro,
            SinkParams::DocStore { .. } => SinkType::DocStore,
        }
    }

    /// A human-readable description of the destination.
    pub fn destination(&self) -> String {
        match self {
            SinkParams::Tcp { addr, .. }
            | SinkParams::Multicast { addr, .. }
            | SinkParams::Unicast { addr, .. } => addr.to_string(),
            SinkParams::JsonFiles { dir } | SinkParams::AvroFiles { dir } => {
                dir.display().to_string()
            }
            SinkParams::DocStore { path } => path.display().to_string(),
        }
    }

    /// Open the sink. Network sinks connect (or bind) here, so an unreachable
    /// destination is reported before any work is done.
    pub fn open(&self) -> Result<Box<dyn AlertSink>, SinkError> {
        debug!("Opening a {} sink to {}", self.sink_type(), self.destination());
        let sink: Box<dyn AlertSink> = match self {
            SinkParams::Tcp {
                addr,
                header,
                format,
            } => Box::new(TcpSink::connect(*addr, *header, *format)?),
            SinkParams::Multicast { addr, ttl, format } => {
                Box::new(UdpSink::multicast(*addr, *ttl, *format)?)
            }
            SinkParams::Unicast { addr, format } => Box::new(UdpSink::unicast(*addr, *format)?),
            SinkParams::JsonFiles { dir } => Box::new(JsonFileSink::new(dir.clone())),
            SinkParams::AvroFiles { dir } => Box::new(AvroFileSink::new(dir.clone())),
            SinkParams::DocStore { path } => Box::new(DocStoreSink::open(path)?),
        };
        Ok(sink)
    }
}

/// Resolve a host name and port into a socket address.
pub(crate) fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, SinkError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|err| SinkError::Resolve {
            host: host.to_string(),
            err,
        })?
        .next()
        .ok_or_else(|| SinkError::Resolve {
            host: host.to_string(),
            err: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
        })
}
