// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sending alerts as UDP datagrams, either to a multicast group or a single
//! host. Multicast listeners may respond; responses are logged, not checked.

use std::{
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use log::{debug, trace};

use super::{AlertSink, SinkError};
use crate::{
    alert::AlertBundle,
    constants::{MAX_DATAGRAM_SIZE, MULTICAST_RESPONSE_TIMEOUT_SECONDS, SOCKET_BUFFER_SIZE},
    io::write::{encode_payload, PayloadFormat},
};

pub(super) struct UdpSink {
    socket: UdpSocket,
    addr: SocketAddr,
    multicast: bool,
    format: PayloadFormat,
    num_responses: usize,
}

impl UdpSink {
    pub(super) fn multicast(
        addr: SocketAddr,
        ttl: u32,
        format: PayloadFormat,
    ) -> Result<UdpSink, SinkError> {
        let socket = bind(addr)?;
        socket
            .set_multicast_ttl_v4(ttl)
            .map_err(|err| SinkError::Connect { addr, err })?;
        socket
            .set_read_timeout(Some(Duration::from_secs(
                MULTICAST_RESPONSE_TIMEOUT_SECONDS,
            )))
            .map_err(|err| SinkError::Connect { addr, err })?;
        Ok(UdpSink {
            socket,
            addr,
            multicast: true,
            format,
            num_responses: 0,
        })
    }

    pub(super) fn unicast(addr: SocketAddr, format: PayloadFormat) -> Result<UdpSink, SinkError> {
        Ok(UdpSink {
            socket: bind(addr)?,
            addr,
            multicast: false,
            format,
            num_responses: 0,
        })
    }

    /// How many responses multicast listeners have sent so far.
    pub(super) fn num_responses(&self) -> usize {
        self.num_responses
    }

    /// Collect responses until nothing arrives within the timeout.
    fn collect_responses(&mut self) -> Result<(), SinkError> {
        let mut buf = vec![0; SOCKET_BUFFER_SIZE];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    self.num_responses += 1;
                    trace!(
                        "Response from {from}: {}",
                        String::from_utf8_lossy(&buf[..n])
                    );
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(())
                }
                Err(e) => return Err(SinkError::IO(e)),
            }
        }
    }
}

fn bind(addr: SocketAddr) -> Result<UdpSocket, SinkError> {
    let local: SocketAddr = match addr {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (std::net::Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    UdpSocket::bind(local).map_err(|err| SinkError::Connect { addr, err })
}

impl AlertSink for UdpSink {
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError> {
        for alert in alerts {
            let payload = encode_payload(alert, self.format)?;
            if payload.len() > MAX_DATAGRAM_SIZE {
                return Err(SinkError::TooBig {
                    alert_id: alert.alert_id,
                    size: payload.len(),
                    limit: MAX_DATAGRAM_SIZE,
                });
            }
            self.socket
                .send_to(&payload, self.addr)
                .map_err(|err| SinkError::Send {
                    alert_id: alert.alert_id,
                    addr: self.addr,
                    err,
                })?;
        }
        if self.multicast {
            self.collect_responses()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.multicast {
            debug!("{} responses from {}", self.num_responses(), self.addr);
        }
        Ok(())
    }
}
