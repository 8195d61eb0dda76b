// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sending alerts over one persistent TCP connection.
//!
//! Each message is preceded by its length as a 4-byte big-endian unsigned
//! integer unless headers are turned off. The receiver replies with the number
//! of bytes it got as a decimal string, which must match what was sent.
//! Without a header the receiver takes one read to be one message, so
//! unframed messages can be no bigger than its read buffer.

use std::{
    io::{ErrorKind, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, trace, warn};

use super::{AlertSink, SinkError};
use crate::{
    alert::AlertBundle,
    constants::{MAX_FRAMED_MESSAGE_SIZE, SOCKET_BUFFER_SIZE, SOCKET_CONNECT_TIMEOUT_SECONDS},
    io::write::{encode_payload, PayloadFormat},
};

/// Write one message, with a length header if `header` is set.
fn write_message<W: Write>(w: &mut W, payload: &[u8], header: bool) -> std::io::Result<()> {
    if header {
        let len = u32::try_from(payload.len())
            .map_err(|_| std::io::Error::new(ErrorKind::InvalidInput, "message too long"))?;
        w.write_u32::<BigEndian>(len)?;
    }
    w.write_all(payload)?;
    w.flush()
}

/// Read an acknowledgement. A closed connection is an `UnexpectedEof` error.
fn read_ack<R: Read>(r: &mut R) -> std::io::Result<String> {
    let mut buf = vec![0; SOCKET_BUFFER_SIZE];
    let n = r.read(&mut buf)?;
    if n == 0 {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "connection closed before acknowledgement",
        ));
    }
    Ok(String::from_utf8_lossy(&buf[..n]).trim().to_string())
}

/// Has the peer gone away? These errors get one reconnect.
fn is_broken_pipe(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof
    )
}

pub(super) struct TcpSink {
    addr: SocketAddr,
    header: bool,
    format: PayloadFormat,
    stream: Option<TcpStream>,
    num_reconnects: usize,
}

impl TcpSink {
    pub(super) fn connect(
        addr: SocketAddr,
        header: bool,
        format: PayloadFormat,
    ) -> Result<TcpSink, SinkError> {
        let stream = open_stream(addr)?;
        Ok(TcpSink {
            addr,
            header,
            format,
            stream: Some(stream),
            num_reconnects: 0,
        })
    }

    /// Send one payload and return the acknowledgement.
    fn try_send(&mut self, payload: &[u8]) -> std::io::Result<String> {
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return Err(std::io::Error::new(ErrorKind::NotConnected, "not connected")),
        };
        write_message(stream, payload, self.header)?;
        read_ack(stream)
    }

    /// The largest payload that the receiver can take in one message.
    fn max_message_size(&self) -> usize {
        if self.header {
            MAX_FRAMED_MESSAGE_SIZE
        } else {
            SOCKET_BUFFER_SIZE
        }
    }

    fn send(&mut self, alert_id: u64, payload: &[u8]) -> Result<(), SinkError> {
        let limit = self.max_message_size();
        if payload.len() > limit {
            return Err(SinkError::TooBig {
                alert_id,
                size: payload.len(),
                limit,
            });
        }

        let ack = match self.try_send(payload) {
            Ok(ack) => ack,
            Err(e) if is_broken_pipe(&e) => {
                warn!("Connection to {} lost ({e}); reconnecting", self.addr);
                self.stream = None;
                self.stream = Some(open_stream(self.addr)?);
                self.num_reconnects += 1;
                self.try_send(payload).map_err(|err| {
                    self.shutdown();
                    SinkError::Send {
                        alert_id,
                        addr: self.addr,
                        err,
                    }
                })?
            }
            Err(err) => {
                self.shutdown();
                return Err(SinkError::Send {
                    alert_id,
                    addr: self.addr,
                    err,
                });
            }
        };

        trace!("Alert {alert_id}: {} bytes sent, ack '{ack}'", payload.len());
        if ack.parse::<usize>().ok() != Some(payload.len()) {
            self.shutdown();
            return Err(SinkError::BadAck {
                alert_id,
                addr: self.addr,
                expected: payload.len(),
                got: ack,
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone.
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

fn open_stream(addr: SocketAddr) -> Result<TcpStream, SinkError> {
    debug!("Connecting to {addr}");
    let stream =
        TcpStream::connect_timeout(&addr, Duration::from_secs(SOCKET_CONNECT_TIMEOUT_SECONDS))
            .map_err(|err| SinkError::Connect { addr, err })?;
    stream
        .set_nodelay(true)
        .map_err(|err| SinkError::Connect { addr, err })?;
    Ok(stream)
}

impl AlertSink for TcpSink {
    fn write_batch(&mut self, alerts: &[AlertBundle]) -> Result<(), SinkError> {
        for alert in alerts {
            let payload = encode_payload(alert, self.format)?;
            self.send(alert.alert_id, &payload)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.num_reconnects > 0 {
            debug!(
                "Reconnected to {} {} time(s)",
                self.addr, self.num_reconnects
            );
        }
        self.shutdown();
        Ok(())
    }
}
