// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The other end of the network sinks. Every message is acknowledged with its
//! byte count and optionally kept.
//!
//! Over TCP, one connection is served until the peer closes it. Over UDP,
//! datagrams are answered (to their sender) like a multicast listener would.

use std::{
    io::{ErrorKind, Read, Write},
    net::{Ipv4Addr, TcpListener, UdpSocket},
};

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info, trace};
use thiserror::Error;

use crate::constants::{MAX_DATAGRAM_SIZE, MAX_FRAMED_MESSAGE_SIZE, SOCKET_BUFFER_SIZE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReceiveSummary {
    pub(crate) num_messages: usize,
    pub(crate) num_bytes: usize,
}

/// Read one message into `buf`. Returns `false` once the peer has closed the
/// connection.
fn read_message<R: Read>(
    r: &mut R,
    header: bool,
    buf: &mut Vec<u8>,
) -> Result<bool, ReceiveError> {
    if header {
        let len = match r.read_u32::<BigEndian>() {
            Ok(len) => len as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if len > MAX_FRAMED_MESSAGE_SIZE {
            return Err(ReceiveError::TooLong {
                len,
                limit: MAX_FRAMED_MESSAGE_SIZE,
            });
        }
        buf.resize(len, 0);
        r.read_exact(buf)?;
    } else {
        buf.resize(SOCKET_BUFFER_SIZE, 0);
        let n = r.read(buf)?;
        if n == 0 {
            return Ok(false);
        }
        buf.truncate(n);
    }
    Ok(true)
}

/// Serve one connection on `listener` until the peer closes it. Each message
/// is appended to `out` (if given) followed by a newline.
pub(crate) fn receive<W: Write>(
    listener: &TcpListener,
    header: bool,
    mut out: Option<W>,
) -> Result<ReceiveSummary, ReceiveError> {
    let (mut stream, peer) = listener.accept()?;
    info!("Accepted a connection from {peer}");

    let mut summary = ReceiveSummary::default();
    let mut buf = Vec::with_capacity(SOCKET_BUFFER_SIZE);
    while read_message(&mut stream, header, &mut buf)? {
        trace!("Received {} bytes", buf.len());
        stream.write_all(buf.len().to_string().as_bytes())?;
        stream.flush()?;

        if let Some(out) = out.as_mut() {
            out.write_all(&buf)?;
            out.write_all(b"\n")?;
        }
        summary.num_messages += 1;
        summary.num_bytes += buf.len();
    }
    debug!("{peer} closed the connection");

    if let Some(mut out) = out {
        out.flush()?;
    }
    Ok(summary)
}

/// Bind a UDP socket on `port`, joining the multicast `group` if one is
/// given.
pub(crate) fn bind_datagrams(
    port: u16,
    group: Option<Ipv4Addr>,
) -> Result<UdpSocket, ReceiveError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
        .map_err(|err| ReceiveError::Bind { port, err })?;
    if let Some(group) = group {
        if !group.is_multicast() {
            return Err(ReceiveError::NotMulticast(group));
        }
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|err| ReceiveError::Join { group, err })?;
        debug!("Joined multicast group {group}");
    }
    Ok(socket)
}

/// Answer datagrams on `socket`, replying to each sender with the byte count
/// it sent. Each datagram is appended to `out` (if given) followed by a
/// newline. Without `max_messages` this never returns successfully.
pub(crate) fn respond_to_datagrams<W: Write>(
    socket: &UdpSocket,
    max_messages: Option<usize>,
    mut out: Option<W>,
) -> Result<ReceiveSummary, ReceiveError> {
    let mut summary = ReceiveSummary::default();
    let mut buf = vec![0; MAX_DATAGRAM_SIZE];
    while max_messages.map_or(true, |max| summary.num_messages < max) {
        let (n, from) = socket.recv_from(&mut buf)?;
        trace!("Received {n} bytes from {from}");
        socket.send_to(n.to_string().as_bytes(), from)?;

        if let Some(out) = out.as_mut() {
            out.write_all(&buf[..n])?;
            out.write_all(b"\n")?;
            out.flush()?;
        }
        summary.num_messages += 1;
        summary.num_bytes += n;
    }
    Ok(summary)
}

#[derive(Error, Debug)]
pub(crate) enum ReceiveError {
    #[error("Couldn't listen on port {port}: {err}")]
    Bind { port: u16, err: std::io::Error },

    #[error("{0} isn't a multicast address")]
    NotMulticast(Ipv4Addr),

    #[error("Couldn't join multicast group {group}: {err}")]
    Join { group: Ipv4Addr, err: std::io::Error },

    #[error("The peer announced a {len}-byte message; at most {limit} bytes are accepted")]
    TooLong { len: usize, limit: usize },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
