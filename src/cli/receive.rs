// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A stand-in broker for the tcp sink, or a listener for the multicast and
//! unicast sinks.

use std::{
    fs::OpenOptions,
    io::BufWriter,
    net::{Ipv4Addr, TcpListener, UdpSocket},
    path::PathBuf,
};

use clap::Parser;
use log::info;

use super::common::{InfoPrinter, PORT_HELP};
use crate::{
    constants::DEFAULT_PORT,
    io::receive::{bind_datagrams, receive, respond_to_datagrams, ReceiveError},
    AlertsimError,
};

#[derive(Parser, Debug)]
pub(super) struct ReceiveArgs {
    #[clap(short, long, help = PORT_HELP.as_str())]
    port: Option<u16>,

    /// Don't expect a 4-byte big-endian length in front of every message.
    /// Each read is then taken to be one message.
    #[clap(long)]
    no_header: bool,

    /// Listen for UDP datagrams instead of a TCP connection. Every datagram
    /// is answered with its byte count.
    #[clap(long)]
    udp: bool,

    /// Join this multicast group. Implies --udp.
    #[clap(long)]
    group: Option<Ipv4Addr>,

    /// Stop after this many UDP datagrams. Without it, the UDP listener runs
    /// until it is killed.
    #[clap(long)]
    max_messages: Option<usize>,

    /// Append every message (and a newline) to this file.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

enum Listener {
    Tcp(TcpListener),
    Udp(UdpSocket),
}

impl ReceiveArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), AlertsimError> {
        let ReceiveArgs {
            port,
            no_header,
            udp,
            group,
            max_messages,
            output,
        } = self;
        let port = port.unwrap_or(DEFAULT_PORT);
        let header = !no_header;
        let udp = udp || group.is_some();

        let listener = if dry_run {
            None
        } else if udp {
            Some(Listener::Udp(bind_datagrams(port, group)?))
        } else {
            Some(Listener::Tcp(
                TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                    .map_err(|err| ReceiveError::Bind { port, err })?,
            ))
        };

        let mut printer = InfoPrinter::new("Receiving alerts".into());
        if udp {
            printer.push_line(format!("Listening on port {port} (UDP)").into());
            if let Some(group) = group {
                printer.push_line(format!("Multicast group {group}").into());
            }
            if let Some(max) = max_messages {
                printer.push_line(format!("Stopping after {max} datagrams").into());
            }
        } else {
            printer.push_line(format!("Listening on port {port}").into());
            printer.push_line(if header {
                "Messages have a length header".into()
            } else {
                "Messages have no length header".into()
            });
        }
        if let Some(output) = &output {
            printer.push_line(format!("Appending messages to {}", output.display()).into());
        }
        printer.display();

        let Some(listener) = listener else {
            info!("Dry run -- exiting now.");
            return Ok(());
        };
        let out = match output {
            Some(output) => Some(BufWriter::new(
                OpenOptions::new().create(true).append(true).open(output)?,
            )),
            None => None,
        };
        let summary = match listener {
            Listener::Tcp(listener) => receive(&listener, header, out)?,
            Listener::Udp(socket) => respond_to_datagrams(&socket, max_messages, out)?,
        };

        let mut printer = InfoPrinter::new("Receiver summary".into());
        printer.push_block(vec![
            format!("Messages: {}", summary.num_messages).into(),
            format!("Bytes: {}", summary.num_bytes).into(),
        ]);
        printer.display();
        Ok(())
    }
}
