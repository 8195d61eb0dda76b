// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    io::{Read, Write},
    net::{TcpListener, UdpSocket},
    str::FromStr,
    thread,
};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tempfile::TempDir;

use super::{udp::UdpSink, *};
use crate::{
    constants::{MAX_FRAMED_MESSAGE_SIZE, SOCKET_BUFFER_SIZE},
    io::{
        receive::{receive, respond_to_datagrams, ReceiveError},
        write::{encode_payload, tests::alert},
    },
};

fn alert_on_chip(object_id: u64, chip_num: u64) -> AlertBundle {
    let mut a = alert(object_id, true);
    a.dia_source.ccd_visit_id = 300 * 10_000 + chip_num;
    a
}

/// An alert with a year of nightly visits behind it.
fn long_alert(object_id: u64) -> AlertBundle {
    let mut a = alert(object_id, true);
    a.prv_dia_sources = vec![a.prv_dia_sources[1].clone(); 60];
    a
}

fn local_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn parse_lines(buf: &[u8]) -> Vec<AlertBundle> {
    buf.split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_slice(l).unwrap())
        .collect()
}

#[test]
fn test_sink_type_names() {
    assert_eq!(SinkType::from_str("tcp").unwrap(), SinkType::Tcp);
    assert_eq!(SinkType::from_str("docstore").unwrap(), SinkType::DocStore);
    assert!(SinkType::from_str("carrier-pigeon").is_err());
    assert!(SinkType::Multicast.is_network());
    assert!(!SinkType::Json.is_network());
    assert_eq!(
        *SINK_TYPES_COMMA_SEPARATED,
        "tcp, multicast, unicast, json, avro, docstore"
    );
}

#[test]
fn test_tcp_with_header() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || {
        let mut out = vec![];
        let summary = receive(&listener, true, Some(&mut out)).unwrap();
        (summary, out)
    });

    let alerts = vec![alert(7, true), alert(8, false), alert(9, true)];
    let mut sink = SinkParams::Tcp {
        addr,
        header: true,
        format: PayloadFormat::Json,
    }
    .open()
    .unwrap();
    sink.write_batch(&alerts[..2]).unwrap();
    sink.write_batch(&alerts[2..]).unwrap();
    sink.close().unwrap();

    let (summary, out) = handle.join().unwrap();
    assert_eq!(summary.num_messages, 3);
    assert_eq!(parse_lines(&out), alerts);
}

#[test]
fn test_tcp_without_header() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || {
        let mut out = vec![];
        let summary = receive(&listener, false, Some(&mut out)).unwrap();
        (summary, out)
    });

    let a = alert(7, true);
    let mut sink = SinkParams::Tcp {
        addr,
        header: false,
        format: PayloadFormat::VoEvent,
    }
    .open()
    .unwrap();
    sink.write_batch(std::slice::from_ref(&a)).unwrap();
    sink.close().unwrap();

    let (summary, out) = handle.join().unwrap();
    let expected = encode_payload(&a, PayloadFormat::VoEvent).unwrap();
    assert_eq!(summary.num_messages, 1);
    assert_eq!(summary.num_bytes, expected.len());
    assert_eq!(&out[..expected.len()], &expected[..]);
}

#[test]
fn test_tcp_long_history_with_header() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || {
        let mut out = vec![];
        let summary = receive(&listener, true, Some(&mut out)).unwrap();
        (summary, out)
    });

    let a = long_alert(7);
    let expected = encode_payload(&a, PayloadFormat::VoEvent).unwrap();
    assert!(expected.len() > SOCKET_BUFFER_SIZE);
    let mut sink = SinkParams::Tcp {
        addr,
        header: true,
        format: PayloadFormat::VoEvent,
    }
    .open()
    .unwrap();
    sink.write_batch(std::slice::from_ref(&a)).unwrap();
    sink.close().unwrap();

    let (summary, out) = handle.join().unwrap();
    assert_eq!(summary.num_messages, 1);
    assert_eq!(summary.num_bytes, expected.len());
    assert_eq!(&out[..expected.len()], &expected[..]);
}

#[test]
fn test_tcp_long_history_without_header() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || receive(&listener, false, None::<Vec<u8>>).unwrap());

    let a = long_alert(7);
    let mut sink = SinkParams::Tcp {
        addr,
        header: false,
        format: PayloadFormat::VoEvent,
    }
    .open()
    .unwrap();
    // Refused before anything is sent; the receiver couldn't take it in one
    // read.
    let result = sink.write_batch(std::slice::from_ref(&a));
    assert!(matches!(
        result,
        Err(SinkError::TooBig {
            alert_id: 70000300,
            limit: SOCKET_BUFFER_SIZE,
            ..
        })
    ));
    // Short alerts still go through.
    sink.write_batch(&[alert(8, false)]).unwrap();
    sink.close().unwrap();

    let summary = handle.join().unwrap();
    assert_eq!(summary.num_messages, 1);
}

#[test]
fn test_receive_refuses_huge_length() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || receive(&listener, true, None::<Vec<u8>>));

    let mut stream = std::net::TcpStream::connect(addr).unwrap();
    stream.write_u32::<BigEndian>(u32::MAX).unwrap();
    stream.flush().unwrap();

    let result = handle.join().unwrap();
    assert!(matches!(
        result,
        Err(ReceiveError::TooLong {
            len,
            limit: MAX_FRAMED_MESSAGE_SIZE,
        }) if len == u32::MAX as usize
    ));
}

#[test]
fn test_tcp_bad_ack_is_fatal() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || {
        let (mut s, _) = listener.accept().unwrap();
        let n = s.read_u32::<BigEndian>().unwrap() as usize;
        let mut buf = vec![0; n];
        s.read_exact(&mut buf).unwrap();
        s.write_all(b"1").unwrap();
    });

    let mut sink = SinkParams::Tcp {
        addr,
        header: true,
        format: PayloadFormat::Json,
    }
    .open()
    .unwrap();
    let result = sink.write_batch(&[alert(7, true)]);
    assert!(matches!(result, Err(SinkError::BadAck { alert_id: 70000300, ref got, .. }) if got == "1"));
    handle.join().unwrap();
}

#[test]
fn test_tcp_reconnects_once() {
    let (listener, addr) = local_listener();
    let handle = thread::spawn(move || {
        // Acknowledge one message, then hang up.
        let (mut s, _) = listener.accept().unwrap();
        let n = s.read_u32::<BigEndian>().unwrap() as usize;
        let mut buf = vec![0; n];
        s.read_exact(&mut buf).unwrap();
        s.write_all(n.to_string().as_bytes()).unwrap();
        drop(s);

        let mut out = vec![];
        let summary = receive(&listener, true, Some(&mut out)).unwrap();
        (summary, out)
    });

    let alerts = vec![alert(7, true), alert(8, true), alert(9, true)];
    let mut sink = SinkParams::Tcp {
        addr,
        header: true,
        format: PayloadFormat::Json,
    }
    .open()
    .unwrap();
    sink.write_batch(&alerts).unwrap();
    sink.close().unwrap();

    let (summary, out) = handle.join().unwrap();
    // Everything after the first alert arrived on the second connection.
    assert_eq!(summary.num_messages, 2);
    assert_eq!(parse_lines(&out), alerts[1..]);
}

#[test]
fn test_tcp_unreachable() {
    let (listener, addr) = local_listener();
    drop(listener);
    let result = SinkParams::Tcp {
        addr,
        header: true,
        format: PayloadFormat::VoEvent,
    }
    .open();
    assert!(matches!(result, Err(SinkError::Connect { .. })));
}

#[test]
fn test_unicast() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = receiver.local_addr().unwrap();

    let a = alert(7, false);
    let mut sink = SinkParams::Unicast {
        addr,
        format: PayloadFormat::Json,
    }
    .open()
    .unwrap();
    sink.write_batch(std::slice::from_ref(&a)).unwrap();
    sink.close().unwrap();

    let mut buf = vec![0; 65_536];
    let (n, _) = receiver.recv_from(&mut buf).unwrap();
    let received: AlertBundle = serde_json::from_slice(&buf[..n]).unwrap();
    assert_eq!(received, a);
}

#[test]
fn test_multicast_collects_responses() {
    // A listener answering on the loopback interface stands in for the
    // group's members.
    let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = responder.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut out = vec![];
        let summary = respond_to_datagrams(&responder, Some(3), Some(&mut out)).unwrap();
        (summary, out)
    });

    let alerts = vec![alert(7, true), alert(8, false), alert(9, true)];
    let mut sink = UdpSink::multicast(addr, 1, PayloadFormat::Json).unwrap();
    sink.write_batch(&alerts).unwrap();
    // Every datagram was answered before the response timeout.
    assert_eq!(sink.num_responses(), 3);
    sink.close().unwrap();

    let (summary, out) = handle.join().unwrap();
    assert_eq!(summary.num_messages, 3);
    assert_eq!(parse_lines(&out), alerts);
}

#[test]
fn test_json_files_per_chip() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("alerts");
    let params = SinkParams::JsonFiles { dir: dir.clone() };

    let mut sink = params.open().unwrap();
    sink.write_batch(&[alert_on_chip(7, 2211), alert_on_chip(8, 5)])
        .unwrap();
    sink.write_batch(&[alert_on_chip(9, 2211)]).unwrap();
    sink.close().unwrap();

    // A new sink appends.
    let mut sink = params.open().unwrap();
    sink.write_batch(&[alert_on_chip(10, 5)]).unwrap();
    sink.close().unwrap();

    let chip_2211 = parse_lines(&std::fs::read(dir.join("2211.json")).unwrap());
    let chip_5 = parse_lines(&std::fs::read(dir.join("5.json")).unwrap());
    assert_eq!(
        chip_2211.iter().map(|a| a.dia_source.dia_object_id).collect::<Vec<_>>(),
        [7, 9]
    );
    assert_eq!(
        chip_5.iter().map(|a| a.dia_source.dia_object_id).collect::<Vec<_>>(),
        [8, 10]
    );
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 2);
}

#[test]
fn test_avro_file_per_batch() {
    let tmp = TempDir::new().unwrap();
    let mut sink = SinkParams::AvroFiles {
        dir: tmp.path().to_path_buf(),
    }
    .open()
    .unwrap();
    sink.write_batch(&[alert(7, true), alert(8, true)]).unwrap();
    sink.write_batch(&[]).unwrap();
    sink.write_batch(&[alert(9, false)]).unwrap();
    sink.close().unwrap();

    let mut names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["alerts_70000300.avro", "alerts_90000300.avro"]);

    let f = std::fs::File::open(tmp.path().join("alerts_70000300.avro")).unwrap();
    let reader = apache_avro::Reader::new(f).unwrap();
    assert_eq!(reader.count(), 2);
}

#[test]
fn test_docstore() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store");
    let params = SinkParams::DocStore { path: path.clone() };

    let mut sink = params.open().unwrap();
    sink.write_batch(&[alert(7, true), alert(8, true)]).unwrap();
    // No de-duplication here; the same ID is simply stored again.
    sink.write_batch(&[alert(7, true)]).unwrap();
    sink.close().unwrap();
    drop(sink);

    let db = sled::open(&path).unwrap();
    let tree = db.open_tree(docstore::ALERTS_TREE).unwrap();
    assert_eq!(tree.len(), 2);
    let doc = tree.get(70000300_u64.to_be_bytes()).unwrap().unwrap();
    let stored: AlertBundle = serde_json::from_slice(&doc).unwrap();
    assert_eq!(stored, alert(7, true));
}
