// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::cast_possible_wrap)] // Test data conversions

//! Message channels over every transport.

use daqlink::transport::{pipe, slot_link, PipeBuilder, TransportRead, TransportWrite};
use daqlink::{AppMsg, DeviceChannel, Error, HostChannel, McuMsg, MessageChannel, Point};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

const TICK: Option<Duration> = Some(Duration::from_millis(500));
const MAX_LEN: usize = 496;

fn points(count: usize, seed: Point) -> Vec<Point> {
    (0..count).map(|i| seed.wrapping_mul(31).wrapping_add(i as Point)).collect()
}

/// Host sends output batches, the device answers each with an input batch.
fn exchange<R1, W1, R2, W2>(mut device: DeviceChannel<R1, W1>, mut host: HostChannel<R2, W2>)
where
    R1: TransportRead + Send + 'static,
    W1: TransportWrite + Send + 'static,
    R2: TransportRead,
    W2: TransportWrite,
{
    const BATCHES: usize = 40;

    let device_side = thread::spawn(move || {
        assert_eq!(device.receive(TICK).unwrap(), AppMsg::Connect);
        for n in 0..BATCHES {
            let expected = points(123, n as Point);
            assert_eq!(device.receive(TICK).unwrap(), AppMsg::dac_data(&expected));
            let reply = points(123, -(n as Point));
            device
                .send(&McuMsg::adc_data((n % 6) as u8, &reply), TICK)
                .unwrap();
        }
        device.send(&McuMsg::debug("done"), TICK).unwrap();
    });

    host.send(&AppMsg::Connect, TICK).unwrap();
    for n in 0..BATCHES {
        host.send(&AppMsg::dac_data(&points(123, n as Point)), TICK)
            .unwrap();
        let expected = points(123, -(n as Point));
        assert_eq!(
            host.receive(TICK).unwrap(),
            McuMsg::adc_data((n % 6) as u8, &expected)
        );
    }
    assert_eq!(host.receive(TICK).unwrap(), McuMsg::debug("done"));
    device_side.join().unwrap();
}

#[test]
fn full_batches_over_unchunked_pipe() {
    let (to_device, device_in) = pipe();
    let (to_host, host_in) = pipe();
    exchange(
        MessageChannel::new(device_in, to_host, MAX_LEN),
        MessageChannel::new(host_in, to_device, MAX_LEN),
    );
}

#[test]
fn full_batches_over_trickling_pipe() {
    let builder = PipeBuilder::default().max_chunk(7).depth(16);
    let (to_device, device_in) = builder.open();
    let (to_host, host_in) = builder.open();
    exchange(
        MessageChannel::new(device_in, to_host, MAX_LEN),
        MessageChannel::new(host_in, to_device, MAX_LEN),
    );
}

#[test]
fn full_batches_over_slot_link() {
    let (device_end, host_end) = slot_link(64, 16);
    let (device_in, to_host) = device_end.into_split();
    let (host_in, to_device) = host_end.into_split();
    exchange(
        MessageChannel::new(device_in, to_host, MAX_LEN),
        MessageChannel::new(host_in, to_device, MAX_LEN),
    );
}

#[test]
fn full_batches_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    exchange(
        MessageChannel::new(server.try_clone().unwrap(), server, MAX_LEN),
        MessageChannel::new(client.try_clone().unwrap(), client, MAX_LEN),
    );
}

#[test]
fn silence_is_a_timeout_not_an_error() {
    let (_to_device, device_in) = pipe();
    let (to_host, _host_in) = pipe();
    let mut device: DeviceChannel<_, _> = MessageChannel::new(device_in, to_host, MAX_LEN);
    let err = device
        .receive(Some(Duration::from_millis(20)))
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert!(err.is_recoverable());
}

#[test]
fn closed_tcp_peer_ends_the_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    let mut device: DeviceChannel<_, _> =
        MessageChannel::new(server.try_clone().unwrap(), server, MAX_LEN);
    drop(client);
    assert!(matches!(device.receive(TICK), Err(Error::UnexpectedEnd)));
}

#[test]
fn oversized_batch_is_refused_before_sending() {
    let (to_device, device_in) = pipe();
    let (to_host, host_in) = pipe();
    let mut host: HostChannel<_, _> = MessageChannel::new(host_in, to_device, MAX_LEN);
    let mut device: DeviceChannel<_, _> = MessageChannel::new(device_in, to_host, MAX_LEN);

    let err = host
        .send(&AppMsg::dac_data(&points(124, 0)), TICK)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MessageTooLong {
            size: 499,
            max: MAX_LEN
        }
    ));
    assert_eq!(host.sender().pending(), 0);

    host.send(&AppMsg::KeepAlive, TICK).unwrap();
    assert_eq!(device.receive(TICK).unwrap(), AppMsg::KeepAlive);
}
