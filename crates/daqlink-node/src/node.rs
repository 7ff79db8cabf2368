// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node runtime: device end, host end, or both in one process.
//!
//! Every entry point runs until its `stop` flag is set (or the host
//! duration elapses) and returns the counters it gathered.

use crate::config::{ConfigError, NodeConfig};
use daqlink::transport::{slot_link, TransportRead, TransportWrite};
use daqlink::{
    Control, HostChannel, HostReport, HostSession, LinkConfig, MessageChannel, SamplingPath,
    SimulatedDevice, StatsSnapshot, StreamingController,
};
use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval of the supervising loops.
const SUPERVISE_TICK: Duration = Duration::from_millis(50);

/// Node errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Link error: {0}")]
    Link(#[from] daqlink::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

/// Logs a statistics snapshot every `interval`.
struct StatsReporter {
    interval: Option<Duration>,
    last: Instant,
}

impl StatsReporter {
    fn new(interval_secs: u64) -> Self {
        Self {
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            last: Instant::now(),
        }
    }

    fn tick(&mut self, control: &Control) {
        let Some(interval) = self.interval else {
            return;
        };
        if self.last.elapsed() >= interval {
            self.last = Instant::now();
            tracing::info!("device statistics\n{}", control.stats().snapshot());
        }
    }
}

/// Simulated sampling path running on its own thread.
struct Sampler {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<SimulatedDevice>,
}

impl Sampler {
    fn start(
        config: &NodeConfig,
        link: &LinkConfig,
        control: &Arc<Control>,
    ) -> Result<Self, NodeError> {
        let stop = Arc::new(AtomicBool::new(false));
        let device = SimulatedDevice::new(config.device.din_period);
        let thread = SamplingPath::new(device, Arc::clone(control), link)?
            .spawn(config.sample_period(), Arc::clone(&stop))?;
        Ok(Self { stop, thread })
    }

    fn stop(self) -> Result<SimulatedDevice, NodeError> {
        self.stop.store(true, Ordering::Release);
        self.thread
            .join()
            .map_err(|_| NodeError::ThreadPanicked("sampler"))
    }
}

/// Stop flag raised by Ctrl+C.
///
/// If the handler cannot be installed (one already is), the failure is
/// logged and the flag is returned anyway.
pub fn stop_on_ctrlc() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        flag.store(true, Ordering::Release);
    }) {
        tracing::warn!("Ctrl+C handler not installed: {e}");
    }
    stop
}

/// Serve host connections over TCP, one at a time, until `stop` is set.
///
/// The device buffers and statistics survive across connections.
pub fn run_device(config: &NodeConfig, stop: &AtomicBool) -> Result<StatsSnapshot, NodeError> {
    let link = config.link_config();
    link.validate()?;

    let listener = TcpListener::bind(&config.device.listen)?;
    listener.set_nonblocking(true)?;
    tracing::info!("device listening on {}", listener.local_addr()?);

    let control = Arc::new(Control::new(&link));
    let sampler = Sampler::start(config, &link, &control)?;
    let mut reporter = StatsReporter::new(config.stats_interval_secs);

    while !stop.load(Ordering::Acquire) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                reporter.tick(&control);
                thread::sleep(SUPERVISE_TICK);
                continue;
            }
            Err(e) => {
                tracing::error!("accept failed: {e}");
                break;
            }
        };
        tracing::info!("host connected from {peer}");
        if let Err(e) = serve(stream, &control, &link, stop, &mut reporter) {
            tracing::warn!("connection from {peer} ended: {e}");
        } else {
            tracing::info!("connection from {peer} closed");
        }
    }

    sampler.stop()?;
    Ok(control.stats().snapshot())
}

fn serve(
    stream: TcpStream,
    control: &Arc<Control>,
    link: &LinkConfig,
    stop: &AtomicBool,
    reporter: &mut StatsReporter,
) -> Result<(), NodeError> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    let channel = MessageChannel::new(stream.try_clone()?, stream, link.max_message_len);
    let handle = StreamingController::new(channel, Arc::clone(control), link)?.spawn()?;

    while !handle.is_finished() {
        if stop.load(Ordering::Acquire) {
            handle.shutdown();
        }
        reporter.tick(control);
        thread::sleep(SUPERVISE_TICK);
    }
    handle.join()?;
    Ok(())
}

/// Connect to a device over TCP and stream until stopped.
pub fn run_host(config: &NodeConfig, stop: &AtomicBool) -> Result<HostReport, NodeError> {
    let link = config.link_config();
    link.validate()?;

    let stream = TcpStream::connect(&config.host.connect)?;
    stream.set_nodelay(true)?;
    tracing::info!("host connected to {}", stream.peer_addr()?);

    let channel = MessageChannel::new(stream.try_clone()?, stream, link.max_message_len);
    drive_host(config, link, channel, stop)
}

/// Run both ends in one process over the shared slot transport.
pub fn run_loopback(
    config: &NodeConfig,
    stop: &AtomicBool,
) -> Result<(StatsSnapshot, HostReport), NodeError> {
    let link = config.link_config();
    link.validate()?;

    let slot_size = config.loopback.slot_size;
    let (device_end, host_end) = slot_link(slot_size, config.loopback.slot_count);
    tracing::info!(
        "loopback over {} slots of {} bytes",
        config.loopback.slot_count,
        slot_size
    );
    let (device_in, to_host) = device_end.into_split();
    let (host_in, to_device) = host_end.into_split();

    let control = Arc::new(Control::new(&link));
    let sampler = Sampler::start(config, &link, &control)?;
    let controller = StreamingController::new(
        MessageChannel::new(device_in, to_host, link.max_message_len),
        Arc::clone(&control),
        &link,
    )?
    .spawn()?;

    let channel = MessageChannel::new(host_in, to_device, link.max_message_len);
    let report = drive_host(config, link, channel, stop);

    controller.shutdown();
    let device = controller.join();
    sampler.stop()?;

    let report = report?;
    device?;
    Ok((control.stats().snapshot(), report))
}

fn drive_host<R, W>(
    config: &NodeConfig,
    link: LinkConfig,
    channel: HostChannel<R, W>,
    stop: &AtomicBool,
) -> Result<HostReport, NodeError>
where
    R: TransportRead,
    W: TransportWrite,
{
    let deadline = config.host_duration().map(|d| Instant::now() + d);
    let mut session = HostSession::new(channel, link, config.host.waveform.into())
        .retain(config.host.retain_points);

    session.connect()?;
    if let Some(value) = config.host.dout {
        session.set_dout(value);
    }

    let mut last_report = Instant::now();
    let interval = Duration::from_secs(config.stats_interval_secs);
    while !stop.load(Ordering::Acquire) && deadline.map_or(true, |d| Instant::now() < d) {
        session.poll()?;
        if config.stats_interval_secs > 0 && last_report.elapsed() >= interval {
            last_report = Instant::now();
            log_report(session.report());
        }
    }

    log_report(session.report());
    Ok(session.report().clone())
}

fn log_report(report: &HostReport) {
    tracing::info!(
        dac_sent = report.dac_points_sent,
        dac_granted = report.dac_points_granted,
        din = ?report.din,
        device_errors = report.device_errors,
        "host statistics, input points per channel {:?}",
        report.adc_points_received
    );
}
