//! the streaming loop: pulls chunks, advances the rolling window, drives
//! the engine, and relays status and commands over channels
//!
//! One thread, one in-flight block.  The rolling window holds the last
//! `block_size` samples and advances by `hop_size` per pipeline pass.  If
//! the source bursts several hops between ticks, the window is advanced
//! through all of them but the pipeline runs only on the most recent state;
//! freshness beats completeness for a live readout, and memory stays
//! bounded.
use log::{debug, info, warn};
use std::sync::mpsc;
use std::thread::sleep;
use std::time::Duration;

use super::engine::TensionEngine;
use super::param_message::ParamMessage;
use super::source::{BlockSource, ChunkRead};
use crate::common::box_error::BoxError;
use crate::common::get_micro_time;
use crate::common::stream_time_stat::{MicroTimer, StreamTimeStat};

// short nap between polls when the source has nothing for us
const IDLE_SLEEP: Duration = Duration::from_millis(1);
// status messages go out at most this often
const STATUS_INTERVAL: u128 = 100_000;
// cadence stats hit the log this often
const STATS_INTERVAL: u128 = 5_000_000;

pub struct StreamController {
    source: Box<dyn BlockSource>,
    engine: TensionEngine,
    rolling: Vec<i16>,
    pending: Vec<i16>,
    hop_size: usize,
    hop_stats: StreamTimeStat,
    last_chunk_time: u128,
    status_timer: MicroTimer,
    stats_timer: MicroTimer,
    status_tx: mpsc::Sender<serde_json::Value>,
    command_rx: mpsc::Receiver<ParamMessage>,
}

impl StreamController {
    pub fn build(
        source: Box<dyn BlockSource>,
        engine: TensionEngine,
        status_tx: mpsc::Sender<serde_json::Value>,
        command_rx: mpsc::Receiver<ParamMessage>,
    ) -> StreamController {
        let now = get_micro_time();
        let block_size = engine.get_settings().block_size;
        let hop_size = engine.get_settings().hop_size();
        StreamController {
            source,
            engine,
            rolling: vec![0; block_size],
            pending: vec![],
            hop_size,
            hop_stats: StreamTimeStat::build(50),
            last_chunk_time: now,
            status_timer: MicroTimer::build(now, STATUS_INTERVAL),
            stats_timer: MicroTimer::build(now, STATS_INTERVAL),
            status_tx,
            command_rx,
        }
    }

    /// Run until the source finishes or a shutdown command arrives.  A
    /// shutdown takes effect between blocks; an in-flight pass always
    /// completes.
    pub fn run(&mut self) -> Result<(), BoxError> {
        info!("stream controller starting, hop size {}", self.hop_size);
        while self.engine.is_running() {
            self.check_commands();
            if !self.engine.is_running() {
                break;
            }
            match self.source.next_chunk()? {
                ChunkRead::Audio(chunk) => {
                    let now = get_micro_time();
                    self.hop_stats.add_sample((now - self.last_chunk_time) as f64);
                    self.last_chunk_time = now;
                    self.pending.extend_from_slice(&chunk);
                    self.pump(now)?;
                }
                ChunkRead::NotReady => {
                    sleep(IDLE_SLEEP);
                }
                ChunkRead::Finished => {
                    info!("source finished");
                    break;
                }
            }
        }
        // final state for whoever is still listening
        if self.status_tx.send(self.engine.status_json()).is_err() {
            debug!("status receiver gone before final update");
        }
        Ok(())
    }

    /// Advance the rolling window through every pending hop, then run the
    /// pipeline once on the newest window.
    fn pump(&mut self, now: u128) -> Result<(), BoxError> {
        let mut advanced = 0;
        while self.pending.len() >= self.hop_size {
            self.rolling.drain(..self.hop_size);
            self.rolling.extend(self.pending.drain(..self.hop_size));
            advanced += 1;
        }
        if advanced == 0 {
            return Ok(());
        }
        if advanced > 1 {
            debug!("dropped {} stale hops to stay fresh", advanced - 1);
        }
        self.engine.process(&self.rolling, now);

        if self.status_timer.expired(now) {
            self.status_timer.reset(now);
            self.status_tx.send(self.engine.status_json())?;
        }
        if self.stats_timer.expired(now) {
            self.stats_timer.reset(now);
            debug!("chunk cadence (us): {}", self.hop_stats);
        }
        Ok(())
    }

    fn check_commands(&mut self) -> () {
        while let Ok(msg) = self.command_rx.try_recv() {
            info!("command: {}", msg);
            if let Err(e) = self.engine.handle_param(&msg) {
                warn!("command rejected: {}", e);
            }
        }
    }
}
