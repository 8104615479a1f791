//! Simulated peer link
//!
//! Carries encoded frames between a frame driver and a remote puppet under
//! hostile conditions:
//! - Loss
//! - Duplication
//! - Reordering

use std::collections::VecDeque;

use bytes::Bytes;
use puppet_core::PuppetResult;
use puppet_wire::{encode_frame, PeerMessage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Link conditions
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    /// Frame loss rate (0.0 - 1.0)
    pub loss_rate: f64,
    /// Probability a frame is delivered twice
    pub duplicate_prob: f64,
    /// Probability a frame overtakes the one before it
    pub reorder_prob: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig::perfect()
    }
}

impl LinkConfig {
    pub fn perfect() -> Self {
        LinkConfig {
            loss_rate: 0.0,
            duplicate_prob: 0.0,
            reorder_prob: 0.0,
        }
    }

    /// Poor network conditions
    pub fn poor() -> Self {
        LinkConfig {
            loss_rate: 0.1,
            duplicate_prob: 0.05,
            reorder_prob: 0.1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub lost: u64,
    pub duplicated: u64,
    pub reordered: u64,
    pub delivered: u64,
}

/// One-way link of encoded frames
pub struct SimulatedLink {
    config: LinkConfig,
    rng: StdRng,
    in_flight: VecDeque<Bytes>,
    stats: LinkStats,
}

impl SimulatedLink {
    pub fn new(config: LinkConfig, seed: u64) -> Self {
        SimulatedLink {
            config,
            rng: StdRng::seed_from_u64(seed),
            in_flight: VecDeque::new(),
            stats: LinkStats::default(),
        }
    }

    /// Encode and send one message
    pub fn send(&mut self, message: &PeerMessage) -> PuppetResult<()> {
        let frame = encode_frame(message)?;
        self.send_frame(frame);
        Ok(())
    }

    /// Send an already encoded frame
    pub fn send_frame(&mut self, frame: Bytes) {
        self.stats.sent += 1;
        if self.rng.gen_bool(self.config.loss_rate) {
            self.stats.lost += 1;
            return;
        }
        if self.rng.gen_bool(self.config.duplicate_prob) {
            self.stats.duplicated += 1;
            self.in_flight.push_back(frame.clone());
        }
        if !self.in_flight.is_empty() && self.rng.gen_bool(self.config.reorder_prob) {
            self.stats.reordered += 1;
            let at = self.in_flight.len() - 1;
            self.in_flight.insert(at, frame);
        } else {
            self.in_flight.push_back(frame);
        }
    }

    /// Everything in flight, concatenated as a byte stream
    pub fn deliver(&mut self) -> Vec<u8> {
        let mut stream = Vec::new();
        for frame in self.in_flight.drain(..) {
            self.stats.delivered += 1;
            stream.extend_from_slice(&frame);
        }
        stream
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }
}
