// Copyright (C) 2024, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! RTT-clamped congestion control for QUIC.
//!
//! This crate provides the congestion control decision core of a QUIC
//! transport: given acknowledgment, loss, transmission and persistent
//! congestion events it maintains the congestion window that the packet
//! sender consumes.
//!
//! The default algorithm is WRC, a CUBIC-derived controller that bounds the
//! congestion window according to how far the smoothed RTT has drifted from
//! the minimum RTT observed early in the connection. Reno, Pico and CUBIC
//! are available as well, and a connection can switch between them at
//! runtime.
//!
//! ## Configuring a connection
//!
//! All tunables live in a [`Config`] object:
//!
//! ```
//! let mut config = wrc::Config::new();
//! config.set_cc_algorithm_name("wrc")?;
//! config.set_max_send_udp_payload_size(1350)?;
//! config.set_initial_congestion_window_packets(10)?;
//! # Ok::<(), wrc::Error>(())
//! ```
//!
//! ## Driving the controller
//!
//! The loss recovery layer owns one [`Congestion`] per connection and calls
//! exactly one handler per transport event, passing a read-only
//! [`LossSnapshot`] of the RTT estimator and the sent packet map:
//!
//! ```
//! use std::time::Duration;
//! use std::time::Instant;
//!
//! let config = wrc::Config::new();
//! let now = Instant::now();
//!
//! let mut cc = wrc::Congestion::new(&config, now);
//! let mut rtt = wrc::RttStats::new(Duration::from_millis(25));
//!
//! // Packet 0 goes out.
//! cc.on_sent(&rtt.snapshot(1200, 1), 1200, now);
//!
//! // Packet 0 is acknowledged 50ms later.
//! let now = now + Duration::from_millis(50);
//! rtt.update_rtt(Duration::from_millis(50), Duration::ZERO);
//! cc.on_acked(&rtt.snapshot(0, 0), 1200, 0, 1200, 1, now, 1200);
//!
//! assert_eq!(cc.cwnd(), 13200);
//! ```
//!
//! ## Switching algorithms
//!
//! [`Congestion::switch`] asks the target algorithm whether it can adopt the
//! current state. Depending on the pair of algorithms the state is either
//! kept as is, reset, or the switch is refused:
//!
//! ```
//! use std::time::Instant;
//!
//! let mut config = wrc::Config::new();
//! config.set_cc_algorithm(wrc::CongestionControlAlgorithm::Reno);
//!
//! let mut cc = wrc::Congestion::new(&config, Instant::now());
//!
//! assert!(cc.switch(wrc::CongestionControlAlgorithm::WRC));
//! assert!(!cc.switch(wrc::CongestionControlAlgorithm::CUBIC));
//! ```

#![allow(clippy::upper_case_acronyms)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

use std::str::FromStr;

/// The default size of the initial congestion window, in packets.
const DEFAULT_INITIAL_CONGESTION_WINDOW_PACKETS: usize = 10;

/// The default maximum UDP payload size the sender emits.
const DEFAULT_MAX_SEND_UDP_PAYLOAD_SIZE: usize = 1200;

/// Stores configuration shared between multiple connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    cc_algorithm: CongestionControlAlgorithm,

    initial_congestion_window_packets: usize,

    max_send_udp_payload_size: usize,

    rtt_clamp: RttClampConfig,

    trace_id: String,
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

impl Config {
    /// Creates a config object with default values.
    ///
    /// ## Examples:
    ///
    /// ```
    /// let config = wrc::Config::new();
    /// assert_eq!(config.initial_congestion_window(), 12000);
    /// ```
    pub fn new() -> Config {
        Config {
            cc_algorithm: CongestionControlAlgorithm::WRC,
            initial_congestion_window_packets:
                DEFAULT_INITIAL_CONGESTION_WINDOW_PACKETS,
            max_send_udp_payload_size: DEFAULT_MAX_SEND_UDP_PAYLOAD_SIZE,
            rtt_clamp: RttClampConfig::default(),
            trace_id: String::new(),
        }
    }

    /// Sets the congestion control algorithm used.
    ///
    /// The default value is `CongestionControlAlgorithm::WRC`.
    pub fn set_cc_algorithm(&mut self, algo: CongestionControlAlgorithm) {
        self.cc_algorithm = algo;
    }

    /// Sets the congestion control algorithm used by string.
    ///
    /// The default value is `wrc`. On error `Error::CongestionControl`
    /// will be returned.
    ///
    /// ## Examples:
    ///
    /// ```
    /// let mut config = wrc::Config::new();
    /// config.set_cc_algorithm_name("pico")?;
    /// # Ok::<(), wrc::Error>(())
    /// ```
    pub fn set_cc_algorithm_name(&mut self, name: &str) -> Result<()> {
        self.cc_algorithm = CongestionControlAlgorithm::from_str(name)?;

        Ok(())
    }

    /// Sets initial congestion window size in terms of packet count.
    ///
    /// The default value is 10. Zero is rejected with
    /// `Error::InvalidConfig`.
    pub fn set_initial_congestion_window_packets(
        &mut self, packets: usize,
    ) -> Result<()> {
        if packets == 0 {
            return Err(Error::InvalidConfig(
                "initial_congestion_window_packets",
            ));
        }

        self.initial_congestion_window_packets = packets;

        Ok(())
    }

    /// Sets the maximum outgoing UDP payload size.
    ///
    /// The default value is `1200`. The value must be non-zero and fit in
    /// 32 bits, otherwise `Error::InvalidConfig` is returned.
    pub fn set_max_send_udp_payload_size(&mut self, v: usize) -> Result<()> {
        if v == 0 || u32::try_from(v).is_err() {
            return Err(Error::InvalidConfig("max_send_udp_payload_size"));
        }

        self.max_send_udp_payload_size = v;

        Ok(())
    }

    /// Sets the RTT watermark and window clamp bounds used by WRC.
    pub fn set_rtt_clamp(&mut self, rtt_clamp: RttClampConfig) {
        self.rtt_clamp = rtt_clamp;
    }

    /// Sets the identifier prefixed to every log line of connections
    /// created from this config.
    pub fn set_trace_id(&mut self, trace_id: &str) {
        self.trace_id = trace_id.to_string();
    }

    /// Returns the configured congestion control algorithm.
    pub fn cc_algorithm(&self) -> CongestionControlAlgorithm {
        self.cc_algorithm
    }

    /// Returns the configured maximum UDP payload size.
    pub fn max_send_udp_payload_size(&self) -> u32 {
        // The setter guarantees the value fits.
        self.max_send_udp_payload_size as u32
    }

    /// Returns the RTT watermark and window clamp bounds.
    pub fn rtt_clamp(&self) -> &RttClampConfig {
        &self.rtt_clamp
    }

    /// Returns the initial congestion window in bytes, saturating at
    /// `u32::MAX`.
    pub fn initial_congestion_window(&self) -> u32 {
        let packets =
            u32::try_from(self.initial_congestion_window_packets)
                .unwrap_or(u32::MAX);

        packets.saturating_mul(self.max_send_udp_payload_size())
    }

    pub(crate) fn trace_id(&self) -> &str {
        &self.trace_id
    }
}

pub use crate::error::Error;
pub use crate::error::Result;

pub use crate::recovery::Congestion;
pub use crate::recovery::CongestionControlAlgorithm;
pub use crate::recovery::LossSnapshot;
pub use crate::recovery::RttClampConfig;
pub use crate::recovery::RttStats;
pub use crate::recovery::MIN_CWND_SEGMENTS;

mod error;
mod recovery;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::new();

        assert_eq!(config.cc_algorithm(), CongestionControlAlgorithm::WRC);
        assert_eq!(config.max_send_udp_payload_size(), 1200);
        assert_eq!(config.initial_congestion_window(), 12000);
        assert_eq!(config.rtt_clamp(), &RttClampConfig::default());
    }

    #[test]
    fn config_algorithm_by_name() {
        let mut config = Config::new();

        assert_eq!(config.set_cc_algorithm_name("reno"), Ok(()));
        assert_eq!(config.cc_algorithm(), CongestionControlAlgorithm::Reno);

        assert_eq!(
            config.set_cc_algorithm_name("bbr"),
            Err(Error::CongestionControl)
        );
        assert_eq!(config.cc_algorithm(), CongestionControlAlgorithm::Reno);
    }

    #[test]
    fn config_rejects_zero_sizes() {
        let mut config = Config::new();

        assert_eq!(
            config.set_max_send_udp_payload_size(0),
            Err(Error::InvalidConfig("max_send_udp_payload_size"))
        );
        assert_eq!(
            config.set_initial_congestion_window_packets(0),
            Err(Error::InvalidConfig("initial_congestion_window_packets"))
        );

        assert_eq!(config.initial_congestion_window(), 12000);
    }

    #[test]
    fn config_initial_window_saturates() {
        let mut config = Config::new();

        config.set_max_send_udp_payload_size(65527).unwrap();
        config
            .set_initial_congestion_window_packets(usize::MAX)
            .unwrap();

        assert_eq!(config.initial_congestion_window(), u32::MAX);
    }
}
