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

//! WRC Congestion Control
//!
//! CUBIC loss response with a Reno-style increase, where the window is
//! bounded by a clamp derived from the smoothed RTT. The clamp boundary is
//! calibrated from the minimum RTT seen during the first few samples of the
//! connection.

use std::time::Duration;
use std::time::Instant;

use crate::recovery::millis;
use crate::recovery::LossSnapshot;

use super::cubic;
use super::Congestion;
use super::CongestionControl;
use super::CongestionControlAlgorithm;
use super::Window;

use self::clamp::Boundary;

pub use self::clamp::RttClampConfig;

mod clamp;

/// Number of RTT samples during which a new minimum RTT recalibrates the
/// clamp boundary.
const RTT_CALIBRATION_SAMPLES: u32 = 10;

#[derive(Debug)]
pub(crate) struct Wrc {
    cubic: cubic::State,

    config: RttClampConfig,

    boundary: Boundary,

    rtt_sample_count: u32,

    // First valid RTT sample.
    init_rtt: Option<Duration>,

    min_rtt: Duration,

    stash: u32,

    snd_cwnd_clamp_max: u32,

    snd_cwnd_clamp_min: u32,

    // When congestion avoidance was first entered.
    enter_ca_time: Option<Instant>,
}

impl Wrc {
    pub(super) fn new(config: &RttClampConfig) -> Self {
        Wrc {
            cubic: cubic::State::default(),
            config: *config,
            boundary: Boundary::initial(config),
            rtt_sample_count: 0,
            init_rtt: None,
            min_rtt: Duration::from_millis(config.rtt_max_configurable.into()),
            stash: 0,
            snd_cwnd_clamp_max: config.max_clamp_bytes,
            snd_cwnd_clamp_min: config.min_clamp_bytes,
            enter_ca_time: None,
        }
    }

    /// Accounts for a valid RTT sample. Returns `true` if the clamp
    /// boundary was recalculated.
    fn on_rtt_sample(&mut self, trace_id: &str, latest_rtt: Duration) -> bool {
        self.rtt_sample_count = self.rtt_sample_count.saturating_add(1);

        if self.rtt_sample_count > RTT_CALIBRATION_SAMPLES {
            return false;
        }

        match self.init_rtt {
            None => {
                self.init_rtt = Some(latest_rtt);
                self.min_rtt = latest_rtt;
            },

            Some(_) if latest_rtt < self.min_rtt => self.min_rtt = latest_rtt,

            Some(_) => return false,
        }

        self.boundary = Boundary::calculate(&self.config, millis(latest_rtt));

        debug!(
            "{} wrc recalibrated min_rtt={:?} high={} low={} slope={}",
            trace_id,
            self.min_rtt,
            self.boundary.high,
            self.boundary.low,
            self.boundary.slope
        );

        true
    }

    /// Recomputes the window clamp from the latest RTT sample.
    fn reclamp(&mut self, w: &mut Window, loss: &LossSnapshot, mss: u32) {
        // The smoothed RTT does not account for the very first sample yet.
        let srtt = if self.init_rtt.is_none() {
            loss.latest_rtt
        } else {
            loss.smoothed_rtt
        };

        // Calibration works on whole milliseconds.
        let latest_rtt = Duration::from_millis(millis(loss.latest_rtt).into());

        self.on_rtt_sample(w.trace_id(), latest_rtt);

        let segments = self.boundary.cwnd_segments(
            millis(srtt),
            self.snd_cwnd_clamp_min,
            self.snd_cwnd_clamp_max,
            mss,
        );

        w.cwnd_clamp = segments.saturating_mul(mss);
    }
}

impl CongestionControl for Wrc {
    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::WRC
    }

    fn on_acked(
        &mut self, w: &mut Window, loss: &LossSnapshot, bytes: u32,
        largest_acked: u64, inflight: u32, _next_pn: u64, now: Instant,
        mss: u32,
    ) {
        assert!(inflight >= bytes, "acked {bytes} bytes of {inflight}");

        // Without a valid sample the previous clamp stays in effect. Samples
        // below a millisecond count as zero.
        if millis(loss.latest_rtt) > 0 {
            self.reclamp(w, loss, mss);
        }

        w.apply_clamp();

        // Do not increase congestion window while in recovery.
        if w.in_recovery(largest_acked) {
            return;
        }

        if w.in_slow_start() {
            w.slow_start(bytes);
        } else {
            if self.enter_ca_time.is_none() {
                self.enter_ca_time = Some(now);

                debug!(
                    "{} wrc entered congestion avoidance cwnd={} clamp={}",
                    w.trace_id(),
                    w.cwnd,
                    w.cwnd_clamp
                );
            }

            // Increase congestion window by 1 MSS per congestion window
            // acked.
            if !w.congestion_avoidance(&mut self.stash, bytes, w.cwnd, mss) {
                return;
            }
        }

        w.apply_clamp();
        w.update_maximum();
    }

    fn on_lost(
        &mut self, w: &mut Window, _loss: &LossSnapshot, _bytes: u32,
        lost_pn: u64, next_pn: u64, now: Instant, mss: u32,
    ) {
        self.cubic.on_lost(w, lost_pn, next_pn, now, mss);
    }

    fn on_sent(
        &mut self, _w: &mut Window, loss: &LossSnapshot, bytes: u32,
        now: Instant,
    ) {
        self.cubic.on_sent(loss, bytes, now);
    }
}

/// WRC takes over from the Reno family. Plain CUBIC is refused.
pub(super) fn on_switch(cc: &mut Congestion) -> bool {
    match cc.algorithm() {
        CongestionControlAlgorithm::WRC => true,

        CongestionControlAlgorithm::Reno | CongestionControlAlgorithm::Pico => {
            cc.adopt_from_reno(CongestionControlAlgorithm::WRC);

            true
        },

        CongestionControlAlgorithm::CUBIC => false,
    }
}
