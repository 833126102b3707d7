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

//! CUBIC Congestion Control
//!
//! This implementation is based on RFC 8312:
//! <https://tools.ietf.org/html/rfc8312>
//!
//! The loss handling and idle compensation of this module are shared with
//! WRC, which only replaces the acknowledgment path.

use std::time::Duration;
use std::time::Instant;

use crate::recovery::LossSnapshot;

use super::Algorithm;
use super::Congestion;
use super::CongestionControl;
use super::CongestionControlAlgorithm;
use super::Window;

/// CUBIC Constants.
///
/// These are recommended value in RFC8312.
pub(super) const C: f64 = 0.4;

const BETA_CUBIC: f64 = 0.7;

/// Additive increase of the TCP-friendly estimate (Eq. 4).
const ALPHA_AIMD: f64 = 3.0 * (1.0 - BETA_CUBIC) / (1.0 + BETA_CUBIC);

/// CUBIC State Variables.
///
/// Note that these calculations are based on a count of cwnd as bytes,
/// not packets.
/// Unit of t (duration), K and RTT are based on seconds (f64).
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(super) k: f64,

    pub(super) w_max: f64,

    // Used for fast convergence (see on_lost()).
    pub(super) w_last_max: f64,

    // Start of the current congestion avoidance epoch.
    pub(super) avoidance_start: Option<Instant>,

    // Used in CUBIC fix (see on_sent()).
    pub(super) last_sent_time: Option<Instant>,
}

impl State {
    // Time elapsed since the last loss episode.
    fn elapsed(&self, now: Instant) -> Duration {
        self.avoidance_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }

    // K = cubic_root(w_max * (1 - beta_cubic) / C) (Eq. 2)
    fn update_k(&mut self, mss: u32) {
        let w_max = self.w_max / mss.max(1) as f64;

        self.k = libm::cbrt(w_max * (1.0 - BETA_CUBIC) / C);
    }

    // W_cubic(t) = C * (t - K)^3 + w_max (Eq. 1)
    fn w_cubic(&self, t: Duration, mss: u32) -> f64 {
        C * (t.as_secs_f64() - self.k).powi(3) * mss as f64 + self.w_max
    }

    // W_est(t) = w_max * beta_cubic + alpha_aimd * (t / RTT) (Eq. 4)
    fn w_est(&self, t: Duration, rtt: Duration, mss: u32) -> f64 {
        let w_est = self.w_max * BETA_CUBIC;

        if rtt.is_zero() {
            return w_est;
        }

        w_est + ALPHA_AIMD * (t.as_secs_f64() / rtt.as_secs_f64()) * mss as f64
    }

    /// Starts a new loss episode unless `lost_pn` belongs to the current
    /// one, and applies the multiplicative decrease.
    pub(super) fn on_lost(
        &mut self, w: &mut Window, lost_pn: u64, next_pn: u64, now: Instant,
        mss: u32,
    ) {
        if !w.on_loss_episode(lost_pn, next_pn) {
            return;
        }

        self.avoidance_start = Some(now);

        self.w_max = w.cwnd as f64;

        // Fast convergence
        //
        // w_last_max starts at zero, so this is never taken on the loss
        // ending the initial slow start.
        if self.w_max < self.w_last_max {
            self.w_last_max = self.w_max;
            self.w_max *= (1.0 + BETA_CUBIC) / 2.0;
        } else {
            self.w_last_max = self.w_max;
        }

        self.update_k(mss);

        trace!(
            "{} cubic w_max={} w_last_max={} k={}",
            w.trace_id(),
            self.w_max,
            self.w_last_max,
            self.k
        );

        w.reduce(mss);
    }

    /// Records a transmission, shifting the epoch start by any idle period.
    pub(super) fn on_sent(
        &mut self, loss: &LossSnapshot, bytes: u32, now: Instant,
    ) {
        // See https://github.com/torvalds/linux/commit/30927520dbae297182990bb21d08762bcc35ce1d
        // The sender is coming out of quiescence if this is the only packet
        // in flight.
        if loss.bytes_in_flight <= bytes as usize {
            if let (Some(start), Some(last_sent_time)) =
                (self.avoidance_start, self.last_sent_time)
            {
                let delta = now.saturating_duration_since(last_sent_time);

                // We were application limited (idle) for a while.
                // Shift epoch start to keep cwnd growth to cubic curve.
                if !delta.is_zero() {
                    self.avoidance_start = Some(start + delta);
                }
            }
        }

        self.last_sent_time = Some(now);
    }
}

#[derive(Debug, Default)]
pub(crate) struct Cubic {
    pub(super) state: State,
}

impl CongestionControl for Cubic {
    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::CUBIC
    }

    fn on_acked(
        &mut self, w: &mut Window, loss: &LossSnapshot, bytes: u32,
        largest_acked: u64, inflight: u32, _next_pn: u64, now: Instant,
        mss: u32,
    ) {
        assert!(inflight >= bytes, "acked {bytes} bytes of {inflight}");

        // Do not increase congestion window while in recovery.
        if w.in_recovery(largest_acked) {
            return;
        }

        if w.in_slow_start() {
            w.slow_start(bytes);
            w.update_maximum();

            return;
        }

        // Congestion avoidance.
        let t = self.state.elapsed(now);
        let rtt = loss.smoothed_rtt;

        let w_cubic = self.state.w_cubic(t, mss);
        let w_est = self.state.w_est(t, rtt, mss);

        if w_cubic < w_est {
            // AIMD friendly region (W_cubic(t) < W_est)
            w.cwnd = w.cwnd.max(w_est as u32);
        } else {
            // Concave region or convex region use same increment.
            let target = self.state.w_cubic(t + rtt, mss);
            let cwnd = f64::from(w.cwnd.max(1));

            let inc = ((target - cwnd) / cwnd * mss as f64).max(0.0);

            w.cwnd = w.cwnd.saturating_add(inc as u32);
        }

        w.update_maximum();
    }

    fn on_lost(
        &mut self, w: &mut Window, _loss: &LossSnapshot, _bytes: u32,
        lost_pn: u64, next_pn: u64, now: Instant, mss: u32,
    ) {
        self.state.on_lost(w, lost_pn, next_pn, now, mss);
    }

    fn on_sent(
        &mut self, _w: &mut Window, loss: &LossSnapshot, bytes: u32,
        now: Instant,
    ) {
        self.state.on_sent(loss, bytes, now);
    }
}

/// CUBIC takes over from the Reno family, but not from WRC whose CUBIC
/// state is tied to its clamp.
pub(super) fn on_switch(cc: &mut Congestion) -> bool {
    match cc.algorithm {
        Algorithm::CUBIC(_) => true,

        Algorithm::Reno(_) | Algorithm::Pico(_) => {
            cc.adopt_from_reno(CongestionControlAlgorithm::CUBIC);

            true
        },

        Algorithm::WRC(_) => false,
    }
}
