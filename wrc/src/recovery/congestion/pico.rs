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

//! Pico Congestion Control
//!
//! A Reno variant whose congestion avoidance growth rate is derived, on
//! every loss episode, from how fast CUBIC would recover the window that was
//! just lost. The rate is the smaller of the Reno and the CUBIC one, so Pico
//! is never more aggressive than either.

use std::time::Duration;
use std::time::Instant;

use crate::recovery::LossSnapshot;
use crate::recovery::LOSS_REDUCTION_FACTOR;

use super::cubic::C;
use super::Algorithm;
use super::Congestion;
use super::CongestionControl;
use super::CongestionControlAlgorithm;
use super::Window;

#[derive(Debug)]
pub(crate) struct Pico {
    pub(super) stash: u32,

    /// Acknowledged bytes needed to grow the window by one MSS.
    pub(super) bytes_per_mtu_increase: u32,
}

impl Pico {
    pub(super) fn new(initial_cwnd: u32) -> Self {
        Pico {
            stash: 0,
            bytes_per_mtu_increase: initial_cwnd,
        }
    }
}

/// Acknowledged bytes per MSS of growth after a loss at `cwnd`.
///
/// CUBIC recovers the `(1 - beta) * cwnd` bytes it gave up within `K`
/// seconds, during which `K * cwnd / srtt` bytes are acknowledged:
///
///   bytes_per_mtu_increase = K * mss / ((1 - beta) * srtt)
fn bytes_per_mtu_increase(cwnd: u32, srtt: Duration, mss: u32) -> u32 {
    let reno = (cwnd as f64 * LOSS_REDUCTION_FACTOR) as u32;

    let srtt = srtt.as_secs_f64();

    if srtt <= 0.0 || mss == 0 {
        return reno.max(1);
    }

    let decrease = 1.0 - LOSS_REDUCTION_FACTOR;

    let k = libm::cbrt(decrease / C * cwnd as f64 / mss as f64);

    let cubic = (k / decrease / srtt * mss as f64) as u32;

    reno.min(cubic).max(1)
}

impl CongestionControl for Pico {
    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::Pico
    }

    fn on_acked(
        &mut self, w: &mut Window, _loss: &LossSnapshot, bytes: u32,
        largest_acked: u64, inflight: u32, _next_pn: u64, _now: Instant,
        mss: u32,
    ) {
        assert!(inflight >= bytes, "acked {bytes} bytes of {inflight}");

        if w.in_recovery(largest_acked) {
            return;
        }

        if w.in_slow_start() {
            w.slow_start(bytes);
        } else if !w.congestion_avoidance(
            &mut self.stash,
            bytes,
            self.bytes_per_mtu_increase,
            mss,
        ) {
            return;
        }

        w.update_maximum();
    }

    fn on_lost(
        &mut self, w: &mut Window, loss: &LossSnapshot, _bytes: u32,
        lost_pn: u64, next_pn: u64, _now: Instant, mss: u32,
    ) {
        if !w.on_loss_episode(lost_pn, next_pn) {
            return;
        }

        // Rate is derived from the window before the reduction.
        self.bytes_per_mtu_increase =
            bytes_per_mtu_increase(w.cwnd, loss.smoothed_rtt, mss);

        trace!(
            "{} pico bytes_per_mtu_increase={}",
            w.trace_id(),
            self.bytes_per_mtu_increase
        );

        w.reduce(mss);
    }

    fn on_sent(
        &mut self, _w: &mut Window, _loss: &LossSnapshot, _bytes: u32,
        _now: Instant,
    ) {
    }
}

pub(super) fn on_switch(cc: &mut Congestion) -> bool {
    match &cc.algorithm {
        Algorithm::Pico(_) => true,

        Algorithm::Reno(reno) => {
            // Start out growing like Reno until the next loss episode.
            let pico = Pico {
                stash: reno.stash,
                bytes_per_mtu_increase: cc.window.cwnd,
            };

            cc.retag(pico.into());

            true
        },

        _ => false,
    }
}
