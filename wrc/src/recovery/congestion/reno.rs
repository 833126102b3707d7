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

//! Reno Congestion Control
//!
//! Slow start grows the window by the number of acknowledged bytes, and
//! congestion avoidance by one MSS per window worth of acknowledged bytes.

use std::time::Instant;

use crate::recovery::LossSnapshot;

use super::Algorithm;
use super::Congestion;
use super::CongestionControl;
use super::CongestionControlAlgorithm;
use super::Window;

#[derive(Debug, Default)]
pub(crate) struct Reno {
    /// Bytes acknowledged in congestion avoidance not yet turned into
    /// window growth.
    pub(super) stash: u32,
}

impl CongestionControl for Reno {
    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::Reno
    }

    fn on_acked(
        &mut self, w: &mut Window, _loss: &LossSnapshot, bytes: u32,
        largest_acked: u64, inflight: u32, _next_pn: u64, _now: Instant,
        mss: u32,
    ) {
        assert!(inflight >= bytes, "acked {bytes} bytes of {inflight}");

        // Do not increase congestion window while in recovery.
        if w.in_recovery(largest_acked) {
            return;
        }

        if w.in_slow_start() {
            w.slow_start(bytes);
        } else if !w.congestion_avoidance(&mut self.stash, bytes, w.cwnd, mss)
        {
            return;
        }

        w.update_maximum();
    }

    fn on_lost(
        &mut self, w: &mut Window, _loss: &LossSnapshot, _bytes: u32,
        lost_pn: u64, next_pn: u64, _now: Instant, mss: u32,
    ) {
        if !w.on_loss_episode(lost_pn, next_pn) {
            return;
        }

        w.reduce(mss);
    }

    fn on_sent(
        &mut self, _w: &mut Window, _loss: &LossSnapshot, _bytes: u32,
        _now: Instant,
    ) {
    }
}

/// Reno shares its state layout with Pico, so it can take over from it at
/// any time.
pub(super) fn on_switch(cc: &mut Congestion) -> bool {
    match &cc.algorithm {
        Algorithm::Reno(_) => true,

        Algorithm::Pico(pico) => {
            let reno = Reno { stash: pico.stash };

            cc.retag(reno.into());

            true
        },

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::recovery::congestion::test_sender::TestSender;

    fn test_sender() -> TestSender {
        TestSender::new(CongestionControlAlgorithm::Reno)
    }

    #[test]
    fn reno_slow_start() {
        let mut sender = test_sender();
        let size = sender.mss;

        for _ in 0..10 {
            sender.send_packet(size);
        }

        let cwnd_prev = sender.cwnd();

        sender.ack_n_packets(1);

        // Check if cwnd increased by packet size (slow start).
        assert_eq!(sender.cwnd(), cwnd_prev + size);
        assert_eq!(sender.cwnd_maximum(), sender.cwnd());
    }

    #[test]
    fn reno_slow_start_multi_acks() {
        let mut sender = test_sender();
        let size = sender.mss;

        for _ in 0..10 {
            sender.send_packet(size);
        }

        let cwnd_prev = sender.cwnd();

        sender.ack_n_packets(3);

        // Acked bytes are accounted for in a single call.
        assert_eq!(sender.cwnd(), cwnd_prev + 3 * size);
    }

    #[test]
    fn reno_congestion_event() {
        let mut sender = test_sender();
        let size = sender.mss;

        let prev_cwnd = sender.cwnd();

        sender.send_packet(size);
        sender.lose_n_packets(1);

        // In Reno, after a congestion event, cwnd will be cut by 0.7.
        assert_eq!(sender.cwnd(), (prev_cwnd as f64 * 0.7) as u32);
        assert_eq!(sender.ssthresh(), sender.cwnd());
        assert_eq!(sender.cwnd_minimum(), sender.cwnd());
        assert_eq!(sender.cwnd_exiting_slow_start(), prev_cwnd);
        assert_eq!(sender.recovery_end(), 1);
    }

    #[test]
    fn reno_congestion_avoidance() {
        let mut sender = test_sender();
        let size = sender.mss;

        sender.send_packet(size);
        sender.lose_n_packets(1);

        assert!(!sender.in_slow_start());

        let cwnd = sender.cwnd();
        let packets = cwnd / size;

        for _ in 0..packets {
            sender.send_packet(size);
        }

        // No growth until a full window was acknowledged.
        for _ in 0..packets - 1 {
            sender.ack_n_packets(1);
            assert_eq!(sender.cwnd(), cwnd);
        }

        sender.ack_n_packets(1);

        assert_eq!(sender.cwnd(), cwnd + size);
    }

    #[test]
    fn reno_switch_from_pico_carries_stash() {
        let mut sender = TestSender::new(CongestionControlAlgorithm::Pico);

        if let Algorithm::Pico(pico) = &mut sender.algorithm {
            pico.stash = 600;
        }

        assert!(sender.switch(CongestionControlAlgorithm::Reno));
        assert_eq!(sender.algorithm(), CongestionControlAlgorithm::Reno);

        match &sender.algorithm {
            Algorithm::Reno(reno) => assert_eq!(reno.stash, 600),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn reno_switch_rejects_cubic_family() {
        let mut sender = TestSender::new(CongestionControlAlgorithm::WRC);

        assert!(!sender.switch(CongestionControlAlgorithm::Reno));
        assert_eq!(sender.algorithm(), CongestionControlAlgorithm::WRC);

        let mut sender = TestSender::new(CongestionControlAlgorithm::CUBIC);

        assert!(!sender.switch(CongestionControlAlgorithm::Reno));
        assert_eq!(sender.algorithm(), CongestionControlAlgorithm::CUBIC);
    }
}
