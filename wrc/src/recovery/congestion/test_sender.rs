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

use std::collections::VecDeque;
use std::ops::Deref;
use std::ops::DerefMut;
use std::time::Duration;
use std::time::Instant;

use crate::recovery::congestion::Congestion;
use crate::recovery::rtt::RttStats;
use crate::recovery::LossSnapshot;
use crate::CongestionControlAlgorithm;

/// Drives a [`Congestion`] the way the loss recovery layer does, with a
/// simulated clock and packet number space.
pub(crate) struct TestSender {
    cc: Congestion,
    pub(crate) next_pn: u64,
    pub(crate) bytes_in_flight: u32,
    pub(crate) time: Instant,
    pub(crate) mss: u32,
    pub(crate) rtt_stats: RttStats,
    sent_packets: VecDeque<(u64, u32)>,
}

impl TestSender {
    pub(crate) fn new(algo: CongestionControlAlgorithm) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut cfg = crate::Config::new();
        cfg.set_cc_algorithm(algo);
        cfg.set_trace_id("test");

        let time = Instant::now();

        TestSender {
            next_pn: 0,
            bytes_in_flight: 0,
            time,
            mss: cfg.max_send_udp_payload_size(),
            rtt_stats: RttStats::new(Duration::from_millis(25)),
            cc: Congestion::new(&cfg, time),
            sent_packets: VecDeque::new(),
        }
    }

    fn snapshot(&self) -> LossSnapshot {
        self.rtt_stats
            .snapshot(self.bytes_in_flight as usize, self.sent_packets.len())
    }

    pub(crate) fn send_packet(&mut self, bytes: u32) {
        self.sent_packets.push_back((self.next_pn, bytes));

        self.bytes_in_flight += bytes;
        self.next_pn += 1;

        let snapshot = self.snapshot();

        self.cc.on_sent(&snapshot, bytes, self.time);
    }

    /// Acknowledges the `n` oldest outstanding packets at once.
    pub(crate) fn ack_n_packets(&mut self, n: usize) {
        let inflight = self.bytes_in_flight;

        let mut acked = 0;
        let mut largest_acked = 0;

        for _ in 0..n {
            let (pn, bytes) = self.sent_packets.pop_front().unwrap();

            acked += bytes;
            largest_acked = pn;
        }

        self.bytes_in_flight -= acked;

        let snapshot = self.snapshot();

        self.cc.on_acked(
            &snapshot,
            acked,
            largest_acked,
            inflight,
            self.next_pn,
            self.time,
            self.mss,
        );
    }

    /// Declares the `n` oldest outstanding packets lost, one by one.
    pub(crate) fn lose_n_packets(&mut self, n: usize) {
        for _ in 0..n {
            let (pn, bytes) = self.sent_packets.pop_front().unwrap();

            self.bytes_in_flight -= bytes;

            let snapshot = self.snapshot();

            self.cc.on_lost(
                &snapshot,
                bytes,
                pn,
                self.next_pn,
                self.time,
                self.mss,
            );
        }
    }

    pub(crate) fn persistent_congestion(&mut self) {
        let snapshot = self.snapshot();

        self.cc.on_persistent_congestion(&snapshot, self.time);
    }

    pub(crate) fn update_rtt(&mut self, rtt: Duration) {
        self.rtt_stats.update_rtt(rtt, Duration::ZERO);
    }

    pub(crate) fn advance_time(&mut self, period: Duration) {
        self.time += period;
    }
}

impl Deref for TestSender {
    type Target = Congestion;

    fn deref(&self) -> &Self::Target {
        &self.cc
    }
}

impl DerefMut for TestSender {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cc
    }
}
