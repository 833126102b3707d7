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

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Instant;

use crate::Config;

use super::LossSnapshot;
use super::LOSS_REDUCTION_FACTOR;
use super::MIN_CWND_SEGMENTS;

pub use self::wrc::RttClampConfig;

mod cubic;
mod pico;
mod reno;
mod wrc;

#[cfg(test)]
mod test_sender;

/// Available congestion control algorithms.
///
/// This enum provides currently available list of congestion control
/// algorithms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CongestionControlAlgorithm {
    /// Reno congestion control algorithm. `reno` in a string form.
    Reno  = 0,
    /// CUBIC congestion control algorithm. `cubic` in a string form.
    CUBIC = 1,
    /// Pico congestion control algorithm. `pico` in a string form.
    Pico  = 2,
    /// RTT-clamped CUBIC (default). `wrc` in a string form.
    #[default]
    WRC   = 3,
}

impl FromStr for CongestionControlAlgorithm {
    type Err = crate::Error;

    /// Converts a string to `CongestionControlAlgorithm`.
    ///
    /// If `name` is not valid, `Error::CongestionControl` is returned.
    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "reno" => Ok(CongestionControlAlgorithm::Reno),
            "cubic" => Ok(CongestionControlAlgorithm::CUBIC),
            "pico" => Ok(CongestionControlAlgorithm::Pico),
            "wrc" => Ok(CongestionControlAlgorithm::WRC),

            _ => Err(crate::Error::CongestionControl),
        }
    }
}

impl std::fmt::Display for CongestionControlAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl CongestionControlAlgorithm {
    /// Returns the string form of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            CongestionControlAlgorithm::Reno => "reno",
            CongestionControlAlgorithm::CUBIC => "cubic",
            CongestionControlAlgorithm::Pico => "pico",
            CongestionControlAlgorithm::WRC => "wrc",
        }
    }

    /// Creates the algorithm specific state of a freshly reset connection.
    fn init(
        self, initial_cwnd: u32, rtt_clamp: &RttClampConfig,
    ) -> Algorithm {
        match self {
            CongestionControlAlgorithm::Reno => reno::Reno::default().into(),
            CongestionControlAlgorithm::CUBIC =>
                cubic::Cubic::default().into(),
            CongestionControlAlgorithm::Pico =>
                pico::Pico::new(initial_cwnd).into(),
            CongestionControlAlgorithm::WRC => wrc::Wrc::new(rtt_clamp).into(),
        }
    }

    /// Asks this algorithm to take over `cc`, which is currently driven by
    /// another (or the same) algorithm.
    ///
    /// Returns `false` if the current state cannot be adopted, in which case
    /// `cc` is left untouched.
    fn on_switch(self, cc: &mut Congestion) -> bool {
        match self {
            CongestionControlAlgorithm::Reno => reno::on_switch(cc),
            CongestionControlAlgorithm::CUBIC => cubic::on_switch(cc),
            CongestionControlAlgorithm::Pico => pico::on_switch(cc),
            CongestionControlAlgorithm::WRC => wrc::on_switch(cc),
        }
    }
}

/// State shared by all algorithms.
///
/// Windows are in bytes.
#[derive(Debug)]
pub(crate) struct Window {
    pub(crate) cwnd: u32,

    pub(crate) cwnd_initial: u32,

    /// Largest window seen; only ever increases.
    pub(crate) cwnd_maximum: u32,

    /// Smallest window after a loss; only ever decreases.
    pub(crate) cwnd_minimum: u32,

    pub(crate) ssthresh: u32,

    /// Upper bound enforced by WRC on acknowledgment.
    pub(crate) cwnd_clamp: u32,

    /// Losses of packets numbered below this belong to the current
    /// recovery episode.
    pub(crate) recovery_end: u64,

    pub(crate) num_loss_episodes: u64,

    /// Window at the first loss episode, zero while still in the initial
    /// slow start.
    pub(crate) cwnd_exiting_slow_start: u32,

    trace_id: String,
}

impl Window {
    fn new(initial_cwnd: u32, trace_id: String) -> Self {
        Window {
            cwnd: initial_cwnd,
            cwnd_initial: initial_cwnd,
            cwnd_maximum: initial_cwnd,
            cwnd_minimum: u32::MAX,
            ssthresh: u32::MAX,
            cwnd_clamp: u32::MAX,
            recovery_end: 0,
            num_loss_episodes: 0,
            cwnd_exiting_slow_start: 0,
            trace_id,
        }
    }

    pub(crate) fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub(crate) fn in_slow_start(&self) -> bool {
        self.cwnd < self.ssthresh
    }

    pub(crate) fn in_recovery(&self, pkt_num: u64) -> bool {
        pkt_num < self.recovery_end
    }

    /// Starts a new loss episode unless `lost_pn` belongs to the current
    /// one. Returns `false` when the loss must be ignored.
    pub(crate) fn on_loss_episode(
        &mut self, lost_pn: u64, next_pn: u64,
    ) -> bool {
        if self.in_recovery(lost_pn) {
            return false;
        }

        self.recovery_end = next_pn;

        self.num_loss_episodes += 1;

        if self.cwnd_exiting_slow_start == 0 {
            self.cwnd_exiting_slow_start = self.cwnd;

            debug!(
                "{} exiting slow start cwnd={}",
                self.trace_id, self.cwnd_exiting_slow_start
            );
        }

        debug!(
            "{} loss episode {} lost_pn={} recovery_end={}",
            self.trace_id, self.num_loss_episodes, lost_pn, self.recovery_end
        );

        true
    }

    /// Multiplicative decrease, floored at `MIN_CWND_SEGMENTS` segments.
    pub(crate) fn reduce(&mut self, mss: u32) {
        let min_cwnd = MIN_CWND_SEGMENTS.saturating_mul(mss);

        let cwnd = (self.cwnd as f64 * LOSS_REDUCTION_FACTOR) as u32;

        self.cwnd = cwnd.max(min_cwnd);

        self.ssthresh = self.cwnd;

        self.cwnd_minimum = self.cwnd_minimum.min(self.cwnd);
    }

    /// Slow start growth by the number of acknowledged bytes.
    pub(crate) fn slow_start(&mut self, bytes: u32) {
        self.cwnd = self.cwnd.saturating_add(bytes);
    }

    /// Grows the window by one `mss` per `bytes_per_mss` acknowledged bytes,
    /// carrying the remainder in `stash`. Returns `true` if the window grew.
    pub(crate) fn congestion_avoidance(
        &mut self, stash: &mut u32, bytes: u32, bytes_per_mss: u32, mss: u32,
    ) -> bool {
        let bytes_per_mss = bytes_per_mss.max(1);

        *stash = stash.saturating_add(bytes);

        if *stash < bytes_per_mss {
            return false;
        }

        let count = *stash / bytes_per_mss;

        *stash -= count * bytes_per_mss;

        self.cwnd = self.cwnd.saturating_add(count.saturating_mul(mss));

        true
    }

    pub(crate) fn apply_clamp(&mut self) {
        self.cwnd = self.cwnd.min(self.cwnd_clamp);
    }

    pub(crate) fn update_maximum(&mut self) {
        self.cwnd_maximum = self.cwnd_maximum.max(self.cwnd);
    }
}

/// The per-algorithm half of the congestion state.
///
/// Handlers receive the shared [`Window`] alongside their own state and
/// mutate both in place.
#[enum_dispatch::enum_dispatch]
pub(crate) trait CongestionControl: Debug {
    /// The descriptor this state belongs to.
    fn algorithm(&self) -> CongestionControlAlgorithm;

    /// `bytes` were newly acknowledged, the largest of which is
    /// `largest_acked`. `inflight` is the number of bytes in flight
    /// including the acknowledged ones.
    #[allow(clippy::too_many_arguments)]
    fn on_acked(
        &mut self, w: &mut Window, loss: &LossSnapshot, bytes: u32,
        largest_acked: u64, inflight: u32, next_pn: u64, now: Instant,
        mss: u32,
    );

    /// Packet `lost_pn` of `bytes` bytes was declared lost.
    #[allow(clippy::too_many_arguments)]
    fn on_lost(
        &mut self, w: &mut Window, loss: &LossSnapshot, bytes: u32,
        lost_pn: u64, next_pn: u64, now: Instant, mss: u32,
    );

    /// Persistent congestion was established. Nothing is done by default.
    fn on_persistent_congestion(
        &mut self, w: &mut Window, _loss: &LossSnapshot, _now: Instant,
    ) {
        trace!("{} persistent congestion ignored", w.trace_id());
    }

    /// A packet of `bytes` bytes was sent. `loss.bytes_in_flight` already
    /// accounts for it.
    fn on_sent(
        &mut self, w: &mut Window, loss: &LossSnapshot, bytes: u32,
        now: Instant,
    );
}

#[enum_dispatch::enum_dispatch(CongestionControl)]
#[derive(Debug)]
pub(crate) enum Algorithm {
    Reno(reno::Reno),
    CUBIC(cubic::Cubic),
    Pico(pico::Pico),
    WRC(wrc::Wrc),
}

/// Congestion control state of a single connection.
pub struct Congestion {
    window: Window,

    algorithm: Algorithm,

    rtt_clamp: RttClampConfig,
}

impl std::fmt::Debug for Congestion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "algorithm={} ", self.algorithm.algorithm())?;
        write!(f, "cwnd={} ", self.window.cwnd)?;
        write!(f, "ssthresh={} ", self.window.ssthresh)?;
        write!(f, "cwnd_clamp={} ", self.window.cwnd_clamp)?;
        write!(f, "cwnd_max={} ", self.window.cwnd_maximum)?;
        write!(f, "cwnd_min={} ", self.window.cwnd_minimum)?;
        write!(f, "recovery_end={} ", self.window.recovery_end)?;
        write!(f, "loss_episodes={} ", self.window.num_loss_episodes)?;
        write!(f, "{:?}", self.algorithm)?;

        Ok(())
    }
}

impl Congestion {
    /// Creates the congestion state of a new connection.
    pub fn new(config: &Config, now: Instant) -> Self {
        let initial_cwnd = config.initial_congestion_window();

        let mut cc = Congestion {
            window: Window::new(initial_cwnd, config.trace_id().to_string()),

            algorithm: reno::Reno::default().into(),

            rtt_clamp: *config.rtt_clamp(),
        };

        cc.init(config.cc_algorithm(), initial_cwnd, now);

        cc
    }

    /// Initializes the state for `algo` with an initial window of
    /// `initial_cwnd` bytes.
    pub fn init(
        &mut self, algo: CongestionControlAlgorithm, initial_cwnd: u32,
        _now: Instant,
    ) {
        self.reset(algo, initial_cwnd);
    }

    /// Discards all state and restarts `algo` from `initial_cwnd`.
    pub fn reset(
        &mut self, algo: CongestionControlAlgorithm, initial_cwnd: u32,
    ) {
        let trace_id = std::mem::take(&mut self.window.trace_id);

        self.window = Window::new(initial_cwnd, trace_id);

        self.algorithm = algo.init(initial_cwnd, &self.rtt_clamp);
    }

    /// Switches to `algo`.
    ///
    /// Returns `false` if `algo` refuses to take over the current state, in
    /// which case the previous algorithm stays active.
    pub fn switch(&mut self, algo: CongestionControlAlgorithm) -> bool {
        let from = self.algorithm();

        let switched = algo.on_switch(self);

        if switched {
            debug!(
                "{} switched congestion control {} -> {} cwnd={}",
                self.window.trace_id, from, algo, self.window.cwnd
            );
        } else {
            debug!(
                "{} congestion control switch {} -> {} rejected",
                self.window.trace_id, from, algo
            );
        }

        switched
    }

    /// Replaces the algorithm specific state, keeping the shared window.
    fn retag(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    /// Takes over a connection driven by a Reno-family algorithm: the state
    /// is kept while still in the initial slow start, and reset otherwise.
    fn adopt_from_reno(&mut self, algo: CongestionControlAlgorithm) {
        if self.window.cwnd_exiting_slow_start == 0 {
            let state = algo.init(self.window.cwnd_initial, &self.rtt_clamp);

            self.retag(state);
        } else {
            let initial_cwnd = self.window.cwnd_initial;

            self.reset(algo, initial_cwnd);
        }
    }

    /// Processes the acknowledgment of `bytes` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `inflight` is smaller than `bytes`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_acked(
        &mut self, loss: &LossSnapshot, bytes: u32, largest_acked: u64,
        inflight: u32, next_pn: u64, now: Instant, mss: u32,
    ) {
        self.algorithm.on_acked(
            &mut self.window,
            loss,
            bytes,
            largest_acked,
            inflight,
            next_pn,
            now,
            mss,
        );

        trace!("{} on_acked {:?}", self.window.trace_id, self);
    }

    /// Processes the loss of packet `lost_pn`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_lost(
        &mut self, loss: &LossSnapshot, bytes: u32, lost_pn: u64,
        next_pn: u64, now: Instant, mss: u32,
    ) {
        self.algorithm.on_lost(
            &mut self.window,
            loss,
            bytes,
            lost_pn,
            next_pn,
            now,
            mss,
        );

        trace!("{} on_lost {:?}", self.window.trace_id, self);
    }

    /// Processes a persistent congestion event.
    pub fn on_persistent_congestion(
        &mut self, loss: &LossSnapshot, now: Instant,
    ) {
        self.algorithm
            .on_persistent_congestion(&mut self.window, loss, now);
    }

    /// Processes the transmission of a packet of `bytes` bytes.
    pub fn on_sent(&mut self, loss: &LossSnapshot, bytes: u32, now: Instant) {
        self.algorithm.on_sent(&mut self.window, loss, bytes, now);
    }

    /// Returns the active algorithm.
    pub fn algorithm(&self) -> CongestionControlAlgorithm {
        self.algorithm.algorithm()
    }

    /// Returns the name of the active algorithm.
    pub fn name(&self) -> &'static str {
        self.algorithm().name()
    }

    /// Returns the congestion window in bytes.
    pub fn cwnd(&self) -> u32 {
        self.window.cwnd
    }

    /// Returns the initial congestion window in bytes.
    pub fn cwnd_initial(&self) -> u32 {
        self.window.cwnd_initial
    }

    /// Returns the largest congestion window seen.
    pub fn cwnd_maximum(&self) -> u32 {
        self.window.cwnd_maximum
    }

    /// Returns the smallest congestion window seen after a loss, or
    /// `u32::MAX` if no loss happened.
    pub fn cwnd_minimum(&self) -> u32 {
        self.window.cwnd_minimum
    }

    /// Returns the upper bound WRC currently enforces, in bytes.
    pub fn cwnd_clamp(&self) -> u32 {
        self.window.cwnd_clamp
    }

    /// Returns the slow start threshold.
    pub fn ssthresh(&self) -> u32 {
        self.window.ssthresh
    }

    /// Returns the packet number ending the current recovery episode.
    pub fn recovery_end(&self) -> u64 {
        self.window.recovery_end
    }

    /// Returns the number of loss episodes.
    pub fn num_loss_episodes(&self) -> u64 {
        self.window.num_loss_episodes
    }

    /// Returns the window at the end of the initial slow start, or zero if
    /// it did not end yet.
    pub fn cwnd_exiting_slow_start(&self) -> u32 {
        self.window.cwnd_exiting_slow_start
    }

    /// Returns whether the connection is in slow start.
    pub fn in_slow_start(&self) -> bool {
        self.window.in_slow_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use test_sender::TestSender;

    #[rstest]
    #[case::reno("reno", CongestionControlAlgorithm::Reno)]
    #[case::cubic("cubic", CongestionControlAlgorithm::CUBIC)]
    #[case::pico("pico", CongestionControlAlgorithm::Pico)]
    #[case::wrc("wrc", CongestionControlAlgorithm::WRC)]
    fn algorithm_names(
        #[case] name: &str, #[case] algo: CongestionControlAlgorithm,
    ) {
        assert_eq!(CongestionControlAlgorithm::from_str(name), Ok(algo));
        assert_eq!(algo.name(), name);
        assert_eq!(algo.to_string(), name);
    }

    #[test]
    fn unknown_algorithm_name() {
        assert_eq!(
            CongestionControlAlgorithm::from_str("bbr"),
            Err(crate::Error::CongestionControl)
        );
        assert_eq!(
            CongestionControlAlgorithm::from_str("WRC"),
            Err(crate::Error::CongestionControl)
        );
    }

    #[rstest]
    fn init(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let sender = TestSender::new(algo);

        assert_eq!(sender.algorithm(), algo);
        assert_eq!(sender.name(), algo.name());
        assert_eq!(sender.cwnd(), 12000);
        assert_eq!(sender.cwnd_initial(), 12000);
        assert_eq!(sender.cwnd_maximum(), 12000);
        assert_eq!(sender.cwnd_minimum(), u32::MAX);
        assert_eq!(sender.ssthresh(), u32::MAX);
        assert_eq!(sender.cwnd_clamp(), u32::MAX);
        assert_eq!(sender.recovery_end(), 0);
        assert_eq!(sender.num_loss_episodes(), 0);
        assert_eq!(sender.cwnd_exiting_slow_start(), 0);
        assert!(sender.in_slow_start());
    }

    #[rstest]
    fn loss_floor(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let mut sender = TestSender::new(algo);
        let mss = sender.mss;

        for _ in 0..20 {
            sender.send_packet(mss);
            sender.lose_n_packets(1);

            assert!(sender.cwnd() >= MIN_CWND_SEGMENTS * mss);
        }

        assert_eq!(sender.cwnd(), MIN_CWND_SEGMENTS * mss);
        assert_eq!(sender.cwnd_minimum(), MIN_CWND_SEGMENTS * mss);
        assert_eq!(sender.num_loss_episodes(), 20);
    }

    #[rstest]
    fn monotonic_extrema(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let mut sender = TestSender::new(algo);
        let mss = sender.mss;

        sender.update_rtt(std::time::Duration::from_millis(50));

        let mut prev_max = sender.cwnd_maximum();
        let mut prev_min = sender.cwnd_minimum();

        for round in 0..50 {
            for _ in 0..10 {
                sender.send_packet(mss);
            }

            sender.advance_time(std::time::Duration::from_millis(50));

            if round % 7 == 3 {
                sender.lose_n_packets(2);
                sender.ack_n_packets(8);
            } else {
                sender.ack_n_packets(10);
            }

            assert!(sender.cwnd_maximum() >= prev_max);
            assert!(sender.cwnd_minimum() <= prev_min);
            assert!(sender.cwnd_maximum() >= sender.cwnd());

            prev_max = sender.cwnd_maximum();
            prev_min = sender.cwnd_minimum();
        }
    }

    #[rstest]
    fn recovery_suppresses_decrease(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let mut sender = TestSender::new(algo);
        let mss = sender.mss;

        for _ in 0..5 {
            sender.send_packet(mss);
        }

        // Loss of packet 0 opens an episode ending at packet 5.
        sender.lose_n_packets(1);

        let cwnd = sender.cwnd();

        assert_eq!(sender.recovery_end(), 5);
        assert_eq!(sender.num_loss_episodes(), 1);

        // Packets 1 and 2 belong to the same episode.
        sender.lose_n_packets(2);

        assert_eq!(sender.cwnd(), cwnd);
        assert_eq!(sender.num_loss_episodes(), 1);

        // Acknowledging packets sent before the episode does not grow the
        // window.
        sender.ack_n_packets(2);

        assert_eq!(sender.cwnd(), cwnd);
    }

    #[rstest]
    #[should_panic]
    fn ack_more_than_inflight(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let mut sender = TestSender::new(algo);
        let snapshot = LossSnapshot::default();
        let now = sender.time;

        sender.on_acked(&snapshot, 1200, 0, 1199, 1, now, 1200);
    }

    #[rstest]
    fn persistent_congestion_is_noop(
        #[values(
            CongestionControlAlgorithm::Reno,
            CongestionControlAlgorithm::CUBIC,
            CongestionControlAlgorithm::Pico,
            CongestionControlAlgorithm::WRC
        )]
        algo: CongestionControlAlgorithm,
    ) {
        let mut sender = TestSender::new(algo);
        let mss = sender.mss;

        sender.send_packet(mss);
        sender.lose_n_packets(1);

        let cwnd = sender.cwnd();
        let ssthresh = sender.ssthresh();

        sender.persistent_congestion();

        assert_eq!(sender.cwnd(), cwnd);
        assert_eq!(sender.ssthresh(), ssthresh);
        assert_eq!(sender.num_loss_episodes(), 1);
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut sender = TestSender::new(CongestionControlAlgorithm::WRC);
        let mss = sender.mss;

        sender.send_packet(mss);
        sender.lose_n_packets(1);

        sender.reset(CongestionControlAlgorithm::Reno, 24000);

        assert_eq!(sender.algorithm(), CongestionControlAlgorithm::Reno);
        assert_eq!(sender.cwnd(), 24000);
        assert_eq!(sender.cwnd_initial(), 24000);
        assert_eq!(sender.cwnd_maximum(), 24000);
        assert_eq!(sender.cwnd_minimum(), u32::MAX);
        assert_eq!(sender.ssthresh(), u32::MAX);
        assert_eq!(sender.recovery_end(), 0);
        assert_eq!(sender.num_loss_episodes(), 0);
        assert_eq!(sender.cwnd_exiting_slow_start(), 0);
    }

    #[test]
    fn congestion_avoidance_quantization() {
        let mut w = Window::new(12000, String::new());
        let mut stash = 0;

        for _ in 0..9 {
            assert!(!w.congestion_avoidance(&mut stash, 1200, 12000, 1200));
            assert_eq!(w.cwnd, 12000);
        }

        assert!(w.congestion_avoidance(&mut stash, 1200, 12000, 1200));
        assert_eq!(w.cwnd, 13200);
        assert_eq!(stash, 0);
    }

    #[test]
    fn congestion_avoidance_multiple_increments() {
        let mut w = Window::new(12000, String::new());
        let mut stash = 1000;

        assert!(w.congestion_avoidance(&mut stash, 24000, 12000, 1200));
        assert_eq!(w.cwnd, 14400);
        assert_eq!(stash, 1000);
    }

    #[test]
    fn reduce_saturates_and_floors() {
        let mut w = Window::new(u32::MAX, String::new());

        w.reduce(1200);

        assert_eq!(w.cwnd, (u32::MAX as f64 * 0.7) as u32);
        assert_eq!(w.ssthresh, w.cwnd);
        assert_eq!(w.cwnd_minimum, w.cwnd);

        let mut w = Window::new(3000, String::new());

        w.reduce(1200);

        assert_eq!(w.cwnd, 2400);
    }
}
