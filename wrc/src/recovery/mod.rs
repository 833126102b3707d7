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

use std::time::Duration;

mod congestion;
mod rtt;

pub use self::congestion::Congestion;
pub use self::congestion::CongestionControlAlgorithm;
pub use self::congestion::RttClampConfig;
pub use self::rtt::RttStats;

/// The congestion window never shrinks below this many segments as the
/// result of a loss.
pub const MIN_CWND_SEGMENTS: u32 = 2;

/// Multiplicative decrease factor applied on a loss episode.
const LOSS_REDUCTION_FACTOR: f64 = 0.7;

/// A read-only view of the loss recovery state, valid for the duration of a
/// single congestion control event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LossSnapshot {
    /// The most recent RTT sample. Zero when no valid sample is available.
    pub latest_rtt: Duration,

    /// The smoothed RTT.
    pub smoothed_rtt: Duration,

    /// Bytes currently in flight, including any packet just sent.
    pub bytes_in_flight: usize,

    /// Number of entries in the sent packet map.
    pub sent_packets: usize,
}

/// Converts a duration to whole milliseconds, saturating at `u32::MAX`.
fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
