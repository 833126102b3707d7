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

//! RTT watermarks and the window clamp derived from them.
//!
//! Below the low watermark the window may reach `max_clamp_bytes`, above the
//! high watermark it is held at `min_clamp_bytes`, and in between the bound
//! falls linearly with the RTT.

/// Default multiplier from the minimum RTT to the high watermark.
const DEFAULT_RTT_HIGH_FACTOR: u32 = 11;

/// Default bounds of the high watermark, in milliseconds.
const DEFAULT_RTT_MAX_FLOOR: u32 = 200;
const DEFAULT_RTT_MAX_CONFIGURABLE: u32 = 600;

/// Default bounds of the low watermark, in milliseconds.
const DEFAULT_RTT_MIN_FLOOR: u32 = 20;
const DEFAULT_RTT_MIN: u32 = 100;

/// Default window bounds, in bytes.
const DEFAULT_MIN_CLAMP_BYTES: u32 = 256 * 1024;
const DEFAULT_MAX_CLAMP_BYTES: u32 = 4 * 1024 * 1024;

/// Bounds used by WRC to derive the window clamp from the RTT.
///
/// RTTs are in milliseconds and windows in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RttClampConfig {
    /// Multiplier applied to the minimum RTT to derive the high watermark.
    pub rtt_high_factor: u32,

    /// Smallest allowed high watermark.
    pub rtt_max_floor: u32,

    /// Largest allowed high watermark, also used before the first RTT
    /// sample.
    pub rtt_max_configurable: u32,

    /// Smallest allowed low watermark.
    pub rtt_min_floor: u32,

    /// Largest allowed low watermark, also used before the first RTT
    /// sample.
    pub rtt_min: u32,

    /// Window bound at or above the high watermark.
    pub min_clamp_bytes: u32,

    /// Window bound at or below the low watermark.
    pub max_clamp_bytes: u32,
}

impl Default for RttClampConfig {
    fn default() -> Self {
        RttClampConfig {
            rtt_high_factor: DEFAULT_RTT_HIGH_FACTOR,
            rtt_max_floor: DEFAULT_RTT_MAX_FLOOR,
            rtt_max_configurable: DEFAULT_RTT_MAX_CONFIGURABLE,
            rtt_min_floor: DEFAULT_RTT_MIN_FLOOR,
            rtt_min: DEFAULT_RTT_MIN,
            min_clamp_bytes: DEFAULT_MIN_CLAMP_BYTES,
            max_clamp_bytes: DEFAULT_MAX_CLAMP_BYTES,
        }
    }
}

impl RttClampConfig {
    /// `rtt_ms * rtt_high_factor`, bounded to
    /// `[rtt_max_floor, rtt_max_configurable]`.
    pub(super) fn high_watermark(&self, rtt_ms: u32) -> u32 {
        let high = rtt_ms.saturating_mul(self.rtt_high_factor);

        if high < self.rtt_max_floor {
            return self.rtt_max_floor;
        }

        high.min(self.rtt_max_configurable)
    }

    /// `rtt_ms` bounded to `[rtt_min_floor, rtt_min]`.
    pub(super) fn low_watermark(&self, rtt_ms: u32) -> u32 {
        if rtt_ms < self.rtt_min_floor {
            return self.rtt_min_floor;
        }

        rtt_ms.min(self.rtt_min)
    }

    /// Bytes per millisecond the bound decreases by between the watermarks.
    ///
    /// Zero when the configuration or the watermarks are degenerate.
    pub(super) fn slope(&self, high: u32, low: u32) -> i32 {
        if self.max_clamp_bytes <= self.min_clamp_bytes || high <= low {
            return 0;
        }

        let ydiff = i64::from(self.min_clamp_bytes) -
            i64::from(self.max_clamp_bytes);
        let xdiff = i64::from(high) - i64::from(low);

        (ydiff / xdiff).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

/// Watermarks in milliseconds and the slope between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Boundary {
    pub(super) high: u32,

    pub(super) low: u32,

    pub(super) slope: i32,
}

impl Boundary {
    /// The boundary in effect before the first RTT sample.
    pub(super) fn initial(config: &RttClampConfig) -> Self {
        Boundary {
            high: config.rtt_max_configurable,
            low: config.rtt_min,
            slope: 0,
        }
    }

    pub(super) fn calculate(config: &RttClampConfig, rtt_ms: u32) -> Self {
        let high = config.high_watermark(rtt_ms);
        let low = config.low_watermark(rtt_ms);

        Boundary {
            high,
            low,
            slope: config.slope(high, low),
        }
    }

    /// Number of `mtu` sized segments the window is allowed at `rtt_ms`.
    pub(super) fn cwnd_segments(
        &self, rtt_ms: u32, clamp_min: u32, clamp_max: u32, mtu: u32,
    ) -> u32 {
        let mtu = mtu.max(1);

        if rtt_ms >= self.high {
            return clamp_min / mtu;
        }

        if rtt_ms <= self.low {
            return clamp_max / mtu;
        }

        let bytes = i64::from(clamp_max) +
            (i64::from(rtt_ms) - i64::from(self.low)) * i64::from(self.slope);

        let bytes = bytes.clamp(0, i64::from(u32::MAX)) as u32;

        bytes / mtu
    }
}
