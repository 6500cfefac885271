use std::time::Duration;

/// Converts elapsed wall-clock seconds to ticks, rounded to nearest.
/// Clock jitter can hand us a negative elapsed; that is a measurement
/// anomaly, not a rewind, so the result clamps at 0.
pub fn ticks(elapsed_seconds: f64, tempo_us_per_beat: u32, ticks_per_beat: u16) -> u32 {
    let beats = elapsed_seconds * 1_000_000.0 / tempo_us_per_beat as f64;
    let ticks = (beats * ticks_per_beat as f64).round();
    if ticks <= 0.0 { 0 } else { ticks as u32 }
}

/// Inverse of [`ticks`]: the wall-clock time a delta spans.
pub fn ticks_to_duration(delta_ticks: u32, tempo_us_per_beat: u32, ticks_per_beat: u16) -> Duration {
    let us = delta_ticks as u64 * tempo_us_per_beat as u64 / ticks_per_beat.max(1) as u64;
    Duration::from_micros(us)
}
