use std::time::Duration;

use super::clock;

/// Tempo and resolution for one session. Fixed at session start; a tempo
/// change means a new context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingContext {
    pub tempo_us_per_beat: u32,
    pub ticks_per_beat: u16,
}

impl TimingContext {
    pub fn new(tempo_us_per_beat: u32, ticks_per_beat: u16) -> Self {
        Self {
            tempo_us_per_beat,
            ticks_per_beat,
        }
    }

    pub fn from_bpm(bpm: f32, ticks_per_beat: u16) -> Self {
        Self {
            tempo_us_per_beat: (60_000_000.0 / bpm as f64).round() as u32,
            ticks_per_beat,
        }
    }

    pub fn delta_ticks(&self, elapsed: Duration) -> u32 {
        clock::ticks(
            elapsed.as_secs_f64(),
            self.tempo_us_per_beat,
            self.ticks_per_beat,
        )
    }

    pub fn delay_for(&self, delta_ticks: u32) -> Duration {
        clock::ticks_to_duration(delta_ticks, self.tempo_us_per_beat, self.ticks_per_beat)
    }
}
