use tracing::info;

use crate::cancel::CancelToken;
use crate::events::MidiEvent;
use crate::ports::{EventSink, PortError};
use crate::timing::TimingContext;
use crate::track::RecordedTrack;

#[derive(Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}

/// Replays a track in order, waiting out each event's delta before sending
/// it. The inter-event sleep is the cancellation point: a stop signal
/// interrupts it, no further events are sent, and the sink is released by
/// the caller's scope regardless of how we return.
pub fn play(
    track: &RecordedTrack,
    timing: &TimingContext,
    sink: &mut dyn EventSink,
    cancel: &CancelToken,
) -> Result<PlaybackOutcome, PortError> {
    for timed in &track.events {
        let delay = timing.delay_for(timed.delta_ticks);
        let cancelled = if delay.is_zero() {
            cancel.is_cancelled()
        } else {
            cancel.sleep(delay)
        };
        if cancelled {
            info!("playback stopped");
            return Ok(PlaybackOutcome::Cancelled);
        }
        // Meta events have no wire form: they keep their place in time but
        // are never dispatched.
        if !matches!(timed.event, MidiEvent::Meta(_)) {
            sink.send(&timed.event)?;
        }
    }
    Ok(PlaybackOutcome::Completed)
}
