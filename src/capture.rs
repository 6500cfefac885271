use std::time::Instant;

use crossbeam::channel::Receiver;
use crossbeam::select;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::events::{MidiEvent, note_name};
use crate::ports::{EventSink, PortError};
use crate::timing::TimingContext;
use crate::track::RecordedTrack;

/// Why a recording ended. Cancellation is the normal outcome; the other two
/// still hand back everything captured so far.
#[derive(Debug)]
pub enum StopReason {
    Cancelled,
    InputClosed,
    SinkFailed(PortError),
}

#[derive(Debug)]
pub struct Capture {
    pub track: RecordedTrack,
    pub stop: StopReason,
}

/// One recording session: owns the timing context and the track buffer.
/// Deltas anchor to the previous recorded event, so clock jitter never
/// accumulates past a single inter-event interval.
pub struct CaptureSession {
    timing: TimingContext,
    track: RecordedTrack,
    last_recorded_at: Instant,
}

impl CaptureSession {
    pub fn new(timing: TimingContext, time_signature: (u8, u8), started_at: Instant) -> Self {
        Self {
            timing,
            track: RecordedTrack::new(&timing, time_signature),
            last_recorded_at: started_at,
        }
    }

    /// Stamps the event with the ticks elapsed since the previous recorded
    /// event and appends it. Returns the delta for feedback.
    pub fn record_event(&mut self, event: MidiEvent, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_recorded_at);
        let delta_ticks = self.timing.delta_ticks(elapsed);
        self.track.push(delta_ticks, event);
        self.last_recorded_at = now;
        delta_ticks
    }

    pub fn into_track(self) -> RecordedTrack {
        self.track
    }
}

/// Records incoming events until cancelled, the input disconnects, or the
/// sink fails. Pass-through messages are forwarded immediately without
/// touching the timer or the track; everything else is timed, recorded and
/// then forwarded unmodified.
pub fn record(
    timing: TimingContext,
    time_signature: (u8, u8),
    events: &Receiver<MidiEvent>,
    sink: &mut dyn EventSink,
    cancel: &CancelToken,
) -> Capture {
    let mut session = CaptureSession::new(timing, time_signature, Instant::now());
    info!(
        tempo_us_per_beat = timing.tempo_us_per_beat,
        ticks_per_beat = timing.ticks_per_beat,
        "recording"
    );

    let stop = loop {
        select! {
            recv(events) -> incoming => match incoming {
                Ok(event) if event.is_pass_through() => {
                    if let Err(e) = sink.send(&event) {
                        break StopReason::SinkFailed(e);
                    }
                }
                Ok(event) => {
                    let delta_ticks = session.record_event(event.clone(), Instant::now());
                    if let MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } = &event {
                        info!(delta_ticks, "{}", note_name(*note));
                    }
                    if let Err(e) = sink.send(&event) {
                        break StopReason::SinkFailed(e);
                    }
                }
                Err(_) => break StopReason::InputClosed,
            },
            recv(cancel.signal()) -> _ => break StopReason::Cancelled,
        }
    };

    match &stop {
        StopReason::Cancelled => info!("recording stopped"),
        StopReason::InputClosed => warn!("input port closed, keeping the partial take"),
        StopReason::SinkFailed(e) => warn!("output sink failed ({e}), keeping the partial take"),
    }

    Capture {
        track: session.into_track(),
        stop,
    }
}
