use std::time::{Duration, Instant};

use continuo::capture::CaptureSession;
use continuo::events::MidiEvent;
use continuo::playback::{self, PlaybackOutcome};
use continuo::ports::{EventSink, PortError};
use continuo::timing::TimingContext;
use continuo::track::RecordedTrack;
use continuo::{Config, cancel};

struct VecSink(Vec<MidiEvent>);

impl EventSink for VecSink {
    fn send(&mut self, event: &MidiEvent) -> Result<(), PortError> {
        self.0.push(event.clone());
        Ok(())
    }
}

fn capture_take(timing: TimingContext) -> RecordedTrack {
    let start = Instant::now();
    let mut session = CaptureSession::new(timing, (4, 4), start);
    let phrase = [(60u8, 0u64), (64, 500), (67, 1000), (72, 1250)];
    for (note, offset_ms) in phrase {
        let at = start + Duration::from_millis(offset_ms);
        session.record_event(
            MidiEvent::NoteOn {
                channel: 0,
                note,
                velocity: 100,
            },
            at,
        );
        session.record_event(
            MidiEvent::NoteOff {
                channel: 0,
                note,
                velocity: 0,
            },
            at + Duration::from_millis(120),
        );
    }
    session.into_track()
}

#[test]
fn persisted_take_round_trips_and_replays_in_order() {
    let config = Config::default();
    let timing = config.timing();
    let track = capture_take(timing);

    let path = std::env::temp_dir().join("continuo_roundtrip.mid");
    track.save(&path).unwrap();
    let loaded = RecordedTrack::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.ticks_per_beat, track.ticks_per_beat);
    assert_eq!(loaded.events, track.events);
    assert_eq!(loaded.timing(), Some(timing));

    // replay dispatches the musical events in recording order
    let fast = TimingContext::new(1_000, loaded.ticks_per_beat);
    let (_handle, token) = cancel::channel();
    let mut sink = VecSink(Vec::new());
    let outcome = playback::play(&loaded, &fast, &mut sink, &token).unwrap();
    assert_eq!(outcome, PlaybackOutcome::Completed);

    let recorded: Vec<&MidiEvent> = loaded.musical_events().map(|t| &t.event).collect();
    let dispatched: Vec<&MidiEvent> = sink.0.iter().collect();
    assert_eq!(dispatched, recorded);
}

#[test]
fn replay_duration_matches_the_take_within_rounding() {
    let timing = TimingContext::from_bpm(120.0, 480);
    let track = capture_take(timing);

    // 1370 ms of performance; every delta rounds within half a tick
    let total_ticks: u32 = track.events.iter().map(|t| t.delta_ticks).sum();
    let total = timing.delay_for(total_ticks);
    let expected = Duration::from_millis(1370);
    let tick = timing.delay_for(1);
    let events = track.events.len() as u32;
    assert!(
        total >= expected.saturating_sub(tick * events) && total <= expected + tick * events,
        "replay span {total:?} strays from {expected:?}"
    );
}
