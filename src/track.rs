use std::fs;
use std::path::Path;

use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, PitchBend as MidlyBend, Smf, Timing, TrackEvent,
    TrackEventKind,
};
use thiserror::Error;

use crate::events::{MetaEvent, MidiEvent, PassThrough, TimedEvent};
use crate::timing::TimingContext;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to read or write MIDI file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid MIDI file: {0}")]
    Parse(#[from] midly::Error),
    #[error("timecode-based MIDI files are not supported")]
    Timecode,
}

/// The persisted recording: delta-timed events behind a tempo and a time
/// signature meta, both at delta 0, so the tick basis is established before
/// any musical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTrack {
    pub ticks_per_beat: u16,
    pub events: Vec<TimedEvent>,
}

impl RecordedTrack {
    pub fn new(timing: &TimingContext, time_signature: (u8, u8)) -> Self {
        Self {
            ticks_per_beat: timing.ticks_per_beat,
            events: vec![
                TimedEvent {
                    delta_ticks: 0,
                    event: MidiEvent::Meta(MetaEvent::SetTempo {
                        us_per_beat: timing.tempo_us_per_beat,
                    }),
                },
                TimedEvent {
                    delta_ticks: 0,
                    event: MidiEvent::Meta(MetaEvent::TimeSignature {
                        numerator: time_signature.0,
                        denominator: time_signature.1,
                    }),
                },
            ],
        }
    }

    pub fn push(&mut self, delta_ticks: u32, event: MidiEvent) {
        self.events.push(TimedEvent { delta_ticks, event });
    }

    /// Timing context declared by the leading tempo meta, if present.
    pub fn timing(&self) -> Option<TimingContext> {
        self.events.iter().find_map(|timed| match timed.event {
            MidiEvent::Meta(MetaEvent::SetTempo { us_per_beat }) => {
                Some(TimingContext::new(us_per_beat, self.ticks_per_beat))
            }
            _ => None,
        })
    }

    /// Events that carry musical content, i.e. everything behind the
    /// leading metas.
    pub fn musical_events(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events
            .iter()
            .filter(|timed| !matches!(timed.event, MidiEvent::Meta(_)))
    }

    pub fn save(&self, path: &Path) -> Result<(), TrackError> {
        let header = Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(self.ticks_per_beat)),
        );
        let mut track: Vec<TrackEvent> = Vec::with_capacity(self.events.len() + 1);
        for timed in &self.events {
            let Some(kind) = event_to_smf(&timed.event) else {
                continue;
            };
            track.push(TrackEvent {
                delta: u28::new(timed.delta_ticks),
                kind,
            });
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        let smf = Smf {
            header,
            tracks: vec![track],
        };
        smf.save(path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let bytes = fs::read(path)?;
        let smf = Smf::parse(&bytes)?;
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(ppq) => ppq.as_int(),
            Timing::Timecode(..) => return Err(TrackError::Timecode),
        };

        let mut events = Vec::new();
        for track in &smf.tracks {
            // Deltas of events we skip fold into the next kept event so
            // absolute positions survive.
            let mut carried: u32 = 0;
            for raw in track {
                let delta = carried + raw.delta.as_int();
                match event_from_smf(&raw.kind) {
                    Some(event) => {
                        events.push(TimedEvent {
                            delta_ticks: delta,
                            event,
                        });
                        carried = 0;
                    }
                    None => carried = delta,
                }
            }
        }

        Ok(Self {
            ticks_per_beat,
            events,
        })
    }
}

fn event_to_smf(event: &MidiEvent) -> Option<TrackEventKind<'static>> {
    match event {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        } => Some(TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::NoteOn {
                key: u7::new(*note),
                vel: u7::new(*velocity),
            },
        }),
        MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        } => Some(TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::NoteOff {
                key: u7::new(*note),
                vel: u7::new(*velocity),
            },
        }),
        MidiEvent::Controller {
            channel,
            controller,
            value,
        } => Some(TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::Controller {
                controller: u7::new(*controller),
                value: u7::new(*value),
            },
        }),
        MidiEvent::PitchBend { channel, value } => Some(TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::PitchBend {
                bend: MidlyBend(midly::num::u14::new(*value)),
            },
        }),
        MidiEvent::Meta(MetaEvent::SetTempo { us_per_beat }) => {
            Some(TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
                *us_per_beat,
            ))))
        }
        MidiEvent::Meta(MetaEvent::TimeSignature {
            numerator,
            denominator,
        }) => Some(TrackEventKind::Meta(MetaMessage::TimeSignature(
            *numerator,
            denominator.max(&1).ilog2() as u8,
            24,
            8,
        ))),
        // Pass-through events are live-only; they never persist
        MidiEvent::PassThrough(_) => None,
    }
}

fn event_from_smf(kind: &TrackEventKind) -> Option<MidiEvent> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Some(MidiEvent::NoteOn {
                    channel,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                }),
                MidiMessage::NoteOn { key, .. } => Some(MidiEvent::NoteOff {
                    channel,
                    note: key.as_int(),
                    velocity: 0,
                }),
                MidiMessage::NoteOff { key, vel } => Some(MidiEvent::NoteOff {
                    channel,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                }),
                MidiMessage::Controller { controller, value } => Some(MidiEvent::Controller {
                    channel,
                    controller: controller.as_int(),
                    value: value.as_int(),
                }),
                MidiMessage::PitchBend { bend } => Some(MidiEvent::PitchBend {
                    channel,
                    value: bend.0.as_int(),
                }),
                _ => None,
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
            Some(MidiEvent::Meta(MetaEvent::SetTempo {
                us_per_beat: tempo.as_int(),
            }))
        }
        TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_log2, _, _)) => {
            Some(MidiEvent::Meta(MetaEvent::TimeSignature {
                numerator: *numerator,
                denominator: 1u8 << denominator_log2.min(&7),
            }))
        }
        TrackEventKind::SysEx(bytes) => Some(MidiEvent::PassThrough(PassThrough::SysEx(
            bytes.to_vec(),
        ))),
        _ => None,
    }
}
