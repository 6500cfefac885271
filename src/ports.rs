use crossbeam::channel::{Receiver, unbounded};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use thiserror::Error;
use tracing::debug;

use crate::events::MidiEvent;

const CLIENT_NAME: &str = "continuo";

#[derive(Debug, Error)]
pub enum PortError {
    #[error("failed to initialize MIDI client: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI port named {0:?}")]
    UnknownPort(String),
    #[error("failed to connect to MIDI port: {0}")]
    Connect(String),
    #[error("failed to send MIDI message: {0}")]
    Send(#[from] midir::SendError),
}

/// Anything events can be dispatched to. Hardware ports implement it; tests
/// substitute an in-memory sink.
pub trait EventSink {
    fn send(&mut self, event: &MidiEvent) -> Result<(), PortError>;
}

pub fn input_port_names() -> Result<Vec<String>, PortError> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

pub fn output_port_names() -> Result<Vec<String>, PortError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}

/// An open input port. Parsed events arrive on `events`; the connection is
/// held so the backend keeps delivering, and dropping the stream closes the
/// port.
pub struct InputStream {
    pub events: Receiver<MidiEvent>,
    _connection: MidiInputConnection<()>,
}

pub fn open_input(name: &str) -> Result<InputStream, PortError> {
    let mut midi_in = MidiInput::new(CLIENT_NAME)?;
    // Deliver clock, sysex and active sensing too; the capture engine
    // decides what to do with them.
    midi_in.ignore(Ignore::None);
    let ports = midi_in.ports();
    let port = ports
        .iter()
        .find(|port| midi_in.port_name(port).map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| PortError::UnknownPort(name.to_string()))?;

    let (tx, rx) = unbounded();
    let connection = midi_in
        .connect(
            port,
            "continuo-in",
            move |_timestamp, bytes, _| match MidiEvent::parse(bytes) {
                Some(event) => {
                    let _ = tx.send(event);
                }
                None => debug!("ignoring unsupported message: {bytes:02X?}"),
            },
            (),
        )
        .map_err(|e| PortError::Connect(e.to_string()))?;

    Ok(InputStream {
        events: rx,
        _connection: connection,
    })
}

/// An open output port. Dropping it releases the port.
pub struct OutputSink {
    connection: MidiOutputConnection,
}

pub fn open_output(name: &str) -> Result<OutputSink, PortError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    let ports = midi_out.ports();
    let port = ports
        .iter()
        .find(|port| midi_out.port_name(port).map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| PortError::UnknownPort(name.to_string()))?;
    let connection = midi_out
        .connect(port, "continuo-out")
        .map_err(|e| PortError::Connect(e.to_string()))?;
    Ok(OutputSink { connection })
}

impl EventSink for OutputSink {
    fn send(&mut self, event: &MidiEvent) -> Result<(), PortError> {
        if let Some(bytes) = event.to_bytes() {
            self.connection.send(&bytes)?;
        }
        Ok(())
    }
}
