use std::error::Error;
use std::io::{self, Write};
use std::path::Path;
use std::thread;

use tracing_subscriber::EnvFilter;

use continuo::capture::{self, StopReason};
use continuo::playback::{self, PlaybackOutcome};
use continuo::{Config, cancel, ports};

const RECORDING_PATH: &str = "recorded_input.mid";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path))?,
        None => Config::default(),
    };

    let input_name = choose_port("Input", &ports::input_port_names()?)?;
    let output_name = choose_port("Output", &ports::output_port_names()?)?;
    println!("{}", "-".repeat(30));

    let stream = ports::open_input(&input_name)?;
    let mut sink = ports::open_output(&output_name)?;

    let (handle, token) = cancel::channel();
    spawn_stop_listener(handle);

    println!("Recording... press Enter to stop and save.");
    let capture = capture::record(
        config.timing(),
        config.time_signature,
        &stream.events,
        &mut sink,
        &token,
    );

    let path = Path::new(RECORDING_PATH);
    capture.track.save(path)?;
    println!(
        "Saved {} events to {}",
        capture.track.musical_events().count(),
        path.display()
    );

    if !matches!(capture.stop, StopReason::Cancelled) {
        println!("Recording ended early; skipping playback.");
        return Ok(());
    }

    if prompt("Play the take back? [y/N] ")?.eq_ignore_ascii_case("y") {
        let timing = capture.track.timing().unwrap_or_else(|| config.timing());
        let (handle, token) = cancel::channel();
        spawn_stop_listener(handle);
        println!("Playing... press Enter to stop.");
        match playback::play(&capture.track, &timing, &mut sink, &token)? {
            PlaybackOutcome::Completed => println!("Done."),
            PlaybackOutcome::Cancelled => println!("Stopped."),
        }
    }

    Ok(())
}

fn spawn_stop_listener(handle: cancel::CancelHandle) {
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        handle.cancel();
    });
}

fn choose_port(label: &str, names: &[String]) -> Result<String, Box<dyn Error>> {
    if names.is_empty() {
        return Err(format!("no MIDI {} ports available", label.to_lowercase()).into());
    }
    for (i, name) in names.iter().enumerate() {
        println!("{} Port {}: {}", label, i + 1, name);
    }
    loop {
        let answer = prompt(&format!("Enter the number of your MIDI {label} port: "))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=names.len()).contains(&n) => return Ok(names[n - 1].clone()),
            _ => println!("Please enter a number between 1 and {}", names.len()),
        }
    }
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
