use clap::Parser;
use spokemeter_rust::analyzer::source::{BlockSource, RawPcmSource, WavFileSource};
use spokemeter_rust::common::box_error::BoxError;
use spokemeter_rust::common::config::Config;
use spokemeter_rust::common::get_micro_time;
use spokemeter_rust::{AnalyzerSettings, StreamController, TensionEngine};
use std::fs::File;
use std::sync::mpsc;
use std::thread;

/// Estimate spoke tension from a plucked-spoke recording or live FIFO

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Mono 16-bit WAV file to analyze
    #[arg(short, long)]
    wav: Option<String>,

    /// Raw s16le PCM stream (a file or a FIFO fed by a capture process)
    #[arg(short, long)]
    raw: Option<String>,

    /// Sample rate of the raw stream
    #[arg(short, long, default_value_t = 44100)]
    sample_rate: u32,

    /// Settings file with pipeline overrides
    #[arg(short = 'c', long, default_value = "spokemeter.json")]
    settings: String,
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let args = Args::parse();

    let config = Config::build(args.settings, json::object! {})?;
    let mut settings = AnalyzerSettings::from_config(&config)?;
    let hop_size = settings.hop_size();

    let source: Box<dyn BlockSource> = match (&args.wav, &args.raw) {
        (Some(path), _) => {
            let wav = WavFileSource::open(path, hop_size)?;
            settings.sample_rate = wav.get_sample_rate();
            Box::new(wav)
        }
        (None, Some(path)) => {
            settings.sample_rate = args.sample_rate;
            Box::new(RawPcmSource::build(File::open(path)?, args.sample_rate, hop_size))
        }
        (None, None) => {
            simple_error::bail!("give me --wav or --raw to listen to");
        }
    };

    let engine = TensionEngine::build(settings, get_micro_time())?;
    let (status_tx, status_rx) = mpsc::channel::<serde_json::Value>();
    let (_command_tx, command_rx) = mpsc::channel();

    // readout printer; the controller owns the main thread
    let printer = thread::spawn(move || {
        for status in status_rx {
            let readout = &status["readout"];
            match readout["frequency"].as_f64() {
                Some(freq) => {
                    println!(
                        "Frequency: {:.0} Hz  Tension: {:.0} N  ({:.0} kgf)",
                        freq,
                        readout["tension"].as_f64().unwrap_or(0.0),
                        readout["kgf"].as_f64().unwrap_or(0.0),
                    );
                }
                None => {
                    println!("Frequency: -- Hz  Tension: -- N  (-- kgf)");
                }
            }
        }
    });

    let mut controller = StreamController::build(source, engine, status_tx, command_rx);
    let result = controller.run();
    drop(controller);
    let _ = printer.join();
    result
}
