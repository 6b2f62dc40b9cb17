use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay recorded poses into labeled training samples", long_about = None)]
pub struct Args {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(short, long, default_value = "posecap.json")]
    pub settings: PathBuf,

    /// Recorded pose stream, one JSON array of hypotheses per line
    #[arg(short, long)]
    pub replay: PathBuf,

    /// Pose name sent with each sample
    #[arg(short, long)]
    pub label: String,

    /// Number of samples to collect and send before exiting
    #[arg(short = 'n', long, default_value_t = 1)]
    pub samples: u32,

    /// Frame rate the recording was captured at; 0 replays unthrottled
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
}
