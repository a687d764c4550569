use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "faststart")]
#[command(
    author,
    version,
    about = "Move the moov atom of a QuickTime/MP4 file in front of the media data"
)]
pub struct Cli {
    /// Input file (reads standard input if not specified)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (writes standard output if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress status messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report whether the input can be relocated without writing anything
    #[arg(long, conflicts_with = "output")]
    pub check: bool,
}
