use clap::{ArgAction, Parser};

/// Serve the current directory at http://localhost:8000 with the
/// headers a PWA needs during development: caching disabled, CORS wide
/// open, and correct MIME types for manifest.json and sw.js.
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
