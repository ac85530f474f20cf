use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(author, version = fmtsel_core::engine_version(), about)]
#[clap(name = "fmtsel")]
pub struct Cli {
    #[clap(flatten)]
    pub verbosity: Verbosity,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Select(Select),
}

#[derive(Debug, Args)]
pub struct Verbosity {
    #[arg(help = "Verbose output, print the result as json and log at debug level")]
    #[arg(short, long)]
    pub v: bool,

    #[arg(help = "Quiet output, only log errors")]
    #[arg(short, long)]
    pub q: bool,
}

#[derive(Debug, Args)]
#[clap(about = "Evaluate a format selector against a list of formats")]
pub struct Select {
    #[arg(help = "Format selector, e.g. 'bestvideo+bestaudio/best'")]
    #[arg(short, long)]
    pub spec: Option<String>,

    #[arg(help = "Path to a json array of format descriptors")]
    #[arg(short, long)]
    pub formats: PathBuf,

    #[arg(help = "Path to a json object used as the filter language's info dict")]
    #[arg(long)]
    pub info_dict: Option<PathBuf>,

    #[arg(help = "Force the output container extension for merged formats")]
    #[arg(long)]
    pub merge_output_format: Option<String>,

    #[arg(help = "Allow a merge to keep more than one audio stream")]
    #[arg(long, overrides_with = "no_allow_multiple_audio")]
    pub allow_multiple_audio: bool,

    #[arg(help = "Undo a persisted '--allow-multiple-audio' default for this run")]
    #[arg(long, overrides_with = "allow_multiple_audio")]
    pub no_allow_multiple_audio: bool,

    #[arg(help = "Allow a merge to keep more than one video stream")]
    #[arg(long, overrides_with = "no_allow_multiple_video")]
    pub allow_multiple_video: bool,

    #[arg(help = "Undo a persisted '--allow-multiple-video' default for this run")]
    #[arg(long, overrides_with = "allow_multiple_video")]
    pub no_allow_multiple_video: bool,

    #[arg(help = "Only accept formats not marked 'reachable: false' in the format list")]
    #[arg(long)]
    pub check_formats: bool,
}
