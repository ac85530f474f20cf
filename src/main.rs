use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use fmtsel_core::{build_format_selector, StaticHost};
use log::{debug, error, LevelFilter};

mod cli;
mod config;
mod formats_io;
mod logging;

use cli::{Cli, Command, Select};
use config::Config;

fn main() {
    let cli = Cli::parse();

    if cli.verbosity.v && cli.verbosity.q {
        eprintln!("Output cannot be verbose ('-v') and quiet ('-q') at the same time");
        std::process::exit(1)
    }
    let level = if cli.verbosity.v {
        LevelFilter::Debug
    } else if cli.verbosity.q {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    logging::CliLogger::init(false, level).unwrap();

    debug!("cli input: {:?}", cli);

    let result = match cli.command {
        Command::Select(select) => run_select(select, cli.verbosity.v),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1)
    }
}

fn run_select(args: Select, verbose: bool) -> Result<()> {
    let config = Config::load()?.unwrap_or_default();

    let spec = args
        .spec
        .or_else(|| config.default_spec.clone())
        .unwrap_or_else(|| "best".to_string());
    let merge_output_format = args.merge_output_format.clone().or(config.merge_output_format.clone());
    let allow_multiple_audio = if args.no_allow_multiple_audio {
        false
    } else {
        args.allow_multiple_audio || config.allow_multiple_audio_streams
    };
    let allow_multiple_video = if args.no_allow_multiple_video {
        false
    } else {
        args.allow_multiple_video || config.allow_multiple_video_streams
    };

    let formats = formats_io::read_formats(&args.formats)?;
    let info_dict = match &args.info_dict {
        Some(path) => formats_io::read_info_dict(path)?,
        None => Default::default(),
    };

    let reachable_format_ids = args
        .check_formats
        .then(|| formats_io::reachable_format_ids(&formats));

    let host = Rc::new(StaticHost {
        merge_output_format: merge_output_format.clone(),
        allow_multiple_audio_streams: allow_multiple_audio,
        allow_multiple_video_streams: allow_multiple_video,
        reachable_format_ids,
    });

    let select = build_format_selector(&spec, host)?;
    let result = select(&formats, Rc::new(info_dict));
    formats_io::print_result(&result, verbose);

    Config {
        default_spec: Some(spec),
        merge_output_format,
        allow_multiple_audio_streams: allow_multiple_audio,
        allow_multiple_video_streams: allow_multiple_video,
    }
    .write()?;

    Ok(())
}
