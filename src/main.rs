use std::error::Error;
use std::io::IsTerminal;

use clap::ArgMatches;
use simplelog::*;

mod args;
use args::*;

mod check;
mod client;
mod config;
mod runner;
mod utils;

use check::sc_check;
use config::sc_config;

// ------------------------------------------------------------------------

fn main() {
    let exit_code = main_();
    std::process::exit(exit_code);
}

fn main_() -> i32 {
    // Whether `src` is needed depends on stdin, so look at it only once.
    let stdin_is_tty = std::io::stdin().is_terminal();
    let args = parse_args(stdin_is_tty);

    // -- set up logger output --------------------------------------------

    let mut loglevel = match args.get_count("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if args.get_flag("quiet") {
        loglevel = LevelFilter::Off;
    }

    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Trace)
        .set_location_level(LevelFilter::Debug)
        .set_level_color(Level::Error, Some(Color::Magenta))
        .set_level_color(Level::Warn, Some(Color::Yellow))
        .set_level_color(Level::Info, Some(Color::Blue))
        .set_level_color(Level::Debug, None)
        .set_level_color(Level::Trace, None)
        .build();

    if let Err(e) = TermLogger::init(loglevel, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Fatal error, cannot set up logger: {}", e);
        return 2;
    }

    // --------------------------------------------------------------------

    match main__(&args, stdin_is_tty) {
        Ok(exitcode) => exitcode,
        Err(err) => {
            error!("{}", err.to_string());
            1
        }
    }
}

fn main__(args: &ArgMatches, stdin_is_tty: bool) -> Result<i32, Box<dyn Error>> {
    let mut retval: i32 = 0;
    match args.subcommand() {
        Some(("check", sub)) => retval = sc_check(sub, stdin_is_tty)?,
        Some(("config", sub)) => sc_config(sub)?,
        _ => (), // unreachable
    }
    Ok(retval)
}
