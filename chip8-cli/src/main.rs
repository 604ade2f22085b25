//! Entrypoint for CLI
use std::{env, fs, process::ExitCode};

use chip8::{constants::DEFAULT_CLOCK_FREQUENCY, prelude::*, Hz, IMPL_VERSION};
use chip8_win::{AppError, Chip8App, InputMap};
use log::{debug, error, warn};

static USAGE: &str = r#"
usage: chip8 FILE [RATE]

arguments:
    FILE    Program image to run
    RATE    Instructions per second, defaults to 500

keys:
    1 2 3 4
    Q W E R     Chip8 keypad
    A S D F
    Z X C V
    Escape      Exit

examples:
    chip8 breakout.ch8
    chip8 breakout.ch8 700
"#;

/// FreeBSD EX_USAGE
const EXIT_USAGE: u8 = 64;

struct Args {
    filepath: String,
    clock_frequency: Option<Hz>,
}

fn main() -> ExitCode {
    if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
        eprintln!("failed to initialize logger: {err}");
    }

    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            print_usage();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(args) {
        Ok(Status::Quit) => {
            println!("\n{}", Status::Quit);
            ExitCode::SUCCESS
        }
        Ok(status) => {
            println!("\n{status}");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            println!("\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<Status, AppError> {
    let conf = Chip8Conf {
        clock_frequency: args.clock_frequency,
        rng_seed: None,
    };

    // The window comes up before the program is read, so display
    // failures are reported first.
    let mut event_loop = Chip8App::create_event_loop();
    let mut app = Chip8App::new(&event_loop, conf, InputMap::new()?)?;

    let bytecode = fs::read(&args.filepath).map_err(Chip8Error::from)?;
    app.load_bytecode(&bytecode)?;

    if log::max_level() >= log::Level::Debug {
        match Disassembler::new(&bytecode).listing() {
            Ok(listing) => debug!("{}:\n{listing}", args.filepath),
            Err(err) => warn!("failed to disassemble program: {err}"),
        }
    }

    Ok(app.run(&mut event_loop))
}

/// Positional arguments: the program path, then an optional clock rate.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let filepath = args.next()?;
    let clock_frequency = args.next().and_then(|rate| parse_rate(&rate));

    Some(Args {
        filepath,
        clock_frequency,
    })
}

/// Unusable rates fall back to the default, with a warning.
fn parse_rate(rate: &str) -> Option<Hz> {
    match rate.parse::<u64>() {
        Ok(0) => {
            warn!("clock rate must be positive, using {DEFAULT_CLOCK_FREQUENCY} Hz");
            None
        }
        Ok(n) => Some(Hz(n)),
        Err(err) => {
            warn!("invalid clock rate {rate:?} ({err}), using {DEFAULT_CLOCK_FREQUENCY} Hz");
            None
        }
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(list: &[&str]) -> Option<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        assert!(args(&[]).is_none());

        let a = args(&["pong.ch8"]).unwrap();
        assert_eq!(a.filepath, "pong.ch8");
        assert_eq!(a.clock_frequency, None);

        let a = args(&["pong.ch8", "700"]).unwrap();
        assert_eq!(a.clock_frequency, Some(Hz(700)));
    }

    #[test]
    fn test_bad_rate_uses_default() {
        assert_eq!(parse_rate("0"), None);
        assert_eq!(parse_rate("fast"), None);
        assert_eq!(parse_rate("-5"), None);
        assert_eq!(parse_rate("60"), Some(Hz(60)));
    }
}
