use clap::{App, Arg, SubCommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use num_enum::TryFromPrimitive;

mod command_keygen;
mod command_simulate;
mod demo;

use command_keygen::command_keygen;
use command_simulate::command_simulate;

#[derive(TryFromPrimitive, PartialEq, Copy, Clone, Debug)]
#[repr(u8)]
pub enum Verbosity {
    Warn = 0,
    Info = 1,
    Debug = 2,
}

impl Verbosity {
    fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Warn => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}

fn main() {
    let matches = App::new("Blindvote CLI")
        .version("0.1")
        .author("Patrick Hayes <patrick.d.hayes@gmail.com>")
        .about("Simulates an election with blindly signed ballots")
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            SubCommand::with_name("simulate")
                .about("Run the demo election scenarios")
                .arg(
                    Arg::with_name("config")
                        .long("config")
                        .takes_value(true)
                        .value_name("FILE")
                        .help("Protocol configuration in JSON. Defaults to BLINDVOTE_* environment variables"),
                )
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .takes_value(true)
                        .value_name("N")
                        .help("Seed the commission's batch selection for a reproducible run"),
                ),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Generate a commission key pair and print its public key")
                .arg(
                    Arg::with_name("key-size")
                        .long("key-size")
                        .takes_value(true)
                        .value_name("BITS")
                        .help("RSA modulus size in bits"),
                ),
        )
        .get_matches();

    let occurrences = matches.occurrences_of("v")
        + matches
            .subcommand()
            .1
            .map_or(0, |matches| matches.occurrences_of("v"));
    let occurrences = std::cmp::min(occurrences, 2) as u8;
    let verbosity = Verbosity::try_from(occurrences).unwrap_or(Verbosity::Warn);

    if let Err(e) = init_logging(verbosity.level_filter()) {
        eprintln!("blindvote: unable to initialise logging: {}", e);
        std::process::exit(1);
    }

    // Subcommands
    match matches.subcommand() {
        ("simulate", Some(matches)) => command_simulate(matches),
        ("keygen", Some(matches)) => command_keygen(matches),
        _ => {
            eprintln!("blindvote: a subcommand is required, see --help");
            std::process::exit(1);
        }
    }
}

fn init_logging(level: LevelFilter) -> Result<(), String> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l})} {t} - {m}{n}")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| e.to_string())?;

    log4rs::init_config(config).map_err(|e| e.to_string())?;
    Ok(())
}

/// Exit with a message prefixed by the subcommand name
pub fn fail(command: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("blindvote {}: {}", command, message);
    std::process::exit(1);
}
