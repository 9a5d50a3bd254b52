//! lindafs - Filesystem-Backed Tuple Space CLI
//!
//! One subcommand per engine operation. Payloads travel on the standard
//! streams: `out` reads its payload from stdin, `rd`/`inp` write theirs to
//! stdout. Logging goes to stderr so payload bytes stay clean.

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use bytes::Bytes;
use lindafs::{OutOptions, ReadMode, SpaceConfig, SpaceError, TupleSpace};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parsed command line.
struct Cli {
    /// Tuple directory override (else `LINDA_DIR` / `/tmp/linda`)
    dir: Option<PathBuf>,
    /// Enable debug logging on stderr
    verbose: bool,
    /// The operation to run
    command: Command,
}

/// One engine operation with its arguments.
enum Command {
    Out { name: String, options: OutOptions },
    Rd { pattern: String, mode: ReadMode },
    Inp { pattern: String, mode: ReadMode },
    Ls { pattern: String },
    Clear,
}

impl Cli {
    /// Parses command-line arguments, exiting with usage help on errors.
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let mut dir = None;
        let mut verbose = false;
        let mut positional: Vec<String> = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-d" | "--dir" => {
                    if i + 1 < args.len() {
                        dir = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    } else {
                        eprintln!("Error: --dir requires a value");
                        process::exit(1);
                    }
                }
                "-v" | "--verbose" => {
                    verbose = true;
                    i += 1;
                }
                "--help" => {
                    print_help();
                    process::exit(0);
                }
                "-V" | "--version" => {
                    println!("lindafs {}", lindafs::VERSION);
                    process::exit(0);
                }
                // Negative numbers fall through as positionals so the
                // option parser can report "negative TTL" precisely.
                other if other.starts_with('-') && other.parse::<i64>().is_err() => {
                    eprintln!("Unknown argument: {other}");
                    print_help();
                    process::exit(1);
                }
                other => {
                    positional.push(other.to_string());
                    i += 1;
                }
            }
        }

        let command = Self::parse_command(&positional);
        Self {
            dir,
            verbose,
            command,
        }
    }

    fn parse_command(positional: &[String]) -> Command {
        let Some(op) = positional.first() else {
            print_help();
            process::exit(1);
        };

        match op.as_str() {
            "out" => {
                let Some(name) = positional.get(1) else {
                    eprintln!("Error: out requires a tuple name");
                    process::exit(1);
                };
                let words: Vec<&str> = positional[2..].iter().map(String::as_str).collect();
                let options = OutOptions::parse(&words).unwrap_or_else(|err| {
                    eprintln!("Error: {err}");
                    process::exit(1);
                });
                Command::Out {
                    name: name.clone(),
                    options,
                }
            }
            "rd" | "inp" => {
                let Some(pattern) = positional.get(1) else {
                    eprintln!("Error: {op} requires a pattern");
                    process::exit(1);
                };
                if positional.len() > 3 {
                    eprintln!("Error: too many arguments for {op}");
                    process::exit(1);
                }
                let mode = match positional.get(2) {
                    Some(word) => ReadMode::parse(word).unwrap_or_else(|err| {
                        eprintln!("Error: {err}");
                        process::exit(1);
                    }),
                    None => ReadMode::Wait,
                };
                if op == "rd" {
                    Command::Rd {
                        pattern: pattern.clone(),
                        mode,
                    }
                } else {
                    Command::Inp {
                        pattern: pattern.clone(),
                        mode,
                    }
                }
            }
            "ls" => {
                if positional.len() > 2 {
                    eprintln!("Error: too many arguments for ls");
                    process::exit(1);
                }
                Command::Ls {
                    pattern: positional.get(1).cloned().unwrap_or_default(),
                }
            }
            "clear" => {
                if positional.len() > 1 {
                    eprintln!("Error: clear takes no arguments");
                    process::exit(1);
                }
                Command::Clear
            }
            other => {
                eprintln!("Unknown command: {other}");
                print_help();
                process::exit(1);
            }
        }
    }
}

fn print_help() {
    println!(
        r#"
lindafs {} - Linda-style tuple space on a shared directory

USAGE:
    lindafs [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    out <NAME> [TTL] [seq|rep]    Publish a tuple; payload read from stdin
    rd <PATTERN> [once|SECS]      Peek a matching tuple; payload to stdout
    inp <PATTERN> [once|SECS]     Consume a matching tuple; payload to stdout
    ls [PATTERN]                  List live tuples as "<count> <name>" lines
    clear                         Remove every file in the space

OPTIONS:
    -d, --dir <PATH>     Tuple directory (default: $LINDA_DIR or /tmp/linda)
    -v, --verbose        Enable debug logging on stderr
    -V, --version        Print version information
        --help           Print this help message

EXIT CODES:
    0 success    2 no match (once)    3 timeout    1 other errors
"#,
        lindafs::VERSION
    );
}

fn main() {
    let cli = Cli::from_args();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();

    let config = match &cli.dir {
        Some(dir) => SpaceConfig::at(dir),
        None => SpaceConfig::default(),
    };

    if let Err(err) = run(cli.command, config) {
        eprintln!("lindafs: {err:#}");
        let code = err
            .downcast_ref::<SpaceError>()
            .map(exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

fn run(command: Command, config: SpaceConfig) -> anyhow::Result<()> {
    let space = TupleSpace::open(config)?;

    match command {
        Command::Out { name, options } => {
            let mut payload = Vec::new();
            io::stdin()
                .read_to_end(&mut payload)
                .context("reading payload from stdin")?;
            space.out_with(&name, Bytes::from(payload), options)?;
        }
        Command::Rd { pattern, mode } => {
            let payload = space.rd(&pattern, mode)?;
            write_payload(&payload)?;
        }
        Command::Inp { pattern, mode } => {
            let payload = space.inp(&pattern, mode)?;
            write_payload(&payload)?;
        }
        Command::Ls { pattern } => {
            for entry in space.ls(&pattern)? {
                println!("{entry}");
            }
        }
        Command::Clear => space.clear()?,
    }
    Ok(())
}

/// Writes raw payload bytes to stdout, adding a trailing newline only when
/// talking to a terminal (pipes receive the exact payload).
fn write_payload(payload: &[u8]) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(payload).context("writing payload")?;
    if io::stdout().is_terminal() && !payload.ends_with(b"\n") {
        stdout.write_all(b"\n").context("writing payload")?;
    }
    stdout.flush().context("flushing payload")?;
    Ok(())
}

/// Maps engine errors to the documented exit codes.
fn exit_code(err: &SpaceError) -> i32 {
    match err {
        SpaceError::NoMatch { .. } => 2,
        SpaceError::Timeout { .. } => 3,
        _ => 1,
    }
}
