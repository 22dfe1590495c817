use clap::Args;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use crate::cli_util::{print_exec_error, print_syntax_error};
use crate::config;
use crate::executor::{EofPolicy, Executor, Status};
use crate::program::Program;
use crate::tape::{Tape, DEFAULT_TAPE_LEN};

/// Environment fallback for `--eof`.
pub const EOF_ENV: &str = "BFSCAN_EOF";
/// Environment fallback for `--cells`.
pub const CELLS_ENV: &str = "BFSCAN_CELLS";

/// Exit status after Ctrl-C.
const INTERRUPTED_EXIT: i32 = 130;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of performing I/O
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// What `,` stores at end of input (fallback BFSCAN_EOF, then config; default sentinel)
    #[arg(long = "eof", value_enum, value_name = "POLICY")]
    pub eof: Option<EofPolicy>,

    /// Number of tape cells (fallback BFSCAN_CELLS, then config; default 30000)
    #[arg(long = "cells", value_name = "N")]
    pub cells: Option<usize>,

    /// Program source file
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        debug,
        eof,
        cells,
        path,
        ..
    } = args;

    let Some(path) = path else {
        usage_and_exit(program, 2);
    };

    if cells == Some(0) {
        eprintln!("{program}: --cells must be at least 1");
        usage_and_exit(program, 2);
    }

    // Resolve settings: flags -> env -> config file -> defaults
    let settings = config::settings();
    let eof = eof
        .or_else(|| env::var(EOF_ENV).ok().and_then(|s| s.parse::<EofPolicy>().ok()))
        .or(settings.eof)
        .unwrap_or_default();
    let cells = cells
        .or_else(|| {
            env::var(CELLS_ENV)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
        })
        .or(settings.cells)
        .unwrap_or(DEFAULT_TAPE_LEN);

    let tape = match Tape::try_new(cells) {
        Ok(tape) => tape,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // The engine is never started when the source cannot be loaded.
    let code = match Program::open(&path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler so output written so far is not lost
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(INTERRUPTED_EXIT);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let debug_table = debug;
    tracing::debug!(path = %path.display(), %eof, cells, debug_table, "starting execution");

    let mut exec = Executor::new(&code, io::stdin(), io::stdout())
        .with_tape(tape)
        .with_eof(eof)
        .with_debug(debug);

    match exec.run() {
        Ok(Status::Terminated | Status::Continuing) => 0,
        Ok(Status::SyntaxError(bracket)) => {
            print_syntax_error(program, &code, &bracket);
            1
        }
        Err(err) => {
            print_exec_error(program, &code, &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [--eof <POLICY>] [--cells <N>] [--debug|-d] <PATH>

Options:
  --eof <POLICY>  What `,` stores at end of input: sentinel (-1), zero, unchanged
  --cells <N>     Number of tape cells (default 30000)
  --debug, -d     Print a step-by-step table of operations instead of executing I/O
  --help,  -h     Show this help

Environment:
  BFSCAN_EOF, BFSCAN_CELLS  Fallbacks for --eof and --cells
  BFSCAN_CONFIG             Config file (default: bfscan.toml in the XDG config home)
  BFSCAN_LOG                Log filter, e.g. "debug" or "bfscan=trace"

Notes:
- Characters outside of ><+-.,[] are ignored.
- Brackets are matched when a jump is taken; an unmatched bracket that is
  never jumped from is not reported.
- Pointer moves past either end of the tape are ignored.

Examples:
- Run a program:
    {0} ./hello.bf
- Feed a file to `,`:
    {0} ./rot13.bf < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
