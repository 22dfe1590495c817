//! A small Brainfuck interpreter that matches loop brackets at runtime.
//!
//! This crate loads a program into a sentinel-terminated instruction sequence
//! and interprets it on a tape of signed byte cells (default 30,000) with a
//! single data pointer.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; cell arithmetic wraps.
//! - Clamped pointer: moving left from cell 0 or right past the last cell
//!   is a no-op.
//! - Input `,` reads a single byte; at end of input the cell receives -1 by
//!   default (see [`EofPolicy`]).
//! - Output `.` writes the byte at the current cell.
//! - Loop partners are found by scanning when a jump is taken. There is no
//!   jump table, so an unmatched bracket is only reported if its jump runs.
//! - Any byte outside `><+-.,[]` is ignored.
//!
//! Quick start:
//!
//! ```
//! use bfscan::{Executor, Program, Status};
//!
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
//! let program = Program::from_bytes(code.as_bytes()).unwrap();
//! let mut out = Vec::new();
//! let status = Executor::new(&program, std::io::empty(), &mut out).run().unwrap();
//! assert_eq!(status, Status::Terminated);
//! assert_eq!(out, b"Hello World!\n");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod executor;
pub mod logging;
pub mod matcher;
pub mod program;
pub mod tape;

pub use executor::{
    execute, EofPolicy, ExecError, Executor, Status, UnmatchedBracket, UnmatchedBracketKind,
};
pub use program::{Instruction, LoadError, Program};
pub use tape::{Tape, TapeAllocError, DEFAULT_TAPE_LEN};
