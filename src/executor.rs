//! The dispatch loop.
//!
//! An [`Executor`] owns the tape, both pointers, and its I/O handles, and
//! walks a borrowed [`Program`] one instruction at a time. Loop brackets are
//! resolved through [`crate::matcher`] only when a jump is actually taken.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use crate::matcher;
use crate::program::{Instruction, Program};
use crate::tape::{Tape, DEFAULT_TAPE_LEN};

/// Value stored by `,` at end of input under [`EofPolicy::Sentinel`].
pub const EOF_SENTINEL: i8 = -1;

/// Errors raised while a program runs.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// Writing program output or reading program input failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// A bracket whose partner could not be found when its jump was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmatchedBracket {
    pub ip: usize,
    pub kind: UnmatchedBracketKind,
}

impl fmt::Display for UnmatchedBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unmatched bracket {} at instruction {}", self.kind, self.ip)
    }
}

/// Execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continuing,
    /// The sentinel was reached.
    Terminated,
    /// A taken jump found no partner bracket. Execution halted there.
    SyntaxError(UnmatchedBracket),
}

/// What `,` stores when the input source is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EofPolicy {
    /// Store [`EOF_SENTINEL`] (-1, i.e. byte 255).
    #[default]
    Sentinel,
    /// Store 0.
    Zero,
    /// Leave the cell untouched.
    Unchanged,
}

impl EofPolicy {
    fn apply(self, tape: &mut Tape) {
        match self {
            EofPolicy::Sentinel => tape.set(EOF_SENTINEL),
            EofPolicy::Zero => tape.set(0),
            EofPolicy::Unchanged => {}
        }
    }
}

impl FromStr for EofPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Ok(EofPolicy::Sentinel),
            "zero" => Ok(EofPolicy::Zero),
            "unchanged" => Ok(EofPolicy::Unchanged),
            other => Err(format!("unknown end-of-input policy '{other}'")),
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EofPolicy::Sentinel => write!(f, "sentinel"),
            EofPolicy::Zero => write!(f, "zero"),
            EofPolicy::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Interprets one program against one tape.
///
/// The executor holds:
/// - the borrowed instruction sequence,
/// - a tape (30,000 zeroed cells by default) with its data pointer,
/// - the instruction pointer and the current [`Status`],
/// - an input source for `,` and an output sink for `.`.
pub struct Executor<'p, R, W> {
    program: &'p Program,
    tape: Tape,
    ip: usize,
    status: Status,
    input: R,
    output: W,
    eof: EofPolicy,
    debug: bool,
    steps: usize,
}

impl<'p, R: Read, W: Write> Executor<'p, R, W> {
    /// Create an executor with a default-sized tape and [`EofPolicy::Sentinel`].
    pub fn new(program: &'p Program, input: R, output: W) -> Self {
        Self {
            program,
            tape: Tape::new(DEFAULT_TAPE_LEN),
            ip: 0,
            status: Status::Continuing,
            input,
            output,
            eof: EofPolicy::default(),
            debug: false,
            steps: 0,
        }
    }

    /// Replace the tape with a zeroed one of `len` cells.
    pub fn with_tape_len(mut self, len: usize) -> Self {
        self.tape = Tape::new(len);
        self
    }

    /// Run on an already allocated tape, e.g. one built with [`Tape::try_new`].
    pub fn with_tape(mut self, tape: Tape) -> Self {
        self.tape = tape;
        self
    }

    pub fn with_eof(mut self, eof: EofPolicy) -> Self {
        self.eof = eof;
        self
    }

    /// Write a step-by-step table to the output sink instead of performing
    /// program I/O. The tape and pointers advance exactly as in a real run,
    /// but:
    /// - '.' does not write the byte; the action is logged instead
    /// - ',' does not read; end of input is simulated per the [`EofPolicy`]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the status leaves [`Status::Continuing`].
    pub fn run(&mut self) -> Result<Status, ExecError> {
        while self.status == Status::Continuing {
            self.step()?;
        }
        tracing::debug!(status = ?self.status, ip = self.ip, "execution finished");
        Ok(self.status)
    }

    /// Dispatch a single instruction.
    pub fn step(&mut self) -> Result<Status, ExecError> {
        if self.status != Status::Continuing {
            return Ok(self.status);
        }

        let ip = self.ip;
        let Some(instr) = self.program.get(ip) else {
            self.status = Status::Terminated;
            self.flush(ip)?;
            return Ok(self.status);
        };

        if instr.is_ignored() {
            self.ip += 1;
            return Ok(self.status);
        }

        let (ptr_before, cell_before) = (self.tape.pointer(), self.tape.get());
        let mut action: Option<String> = if self.debug { Some(String::new()) } else { None };

        match instr {
            Instruction::Left => {
                self.tape.move_left();
                if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", self.tape.pointer()); }
            }
            Instruction::Right => {
                self.tape.move_right();
                if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", self.tape.pointer()); }
            }
            Instruction::Increment => {
                self.tape.increment();
                if let Some(a) = action.as_mut() { *a = format!("Increment cell[{}] from {} to {}", ptr_before, cell_before, self.tape.get()); }
            }
            Instruction::Decrement => {
                self.tape.decrement();
                if let Some(a) = action.as_mut() { *a = format!("Decrement cell[{}] from {} to {}", ptr_before, cell_before, self.tape.get()); }
            }
            Instruction::Output => {
                if let Some(a) = action.as_mut() {
                    *a = format!("Output byte {} (suppressed in debug)", self.tape.byte());
                } else {
                    let byte = [self.tape.byte()];
                    self.output
                        .write_all(&byte)
                        .map_err(|source| ExecError::Io { ip, source })?;
                }
            }
            Instruction::Input => {
                if let Some(a) = action.as_mut() {
                    self.eof.apply(&mut self.tape);
                    *a = format!("Read byte -> simulated end of input ({}), cell is {}", self.eof, self.tape.get());
                } else {
                    // Prompts written before a blocking read must be visible.
                    self.flush(ip)?;
                    match self.read_byte(ip)? {
                        Some(b) => self.tape.set(b as i8),
                        None => self.eof.apply(&mut self.tape),
                    }
                }
            }
            Instruction::JumpForward => {
                if self.tape.get() == 0 {
                    match matcher::match_forward(self.program.instructions(), ip) {
                        Some(j) => {
                            tracing::trace!(from = ip, to = j, "jump forward");
                            if let Some(a) = action.as_mut() { *a = format!("Cell is 0; jump forward to matching ']' at IP {}", j); }
                            self.ip = j;
                        }
                        None => self.halt(ip, UnmatchedBracketKind::Open, action.as_mut()),
                    }
                } else if let Some(a) = action.as_mut() {
                    *a = "Enter loop (cell != 0)".to_string();
                }
            }
            Instruction::JumpBack => {
                if self.tape.get() != 0 {
                    match matcher::match_backward(self.program.instructions(), ip) {
                        Some(j) => {
                            tracing::trace!(from = ip, to = j, "jump back");
                            if let Some(a) = action.as_mut() { *a = format!("Cell != 0; jump back to matching '[' at IP {}", j); }
                            self.ip = j;
                        }
                        None => self.halt(ip, UnmatchedBracketKind::Close, action.as_mut()),
                    }
                } else if let Some(a) = action.as_mut() {
                    *a = "Exit loop (cell is 0)".to_string();
                }
            }
            Instruction::Stop => {
                self.status = Status::Terminated;
                if let Some(a) = action.as_mut() { *a = "End of program".to_string(); }
            }
            Instruction::Ignored(_) => {}
        }

        if let Some(action) = action {
            self.write_row(ip, ptr_before, cell_before, instr, &action)?;
        }

        // Taken jumps land on the partner bracket; this moves past it.
        self.ip += 1;

        if self.status != Status::Continuing {
            self.flush(ip)?;
        }
        Ok(self.status)
    }

    fn halt(&mut self, ip: usize, kind: UnmatchedBracketKind, action: Option<&mut String>) {
        let bracket = UnmatchedBracket { ip, kind };
        tracing::warn!(ip, %kind, "unmatched bracket; halting");
        if let Some(a) = action {
            *a = format!("No partner for {kind}; halting with syntax error");
        }
        self.status = Status::SyntaxError(bracket);
    }

    /// Read exactly one byte, or `None` at end of input.
    fn read_byte(&mut self, ip: usize) -> Result<Option<u8>, ExecError> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(ExecError::Io { ip, source }),
            }
        }
    }

    fn flush(&mut self, ip: usize) -> Result<(), ExecError> {
        self.output.flush().map_err(|source| ExecError::Io { ip, source })
    }

    fn write_row(
        &mut self,
        ip: usize,
        ptr_before: usize,
        cell_before: i8,
        instr: Instruction,
        action: &str,
    ) -> Result<(), ExecError> {
        let io_err = |source| ExecError::Io { ip, source };
        if self.steps == 0 {
            writeln!(self.output, "STEP | IP  | PTR | CELL | INSTR | ACTION").map_err(io_err)?;
            writeln!(self.output, "-----+-----+-----+------+-------+------------------------------------------------").map_err(io_err)?;
        }
        writeln!(
            self.output,
            "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
            self.steps, ip, ptr_before, cell_before, instr, action
        )
        .map_err(io_err)?;
        self.steps += 1;
        Ok(())
    }
}

/// Run `program` against the process's stdin and stdout with default settings.
pub fn execute(program: &Program) -> Result<Status, ExecError> {
    Executor::new(program, io::stdin(), io::stdout()).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    fn run_with(src: &str, input: &[u8], eof: EofPolicy) -> (Status, Vec<u8>, Tape) {
        let program = Program::from_bytes(src.as_bytes()).unwrap();
        let mut out = Vec::new();
        let (status, tape) = {
            let mut exec = Executor::new(&program, input, &mut out)
                .with_tape_len(16)
                .with_eof(eof);
            let status = exec.run().unwrap();
            (status, exec.tape().clone())
        };
        (status, out, tape)
    }

    fn run(src: &str) -> (Status, Vec<u8>, Tape) {
        run_with(src, b"", EofPolicy::default())
    }

    #[test]
    fn comment_only_program_produces_nothing() {
        let (status, out, tape) = run("just words and spaces\n\tno symbols");
        assert_eq!(status, Status::Terminated);
        assert!(out.is_empty());
        assert!(tape.cells().iter().all(|c| *c == 0));
    }

    #[test]
    fn increments_then_print_outputs_count_mod_256() {
        let (_, out, _) = run(&format!("{}.", "+".repeat(300)));
        assert_eq!(out, vec![(300 % 256) as u8]);
    }

    #[test]
    fn pointer_clamps_at_both_ends() {
        let (status, _, tape) = run("<<<<+");
        assert_eq!(status, Status::Terminated);
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.cells()[0], 1);

        let (_, _, tape) = run(&format!("{}+", ">".repeat(40)));
        assert_eq!(tape.pointer(), 15);
        assert_eq!(tape.cells()[15], 1);
    }

    #[test]
    fn hello_world() {
        let (status, out, _) = run(HELLO_WORLD);
        assert_eq!(status, Status::Terminated);
        assert_eq!(out, b"Hello World!\n");
    }

    #[test]
    fn cell_copy_loop() {
        let (status, _, tape) = run("+++++[->+>+<<]");
        assert_eq!(status, Status::Terminated);
        assert_eq!(tape.cells()[0], 0);
        assert_eq!(tape.cells()[1], 5);
        assert_eq!(tape.cells()[2], 5);
    }

    #[test]
    fn unmatched_open_entered_on_zero_is_a_syntax_error() {
        let (status, out, _) = run("[+");
        assert_eq!(
            status,
            Status::SyntaxError(UnmatchedBracket { ip: 0, kind: UnmatchedBracketKind::Open })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn unmatched_open_never_skipped_terminates_normally() {
        // The cell is nonzero at '[', so the loop body is entered and no scan happens.
        let (status, _, _) = run("+[");
        assert_eq!(status, Status::Terminated);
    }

    #[test]
    fn unmatched_close_taken_is_a_syntax_error() {
        let (status, _, _) = run("+.]");
        assert_eq!(
            status,
            Status::SyntaxError(UnmatchedBracket { ip: 2, kind: UnmatchedBracketKind::Close })
        );
    }

    #[test]
    fn unmatched_close_on_zero_falls_through() {
        let (status, _, _) = run("]");
        assert_eq!(status, Status::Terminated);
    }

    #[test]
    fn syntax_error_halts_before_later_output() {
        let (status, out, _) = run("+.-[.");
        assert!(matches!(status, Status::SyntaxError(_)));
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn skipped_loop_resumes_after_its_close() {
        // Cell 0 is zero, so the loop is skipped and the '+' after ']' runs.
        let (_, out, _) = run("[.]+.");
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn nested_loops_multiply() {
        // 3 * 4 = 12 into cell 2 via nested loops.
        let (status, _, tape) = run("+++[>++++[>+<-]<-]");
        assert_eq!(status, Status::Terminated);
        assert_eq!(tape.cells()[2], 12);
    }

    #[test]
    fn reads_input_byte_into_cell() {
        let (_, out, _) = run_with(",.,.", b"Hi", EofPolicy::Sentinel);
        assert_eq!(out, b"Hi");
    }

    #[test]
    fn eof_sentinel_stores_minus_one() {
        let (_, out, tape) = run_with(",.", b"", EofPolicy::Sentinel);
        assert_eq!(tape.cells()[0], EOF_SENTINEL);
        assert_eq!(out, vec![255]);
    }

    #[test]
    fn eof_zero_stores_zero() {
        let (_, _, tape) = run_with("+++,", b"", EofPolicy::Zero);
        assert_eq!(tape.cells()[0], 0);
    }

    #[test]
    fn eof_unchanged_leaves_cell() {
        let (_, _, tape) = run_with("+++,", b"", EofPolicy::Unchanged);
        assert_eq!(tape.cells()[0], 3);
    }

    #[test]
    fn step_after_termination_is_idempotent() {
        let program = Program::from_bytes(b"+").unwrap();
        let mut out = Vec::new();
        let mut exec = Executor::new(&program, &b""[..], &mut out);
        assert_eq!(exec.step().unwrap(), Status::Continuing);
        assert_eq!(exec.step().unwrap(), Status::Terminated);
        let ip = exec.ip();
        assert_eq!(exec.step().unwrap(), Status::Terminated);
        assert_eq!(exec.ip(), ip);
    }

    #[test]
    fn taken_jump_lands_past_the_partner() {
        let program = Program::from_bytes(b"[-]+").unwrap();
        let mut exec = Executor::new(&program, &b""[..], io::sink());
        exec.step().unwrap();
        // '[' at 0 jumps to ']' at 2, then moves past it.
        assert_eq!(exec.ip(), 3);
    }

    #[test]
    fn taken_back_jump_lands_past_the_open_bracket() {
        let program = Program::from_bytes(b"++[-]").unwrap();
        let mut exec = Executor::new(&program, &b""[..], io::sink());
        // '+', '+', '[' (cell is 2, falls through), '-' (cell is 1)
        for _ in 0..4 {
            exec.step().unwrap();
        }
        assert_eq!(exec.ip(), 4);
        // ']' at 4 sees a nonzero cell, jumps to '[' at 2, then moves past it.
        assert_eq!(exec.step().unwrap(), Status::Continuing);
        assert_eq!(exec.ip(), 3);
        assert_eq!(exec.tape().get(), 1);
    }

    #[test]
    fn write_failure_is_reported() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let program = Program::from_bytes(b"+.").unwrap();
        let mut exec = Executor::new(&program, &b""[..], Closed);
        let err = exec.run().unwrap_err();
        assert!(matches!(err, ExecError::Io { ip: 1, .. }));
    }

    #[test]
    fn debug_table_logs_instead_of_writing() {
        let program = Program::from_bytes(b"+.,").unwrap();
        let mut exec = Executor::new(&program, &b"unused"[..], Vec::new()).with_debug(true);
        assert_eq!(exec.run().unwrap(), Status::Terminated);
        let table = String::from_utf8(exec.into_output()).unwrap();
        assert!(table.starts_with("STEP | IP"));
        assert!(table.contains("Increment cell[0] from 0 to 1"));
        assert!(table.contains("suppressed in debug"));
        assert!(table.contains("simulated end of input (sentinel)"));
        assert!(table.contains("End of program"));
    }

    #[test]
    fn eof_policy_parses_from_config_strings() {
        assert_eq!("zero".parse::<EofPolicy>(), Ok(EofPolicy::Zero));
        assert_eq!(" Sentinel ".parse::<EofPolicy>(), Ok(EofPolicy::Sentinel));
        assert_eq!("unchanged".parse::<EofPolicy>(), Ok(EofPolicy::Unchanged));
        assert!("banana".parse::<EofPolicy>().is_err());
        // Only the names shown in --help are accepted.
        assert!("-1".parse::<EofPolicy>().is_err());
        assert!("0".parse::<EofPolicy>().is_err());
    }
}
