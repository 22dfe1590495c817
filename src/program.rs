//! Program loading.
//!
//! A [`Program`] is the instruction sequence the executor walks over. Every
//! byte of the source becomes exactly one [`Instruction`]; bytes outside the
//! `><+-.,[]` alphabet are kept as [`Instruction::Ignored`] and skipped at
//! dispatch time. The loader always appends a single [`Instruction::Stop`]
//! sentinel, so a loaded program is never empty.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Initial capacity of the instruction buffer. Grows by doubling.
const MIN_CAPACITY: usize = 16;

/// Size of the chunk handed to each `read` call while loading.
const READ_CHUNK: usize = 4096;

/// Errors that can occur while loading a program.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source file could not be opened.
    #[error("Could not open file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the source stream failed part way through.
    #[error("Failed to read program: {source}")]
    Read {
        #[source]
        source: io::Error,
    },

    /// The instruction buffer could not grow.
    #[error("Out of memory while loading program ({requested} instructions requested)")]
    OutOfMemory { requested: usize },
}

/// One entry of the instruction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `<`
    Left,
    /// `>`
    Right,
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    JumpForward,
    /// `]`
    JumpBack,
    /// Any byte outside the instruction alphabet. Kept so that instruction
    /// indices line up with source byte offsets.
    Ignored(u8),
    /// End-of-program sentinel appended by the loader.
    Stop,
}

impl Instruction {
    /// Decode a single source byte. Never produces [`Instruction::Stop`].
    pub fn decode(byte: u8) -> Self {
        match byte {
            b'<' => Instruction::Left,
            b'>' => Instruction::Right,
            b'+' => Instruction::Increment,
            b'-' => Instruction::Decrement,
            b'.' => Instruction::Output,
            b',' => Instruction::Input,
            b'[' => Instruction::JumpForward,
            b']' => Instruction::JumpBack,
            other => Instruction::Ignored(other),
        }
    }

    /// The source byte this instruction was decoded from, or `None` for the sentinel.
    pub fn byte(self) -> Option<u8> {
        match self {
            Instruction::Left => Some(b'<'),
            Instruction::Right => Some(b'>'),
            Instruction::Increment => Some(b'+'),
            Instruction::Decrement => Some(b'-'),
            Instruction::Output => Some(b'.'),
            Instruction::Input => Some(b','),
            Instruction::JumpForward => Some(b'['),
            Instruction::JumpBack => Some(b']'),
            Instruction::Ignored(b) => Some(b),
            Instruction::Stop => None,
        }
    }

    pub fn is_ignored(self) -> bool {
        matches!(self, Instruction::Ignored(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.byte() {
            Some(b) => write!(f, "{}", b as char),
            None => write!(f, "$"),
        }
    }
}

/// An immutable, sentinel-terminated instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Load a program from a byte stream, reading until end of stream.
    ///
    /// Every byte read is kept; one [`Instruction::Stop`] is appended after
    /// the last one, even when the stream is empty.
    pub fn load<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut instructions: Vec<Instruction> = Vec::new();
        reserve(&mut instructions, MIN_CAPACITY)?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoadError::Read { source: e }),
            };
            for &byte in &chunk[..n] {
                push(&mut instructions, Instruction::decode(byte))?;
            }
        }
        push(&mut instructions, Instruction::Stop)?;

        tracing::debug!(
            bytes = instructions.len() - 1,
            capacity = instructions.capacity(),
            "program loaded"
        );
        Ok(Self { instructions })
    }

    /// Open `path` and load its contents.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(io::BufReader::new(file))
    }

    /// Load a program held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::load(bytes)
    }

    /// Number of instructions, sentinel included. Always at least 1.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// A loaded program always holds its sentinel.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, ip: usize) -> Option<Instruction> {
        self.instructions.get(ip).copied()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Source bytes covering `range` (clamped to the program), sentinel excluded.
    pub fn source_bytes(&self, range: Range<usize>) -> Vec<u8> {
        let end = range.end.min(self.instructions.len());
        let start = range.start.min(end);
        self.instructions[start..end]
            .iter()
            .filter_map(|i| i.byte())
            .collect()
    }
}

/// Append one instruction, doubling the buffer when it is full.
fn push(instructions: &mut Vec<Instruction>, instruction: Instruction) -> Result<(), LoadError> {
    if instructions.len() == instructions.capacity() {
        let additional = instructions.capacity().max(MIN_CAPACITY);
        reserve(instructions, additional)?;
    }
    instructions.push(instruction);
    Ok(())
}

fn reserve(instructions: &mut Vec<Instruction>, additional: usize) -> Result<(), LoadError> {
    instructions
        .try_reserve_exact(additional)
        .map_err(|_| LoadError::OutOfMemory {
            requested: instructions.len().saturating_add(additional),
        })
}
