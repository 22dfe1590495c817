//! Runtime bracket matching.
//!
//! Loop partners are found on demand by scanning the instruction sequence
//! and counting intervening brackets of the same direction. Nothing is
//! cached; each taken jump rescans, costing O(distance) to the partner.

use crate::program::Instruction;

/// Find the `]` closing the `[` at `open`.
///
/// Scans from `open + 1` toward the end. Returns `None` if the end is reached
/// first.
pub fn match_forward(code: &[Instruction], open: usize) -> Option<usize> {
    let mut depth: usize = 0;
    for (offset, instruction) in code.iter().enumerate().skip(open + 1) {
        match instruction {
            Instruction::JumpForward => depth += 1,
            Instruction::JumpBack if depth == 0 => return Some(offset),
            Instruction::JumpBack => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Find the `[` opening the `]` at `close`.
///
/// Scans from `close - 1` toward the start. Returns `None` if it runs off the
/// start first.
pub fn match_backward(code: &[Instruction], close: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut index = close.min(code.len());
    while index > 0 {
        index -= 1;
        match code[index] {
            Instruction::JumpBack => depth += 1,
            Instruction::JumpForward if depth == 0 => return Some(index),
            Instruction::JumpForward => depth -= 1,
            _ => {}
        }
    }
    None
}
