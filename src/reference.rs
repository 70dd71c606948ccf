//! Unoptimized interpreter that walks source characters directly.
//!
//! Brackets are matched once up front into a jump table keyed by source
//! offset; everything else is interpreted one character at a time. Used as
//! the ground truth the compiled pipeline is checked against.

use crate::error::{CompileError, Result};
use crate::vm::TAPE_LEN;
use std::io::{self, Read, Write};

/// For every bracket offset, the offset of its partner. Non-bracket entries
/// hold `code.len()`.
pub fn build_jump_table(code: &[u8]) -> Result<Vec<usize>> {
    let mut jumps = vec![code.len(); code.len()];
    let mut stack = Vec::new();
    for (idx, &ch) in code.iter().enumerate() {
        match ch {
            b'[' => stack.push(idx),
            b']' => {
                let open = stack
                    .pop()
                    .ok_or(CompileError::UnmatchedClosingBracket(idx))?;
                jumps[open] = idx;
                jumps[idx] = open;
            }
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(CompileError::UnmatchedOpeningBracket(stack));
    }
    Ok(jumps)
}

/// Source text whose brackets are known to balance.
pub struct Source<'a> {
    code: &'a [u8],
    jumps: Vec<usize>,
}

impl<'a> Source<'a> {
    pub fn parse(code: &'a str) -> Result<Self> {
        let code = code.as_bytes();
        let jumps = build_jump_table(code)?;
        Ok(Source { code, jumps })
    }
}

pub struct Interpreter<R, W> {
    tape: Box<[u8]>,
    input: R,
    output: W,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Interpreter {
            tape: vec![0u8; TAPE_LEN].into_boxed_slice(),
            input,
            output,
        }
    }

    pub fn run(&mut self, src: &Source) -> io::Result<()> {
        let Source { code, jumps } = src;
        self.tape.fill(0);
        let mut pc = 0usize;
        let mut mp = 0usize;
        while pc < code.len() {
            match code[pc] {
                b'>' => mp = (mp + 1) % TAPE_LEN,
                b'<' => mp = if mp == 0 { TAPE_LEN - 1 } else { mp - 1 },
                b'+' => self.tape[mp] = self.tape[mp].wrapping_add(1),
                b'-' => self.tape[mp] = self.tape[mp].wrapping_sub(1),
                b'.' => self.output.write_all(&[self.tape[mp]])?,
                b',' => {
                    let mut buf = [0u8];
                    self.tape[mp] = match self.input.read_exact(&mut buf) {
                        Ok(()) => buf[0],
                        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
                        Err(e) => return Err(e),
                    };
                }
                b'[' if self.tape[mp] == 0 => pc = jumps[pc],
                b']' if self.tape[mp] != 0 => pc = jumps[pc],
                _ => {}
            }
            pc += 1;
        }
        self.output.flush()
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

/// Interprets `src` against an in-memory input and returns what it wrote.
pub fn interpret(src: &Source, input: &[u8]) -> io::Result<Vec<u8>> {
    let mut interp = Interpreter::new(input, Vec::new());
    interp.run(src)?;
    Ok(interp.into_inner().1)
}
