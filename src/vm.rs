use crate::bytecode::{Inst, OpCode};
use std::io::{self, Read, Write};
use tracing::debug;

pub const TAPE_LEN: usize = 30000;

/// Bytecode interpreter over a fixed circular tape of `TAPE_LEN` cells.
///
/// Every run starts from a zeroed tape with `pc` and `mp` at zero, so one
/// instance can execute any number of programs in sequence.
pub struct Vm<R, W> {
    tape: Box<[u8]>,
    pc: usize,
    mp: usize,
    input: R,
    output: W,
}

#[inline]
fn wrap_pointer(mp: usize, delta: i32) -> usize {
    (mp as i64 + delta as i64).rem_euclid(TAPE_LEN as i64) as usize
}

impl<R: Read, W: Write> Vm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Vm {
            tape: vec![0u8; TAPE_LEN].into_boxed_slice(),
            pc: 0,
            mp: 0,
            input,
            output,
        }
    }

    pub fn reset(&mut self) {
        self.tape.fill(0);
        self.pc = 0;
        self.mp = 0;
    }

    /// Executes `prog` until the program counter runs off its end. The
    /// output sink is flushed once when the run finishes.
    pub fn run(&mut self, prog: &[Inst]) -> io::Result<()> {
        self.execute::<false>(prog)
    }

    /// Like `run`, but flushes the output sink after every byte written.
    pub fn run_flushing(&mut self, prog: &[Inst]) -> io::Result<()> {
        self.execute::<true>(prog)
    }

    fn execute<const FLUSH: bool>(&mut self, prog: &[Inst]) -> io::Result<()> {
        self.reset();
        let mut steps: u64 = 0;
        while self.pc < prog.len() {
            let Inst { op, operand } = prog[self.pc];
            match op {
                OpCode::MovePointer => {
                    self.mp = wrap_pointer(self.mp, operand);
                }
                OpCode::AddValue => {
                    self.tape[self.mp] = self.tape[self.mp].wrapping_add(operand as u8);
                }
                OpCode::SetValue => {
                    self.tape[self.mp] = operand as u8;
                }
                OpCode::JumpIfZero => {
                    if self.tape[self.mp] == 0 {
                        self.pc = operand as usize;
                    }
                }
                OpCode::JumpIfNotZero => {
                    if self.tape[self.mp] != 0 {
                        self.pc = operand as usize;
                    }
                }
                OpCode::Output => {
                    self.output.write_all(&[self.tape[self.mp]])?;
                    if FLUSH {
                        self.output.flush()?;
                    }
                }
                OpCode::Input => {
                    let mut buf = [0u8];
                    self.tape[self.mp] = match self.input.read_exact(&mut buf) {
                        Ok(()) => buf[0],
                        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
                        Err(e) => return Err(e),
                    };
                }
            }
            self.pc += 1;
            steps += 1;
        }
        self.output.flush()?;
        debug!(steps, instructions = prog.len(), "run finished");
        Ok(())
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn pointer(&self) -> usize {
        self.mp
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

/// Runs `prog` on in-memory streams and returns the output, the final tape
/// and the final data pointer.
pub fn run_with_state(prog: &[Inst], input: &[u8]) -> io::Result<(Vec<u8>, Vec<u8>, usize)> {
    let mut vm = Vm::new(input, Vec::new());
    vm.run(prog)?;
    let tape = vm.tape().to_vec();
    let mp = vm.pointer();
    let (_, output) = vm.into_inner();
    Ok((output, tape, mp))
}
