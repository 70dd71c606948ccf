use crate::bytecode::{Inst, OpCode};
use crate::error::{CompileError, Result};
use tracing::debug;

/// Selects which optimization passes `compile_with` runs. Jump resolution
/// always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub collapse: bool,
    pub reduce_loops: bool,
}

impl Options {
    pub const fn none() -> Self {
        Options {
            collapse: false,
            reduce_loops: false,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            collapse: true,
            reduce_loops: true,
        }
    }
}

/// Maps every command character to one instruction; everything else is a
/// comment. Jump operands are left as placeholders.
pub fn lower<I: IntoIterator<Item = char>>(code: I) -> Vec<Inst> {
    code.into_iter()
        .filter_map(|ch| match ch {
            '>' => Some(Inst::move_pointer(1)),
            '<' => Some(Inst::move_pointer(-1)),
            '+' => Some(Inst::add_value(1)),
            '-' => Some(Inst::add_value(-1)),
            '.' => Some(Inst::output()),
            ',' => Some(Inst::input()),
            '[' => Some(Inst::jump_if_zero(0)),
            ']' => Some(Inst::jump_if_not_zero(0)),
            _ => None,
        })
        .collect()
}

/// Merges each run of consecutive `MovePointer` or `AddValue` instructions
/// into one instruction carrying the summed operand.
///
/// Zero-sum runs are kept as a single zero-operand instruction. A run is
/// split where its sum would leave the `i32` range.
pub fn collapse(prog: Vec<Inst>) -> Vec<Inst> {
    let mut iter = prog.into_iter().peekable();
    let mut collapsed = Vec::with_capacity(iter.size_hint().0);
    while let Some(mut inst) = iter.next() {
        if matches!(inst.op, OpCode::MovePointer | OpCode::AddValue) {
            while let Some(next) = iter.peek() {
                if next.op != inst.op {
                    break;
                }
                match inst.operand.checked_add(next.operand) {
                    Some(sum) => inst.operand = sum,
                    None => break,
                }
                iter.next();
            }
        }
        collapsed.push(inst);
    }
    collapsed
}

// Loop depth with both brackets counted at the depth of the body they enclose.
fn depths(prog: &[Inst]) -> Vec<isize> {
    let mut depth: isize = 0;
    prog.iter()
        .map(|inst| match inst.op {
            OpCode::JumpIfZero => {
                depth += 1;
                depth
            }
            OpCode::JumpIfNotZero => {
                depth -= 1;
                depth + 1
            }
            _ => depth,
        })
        .collect()
}

/// Splits a program into maximal runs of equal loop depth. Every `[` opens a
/// fresh segment so sibling loops never share one.
pub fn segments(prog: &[Inst]) -> Vec<&[Inst]> {
    let depths = depths(prog);
    let mut segments = Vec::new();
    let mut start = 0;
    for idx in 1..prog.len() {
        if depths[idx] != depths[idx - 1] || prog[idx].op == OpCode::JumpIfZero {
            segments.push(&prog[start..idx]);
            start = idx;
        }
    }
    if start < prog.len() {
        segments.push(&prog[start..]);
    }
    segments
}

fn is_clear_loop(segment: &[Inst]) -> bool {
    matches!(
        segment,
        [
            Inst { op: OpCode::JumpIfZero, .. },
            Inst { op: OpCode::AddValue, operand: -1 },
            Inst { op: OpCode::JumpIfNotZero, .. },
        ]
    )
}

/// Rewrites every `[-]` loop into a single `SetValue(0)`. All other segments
/// are copied through untouched.
pub fn reduce_loops(prog: Vec<Inst>) -> Vec<Inst> {
    let mut reduced = Vec::with_capacity(prog.len());
    for segment in segments(&prog) {
        if is_clear_loop(segment) {
            reduced.push(Inst::set_value(0));
        } else {
            reduced.extend_from_slice(segment);
        }
    }
    reduced
}

/// Pairs brackets and stores in each one the absolute index of its partner.
pub fn resolve_jumps(prog: &mut [Inst]) -> Result<()> {
    let mut stack = Vec::new();
    for idx in 0..prog.len() {
        match prog[idx].op {
            OpCode::JumpIfZero => {
                stack.push(idx);
            }
            OpCode::JumpIfNotZero => {
                let open = stack
                    .pop()
                    .ok_or(CompileError::UnmatchedClosingBracket(idx))?;
                prog[open].operand = idx as i32;
                prog[idx].operand = open as i32;
            }
            _ => {}
        }
    }
    if stack.is_empty() {
        Ok(())
    } else {
        Err(CompileError::UnmatchedOpeningBracket(stack))
    }
}

pub fn compile(code: &str) -> Result<Vec<Inst>> {
    compile_with(code, Options::default())
}

pub fn compile_with(code: &str, options: Options) -> Result<Vec<Inst>> {
    let mut prog = lower(code.chars());
    debug!(stage = "lower", instructions = prog.len());
    if options.collapse {
        prog = collapse(prog);
        debug!(stage = "collapse", instructions = prog.len());
    }
    if options.reduce_loops {
        prog = reduce_loops(prog);
        debug!(stage = "reduce_loops", instructions = prog.len());
    }
    resolve_jumps(&mut prog)?;
    Ok(prog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_drops_comments() {
        let prog = lower(">a+b>?!".chars());
        assert_eq!(
            prog,
            vec![Inst::move_pointer(1), Inst::add_value(1), Inst::move_pointer(1)]
        );
    }

    #[test]
    fn lower_counts_only_commands() {
        let code = "hello, world. [this] is <all> + - comments";
        let commands = code.chars().filter(|c| "><+-.,[]".contains(*c)).count();
        assert_eq!(lower(code.chars()).len(), commands);
    }

    #[test]
    fn lower_leaves_jump_placeholders() {
        let prog = lower("[]".chars());
        assert_eq!(prog, vec![Inst::jump_if_zero(0), Inst::jump_if_not_zero(0)]);
    }

    #[test]
    fn collapse_sums_runs() {
        let prog = collapse(lower(">>><+++--.".chars()));
        assert_eq!(
            prog,
            vec![Inst::move_pointer(2), Inst::add_value(1), Inst::output()]
        );
    }

    #[test]
    fn collapse_keeps_zero_sum_runs() {
        assert_eq!(collapse(lower("+-".chars())), vec![Inst::add_value(0)]);
    }

    #[test]
    fn collapse_does_not_fuse_across_opcodes() {
        let prog = lower(">+<-.".chars());
        assert_eq!(collapse(prog.clone()), prog);
    }

    #[test]
    fn collapse_leaves_other_runs_alone() {
        let prog = lower("..,,[[]]".chars());
        assert_eq!(collapse(prog.clone()), prog);
    }

    #[test]
    fn collapse_is_idempotent() {
        let once = collapse(lower("++>>--<<[->+<]..,,+-><".chars()));
        assert_eq!(collapse(once.clone()), once);
    }

    #[test]
    fn collapse_splits_on_overflow() {
        let prog = vec![Inst::add_value(i32::MAX), Inst::add_value(1), Inst::add_value(1)];
        let once = collapse(prog);
        assert_eq!(once, vec![Inst::add_value(i32::MAX), Inst::add_value(2)]);
        assert_eq!(collapse(once.clone()), once);
    }

    #[test]
    fn segments_split_sibling_loops() {
        let prog = lower("+[-][-].".chars());
        let lens: Vec<usize> = segments(&prog).iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![1, 3, 3, 1]);
    }

    #[test]
    fn segments_split_nested_loops() {
        let prog = lower("[>[-]<]".chars());
        let lens: Vec<usize> = segments(&prog).iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![2, 3, 2]);
    }

    #[test]
    fn reduce_replaces_clear_loop() {
        assert_eq!(reduce_loops(lower("[-]".chars())), vec![Inst::set_value(0)]);
    }

    #[test]
    fn reduce_handles_nested_and_sibling_clears() {
        let prog = reduce_loops(lower("[>[-]<][-][-]".chars()));
        assert_eq!(
            prog,
            vec![
                Inst::jump_if_zero(0),
                Inst::move_pointer(1),
                Inst::set_value(0),
                Inst::move_pointer(-1),
                Inst::jump_if_not_zero(0),
                Inst::set_value(0),
                Inst::set_value(0),
            ]
        );
    }

    #[test]
    fn reduce_ignores_other_loops() {
        for code in ["[+]", "[--]", "[->+<]", "[]", "[-.]"] {
            let prog = collapse(lower(code.chars()));
            assert_eq!(reduce_loops(prog.clone()), prog, "{code}");
        }
    }

    #[test]
    fn reduce_tolerates_unbalanced_input() {
        let prog = reduce_loops(lower("][-]".chars()));
        assert_eq!(prog, vec![Inst::jump_if_not_zero(0), Inst::set_value(0)]);
    }

    #[test]
    fn resolve_pairs_brackets() {
        let prog = compile("[>+<-]").unwrap();
        assert_eq!(prog.len(), 6);
        assert_eq!(prog[0], Inst::jump_if_zero(5));
        assert_eq!(prog[5], Inst::jump_if_not_zero(0));
    }

    #[test]
    fn resolve_reports_unmatched_close() {
        assert_eq!(compile("+]"), Err(CompileError::UnmatchedClosingBracket(1)));
    }

    #[test]
    fn resolve_reports_every_unmatched_open() {
        assert_eq!(
            compile_with("[[+[]", Options::none()),
            Err(CompileError::UnmatchedOpeningBracket(vec![0, 1]))
        );
    }

    #[test]
    fn compile_clear_loop_is_single_set() {
        assert_eq!(compile("[-]").unwrap(), vec![Inst::set_value(0)]);
    }

    #[test]
    fn compile_keeps_alternating_ops() {
        assert_eq!(
            compile(">+<-.").unwrap(),
            vec![
                Inst::move_pointer(1),
                Inst::add_value(1),
                Inst::move_pointer(-1),
                Inst::add_value(-1),
                Inst::output(),
            ]
        );
    }

    #[test]
    fn compile_without_passes_keeps_clear_loop() {
        let prog = compile_with("[-]", Options::none()).unwrap();
        assert_eq!(
            prog,
            vec![Inst::jump_if_zero(2), Inst::add_value(-1), Inst::jump_if_not_zero(0)]
        );
    }
}
