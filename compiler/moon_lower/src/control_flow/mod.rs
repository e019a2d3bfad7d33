//! Control-Flow Desugaring.
//!
//! `break`, `continue` and `return` lower differently depending on what
//! encloses them. Lowering keeps a stack of [`Frame`]s from the enclosing
//! function boundary inward and resolves each jump against the innermost
//! frame that decides it:
//!
//! | frame | `break` | `continue` | `return v` |
//! |-------|---------|------------|------------|
//! | native loop | `break` | incrementors + `continue` | passes through |
//! | switch block | `break` | flag + `break` | passes through |
//! | generator loop | jump to exit region | jump to loop region | passes through |
//! | try closure | `return CS.TRY_BREAK` | `return CS.TRY_CONTINUE` | `return CS.TRY_RETURN, v` |
//!
//! After a `CS.try` call the exits that occurred are replayed by lowering the
//! same jump again with the try frame popped, which resolves it against the
//! next enclosing frame (possibly another try).

pub(crate) mod generators;
mod try_catch;
pub(crate) mod using;

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::luau::{Expr, Stmt};
use moon_ir::{Name, Span};

use crate::lower::Lowerer;

/// Exits observed inside one try closure.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub(crate) struct TryExits {
    pub ret: bool,
    /// Some `return` carried a value.
    pub ret_value: bool,
    pub brk: bool,
    pub cont: bool,
}

impl TryExits {
    pub(crate) fn any(self) -> bool {
        self.ret || self.brk || self.cont
    }
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) enum Frame {
    /// Function boundary. Jumps never cross it.
    Function { generator: bool },
    /// Native `while`/`for`/`repeat`; `continue` first replays the
    /// incrementors of a C-style `for`.
    Loop { continue_prelude: Vec<Stmt> },
    /// Loop spread over generator regions.
    RegionLoop { exit: Name, next: Name },
    /// `repeat .. until true` of a switch statement. The continue flag is
    /// allocated on first use.
    Switch { continue_flag: Option<Name> },
    /// Body, catch or finally closure of a `CS.try` call.
    Try(TryExits),
}

impl Frame {
    pub(crate) fn native_loop() -> Self {
        Frame::Loop {
            continue_prelude: Vec::new(),
        }
    }
}

/// `return region()`: continue executing in another generator region.
pub(crate) fn jump(region: Name) -> Stmt {
    Stmt::ret(Expr::Ident(region).call(Vec::new()))
}

impl Lowerer<'_> {
    pub(crate) fn lower_break(&mut self, span: Span) -> LowerResult<Vec<Stmt>> {
        let try_break = self.cs(self.names.try_break);
        for frame in self.flow.iter_mut().rev() {
            match frame {
                Frame::Loop { .. } | Frame::Switch { .. } => return Ok(vec![Stmt::Break]),
                Frame::RegionLoop { exit, .. } => return Ok(vec![jump(*exit)]),
                Frame::Try(exits) => {
                    exits.brk = true;
                    return Ok(vec![Stmt::ret(try_break)]);
                }
                Frame::Function { .. } => break,
            }
        }
        Err(LowerError::invalid_tree("`break` outside of a loop or switch", span))
    }

    pub(crate) fn lower_continue(&mut self, span: Span) -> LowerResult<Vec<Stmt>> {
        let try_continue = self.cs(self.names.try_continue);
        for index in (0..self.flow.len()).rev() {
            match &mut self.flow[index] {
                Frame::Loop { continue_prelude } => {
                    let mut out = continue_prelude.clone();
                    out.push(Stmt::Continue);
                    return Ok(out);
                }
                Frame::RegionLoop { next, .. } => return Ok(vec![jump(*next)]),
                Frame::Try(exits) => {
                    exits.cont = true;
                    return Ok(vec![Stmt::ret(try_continue)]);
                }
                Frame::Switch { continue_flag } => {
                    let flag = match *continue_flag {
                        Some(flag) => flag,
                        None => {
                            let flag = self.fresh("continue");
                            if let Frame::Switch { continue_flag } = &mut self.flow[index] {
                                *continue_flag = Some(flag);
                            }
                            flag
                        }
                    };
                    return Ok(vec![
                        Stmt::assign(Expr::Ident(flag), Expr::Bool(true)),
                        Stmt::Break,
                    ]);
                }
                Frame::Function { .. } => break,
            }
        }
        Err(LowerError::invalid_tree("`continue` outside of a loop", span))
    }

    pub(crate) fn lower_return(&mut self, value: Option<Expr>) -> Stmt {
        let try_return = self.cs(self.names.try_return);
        for frame in self.flow.iter_mut().rev() {
            match frame {
                Frame::Try(exits) => {
                    exits.ret = true;
                    exits.ret_value |= value.is_some();
                    let mut values = vec![try_return];
                    values.extend(value);
                    return Stmt::Return(values);
                }
                Frame::Function { generator: true } => return Stmt::ret(Expr::Nil),
                Frame::Function { generator: false } => break,
                Frame::Loop { .. } | Frame::RegionLoop { .. } | Frame::Switch { .. } => {}
            }
        }
        Stmt::Return(value.into_iter().collect())
    }
}

#[cfg(test)]
mod tests;
