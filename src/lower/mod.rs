//! AST-to-LLIR lowering engine.
//!
//! A recursive traversal over the annotated AST that emits instructions
//! into the current basic block of the current function and yields a value
//! (or nothing, for zero-sized results). The engine owns the module under
//! construction plus the "current" slots: function, block context, and the
//! break/continue target stacks. All mutation is sequential; concurrent
//! lowering requires separate contexts.

mod aggregate;
mod asm;
mod cast;
mod control;
mod expr;
mod place;
mod prologue;

use crate::ast::{Analysis, AstModule, BlockCtxId, FnId, SlotId, VarId};
use crate::diag::SrcPos;
use crate::llir::builder::FuncBuilder;
use crate::llir::debug_info::{DebugLoc, DebugScopeId, DebugVarId};
use crate::llir::verify::{verify_module, VerifyError};
use crate::llir::{BlockId, FuncId, LlirModule, LlirTypeId, LlirTypes, Value};
use crate::options::{BuildKind, BuildOptions};
use crate::types::{TypeEntry, TypeId, TypeTable};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct VarState {
    pub value: Option<Value>,
    /// True when `value` is the variable's storage address rather than the
    /// value itself (locals and aggregates vs. scalar parameters).
    pub is_ptr: bool,
    pub di_var: Option<DebugVarId>,
}

pub struct LowerCtx<'a> {
    pub(crate) opts: &'a BuildOptions,
    pub(crate) types: &'a mut TypeTable,
    pub(crate) analysis: &'a Analysis,
    pub(crate) module: LlirModule,

    pub(crate) fb: Option<FuncBuilder>,
    pub(crate) cur_fn: Option<FnId>,
    pub(crate) cur_block_ctx: Option<BlockCtxId>,
    /// `None` entries come from forever-loops the analyzer proved free of
    /// breaks.
    pub(crate) break_blocks: Vec<Option<BlockId>>,
    pub(crate) continue_blocks: Vec<BlockId>,

    pub(crate) fn_values: Vec<FuncId>,
    pub(crate) var_states: Vec<VarState>,
    pub(crate) slot_ptrs: Vec<Option<Value>>,
    pub(crate) label_blocks: Vec<Option<BlockId>>,
    pub(crate) block_scopes: Vec<Option<DebugScopeId>>,
}

/// Lower a fully analyzed program into an LLIR module. Globals are emitted
/// first, then every function prototype, then function bodies. The result
/// is verified in debug builds; a verification failure is fatal.
pub fn lower_module(
    module: LlirModule,
    types: &mut TypeTable,
    analysis: &Analysis,
    ast: &AstModule,
    opts: &BuildOptions,
) -> Result<LlirModule, VerifyError> {
    let mut ctx = LowerCtx {
        opts,
        types,
        analysis,
        module,
        fb: None,
        cur_fn: None,
        cur_block_ctx: None,
        break_blocks: Vec::new(),
        continue_blocks: Vec::new(),
        fn_values: Vec::new(),
        var_states: vec![VarState::default(); analysis.vars.len()],
        slot_ptrs: vec![None; analysis.slots.len()],
        label_blocks: vec![None; analysis.labels.len()],
        block_scopes: vec![None; analysis.block_ctxs.len()],
    };

    ctx.gen_globals(ast);
    ctx.declare_functions();
    for fn_def in &ast.fns {
        ctx.gen_fn_def(fn_def);
    }

    if opts.build_kind == BuildKind::Debug {
        verify_module(&ctx.module)?;
    }
    Ok(ctx.module)
}

impl<'a> LowerCtx<'a> {
    pub(crate) fn fb(&mut self) -> &mut FuncBuilder {
        debug_assert!(self.cur_fn.is_some(), "emission outside a function body");
        self.fb.as_mut().expect("emission outside a function body")
    }

    /// Split borrow for builder calls that also intern low-level types.
    pub(crate) fn fb_types(&mut self) -> (&mut FuncBuilder, &mut LlirTypes) {
        (
            self.fb.as_mut().expect("emission outside a function body"),
            &mut self.module.types,
        )
    }

    pub(crate) fn entry(&self, ty: TypeId) -> &TypeEntry {
        self.types.entry(ty)
    }

    pub(crate) fn llty(&self, ty: TypeId) -> LlirTypeId {
        self.types.entry(ty).llir_type()
    }

    pub(crate) fn const_int(&self, ty: TypeId, value: u64) -> Value {
        Value::ConstInt {
            ty: self.llty(ty),
            value,
        }
    }

    pub(crate) fn const_isize(&self, value: u64) -> Value {
        self.const_int(self.types.builtin.isize_type, value)
    }

    pub(crate) fn const_bool(&self, value: bool) -> Value {
        Value::ConstInt {
            ty: self.llty(self.types.builtin.bool_type),
            value: u64::from(value),
        }
    }

    pub(crate) fn const_i32(&mut self, value: u64) -> Value {
        let ty = self.module.types.int_type(32);
        Value::ConstInt { ty, value }
    }

    pub(crate) fn const_u8(&mut self, value: u64) -> Value {
        let ty = self.module.types.int_type(8);
        Value::ConstInt { ty, value }
    }

    /// All-ones in `bits` bits, the maximum unsigned value.
    pub(crate) fn all_ones(&self, bits: u64) -> u64 {
        if bits >= 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// Stamp subsequent instructions with this source position, scoped to
    /// the current block context. No-op at module scope.
    pub(crate) fn set_debug_location(&mut self, pos: SrcPos) {
        let Some(ctx) = self.cur_block_ctx else {
            return;
        };
        let scope = self.block_scopes[ctx.0 as usize]
            .expect("block context has no debug scope; prologue must run first");
        let loc = DebugLoc {
            line: pos.line + 1,
            column: pos.column + 1,
            scope,
        };
        self.fb().set_location(loc);
    }

    pub(crate) fn debug_loc(&self, pos: SrcPos, ctx: BlockCtxId) -> DebugLoc {
        DebugLoc {
            line: pos.line + 1,
            column: pos.column + 1,
            scope: self.block_scopes[ctx.0 as usize].expect("block context has no debug scope"),
        }
    }

    pub(crate) fn var_state(&self, var: VarId) -> VarState {
        self.var_states[var.0 as usize]
    }

    pub(crate) fn var_storage(&self, var: VarId) -> Value {
        self.var_states[var.0 as usize]
            .value
            .unwrap_or_else(|| panic!("variable '{}' has no storage", self.analysis.var(var).name))
    }

    pub(crate) fn slot_ptr(&self, slot: SlotId) -> Value {
        self.slot_ptrs[slot.0 as usize].expect("aggregate temporary not materialized in prologue")
    }
}

#[cfg(test)]
#[path = "../tests/fixture.rs"]
pub(crate) mod fixture;

#[cfg(test)]
#[path = "../tests/t_lower.rs"]
mod t_lower;

#[cfg(test)]
#[path = "../tests/t_lower_control.rs"]
mod t_lower_control;

#[cfg(test)]
#[path = "../tests/t_lower_aggregate.rs"]
mod t_lower_aggregate;
