use tracing::debug;

use super::{LowerCtx, VarState};
use crate::ast::{AstModule, AstNode, ConstVal, FnDef};
use crate::llir::builder::FuncBuilder;
use crate::llir::debug_info::{DebugLoc, DebugVariable};
use crate::llir::{GlobalData, GlobalInit, ParamAttr, Value};
use crate::types::TypeKind;

impl<'a> LowerCtx<'a> {
    /// Declare every function up front so call sites can reference them
    /// regardless of definition order, and tag parameter attributes.
    pub(crate) fn declare_functions(&mut self) {
        for fn_entry in &self.analysis.fns {
            let info = self.entry(fn_entry.ty).fn_info().clone();
            let ll_fn_ty = self.llty(fn_entry.ty);
            let func_id = self
                .module
                .add_function(&fn_entry.symbol_name, ll_fn_ty, info.conv);
            self.module.func_mut(func_id).internal_linkage = fn_entry.internal_linkage;
            self.fn_values.push(func_id);

            let mut gen_param_index = 0usize;
            for param in &fn_entry.params {
                if self.entry(param.ty).size_in_bits == 0 {
                    continue;
                }
                let gen_type = if self.types.handle_is_ptr(param.ty) {
                    self.types.pointer_to(&mut self.module, param.ty, true)
                } else {
                    param.ty
                };
                if let TypeKind::Pointer(pointer) = self.entry(gen_type).kind {
                    if param.is_noalias {
                        self.module.func_mut(func_id).param_attrs[gen_param_index]
                            .push(ParamAttr::NoAlias);
                    } else if pointer.is_const {
                        self.module.func_mut(func_id).param_attrs[gen_param_index]
                            .push(ParamAttr::ReadOnly);
                    }
                }
                gen_param_index += 1;
            }
        }
    }

    /// Module-level variables: constants get their folded initializer,
    /// mutable globals start zeroed.
    pub(crate) fn gen_globals(&mut self, ast: &AstModule) {
        for global in &ast.globals {
            let var = self.analysis.var(global.var);
            let ll_ty = self.llty(var.ty);
            let init = if var.is_const {
                global
                    .init
                    .as_ref()
                    .map(|node| self.gen_const_init(node))
                    .unwrap_or(GlobalInit::Zero)
            } else {
                GlobalInit::Zero
            };
            let global_id = self.module.add_global(GlobalData {
                name: var.name.clone(),
                ty: ll_ty,
                init,
                is_const: var.is_const,
                private_linkage: true,
                unnamed_addr: true,
                ptr_ty: ll_ty, // recomputed by add_global
            });
            self.var_states[global.var.0 as usize] = VarState {
                value: Some(Value::Global(global_id)),
                is_ptr: true,
                di_var: None,
            };
        }
    }

    fn gen_const_init(&self, node: &AstNode) -> GlobalInit {
        let info = self.analysis.expr(node.id);
        match &info.const_val {
            Some(ConstVal::Num(value)) => match &self.entry(info.ty).kind {
                TypeKind::Int(_) => GlobalInit::Value(Value::ConstInt {
                    ty: self.llty(info.ty),
                    value: value.to_twos_complement(),
                }),
                TypeKind::Float => match value.cast_to_float() {
                    crate::bignum::BigNum::Float(f) => GlobalInit::Value(Value::ConstFloat {
                        ty: self.llty(info.ty),
                        value: f,
                    }),
                    crate::bignum::BigNum::Int { .. } => unreachable!(),
                },
                other => panic!("global initializer of {:?}", other),
            },
            Some(ConstVal::Bool(value)) => GlobalInit::Value(Value::ConstInt {
                ty: self.llty(info.ty),
                value: u64::from(*value),
            }),
            _ => GlobalInit::Zero,
        }
    }

    /// Emit one function body: label blocks, debug scopes, entry-block
    /// allocas for locals and aggregate temporaries, parameter declares,
    /// then the body itself.
    pub(crate) fn gen_fn_def(&mut self, fn_def: &FnDef) {
        let fn_id = fn_def.fn_id;
        let fn_entry = self.analysis.func(fn_id);
        let func_value = self.fn_values[fn_id.0 as usize];
        self.cur_fn = Some(fn_id);
        debug!(func = %fn_entry.name, "lower function");

        let proto = self.module.func(func_value).clone();
        self.fb = Some(FuncBuilder::for_function(proto, &mut self.module.types));

        // labels exist as empty blocks before any statement is lowered
        self.label_blocks = vec![None; self.analysis.labels.len()];
        for label_id in &fn_entry.labels {
            let name = self.analysis.label(*label_id).name.clone();
            let block = self.fb().append_block(&name);
            self.label_blocks[label_id.0 as usize] = Some(block);
        }

        let compile_unit = self.module.debug.compile_unit_scope();
        let subprogram =
            self.module
                .debug
                .create_subprogram(compile_unit, &fn_entry.name, fn_def.body.pos.line + 1);

        for ctx_id in &fn_entry.all_block_ctxs {
            let ctx = self.analysis.block_ctx(*ctx_id);

            let scope = if ctx.is_fn_root {
                subprogram
            } else {
                let parent = ctx.parent.expect("non-root block context without parent");
                let parent_scope =
                    self.block_scopes[parent.0 as usize].expect("parents precede children");
                self.module.debug.create_lexical_block(
                    parent_scope,
                    ctx.pos.line + 1,
                    ctx.pos.column + 1,
                )
            };
            self.block_scopes[ctx_id.0 as usize] = Some(scope);
            self.cur_block_ctx = Some(*ctx_id);

            for var_id in &ctx.vars {
                let var = self.analysis.var(*var_id);
                if self.entry(var.ty).size_in_bits == 0 {
                    continue;
                }

                let keep_debug = !self.opts.strip_debug_info;
                let var_debug_type = self.entry(var.ty).debug_type();
                if ctx.is_fn_root {
                    let arg_index = var
                        .gen_arg_index
                        .expect("function-root variable without an argument index");
                    let di_var = keep_debug.then(|| {
                        self.module.debug.create_variable(DebugVariable {
                            name: var.name.clone(),
                            ty: var_debug_type,
                            scope,
                            line: var.decl_pos.line + 1,
                            arg_no: Some(arg_index + 1),
                        })
                    });
                    self.var_states[var_id.0 as usize] = VarState {
                        value: Some(Value::Param(arg_index)),
                        is_ptr: false,
                        di_var,
                    };
                } else {
                    self.set_debug_location(var.decl_pos);
                    let ll = self.llty(var.ty);
                    let align = (self.entry(var.ty).align_in_bits / 8) as u32;
                    let name = var.name.clone();
                    let (fb, types) = self.fb_types();
                    let storage = fb.build_alloca(types, ll, align, &name);
                    let di_var = keep_debug.then(|| {
                        self.module.debug.create_variable(DebugVariable {
                            name,
                            ty: var_debug_type,
                            scope,
                            line: var.decl_pos.line + 1,
                            arg_no: None,
                        })
                    });
                    self.var_states[var_id.0 as usize] = VarState {
                        value: Some(storage),
                        is_ptr: true,
                        di_var,
                    };
                }
            }

            // aggregate temporaries: cast results first, then literal
            // aggregates
            for slot_id in ctx.cast_slots.iter().chain(ctx.agg_slots.iter()) {
                let slot = self.analysis.slot(*slot_id);
                self.set_debug_location(slot.pos);
                let ll = self.llty(slot.ty);
                let align = (self.entry(slot.ty).align_in_bits / 8) as u32;
                let (fb, types) = self.fb_types();
                let storage = fb.build_alloca(types, ll, align, "");
                self.slot_ptrs[slot_id.0 as usize] = Some(storage);
            }
        }

        // parameter declares attach to the entry block
        for param in &fn_entry.params {
            let Some(var_id) = param.var else {
                continue;
            };
            if self.entry(param.ty).size_in_bits == 0 {
                continue;
            }
            let state = self.var_state(var_id);
            if let (Some(di_var), Some(value)) = (state.di_var, state.value) {
                let loc = DebugLoc {
                    line: param.pos.line + 1,
                    column: param.pos.column + 1,
                    scope: subprogram,
                };
                self.fb().add_declare(value, di_var, loc);
            }
        }

        self.cur_block_ctx = fn_entry.body_block_ctx;
        self.gen_block(&fn_def.body, Some(fn_def.implicit_return_type));

        let finished = self.fb.take().expect("builder disappeared").finish();
        self.module.set_function_body(func_value, finished);
        self.cur_fn = None;
        self.cur_block_ctx = None;
    }
}
