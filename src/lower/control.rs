use super::LowerCtx;
use crate::ast::{AstNode, BinOp, NodeId, NodeKind, VarDeclNode, VarId};
use crate::llir::{BinOp as LlBinOp, BlockId, Callee, CallConv, IntPred, Value};
use crate::types::{TypeId, TypeKind};

impl<'a> LowerCtx<'a> {
    pub(crate) fn gen_return_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::Return { value } = &node.kind else {
            unreachable!()
        };
        let ret_val = value.as_ref().and_then(|v| self.gen_expr(v));
        self.set_debug_location(node.pos);
        self.fb().build_ret(ret_val);
        None
    }

    /// Lower a block's statements in its own scope. When
    /// `implicit_return_type` is given this is a function body and the
    /// final value becomes the return value.
    pub(crate) fn gen_block(
        &mut self,
        block_node: &AstNode,
        implicit_return_type: Option<TypeId>,
    ) -> Option<Value> {
        let NodeKind::Block { statements } = &block_node.kind else {
            unreachable!()
        };

        let old_block_ctx = self.cur_block_ctx;
        self.cur_block_ctx = Some(self.analysis.inner_block_ctxs[&block_node.id]);

        let mut return_value = None;
        for statement in statements {
            // emission after an expression of unreachable type is dead;
            // only a label makes the code live again
            if self.fb().is_terminated() && !matches!(statement.kind, NodeKind::Label { .. }) {
                continue;
            }
            return_value = self.gen_expr(statement);
        }

        if let Some(ret_type) = implicit_return_type {
            self.set_debug_location(block_node.pos);
            match &self.entry(ret_type).kind {
                TypeKind::Void => self.fb().build_ret(None),
                TypeKind::Unreachable => {}
                _ => self.fb().build_ret(return_value),
            }
        }

        self.cur_block_ctx = old_block_ctx;
        return_value
    }

    // --- If ---

    pub(crate) fn gen_if_bool_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::IfBool {
            condition,
            then_block,
            else_node,
        } = &node.kind
        else {
            unreachable!()
        };
        let cond_value = self.gen_expr(condition).expect("condition has no value");
        self.gen_if_bool_expr_raw(node, cond_value, then_block, else_node.as_deref())
    }

    pub(crate) fn gen_if_bool_expr_raw(
        &mut self,
        source_node: &AstNode,
        cond_value: Value,
        then_node: &AstNode,
        else_node: Option<&AstNode>,
    ) -> Option<Value> {
        let then_type = self.analysis.expr_type(then_node.id);

        let Some(else_node) = else_node else {
            // statement form: no value, fall through around the arm
            let then_block = self.fb().append_block("Then");
            let endif_block = self.fb().append_block("EndIf");

            self.fb().build_cond_br(cond_value, then_block, endif_block);

            self.fb().position_at_end(then_block);
            self.gen_expr(then_node);
            if !self.entry(then_type).is_unreachable() {
                self.fb().build_br(endif_block);
            }

            self.fb().position_at_end(endif_block);
            return None;
        };

        let else_type = self.analysis.expr_type(else_node.id);
        let then_reachable = !self.entry(then_type).is_unreachable();
        let else_reachable = !self.entry(else_type).is_unreachable();

        // whether the reachable side carries a value
        let value_type = if then_reachable { then_type } else { else_type };
        let use_expr_value = !matches!(
            self.entry(value_type).kind,
            TypeKind::Void | TypeKind::Unreachable
        );

        let then_block = self.fb().append_block("Then");
        let else_block = self.fb().append_block("Else");
        let endif_block = (then_reachable || else_reachable)
            .then(|| self.fb().append_block("EndIf"));

        self.fb().build_cond_br(cond_value, then_block, else_block);

        self.fb().position_at_end(then_block);
        let then_expr_result = self.gen_expr(then_node);
        if then_reachable {
            self.fb().build_br(endif_block.unwrap());
        }
        let after_then_block = self.fb().insert_block();

        self.fb().position_at_end(else_block);
        let else_expr_result = self.gen_expr(else_node);
        if else_reachable {
            self.fb().build_br(endif_block.unwrap());
        }
        let after_else_block = self.fb().insert_block();

        if let Some(endif_block) = endif_block {
            self.fb().position_at_end(endif_block);
            if use_expr_value {
                return self.join_arm_values(
                    value_type,
                    [
                        (then_reachable, then_expr_result, after_then_block),
                        (else_reachable, else_expr_result, after_else_block),
                    ],
                );
            }
        }

        None
    }

    /// Merge per-arm results at a join point: a phi when both arms reach
    /// it, the single live arm's value otherwise.
    fn join_arm_values(
        &mut self,
        value_type: TypeId,
        arms: [(bool, Option<Value>, BlockId); 2],
    ) -> Option<Value> {
        let mut incoming = Vec::new();
        for (reachable, value, block) in arms {
            if reachable {
                incoming.push((value.expect("reachable arm has no value"), block));
            }
        }
        match incoming.len() {
            0 => None,
            1 => Some(incoming[0].0),
            _ => {
                let ll = self.llty(value_type);
                Some(self.fb().build_phi(ll, incoming))
            }
        }
    }

    /// `if (const x ?= maybe_expr) ...`: bind the unwrapped payload in the
    /// then-arm's scope, branch on the present bit.
    pub(crate) fn gen_if_var_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::IfVar {
            decl,
            then_block,
            else_node,
        } = &node.kind
        else {
            unreachable!()
        };

        let old_block_ctx = self.cur_block_ctx;
        let new_block_ctx = self.analysis.inner_block_ctxs[&node.id];

        let init_val = self
            .gen_var_decl_raw(node, decl, node.id, true)
            .expect("maybe binding without an initializer value");

        // test the present bit
        self.set_debug_location(node.pos);
        let i1 = self.module.types.int_type(1);
        let present_ptr_ty = self.module.types.ptr_type(i1);
        let present_ptr = self.fb().build_struct_gep(init_val, 1, present_ptr_ty);
        let cond_value = self.fb().build_load(present_ptr, i1);

        self.cur_block_ctx = Some(new_block_ctx);
        let result = self.gen_if_bool_expr_raw(node, cond_value, then_block, else_node.as_deref());
        self.cur_block_ctx = old_block_ctx;
        result
    }

    // --- Maybe unwrap ---

    /// Load the payload out of a maybe.
    pub(crate) fn gen_unwrap_maybe(
        &mut self,
        node: &AstNode,
        maybe_struct_ref: Value,
        maybe_type: TypeId,
    ) -> Value {
        let child = self.entry(maybe_type).maybe_info().child;
        self.set_debug_location(node.pos);
        let child_ll = self.llty(child);
        let val_ptr_ty = self.module.types.ptr_type(child_ll);
        let val_ptr = self.fb().build_struct_gep(maybe_struct_ref, 0, val_ptr_ty);
        self.fb().build_load(val_ptr, child_ll)
    }

    /// `a ?? b`: yield the payload when present, otherwise evaluate `b`.
    pub(crate) fn gen_unwrap_maybe_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::BinOp { op, lhs, rhs } = &node.kind else {
            unreachable!()
        };
        assert!(*op == BinOp::UnwrapMaybe);

        let maybe_type = self.analysis.expr_type(lhs.id);
        let maybe_struct_ref = self.gen_expr(lhs).expect("maybe operand has no value");

        self.set_debug_location(node.pos);
        let i1 = self.module.types.int_type(1);
        let present_ptr_ty = self.module.types.ptr_type(i1);
        let present_ptr = self
            .fb()
            .build_struct_gep(maybe_struct_ref, 1, present_ptr_ty);
        let cond_value = self.fb().build_load(present_ptr, i1);

        let non_null_reachable = !self.entry(self.analysis.expr_type(lhs.id)).is_unreachable();
        let null_reachable = !self.entry(self.analysis.expr_type(rhs.id)).is_unreachable();
        let end_reachable = non_null_reachable || null_reachable;

        let non_null_block = self.fb().append_block("MaybeNonNull");
        let null_block = self.fb().append_block("MaybeNull");
        let end_block = end_reachable.then(|| self.fb().append_block("MaybeEnd"));

        self.fb()
            .build_cond_br(cond_value, non_null_block, null_block);

        self.fb().position_at_end(non_null_block);
        let non_null_result = self.gen_unwrap_maybe(lhs, maybe_struct_ref, maybe_type);
        if non_null_reachable {
            self.set_debug_location(node.pos);
            self.fb().build_br(end_block.unwrap());
        }
        let post_non_null_block = self.fb().insert_block();

        self.fb().position_at_end(null_block);
        let null_result = self.gen_expr(rhs);
        if null_reachable {
            self.set_debug_location(node.pos);
            self.fb().build_br(end_block.unwrap());
        }
        let post_null_block = self.fb().insert_block();

        if let Some(end_block) = end_block {
            self.fb().position_at_end(end_block);
            self.set_debug_location(node.pos);
            let child = self.entry(maybe_type).maybe_info().child;
            return self.join_arm_values(
                child,
                [
                    (non_null_reachable, Some(non_null_result), post_non_null_block),
                    (null_reachable, null_result, post_null_block),
                ],
            );
        }

        None
    }

    // --- Loops ---

    pub(crate) fn gen_while_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::While { condition, body } = &node.kind else {
            unreachable!()
        };
        let info = *self
            .analysis
            .while_infos
            .get(&node.id)
            .unwrap_or_else(|| panic!("while on node {} has no loop info", node.id));
        let body_type = self.analysis.expr_type(body.id);
        let old_block_ctx = self.cur_block_ctx;

        if info.condition_always_true {
            // forever loop: one body block, unconditional back edge
            self.cur_block_ctx = Some(self.analysis.inner_block_ctxs[&node.id]);

            let body_block = self.fb().append_block("WhileBody");
            let end_block = info
                .contains_break
                .then(|| self.fb().append_block("WhileEnd"));

            self.set_debug_location(node.pos);
            self.fb().build_br(body_block);

            self.fb().position_at_end(body_block);
            self.break_blocks.push(end_block);
            self.continue_blocks.push(body_block);
            self.gen_expr(body);
            self.break_blocks.pop();
            self.continue_blocks.pop();

            if !self.entry(body_type).is_unreachable() {
                self.set_debug_location(node.pos);
                self.fb().build_br(body_block);
            }

            if let Some(end_block) = end_block {
                self.fb().position_at_end(end_block);
            }
        } else {
            let cond_block = self.fb().append_block("WhileCond");
            let body_block = self.fb().append_block("WhileBody");
            let end_block = self.fb().append_block("WhileEnd");

            self.set_debug_location(node.pos);
            self.fb().build_br(cond_block);

            // the condition re-evaluates in the surrounding scope
            self.fb().position_at_end(cond_block);
            self.cur_block_ctx = old_block_ctx;
            let cond_val = self.gen_expr(condition).expect("condition has no value");
            self.set_debug_location(condition.pos);
            self.fb().build_cond_br(cond_val, body_block, end_block);

            self.fb().position_at_end(body_block);
            self.break_blocks.push(Some(end_block));
            self.continue_blocks.push(cond_block);
            self.cur_block_ctx = Some(self.analysis.inner_block_ctxs[&node.id]);
            self.gen_expr(body);
            self.break_blocks.pop();
            self.continue_blocks.pop();
            if !self.entry(body_type).is_unreachable() {
                self.set_debug_location(node.pos);
                self.fb().build_br(cond_block);
            }

            self.fb().position_at_end(end_block);
        }

        self.cur_block_ctx = old_block_ctx;
        None
    }

    /// `for (elem, i) in array`: an isize induction variable compared
    /// against the length each iteration.
    pub(crate) fn gen_for_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::For { array, body, .. } = &node.kind else {
            unreachable!()
        };
        let info = *self
            .analysis
            .for_infos
            .get(&node.id)
            .unwrap_or_else(|| panic!("for on node {} has no loop info", node.id));
        let body_type = self.analysis.expr_type(body.id);
        let array_type = self.analysis.expr_type(array.id);

        let index_var = self.analysis.var(info.index_var);
        let index_type = index_var.ty;
        let index_ptr = self.var_storage(info.index_var);
        let one_const = self.const_isize(1);

        let old_block_ctx = self.cur_block_ctx;

        let cond_block = self.fb().append_block("ForCond");
        let body_block = self.fb().append_block("ForBody");
        let end_block = self.fb().append_block("ForEnd");

        let array_val = self.gen_array_base_ptr(array);
        self.set_debug_location(node.pos);
        let zero = self.const_int(index_type, 0);
        self.fb().build_store(zero, index_ptr);

        let (len_val, child_type) = match &self.entry(array_type).kind {
            TypeKind::Array(arr) => (self.const_isize(arr.len), arr.child),
            TypeKind::Struct(info) => {
                assert!(info.is_slice, "iterating a plain struct");
                let ptr_field = info.fields[0].ty;
                let child = self.entry(ptr_field).pointer_info().child;
                let isize_ll = self.llty(self.types.builtin.isize_type);
                let len_ptr_ty = self.module.types.ptr_type(isize_ll);
                let base = array_val.expect("iterated slice has no value");
                let len_field_ptr = self.fb().build_struct_gep(base, 1, len_ptr_ty);
                (self.fb().build_load(len_field_ptr, isize_ll), child)
            }
            other => unreachable!("iterating {:?}", other),
        };
        self.fb().build_br(cond_block);

        self.fb().position_at_end(cond_block);
        let index_ll = self.llty(index_type);
        let index_val = self.fb().build_load(index_ptr, index_ll);
        let (fb, types) = self.fb_types();
        let cond = fb.build_icmp(types, IntPred::Slt, index_val, len_val);
        self.fb().build_cond_br(cond, body_block, end_block);

        self.fb().position_at_end(body_block);
        let elem_ptr = self.gen_array_elem_ptr(node, array_val, array_type, index_val);
        let elem_val = if self.types.handle_is_ptr(child_type) {
            elem_ptr.expect("aggregate element has no pointer")
        } else {
            let child_ll = self.llty(child_type);
            let ptr = elem_ptr.expect("element has no pointer");
            self.fb().build_load(ptr, child_ll)
        };
        let elem_storage = self.var_storage(info.elem_var);
        let elem_var_type = self.analysis.var(info.elem_var).ty;
        self.gen_assign_raw(
            node,
            BinOp::Assign,
            elem_storage,
            elem_val,
            elem_var_type,
            child_type,
        );
        self.break_blocks.push(Some(end_block));
        self.continue_blocks.push(cond_block);
        self.cur_block_ctx = Some(self.analysis.inner_block_ctxs[&node.id]);
        self.gen_expr(body);
        self.break_blocks.pop();
        self.continue_blocks.pop();
        if !self.entry(body_type).is_unreachable() {
            self.set_debug_location(node.pos);
            let new_index_val = self
                .fb()
                .build_bin(LlBinOp::Add, index_val, one_const, index_ll);
            self.fb().build_store(new_index_val, index_ptr);
            self.fb().build_br(cond_block);
        }

        self.fb().position_at_end(end_block);
        self.cur_block_ctx = old_block_ctx;
        None
    }

    pub(crate) fn gen_break(&mut self, node: &AstNode) -> Option<Value> {
        let dest_block = self
            .break_blocks
            .last()
            .copied()
            .flatten()
            .expect("break outside a breakable loop");
        self.set_debug_location(node.pos);
        self.fb().build_br(dest_block);
        None
    }

    pub(crate) fn gen_continue(&mut self, node: &AstNode) -> Option<Value> {
        let dest_block = *self
            .continue_blocks
            .last()
            .expect("continue outside a loop");
        self.set_debug_location(node.pos);
        self.fb().build_br(dest_block);
        None
    }

    // --- Goto / label ---

    pub(crate) fn gen_goto(&mut self, node: &AstNode) -> Option<Value> {
        let label = self.analysis.gotos[&node.id];
        let block = self.label_blocks[label.0 as usize].expect("goto before label blocks exist");
        self.set_debug_location(node.pos);
        self.fb().build_br(block);
        None
    }

    pub(crate) fn gen_label(&mut self, node: &AstNode) -> Option<Value> {
        let label = self.analysis.label_defs[&node.id];
        let block = self.label_blocks[label.0 as usize].expect("label block missing");
        if self.analysis.label(label).entered_from_fallthrough {
            self.set_debug_location(node.pos);
            self.fb().build_br(block);
        }
        self.fb().position_at_end(block);
        None
    }

    // --- Declarations ---

    pub(crate) fn gen_var_decl_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::VarDecl(decl) = &node.kind else {
            unreachable!()
        };
        self.gen_var_decl_raw(node, decl, node.id, false);
        None
    }

    /// Initialize a declared local. Returns the raw initializer value (the
    /// maybe pointer, for if-let bindings).
    pub(crate) fn gen_var_decl_raw(
        &mut self,
        source_node: &AstNode,
        var_decl: &VarDeclNode,
        decl_node_id: NodeId,
        unwrap_maybe: bool,
    ) -> Option<Value> {
        let var_id = *self
            .analysis
            .var_decls
            .get(&decl_node_id)
            .unwrap_or_else(|| panic!("declaration on node {} has no variable", decl_node_id));
        let var = self.analysis.var(var_id);
        let var_type = var.ty;
        assert!(
            self.var_state(var_id).is_ptr,
            "declared variable '{}' is not storage-backed",
            var.name
        );

        let init_val = var_decl.init.as_ref().and_then(|init| self.gen_expr(init));

        if self.entry(var_type).size_in_bits == 0 {
            return init_val;
        }

        let storage = self.var_storage(var_id);

        if let Some(init) = &var_decl.init {
            let mut expr_type = self.analysis.expr_type(init.id);
            let mut value = init_val.expect("initializer has no value");
            if unwrap_maybe {
                value = self.gen_unwrap_maybe(source_node, value, expr_type);
                expr_type = self.entry(expr_type).maybe_info().child;
            }
            self.gen_assign_raw(init, BinOp::Assign, storage, value, var_type, expr_type);
        } else {
            let mut ignore_uninit = false;
            if self.entry(var_type).is_slice() {
                // a runtime length means a stack allocation at the
                // declaration point
                if let Some(size_node) = runtime_array_size(var_decl) {
                    if self.analysis.expr(size_node.id).const_val.is_none() {
                        let ptr_field = self.entry(var_type).struct_info().fields[0].ty;
                        let child = self.entry(ptr_field).pointer_info().child;

                        let size_val = self.gen_expr(size_node).expect("length has no value");

                        self.set_debug_location(source_node.pos);
                        let child_ll = self.llty(child);
                        let child_align = (self.entry(child).align_in_bits / 8) as u32;
                        let (fb, types) = self.fb_types();
                        let ptr_val =
                            fb.build_array_alloca(types, child_ll, size_val, child_align);

                        let ptr_field_ll = self.llty(ptr_field);
                        let ptr_ptr_ty = self.module.types.ptr_type(ptr_field_ll);
                        let ptr_field_ptr = self.fb().build_struct_gep(storage, 0, ptr_ptr_ty);
                        let ptr_cast = self.fb().build_bitcast(ptr_val, ptr_field_ll);
                        self.fb().build_store(ptr_cast, ptr_field_ptr);

                        let isize_ll = self.llty(self.types.builtin.isize_type);
                        let len_ptr_ty = self.module.types.ptr_type(isize_ll);
                        let len_field_ptr = self.fb().build_struct_gep(storage, 1, len_ptr_ty);
                        self.fb().build_store(size_val, len_field_ptr);

                        ignore_uninit = true;
                    }
                }
            }
            if !ignore_uninit && !self.opts.is_release() {
                // poison uninitialized memory so stale reads are visible
                self.set_debug_location(source_node.pos);
                let u8_ty = self.module.types.int_type(8);
                let ptr_u8 = self.module.types.ptr_type(u8_ty);
                let dest_ptr = self.fb().build_bitcast(storage, ptr_u8);
                let fill_char = self.const_u8(0xaa);
                let size_bytes = self.entry(var_type).size_in_bits / 8;
                let align_bytes = self.entry(var_type).align_in_bits / 8;
                let byte_count = self.const_isize(size_bytes);
                let align_val = self.const_i32(align_bytes);
                let volatile = Value::ConstInt {
                    ty: self.module.types.int_type(1),
                    value: 0,
                };
                let void = self.module.types.void_type();
                let memset_fn = self.types.memset_fn;
                self.fb().build_call(
                    Callee::Func(memset_fn),
                    vec![dest_ptr, fill_char, byte_count, align_val, volatile],
                    void,
                    CallConv::C,
                );
            }
        }

        self.declare_local_debug_var(var_id, source_node);
        init_val
    }

    fn declare_local_debug_var(&mut self, var_id: VarId, source_node: &AstNode) {
        let state = self.var_state(var_id);
        let Some(di_var) = state.di_var else {
            return;
        };
        let Some(ctx) = self.cur_block_ctx else {
            return;
        };
        let loc = self.debug_loc(source_node.pos, ctx);
        let storage = self.var_storage(var_id);
        self.fb().add_declare(storage, di_var, loc);
    }
}

fn runtime_array_size(var_decl: &VarDeclNode) -> Option<&AstNode> {
    match &var_decl.type_expr {
        Some(type_expr) => match &type_expr.kind {
            NodeKind::ArrayType {
                size: Some(size), ..
            } => Some(size),
            _ => None,
        },
        None => None,
    }
}
