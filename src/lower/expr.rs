use super::LowerCtx;
use crate::ast::{AstNode, BinOp, BuiltinFn, NodeKind, PrefixOp, SymbolRef};
use crate::bignum::BigNum;
use crate::llir::{BinOp as LlBinOp, Callee, FloatPred, IntPred, Value};
use crate::types::{TypeId, TypeKind};

impl<'a> LowerCtx<'a> {
    /// Lower an expression and apply the implicit coercions the analyzer
    /// recorded on it (ordinary cast first, then the maybe wrap).
    pub(crate) fn gen_expr(&mut self, node: &AstNode) -> Option<Value> {
        let val = self.gen_expr_no_cast(node);

        if self.is_void_container_init(node) {
            return val;
        }

        let info = self.analysis.expr(node.id);
        if self.entry(info.ty).is_unreachable() {
            return val;
        }

        let mut val = val;
        let mut before_type = info.ty;
        if let Some(cast) = info.implicit_cast {
            val = self.gen_bare_cast(node, val, before_type, &cast);
            before_type = cast.after_type;
        }
        if let Some(cast) = info.implicit_maybe_cast {
            val = self.gen_bare_cast(node, val, before_type, &cast);
        }
        val
    }

    fn is_void_container_init(&self, node: &AstNode) -> bool {
        matches!(&node.kind, NodeKind::ContainerInit { .. })
            && matches!(
                self.entry(self.analysis.expr(node.id).ty).kind,
                TypeKind::Void
            )
    }

    pub(crate) fn gen_expr_no_cast(&mut self, node: &AstNode) -> Option<Value> {
        match &node.kind {
            NodeKind::BinOp { .. } => self.gen_bin_op_expr(node),
            NodeKind::Return { .. } => self.gen_return_expr(node),
            NodeKind::VarDecl(_) => self.gen_var_decl_expr(node),
            NodeKind::PrefixOp { .. } => self.gen_prefix_op_expr(node),
            NodeKind::FnCall { .. } => self.gen_fn_call_expr(node),
            NodeKind::ArrayAccess { .. } => self.gen_array_access_expr(node, false),
            NodeKind::SliceExpr { .. } => self.gen_slice_expr(node),
            NodeKind::FieldAccess { .. } => self.gen_field_access_expr(node, false),
            NodeKind::BoolLit { value } => Some(self.const_bool(*value)),
            NodeKind::NullLit => self.gen_null_literal(node),
            NodeKind::IfBool { .. } => self.gen_if_bool_expr(node),
            NodeKind::IfVar { .. } => self.gen_if_var_expr(node),
            NodeKind::While { .. } => self.gen_while_expr(node),
            NodeKind::For { .. } => self.gen_for_expr(node),
            NodeKind::Asm(_) => self.gen_asm_expr(node),
            NodeKind::NumLit { value } => Some(self.gen_number_literal(node, *value)),
            NodeKind::StrLit { value, is_c } => Some(self.gen_string_literal(node, value, *is_c)),
            NodeKind::CharLit { value } => {
                let u8_type = self.types.int_type(false, 8);
                Some(self.const_int(u8_type, *value as u64))
            }
            NodeKind::Symbol { .. } => self.gen_symbol(node),
            NodeKind::Block { .. } => self.gen_block(node, None),
            NodeKind::Goto { .. } => self.gen_goto(node),
            NodeKind::Break => self.gen_break(node),
            NodeKind::Continue => self.gen_continue(node),
            NodeKind::Label { .. } => self.gen_label(node),
            NodeKind::ContainerInit { .. } => self.gen_container_init_expr(node),
            NodeKind::StructValueField { .. } | NodeKind::ArrayType { .. } => {
                unreachable!("node {} is not an expression", node.id)
            }
        }
    }

    fn gen_number_literal(&mut self, node: &AstNode, value: BigNum) -> Value {
        let ty = self.analysis.expr(node.id).ty;
        match &self.entry(ty).kind {
            // the two's-complement pattern is what the constant carries
            TypeKind::Int(_) => self.const_int(ty, value.to_twos_complement()),
            TypeKind::Float => match value {
                BigNum::Float(f) => Value::ConstFloat {
                    ty: self.llty(ty),
                    value: f,
                },
                BigNum::Int { .. } => match value.cast_to_float() {
                    BigNum::Float(f) => Value::ConstFloat {
                        ty: self.llty(ty),
                        value: f,
                    },
                    BigNum::Int { .. } => unreachable!(),
                },
            },
            _ => panic!("bad number literal type on node {}", node.id),
        }
    }

    fn gen_string_literal(&mut self, node: &AstNode, value: &[u8], is_c: bool) -> Value {
        let global = self.module.find_or_create_string(value, is_c);
        let zero = self.const_isize(0);
        let u8_ty = self.module.types.int_type(8);
        let result_ty = self.module.types.ptr_type(u8_ty);
        self.set_debug_location(node.pos);
        self.fb()
            .build_inbounds_gep(Value::Global(global), vec![zero, zero], result_ty)
    }

    fn gen_symbol(&mut self, node: &AstNode) -> Option<Value> {
        match self.analysis.symbol_refs.get(&node.id) {
            Some(SymbolRef::Var(var_id)) => {
                let var = self.analysis.var(*var_id);
                if self.entry(var.ty).size_in_bits == 0 {
                    return None;
                }
                let state = self.var_state(*var_id);
                let value = self.var_storage(*var_id);
                if state.is_ptr {
                    if self.types.handle_is_ptr(var.ty) {
                        Some(value)
                    } else {
                        self.set_debug_location(node.pos);
                        let ty = self.llty(var.ty);
                        Some(self.fb().build_load(value, ty))
                    }
                } else {
                    Some(value)
                }
            }
            Some(SymbolRef::Fn(fn_id)) => Some(Value::Func(self.fn_values[fn_id.0 as usize])),
            None => panic!("unresolved symbol on node {}", node.id),
        }
    }

    // --- Binary operators ---

    fn gen_bin_op_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::BinOp { op, .. } = &node.kind else {
            unreachable!()
        };
        match op {
            _ if op.is_assign() => self.gen_assign_expr(node),
            BinOp::BoolOr => Some(self.gen_bool_or_expr(node)),
            BinOp::BoolAnd => Some(self.gen_bool_and_expr(node)),
            BinOp::CmpEq
            | BinOp::CmpNotEq
            | BinOp::CmpLessThan
            | BinOp::CmpGreaterThan
            | BinOp::CmpLessOrEq
            | BinOp::CmpGreaterOrEq => Some(self.gen_cmp_expr(node)),
            BinOp::UnwrapMaybe => self.gen_unwrap_maybe_expr(node),
            BinOp::BinOr
            | BinOp::BinXor
            | BinOp::BinAnd
            | BinOp::BitShiftLeft
            | BinOp::BitShiftRight
            | BinOp::Add
            | BinOp::Sub
            | BinOp::Mult
            | BinOp::Div
            | BinOp::Mod => Some(self.gen_arithmetic_bin_op_expr(node)),
            _ => unreachable!("binary operator {:?} has no lowering", op),
        }
    }

    fn gen_arithmetic_bin_op_expr(&mut self, node: &AstNode) -> Value {
        let NodeKind::BinOp { op, lhs, rhs } = &node.kind else {
            unreachable!()
        };
        let val1 = self.gen_expr(lhs).expect("arithmetic operand has no value");
        let val2 = self.gen_expr(rhs).expect("arithmetic operand has no value");
        let op1_type = self.analysis.expr_type(lhs.id);
        let op2_type = self.analysis.expr_type(rhs.id);
        self.gen_arithmetic_bin_op(node, val1, val2, op1_type, op2_type, *op)
    }

    /// Arithmetic and bitwise binary operation on like-typed operands.
    pub(crate) fn gen_arithmetic_bin_op(
        &mut self,
        source_node: &AstNode,
        val1: Value,
        val2: Value,
        op1_type: TypeId,
        op2_type: TypeId,
        bin_op: BinOp,
    ) -> Value {
        assert!(
            op1_type == op2_type,
            "mismatched operand types on node {}",
            source_node.id
        );
        let entry = self.entry(op1_type);
        let is_float = matches!(entry.kind, TypeKind::Float);
        let is_signed = entry.is_signed_int();
        let ty = entry.llir_type();

        let ll_op = match bin_op {
            BinOp::BinOr | BinOp::AssignBitOr => LlBinOp::Or,
            BinOp::BinXor | BinOp::AssignBitXor => LlBinOp::Xor,
            BinOp::BinAnd | BinOp::AssignBitAnd => LlBinOp::And,
            BinOp::BitShiftLeft | BinOp::AssignBitShiftLeft => LlBinOp::Shl,
            BinOp::BitShiftRight | BinOp::AssignBitShiftRight => {
                assert!(matches!(entry.kind, TypeKind::Int(_)));
                if is_signed {
                    LlBinOp::AShr
                } else {
                    LlBinOp::LShr
                }
            }
            BinOp::Add | BinOp::AssignPlus => {
                if is_float {
                    LlBinOp::FAdd
                } else {
                    LlBinOp::Add
                }
            }
            BinOp::Sub | BinOp::AssignMinus => {
                if is_float {
                    LlBinOp::FSub
                } else {
                    LlBinOp::Sub
                }
            }
            BinOp::Mult | BinOp::AssignTimes => {
                if is_float {
                    LlBinOp::FMul
                } else {
                    LlBinOp::Mul
                }
            }
            BinOp::Div | BinOp::AssignDiv => {
                if is_float {
                    LlBinOp::FDiv
                } else if is_signed {
                    LlBinOp::SDiv
                } else {
                    LlBinOp::UDiv
                }
            }
            BinOp::Mod | BinOp::AssignMod => {
                if is_float {
                    LlBinOp::FRem
                } else if is_signed {
                    LlBinOp::SRem
                } else {
                    LlBinOp::URem
                }
            }
            other => unreachable!("operator {:?} is not arithmetic", other),
        };

        self.set_debug_location(source_node.pos);
        self.fb().build_bin(ll_op, val1, val2, ty)
    }

    fn gen_cmp_expr(&mut self, node: &AstNode) -> Value {
        let NodeKind::BinOp { op, lhs, rhs } = &node.kind else {
            unreachable!()
        };
        let val1 = self.gen_expr(lhs).expect("comparison operand has no value");
        let val2 = self.gen_expr(rhs).expect("comparison operand has no value");
        let op1_type = self.analysis.expr_type(lhs.id);
        let op2_type = self.analysis.expr_type(rhs.id);
        assert!(op1_type == op2_type, "mismatched comparison operand types");

        self.set_debug_location(node.pos);
        match &self.entry(op1_type).kind {
            TypeKind::Float => {
                let pred = cmp_op_to_float_pred(*op);
                let (fb, types) = self.fb_types();
                fb.build_fcmp(types, pred, val1, val2)
            }
            TypeKind::Int(info) => {
                let pred = cmp_op_to_int_pred(*op, info.is_signed);
                let (fb, types) = self.fb_types();
                fb.build_icmp(types, pred, val1, val2)
            }
            // enum values compare as their unsigned tag
            TypeKind::Enum(_) => {
                let pred = cmp_op_to_int_pred(*op, false);
                let (fb, types) = self.fb_types();
                fb.build_icmp(types, pred, val1, val2)
            }
            other => unreachable!("comparison on non-comparable type {:?}", other),
        }
    }

    /// `a and b` evaluates `b` only when `a` is true; the join phi's
    /// incoming blocks are the insertion blocks at each branch point.
    fn gen_bool_and_expr(&mut self, node: &AstNode) -> Value {
        let NodeKind::BinOp { lhs, rhs, .. } = &node.kind else {
            unreachable!()
        };
        let val1 = self.gen_expr(lhs).expect("boolean operand has no value");
        let post_val1_block = self.fb().insert_block();

        let true_block = self.fb().append_block("BoolAndTrue");
        // lhs false: skip the second operand entirely
        let false_block = self.fb().append_block("BoolAndFalse");

        self.set_debug_location(node.pos);
        self.fb().build_cond_br(val1, true_block, false_block);

        self.fb().position_at_end(true_block);
        let val2 = self.gen_expr(rhs).expect("boolean operand has no value");
        let post_val2_block = self.fb().insert_block();

        self.set_debug_location(node.pos);
        self.fb().build_br(false_block);

        self.fb().position_at_end(false_block);
        self.set_debug_location(node.pos);
        let bool_ty = self.llty(self.types.builtin.bool_type);
        self.fb().build_phi(
            bool_ty,
            vec![(val1, post_val1_block), (val2, post_val2_block)],
        )
    }

    fn gen_bool_or_expr(&mut self, node: &AstNode) -> Value {
        let NodeKind::BinOp { lhs, rhs, .. } = &node.kind else {
            unreachable!()
        };
        let val1 = self.gen_expr(lhs).expect("boolean operand has no value");
        let post_val1_block = self.fb().insert_block();

        let false_block = self.fb().append_block("BoolOrFalse");
        // lhs true: skip the second operand entirely
        let true_block = self.fb().append_block("BoolOrTrue");

        self.set_debug_location(node.pos);
        self.fb().build_cond_br(val1, true_block, false_block);

        self.fb().position_at_end(false_block);
        let val2 = self.gen_expr(rhs).expect("boolean operand has no value");
        let post_val2_block = self.fb().insert_block();

        self.set_debug_location(node.pos);
        self.fb().build_br(true_block);

        self.fb().position_at_end(true_block);
        self.set_debug_location(node.pos);
        let bool_ty = self.llty(self.types.builtin.bool_type);
        self.fb().build_phi(
            bool_ty,
            vec![(val1, post_val1_block), (val2, post_val2_block)],
        )
    }

    // --- Prefix operators ---

    fn gen_prefix_op_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::PrefixOp { op, operand } = &node.kind else {
            unreachable!()
        };
        match op {
            PrefixOp::Negation => {
                let expr = self.gen_expr(operand).expect("negation of zero-sized value");
                let ty = self.analysis.expr_type(operand.id);
                let is_float = matches!(self.entry(ty).kind, TypeKind::Float);
                let ll_ty = self.llty(ty);
                self.set_debug_location(node.pos);
                Some(self.fb().build_neg(expr, ll_ty, is_float))
            }
            PrefixOp::BoolNot => {
                let expr = self.gen_expr(operand).expect("bool-not of zero-sized value");
                let zero = self.const_bool(false);
                self.set_debug_location(node.pos);
                let (fb, types) = self.fb_types();
                Some(fb.build_icmp(types, IntPred::Eq, expr, zero))
            }
            PrefixOp::BinNot => {
                let expr = self.gen_expr(operand).expect("bit-not of zero-sized value");
                let ty = self.llty(self.analysis.expr_type(operand.id));
                self.set_debug_location(node.pos);
                Some(self.fb().build_not(expr, ty))
            }
            PrefixOp::AddressOf | PrefixOp::ConstAddressOf => {
                let (target_ref, _) = self.gen_lvalue(node, operand);
                Some(target_ref)
            }
            PrefixOp::Dereference => {
                let expr = self
                    .gen_expr(operand)
                    .expect("dereference of zero-sized value");
                let ptr_type = self.analysis.expr_type(operand.id);
                let child = self.entry(ptr_type).pointer_info().child;
                let child_ll = self.llty(child);
                self.set_debug_location(node.pos);
                Some(self.fb().build_load(expr, child_ll))
            }
        }
    }

    // --- Calls ---

    fn gen_fn_call_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::FnCall {
            callee,
            args,
            is_builtin,
        } = &node.kind
        else {
            unreachable!()
        };

        if *is_builtin {
            return self.gen_builtin_fn_call_expr(node);
        }
        if self.analysis.call_casts.contains_key(&node.id) {
            return self.gen_cast_expr(node);
        }

        // method-style calls pass the aggregate base as the first argument;
        // calls on a type value construct an enum member
        let mut first_param_expr: Option<&AstNode> = None;
        if let NodeKind::FieldAccess { base, .. } = &callee.kind {
            let base_type = self.analysis.expr_type(base.id);
            match &self.entry(base_type).kind {
                TypeKind::MetaType => {
                    let enum_type = self.analysis.type_value(base.id);
                    let arg_node = match args.len() {
                        0 => None,
                        1 => Some(&args[0]),
                        _ => unreachable!("enum construction with multiple payloads"),
                    };
                    return self.gen_enum_value_expr(callee, enum_type, arg_node);
                }
                TypeKind::Struct(_) | TypeKind::Pointer(_) => {
                    first_param_expr = Some(base);
                }
                _ => unreachable!("call through a non-callable field access"),
            }
        }

        let fn_id = *self
            .analysis
            .call_fns
            .get(&node.id)
            .unwrap_or_else(|| panic!("call on node {} has no resolved function", node.id));
        let fn_entry = self.analysis.func(fn_id);
        let fn_type = fn_entry.ty;
        let fn_value = self.fn_values[fn_id.0 as usize];

        let info = self.entry(fn_type).fn_info().clone();
        let actual_param_count = args.len() + usize::from(first_param_expr.is_some());
        assert!(
            (info.is_var_args && actual_param_count >= info.src_param_count as usize)
                || actual_param_count == info.src_param_count as usize,
            "call arity mismatch on node {}",
            node.id
        );

        let mut gen_param_values = Vec::with_capacity(actual_param_count);
        if let Some(first) = first_param_expr {
            gen_param_values.push(self.gen_expr(first).expect("self argument has no value"));
        }
        for arg in args {
            let param_value = self.gen_expr(arg);
            let param_type = self.analysis.expr_type(arg.id);
            if info.is_var_args || self.entry(param_type).size_in_bits > 0 {
                gen_param_values.push(param_value.expect("nonzero-sized argument has no value"));
            }
        }

        self.set_debug_location(node.pos);
        let ret_entry = self.entry(info.return_type);
        let ret_ll = match ret_entry.kind {
            TypeKind::Void | TypeKind::Unreachable => self.module.types.void_type(),
            _ => ret_entry.llir_type(),
        };
        let result = self.fb().build_call(
            Callee::Func(fn_value),
            gen_param_values,
            ret_ll,
            info.conv,
        );

        let ret_type = self.entry(info.return_type);
        if ret_type.is_unreachable() {
            self.fb().build_unreachable();
            return None;
        }
        if matches!(ret_type.kind, TypeKind::Void) {
            return None;
        }
        Some(result)
    }

    fn gen_builtin_fn_call_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::FnCall { args, .. } = &node.kind else {
            unreachable!()
        };
        let builtin = *self
            .analysis
            .call_builtins
            .get(&node.id)
            .unwrap_or_else(|| panic!("builtin call on node {} is unresolved", node.id));

        match builtin {
            BuiltinFn::AddWithOverflow
            | BuiltinFn::SubWithOverflow
            | BuiltinFn::MulWithOverflow => {
                assert!(args.len() == 4);
                let int_type = self.analysis.type_value(args[0].id);
                let info = self.entry(int_type).int_info().clone();
                let fn_val = match builtin {
                    BuiltinFn::AddWithOverflow => info.add_with_overflow_fn,
                    BuiltinFn::SubWithOverflow => info.sub_with_overflow_fn,
                    BuiltinFn::MulWithOverflow => info.mul_with_overflow_fn,
                    _ => unreachable!(),
                };

                let op1 = self.gen_expr(&args[1]).expect("overflow operand");
                let op2 = self.gen_expr(&args[2]).expect("overflow operand");
                let ptr_result = self.gen_expr(&args[3]).expect("overflow result pointer");

                self.set_debug_location(node.pos);
                let int_ll = self.llty(int_type);
                let i1 = self.module.types.int_type(1);
                let pair_ty = self.module.types.struct_type(vec![int_ll, i1]);
                let result_struct = self.fb().build_call(
                    Callee::Func(fn_val),
                    vec![op1, op2],
                    pair_ty,
                    crate::llir::CallConv::C,
                );
                let result = self.fb().build_extract_value(result_struct, 0, int_ll);
                let overflow_bit = self.fb().build_extract_value(result_struct, 1, i1);
                self.fb().build_store(result, ptr_result);
                Some(overflow_bit)
            }
            BuiltinFn::Memcpy => {
                assert!(args.len() == 3);
                let dest_type = self.analysis.expr_type(args[0].id);
                let dest_ptr = self.gen_expr(&args[0]).expect("memcpy dest");
                let src_ptr = self.gen_expr(&args[1]).expect("memcpy src");
                let len_val = self.gen_expr(&args[2]).expect("memcpy len");

                self.set_debug_location(node.pos);
                let u8_ty = self.module.types.int_type(8);
                let ptr_u8 = self.module.types.ptr_type(u8_ty);
                let dest_casted = self.fb().build_bitcast(dest_ptr, ptr_u8);
                let src_casted = self.fb().build_bitcast(src_ptr, ptr_u8);

                let child = self.entry(dest_type).pointer_info().child;
                let align = self.entry(child).align_in_bits / 8;
                let align_val = self.const_i32(align);
                let volatile = Value::ConstInt {
                    ty: self.module.types.int_type(1),
                    value: 0,
                };
                let void = self.module.types.void_type();
                let memcpy_fn = self.types.memcpy_fn;
                self.fb().build_call(
                    Callee::Func(memcpy_fn),
                    vec![dest_casted, src_casted, len_val, align_val, volatile],
                    void,
                    crate::llir::CallConv::C,
                );
                None
            }
            BuiltinFn::Memset => {
                assert!(args.len() == 3);
                let dest_type = self.analysis.expr_type(args[0].id);
                let dest_ptr = self.gen_expr(&args[0]).expect("memset dest");
                let char_val = self.gen_expr(&args[1]).expect("memset fill byte");
                let len_val = self.gen_expr(&args[2]).expect("memset len");

                self.set_debug_location(node.pos);
                let u8_ty = self.module.types.int_type(8);
                let ptr_u8 = self.module.types.ptr_type(u8_ty);
                let dest_casted = self.fb().build_bitcast(dest_ptr, ptr_u8);

                let child = self.entry(dest_type).pointer_info().child;
                let align = self.entry(child).align_in_bits / 8;
                let align_val = self.const_i32(align);
                let volatile = Value::ConstInt {
                    ty: self.module.types.int_type(1),
                    value: 0,
                };
                let void = self.module.types.void_type();
                let memset_fn = self.types.memset_fn;
                self.fb().build_call(
                    Callee::Func(memset_fn),
                    vec![dest_casted, char_val, len_val, align_val, volatile],
                    void,
                    crate::llir::CallConv::C,
                );
                None
            }
            BuiltinFn::Sizeof => {
                assert!(args.len() == 1);
                let type_entry = self.analysis.type_value(args[0].id);
                let size = self.entry(type_entry).size_in_bits / 8;
                let result_type = self.analysis.expr(node.id).ty;
                Some(self.const_int(result_type, size))
            }
            BuiltinFn::MinValue => {
                assert!(args.len() == 1);
                let type_entry = self.analysis.type_value(args[0].id);
                let entry = self.entry(type_entry);
                match &entry.kind {
                    TypeKind::Int(info) => {
                        let value = if info.is_signed {
                            1u64 << (entry.size_in_bits - 1)
                        } else {
                            0
                        };
                        Some(self.const_int(type_entry, value))
                    }
                    other => unreachable!("min_value of {:?}", other),
                }
            }
            BuiltinFn::MaxValue => {
                assert!(args.len() == 1);
                let type_entry = self.analysis.type_value(args[0].id);
                let entry = self.entry(type_entry);
                match &entry.kind {
                    TypeKind::Int(info) => {
                        let value = if info.is_signed {
                            (1u64 << (entry.size_in_bits - 1)) - 1
                        } else {
                            self.all_ones(entry.size_in_bits)
                        };
                        Some(self.const_int(type_entry, value))
                    }
                    other => unreachable!("max_value of {:?}", other),
                }
            }
            BuiltinFn::MemberCount => {
                assert!(args.len() == 1);
                let type_entry = self.analysis.type_value(args[0].id);
                let count = self.entry(type_entry).enum_info().members.len() as u64;
                let result_type = self.analysis.expr(node.id).ty;
                Some(self.const_int(result_type, count))
            }
        }
    }
}

fn cmp_op_to_int_pred(op: BinOp, is_signed: bool) -> IntPred {
    match op {
        BinOp::CmpEq => IntPred::Eq,
        BinOp::CmpNotEq => IntPred::Ne,
        BinOp::CmpLessThan => {
            if is_signed {
                IntPred::Slt
            } else {
                IntPred::Ult
            }
        }
        BinOp::CmpGreaterThan => {
            if is_signed {
                IntPred::Sgt
            } else {
                IntPred::Ugt
            }
        }
        BinOp::CmpLessOrEq => {
            if is_signed {
                IntPred::Sle
            } else {
                IntPred::Ule
            }
        }
        BinOp::CmpGreaterOrEq => {
            if is_signed {
                IntPred::Sge
            } else {
                IntPred::Uge
            }
        }
        _ => unreachable!("{:?} is not a comparison", op),
    }
}

fn cmp_op_to_float_pred(op: BinOp) -> FloatPred {
    match op {
        BinOp::CmpEq => FloatPred::Oeq,
        BinOp::CmpNotEq => FloatPred::One,
        BinOp::CmpLessThan => FloatPred::Olt,
        BinOp::CmpGreaterThan => FloatPred::Ogt,
        BinOp::CmpLessOrEq => FloatPred::Ole,
        BinOp::CmpGreaterOrEq => FloatPred::Oge,
        _ => unreachable!("{:?} is not a comparison", op),
    }
}
