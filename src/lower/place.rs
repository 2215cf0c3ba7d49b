use super::LowerCtx;
use crate::ast::{AstNode, BinOp, FieldResolution, NodeKind, PrefixOp, SymbolRef};
use crate::llir::{Callee, CallConv, Value};
use crate::types::{TypeId, TypeKind};

impl<'a> LowerCtx<'a> {
    /// Pointer to the storage an assignable expression names, plus the
    /// stored type. Defined for symbols, field access, array access, and
    /// prefix dereference; anything else was rejected upstream.
    pub(crate) fn gen_lvalue(&mut self, expr_node: &AstNode, node: &AstNode) -> (Value, TypeId) {
        match &node.kind {
            NodeKind::Symbol { .. } => {
                let Some(SymbolRef::Var(var_id)) = self.analysis.symbol_refs.get(&node.id) else {
                    panic!("assignment target on node {} is not a variable", node.id)
                };
                let var = self.analysis.var(*var_id);
                assert!(!var.is_const, "assignment to constant '{}'", var.name);
                (self.var_storage(*var_id), var.ty)
            }
            NodeKind::ArrayAccess { array, .. } => {
                let array_type = self.analysis.expr_type(array.id);
                let entry = self.entry(array_type);
                let child = match &entry.kind {
                    TypeKind::Array(info) => info.child,
                    TypeKind::Pointer(info) => info.child,
                    TypeKind::Struct(info) if info.is_slice => {
                        let ptr_field = info.fields[0].ty;
                        self.entry(ptr_field).pointer_info().child
                    }
                    other => unreachable!("indexing a non-array type {:?}", other),
                };
                let ptr = self
                    .gen_array_ptr(node)
                    .expect("element pointer of zero-sized array");
                (ptr, child)
            }
            NodeKind::FieldAccess { .. } => self.gen_field_ptr(node),
            NodeKind::PrefixOp { op, operand } => {
                assert!(
                    *op == PrefixOp::Dereference,
                    "bad assignment target on node {}",
                    node.id
                );
                let target_type = self.analysis.expr_type(operand.id);
                let child = self.entry(target_type).pointer_info().child;
                let ptr = self
                    .gen_expr(operand)
                    .expect("dereference of zero-sized value");
                (ptr, child)
            }
            other => panic!(
                "bad assignment target {:?} on node {}",
                other, expr_node.id
            ),
        }
    }

    /// Address of a struct field, by generation index. A pointer base is
    /// dereferenced once.
    pub(crate) fn gen_field_ptr(&mut self, node: &AstNode) -> (Value, TypeId) {
        let NodeKind::FieldAccess { base, .. } = &node.kind else {
            unreachable!()
        };

        let struct_ptr = match &base.kind {
            NodeKind::Symbol { .. } => {
                let Some(SymbolRef::Var(var_id)) = self.analysis.symbol_refs.get(&base.id) else {
                    panic!("field access base on node {} is unresolved", base.id)
                };
                let var = self.analysis.var(*var_id);
                let state = self.var_state(*var_id);
                let storage = self.var_storage(*var_id);
                if state.is_ptr && matches!(self.entry(var.ty).kind, TypeKind::Pointer(_)) {
                    self.set_debug_location(node.pos);
                    let ll = self.llty(var.ty);
                    self.fb().build_load(storage, ll)
                } else {
                    storage
                }
            }
            NodeKind::FieldAccess { .. } => {
                let ptr = self
                    .gen_field_access_expr(base, true)
                    .expect("field access base has no value");
                let field_type = self.analysis.expr_type(base.id);
                if matches!(self.entry(field_type).kind, TypeKind::Pointer(_)) {
                    // double pointer, dereference once
                    self.set_debug_location(node.pos);
                    let ll = self.llty(field_type);
                    self.fb().build_load(ptr, ll)
                } else {
                    ptr
                }
            }
            _ => self.gen_expr(base).expect("field access base has no value"),
        };

        let Some(FieldResolution::StructField { ty, gen_index }) =
            self.analysis.fields.get(&node.id)
        else {
            panic!("field access on node {} is unresolved", node.id)
        };

        self.set_debug_location(node.pos);
        let field_ll = self.llty(*ty);
        let result_ty = self.module.types.ptr_type(field_ll);
        let ptr = self.fb().build_struct_gep(struct_ptr, *gen_index, result_ty);
        (ptr, *ty)
    }

    /// Base pointer an indexing expression works from.
    pub(crate) fn gen_array_base_ptr(&mut self, node: &AstNode) -> Option<Value> {
        let type_entry = self.analysis.expr_type(node.id);

        if matches!(node.kind, NodeKind::FieldAccess { .. }) {
            let array_ptr = self.gen_field_access_expr(node, true);
            if matches!(self.entry(type_entry).kind, TypeKind::Pointer(_)) {
                // double pointer, dereference once
                let array_ptr = array_ptr.expect("pointer field has no value");
                self.set_debug_location(node.pos);
                let ll = self.llty(type_entry);
                return Some(self.fb().build_load(array_ptr, ll));
            }
            array_ptr
        } else {
            self.gen_expr(node)
        }
    }

    /// Element pointer for the three array forms: in-place arrays use a
    /// two-index GEP with a leading zero, raw pointers a single index, and
    /// slices load their `ptr` field first.
    pub(crate) fn gen_array_elem_ptr(
        &mut self,
        source_node: &AstNode,
        array_ptr: Option<Value>,
        array_type: TypeId,
        subscript: Value,
    ) -> Option<Value> {
        if self.entry(array_type).size_in_bits == 0 {
            return None;
        }
        let array_ptr = array_ptr.expect("array base has no value");

        match &self.entry(array_type).kind {
            TypeKind::Array(info) => {
                let child = info.child;
                let zero = self.const_isize(0);
                self.set_debug_location(source_node.pos);
                let child_ll = self.llty(child);
                let result_ty = self.module.types.ptr_type(child_ll);
                Some(
                    self.fb()
                        .build_inbounds_gep(array_ptr, vec![zero, subscript], result_ty),
                )
            }
            TypeKind::Pointer(info) => {
                let child = info.child;
                self.set_debug_location(source_node.pos);
                let child_ll = self.llty(child);
                let result_ty = self.module.types.ptr_type(child_ll);
                Some(
                    self.fb()
                        .build_inbounds_gep(array_ptr, vec![subscript], result_ty),
                )
            }
            TypeKind::Struct(info) => {
                assert!(info.is_slice, "indexing a plain struct");
                let ptr_field = info.fields[0].ty;
                let child = self.entry(ptr_field).pointer_info().child;
                self.set_debug_location(source_node.pos);
                let ptr_field_ll = self.llty(ptr_field);
                let ptr_ptr_ty = self.module.types.ptr_type(ptr_field_ll);
                let ptr_ptr = self.fb().build_struct_gep(array_ptr, 0, ptr_ptr_ty);
                let ptr = self.fb().build_load(ptr_ptr, ptr_field_ll);
                let child_ll = self.llty(child);
                let result_ty = self.module.types.ptr_type(child_ll);
                Some(
                    self.fb()
                        .build_inbounds_gep(ptr, vec![subscript], result_ty),
                )
            }
            other => unreachable!("indexing a non-array type {:?}", other),
        }
    }

    pub(crate) fn gen_array_ptr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::ArrayAccess { array, subscript } = &node.kind else {
            unreachable!()
        };
        let array_type = self.analysis.expr_type(array.id);
        let array_ptr = self.gen_array_base_ptr(array);
        let subscript_value = self.gen_expr(subscript).expect("subscript has no value");
        self.gen_array_elem_ptr(node, array_ptr, array_type, subscript_value)
    }

    pub(crate) fn gen_array_access_expr(&mut self, node: &AstNode, is_lvalue: bool) -> Option<Value> {
        let NodeKind::ArrayAccess { array, .. } = &node.kind else {
            unreachable!()
        };
        let ptr = self.gen_array_ptr(node);
        let array_type = self.analysis.expr_type(array.id);
        let child_type = match &self.entry(array_type).kind {
            TypeKind::Pointer(info) => info.child,
            TypeKind::Struct(info) => {
                assert!(info.is_slice);
                self.entry(info.fields[0].ty).pointer_info().child
            }
            TypeKind::Array(info) => info.child,
            other => unreachable!("indexing a non-array type {:?}", other),
        };

        match ptr {
            Some(ptr) if !is_lvalue && !self.types.handle_is_ptr(child_type) => {
                self.set_debug_location(node.pos);
                let ll = self.llty(child_type);
                Some(self.fb().build_load(ptr, ll))
            }
            other => other,
        }
    }

    pub(crate) fn gen_field_access_expr(
        &mut self,
        node: &AstNode,
        is_lvalue: bool,
    ) -> Option<Value> {
        let NodeKind::FieldAccess { base, field } = &node.kind else {
            unreachable!()
        };
        let struct_type = self.analysis.expr_type(base.id);

        match &self.entry(struct_type).kind {
            TypeKind::Array(info) => {
                let (child, len) = (info.child, info.len);
                if field == "len" {
                    Some(self.const_isize(len))
                } else if field == "ptr" {
                    let array_val = self.gen_expr(base).expect("array base has no value");
                    let zero = self.const_isize(0);
                    self.set_debug_location(node.pos);
                    let child_ll = self.llty(child);
                    let result_ty = self.module.types.ptr_type(child_ll);
                    Some(
                        self.fb()
                            .build_inbounds_gep(array_val, vec![zero, zero], result_ty),
                    )
                } else {
                    panic!("bad array field '{}' on node {}", field, node.id)
                }
            }
            TypeKind::Struct(_) | TypeKind::Pointer(_) => {
                let (ptr, field_type) = self.gen_field_ptr(node);
                if is_lvalue || self.types.handle_is_ptr(field_type) {
                    Some(ptr)
                } else {
                    self.set_debug_location(node.pos);
                    let ll = self.llty(field_type);
                    Some(self.fb().build_load(ptr, ll))
                }
            }
            TypeKind::MetaType => {
                assert!(!is_lvalue);
                let enum_type = self.analysis.type_value(base.id);
                self.gen_enum_value_expr(node, enum_type, None)
            }
            other => unreachable!("field access on {:?}", other),
        }
    }

    /// Copy an aggregate value: byte count and alignment come from the
    /// type's layout.
    pub(crate) fn gen_struct_memcpy(
        &mut self,
        source_node: &AstNode,
        src: Value,
        dest: Value,
        type_entry: TypeId,
    ) -> Value {
        assert!(self.types.handle_is_ptr(type_entry));

        self.set_debug_location(source_node.pos);
        let u8_ty = self.module.types.int_type(8);
        let ptr_u8 = self.module.types.ptr_type(u8_ty);
        let src_ptr = self.fb().build_bitcast(src, ptr_u8);
        let dest_ptr = self.fb().build_bitcast(dest, ptr_u8);

        let entry = self.entry(type_entry);
        let byte_count = entry.size_in_bits / 8;
        let align = entry.align_in_bits / 8;
        let len = self.const_isize(byte_count);
        let align_val = self.const_i32(align);
        let volatile = Value::ConstInt {
            ty: self.module.types.int_type(1),
            value: 0,
        };
        let void = self.module.types.void_type();
        let memcpy_fn = self.types.memcpy_fn;
        self.fb().build_call(
            Callee::Func(memcpy_fn),
            vec![dest_ptr, src_ptr, len, align_val, volatile],
            void,
            CallConv::C,
        )
    }

    /// Store `value` through `target_ref`: aggregates memcpy, scalars
    /// store. Compound assignments load, apply the op, and store back.
    pub(crate) fn gen_assign_raw(
        &mut self,
        source_node: &AstNode,
        bin_op: BinOp,
        target_ref: Value,
        value: Value,
        op1_type: TypeId,
        op2_type: TypeId,
    ) -> Option<Value> {
        if self.types.handle_is_ptr(op1_type) {
            assert!(op1_type == op2_type, "aggregate assignment type mismatch");
            assert!(bin_op == BinOp::Assign);
            return Some(self.gen_struct_memcpy(source_node, value, target_ref, op1_type));
        }

        let mut value = value;
        if bin_op != BinOp::Assign {
            let op = bin_op
                .assign_op()
                .unwrap_or_else(|| panic!("operator {:?} is not an assignment", bin_op));
            let NodeKind::BinOp { lhs, .. } = &source_node.kind else {
                unreachable!()
            };
            self.set_debug_location(lhs.pos);
            let ll = self.llty(op1_type);
            let left_value = self.fb().build_load(target_ref, ll);
            value = self.gen_arithmetic_bin_op(source_node, left_value, value, op1_type, op2_type, op);
        }

        self.set_debug_location(source_node.pos);
        self.fb().build_store(value, target_ref);
        None
    }

    pub(crate) fn gen_assign_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::BinOp { op, lhs, rhs } = &node.kind else {
            unreachable!()
        };

        let (target_ref, op1_type) = self.gen_lvalue(node, lhs);
        let op2_type = self.analysis.expr_type(rhs.id);
        let value = self.gen_expr(rhs);

        if self.entry(op1_type).size_in_bits == 0 {
            return None;
        }
        let value = value.expect("assigned value is zero-sized");
        self.gen_assign_raw(node, *op, target_ref, value, op1_type, op2_type)
    }
}
