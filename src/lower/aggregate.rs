use super::LowerCtx;
use crate::ast::{AstNode, BinOp, ContainerInitKind, FieldResolution, NodeKind};
use crate::llir::Value;
use crate::types::{TypeId, TypeKind};

impl<'a> LowerCtx<'a> {
    fn resolved_slot_ptr(&self, node: &AstNode) -> Value {
        let slot = self
            .analysis
            .value_slots
            .get(&node.id)
            .unwrap_or_else(|| panic!("node {} has no aggregate temporary", node.id));
        self.slot_ptr(*slot)
    }

    /// `null` materializes a maybe with the present bit cleared.
    pub(crate) fn gen_null_literal(&mut self, node: &AstNode) -> Option<Value> {
        let type_entry = self.analysis.expr(node.id).ty;
        assert!(
            matches!(self.entry(type_entry).kind, TypeKind::Maybe(_)),
            "null literal of non-maybe type on node {}",
            node.id
        );

        let tmp_ptr = self.resolved_slot_ptr(node);
        self.set_debug_location(node.pos);
        let i1 = self.module.types.int_type(1);
        let present_ptr_ty = self.module.types.ptr_type(i1);
        let present_ptr = self.fb().build_struct_gep(tmp_ptr, 1, present_ptr_ty);
        let null_value = Value::ConstInt { ty: i1, value: 0 };
        self.fb().build_store(null_value, present_ptr);

        Some(tmp_ptr)
    }

    /// Struct and array initializers fill a prologue-reserved temporary
    /// slot by slot.
    pub(crate) fn gen_container_init_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::ContainerInit { kind, entries } = &node.kind else {
            unreachable!()
        };
        let type_entry = self.analysis.expr(node.id).ty;

        match &self.entry(type_entry).kind {
            TypeKind::Struct(info) => {
                assert!(*kind == ContainerInitKind::Struct);
                assert!(
                    info.fields.len() == entries.len(),
                    "struct initializer field count mismatch on node {}",
                    node.id
                );
                let tmp_struct_ptr = self.resolved_slot_ptr(node);

                for field_node in entries {
                    let NodeKind::StructValueField { value, .. } = &field_node.kind else {
                        unreachable!("struct initializer entry is not a field")
                    };
                    let init = self.analysis.init_fields[&field_node.id];
                    let Some(gen_index) = init.gen_index else {
                        // zero-sized field
                        continue;
                    };

                    self.set_debug_location(field_node.pos);
                    let field_ll = self.llty(init.ty);
                    let field_ptr_ty = self.module.types.ptr_type(field_ll);
                    let field_ptr =
                        self.fb()
                            .build_struct_gep(tmp_struct_ptr, gen_index, field_ptr_ty);
                    let value_val = self.gen_expr(value).expect("field value is zero-sized");
                    let value_type = self.analysis.expr_type(value.id);
                    self.gen_assign_raw(
                        field_node,
                        BinOp::Assign,
                        field_ptr,
                        value_val,
                        init.ty,
                        value_type,
                    );
                }

                Some(tmp_struct_ptr)
            }
            TypeKind::Unreachable => {
                assert!(entries.is_empty());
                self.set_debug_location(node.pos);
                self.fb().build_unreachable();
                None
            }
            TypeKind::Void => {
                assert!(entries.is_empty());
                None
            }
            TypeKind::Array(info) => {
                let (child_type, len) = (info.child, info.len);
                assert!(len == entries.len() as u64);
                let tmp_array_ptr = self.resolved_slot_ptr(node);

                for (i, field_node) in entries.iter().enumerate() {
                    let elem_val = self.gen_expr(field_node).expect("element is zero-sized");
                    let zero = self.const_isize(0);
                    let index = self.const_isize(i as u64);
                    self.set_debug_location(field_node.pos);
                    let child_ll = self.llty(child_type);
                    let elem_ptr_ty = self.module.types.ptr_type(child_ll);
                    let elem_ptr =
                        self.fb()
                            .build_inbounds_gep(tmp_array_ptr, vec![zero, index], elem_ptr_ty);
                    let value_type = self.analysis.expr_type(field_node.id);
                    self.gen_assign_raw(
                        field_node,
                        BinOp::Assign,
                        elem_ptr,
                        elem_val,
                        child_type,
                        value_type,
                    );
                }

                Some(tmp_array_ptr)
            }
            other => unreachable!("container initializer of {:?}", other),
        }
    }

    /// `Enum.Member(payload)`: store the tag, then the payload through the
    /// union field reinterpreted as the member's type. Payload-free enums
    /// are just their tag value.
    pub(crate) fn gen_enum_value_expr(
        &mut self,
        node: &AstNode,
        enum_type: TypeId,
        arg_node: Option<&AstNode>,
    ) -> Option<Value> {
        let Some(FieldResolution::EnumMember { value, .. }) = self.analysis.fields.get(&node.id)
        else {
            panic!("enum member on node {} is unresolved", node.id)
        };
        let value = *value;

        let info = self.entry(enum_type).enum_info();
        let tag_type = info.tag_type;
        let gen_field_count = info.gen_field_count;
        let tag_value = self.const_int(tag_type, value);

        if gen_field_count == 0 {
            return Some(tag_value);
        }

        let tmp_struct_ptr = self.resolved_slot_ptr(node);

        self.set_debug_location(node.pos);
        let tag_ll = self.llty(tag_type);
        let tag_ptr_ty = self.module.types.ptr_type(tag_ll);
        let tag_field_ptr = self.fb().build_struct_gep(tmp_struct_ptr, 0, tag_ptr_ty);
        self.fb().build_store(tag_value, tag_field_ptr);

        if let Some(arg_node) = arg_node {
            let union_val_type = self.analysis.expr_type(arg_node.id);
            if !matches!(self.entry(union_val_type).kind, TypeKind::Void) {
                let new_union_val = self.gen_expr(arg_node).expect("payload is zero-sized");
                let payload_ll = self.llty(union_val_type);
                let payload_ptr_ty = self.module.types.ptr_type(payload_ll);
                let enum_ll = self.entry(enum_type).llir_type();
                let union_ll = match self.module.types.get(enum_ll) {
                    crate::llir::LlirType::Struct { fields, .. } => fields[1],
                    other => unreachable!("tagged union lowered to {:?}", other),
                };
                let union_ptr_ty = self.module.types.ptr_type(union_ll);
                let union_field_ptr = self.fb().build_struct_gep(tmp_struct_ptr, 1, union_ptr_ty);
                let casted = self.fb().build_bitcast(union_field_ptr, payload_ptr_ty);
                self.gen_assign_raw(
                    arg_node,
                    BinOp::Assign,
                    casted,
                    new_union_val,
                    union_val_type,
                    union_val_type,
                );
            }
        }

        Some(tmp_struct_ptr)
    }

    /// `a[start..end]` builds a slice descriptor in a reserved temporary.
    pub(crate) fn gen_slice_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::SliceExpr {
            array, start, end, ..
        } = &node.kind
        else {
            unreachable!()
        };
        let array_type = self.analysis.expr_type(array.id);
        let tmp_struct_ptr = self.resolved_slot_ptr(node);
        let array_ptr = self.gen_array_base_ptr(array);

        let isize_ll = self.llty(self.types.builtin.isize_type);

        match &self.entry(array_type).kind {
            TypeKind::Array(info) => {
                let (child, array_len) = (info.child, info.len);
                let start_val = self.gen_expr(start).expect("slice start has no value");
                let end_val = match end {
                    Some(end) => self.gen_expr(end).expect("slice end has no value"),
                    None => self.const_isize(array_len),
                };

                self.set_debug_location(node.pos);
                let child_ll = self.llty(child);
                let elem_ptr_ty = self.module.types.ptr_type(child_ll);
                let ptr_field_ptr_ty = self.module.types.ptr_type(elem_ptr_ty);
                let ptr_field_ptr = self
                    .fb()
                    .build_struct_gep(tmp_struct_ptr, 0, ptr_field_ptr_ty);
                let zero = self.const_isize(0);
                let array_ptr = array_ptr.expect("sliced array has no value");
                let slice_start_ptr =
                    self.fb()
                        .build_inbounds_gep(array_ptr, vec![zero, start_val], elem_ptr_ty);
                self.fb().build_store(slice_start_ptr, ptr_field_ptr);

                self.store_slice_len(tmp_struct_ptr, end_val, start_val, isize_ll);
                Some(tmp_struct_ptr)
            }
            TypeKind::Pointer(info) => {
                let child = info.child;
                let start_val = self.gen_expr(start).expect("slice start has no value");
                let end_val = self
                    .gen_expr(end.as_ref().expect("pointer slices require an end"))
                    .expect("slice end has no value");

                self.set_debug_location(node.pos);
                let child_ll = self.llty(child);
                let elem_ptr_ty = self.module.types.ptr_type(child_ll);
                let ptr_field_ptr_ty = self.module.types.ptr_type(elem_ptr_ty);
                let ptr_field_ptr = self
                    .fb()
                    .build_struct_gep(tmp_struct_ptr, 0, ptr_field_ptr_ty);
                let array_ptr = array_ptr.expect("sliced pointer has no value");
                let slice_start_ptr =
                    self.fb()
                        .build_inbounds_gep(array_ptr, vec![start_val], elem_ptr_ty);
                self.fb().build_store(slice_start_ptr, ptr_field_ptr);

                self.store_slice_len(tmp_struct_ptr, end_val, start_val, isize_ll);
                Some(tmp_struct_ptr)
            }
            TypeKind::Struct(info) => {
                assert!(info.is_slice, "slicing a plain struct");
                let ptr_field = info.fields[0].ty;
                let child = self.entry(ptr_field).pointer_info().child;
                let array_ptr = array_ptr.expect("sliced slice has no value");

                let start_val = self.gen_expr(start).expect("slice start has no value");
                let end_val = match end {
                    Some(end) => self.gen_expr(end).expect("slice end has no value"),
                    None => {
                        self.set_debug_location(node.pos);
                        let len_ptr_ty = self.module.types.ptr_type(isize_ll);
                        let src_len_ptr = self.fb().build_struct_gep(array_ptr, 1, len_ptr_ty);
                        self.fb().build_load(src_len_ptr, isize_ll)
                    }
                };

                self.set_debug_location(node.pos);
                let child_ll = self.llty(child);
                let elem_ptr_ty = self.module.types.ptr_type(child_ll);
                let ptr_field_ptr_ty = self.module.types.ptr_type(elem_ptr_ty);
                let src_ptr_ptr = self.fb().build_struct_gep(array_ptr, 0, ptr_field_ptr_ty);
                let src_ptr = self.fb().build_load(src_ptr_ptr, elem_ptr_ty);
                let ptr_field_ptr = self
                    .fb()
                    .build_struct_gep(tmp_struct_ptr, 0, ptr_field_ptr_ty);
                let slice_start_ptr =
                    self.fb()
                        .build_inbounds_gep(src_ptr, vec![start_val], elem_ptr_ty);
                self.fb().build_store(slice_start_ptr, ptr_field_ptr);

                self.store_slice_len(tmp_struct_ptr, end_val, start_val, isize_ll);
                Some(tmp_struct_ptr)
            }
            other => unreachable!("slicing {:?}", other),
        }
    }

    fn store_slice_len(
        &mut self,
        tmp_struct_ptr: Value,
        end_val: Value,
        start_val: Value,
        isize_ll: crate::llir::LlirTypeId,
    ) {
        let len_ptr_ty = self.module.types.ptr_type(isize_ll);
        let len_field_ptr = self.fb().build_struct_gep(tmp_struct_ptr, 1, len_ptr_ty);
        let len_value = self
            .fb()
            .build_bin(crate::llir::BinOp::Sub, end_val, start_val, isize_ll);
        self.fb().build_store(len_value, len_field_ptr);
    }
}
