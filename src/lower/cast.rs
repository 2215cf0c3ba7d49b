use super::LowerCtx;
use crate::ast::{AstNode, BinOp, CastInfo, CastOp, NodeKind};
use crate::llir::Value;
use crate::types::{TypeId, TypeKind};

impl<'a> LowerCtx<'a> {
    /// Explicit cast call `T(expr)`.
    pub(crate) fn gen_cast_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::FnCall { args, .. } = &node.kind else {
            unreachable!()
        };
        let expr_node = &args[0];
        let expr_val = self.gen_expr(expr_node);
        let actual_type = self.analysis.expr_type(expr_node.id);
        let cast = self.analysis.call_casts[&node.id];
        self.gen_bare_cast(node, expr_val, actual_type, &cast)
    }

    pub(crate) fn gen_bare_cast(
        &mut self,
        node: &AstNode,
        expr_val: Option<Value>,
        actual_type: TypeId,
        cast: &CastInfo,
    ) -> Option<Value> {
        let wanted_type = cast.after_type;
        match cast.op {
            CastOp::Nothing => expr_val,

            CastOp::MaybeWrap => {
                let slot = cast.slot.expect("maybe wrap without a reserved temporary");
                let tmp_ptr = self.slot_ptr(slot);
                let child = match self.entry(wanted_type).kind {
                    TypeKind::Maybe(info) => info.child,
                    _ => panic!("maybe wrap to a non-maybe type on node {}", node.id),
                };

                self.set_debug_location(node.pos);
                let child_ll = self.llty(child);
                let val_ptr_ty = self.module.types.ptr_type(child_ll);
                let val_ptr = self.fb().build_struct_gep(tmp_ptr, 0, val_ptr_ty);
                let expr_val = expr_val.expect("wrapped value is zero-sized");
                self.gen_assign_raw(node, BinOp::Assign, val_ptr, expr_val, child, actual_type);

                self.set_debug_location(node.pos);
                let i1 = self.module.types.int_type(1);
                let present_ptr_ty = self.module.types.ptr_type(i1);
                let present_ptr = self.fb().build_struct_gep(tmp_ptr, 1, present_ptr_ty);
                let all_ones = Value::ConstInt { ty: i1, value: 1 };
                self.fb().build_store(all_ones, present_ptr);

                Some(tmp_ptr)
            }

            CastOp::PtrToInt => {
                self.set_debug_location(node.pos);
                let wanted_ll = self.llty(wanted_type);
                let expr_val = expr_val.expect("pointer cast of zero-sized value");
                Some(self.fb().build_ptr_to_int(expr_val, wanted_ll))
            }

            CastOp::PointerReinterpret => {
                self.set_debug_location(node.pos);
                let wanted_ll = self.llty(wanted_type);
                let expr_val = expr_val.expect("pointer cast of zero-sized value");
                Some(self.fb().build_bitcast(expr_val, wanted_ll))
            }

            CastOp::IntWidenOrShorten => {
                let actual_bits = self.entry(actual_type).size_in_bits;
                let wanted_bits = self.entry(wanted_type).size_in_bits;
                let expr_val = expr_val.expect("integer cast of zero-sized value");
                if actual_bits == wanted_bits {
                    Some(expr_val)
                } else if actual_bits < wanted_bits {
                    let wanted_ll = self.llty(wanted_type);
                    self.set_debug_location(node.pos);
                    if self.entry(actual_type).is_signed_int() {
                        Some(self.fb().build_sext(expr_val, wanted_ll))
                    } else {
                        Some(self.fb().build_zext(expr_val, wanted_ll))
                    }
                } else {
                    let wanted_ll = self.llty(wanted_type);
                    self.set_debug_location(node.pos);
                    Some(self.fb().build_trunc(expr_val, wanted_ll))
                }
            }

            CastOp::ToUnknownSizeArray => {
                let slot = cast.slot.expect("slice cast without a reserved temporary");
                let tmp_ptr = self.slot_ptr(slot);
                let wanted_entry = self.entry(wanted_type);
                assert!(wanted_entry.is_slice());
                let pointer_type = wanted_entry.struct_info().fields[0].ty;
                let array_len = self.entry(actual_type).array_info().len;

                self.set_debug_location(node.pos);
                let ptr_ll = self.llty(pointer_type);
                let ptr_ptr_ty = self.module.types.ptr_type(ptr_ll);
                let ptr_ptr = self.fb().build_struct_gep(tmp_ptr, 0, ptr_ptr_ty);
                let expr_val = expr_val.expect("slice of zero-sized array value");
                let expr_bitcast = self.fb().build_bitcast(expr_val, ptr_ll);
                self.fb().build_store(expr_bitcast, ptr_ptr);

                let isize_ll = self.llty(self.types.builtin.isize_type);
                let len_ptr_ty = self.module.types.ptr_type(isize_ll);
                let len_ptr = self.fb().build_struct_gep(tmp_ptr, 1, len_ptr_ty);
                let len_val = self.const_isize(array_len);
                self.fb().build_store(len_val, len_ptr);

                Some(tmp_ptr)
            }
        }
    }
}
