use super::LowerCtx;
use crate::ast::{AsmExpr, AsmToken, AsmTokenKind, AstNode, NodeKind, SymbolRef};
use crate::llir::{Callee, CallConv, InlineAsm, LlirType, Value};

impl<'a> LowerCtx<'a> {
    /// Inline assembly: rewrite the template into positional operand
    /// references and synthesize the constraint string from outputs,
    /// inputs, and clobbers.
    pub(crate) fn gen_asm_expr(&mut self, node: &AstNode) -> Option<Value> {
        let NodeKind::Asm(asm_expr) = &node.kind else {
            unreachable!()
        };

        let mut template = String::new();
        for token in &asm_expr.tokens {
            match token.kind {
                AsmTokenKind::Template => {
                    for c in asm_expr.template[token.start..token.end].chars() {
                        if c == '$' {
                            template.push_str("$$");
                        } else {
                            template.push(c);
                        }
                    }
                }
                AsmTokenKind::Percent => template.push('%'),
                AsmTokenKind::Var => {
                    let index = find_asm_operand_index(asm_expr, token)
                        .expect("assembly template names an unknown operand");
                    template.push_str(&format!("${}", index));
                }
            }
        }

        assert!(asm_expr.return_count <= 1, "at most one assembly output value");

        let total_constraint_count =
            asm_expr.outputs.len() + asm_expr.inputs.len() + asm_expr.clobbers.len();
        let input_and_output_count =
            asm_expr.outputs.len() + asm_expr.inputs.len() - asm_expr.return_count as usize;

        let mut constraints = String::new();
        let mut total_index = 0usize;
        let mut param_types = Vec::with_capacity(input_and_output_count);
        let mut param_values = Vec::with_capacity(input_and_output_count);

        for output in &asm_expr.outputs {
            assert!(
                output.constraint.starts_with('='),
                "output constraints begin with '='"
            );
            if output.is_return {
                constraints.push_str(&format!("={}", &output.constraint[1..]));
            } else {
                constraints.push_str(&format!("=*{}", &output.constraint[1..]));
            }
            total_index += 1;
            if total_index < total_constraint_count {
                constraints.push(',');
            }

            if !output.is_return {
                let var_id = self
                    .lookup_asm_output_var(node, &output.variable_name)
                    .unwrap_or_else(|| {
                        panic!("assembly output variable '{}' is unbound", output.variable_name)
                    });
                let storage = self.var_storage(var_id);
                let storage_ty = match storage {
                    Value::Inst(_) | Value::Global(_) => {
                        let var_ll = self.llty(self.analysis.var(var_id).ty);
                        self.module.types.ptr_type(var_ll)
                    }
                    _ => panic!("assembly output variable has no storage address"),
                };
                param_types.push(storage_ty);
                param_values.push(storage);
            }
        }

        for input in &asm_expr.inputs {
            constraints.push_str(&input.constraint);
            total_index += 1;
            if total_index < total_constraint_count {
                constraints.push(',');
            }

            let expr_type = self.analysis.expr_type(input.expr.id);
            param_types.push(self.llty(expr_type));
            param_values.push(
                self.gen_expr(&input.expr)
                    .expect("assembly input has no value"),
            );
        }

        for clobber in &asm_expr.clobbers {
            constraints.push_str(&format!("~{{{}}}", clobber));
            total_index += 1;
            if total_index < total_constraint_count {
                constraints.push(',');
            }
        }

        let ret_ty = if asm_expr.return_count == 0 {
            self.module.types.void_type()
        } else {
            self.llty(self.analysis.expr(node.id).ty)
        };
        let fn_ty = self.module.types.fn_type(param_types, ret_ty, false);

        let is_volatile = asm_expr.is_volatile || asm_expr.outputs.is_empty();
        let asm_id = self.module.add_inline_asm(InlineAsm {
            fn_ty,
            template,
            constraints,
            is_volatile,
        });

        self.set_debug_location(node.pos);
        let result = self
            .fb()
            .build_call(Callee::Asm(asm_id), param_values, ret_ty, CallConv::C);
        if matches!(self.module.types.get(ret_ty), LlirType::Void) {
            None
        } else {
            Some(result)
        }
    }

    /// Assembly outputs name variables in the enclosing scope; the
    /// analyzer recorded the binding on the surrounding expression's
    /// context, so resolve by walking the visible variables.
    fn lookup_asm_output_var(&self, node: &AstNode, name: &str) -> Option<crate::ast::VarId> {
        if let Some(SymbolRef::Var(var)) = self.analysis.symbol_refs.get(&node.id) {
            if self.analysis.var(*var).name == name {
                return Some(*var);
            }
        }
        let mut ctx = Some(self.analysis.expr(node.id).block_ctx);
        while let Some(ctx_id) = ctx {
            let block_ctx = self.analysis.block_ctx(ctx_id);
            for var in &block_ctx.vars {
                if self.analysis.var(*var).name == name {
                    return Some(*var);
                }
            }
            ctx = block_ctx.parent;
        }
        None
    }
}

/// Positional operand index of a `%[name]` template reference: outputs
/// first, then inputs.
fn find_asm_operand_index(asm_expr: &AsmExpr, token: &AsmToken) -> Option<usize> {
    let name = &asm_expr.template[token.start + 2..token.end];
    let name = name.trim_end_matches(']');
    let mut result = 0usize;
    for output in &asm_expr.outputs {
        if output.symbolic_name == name {
            return Some(result);
        }
        result += 1;
    }
    for input in &asm_expr.inputs {
        if input.symbolic_name == name {
            return Some(result);
        }
        result += 1;
    }
    None
}
