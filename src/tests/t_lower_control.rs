use super::fixture::{block, block_insts, count_matching, func, FnFixture, Program};
use crate::ast::{BinOp, CastInfo, CastOp, NodeKind, VarDeclNode, WhileInfo};
use crate::llir::{BinOp as LlBinOp, Inst, IntPred, Terminator, Value};

fn branch_targets(function: &crate::llir::LlirFunction) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for block in function.blocks.values() {
        if let Some(term) = &block.term {
            match term.term {
                Terminator::Br { target } => {
                    edges.push((block.name.clone(), function.block(target).name.clone()));
                }
                Terminator::CondBr {
                    then_block,
                    else_block,
                    ..
                } => {
                    edges.push((block.name.clone(), function.block(then_block).name.clone()));
                    edges.push((block.name.clone(), function.block(else_block).name.clone()));
                }
                _ => {}
            }
        }
    }
    edges
}

#[test]
fn if_else_value_joins_with_a_phi() {
    let mut p = Program::new();
    let i32_ty = p.types.int_type(true, 32);
    let bool_ty = p.types.builtin.bool_type;

    let mut f = FnFixture::new(&mut p, "pick", &[("c", bool_ty)], i32_ty);
    let c = f.params[0];
    let cond = f.sym(c);
    let then_val = f.num_i(1, i32_ty);
    let else_val = f.num_i(2, i32_ty);
    let if_expr = f.if_bool(cond, then_val, Some(else_val), i32_ty);
    let ret = f.ret(Some(if_expr));
    let unreachable_ty = f.p.types.builtin.unreachable_type;
    let body = f.block_typed(f.body_ctx, vec![ret], unreachable_ty);
    f.finish(body, unreachable_ty);

    let module = p.lower();
    let function = func(&module, "pick");

    let phis = block_insts(function, "EndIf")
        .into_iter()
        .filter(|i| matches!(i, Inst::Phi { .. }))
        .count();
    assert_eq!(phis, 1);
    let edges = branch_targets(function);
    assert!(edges.contains(&("Then".to_string(), "EndIf".to_string())));
    assert!(edges.contains(&("Else".to_string(), "EndIf".to_string())));
}

#[test]
fn unreachable_then_arm_joins_only_from_else() {
    let mut p = Program::new();
    let i32_ty = p.types.int_type(true, 32);
    let bool_ty = p.types.builtin.bool_type;
    let unreachable_ty = p.types.builtin.unreachable_type;

    let mut f = FnFixture::new(&mut p, "pick", &[("c", bool_ty)], i32_ty);
    let c = f.params[0];
    let cond = f.sym(c);
    // then-arm returns early, so its type is unreachable
    let one = f.num_i(1, i32_ty);
    let early = f.ret(Some(one));
    let then_arm = f.block_typed(f.body_ctx, vec![early], unreachable_ty);
    let else_val = f.num_i(2, i32_ty);
    let if_expr = f.if_bool(cond, then_arm, Some(else_val), i32_ty);
    let ret = f.ret(Some(if_expr));
    let body = f.block_typed(f.body_ctx, vec![ret], unreachable_ty);
    f.finish(body, unreachable_ty);

    let module = p.lower();
    let function = func(&module, "pick");

    // the only edge into the join comes from the else path
    let edges = branch_targets(function);
    let joins: Vec<_> = edges.iter().filter(|(_, to)| to == "EndIf").collect();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].0, "Else");
    // no phi: the result is the else value itself
    assert_eq!(
        count_matching(function, |i| matches!(i, Inst::Phi { .. })),
        0
    );
    assert!(matches!(
        block(function, "EndIf").term.as_ref().unwrap().term,
        Terminator::Ret {
            value: Some(Value::ConstInt { value: 2, .. })
        }
    ));
}

#[test]
fn while_loop_shape() {
    let mut p = Program::new();
    let bool_ty = p.types.builtin.bool_type;
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "spin", &[("c", bool_ty)], void_ty);
    let c = f.params[0];
    let cond = f.sym(c);
    let (body_stmts, inner) = {
        let inner = f.p.add_block_ctx(Some(f.body_ctx), false);
        f.p.analysis.fns[f.fn_id.0 as usize]
            .all_block_ctxs
            .push(inner);
        (Vec::new(), inner)
    };
    let loop_body = f.block_in(inner, body_stmts);
    let void_ty2 = f.p.types.builtin.void_type;
    let node = f.expr(
        NodeKind::While {
            condition: Box::new(cond),
            body: Box::new(loop_body),
        },
        void_ty2,
    );
    f.p.analysis.while_infos.insert(
        node.id,
        WhileInfo {
            condition_always_true: false,
            contains_break: false,
        },
    );
    f.p.analysis.inner_block_ctxs.insert(node.id, inner);
    let body = f.body(vec![node]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "spin");

    let edges = branch_targets(function);
    assert!(edges.contains(&("entry".to_string(), "WhileCond".to_string())));
    assert!(edges.contains(&("WhileCond".to_string(), "WhileBody".to_string())));
    assert!(edges.contains(&("WhileCond".to_string(), "WhileEnd".to_string())));
    assert!(edges.contains(&("WhileBody".to_string(), "WhileCond".to_string())));
}

#[test]
fn forever_loop_without_breaks_has_no_exit_block() {
    let mut p = Program::new();
    let void_ty = p.types.builtin.void_type;
    let unreachable_ty = p.types.builtin.unreachable_type;

    let mut f = FnFixture::new(&mut p, "forever", &[], unreachable_ty);
    let cond = f.bool_lit(true);
    let inner = f.p.add_block_ctx(Some(f.body_ctx), false);
    f.p.analysis.fns[f.fn_id.0 as usize]
        .all_block_ctxs
        .push(inner);
    let loop_body = f.block_in(inner, Vec::new());
    let node = f.expr(
        NodeKind::While {
            condition: Box::new(cond),
            body: Box::new(loop_body),
        },
        void_ty,
    );
    f.p.analysis.while_infos.insert(
        node.id,
        WhileInfo {
            condition_always_true: true,
            contains_break: false,
        },
    );
    f.p.analysis.inner_block_ctxs.insert(node.id, inner);
    let body = f.block_typed(f.body_ctx, vec![node], unreachable_ty);
    f.finish(body, unreachable_ty);

    let module = p.lower();
    let function = func(&module, "forever");

    assert!(function.blocks.values().all(|b| b.name != "WhileEnd"));
    // body loops back on itself, no condition block either
    assert!(function.blocks.values().all(|b| b.name != "WhileCond"));
    let edges = branch_targets(function);
    assert!(edges.contains(&("WhileBody".to_string(), "WhileBody".to_string())));
}

#[test]
fn break_and_continue_target_the_innermost_loop() {
    let mut p = Program::new();
    let bool_ty = p.types.builtin.bool_type;
    let void_ty = p.types.builtin.void_type;
    let unreachable_ty = p.types.builtin.unreachable_type;

    let mut f = FnFixture::new(&mut p, "looper", &[("c", bool_ty)], void_ty);
    let c = f.params[0];

    let inner = f.p.add_block_ctx(Some(f.body_ctx), false);
    f.p.analysis.fns[f.fn_id.0 as usize]
        .all_block_ctxs
        .push(inner);

    // while (true) { if (c) break; continue; }
    let brk = f.expr_in(NodeKind::Break, unreachable_ty, inner);
    let cond_sym = f.sym(c);
    let if_break = f.if_bool(cond_sym, brk, None, void_ty);
    let cont = f.expr_in(NodeKind::Continue, unreachable_ty, inner);
    let loop_body = f.block_typed(inner, vec![if_break, cont], unreachable_ty);

    let cond = f.bool_lit(true);
    let node = f.expr(
        NodeKind::While {
            condition: Box::new(cond),
            body: Box::new(loop_body),
        },
        void_ty,
    );
    f.p.analysis.while_infos.insert(
        node.id,
        WhileInfo {
            condition_always_true: true,
            contains_break: true,
        },
    );
    f.p.analysis.inner_block_ctxs.insert(node.id, inner);
    let body = f.body(vec![node]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "looper");

    let edges = branch_targets(function);
    // break goes to the loop end, continue back to the body head
    assert!(edges.contains(&("Then".to_string(), "WhileEnd".to_string())));
    assert!(edges.contains(&("EndIf".to_string(), "WhileBody".to_string())));
}

#[test]
fn for_loop_over_array_shape() {
    let mut p = Program::new();
    let u8_ty = p.types.int_type(false, 8);
    let array_ty = p.types.array_of(&mut p.module, u8_ty, 4);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "iterate", &[], void_ty);
    let arr = f.local("arr", array_ty);
    let decl = f.var_decl(arr, None);
    let arr_sym = f.sym(arr);
    let for_node = f.for_loop("item", u8_ty, arr_sym, Vec::new());
    let body = f.body(vec![decl, for_node]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "iterate");

    // signed-less-than against the constant length
    let cond_insts = block_insts(function, "ForCond");
    assert!(cond_insts.iter().any(|i| matches!(
        i,
        Inst::ICmp {
            pred: IntPred::Slt,
            rhs: Value::ConstInt { value: 4, .. },
            ..
        }
    )));
    // the body loads the element and bumps the index
    let body_insts = block_insts(function, "ForBody");
    assert!(body_insts.iter().any(|i| matches!(i, Inst::Gep { .. })));
    assert!(body_insts.iter().any(|i| matches!(
        i,
        Inst::Bin {
            op: LlBinOp::Add,
            rhs: Value::ConstInt { value: 1, .. },
            ..
        }
    )));
    let edges = branch_targets(function);
    assert!(edges.contains(&("ForBody".to_string(), "ForCond".to_string())));
    assert!(edges.contains(&("ForCond".to_string(), "ForEnd".to_string())));
}

#[test]
fn goto_and_label_blocks() {
    let mut p = Program::new();
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "jumper", &[], void_ty);
    let out = f.add_label("out", false);
    let goto = f.goto_stmt(out);
    let label = f.label_stmt(out);
    let body = f.body(vec![goto, label]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "jumper");

    // label blocks exist and the goto branches into them
    assert!(function.blocks.values().any(|b| b.name == "out"));
    let edges = branch_targets(function);
    assert!(edges.contains(&("entry".to_string(), "out".to_string())));
    assert!(matches!(
        block(function, "out").term.as_ref().unwrap().term,
        Terminator::Ret { value: None }
    ));
}

#[test]
fn fallthrough_label_receives_an_explicit_branch() {
    let mut p = Program::new();
    let void_ty = p.types.builtin.void_type;
    let i32_ty = p.types.int_type(true, 32);

    let mut f = FnFixture::new(&mut p, "fall", &[], void_ty);
    let next = f.add_label("next", true);
    let x = f.local("x", i32_ty);
    let init = f.num_i(1, i32_ty);
    let decl = f.var_decl(x, Some(init));
    let label = f.label_stmt(next);
    let body = f.body(vec![decl, label]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "fall");
    let edges = branch_targets(function);
    assert!(edges.contains(&("entry".to_string(), "next".to_string())));
}

#[test]
fn maybe_unwrap_with_default() {
    let mut p = Program::new();
    let bool_ty = p.types.builtin.bool_type;
    let maybe_bool = p.types.maybe_of(&mut p.module, bool_ty);

    let mut f = FnFixture::new(&mut p, "unwrap_or", &[], bool_ty);
    let x = f.local("x", maybe_bool);
    // x = true (wrapped implicitly into the maybe temporary)
    let slot = f.cast_slot(maybe_bool, f.body_ctx);
    let wrapped = f.bool_lit(true);
    f.set_implicit_maybe_cast(
        &wrapped,
        CastInfo {
            op: CastOp::MaybeWrap,
            after_type: maybe_bool,
            slot: Some(slot),
        },
    );
    let decl = f.var_decl(x, Some(wrapped));

    // x ?? false
    let lhs = f.sym(x);
    let default = f.bool_lit(false);
    let unwrap = f.bin(BinOp::UnwrapMaybe, lhs, default, bool_ty);
    let ret = f.ret(Some(unwrap));
    let unreachable_ty = f.p.types.builtin.unreachable_type;
    let body = f.block_typed(f.body_ctx, vec![decl, ret], unreachable_ty);
    f.finish(body, unreachable_ty);

    let module = p.lower();
    let function = func(&module, "unwrap_or");

    // wrap: payload store plus present-bit set
    let entry_insts = block_insts(function, "entry");
    assert!(entry_insts.iter().any(|i| matches!(
        i,
        Inst::Store {
            value: Value::ConstInt { value: 1, .. },
            ..
        }
    )));

    // unwrap: the present bit drives a branch, the join merges payload and
    // default
    assert!(function.blocks.values().any(|b| b.name == "MaybeNonNull"));
    assert!(function.blocks.values().any(|b| b.name == "MaybeNull"));
    let phis = block_insts(function, "MaybeEnd")
        .into_iter()
        .filter(|i| matches!(i, Inst::Phi { .. }))
        .count();
    assert_eq!(phis, 1);
    let non_null = block_insts(function, "MaybeNonNull");
    assert!(non_null.iter().any(|i| matches!(i, Inst::Load { .. })));
}

#[test]
fn if_let_binds_the_payload_in_the_then_scope() {
    let mut p = Program::new();
    let bool_ty = p.types.builtin.bool_type;
    let maybe_bool = p.types.maybe_of(&mut p.module, bool_ty);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "check", &[("x", maybe_bool)], void_ty);
    let x = f.params[0];

    let inner = f.p.add_block_ctx(Some(f.body_ctx), false);
    f.p.analysis.fns[f.fn_id.0 as usize]
        .all_block_ctxs
        .push(inner);
    let y = f.local_in("y", bool_ty, inner);

    let scrutinee = f.sym(x);
    let then_arm = f.block_in(inner, Vec::new());
    let node = f.expr(
        NodeKind::IfVar {
            decl: VarDeclNode {
                name: "y".to_string(),
                is_const: true,
                type_expr: None,
                init: Some(Box::new(scrutinee)),
            },
            then_block: Box::new(then_arm),
            else_node: None,
        },
        void_ty,
    );
    f.p.analysis.var_decls.insert(node.id, y);
    f.p.analysis.inner_block_ctxs.insert(node.id, inner);
    let body = f.body(vec![node]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "check");

    let entry_insts = block_insts(function, "entry");
    // payload moved into the binding, then the present bit is branched on
    assert!(entry_insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 0, .. })));
    assert!(entry_insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 1, .. })));
    assert!(matches!(
        block(function, "entry").term.as_ref().unwrap().term,
        Terminator::CondBr { .. }
    ));
}
