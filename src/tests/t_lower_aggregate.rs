use super::fixture::{all_insts, block_insts, count_matching, func, FnFixture, Program};
use crate::ast::{
    AsmExpr, AsmInput, AsmToken, AsmTokenKind, BinOp, CastInfo, CastOp, ContainerInitKind,
    FieldResolution, NodeKind,
};
use crate::llir::{BinOp as LlBinOp, Callee, Inst, LlirType, Value};

#[test]
fn array_initializer_fills_a_reserved_temporary() {
    let mut p = Program::new();
    let u8_ty = p.types.int_type(false, 8);
    let array_ty = p.types.array_of(&mut p.module, u8_ty, 4);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "build", &[], void_ty);
    let slot = f.agg_slot(array_ty, f.body_ctx);
    let elems: Vec<_> = [9i64, 8, 7, 6].iter().map(|v| f.num_i(*v, u8_ty)).collect();
    let init = f.expr(
        NodeKind::ContainerInit {
            kind: ContainerInitKind::Array,
            entries: elems,
        },
        array_ty,
    );
    f.with_value_slot(&init, slot);
    let arr = f.local("arr", array_ty);
    let decl = f.var_decl(arr, Some(init));
    let body = f.body(vec![decl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "build");

    // one alloca per local plus one for the literal temporary
    assert_eq!(
        count_matching(function, |i| matches!(i, Inst::Alloca { .. })),
        2
    );
    // four element stores through two-index GEPs
    let geps = count_matching(function, |i| {
        matches!(i, Inst::Gep { indices, .. } if indices.len() == 2)
    });
    assert_eq!(geps, 4);
    // assigning the literal to the local is a memcpy of 4 bytes
    let memcpy = module.get_function("llvm.memcpy.p0i8.p0i8.i64").unwrap();
    assert_eq!(
        count_matching(function, |i| matches!(
            i,
            Inst::Call { callee: Callee::Func(id), args, .. }
            if *id == memcpy && matches!(args[2], Value::ConstInt { value: 4, .. })
        )),
        1
    );
}

#[test]
fn struct_initializer_uses_generation_indices() {
    let mut p = Program::new();
    let i64_ty = p.types.int_type(true, 64);
    let void_ty = p.types.builtin.void_type;

    let point = p.types.declare_struct(&mut p.module, "Point");
    p.types.resolve_struct(
        &mut p.module,
        point,
        vec![
            ("tag".to_string(), void_ty),
            ("x".to_string(), i64_ty),
            ("y".to_string(), i64_ty),
        ],
    );

    let mut f = FnFixture::new(&mut p, "build", &[], void_ty);
    let slot = f.agg_slot(point, f.body_ctx);
    let unit = f.expr(
        NodeKind::ContainerInit {
            kind: ContainerInitKind::Struct,
            entries: Vec::new(),
        },
        void_ty,
    );
    let x_val = f.num_i(1, i64_ty);
    let y_val = f.num_i(2, i64_ty);
    let tag_field = f.struct_field_value("tag", unit, void_ty, None);
    let x_field = f.struct_field_value("x", x_val, i64_ty, Some(0));
    let y_field = f.struct_field_value("y", y_val, i64_ty, Some(1));
    let init = f.expr(
        NodeKind::ContainerInit {
            kind: ContainerInitKind::Struct,
            entries: vec![tag_field, x_field, y_field],
        },
        point,
    );
    f.with_value_slot(&init, slot);
    let pt = f.local("pt", point);
    let decl = f.var_decl(pt, Some(init));
    let body = f.body(vec![decl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "build");

    // the zero-sized field is skipped; x and y land at indices 0 and 1
    let insts = all_insts(function);
    assert!(insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 0, .. })));
    assert!(insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 1, .. })));
    assert!(!insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 2, .. })));
}

#[test]
fn enum_with_payload_stores_tag_then_payload() {
    let mut p = Program::new();
    let i32_ty = p.types.int_type(true, 32);
    let void_ty = p.types.builtin.void_type;

    let foo = p.types.define_enum(
        &mut p.module,
        "Foo",
        vec![("One".to_string(), i32_ty), ("Two".to_string(), void_ty)],
    );

    let mut f = FnFixture::new(&mut p, "make", &[], void_ty);
    let meta = f.p.types.builtin.meta_type;
    let base = f.type_expr(foo);
    let slot = f.agg_slot(foo, f.body_ctx);
    let callee = f.field_access(
        base,
        "One",
        Some(FieldResolution::EnumMember {
            owner: foo,
            ty: i32_ty,
            value: 0,
        }),
        meta,
    );
    f.with_value_slot(&callee, slot);
    let payload = f.num_i(1234, i32_ty);
    let construct = f.expr(
        NodeKind::FnCall {
            callee: Box::new(callee),
            args: vec![payload],
            is_builtin: false,
        },
        foo,
    );
    let v = f.local("v", foo);
    let decl = f.var_decl(v, Some(construct));
    let body = f.body(vec![decl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "make");
    let insts = all_insts(function);

    // tag byte written through field 0
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Store {
            value: Value::ConstInt { value: 0, ty },
            ..
        } if matches!(module.types.get(*ty), LlirType::Int { bits: 8 })
    )));
    // payload written through the reinterpreted union field
    assert!(insts
        .iter()
        .any(|i| matches!(i, Inst::BitCast { .. })));
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Store {
            value: Value::ConstInt { value: 1234, .. },
            ..
        }
    )));
}

#[test]
fn payload_free_member_is_just_the_tag_constant() {
    let mut p = Program::new();
    let void_ty = p.types.builtin.void_type;

    let color = p.types.define_enum(
        &mut p.module,
        "Color",
        vec![("Red".to_string(), void_ty), ("Green".to_string(), void_ty)],
    );

    let mut f = FnFixture::new(&mut p, "pick", &[], color);
    let base = f.type_expr(color);
    let member = f.field_access(
        base,
        "Green",
        Some(FieldResolution::EnumMember {
            owner: color,
            ty: void_ty,
            value: 1,
        }),
        color,
    );
    let ret = f.ret(Some(member));
    let unreachable_ty = f.p.types.builtin.unreachable_type;
    let body = f.block_typed(f.body_ctx, vec![ret], unreachable_ty);
    f.finish(body, unreachable_ty);

    let module = p.lower();
    let function = func(&module, "pick");
    // no temporary, no stores: the value is the tag itself
    assert_eq!(count_matching(function, |i| matches!(i, Inst::Store { .. })), 0);
    assert!(matches!(
        function.blocks.values().next().unwrap().term.as_ref().unwrap().term,
        crate::llir::Terminator::Ret {
            value: Some(Value::ConstInt { value: 1, .. })
        }
    ));
}

#[test]
fn null_literal_clears_the_present_bit() {
    let mut p = Program::new();
    let bool_ty = p.types.builtin.bool_type;
    let maybe_bool = p.types.maybe_of(&mut p.module, bool_ty);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "none", &[], void_ty);
    let slot = f.agg_slot(maybe_bool, f.body_ctx);
    let null = f.expr(NodeKind::NullLit, maybe_bool);
    f.with_value_slot(&null, slot);
    let x = f.local("x", maybe_bool);
    let decl = f.var_decl(x, Some(null));
    let body = f.body(vec![decl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "none");
    let insts = all_insts(function);
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Store {
            value: Value::ConstInt { value: 0, ty },
            ..
        } if matches!(module.types.get(*ty), LlirType::Int { bits: 1 })
    )));
}

#[test]
fn slice_of_array_stores_base_pointer_and_length() {
    let mut p = Program::new();
    let i32_ty = p.types.int_type(true, 32);
    let array_ty = p.types.array_of(&mut p.module, i32_ty, 20);
    let slice_ty = p.types.slice_of(&mut p.module, i32_ty, false);
    let isize_ty = p.types.builtin.isize_type;
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "cut", &[], void_ty);
    let arr = f.local("array", array_ty);
    let decl = f.var_decl(arr, None);

    let slot = f.agg_slot(slice_ty, f.body_ctx);
    let base = f.sym(arr);
    let start = f.num_i(5, isize_ty);
    let end = f.num_i(10, isize_ty);
    let slice = f.expr(
        NodeKind::SliceExpr {
            array: Box::new(base),
            start: Box::new(start),
            end: Some(Box::new(end)),
            is_const: false,
        },
        slice_ty,
    );
    f.with_value_slot(&slice, slot);
    let s = f.local("s", slice_ty);
    let sdecl = f.var_decl(s, Some(slice));
    let body = f.body(vec![decl, sdecl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "cut");
    let insts = all_insts(function);

    // ptr field: gep (0, start) off the array
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Gep { indices, .. }
        if indices.len() == 2
            && matches!(indices[1], Value::ConstInt { value: 5, .. })
    )));
    // len field: end - start
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Bin {
            op: LlBinOp::Sub,
            lhs: Value::ConstInt { value: 10, .. },
            rhs: Value::ConstInt { value: 5, .. },
            ..
        }
    )));
}

#[test]
fn slice_of_slice_reloads_the_base_pointer_and_defaults_the_end() {
    let mut p = Program::new();
    let i32_ty = p.types.int_type(true, 32);
    let slice_ty = p.types.slice_of(&mut p.module, i32_ty, false);
    let isize_ty = p.types.builtin.isize_type;
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "tail", &[("s", slice_ty)], void_ty);
    let s = f.params[0];
    let slot = f.agg_slot(slice_ty, f.body_ctx);
    let base = f.sym(s);
    let start = f.num_i(1, isize_ty);
    let slice = f.expr(
        NodeKind::SliceExpr {
            array: Box::new(base),
            start: Box::new(start),
            end: None,
            is_const: false,
        },
        slice_ty,
    );
    f.with_value_slot(&slice, slot);
    let t = f.local("t", slice_ty);
    let decl = f.var_decl(t, Some(slice));
    let body = f.body(vec![decl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "tail");
    let insts = all_insts(function);

    // with no end, the length comes from the source slice's len field
    assert!(insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 1, ptr: Value::Param(0), .. })));
    // the source ptr field is loaded before re-indexing
    assert!(insts
        .iter()
        .any(|i| matches!(i, Inst::StructGep { index: 0, ptr: Value::Param(0), .. })));
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Gep { indices, .. } if indices.len() == 1
    )));
}

#[test]
fn slice_cast_from_fixed_array() {
    let mut p = Program::new();
    let u8_ty = p.types.int_type(false, 8);
    let array_ty = p.types.array_of(&mut p.module, u8_ty, 13);
    let slice_ty = p.types.slice_of(&mut p.module, u8_ty, false);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "coerce", &[], void_ty);
    let arr = f.local("arr", array_ty);
    let decl = f.var_decl(arr, None);

    let slot = f.cast_slot(slice_ty, f.body_ctx);
    let source = f.sym(arr);
    f.set_implicit_cast(
        &source,
        CastInfo {
            op: CastOp::ToUnknownSizeArray,
            after_type: slice_ty,
            slot: Some(slot),
        },
    );
    let s = f.local("s", slice_ty);
    let sdecl = f.var_decl(s, Some(source));
    let body = f.body(vec![decl, sdecl]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "coerce");
    let insts = all_insts(function);

    // pointer bitcast into the ptr field and the constant length
    assert!(insts.iter().any(|i| matches!(i, Inst::BitCast { .. })));
    assert!(insts.iter().any(|i| matches!(
        i,
        Inst::Store {
            value: Value::ConstInt { value: 13, .. },
            ..
        }
    )));
}

#[test]
fn int_width_casts_choose_extension_by_source_signedness() {
    let mut p = Program::new();
    let i16_ty = p.types.int_type(true, 16);
    let u16_ty = p.types.int_type(false, 16);
    let i64_ty = p.types.int_type(true, 64);
    let u8_ty = p.types.int_type(false, 8);
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(
        &mut p,
        "casts",
        &[("a", i16_ty), ("b", u16_ty)],
        void_ty,
    );
    let (a, b) = (f.params[0], f.params[1]);

    let widen_signed = f.sym(a);
    f.set_implicit_cast(
        &widen_signed,
        CastInfo {
            op: CastOp::IntWidenOrShorten,
            after_type: i64_ty,
            slot: None,
        },
    );
    let x = f.local("x", i64_ty);
    let dx = f.var_decl(x, Some(widen_signed));

    let widen_unsigned = f.sym(b);
    f.set_implicit_cast(
        &widen_unsigned,
        CastInfo {
            op: CastOp::IntWidenOrShorten,
            after_type: i64_ty,
            slot: None,
        },
    );
    let y = f.local("y", i64_ty);
    let dy = f.var_decl(y, Some(widen_unsigned));

    let narrow = f.sym(a);
    f.set_implicit_cast(
        &narrow,
        CastInfo {
            op: CastOp::IntWidenOrShorten,
            after_type: u8_ty,
            slot: None,
        },
    );
    let z = f.local("z", u8_ty);
    let dz = f.var_decl(z, Some(narrow));

    let body = f.body(vec![dx, dy, dz]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "casts");
    assert_eq!(count_matching(function, |i| matches!(i, Inst::SExt { .. })), 1);
    assert_eq!(count_matching(function, |i| matches!(i, Inst::ZExt { .. })), 1);
    assert_eq!(count_matching(function, |i| matches!(i, Inst::Trunc { .. })), 1);
}

#[test]
fn aggregate_assignment_is_a_sized_memcpy() {
    let mut p = Program::new();
    let i64_ty = p.types.int_type(true, 64);
    let void_ty = p.types.builtin.void_type;
    let point = p.types.declare_struct(&mut p.module, "Point");
    p.types.resolve_struct(
        &mut p.module,
        point,
        vec![("x".to_string(), i64_ty), ("y".to_string(), i64_ty)],
    );

    let mut f = FnFixture::new(&mut p, "copy", &[("src", point)], void_ty);
    let src = f.params[0];
    let dst = f.local("dst", point);
    let decl = f.var_decl(dst, None);
    let target = f.sym(dst);
    let value = f.sym(src);
    let assign = f.bin(BinOp::Assign, target, value, void_ty);
    let body = f.body(vec![decl, assign]);
    f.finish(body, void_ty);

    let module = p.lower();
    let function = func(&module, "copy");
    let memcpy = module.get_function("llvm.memcpy.p0i8.p0i8.i64").unwrap();
    assert_eq!(
        count_matching(function, |i| matches!(
            i,
            Inst::Call { callee: Callee::Func(id), args, .. }
            if *id == memcpy && matches!(args[2], Value::ConstInt { value: 16, .. })
        )),
        1
    );
}

#[test]
fn string_literals_are_interned_globals() {
    let mut p = Program::new();
    let c_str = p.types.builtin.c_string_literal;
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "hello", &[], void_ty);
    let s1 = f.expr(
        NodeKind::StrLit {
            value: b"Hello, world!\n".to_vec(),
            is_c: true,
        },
        c_str,
    );
    let s2 = f.expr(
        NodeKind::StrLit {
            value: b"Hello, world!\n".to_vec(),
            is_c: true,
        },
        c_str,
    );
    let body = f.body(vec![s1, s2]);
    f.finish(body, void_ty);

    let module = p.lower();
    // both uses resolve to the same private constant
    assert_eq!(module.globals.len(), 1);
    assert!(module.globals[0].is_const);
    assert!(module.globals[0].private_linkage);
    let function = func(&module, "hello");
    assert_eq!(
        count_matching(function, |i| matches!(i, Inst::Gep { .. })),
        2
    );
}

#[test]
fn inline_asm_rewrites_template_and_constraints() {
    let mut p = Program::new();
    let isize_ty = p.types.builtin.isize_type;
    let void_ty = p.types.builtin.void_type;

    let mut f = FnFixture::new(&mut p, "syscall_exit", &[("code", isize_ty)], void_ty);
    let code = f.params[0];
    let arg = f.sym(code);

    // template: "syscall $1 %[code]" with a literal '$', a '%%', and a
    // named operand
    let template = "movq %[code], 100$ %% end".to_string();
    let tokens = vec![
        AsmToken {
            kind: AsmTokenKind::Template,
            start: 0,
            end: 5,
        },
        AsmToken {
            kind: AsmTokenKind::Var,
            start: 5,
            end: 11,
        },
        AsmToken {
            kind: AsmTokenKind::Template,
            start: 12,
            end: 19,
        },
        AsmToken {
            kind: AsmTokenKind::Percent,
            start: 19,
            end: 21,
        },
        AsmToken {
            kind: AsmTokenKind::Template,
            start: 21,
            end: 25,
        },
    ];
    let asm = f.expr(
        NodeKind::Asm(AsmExpr {
            is_volatile: false,
            template,
            tokens,
            outputs: Vec::new(),
            inputs: vec![AsmInput {
                symbolic_name: "code".to_string(),
                constraint: "{rdi}".to_string(),
                expr: arg,
            }],
            clobbers: vec!["rcx".to_string(), "r11".to_string()],
            return_count: 0,
        }),
        void_ty,
    );
    let body = f.body(vec![asm]);
    f.finish(body, void_ty);

    let module = p.lower();
    assert_eq!(module.asm_exprs.len(), 1);
    let asm = &module.asm_exprs[0];
    assert_eq!(asm.template, "movq $0, 100$$ % end");
    assert_eq!(asm.constraints, "{rdi},~{rcx},~{r11}");
    // no outputs forces volatile
    assert!(asm.is_volatile);

    let function = func(&module, "syscall_exit");
    assert!(all_insts(function).iter().any(|i| matches!(
        i,
        Inst::Call {
            callee: Callee::Asm(_),
            args,
            ..
        } if args.len() == 1
    )));
}
