pub mod builder;
pub mod debug_info;
pub mod verify;

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

use debug_info::{DebugInfo, DebugLoc, DebugVarId};

/// Typed low-level IR.
///
/// ## Concepts:
///
/// - Modules own globals, functions, interned string constants, inline-asm
///   payloads, the low-level type arena, and the debug-info arenas.
/// - Functions are the unit of lowering. Each owns its basic blocks and an
///   instruction arena; blocks reference instructions by id.
/// - Blocks are the unit of control flow. Every block ends in exactly one
///   terminator; instruction results are referenced as values.
/// - Values are copyable references: an instruction result, a function
///   parameter, an immediate constant, a global, or a function address.
///
/// Functions are declared before any body is emitted so call sites can name
/// them regardless of definition order. Intrinsics (memcpy, memset, the
/// overflow triples) are ordinary function declarations deduplicated by
/// name.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LlirTypeId(pub(crate) u32);

impl LlirTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FuncId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlobalId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AsmId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstId(pub(crate) u32);

impl InstId {
    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }
}

// -----------------------------------------------------------------------------
// Low-level types
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LlirType {
    Void,
    Int {
        bits: u32,
    },
    Float {
        bits: u32,
    },
    Ptr {
        elem: LlirTypeId,
    },
    Array {
        elem: LlirTypeId,
        len: u64,
    },
    /// Anonymous structs are interned structurally; named structs are
    /// nominal and may start opaque (empty field list) until their body is
    /// set.
    Struct {
        name: Option<String>,
        fields: Vec<LlirTypeId>,
    },
    Fn {
        params: Vec<LlirTypeId>,
        ret: LlirTypeId,
        is_var_args: bool,
    },
}

#[derive(Debug, Default, Clone)]
pub struct LlirTypes {
    types: Vec<LlirType>,
    interned: HashMap<LlirType, LlirTypeId>,
}

impl LlirTypes {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, ty: LlirType) -> LlirTypeId {
        if let Some(id) = self.interned.get(&ty) {
            return *id;
        }
        let id = LlirTypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    pub fn get(&self, id: LlirTypeId) -> &LlirType {
        &self.types[id.index()]
    }

    pub fn void_type(&mut self) -> LlirTypeId {
        self.intern(LlirType::Void)
    }

    pub fn int_type(&mut self, bits: u32) -> LlirTypeId {
        self.intern(LlirType::Int { bits })
    }

    pub fn float_type(&mut self, bits: u32) -> LlirTypeId {
        self.intern(LlirType::Float { bits })
    }

    pub fn ptr_type(&mut self, elem: LlirTypeId) -> LlirTypeId {
        self.intern(LlirType::Ptr { elem })
    }

    pub fn array_type(&mut self, elem: LlirTypeId, len: u64) -> LlirTypeId {
        self.intern(LlirType::Array { elem, len })
    }

    pub fn struct_type(&mut self, fields: Vec<LlirTypeId>) -> LlirTypeId {
        self.intern(LlirType::Struct { name: None, fields })
    }

    /// Nominal struct; distinct calls yield distinct types even for equal
    /// bodies.
    pub fn named_struct_type(&mut self, name: &str) -> LlirTypeId {
        let id = LlirTypeId(self.types.len() as u32);
        self.types.push(LlirType::Struct {
            name: Some(name.to_string()),
            fields: Vec::new(),
        });
        id
    }

    pub fn set_struct_body(&mut self, id: LlirTypeId, body: Vec<LlirTypeId>) {
        match &mut self.types[id.index()] {
            LlirType::Struct { name, fields } => {
                assert!(name.is_some(), "anonymous structs are immutable");
                *fields = body;
            }
            other => panic!("set_struct_body on non-struct type {:?}", other),
        }
    }

    pub fn fn_type(
        &mut self,
        params: Vec<LlirTypeId>,
        ret: LlirTypeId,
        is_var_args: bool,
    ) -> LlirTypeId {
        self.intern(LlirType::Fn {
            params,
            ret,
            is_var_args,
        })
    }

    pub fn fn_return_type(&self, id: LlirTypeId) -> LlirTypeId {
        match self.get(id) {
            LlirType::Fn { ret, .. } => *ret,
            other => panic!("expected function type, got {:?}", other),
        }
    }

    pub fn fn_param_types(&self, id: LlirTypeId) -> &[LlirTypeId] {
        match self.get(id) {
            LlirType::Fn { params, .. } => params,
            other => panic!("expected function type, got {:?}", other),
        }
    }

    pub fn is_var_args(&self, id: LlirTypeId) -> bool {
        match self.get(id) {
            LlirType::Fn { is_var_args, .. } => *is_var_args,
            other => panic!("expected function type, got {:?}", other),
        }
    }

    pub fn format_type(&self, id: LlirTypeId) -> String {
        match self.get(id) {
            LlirType::Void => "void".to_string(),
            LlirType::Int { bits } => format!("i{}", bits),
            LlirType::Float { bits } => format!("f{}", bits),
            LlirType::Ptr { elem } => format!("*{}", self.format_type(*elem)),
            LlirType::Array { elem, len } => format!("[{} x {}]", len, self.format_type(*elem)),
            LlirType::Struct {
                name: Some(name), ..
            } => format!("%{}", name),
            LlirType::Struct { name: None, fields } => {
                let inner: Vec<String> = fields.iter().map(|f| self.format_type(*f)).collect();
                format!("{{{}}}", inner.join(", "))
            }
            LlirType::Fn {
                params,
                ret,
                is_var_args,
            } => {
                let mut inner: Vec<String> = params.iter().map(|p| self.format_type(*p)).collect();
                if *is_var_args {
                    inner.push("...".to_string());
                }
                format!("fn({}) -> {}", inner.join(", "), self.format_type(*ret))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Values and instructions
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Inst(InstId),
    Param(u32),
    ConstInt { ty: LlirTypeId, value: u64 },
    ConstFloat { ty: LlirTypeId, value: f64 },
    Global(GlobalId),
    Func(FuncId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    SDiv,
    UDiv,
    FDiv,
    SRem,
    URem,
    FRem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntPred {
    Eq,
    Ne,
    Ult,
    Ule,
    Ugt,
    Uge,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// Ordered float predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatPred {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallConv {
    C,
    Fast,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Callee {
    Func(FuncId),
    Asm(AsmId),
}

#[derive(Clone, Debug)]
pub enum Inst {
    Alloca {
        ty: LlirTypeId,
        align: u32,
        name: String,
    },
    ArrayAlloca {
        elem_ty: LlirTypeId,
        len: Value,
        align: u32,
    },
    Load {
        ptr: Value,
        ty: LlirTypeId,
    },
    Store {
        ptr: Value,
        value: Value,
    },
    /// In-bounds GEP; `result_ty` is the pointer type of the addressed
    /// element.
    Gep {
        ptr: Value,
        indices: Vec<Value>,
        result_ty: LlirTypeId,
    },
    StructGep {
        ptr: Value,
        index: u32,
        result_ty: LlirTypeId,
    },
    BitCast {
        value: Value,
        ty: LlirTypeId,
    },
    PtrToInt {
        value: Value,
        ty: LlirTypeId,
    },
    SExt {
        value: Value,
        ty: LlirTypeId,
    },
    ZExt {
        value: Value,
        ty: LlirTypeId,
    },
    Trunc {
        value: Value,
        ty: LlirTypeId,
    },
    Bin {
        op: BinOp,
        lhs: Value,
        rhs: Value,
        ty: LlirTypeId,
    },
    Neg {
        value: Value,
        ty: LlirTypeId,
        is_float: bool,
    },
    Not {
        value: Value,
        ty: LlirTypeId,
    },
    ICmp {
        pred: IntPred,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        pred: FloatPred,
        lhs: Value,
        rhs: Value,
    },
    Phi {
        ty: LlirTypeId,
        incoming: Vec<(Value, BlockId)>,
    },
    Call {
        callee: Callee,
        args: Vec<Value>,
        ty: LlirTypeId,
        conv: CallConv,
    },
    ExtractValue {
        value: Value,
        index: u32,
        ty: LlirTypeId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Terminator {
    Br {
        target: BlockId,
    },
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret {
        value: Option<Value>,
    },
    Unreachable,
}

#[derive(Clone, Debug)]
pub struct InstData {
    pub inst: Inst,
    /// Result type as recorded at emission time (i1 for compares, the
    /// pointer type for allocas).
    pub ty: LlirTypeId,
    pub loc: Option<DebugLoc>,
}

#[derive(Clone, Debug)]
pub struct TermData {
    pub term: Terminator,
    pub loc: Option<DebugLoc>,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub name: String,
    pub insts: Vec<InstId>,
    pub term: Option<TermData>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamAttr {
    NoAlias,
    ReadOnly,
}

#[derive(Clone, Debug)]
pub struct DebugDeclare {
    pub storage: Value,
    pub variable: DebugVarId,
    pub loc: DebugLoc,
    pub block: BlockId,
}

#[derive(Clone, Debug)]
pub struct LlirFunction {
    pub name: String,
    pub ty: LlirTypeId,
    pub conv: CallConv,
    pub is_extern: bool,
    pub internal_linkage: bool,
    pub param_attrs: Vec<Vec<ParamAttr>>,
    pub blocks: IndexMap<BlockId, Block>,
    pub insts: Vec<InstData>,
    pub declares: Vec<DebugDeclare>,
}

impl LlirFunction {
    pub fn inst(&self, id: InstId) -> &InstData {
        &self.insts[id.id() as usize]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[&id]
    }
}

// -----------------------------------------------------------------------------
// Globals, strings, inline assembly
// -----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum GlobalInit {
    Zero,
    Value(Value),
    Bytes {
        data: Vec<u8>,
        null_terminated: bool,
    },
}

#[derive(Clone, Debug)]
pub struct GlobalData {
    pub name: String,
    pub ty: LlirTypeId,
    pub init: GlobalInit,
    pub is_const: bool,
    pub private_linkage: bool,
    pub unnamed_addr: bool,
    /// Pointer type of the global's address, interned at creation.
    pub ptr_ty: LlirTypeId,
}

#[derive(Clone, Debug)]
pub struct InlineAsm {
    pub fn_ty: LlirTypeId,
    pub template: String,
    pub constraints: String,
    pub is_volatile: bool,
}

#[derive(Debug)]
pub struct LlirModule {
    pub name: String,
    pub types: LlirTypes,
    pub funcs: Vec<LlirFunction>,
    pub globals: Vec<GlobalData>,
    pub asm_exprs: Vec<InlineAsm>,
    pub fast_math: bool,
    pub debug: DebugInfo,
    str_table: IndexMap<(Vec<u8>, bool), GlobalId>,
    fn_by_name: HashMap<String, FuncId>,
}

impl LlirModule {
    pub fn new(name: &str) -> Self {
        let mut debug = DebugInfo::new();
        debug.create_compile_unit(name, "ember");
        Self {
            name: name.to_string(),
            types: LlirTypes::new(),
            funcs: Vec::new(),
            globals: Vec::new(),
            asm_exprs: Vec::new(),
            fast_math: true,
            debug,
            str_table: IndexMap::new(),
            fn_by_name: HashMap::new(),
        }
    }

    pub fn add_function(&mut self, name: &str, ty: LlirTypeId, conv: CallConv) -> FuncId {
        if let Some(existing) = self.fn_by_name.get(name) {
            return *existing;
        }
        let param_count = self.types.fn_param_types(ty).len();
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(LlirFunction {
            name: name.to_string(),
            ty,
            conv,
            is_extern: true,
            internal_linkage: false,
            param_attrs: vec![Vec::new(); param_count],
            blocks: IndexMap::new(),
            insts: Vec::new(),
            declares: Vec::new(),
        });
        self.fn_by_name.insert(name.to_string(), id);
        id
    }

    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.fn_by_name.get(name).copied()
    }

    pub fn func(&self, id: FuncId) -> &LlirFunction {
        &self.funcs[id.0 as usize]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut LlirFunction {
        &mut self.funcs[id.0 as usize]
    }

    pub fn set_function_body(&mut self, id: FuncId, body: LlirFunction) {
        self.funcs[id.0 as usize] = body;
    }

    pub fn add_global(&mut self, mut data: GlobalData) -> GlobalId {
        data.ptr_ty = self.types.ptr_type(data.ty);
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(data);
        id
    }

    pub fn global(&self, id: GlobalId) -> &GlobalData {
        &self.globals[id.0 as usize]
    }

    /// One private constant global per distinct string contents; C strings
    /// are NUL-terminated.
    pub fn find_or_create_string(&mut self, data: &[u8], c: bool) -> GlobalId {
        let key = (data.to_vec(), c);
        if let Some(id) = self.str_table.get(&key) {
            return *id;
        }
        let i8_ty = self.types.int_type(8);
        let len = data.len() as u64 + if c { 1 } else { 0 };
        let array_ty = self.types.array_type(i8_ty, len);
        let id = self.add_global(GlobalData {
            name: format!("str.{}", self.str_table.len()),
            ty: array_ty,
            init: GlobalInit::Bytes {
                data: data.to_vec(),
                null_terminated: c,
            },
            is_const: true,
            private_linkage: true,
            unnamed_addr: true,
            ptr_ty: array_ty,
        });
        self.str_table.insert(key, id);
        id
    }

    pub fn add_inline_asm(&mut self, asm: InlineAsm) -> AsmId {
        let id = AsmId(self.asm_exprs.len() as u32);
        self.asm_exprs.push(asm);
        id
    }

    pub fn value_type(&self, func: &LlirFunction, value: Value) -> LlirTypeId {
        match value {
            Value::Inst(id) => func.inst(id).ty,
            Value::Param(index) => self.types.fn_param_types(func.ty)[index as usize],
            Value::ConstInt { ty, .. } | Value::ConstFloat { ty, .. } => ty,
            Value::Global(id) => self.global(id).ptr_ty,
            Value::Func(id) => self.func(id).ty,
        }
    }
}

// -----------------------------------------------------------------------------
// Display
// -----------------------------------------------------------------------------

impl fmt::Display for LlirModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for global in &self.globals {
            let kind = if global.is_const { "constant" } else { "global" };
            write!(
                f,
                "@{} = {} {}",
                global.name,
                kind,
                self.types.format_type(global.ty)
            )?;
            match &global.init {
                GlobalInit::Zero => write!(f, " zeroinitializer")?,
                GlobalInit::Value(v) => write!(f, " {}", format_value(self, *v))?,
                GlobalInit::Bytes {
                    data,
                    null_terminated,
                } => {
                    let mut text = String::new();
                    for b in data {
                        match *b {
                            b'\n' => text.push_str("\\n"),
                            b'"' => text.push_str("\\\""),
                            0x20..=0x7e => text.push(*b as char),
                            other => text.push_str(&format!("\\{:02x}", other)),
                        }
                    }
                    if *null_terminated {
                        text.push_str("\\00");
                    }
                    write!(f, " c\"{}\"", text)?;
                }
            }
            writeln!(f)?;
        }
        for func in &self.funcs {
            if func.is_extern {
                continue;
            }
            write_function(f, self, func)?;
        }
        Ok(())
    }
}

fn format_value(module: &LlirModule, value: Value) -> String {
    match value {
        Value::Inst(id) => format!("%{}", id.id()),
        Value::Param(index) => format!("%arg{}", index),
        Value::ConstInt { ty, value } => {
            format!("{} {}", module.types.format_type(ty), value)
        }
        Value::ConstFloat { ty, value } => {
            format!("{} {}", module.types.format_type(ty), value)
        }
        Value::Global(id) => format!("@{}", module.global(id).name),
        Value::Func(id) => format!("@{}", module.func(id).name),
    }
}

fn write_function(
    f: &mut fmt::Formatter<'_>,
    module: &LlirModule,
    func: &LlirFunction,
) -> fmt::Result {
    let params: Vec<String> = module
        .types
        .fn_param_types(func.ty)
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{} %arg{}", module.types.format_type(*ty), i))
        .collect();
    writeln!(
        f,
        "fn @{}({}) -> {} {{",
        func.name,
        params.join(", "),
        module
            .types
            .format_type(module.types.fn_return_type(func.ty))
    )?;
    for (i, (_, block)) in func.blocks.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        writeln!(f, "{}:", block.name)?;
        for inst_id in &block.insts {
            let data = func.inst(*inst_id);
            write!(f, "  ")?;
            write_inst(f, module, func, *inst_id, data)?;
            writeln!(f)?;
        }
        write!(f, "  ")?;
        match &block.term {
            None => write!(f, "<unterminated>")?,
            Some(t) => write_term(f, func, &t.term, module)?,
        }
        writeln!(f)?;
    }
    writeln!(f, "}}")
}

fn write_inst(
    f: &mut fmt::Formatter<'_>,
    module: &LlirModule,
    func: &LlirFunction,
    id: InstId,
    data: &InstData,
) -> fmt::Result {
    let v = |value: Value| format_value(module, value);
    let t = |ty: LlirTypeId| module.types.format_type(ty);
    match &data.inst {
        Inst::Alloca { ty, align, name } => {
            write!(f, "%{} = alloca {}, align {}", id.id(), t(*ty), align)?;
            if !name.is_empty() {
                write!(f, " ; {}", name)?;
            }
            Ok(())
        }
        Inst::ArrayAlloca {
            elem_ty,
            len,
            align,
        } => write!(
            f,
            "%{} = alloca {}, count {}, align {}",
            id.id(),
            t(*elem_ty),
            v(*len),
            align
        ),
        Inst::Load { ptr, ty } => write!(f, "%{} = load {}, {}", id.id(), t(*ty), v(*ptr)),
        Inst::Store { ptr, value } => write!(f, "store {} -> {}", v(*value), v(*ptr)),
        Inst::Gep {
            ptr,
            indices,
            result_ty,
        } => {
            let idx: Vec<String> = indices.iter().map(|i| v(*i)).collect();
            write!(
                f,
                "%{} = gep {} [{}] : {}",
                id.id(),
                v(*ptr),
                idx.join(", "),
                t(*result_ty)
            )
        }
        Inst::StructGep {
            ptr,
            index,
            result_ty,
        } => write!(
            f,
            "%{} = struct-gep {}, {} : {}",
            id.id(),
            v(*ptr),
            index,
            t(*result_ty)
        ),
        Inst::BitCast { value, ty } => {
            write!(f, "%{} = bitcast {} to {}", id.id(), v(*value), t(*ty))
        }
        Inst::PtrToInt { value, ty } => {
            write!(f, "%{} = ptrtoint {} to {}", id.id(), v(*value), t(*ty))
        }
        Inst::SExt { value, ty } => write!(f, "%{} = sext {} to {}", id.id(), v(*value), t(*ty)),
        Inst::ZExt { value, ty } => write!(f, "%{} = zext {} to {}", id.id(), v(*value), t(*ty)),
        Inst::Trunc { value, ty } => write!(f, "%{} = trunc {} to {}", id.id(), v(*value), t(*ty)),
        Inst::Bin { op, lhs, rhs, .. } => write!(
            f,
            "%{} = {} {}, {}",
            id.id(),
            format_bin_op(*op),
            v(*lhs),
            v(*rhs)
        ),
        Inst::Neg {
            value, is_float, ..
        } => write!(
            f,
            "%{} = {} {}",
            id.id(),
            if *is_float { "fneg" } else { "neg" },
            v(*value)
        ),
        Inst::Not { value, .. } => write!(f, "%{} = not {}", id.id(), v(*value)),
        Inst::ICmp { pred, lhs, rhs } => write!(
            f,
            "%{} = icmp {} {}, {}",
            id.id(),
            format_int_pred(*pred),
            v(*lhs),
            v(*rhs)
        ),
        Inst::FCmp { pred, lhs, rhs } => write!(
            f,
            "%{} = fcmp {} {}, {}",
            id.id(),
            format_float_pred(*pred),
            v(*lhs),
            v(*rhs)
        ),
        Inst::Phi { incoming, .. } => {
            write!(f, "%{} = phi [", id.id())?;
            for (i, (value, block)) in incoming.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "({} -> {})", func.block(*block).name, v(*value))?;
            }
            write!(f, "]")
        }
        Inst::Call { callee, args, ty, .. } => {
            let target = match callee {
                Callee::Func(id) => format!("@{}", module.func(*id).name),
                Callee::Asm(id) => {
                    let asm = &module.asm_exprs[id.0 as usize];
                    format!("asm \"{}\", \"{}\"", asm.template, asm.constraints)
                }
            };
            let args: Vec<String> = args.iter().map(|a| v(*a)).collect();
            if matches!(module.types.get(*ty), LlirType::Void) {
                write!(f, "call {}({})", target, args.join(", "))
            } else {
                write!(f, "%{} = call {}({})", id.id(), target, args.join(", "))
            }
        }
        Inst::ExtractValue { value, index, .. } => write!(
            f,
            "%{} = extractvalue {}, {}",
            id.id(),
            v(*value),
            index
        ),
    }
}

fn write_term(
    f: &mut fmt::Formatter<'_>,
    func: &LlirFunction,
    term: &Terminator,
    module: &LlirModule,
) -> fmt::Result {
    match term {
        Terminator::Br { target } => write!(f, "br {}", func.block(*target).name),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            f,
            "condbr {}, {}, {}",
            format_value(module, *cond),
            func.block(*then_block).name,
            func.block(*else_block).name
        ),
        Terminator::Ret { value: Some(v) } => write!(f, "ret {}", format_value(module, *v)),
        Terminator::Ret { value: None } => write!(f, "ret void"),
        Terminator::Unreachable => write!(f, "unreachable"),
    }
}

fn format_bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::FAdd => "fadd",
        BinOp::Sub => "sub",
        BinOp::FSub => "fsub",
        BinOp::Mul => "mul",
        BinOp::FMul => "fmul",
        BinOp::SDiv => "sdiv",
        BinOp::UDiv => "udiv",
        BinOp::FDiv => "fdiv",
        BinOp::SRem => "srem",
        BinOp::URem => "urem",
        BinOp::FRem => "frem",
        BinOp::And => "and",
        BinOp::Or => "or",
        BinOp::Xor => "xor",
        BinOp::Shl => "shl",
        BinOp::AShr => "ashr",
        BinOp::LShr => "lshr",
    }
}

fn format_int_pred(pred: IntPred) -> &'static str {
    match pred {
        IntPred::Eq => "eq",
        IntPred::Ne => "ne",
        IntPred::Ult => "ult",
        IntPred::Ule => "ule",
        IntPred::Ugt => "ugt",
        IntPred::Uge => "uge",
        IntPred::Slt => "slt",
        IntPred::Sle => "sle",
        IntPred::Sgt => "sgt",
        IntPred::Sge => "sge",
    }
}

fn format_float_pred(pred: FloatPred) -> &'static str {
    match pred {
        FloatPred::Oeq => "oeq",
        FloatPred::One => "one",
        FloatPred::Olt => "olt",
        FloatPred::Ole => "ole",
        FloatPred::Ogt => "ogt",
        FloatPred::Oge => "oge",
    }
}
