pub mod table;

pub use table::TypeTable;

use std::collections::HashMap;

use crate::llir::debug_info::DebugTypeId;
use crate::llir::{CallConv, FuncId, LlirTypeId};

/// Stable identity of an interned type. Two syntactic occurrences of the
/// same type share one id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct IntInfo {
    pub is_signed: bool,
    pub add_with_overflow_fn: FuncId,
    pub sub_with_overflow_fn: FuncId,
    pub mul_with_overflow_fn: FuncId,
}

#[derive(Clone, Copy, Debug)]
pub struct PointerInfo {
    pub child: TypeId,
    pub is_const: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ArrayInfo {
    pub child: TypeId,
    pub len: u64,
}

#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub src_index: u32,
    /// Position in the physical layout; zero-sized fields carry `None`.
    pub gen_index: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct StructInfo {
    pub fields: Vec<StructField>,
    /// Unknown-size arrays are two-field structs `{ ptr, len }`.
    pub is_slice: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MaybeInfo {
    pub child: TypeId,
}

#[derive(Clone, Debug)]
pub struct EnumMember {
    pub name: String,
    pub ty: TypeId,
    pub value: u64,
}

#[derive(Clone, Debug)]
pub struct EnumInfo {
    pub tag_type: TypeId,
    pub members: Vec<EnumMember>,
    /// Members that carry a payload. Zero means a C-like enum represented
    /// as the bare tag.
    pub gen_field_count: u32,
}

#[derive(Clone, Debug)]
pub struct FnTypeInfo {
    pub param_types: Vec<TypeId>,
    pub return_type: TypeId,
    pub src_param_count: u32,
    pub is_var_args: bool,
    pub conv: CallConv,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Invalid,
    MetaType,
    Void,
    Bool,
    Unreachable,
    NumberLiteral,
    Int(IntInfo),
    Float,
    Pointer(PointerInfo),
    Array(ArrayInfo),
    Struct(StructInfo),
    Maybe(MaybeInfo),
    Enum(EnumInfo),
    Fn(FnTypeInfo),
}

#[derive(Clone, Debug)]
pub struct TypeEntry {
    pub kind: TypeKind,
    pub name: String,
    pub size_in_bits: u64,
    pub align_in_bits: u64,
    pub llir_type: Option<LlirTypeId>,
    pub debug_type: Option<DebugTypeId>,

    // interning links so derivations of the same type share identity
    pub(crate) pointer_parent: [Option<TypeId>; 2],
    pub(crate) slice_parent: [Option<TypeId>; 2],
    pub(crate) arrays_by_len: HashMap<u64, TypeId>,
    pub(crate) maybe_parent: Option<TypeId>,
}

impl TypeEntry {
    pub(crate) fn new(kind: TypeKind, name: String) -> Self {
        Self {
            kind,
            name,
            size_in_bits: 0,
            align_in_bits: 0,
            llir_type: None,
            debug_type: None,
            pointer_parent: [None, None],
            slice_parent: [None, None],
            arrays_by_len: HashMap::new(),
            maybe_parent: None,
        }
    }

    pub fn llir_type(&self) -> LlirTypeId {
        self.llir_type
            .unwrap_or_else(|| panic!("type '{}' has no low-level representation", self.name))
    }

    pub fn debug_type(&self) -> DebugTypeId {
        self.debug_type
            .unwrap_or_else(|| panic!("type '{}' has no debug representation", self.name))
    }

    pub fn int_info(&self) -> &IntInfo {
        match &self.kind {
            TypeKind::Int(info) => info,
            _ => panic!("type '{}' is not an integer type", self.name),
        }
    }

    pub fn pointer_info(&self) -> PointerInfo {
        match self.kind {
            TypeKind::Pointer(info) => info,
            _ => panic!("type '{}' is not a pointer type", self.name),
        }
    }

    pub fn array_info(&self) -> ArrayInfo {
        match self.kind {
            TypeKind::Array(info) => info,
            _ => panic!("type '{}' is not an array type", self.name),
        }
    }

    pub fn struct_info(&self) -> &StructInfo {
        match &self.kind {
            TypeKind::Struct(info) => info,
            _ => panic!("type '{}' is not a struct type", self.name),
        }
    }

    pub fn maybe_info(&self) -> MaybeInfo {
        match self.kind {
            TypeKind::Maybe(info) => info,
            _ => panic!("type '{}' is not a maybe type", self.name),
        }
    }

    pub fn enum_info(&self) -> &EnumInfo {
        match &self.kind {
            TypeKind::Enum(info) => info,
            _ => panic!("type '{}' is not an enum type", self.name),
        }
    }

    pub fn fn_info(&self) -> &FnTypeInfo {
        match &self.kind {
            TypeKind::Fn(info) => info,
            _ => panic!("type '{}' is not a function type", self.name),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(&self.kind, TypeKind::Struct(info) if info.is_slice)
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, TypeKind::Unreachable)
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(&self.kind, TypeKind::Int(info) if info.is_signed)
    }
}
