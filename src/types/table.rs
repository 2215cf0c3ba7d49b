use tracing::trace;

use super::{
    ArrayInfo, EnumInfo, EnumMember, FnTypeInfo, IntInfo, MaybeInfo, PointerInfo, StructField,
    StructInfo, TypeEntry, TypeId, TypeKind,
};
use crate::llir::debug_info::{DebugEncoding, DebugMember, DebugType};
use crate::llir::{CallConv, FuncId, LlirModule};

const INT_SIZES_IN_BITS: [u32; 4] = [8, 16, 32, 64];

fn int_size_index(bits: u32) -> usize {
    match bits {
        8 => 0,
        16 => 1,
        32 => 2,
        64 => 3,
        _ => unreachable!("unsupported integer width {}", bits),
    }
}

/// Smallest supported unsigned width that holds `x`.
fn unsigned_bit_count_for(x: u64) -> u32 {
    if x <= u8::MAX as u64 {
        8
    } else if x <= u16::MAX as u64 {
        16
    } else if x <= u32::MAX as u64 {
        32
    } else {
        64
    }
}

/// Ids of the primitive entries registered at table construction.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinTypes {
    pub invalid: TypeId,
    pub meta_type: TypeId,
    pub number_literal: TypeId,
    pub void_type: TypeId,
    pub unreachable_type: TypeId,
    pub bool_type: TypeId,
    pub isize_type: TypeId,
    pub usize_type: TypeId,
    pub f32_type: TypeId,
    pub f64_type: TypeId,
    pub c_string_literal: TypeId,
    // [signed, unsigned] x [8, 16, 32, 64]
    int_types: [[TypeId; 4]; 2],
}

/// Central registry of every type reachable in the program.
///
/// Entries are interned and append-only: derivations cache their result on
/// the child entry, so asking twice for `&T` or `?T` yields the same id.
#[derive(Debug)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    pub builtin: BuiltinTypes,
    pub pointer_size_bytes: u32,
    pub memcpy_fn: FuncId,
    pub memset_fn: FuncId,
}

impl TypeTable {
    pub fn new(module: &mut LlirModule, pointer_size_bytes: u32) -> Self {
        let mut entries: Vec<TypeEntry> = Vec::new();
        let mut push = |entry: TypeEntry, entries: &mut Vec<TypeEntry>| {
            let id = TypeId(entries.len() as u32);
            entries.push(entry);
            id
        };

        let invalid = push(
            TypeEntry::new(TypeKind::Invalid, "(invalid)".to_string()),
            &mut entries,
        );
        let meta_type = push(
            TypeEntry::new(TypeKind::MetaType, "type".to_string()),
            &mut entries,
        );
        let number_literal = push(
            TypeEntry::new(TypeKind::NumberLiteral, "(number literal)".to_string()),
            &mut entries,
        );

        let mut void_entry = TypeEntry::new(TypeKind::Void, "void".to_string());
        void_entry.llir_type = Some(module.types.void_type());
        void_entry.debug_type = Some(module.debug.create_type(DebugType::Void));
        let void_type = push(void_entry, &mut entries);

        let mut unreachable_entry = TypeEntry::new(TypeKind::Unreachable, "unreachable".to_string());
        unreachable_entry.llir_type = entries[void_type.index()].llir_type;
        unreachable_entry.debug_type = entries[void_type.index()].debug_type;
        let unreachable_type = push(unreachable_entry, &mut entries);

        // fixed-width integers, signed then unsigned, with their overflow
        // intrinsics
        let mut int_types = [[invalid; 4]; 2];
        for (size_index, bits) in INT_SIZES_IN_BITS.iter().enumerate() {
            for (sign_index, is_signed) in [true, false].iter().enumerate() {
                let name = format!("{}{}", if *is_signed { 'i' } else { 'u' }, bits);
                let mut entry = TypeEntry::new(TypeKind::Invalid, name.clone());
                entry.size_in_bits = *bits as u64;
                entry.align_in_bits = *bits as u64;
                entry.llir_type = Some(module.types.int_type(*bits));
                entry.debug_type = Some(module.debug.create_basic_type(
                    &name,
                    *bits as u64,
                    *bits as u64,
                    if *is_signed {
                        DebugEncoding::Signed
                    } else {
                        DebugEncoding::Unsigned
                    },
                ));
                entry.kind = TypeKind::Int(Self::make_overflow_fns(module, &entry, *is_signed));
                int_types[sign_index][size_index] = push(entry, &mut entries);
            }
        }

        let mut bool_entry = TypeEntry::new(TypeKind::Bool, "bool".to_string());
        bool_entry.size_in_bits = 8;
        bool_entry.align_in_bits = 8;
        bool_entry.llir_type = Some(module.types.int_type(1));
        bool_entry.debug_type =
            Some(module.debug.create_basic_type("bool", 8, 8, DebugEncoding::Boolean));
        let bool_type = push(bool_entry, &mut entries);

        // pointer-width integers alias the overflow intrinsics of their
        // fixed-width peers
        let ptr_bits = pointer_size_bytes * 8;
        let mut size_types = [invalid; 2];
        for (i, (name, is_signed)) in [("isize", true), ("usize", false)].iter().enumerate() {
            let peer = int_types[if *is_signed { 0 } else { 1 }][int_size_index(ptr_bits)];
            let peer_info = entries[peer.index()].int_info().clone();
            let mut entry = TypeEntry::new(TypeKind::Int(peer_info), name.to_string());
            entry.size_in_bits = ptr_bits as u64;
            entry.align_in_bits = ptr_bits as u64;
            entry.llir_type = Some(module.types.int_type(ptr_bits));
            entry.debug_type = Some(module.debug.create_basic_type(
                name,
                ptr_bits as u64,
                ptr_bits as u64,
                if *is_signed {
                    DebugEncoding::Signed
                } else {
                    DebugEncoding::Unsigned
                },
            ));
            size_types[i] = push(entry, &mut entries);
        }

        let mut float_types = [invalid; 2];
        for (i, (name, bits)) in [("f32", 32u32), ("f64", 64u32)].iter().enumerate() {
            let mut entry = TypeEntry::new(TypeKind::Float, name.to_string());
            entry.size_in_bits = *bits as u64;
            entry.align_in_bits = *bits as u64;
            entry.llir_type = Some(module.types.float_type(*bits));
            entry.debug_type = Some(module.debug.create_basic_type(
                name,
                *bits as u64,
                *bits as u64,
                DebugEncoding::Float,
            ));
            float_types[i] = push(entry, &mut entries);
        }

        let memcpy_fn = Self::declare_mem_intrinsic(module, "llvm.memcpy.p0i8.p0i8", ptr_bits, true);
        let memset_fn = Self::declare_mem_intrinsic(module, "llvm.memset.p0i8", ptr_bits, false);

        let builtin = BuiltinTypes {
            invalid,
            meta_type,
            number_literal,
            void_type,
            unreachable_type,
            bool_type,
            isize_type: size_types[0],
            usize_type: size_types[1],
            f32_type: float_types[0],
            f64_type: float_types[1],
            c_string_literal: invalid, // patched below
            int_types,
        };

        let mut table = Self {
            entries,
            builtin,
            pointer_size_bytes,
            memcpy_fn,
            memset_fn,
        };
        let u8_type = table.int_type(false, 8);
        table.builtin.c_string_literal = table.pointer_to(module, u8_type, true);
        table
    }

    fn make_overflow_fns(module: &mut LlirModule, entry: &TypeEntry, is_signed: bool) -> IntInfo {
        let bits = entry.size_in_bits;
        let int_ty = entry.llir_type();
        let i1 = module.types.int_type(1);
        let pair = module.types.struct_type(vec![int_ty, i1]);
        let fn_ty = module.types.fn_type(vec![int_ty, int_ty], pair, false);
        let mut declare = |signed_name: &str, unsigned_name: &str| {
            let stem = if is_signed { signed_name } else { unsigned_name };
            let name = format!("llvm.{}.with.overflow.i{}", stem, bits);
            module.add_function(&name, fn_ty, CallConv::C)
        };
        IntInfo {
            is_signed,
            add_with_overflow_fn: declare("sadd", "uadd"),
            sub_with_overflow_fn: declare("ssub", "usub"),
            mul_with_overflow_fn: declare("smul", "umul"),
        }
    }

    fn declare_mem_intrinsic(
        module: &mut LlirModule,
        stem: &str,
        ptr_bits: u32,
        two_pointers: bool,
    ) -> FuncId {
        let i8_ty = module.types.int_type(8);
        let ptr_u8 = module.types.ptr_type(i8_ty);
        let len_ty = module.types.int_type(ptr_bits);
        let i32_ty = module.types.int_type(32);
        let i1_ty = module.types.int_type(1);
        let void = module.types.void_type();
        let params = if two_pointers {
            vec![ptr_u8, ptr_u8, len_ty, i32_ty, i1_ty]
        } else {
            vec![ptr_u8, i8_ty, len_ty, i32_ty, i1_ty]
        };
        let fn_ty = module.types.fn_type(params, void, false);
        let name = format!("{}.i{}", stem, ptr_bits);
        module.add_function(&name, fn_ty, CallConv::C)
    }

    pub fn entry(&self, id: TypeId) -> &TypeEntry {
        &self.entries[id.index()]
    }

    fn entry_mut(&mut self, id: TypeId) -> &mut TypeEntry {
        &mut self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn int_type(&self, is_signed: bool, bits: u32) -> TypeId {
        self.builtin.int_types[if is_signed { 0 } else { 1 }][int_size_index(bits)]
    }

    /// Aggregates are always carried by pointer at the LLIR level.
    pub fn handle_is_ptr(&self, id: TypeId) -> bool {
        match &self.entry(id).kind {
            TypeKind::Struct(_) | TypeKind::Maybe(_) | TypeKind::Array(_) => true,
            TypeKind::Enum(info) => info.gen_field_count != 0,
            _ => false,
        }
    }

    pub fn pointer_to(&mut self, module: &mut LlirModule, child: TypeId, is_const: bool) -> TypeId {
        assert!(
            !matches!(self.entry(child).kind, TypeKind::Invalid),
            "pointer to invalid type"
        );
        let slot = usize::from(is_const);
        if let Some(existing) = self.entry(child).pointer_parent[slot] {
            return existing;
        }

        let child_entry = self.entry(child);
        let name = format!(
            "&{}{}",
            if is_const { "const " } else { "" },
            child_entry.name
        );
        let ptr_bits = self.pointer_size_bytes as u64 * 8;
        let llir = module.types.ptr_type(child_entry.llir_type());
        let debug = module.debug.create_pointer_type(
            &name,
            child_entry.debug_type(),
            ptr_bits,
            ptr_bits,
        );

        let mut entry = TypeEntry::new(TypeKind::Pointer(PointerInfo { child, is_const }), name);
        entry.size_in_bits = ptr_bits;
        entry.align_in_bits = ptr_bits;
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        let id = self.push(entry);
        self.entry_mut(child).pointer_parent[slot] = Some(id);
        id
    }

    pub fn array_of(&mut self, module: &mut LlirModule, child: TypeId, len: u64) -> TypeId {
        if let Some(existing) = self.entry(child).arrays_by_len.get(&len) {
            return *existing;
        }

        let child_entry = self.entry(child);
        let name = format!("[{}]{}", len, child_entry.name);
        let llir = module.types.array_type(child_entry.llir_type(), len);
        let size_in_bits = child_entry.size_in_bits * len;
        let align_in_bits = child_entry.align_in_bits;
        let debug = module.debug.create_type(DebugType::Array {
            elem: child_entry.debug_type(),
            len,
            size_in_bits,
            align_in_bits,
        });

        let mut entry = TypeEntry::new(TypeKind::Array(ArrayInfo { child, len }), name);
        entry.size_in_bits = size_in_bits;
        entry.align_in_bits = align_in_bits;
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        let id = self.push(entry);
        self.entry_mut(child).arrays_by_len.insert(len, id);
        id
    }

    /// Unknown-size array: `{ ptr: &child, len: isize }`. The const form
    /// shares the var form's low-level type.
    pub fn slice_of(&mut self, module: &mut LlirModule, child: TypeId, is_const: bool) -> TypeId {
        assert!(
            !matches!(self.entry(child).kind, TypeKind::Invalid),
            "slice of invalid type"
        );
        let slot = usize::from(is_const);
        if let Some(existing) = self.entry(child).slice_parent[slot] {
            return existing;
        }

        if is_const {
            let var_peer = self.slice_of(module, child, false);
            let name = format!("[]const {}", self.entry(child).name);
            let mut entry = self.slice_entry_common(module, child, is_const, name);
            entry.llir_type = self.entry(var_peer).llir_type;
            entry.debug_type = self.entry(var_peer).debug_type;
            let id = self.push(entry);
            self.entry_mut(child).slice_parent[slot] = Some(id);
            return id;
        }

        let name = format!("[]{}", self.entry(child).name);
        let llir = module.types.named_struct_type(&name);
        let mut entry = self.slice_entry_common(module, child, is_const, name.clone());

        let ptr_type = self.entry(entry.struct_info().fields[0].ty);
        let isize_entry = self.entry(self.builtin.isize_type);
        module.types.set_struct_body(
            llir,
            vec![ptr_type.llir_type(), isize_entry.llir_type()],
        );
        let debug = module.debug.create_type(DebugType::Struct {
            name,
            members: vec![
                DebugMember {
                    name: "ptr".to_string(),
                    ty: ptr_type.debug_type(),
                    size_in_bits: ptr_type.size_in_bits,
                    align_in_bits: ptr_type.align_in_bits,
                    offset_in_bits: 0,
                },
                DebugMember {
                    name: "len".to_string(),
                    ty: isize_entry.debug_type(),
                    size_in_bits: isize_entry.size_in_bits,
                    align_in_bits: isize_entry.align_in_bits,
                    offset_in_bits: ptr_type.size_in_bits,
                },
            ],
            size_in_bits: entry.size_in_bits,
            align_in_bits: entry.align_in_bits,
        });
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        let id = self.push(entry);
        self.entry_mut(child).slice_parent[slot] = Some(id);
        id
    }

    fn slice_entry_common(
        &mut self,
        module: &mut LlirModule,
        child: TypeId,
        is_const: bool,
        name: String,
    ) -> TypeEntry {
        let pointer_type = self.pointer_to(module, child, is_const);
        let ptr_bits = self.pointer_size_bytes as u64 * 8;
        let mut entry = TypeEntry::new(
            TypeKind::Struct(StructInfo {
                fields: vec![
                    StructField {
                        name: "ptr".to_string(),
                        ty: pointer_type,
                        src_index: 0,
                        gen_index: Some(0),
                    },
                    StructField {
                        name: "len".to_string(),
                        ty: self.builtin.isize_type,
                        src_index: 1,
                        gen_index: Some(1),
                    },
                ],
                is_slice: true,
            }),
            name,
        );
        entry.size_in_bits = ptr_bits * 2;
        entry.align_in_bits = ptr_bits;
        entry
    }

    /// Optional type: `{ value: child, present: bool }`.
    pub fn maybe_of(&mut self, module: &mut LlirModule, child: TypeId) -> TypeId {
        if let Some(existing) = self.entry(child).maybe_parent {
            return existing;
        }

        let child_entry = self.entry(child);
        let name = format!("?{}", child_entry.name);
        let i1 = module.types.int_type(1);
        let llir = module.types.struct_type(vec![child_entry.llir_type(), i1]);
        let size_in_bits = child_entry.size_in_bits + 8;
        let align_in_bits = child_entry.align_in_bits;
        let debug = module.debug.create_type(DebugType::Struct {
            name: name.clone(),
            members: vec![
                DebugMember {
                    name: "val".to_string(),
                    ty: child_entry.debug_type(),
                    size_in_bits: child_entry.size_in_bits,
                    align_in_bits: child_entry.align_in_bits,
                    offset_in_bits: 0,
                },
                DebugMember {
                    name: "maybe".to_string(),
                    ty: child_entry.debug_type(),
                    size_in_bits: 8,
                    align_in_bits: 8,
                    offset_in_bits: child_entry.size_in_bits,
                },
            ],
            size_in_bits,
            align_in_bits,
        });

        let mut entry = TypeEntry::new(TypeKind::Maybe(MaybeInfo { child }), name);
        entry.size_in_bits = size_in_bits;
        entry.align_in_bits = align_in_bits;
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        let id = self.push(entry);
        self.entry_mut(child).maybe_parent = Some(id);
        id
    }

    /// Create a nominal struct entry whose fields are resolved later, so
    /// indirect self-reference through pointers is representable.
    pub fn declare_struct(&mut self, module: &mut LlirModule, name: &str) -> TypeId {
        let llir = module.types.named_struct_type(name);
        let debug = module.debug.create_type(DebugType::Struct {
            name: name.to_string(),
            members: Vec::new(),
            size_in_bits: 0,
            align_in_bits: 0,
        });
        let mut entry = TypeEntry::new(
            TypeKind::Struct(StructInfo {
                fields: Vec::new(),
                is_slice: false,
            }),
            name.to_string(),
        );
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        self.push(entry)
    }

    pub fn resolve_struct(
        &mut self,
        module: &mut LlirModule,
        id: TypeId,
        fields: Vec<(String, TypeId)>,
    ) {
        let mut struct_fields = Vec::with_capacity(fields.len());
        let mut element_types = Vec::new();
        let mut members = Vec::new();
        let mut total_size_in_bits = 0u64;
        let mut first_field_align_in_bits = 0u64;
        let mut gen_index = 0u32;

        for (src_index, (field_name, field_ty)) in fields.into_iter().enumerate() {
            let field_entry = self.entry(field_ty);
            let zero_sized = field_entry.size_in_bits == 0;
            struct_fields.push(StructField {
                name: field_name.clone(),
                ty: field_ty,
                src_index: src_index as u32,
                gen_index: if zero_sized { None } else { Some(gen_index) },
            });
            if zero_sized {
                continue;
            }
            element_types.push(field_entry.llir_type());
            members.push(DebugMember {
                name: field_name,
                ty: field_entry.debug_type(),
                size_in_bits: field_entry.size_in_bits,
                align_in_bits: field_entry.align_in_bits,
                offset_in_bits: total_size_in_bits,
            });
            if first_field_align_in_bits == 0 {
                first_field_align_in_bits = field_entry.align_in_bits;
            }
            total_size_in_bits += field_entry.size_in_bits;
            gen_index += 1;
        }

        let llir = self.entry(id).llir_type();
        let debug = self.entry(id).debug_type();
        module.types.set_struct_body(llir, element_types);
        let name = self.entry(id).name.clone();
        module.debug.replace_type(
            debug,
            DebugType::Struct {
                name,
                members,
                size_in_bits: total_size_in_bits,
                align_in_bits: first_field_align_in_bits.max(1),
            },
        );

        let entry = self.entry_mut(id);
        entry.size_in_bits = total_size_in_bits;
        entry.align_in_bits = first_field_align_in_bits;
        match &mut entry.kind {
            TypeKind::Struct(info) => info.fields = struct_fields,
            _ => panic!("resolve_struct on a non-struct entry"),
        }
    }

    /// Tagged union: an unsigned discriminant sized by member count plus a
    /// payload union sized by the biggest member. Payload-free enums
    /// collapse to the bare tag.
    pub fn define_enum(
        &mut self,
        module: &mut LlirModule,
        name: &str,
        members: Vec<(String, TypeId)>,
    ) -> TypeId {
        let tag_bits = unsigned_bit_count_for(members.len() as u64);
        let tag_type = self.int_type(false, tag_bits);

        let mut enum_members = Vec::with_capacity(members.len());
        let mut enumerators = Vec::with_capacity(members.len());
        let mut gen_field_count = 0u32;
        let mut biggest_size_in_bits = 0u64;
        let mut biggest_member: Option<TypeId> = None;

        for (value, (member_name, member_ty)) in members.into_iter().enumerate() {
            let member_entry = self.entry(member_ty);
            enumerators.push((member_name.clone(), value as u64));
            if !matches!(member_entry.kind, TypeKind::Void) {
                gen_field_count += 1;
                if biggest_member.is_none() || member_entry.size_in_bits > biggest_size_in_bits {
                    biggest_size_in_bits = member_entry.size_in_bits;
                    biggest_member = Some(member_ty);
                }
            }
            enum_members.push(EnumMember {
                name: member_name,
                ty: member_ty,
                value: value as u64,
            });
        }

        let size_in_bits = tag_bits as u64 + biggest_size_in_bits;
        let llir = if let Some(biggest) = biggest_member {
            let union_ty = module
                .types
                .struct_type(vec![self.entry(biggest).llir_type()]);
            let tag_llir = self.entry(tag_type).llir_type();
            let id = module.types.named_struct_type(name);
            module.types.set_struct_body(id, vec![tag_llir, union_ty]);
            id
        } else {
            self.entry(tag_type).llir_type()
        };
        let debug = module.debug.create_type(DebugType::Enumeration {
            name: name.to_string(),
            enumerators,
            size_in_bits,
            align_in_bits: tag_bits as u64,
        });

        let mut entry = TypeEntry::new(
            TypeKind::Enum(EnumInfo {
                tag_type,
                members: enum_members,
                gen_field_count,
            }),
            name.to_string(),
        );
        entry.size_in_bits = size_in_bits;
        entry.align_in_bits = tag_bits as u64;
        entry.llir_type = Some(llir);
        entry.debug_type = Some(debug);
        self.push(entry)
    }

    /// Function type. Zero-sized parameters are dropped from the low-level
    /// signature and aggregate parameters are passed as const pointers.
    pub fn fn_type(
        &mut self,
        module: &mut LlirModule,
        param_types: Vec<TypeId>,
        return_type: TypeId,
        is_var_args: bool,
        conv: CallConv,
    ) -> TypeId {
        let mut gen_params = Vec::with_capacity(param_types.len());
        for &param in &param_types {
            if self.entry(param).size_in_bits == 0 {
                continue;
            }
            let gen_param = if self.handle_is_ptr(param) {
                self.pointer_to(module, param, true)
            } else {
                param
            };
            gen_params.push(self.entry(gen_param).llir_type());
        }
        let ret_entry = self.entry(return_type);
        let ret_llir = match ret_entry.kind {
            TypeKind::Void | TypeKind::Unreachable => module.types.void_type(),
            _ => ret_entry.llir_type(),
        };
        let llir = module.types.fn_type(gen_params, ret_llir, is_var_args);

        let param_names: Vec<&str> = param_types
            .iter()
            .map(|p| self.entry(*p).name.as_str())
            .collect();
        let name = format!(
            "fn({}) -> {}",
            param_names.join(", "),
            self.entry(return_type).name
        );
        trace!(ty = %name, "function type");

        let src_param_count = param_types.len() as u32;
        let ptr_bits = self.pointer_size_bytes as u64 * 8;
        let mut entry = TypeEntry::new(
            TypeKind::Fn(FnTypeInfo {
                param_types,
                return_type,
                src_param_count,
                is_var_args,
                conv,
            }),
            name,
        );
        entry.size_in_bits = ptr_bits;
        entry.align_in_bits = ptr_bits;
        entry.llir_type = Some(llir);
        entry.debug_type = self.entry(self.builtin.void_type).debug_type;
        self.push(entry)
    }

    fn push(&mut self, entry: TypeEntry) -> TypeId {
        trace!(name = %entry.name, "intern type");
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }
}

#[cfg(test)]
#[path = "../tests/t_type_table.rs"]
mod tests;
