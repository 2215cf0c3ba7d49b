//! Debug metadata arenas: compile unit, lexical scopes, debug types, and
//! local-variable records. Instructions are stamped with a location
//! (line, column, scope) captured at emission time.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebugScopeId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebugTypeId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebugVarId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugLoc {
    pub line: u32,
    pub column: u32,
    pub scope: DebugScopeId,
}

#[derive(Clone, Debug)]
pub enum DebugScope {
    CompileUnit {
        file: String,
        producer: String,
    },
    LexicalBlock {
        parent: DebugScopeId,
        line: u32,
        column: u32,
    },
    Subprogram {
        parent: DebugScopeId,
        name: String,
        line: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugEncoding {
    Signed,
    Unsigned,
    Float,
    Boolean,
}

#[derive(Clone, Debug)]
pub struct DebugMember {
    pub name: String,
    pub ty: DebugTypeId,
    pub size_in_bits: u64,
    pub align_in_bits: u64,
    pub offset_in_bits: u64,
}

#[derive(Clone, Debug)]
pub enum DebugType {
    Void,
    Basic {
        name: String,
        size_in_bits: u64,
        align_in_bits: u64,
        encoding: DebugEncoding,
    },
    Pointer {
        name: String,
        pointee: DebugTypeId,
        size_in_bits: u64,
        align_in_bits: u64,
    },
    Array {
        elem: DebugTypeId,
        len: u64,
        size_in_bits: u64,
        align_in_bits: u64,
    },
    Struct {
        name: String,
        members: Vec<DebugMember>,
        size_in_bits: u64,
        align_in_bits: u64,
    },
    Enumeration {
        name: String,
        enumerators: Vec<(String, u64)>,
        size_in_bits: u64,
        align_in_bits: u64,
    },
}

#[derive(Clone, Debug)]
pub struct DebugVariable {
    pub name: String,
    pub ty: DebugTypeId,
    pub scope: DebugScopeId,
    pub line: u32,
    /// One-based argument number for parameters, `None` for locals.
    pub arg_no: Option<u32>,
}

#[derive(Debug, Default)]
pub struct DebugInfo {
    compile_unit: Option<DebugScopeId>,
    scopes: Vec<DebugScope>,
    types: Vec<DebugType>,
    variables: Vec<DebugVariable>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_compile_unit(&mut self, file: &str, producer: &str) -> DebugScopeId {
        let id = self.push_scope(DebugScope::CompileUnit {
            file: file.to_string(),
            producer: producer.to_string(),
        });
        self.compile_unit = Some(id);
        id
    }

    pub fn compile_unit_scope(&self) -> DebugScopeId {
        self.compile_unit
            .expect("debug info used before the compile unit exists")
    }

    pub fn create_subprogram(&mut self, parent: DebugScopeId, name: &str, line: u32) -> DebugScopeId {
        self.push_scope(DebugScope::Subprogram {
            parent,
            name: name.to_string(),
            line,
        })
    }

    pub fn create_lexical_block(
        &mut self,
        parent: DebugScopeId,
        line: u32,
        column: u32,
    ) -> DebugScopeId {
        self.push_scope(DebugScope::LexicalBlock {
            parent,
            line,
            column,
        })
    }

    fn push_scope(&mut self, scope: DebugScope) -> DebugScopeId {
        let id = DebugScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn scope(&self, id: DebugScopeId) -> &DebugScope {
        &self.scopes[id.0 as usize]
    }

    pub fn create_type(&mut self, ty: DebugType) -> DebugTypeId {
        let id = DebugTypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn create_basic_type(
        &mut self,
        name: &str,
        size_in_bits: u64,
        align_in_bits: u64,
        encoding: DebugEncoding,
    ) -> DebugTypeId {
        self.create_type(DebugType::Basic {
            name: name.to_string(),
            size_in_bits,
            align_in_bits,
            encoding,
        })
    }

    pub fn create_pointer_type(
        &mut self,
        name: &str,
        pointee: DebugTypeId,
        size_in_bits: u64,
        align_in_bits: u64,
    ) -> DebugTypeId {
        self.create_type(DebugType::Pointer {
            name: name.to_string(),
            pointee,
            size_in_bits,
            align_in_bits,
        })
    }

    pub fn get_type(&self, id: DebugTypeId) -> &DebugType {
        &self.types[id.0 as usize]
    }

    /// Replace a previously created composite, for types whose members are
    /// only known after the entry is already referenced.
    pub fn replace_type(&mut self, id: DebugTypeId, ty: DebugType) {
        self.types[id.0 as usize] = ty;
    }

    pub fn create_variable(&mut self, variable: DebugVariable) -> DebugVarId {
        let id = DebugVarId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub fn variable(&self, id: DebugVarId) -> &DebugVariable {
        &self.variables[id.0 as usize]
    }
}
