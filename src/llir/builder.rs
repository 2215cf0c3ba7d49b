use indexmap::IndexMap;

use super::debug_info::{DebugLoc, DebugVarId};
use super::{
    BinOp, Block, BlockId, Callee, CallConv, DebugDeclare, FloatPred, Inst, InstData, InstId,
    IntPred, LlirFunction, LlirTypeId, LlirTypes, ParamAttr, TermData, Terminator, Value,
};

/// Instruction builder for one function body.
///
/// - Starts positioned at a fresh `entry` block.
/// - Blocks can be appended at any time and selected for emission with
///   `position_at_end`; only one block is current at a time.
/// - Emitting into a terminated block is a compiler bug and panics.
/// - Instructions are stamped with the current debug location.
/// - `finish` hands back the completed function.
pub struct FuncBuilder {
    func: LlirFunction,
    cur_block: BlockId,
    cur_loc: Option<DebugLoc>,
    next_block: u32,
    void_ty: LlirTypeId,
}

impl FuncBuilder {
    /// Begin emitting the body of a previously declared function.
    pub fn for_function(mut proto: LlirFunction, types: &mut LlirTypes) -> Self {
        assert!(proto.blocks.is_empty(), "function already has a body");
        proto.is_extern = false;
        let entry = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(
            entry,
            Block {
                name: "entry".to_string(),
                insts: Vec::new(),
                term: None,
            },
        );
        proto.blocks = blocks;
        Self {
            func: proto,
            cur_block: entry,
            cur_loc: None,
            next_block: 1,
            void_ty: types.void_type(),
        }
    }

    pub fn entry_block(&self) -> BlockId {
        BlockId(0)
    }

    pub fn append_block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        let name = self.unique_block_name(name);
        self.func.blocks.insert(
            id,
            Block {
                name,
                insts: Vec::new(),
                term: None,
            },
        );
        id
    }

    fn unique_block_name(&self, base: &str) -> String {
        let taken = self
            .func
            .blocks
            .values()
            .filter(|b| b.name == base || b.name.starts_with(&format!("{}.", base)))
            .count();
        if taken == 0 {
            base.to_string()
        } else {
            format!("{}.{}", base, taken)
        }
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        assert!(self.func.blocks.contains_key(&block), "unknown block");
        self.cur_block = block;
    }

    /// The block instructions are currently appended to. Phi incoming lists
    /// must capture this at branch time, not at expression-entry time.
    pub fn insert_block(&self) -> BlockId {
        self.cur_block
    }

    pub fn is_terminated(&self) -> bool {
        self.func.blocks[&self.cur_block].term.is_some()
    }

    pub fn set_location(&mut self, loc: DebugLoc) {
        self.cur_loc = Some(loc);
    }

    fn emit(&mut self, inst: Inst, ty: LlirTypeId) -> Value {
        let block = self
            .func
            .blocks
            .get_mut(&self.cur_block)
            .expect("current block missing");
        assert!(
            block.term.is_none(),
            "emit into terminated block '{}'",
            block.name
        );
        if matches!(inst, Inst::Phi { .. }) {
            let leading_phis = block
                .insts
                .iter()
                .all(|i| matches!(self.func.insts[i.id() as usize].inst, Inst::Phi { .. }));
            assert!(leading_phis, "phi must lead its block");
        }
        let id = InstId(self.func.insts.len() as u32);
        self.func.insts.push(InstData {
            inst,
            ty,
            loc: self.cur_loc,
        });
        block.insts.push(id);
        Value::Inst(id)
    }

    pub fn terminate(&mut self, term: Terminator) {
        let block = self
            .func
            .blocks
            .get_mut(&self.cur_block)
            .expect("current block missing");
        assert!(
            block.term.is_none(),
            "block '{}' already terminated",
            block.name
        );
        block.term = Some(TermData {
            term,
            loc: self.cur_loc,
        });
    }

    pub fn build_br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br { target });
    }

    pub fn build_cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn build_ret(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Ret { value });
    }

    pub fn build_unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    pub fn build_alloca(
        &mut self,
        types: &mut LlirTypes,
        ty: LlirTypeId,
        align: u32,
        name: &str,
    ) -> Value {
        let result_ty = types.ptr_type(ty);
        self.emit(
            Inst::Alloca {
                ty,
                align,
                name: name.to_string(),
            },
            result_ty,
        )
    }

    pub fn build_array_alloca(
        &mut self,
        types: &mut LlirTypes,
        elem_ty: LlirTypeId,
        len: Value,
        align: u32,
    ) -> Value {
        let result_ty = types.ptr_type(elem_ty);
        self.emit(
            Inst::ArrayAlloca {
                elem_ty,
                len,
                align,
            },
            result_ty,
        )
    }

    pub fn build_load(&mut self, ptr: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::Load { ptr, ty }, ty)
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) {
        let void_ty = self.void_ty;
        self.emit(Inst::Store { ptr, value }, void_ty);
    }

    pub fn build_inbounds_gep(
        &mut self,
        ptr: Value,
        indices: Vec<Value>,
        result_ty: LlirTypeId,
    ) -> Value {
        self.emit(
            Inst::Gep {
                ptr,
                indices,
                result_ty,
            },
            result_ty,
        )
    }

    pub fn build_struct_gep(&mut self, ptr: Value, index: u32, result_ty: LlirTypeId) -> Value {
        self.emit(
            Inst::StructGep {
                ptr,
                index,
                result_ty,
            },
            result_ty,
        )
    }

    pub fn build_bitcast(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::BitCast { value, ty }, ty)
    }

    pub fn build_ptr_to_int(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::PtrToInt { value, ty }, ty)
    }

    pub fn build_sext(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::SExt { value, ty }, ty)
    }

    pub fn build_zext(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::ZExt { value, ty }, ty)
    }

    pub fn build_trunc(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::Trunc { value, ty }, ty)
    }

    pub fn build_bin(&mut self, op: BinOp, lhs: Value, rhs: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::Bin { op, lhs, rhs, ty }, ty)
    }

    pub fn build_neg(&mut self, value: Value, ty: LlirTypeId, is_float: bool) -> Value {
        self.emit(Inst::Neg { value, ty, is_float }, ty)
    }

    pub fn build_not(&mut self, value: Value, ty: LlirTypeId) -> Value {
        self.emit(Inst::Not { value, ty }, ty)
    }

    pub fn build_icmp(
        &mut self,
        types: &mut LlirTypes,
        pred: IntPred,
        lhs: Value,
        rhs: Value,
    ) -> Value {
        let bool_ty = types.int_type(1);
        self.emit(Inst::ICmp { pred, lhs, rhs }, bool_ty)
    }

    pub fn build_fcmp(
        &mut self,
        types: &mut LlirTypes,
        pred: FloatPred,
        lhs: Value,
        rhs: Value,
    ) -> Value {
        let bool_ty = types.int_type(1);
        self.emit(Inst::FCmp { pred, lhs, rhs }, bool_ty)
    }

    pub fn build_phi(&mut self, ty: LlirTypeId, incoming: Vec<(Value, BlockId)>) -> Value {
        self.emit(Inst::Phi { ty, incoming }, ty)
    }

    pub fn build_call(
        &mut self,
        callee: Callee,
        args: Vec<Value>,
        ret_ty: LlirTypeId,
        conv: CallConv,
    ) -> Value {
        self.emit(
            Inst::Call {
                callee,
                args,
                ty: ret_ty,
                conv,
            },
            ret_ty,
        )
    }

    pub fn build_extract_value(&mut self, value: Value, index: u32, ty: LlirTypeId) -> Value {
        self.emit(Inst::ExtractValue { value, index, ty }, ty)
    }

    pub fn add_declare(&mut self, storage: Value, variable: DebugVarId, loc: DebugLoc) {
        let block = self.cur_block;
        self.func.declares.push(DebugDeclare {
            storage,
            variable,
            loc,
            block,
        });
    }

    pub fn set_param_attr(&mut self, index: usize, attr: ParamAttr) {
        let attrs = &mut self.func.param_attrs[index];
        if !attrs.contains(&attr) {
            attrs.push(attr);
        }
    }

    pub fn block_name(&self, id: BlockId) -> &str {
        &self.func.blocks[&id].name
    }

    pub fn finish(self) -> LlirFunction {
        self.func
    }
}

#[cfg(test)]
#[path = "../tests/t_llir_builder.rs"]
mod tests;
