use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::{BlockId, Callee, Inst, LlirFunction, LlirModule, LlirType, Terminator, Value};

/// Structural checks over a finished module. Run in debug builds only; a
/// failure is always fatal because it means lowering emitted malformed IR.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("function '{func}': block '{block}' has no terminator")]
    UnterminatedBlock { func: String, block: String },

    #[error("function '{func}': block '{block}' has a phi after a non-phi instruction")]
    PhiNotLeading { func: String, block: String },

    #[error(
        "function '{func}': block '{block}' phi references '{incoming}' which is not a predecessor"
    )]
    PhiIncomingNotPredecessor {
        func: String,
        block: String,
        incoming: String,
    },

    #[error("function '{func}': block '{block}' phi covers {got} of {want} predecessors")]
    PhiIncomingCountMismatch {
        func: String,
        block: String,
        got: usize,
        want: usize,
    },

    #[error("function '{func}': call argument count {got} does not match callee '{callee}' ({want})")]
    CallArityMismatch {
        func: String,
        callee: String,
        got: usize,
        want: usize,
    },

    #[error("function '{func}': branch to unknown block")]
    UnknownBlock { func: String },
}

pub fn verify_module(module: &LlirModule) -> Result<(), VerifyError> {
    for func in &module.funcs {
        if func.is_extern {
            continue;
        }
        verify_function(module, func)?;
    }
    Ok(())
}

fn verify_function(module: &LlirModule, func: &LlirFunction) -> Result<(), VerifyError> {
    let mut preds: HashMap<BlockId, HashSet<BlockId>> = HashMap::new();

    for (id, block) in func.blocks.iter() {
        let term = block.term.as_ref().ok_or_else(|| VerifyError::UnterminatedBlock {
            func: func.name.clone(),
            block: block.name.clone(),
        })?;
        let mut successors = Vec::new();
        match term.term {
            Terminator::Br { target } => successors.push(target),
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => {
                successors.push(then_block);
                successors.push(else_block);
            }
            Terminator::Ret { .. } | Terminator::Unreachable => {}
        }
        for succ in successors {
            if !func.blocks.contains_key(&succ) {
                return Err(VerifyError::UnknownBlock {
                    func: func.name.clone(),
                });
            }
            preds.entry(succ).or_default().insert(*id);
        }
    }

    for (id, block) in func.blocks.iter() {
        let mut seen_non_phi = false;
        for inst_id in &block.insts {
            let data = func.inst(*inst_id);
            match &data.inst {
                Inst::Phi { incoming, .. } => {
                    if seen_non_phi {
                        return Err(VerifyError::PhiNotLeading {
                            func: func.name.clone(),
                            block: block.name.clone(),
                        });
                    }
                    let pred_set = preds.get(id).cloned().unwrap_or_default();
                    if incoming.len() != pred_set.len() {
                        return Err(VerifyError::PhiIncomingCountMismatch {
                            func: func.name.clone(),
                            block: block.name.clone(),
                            got: incoming.len(),
                            want: pred_set.len(),
                        });
                    }
                    for (_, incoming_block) in incoming {
                        if !pred_set.contains(incoming_block) {
                            return Err(VerifyError::PhiIncomingNotPredecessor {
                                func: func.name.clone(),
                                block: block.name.clone(),
                                incoming: func.block(*incoming_block).name.clone(),
                            });
                        }
                    }
                }
                Inst::Call { callee, args, .. } => {
                    if let Callee::Func(callee_id) = callee {
                        let callee_fn = module.func(*callee_id);
                        let params = module.types.fn_param_types(callee_fn.ty);
                        let var_args = module.types.is_var_args(callee_fn.ty);
                        let ok = if var_args {
                            args.len() >= params.len()
                        } else {
                            args.len() == params.len()
                        };
                        if !ok {
                            return Err(VerifyError::CallArityMismatch {
                                func: func.name.clone(),
                                callee: callee_fn.name.clone(),
                                got: args.len(),
                                want: params.len(),
                            });
                        }
                    }
                    seen_non_phi = true;
                }
                _ => seen_non_phi = true,
            }
        }
        // a conditional branch must be on an i1
        if let Some(term) = &block.term {
            if let Terminator::CondBr { cond, .. } = term.term {
                debug_assert!(
                    matches!(
                        module.types.get(module.value_type(func, cond)),
                        LlirType::Int { bits: 1 }
                    ),
                    "condbr condition must be i1"
                );
            }
        }
    }

    Ok(())
}
