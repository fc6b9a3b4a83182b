//! The linear IR. Every function is a list of blocks of three address
//! instructions over uniquely identified terms, plus a use-def index kept in
//! step with those instructions.

use crate::{
    frontend::{intern::InternedSymbol, ty::Type},
    index::{Counter, simple_index},
};

use self::{
    data::FunData,
    op::Op,
    term::{Term, TermId, TermLike},
};

pub mod ast_lowering;
pub mod compose;
pub mod constant;
pub mod data;
pub mod lifetime;
pub mod op;
pub mod pretty_print;
pub mod term;

#[derive(Debug, Clone)]
pub struct Ir<T> {
    pub functions: Vec<IrFun<T>>,
    /// Hands out ids to whoever rewrites the functions next
    pub ids: IdSystem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFun<T> {
    pub name: InternedSymbol,
    pub blocks: Vec<Block<T>>,
    pub data: FunData<T>,
}

impl<T: TermLike> IrFun<T> {
    /// Builds a function and derives its use-def index from scratch.
    pub fn from_blocks(name: InternedSymbol, blocks: Vec<Block<T>>) -> Self {
        let data = FunData::from_blocks(&blocks);

        Self { name, blocks, data }
    }

    /// Every instruction, blocks laid end to end.
    pub fn ops(&self) -> impl Iterator<Item = &Op<T>> {
        self.blocks.iter().flat_map(|block| &block.ops)
    }

    pub fn op_count(&self) -> usize {
        self.blocks.iter().map(|block| block.ops.len()).sum()
    }

    /// The instruction at `position` of the flattened instruction list.
    pub fn op_at_mut(&mut self, position: usize) -> Option<&mut Op<T>> {
        self.blocks
            .iter_mut()
            .flat_map(|block| &mut block.ops)
            .nth(position)
    }
}

simple_index! {
    /// Identifies an IR block
    pub struct BlockId;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    pub id: BlockId,
    pub desired_name: InternedSymbol,
    pub ops: Vec<Op<T>>,
}

impl<T> Block<T> {
    pub fn new(id: BlockId, ops: Vec<Op<T>>) -> Self {
        Self {
            id,
            desired_name: InternedSymbol::new("bb"),
            ops,
        }
    }
}

/// Issues fresh term and block ids. Threaded through lowering and every
/// optimization so that ids stay unique across the whole program.
#[derive(Debug, Clone, Default)]
pub struct IdSystem {
    terms: Counter<TermId>,
    blocks: Counter<BlockId>,
}

impl IdSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_term(&mut self, ty: Type) -> Term {
        Term::temporary(self.terms.next(), ty)
    }

    pub fn new_block<T>(&mut self, ops: Vec<Op<T>>) -> Block<T> {
        Block::new(self.blocks.next(), ops)
    }
}

#[cfg(test)]
mod tests {
    use crate::index::Index;

    use super::{constant::IrConst, *};

    #[test]
    fn ids_are_never_reused() {
        let mut ids = IdSystem::new();

        let a = ids.new_term(Type::Int);
        let b = ids.new_term(Type::Int);
        let first = ids.new_block::<Term>(vec![]);
        let second = ids.new_block::<Term>(vec![]);

        assert_ne!(a.id, b.id);
        assert_eq!(first.id.index(), 0);
        assert_eq!(second.id.index(), 1);
    }

    #[test]
    fn positions_span_blocks() {
        let mut ids = IdSystem::new();
        let a = ids.new_term(Type::Int);
        let b = ids.new_term(Type::Int);

        let first = ids.new_block(vec![Op::Const {
            to: a.clone(),
            value: IrConst::Int(1),
        }]);
        let second = ids.new_block(vec![Op::Const {
            to: b.clone(),
            value: IrConst::Int(2),
        }]);

        let mut fun = IrFun::from_blocks(InternedSymbol::new("main"), vec![first, second]);

        assert_eq!(fun.op_count(), 2);
        assert_eq!(fun.op_at_mut(1).map(|op| op.term().clone()), Some(b));
        assert!(fun.op_at_mut(2).is_none());
    }
}
