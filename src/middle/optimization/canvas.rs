//! The workspace a pass rewrites a function in.
//!
//! A pass reads instructions from the *model*, a snapshot taken when its
//! traversal starts, and writes into the *produced* function. The use-def
//! index of the produced function is advanced after every rewrite, so a pass
//! always sees the effects of its own earlier decisions while the instruction
//! stream it walks stays put.

use log::trace;

use crate::{
    internal_error,
    middle::ir::{
        IdSystem, IrFun,
        data::{Change, FunData},
        op::Op,
        term::Term,
    },
};

/// A pass's verdict for one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Retain,
    /// Overwrites the instruction in place
    Replace {
        new: Op<Term>,
        changes: Vec<Change<Term>>,
    },
    /// Overwrites the instruction with a dummy, dropped in [`Canvas::finish`]
    Remove { changes: Vec<Change<Term>> },
}

impl Transform {
    /// Replaces `old` with `new`, moving every index entry over.
    pub fn replace(old: &Op<Term>, new: Op<Term>) -> Self {
        Transform::Replace {
            changes: Change::derive_replacement(old, &new),
            new,
        }
    }

    /// Removes `old` and everything the index knows about it.
    pub fn remove(old: &Op<Term>) -> Self {
        Transform::Remove {
            changes: Change::derive_removal(old),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    model: IrFun<Term>,
    produced: IrFun<Term>,
    ids: IdSystem,
    changes: Vec<Change<Term>>,
}

impl Canvas {
    pub fn new(function: IrFun<Term>, ids: IdSystem) -> Self {
        Self {
            produced: function.clone(),
            model: function,
            ids,
            changes: Vec::new(),
        }
    }

    pub fn model(&self) -> &IrFun<Term> {
        &self.model
    }

    pub fn produced(&self) -> &IrFun<Term> {
        &self.produced
    }

    /// Every delta applied since the last [`Canvas::changeless`].
    pub fn changes(&self) -> &[Change<Term>] {
        &self.changes
    }

    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    /// Forgets the accumulated deltas, keeping the function as is.
    pub fn changeless(mut self) -> Self {
        self.changes.clear();
        self
    }

    /// Visits every position of the model once, in order, and applies the
    /// callback's verdict to the produced function.
    ///
    /// The callback is given the id system, the live index of the produced
    /// function and the model's instruction at that position.
    pub fn each_op(
        self,
        mut callback: impl FnMut(&mut IdSystem, &FunData<Term>, &Op<Term>) -> Transform,
    ) -> Self {
        self.each_position(|_, ids, data, op| callback(ids, data, op))
    }

    /// Like [`Canvas::each_op`], also telling the callback which model
    /// position it is looking at.
    pub fn each_position(
        mut self,
        mut callback: impl FnMut(usize, &mut IdSystem, &FunData<Term>, &Op<Term>) -> Transform,
    ) -> Self {
        let Canvas {
            model,
            produced,
            ids,
            changes,
        } = &mut self;

        for (position, op) in model.ops().enumerate() {
            let (new, new_changes) = match callback(position, ids, &produced.data, op) {
                Transform::Retain => continue,
                Transform::Replace { new, changes } => (new, changes),
                Transform::Remove { changes } => (Op::Dummy(op.term().clone()), changes),
            };

            trace!("position {position}: {op:?} -> {new:?}");

            let data = std::mem::take(&mut produced.data);
            produced.data = data.apply(&new_changes);

            match produced.op_at_mut(position) {
                Some(slot) => *slot = new,
                None => internal_error!("position {position} is outside of the produced function"),
            }

            changes.extend(new_changes);
        }

        self
    }

    /// Drops every dummy and makes the result the model of the next pass.
    pub fn finish(mut self) -> Self {
        for block in &mut self.produced.blocks {
            block.ops.retain(|op| !op.is_dummy());
        }

        self.model = self.produced.clone();
        self
    }

    pub fn extract(self) -> (IrFun<Term>, IdSystem) {
        (self.produced, self.ids)
    }
}
