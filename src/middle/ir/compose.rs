//! Builders for ordered instruction sequences.
//!
//! Lowering an expression yields a [`Compose`]: its instructions in evaluation
//! order, with the term of the last one standing for the expression's value.
//! Combining several sub-expressions goes through a [`Junction`], [`Viewing`]
//! or [`Zipping`], which gather the operand terms first and only then emit the
//! combining instruction, handing back a [`Connection`] to splice it all
//! together.

use crate::internal_error;

use super::{op::Op, term::Term};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compose {
    ops: Vec<Op<Term>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(op: Op<Term>) -> Self {
        Self { ops: vec![op] }
    }

    /// Appends the instruction built from the term of the last one.
    pub fn with_last(self, callback: impl FnOnce(&Term) -> Op<Term>) -> Self {
        let op = callback(self.term());

        self.push(op)
    }

    /// Appends an instruction that does not depend on the sequence so far.
    pub fn then(self, callback: impl FnOnce() -> Op<Term>) -> Self {
        let op = callback();

        self.push(op)
    }

    pub fn join(self, other: Compose) -> Junction {
        Junction::from(vec![self, other])
    }

    /// Prepares an instruction over this sequence's term and `viewed`, a term
    /// whose instructions were already placed elsewhere.
    pub fn viewing(self, viewed: Term) -> Viewing {
        Viewing {
            desired: vec![self],
            viewed: vec![viewed],
        }
    }

    /// `self`'s instructions followed by `other`'s.
    pub fn merge(mut self, other: Compose) -> Self {
        self.ops.extend(other.ops);
        self
    }

    pub fn ops(&self) -> &[Op<Term>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op<Term>> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The principal term of the last instruction.
    pub fn term(&self) -> &Term {
        match self.ops.last() {
            Some(op) => op.term(),
            None => internal_error!("an empty instruction sequence has no term"),
        }
    }

    fn push(mut self, op: Op<Term>) -> Self {
        self.ops.push(op);
        self
    }
}

/// Sibling sequences kept apart until the instruction combining them is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    composes: Vec<Compose>,
}

impl Junction {
    pub fn from(composes: Vec<Compose>) -> Self {
        Self { composes }
    }

    pub fn join(mut self, compose: Compose) -> Self {
        self.composes.push(compose);
        self
    }

    /// Builds the combining instruction from the term of every sequence, in
    /// order. The sequences themselves become the prelude.
    pub fn then(self, callback: impl FnOnce(&[Term]) -> Op<Term>) -> Connection {
        if self.composes.is_empty() {
            internal_error!("a junction needs at least one sequence");
        }

        let terms = self
            .composes
            .iter()
            .map(|compose| compose.term().clone())
            .collect::<Vec<_>>();

        let tail = Compose::single(callback(&terms));
        let prelude = self
            .composes
            .into_iter()
            .fold(Compose::new(), Compose::merge);

        Connection { prelude, tail }
    }
}

/// Like a [`Junction`], but some operands are only read: their instructions
/// are not merged into the prelude.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewing {
    desired: Vec<Compose>,
    viewed: Vec<Term>,
}

impl Viewing {
    pub fn new(desired: Vec<Compose>, viewed: Vec<Term>) -> Self {
        Self { desired, viewed }
    }

    /// The callback receives the desired terms followed by the viewed ones.
    pub fn then(self, callback: impl FnOnce(&[Term]) -> Op<Term>) -> Connection {
        if self.desired.is_empty() || self.viewed.is_empty() {
            internal_error!("a viewing needs both desired and viewed operands");
        }

        let terms = self
            .desired
            .iter()
            .map(|compose| compose.term().clone())
            .chain(self.viewed)
            .collect::<Vec<_>>();

        let tail = Compose::single(callback(&terms));
        let prelude = self
            .desired
            .into_iter()
            .fold(Compose::new(), Compose::merge);

        Connection { prelude, tail }
    }
}

/// Two parallel lists of sequences, combined pairwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Zipping {
    left: Vec<Compose>,
    right: Vec<Compose>,
}

impl Zipping {
    pub fn new(left: Vec<Compose>, right: Vec<Compose>) -> Self {
        if left.len() != right.len() {
            internal_error!(
                "cannot zip {} sequences with {} sequences",
                left.len(),
                right.len()
            );
        }

        Self { left, right }
    }

    /// One instruction per pair. The prelude holds every left sequence, then
    /// every right one.
    pub fn each(self, mut callback: impl FnMut(&Term, &Term) -> Op<Term>) -> Connection {
        let tail = self
            .left
            .iter()
            .zip(&self.right)
            .map(|(left, right)| Compose::single(callback(left.term(), right.term())))
            .fold(Compose::new(), Compose::merge);

        let prelude = self
            .left
            .into_iter()
            .chain(self.right)
            .fold(Compose::new(), Compose::merge);

        Connection { prelude, tail }
    }
}

/// A prelude and the instructions that consume it.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    prelude: Compose,
    tail: Compose,
}

impl Connection {
    pub fn connect(self) -> Compose {
        self.prelude.merge(self.tail)
    }

    pub fn plug_in_between(self, given: Compose) -> Compose {
        self.prelude.merge(given).merge(self.tail)
    }

    pub fn plug_at_front(self, given: Compose) -> Compose {
        given.merge(self.prelude).merge(self.tail)
    }
}
