use std::{fmt::Debug, hash::Hash};

use crate::{
    frontend::{intern::InternedSymbol, ty::Type},
    index::simple_index,
};

simple_index! {
    /// Identifies a term for the whole compilation. Never reused or renumbered.
    pub struct TermId;
}

/// What every kind of term has to offer to the IR structures built on top of
/// it.
pub trait TermLike: Clone + Debug + PartialEq + Eq + Hash {
    fn id(&self) -> TermId;

    /// A hint for the renderer, never used to tell terms apart
    fn desired_name(&self) -> InternedSymbol;

    fn ty(&self) -> &Type;

    /// Only known once optimization is over
    fn lifetime(&self) -> Option<Lifetime> {
        None
    }
}

/// A term as it exists during lowering and optimization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub id: TermId,
    pub desired_name: InternedSymbol,
    pub ty: Type,
}

impl Term {
    pub fn temporary(id: TermId, ty: Type) -> Self {
        Self {
            id,
            desired_name: InternedSymbol::new("t"),
            ty,
        }
    }
}

impl TermLike for Term {
    fn id(&self) -> TermId {
        self.id
    }

    fn desired_name(&self) -> InternedSymbol {
        self.desired_name
    }

    fn ty(&self) -> &Type {
        &self.ty
    }
}

/// Half open range of flattened instruction indices, `[begin, end)`, during
/// which a term holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lifetime {
    pub begin: usize,
    pub end: usize,
}

impl Lifetime {
    pub fn contains(&self, moment: usize) -> bool {
        (self.begin..self.end).contains(&moment)
    }
}

impl core::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// A term together with the span of instructions it is alive for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timed {
    pub term: Term,
    pub lifetime: Lifetime,
}

impl TermLike for Timed {
    fn id(&self) -> TermId {
        self.term.id
    }

    fn desired_name(&self) -> InternedSymbol {
        self.term.desired_name
    }

    fn ty(&self) -> &Type {
        &self.term.ty
    }

    fn lifetime(&self) -> Option<Lifetime> {
        Some(self.lifetime)
    }
}
