//! Lifetimes of terms in finished IR.

use hashbrown::HashMap;

use crate::internal_error;

use super::{
    Block, Ir, IrFun,
    term::{Lifetime, Term, TermId, Timed},
};

/// Attaches a lifetime to every term of an optimized function.
///
/// A term lives from the instruction defining it up to and including its last
/// use, counted over the flattened instruction list. A term nobody uses lives
/// only for its definition.
pub fn cool(function: &IrFun<Term>) -> IrFun<Timed> {
    let lifetimes = lifetimes(function);

    let blocks = function
        .blocks
        .iter()
        .map(|block| Block {
            id: block.id,
            desired_name: block.desired_name,
            ops: block
                .ops
                .iter()
                .map(|op| {
                    op.map_terms(|term| match lifetimes.get(&term.id) {
                        Some(lifetime) => Timed {
                            term: term.clone(),
                            lifetime: *lifetime,
                        },
                        None => internal_error!("term {:?} has no lifetime", term.id),
                    })
                })
                .collect(),
        })
        .collect();

    IrFun::from_blocks(function.name, blocks)
}

pub fn cool_ir(ir: &Ir<Term>) -> Ir<Timed> {
    Ir {
        functions: ir.functions.iter().map(cool).collect(),
        ids: ir.ids.clone(),
    }
}

fn lifetimes(function: &IrFun<Term>) -> HashMap<TermId, Lifetime> {
    let mut lifetimes = HashMap::<TermId, Lifetime>::new();

    for (moment, op) in function.ops().enumerate() {
        // Dummies have no terms, but their principal one still needs a lifetime
        let terms = if op.is_dummy() {
            vec![op.term()]
        } else {
            op.terms()
        };

        for term in terms {
            lifetimes
                .entry(term.id)
                .and_modify(|lifetime| lifetime.end = moment + 1)
                .or_insert(Lifetime {
                    begin: moment,
                    end: moment + 1,
                });
        }
    }

    lifetimes
}
