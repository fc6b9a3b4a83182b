//! Keeps one term per constant value.
//!
//! The term defined earliest keeps holding the value. Every later definition
//! of an equal constant is removed and whoever read it reads the earliest term
//! instead. Tables something still writes into are left alone, they only hold
//! their constant until the first write.

use hashbrown::HashMap;
use log::trace;

use crate::middle::ir::{
    IrFun,
    constant::IrConst,
    data::FunData,
    op::Op,
    term::{Term, TermId},
};

use super::{
    OptId, Pass,
    canvas::{Canvas, Transform},
};

pub struct ConstReuse;

impl Pass for ConstReuse {
    fn id(&self) -> OptId {
        OptId::ConstReuse
    }

    fn apply(&self, canvas: Canvas) -> Canvas {
        let positions = definition_positions(canvas.model());

        // Removed definitions are gone from the index, so remember where
        // their readers have to go
        let mut redirects = HashMap::<TermId, Term>::new();

        canvas.each_op(|_, data, op| {
            if let Op::Const { to, value } = op {
                return match canonical(to, value, data, &positions) {
                    Some(canonical) => {
                        trace!("{:?} reuses {:?} for {value}", to.id, canonical.id);

                        redirects.insert(to.id, canonical.clone());
                        Transform::remove(op)
                    }
                    None => Transform::Retain,
                };
            }

            if !op
                .used_terms()
                .iter()
                .any(|term| redirects.contains_key(&term.id))
            {
                return Transform::Retain;
            }

            let rewritten = op.map_terms(|term| {
                redirects
                    .get(&term.id)
                    .cloned()
                    .unwrap_or_else(|| term.clone())
            });

            Transform::replace(op, rewritten)
        })
    }
}

fn definition_positions(function: &IrFun<Term>) -> HashMap<TermId, usize> {
    function
        .ops()
        .enumerate()
        .filter(|(_, op)| op.is_definition())
        .map(|(position, op)| (op.term().id, position))
        .collect()
}

/// The earliest defined term holding the same value as `term`, unless that is
/// `term` itself.
fn canonical<'a>(
    term: &Term,
    value: &IrConst,
    data: &'a FunData<Term>,
    positions: &HashMap<TermId, usize>,
) -> Option<&'a Term> {
    let settled = |term: &Term| !value.is_table() || !data.is_mutated(term);

    if !settled(term) {
        return None;
    }

    let canonical = data
        .terms_holding(value)
        .iter()
        .filter(|&holder| settled(holder))
        .min_by_key(|holder| positions.get(&holder.id).copied().unwrap_or(usize::MAX))?;

    (canonical.id != term.id).then_some(canonical)
}
