//! The use-def index of a function and the deltas that advance it.
//!
//! A [`FunData`] is built once from a function's instructions and from then on
//! only ever moves forward by applying [`Change`]s, in order. Passes never
//! rebuild it from scratch.

use hashbrown::HashMap;

use super::{
    Block,
    constant::IrConst,
    op::Op,
    term::{TermId, TermLike},
};

/// Everything known about one term.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats<T> {
    /// The instruction defining the term, if it is still defined
    pub def: Option<Op<T>>,
    /// Every instruction reading the term, in the order they were recorded.
    /// An instruction reading the term twice is listed twice.
    pub uses: Vec<Op<T>>,
}

impl<T> Default for Stats<T> {
    fn default() -> Self {
        Self {
            def: None,
            uses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunData<T> {
    terms: HashMap<TermId, Stats<T>>,
    /// Terms currently defined to hold each constant, most recent first
    constants: HashMap<IrConst, Vec<T>>,
}

impl<T> Default for FunData<T> {
    fn default() -> Self {
        Self {
            terms: HashMap::new(),
            constants: HashMap::new(),
        }
    }
}

/// One incremental update to a [`FunData`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    /// Sets (or clears) the defining instruction of `term`
    Define { term: T, def: Option<Op<T>> },
    /// Records `user` as a use of each of `terms`
    AddUse { terms: Vec<T>, user: Op<T> },
    /// Forgets one record of `user` per listed term. Identical instructions
    /// elsewhere in the function keep theirs.
    RemoveUse { terms: Vec<T>, user: Op<T> },
    RegisterConstant { value: IrConst, term: T },
    DeregisterConstant { value: IrConst, term: T },
}

impl<T: TermLike> Change<T> {
    /// The deltas that introducing `op` into a function implies.
    pub fn derive_from(op: &Op<T>) -> Vec<Change<T>> {
        if op.is_dummy() {
            return Vec::new();
        }

        let mut changes = Vec::with_capacity(3);

        if let Op::Const { to, value } = op {
            changes.push(Change::RegisterConstant {
                value: value.clone(),
                term: to.clone(),
            });
        }

        if op.is_definition() {
            changes.push(Change::Define {
                term: op.term().clone(),
                def: Some(op.clone()),
            });
        }

        let used = op.used_terms();
        if !used.is_empty() {
            changes.push(Change::AddUse {
                terms: used.into_iter().cloned().collect(),
                user: op.clone(),
            });
        }

        changes
    }

    /// The deltas that taking `op` out of a function implies. The inverse of
    /// [`Change::derive_from`] as far as the index is concerned.
    pub fn derive_removal(op: &Op<T>) -> Vec<Change<T>> {
        if op.is_dummy() {
            return Vec::new();
        }

        let mut changes = Vec::with_capacity(3);

        let used = op.used_terms();
        if !used.is_empty() {
            changes.push(Change::RemoveUse {
                terms: used.into_iter().cloned().collect(),
                user: op.clone(),
            });
        }

        if op.is_definition() {
            changes.push(Change::Define {
                term: op.term().clone(),
                def: None,
            });
        }

        if let Op::Const { to, value } = op {
            changes.push(Change::DeregisterConstant {
                value: value.clone(),
                term: to.clone(),
            });
        }

        changes
    }

    /// The deltas for overwriting `old` with `new` at the same position.
    pub fn derive_replacement(old: &Op<T>, new: &Op<T>) -> Vec<Change<T>> {
        let mut changes = Vec::new();

        let used = old.used_terms();
        if !used.is_empty() {
            changes.push(Change::RemoveUse {
                terms: used.into_iter().cloned().collect(),
                user: old.clone(),
            });
        }

        if let Op::Const { to, value } = old {
            changes.push(Change::DeregisterConstant {
                value: value.clone(),
                term: to.clone(),
            });
        }

        // A replacement that stops defining the old term leaves it undefined
        if old.is_definition() && !(new.is_definition() && new.term() == old.term()) {
            changes.push(Change::Define {
                term: old.term().clone(),
                def: None,
            });
        }

        changes.extend(Change::derive_from(new));

        changes
    }

    pub fn apply_to(&self, mut data: FunData<T>) -> FunData<T> {
        match self {
            Change::Define { term, def } => {
                data.stats_mut(term).def = def.clone();
                data.forget_if_empty(term);
            }
            Change::AddUse { terms, user } => {
                for term in terms {
                    data.stats_mut(term).uses.push(user.clone());
                }
            }
            Change::RemoveUse { terms, user } => {
                for term in terms {
                    let uses = &mut data.stats_mut(term).uses;

                    if let Some(index) = uses.iter().position(|op| op == user) {
                        uses.remove(index);
                    }

                    data.forget_if_empty(term);
                }
            }
            Change::RegisterConstant { value, term } => {
                let terms = data.constants.entry(value.clone()).or_default();

                terms.retain(|t| t.id() != term.id());
                terms.insert(0, term.clone());
            }
            Change::DeregisterConstant { value, term } => {
                if let Some(terms) = data.constants.get_mut(value) {
                    terms.retain(|t| t.id() != term.id());

                    if terms.is_empty() {
                        data.constants.remove(value);
                    }
                }
            }
        }

        data
    }
}

impl<T: TermLike> FunData<T> {
    pub fn from_blocks(blocks: &[Block<T>]) -> Self {
        let changes = blocks
            .iter()
            .flat_map(|block| &block.ops)
            .flat_map(Change::derive_from)
            .collect::<Vec<_>>();

        Self::default().apply(&changes)
    }

    /// Applies `changes` left to right.
    pub fn apply(self, changes: &[Change<T>]) -> Self {
        changes
            .iter()
            .fold(self, |data, change| change.apply_to(data))
    }

    pub fn stats(&self, term: TermId) -> Option<&Stats<T>> {
        self.terms.get(&term)
    }

    pub fn def_of(&self, term: &T) -> Option<&Op<T>> {
        self.terms.get(&term.id()).and_then(|stats| stats.def.as_ref())
    }

    pub fn uses_of(&self, term: &T) -> &[Op<T>] {
        self.terms
            .get(&term.id())
            .map(|stats| stats.uses.as_slice())
            .unwrap_or_default()
    }

    /// The value `term` holds, if it is defined by a constant.
    pub fn const_value_of(&self, term: &T) -> Option<&IrConst> {
        self.def_of(term).and_then(Op::as_const)
    }

    /// The value `term` holds for the rest of the function: its constant,
    /// unless it is a table something still writes into.
    pub fn settled_const(&self, term: &T) -> Option<&IrConst> {
        self.const_value_of(term)
            .filter(|value| !value.is_table() || !self.is_mutated(term))
    }

    /// Whether any `TableSet` still writes into `term`.
    pub fn is_mutated(&self, term: &T) -> bool {
        self.uses_of(term).iter().any(|op| op.mutates(term.id()))
    }

    /// Terms currently holding `value`, most recently registered first.
    pub fn terms_holding(&self, value: &IrConst) -> &[T] {
        self.constants
            .get(value)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn constants(&self) -> impl Iterator<Item = (&IrConst, &[T])> {
        self.constants
            .iter()
            .map(|(value, terms)| (value, terms.as_slice()))
    }

    pub fn terms(&self) -> impl Iterator<Item = (TermId, &Stats<T>)> {
        self.terms.iter().map(|(id, stats)| (*id, stats))
    }

    fn stats_mut(&mut self, term: &T) -> &mut Stats<T> {
        self.terms.entry(term.id()).or_default()
    }

    /// Drops the entry of a term that is neither defined nor used anymore.
    fn forget_if_empty(&mut self, term: &T) {
        if self
            .terms
            .get(&term.id())
            .is_some_and(|stats| stats.def.is_none() && stats.uses.is_empty())
        {
            self.terms.remove(&term.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        frontend::{ast::BinaryOperatorKind, ty::Type},
        index::Index,
        middle::ir::{BlockId, op::Tac, term::Term},
    };

    use super::*;

    fn term(id: usize) -> Term {
        Term::temporary(TermId::new(id), Type::Int)
    }

    fn constant(id: usize, value: i64) -> Op<Term> {
        Op::Const {
            to: term(id),
            value: IrConst::Int(value),
        }
    }

    fn add(to: usize, lhs: usize, rhs: usize) -> Op<Term> {
        Op::Tac(Tac::Binary {
            operator: BinaryOperatorKind::Add,
            to: term(to),
            lhs: term(lhs),
            rhs: term(rhs),
        })
    }

    #[test]
    fn deriving_a_const_registers_and_defines() {
        let changes = Change::derive_from(&constant(0, 7));

        assert_eq!(
            changes,
            vec![
                Change::RegisterConstant {
                    value: IrConst::Int(7),
                    term: term(0)
                },
                Change::Define {
                    term: term(0),
                    def: Some(constant(0, 7))
                },
            ]
        );
    }

    #[test]
    fn deriving_a_non_definition_uses_every_term() {
        let changes = Change::derive_from(&Op::Print(term(4)));

        assert_eq!(
            changes,
            vec![Change::AddUse {
                terms: vec![term(4)],
                user: Op::Print(term(4))
            }]
        );
    }

    #[test]
    fn index_built_from_blocks() {
        let block = Block::new(
            BlockId::new(0),
            vec![constant(0, 1), constant(1, 2), add(2, 0, 1), Op::Print(term(2))],
        );

        let data = FunData::from_blocks(&[block]);

        assert_eq!(data.def_of(&term(2)), Some(&add(2, 0, 1)));
        assert_eq!(data.uses_of(&term(0)), &[add(2, 0, 1)]);
        assert_eq!(data.uses_of(&term(2)), &[Op::Print(term(2))]);
        assert_eq!(data.terms_holding(&IrConst::Int(1)), &[term(0)]);
        assert_eq!(data.const_value_of(&term(1)), Some(&IrConst::Int(2)));
    }

    #[test]
    fn unknown_terms_start_empty() {
        let data = FunData::<Term>::default().apply(&[Change::AddUse {
            terms: vec![term(9)],
            user: Op::Ret(term(9)),
        }]);

        let stats = data.stats(TermId::new(9)).unwrap();
        assert_eq!(stats.def, None);
        assert_eq!(stats.uses, vec![Op::Ret(term(9))]);
    }

    #[test]
    fn constants_are_listed_most_recent_first_without_duplicates() {
        let data = FunData::<Term>::default().apply(&[
            Change::RegisterConstant {
                value: IrConst::Int(1),
                term: term(0),
            },
            Change::RegisterConstant {
                value: IrConst::Int(1),
                term: term(3),
            },
            Change::RegisterConstant {
                value: IrConst::Int(1),
                term: term(0),
            },
        ]);

        assert_eq!(data.terms_holding(&IrConst::Int(1)), &[term(0), term(3)]);
    }

    #[test]
    fn deregistering_the_last_term_drops_the_value() {
        let data = FunData::<Term>::default().apply(&[
            Change::RegisterConstant {
                value: IrConst::Int(1),
                term: term(0),
            },
            Change::DeregisterConstant {
                value: IrConst::Int(1),
                term: term(0),
            },
        ]);

        assert_eq!(data.constants().count(), 0);
    }

    #[test]
    fn removal_undoes_derivation() {
        let base = FunData::from_blocks(&[Block::new(
            BlockId::new(0),
            vec![constant(0, 1), constant(1, 2)],
        )]);

        let op = add(2, 0, 1);
        let with = base.clone().apply(&Change::derive_from(&op));
        let without = with.apply(&Change::derive_removal(&op));

        assert_eq!(without.uses_of(&term(0)), &[] as &[Op<Term>]);
        assert_eq!(without.def_of(&term(2)), None);
        assert_eq!(without.def_of(&term(0)), base.def_of(&term(0)));
    }

    #[test]
    fn replacement_moves_uses_to_the_new_instruction() {
        let old = add(2, 0, 1);
        let new = Op::Const {
            to: term(2),
            value: IrConst::Int(3),
        };

        let data = FunData::from_blocks(&[Block::new(
            BlockId::new(0),
            vec![constant(0, 1), constant(1, 2), old.clone()],
        )])
        .apply(&Change::derive_replacement(&old, &new));

        assert!(data.uses_of(&term(0)).is_empty());
        assert!(data.uses_of(&term(1)).is_empty());
        assert_eq!(data.def_of(&term(2)), Some(&new));
        assert_eq!(data.terms_holding(&IrConst::Int(3)), &[term(2)]);
    }

    #[test]
    fn removing_one_of_two_identical_uses_keeps_the_other() {
        let data = FunData::from_blocks(&[Block::new(
            BlockId::new(0),
            vec![constant(0, 1), Op::Print(term(0)), Op::Print(term(0))],
        )]);
        assert_eq!(data.uses_of(&term(0)).len(), 2);

        let data = data.apply(&Change::derive_removal(&Op::Print(term(0))));

        assert_eq!(data.uses_of(&term(0)), &[Op::Print(term(0))]);
    }

    #[test]
    fn operands_read_twice_are_released_twice() {
        let base = FunData::from_blocks(&[Block::new(BlockId::new(0), vec![constant(0, 1)])]);
        let doubled = add(1, 0, 0);

        let with = base.clone().apply(&Change::derive_from(&doubled));
        assert_eq!(with.uses_of(&term(0)).len(), 2);

        let without = with.apply(&Change::derive_removal(&doubled));
        assert_eq!(without, base);
    }

    #[test]
    fn forgotten_terms_leave_no_entry() {
        let base = FunData::from_blocks(&[Block::new(
            BlockId::new(0),
            vec![constant(0, 1), constant(1, 2)],
        )]);

        let data = base
            .apply(&Change::derive_from(&add(2, 0, 1)))
            .apply(&Change::derive_removal(&add(2, 0, 1)))
            .apply(&Change::derive_removal(&constant(1, 2)));

        assert!(data.stats(TermId::new(1)).is_none());
        assert!(data.stats(TermId::new(2)).is_none());
        assert!(data.stats(TermId::new(0)).is_some());
        assert_eq!(data.terms().count(), 1);
    }

    #[test]
    fn mutated_tables_are_not_settled() {
        let table = Term::temporary(TermId::new(0), Type::table(Type::Int, Type::Int));
        let set = Op::Tac(Tac::TableSet {
            table: table.clone(),
            key: term(1),
            value: term(2),
        });

        let data = FunData::from_blocks(&[Block::new(
            BlockId::new(0),
            vec![
                Op::Const {
                    to: table.clone(),
                    value: IrConst::EmptyTable,
                },
                constant(1, 1),
                constant(2, 2),
                set.clone(),
            ],
        )]);

        assert_eq!(data.settled_const(&term(1)), Some(&IrConst::Int(1)));
        assert_eq!(data.settled_const(&table), None);

        let data = data.apply(&Change::derive_removal(&set));

        assert_eq!(data.settled_const(&table), Some(&IrConst::EmptyTable));
    }
}
