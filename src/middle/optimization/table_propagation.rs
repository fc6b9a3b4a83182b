//! Folds constant writes into the table constant they write into.
//!
//! ```text
//! t0 = "type"                        t0 = "type"
//! t1 = "Banana"                      t1 = "Banana"
//! t2 = [:]                   ==>     t2 = ["type": "Banana"]
//! t2[t0] = t1
//! print t2                           print t2
//! ```
//!
//! Only the writes that happen before anything else reads the table are
//! folded, in program order. A later write to an existing key overrides it in
//! place.

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::trace;

use crate::middle::ir::{
    IrFun,
    constant::IrConst,
    data::{Change, FunData},
    op::{Op, Tac},
    term::{Term, TermId},
};

use super::{
    OptId, Pass,
    canvas::{Canvas, Transform},
};

pub struct TablePropagation;

impl Pass for TablePropagation {
    fn id(&self) -> OptId {
        OptId::TablePropagation
    }

    fn apply(&self, canvas: Canvas) -> Canvas {
        let users = table_users(canvas.model());

        // Model positions of the writes already merged into their table
        let mut merged_writes = HashSet::<usize>::new();

        canvas.each_position(|position, _, data, op| match op {
            Op::Const { to, value } if value.is_table() => {
                let users = users.get(&to.id).map(Vec::as_slice).unwrap_or_default();

                match propagate(to, value, users, data) {
                    Some((merged, folded)) => {
                        trace!("folded {} writes into {merged}", folded.len());

                        let new = Op::Const {
                            to: to.clone(),
                            value: merged,
                        };
                        let mut changes = Change::derive_replacement(op, &new);

                        // The writes themselves go away once the traversal
                        // reaches them
                        for (position, user) in folded {
                            merged_writes.insert(position);
                            changes.push(Change::RemoveUse {
                                terms: vec![to.clone()],
                                user,
                            });
                        }

                        Transform::Replace { new, changes }
                    }
                    None => Transform::Retain,
                }
            }
            Op::Tac(Tac::TableSet { key, value, .. }) if merged_writes.contains(&position) => {
                Transform::Remove {
                    changes: vec![Change::RemoveUse {
                        terms: vec![key.clone(), value.clone()],
                        user: op.clone(),
                    }],
                }
            }
            _ => Transform::Retain,
        })
    }
}

/// Every instruction reading a table constant with its model position, in
/// program order.
fn table_users(function: &IrFun<Term>) -> HashMap<TermId, Vec<(usize, Op<Term>)>> {
    let tables = function
        .ops()
        .filter_map(|op| match op {
            Op::Const { to, value } if value.is_table() => Some(to.id),
            _ => None,
        })
        .collect::<HashSet<_>>();

    let mut users = HashMap::<TermId, Vec<(usize, Op<Term>)>>::new();

    for (position, op) in function.ops().enumerate() {
        for term in op.used_terms().into_iter().unique() {
            if tables.contains(&term.id) {
                users
                    .entry(term.id)
                    .or_default()
                    .push((position, op.clone()));
            }
        }
    }

    users
}

/// Merges the longest run of constant writes at the start of `users` into
/// `value`. Returns the merged table and the writes it absorbed.
fn propagate(
    table: &Term,
    value: &IrConst,
    users: &[(usize, Op<Term>)],
    data: &FunData<Term>,
) -> Option<(IrConst, Vec<(usize, Op<Term>)>)> {
    let mut entries = value.entries()?.to_vec();
    let mut folded = Vec::new();

    for (position, user) in users {
        let Op::Tac(Tac::TableSet {
            table: target,
            key,
            value,
        }) = user
        else {
            break;
        };

        // The table is only a key or value of another table
        if target.id != table.id {
            break;
        }

        let (Some(key), Some(value)) = (data.settled_const(key), data.settled_const(value)) else {
            break;
        };

        match entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value.clone(),
            None => entries.push((key.clone(), value.clone())),
        }

        folded.push((*position, user.clone()));
    }

    if folded.is_empty() {
        return None;
    }

    Some((IrConst::table(entries), folded))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::{
        frontend::{
            ast::{BinaryOperatorKind, Expression, Statement},
            intern::InternedSymbol,
            ty::Type,
        },
        middle::{
            ir::{IdSystem, pretty_print::render_plain},
            optimization::tests::{lower_main, run_pass},
        },
    };

    use super::*;

    fn string(ids: &mut IdSystem, value: &str) -> (Term, Op<Term>) {
        let term = ids.new_term(Type::Str);
        let op = Op::Const {
            to: term.clone(),
            value: IrConst::Str(value.into()),
        };

        (term, op)
    }

    fn set(table: &Term, key: &Term, value: &Term) -> Op<Term> {
        Op::Tac(Tac::TableSet {
            table: table.clone(),
            key: key.clone(),
            value: value.clone(),
        })
    }

    fn run(ids: &mut IdSystem, ops: Vec<Op<Term>>) -> String {
        let block = ids.new_block(ops);
        let function = IrFun::from_blocks(InternedSymbol::new("main"), vec![block]);

        let canvas = TablePropagation
            .apply(Canvas::new(function, ids.clone()))
            .finish();

        render_plain(&[canvas.produced().clone()])
    }

    #[test]
    fn literal_entries_fold_into_the_table() {
        let rendered = run_pass(
            &TablePropagation,
            vec![Statement::Print(Expression::table(vec![
                (Expression::string("a"), Expression::int(1)),
                (Expression::string("b"), Expression::int(2)),
            ]))],
        );

        assert_eq!(
            rendered,
            indoc! {r#"
                fun main
                bb0:
                    t0 = "a"
                    t1 = "b"
                    t2 = 1
                    t3 = 2
                    t4 = ["a": 1, "b": 2]
                    print t4
                end"#}
        );
    }

    #[test]
    fn folded_writes_release_their_operands() {
        let (function, ids) = lower_main(vec![Statement::Print(Expression::table(vec![(
            Expression::string("a"),
            Expression::int(1),
        )]))]);

        let canvas = TablePropagation.apply(Canvas::new(function, ids)).finish();
        let produced = canvas.produced();

        for op in produced.ops().take(2) {
            assert!(produced.data.uses_of(op.term()).is_empty());
        }

        let Some(table) = produced.ops().nth(2).map(|op| op.term().clone()) else {
            panic!("the table should still be defined");
        };

        assert_eq!(produced.data.uses_of(&table), &[Op::Print(table.clone())]);
        assert!(!produced.data.is_mutated(&table));
    }

    #[test]
    fn later_writes_override_existing_keys() {
        let mut ids = IdSystem::new();
        let (key, key_op) = string(&mut ids, "k");
        let (first, first_op) = string(&mut ids, "first");
        let (second, second_op) = string(&mut ids, "second");
        let table = ids.new_term(Type::table(Type::Str, Type::Str));

        let rendered = run(
            &mut ids,
            vec![
                key_op,
                first_op,
                second_op,
                Op::Const {
                    to: table.clone(),
                    value: IrConst::table(vec![(
                        IrConst::Str("z".into()),
                        IrConst::Str("zero".into()),
                    )]),
                },
                set(&table, &key, &first),
                set(&table, &key, &second),
                Op::Print(table.clone()),
            ],
        );

        assert!(
            rendered.contains(r#"t3 = ["z": "zero", "k": "second"]"#),
            "{rendered}"
        );
        assert!(!rendered.contains("t3[t0]"), "{rendered}");
    }

    #[test]
    fn writes_after_a_read_stay() {
        let mut ids = IdSystem::new();
        let (key, key_op) = string(&mut ids, "k");
        let (value, value_op) = string(&mut ids, "v");
        let table = ids.new_term(Type::table(Type::Str, Type::Str));

        let rendered = run(
            &mut ids,
            vec![
                key_op,
                value_op,
                Op::Const {
                    to: table.clone(),
                    value: IrConst::EmptyTable,
                },
                Op::Print(table.clone()),
                set(&table, &key, &value),
                Op::Print(table.clone()),
            ],
        );

        assert_eq!(
            rendered,
            indoc! {r#"
                fun main
                bb0:
                    t0 = "k"
                    t1 = "v"
                    t2 = [:]
                    print t2
                    t2[t0] = t1
                    print t2
                end"#}
        );
    }

    #[test]
    fn an_unfolded_twin_of_a_folded_write_stays() {
        let mut ids = IdSystem::new();
        let (key, key_op) = string(&mut ids, "k");
        let (value, value_op) = string(&mut ids, "v");
        let computed = ids.new_term(Type::Str);
        let table = ids.new_term(Type::table(Type::Str, Type::Str));

        let block = ids.new_block(vec![
            key_op,
            value_op,
            Op::Tac(Tac::Binary {
                operator: BinaryOperatorKind::Concat,
                to: computed.clone(),
                lhs: value.clone(),
                rhs: value.clone(),
            }),
            Op::Const {
                to: table.clone(),
                value: IrConst::EmptyTable,
            },
            set(&table, &key, &value),
            set(&table, &computed, &value),
            set(&table, &key, &value),
            Op::Print(table.clone()),
        ]);
        let function = IrFun::from_blocks(InternedSymbol::new("main"), vec![block]);

        let canvas = TablePropagation.apply(Canvas::new(function, ids)).finish();
        let produced = canvas.produced();

        assert_eq!(
            render_plain(&[produced.clone()]),
            indoc! {r#"
                fun main
                bb0:
                    t0 = "k"
                    t1 = "v"
                    t2 = t1 concat t1
                    t3 = ["k": "v"]
                    t3[t2] = t1
                    t3[t0] = t1
                    print t3
                end"#}
        );

        let twin = set(&table, &key, &value);
        assert!(produced.data.uses_of(&table).contains(&twin));
        assert_eq!(produced.data.uses_of(&key), &[twin.clone()]);
        assert!(produced.data.uses_of(&value).contains(&twin));
    }

    // Only the writes up to the first one that is not constant are merged,
    // even though the write after it is constant again. Merging it too would
    // move it ahead of the write it follows.
    #[test]
    fn folding_stops_at_a_non_constant_write() {
        let mut ids = IdSystem::new();
        let (key, key_op) = string(&mut ids, "k");
        let (value, value_op) = string(&mut ids, "v");
        let (other, other_op) = string(&mut ids, "o");
        let computed = ids.new_term(Type::Str);
        let table = ids.new_term(Type::table(Type::Str, Type::Str));

        let rendered = run(
            &mut ids,
            vec![
                key_op,
                value_op,
                other_op,
                Op::Const {
                    to: table.clone(),
                    value: IrConst::EmptyTable,
                },
                set(&table, &key, &value),
                Op::Tac(Tac::Binary {
                    operator: BinaryOperatorKind::Concat,
                    to: computed.clone(),
                    lhs: value.clone(),
                    rhs: value.clone(),
                }),
                set(&table, &computed, &value),
                set(&table, &other, &value),
                Op::Print(table.clone()),
            ],
        );

        assert!(rendered.contains(r#"t3 = ["k": "v"]"#), "{rendered}");
        assert!(rendered.contains("t3[t4] = t1"), "{rendered}");
        assert!(rendered.contains("t3[t2] = t1"), "{rendered}");
    }
}
