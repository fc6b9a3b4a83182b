//! Lowers the typed AST into the linear IR, one [`IrFun`] per function.
//!
//! Every expression becomes a [`Compose`] whose last instruction defines the
//! expression's value. Operands are lowered left to right before the
//! instruction combining them, so evaluation order is preserved.

use log::{debug, trace};

use crate::{
    frontend::{
        ast::{
            BinaryOperatorKind, Expression, ExpressionKind, FunctionDefinition, Interpolation,
            Item, Literal, Module, Statement,
        },
        ty::Type,
    },
    internal_error,
};

use super::{
    IdSystem, Ir, IrFun,
    compose::{Compose, Zipping},
    constant::IrConst,
    op::{Op, Tac, UnaryOperator},
    term::Term,
};

/// Lowers every function of `module`, drawing fresh ids from `ids`.
pub fn lower_module(module: &Module, ids: IdSystem) -> Ir<Term> {
    let mut lowering = AstLowering { ids };

    let functions = module
        .items
        .iter()
        .map(|item| lowering.lower_item(item))
        .collect();

    Ir {
        functions,
        ids: lowering.ids,
    }
}

struct AstLowering {
    ids: IdSystem,
}

impl AstLowering {
    fn lower_item(&mut self, item: &Item) -> IrFun<Term> {
        match item {
            Item::FunctionDefinition(function) => self.lower_function(function),
            Item::Empty => internal_error!("empty items cannot reach lowering"),
        }
    }

    fn lower_function(&mut self, function: &FunctionDefinition) -> IrFun<Term> {
        let body = function
            .body
            .iter()
            .map(|statement| self.lower_statement(statement))
            .fold(Compose::new(), Compose::merge);

        debug!(
            "lowered `{}` into {} instructions",
            function.name,
            body.ops().len()
        );

        let block = self.ids.new_block(body.into_ops());

        IrFun::from_blocks(function.name, vec![block])
    }

    fn lower_statement(&mut self, statement: &Statement) -> Compose {
        match statement {
            Statement::Print(expression) => self
                .lower_expression(expression)
                .with_last(|term| Op::Print(term.clone())),
            Statement::Return(expression) => self
                .lower_expression(expression)
                .with_last(|term| Op::Ret(term.clone())),
            Statement::Expression(expression) => self.lower_expression(expression),
        }
    }

    fn lower_expression(&mut self, expression: &Expression) -> Compose {
        match &expression.kind {
            ExpressionKind::Literal(literal) => self.lower_literal(literal, &expression.ty),
            ExpressionKind::Parenthesized(inner) => self.lower_expression(inner),
            ExpressionKind::Show(inner) => {
                self.lower_unary(UnaryOperator::Show, inner, &expression.ty)
            }
            ExpressionKind::Unary { operator, operand } => {
                self.lower_unary((*operator).into(), operand, &expression.ty)
            }
            ExpressionKind::Binary { operator, lhs, rhs } => {
                let lhs = self.lower_expression(lhs);
                let rhs = self.lower_expression(rhs);

                lhs.join(rhs)
                    .then(|terms| {
                        let [lhs, rhs] = terms else {
                            internal_error!("binary operations take exactly two operands")
                        };

                        Op::Tac(Tac::Binary {
                            operator: *operator,
                            to: self.ids.new_term(expression.ty.clone()),
                            lhs: lhs.clone(),
                            rhs: rhs.clone(),
                        })
                    })
                    .connect()
            }
            ExpressionKind::Interpolation(interpolation) => {
                self.lower_interpolation(interpolation)
            }
            ExpressionKind::Empty => internal_error!("empty expressions cannot reach lowering"),
        }
    }

    fn lower_unary(&mut self, operator: UnaryOperator, operand: &Expression, ty: &Type) -> Compose {
        self.lower_expression(operand).with_last(|operand| {
            Op::Tac(Tac::Unary {
                operator,
                to: self.ids.new_term(ty.clone()),
                operand: operand.clone(),
            })
        })
    }

    fn lower_literal(&mut self, literal: &Literal, ty: &Type) -> Compose {
        let value = match literal {
            Literal::Integer(value) => IrConst::Int(*value),
            Literal::Float(value) => IrConst::Float(*value),
            Literal::Boolean(value) => IrConst::Bool(*value),
            Literal::String(value) => IrConst::Str(value.clone()),
            Literal::Nil => IrConst::Nil,
            Literal::Table { keys, values } => return self.lower_table(keys, values, ty),
        };

        self.new_const(value, ty.clone())
    }

    /// `[k0: v0, k1: v1]` becomes the keys, the values, an empty table and
    /// then one `TableSet` per entry, in source order.
    fn lower_table(&mut self, keys: &[Expression], values: &[Expression], ty: &Type) -> Compose {
        let keys = keys
            .iter()
            .map(|key| self.lower_expression(key))
            .collect::<Vec<_>>();
        let values = values
            .iter()
            .map(|value| self.lower_expression(value))
            .collect::<Vec<_>>();

        let table = self.new_const(IrConst::EmptyTable, ty.clone());
        let table_term = table.term().clone();

        trace!("table literal with {} entries", keys.len());

        Zipping::new(keys, values)
            .each(|key, value| {
                Op::Tac(Tac::TableSet {
                    table: table_term.clone(),
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .plug_in_between(table)
    }

    /// `"a#{x}rest"` becomes `concat(concat("a", show x), rest)`, with the
    /// rest lowered once and only read by the outer concatenation.
    fn lower_interpolation(&mut self, interpolation: &Interpolation) -> Compose {
        match interpolation {
            Interpolation::End { string } => self.new_const(IrConst::Str(string.clone()), Type::Str),
            Interpolation::Some {
                string,
                expression,
                next,
            } => {
                let string = self.new_const(IrConst::Str(string.clone()), Type::Str);
                let shown = self.lower_unary(UnaryOperator::Show, expression, &Type::Str);
                let next = self.lower_interpolation(next);
                let rest = next.term().clone();

                string
                    .join(shown)
                    .join(next)
                    .then(|terms| self.concat(&terms[..2]))
                    .connect()
                    .viewing(rest)
                    .then(|terms| self.concat(terms))
                    .connect()
            }
        }
    }

    fn concat(&mut self, terms: &[Term]) -> Op<Term> {
        let [lhs, rhs] = terms else {
            internal_error!("concatenation takes exactly two operands")
        };

        Op::Tac(Tac::Binary {
            operator: BinaryOperatorKind::Concat,
            to: self.ids.new_term(Type::Str),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        })
    }

    fn new_const(&mut self, value: IrConst, ty: Type) -> Compose {
        Compose::single(Op::Const {
            to: self.ids.new_term(ty),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::{frontend::ast::UnaryOperatorKind, middle::ir::pretty_print::render_plain};

    use super::*;

    fn lower_main(body: Vec<Statement>) -> Ir<Term> {
        let module = Module {
            items: vec![Item::FunctionDefinition(FunctionDefinition::new("main", body))],
        };

        lower_module(&module, IdSystem::new())
    }

    #[test]
    fn binary_operands_come_first() {
        let ir = lower_main(vec![Statement::Print(Expression::binary(
            BinaryOperatorKind::Add,
            Expression::int(1),
            Expression::int(2),
        ))]);

        assert_eq!(
            render_plain(&ir.functions),
            indoc! {"
                fun main
                bb0:
                    t0 = 1
                    t1 = 2
                    t2 = t0 + t1
                    print t2
                end"}
        );
    }

    #[test]
    fn nested_binaries_keep_evaluation_order() {
        let ir = lower_main(vec![Statement::Return(Expression::binary(
            BinaryOperatorKind::Multiply,
            Expression::parenthesized(Expression::binary(
                BinaryOperatorKind::Subtract,
                Expression::int(1),
                Expression::int(2),
            )),
            Expression::unary(UnaryOperatorKind::Negate, Expression::int(3)),
        ))]);

        assert_eq!(
            render_plain(&ir.functions),
            indoc! {"
                fun main
                bb0:
                    t0 = 1
                    t1 = 2
                    t2 = t0 - t1
                    t3 = 3
                    t4 = -t3
                    t5 = t2 * t4
                    ret t5
                end"}
        );
    }

    #[test]
    fn table_literals_become_sets_after_an_empty_table() {
        let ir = lower_main(vec![Statement::Print(Expression::table(vec![
            (Expression::string("a"), Expression::int(1)),
            (Expression::string("b"), Expression::int(2)),
        ]))]);

        assert_eq!(
            render_plain(&ir.functions),
            indoc! {r#"
                fun main
                bb0:
                    t0 = "a"
                    t1 = "b"
                    t2 = 1
                    t3 = 2
                    t4 = [:]
                    t4[t0] = t2
                    t4[t1] = t3
                    print t4
                end"#}
        );
    }

    #[test]
    fn interpolation_concatenates_shown_values() {
        let ir = lower_main(vec![Statement::Print(Expression::interpolation(
            vec![("x = ".to_owned(), Expression::bool(true))],
            "!",
        ))]);

        assert_eq!(
            render_plain(&ir.functions),
            indoc! {r#"
                fun main
                bb0:
                    t0 = "x = "
                    t1 = true
                    t2 = show t1
                    t3 = "!"
                    t4 = t0 concat t2
                    t5 = t4 concat t3
                    print t5
                end"#}
        );
    }

    #[test]
    fn index_is_consistent_after_lowering() {
        let ir = lower_main(vec![Statement::Print(Expression::binary(
            BinaryOperatorKind::Equals,
            Expression::nil(),
            Expression::nil(),
        ))]);

        let function = &ir.functions[0];

        for op in function.ops() {
            for term in op.used_terms() {
                assert!(function.data.uses_of(term).contains(op));
            }
        }
        assert_eq!(function.data.terms_holding(&IrConst::Nil).len(), 2);
    }

    #[test]
    fn ids_continue_across_modules() {
        let module = Module {
            items: vec![Item::FunctionDefinition(FunctionDefinition::new(
                "main",
                vec![Statement::Print(Expression::int(1))],
            ))],
        };

        let first = lower_module(&module, IdSystem::new());
        let second = lower_module(&module, first.ids.clone());

        let first_term = first.functions[0].blocks[0].ops[0].term().id;
        let second_term = second.functions[0].blocks[0].ops[0].term().id;

        assert_ne!(first_term, second_term);
        assert_ne!(first.functions[0].blocks[0].id, second.functions[0].blocks[0].id);
    }

    #[test]
    #[should_panic(expected = "empty expressions cannot reach lowering")]
    fn empty_expressions_are_fatal() {
        lower_main(vec![Statement::Expression(Expression::empty(Type::Int))]);
    }
}
