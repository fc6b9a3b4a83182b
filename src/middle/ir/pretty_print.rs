use std::hash::Hash;

use colored::Colorize;
use hashbrown::HashMap;
use itertools::Itertools;

use crate::frontend::intern::InternedSymbol;

use super::{
    Block, BlockId, IrFun,
    op::{Op, Tac, UnaryOperator},
    term::{TermId, TermLike},
};

pub fn pretty_print_ir<T: TermLike>(functions: &[IrFun<T>]) {
    println!("{}", render(functions));
}

/// Renders functions with colours, naming every term and block after its
/// desired name plus a discriminator in order of first appearance.
pub fn render<T: TermLike>(functions: &[IrFun<T>]) -> String {
    let mut rendition = Rendition::default();

    functions
        .iter()
        .map(|function| rendition.function(function))
        .join("\n")
}

pub fn render_plain<T: TermLike>(functions: &[IrFun<T>]) -> String {
    strip_ansi_escapes::strip_str(render(functions))
}

#[derive(Debug, Default)]
struct Rendition {
    block_names: Names<BlockId>,
    term_names: Names<TermId>,
}

impl Rendition {
    fn function<T: TermLike>(&mut self, function: &IrFun<T>) -> String {
        let mut lines = vec![format!(
            "{} {}",
            "fun".magenta(),
            function.name.value().blue()
        )];

        lines.extend(function.blocks.iter().map(|block| self.block(block)));
        lines.push("end".magenta().to_string());

        lines.join("\n")
    }

    fn block<T: TermLike>(&mut self, block: &Block<T>) -> String {
        let name = self.block_names.name_for(block.id, block.desired_name);

        std::iter::once(format!("{name}:").bright_red().to_string())
            .chain(block.ops.iter().map(|op| format!("    {}", self.op(op))))
            .join("\n")
    }

    fn op<T: TermLike>(&mut self, op: &Op<T>) -> String {
        let rendered = match op {
            Op::Ret(term) => format!("{} {}", "ret".cyan(), self.term(term)),
            Op::Print(term) => format!("{} {}", "print".cyan(), self.term(term)),
            Op::Const { to, value } => format!(
                "{} {} {}",
                self.term(to),
                "=".white(),
                value.to_string().purple()
            ),
            Op::Tac(tac) => self.tac(tac),
            Op::Dummy(term) => format!("{} {}", "dummy".red(), self.term(term)),
        };

        match op.term().lifetime() {
            Some(lifetime) if op.is_definition() => {
                format!("{rendered}  {}", format!("; live {lifetime}").dimmed())
            }
            _ => rendered,
        }
    }

    fn tac<T: TermLike>(&mut self, tac: &Tac<T>) -> String {
        match tac {
            Tac::Unary {
                operator,
                to,
                operand,
            } => {
                let operator = match operator {
                    UnaryOperator::Negate => operator.to_string(),
                    UnaryOperator::LogicalNot | UnaryOperator::Show => format!("{operator} "),
                };

                format!(
                    "{} {} {}{}",
                    self.term(to),
                    "=".white(),
                    operator.cyan(),
                    self.term(operand)
                )
            }
            Tac::Binary {
                operator,
                to,
                lhs,
                rhs,
            } => format!(
                "{} {} {} {} {}",
                self.term(to),
                "=".white(),
                self.term(lhs),
                operator.to_string().white(),
                self.term(rhs)
            ),
            Tac::TableSet { table, key, value } => format!(
                "{}[{}] {} {}",
                self.term(table),
                self.term(key),
                "=".white(),
                self.term(value)
            ),
        }
    }

    fn term<T: TermLike>(&mut self, term: &T) -> String {
        self.term_names
            .name_for(term.id(), term.desired_name())
            .yellow()
            .to_string()
    }
}

/// Hands out unique display names: `t0`, `t1`, ... per desired name.
#[derive(Debug)]
struct Names<K> {
    next_discriminator: HashMap<InternedSymbol, usize>,
    names: HashMap<K, String>,
}

impl<K> Default for Names<K> {
    fn default() -> Self {
        Self {
            next_discriminator: HashMap::new(),
            names: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> Names<K> {
    fn name_for(&mut self, key: K, desired: InternedSymbol) -> String {
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }

        let discriminator = self.next_discriminator.entry(desired).or_insert(0);
        let name = format!("{desired}{discriminator}");
        *discriminator += 1;

        self.names.insert(key, name.clone());

        name
    }
}
