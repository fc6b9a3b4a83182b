//! Optimization of the linear IR.
//!
//! Every function is optimized on its own by running the pass list over a
//! [`Canvas`] for a bounded number of rounds.

use hashbrown::HashSet;
use log::{debug, info};
use strum::{Display, EnumIter, EnumString};

use self::{
    canvas::Canvas, const_fold::ConstFold, const_reuse::ConstReuse,
    dead_term_elim::DeadTermElim, table_propagation::TablePropagation,
};

use super::ir::{IdSystem, Ir, IrFun, term::Term};

pub mod canvas;
pub mod const_fold;
pub mod const_reuse;
pub mod dead_term_elim;
pub mod table_propagation;

/// Names a pass, so that it can be switched off from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum OptId {
    ConstFold,
    TablePropagation,
    ConstReuse,
    DeadTermElim,
}

pub trait Pass {
    fn id(&self) -> OptId;

    /// Runs one traversal over the canvas. The caller finishes it.
    fn apply(&self, canvas: Canvas) -> Canvas;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptConfig {
    pub disabled: HashSet<OptId>,
    /// Upper bound on the number of rounds over the pass list
    pub repetitions: usize,
    /// Stop as soon as a whole round leaves the function untouched
    pub stop_when_unchanged: bool,
}

impl Default for OptConfig {
    fn default() -> Self {
        Self {
            disabled: HashSet::new(),
            repetitions: 3,
            stop_when_unchanged: true,
        }
    }
}

impl OptConfig {
    pub fn is_enabled(&self, id: OptId) -> bool {
        !self.disabled.contains(&id)
    }
}

/// The outcome of optimizing one function.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub function: IrFun<Term>,
    pub ids: IdSystem,
    /// How many rounds over the pass list actually ran
    pub rounds: usize,
}

pub struct Optimizer {
    config: OptConfig,
    passes: Vec<Box<dyn Pass>>,
}

impl Optimizer {
    pub fn new(config: OptConfig) -> Self {
        Self {
            config,
            passes: vec![
                Box::new(ConstFold),
                Box::new(TablePropagation),
                Box::new(ConstReuse),
                Box::new(DeadTermElim),
            ],
        }
    }

    pub fn config(&self) -> &OptConfig {
        &self.config
    }

    /// Optimizes every function, threading the id system through them.
    pub fn optimize(&self, ir: Ir<Term>) -> Ir<Term> {
        let mut ids = ir.ids;
        let mut functions = Vec::with_capacity(ir.functions.len());

        for function in ir.functions {
            let optimized = self.optimize_function(function, ids);

            functions.push(optimized.function);
            ids = optimized.ids;
        }

        Ir { functions, ids }
    }

    pub fn optimize_function(&self, function: IrFun<Term>, ids: IdSystem) -> Optimized {
        let name = function.name;
        let before = function.op_count();

        let mut canvas = Canvas::new(function, ids);
        let mut rounds = 0;

        while rounds < self.config.repetitions {
            if rounds > 0 && self.config.stop_when_unchanged && canvas.is_unchanged() {
                break;
            }

            canvas = canvas.changeless();

            for pass in self.passes.iter().filter(|pass| self.config.is_enabled(pass.id())) {
                canvas = pass.apply(canvas).finish();

                debug!(
                    "`{name}` round {rounds}: {} left {} instructions",
                    pass.id(),
                    canvas.produced().op_count()
                );
            }

            rounds += 1;
        }

        let (function, ids) = canvas.extract();

        info!(
            "optimized `{name}` in {rounds} rounds, {before} -> {} instructions",
            function.op_count()
        );

        Optimized {
            function,
            ids,
            rounds,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptConfig::default())
    }
}
