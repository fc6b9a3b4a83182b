use std::path::{Path, PathBuf};

use clap::{ArgAction, CommandFactory, Parser, error::ErrorKind};
use colored::Colorize;
use hashbrown::HashSet;

use nevec::{
    frontend::load_module,
    logger::StderrLogger,
    middle::{
        ir::{
            IdSystem, ast_lowering::lower_module, lifetime::cool_ir,
            pretty_print::pretty_print_ir,
        },
        optimization::{OptConfig, OptId, Optimizer},
    },
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Type checked modules, as JSON
    source_files: Vec<PathBuf>,

    /// Print the IR straight out of lowering
    #[arg(long)]
    show_ir: bool,

    /// Print the optimized IR
    #[arg(long)]
    show_opt_ir: bool,

    /// Print the optimized IR annotated with term lifetimes
    #[arg(long)]
    show_lifetimes: bool,

    /// Skip constant folding
    #[arg(long)]
    no_opt: bool,

    #[arg(long)]
    opt_no_const_fold: bool,

    #[arg(long)]
    opt_no_table_propagation: bool,

    #[arg(long)]
    opt_no_const_reuse: bool,

    #[arg(long)]
    opt_no_dead_term_elim: bool,

    /// Disable a pass by id, e.g. `dead-term-elim`
    #[arg(long, value_name = "PASS")]
    disable_pass: Vec<OptId>,

    /// Maximum number of rounds over the pass list
    #[arg(long, default_value_t = 3)]
    repetitions: usize,

    /// Run every round even when one changes nothing
    #[arg(long)]
    fixed_repetitions: bool,

    /// Log more, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn opt_config(&self) -> OptConfig {
        let flags = [
            (self.no_opt || self.opt_no_const_fold, OptId::ConstFold),
            (self.opt_no_table_propagation, OptId::TablePropagation),
            (self.opt_no_const_reuse, OptId::ConstReuse),
            (self.opt_no_dead_term_elim, OptId::DeadTermElim),
        ];

        let disabled = flags
            .into_iter()
            .filter_map(|(disabled, id)| disabled.then_some(id))
            .chain(self.disable_pass.iter().copied())
            .collect::<HashSet<_>>();

        OptConfig {
            disabled,
            repetitions: self.repetitions,
            stop_when_unchanged: !self.fixed_repetitions,
        }
    }

    fn shows_anything(&self) -> bool {
        self.show_ir || self.show_opt_ir || self.show_lifetimes
    }
}

fn main() {
    let args = Args::parse();

    StderrLogger::install(StderrLogger::level_for_verbosity(args.verbose));

    if args.source_files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "Missing source files!")
            .exit();
    }

    for source_file in &args.source_files {
        if !source_file.exists() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Source file '{}' does not exist!", source_file.display()),
                )
                .exit()
        }

        if !source_file.is_file() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Input path '{}' is not a file!", source_file.display()),
                )
                .exit()
        }
    }

    let optimizer = Optimizer::new(args.opt_config());
    let mut ids = IdSystem::new();

    for source_file in &args.source_files {
        let module = match load_module(source_file) {
            Ok(module) => module,
            Err(error) => Args::command().error(ErrorKind::Io, error).exit(),
        };

        let ir = lower_module(&module, ids);

        if args.show_ir {
            print_section("IR", source_file);
            pretty_print_ir(&ir.functions);
        }

        let optimized = optimizer.optimize(ir);

        if args.show_opt_ir || !args.shows_anything() {
            print_section("Optimized IR", source_file);
            pretty_print_ir(&optimized.functions);
        }

        if args.show_lifetimes {
            print_section("Lifetimes", source_file);
            pretty_print_ir(&cool_ir(&optimized).functions);
        }

        // Ids carry over so that they stay unique program wide
        ids = optimized.ids;
    }
}

fn print_section(title: &str, source_file: &Path) {
    println!(
        "{} {}",
        format!("== {title}").bright_red(),
        source_file.display().to_string().dimmed()
    );
}

