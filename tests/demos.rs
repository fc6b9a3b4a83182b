use std::path::PathBuf;

use indoc::indoc;

use nevec::{
    frontend::load_module,
    middle::{
        ir::{IdSystem, ast_lowering::lower_module, pretty_print::render_plain},
        optimization::Optimizer,
    },
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

fn compile(name: &str) -> String {
    let module = load_module(&demo(name)).unwrap();
    let ir = Optimizer::default().optimize(lower_module(&module, IdSystem::new()));

    render_plain(&ir.functions)
}

#[test]
fn arithmetic_folds_away() {
    // The second sum folds to 2, which the untouched literal `2` of the first
    // statement already holds
    assert_eq!(
        compile("arithmetic.json"),
        indoc! {"
            fun main
            bb0:
                t0 = 2
                t1 = -9
                print t1
                print t0
            end"}
    );
}

#[test]
fn tables_fold_into_their_shown_text() {
    assert_eq!(
        compile("table.json"),
        indoc! {r#"
            fun main
            bb0:
                t0 = "fruit = ["type": "Banana", "quality": "Excellent"]!"
                print t0
                t1 = nil
                ret t1
            end"#}
    );
}

#[test]
fn missing_files_are_io_errors() {
    let error = load_module(&demo("missing.json")).unwrap_err();

    assert!(error.to_string().contains("missing.json"), "{error}");
}
