use std::path::PathBuf;

use crate::frontend::SourceFileOrigin;

/// Expands to the name of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        type_name_of(f)
            .rsplit("::")
            .find(|&part| part != "f" && part != "{{closure}}")
            .unwrap_or("<unknown>")
    }};
}

/// Aborts compilation on a broken compiler invariant. Never used for problems
/// in the input program, which the type checker has already ruled out.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)+) => {{
        use colored::Colorize as _;

        let message = format!("{}: {}", "internal compiler error".red(), format!($($arg)+));

        #[cfg(feature = "error-backtrace")]
        let message = format!(
            "{}: {}\n{}",
            "backtrace".blue(),
            format!(
                "{}::{} {}",
                module_path!(),
                $crate::function!(),
                format!("(at {}:{}:{})", file!(), line!(), column!()).white()
            ),
            message
        );

        panic!("{}", message)
    }};
}

/// Errors from reading a typed AST dump off disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{origin}' is not a valid typed module: {source}")]
    Json {
        origin: SourceFileOrigin,
        #[source]
        source: serde_json::Error,
    },
}
