use std::path::{Path, PathBuf};

use crate::error::LoadError;

use self::ast::Module;

pub mod ast;
pub mod intern;
pub mod ty;

/// A type checked module serialized as JSON, as handed over by the front end.
#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;

        Ok(Self {
            contents,
            origin: SourceFileOrigin::File(path.to_owned()),
        })
    }

    pub fn parse_module(&self) -> Result<Module, LoadError> {
        serde_json::from_str(&self.contents).map_err(|source| LoadError::Json {
            origin: self.origin.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub enum SourceFileOrigin {
    Memory,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}

pub fn load_module(path: &Path) -> Result<Module, LoadError> {
    SourceFile::read(path)?.parse_module()
}
