//! stitch-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.proto` schema files,
//!  2) Symbol, field and extension indices built over a file and its imports,
//!  3) Name resolution + dependency closure of requested root types,
//!  4) Java code generation (message classes, extension holders, registry),
//!  5) Error types (`StitchError`), and the `Io` seam for in-memory runs.

pub mod error;
pub mod utils;
pub mod path;
pub mod types;
pub mod scalar;
pub mod tokenizer;
pub mod parser;
pub mod symbols;
pub mod closure;
pub mod io;
pub mod writer;
pub mod genjava;
pub mod compiler;

pub use compiler::Compiler;
pub use compiler::CompilerOptions;
pub use error::StitchError;
pub use io::{FileIo, Io};
pub use parser::parse_schema;
