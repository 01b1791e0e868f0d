//! Compile session: loads symbols for every requested source file, prunes
//! the emission set to the dependency closure of the requested roots, and
//! drives Java generation file by file.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use crate::closure;
use crate::error::StitchError;
use crate::genjava;
use crate::io::{FileIo, Io};
use crate::path::TypePath;
use crate::symbols::{Loader, Symbols};
use crate::types::SchemaFile;

/// Everything a compile needs, assembled by the caller (usually the CLI).
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Directory schema paths are resolved against, for source files and
    /// imports alike.
    pub proto_path:     PathBuf,
    /// Root of the generated source tree.
    pub java_out:       PathBuf,
    /// Schema files to compile, relative to `proto_path`.
    pub source_files:   Vec<String>,
    /// Fully-qualified type names to emit. Empty means emit everything.
    pub roots:          Vec<String>,
    /// Fully-qualified class name of the extension registry, if requested.
    pub registry_class: Option<String>,
}

pub struct Compiler<I: Io = FileIo> {
    options:       CompilerOptions,
    io:            I,
    symbols:       Symbols,
    types_to_emit: HashSet<TypePath>,
    cache:         HashMap<PathBuf, Rc<SchemaFile>>,
}

impl Compiler<FileIo> {
    pub fn new(options: CompilerOptions) -> Compiler<FileIo> {
        Compiler::with_io(options, FileIo)
    }
}

impl<I: Io> Compiler<I> {
    pub fn with_io(options: CompilerOptions, io: I) -> Compiler<I> {
        let types_to_emit = options
            .roots
            .iter()
            .map(|root| TypePath::from_dotted(root))
            .collect();
        Compiler {
            options,
            io,
            symbols: Symbols::default(),
            types_to_emit,
            cache: HashMap::new(),
        }
    }

    /// Runs the whole session. Symbol loading for every source file happens
    /// before any generation, so cross-file references resolve regardless of
    /// argument order.
    pub fn compile(&mut self) -> Result<(), StitchError> {
        let mut parsed: Vec<(PathBuf, Rc<SchemaFile>)> = Vec::new();
        for source in &self.options.source_files {
            let path = self.options.proto_path.join(source);
            // A file listed more than once is loaded and generated once.
            if parsed.iter().any(|(seen, _)| *seen == path) {
                continue;
            }
            let mut loader = Loader {
                io:         &self.io,
                proto_path: &self.options.proto_path,
                cache:      &mut self.cache,
                symbols:    &mut self.symbols,
            };
            let file = loader.parse(&path)?;
            loader.load_symbols(&file)?;
            parsed.push((path, file));
        }

        if !self.types_to_emit.is_empty() {
            println!("Analyzing dependencies of root types.");
            let files: Vec<Rc<SchemaFile>> =
                parsed.iter().map(|(_, file)| Rc::clone(file)).collect();
            closure::find_dependencies(&mut self.types_to_emit, &files, &self.symbols)?;
        }

        let mut extension_holders: Vec<String> = Vec::new();
        for (path, file) in &parsed {
            println!("Compiling schema file {}", path.display());
            let holders = genjava::generate_file(
                &self.io,
                &self.options.java_out,
                &self.symbols,
                &self.types_to_emit,
                file,
                &path.to_string_lossy(),
            )?;
            extension_holders.extend(holders);
        }

        if let Some(registry_class) = &self.options.registry_class {
            genjava::emit_registry(
                &self.io,
                &self.options.java_out,
                registry_class,
                &extension_holders,
            )?;
        }
        Ok(())
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn types_to_emit(&self) -> &HashSet<TypePath> {
        &self.types_to_emit
    }
}
