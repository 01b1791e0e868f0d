use clap::Parser;
use std::env;
use std::fs;
use std::path::PathBuf;

use stitch_compiler::error::StitchError;
use stitch_compiler::{Compiler, CompilerOptions};

#[derive(Parser)]
#[command(name = "stitchc")]
#[command(about = "Compile .proto schemas to Java source", long_about = None)]
struct Cli {
    /// Directory schema files and imports are resolved against
    /// (defaults to the current directory)
    #[arg(long)]
    proto_path: Option<PathBuf>,

    /// Root directory of the generated Java source tree
    #[arg(long)]
    java_out: Option<PathBuf>,

    /// File containing additional schema file names, one per line
    #[arg(long)]
    files: Option<PathBuf>,

    /// Comma-separated fully-qualified type names to emit; everything they
    /// depend on comes along, everything else is pruned
    #[arg(long)]
    roots: Option<String>,

    /// Fully-qualified class name of the generated extension registry
    #[arg(long)]
    registry_class: Option<String>,

    /// Schema files to compile, relative to the proto path
    source_files: Vec<String>,
}

fn main() -> Result<(), StitchError> {
    let cli = Cli::parse();

    let proto_path = match cli.proto_path {
        Some(path) => path,
        None => {
            eprintln!("warning: no --proto-path given, using the current directory");
            env::current_dir().map_err(StitchError::Io)?
        }
    };
    let java_out = cli
        .java_out
        .ok_or_else(|| StitchError::Usage("--java-out is required".to_string()))?;

    let mut source_files = cli.source_files;
    if let Some(list_path) = &cli.files {
        let text = fs::read_to_string(list_path).map_err(StitchError::Io)?;
        source_files.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    if source_files.is_empty() {
        return Err(StitchError::Usage(
            "no schema files given; pass them as arguments or via --files".to_string(),
        ));
    }

    let roots = cli
        .roots
        .map(|roots| {
            roots
                .split(',')
                .map(str::trim)
                .filter(|root| !root.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let options = CompilerOptions {
        proto_path,
        java_out,
        source_files,
        roots,
        registry_class: cli.registry_class,
    };
    Compiler::new(options).compile()
}
