use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::StitchError;
use crate::parser::parse_schema;
use crate::types::SchemaFile;

/// Seam between the compiler and the outside world: schema input and
/// generated-source output. Injected so tests can run fully in memory.
pub trait Io {
    /// Parses the schema file at `path`. Unreadable paths and malformed
    /// text are both fatal parse failures.
    fn parse(&self, path: &Path) -> Result<SchemaFile, StitchError>;

    /// Opens the output artifact for one generated class. The caller owns
    /// finalization; the writer is flushed when generation of the artifact
    /// completes or unwinds.
    fn open(
        &self,
        java_out: &Path,
        java_package: &str,
        class_name: &str,
    ) -> Result<Box<dyn Write>, StitchError>;
}

/// Production implementation backed by the file system. Output files land
/// under `java_out` in the usual package-per-directory layout.
pub struct FileIo;

impl Io for FileIo {
    fn parse(&self, path: &Path) -> Result<SchemaFile, StitchError> {
        let text = fs::read_to_string(path).map_err(StitchError::Io)?;
        parse_schema(&text, &path.to_string_lossy())
    }

    fn open(
        &self,
        java_out: &Path,
        java_package: &str,
        class_name: &str,
    ) -> Result<Box<dyn Write>, StitchError> {
        let mut dir = java_out.to_path_buf();
        if !java_package.is_empty() {
            dir = dir.join(java_package.replace('.', "/"));
        }
        fs::create_dir_all(&dir).map_err(StitchError::Io)?;
        let file = fs::File::create(dir.join(format!("{}.java", class_name)))
            .map_err(StitchError::Io)?;
        Ok(Box::new(file))
    }
}
