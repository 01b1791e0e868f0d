//! Dependency closure: expands the requested root set to every type
//! transitively reachable through message fields and extend declarations,
//! pulling enclosing types along with any reachable nested type.

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::StitchError;
use crate::path::TypePath;
use crate::scalar;
use crate::symbols::{resolve_extension_type, Symbols};
use crate::types::{SchemaFile, TypeDecl, TypeKind};

/// Fixed-point iteration over the source files until a full pass adds no
/// new names. Terminates because the set grows monotonically and is bounded
/// by the number of known symbols.
pub(crate) fn find_dependencies(
    types_to_emit: &mut HashSet<TypePath>,
    files: &[Rc<SchemaFile>],
    symbols: &Symbols,
) -> Result<(), StitchError> {
    let mut count = types_to_emit.len();
    loop {
        for file in files {
            file_dependencies(types_to_emit, file, symbols)?;
        }
        let new_count = types_to_emit.len();
        if new_count == count {
            return Ok(());
        }
        count = new_count;
    }
}

fn file_dependencies(
    types_to_emit: &mut HashSet<TypePath>,
    file: &SchemaFile,
    symbols: &Symbols,
) -> Result<(), StitchError> {
    // Extensions are always emission roots once their declaring file
    // participates: the extended type and every field type come along.
    for extend in &file.extends {
        let target = resolve_extension_type(symbols, file, &extend.target)?;
        types_to_emit.insert(target);
        for field in &extend.fields {
            if scalar::is_scalar(&field.type_token) {
                continue;
            }
            let field_type = resolve_extension_type(symbols, file, &field.type_token)?;
            types_to_emit.insert(field_type);
        }
    }

    // Field types of every message already in the set, walked with an
    // explicit worklist over the nested-type tree.
    let mut worklist: Vec<&TypeDecl> = file.types.iter().collect();
    while let Some(decl) = worklist.pop() {
        if let TypeKind::Message(message) = &decl.kind {
            if types_to_emit.contains(&decl.full_name) {
                for field in &message.fields {
                    if scalar::is_scalar(&field.type_token) {
                        continue;
                    }
                    let field_type =
                        symbols.resolve(&field.type_token, file, Some(&decl.full_name))?;
                    add_dependency_branch(types_to_emit, symbols, field_type);
                }
            }
        }
        worklist.extend(decl.nested.iter());
    }
    Ok(())
}

/// Adds a type and all its enclosing ancestors: nested types cannot be
/// emitted as free-standing artifacts, so their parents must come too.
fn add_dependency_branch(
    types_to_emit: &mut HashSet<TypePath>,
    symbols: &Symbols,
    name: TypePath,
) {
    let mut name = name;
    while symbols.is_known(&name) {
        types_to_emit.insert(name.clone());
        name = match name.parent() {
            Some(parent) => parent,
            None => break,
        };
    }
}
