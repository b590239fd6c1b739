//! Compile one Newton file: lex, then parse with dimensional analysis.
//!
//! This is the single `Result` boundary of the front end. Without recovery
//! the first error abandons the file; with recovery, errors are collected
//! in the returned session's diagnostics.

use crate::error::NewtonError;
use crate::lexer;
use crate::parser;
use crate::session::{CompilationSession, CompileOptions};
use std::path::Path;

/// Compile `src`, naming it `filename` in provenance and diagnostics.
pub fn compile_source(
    src: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<CompilationSession, NewtonError> {
    // Lexer errors are fatal in both modes
    let tokens = lexer::lex(src, filename)?;
    tracing::debug!(filename, tokens = tokens.len(), "lexed");

    let mut session = CompilationSession::new(filename);
    if options.recover {
        parser::parse_recovering(&tokens, &mut session, options.max_errors);
    } else {
        parser::parse(&tokens, &mut session)?;
    }

    tracing::debug!(
        filename,
        dimensions = session.symbols().dimensions().len(),
        physics = session.symbols().all_physics().len(),
        invariants = session.invariants().len(),
        errors = session.diagnostics().len(),
        "compiled"
    );
    Ok(session)
}

/// Read and compile the file at `path`.
pub fn compile_path(
    path: &Path,
    options: &CompileOptions,
) -> Result<CompilationSession, NewtonError> {
    let src = std::fs::read_to_string(path).map_err(|e| NewtonError::io(path, &e))?;
    compile_source(&src, &path.display().to_string(), options)
}
