use crate::ast::Provenance;
use std::path::Path;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// The source could not be tokenized.
    #[error("{0}")]
    Lex(String),

    /// The current token is not in the FIRST set of the production being parsed.
    #[error("syntax error in {production}: expected {expected}, got {found}")]
    Syntax {
        production: String,
        expected: String,
        found: String,
    },

    #[error("'{0}' used before definition")]
    UseBeforeDefinition(String),

    /// Operands whose numerator or denominator prime products differ.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: String, found: String },

    #[error("cannot multiply or divide two vector quantities")]
    IllegalVectorVectorOp,

    #[error("{operator} requires vector operands")]
    NonVectorOperand { operator: String },

    #[error("0 ** 0 is indeterminate")]
    IndeterminateExponent,

    #[error("exponent {0} on a dimensioned quantity must be an integer")]
    NonIntegerExponent(f64),

    #[error("'{0}' is not a compile-time numeric constant")]
    NotCompileTimeConstant(String),

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    /// Every prime of the allocation table has been handed out.
    #[error("prime table exhausted: at most {0} distinct base dimensions per compilation")]
    PrimeTableExhausted(usize),

    #[error("dimension prime product does not fit in 64 bits")]
    PrimeProductOverflow,

    #[error("{0}")]
    Io(String),
}

impl ErrorKind {
    /// Coarse classification used by callers to tell failures apart.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::Lex(_) => "lex",
            ErrorKind::Syntax { .. } => "syntax",
            ErrorKind::UseBeforeDefinition(_) | ErrorKind::UnknownDimension(_) => "resolution",
            ErrorKind::DimensionMismatch { .. }
            | ErrorKind::IllegalVectorVectorOp
            | ErrorKind::NonVectorOperand { .. } => "dimension",
            ErrorKind::IndeterminateExponent
            | ErrorKind::NonIntegerExponent(_)
            | ErrorKind::NotCompileTimeConstant(_) => "exponent",
            ErrorKind::PrimeTableExhausted(_) | ErrorKind::PrimeProductOverflow => "limit",
            ErrorKind::Io(_) => "io",
        }
    }
}

/// A compilation error with its source position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct NewtonError {
    pub kind: ErrorKind,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl NewtonError {
    pub fn new(kind: ErrorKind, file: &str, line: u32, column: u32) -> Self {
        NewtonError {
            kind,
            file: file.to_owned(),
            line,
            column,
        }
    }

    pub fn at(kind: ErrorKind, prov: &Provenance) -> Self {
        NewtonError::new(kind, &prov.file, prov.line, prov.column)
    }

    pub fn lex(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        NewtonError::new(ErrorKind::Lex(message.into()), file, line, column)
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        let file = path.display().to_string();
        NewtonError::new(
            ErrorKind::Io(format!("could not read '{}': {}", file, err)),
            &file,
            0,
            0,
        )
    }

    pub fn category(&self) -> &'static str {
        self.kind.category()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax { .. })
    }

    pub fn is_dimensional(&self) -> bool {
        self.category() == "dimension"
    }

    /// Serialize to the diagnostic JSON shape. All fields are always present.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "category": self.category(),
            "column":   self.column,
            "file":     self.file,
            "line":     self.line,
            "message":  self.message(),
        })
    }
}

/// Attach a source position to a position-less registry failure.
pub(crate) trait Locate<T> {
    fn located(self, prov: &Provenance) -> Result<T, NewtonError>;
}

impl<T> Locate<T> for Result<T, ErrorKind> {
    fn located(self, prov: &Provenance) -> Result<T, NewtonError> {
        self.map_err(|kind| NewtonError::at(kind, prov))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_and_message() {
        let err = NewtonError::new(ErrorKind::IllegalVectorVectorOp, "a.nt", 3, 14);
        assert_eq!(
            err.to_string(),
            "a.nt:3:14: cannot multiply or divide two vector quantities"
        );
    }

    #[test]
    fn dimensional_errors_are_distinct_from_syntax_errors() {
        let mismatch = NewtonError::new(
            ErrorKind::DimensionMismatch {
                expected: "kg*m".into(),
                found: "kg".into(),
            },
            "a.nt",
            1,
            1,
        );
        assert!(mismatch.is_dimensional());
        assert!(!mismatch.is_syntax());

        let syntax = NewtonError::new(
            ErrorKind::Syntax {
                production: "quantityFactor".into(),
                expected: "identifier".into(),
                found: "';'".into(),
            },
            "a.nt",
            1,
            1,
        );
        assert!(syntax.is_syntax());
        assert!(!syntax.is_dimensional());
    }

    #[test]
    fn json_shape_has_all_fields() {
        let err = NewtonError::lex("x.nt", 2, 5, "unexpected character '$'");
        let v = err.to_json_value();
        assert_eq!(v["category"], "lex");
        assert_eq!(v["line"], 2);
        assert_eq!(v["column"], 5);
        assert_eq!(v["message"], "unexpected character '$'");
    }
}
