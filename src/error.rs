use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between expression text and a number.
///
/// None of these are retried internally. Numeric edge cases such as division
/// by zero are not errors; they surface as IEEE-754 infinities and NaNs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A numeric literal that does not convert to an `f64`, e.g. `1.2.3`.
    #[error("malformed numeric literal '{text}' at offset {offset}")]
    MalformedLiteral { text: String, offset: usize },

    /// A token that cannot appear where it was found. `position` is the byte
    /// offset of the token in the source text.
    #[error("unexpected token '{found}' at offset {position}")]
    UnexpectedToken { position: usize, found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// The text nests deeper than the parser accepts. Raised for bracket and
    /// chain nesting as well as for the depth of the resulting tree; `limit`
    /// says which bound was hit.
    #[error("expression nested too deeply at offset {position} (limit {limit})")]
    NestingTooDeep { position: usize, limit: usize },

    #[error("variable '{0}' not found")]
    VariableNotFound(String),

    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    #[error("function '{name}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The caller asked for a compiled signature with a different number of
    /// parameters than the expression has free variables.
    #[error("signature expects {expected} parameter(s), got {actual}")]
    SignatureMismatch { expected: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled,

    /// Reported by the code generator backend (ISA lookup, module definition).
    #[error("code generation failed: {0}")]
    Codegen(String),
}

impl Error {
    pub(crate) fn codegen<E: std::fmt::Display>(error: E) -> Self {
        Error::Codegen(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = Error::VariableNotFound("y".to_string());
        assert_eq!(err.to_string(), "variable 'y' not found");

        let err = Error::ArityMismatch {
            name: "max".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "function 'max' expects 2 argument(s), got 1");

        let err = Error::UnexpectedToken {
            position: 4,
            found: ")".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected token ')' at offset 4");

        let err = Error::NestingTooDeep {
            position: 12,
            limit: 64,
        };
        assert_eq!(
            err.to_string(),
            "expression nested too deeply at offset 12 (limit 64)"
        );
    }
}
