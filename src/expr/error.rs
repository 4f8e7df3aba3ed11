use std::fmt;

use thiserror::Error;

/// Which side of an operator an operand was expected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Errors raised while parsing or evaluating an expression.
///
/// Every stage fails fast: no error is recovered internally and there is no
/// partial-result mode. Assignments already evaluated before a failure are
/// not rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unbalanced brackets: `{token}` at [{begin},{end}) has no match")]
    UnbalancedBrackets {
        token: String,
        begin: usize,
        end: usize,
    },

    #[error("{side} operand missing for `{token}` at [{begin},{end})")]
    MissingOperand {
        side: Side,
        token: String,
        begin: usize,
        end: usize,
    },

    #[error("unknown operator `{token}` at [{begin},{end})")]
    InvalidToken {
        token: String,
        begin: usize,
        end: usize,
    },

    #[error("invalid numeric literal `{text}`")]
    InvalidLiteral { text: String },

    #[error("undefined variable `{name}` at [{begin},{end})")]
    UndefinedVariable {
        name: String,
        begin: usize,
        end: usize,
    },

    #[error("undefined function `{name}` at [{begin},{end})")]
    UndefinedFunction {
        name: String,
        begin: usize,
        end: usize,
    },

    #[error("function `{name}` expects {expected} arguments, got {supplied}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        supplied: usize,
    },

    #[error("assignment target at [{begin},{end}) is not a variable")]
    InvalidAssignmentTarget { begin: usize, end: usize },

    #[error("division undefined under scale {scale}: {detail}")]
    DivisionPolicyViolation { scale: i64, detail: String },

    #[error("empty expression")]
    EmptyExpression,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ExprError::MissingOperand {
            side: Side::Left,
            token: "*".to_string(),
            begin: 0,
            end: 1,
        };
        assert_eq!(err.to_string(), "left operand missing for `*` at [0,1)");

        let err = ExprError::ArgumentCountMismatch {
            name: "area".to_string(),
            expected: 2,
            supplied: 1,
        };
        assert_eq!(err.to_string(), "function `area` expects 2 arguments, got 1");
    }
}
