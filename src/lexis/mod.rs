//! Standalone lexical/grammar analysis prototype.
//!
//! A generic source-text lexer and grouping pass: comments, strings,
//! radix-prefixed integer literals, bracket nesting, `,`/`;` sequences,
//! dotted names and variadic method calls. Independent of the expression
//! evaluator in [`crate::expr`].

mod grammar;
mod lexer;

pub use grammar::GrammarAnalyzer;
pub use lexer::LexicalAnalyzer;

use std::fmt;

use thiserror::Error;

/// Lexeme class produced by the lexer, or a composite produced by the
/// grammar pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Line,
    Newline,
    Blank,
    Str,
    LineComment,
    BlockComment,
    Ident,
    Sign,
    BinaryInt,
    HexInt,
    OctalInt,
    Decimal,
    // composites from grammar analysis
    Brackets,
    Sequence,
    DottedName,
    MethodCall,
}

/// One lexeme (or composite) with its `[begin, end)` byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub kind: WordKind,
    pub text: String,
    pub begin: usize,
    pub end: usize,
    pub children: Vec<Word>,
}

impl Word {
    pub fn new(kind: WordKind, text: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            begin,
            end,
            children: Vec::new(),
        }
    }

    /// Concatenates the lexeme texts back together.
    pub fn join(words: &[Word]) -> String {
        words.iter().map(|w| w.text.as_str()).collect()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{},{}):{}", self.kind, self.begin, self.end, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexisError {
    #[error("no valid lexeme at line {line}, offset {offset}: {snippet}")]
    NoLexeme {
        line: usize,
        offset: usize,
        snippet: String,
    },

    #[error("`)` at [{begin},{end}) has no matching `(`")]
    UnmatchedBracket { begin: usize, end: usize },

    #[error("misplaced `{sign}` separator at [{begin},{end})")]
    MisplacedSeparator {
        sign: String,
        begin: usize,
        end: usize,
    },

    #[error("dangling `.` at [{begin},{end})")]
    DanglingDot { begin: usize, end: usize },
}
