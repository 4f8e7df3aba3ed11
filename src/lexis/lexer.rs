use lazy_static::lazy_static;
use regex::Regex;

use super::{LexisError, Word, WordKind};

struct LexicalPattern {
    kind: WordKind,
    regex: Regex,
}

impl LexicalPattern {
    fn new(kind: WordKind, pattern: &str) -> Self {
        Self {
            kind,
            regex: Regex::new(pattern).expect("valid lexical pattern"),
        }
    }
}

lazy_static! {
    /// Ordered pattern list; the first pattern matching at the current offset
    /// wins, so newline beats blank, comments beat the `/` sign, and the
    /// radix-prefixed integer forms beat the plain decimal form.
    static ref WORD_PATTERNS: Vec<LexicalPattern> = vec![
        LexicalPattern::new(WordKind::Newline, r"^\r?\n"),
        LexicalPattern::new(WordKind::Blank, r"^\s+"),
        // shortest match, escaped quotes allowed
        LexicalPattern::new(WordKind::Str, r#"^"(\\"|.)*?""#),
        LexicalPattern::new(WordKind::LineComment, r"^//[^\r\n]*"),
        LexicalPattern::new(WordKind::BlockComment, r"^/\*[^*]*\*+([^/*][^*]*\*+)*/"),
        LexicalPattern::new(WordKind::Ident, r"^[a-zA-Z_$][\w$]*"),
        LexicalPattern::new(WordKind::Sign, r#"^[,;.()<>+\-*/^%=!?:"]"#),
        LexicalPattern::new(WordKind::BinaryInt, r"^0[bB][01](_*[01])*"),
        LexicalPattern::new(WordKind::HexInt, r"^0[xX][0-9a-fA-F](_*[0-9a-fA-F])*"),
        LexicalPattern::new(WordKind::OctalInt, r"^0(_[0-7])+"),
        LexicalPattern::new(WordKind::Decimal, r"^\d+(\.\d+)?"),
    ];

    static ref LINE_PATTERN: Regex = Regex::new(r".*\n").expect("valid line pattern");
}

/// Incremental, line-oriented lexer.
///
/// Feed text chunks with [`handle`](Self::handle): complete lines are lexed
/// immediately, a trailing partial line is buffered until the next chunk
/// completes it. Offsets are bytes from the start of everything handled.
#[derive(Debug, Default)]
pub struct LexicalAnalyzer {
    /// unconsumed tail of the previous chunk
    remainder: String,
    /// byte offset of `remainder` within all handled text
    offset: usize,
    lines: Vec<Word>,
    words: Vec<Word>,
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, input: &str) -> Result<(), LexisError> {
        let text = format!("{}{}", self.remainder, input);
        let base = self.offset;
        let mut consumed = 0;
        let line_base = self.lines.len();
        for (index, found) in LINE_PATTERN.find_iter(&text).enumerate() {
            let line_text = found.as_str();
            let line_begin = base + found.start();
            let mut line = Word::new(WordKind::Line, line_text, line_begin, base + found.end());
            let mut line_offset = 0;
            while line_offset < line_text.len() {
                let word = find_word(line_base + index, line_text, line_offset, line_begin)?;
                line_offset = word.end - line_begin;
                line.children.push(word);
            }
            self.words.extend(line.children.iter().cloned());
            self.lines.push(line);
            consumed = found.end();
        }
        self.remainder = text[consumed..].to_string();
        self.offset = base + consumed;
        Ok(())
    }

    /// All lexemes of every completed line, in input order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Completed lines, each carrying its lexemes as children.
    pub fn lines(&self) -> &[Word] {
        &self.lines
    }
}

fn find_word(
    line: usize,
    line_text: &str,
    offset: usize,
    line_begin: usize,
) -> Result<Word, LexisError> {
    let rest = &line_text[offset..];
    for pattern in WORD_PATTERNS.iter() {
        if let Some(found) = pattern.regex.find(rest) {
            return Ok(Word::new(
                pattern.kind,
                found.as_str(),
                line_begin + offset,
                line_begin + offset + found.end(),
            ));
        }
    }
    Err(LexisError::NoLexeme {
        line,
        offset,
        snippet: rest.chars().take(24).collect(),
    })
}
