use super::{LexisError, Word, WordKind};

/// Grouping passes over a lexed word stream.
///
/// Strips ignorable lexemes (blanks, newlines, comments), nests bracket
/// groups, folds `,`/`;`-separated sequences, and collapses dotted names and
/// method calls. Results accumulate across calls like the lexer's word list.
#[derive(Debug, Default)]
pub struct GrammarAnalyzer {
    words: Vec<Word>,
}

impl GrammarAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, words: &[Word]) -> Result<&[Word], LexisError> {
        let trimmed: Vec<Word> = words
            .iter()
            .filter(|w| !is_ignorable(w.kind))
            .cloned()
            .collect();
        let grouped = group_brackets(trimmed)?;
        let sequenced = fold_sequences(grouped)?;
        let collapsed = collapse_calls(sequenced)?;
        self.words.extend(collapsed);
        Ok(&self.words)
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

fn is_ignorable(kind: WordKind) -> bool {
    matches!(
        kind,
        WordKind::Line
            | WordKind::Newline
            | WordKind::Blank
            | WordKind::LineComment
            | WordKind::BlockComment
    )
}

fn is_sign(word: &Word, text: &str) -> bool {
    word.kind == WordKind::Sign && word.text == text
}

/// Nests `( ... )` runs into `Brackets` words.
fn group_brackets(words: Vec<Word>) -> Result<Vec<Word>, LexisError> {
    let mut out: Vec<Word> = Vec::new();
    // stack of (open position, children) for currently open groups
    let mut stack: Vec<(usize, Vec<Word>)> = Vec::new();
    for word in words {
        if is_sign(&word, "(") {
            stack.push((word.begin, Vec::new()));
        } else if is_sign(&word, ")") {
            let (begin, children) = stack.pop().ok_or(LexisError::UnmatchedBracket {
                begin: word.begin,
                end: word.end,
            })?;
            let mut group = Word::new(
                WordKind::Brackets,
                format!("({})", Word::join(&children)),
                begin,
                word.end,
            );
            group.children = children;
            match stack.last_mut() {
                Some((_, siblings)) => siblings.push(group),
                None => out.push(group),
            }
        } else {
            match stack.last_mut() {
                Some((_, siblings)) => siblings.push(word),
                None => out.push(word),
            }
        }
    }
    if let Some((begin, _)) = stack.pop() {
        return Err(LexisError::UnmatchedBracket {
            begin,
            end: begin + 1,
        });
    }
    Ok(out)
}

/// Splits a sibling list on `,`/`;`, wrapping multi-word segments into
/// `Sequence` words; recurses into bracket groups.
fn fold_sequences(words: Vec<Word>) -> Result<Vec<Word>, LexisError> {
    let mut out: Vec<Word> = Vec::new();
    let mut segment: Vec<Word> = Vec::new();
    for word in words {
        if is_sign(&word, ",") || is_sign(&word, ";") {
            if segment.is_empty() {
                return Err(LexisError::MisplacedSeparator {
                    sign: word.text,
                    begin: word.begin,
                    end: word.end,
                });
            }
            out.push(seal_segment(std::mem::take(&mut segment)));
        } else {
            segment.push(recurse_sequences(word)?);
        }
    }
    if !segment.is_empty() {
        out.push(seal_segment(segment));
    }
    Ok(out)
}

fn recurse_sequences(mut word: Word) -> Result<Word, LexisError> {
    if word.kind == WordKind::Brackets {
        word.children = fold_sequences(std::mem::take(&mut word.children))?;
    }
    Ok(word)
}

fn seal_segment(mut segment: Vec<Word>) -> Word {
    if segment.len() == 1 {
        return segment.remove(0);
    }
    let begin = segment.first().map(|w| w.begin).unwrap_or_default();
    let end = segment.last().map(|w| w.end).unwrap_or_default();
    let mut word = Word::new(WordKind::Sequence, Word::join(&segment), begin, end);
    word.children = segment;
    word
}

/// Collapses `ident (. ident)*` runs into `DottedName` words and a name
/// followed directly by a bracket group into a `MethodCall`.
fn collapse_calls(words: Vec<Word>) -> Result<Vec<Word>, LexisError> {
    let mut out: Vec<Word> = Vec::new();
    let mut iter = words.into_iter().peekable();
    while let Some(word) = iter.next() {
        match word.kind {
            WordKind::Ident => {
                let mut parts = vec![word];
                while matches!(iter.peek(), Some(w) if is_sign(w, ".")) {
                    let dot = iter.next().unwrap_or_else(|| unreachable!("peeked"));
                    match iter.next() {
                        Some(ident) if ident.kind == WordKind::Ident => {
                            parts.push(dot);
                            parts.push(ident);
                        }
                        _ => {
                            return Err(LexisError::DanglingDot {
                                begin: dot.begin,
                                end: dot.end,
                            })
                        }
                    }
                }
                let name = if parts.len() == 1 {
                    parts.remove(0)
                } else {
                    dotted(parts)
                };
                if matches!(iter.peek(), Some(w) if w.kind == WordKind::Brackets) {
                    let mut args = iter.next().unwrap_or_else(|| unreachable!("peeked"));
                    args.children = collapse_calls(args.children)?;
                    let mut call = Word::new(
                        WordKind::MethodCall,
                        format!("{}{}", name.text, args.text),
                        name.begin,
                        args.end,
                    );
                    call.children = vec![name, args];
                    out.push(call);
                } else {
                    out.push(name);
                }
            }
            WordKind::Brackets | WordKind::Sequence => {
                let mut group = word;
                group.children = collapse_calls(std::mem::take(&mut group.children))?;
                out.push(group);
            }
            _ => out.push(word),
        }
    }
    Ok(out)
}

fn dotted(parts: Vec<Word>) -> Word {
    let begin = parts.first().map(|w| w.begin).unwrap_or_default();
    let end = parts.last().map(|w| w.end).unwrap_or_default();
    let mut word = Word::new(WordKind::DottedName, Word::join(&parts), begin, end);
    word.children = parts;
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexis::LexicalAnalyzer;

    fn analyze(text: &str) -> Vec<Word> {
        let mut lexer = LexicalAnalyzer::new();
        lexer.handle(text).unwrap();
        let mut grammar = GrammarAnalyzer::new();
        grammar.handle(lexer.words()).unwrap().to_vec()
    }

    #[test]
    fn test_brackets_nest_and_blanks_drop() {
        let words = analyze("a + (b * (c))\n");
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["a", "+", "(b*(c))"]);
        assert_eq!(words[2].kind, WordKind::Brackets);
        assert_eq!(words[2].children[2].kind, WordKind::Brackets);
    }

    #[test]
    fn test_method_calls_collapse() {
        let words = analyze("max(a,b)+min(c2,d2)\n");
        let kinds: Vec<WordKind> = words.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            [WordKind::MethodCall, WordKind::Sign, WordKind::MethodCall]
        );
        assert_eq!(words[0].text, "max(a,b)");
        let args = &words[0].children[1];
        assert_eq!(args.kind, WordKind::Brackets);
        assert_eq!(args.children.len(), 2);
    }

    #[test]
    fn test_dotted_method_call() {
        let words = analyze("Math.abs(b)\n");
        assert_eq!(words.len(), 1);
        let call = &words[0];
        assert_eq!(call.kind, WordKind::MethodCall);
        assert_eq!(call.children[0].kind, WordKind::DottedName);
        assert_eq!(call.children[0].text, "Math.abs");
        assert_eq!(call.children[1].kind, WordKind::Brackets);
    }

    #[test]
    fn test_sequences_fold_inside_brackets() {
        let words = analyze("f(a+1,b)\n");
        let args = &words[0].children[1];
        assert_eq!(args.children.len(), 2);
        assert_eq!(args.children[0].kind, WordKind::Sequence);
        assert_eq!(args.children[0].text, "a+1");
        assert_eq!(args.children[1].kind, WordKind::Ident);
    }

    #[test]
    fn test_unmatched_brackets() {
        let mut lexer = LexicalAnalyzer::new();
        lexer.handle(")a\n").unwrap();
        let mut grammar = GrammarAnalyzer::new();
        assert!(matches!(
            grammar.handle(lexer.words()),
            Err(LexisError::UnmatchedBracket { .. })
        ));

        let mut lexer = LexicalAnalyzer::new();
        lexer.handle("(a\n").unwrap();
        let mut grammar = GrammarAnalyzer::new();
        assert!(matches!(
            grammar.handle(lexer.words()),
            Err(LexisError::UnmatchedBracket { .. })
        ));
    }

    #[test]
    fn test_misplaced_separator() {
        let mut lexer = LexicalAnalyzer::new();
        lexer.handle("f(,a)\n").unwrap();
        let mut grammar = GrammarAnalyzer::new();
        assert!(matches!(
            grammar.handle(lexer.words()),
            Err(LexisError::MisplacedSeparator { .. })
        ));
    }

    #[test]
    fn test_dangling_dot() {
        let mut lexer = LexicalAnalyzer::new();
        lexer.handle("a.+b\n").unwrap();
        let mut grammar = GrammarAnalyzer::new();
        assert!(matches!(
            grammar.handle(lexer.words()),
            Err(LexisError::DanglingDot { .. })
        ));
    }
}
