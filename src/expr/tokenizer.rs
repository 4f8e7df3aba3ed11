use super::classify::CHAR_CLASSES;
use super::{Node, NodeKind};

/// Scans raw expression text into a flat token sequence with byte spans.
///
/// Numbers and identifiers take the maximal run ("longest valid run wins"); a
/// number run accepts any mix of digits and dots, so a malformed literal like
/// `1.2.3` becomes one token and fails later at value-parsing time. Characters
/// in no class (whitespace, `,`, anything non-ASCII) are skipped, not
/// rejected.
pub fn tokenize(text: &str) -> Vec<Node> {
    let classes = &*CHAR_CLASSES;
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (begin, ch) = chars[i];
        if !classes.is_valid(ch) {
            i += 1;
        } else if classes.is_number(ch) {
            let mut j = i + 1;
            while j < chars.len() && classes.is_float_part(chars[j].1) {
                j += 1;
            }
            let end = byte_at(text, &chars, j);
            tokens.push(Node::leaf(NodeKind::Number, &text[begin..end], begin, end));
            i = j;
        } else if classes.is_operator(ch) {
            tokens.push(Node::leaf(NodeKind::Operator, ch, begin, begin + 1));
            i += 1;
        } else if classes.is_bracket(ch) {
            tokens.push(Node::leaf(NodeKind::Bracket, ch, begin, begin + 1));
            i += 1;
        } else if classes.is_var_start(ch) {
            let mut j = i + 1;
            while j < chars.len() && classes.is_var_name(chars[j].1) {
                j += 1;
            }
            let end = byte_at(text, &chars, j);
            tokens.push(Node::leaf(NodeKind::Variable, &text[begin..end], begin, end));
            i = j;
        } else if classes.is_assign(ch) {
            tokens.push(Node::leaf(NodeKind::Assign, ch, begin, begin + 1));
            i += 1;
        } else if classes.is_end(ch) {
            tokens.push(Node::leaf(NodeKind::End, ch, begin, begin + 1));
            i += 1;
        } else {
            // valid-only characters like a bare `.`
            i += 1;
        }
    }
    tokens
}

fn byte_at(text: &str, chars: &[(usize, char)], index: usize) -> usize {
    chars.get(index).map(|&(pos, _)| pos).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Node]) -> Vec<NodeKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(tokens: &[Node]) -> Vec<&str> {
        tokens.iter().map(|t| t.token.as_str()).collect()
    }

    #[test]
    fn test_numbers_and_operators() {
        let tokens = tokenize("11*3+2.5");
        assert_eq!(texts(&tokens), ["11", "*", "3", "+", "2.5"]);
        assert_eq!(
            kinds(&tokens),
            [
                NodeKind::Number,
                NodeKind::Operator,
                NodeKind::Number,
                NodeKind::Operator,
                NodeKind::Number,
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("10 + x1");
        assert_eq!((tokens[0].begin, tokens[0].end), (0, 2));
        assert_eq!((tokens[1].begin, tokens[1].end), (3, 4));
        assert_eq!((tokens[2].begin, tokens[2].end), (5, 7));
    }

    #[test]
    fn test_malformed_literal_is_one_token() {
        let tokens = tokenize("1.2.3");
        assert_eq!(texts(&tokens), ["1.2.3"]);
        assert_eq!(tokens[0].kind, NodeKind::Number);
    }

    #[test]
    fn test_identifiers() {
        let tokens = tokenize("$tmp_1+_x");
        assert_eq!(texts(&tokens), ["$tmp_1", "+", "_x"]);
        assert_eq!(tokens[0].kind, NodeKind::Variable);
        assert_eq!(tokens[2].kind, NodeKind::Variable);
    }

    #[test]
    fn test_commas_and_junk_are_skipped() {
        let tokens = tokenize("area(3, 4) @ é");
        assert_eq!(texts(&tokens), ["area", "(", "3", "4", ")"]);
    }

    #[test]
    fn test_assign_and_end_tokens() {
        let tokens = tokenize("a=1;b=2");
        assert_eq!(
            kinds(&tokens),
            [
                NodeKind::Variable,
                NodeKind::Assign,
                NodeKind::Number,
                NodeKind::End,
                NodeKind::Variable,
                NodeKind::Assign,
                NodeKind::Number,
            ]
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \t ,, ").is_empty());
    }
}
