use std::fmt;

mod classify;
mod env;
mod error;
mod evaluator;
mod parser;
mod tokenizer;

pub use env::Environment;
pub use error::{ExprError, Side};
pub use evaluator::Evaluator;
pub use parser::compile;
pub use tokenizer::tokenize;

/// Structural role of a [`Node`].
///
/// A node starts out as whatever the tokenizer saw and may be retyped during
/// parsing: a `Bracket` pair becomes a `Group`, and a `Group` preceded by a
/// bare `Variable` becomes a `Function` carrying the variable's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Number,
    Operator,
    Bracket,
    Variable,
    Assign,
    End,
    Group,
    Function,
}

/// One token or tree node of a parsed expression.
///
/// The `token` payload doubles as the literal text, the operator symbol, the
/// bracket character, or the callee name, depending on `kind`. `begin`/`end`
/// is the `[begin, end)` byte span in the source text. Leaves have no
/// children; retyping a node replaces the whole value rather than patching
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub token: String,
    pub begin: usize,
    pub end: usize,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(kind: NodeKind, token: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            kind,
            token: token.into(),
            begin,
            end,
            children: Vec::new(),
        }
    }

    pub(crate) fn group(begin: usize, end: usize) -> Self {
        Self::leaf(NodeKind::Group, "()", begin, end)
    }

    /// Renders the (partially) folded tree back to bracketed text, e.g.
    /// `((8-3)-2)` or `area(3,4)`. Used by stage logging and tests.
    pub fn to_expr_string(&self) -> String {
        match self.kind {
            NodeKind::Operator | NodeKind::Assign => {
                if self.children.is_empty() {
                    return self.token.clone();
                }
                let left = operator(&self.token)
                    .map(|op| op.left_args)
                    .unwrap_or(1)
                    .min(self.children.len());
                let (lhs, rhs) = self.children.split_at(left);
                format!("({}{}{})", render_list(lhs), self.token, render_list(rhs))
            }
            NodeKind::Function => {
                let args: Vec<String> = self.children.iter().map(Node::to_expr_string).collect();
                format!("{}({})", self.token, args.join(","))
            }
            NodeKind::Group => render_list(&self.children),
            _ => self.token.clone(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{},{}):{}", self.kind, self.begin, self.end, self.token)
    }
}

fn render_list(nodes: &[Node]) -> String {
    match nodes {
        [] => String::new(),
        [only] => only.to_expr_string(),
        _ => {
            let items: Vec<String> = nodes.iter().map(Node::to_expr_string).collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

/// Static description of a binary operator: precedence level (lower binds
/// tighter) and how many operands it takes on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDescriptor {
    pub token: &'static str,
    pub level: u8,
    pub left_args: usize,
    pub right_args: usize,
}

pub static OPERATORS: [OpDescriptor; 6] = [
    OpDescriptor { token: "^", level: 0, left_args: 1, right_args: 1 },
    OpDescriptor { token: "*", level: 1, left_args: 1, right_args: 1 },
    OpDescriptor { token: "/", level: 1, left_args: 1, right_args: 1 },
    OpDescriptor { token: "+", level: 2, left_args: 1, right_args: 1 },
    OpDescriptor { token: "-", level: 2, left_args: 1, right_args: 1 },
    OpDescriptor { token: "=", level: 3, left_args: 1, right_args: 1 },
];

pub fn operator(token: &str) -> Option<&'static OpDescriptor> {
    OPERATORS.iter().find(|op| op.token == token)
}

/// A parsed expression: the folded tree, its source text, the inferred formal
/// parameter list (free variables in first-appearance order, assignment
/// targets excluded), and the bound name when the expression is a top-level
/// assignment to a plain variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub root: Node,
    pub source: String,
    pub params: Vec<String>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table_levels() {
        let power = operator("^").unwrap();
        let times = operator("*").unwrap();
        let plus = operator("+").unwrap();
        let assign = operator("=").unwrap();
        assert!(power.level < times.level);
        assert!(times.level < plus.level);
        assert!(plus.level < assign.level);
        assert!(OPERATORS.iter().all(|op| op.left_args == 1 && op.right_args == 1));
        assert!(operator("%").is_none());
    }

    #[test]
    fn test_expr_string_rendering() {
        let mut sum = Node::leaf(NodeKind::Operator, "+", 1, 2);
        sum.children = vec![
            Node::leaf(NodeKind::Number, "1", 0, 1),
            Node::leaf(NodeKind::Variable, "a", 2, 3),
        ];
        assert_eq!(sum.to_expr_string(), "(1+a)");

        let mut call = Node::leaf(NodeKind::Function, "area", 0, 9);
        call.children = vec![
            Node::leaf(NodeKind::Number, "3", 5, 6),
            Node::leaf(NodeKind::Number, "4", 7, 8),
        ];
        assert_eq!(call.to_expr_string(), "area(3,4)");
        assert_eq!(format!("{}", call), "Function[0,9):area");
    }
}
