use log::debug;

use super::error::{ExprError, Side};
use super::{operator, tokenize, Definition, Node, NodeKind};

/// Scan direction of one folding stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

/// Folding stages, tightest binding first. `=` folds last and is the only
/// right-to-left (right-associative) stage.
const STAGES: [(&[&str], Direction); 4] = [
    (&["^"], Direction::LeftToRight),
    (&["*", "/"], Direction::LeftToRight),
    (&["+", "-"], Direction::LeftToRight),
    (&["="], Direction::RightToLeft),
];

/// Compiles expression text through the full pipeline: tokenize, bracket
/// nesting, unary-sign normalization, staged precedence folding, parameter
/// inference.
pub fn compile(text: &str) -> Result<Definition, ExprError> {
    debug!("compiling: {}", text);
    let tokens = tokenize(text);
    let mut root = build_tree(tokens, text.len())?;
    debug!("bracket tree: {}", root.to_expr_string());
    normalize_signs(&mut root)?;
    debug!("signs normalized: {}", root.to_expr_string());
    for (stage, direction) in STAGES {
        root = fold_stage(root, direction, stage)?;
        debug!("folded {:?}: {}", stage, root.to_expr_string());
    }
    let params = infer_params(&root);
    let name = bound_name(&root);
    Ok(Definition {
        root,
        source: text.to_string(),
        params,
        name,
    })
}

/// Builds the nested bracket tree from the flat token sequence.
///
/// Nodes live in an index-addressed arena; `open` is the stack of indices of
/// currently open groups, the synthetic root at the bottom. When a group
/// closes and the parent's last child is a bare variable, the variable is
/// detached and the group is retyped to a function call carrying its name. A
/// stray `)` opens a node that can never close, so either form of imbalance is
/// detected after the scan.
pub(crate) fn build_tree(tokens: Vec<Node>, source_len: usize) -> Result<Node, ExprError> {
    let mut arena: Vec<Node> = vec![Node::group(0, source_len)];
    let mut links: Vec<Vec<usize>> = vec![Vec::new()];
    let mut open: Vec<usize> = vec![0];

    for token in tokens {
        match token.kind {
            NodeKind::Bracket if token.token == "(" => {
                let id = arena.len();
                arena.push(Node::group(token.begin, token.end));
                links.push(Vec::new());
                open.push(id);
            }
            NodeKind::Bracket if closable(&arena, &open) => {
                let closed = open.pop().unwrap_or_default();
                arena[closed].end = token.end;
                let parent = *open.last().unwrap_or(&0);
                let callee = links[parent]
                    .last()
                    .copied()
                    .filter(|&last| arena[last].kind == NodeKind::Variable);
                if let Some(var_id) = callee {
                    links[parent].pop();
                    arena[closed].kind = NodeKind::Function;
                    arena[closed].token = arena[var_id].token.clone();
                    arena[closed].begin = arena[var_id].begin;
                }
                links[parent].push(closed);
            }
            NodeKind::Bracket => {
                // `)` with no open `(` group; can never close itself
                let id = arena.len();
                arena.push(Node::leaf(NodeKind::Group, token.token, token.begin, token.end));
                links.push(Vec::new());
                open.push(id);
            }
            _ => {
                let id = arena.len();
                arena.push(token);
                links.push(Vec::new());
                let top = *open.last().unwrap_or(&0);
                links[top].push(id);
            }
        }
    }

    if open.len() != 1 {
        let innermost = &arena[*open.last().unwrap_or(&0)];
        return Err(ExprError::UnbalancedBrackets {
            token: innermost.token.clone(),
            begin: innermost.begin,
            end: innermost.end,
        });
    }
    Ok(realize(&arena, &links, 0))
}

/// A `)` may close the top of the stack only when that node was opened by a
/// real `(` (a stray `)` node carries its own token and stays open forever).
fn closable(arena: &[Node], open: &[usize]) -> bool {
    open.len() > 1 && open.last().is_some_and(|&top| arena[top].token == "()")
}

fn realize(arena: &[Node], links: &[Vec<usize>], id: usize) -> Node {
    let mut node = arena[id].clone();
    node.children = links[id].iter().map(|&child| realize(arena, links, child)).collect();
    node
}

fn is_sign(token: &str) -> bool {
    token == "+" || token == "-"
}

/// Rewrites unary `+`/`-` into synthetic `0 op operand` groups.
///
/// An operator leading its sibling list, or following another operator or an
/// assignment, sits in unary position; only `+` and `-` are legal there and
/// the pair is replaced by an anonymous group `(0 op operand)`. Nested groups
/// are normalized first so wrapped operands arrive already rewritten. Must run
/// before folding, which only handles well-formed binary positions.
pub(crate) fn normalize_signs(node: &mut Node) -> Result<(), ExprError> {
    for child in &mut node.children {
        if matches!(child.kind, NodeKind::Group | NodeKind::Function) {
            normalize_signs(child)?;
        }
    }
    if node.children.is_empty() {
        return Ok(());
    }

    let old = std::mem::take(&mut node.children);
    let mut out: Vec<Node> = Vec::with_capacity(old.len());
    let mut iter = old.into_iter();
    while let Some(child) = iter.next() {
        let unary_position = match out.last() {
            None => true,
            Some(prev) => matches!(prev.kind, NodeKind::Operator | NodeKind::Assign),
        };
        if child.kind != NodeKind::Operator || !unary_position {
            out.push(child);
            continue;
        }
        if !is_sign(&child.token) {
            return Err(ExprError::MissingOperand {
                side: Side::Left,
                token: child.token,
                begin: child.begin,
                end: child.end,
            });
        }
        let operand = match iter.next() {
            Some(next) if next.kind != NodeKind::Operator => next,
            _ => {
                return Err(ExprError::MissingOperand {
                    side: Side::Left,
                    token: child.token,
                    begin: child.begin,
                    end: child.end,
                })
            }
        };
        let mut group = Node::group(child.begin, operand.end);
        group.children = vec![
            Node::leaf(NodeKind::Number, "0", child.begin, child.begin),
            child,
            operand,
        ];
        out.push(group);
    }
    node.children = out;
    Ok(())
}

/// Folds one precedence stage over the node's children.
///
/// Scans in the stage direction keeping a pending-operand stack. An operator
/// of the stage pops its already-seen side from the stack and consumes the
/// next sibling (recursively folded) as its new side, then goes back on the
/// stack as a single combined operand. A group whose children collapse to one
/// element is replaced by it; function nodes keep their argument list.
pub(crate) fn fold_stage(
    node: Node,
    direction: Direction,
    stage: &[&str],
) -> Result<Node, ExprError> {
    if node.children.is_empty() {
        return Ok(node);
    }
    let Node {
        kind,
        token,
        begin,
        end,
        children,
    } = node;

    let ordered: Vec<Node> = match direction {
        Direction::LeftToRight => children,
        Direction::RightToLeft => children.into_iter().rev().collect(),
    };
    let mut iter = ordered.into_iter();
    let mut pending: Vec<Node> = Vec::new();

    while let Some(child) = iter.next() {
        let stage_op = matches!(child.kind, NodeKind::Operator | NodeKind::Assign)
            && child.children.is_empty()
            && stage.contains(&child.token.as_str());
        if !stage_op {
            pending.push(fold_stage(child, direction, stage)?);
            continue;
        }
        let descriptor = operator(&child.token).ok_or_else(|| ExprError::InvalidToken {
            token: child.token.clone(),
            begin: child.begin,
            end: child.end,
        })?;
        let (seen_count, ahead_count, seen_side, ahead_side) = match direction {
            Direction::LeftToRight => {
                (descriptor.left_args, descriptor.right_args, Side::Left, Side::Right)
            }
            Direction::RightToLeft => {
                (descriptor.right_args, descriptor.left_args, Side::Right, Side::Left)
            }
        };
        let mut seen: Vec<Node> = Vec::with_capacity(seen_count);
        for _ in 0..seen_count {
            let operand = pending.pop().ok_or_else(|| ExprError::MissingOperand {
                side: seen_side,
                token: child.token.clone(),
                begin: child.begin,
                end: child.end,
            })?;
            seen.push(operand);
        }
        let mut ahead: Vec<Node> = Vec::with_capacity(ahead_count);
        for _ in 0..ahead_count {
            let operand = iter.next().ok_or_else(|| ExprError::MissingOperand {
                side: ahead_side,
                token: child.token.clone(),
                begin: child.begin,
                end: child.end,
            })?;
            ahead.push(fold_stage(operand, direction, stage)?);
        }
        // child order is always textual: left operands, then right operands
        let mut combined = child;
        combined.children = match direction {
            Direction::LeftToRight => {
                seen.reverse();
                seen.extend(ahead);
                seen
            }
            Direction::RightToLeft => {
                ahead.reverse();
                ahead.extend(seen);
                ahead
            }
        };
        pending.push(combined);
    }

    if direction == Direction::RightToLeft {
        pending.reverse();
    }
    if kind == NodeKind::Group && pending.len() == 1 {
        if let Some(only) = pending.pop() {
            return Ok(only);
        }
    }
    Ok(Node {
        kind,
        token,
        begin,
        end,
        children: pending,
    })
}

/// Collects free variable names in first-appearance order, skipping the
/// target of every assignment, to serve as a definition's formal parameters.
pub(crate) fn infer_params(node: &Node) -> Vec<String> {
    let mut names = Vec::new();
    collect_vars(node, &mut names);
    names
}

fn collect_vars(node: &Node, names: &mut Vec<String>) {
    if node.kind == NodeKind::Variable {
        if !names.iter().any(|name| name == &node.token) {
            names.push(node.token.clone());
        }
        return;
    }
    let skip = usize::from(node.kind == NodeKind::Assign);
    for child in node.children.iter().skip(skip) {
        collect_vars(child, names);
    }
}

/// The definition name of a top-level assignment to a plain variable, if any.
fn bound_name(root: &Node) -> Option<String> {
    let head = match root.kind {
        NodeKind::Group => root.children.first()?,
        _ => root,
    };
    if head.kind != NodeKind::Assign {
        return None;
    }
    head.children
        .first()
        .filter(|target| target.kind == NodeKind::Variable)
        .map(|target| target.token.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(text: &str) -> String {
        compile(text).unwrap().root.to_expr_string()
    }

    #[test]
    fn test_precedence_staging() {
        assert_eq!(compiled("1+2*3"), "(1+(2*3))");
        assert_eq!(compiled("2^3*4+5"), "(((2^3)*4)+5)");
        assert_eq!(compiled("1+2-3"), "((1+2)-3)");
    }

    #[test]
    fn test_left_associative_stages() {
        assert_eq!(compiled("8-3-2"), "((8-3)-2)");
        assert_eq!(compiled("2^3^2"), "((2^3)^2)");
        assert_eq!(compiled("100/5/2"), "((100/5)/2)");
    }

    #[test]
    fn test_assignment_folds_right_to_left() {
        assert_eq!(compiled("a=b=5"), "(a=(b=5))");
        assert_eq!(compiled("x=1+2"), "(x=(1+2))");
    }

    #[test]
    fn test_brackets_fold_first() {
        assert_eq!(compiled("(1+2)*3"), "((1+2)*3)");
        assert_eq!(compiled("(3+4)"), "(3+4)");
        assert_eq!(compiled("((42))"), "42");
    }

    #[test]
    fn test_unary_signs_wrap_in_groups() {
        assert_eq!(compiled("-3+4"), "((0-3)+4)");
        assert_eq!(compiled("2+-11"), "(2+(0-11))");
        assert_eq!(compiled("a=-3"), "(a=(0-3))");
        assert_eq!(compiled("2--3"), "(2-(0-3))");
    }

    #[test]
    fn test_unary_sign_binds_before_power() {
        assert_eq!(compiled("5*-11^2"), "(5*((0-11)^2))");
        assert_eq!(compiled("-3^2"), "((0-3)^2)");
    }

    #[test]
    fn test_nested_sign_normalization() {
        // the wrapped operand and the first child both get normalized
        assert_eq!(compiled("(-1+2)+3"), "(((0-1)+2)+3)");
        assert_eq!(compiled("2+-(3+-4)"), "(2+(0-(3+(0-4))))");
    }

    #[test]
    fn test_function_call_detection() {
        assert_eq!(compiled("area(3,4)"), "area(3,4)");
        assert_eq!(compiled("f(1+2,3*4)"), "f((1+2),(3*4))");
        assert_eq!(compiled("sq(sq(2))"), "sq(sq(2))");
        // a group not preceded by a variable stays a group
        assert_eq!(compiled("2*(3+4)"), "(2*(3+4))");
    }

    #[test]
    fn test_single_argument_call_survives_folding() {
        let def = compile("f(3)").unwrap();
        assert_eq!(def.root.kind, NodeKind::Function);
        assert_eq!(def.root.children.len(), 1);
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(matches!(
            compile("(1+2"),
            Err(ExprError::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            compile("1+2)"),
            Err(ExprError::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            compile(")("),
            Err(ExprError::UnbalancedBrackets { .. })
        ));
        // a stray `)` never pairs with another stray `)`
        assert!(matches!(
            compile("1+2))"),
            Err(ExprError::UnbalancedBrackets { .. })
        ));
    }

    #[test]
    fn test_missing_operands() {
        assert!(matches!(
            compile("*3"),
            Err(ExprError::MissingOperand { side: Side::Left, .. })
        ));
        assert!(matches!(
            compile("2+"),
            Err(ExprError::MissingOperand { side: Side::Right, .. })
        ));
        assert!(matches!(
            compile("2*/3"),
            Err(ExprError::MissingOperand { side: Side::Left, .. })
        ));
        assert!(matches!(
            compile("(3+)4"),
            Err(ExprError::MissingOperand { side: Side::Right, .. })
        ));
    }

    #[test]
    fn test_inferred_parameters() {
        let def = compile("area=a*b").unwrap();
        assert_eq!(def.name.as_deref(), Some("area"));
        assert_eq!(def.params, ["a", "b"]);
        assert_eq!(def.source, "area=a*b");

        // duplicates collapse, first appearance wins
        let def = compile("f=a*b+a-c").unwrap();
        assert_eq!(def.params, ["a", "b", "c"]);
    }

    #[test]
    fn test_bound_name_only_for_variable_targets() {
        assert_eq!(compile("x=1").unwrap().name.as_deref(), Some("x"));
        assert!(compile("3=4").unwrap().name.is_none());
        assert!(compile("1+2").unwrap().name.is_none());
    }

    #[test]
    fn test_sequence_keeps_separators() {
        let def = compile("a=1;b=2").unwrap();
        assert_eq!(def.root.kind, NodeKind::Group);
        assert_eq!(def.root.children.len(), 3);
        assert_eq!(def.root.children[1].kind, NodeKind::End);
        assert_eq!(def.root.to_expr_string(), "{(a=1),;,(b=2)}");
        // the first assignment names the definition
        assert_eq!(def.name.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_input_compiles_to_empty_group() {
        let def = compile("").unwrap();
        assert_eq!(def.root.kind, NodeKind::Group);
        assert!(def.root.children.is_empty());
        assert!(def.params.is_empty());
    }
}
