use bigdecimal::{BigDecimal, RoundingMode};
use indexmap::IndexMap;
use log::debug;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use super::error::{ExprError, Side};
use super::{compile, operator, Definition, Environment, Node, NodeKind};

/// Division scale used by [`Evaluator::default`].
const DEFAULT_SCALE: i64 = 48;

/// Variable bindings visible inside one function call.
type Scope = IndexMap<String, BigDecimal>;

/// Tree-walking expression evaluator with a persistent environment.
///
/// The division scale and rounding policy are fixed at construction and apply
/// to every `/`. All arithmetic is arbitrary-precision decimal except `^`,
/// which goes through `f64` exponentiation and back.
///
/// An instance owns mutable session state and is not thread-safe; concurrent
/// use must be serialized by the caller. Intended usage is one evaluator per
/// logical session.
pub struct Evaluator {
    scale: i64,
    rounding: RoundingMode,
    env: Environment,
}

impl Evaluator {
    /// `scale` is the (non-negative) number of fractional digits kept by
    /// division under `rounding`.
    pub fn new(scale: i64, rounding: RoundingMode) -> Self {
        Self {
            scale,
            rounding,
            env: Environment::new(),
        }
    }

    /// Parses expression text and, when the folded result is a top-level
    /// assignment to a plain variable, registers it as a callable definition
    /// (re-registration overwrites).
    pub fn parse(&mut self, text: &str) -> Result<Definition, ExprError> {
        let def = compile(text)?;
        if let Some(name) = &def.name {
            debug!("registering definition `{}` with parameters {:?}", name, def.params);
            self.env.define(name, def.clone());
        }
        Ok(def)
    }

    /// Parses then evaluates against this instance's environment.
    ///
    /// Assignments write through to the environment; writes that happened
    /// before a failure later in the same expression are kept.
    pub fn evaluate(&mut self, text: &str) -> Result<BigDecimal, ExprError> {
        let def = self.parse(text)?;
        let result = self.eval_node(&def.root, None)?;
        debug!("evaluated `{}` = {}", text, result);
        Ok(result)
    }

    /// Evaluates an already-parsed expression against the environment.
    pub fn evaluate_parsed(&mut self, def: &Definition) -> Result<BigDecimal, ExprError> {
        self.eval_node(&def.root, None)
    }

    pub fn set_var(&mut self, name: &str, value: BigDecimal) {
        self.env.set_var(name, value);
    }

    pub fn var(&self, name: &str) -> Option<&BigDecimal> {
        self.env.var(name)
    }

    /// Insertion-ordered snapshot of the variable map.
    pub fn vars(&self) -> IndexMap<String, BigDecimal> {
        self.env.vars()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    fn eval_node(&mut self, node: &Node, scope: Option<&Scope>) -> Result<BigDecimal, ExprError> {
        match node.kind {
            NodeKind::Number => node
                .token
                .parse::<BigDecimal>()
                .map_err(|_| ExprError::InvalidLiteral {
                    text: node.token.clone(),
                }),
            NodeKind::Operator => self.eval_operator(node, scope),
            NodeKind::Variable => {
                let value = match scope {
                    Some(vars) => vars.get(&node.token),
                    None => self.env.var(&node.token),
                };
                value.cloned().ok_or_else(|| ExprError::UndefinedVariable {
                    name: node.token.clone(),
                    begin: node.begin,
                    end: node.end,
                })
            }
            NodeKind::Group => {
                let mut result = None;
                for child in &node.children {
                    if child.kind == NodeKind::End {
                        continue; // `;` sequencing separator
                    }
                    result = Some(self.eval_node(child, scope)?);
                }
                result.ok_or(ExprError::EmptyExpression)
            }
            NodeKind::Function => self.eval_call(node, scope),
            NodeKind::Assign => {
                let target = node
                    .children
                    .first()
                    .filter(|t| t.kind == NodeKind::Variable)
                    .ok_or(ExprError::InvalidAssignmentTarget {
                        begin: node.begin,
                        end: node.end,
                    })?;
                let value_node =
                    node.children
                        .get(1)
                        .ok_or_else(|| ExprError::MissingOperand {
                            side: Side::Right,
                            token: node.token.clone(),
                            begin: node.begin,
                            end: node.end,
                        })?;
                let name = target.token.clone();
                let value = self.eval_node(value_node, scope)?;
                // write-through to the shared map; call scopes never absorb
                // assignments
                self.env.set_var(&name, value.clone());
                Ok(value)
            }
            NodeKind::Bracket | NodeKind::End => Err(ExprError::InvalidToken {
                token: node.token.clone(),
                begin: node.begin,
                end: node.end,
            }),
        }
    }

    fn eval_operator(
        &mut self,
        node: &Node,
        scope: Option<&Scope>,
    ) -> Result<BigDecimal, ExprError> {
        let descriptor = operator(&node.token).ok_or_else(|| ExprError::InvalidToken {
            token: node.token.clone(),
            begin: node.begin,
            end: node.end,
        })?;
        let arity = descriptor.left_args + descriptor.right_args;
        if node.children.len() < arity {
            return Err(ExprError::MissingOperand {
                side: Side::Right,
                token: node.token.clone(),
                begin: node.begin,
                end: node.end,
            });
        }
        let mut args = Vec::with_capacity(arity);
        for child in &node.children[..arity] {
            args.push(self.eval_node(child, scope)?);
        }
        self.apply(node, &args[0], &args[1])
    }

    fn apply(
        &self,
        node: &Node,
        lhs: &BigDecimal,
        rhs: &BigDecimal,
    ) -> Result<BigDecimal, ExprError> {
        match node.token.as_str() {
            "+" => Ok(lhs + rhs),
            "-" => Ok(lhs - rhs),
            "*" => Ok(lhs * rhs),
            "/" => {
                if rhs.is_zero() {
                    return Err(ExprError::DivisionPolicyViolation {
                        scale: self.scale,
                        detail: "division by zero".to_string(),
                    });
                }
                Ok((lhs / rhs).with_scale_round(self.scale, self.rounding))
            }
            "^" => {
                // deliberate precision compromise: power goes through f64
                let base = lhs.to_f64().ok_or_else(|| ExprError::InvalidLiteral {
                    text: lhs.to_string(),
                })?;
                let exponent = rhs.to_f64().ok_or_else(|| ExprError::InvalidLiteral {
                    text: rhs.to_string(),
                })?;
                let value = base.powf(exponent);
                BigDecimal::from_f64(value).ok_or(ExprError::InvalidLiteral {
                    text: value.to_string(),
                })
            }
            _ => Err(ExprError::InvalidToken {
                token: node.token.clone(),
                begin: node.begin,
                end: node.end,
            }),
        }
    }

    fn eval_call(&mut self, node: &Node, scope: Option<&Scope>) -> Result<BigDecimal, ExprError> {
        let def = self
            .env
            .definition(&node.token)
            .cloned()
            .ok_or_else(|| ExprError::UndefinedFunction {
                name: node.token.clone(),
                begin: node.begin,
                end: node.end,
            })?;
        let args: Vec<&Node> = node
            .children
            .iter()
            .filter(|child| child.kind != NodeKind::End)
            .collect();
        if args.len() < def.params.len() {
            return Err(ExprError::ArgumentCountMismatch {
                name: node.token.clone(),
                expected: def.params.len(),
                supplied: args.len(),
            });
        }
        // arguments evaluate under the caller's scope; the body runs under a
        // copy of the caller's variables plus the positional bindings, which
        // is discarded after the call
        let mut call_scope: Scope = match scope {
            Some(vars) => vars.clone(),
            None => self.env.vars(),
        };
        for (param, arg) in def.params.iter().zip(args) {
            let value = self.eval_node(arg, scope)?;
            call_scope.insert(param.clone(), value);
        }
        self.eval_node(&def.root, Some(&call_scope))
    }
}

impl Default for Evaluator {
    /// Scale 48, rounding half-up.
    fn default() -> Self {
        Self::new(DEFAULT_SCALE, RoundingMode::HalfUp)
    }
}
