use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_traits::FromPrimitive;

use super::Definition;

/// Mutable evaluation state: a variable map and a definition map, both
/// insertion-ordered.
///
/// Created seeded with the constants `e` and `pi`. One environment belongs to
/// one evaluator instance; assignments write through to it, and re-defining a
/// name overwrites the previous definition.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: IndexMap<String, BigDecimal>,
    defs: IndexMap<String, Definition>,
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Self {
            vars: IndexMap::new(),
            defs: IndexMap::new(),
        };
        env.set_var("e", constant(std::f64::consts::E));
        env.set_var("pi", constant(std::f64::consts::PI));
        env
    }

    pub fn set_var(&mut self, name: &str, value: BigDecimal) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn var(&self, name: &str) -> Option<&BigDecimal> {
        self.vars.get(name)
    }

    /// Insertion-ordered snapshot of the variable map.
    pub fn vars(&self) -> IndexMap<String, BigDecimal> {
        self.vars.clone()
    }

    pub fn define(&mut self, name: &str, def: Definition) {
        self.defs.insert(name.to_string(), def);
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn constant(value: f64) -> BigDecimal {
    BigDecimal::from_f64(value).unwrap_or_default()
}
