use std::collections::HashMap;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::scanner::Token;
use crate::value::Value;

/// Handle of a scope inside an [`Environment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

/// Chain of lexical scopes stored in an arena.
///
/// Each scope links to its enclosing scope by handle, so the chain can never
/// form a cycle. Scopes are opened with [`Environment::push`] and freed with
/// [`Environment::pop`] when the block that opened them finishes. The global
/// scope is created with the environment and is never popped.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            scopes: vec![Scope::default()],
            current: ScopeId(0),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes in the current chain, the global scope included.
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// Open a child scope of the current scope and make it current.
    pub fn push(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            values: HashMap::new(),
            enclosing: Some(self.current),
        });
        self.current = id;
        tracing::trace!(depth = self.depth(), "scope pushed");
        id
    }

    /// Free the current scope and return to its enclosing scope.
    pub fn pop(&mut self) {
        // scopes strictly nest, so the current scope is always the newest one in the arena
        if let Some(enclosing) = self.scopes[self.current.0].enclosing {
            self.scopes.truncate(self.current.0);
            self.current = enclosing;
            tracing::trace!(depth = self.depth(), "scope popped");
        }
    }

    /// Bind `name` in the current scope, replacing any existing binding there.
    pub fn define(&mut self, name: &str, value: Value) {
        self.scopes[self.current.0].values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        self.chain()
            .find_map(|id| self.scopes[id.0].values.get(&name.lexeme))
            .cloned()
            .ok_or_else(|| undefined(name))
    }

    /// Update the nearest existing binding of `name`. Never creates a new one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let owner = self
            .chain()
            .find(|id| self.scopes[id.0].values.contains_key(&name.lexeme))
            .ok_or_else(|| undefined(name))?;

        if let Some(slot) = self.scopes[owner.0].values.get_mut(&name.lexeme) {
            *slot = value;
        }
        Ok(())
    }

    fn chain(&self) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(self.current), move |id| self.scopes[id.0].enclosing)
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, RuntimeErrorKind::UndefinedVariable(name.lexeme.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TokenType;

    fn name(lexeme: &str) -> Token {
        Token {
            token_type: TokenType::Identifier,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 7,
        }
    }

    #[test]
    fn get_walks_outward() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.push();
        env.push();
        assert_eq!(3, env.depth());
        assert_eq!(Ok(Value::Number(1.0)), env.get(&name("a")));
    }

    #[test]
    fn inner_definition_shadows_and_disappears() {
        let mut env = Environment::new();
        env.define("a", Value::from("outer"));
        env.push();
        env.define("a", Value::from("inner"));
        assert_eq!(Ok(Value::from("inner")), env.get(&name("a")));
        env.pop();
        assert_eq!(Ok(Value::from("outer")), env.get(&name("a")));
        assert_eq!(1, env.depth());
    }

    #[test]
    fn block_locals_are_gone_after_pop() {
        let mut env = Environment::new();
        env.push();
        env.define("local", Value::Nil);
        env.pop();
        let error = env.get(&name("local")).unwrap_err();
        assert_eq!(RuntimeErrorKind::UndefinedVariable("local".to_string()), error.kind);
        assert_eq!(7, error.line());
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.push();
        env.assign(&name("a"), Value::Number(2.0)).unwrap();
        env.pop();
        assert_eq!(Ok(Value::Number(2.0)), env.get(&name("a")));
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let mut env = Environment::new();
        let error = env.assign(&name("missing"), Value::Nil).unwrap_err();
        assert_eq!("Undefined variable 'missing'.\n [line 7]", error.to_string());
        assert!(env.get(&name("missing")).is_err());
    }

    #[test]
    fn redefinition_replaces_silently() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Boolean(true));
        assert_eq!(Ok(Value::Boolean(true)), env.get(&name("a")));
    }

    #[test]
    fn popping_global_scope_is_a_no_op() {
        let mut env = Environment::new();
        env.define("a", Value::Nil);
        env.pop();
        assert_eq!(1, env.depth());
        assert_eq!(Ok(Value::Nil), env.get(&name("a")));
    }

    #[test]
    fn scope_handles_are_reused_after_pop() {
        let mut env = Environment::new();
        let first = env.push();
        env.pop();
        let second = env.push();
        assert_eq!(first, second);
        assert_ne!(env.current(), ScopeId(0));
    }
}
