use crate::types::{LangError, PrimitiveFunc, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

// --- Environment Definition ---

#[derive(Debug, Clone)]
pub struct Environment {
    // Use Rc<RefCell<...>> to allow shared ownership and interior mutability.
    // Needed for the scope chain and for lambda scopes re-parented at call time.
    parent: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates a new, empty environment with no parent. Used both for the
    /// global scope and for the private scope of a freshly built lambda.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            parent: None,
            bindings: HashMap::new(),
        }))
    }

    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new(); // Create empty global env
        {
            // Borrow mutably only inside this scope
            let mut env = env_ptr.borrow_mut();

            // List operations
            env.add_primitive("list", crate::primitives::prim_list);
            env.add_primitive("eval", crate::primitives::prim_eval);
            env.add_primitive("head", crate::primitives::prim_head);
            env.add_primitive("tail", crate::primitives::prim_tail);
            env.add_primitive("join", crate::primitives::prim_join);

            // Binding forms and lambda construction
            env.add_primitive("def", crate::primitives::prim_def);
            env.add_primitive("let", crate::primitives::prim_let);
            env.add_primitive("\\", crate::primitives::prim_lambda);

            // Arithmetic
            env.add_primitive("+", crate::primitives::prim_add);
            env.add_primitive("-", crate::primitives::prim_sub);
            env.add_primitive("*", crate::primitives::prim_mul);
            env.add_primitive("/", crate::primitives::prim_div);
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(parent: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            parent: Some(parent),
            bindings: HashMap::new(),
        }))
    }

    /// Defines a variable in the *current* scope only.
    /// Replaces the value if the variable already exists in this scope.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Defines a variable in the root scope of the chain, making the binding
    /// visible from every scope. Backs the language's `def`.
    pub fn define_global(env: &Rc<RefCell<Environment>>, name: String, value: Value) {
        let mut scope = env.clone();
        loop {
            let parent = scope.borrow().parent.clone();
            match parent {
                Some(outer) => scope = outer,
                None => break,
            }
        }
        scope.borrow_mut().define(name, value);
    }

    /// Looks up a variable and returns a copy of its value.
    /// Checks the current scope first, then walks up the parent chain.
    pub fn get(&self, name: &str) -> Result<Value, LangError> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else {
            match &self.parent {
                Some(parent) => parent.borrow().get(name),
                None => Err(LangError::UnboundSymbol(name.to_string())),
            }
        }
    }

    /// Attaches this scope to an outer one. Called when a saturated lambda is
    /// about to run: its private scope is parented to the call-site
    /// environment, so the body sees bindings visible where the call happens.
    pub fn set_parent(&mut self, parent: Rc<RefCell<Environment>>) {
        self.parent = Some(parent);
    }

    /// Helper to add a primitive function to the environment.
    fn add_primitive(&mut self, name: &str, func: PrimitiveFunc) {
        self.define(name.to_string(), Value::primitive(name, func));
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match &self.parent {
            Some(parent) => parent.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets a list of all identifiers bound anywhere in the chain.
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Value {
        Value::Number(n)
    }

    fn sym(s: &str) -> Value {
        Value::Symbol(s.to_string())
    }

    #[test]
    fn test_define_and_get_global() {
        let env = Environment::new();
        env.borrow_mut().define("x".to_string(), num(10));

        let result = env.borrow().get("x");
        assert_eq!(result, Ok(num(10)));
    }

    #[test]
    fn test_get_unbound_global() {
        let env = Environment::new();
        let result = env.borrow().get("y");
        assert_eq!(result, Err(LangError::UnboundSymbol("y".to_string())));
    }

    #[test]
    fn test_define_and_get_enclosed() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), num(10)); // Define x globally

        let local_env = Environment::new_enclosed(global_env);
        local_env.borrow_mut().define("y".to_string(), num(20)); // Define y locally

        // Get local var y
        assert_eq!(local_env.borrow().get("y"), Ok(num(20)));

        // Get global var x from local scope
        assert_eq!(local_env.borrow().get("x"), Ok(num(10)));
    }

    #[test]
    fn test_shadowing() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), num(10));

        let local_env = Environment::new_enclosed(global_env.clone());
        local_env.borrow_mut().define("x".to_string(), num(50)); // Shadow global x

        let inner_local_env = Environment::new_enclosed(local_env.clone());
        inner_local_env
            .borrow_mut()
            .define("y".to_string(), sym("y-value"));

        // Get x from inner local (should be 50 from local_env)
        assert_eq!(inner_local_env.borrow().get("x"), Ok(num(50)));

        // Get y from inner local
        assert_eq!(inner_local_env.borrow().get("y"), Ok(sym("y-value")));

        // Get x from global (should be 10, unchanged by the shadow)
        assert_eq!(global_env.borrow().get("x"), Ok(num(10)));
    }

    #[test]
    fn test_define_global_from_nested_scope() {
        let global_env = Environment::new();
        let local_env = Environment::new_enclosed(global_env.clone());
        let inner_env = Environment::new_enclosed(local_env.clone());

        Environment::define_global(&inner_env, "x".to_string(), num(5));

        // The binding lands at the root, so every scope in the chain sees it
        assert_eq!(global_env.borrow().get("x"), Ok(num(5)));
        assert_eq!(local_env.borrow().get("x"), Ok(num(5)));
        assert_eq!(inner_env.borrow().get("x"), Ok(num(5)));

        // A later local define shadows without touching the root binding
        local_env.borrow_mut().define("x".to_string(), num(9));
        assert_eq!(global_env.borrow().get("x"), Ok(num(5)));
        assert_eq!(inner_env.borrow().get("x"), Ok(num(9)));
    }

    #[test]
    fn test_get_identifiers_walks_chain() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), num(1));

        let local_env = Environment::new_enclosed(global_env);
        local_env.borrow_mut().define("y".to_string(), num(2));

        let identifiers = local_env.borrow().get_identifiers();
        assert!(identifiers.contains("x"));
        assert!(identifiers.contains("y"));
    }

    #[test]
    fn test_global_populated_has_builtins() {
        let env = Environment::new_global_populated();
        for name in ["list", "eval", "head", "tail", "join", "def", "let", "\\", "+", "-", "*", "/"]
        {
            assert!(
                matches!(env.borrow().get(name), Ok(Value::Function(_))),
                "`{}` should be bound to a function",
                name
            );
        }
    }
}
