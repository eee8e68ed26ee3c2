use crate::environment::Environment;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Represents a Slip value.
/// This enum is the core data structure for both code and data: the reader
/// produces a `Value` tree and the evaluator reduces it to another `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(i64),          // e.g., 42, -7
    Error(LangError),     // first-class failure value, not an exception
    Symbol(String),       // e.g., +, head, variable-name
    SExpr(Vec<Value>),    // ( ... ), reduced by evaluation
    QExpr(Vec<Value>),    // { ... }, an inert list, never auto-reduced
    Function(Function),
}

pub type PrimitiveFunc = fn(&Rc<RefCell<Environment>>, Vec<Value>) -> Value;

#[derive(Clone)]
pub enum Function {
    Primitive(PrimitiveFunc, String), // The function pointer and its name (for display/debug)
    Lambda(Lambda),
}

/// A user-defined function: formal parameter names, a Q-expression body, and
/// a private scope that starts empty and fills up as arguments are bound.
#[derive(Debug)]
pub struct Lambda {
    pub formals: Vec<String>,
    pub body: Box<Value>,
    pub scope: Rc<RefCell<Environment>>,
}

impl Value {
    pub fn primitive(name: &str, func: PrimitiveFunc) -> Value {
        Value::Function(Function::Primitive(func, name.to_string()))
    }

    pub fn lambda(formals: Vec<String>, body: Value) -> Value {
        Value::Function(Function::Lambda(Lambda {
            formals,
            body: Box::new(body),
            scope: Environment::new(),
        }))
    }

    /// Stable per-variant name used in diagnostic messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Error(_) => "error",
            Value::Symbol(_) => "symbol",
            Value::SExpr(_) => "s-expression",
            Value::QExpr(_) => "q-expression",
            Value::Function(_) => "function",
        }
    }
}

// A cloned lambda gets its own copy of the private scope, so argument
// bindings never leak between copies. Only the parent link is shared.
impl Clone for Lambda {
    fn clone(&self) -> Self {
        Lambda {
            formals: self.formals.clone(),
            body: self.body.clone(),
            scope: Rc::new(RefCell::new(self.scope.borrow().clone())),
        }
    }
}

// Function pointers don't carry a useful Debug representation, so show the
// registered name instead.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Primitive(_, name) => write!(f, "Primitive({})", name),
            Function::Lambda(lambda) => f
                .debug_struct("Lambda")
                .field("formals", &lambda.formals)
                .field("body", &lambda.body)
                .finish(),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Primitives are compared by registered name
            (Function::Primitive(_, n1), Function::Primitive(_, n2)) => n1 == n2,
            // Lambdas by formals and body; their private scopes are ignored
            (Function::Lambda(l1), Function::Lambda(l2)) => {
                l1.formals == l2.formals && l1.body == l2.body
            }
            _ => false,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{}", open)?;
    let mut first = true;
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
        first = false;
    }
    write!(f, "{}", close)
}

// Canonical textual form; `println!` of a Value is the newline-terminated
// top-level variant.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(err) => write!(f, "Error: {}", err),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::SExpr(items) => write_items(f, items, '(', ')'),
            Value::QExpr(items) => write_items(f, items, '{', '}'),
            Value::Function(function) => write!(f, "{}", function),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Primitive(_, name) => write!(f, "#<primitive:{}>", name),
            Function::Lambda(lambda) => {
                write!(f, "(\\ {{{}}} {})", lambda.formals.join(" "), lambda.body)
            }
        }
    }
}

/// The language's error taxonomy. An error is an ordinary `Value` variant
/// that flows through evaluation results; it is never thrown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LangError {
    #[error("unbound symbol `{0}`")]
    UnboundSymbol(String),

    #[error("`{context}` expected {expected}, got {found}")]
    TypeMismatch {
        context: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{context}` expected {expected} argument(s), got {found}")]
    ArityMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("more arguments supplied than available: function takes {formals}, got {supplied}")]
    TooManyArguments { formals: usize, supplied: usize },

    #[error("`{context}` expected one value per symbol: {symbols} symbol(s), {values} value(s)")]
    BindingMismatch {
        context: &'static str,
        symbols: usize,
        values: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{0}` is undefined for the empty list {{}}")]
    EmptyList(&'static str),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("s-expression should start with a function, got {0}")]
    NotAFunction(&'static str),
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
    fn test_render_atoms() {
        assert_eq!(num(42).to_string(), "42");
        assert_eq!(num(-7).to_string(), "-7");
        assert_eq!(sym("head").to_string(), "head");
        assert_eq!(
            Value::Error(LangError::DivisionByZero).to_string(),
            "Error: division by zero"
        );
    }

    #[test]
    fn test_render_expressions() {
        let sexpr = Value::SExpr(vec![sym("+"), num(1), num(2)]);
        assert_eq!(sexpr.to_string(), "(+ 1 2)");

        let qexpr = Value::QExpr(vec![num(1), Value::QExpr(vec![num(2), num(3)])]);
        assert_eq!(qexpr.to_string(), "{1 {2 3}}");

        assert_eq!(Value::SExpr(vec![]).to_string(), "()");
        assert_eq!(Value::QExpr(vec![]).to_string(), "{}");
    }

    #[test]
    fn test_render_functions() {
        fn dummy(_env: &Rc<RefCell<Environment>>, _args: Vec<Value>) -> Value {
            Value::SExpr(vec![])
        }
        assert_eq!(
            Value::primitive("head", dummy).to_string(),
            "#<primitive:head>"
        );

        let lambda = Value::lambda(
            vec!["x".to_string(), "y".to_string()],
            Value::QExpr(vec![sym("+"), sym("x"), sym("y")]),
        );
        assert_eq!(lambda.to_string(), "(\\ {x y} {+ x y})");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(num(1).type_name(), "number");
        assert_eq!(sym("x").type_name(), "symbol");
        assert_eq!(Value::SExpr(vec![]).type_name(), "s-expression");
        assert_eq!(Value::QExpr(vec![]).type_name(), "q-expression");
        assert_eq!(
            Value::Error(LangError::DivisionByZero).type_name(),
            "error"
        );
        assert_eq!(
            Value::lambda(vec![], Value::QExpr(vec![])).type_name(),
            "function"
        );
    }

    #[test]
    fn test_lambda_clone_has_private_scope() {
        let original = match Value::lambda(
            vec!["x".to_string()],
            Value::QExpr(vec![sym("x")]),
        ) {
            Value::Function(Function::Lambda(lambda)) => lambda,
            _ => unreachable!(),
        };

        let copy = original.clone();
        copy.scope
            .borrow_mut()
            .define("x".to_string(), num(10));

        // Binding an argument in the copy must not leak into the original
        assert!(original.scope.borrow().get("x").is_err());
        assert_eq!(copy.scope.borrow().get("x").unwrap(), num(10));
    }

    #[test]
    fn test_symbol_equality_is_exact() {
        // Prefix/substring overlap is not equality
        assert_ne!(sym("head"), sym("heads"));
        assert_ne!(sym("heads"), sym("head"));
        assert_eq!(sym("head"), sym("head"));
    }
}
