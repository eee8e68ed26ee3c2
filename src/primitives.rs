use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::Environment;
use crate::evaluator::evaluate;
use crate::types::{LangError, Value};

// Argument-count guard: returns an error *value* from the enclosing
// primitive.
macro_rules! check_arity {
    ($args:expr, $expected:expr, $name:expr) => {
        if $args.len() != $expected {
            return Value::Error(LangError::ArityMismatch {
                context: $name,
                expected: $expected,
                found: $args.len(),
            });
        }
    };
}

fn type_mismatch(context: &'static str, expected: &'static str, found: &Value) -> Value {
    Value::Error(LangError::TypeMismatch {
        context,
        expected,
        found: found.type_name(),
    })
}

/// (list 1 2 3) -> {1 2 3}
///
/// Relabels the evaluated argument list as an inert q-expression.
pub fn prim_list(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    Value::QExpr(args)
}

/// (eval {+ 1 2}) -> 3
///
/// Relabels a non-empty q-expression as an s-expression and reduces it.
/// Lambda bodies are run through this same path by the call protocol.
pub fn prim_eval(env: &Rc<RefCell<Environment>>, mut args: Vec<Value>) -> Value {
    check_arity!(args, 1, "eval");
    match args.remove(0) {
        Value::QExpr(items) if items.is_empty() => Value::Error(LangError::EmptyList("eval")),
        Value::QExpr(items) => evaluate(env, Value::SExpr(items)),
        other => type_mismatch("eval", "q-expression", &other),
    }
}

/// (head {1 2 3}) -> {1}
pub fn prim_head(_env: &Rc<RefCell<Environment>>, mut args: Vec<Value>) -> Value {
    check_arity!(args, 1, "head");
    match args.remove(0) {
        Value::QExpr(items) if items.is_empty() => Value::Error(LangError::EmptyList("head")),
        Value::QExpr(mut items) => {
            items.truncate(1);
            Value::QExpr(items)
        }
        other => type_mismatch("head", "q-expression", &other),
    }
}

/// (tail {1 2 3}) -> {2 3}
pub fn prim_tail(_env: &Rc<RefCell<Environment>>, mut args: Vec<Value>) -> Value {
    check_arity!(args, 1, "tail");
    match args.remove(0) {
        Value::QExpr(items) if items.is_empty() => Value::Error(LangError::EmptyList("tail")),
        Value::QExpr(mut items) => {
            items.remove(0);
            Value::QExpr(items)
        }
        other => type_mismatch("tail", "q-expression", &other),
    }
}

/// (join {1} {2 3}) -> {1 2 3}
///
/// Concatenates any number of q-expressions, in order.
pub fn prim_join(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    let mut joined = Vec::new();
    for arg in args {
        match arg {
            Value::QExpr(mut items) => joined.append(&mut items),
            other => return type_mismatch("join", "q-expression", &other),
        }
    }
    Value::QExpr(joined)
}

// Left fold over number arguments. The per-step closure reports division by
// zero; every other failure mode is caught up front.
fn fold_numbers<F: Fn(i64, i64) -> Result<i64, LangError>>(
    args: Vec<Value>,
    operator: &'static str,
    func: F,
) -> Value {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in &args {
        match arg {
            Value::Number(n) => numbers.push(*n),
            other => return type_mismatch(operator, "number", other),
        }
    }

    let Some((&first, rest)) = numbers.split_first() else {
        return Value::Error(LangError::ArityMismatch {
            context: operator,
            expected: 1,
            found: 0,
        });
    };

    // (- x) negates
    if operator == "-" && rest.is_empty() {
        return Value::Number(first.wrapping_neg());
    }

    let mut acc = first;
    for &n in rest {
        acc = match func(acc, n) {
            Ok(result) => result,
            Err(err) => return Value::Error(err),
        };
    }
    Value::Number(acc)
}

pub fn prim_add(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    fold_numbers(args, "+", |acc, n| Ok(acc.wrapping_add(n)))
}

pub fn prim_sub(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    fold_numbers(args, "-", |acc, n| Ok(acc.wrapping_sub(n)))
}

pub fn prim_mul(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    fold_numbers(args, "*", |acc, n| Ok(acc.wrapping_mul(n)))
}

pub fn prim_div(_env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    fold_numbers(args, "/", |acc, n| {
        if n == 0 {
            Err(LangError::DivisionByZero)
        } else {
            Ok(acc.wrapping_div(n))
        }
    })
}

/// (def {x y} 1 2) binds at the root scope; (let {x y} 1 2) binds locally.
/// Both return () on success.
pub fn prim_def(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    bind_symbols(env, args, "def")
}

pub fn prim_let(env: &Rc<RefCell<Environment>>, args: Vec<Value>) -> Value {
    bind_symbols(env, args, "let")
}

fn bind_symbols(
    env: &Rc<RefCell<Environment>>,
    mut args: Vec<Value>,
    context: &'static str,
) -> Value {
    if args.is_empty() {
        return Value::Error(LangError::ArityMismatch {
            context,
            expected: 1,
            found: 0,
        });
    }

    // First argument is the list of symbols to bind
    let symbols = match args.remove(0) {
        Value::QExpr(items) => items,
        other => return type_mismatch(context, "q-expression", &other),
    };

    let mut names = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match symbol {
            Value::Symbol(name) => names.push(name),
            other => return type_mismatch(context, "symbol", &other),
        }
    }

    if names.len() != args.len() {
        return Value::Error(LangError::BindingMismatch {
            context,
            symbols: names.len(),
            values: args.len(),
        });
    }

    for (name, value) in names.into_iter().zip(args) {
        if context == "def" {
            Environment::define_global(env, name, value);
        } else {
            env.borrow_mut().define(name, value);
        }
    }

    Value::SExpr(vec![])
}

/// (\ {x y} {+ x y}) builds a lambda from a formals list and a body.
pub fn prim_lambda(_env: &Rc<RefCell<Environment>>, mut args: Vec<Value>) -> Value {
    check_arity!(args, 2, "\\");

    let formals = match args.remove(0) {
        Value::QExpr(items) => items,
        other => return type_mismatch("\\", "q-expression", &other),
    };
    let body = match args.remove(0) {
        body @ Value::QExpr(_) => body,
        other => return type_mismatch("\\", "q-expression", &other),
    };

    // Formals must all be symbols; the names alone are kept
    let mut names = Vec::with_capacity(formals.len());
    for formal in formals {
        match formal {
            Value::Symbol(name) => names.push(name),
            other => return type_mismatch("\\", "symbol", &other),
        }
    }

    Value::lambda(names, body)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_list_relabels_arguments() {
        let env = Environment::new();
        assert_eq!(
            prim_list(&env, vec![num(1), num(2)]),
            Value::QExpr(vec![num(1), num(2)])
        );
        assert_eq!(prim_list(&env, vec![]), Value::QExpr(vec![]));
    }

    #[test]
    fn test_join_with_no_arguments_is_empty() {
        let env = Environment::new();
        assert_eq!(prim_join(&env, vec![]), Value::QExpr(vec![]));
    }

    #[test]
    fn test_head_wrong_arity() {
        let env = Environment::new();
        let args = vec![Value::QExpr(vec![num(1)]), Value::QExpr(vec![num(2)])];
        assert_eq!(
            prim_head(&env, args),
            Value::Error(LangError::ArityMismatch {
                context: "head",
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_bind_count_mismatch() {
        let env = Environment::new();
        let args = vec![
            Value::QExpr(vec![
                Value::Symbol("x".to_string()),
                Value::Symbol("y".to_string()),
            ]),
            num(1),
        ];
        assert_eq!(
            prim_def(&env, args),
            Value::Error(LangError::BindingMismatch {
                context: "def",
                symbols: 2,
                values: 1,
            })
        );
    }

    #[test]
    fn test_bind_rejects_non_symbol_names() {
        let env = Environment::new();
        let args = vec![Value::QExpr(vec![num(3)]), num(1)];
        assert_eq!(
            prim_let(&env, args),
            Value::Error(LangError::TypeMismatch {
                context: "let",
                expected: "symbol",
                found: "number",
            })
        );
    }

    #[test]
    fn test_lambda_rejects_non_symbol_formals() {
        let env = Environment::new();
        let args = vec![
            Value::QExpr(vec![Value::Symbol("x".to_string()), num(5)]),
            Value::QExpr(vec![Value::Symbol("x".to_string())]),
        ];
        assert_eq!(
            prim_lambda(&env, args),
            Value::Error(LangError::TypeMismatch {
                context: "\\",
                expected: "symbol",
                found: "number",
            })
        );
    }

    #[test]
    fn test_arithmetic_fold_requires_an_argument() {
        let env = Environment::new();
        assert_eq!(
            prim_add(&env, vec![]),
            Value::Error(LangError::ArityMismatch {
                context: "+",
                expected: 1,
                found: 0,
            })
        );
    }
}
