use crate::environment::Environment;
use crate::primitives;
use crate::types::{Function, LangError, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluates a value within the given environment.
///
/// Symbols are looked up, s-expressions are reduced, and everything else
/// (numbers, errors, q-expressions, functions) evaluates to itself. Failures
/// come back as `Value::Error`, never through a separate channel.
pub fn evaluate(env: &Rc<RefCell<Environment>>, value: Value) -> Value {
    match value {
        Value::Symbol(name) => match env.borrow().get(&name) {
            Ok(value) => value,
            Err(err) => Value::Error(err),
        },
        Value::SExpr(items) => evaluate_sexpr(env, items),
        other => other,
    }
}

fn evaluate_sexpr(env: &Rc<RefCell<Environment>>, items: Vec<Value>) -> Value {
    // Every item is reduced before any error check: a failure in one item
    // does not stop its siblings from evaluating.
    let mut items: Vec<Value> = items.into_iter().map(|item| evaluate(env, item)).collect();

    // The first error in item order wins; the rest is discarded.
    if let Some(index) = items.iter().position(|item| matches!(item, Value::Error(_))) {
        return items.swap_remove(index);
    }

    // () reduces to itself, (x) reduces to x
    if items.is_empty() {
        return Value::SExpr(items);
    }
    if items.len() == 1 {
        return items.remove(0);
    }

    let head = items.remove(0);
    match head {
        Value::Function(function) => call(env, function, items),
        other => Value::Error(LangError::NotAFunction(other.type_name())),
    }
}

/// Applies a function to an already-evaluated argument list.
///
/// Primitives receive the call-site environment and the arguments directly.
/// Lambda arguments are bound pairwise into the lambda's private scope;
/// supplying fewer arguments than formals returns a partially-applied lambda
/// that can be called again later. Once saturated, the private scope is
/// parented to the *call-site* environment and the body runs inside it.
pub fn call(env: &Rc<RefCell<Environment>>, function: Function, args: Vec<Value>) -> Value {
    match function {
        Function::Primitive(func, _) => func(env, args),
        Function::Lambda(mut lambda) => {
            if args.len() > lambda.formals.len() {
                return Value::Error(LangError::TooManyArguments {
                    formals: lambda.formals.len(),
                    supplied: args.len(),
                });
            }

            for arg in args {
                let formal = lambda.formals.remove(0);
                lambda.scope.borrow_mut().define(formal, arg);
            }

            if lambda.formals.is_empty() {
                let scope = lambda.scope.clone();
                scope.borrow_mut().set_parent(env.clone());
                // The body is a q-expression; running it goes through the
                // `eval` builtin, so an empty body reports the same error as
                // `eval {}`.
                primitives::prim_eval(&scope, vec![*lambda.body])
            } else {
                Value::Function(Function::Lambda(lambda))
            }
        }
    }
}
