use crate::parser::Ast;
use crate::types::{LangError, Value};

/// Converts one front-end AST node into one `Value`.
///
/// The ingestion contract is tag-substring based, so any front end producing
/// nodes whose tags *contain* `number`, `symbol`, `sexpr` or `qexpr` works:
/// composite tags like `expr|qexpr` are accepted as-is. Bracket punctuation
/// children and children tagged exactly `regex` are skipped. The root node
/// (tagged `>`) reads as an s-expression.
pub fn read(ast: &Ast) -> Value {
    if ast.tag.contains("number") {
        return read_number(ast);
    }
    if ast.tag.contains("symbol") {
        return Value::Symbol(ast.contents.clone());
    }

    let mut items = Vec::new();
    for child in &ast.children {
        if matches!(child.contents.as_str(), "(" | ")" | "{" | "}") {
            continue;
        }
        if child.tag == "regex" {
            continue;
        }
        items.push(read(child));
    }

    if ast.tag.contains("qexpr") {
        Value::QExpr(items)
    } else {
        Value::SExpr(items)
    }
}

fn read_number(ast: &Ast) -> Value {
    // Range failures surface as error values, not as front-end errors: the
    // lexer only guarantees the token's shape.
    match ast.contents.parse::<i64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Error(LangError::InvalidNumber(ast.contents.clone())),
    }
}
