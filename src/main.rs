// Non-interactive driver: evaluates standard input line by line against one
// global environment and prints every result, success or error. Use the
// `repl` binary for interactive sessions.
use std::io::{self, BufRead};

use slip::Environment;
use slip::evaluator::evaluate;
use slip::parser::parse_str;
use slip::reader::read;

fn main() {
    let global = Environment::new_global_populated();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("Read error: {}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_str(&line) {
            Ok(ast) => println!("{}", evaluate(&global, read(&ast))),
            Err(parse_err) => parse_err.pretty_print(&line),
        }
    }
}
