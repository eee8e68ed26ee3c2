use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use slip::TokenKind;
use slip::{
    Environment,
    evaluator::evaluate,
    lexer::tokenize,
    parser::parse_str,
    reader::read,
};

struct SlipCompleter {
    env: Rc<RefCell<Environment>>,
}

impl SlipCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        SlipCompleter { env }
    }
}

impl rustyline::completion::Completer for SlipCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((
            pos,
            match tokenize(&line[..pos]) {
                Ok(tokens) => {
                    if let Some(TokenKind::Symbol(prefix)) = tokens.last().map(|t| t.kind.clone()) {
                        // Candidates are everything bound anywhere in the
                        // environment chain, builtins included.
                        self.env
                            .borrow()
                            .get_identifiers()
                            .iter()
                            .filter_map(|id| {
                                id.strip_prefix(&prefix).map(|rest| rest.to_string())
                            })
                            .collect()
                    } else {
                        vec![]
                    }
                }
                Err(_) => vec![],
            },
        ))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: SlipValidator,
    #[rustyline(Highlighter)]
    highlighter: SlipHighlighter,
    #[rustyline(Completer)]
    completer: SlipCompleter,
}

struct SlipValidator;

impl Validator for SlipValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        let mut stack = Vec::new();

        for (i, c) in input.chars().enumerate() {
            match c {
                '(' | '{' => {
                    stack.push((c, i));
                }
                ')' | '}' => {
                    if let Some((opening, _)) = stack.pop() {
                        if !((opening == '(' && c == ')') || (opening == '{' && c == '}')) {
                            return Ok(ValidationResult::Invalid(Some(format!(
                                "  - Unmatched '{}' at position {}",
                                c, i
                            ))));
                        }
                    } else {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched '{}' at position {}",
                            c, i
                        ))));
                    }
                }
                _ => {}
            }
        }

        if stack.is_empty() {
            Ok(ValidationResult::Valid(None))
        } else {
            // Open brackets remain: let the user keep typing on a new line
            Ok(ValidationResult::Incomplete)
        }
    }
}

struct SlipHighlighter;

impl Highlighter for SlipHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut highlighted = String::new();
        let cursor = pos.checked_sub(1);

        for (i, c) in line.chars().enumerate() {
            match c {
                '(' | '{' => {
                    stack.push((c, highlighted.len()));
                    highlighted.push(c);
                }
                ')' | '}' => {
                    if let Some((opening, matching_pos)) = stack.pop() {
                        if (opening == '(' && c == ')') || (opening == '{' && c == '}') {
                            if cursor == Some(matching_pos) || cursor == Some(i) {
                                highlighted.push_str(&format!("\x1b[34m{}\x1b[0m", c)); // Blue for matching brackets
                                highlighted.replace_range(
                                    matching_pos..=matching_pos,
                                    &format!("\x1b[1;34m{}\x1b[0m", opening),
                                );
                            } else {
                                highlighted.push(c);
                            }
                        } else {
                            highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for mismatched brackets
                            highlighted.replace_range(
                                matching_pos..=matching_pos,
                                &format!("\x1b[1;31m{}\x1b[0m", opening),
                            );
                        }
                    } else {
                        highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for unmatched closing brackets
                    }
                }
                _ => {
                    highlighted.push(c);
                }
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    println!("Slip version 0.1.0");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new_global_populated();
    let h = InputValidator {
        validator: SlipValidator,
        highlighter: SlipHighlighter,
        completer: SlipCompleter::new(global_env.clone()),
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history("slip_history.txt").is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("slip> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match parse_str(trimmed_input) {
                    Ok(ast) => {
                        // Whatever comes back is printed, error values included
                        println!("{}", evaluate(&global_env, read(&ast)));
                    }
                    Err(parse_err) => {
                        parse_err.pretty_print(trimmed_input);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("slip_history.txt")
}
