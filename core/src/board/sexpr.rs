//! Minimal reader for the s-expression syntax of KiCad board files.

use crate::prelude::{ToolError, ToolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Atom(String),
    Str(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// Text of an atom or string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Sexpr::Atom(text) | Sexpr::Str(text) => Some(text),
            Sexpr::List(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Sexpr::Atom(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Sexpr] {
        match self {
            Sexpr::List(items) => items,
            _ => &[],
        }
    }

    /// Leading atom of a list, e.g. `segment` for `(segment ...)`.
    pub fn head(&self) -> Option<&str> {
        match self.items().first() {
            Some(Sexpr::Atom(text)) => Some(text),
            _ => None,
        }
    }

    /// Item after the head.
    pub fn arg(&self, index: usize) -> Option<&Sexpr> {
        self.items().get(index + 1)
    }

    pub fn child(&self, name: &str) -> Option<&Sexpr> {
        self.items().iter().find(|item| item.head() == Some(name))
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Sexpr> + 'a {
        self.items()
            .iter()
            .filter(move |item| item.head() == Some(name))
    }
}

/// Parses the first complete expression in `text`.
pub fn parse(text: &str) -> ToolResult<Sexpr> {
    let mut stack: Vec<Vec<Sexpr>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '(' => stack.push(Vec::new()),
            ')' => {
                let items = stack
                    .pop()
                    .ok_or_else(|| ToolError::parse(line, "unbalanced ')'"))?;
                let list = Sexpr::List(items);
                match stack.last_mut() {
                    Some(parent) => parent.push(list),
                    None => return Ok(list),
                }
            }
            '"' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(other) => value.push(other),
                            None => return Err(ToolError::parse(line, "unterminated string")),
                        },
                        Some('\n') => {
                            line += 1;
                            value.push('\n');
                        }
                        Some(other) => value.push(other),
                        None => return Err(ToolError::parse(line, "unterminated string")),
                    }
                }
                push_item(&mut stack, Sexpr::Str(value), line)?;
            }
            first => {
                let mut atom = String::from(first);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '(' || next == ')' || next == '"' {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                push_item(&mut stack, Sexpr::Atom(atom), line)?;
            }
        }
    }

    Err(ToolError::parse(
        line,
        if stack.is_empty() {
            "no expression found"
        } else {
            "unexpected end of input, missing ')'"
        },
    ))
}

fn push_item(stack: &mut [Vec<Sexpr>], item: Sexpr, line: usize) -> ToolResult<()> {
    match stack.last_mut() {
        Some(list) => {
            list.push(item);
            Ok(())
        }
        None => Err(ToolError::parse(line, "value outside of any list")),
    }
}
