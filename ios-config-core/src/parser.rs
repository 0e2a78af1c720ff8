use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::dialect::Dialect;
use crate::tree::ConfigNode;

/// Lines longer than this are treated as binary or mangled input.
pub const MAX_LINE_LEN: usize = 4096;

/// Errors that can occur while parsing configuration text into a
/// [`ConfigNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Nothing but blank lines and comments.
    #[error("configuration contains no statements")]
    Empty,
    /// A line that cannot be configuration text.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// Statements were found but none of them could be interpreted.
    #[error("line {line}: unrecognized configuration syntax '{text}'")]
    NoStructure { line: usize, text: String },
    /// Failed to read input file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Source line the error refers to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } | ParseError::NoStructure { line, .. } => {
                Some(*line)
            }
            ParseError::Empty | ParseError::Io(_) => None,
        }
    }
}

/// Parse configuration text with the IOS dialect.
pub fn parse(text: &str) -> Result<ConfigNode, ParseError> {
    parse_with_dialect(text, &Dialect::ios())
}

/// Parse a configuration file with the IOS dialect.
pub fn parse_file(path: &Path) -> Result<ConfigNode, ParseError> {
    let bytes = fs::read(path)?;
    parse(&String::from_utf8_lossy(&bytes))
}

/// Parse configuration text into a context tree.
///
/// The syntax carries no reliable indentation, so nesting is recovered from
/// keywords: a mode-opening command starts a new block, a global-only command
/// or another mode opener closes it, `exit` leaves one level and `end` returns
/// to global context.
pub fn parse_with_dialect(text: &str, dialect: &Dialect) -> Result<ConfigNode, ParseError> {
    // stack[0] is the root; deeper entries are open modes.
    let mut stack: Vec<ConfigNode> = vec![ConfigNode::root()];
    let lines: Vec<&str> = text.lines().collect();
    let mut idx = 0;

    while idx < lines.len() {
        let line_no = idx + 1;
        let raw = lines[idx];
        idx += 1;

        check_line(raw, line_no)?;
        let Some(content) = sanitize_line(raw) else {
            continue;
        };

        let tokens: Vec<&str> = content.split_whitespace().collect();
        let words = dialect.canonicalize(&tokens);

        if words.first().is_some_and(|w| w == "banner") {
            idx = skip_banner(&lines, idx, &tokens);
            close_to_depth(&mut stack, 1);
            push_leaf(&mut stack, ConfigNode::new(words, line_no));
            continue;
        }

        match words.first().map(String::as_str) {
            Some("end") => {
                close_to_depth(&mut stack, 1);
                continue;
            }
            Some("exit") => {
                if stack.len() > 1 {
                    close_top(&mut stack);
                }
                continue;
            }
            _ => {}
        }

        if dialect.closes_nested_mode(&words) {
            if stack.len() > 2 {
                close_top(&mut stack);
            }
            continue;
        }

        let parent_words = stack.get(1).map(|n| n.words.clone()).unwrap_or_default();
        if stack.len() >= 2 && dialect.opens_nested_mode(&parent_words, &words) {
            close_to_depth(&mut stack, 2);
            stack.push(ConfigNode::new(words, line_no));
            continue;
        }

        if dialect.opens_mode(&words) {
            close_to_depth(&mut stack, 1);
            stack.push(ConfigNode::new(words, line_no));
            continue;
        }

        if dialect.is_global_only(&words) {
            close_to_depth(&mut stack, 1);
        }
        push_leaf(&mut stack, ConfigNode::new(words, line_no));
    }

    close_to_depth(&mut stack, 1);
    let root = stack.pop().unwrap_or_else(ConfigNode::root);
    if root.children.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(root)
}

/// Strip comments and surrounding whitespace. Returns `None` for lines that
/// carry no statement.
fn sanitize_line(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('#') {
        return None;
    }
    let content = match trimmed.find('!') {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed,
    };
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

fn check_line(raw: &str, line: usize) -> Result<(), ParseError> {
    if raw.len() > MAX_LINE_LEN {
        return Err(ParseError::Syntax {
            line,
            message: format!("line exceeds {MAX_LINE_LEN} characters"),
        });
    }
    if let Some(c) = raw
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\t' | '\r' | '\n'))
    {
        return Err(ParseError::Syntax {
            line,
            message: format!("unexpected control character U+{:04X}", c as u32),
        });
    }
    Ok(())
}

/// Skip the body of a multi-line banner and return the index of the first line
/// after it.
///
/// The delimiter is the first character of the banner text (`banner motd ^C`
/// uses `^C`). A banner whose closing delimiter never appears is treated as a
/// single-line banner so the rest of the configuration still parses.
fn skip_banner(lines: &[&str], next_idx: usize, tokens: &[&str]) -> usize {
    let Some(text) = tokens.get(2).or_else(|| tokens.get(1)) else {
        return next_idx;
    };
    let delimiter = if text.starts_with("^C") {
        "^C"
    } else {
        match text.char_indices().nth(1) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    };
    let rest = &text[delimiter.len()..];
    let remaining = tokens.iter().skip(3).copied().collect::<Vec<_>>().join(" ");
    if rest.contains(delimiter) || remaining.contains(delimiter) {
        return next_idx;
    }

    for (offset, line) in lines[next_idx..].iter().enumerate() {
        if line.contains(delimiter) {
            return next_idx + offset + 1;
        }
    }
    next_idx
}

fn push_leaf(stack: &mut [ConfigNode], node: ConfigNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn close_top(stack: &mut Vec<ConfigNode>) {
    if let Some(node) = stack.pop() {
        push_leaf(stack, node);
    }
}

fn close_to_depth(stack: &mut Vec<ConfigNode>, depth: usize) {
    while stack.len() > depth.max(1) {
        close_top(stack);
    }
}
