//! Lexer for Ballerina source text.
//!
//! Only as much of the language as the generator emits: identifiers, numbers,
//! string and template literals (with `${}` interpolation), comments and
//! punctuation. Delimiters are matched while lexing so every parsed snippet is
//! known to be balanced before it is attached to a tree.

use std::collections::BTreeSet;

use super::{Snippet, SnippetLine};

/// Keywords whose statements end at their closing brace instead of `;`
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "lock", "foreach", "while", "do", "match", "transaction", "function", "class",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(String),
    Str(String),
    /// Raw template literal text, without the enclosing backticks
    Template(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    /// 0-based line of the first character
    pub line: usize,
    /// Nesting level the token sits at; a delimiter pair shares its outer level
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unterminated string literal at line {0}")]
    UnterminatedString(usize),
    #[error("unterminated template literal at line {0}")]
    UnterminatedTemplate(usize),
    #[error("unexpected '{found}' at line {line}")]
    UnexpectedClose { found: char, line: usize },
    #[error("expected '{expected}' but found '{found}' at line {line}")]
    Mismatched {
        expected: char,
        found: char,
        line: usize,
    },
    #[error("'{open}' opened at line {line} is never closed")]
    Unclosed { open: char, line: usize },
    #[error("empty snippet")]
    Empty,
    #[error("missing terminator after line {0}")]
    MissingTerminator(usize),
    #[error("expected exactly one construct, found {0}")]
    NotSingle(usize),
    #[error("annotation must start with '@'")]
    NotAnAnnotation,
}

/// Lexed source: tokens plus the lines that start inside a template literal
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<SpannedToken>,
    pub literal_lines: BTreeSet<usize>,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    tokens: Vec<SpannedToken>,
    literal_lines: BTreeSet<usize>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 0,
            tokens: Vec::new(),
            literal_lines: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, token: Token, start: usize, line: usize, depth: usize) {
        self.tokens.push(SpannedToken {
            token,
            start,
            end: self.pos,
            line,
            depth,
        });
    }

    /// Lex code until end of input, or until the `}` closing an interpolation
    /// when `in_interpolation` is set. Returns false on a fatal error.
    fn lex_code(&mut self, base_depth: usize, in_interpolation: bool) -> bool {
        let mut stack: Vec<(char, usize)> = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.pos;
            let line = self.line;
            let depth = base_depth + stack.len();

            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '"' => {
                    self.bump();
                    match self.read_string() {
                        Some(s) => self.push(Token::Str(s), start, line, depth),
                        None => {
                            self.errors.push(SyntaxError::UnterminatedString(line));
                            return false;
                        }
                    }
                }
                '`' => {
                    self.bump();
                    match self.read_template(depth) {
                        Some(()) => {
                            let raw = self.src[start + 1..self.pos - 1].to_string();
                            self.push(Token::Template(raw), start, line, depth);
                        }
                        None => return false,
                    }
                }
                '(' | '[' | '{' => {
                    self.bump();
                    self.push(Token::Punct(c), start, line, depth);
                    stack.push((c, line));
                }
                ')' | ']' | '}' => {
                    if c == '}' && in_interpolation && stack.is_empty() {
                        self.bump();
                        return true;
                    }
                    self.bump();
                    match stack.pop() {
                        Some((open, _)) if closing(open) == c => {}
                        Some((open, _)) => self.errors.push(SyntaxError::Mismatched {
                            expected: closing(open),
                            found: c,
                            line,
                        }),
                        None => self
                            .errors
                            .push(SyntaxError::UnexpectedClose { found: c, line }),
                    }
                    let depth = base_depth + stack.len();
                    self.push(Token::Punct(c), start, line, depth);
                }
                '\'' if self.peek_second().is_some_and(is_ident_char) => {
                    self.bump();
                    let ident = self.read_while(is_ident_char);
                    self.push(Token::Ident(format!("'{ident}")), start, line, depth);
                }
                c if c.is_ascii_digit() => {
                    let number = self.read_while(|c| c.is_ascii_alphanumeric() || c == '.');
                    self.push(Token::Number(number), start, line, depth);
                }
                c if is_ident_char(c) => {
                    let ident = self.read_while(is_ident_char);
                    self.push(Token::Ident(ident), start, line, depth);
                }
                c => {
                    self.bump();
                    self.push(Token::Punct(c), start, line, depth);
                }
            }
        }

        if in_interpolation {
            // ran out of input inside `${`
            return false;
        }
        for (open, line) in stack {
            self.errors.push(SyntaxError::Unclosed { open, line });
        }
        true
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn read_string(&mut self) -> Option<String> {
        let mut s = String::new();
        loop {
            match self.bump()? {
                '"' => return Some(s),
                '\n' => return None,
                '\\' => s.push(self.bump()?),
                c => s.push(c),
            }
        }
    }

    fn read_template(&mut self, depth: usize) -> Option<()> {
        let line = self.line;
        loop {
            match self.bump() {
                Some('`') => return Some(()),
                Some('\n') => {
                    self.literal_lines.insert(self.line);
                }
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    // interpolation tokens are checked, not kept
                    let mark = self.tokens.len();
                    let closed = self.lex_code(depth + 1, true);
                    self.tokens.truncate(mark);
                    if !closed {
                        if self.errors.is_empty() {
                            self.errors.push(SyntaxError::UnterminatedTemplate(line));
                        }
                        return None;
                    }
                }
                Some(_) => {}
                None => {
                    self.errors.push(SyntaxError::UnterminatedTemplate(line));
                    return None;
                }
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Lex a complete source text
pub fn lex(src: &str) -> Result<Lexed, SyntaxError> {
    let mut lexer = Lexer::new(src);
    lexer.lex_code(0, false);
    match lexer.errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(Lexed {
            tokens: lexer.tokens,
            literal_lines: lexer.literal_lines,
        }),
    }
}

/// Lexical check of a rendered source file, returning every diagnostic found.
///
/// Reports unbalanced delimiters and unterminated literals or comments.
/// Grammar is not checked: a reserved word used as a bare name passes.
pub fn validate(src: &str) -> Vec<SyntaxError> {
    let mut lexer = Lexer::new(src);
    lexer.lex_code(0, false);
    lexer.errors
}

/// Parse text holding exactly one statement
pub fn parse_statement(text: &str) -> Result<Snippet, SyntaxError> {
    single(parse_statements(text)?)
}

/// Parse text holding exactly one module or class member declaration
pub fn parse_member(text: &str) -> Result<Snippet, SyntaxError> {
    // members terminate exactly like statements
    single(parse_statements(text)?)
}

/// Parse a sequence of statements, e.g. a whole function body
pub fn parse_statements(text: &str) -> Result<Vec<Snippet>, SyntaxError> {
    let lexed = lex(text)?;
    if lexed.tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let tokens = &lexed.tokens;
    let mut snippets = Vec::new();
    let mut first = 0;

    for (i, tok) in tokens.iter().enumerate() {
        if tok.depth != 0 {
            continue;
        }
        let ends = match tok.token {
            Token::Punct(';') => true,
            Token::Punct('}') => {
                is_block(&tokens[first..=i])
                    && !matches!(
                        tokens.get(i + 1).map(|t| &t.token),
                        Some(Token::Ident(kw)) if kw == "else" || kw == "on"
                    )
            }
            _ => false,
        };
        if ends {
            let start = tokens[first].start;
            snippets.push(snippet_from(text, start, tok.end, tokens[first].line, &lexed.literal_lines));
            first = i + 1;
        }
    }

    if first < tokens.len() {
        return Err(SyntaxError::MissingTerminator(tokens[tokens.len() - 1].line));
    }
    Ok(snippets)
}

/// Parse an annotation such as `@java:Method {...}` used as an external body
pub fn parse_annotation(text: &str) -> Result<Snippet, SyntaxError> {
    let lexed = lex(text)?;
    let first = lexed.tokens.first().ok_or(SyntaxError::Empty)?;
    let last = lexed.tokens.last().ok_or(SyntaxError::Empty)?;
    if first.token != Token::Punct('@') {
        return Err(SyntaxError::NotAnAnnotation);
    }
    Ok(snippet_from(text, first.start, last.end, first.line, &lexed.literal_lines))
}

fn single(mut snippets: Vec<Snippet>) -> Result<Snippet, SyntaxError> {
    if snippets.len() != 1 {
        return Err(SyntaxError::NotSingle(snippets.len()));
    }
    Ok(snippets.remove(0))
}

/// True when the construct opens a block before any top-level `{`
fn is_block(tokens: &[SpannedToken]) -> bool {
    for tok in tokens {
        match &tok.token {
            Token::Punct('{') if tok.depth == 0 => return false,
            Token::Ident(kw) if tok.depth == 0 && BLOCK_KEYWORDS.contains(&kw.as_str()) => {
                return true
            }
            _ => {}
        }
    }
    false
}

/// Cut `text[start..end]` into lines, widening the start to the beginning of
/// its line when only indentation precedes it, then dedent.
fn snippet_from(
    text: &str,
    start: usize,
    end: usize,
    first_line: usize,
    literal_lines: &BTreeSet<usize>,
) -> Snippet {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let start = if text[line_start..start].trim().is_empty() {
        line_start
    } else {
        start
    };

    let raw: Vec<SnippetLine> = text[start..end]
        .split('\n')
        .enumerate()
        .map(|(i, line)| SnippetLine {
            text: line.to_string(),
            verbatim: literal_lines.contains(&(first_line + i)),
        })
        .collect();

    let indent = raw
        .iter()
        .filter(|l| !l.verbatim && !l.text.trim().is_empty())
        .map(|l| l.text.len() - l.text.trim_start().len())
        .min()
        .unwrap_or(0);

    let lines = raw
        .into_iter()
        .map(|l| {
            if l.verbatim {
                l
            } else if l.text.trim().is_empty() {
                SnippetLine {
                    text: String::new(),
                    verbatim: false,
                }
            } else {
                SnippetLine {
                    text: l.text[indent..].trim_end().to_string(),
                    verbatim: false,
                }
            }
        })
        .collect();

    Snippet { lines }
}
