//! Free-text query tokenizer and token-stream interpretation.
//!
//! Tokens are split on whitespace, shell style: double quotes group words into
//! one token (`"soil moisture"`), a backslash inside quotes escapes the next
//! character, and an unterminated quote runs to the end of the input.

use crate::ast::FilterNode;

/// Splits `input` into opaque tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.consume_char();
        }
    }

    fn next_token(&mut self) -> Option<String> {
        self.skip_ws();
        self.peek_char()?;

        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                break;
            }
            self.consume_char();
            if c == '"' {
                self.lex_quoted(&mut out);
            } else {
                out.push(c);
            }
        }
        Some(out)
    }

    fn lex_quoted(&mut self, out: &mut String) {
        let mut escaped = false;
        while let Some(c) = self.consume_char() {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => return,
                _ => out.push(c),
            }
        }
    }
}

/// Interprets a token stream as a conjunction of text clauses over `text_fields`.
///
/// `AND` is the implicit combinator. `OR` joins the previous clause with a
/// phrase match on the following token. A leading `-` negates a phrase match
/// and a `*` anywhere makes the token a wildcard pattern.
pub fn interpret(tokens: &[String], text_fields: &[String]) -> Option<FilterNode> {
    let mut clauses: Vec<FilterNode> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_str();

        if token == "AND" {
            i += 1;
            continue;
        }

        if token == "OR" {
            match (clauses.pop(), tokens.get(i + 1)) {
                (Some(previous), Some(next)) => {
                    clauses.push(FilterNode::Or(vec![
                        previous,
                        FilterNode::phrase(next.as_str(), text_fields),
                    ]));
                    i += 2;
                }
                (previous, _) => {
                    clauses.extend(previous);
                    i += 1;
                }
            }
            continue;
        }

        if let Some(negated) = token.strip_prefix('-') {
            if negated.is_empty() {
                tracing::debug!("Skipping bare '-' in search query");
            } else {
                clauses.push(FilterNode::not(FilterNode::phrase(negated, text_fields)));
            }
        } else if token.contains('*') {
            clauses.push(FilterNode::wildcard(token, text_fields));
        } else {
            clauses.push(FilterNode::phrase(token, text_fields));
        }
        i += 1;
    }

    FilterNode::all(clauses).map(FilterNode::simplify)
}
