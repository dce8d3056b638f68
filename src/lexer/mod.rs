pub mod tokens;

use std::iter::Peekable;
use std::str::Chars;

use crate::lexer::tokens::{Loc, Token, TokenKind};

/// Tokenizer for the nginx-style configuration grammar: bare words,
/// `{`, `}`, `;`, and `#` comments running to end of line.
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.input.next() {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.input.peek()
    }

    fn current_loc(&self) -> Loc {
        Loc {
            line: self.line,
            col: self.col,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            let loc = self.current_loc();

            if c == '#' {
                self.skip_comment();
                continue;
            }

            match c {
                '{' => {
                    tokens.push(Token {
                        kind: TokenKind::LBrace,
                        loc,
                    });
                    self.advance();
                }
                '}' => {
                    tokens.push(Token {
                        kind: TokenKind::RBrace,
                        loc,
                    });
                    self.advance();
                }
                ';' => {
                    tokens.push(Token {
                        kind: TokenKind::Semicolon,
                        loc,
                    });
                    self.advance();
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => self.handle_word(&mut tokens, loc),
            }
        }

        tokens
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn handle_word(&mut self, tokens: &mut Vec<Token>, loc: Loc) {
        let mut val = String::new();

        while let Some(&c) = self.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | ';' | '#') {
                break;
            }
            val.push(c);
            self.advance();
        }

        tokens.push(Token {
            kind: TokenKind::Word(val),
            loc,
        });
    }
}
