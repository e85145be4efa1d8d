use crate::{
    error::{Error, Result},
    symtab::SymbolTable,
    token::{Keyword, Token},
};
use std::str;

pub struct Lexer<'a> {
    program: &'a str,
    cursor: usize,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(program: &'a str) -> Self {
        Lexer {
            program,
            cursor: 0,
            token_start: 0,
        }
    }

    /// Get the next token. Identifiers are interned into `symbols` as they are scanned.
    ///
    /// Once the end of the program is reached every further call returns `Token::Eof`.
    pub fn next_token(&mut self, symbols: &mut SymbolTable) -> Result<Token<'a>> {
        self.trim();
        self.token_start = self.cursor;

        let ch = match self.next_char(false) {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let token = match ch {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b';' => Token::Semicolon,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'>' => Token::Greater,
            b'<' => Token::Less,
            b'=' => match self.next_char(false) {
                Some(b'=') => Token::Eq,
                Some(_) => {
                    self.unread();
                    Token::Assign
                }
                None => Token::Assign,
            },
            b'!' => match self.next_char(false) {
                Some(b'=') => Token::Ne,
                _ => return Err(self.error("expected '=' after '!'")),
            },
            ch if ch.is_ascii_digit() => self.read_number()?,
            ch if ch.is_ascii_alphabetic() || ch == b'_' => self.read_word(symbols)?,
            _ => {
                let found = self.program[self.token_start..].chars().next().unwrap_or('?');
                return Err(self.error(format!("unexpected character '{}'", found)));
            }
        };

        Ok(token)
    }

    /// 1-based line and column of the most recently scanned token.
    pub fn position(&self) -> (usize, usize) {
        let before = &self.program[..self.token_start.min(self.program.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count() + 1;
        (line, col)
    }

    /// Skip whitespace
    fn trim(&mut self) {
        while let Some(ch) = self.next_char(true) {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.cursor += 1;
        }
    }

    /// Read a decimal number
    fn read_number(&mut self) -> Result<Token<'a>> {
        while let Some(ch) = self.next_char(false) {
            if !ch.is_ascii_digit() {
                self.unread();
                break;
            }
        }

        let digits = self.lexeme()?;
        digits
            .parse::<i32>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("number {} is out of range", digits)))
    }

    /// Read a keyword or an identifier
    fn read_word(&mut self, symbols: &mut SymbolTable) -> Result<Token<'a>> {
        while let Some(ch) = self.next_char(false) {
            // Only alphanumeric characters and '_'
            if !ch.is_ascii_alphanumeric() && ch != b'_' {
                self.unread();
                break;
            }
        }

        let word = self.lexeme()?;
        Ok(match Keyword::from_word(word) {
            Some(kw) => Token::Keyword(kw),
            None => Token::Ident {
                name: word,
                slot: symbols.intern(word),
            },
        })
    }

    fn lexeme(&self) -> Result<&'a str> {
        str::from_utf8(&self.program.as_bytes()[self.token_start..self.cursor])
            .map_err(|e| self.error(e.to_string()))
    }

    /// Get the next char and increase the cursor if `peek` is false
    fn next_char(&mut self, peek: bool) -> Option<u8> {
        if let Some(ch) = self.program.as_bytes().get(self.cursor) {
            if !peek {
                self.cursor += 1;
            }
            Some(*ch)
        } else {
            None
        }
    }

    /// Un-consume the last char returned by `next_char`.
    fn unread(&mut self) {
        self.cursor -= 1;
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let (line, col) = self.position();
        Error::Lexical {
            line,
            col,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(program: &str) -> (Vec<Token<'_>>, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let mut lexer = Lexer::new(program);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token(&mut symbols).unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        (out, symbols)
    }

    #[test]
    fn trim() {
        let program = "\t\r\n  x";
        let mut lexer = Lexer::new(program);
        lexer.trim();
        assert_eq!(&lexer.program[lexer.cursor..], "x");
    }

    #[test]
    fn read_program() {
        let program = r"
            fac(n) {
                if (n == 0) return 1;
                else return n * fac(n-1);
            }
        ";

        let (tokens, symbols) = tokens(program);
        let fac = Token::Ident {
            name: "fac",
            slot: 0,
        };
        let n = Token::Ident { name: "n", slot: 1 };
        let expected = vec![
            fac,
            Token::LParen,
            n,
            Token::RParen,
            Token::LBrace,
            Token::Keyword(Keyword::If),
            Token::LParen,
            n,
            Token::Eq,
            Token::Number(0),
            Token::RParen,
            Token::Keyword(Keyword::Return),
            Token::Number(1),
            Token::Semicolon,
            Token::Keyword(Keyword::Else),
            Token::Keyword(Keyword::Return),
            n,
            Token::Star,
            fac,
            Token::LParen,
            n,
            Token::Minus,
            Token::Number(1),
            Token::RParen,
            Token::Semicolon,
            Token::RBrace,
        ];
        assert_eq!(tokens, expected);
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn assign_is_pushed_back() {
        let (tokens, _) = tokens("x=1 y==2 a!=b");
        assert_eq!(tokens[1], Token::Assign);
        assert_eq!(tokens[2], Token::Number(1));
        assert_eq!(tokens[4], Token::Eq);
        assert_eq!(tokens[5], Token::Number(2));
        assert_eq!(tokens[7], Token::Ne);
    }

    #[test]
    fn assign_at_end_of_input() {
        let (tokens, _) = tokens("x =");
        assert_eq!(tokens.last(), Some(&Token::Assign));
    }

    #[test]
    fn eof_repeats() {
        let mut symbols = SymbolTable::new();
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.next_token(&mut symbols).unwrap(), Token::Eof);
        assert_eq!(lexer.next_token(&mut symbols).unwrap(), Token::Eof);
    }

    #[test]
    fn keywords_are_not_interned() {
        let (_, symbols) = tokens("while whilex if");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols.name(0), Some("whilex"));
    }

    #[test]
    fn unexpected_character() {
        let mut symbols = SymbolTable::new();
        let mut lexer = Lexer::new("x = 1;\n  y # 2");
        for _ in 0..5 {
            lexer.next_token(&mut symbols).unwrap();
        }
        match lexer.next_token(&mut symbols) {
            Err(Error::Lexical { line, col, message }) => {
                assert_eq!((line, col), (2, 5));
                assert!(message.contains('#'));
            }
            other => panic!("expected lexical error, got {:?}", other),
        }
    }

    #[test]
    fn lone_bang() {
        let mut symbols = SymbolTable::new();
        let mut lexer = Lexer::new("! x");
        assert!(matches!(
            lexer.next_token(&mut symbols),
            Err(Error::Lexical { .. })
        ));
    }

    #[test]
    fn number_out_of_range() {
        let mut symbols = SymbolTable::new();
        let mut lexer = Lexer::new("99999999999");
        assert!(matches!(
            lexer.next_token(&mut symbols),
            Err(Error::Lexical { .. })
        ));
    }
}
