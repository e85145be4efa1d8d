use std::fmt;

/// Reserved words of the language
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Keyword {
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "while" => Some(Keyword::While),
            "return" => Some(Keyword::Return),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Token<'a> {
    Number(i32),
    /// Identifier together with its symbol table slot
    Ident { name: &'a str, slot: usize },
    Keyword(Keyword),

    /// `==`
    Eq,
    /// `!=`
    Ne,
    Greater,
    Less,

    Plus,
    Minus,
    Star,
    Slash,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Assign,

    Eof,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let punct = match self {
            Token::Number(n) => return write!(f, "number {}", n),
            Token::Ident { name, .. } => return write!(f, "identifier '{}'", name),
            Token::Keyword(kw) => return write!(f, "'{}'", kw.as_str()),
            Token::Eof => return f.write_str("end of file"),
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Greater => ">",
            Token::Less => "<",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Semicolon => ";",
            Token::Assign => "=",
        };
        write!(f, "'{}'", punct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(Keyword::from_word("while"), Some(Keyword::While));
        assert_eq!(Keyword::from_word("For"), None);
        assert_eq!(Keyword::from_word("returns"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Token::Ne.to_string(), "'!='");
        assert_eq!(Token::Keyword(Keyword::Else).to_string(), "'else'");
        assert_eq!(
            Token::Ident { name: "x", slot: 1 }.to_string(),
            "identifier 'x'"
        );
        assert_eq!(Token::Eof.to_string(), "end of file");
    }
}
