use logos::Logos;

/// Tokens of the script layer of a component file.
///
/// Only the structure the parser needs is distinguished: brackets, the
/// operators that open dynamic scopes, declaration keywords and the
/// tokens after which `<` starts markup. Everything else is `Other`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,

    #[regex(r"`([^`\\]|\\(.|\n))*`")]
    Template,

    // Keywords
    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("return")]
    Return,
    #[token("default")]
    Default,
    #[token("export")]
    Export,
    #[token("import")]
    Import,
    #[token("yield")]
    Yield,
    #[token("await")]
    Await,
    #[token("if")]
    If,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("type")]
    Type,
    #[token("interface")]
    Interface,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    // Brackets
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Operators
    #[token("=>")]
    Arrow,
    #[token("=")]
    Assign,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    Nullish,
    #[token("?.")]
    OptionalChain,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("<")]
    Lt,
    #[token("/")]
    Slash,

    #[regex(r#"[^"'`\s]"#, priority = 0)]
    Other,
}

impl Token {
    /// Whitespace and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::LineComment | Token::BlockComment
        )
    }

    pub fn is_open(self) -> bool {
        matches!(self, Token::LParen | Token::LBrace | Token::LBracket)
    }

    pub fn is_close(self) -> bool {
        matches!(self, Token::RParen | Token::RBrace | Token::RBracket)
    }

    /// Whether `<` right after this token opens markup rather than comparing
    pub fn allows_markup(self) -> bool {
        matches!(
            self,
            Token::LParen
                | Token::LBracket
                | Token::LBrace
                | Token::Comma
                | Token::Assign
                | Token::Arrow
                | Token::Return
                | Token::Default
                | Token::Yield
                | Token::Await
                | Token::Question
                | Token::Colon
                | Token::Semicolon
                | Token::AndAnd
                | Token::OrOr
                | Token::Nullish
        )
    }

    /// Keywords that begin a new top-level statement
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            Token::Function
                | Token::Class
                | Token::Const
                | Token::Let
                | Token::Var
                | Token::Return
                | Token::Export
                | Token::Import
                | Token::If
                | Token::For
                | Token::While
                | Token::Type
                | Token::Interface
        )
    }
}

/// End offset of the regular expression literal whose opening `/` is at
/// `start`, flags included. `None` when no closing `/` follows on the line.
pub fn regex_literal_end(source: &str, start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut escaped = false;
    for (i, c) in source[start + 1..].char_indices() {
        match c {
            '\n' => return None,
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let body_end = start + 1 + i + 1;
                let flags = source[body_end..]
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(source.len() - body_end);
                return Some(body_end + flags);
            }
            _ => {}
        }
    }
    None
}

/// Lex the single token at `offset`. `None` at end of input.
///
/// Returns the token and its end offset, or the offset of an unlexable
/// character (an unterminated string or template literal).
pub fn next_token(source: &str, offset: usize) -> Option<Result<(Token, usize), usize>> {
    let mut lexer = Token::lexer(&source[offset..]);
    let token = lexer.next()?;
    let end = offset + lexer.span().end;
    Some(token.map(|t| (t, end)).map_err(|_| offset))
}

/// Tokenize a whole script, skipping nothing
pub fn tokenize(source: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        if let Ok(tok) = token {
            tokens.push((tok, lexer.span()));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .map(|(t, _)| t)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("export default function Page() {}"),
            vec![
                Token::Export,
                Token::Default,
                Token::Function,
                Token::Ident,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
            ]
        );
        assert_eq!(kinds("functional"), vec![Token::Ident]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a ?? b?.c ? d : e && f || g => h"),
            vec![
                Token::Ident,
                Token::Nullish,
                Token::Ident,
                Token::OptionalChain,
                Token::Ident,
                Token::Question,
                Token::Ident,
                Token::Colon,
                Token::Ident,
                Token::AndAnd,
                Token::Ident,
                Token::OrOr,
                Token::Ident,
                Token::Arrow,
                Token::Ident,
            ]
        );
    }

    #[test]
    fn test_strings_and_comments_are_opaque() {
        assert_eq!(
            kinds(r#"'<div>' "a\"b" `x ${y}` /* <p> */ // <span>"#),
            vec![Token::String, Token::String, Token::Template]
        );
    }

    #[test]
    fn test_regex_literal_end() {
        let source = r#"a.replace(/'[/"]\//gi, "")"#;
        let start = source.find('/').unwrap();
        assert_eq!(regex_literal_end(source, start), source.find(','));
        assert_eq!(regex_literal_end("x = a / b", 6), None);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let source = "const a = 'oops";
        let mut offset = 0;
        let mut failed_at = None;
        while let Some(result) = next_token(source, offset) {
            match result {
                Ok((_, end)) => offset = end,
                Err(at) => {
                    failed_at = Some(at);
                    break;
                }
            }
        }
        assert_eq!(failed_at, Some(10));
    }
}
