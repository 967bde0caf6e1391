use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{next_token, regex_literal_end, Token};

/// Where a script run stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    /// End of input
    Eof,
    /// Unmatched closing bracket, left for the caller
    Close,
    /// After the first block opened at the top level closes (function and
    /// class bodies)
    AfterBlock,
    /// `;` or a new statement on a later line (variable declarations)
    Statement,
    /// Like `Statement`, but also at `,` (dynamic regions)
    Expression,
}

/// The significant tokens most recently seen in a script run
#[derive(Debug, Clone, Copy, Default)]
struct Cursor<'src> {
    last: Option<Token>,
    last_text: &'src str,
    before_last: Option<Token>,
    /// Token before the current run of `(`
    before_parens: Option<Token>,
}

impl<'src> Cursor<'src> {
    fn after(token: Token) -> Self {
        Self {
            last: Some(token),
            ..Default::default()
        }
    }

    fn shift(&mut self, token: Token, text: &'src str) {
        if token == Token::LParen && self.last != Some(Token::LParen) {
            self.before_parens = self.last;
        }
        self.before_last = self.last;
        self.last = Some(token);
        self.last_text = text;
    }

    fn allows_markup(&self) -> bool {
        self.last.map_or(true, Token::allows_markup)
    }

    /// A `/` here opens a regular expression rather than dividing
    fn allows_regex(&self) -> bool {
        match self.last {
            None | Some(Token::Lt) => true,
            // operator characters; an empty text marks an operand that just ended
            Some(Token::Other) => !self.last_text.is_empty(),
            Some(token) => token.allows_markup(),
        }
    }

    /// Markup here is returned by `return` or an arrow function body
    fn is_return_position(&self) -> bool {
        let lead = if self.last == Some(Token::LParen) {
            self.before_parens
        } else {
            self.last
        };
        matches!(lead, Some(Token::Return) | Some(Token::Arrow))
    }

    /// `(` here opens the arguments of a `.map` call
    fn is_map_call(&self) -> bool {
        self.last == Some(Token::Ident)
            && self.last_text == "map"
            && matches!(
                self.before_last,
                Some(Token::Dot) | Some(Token::OptionalChain)
            )
    }
}

/// Parser for component source files
pub struct Parser<'src> {
    source: &'src str,
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            pos: 0,
            line_starts,
        }
    }

    /// Parse a complete document
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let body = self.parse_script(self.pos, End::Eof, Cursor::default())?;
        Ok(Document { body })
    }

    /// Parse a single standalone element, ignoring surrounding whitespace
    pub fn parse_fragment(&mut self) -> ParseResult<Element> {
        self.skip_whitespace();
        if self.peek_char() != Some('<') || !self.looks_like_tag(self.pos) {
            return Err(ParseError::unexpected_token(
                self.pos,
                "element",
                self.describe_here(),
            ));
        }
        let element = self.parse_element()?;
        self.skip_whitespace();
        if self.pos < self.source.len() {
            return Err(ParseError::unexpected_token(
                self.pos,
                "end of markup",
                self.describe_here(),
            ));
        }
        Ok(element)
    }

    fn parse_script(
        &mut self,
        code_start: usize,
        end: End,
        mut cursor: Cursor<'src>,
    ) -> ParseResult<Script> {
        let src = self.source;
        let mut parts = Vec::new();
        let mut code_start = code_start;
        let mut depth = 0usize;
        let mut block_opened = false;
        let mut saw_newline = false;

        loop {
            let token_start = self.pos;
            let Some(next) = next_token(src, token_start) else {
                match end {
                    End::Close => {
                        return Err(ParseError::unexpected_eof(token_start, "closing bracket"))
                    }
                    End::AfterBlock => {
                        return Err(ParseError::unexpected_eof(token_start, "end of block"))
                    }
                    _ => break,
                }
            };
            let (token, token_end) = next.map_err(ParseError::lexer_error)?;
            let text = &src[token_start..token_end];

            if token.is_trivia() {
                if token == Token::Whitespace && text.contains('\n') {
                    saw_newline = true;
                }
                self.pos = token_end;
                continue;
            }

            if depth == 0
                && saw_newline
                && token.starts_statement()
                && matches!(end, End::Statement | End::Expression)
            {
                break;
            }
            saw_newline = false;

            if depth == 0 {
                let terminates = match end {
                    End::Statement => token == Token::Semicolon,
                    End::Expression => matches!(token, Token::Semicolon | Token::Comma),
                    _ => false,
                };
                if terminates || (token.is_close() && end != End::Eof) {
                    break;
                }
            }

            match token {
                Token::LParen | Token::LBrace | Token::LBracket => {
                    if depth == 0 && token == Token::LBrace && end == End::AfterBlock {
                        block_opened = true;
                    }
                    let map_call = token == Token::LParen && cursor.is_map_call();
                    depth += 1;
                    self.pos = token_end;
                    cursor.shift(token, text);

                    if map_call {
                        self.flush_code(&mut parts, code_start, token_end);
                        let body = self.parse_script(token_end, End::Close, Cursor::default())?;
                        parts.push(ScriptPart::Scope(Scope {
                            kind: ScopeKind::Dynamic(DynamicKind::Array),
                            body,
                        }));
                        code_start = self.pos;
                        cursor.shift(Token::Other, "");
                    }
                }
                Token::RParen | Token::RBrace | Token::RBracket => {
                    self.pos = token_end;
                    cursor.shift(token, text);
                    if depth > 0 {
                        depth -= 1;
                        if depth == 0 && end == End::AfterBlock && block_opened {
                            break;
                        }
                    }
                }
                Token::Function | Token::Class => {
                    match self.declared_name(token_end, token == Token::Function) {
                        Some(name) => {
                            self.flush_code(&mut parts, code_start, token_start);
                            self.pos = token_end;
                            let body =
                                self.parse_script(token_start, End::AfterBlock, Cursor::after(token))?;
                            parts.push(ScriptPart::Scope(Scope {
                                kind: ScopeKind::Component(name),
                                body,
                            }));
                            code_start = self.pos;
                            cursor.shift(Token::RBrace, "}");
                        }
                        None => {
                            self.pos = token_end;
                            cursor.shift(token, text);
                        }
                    }
                }
                Token::Const | Token::Let | Token::Var => {
                    match self.declared_name(token_end, false) {
                        Some(name) => {
                            self.flush_code(&mut parts, code_start, token_start);
                            self.pos = token_end;
                            let body =
                                self.parse_script(token_start, End::Statement, Cursor::after(token))?;
                            parts.push(ScriptPart::Scope(Scope {
                                kind: ScopeKind::Component(name),
                                body,
                            }));
                            code_start = self.pos;
                            cursor.shift(Token::Other, "");
                        }
                        None => {
                            self.pos = token_end;
                            cursor.shift(token, text);
                        }
                    }
                }
                Token::Question if !self.is_optional_marker(token_end) => {
                    self.open_conditional(&mut parts, &mut code_start, token, token_end)?;
                    cursor.shift(Token::Other, "");
                }
                Token::AndAnd | Token::OrOr => {
                    self.open_conditional(&mut parts, &mut code_start, token, token_end)?;
                    cursor.shift(Token::Other, "");
                }
                Token::Slash if cursor.allows_regex() => {
                    let literal_end = regex_literal_end(src, token_start).unwrap_or(token_end);
                    self.pos = literal_end;
                    cursor.shift(Token::Other, "");
                }
                Token::Lt if cursor.allows_markup() && self.looks_like_tag(token_start) => {
                    self.flush_code(&mut parts, code_start, token_start);
                    self.pos = token_start;
                    let is_return_value = cursor.is_return_position();
                    let element = self.parse_element()?;
                    parts.push(ScriptPart::Markup(Markup {
                        element,
                        is_return_value,
                    }));
                    code_start = self.pos;
                    cursor.shift(Token::Other, "");
                }
                _ => {
                    self.pos = token_end;
                    cursor.shift(token, text);
                }
            }
        }

        self.flush_code(&mut parts, code_start, self.pos);
        Ok(Script { parts })
    }

    fn open_conditional(
        &mut self,
        parts: &mut Vec<ScriptPart>,
        code_start: &mut usize,
        operator: Token,
        token_end: usize,
    ) -> ParseResult<()> {
        self.flush_code(parts, *code_start, token_end);
        self.pos = token_end;
        let body = self.parse_script(token_end, End::Expression, Cursor::after(operator))?;
        parts.push(ScriptPart::Scope(Scope {
            kind: ScopeKind::Dynamic(DynamicKind::Conditional),
            body,
        }));
        *code_start = self.pos;
        Ok(())
    }

    fn flush_code(&self, parts: &mut Vec<ScriptPart>, from: usize, to: usize) {
        if to > from {
            parts.push(ScriptPart::Code(self.source[from..to].to_string()));
        }
    }

    /// Next non-trivia token at or after `from`
    fn peek_significant(&self, from: usize) -> Option<(Token, usize, usize)> {
        let mut offset = from;
        loop {
            let (token, end) = next_token(self.source, offset)?.ok()?;
            if !token.is_trivia() {
                return Some((token, offset, end));
            }
            offset = end;
        }
    }

    /// Name bound by the declaration keyword ending at `from`
    fn declared_name(&self, from: usize, allow_generator: bool) -> Option<String> {
        let (mut token, mut start, mut end) = self.peek_significant(from)?;
        if allow_generator && token == Token::Other && &self.source[start..end] == "*" {
            (token, start, end) = self.peek_significant(end)?;
        }
        (token == Token::Ident).then(|| self.source[start..end].to_string())
    }

    /// `?` of an optional property or parameter rather than a ternary
    fn is_optional_marker(&self, from: usize) -> bool {
        matches!(
            self.peek_significant(from),
            Some((Token::Colon | Token::RParen | Token::Comma | Token::Assign, _, _))
        )
    }

    /// Whether the `<` at `lt` opens an element rather than a type argument
    fn looks_like_tag(&self, lt: usize) -> bool {
        let rest = &self.source[lt + 1..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, '>')) => return true,
            Some((_, c)) if is_name_start(c) => {}
            _ => return false,
        }
        let name_end = chars
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let after = &rest[name_end..];
        match after.chars().next() {
            Some('>') => !is_generic_arrow(&after[1..]),
            Some('/' | '{') => true,
            Some(c) if c.is_whitespace() => {
                let next = after.trim_start();
                if starts_with_word(next, "extends") {
                    return false;
                }
                next.chars()
                    .next()
                    .map_or(false, |c| is_name_start(c) || matches!(c, '>' | '/' | '{'))
            }
            _ => false,
        }
    }

    fn parse_element(&mut self) -> ParseResult<Element> {
        let start = self.pos;
        self.expect_char('<', "element")?;
        let name = self.read_name().to_string();

        let mut attributes = Vec::new();
        let (trailing, self_closing) = loop {
            let leading = self.read_whitespace().to_string();
            match self.peek_char() {
                None => return Err(ParseError::unexpected_eof(self.pos, "end of tag")),
                Some('>') => {
                    self.pos += 1;
                    break (leading, false);
                }
                Some('/') => {
                    self.pos += 1;
                    self.expect_char('>', "'>' after '/'")?;
                    break (leading, true);
                }
                Some('{') => {
                    self.pos += 1;
                    let expression = self.parse_script(self.pos, End::Close, Cursor::default())?;
                    self.expect_char('}', "'}'")?;
                    attributes.push(Attribute::Spread {
                        leading,
                        expression,
                    });
                }
                Some(c) if is_name_start(c) => {
                    attributes.push(self.parse_attribute(leading)?);
                }
                Some(_) => {
                    return Err(ParseError::unexpected_token(
                        self.pos,
                        "attribute",
                        self.describe_here(),
                    ))
                }
            }
        };
        let open_end = self.pos;

        if self_closing {
            return Ok(Element {
                name,
                attributes,
                trailing,
                self_closing,
                children: Vec::new(),
                closing: None,
                location: Some(SourceLocation {
                    start_tag: self.tag_span(start, open_end),
                    end_tag: None,
                    range: start..open_end,
                }),
            });
        }

        let mut children = Vec::new();
        let close_start = loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::unexpected_eof(
                        self.pos,
                        format!("</{}>", name),
                    ))
                }
                Some('{') => {
                    self.pos += 1;
                    let script = self.parse_script(self.pos, End::Close, Cursor::default())?;
                    self.expect_char('}', "'}'")?;
                    children.push(Child::Expression(script));
                }
                Some('<') if self.source[self.pos + 1..].starts_with('/') => break self.pos,
                Some('<') => children.push(Child::Element(self.parse_element()?)),
                Some(_) => {
                    let text_start = self.pos;
                    let len = self.source[text_start..]
                        .find(['{', '<'])
                        .unwrap_or(self.source.len() - text_start);
                    self.pos += len;
                    children.push(Child::Text(self.source[text_start..self.pos].to_string()));
                }
            }
        };

        self.pos += 2;
        self.read_whitespace();
        let name_pos = self.pos;
        let found = self.read_name().to_string();
        self.read_whitespace();
        self.expect_char('>', "'>'")?;
        if found != name {
            return Err(ParseError::mismatched_closing_tag(name_pos, name, found));
        }
        let close_end = self.pos;

        Ok(Element {
            name,
            attributes,
            trailing,
            self_closing,
            children,
            closing: Some(self.source[close_start..close_end].to_string()),
            location: Some(SourceLocation {
                start_tag: self.tag_span(start, open_end),
                end_tag: Some(self.tag_span(close_start, close_end)),
                range: start..close_end,
            }),
        })
    }

    fn parse_attribute(&mut self, leading: String) -> ParseResult<Attribute> {
        let name = self.read_name().to_string();

        let equals_start = self.pos;
        self.read_whitespace();
        if self.peek_char() != Some('=') {
            self.pos = equals_start;
            return Ok(Attribute::Named {
                leading,
                name,
                equals: String::new(),
                value: None,
            });
        }
        self.pos += 1;
        self.read_whitespace();
        let equals = self.source[equals_start..self.pos].to_string();

        let value = match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let value_start = self.pos;
                let len = self.source[value_start..]
                    .find(quote)
                    .ok_or_else(|| ParseError::lexer_error(value_start - 1))?;
                self.pos += len + 1;
                AttributeValue::String {
                    quote,
                    value: self.source[value_start..value_start + len].to_string(),
                }
            }
            Some('{') => {
                self.pos += 1;
                let script = self.parse_script(self.pos, End::Close, Cursor::default())?;
                self.expect_char('}', "'}'")?;
                AttributeValue::Expression(script)
            }
            Some(_) => {
                return Err(ParseError::unexpected_token(
                    self.pos,
                    "attribute value",
                    self.describe_here(),
                ))
            }
            None => return Err(ParseError::unexpected_eof(self.pos, "attribute value")),
        };

        Ok(Attribute::Named {
            leading,
            name,
            equals,
            value: Some(value),
        })
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn expect_char(&mut self, expected: char, what: &str) -> ParseResult<()> {
        match self.peek_char() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(_) => Err(ParseError::unexpected_token(
                self.pos,
                what,
                self.describe_here(),
            )),
            None => Err(ParseError::unexpected_eof(self.pos, what)),
        }
    }

    fn read_whitespace(&mut self) -> &'src str {
        let src = self.source;
        let start = self.pos;
        let len = src[start..]
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(src.len() - start);
        self.pos += len;
        &src[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.read_whitespace();
    }

    fn read_name(&mut self) -> &'src str {
        let src = self.source;
        let start = self.pos;
        let mut chars = src[start..].char_indices();
        let len = match chars.next() {
            Some((_, c)) if is_name_start(c) => chars
                .find(|(_, c)| !is_name_char(*c))
                .map(|(i, _)| i)
                .unwrap_or(src.len() - start),
            _ => 0,
        };
        self.pos += len;
        &src[start..self.pos]
    }

    fn describe_here(&self) -> String {
        match self.peek_char() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        }
    }

    fn line_column(&self, offset: usize) -> LineColumn {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line];
        LineColumn {
            line: line + 1,
            column: self.source[line_start..offset].chars().count() + 1,
        }
    }

    /// Span of a tag occupying `start..end`
    fn tag_span(&self, start: usize, end: usize) -> TagSpan {
        TagSpan {
            start: self.line_column(start),
            end: self.line_column(end.saturating_sub(1).max(start)),
        }
    }
}

/// `(params) =>` or `(params):` after the `>` of a type parameter list
fn is_generic_arrow(after_gt: &str) -> bool {
    let rest = after_gt.trim_start();
    if !rest.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let tail = rest[i + 1..].trim_start();
                    return tail.starts_with("=>") || tail.starts_with(':');
                }
            }
            _ => {}
        }
    }
    false
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .map_or(false, |rest| !rest.chars().next().is_some_and(is_name_char))
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-' | ':' | '.')
}

/// Parse a component source file
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source).parse_document()
}

/// Parse one standalone element such as an insert payload
pub fn parse_fragment(markup: &str) -> ParseResult<Element> {
    Parser::new(markup).parse_fragment()
}
