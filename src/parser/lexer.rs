use crate::core::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Byte offset of the token in the query text.
    pub position: usize,
}

impl Token {
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Split a query into tokens.
///
/// Tokens are whitespace-delimited. `,` is always a token of its own. A `(`
/// that starts a token and a `)` that closes nothing inside its token are
/// split off, so `('A','B')` and `( 'A' , 'B' )` lex the same, while
/// `SUM(QUANTITY)` stays one token. Single-quoted text is kept whole.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::default();
    for (position, c) in input.char_indices() {
        if lexer.quote_start.is_some() {
            lexer.current.push(c);
            if c == '\'' {
                lexer.quote_start = None;
            }
            continue;
        }
        match c {
            c if c.is_whitespace() => lexer.flush(),
            ',' => lexer.single(",", position),
            '(' if lexer.current.is_empty() => lexer.single("(", position),
            '(' => {
                lexer.current.push(c);
                lexer.depth += 1;
            }
            ')' if lexer.depth > 0 => {
                lexer.current.push(c);
                lexer.depth -= 1;
            }
            ')' => lexer.single(")", position),
            '\'' => {
                lexer.begin(position);
                lexer.current.push(c);
                lexer.quote_start = Some(position);
            }
            _ => {
                lexer.begin(position);
                lexer.current.push(c);
            }
        }
    }
    if let Some(start) = lexer.quote_start {
        return Err(ParseError::UnterminatedString(start));
    }
    lexer.flush();
    Ok(lexer.tokens)
}

#[derive(Default)]
struct Lexer {
    tokens: Vec<Token>,
    current: String,
    start: usize,
    depth: usize,
    quote_start: Option<usize>,
}

impl Lexer {
    fn begin(&mut self, position: usize) {
        if self.current.is_empty() {
            self.start = position;
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(Token {
                text: std::mem::take(&mut self.current),
                position: self.start,
            });
        }
        self.depth = 0;
    }

    fn single(&mut self, text: &str, position: usize) {
        self.flush();
        self.tokens.push(Token {
            text: text.to_string(),
            position,
        });
    }
}
