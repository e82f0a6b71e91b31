use crate::error::{Error, Result};
use log::{debug, trace};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    LeftParen,
    RightParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
}

impl TokenKind {
    fn from_operator(c: char) -> Option<Self> {
        match c {
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            ',' => Some(TokenKind::Comma),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '^' => Some(TokenKind::Caret),
            _ => None,
        }
    }
}

/// A classified slice of the source. `offset` is the byte offset of the
/// first character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, offset: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            offset,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Cooperative cancellation flag shared between the caller and a running
/// tokenization. Cloning hands out another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Single-pass scanner over expression text.
///
/// At each position: an operator character becomes a one-character token, a
/// digit starts a run of digits and dots, a letter starts a run of letters,
/// and anything else is skipped.
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let tokens: Vec<Token> = Lexer::new(source).collect();
        debug!("Tokenized {:?} into {} tokens", source, tokens.len());
        tokens
    }

    /// Like [`Lexer::tokenize`], but gives up with [`Error::Cancelled`] as soon
    /// as `token` is cancelled. The flag is consulted after each emitted token,
    /// never in the middle of one.
    pub fn tokenize_cancellable(source: &str, token: &CancellationToken) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        for next in Lexer::new(source) {
            tokens.push(next);
            if token.is_cancelled() {
                debug!("Tokenization cancelled after {} tokens", tokens.len());
                return Err(Error::Cancelled);
            }
        }
        Ok(tokens)
    }

    /// Async flavour of [`Lexer::tokenize_cancellable`] that yields to the
    /// runtime between tokens so long inputs do not starve other tasks.
    pub async fn tokenize_async(source: &str, token: &CancellationToken) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        for next in Lexer::new(source) {
            tokens.push(next);
            tokio::task::yield_now().await;
            if token.is_cancelled() {
                debug!("Tokenization cancelled after {} tokens", tokens.len());
                return Err(Error::Cancelled);
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn take_while<P: Fn(char) -> bool>(&mut self, predicate: P) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.position += c.len_utf8();
        }
        &self.source[start..self.position]
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while let Some(c) = self.peek() {
            let start = self.position;
            let token = if let Some(kind) = TokenKind::from_operator(c) {
                self.position += c.len_utf8();
                Token::new(kind, &self.source[start..self.position], start)
            } else if c.is_ascii_digit() {
                // dots pass through unchecked; the parser rejects "1.2.3"
                let text = self.take_while(|c| c.is_ascii_digit() || c == '.');
                Token::new(TokenKind::Number, text, start)
            } else if c.is_ascii_alphabetic() {
                let text = self.take_while(|c| c.is_ascii_alphabetic());
                Token::new(TokenKind::Identifier, text, start)
            } else {
                self.position += c.len_utf8();
                continue;
            };
            trace!("token {:?} {:?} @{}", token.kind, token.text, token.offset);
            return Some(token);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("()+-*/%,^"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Comma,
                TokenKind::Caret,
            ]
        );
    }

    #[test]
    fn test_function_call_tokens() {
        let tokens = Lexer::tokenize("sin(rad(x)) + 2^y");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Identifier, "sin", 0),
                Token::new(TokenKind::LeftParen, "(", 3),
                Token::new(TokenKind::Identifier, "rad", 4),
                Token::new(TokenKind::LeftParen, "(", 7),
                Token::new(TokenKind::Identifier, "x", 8),
                Token::new(TokenKind::RightParen, ")", 9),
                Token::new(TokenKind::RightParen, ")", 10),
                Token::new(TokenKind::Plus, "+", 12),
                Token::new(TokenKind::Number, "2", 14),
                Token::new(TokenKind::Caret, "^", 15),
                Token::new(TokenKind::Identifier, "y", 16),
            ]
        );
    }

    #[test]
    fn test_numbers_keep_every_dot() {
        let tokens = Lexer::tokenize("3.14 1.2.3");
        assert_eq!(tokens[0].text, "3.14");
        assert_eq!(tokens[1].text, "1.2.3");
        assert_eq!(tokens[1].offset, 5);
    }

    #[test]
    fn test_identifiers_stop_at_digits_and_underscores() {
        let tokens = Lexer::tokenize("ab2c_d");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "2", "c", "d"]);
        assert_eq!(tokens[1].kind, TokenKind::Number);
    }

    #[test]
    fn test_unknown_characters_and_whitespace_skipped() {
        assert_eq!(
            kinds("  x @ # y\t\n"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
        assert!(Lexer::tokenize("").is_empty());
        assert!(Lexer::tokenize("é ü").is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            Lexer::tokenize_cancellable("1 + 2", &token),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn test_not_cancelled_matches_plain_tokenize() {
        let token = CancellationToken::new();
        assert_eq!(
            Lexer::tokenize_cancellable("a*(b-1)", &token).unwrap(),
            Lexer::tokenize("a*(b-1)")
        );
    }

    #[test]
    fn test_cancellation_shared_between_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_async_tokenize() {
        let token = CancellationToken::new();
        let tokens = Lexer::tokenize_async("max(1, 2)", &token).await.unwrap();
        assert_eq!(tokens.len(), 6);

        token.cancel();
        assert_eq!(
            Lexer::tokenize_async("max(1, 2)", &token).await,
            Err(Error::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_async_cancel_mid_stream() {
        let token = CancellationToken::new();
        let (result, ()) = tokio::join!(Lexer::tokenize_async("1+2+3", &token), async {
            token.cancel()
        });
        assert_eq!(result, Err(Error::Cancelled));
        assert!(token.is_cancelled());
    }
}
