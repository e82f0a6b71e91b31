use crate::ast::{BinaryOperator, Expression, Lexer, Token, TokenKind, UnaryOperator};
use crate::error::{Error, Result};
use log::debug;

/// Deepest bracket or chain nesting the parser descends into. Each group,
/// argument list, `^` exponent and right-grouped operand counts as one level.
pub const MAX_NESTING: usize = 100;

/// Deepest expression tree the parser builds. Evaluation, lowering and drop
/// all walk the tree recursively, so a long flat chain like `1+1+...+1` is
/// bounded here even though parsing it needs no recursion.
pub const MAX_DEPTH: usize = 256;

/// How chains of same-precedence `+ - * / %` group.
///
/// `Left` is ordinary arithmetic: `a - b - c` is `(a - b) - c`. `Right`
/// groups from the right, `a - (b - c)`, which is what a purely
/// right-recursive grammar produces. `^` groups from the right either way.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Associativity {
    #[default]
    Left,
    Right,
}

/// Recursive-descent parser over a token slice.
///
/// ```text
/// additive       := multiplicative (('+' | '-') multiplicative)*
/// multiplicative := power (('*' | '/' | '%') power)*
/// power          := unary ('^' power)?
/// unary          := ('+' | '-')? primary
/// primary        := NUMBER | IDENT ('(' args ')')? | '(' additive ')'
/// args           := additive (',' additive)* | ε
/// ```
///
/// Input nesting deeper than [`MAX_NESTING`], or producing a tree deeper than
/// [`MAX_DEPTH`], is rejected with [`Error::NestingTooDeep`].
pub struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
    associativity: Associativity,
    nesting: usize,
}

/// A parsed subtree and its height.
struct Node {
    expression: Expression,
    depth: usize,
}

impl Node {
    fn leaf(expression: Expression) -> Self {
        Self {
            expression,
            depth: 1,
        }
    }
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            associativity: Associativity::default(),
            nesting: 0,
        }
    }

    pub fn with_associativity(mut self, associativity: Associativity) -> Self {
        self.associativity = associativity;
        self
    }

    /// Tokenizes and parses `input` with left associativity.
    pub fn parse_expression(input: &str) -> Result<Expression> {
        debug!("Parsing expression: {}", input);
        let tokens = Lexer::tokenize(input);
        Parser::new(&tokens).parse()
    }

    /// Parses the whole token sequence into one expression. Leftover tokens
    /// are an error.
    pub fn parse(mut self) -> Result<Expression> {
        let node = self.additive()?;
        if let Some(token) = self.peek() {
            return Err(unexpected(token));
        }
        debug!("Parse result: {}", node.expression);
        Ok(node.expression)
    }

    fn additive(&mut self) -> Result<Node> {
        self.binary_level(
            &[TokenKind::Plus, TokenKind::Minus],
            Self::multiplicative,
            Self::additive,
        )
    }

    fn multiplicative(&mut self) -> Result<Node> {
        self.binary_level(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::power,
            Self::multiplicative,
        )
    }

    /// One precedence level. With left associativity operands are folded as
    /// they arrive; with right associativity the rest of the chain is parsed
    /// by recursing into the same level.
    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        next: fn(&mut Self) -> Result<Node>,
        same: fn(&mut Self) -> Result<Node>,
    ) -> Result<Node> {
        let mut node = next(self)?;
        while let Some((operator, offset)) = self.match_any(operators) {
            let right = match self.associativity {
                Associativity::Left => next(self)?,
                Associativity::Right => {
                    let right = self.nested(offset, same)?;
                    return binary(node, operator, right, offset);
                }
            };
            node = binary(node, operator, right, offset)?;
        }
        Ok(node)
    }

    fn power(&mut self) -> Result<Node> {
        let base = self.unary()?;
        if let Some(caret) = self.match_kind(TokenKind::Caret) {
            let exponent = self.nested(caret.offset, Self::power)?;
            return binary(base, BinaryOperator::Power, exponent, caret.offset);
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Node> {
        let operator = match self.peek().map(|token| token.kind) {
            Some(TokenKind::Plus) => UnaryOperator::Plus,
            Some(TokenKind::Minus) => UnaryOperator::Minus,
            _ => return self.primary(),
        };
        self.position += 1;
        let operand = self.primary()?;
        let depth = operand.depth + 1;
        Ok(Node {
            expression: Expression::unary(operator, operand.expression),
            depth,
        })
    }

    fn primary(&mut self) -> Result<Node> {
        let token = self.advance().ok_or(Error::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number => {
                let value = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| Error::MalformedLiteral {
                        text: token.text.clone(),
                        offset: token.offset,
                    })?;
                Ok(Node::leaf(Expression::Constant(value)))
            }
            TokenKind::Identifier => {
                let name = token.text.clone();
                let Some(paren) = self.match_kind(TokenKind::LeftParen) else {
                    return Ok(Node::leaf(Expression::Variable(name)));
                };
                let args = self.nested(paren.offset, Self::arguments)?;
                let depth = args.iter().map(|arg| arg.depth).max().unwrap_or(0) + 1;
                check_depth(depth, token.offset)?;
                Ok(Node {
                    expression: Expression::Call {
                        name,
                        args: args.into_iter().map(|arg| arg.expression).collect(),
                    },
                    depth,
                })
            }
            TokenKind::LeftParen => {
                let inner = self.nested(token.offset, Self::additive)?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(token)),
        }
    }

    /// Arguments after the opening parenthesis, up to and including `)`.
    fn arguments(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if self.match_kind(TokenKind::RightParen).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            let token = self.advance().ok_or(Error::UnexpectedEnd)?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RightParen => return Ok(args),
                _ => return Err(unexpected(token)),
            }
        }
    }

    /// Runs `parse` one nesting level deeper, failing at `offset` once the
    /// level exceeds [`MAX_NESTING`].
    fn nested<T>(&mut self, offset: usize, parse: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= MAX_NESTING {
            return Err(Error::NestingTooDeep {
                position: offset,
                limit: MAX_NESTING,
            });
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn match_kind(&mut self, kind: TokenKind) -> Option<&'t Token> {
        match self.peek() {
            Some(token) if token.kind == kind => self.advance(),
            _ => None,
        }
    }

    /// Consumes a binary operator of one of `kinds`, returning it with its
    /// offset.
    fn match_any(&mut self, kinds: &[TokenKind]) -> Option<(BinaryOperator, usize)> {
        let token = self.peek()?;
        if !kinds.contains(&token.kind) {
            return None;
        }
        let operator = BinaryOperator::try_from(token.kind).ok()?;
        self.position += 1;
        Some((operator, token.offset))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'t Token> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(unexpected(token)),
            None => Err(Error::UnexpectedEnd),
        }
    }
}

fn binary(left: Node, operator: BinaryOperator, right: Node, offset: usize) -> Result<Node> {
    let depth = left.depth.max(right.depth) + 1;
    check_depth(depth, offset)?;
    Ok(Node {
        expression: Expression::binary(left.expression, operator, right.expression),
        depth,
    })
}

fn check_depth(depth: usize, offset: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::NestingTooDeep {
            position: offset,
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

fn unexpected(token: &Token) -> Error {
    Error::UnexpectedToken {
        position: token.offset,
        found: token.text.clone(),
    }
}
