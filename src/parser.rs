use std::result;

use crate::error::{Diagnostics, SourceError};
use crate::expr::Expr;
use crate::scanner::{Token, TokenType};
use crate::stmt::Stmt;
use crate::value::Value;

const MAX_ARGUMENTS: usize = 255;
// bounds recursion in the parser and in everything that later walks the tree
const MAX_NESTING_DEPTH: usize = 128;

type ParseResult<T> = result::Result<T, SourceError>;
type StmtResult = ParseResult<Stmt>;
type ExprResult = ParseResult<Expr>;

/// Parse a whole program. Syntax errors are reported to `diagnostics`; the
/// statements that did parse are still returned.
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<Stmt> {
    let mut cursor = TokenCursor::new(tokens, diagnostics);
    let mut statements = Vec::new();

    while !cursor.at_end() {
        if let Some(statement) = declaration(&mut cursor) {
            statements.push(statement);
        }
    }

    tracing::debug!(count = statements.len(), "parsed statements");
    statements
}

// Errors unwind to here, get reported, and parsing resumes at the next statement boundary.
fn declaration(cursor: &mut TokenCursor) -> Option<Stmt> {
    let result = if cursor.advance_if_match(TokenType::Var).is_some() {
        var_declaration(cursor)
    } else {
        statement(cursor)
    };

    match result {
        Ok(statement) => Some(statement),
        Err(error) => {
            cursor.diagnostics.report(error);
            cursor.synchronize();
            None
        }
    }
}

fn var_declaration(cursor: &mut TokenCursor) -> StmtResult {
    let name = cursor.consume(TokenType::Identifier, "Expect variable name.")?;

    let initializer = if cursor.advance_if_match(TokenType::Equal).is_some() {
        Some(expression(cursor)?)
    } else {
        None
    };

    cursor.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
    Ok(Stmt::Var { name, initializer })
}

fn statement(cursor: &mut TokenCursor) -> StmtResult {
    nested(cursor, statement_kind)
}

fn statement_kind(cursor: &mut TokenCursor) -> StmtResult {
    let matched = cursor.advance_if_any_match(&[
        TokenType::For,
        TokenType::If,
        TokenType::Print,
        TokenType::While,
        TokenType::LeftBrace,
    ]);

    match matched {
        Some(token) => match token.token_type {
            TokenType::For => for_statement(cursor),
            TokenType::If => if_statement(cursor),
            TokenType::Print => print_statement(cursor, token),
            TokenType::While => while_statement(cursor),
            _ => Ok(Stmt::Block {
                statements: block(cursor)?,
            }),
        },
        None => expression_statement(cursor),
    }
}

// for (init; cond; incr) body  =>  { init; while (cond) { body; incr; } }
fn for_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

    let initializer = if cursor.advance_if_match(TokenType::Semicolon).is_some() {
        None
    } else if cursor.advance_if_match(TokenType::Var).is_some() {
        Some(var_declaration(cursor)?)
    } else {
        Some(expression_statement(cursor)?)
    };

    let condition = if cursor.check(TokenType::Semicolon) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

    let increment = if cursor.check(TokenType::RightParen) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

    let mut body = statement(cursor)?;

    if let Some(increment) = increment {
        body = Stmt::Block {
            statements: vec![body, Stmt::Expression { expression: increment }],
        };
    }

    body = Stmt::While {
        condition: condition.unwrap_or_else(|| Expr::literal(true)),
        body: Box::new(body),
    };

    if let Some(initializer) = initializer {
        body = Stmt::Block {
            statements: vec![initializer, body],
        };
    }

    Ok(body)
}

fn if_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

    let then_branch = Box::new(statement(cursor)?);
    let else_branch = if cursor.advance_if_match(TokenType::Else).is_some() {
        Some(Box::new(statement(cursor)?))
    } else {
        None
    };

    Ok(Stmt::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn print_statement(cursor: &mut TokenCursor, keyword: Token) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after value.")?;
    Ok(Stmt::Print { keyword, expression })
}

fn while_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after condition.")?;
    let body = Box::new(statement(cursor)?);

    Ok(Stmt::While { condition, body })
}

fn expression_statement(cursor: &mut TokenCursor) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
    Ok(Stmt::Expression { expression })
}

// Called after the opening brace has been consumed.
fn block(cursor: &mut TokenCursor) -> ParseResult<Vec<Stmt>> {
    let mut statements = Vec::new();
    while !cursor.check(TokenType::RightBrace) && !cursor.at_end() {
        if let Some(statement) = declaration(cursor) {
            statements.push(statement);
        }
    }
    cursor.consume(TokenType::RightBrace, "Expect '}' after block.")?;
    Ok(statements)
}

fn expression(cursor: &mut TokenCursor) -> ExprResult {
    nested(cursor, assignment)
}

// Run a nested production, failing once the nesting limit is reached.
fn nested<T>(cursor: &mut TokenCursor, production: fn(&mut TokenCursor) -> ParseResult<T>) -> ParseResult<T> {
    cursor.deepen()?;
    let result = production(cursor);
    cursor.depth -= 1;
    result
}

fn assignment(cursor: &mut TokenCursor) -> ExprResult {
    let expr = logical_or(cursor)?;

    if let Some(equal) = cursor.advance_if_match(TokenType::Equal) {
        let value = nested(cursor, assignment)?;

        return match expr {
            Expr::Variable { name } => Ok(Expr::Assign {
                name,
                value: Box::new(value),
            }),
            // reported without unwinding, the parser is not confused about where it is
            _ => {
                cursor
                    .diagnostics
                    .report(SourceError::at_token(&equal, "Invalid assignment target."));
                Ok(expr)
            }
        };
    }

    Ok(expr)
}

fn logical_or(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(cursor, logical_and, &[TokenType::Or], Expr::logical)
}

fn logical_and(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(cursor, ternary, &[TokenType::And], Expr::logical)
}

// The branches are full expressions, which makes `?:` right associative.
fn ternary(cursor: &mut TokenCursor) -> ExprResult {
    let condition = equality(cursor)?;

    if cursor.advance_if_match(TokenType::Question).is_some() {
        let true_expr = expression(cursor)?;
        cursor.consume(TokenType::Colon, "Expect ':' after ternary branch.")?;
        let false_expr = expression(cursor)?;
        return Ok(Expr::Ternary {
            condition: Box::new(condition),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        });
    }

    Ok(condition)
}

fn equality(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(
        cursor,
        comparison,
        &[TokenType::BangEqual, TokenType::EqualEqual],
        Expr::binary,
    )
}

fn comparison(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(
        cursor,
        term,
        &[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ],
        Expr::binary,
    )
}

fn term(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(cursor, factor, &[TokenType::Minus, TokenType::Plus], Expr::binary)
}

fn factor(cursor: &mut TokenCursor) -> ExprResult {
    left_associative(cursor, unary, &[TokenType::Slash, TokenType::Star], Expr::binary)
}

// Parse a left associative expression as long as the current token matches one of the given types
fn left_associative(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    types: &[TokenType],
    build: fn(Expr, Token, Expr) -> Expr,
) -> ExprResult {
    let depth = cursor.depth;
    let result = left_associative_chain(cursor, higher_precedence, types, build);
    cursor.depth = depth;
    result
}

// Every operator in the chain adds a level to the left-leaning tree.
fn left_associative_chain(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    types: &[TokenType],
    build: fn(Expr, Token, Expr) -> Expr,
) -> ExprResult {
    let mut expr = higher_precedence(cursor)?;

    while let Some(operator) = cursor.advance_if_any_match(types) {
        cursor.deepen()?;
        let right = higher_precedence(cursor)?;
        expr = build(expr, operator, right);
    }

    Ok(expr)
}

fn unary(cursor: &mut TokenCursor) -> ExprResult {
    if let Some(operator) = cursor.advance_if_any_match(&[TokenType::Bang, TokenType::Minus]) {
        let right = nested(cursor, unary)?;
        return Ok(Expr::Unary {
            operator,
            right: Box::new(right),
        });
    }

    call(cursor)
}

fn call(cursor: &mut TokenCursor) -> ExprResult {
    let depth = cursor.depth;
    let result = call_chain(cursor);
    cursor.depth = depth;
    result
}

fn call_chain(cursor: &mut TokenCursor) -> ExprResult {
    let mut expr = primary(cursor)?;

    while cursor.advance_if_match(TokenType::LeftParen).is_some() {
        cursor.deepen()?;
        expr = finish_call(cursor, expr)?;
    }

    Ok(expr)
}

fn finish_call(cursor: &mut TokenCursor, callee: Expr) -> ExprResult {
    let mut arguments = Vec::new();

    if !cursor.check(TokenType::RightParen) {
        loop {
            if arguments.len() >= MAX_ARGUMENTS {
                let error = SourceError::at_token(cursor.peek(), "Can't have more than 255 arguments.");
                cursor.diagnostics.report(error);
            }
            arguments.push(expression(cursor)?);

            if cursor.advance_if_match(TokenType::Comma).is_none() {
                break;
            }
        }
    }

    let paren = cursor.consume(TokenType::RightParen, "Expect ')' after arguments.")?;

    Ok(Expr::Call {
        callee: Box::new(callee),
        paren,
        arguments,
    })
}

fn primary(cursor: &mut TokenCursor) -> ExprResult {
    let current = cursor.peek();

    let expr = match current.token_type {
        TokenType::False => Expr::literal(false),
        TokenType::True => Expr::literal(true),
        TokenType::Nil => Expr::Literal { value: Value::Nil },
        TokenType::Number | TokenType::String => Expr::Literal {
            value: current.literal.clone().unwrap_or(Value::Nil),
        },
        TokenType::Identifier => Expr::Variable { name: current.clone() },
        TokenType::LeftParen => {
            cursor.advance();
            let expression = expression(cursor)?;
            cursor.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                expression: Box::new(expression),
            });
        }
        _ => return Err(SourceError::at_token(current, "Expect expression.")),
    };

    cursor.advance();
    Ok(expr)
}

struct TokenCursor<'a> {
    tokens: &'a [Token],
    index: usize,
    depth: usize,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> TokenCursor<'a> {
    fn new(tokens: &'a [Token], diagnostics: &'a mut Diagnostics) -> TokenCursor<'a> {
        TokenCursor {
            tokens,
            index: 0,
            depth: 0,
            diagnostics,
        }
    }

    // the scanner always terminates the stream with EOF, but a hand built slice may not
    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        let last = tokens.len().saturating_sub(1);
        &tokens[self.index.min(last)]
    }

    fn previous(&self) -> Option<&'a Token> {
        let tokens: &'a [Token] = self.tokens;
        self.index.checked_sub(1).and_then(|index| tokens.get(index))
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.index += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.tokens
            .get(self.index)
            .map_or(true, |token| token.token_type == TokenType::EOF)
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.at_end() && self.peek().token_type == token_type
    }

    fn advance_if_match(&mut self, token_type: TokenType) -> Option<Token> {
        self.advance_if_any_match(&[token_type])
    }

    fn advance_if_any_match(&mut self, types: &[TokenType]) -> Option<Token> {
        if types.iter().any(|token_type| self.check(*token_type)) {
            let cloned = self.peek().clone();
            self.advance();
            Some(cloned)
        } else {
            None
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        self.advance_if_match(token_type)
            .ok_or_else(|| SourceError::at_token(self.peek(), message))
    }

    fn deepen(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SourceError::at_token(self.peek(), "Too much nesting."));
        }
        self.depth += 1;
        Ok(())
    }

    // Skip tokens until the start of what looks like the next statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.at_end() {
            if self
                .previous()
                .is_some_and(|token| token.token_type == TokenType::Semicolon)
            {
                break;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::For
                | TokenType::Fun
                | TokenType::If
                | TokenType::Print
                | TokenType::Return
                | TokenType::Var
                | TokenType::While => break,
                _ => self.advance(),
            }
        }

        tracing::trace!(line = self.peek().line, "parser synchronized");
    }
}
