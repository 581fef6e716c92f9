use std::mem;

use crate::{
    ast::{BlockStmt, Expr, ExprKind, Program, Stmt, StmtKind},
    diagnostics::{Diagnostic, SourceSpan},
    lexer::{Keyword, Lexer, Token, TokenKind},
};

/// Parses a source buffer into a program plus the ordered diagnostics the
/// parser accumulated along the way. Parsing never aborts on an error; it
/// records a diagnostic and keeps going so one run surfaces every issue.
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    (program, parser.into_diagnostics())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Prefix,
    Call,
}

fn precedence_of(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq | TokenKind::Is | TokenKind::IsNot => {
            Precedence::Equality
        }
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
            Precedence::Relational
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Multiplicative,
        TokenKind::LParen | TokenKind::Arrow => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

type PrefixFn<'a> = fn(&mut Parser<'a>) -> Option<Expr>;
type InfixFn<'a> = fn(&mut Parser<'a>, Expr) -> Option<Expr>;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn advance(&mut self) {
        self.current = mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn expect_peek(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.peek.kind == kind {
            self.advance();
            true
        } else {
            self.diagnostics
                .push(Diagnostic::new(message.to_string()).with_span(self.peek.span));
            false
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.advance();
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Let) => self.parse_let_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::Ident, "expected identifier after `let`") {
            return None;
        }
        let name = self.current.lexeme.clone();
        if !self.expect_peek(TokenKind::Assign, "expected `=` after binding name") {
            return None;
        }
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        let end = self.current.span.end;
        Some(Stmt {
            kind: StmtKind::Let { name, value },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let start = self.current.span.start;
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        let end = self.current.span.end;
        Some(Stmt {
            kind: StmtKind::Return { value },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(Stmt {
            span: expr.span,
            kind: StmtKind::Expr(expr),
        })
    }

    fn parse_expression(&mut self, min_precedence: Precedence) -> Option<Expr> {
        let Some(prefix) = Self::prefix_handler(&self.current.kind) else {
            self.diagnostics.push(
                Diagnostic::new(format!(
                    "no prefix parser for `{}`",
                    describe(&self.current)
                ))
                .with_span(self.current.span),
            );
            return None;
        };
        let mut left = prefix(self)?;

        while self.peek.kind != TokenKind::Semicolon
            && min_precedence < precedence_of(&self.peek.kind)
        {
            let Some(infix) = Self::infix_handler(&self.peek.kind) else {
                break;
            };
            self.advance();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn prefix_handler(kind: &TokenKind) -> Option<PrefixFn<'a>> {
        match kind {
            TokenKind::Ident => Some(Self::parse_identifier),
            TokenKind::Int => Some(Self::parse_integer),
            TokenKind::Str => Some(Self::parse_string),
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
                Some(Self::parse_boolean)
            }
            TokenKind::Bang | TokenKind::Minus | TokenKind::Not => {
                Some(Self::parse_prefix_expression)
            }
            TokenKind::Amp => Some(Self::parse_reference),
            TokenKind::Asterisk => Some(Self::parse_pointer),
            TokenKind::LParen => Some(Self::parse_grouped),
            TokenKind::Keyword(Keyword::If) => Some(Self::parse_conditional),
            TokenKind::Keyword(Keyword::Func) => Some(Self::parse_function),
            TokenKind::Keyword(Keyword::For) => Some(Self::parse_for_loop),
            TokenKind::Comment => Some(Self::parse_comment),
            _ => None,
        }
    }

    fn infix_handler(kind: &TokenKind) -> Option<InfixFn<'a>> {
        match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Is
            | TokenKind::IsNot => Some(Self::parse_infix_expression),
            TokenKind::LParen => Some(Self::parse_invocation),
            TokenKind::Arrow => Some(Self::parse_qualified_invocation),
            _ => None,
        }
    }

    // An identifier immediately followed by `=` is reinterpreted as an
    // assignment to an existing binding rather than a lookup.
    fn parse_identifier(&mut self) -> Option<Expr> {
        let name = self.current.lexeme.clone();
        let span = self.current.span;
        if self.peek.kind == TokenKind::Assign {
            self.advance();
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            let end = value.span.end;
            return Some(Expr {
                kind: ExprKind::Assignment {
                    name,
                    value: Box::new(value),
                },
                span: SourceSpan::new(span.start, end),
            });
        }
        Some(Expr {
            kind: ExprKind::Identifier(name),
            span,
        })
    }

    fn parse_integer(&mut self) -> Option<Expr> {
        match self.current.lexeme.parse::<i64>() {
            Ok(value) => Some(Expr {
                kind: ExprKind::Integer(value),
                span: self.current.span,
            }),
            Err(_) => {
                self.diagnostics.push(
                    Diagnostic::new(format!(
                        "could not parse `{}` as an integer",
                        self.current.lexeme
                    ))
                    .with_span(self.current.span),
                );
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expr> {
        Some(Expr {
            kind: ExprKind::Str(self.current.lexeme.clone()),
            span: self.current.span,
        })
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        Some(Expr {
            kind: ExprKind::Boolean(self.current.kind == TokenKind::Keyword(Keyword::True)),
            span: self.current.span,
        })
    }

    fn parse_comment(&mut self) -> Option<Expr> {
        Some(Expr {
            kind: ExprKind::Comment(self.current.lexeme.clone()),
            span: self.current.span,
        })
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = self.current.lexeme.clone();
        let start = self.current.span.start;
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        let end = right.span.end;
        Some(Expr {
            kind: ExprKind::Prefix {
                op,
                right: Box::new(right),
            },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = self.current.lexeme.clone();
        let precedence = precedence_of(&self.current.kind);
        self.advance();
        let right = self.parse_expression(precedence)?;
        let span = SourceSpan::new(left.span.start, right.span.end);
        Some(Expr {
            kind: ExprKind::Infix {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        })
    }

    fn parse_reference(&mut self) -> Option<Expr> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::Ident, "expected identifier after `&`") {
            return None;
        }
        Some(Expr {
            kind: ExprKind::Reference(self.current.lexeme.clone()),
            span: SourceSpan::new(start, self.current.span.end),
        })
    }

    fn parse_pointer(&mut self) -> Option<Expr> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::Ident, "expected identifier after `*`") {
            return None;
        }
        Some(Expr {
            kind: ExprKind::Pointer(self.current.lexeme.clone()),
            span: SourceSpan::new(start, self.current.span.end),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expr> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen, "expected `)` to close grouping") {
            return None;
        }
        Some(expr)
    }

    fn parse_conditional(&mut self) -> Option<Expr> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::LParen, "expected `(` after `if`") {
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen, "expected `)` after condition") {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace, "expected `{` to open conditional block") {
            return None;
        }
        let then_block = self.parse_block();
        let mut else_block = None;
        if self.peek.kind == TokenKind::Keyword(Keyword::Else) {
            self.advance();
            if !self.expect_peek(TokenKind::LBrace, "expected `{` after `else`") {
                return None;
            }
            else_block = Some(self.parse_block());
        }
        let end = self.current.span.end;
        Some(Expr {
            kind: ExprKind::Conditional {
                condition: Box::new(condition),
                then_block,
                else_block,
            },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_function(&mut self) -> Option<Expr> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::LParen, "expected `(` after function keyword") {
            return None;
        }
        let params = self.parse_parameters()?;
        if !self.expect_peek(TokenKind::LBrace, "expected `{` to open function body") {
            return None;
        }
        let body = self.parse_block();
        let end = self.current.span.end;
        Some(Expr {
            kind: ExprKind::Function { params, body },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();
        if self.peek.kind == TokenKind::RParen {
            self.advance();
            return Some(params);
        }
        if !self.expect_peek(TokenKind::Ident, "expected parameter name") {
            return None;
        }
        params.push(self.current.lexeme.clone());
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            if !self.expect_peek(TokenKind::Ident, "expected parameter name after `,`") {
                return None;
            }
            params.push(self.current.lexeme.clone());
        }
        if !self.expect_peek(TokenKind::RParen, "expected `)` after parameters") {
            return None;
        }
        Some(params)
    }

    fn parse_invocation(&mut self, callee: Expr) -> Option<Expr> {
        let args = self.parse_arguments()?;
        let span = SourceSpan::new(callee.span.start, self.current.span.end);
        Some(Expr {
            kind: ExprKind::Invocation {
                callee: Box::new(callee),
                args,
            },
            span,
        })
    }

    // `module -> member(args)`: the qualified form is only supported in
    // call position; the member resolves like a plain identifier callee.
    fn parse_qualified_invocation(&mut self, module: Expr) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Ident, "expected member name after `->`") {
            return None;
        }
        let member = Expr {
            kind: ExprKind::Identifier(self.current.lexeme.clone()),
            span: self.current.span,
        };
        if self.peek.kind != TokenKind::LParen {
            self.diagnostics.push(
                Diagnostic::new("qualified access is only supported in call position")
                    .with_span(self.peek.span),
            );
            return None;
        }
        self.advance();
        let args = self.parse_arguments()?;
        let span = SourceSpan::new(module.span.start, self.current.span.end);
        Some(Expr {
            kind: ExprKind::Invocation {
                callee: Box::new(member),
                args,
            },
            span,
        })
    }

    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek.kind == TokenKind::RParen {
            self.advance();
            return Some(args);
        }
        self.advance();
        args.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            args.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(TokenKind::RParen, "expected `)` after arguments") {
            return None;
        }
        Some(args)
    }

    // `for (let i = 0; i < 10; i + 1) { ... }` — three positionally fixed
    // clauses. Clause shape (identifier op integer literal) is checked by
    // the evaluator, not here.
    fn parse_for_loop(&mut self) -> Option<Expr> {
        let start = self.current.span.start;
        if !self.expect_peek(TokenKind::LParen, "expected `(` after `for`") {
            return None;
        }
        if !self.expect_peek(
            TokenKind::Keyword(Keyword::Let),
            "for loop must open with a `let` binding",
        ) {
            return None;
        }
        let init = self.parse_let_statement()?;
        if self.current.kind != TokenKind::Semicolon {
            self.diagnostics.push(
                Diagnostic::new("expected `;` after for loop binding")
                    .with_span(self.current.span),
            );
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon, "expected `;` after for loop condition") {
            return None;
        }
        self.advance();
        let increment = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen, "expected `)` after for loop clauses") {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace, "expected `{` to open for loop body") {
            return None;
        }
        let body = self.parse_block();
        let end = self.current.span.end;
        Some(Expr {
            kind: ExprKind::ForLoop {
                init: Box::new(init),
                condition: Box::new(condition),
                increment: Box::new(increment),
                body,
            },
            span: SourceSpan::new(start, end),
        })
    }

    fn parse_block(&mut self) -> BlockStmt {
        let start = self.current.span.start;
        self.advance();
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::RBrace && self.current.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.advance();
        }
        BlockStmt {
            statements,
            span: SourceSpan::new(start, self.current.span.end),
        }
    }
}

fn describe(token: &Token) -> String {
    if token.lexeme.is_empty() {
        format!("{:?}", token.kind)
    } else {
        token.lexeme.clone()
    }
}
