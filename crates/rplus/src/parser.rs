//! Recursive-descent parser: token vector in, a `Program` AST out.
//!
//! LL(1) throughout — every decision looks at exactly one token of
//! lookahead. Statement dispatch switches on the current token's kind;
//! expressions climb a fixed ten-level precedence ladder rather than a
//! Pratt table, mirroring the grammar as laid out level by level.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.declaration()?);
        }
        Ok(Program { body })
    }

    // --- token-stream primitives ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.fail(message)
        }
    }

    fn fail<T>(&self, message: &str) -> Result<T> {
        Err(Error::parse(message, self.peek().line))
    }

    fn pos_here(&self) -> Pos {
        let t = self.peek();
        Pos::new(t.line, t.column)
    }

    /// Statement terminators are optional: eat a trailing `;` if present,
    /// otherwise proceed — there is no newline token in this vocabulary.
    fn consume_terminator(&mut self) {
        self.match_kind(TokenKind::Semicolon);
    }

    /// Advances past the next `;` or until the next statement-starter
    /// keyword. Available for error recovery but never invoked: the
    /// parser is fail-fast and aborts on the first error instead (§7).
    #[allow(dead_code)]
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.peek_kind() == TokenKind::Semicolon {
                self.advance();
                return;
            }
            match self.peek_kind() {
                TokenKind::Function
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- statements ---

    fn declaration(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::Var | TokenKind::Const => self.var_decl_statement(),
            _ => self.statement(),
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Function => self.function_decl(),
            TokenKind::Return => self.return_statement(),
            TokenKind::LBrace => self.block_statement(),
            _ => self.expression_statement(),
        }
    }

    fn var_decl_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        let kind = match self.advance().kind {
            TokenKind::Var => VarKind::Var,
            TokenKind::Const => VarKind::Const,
            _ => unreachable!("var_decl_statement called on non-var/const token"),
        };
        let mut declarators = Vec::new();
        loop {
            let name_tok = self.consume(TokenKind::Identifier, "Expected variable name")?;
            let init = if self.match_kind(TokenKind::Equal) {
                Some(self.expression()?)
            } else {
                None
            };
            declarators.push(Declarator {
                name: name_tok.lexeme,
                init,
            });
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.consume_terminator();
        Ok(Stmt::VarDecl {
            kind,
            declarators,
            pos,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `if`
        self.consume(TokenKind::LParen, "Expected '(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after condition")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            pos,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `while`
        self.consume(TokenKind::LParen, "Expected '(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { cond, body, pos })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `for`
        self.consume(TokenKind::LParen, "Expected '(' after 'for'")?;

        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            let stmt = if self.check(TokenKind::Var) || self.check(TokenKind::Const) {
                self.var_decl_statement()?
            } else {
                let s = self.expression_statement()?;
                s
            };
            Some(Box::new(stmt))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition")?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
            pos,
        })
    }

    fn function_decl(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `function`
        let name = self
            .consume(TokenKind::Identifier, "Expected function name")?
            .lexeme;
        self.consume(TokenKind::LParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(
                    self.consume(TokenKind::Identifier, "Expected parameter name")?
                        .lexeme,
                );
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "Expected ')' after parameters")?;
        let body = Box::new(self.block_statement()?);
        Ok(Stmt::FunctionDecl {
            name,
            params,
            body,
            is_async: false,
            is_generator: false,
            pos,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `return`
        let arg = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume_terminator();
        Ok(Stmt::Return { arg, pos })
    }

    fn block_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        self.consume(TokenKind::LBrace, "Expected '{'")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RBrace, "Expected '}'")?;
        Ok(Stmt::Block { stmts, pos })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos_here();
        let expr = self.expression()?;
        self.consume_terminator();
        Ok(Stmt::ExprStmt { expr, pos })
    }

    // --- expressions: precedence climbing, low to high ---

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let lhs = self.logical_or()?;

        let compound_op = match self.peek_kind() {
            TokenKind::Equal => None,
            TokenKind::PlusEqual => Some(BinaryOp::Add),
            TokenKind::MinusEqual => Some(BinaryOp::Sub),
            TokenKind::StarEqual => Some(BinaryOp::Mul),
            TokenKind::SlashEqual => Some(BinaryOp::Div),
            TokenKind::PercentEqual => Some(BinaryOp::Mod),
            _ => return Ok(lhs),
        };

        let pos = self.pos_here();
        self.advance(); // the assignment operator itself

        if !matches!(lhs, Expr::Identifier { .. }) {
            return self.fail("Invalid assignment target");
        }

        let rhs = self.assignment()?;

        let value = match compound_op {
            None => rhs,
            Some(op) => Expr::Binary {
                op,
                left: Box::new(lhs.clone()),
                right: Box::new(rhs),
                pos,
            },
        };

        Ok(Expr::Assign {
            target: Box::new(lhs),
            value: Box::new(value),
            compound_op,
            pos,
        })
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr = self.logical_and()?;
        while self.check(TokenKind::PipePipe) {
            let pos = self.pos_here();
            self.advance();
            let right = self.logical_and()?;
            expr = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;
        while self.check(TokenKind::AmpAmp) {
            let pos = self.pos_here();
            self.advance();
            let right = self.equality()?;
            expr = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::NotEq,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.relational()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn relational(&mut self) -> Result<Expr> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEq,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEq,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.additive()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.multiplicative()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        let pos = self.pos_here();
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            prefix: true,
            pos,
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let pos = self.pos_here();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RParen, "Expected ')' after arguments")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        pos,
                    };
                }
                TokenKind::LBracket => {
                    let pos = self.pos_here();
                    self.advance();
                    let index = self.expression()?;
                    self.consume(TokenKind::RBracket, "Expected ']' after index")?;
                    expr = Expr::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                        pos,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let pos = self.pos_here();
        match self.peek_kind() {
            TokenKind::Number => {
                let tok = self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::Number,
                    text: tok.lexeme,
                    pos,
                })
            }
            TokenKind::Float => {
                let tok = self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::Float,
                    text: tok.lexeme,
                    pos,
                })
            }
            TokenKind::String => {
                let tok = self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::String,
                    text: tok.lexeme,
                    pos,
                })
            }
            TokenKind::Char => {
                // No dedicated Value variant for chars: fold the code
                // point into a numeric literal at parse time.
                let tok = self.advance();
                let code = tok.lexeme.chars().next().map(|c| c as u32).unwrap_or(0);
                Ok(Expr::Literal {
                    kind: LiteralKind::Number,
                    text: code.to_string(),
                    pos,
                })
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                Ok(Expr::Identifier {
                    name: tok.lexeme,
                    pos,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::Bool,
                    text: "true".into(),
                    pos,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::Bool,
                    text: "false".into(),
                    pos,
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal {
                    kind: LiteralKind::Null,
                    text: "null".into(),
                    pos,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RBracket, "Expected ']' after array elements")?;
                Ok(Expr::ArrayLit { elements, pos })
            }
            TokenKind::Eof => self.fail("Unexpected end of input"),
            TokenKind::Error => {
                let tok = self.advance();
                Err(Error::unexpected_token(tok.line, tok.lexeme))
            }
            _ => {
                let tok = self.peek().clone();
                self.fail(&format!("Unexpected token: {}", tok.lexeme))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Program> {
        let tokens = Lexer::new(src).tokenize();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let program = parse("1 + 2 * 3;").unwrap();
        match &program.body[0] {
            Stmt::ExprStmt {
                expr: Expr::Binary { op, right, .. },
                ..
            } => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn invalid_assignment_target_is_rejected() {
        let err = parse("1 = 2;").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.to_string(), "Invalid assignment target at line 1");
    }

    #[test]
    fn compound_assignment_desugars_to_binary_plus_assign() {
        let program = parse("x += 1;").unwrap();
        match &program.body[0] {
            Stmt::ExprStmt {
                expr:
                    Expr::Assign {
                        compound_op: Some(BinaryOp::Add),
                        value,
                        ..
                    },
                ..
            } => {
                assert!(matches!(**value, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_all_clauses_empty() {
        let program = parse("for (;;) {}").unwrap();
        match &program.body[0] {
            Stmt::For {
                init,
                cond,
                update,
                ..
            } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(update.is_none());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn function_decl_and_call() {
        let program = parse("function f(a, b) { return a + b; } f(1, 2);").unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0], Stmt::FunctionDecl { .. }));
        assert!(matches!(
            program.body[1],
            Stmt::ExprStmt {
                expr: Expr::Call { .. },
                ..
            }
        ));
    }

    #[test]
    fn array_literal_and_index() {
        let program = parse("var a = [10, 20, 30]; a[1];").unwrap();
        assert!(matches!(
            program.body[0],
            Stmt::VarDecl {
                kind: VarKind::Var,
                ..
            }
        ));
        assert!(matches!(
            program.body[1],
            Stmt::ExprStmt {
                expr: Expr::Index { .. },
                ..
            }
        ));
    }

    #[test]
    fn return_without_value() {
        let program = parse("function f() { return; }").unwrap();
        match &program.body[0] {
            Stmt::FunctionDecl { body, .. } => match body.as_ref() {
                Stmt::Block { stmts, .. } => {
                    assert!(matches!(stmts[0], Stmt::Return { arg: None, .. }));
                }
                other => panic!("unexpected body: {:?}", other),
            },
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn unexpected_end_of_input() {
        let err = parse("1 +").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected end of input at line 1");
    }

    #[test]
    fn lexer_error_token_is_rejected() {
        let err = parse("1 @ 2;").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }
}
