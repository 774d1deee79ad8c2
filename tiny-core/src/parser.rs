//! Recursive-descent parser for the tiny language.
//!
//! The parser pulls tokens from the [`Lexer`] one at a time and builds
//! the [`Program`] arena. Name declaration happens as a side effect of
//! parsing: the first appearance of an identifier declares it in the
//! current scope, and misuse (a function where a value is expected, a
//! call through a variable) is reported while the statement is still
//! being parsed.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::program::{
    DeclarableKind, ExprId, Expression, InsertStmt, Param, Program, ScopeId, Statement, StmtId,
    ValueKind,
};

/// The reserved name bound to the implicit standard stream; never a
/// user declaration.
pub const CONSOLE: &str = "console";

/// Parses `source` into a program arena. Errors land in `diagnostics`;
/// parsing continues best-effort past the first one.
pub fn parse<'src>(source: &'src str, diagnostics: &mut Diagnostics) -> Program<'src> {
    let mut parser = Parser::new(source, diagnostics);
    parser.parse_program();
    parser.program
}

struct Parser<'src, 'd> {
    lexer: Lexer<'src>,
    program: Program<'src>,
    diagnostics: &'d mut Diagnostics,
    root: ScopeId,
}

impl<'src, 'd> Parser<'src, 'd> {
    fn new(source: &'src str, diagnostics: &'d mut Diagnostics) -> Self {
        let mut lexer = Lexer::new(source);
        // The lexer's two-token window starts as Null sentinels; two
        // priming calls make `current` the first real token.
        lexer.next_token(diagnostics);
        lexer.next_token(diagnostics);

        let mut program = Program::new();
        let root = program.add_scope(None);
        Parser {
            lexer,
            program,
            diagnostics,
            root,
        }
    }

    fn parse_program(&mut self) {
        self.skip_lines();
        while self.peek() == TokenKind::Identity {
            self.parse_function();
            self.skip_lines();
        }
        self.eat(TokenKind::Eof, "Expected end of file");
    }

    fn parse_function(&mut self) {
        let identity = self.eat(TokenKind::Identity, "Expected function name.");
        let already = self.program.fetch(self.root, identity.text).map(|d| d.kind);
        if already == Some(DeclarableKind::Function) {
            self.semantic_error(format!("Function '{}' is already declared.", identity.text));
        }
        // Declared before the body parses so the function can call itself.
        self.program
            .declare(self.root, identity.text, DeclarableKind::Function);

        let param_scope = self.program.add_scope(Some(self.root));
        let mut params = Vec::new();
        self.eat(TokenKind::ParenL, "Expected '(' after function name.");
        if self.peek() == TokenKind::Identity {
            params.push(self.parse_parameter(param_scope));
            while self.match_kind(TokenKind::Comma) {
                params.push(self.parse_parameter(param_scope));
            }
        }
        self.eat(TokenKind::ParenR, "Expected ')' at end of function parameters.");

        let body = self.program.add_scope(Some(param_scope));
        if self.peek() == TokenKind::CurlyL {
            self.parse_block(body);
        } else {
            // Non-block form: a single bare statement is the whole body.
            let statement = self.parse_statement(body);
            self.program.scope_mut(body).statements.push(statement);
        }

        self.program.add_function(identity, params, body);
    }

    fn parse_parameter(&mut self, scope: ScopeId) -> Param<'src> {
        let identity = self.eat(TokenKind::Identity, "Expected parameter name.");
        let mut kind = ValueKind::Value;
        if self.match_kind(TokenKind::SquareL) {
            self.eat(TokenKind::SquareR, "Expected ']'");
            kind = ValueKind::List;
        }
        self.program
            .declare(scope, identity.text, DeclarableKind::Variable(kind));
        Param { identity, kind }
    }

    fn parse_block(&mut self, scope: ScopeId) {
        self.eat(TokenKind::CurlyL, "Expected '{' to open block.");
        self.skip_lines();
        while self.peek_statement() {
            let statement = self.parse_statement(scope);
            self.program.scope_mut(scope).statements.push(statement);
            if self.peek() == TokenKind::CurlyR {
                // A closing brace implicitly ends the last statement.
                break;
            }
            self.eat(TokenKind::Line, "Expected newline to terminate statement");
            self.skip_lines();
        }
        self.eat(TokenKind::CurlyR, "Expected '}' to close block.");
    }

    /// Parses one statement. Whether it is an insertion is decided by
    /// looking at the single token after the left operand.
    fn parse_statement(&mut self, scope: ScopeId) -> StmtId {
        let first = self.parse_expression(scope);
        let mut statement = self.program.add_statement(Statement::Expression(first));

        if matches!(self.peek(), TokenKind::InsertL | TokenKind::InsertR) {
            // The first operator fixes the statement's direction.
            let insert_at_end = self.peek() == TokenKind::InsertR;
            while matches!(self.peek(), TokenKind::InsertL | TokenKind::InsertR) {
                if (self.peek() == TokenKind::InsertR) != insert_at_end {
                    self.semantic_error("Cannot mix << and >> in one statement.");
                }
                self.advance();
                let value = self.parse_expression(scope);
                let value = self.program.add_statement(Statement::Expression(value));
                let insert = self.program.add_insert(InsertStmt {
                    subject: statement,
                    insert: value,
                    insert_at_end,
                });
                statement = self.program.add_statement(Statement::Insert(insert));
            }
        }

        statement
    }

    fn parse_expression(&mut self, scope: ScopeId) -> ExprId {
        if self.peek() == TokenKind::Identity && self.peek_next() == TokenKind::ParenL {
            self.parse_call(scope)
        } else if self.peek() == TokenKind::Str {
            self.parse_list_literal()
        } else if self.peek() == TokenKind::Identity {
            self.parse_identity(scope)
        } else {
            self.parse_error("Expected expression");
            // Degenerate placeholder so the arena stays well-formed.
            let list = self.program.add_value_list(Vec::new());
            self.program.add_expression(Expression::List(list))
        }
    }

    fn parse_identity(&mut self, scope: ScopeId) -> ExprId {
        let identity = self.eat(TokenKind::Identity, "Expected identity.");
        if identity.text != CONSOLE {
            match self.program.fetch(scope, identity.text).map(|d| d.kind) {
                None => {
                    self.program.declare(
                        scope,
                        identity.text,
                        DeclarableKind::Variable(ValueKind::Value),
                    );
                }
                Some(DeclarableKind::Function) => {
                    self.semantic_error("Cannot use function as an expression.");
                }
                Some(DeclarableKind::Variable(_)) => {}
            }
        }
        let identifier = self.program.add_identifier(identity);
        self.program.add_expression(Expression::Identity(identifier))
    }

    fn parse_call(&mut self, scope: ScopeId) -> ExprId {
        let callee = self.eat(TokenKind::Identity, "Expected function name.");
        match self.program.fetch(scope, callee.text).map(|d| d.kind) {
            None => {
                self.semantic_error(format!("Function '{}' does not exist.", callee.text));
            }
            Some(DeclarableKind::Variable(_)) => {
                self.semantic_error(format!("'{}' is not a function.", callee.text));
            }
            Some(DeclarableKind::Function) => {}
        }

        self.eat(TokenKind::ParenL, "Expected '(' after function name.");
        let mut args = Vec::new();
        if self.peek_expression() {
            args.push(self.parse_expression(scope));
            while self.match_kind(TokenKind::Comma) {
                args.push(self.parse_expression(scope));
            }
        }
        self.eat(TokenKind::ParenR, "Expected ')' after function arguments.");

        let call = self.program.add_call(callee, args);
        self.program.add_expression(Expression::Call(call))
    }

    /// Lowers a string literal to its character codes; the text is not
    /// kept past this point.
    fn parse_list_literal(&mut self) -> ExprId {
        let token = self.eat(TokenKind::Str, "Expected string.");
        let inner = token.text.strip_prefix('"').unwrap_or(token.text);
        let inner = inner.strip_suffix('"').unwrap_or(inner);
        let values = inner.chars().map(|c| i64::from(u32::from(c))).collect();
        let list = self.program.add_value_list(values);
        self.program.add_expression(Expression::List(list))
    }

    fn peek(&self) -> TokenKind {
        self.lexer.current.kind
    }

    fn peek_next(&self) -> TokenKind {
        self.lexer.next.kind
    }

    fn peek_statement(&self) -> bool {
        self.peek_expression()
    }

    fn peek_expression(&self) -> bool {
        matches!(self.peek(), TokenKind::Identity | TokenKind::Str)
    }

    fn advance(&mut self) {
        self.lexer.next_token(self.diagnostics);
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek() != kind {
            return false;
        }
        self.advance();
        true
    }

    fn skip_lines(&mut self) {
        while self.match_kind(TokenKind::Line) {}
    }

    /// Requires the next token to be `kind`. For non-newline kinds a
    /// run of pending newlines is discarded first. On mismatch the
    /// unexpected token is reported but not consumed, leaving it for a
    /// later production to resynchronize on.
    fn eat(&mut self, kind: TokenKind, msg: &str) -> Token<'src> {
        if kind != TokenKind::Line {
            self.skip_lines();
        }
        let token = self.lexer.current;
        if token.kind == kind {
            self.advance();
        } else {
            self.parse_error(msg);
        }
        token
    }

    fn parse_error(&mut self, msg: &str) {
        let current = self.lexer.current;
        let got = if current.kind == TokenKind::Line {
            "new line".to_string()
        } else if current.text.is_empty() {
            current.kind.to_string()
        } else {
            format!("{} {}", current.kind, current.text)
        };
        self.diagnostics.report(
            DiagnosticKind::Syntax,
            current.line,
            format!("{msg} (got {got})"),
        );
    }

    fn semantic_error(&mut self, message: impl Into<String>) {
        self.diagnostics
            .report(DiagnosticKind::Semantic, self.lexer.current.line, message);
    }
}
