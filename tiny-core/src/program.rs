//! The program arena.
//!
//! Every node the parser creates lives in one growable collection per
//! node kind, and nodes refer to each other through the typed index
//! wrappers below — never through addresses. The collections reallocate
//! as they grow, so an index resolved through the live [`Program`] is
//! the only reference that stays valid.

use std::collections::BTreeMap;

use crate::lexer::Token;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Creates an identifier from a raw arena index.
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw arena index.
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

define_id!(IdentId);
define_id!(ListId);
define_id!(CallId);
define_id!(ExprId);
define_id!(InsertId);
define_id!(StmtId);
define_id!(ScopeId);
define_id!(FunctionId);

/// The language's only literal aggregate: an ordered sequence of
/// character codes. The source text of the string literal it was
/// lowered from is discarded at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueList {
    pub values: Vec<i64>,
}

/// A function call expression: `callee(arg, ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<'src> {
    pub callee: Token<'src>,
    pub args: Vec<ExprId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expression {
    /// An identifier use, bound against the lexical scope chain rather
    /// than resolved in place.
    Identity(IdentId),
    List(ListId),
    Call(CallId),
}

/// `subject << insert` or `subject >> insert`.
///
/// `insert_at_end` records which mirror-image operator was read:
/// `true` for `>>`, `false` for `<<`. The sides are statement indices
/// so that a chain parses as a left-nested insert whose subject is the
/// previous link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertStmt {
    pub subject: StmtId,
    pub insert: StmtId,
    pub insert_at_end: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Expression(ExprId),
    Insert(InsertId),
}

/// The coarse value-versus-list distinction, the only typing the
/// language has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Value,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarableKind {
    Variable(ValueKind),
    Function,
}

/// A name declared in a scope, together with the identifier it maps to
/// in the generated C++.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarable {
    pub identity: String,
    pub c_identity: String,
    pub kind: DeclarableKind,
}

/// A lexical scope: parent back-reference for lookup, statements in
/// encounter order, and the symbol table that accumulates while the
/// scope's statements are parsed.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub statements: Vec<StmtId>,
    pub symbols: BTreeMap<String, Declarable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'src> {
    pub identity: Token<'src>,
    pub kind: ValueKind,
}

#[derive(Debug)]
pub struct Function<'src> {
    pub identity: Token<'src>,
    pub params: Vec<Param<'src>>,
    pub scope: ScopeId,
}

/// Arena owning every node of a parsed program.
#[derive(Debug, Default)]
pub struct Program<'src> {
    pub identifiers: Vec<Token<'src>>,
    pub value_lists: Vec<ValueList>,
    pub calls: Vec<Call<'src>>,
    pub expressions: Vec<Expression>,
    pub inserts: Vec<InsertStmt>,
    pub statements: Vec<Statement>,
    pub scopes: Vec<Scope>,
    pub functions: Vec<Function<'src>>,
}

impl<'src> Program<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identifier(&mut self, token: Token<'src>) -> IdentId {
        self.identifiers.push(token);
        IdentId::new(self.identifiers.len() - 1)
    }

    pub fn add_value_list(&mut self, values: Vec<i64>) -> ListId {
        self.value_lists.push(ValueList { values });
        ListId::new(self.value_lists.len() - 1)
    }

    pub fn add_call(&mut self, callee: Token<'src>, args: Vec<ExprId>) -> CallId {
        self.calls.push(Call { callee, args });
        CallId::new(self.calls.len() - 1)
    }

    pub fn add_expression(&mut self, expression: Expression) -> ExprId {
        self.expressions.push(expression);
        ExprId::new(self.expressions.len() - 1)
    }

    pub fn add_insert(&mut self, insert: InsertStmt) -> InsertId {
        self.inserts.push(insert);
        InsertId::new(self.inserts.len() - 1)
    }

    pub fn add_statement(&mut self, statement: Statement) -> StmtId {
        self.statements.push(statement);
        StmtId::new(self.statements.len() - 1)
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            statements: Vec::new(),
            symbols: BTreeMap::new(),
        });
        ScopeId::new(self.scopes.len() - 1)
    }

    pub fn add_function(
        &mut self,
        identity: Token<'src>,
        params: Vec<Param<'src>>,
        scope: ScopeId,
    ) -> FunctionId {
        self.functions.push(Function {
            identity,
            params,
            scope,
        });
        FunctionId::new(self.functions.len() - 1)
    }

    pub fn identifier(&self, id: IdentId) -> Token<'src> {
        self.identifiers[id.index()]
    }

    pub fn value_list(&self, id: ListId) -> &ValueList {
        &self.value_lists[id.index()]
    }

    pub fn call(&self, id: CallId) -> &Call<'src> {
        &self.calls[id.index()]
    }

    pub fn expression(&self, id: ExprId) -> Expression {
        self.expressions[id.index()]
    }

    pub fn insert(&self, id: InsertId) -> InsertStmt {
        self.inserts[id.index()]
    }

    pub fn statement(&self, id: StmtId) -> Statement {
        self.statements[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &Function<'src> {
        &self.functions[id.index()]
    }

    /// Walks the scope chain from `scope` to the root looking up `name`.
    pub fn fetch(&self, scope: ScopeId, name: &str) -> Option<&Declarable> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let scope = self.scope(id);
            if let Some(declarable) = scope.symbols.get(name) {
                return Some(declarable);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Declares `name` in `scope`, overwriting any shadowed outer
    /// declaration for descendants of that scope.
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: DeclarableKind) {
        let declarable = Declarable {
            identity: name.to_string(),
            c_identity: c_identity(name),
            kind,
        };
        self.scope_mut(scope).symbols.insert(name.to_string(), declarable);
    }
}

/// Maps a source identifier to the identifier used in the generated
/// C++. Everything but `main` gets a trailing underscore so generated
/// names cannot collide with C++ keywords.
pub fn c_identity(name: &str) -> String {
    if name == "main" {
        name.to_string()
    } else {
        format!("{name}_")
    }
}
