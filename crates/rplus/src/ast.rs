//! The abstract syntax tree.
//!
//! A pure tree: every child is owned exclusively by its parent, there are
//! no back-pointers and no sharing, and node lifetime is the root's
//! lifetime. This replaces the source's class hierarchy + `dynamic_cast`
//! with one tagged sum type per node family and exhaustive matching at
//! every consumer (the compiler, the pretty-printer, anything else that
//! walks it).
//!
//! Not every variant here is reachable through the parser in `parser.rs` —
//! `VarDecl::Let`, `DoWhile`, `ForIn`, `ForOf`, `Switch`, `Throw`, `Try`,
//! `ClassDecl`, `Labeled`, `Debugger`, `Member`, `ObjectLit`, `Lambda`,
//! `This` and `New` are part of the data model but have no surface syntax
//! in this language's grammar. They stay in the enum for the same reason
//! a language's AST keeps nodes for dialects it doesn't parse yet: so the
//! type is a faithful superset and callers match it exhaustively rather
//! than assuming a closed subset.

/// Every AST node carries its source position for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Pos { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    Float,
    String,
    Bool,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// The operator an `Assign` node carries when it desugars a compound
/// assignment (`x += 1` becomes `Assign{target: x, value: x + 1,
/// compound_op: Some(Add)}` at parse time — see `parser.rs`).
pub type CompoundOp = BinaryOp;

#[derive(Debug, Clone, PartialEq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        kind: LiteralKind,
        text: String,
        pos: Pos,
    },
    Identifier {
        name: String,
        pos: Pos,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Pos,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        prefix: bool,
        pos: Pos,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        pos: Pos,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        pos: Pos,
    },
    Member {
        object: Box<Expr>,
        name: String,
        computed: bool,
        pos: Pos,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        compound_op: Option<CompoundOp>,
        pos: Pos,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        pos: Pos,
    },
    ArrayLit {
        elements: Vec<Expr>,
        pos: Pos,
    },
    ObjectLit {
        props: Vec<Property>,
        pos: Pos,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Stmt>,
        pos: Pos,
    },
    This {
        pos: Pos,
    },
    New {
        ctor: Box<Expr>,
        args: Vec<Expr>,
        pos: Pos,
    },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Literal { pos, .. }
            | Expr::Identifier { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Unary { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Member { pos, .. }
            | Expr::Assign { pos, .. }
            | Expr::Conditional { pos, .. }
            | Expr::ArrayLit { pos, .. }
            | Expr::ObjectLit { pos, .. }
            | Expr::Lambda { pos, .. }
            | Expr::This { pos }
            | Expr::New { pos, .. } => *pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block {
        stmts: Vec<Stmt>,
        pos: Pos,
    },
    ExprStmt {
        expr: Expr,
        pos: Pos,
    },
    VarDecl {
        kind: VarKind,
        declarators: Vec<Declarator>,
        pos: Pos,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        pos: Pos,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        pos: Pos,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
        pos: Pos,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
        pos: Pos,
    },
    ForIn {
        var_name: String,
        object: Expr,
        body: Box<Stmt>,
        pos: Pos,
    },
    ForOf {
        var_name: String,
        iterable: Expr,
        body: Box<Stmt>,
        is_await: bool,
        pos: Pos,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        pos: Pos,
    },
    Break {
        label: Option<String>,
        pos: Pos,
    },
    Continue {
        label: Option<String>,
        pos: Pos,
    },
    Return {
        arg: Option<Expr>,
        pos: Pos,
    },
    Throw {
        arg: Expr,
        pos: Pos,
    },
    Try {
        block: Box<Stmt>,
        catch: Option<(Option<String>, Box<Stmt>)>,
        finally: Option<Box<Stmt>>,
        pos: Pos,
    },
    FunctionDecl {
        name: String,
        params: Vec<String>,
        body: Box<Stmt>,
        is_async: bool,
        is_generator: bool,
        pos: Pos,
    },
    ClassDecl {
        name: String,
        super_name: Option<String>,
        props: Vec<Property>,
        methods: Vec<Stmt>,
        pos: Pos,
    },
    Labeled {
        label: String,
        body: Box<Stmt>,
        pos: Pos,
    },
    Empty {
        pos: Pos,
    },
    Debugger {
        pos: Pos,
    },
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::Block { pos, .. }
            | Stmt::ExprStmt { pos, .. }
            | Stmt::VarDecl { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::DoWhile { pos, .. }
            | Stmt::For { pos, .. }
            | Stmt::ForIn { pos, .. }
            | Stmt::ForOf { pos, .. }
            | Stmt::Switch { pos, .. }
            | Stmt::Break { pos, .. }
            | Stmt::Continue { pos, .. }
            | Stmt::Return { pos, .. }
            | Stmt::Throw { pos, .. }
            | Stmt::Try { pos, .. }
            | Stmt::FunctionDecl { pos, .. }
            | Stmt::ClassDecl { pos, .. }
            | Stmt::Labeled { pos, .. }
            | Stmt::Empty { pos }
            | Stmt::Debugger { pos } => *pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}
