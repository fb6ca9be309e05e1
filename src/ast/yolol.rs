use crate::lexer::{Position, Token};

use super::Spanned;

/// A whole YOLOL program: an ordered sequence of lines.
///
/// The parser accepts any number of lines; only the NOLOL converter (and,
/// transitively, the packer) enforces the 20-line budget that real YOLOL
/// hardware imposes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub lines: Vec<Line>,
    /// Comments collected while lexing, kept out-of-band so the printer can
    /// reproduce them on a round trip.
    pub comments: Vec<Token>,
}

impl Spanned for Program {
    fn start(&self) -> Position {
        self.lines
            .first()
            .map(Spanned::start)
            .unwrap_or_default()
    }

    fn end(&self) -> Position {
        self.lines.last().map(Spanned::end).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub position: Position,
    pub statements: Vec<Statement>,
}

impl Spanned for Line {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.statements
            .last()
            .map(Spanned::end)
            .unwrap_or_else(|| self.position.clone())
    }
}

/// The compound-assignment operators all desugar to `var = var <op> expr` at
/// runtime (see [`crate::value::run_binary_operation`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    /// The binary operator this compound assignment desugars to, or `None`
    /// for a plain `=`.
    pub fn as_binary_op(self) -> Option<&'static str> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some("+"),
            AssignOp::SubAssign => Some("-"),
            AssignOp::MulAssign => Some("*"),
            AssignOp::DivAssign => Some("/"),
            AssignOp::ModAssign => Some("%"),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
        }
    }

    pub fn from_symbol(sym: &str) -> Option<Self> {
        Some(match sym {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::AddAssign,
            "-=" => AssignOp::SubAssign,
            "*=" => AssignOp::MulAssign,
            "/=" => AssignOp::DivAssign,
            "%=" => AssignOp::ModAssign,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrePost {
    Pre,
    Post,
    /// Plain dereference, no `++`/`--` attached.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub position: Position,
    pub variable: String,
    pub operator: AssignOp,
    pub expr: Expression,
}

impl Spanned for Assignment {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.expr.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub position: Position,
    pub condition: Expression,
    pub then_block: Vec<Statement>,
    pub else_block: Option<Vec<Statement>>,
}

impl Spanned for IfStatement {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        let block = self.else_block.as_ref().unwrap_or(&self.then_block);
        block
            .last()
            .map(|s| s.end().add(3))
            .unwrap_or_else(|| self.position.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoToStatement {
    pub position: Position,
    pub line: i64,
}

impl Spanned for GoToStatement {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.position.add(self.line.to_string().len() + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dereference {
    pub position: Position,
    pub variable: String,
    pub operator: String,
    pub pre_post: PrePost,
}

impl Spanned for Dereference {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.position
            .add(self.variable.chars().count() + self.operator.chars().count())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment(Assignment),
    If(IfStatement),
    GoTo(GoToStatement),
    Dereference(Dereference),
}

impl Spanned for Statement {
    fn start(&self) -> Position {
        match self {
            Statement::Assignment(a) => a.start(),
            Statement::If(i) => i.start(),
            Statement::GoTo(g) => g.start(),
            Statement::Dereference(d) => d.start(),
        }
    }

    fn end(&self) -> Position {
        match self {
            Statement::Assignment(a) => a.end(),
            Statement::If(i) => i.end(),
            Statement::GoTo(g) => g.end(),
            Statement::Dereference(d) => d.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringConstant {
    pub position: Position,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberConstant {
    pub position: Position,
    /// Kept as source text and parsed lazily by the VM/printer, matching the
    /// original AST (avoids picking a premature numeric representation).
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperation {
    pub position: Position,
    pub op: UnaryOp,
    pub exp: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub op: String,
    pub l: Box<Expression>,
    pub r: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub function: String,
    pub arg: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    StringConstant(StringConstant),
    NumberConstant(NumberConstant),
    Dereference(Dereference),
    UnaryOperation(UnaryOperation),
    BinaryOperation(BinaryOperation),
    FuncCall(FuncCall),
}

impl Spanned for Expression {
    fn start(&self) -> Position {
        match self {
            Expression::StringConstant(s) => s.position.clone(),
            Expression::NumberConstant(n) => n.position.clone(),
            Expression::Dereference(d) => d.start(),
            Expression::UnaryOperation(u) => u.position.clone(),
            Expression::BinaryOperation(b) => b.l.start(),
            Expression::FuncCall(f) => f.arg.start().sub(f.function.chars().count() + 1),
        }
    }

    fn end(&self) -> Position {
        match self {
            Expression::StringConstant(s) => s.position.add(s.value.chars().count() + 2),
            Expression::NumberConstant(n) => n.position.add(n.value.chars().count()),
            Expression::Dereference(d) => d.end(),
            Expression::UnaryOperation(u) => u.exp.end(),
            Expression::BinaryOperation(b) => b.r.end(),
            Expression::FuncCall(f) => f.arg.end().add(1),
        }
    }
}
