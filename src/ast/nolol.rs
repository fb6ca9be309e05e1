use crate::lexer::Position;

use super::yolol::{Expression, Statement};
use super::Spanned;

/// A whole NOLOL program: an ordered sequence of top-level elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub elements: Vec<Element>,
}

impl Spanned for Program {
    fn start(&self) -> Position {
        self.elements
            .first()
            .map(Spanned::start)
            .unwrap_or_default()
    }

    fn end(&self) -> Position {
        self.elements
            .last()
            .map(Spanned::end)
            .unwrap_or_default()
    }
}

/// A top-level (or nested-block) construct of a NOLOL program.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Statement(StatementLine),
    ConstDecl(ConstDeclaration),
    If(MultilineIf),
    GoToLabel(GoToLabelStatement),
    While(WhileLoop),
    Wait(WaitDirective),
    Include(IncludeDirective),
}

impl Spanned for Element {
    fn start(&self) -> Position {
        match self {
            Element::Statement(s) => s.start(),
            Element::ConstDecl(c) => c.start(),
            Element::If(i) => i.start(),
            Element::GoToLabel(g) => g.start(),
            Element::While(w) => w.start(),
            Element::Wait(w) => w.start(),
            Element::Include(i) => i.start(),
        }
    }

    fn end(&self) -> Position {
        match self {
            Element::Statement(s) => s.end(),
            Element::ConstDecl(c) => c.end(),
            Element::If(i) => i.end(),
            Element::GoToLabel(g) => g.end(),
            Element::While(w) => w.end(),
            Element::Wait(w) => w.end(),
            Element::Include(i) => i.end(),
        }
    }
}

/// A line consisting of plain yolol-statements, as it appears in NOLOL source
/// (before labels/consts are resolved and the line is merged by the packer).
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    pub position: Position,
    pub statements: Vec<Statement>,
    /// Set when the line carries a `begin-of-line` marker: the packer must
    /// not prepend any other line's statements to it.
    pub has_bol: bool,
    /// Set when the line carries an `end-of-line` marker: the packer must
    /// not append any other line's statements to it.
    pub has_eol: bool,
    pub label: String,
    pub comment: String,
}

impl Spanned for StatementLine {
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

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDeclaration {
    pub position: Position,
    pub name: String,
    pub display_name: String,
    pub value: Expression,
}

impl Spanned for ConstDeclaration {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.value.end()
    }
}

/// A group of elements, e.g. the body of an `if` branch or a `while` loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub elements: Vec<Element>,
}

impl Spanned for Block {
    fn start(&self) -> Position {
        self.elements
            .first()
            .map(Spanned::start)
            .unwrap_or_default()
    }

    fn end(&self) -> Position {
        self.elements
            .last()
            .map(Spanned::end)
            .unwrap_or_default()
    }
}

/// A NOLOL multiline `if`/`else if`/`else`. `conditions[i]` guards
/// `blocks[i]`; an absent `else_block` means no trailing `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultilineIf {
    pub position: Position,
    pub conditions: Vec<Expression>,
    pub blocks: Vec<Block>,
    pub else_block: Option<Block>,
}

impl Spanned for MultilineIf {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        match &self.else_block {
            Some(b) => b.end(),
            None => self
                .blocks
                .last()
                .map(Spanned::end)
                .unwrap_or_else(|| self.position.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoToLabelStatement {
    pub position: Position,
    pub label: String,
}

impl Spanned for GoToLabelStatement {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.position.add(self.label.chars().count() + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub position: Position,
    pub condition: Expression,
    pub block: Block,
}

impl Spanned for WhileLoop {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.block.end()
    }
}

/// `wait <condition>`: blocks the line pointer on this statement until the
/// condition turns false, without spinning through a goto loop by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitDirective {
    pub position: Position,
    pub condition: Expression,
}

impl Spanned for WaitDirective {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.condition.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    pub position: Position,
    pub file: String,
}

impl Spanned for IncludeDirective {
    fn start(&self) -> Position {
        self.position.clone()
    }

    fn end(&self) -> Position {
        self.position.add(self.file.chars().count() + 3 + "include".len())
    }
}
