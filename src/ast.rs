use std::fmt;

use crate::diagnostics::SourceSpan;

/// Root of a parsed source text: an ordered statement list. The tree is
/// immutable once built and may be evaluated any number of times.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let { name: String, value: Expr },
    Return { value: Expr },
    Expr(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Let { name, value } => write!(f, "let {name} = {value};"),
            StmtKind::Return { value } => write!(f, "return {value};"),
            StmtKind::Expr(value) => write!(f, "{value}"),
        }
    }
}

/// A braced statement sequence. Blocks do not open a scope of their own;
/// the evaluator runs them against the environment it was handed.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
    pub span: SourceSpan,
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Identifier(String),
    Integer(i64),
    Str(String),
    Boolean(bool),
    Prefix {
        op: String,
        right: Box<Expr>,
    },
    Infix {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_block: BlockStmt,
        else_block: Option<BlockStmt>,
    },
    Function {
        params: Vec<String>,
        body: BlockStmt,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Assignment {
        name: String,
        value: Box<Expr>,
    },
    Reference(String),
    Pointer(String),
    Comment(String),
    ForLoop {
        init: Box<Stmt>,
        condition: Box<Expr>,
        increment: Box<Expr>,
        body: BlockStmt,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Identifier(name) => f.write_str(name),
            ExprKind::Integer(value) => write!(f, "{value}"),
            ExprKind::Str(value) => f.write_str(value),
            ExprKind::Boolean(value) => write!(f, "{value}"),
            ExprKind::Prefix { op, right } => {
                // Word operators need the space to stay re-parseable.
                if op.chars().all(|ch| ch.is_ascii_alphabetic()) {
                    write!(f, "({op} {right})")
                } else {
                    write!(f, "({op}{right})")
                }
            }
            ExprKind::Infix { op, left, right } => write!(f, "({left} {op} {right})"),
            ExprKind::Conditional {
                condition,
                then_block,
                else_block,
            } => {
                write!(f, "if {condition} {then_block}")?;
                if let Some(block) = else_block {
                    write!(f, " else {block}")?;
                }
                Ok(())
            }
            ExprKind::Function { params, body } => {
                write!(f, "fn({}) {body}", params.join(", "))
            }
            ExprKind::Invocation { callee, args } => {
                let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{callee}({})", rendered.join(", "))
            }
            ExprKind::Assignment { name, value } => write!(f, "{name} = {value}"),
            ExprKind::Reference(name) => write!(f, "&{name}"),
            ExprKind::Pointer(name) => write!(f, "(*{name})"),
            ExprKind::Comment(_) => Ok(()),
            ExprKind::ForLoop {
                init,
                condition,
                increment,
                body,
            } => write!(f, "for ({init} {condition}; {increment}) {body}"),
        }
    }
}
