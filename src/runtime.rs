use std::rc::Rc;

use crate::{
    ast::{BlockStmt, Expr, ExprKind, Program, Stmt, StmtKind},
    diagnostics::{AmaranthError, Result},
    environment::{Environment, EnvironmentRef},
    parser, stdlib,
    value::{FunctionValue, ReferenceValue, Value, ValueKind},
};

const COMPARATORS: [&str; 8] = ["<", ">", "<=", ">=", "==", "is", "!=", "is not"];
const STEP_OPERATORS: [&str; 4] = ["+", "-", "*", "/"];

/// Convenience wrapper owning a root environment, used by the REPL and the
/// CLI. The root persists across `eval_source` calls so bindings survive
/// from one line to the next.
pub struct Interpreter {
    env: EnvironmentRef,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn env(&self) -> EnvironmentRef {
        Rc::clone(&self.env)
    }

    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let (program, diagnostics) = parser::parse(source);
        if !diagnostics.is_empty() {
            return Err(AmaranthError::Parse(diagnostics));
        }
        Ok(evaluate(&program, &self.env))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates a program against a root environment. Always yields exactly
/// one value; failures come back as first-class `Error` values.
pub fn evaluate(program: &Program, env: &EnvironmentRef) -> Value {
    let mut result = Value::empty();
    for stmt in &program.statements {
        result = eval_statement(stmt, env);
        match &*result.0 {
            ValueKind::Return(inner) => return inner.clone(),
            ValueKind::Error(_) => return result,
            _ => {}
        }
    }
    result
}

fn eval_statement(stmt: &Stmt, env: &EnvironmentRef) -> Value {
    match &stmt.kind {
        StmtKind::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.borrow_mut().set(name.clone(), value.clone());
            value
        }
        StmtKind::Return { value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            Value::new(ValueKind::Return(value))
        }
        StmtKind::Expr(expr) => eval_expression(expr, env),
    }
}

// Blocks run against the environment they are handed; they do not open a
// scope. Returns and errors stop the sequence and propagate unwrapped.
fn eval_block(block: &BlockStmt, env: &EnvironmentRef) -> Value {
    let mut result = Value::empty();
    for stmt in &block.statements {
        result = eval_statement(stmt, env);
        if matches!(&*result.0, ValueKind::Return(_) | ValueKind::Error(_)) {
            return result;
        }
    }
    result
}

fn eval_expression(expr: &Expr, env: &EnvironmentRef) -> Value {
    match &expr.kind {
        ExprKind::Identifier(name) => eval_identifier(name, env),
        ExprKind::Integer(value) => Value::integer(*value),
        ExprKind::Str(value) => Value::string(value.clone()),
        ExprKind::Boolean(value) => Value::boolean(*value),
        ExprKind::Prefix { op, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix(op, &right)
        }
        ExprKind::Infix { op, left, right } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix(op, &left, &right)
        }
        ExprKind::Conditional {
            condition,
            then_block,
            else_block,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block(then_block, env)
            } else if let Some(block) = else_block {
                eval_block(block, env)
            } else {
                Value::nil()
            }
        }
        ExprKind::Function { params, body } => {
            if body.statements.is_empty() {
                return Value::error("a function requires a non-empty body");
            }
            Value::new(ValueKind::Function(FunctionValue {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            }))
        }
        ExprKind::Invocation { callee, args } => eval_invocation(callee, args, env),
        ExprKind::Assignment { name, value } => eval_assignment(name, value, env),
        ExprKind::Reference(name) => Value::new(ValueKind::Reference(ReferenceValue {
            target: name.clone(),
            env: Rc::clone(env),
        })),
        ExprKind::Pointer(name) => eval_pointer(name, env),
        ExprKind::Comment(_) => Value::empty(),
        ExprKind::ForLoop {
            init,
            condition,
            increment,
            body,
        } => eval_for_loop(init, condition, increment, body, env),
    }
}

fn eval_identifier(name: &str, env: &EnvironmentRef) -> Value {
    match Environment::get(env, name) {
        Some(value) => value,
        None => stdlib::lookup(name)
            .unwrap_or_else(|| Value::error(format!("identifier not found: {name}"))),
    }
}

fn eval_prefix(op: &str, right: &Value) -> Value {
    match op {
        "!" | "not" => eval_bang(right),
        "-" => match &*right.0 {
            ValueKind::Integer(value) => Value::integer(value.wrapping_neg()),
            _ => Value::error(format!("unknown operator: -{}", right.type_name())),
        },
        _ => Value::error(format!("unknown operator: {op}{}", right.type_name())),
    }
}

fn eval_bang(value: &Value) -> Value {
    match &*value.0 {
        ValueKind::Boolean(value) => Value::boolean(!value),
        ValueKind::Nil => Value::boolean(true),
        _ => Value::boolean(false),
    }
}

fn eval_infix(op: &str, left: &Value, right: &Value) -> Value {
    if let (ValueKind::Integer(a), ValueKind::Integer(b)) = (&*left.0, &*right.0) {
        return eval_integer_infix(op, *a, *b);
    }
    if let (ValueKind::Str(a), ValueKind::Str(b)) = (&*left.0, &*right.0) {
        if op == "+" {
            return Value::string(format!("{a}{b}"));
        }
    }
    match op {
        // Non-integer equality is identity of the resolved storage, so the
        // shared true/false/nil singletons compare equal and everything
        // else compares by the cell it lives in.
        "==" | "is" => Value::boolean(left.same_identity(right)),
        "!=" | "is not" => Value::boolean(!left.same_identity(right)),
        _ if left.type_name() != right.type_name() => Value::error(format!(
            "type mismatch: {} {op} {}",
            left.type_name(),
            right.type_name()
        )),
        _ => Value::error(format!(
            "unknown operator: {} {op} {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

fn eval_integer_infix(op: &str, a: i64, b: i64) -> Value {
    match op {
        "+" => Value::integer(a.wrapping_add(b)),
        "-" => Value::integer(a.wrapping_sub(b)),
        "*" => Value::integer(a.wrapping_mul(b)),
        "/" => {
            if b == 0 {
                Value::error("division by zero")
            } else {
                Value::integer(a.wrapping_div(b))
            }
        }
        "<" => Value::boolean(a < b),
        ">" => Value::boolean(a > b),
        "<=" => Value::boolean(a <= b),
        ">=" => Value::boolean(a >= b),
        "==" | "is" => Value::boolean(a == b),
        "!=" | "is not" => Value::boolean(a != b),
        _ => Value::error(format!("unknown operator: INTEGER {op} INTEGER")),
    }
}

fn eval_invocation(callee: &Expr, args: &[Expr], env: &EnvironmentRef) -> Value {
    let callee = eval_expression(callee, env);
    if callee.is_error() {
        return callee;
    }
    // A reference in call position resolves one level to its target.
    let callee = match &*callee.0 {
        ValueKind::Reference(reference) => {
            match Environment::get(&reference.env, &reference.target) {
                Some(value) => value,
                None => {
                    return Value::error(format!(
                        "reference target `{}` no longer exists",
                        reference.target
                    ));
                }
            }
        }
        _ => callee.clone(),
    };

    let mut evaluated = Vec::with_capacity(args.len());
    for arg in args {
        let value = eval_expression(arg, env);
        if value.is_error() {
            return value;
        }
        evaluated.push(value);
    }

    apply_function(&callee, &evaluated)
}

/// Invokes a callable with already-evaluated arguments. A user function
/// runs in a fresh scope chained to its captured environment, which is
/// what makes closures close over their definition site rather than the
/// caller.
pub fn apply_function(callee: &Value, args: &[Value]) -> Value {
    match &*callee.0 {
        ValueKind::StandardFunction(function) => (function.callback)(args),
        ValueKind::Function(function) => {
            if args.len() != function.params.len() {
                return Value::error(format!(
                    "wrong number of arguments: expected {}, received {}",
                    function.params.len(),
                    args.len()
                ));
            }
            let scope = Environment::with_outer(Rc::clone(&function.env));
            for (param, value) in function.params.iter().zip(args) {
                scope.borrow_mut().set(param.clone(), value.clone());
            }
            let result = eval_block(&function.body, &scope);
            match &*result.0 {
                ValueKind::Return(inner) => inner.clone(),
                _ => result.clone(),
            }
        }
        _ => Value::error(format!("not a function: {}", callee.type_name())),
    }
}

fn eval_assignment(name: &str, value: &Expr, env: &EnvironmentRef) -> Value {
    let value = eval_expression(value, env);
    if value.is_error() {
        return value;
    }
    // Assigning to a name bound to a reference mutates the referred cell
    // through the reference's captured environment instead of rebinding.
    if let Some(bound) = Environment::get(env, name) {
        if let ValueKind::Reference(reference) = &*bound.0 {
            reference
                .env
                .borrow_mut()
                .set(reference.target.clone(), value.clone());
            return value;
        }
    }
    env.borrow_mut().set(name.to_string(), value.clone());
    value
}

fn eval_pointer(name: &str, env: &EnvironmentRef) -> Value {
    let value = eval_identifier(name, env);
    if value.is_error() {
        return value;
    }
    match &*value.0 {
        ValueKind::Reference(reference) => {
            match Environment::get(&reference.env, &reference.target) {
                Some(target) => target,
                None => Value::error(format!(
                    "reference target `{}` no longer exists",
                    reference.target
                )),
            }
        }
        _ => Value::error(format!("cannot dereference {}", value.type_name())),
    }
}

// Closed set of shape failures a for loop can produce. Each maps to one
// failure site in the state machine below.
enum ForLoopFault {
    BindingShape,
    ConditionShape,
    IncrementShape,
    MissingBody,
}

impl ForLoopFault {
    fn into_error(self) -> Value {
        Value::error(match self {
            ForLoopFault::BindingShape => "for loop binding must resolve to an INTEGER",
            ForLoopFault::ConditionShape => {
                "for loop condition must compare an identifier against an integer literal"
            }
            ForLoopFault::IncrementShape => {
                "for loop increment must combine an identifier with an integer literal"
            }
            ForLoopFault::MissingBody => "for loop requires a non-empty body",
        })
    }
}

fn clause_shape<'a>(expr: &'a Expr, allowed: &[&str]) -> Option<(&'a str, i64)> {
    if let ExprKind::Infix { op, left, right } = &expr.kind {
        if let (ExprKind::Identifier(_), ExprKind::Integer(literal)) = (&left.kind, &right.kind) {
            if allowed.contains(&op.as_str()) {
                return Some((op.as_str(), *literal));
            }
        }
    }
    None
}

// The loop variable may be bound to a reference, in which case every read
// and write goes through it to the referred cell.
fn read_loop_value(name: &str, env: &EnvironmentRef) -> std::result::Result<i64, Value> {
    let Some(value) = Environment::get(env, name) else {
        return Err(Value::error(format!("identifier not found: {name}")));
    };
    let resolved = match &*value.0 {
        ValueKind::Reference(reference) => {
            match Environment::get(&reference.env, &reference.target) {
                Some(target) => target,
                None => {
                    return Err(Value::error(format!(
                        "reference target `{}` no longer exists",
                        reference.target
                    )));
                }
            }
        }
        _ => value.clone(),
    };
    match &*resolved.0 {
        ValueKind::Integer(value) => Ok(*value),
        _ => Err(ForLoopFault::BindingShape.into_error()),
    }
}

fn write_loop_value(name: &str, env: &EnvironmentRef, value: i64) {
    if let Some(bound) = Environment::get(env, name) {
        if let ValueKind::Reference(reference) = &*bound.0 {
            reference
                .env
                .borrow_mut()
                .set(reference.target.clone(), Value::integer(value));
            return;
        }
    }
    env.borrow_mut().set(name.to_string(), Value::integer(value));
}

// States: Init → CheckCondition → RunBody → Advance → CheckCondition …
// → Done (binding removed, yields Empty) or Failed (descriptive error,
// no iteration performed on a shape mismatch).
fn eval_for_loop(
    init: &Stmt,
    condition: &Expr,
    increment: &Expr,
    body: &BlockStmt,
    env: &EnvironmentRef,
) -> Value {
    // Init
    let StmtKind::Let { name, .. } = &init.kind else {
        return ForLoopFault::BindingShape.into_error();
    };
    let bound = eval_statement(init, env);
    if bound.is_error() {
        return bound;
    }
    if let Err(fault) = read_loop_value(name, env) {
        return fault;
    }
    if body.statements.is_empty() {
        return ForLoopFault::MissingBody.into_error();
    }
    let Some((step_op, step)) = clause_shape(increment, &STEP_OPERATORS) else {
        return ForLoopFault::IncrementShape.into_error();
    };
    let Some((comparator, limit)) = clause_shape(condition, &COMPARATORS) else {
        return ForLoopFault::ConditionShape.into_error();
    };

    loop {
        // CheckCondition
        let current = match read_loop_value(name, env) {
            Ok(value) => value,
            Err(fault) => return fault,
        };
        if !eval_integer_infix(comparator, current, limit).is_truthy() {
            break;
        }

        // RunBody: the body runs against the enclosing environment, with
        // no per-iteration scope.
        for stmt in &body.statements {
            let result = eval_statement(stmt, env);
            if matches!(&*result.0, ValueKind::Return(_) | ValueKind::Error(_)) {
                return result;
            }
        }

        // Advance
        let current = match read_loop_value(name, env) {
            Ok(value) => value,
            Err(fault) => return fault,
        };
        let next = eval_integer_infix(step_op, current, step);
        let stepped = match &*next.0 {
            ValueKind::Integer(value) => *value,
            _ => return next,
        };
        write_loop_value(name, env, stepped);
    }

    // Done
    env.borrow_mut().remove(name);
    Value::empty()
}
