use crate::{
    Expression, Identifier, Literal, Operator, Statement, SymbolTable, Type, UnaryOperator, Value,
};
use std::fmt::{self, Display, Formatter};
use tracing::{debug, instrument};

/// A recoverable type error. Checking always continues past one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic(pub String);

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Walks a program in source order, computing the static value of every
/// expression and collecting diagnostics.
#[derive(Debug, Default)]
pub struct TypeChecker {
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, name = "check")]
    pub fn check_program(&mut self, statements: &[Statement]) -> &[Diagnostic] {
        for statement in statements {
            self.check_statement(statement);
        }
        debug!(
            symbols = self.symbols.len(),
            diagnostics = self.diagnostics.len(),
            "type check finished"
        );
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn report(&mut self, message: String) {
        self.diagnostics.push(Diagnostic(message));
    }

    fn report_undeclared(&mut self, identifier: &Identifier) {
        self.report(format!(
            "Undeclared variable {} at {}",
            identifier.name, identifier.position
        ));
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Empty => {}
            Statement::Declaration(typ, identifiers) => {
                for identifier in identifiers {
                    if !self.symbols.declare(&identifier.name, *typ) {
                        self.report(format!("multiple declaration of {}", identifier.name));
                    }
                }
            }
            Statement::Assignment(targets, expression) => {
                let mut value = self.evaluate(expression);
                // Right to left, the way the compiler chains the value.
                for target in targets.iter().rev() {
                    let declared = match self.symbols.lookup(&target.name) {
                        Some(symbol) => symbol.typ,
                        None => {
                            self.report_undeclared(target);
                            continue;
                        }
                    };
                    let actual = value.ty();
                    if declared.accepts(actual) {
                        value = value.coerce_to(declared);
                        self.symbols.assign(&target.name, value.clone());
                    } else {
                        self.report(format!(
                            "Trying to assign {} to {} at {}",
                            actual, declared, target.position
                        ));
                    }
                }
            }
            Statement::Read(identifiers) => {
                for identifier in identifiers {
                    if self.symbols.lookup(&identifier.name).is_none() {
                        self.report_undeclared(identifier);
                    }
                }
            }
            Statement::Write(expressions) => {
                for expression in expressions {
                    self.evaluate(expression);
                }
            }
            Statement::Block(statements) => {
                for statement in statements {
                    self.check_statement(statement);
                }
            }
            Statement::If(condition, consequence, alternative) => {
                self.evaluate(condition);
                self.check_statement(consequence);
                if let Some(alternative) = alternative {
                    self.check_statement(alternative);
                }
            }
            Statement::While(condition, body) => {
                self.evaluate(condition);
                self.check_statement(body);
            }
        }
    }

    fn evaluate(&mut self, expression: &Expression) -> Value {
        match expression {
            Expression::Identifier(identifier) => match self.symbols.lookup(&identifier.name) {
                Some(symbol) => symbol.value.clone(),
                None => {
                    self.report_undeclared(identifier);
                    Value::Int(0)
                }
            },
            Expression::Literal(literal) => literal_value(literal),
            Expression::Prefix(UnaryOperator::Not, operand) => self.evaluate(operand).not(),
            Expression::Prefix(UnaryOperator::Negate, operand) => {
                let value = self.evaluate(operand);
                value.clone().negate().unwrap_or(value)
            }
            Expression::Infix(left, operator, right) => {
                let left = self.evaluate(left);
                let right = self.evaluate(right);
                self.evaluate_infix(left, *operator, right)
            }
        }
    }

    fn evaluate_infix(&mut self, left: Value, operator: Operator, right: Value) -> Value {
        let (left_type, right_type) = (left.ty(), right.ty());
        let defined = match operator {
            _ if operator.is_arithmetic() => {
                left_type != Type::String
                    && right_type != Type::String
                    && (operator != Operator::Modulo
                        || (left_type == Type::Int && right_type == Type::Int))
            }
            Operator::Concat => left_type == Type::String && right_type == Type::String,
            _ => true,
        };
        if !defined {
            self.report(format!(
                "Undefined operation {} for {} and {}",
                operator, left_type, right_type
            ));
        }
        fold_infix(left, operator, right)
    }
}

/// Static result of a binary operation. Operations that would fault at run
/// time fall back to a value of the expected result type.
pub(crate) fn fold_infix(left: Value, operator: Operator, right: Value) -> Value {
    let (left_type, right_type) = (left.ty(), right.ty());
    match operator {
        Operator::Add
        | Operator::Subtract
        | Operator::Multiply
        | Operator::Divide
        | Operator::Modulo => {
            // Keep the operand that is not a string so only one diagnostic
            // comes out of one bad operation.
            if left_type == Type::String || right_type == Type::String {
                return match (left_type, right_type) {
                    (Type::String, Type::String) => Type::Int.default_value(),
                    (Type::String, _) => as_number(right),
                    _ => as_number(left),
                };
            }
            if operator == Operator::Modulo && (left_type != Type::Int || right_type != Type::Int)
            {
                return Value::Int(0);
            }
            let result = match operator {
                Operator::Add => left.add(&right),
                Operator::Subtract => left.sub(&right),
                Operator::Multiply => left.mul(&right),
                Operator::Divide => left.div(&right),
                _ => left.rem(&right),
            };
            // Division by zero or overflow is a runtime matter; keep the type.
            result.unwrap_or_else(|_| {
                if left_type == Type::Int && right_type == Type::Int {
                    Type::Int.default_value()
                } else {
                    Type::Float.default_value()
                }
            })
        }
        Operator::Concat => left
            .concat(&right)
            .unwrap_or_else(|_| Type::String.default_value()),
        Operator::LessThan => left.less_than(&right).unwrap_or(Value::Bool(false)),
        Operator::GreaterThan => left.greater_than(&right).unwrap_or(Value::Bool(false)),
        Operator::Equal => Value::Bool(left.equals(&right)),
        Operator::NotEqual => Value::Bool(!left.equals(&right)),
        Operator::And => left.and(right),
        Operator::Or => left.or(right),
    }
}

fn as_number(value: Value) -> Value {
    match value {
        Value::Bool(v) => Value::Int(v as i64),
        other => other,
    }
}

pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(value) => Value::from(*value),
        Literal::Float(value) => Value::from(*value),
        Literal::String(value) => Value::from(value.as_str()),
        Literal::Bool(value) => Value::from(*value),
    }
}

/// Checks `statements` with a fresh checker. The same program always yields
/// the same diagnostics.
pub fn check(statements: &[Statement]) -> Vec<Diagnostic> {
    let mut checker = TypeChecker::new();
    checker.check_program(statements);
    checker.into_diagnostics()
}
