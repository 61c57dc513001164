use crate::{
    typechecker::{fold_infix, literal_value},
    Expression, Fault, FaultResult, Identifier, Literal, Operator, Statement, SymbolTable, Type,
    UnaryOperator, Value,
};
use anyhow::{bail, Result};
use std::{fmt, slice::Iter, str::FromStr};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Uminus,
    Concat,
    And,
    Or,
    Gt,
    Lt,
    Eq,
    Not,
    Itof,
    Push(Value),
    Pop,
    Load(String),
    Save(String),
    Label(usize),
    Jmp(usize),
    Fjmp(usize),
    Print(usize),
    Read(Type),
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mul => "mul",
            Instruction::Div => "div",
            Instruction::Mod => "mod",
            Instruction::Uminus => "uminus",
            Instruction::Concat => "concat",
            Instruction::And => "and",
            Instruction::Or => "or",
            Instruction::Gt => "gt",
            Instruction::Lt => "lt",
            Instruction::Eq => "eq",
            Instruction::Not => "not",
            Instruction::Itof => "itof",
            Instruction::Push(_) => "push",
            Instruction::Pop => "pop",
            Instruction::Load(_) => "load",
            Instruction::Save(_) => "save",
            Instruction::Label(_) => "label",
            Instruction::Jmp(_) => "jmp",
            Instruction::Fjmp(_) => "fjmp",
            Instruction::Print(_) => "print",
            Instruction::Read(_) => "read",
        }
    }

    fn has_operand(&self) -> bool {
        matches!(
            self,
            Instruction::Push(_)
                | Instruction::Load(_)
                | Instruction::Save(_)
                | Instruction::Label(_)
                | Instruction::Jmp(_)
                | Instruction::Fjmp(_)
                | Instruction::Print(_)
                | Instruction::Read(_)
        )
    }

    /// Decodes one line of bytecode text. `line` is only used for errors.
    pub fn parse(text: &str, line: usize) -> FaultResult<Self> {
        let (mnemonic, operand) = match text.split_once(' ') {
            Some((mnemonic, operand)) => (mnemonic, Some(operand)),
            None => (text, None),
        };
        let malformed = |reason: &str| Fault::MalformedInstruction {
            line,
            text: text.to_string(),
            reason: reason.to_string(),
        };
        let required = || operand.ok_or_else(|| malformed("missing operand"));
        let number = |operand: &str| {
            operand
                .parse::<usize>()
                .map_err(|_| malformed("expected a non-negative integer"))
        };

        let instruction = match mnemonic {
            "add" => Instruction::Add,
            "sub" => Instruction::Sub,
            "mul" => Instruction::Mul,
            "div" => Instruction::Div,
            "mod" => Instruction::Mod,
            "uminus" => Instruction::Uminus,
            "concat" => Instruction::Concat,
            "and" => Instruction::And,
            "or" => Instruction::Or,
            "gt" => Instruction::Gt,
            "lt" => Instruction::Lt,
            "eq" => Instruction::Eq,
            "not" => Instruction::Not,
            "itof" => Instruction::Itof,
            "pop" => Instruction::Pop,
            "push" => {
                let (tag, literal) = required()?
                    .split_once(' ')
                    .ok_or_else(|| malformed("expected a type tag and a literal"))?;
                let typ =
                    Type::from_tag(tag).ok_or_else(|| Fault::UnknownTypeTag(tag.to_string()))?;
                let value =
                    parse_literal(typ, literal).ok_or_else(|| malformed("invalid literal"))?;
                Instruction::Push(value)
            }
            "load" => Instruction::Load(required()?.to_string()),
            "save" => Instruction::Save(required()?.to_string()),
            "label" => Instruction::Label(number(required()?)?),
            "jmp" => Instruction::Jmp(number(required()?)?),
            "fjmp" => Instruction::Fjmp(number(required()?)?),
            "print" => Instruction::Print(number(required()?)?),
            "read" => {
                let tag = required()?;
                Instruction::Read(
                    Type::from_tag(tag).ok_or_else(|| Fault::UnknownTypeTag(tag.to_string()))?,
                )
            }
            _ => {
                return Err(Fault::UnknownOpcode {
                    line,
                    mnemonic: mnemonic.to_string(),
                })
            }
        };

        if operand.is_some() && !instruction.has_operand() {
            return Err(malformed("unexpected operand"));
        }
        Ok(instruction)
    }
}

fn parse_literal(typ: Type, literal: &str) -> Option<Value> {
    match typ {
        Type::Int => literal.parse::<i64>().ok().map(Value::Int),
        Type::Float => literal.parse::<f64>().ok().map(Value::Float),
        Type::String => literal
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .map(|contents| Value::Str(contents.to_string())),
        Type::Bool => match literal {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Push(value) => {
                write!(f, "push {} {}", value.ty().tag(), value.literal())
            }
            Instruction::Load(name) | Instruction::Save(name) => {
                write!(f, "{} {}", self.mnemonic(), name)
            }
            Instruction::Label(id)
            | Instruction::Jmp(id)
            | Instruction::Fjmp(id)
            | Instruction::Print(id) => write!(f, "{} {}", self.mnemonic(), id),
            Instruction::Read(typ) => write!(f, "read {}", typ.tag()),
            _ => write!(f, "{}", self.mnemonic()),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Bytecode {
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    /// Listing with instruction indices, the targets labels resolve to.
    pub fn disassemble(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(index, instruction)| format!("{:0>4} {}", index, instruction))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

/// One instruction per line, opcode and operand separated by a space.
impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instruction in self.instructions.iter() {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

impl FromStr for Bytecode {
    type Err = Fault;

    fn from_str(text: &str) -> FaultResult<Self> {
        let instructions = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line_number, line)| Instruction::parse(line, line_number))
            .collect::<FaultResult<Vec<_>>>()?;
        Ok(Self { instructions })
    }
}

pub struct Compiler<'a> {
    pub bytecode: Bytecode,
    pub statements: Iter<'a, Statement>,
    symbols: SymbolTable,
    label_counter: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(statements: &'a [Statement]) -> Self {
        Self {
            bytecode: Bytecode::default(),
            statements: statements.iter(),
            symbols: SymbolTable::new(),
            label_counter: 0,
        }
    }

    /// Expects a program the type checker accepted.
    #[instrument(skip_all, name = "compile")]
    pub fn compile(&mut self) -> Result<Bytecode> {
        while let Some(statement) = self.statements.next() {
            self.compile_statement(statement)?;
        }
        debug!(
            instructions = self.bytecode.instructions.len(),
            labels = self.label_counter,
            "compilation finished"
        );
        Ok(std::mem::take(&mut self.bytecode))
    }

    fn emit(&mut self, instruction: Instruction) {
        self.bytecode.instructions.push(instruction);
    }

    fn position(&self) -> usize {
        self.bytecode.instructions.len()
    }

    fn next_label(&mut self) -> usize {
        let label = self.label_counter;
        self.label_counter += 1;
        label
    }

    fn lookup(&self, identifier: &Identifier) -> Result<(Type, Value)> {
        match self.symbols.lookup(&identifier.name) {
            Some(symbol) => Ok((symbol.typ, symbol.value.clone())),
            None => bail!(
                "Undeclared variable {} at {}",
                identifier.name,
                identifier.position
            ),
        }
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Empty => {}
            Statement::Declaration(typ, identifiers) => {
                for identifier in identifiers {
                    self.symbols.declare(&identifier.name, *typ);
                    let (typ, _) = self.lookup(identifier)?;
                    self.emit(Instruction::Push(typ.default_value()));
                    self.emit(Instruction::Save(identifier.name.to_string()));
                }
            }
            Statement::Assignment(targets, expression) => {
                let mut value = self.compile_expression(expression)?;
                for target in targets.iter().rev() {
                    let (typ, _) = self.lookup(target)?;
                    if typ == Type::Float && value.ty() == Type::Int {
                        self.emit(Instruction::Itof);
                    }
                    value = value.coerce_to(typ);
                    self.symbols.assign(&target.name, value.clone());
                    self.emit(Instruction::Save(target.name.to_string()));
                    self.emit(Instruction::Load(target.name.to_string()));
                }
                self.emit(Instruction::Pop);
            }
            Statement::Read(identifiers) => {
                for identifier in identifiers {
                    let (typ, _) = self.lookup(identifier)?;
                    self.emit(Instruction::Read(typ));
                    self.emit(Instruction::Save(identifier.name.to_string()));
                }
            }
            Statement::Write(expressions) => {
                for expression in expressions {
                    self.compile_expression(expression)?;
                }
                self.emit(Instruction::Print(expressions.len()));
            }
            Statement::Block(statements) => {
                for statement in statements {
                    self.compile_statement(statement)?;
                }
            }
            Statement::If(condition, consequence, alternative) => {
                self.compile_expression(condition)?;
                let else_label = self.next_label();
                self.emit(Instruction::Fjmp(else_label));
                self.compile_statement(consequence)?;
                let end_label = self.next_label();
                self.emit(Instruction::Jmp(end_label));
                self.emit(Instruction::Label(else_label));
                if let Some(alternative) = alternative {
                    self.compile_statement(alternative)?;
                }
                self.emit(Instruction::Label(end_label));
            }
            Statement::While(condition, body) => {
                let start_label = self.next_label();
                self.emit(Instruction::Label(start_label));
                self.compile_expression(condition)?;
                let end_label = self.next_label();
                self.emit(Instruction::Fjmp(end_label));
                self.compile_statement(body)?;
                self.emit(Instruction::Jmp(start_label));
                self.emit(Instruction::Label(end_label));
            }
        }
        Ok(())
    }

    /// Emits code leaving one value on the stack and returns its static value.
    fn compile_expression(&mut self, expression: &Expression) -> Result<Value> {
        match expression {
            Expression::Identifier(identifier) => {
                let (_, value) = self.lookup(identifier)?;
                self.emit(Instruction::Load(identifier.name.to_string()));
                Ok(value)
            }
            Expression::Literal(literal) => {
                self.compile_literal(literal);
                Ok(literal_value(literal))
            }
            Expression::Prefix(UnaryOperator::Not, operand) => {
                let value = self.compile_expression(operand)?;
                self.emit(Instruction::Not);
                Ok(value.not())
            }
            Expression::Prefix(UnaryOperator::Negate, operand) => {
                let value = self.compile_expression(operand)?;
                self.emit(Instruction::Uminus);
                Ok(value.clone().negate().unwrap_or(value))
            }
            Expression::Infix(left, operator, right) => {
                self.compile_infix(left, *operator, right)
            }
        }
    }

    // Negative numbers are pushed as their magnitude followed by `uminus`.
    fn compile_literal(&mut self, literal: &Literal) {
        let (magnitude, negative) = match literal {
            Literal::Integer(value) if *value < 0 => match value.checked_neg() {
                Some(magnitude) => (Value::Int(magnitude), true),
                None => (Value::Int(*value), false),
            },
            Literal::Float(value) if *value < 0.0 => (Value::Float(-value), true),
            _ => (literal_value(literal), false),
        };
        self.emit(Instruction::Push(magnitude));
        if negative {
            self.emit(Instruction::Uminus);
        }
    }

    fn compile_infix(
        &mut self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
    ) -> Result<Value> {
        let left_value = self.compile_expression(left)?;
        let left_end = self.position();
        let right_value = self.compile_expression(right)?;
        let (left_type, right_type) = (left_value.ty(), right_value.ty());

        let widen_right = left_type == Type::Float && right_type == Type::Int;
        let widen_left = left_type == Type::Int && right_type == Type::Float;

        match operator {
            Operator::Add
            | Operator::Subtract
            | Operator::Multiply
            | Operator::Divide
            | Operator::Modulo => {
                if widen_right {
                    self.emit(Instruction::Itof);
                }
                self.emit(match operator {
                    Operator::Add => Instruction::Add,
                    Operator::Subtract => Instruction::Sub,
                    Operator::Multiply => Instruction::Mul,
                    Operator::Divide => Instruction::Div,
                    _ => Instruction::Mod,
                });
            }
            Operator::LessThan | Operator::GreaterThan | Operator::Equal | Operator::NotEqual => {
                if widen_left {
                    self.bytecode
                        .instructions
                        .insert(left_end, Instruction::Itof);
                }
                if widen_right {
                    self.emit(Instruction::Itof);
                }
                match operator {
                    Operator::LessThan => self.emit(Instruction::Lt),
                    Operator::GreaterThan => self.emit(Instruction::Gt),
                    Operator::Equal => self.emit(Instruction::Eq),
                    _ => {
                        self.emit(Instruction::Eq);
                        self.emit(Instruction::Not);
                    }
                }
            }
            Operator::Concat => self.emit(Instruction::Concat),
            Operator::And => self.emit(Instruction::And),
            Operator::Or => self.emit(Instruction::Or),
        }

        Ok(fold_infix(left_value, operator, right_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lexer, Parser};
    use std::collections::HashSet;

    fn compile(input: &str) -> Result<Bytecode> {
        let mut lexer = Lexer::new(input);
        let lexemes = lexer.tokenize()?;

        let mut parser = Parser::new(&lexemes);
        let program = parser.parse()?;

        let mut compiler = Compiler::new(&program);
        compiler.compile()
    }

    fn listing(lines: &[&str]) -> String {
        lines.iter().map(|line| format!("{}\n", line)).collect()
    }

    #[test]
    fn test_compiler() -> Result<()> {
        let tests = [
            (
                "decl int x; x = 2 + 3; write x;",
                vec![
                    "push I 0", "save x", "push I 2", "push I 3", "add", "save x", "load x",
                    "pop", "load x", "print 1",
                ],
            ),
            (
                "decl float x; x = 3;",
                vec!["push F 0.0", "save x", "push I 3", "itof", "save x", "load x", "pop"],
            ),
            ("write -5, -2.5;", vec!["push I 5", "uminus", "push F 2.5", "uminus", "print 2"]),
            (
                "int x; write -x;",
                vec!["push I 0", "save x", "load x", "uminus", "print 1"],
            ),
            (
                "write \"a\", 1, true;",
                vec!["push S \"a\"", "push I 1", "push B true", "print 3"],
            ),
            (
                "write \"a\" . \"b\";",
                vec!["push S \"a\"", "push S \"b\"", "concat", "print 1"],
            ),
            (
                "write 1 != 2;",
                vec!["push I 1", "push I 2", "eq", "not", "print 1"],
            ),
            (
                "write true and not false or false;",
                vec![
                    "push B true", "push B false", "not", "and", "push B false", "or", "print 1",
                ],
            ),
            (
                "write 7 / 2, 7 % 2, 7 - 2, 7 * 2;",
                vec![
                    "push I 7", "push I 2", "div", "push I 7", "push I 2", "mod", "push I 7",
                    "push I 2", "sub", "push I 7", "push I 2", "mul", "print 4",
                ],
            ),
            (
                "int a; string s; read a, s;",
                vec![
                    "push I 0", "save a", "push S \"\"", "save s", "read I", "save a", "read S",
                    "save s",
                ],
            ),
        ];

        for (input, expected) in tests.iter() {
            let bytecode = compile(input)?;
            assert_eq!(bytecode.to_string(), listing(expected), "{}", input);
        }

        Ok(())
    }

    #[test]
    fn test_declaration_defaults() -> Result<()> {
        let bytecode = compile("int i; float f; string s; bool b;")?;
        let pushed: Vec<String> = bytecode
            .instructions
            .iter()
            .filter(|instruction| matches!(instruction, Instruction::Push(_)))
            .map(|instruction| instruction.to_string())
            .collect();
        assert_eq!(pushed, vec!["push I 0", "push F 0.0", "push S \"\"", "push B false"]);
        Ok(())
    }

    #[test]
    fn test_arithmetic_promotion() -> Result<()> {
        let tests = [
            ("float f; write f * 2;", vec!["load f", "push I 2", "itof", "mul"]),
            ("float f; write f - 2;", vec!["load f", "push I 2", "itof", "sub"]),
            ("write 2.5 + 1;", vec!["push F 2.5", "push I 1", "itof", "add"]),
            ("write 1 + 2.5;", vec!["push I 1", "push F 2.5", "add"]),
            ("write 1 + 2;", vec!["push I 1", "push I 2", "add"]),
        ];
        for (input, expected) in tests.iter() {
            let bytecode = compile(input)?;
            let found: Vec<String> = bytecode
                .instructions
                .iter()
                .map(|instruction| instruction.to_string())
                .filter(|line| !matches!(line.as_str(), "push F 0.0" | "save f" | "print 1"))
                .collect();
            assert_eq!(&found, expected, "{}", input);
        }
        Ok(())
    }

    #[test]
    fn test_comparison_promotion_is_positioned_per_operand() -> Result<()> {
        let tests = [
            (
                "write 1 < 2.5;",
                vec!["push I 1", "itof", "push F 2.5", "lt", "print 1"],
            ),
            (
                "write 2.5 > 1;",
                vec!["push F 2.5", "push I 1", "itof", "gt", "print 1"],
            ),
            (
                "write (1 + 2) == 2.5;",
                vec!["push I 1", "push I 2", "add", "itof", "push F 2.5", "eq", "print 1"],
            ),
            (
                "write 3 != 1.5 * 2;",
                vec![
                    "push I 3", "itof", "push F 1.5", "push I 2", "itof", "mul", "eq", "not",
                    "print 1",
                ],
            ),
        ];
        for (input, expected) in tests.iter() {
            assert_eq!(compile(input)?.to_string(), listing(expected), "{}", input);
        }
        Ok(())
    }

    #[test]
    fn test_if_else_labels() -> Result<()> {
        let bytecode = compile("if false then write 1; else write 2;")?;
        let expected = [
            "push B false", "fjmp 0", "push I 1", "print 1", "jmp 1", "label 0", "push I 2",
            "print 1", "label 1",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));
        Ok(())
    }

    #[test]
    fn test_body_only_if() -> Result<()> {
        let bytecode = compile("if (true) { write 1; }")?;
        let expected = [
            "push B true", "fjmp 0", "push I 1", "print 1", "jmp 1", "label 0", "label 1",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));
        Ok(())
    }

    #[test]
    fn test_nested_if_label_order() -> Result<()> {
        let bytecode = compile("if true then if false then write 1; else write 2;")?;
        let expected = [
            "push B true", "fjmp 0", "push B false", "fjmp 1", "push I 1", "print 1", "jmp 2",
            "label 1", "push I 2", "print 1", "label 2", "jmp 3", "label 0", "label 3",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));
        Ok(())
    }

    #[test]
    fn test_while_loop() -> Result<()> {
        let bytecode = compile("int i; while (i < 3) { i = i + 1; }")?;
        let expected = [
            "push I 0", "save i", "label 0", "load i", "push I 3", "lt", "fjmp 1", "load i",
            "push I 1", "add", "save i", "load i", "pop", "jmp 0", "label 1",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));
        Ok(())
    }

    #[test]
    fn test_chained_assignment_evaluates_once() -> Result<()> {
        let bytecode = compile("float f; int i; f, i = 3;")?;
        let expected = [
            "push F 0.0", "save f", "push I 0", "save i", "push I 3", "save i", "load i",
            "itof", "save f", "load f", "pop",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));

        let bytecode = compile("int a, b; a = b = 1 + 1;")?;
        let adds = bytecode
            .instructions
            .iter()
            .filter(|instruction| **instruction == Instruction::Add)
            .count();
        assert_eq!(adds, 1);
        Ok(())
    }

    #[test]
    fn test_float_variable_stays_float_after_assignment() -> Result<()> {
        let bytecode = compile("float f; f = 1; write f > 2;")?;
        let tail: Vec<String> = bytecode.instructions[7..]
            .iter()
            .map(|instruction| instruction.to_string())
            .collect();
        assert_eq!(tail, vec!["load f", "push I 2", "itof", "gt", "print 1"]);
        Ok(())
    }

    #[test]
    fn test_promotion_follows_the_static_value() -> Result<()> {
        // `i or 2.5` is statically 2.5 because `i` starts at 0, so no `itof`
        // is emitted even though a nonzero `i` reaches `f` as an int.
        let bytecode = compile("int i; float f; f = i or 2.5;")?;
        let expected = [
            "push I 0", "save i", "push F 0.0", "save f", "load i", "push F 2.5", "or", "save f",
            "load f", "pop",
        ];
        assert_eq!(bytecode.to_string(), listing(&expected));
        Ok(())
    }

    #[test]
    fn test_labels_are_unique() -> Result<()> {
        let bytecode = compile(
            "int i; while (i < 3) { if (i == 1) write i; else { while (false) ; } i = i + 1; }",
        )?;
        let mut seen = HashSet::new();
        for instruction in bytecode.instructions.iter() {
            if let Instruction::Label(id) = instruction {
                assert!(seen.insert(*id), "label {} emitted twice", id);
            }
        }
        for instruction in bytecode.instructions.iter() {
            if let Instruction::Jmp(id) | Instruction::Fjmp(id) = instruction {
                assert!(seen.contains(id), "jump to missing label {}", id);
            }
        }
        assert_eq!(seen.len(), 6);
        Ok(())
    }

    #[test]
    fn test_undeclared_variable_is_an_error() {
        assert!(compile("x = 1;").is_err());
        assert!(compile("write y;").is_err());
        assert!(compile("read z;").is_err());
    }

    #[test]
    fn test_text_roundtrip() -> Result<()> {
        let bytecode = compile(
            "string s; float f; bool b; s = \"hello world\"; f = -1.25; b = s == \"x\"; write s, f, b;",
        )?;
        let text = bytecode.to_string();
        assert_eq!(text.parse::<Bytecode>()?, bytecode);
        Ok(())
    }

    #[test]
    fn test_instruction_parsing() -> Result<()> {
        let tests = [
            ("push I 3", Instruction::Push(Value::Int(3))),
            ("push F 0.5", Instruction::Push(Value::Float(0.5))),
            ("push S \"a b\"", Instruction::Push(Value::Str("a b".to_string()))),
            ("push S \"\"", Instruction::Push(Value::Str(String::new()))),
            ("push B false", Instruction::Push(Value::Bool(false))),
            ("load x", Instruction::Load("x".to_string())),
            ("fjmp 12", Instruction::Fjmp(12)),
            ("print 2", Instruction::Print(2)),
            ("read B", Instruction::Read(Type::Bool)),
            ("uminus", Instruction::Uminus),
        ];
        for (text, expected) in tests.iter() {
            assert_eq!(Instruction::parse(text, 1)?, *expected);
        }
        Ok(())
    }

    #[test]
    fn test_malformed_bytecode() {
        assert!(matches!(
            Instruction::parse("jump 1", 4),
            Err(Fault::UnknownOpcode { line: 4, .. })
        ));
        assert!(matches!(
            Instruction::parse("push X 1", 1),
            Err(Fault::UnknownTypeTag(_))
        ));
        assert!(matches!(
            Instruction::parse("read Q", 1),
            Err(Fault::UnknownTypeTag(_))
        ));
        let malformed = [
            "push I",
            "push I x",
            "push S hi",
            "push S \"hi",
            "push B yes",
            "load",
            "label -1",
            "print many",
            "add 1",
        ];
        for text in malformed.iter() {
            assert!(
                matches!(
                    Instruction::parse(text, 1),
                    Err(Fault::MalformedInstruction { .. })
                ),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() -> Result<()> {
        let bytecode: Bytecode = "push I 1\n\n  \nprint 1\n".parse()?;
        assert_eq!(
            bytecode.instructions,
            vec![Instruction::Push(Value::Int(1)), Instruction::Print(1)]
        );
        Ok(())
    }

    #[test]
    fn test_disassemble() {
        let bytecode = Bytecode {
            instructions: vec![
                Instruction::Label(0),
                Instruction::Push(Value::Bool(true)),
                Instruction::Fjmp(1),
            ],
        };
        let expected = ["0000 label 0", "0001 push B true", "0002 fjmp 1"].join("\n");
        assert_eq!(bytecode.disassemble(), expected);
    }
}
