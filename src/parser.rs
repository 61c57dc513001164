use crate::{lexer::Token, Lexeme, Position, Type};
use anyhow::{bail, Result};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    slice::Iter,
};

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Empty,
    Declaration(Type, Vec<Identifier>),
    /// Targets in source order; `a, b = e` and `a = b = e` both land here.
    Assignment(Vec<Identifier>, Expression),
    Read(Vec<Identifier>),
    Write(Vec<Expression>),
    Block(Vec<Statement>),
    If(Expression, Box<Statement>, Option<Box<Statement>>),
    While(Expression, Box<Statement>),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let statement = match self {
            Self::Empty => ";".to_string(),
            Self::Declaration(typ, identifiers) => {
                format!("{} {};", typ, crate::flatten(identifiers, ", "))
            }
            Self::Assignment(targets, expression) => {
                format!("{} = {};", crate::flatten(targets, ", "), expression)
            }
            Self::Read(identifiers) => format!("read {};", crate::flatten(identifiers, ", ")),
            Self::Write(expressions) => format!("write {};", crate::flatten(expressions, ", ")),
            Self::Block(statements) => format!("{{ {} }}", crate::flatten(statements, " ")),
            Self::If(condition, consequence, alternative) => match alternative {
                Some(alternative) => {
                    format!("if {} {} else {}", condition, consequence, alternative)
                }
                None => format!("if {} {}", condition, consequence),
            },
            Self::While(condition, body) => format!("while {} {}", condition, body),
        };
        write!(f, "{}", statement)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
    Prefix(UnaryOperator, Box<Expression>),
    Infix(Box<Expression>, Operator, Box<Expression>),
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Identifier(identifier) => write!(f, "{}", identifier),
            Self::Literal(literal) => write!(f, "{}", literal),
            Self::Prefix(operator, operand) => write!(f, "({}{})", operator, operand),
            Self::Infix(left, operator, right) => {
                write!(f, "({} {} {})", left, operator, right)
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub name: String,
    pub position: Position,
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    /// Contents without the surrounding quotes.
    String(String),
    Bool(bool),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Literal::Integer(x) => write!(f, "{}", x),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(x) => write!(f, "\"{}\"", x),
            Literal::Bool(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
    And,
    Or,
}

impl Operator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Add
                | Operator::Subtract
                | Operator::Multiply
                | Operator::Divide
                | Operator::Modulo
        )
    }

    fn of_token(token: &Token) -> Option<Self> {
        let operator = match token {
            Token::Plus => Operator::Add,
            Token::Minus => Operator::Subtract,
            Token::Asterisk => Operator::Multiply,
            Token::Slash => Operator::Divide,
            Token::Percent => Operator::Modulo,
            Token::Dot => Operator::Concat,
            Token::LessThan => Operator::LessThan,
            Token::GreaterThan => Operator::GreaterThan,
            Token::Equal => Operator::Equal,
            Token::NotEqual => Operator::NotEqual,
            Token::And => Operator::And,
            Token::Or => Operator::Or,
            _ => return None,
        };
        Some(operator)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Concat => ".",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::And => "and",
            Operator::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, PartialOrd, Copy, Clone)]
pub enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessThanGreaterThan,
    Sum,
    Product,
    Prefix,
}

impl Precedence {
    pub fn of_token(token: &Token) -> Self {
        match token {
            Token::Or => Self::Or,
            Token::And => Self::And,
            Token::Equal | Token::NotEqual => Self::Equals,
            Token::LessThan | Token::GreaterThan => Self::LessThanGreaterThan,
            Token::Plus | Token::Minus | Token::Dot => Self::Sum,
            Token::Asterisk | Token::Slash | Token::Percent => Self::Product,
            _ => Self::Lowest,
        }
    }
}

pub type Program = Vec<Statement>;

static END_OF_FILE: Lexeme = Lexeme {
    token: Token::EndOfFile,
    position: Position { line: 0, column: 0 },
};

pub struct Parser<'a> {
    pub lexemes: Iter<'a, Lexeme>,
}

impl<'a> Parser<'a> {
    pub fn new(lexemes: &'a [Lexeme]) -> Self {
        Self {
            lexemes: lexemes.iter(),
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::new();
        while self.peek_nth(0).token != Token::EndOfFile {
            program.push(self.parse_statement()?);
        }
        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let next = self.peek_nth(0);
        match &next.token {
            Token::Semicolon => {
                self.read_lexeme();
                Ok(Statement::Empty)
            }
            Token::Decl | Token::TypeName(_) => self.parse_declaration(),
            Token::Identifier(_) => self.parse_assignment(),
            Token::Write => self.parse_write(),
            Token::Read => self.parse_read(),
            Token::LeftBrace => self.parse_block(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            token => bail!(
                "Token not valid at the start of a statement at {}: {:?}",
                next.position,
                token
            ),
        }
    }

    fn parse_declaration(&mut self) -> Result<Statement> {
        if self.peek_nth(0).token == Token::Decl {
            self.read_lexeme();
        }
        let lexeme = self.read_lexeme();
        let typ = match lexeme.token {
            Token::TypeName(typ) => typ,
            ref token => bail!("Expected a type at {}! Found '{:?}'.", lexeme.position, token),
        };
        let identifiers = self.parse_identifier_list()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Declaration(typ, identifiers))
    }

    fn parse_assignment(&mut self) -> Result<Statement> {
        let mut targets = vec![self.parse_identifier()?];
        loop {
            let lexeme = self.read_lexeme();
            match lexeme.token {
                Token::Comma => targets.push(self.parse_identifier()?),
                Token::Assign => {
                    let chained = matches!(
                        (&self.peek_nth(0).token, &self.peek_nth(1).token),
                        (Token::Identifier(_), Token::Assign)
                    );
                    if !chained {
                        break;
                    }
                    targets.push(self.parse_identifier()?);
                }
                ref token => bail!(
                    "Expected ',' or '=' in assignment at {}! Found '{:?}'.",
                    lexeme.position,
                    token
                ),
            }
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Assignment(targets, value))
    }

    fn parse_write(&mut self) -> Result<Statement> {
        self.expect(Token::Write)?;
        let mut expressions = vec![self.parse_expression(Precedence::Lowest)?];
        while self.peek_nth(0).token == Token::Comma {
            self.read_lexeme();
            expressions.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(Token::Semicolon)?;
        Ok(Statement::Write(expressions))
    }

    fn parse_read(&mut self) -> Result<Statement> {
        self.expect(Token::Read)?;
        let identifiers = self.parse_identifier_list()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Read(identifiers))
    }

    fn parse_block(&mut self) -> Result<Statement> {
        let start = self.expect(Token::LeftBrace)?;
        let mut statements = Vec::new();
        loop {
            match self.peek_nth(0).token {
                Token::RightBrace => break,
                Token::EndOfFile => bail!("Unclosed block opened at {}", start),
                _ => statements.push(self.parse_statement()?),
            }
        }
        self.read_lexeme();
        Ok(Statement::Block(statements))
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.expect(Token::If)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        if self.peek_nth(0).token == Token::Then {
            self.read_lexeme();
        }
        let consequence = Box::new(self.parse_statement()?);
        let alternative = if self.peek_nth(0).token == Token::Else {
            self.read_lexeme();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(condition, consequence, alternative))
    }

    fn parse_while(&mut self) -> Result<Statement> {
        self.expect(Token::While)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(condition, body))
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<Identifier>> {
        let mut identifiers = vec![self.parse_identifier()?];
        while self.peek_nth(0).token == Token::Comma {
            self.read_lexeme();
            identifiers.push(self.parse_identifier()?);
        }
        Ok(identifiers)
    }

    fn parse_identifier(&mut self) -> Result<Identifier> {
        let lexeme = self.read_lexeme();
        match &lexeme.token {
            Token::Identifier(name) => Ok(Identifier {
                name: name.to_string(),
                position: lexeme.position,
            }),
            token => bail!(
                "Expected 'Identifier' token at {}! Found '{:?}'.",
                lexeme.position,
                token
            ),
        }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        let mut expression = self.parse_prefix_expression()?;
        while precedence < Precedence::of_token(&self.peek_nth(0).token) {
            expression = self.parse_infix_expression(expression)?;
        }
        Ok(expression)
    }

    fn parse_prefix_expression(&mut self) -> Result<Expression> {
        let lexeme = self.read_lexeme();
        let expression = match &lexeme.token {
            Token::Identifier(name) => Expression::Identifier(Identifier {
                name: name.to_string(),
                position: lexeme.position,
            }),
            Token::Integer(value) => Expression::Literal(Literal::Integer(*value)),
            Token::Float(value) => Expression::Literal(Literal::Float(*value)),
            Token::Str(value) => Expression::Literal(Literal::String(value.to_string())),
            Token::True => Expression::Literal(Literal::Bool(true)),
            Token::False => Expression::Literal(Literal::Bool(false)),
            Token::LeftParentheses => {
                let expression = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RightParentheses)?;
                expression
            }
            Token::Minus => match self.peek_nth(0).token {
                Token::Integer(value) => {
                    self.read_lexeme();
                    Expression::Literal(Literal::Integer(-value))
                }
                Token::Float(value) => {
                    self.read_lexeme();
                    Expression::Literal(Literal::Float(-value))
                }
                _ => Expression::Prefix(
                    UnaryOperator::Negate,
                    Box::new(self.parse_expression(Precedence::Prefix)?),
                ),
            },
            Token::Bang | Token::Not => Expression::Prefix(
                UnaryOperator::Not,
                Box::new(self.parse_expression(Precedence::Prefix)?),
            ),
            token => bail!(
                "Token not valid for an expression at {}: {:?}",
                lexeme.position,
                token
            ),
        };
        Ok(expression)
    }

    fn parse_infix_expression(&mut self, left_expression: Expression) -> Result<Expression> {
        let lexeme = self.read_lexeme();
        let operator = match Operator::of_token(&lexeme.token) {
            Some(operator) => operator,
            None => bail!(
                "Token not valid for an infix expression at {}: {:?}",
                lexeme.position,
                lexeme.token
            ),
        };
        let precedence = Precedence::of_token(&lexeme.token);
        Ok(Expression::Infix(
            Box::new(left_expression),
            operator,
            Box::new(self.parse_expression(precedence)?),
        ))
    }

    fn expect(&mut self, expected: Token) -> Result<Position> {
        let lexeme = self.read_lexeme();
        if lexeme.token != expected {
            bail!(
                "Expected '{:?}' at {}! Found '{:?}'.",
                expected,
                lexeme.position,
                lexeme.token
            );
        }
        Ok(lexeme.position)
    }

    fn read_lexeme(&mut self) -> &'a Lexeme {
        self.lexemes.next().unwrap_or(&END_OF_FILE)
    }

    fn peek_nth(&self, n: usize) -> &'a Lexeme {
        self.lexemes.clone().nth(n).unwrap_or(&END_OF_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::{Expression, Identifier, Literal, Operator, Parser, Result, Statement, UnaryOperator};
    use crate::{lexer::Lexer, Position, Type};
    use anyhow::bail;

    fn parse(input: &str) -> Result<Vec<Statement>> {
        let mut lexer = Lexer::new(input);
        let lexemes = lexer.tokenize()?;
        let mut parser = Parser::new(&lexemes);
        parser.parse()
    }

    fn parse_expression(input: &str) -> Result<Expression> {
        match parse(&format!("write {};", input))?.pop() {
            Some(Statement::Write(mut expressions)) => match expressions.pop() {
                Some(expression) => Ok(expression),
                None => bail!("Expected an expression!"),
            },
            _ => bail!("Expected a write statement!"),
        }
    }

    #[test]
    fn test_declarations() -> Result<()> {
        let program = parse("decl int x, y; float f; string s; bool b;")?;

        assert_eq!(program.len(), 4);

        let expected = [
            (Type::Int, vec!["x", "y"]),
            (Type::Float, vec!["f"]),
            (Type::String, vec!["s"]),
            (Type::Bool, vec!["b"]),
        ];

        for (statement, (expected_type, expected_names)) in program.iter().zip(expected.iter()) {
            match statement {
                Statement::Declaration(typ, identifiers) => {
                    assert_eq!(typ, expected_type);
                    let names: Vec<&str> = identifiers.iter().map(|i| i.name.as_str()).collect();
                    assert_eq!(&names, expected_names);
                }
                _ => bail!("Expected a declaration!"),
            }
        }

        Ok(())
    }

    #[test]
    fn test_identifier_positions() -> Result<()> {
        let program = parse("int x;\nx = 1;")?;
        match &program[1] {
            Statement::Assignment(targets, _) => {
                assert_eq!(targets[0].position, Position::new(2, 0));
            }
            _ => bail!("Expected an assignment!"),
        }
        Ok(())
    }

    #[test]
    fn test_assignment_forms() -> Result<()> {
        let tests = [
            ("x = 1;", vec!["x"]),
            ("a, b, c = 1;", vec!["a", "b", "c"]),
            ("a = b = c = 1;", vec!["a", "b", "c"]),
        ];

        for (input, expected_targets) in tests.iter() {
            match parse(input)?.pop() {
                Some(Statement::Assignment(targets, value)) => {
                    let names: Vec<&str> = targets.iter().map(|i| i.name.as_str()).collect();
                    assert_eq!(&names, expected_targets);
                    assert_eq!(value, Expression::Literal(Literal::Integer(1)));
                }
                _ => bail!("Expected an assignment!"),
            }
        }

        Ok(())
    }

    #[test]
    fn test_equality_is_not_a_chain() -> Result<()> {
        match parse("a = b == c;")?.pop() {
            Some(Statement::Assignment(targets, value)) => {
                assert_eq!(targets.len(), 1);
                assert_eq!(value.to_string(), "(b == c)");
            }
            _ => bail!("Expected an assignment!"),
        }
        Ok(())
    }

    #[test]
    fn test_operator_precedence() -> Result<()> {
        let tests = [
            ("1 + 2 * 3", "(1 + (2 * 3))"),
            ("1 * 2 + 3", "((1 * 2) + 3)"),
            ("1 - 2 - 3", "((1 - 2) - 3)"),
            ("a < b == c > d", "((a < b) == (c > d))"),
            ("a or b and c", "(a or (b and c))"),
            ("a && b || !c", "((a and b) or (!c))"),
            ("not a == b", "((!a) == b)"),
            ("(1 + 2) * 3", "((1 + 2) * 3)"),
            ("\"a\" . \"b\" . s", "((\"a\" . \"b\") . s)"),
            ("-x * 2", "((-x) * 2)"),
            ("5 % 3 / 2", "((5 % 3) / 2)"),
        ];

        for (input, expected) in tests.iter() {
            assert_eq!(parse_expression(input)?.to_string(), *expected);
        }

        Ok(())
    }

    #[test]
    fn test_negative_literals_fold() -> Result<()> {
        assert_eq!(
            parse_expression("-15")?,
            Expression::Literal(Literal::Integer(-15))
        );
        assert_eq!(
            parse_expression("-1.5")?,
            Expression::Literal(Literal::Float(-1.5))
        );
        match parse_expression("-x")? {
            Expression::Prefix(UnaryOperator::Negate, operand) => {
                assert!(matches!(*operand, Expression::Identifier(_)));
            }
            _ => bail!("Expected a negation!"),
        }
        Ok(())
    }

    #[test]
    fn test_if_forms() -> Result<()> {
        let program = parse("if false then write 1; else write 2; if (x) { write 3; }")?;
        assert_eq!(program.len(), 2);
        match &program[0] {
            Statement::If(condition, _, Some(_)) => {
                assert_eq!(*condition, Expression::Literal(Literal::Bool(false)));
            }
            _ => bail!("Expected an if/else statement!"),
        }
        match &program[1] {
            Statement::If(_, consequence, None) => {
                assert!(matches!(**consequence, Statement::Block(_)));
            }
            _ => bail!("Expected a body-only if statement!"),
        }
        Ok(())
    }

    #[test]
    fn test_while_and_io() -> Result<()> {
        let program = parse("while (i < 3) { write i, \"x\"; read i; }")?;
        assert_eq!(
            program[0].to_string(),
            "while (i < 3) { write i, \"x\"; read i; }"
        );
        Ok(())
    }

    #[test]
    fn test_ast_display() -> Result<()> {
        let ast = Statement::Assignment(
            vec![Identifier {
                name: "myVar".to_string(),
                position: Position::new(1, 0),
            }],
            Expression::Infix(
                Box::new(Expression::Literal(Literal::Integer(1))),
                Operator::Add,
                Box::new(Expression::Literal(Literal::Float(2.0))),
            ),
        );
        assert_eq!(ast.to_string(), "myVar = (1 + 2.0);");
        Ok(())
    }

    #[test]
    fn test_syntax_errors() {
        let inputs = [
            "int;",
            "int x",
            "x + 1;",
            "write ;",
            "{ write 1;",
            "if x",
            "x = (1 + 2;",
            "write a & b;",
        ];
        for input in inputs.iter() {
            assert!(parse(input).is_err(), "expected '{}' to fail", input);
        }
    }
}
