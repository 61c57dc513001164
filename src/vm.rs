use crate::{flatten, Bytecode, Fault, FaultResult, Instruction, Type, Value};
use std::{
    collections::HashMap,
    io::{BufRead, Write},
};
use tracing::{debug, instrument, trace};

/// Stack machine for the textual bytecode. Variables live in a single
/// global map and survive between calls to `run`.
pub struct VirtualMachine<R, W> {
    pub stack: Vec<Value>,
    pub variables: HashMap<String, Value>,
    labels: HashMap<usize, usize>,
    instruction_pointer: usize,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> VirtualMachine<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            stack: Vec::new(),
            variables: HashMap::new(),
            labels: HashMap::new(),
            instruction_pointer: 0,
            input,
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Parses bytecode text and runs it.
    pub fn execute(&mut self, text: &str) -> FaultResult<()> {
        let bytecode = text.parse::<Bytecode>()?;
        self.run(&bytecode.instructions)
    }

    /// Resolves every label before the first instruction executes, then runs
    /// until the instruction pointer falls off the end.
    #[instrument(skip_all, name = "run")]
    pub fn run(&mut self, instructions: &[Instruction]) -> FaultResult<()> {
        self.labels = resolve_labels(instructions)?;
        self.instruction_pointer = 0;

        while let Some(instruction) = instructions.get(self.instruction_pointer) {
            trace!(
                ip = self.instruction_pointer,
                depth = self.stack.len(),
                "{}",
                instruction
            );
            self.instruction_pointer += 1;
            self.execute_instruction(instruction)?;
        }

        self.output.flush()?;
        debug!(
            instructions = instructions.len(),
            variables = self.variables.len(),
            "execution finished"
        );
        Ok(())
    }

    fn execute_instruction(&mut self, instruction: &Instruction) -> FaultResult<()> {
        match instruction {
            Instruction::Add => self.binary(|left, right| left.add(&right))?,
            Instruction::Sub => self.binary(|left, right| left.sub(&right))?,
            Instruction::Mul => self.binary(|left, right| left.mul(&right))?,
            Instruction::Div => self.binary(|left, right| left.div(&right))?,
            Instruction::Mod => self.binary(|left, right| left.rem(&right))?,
            Instruction::Concat => self.binary(|left, right| left.concat(&right))?,
            Instruction::And => self.binary(|left, right| Ok(left.and(right)))?,
            Instruction::Or => self.binary(|left, right| Ok(left.or(right)))?,
            Instruction::Gt => self.binary(|left, right| left.greater_than(&right))?,
            Instruction::Lt => self.binary(|left, right| left.less_than(&right))?,
            Instruction::Eq => self.binary(|left, right| Ok(Value::Bool(left.equals(&right))))?,
            Instruction::Uminus => {
                let value = self.pop()?.negate()?;
                self.stack.push(value);
            }
            Instruction::Not => {
                let value = self.pop()?.not();
                self.stack.push(value);
            }
            Instruction::Itof => {
                let value = self.pop()?.widen()?;
                self.stack.push(value);
            }
            Instruction::Push(value) => self.stack.push(value.clone()),
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Load(name) => {
                let value = self
                    .variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Fault::UndefinedVariable(name.to_string()))?;
                self.stack.push(value);
            }
            Instruction::Save(name) => {
                let value = self.pop()?;
                self.variables.insert(name.to_string(), value);
            }
            Instruction::Label(_) => {}
            Instruction::Jmp(label) => {
                self.instruction_pointer = self.jump_target(*label)?;
            }
            Instruction::Fjmp(label) => {
                let condition = self.pop()?;
                if !condition.is_truthy() {
                    self.instruction_pointer = self.jump_target(*label)?;
                }
            }
            Instruction::Print(count) => {
                if *count > self.stack.len() {
                    return Err(Fault::StackUnderflow);
                }
                let values = self.stack.split_off(self.stack.len() - count);
                writeln!(self.output, "{}", flatten(&values, " "))?;
            }
            Instruction::Read(typ) => {
                let value = self.read_value(*typ)?;
                self.stack.push(value);
            }
        }
        Ok(())
    }

    fn pop(&mut self) -> FaultResult<Value> {
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    // The right operand is on top.
    fn binary(
        &mut self,
        operation: impl FnOnce(Value, Value) -> FaultResult<Value>,
    ) -> FaultResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = operation(left, right)?;
        self.stack.push(result);
        Ok(())
    }

    fn jump_target(&self, label: usize) -> FaultResult<usize> {
        self.labels
            .get(&label)
            .map(|index| index + 1)
            .ok_or(Fault::UnknownLabel(label))
    }

    fn read_value(&mut self, typ: Type) -> FaultResult<Value> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Fault::InputExhausted);
        }
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let invalid = || Fault::InvalidInput {
            expected: typ,
            input: line.to_string(),
        };
        let value = match typ {
            Type::Int => Value::Int(line.trim().parse().map_err(|_| invalid())?),
            Type::Float => Value::Float(line.trim().parse().map_err(|_| invalid())?),
            Type::String => Value::Str(line.to_string()),
            Type::Bool => Value::Bool(line == "true"),
        };
        Ok(value)
    }
}

/// Maps each label id to the index of its `label` instruction.
pub fn resolve_labels(instructions: &[Instruction]) -> FaultResult<HashMap<usize, usize>> {
    let mut labels = HashMap::new();
    for (index, instruction) in instructions.iter().enumerate() {
        if let Instruction::Label(label) = instruction {
            if let Some(first) = labels.insert(*label, index) {
                return Err(Fault::DuplicateLabel {
                    label: *label,
                    first,
                    second: index,
                });
            }
        }
    }
    Ok(labels)
}
