//! Bytecode representation

use std::fmt;

use crate::{
    error::{Error, Result},
    symtab::SymbolTable,
};

/// Numeric opcodes of the flat instruction stream.
pub mod opcode {
    pub const NOP: i32 = 0;
    pub const PUSH: i32 = 1;
    pub const LOAD: i32 = 2;
    pub const STORE: i32 = 3;
    pub const ADD: i32 = 4;
    pub const SUB: i32 = 5;
    pub const MUL: i32 = 6;
    pub const DIV: i32 = 7;
    pub const IF_CMPEQ: i32 = 8;
    pub const IF_CMPNE: i32 = 9;
    pub const IF_CMPLE: i32 = 10;
    pub const IF_CMPGE: i32 = 11;
    pub const GOTO: i32 = 12;
    pub const CALL: i32 = 13;
    pub const RETURN: i32 = 14;
    pub const STOP: i32 = 15;
}

/// Supported instructions of the virtual machine.
///
/// Addresses are word offsets into the flat stream produced by
/// [`Bytecode::words`], not indices into a list of instructions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Instruction {
    /// Pass
    Nop,
    /// Push a constant on stack
    Push(i32),
    /// Push the value of a frame slot
    Load(usize),
    /// Pop a value into a frame slot
    Store(usize),
    Add,
    Sub,
    Mul,
    Div,
    /// Pop two values, jump if `second == top`
    IfCmpEq(usize),
    /// Pop two values, jump if `second != top`
    IfCmpNe(usize),
    /// Pop two values, jump if `second <= top`
    IfCmpLe(usize),
    /// Pop two values, jump if `second >= top`
    IfCmpGe(usize),
    /// Unconditionally jump to an address
    Goto(usize),
    /// Call the function starting at an address
    Call(usize),
    /// Return the top of stack to the caller
    Return,
    /// Halt the program
    Stop,
}

impl Instruction {
    pub fn opcode(&self) -> i32 {
        match self {
            Instruction::Nop => opcode::NOP,
            Instruction::Push(_) => opcode::PUSH,
            Instruction::Load(_) => opcode::LOAD,
            Instruction::Store(_) => opcode::STORE,
            Instruction::Add => opcode::ADD,
            Instruction::Sub => opcode::SUB,
            Instruction::Mul => opcode::MUL,
            Instruction::Div => opcode::DIV,
            Instruction::IfCmpEq(_) => opcode::IF_CMPEQ,
            Instruction::IfCmpNe(_) => opcode::IF_CMPNE,
            Instruction::IfCmpLe(_) => opcode::IF_CMPLE,
            Instruction::IfCmpGe(_) => opcode::IF_CMPGE,
            Instruction::Goto(_) => opcode::GOTO,
            Instruction::Call(_) => opcode::CALL,
            Instruction::Return => opcode::RETURN,
            Instruction::Stop => opcode::STOP,
        }
    }

    /// Operand word, if this instruction carries one.
    pub fn operand(&self) -> Option<i32> {
        match *self {
            Instruction::Push(c) => Some(c),
            Instruction::Load(v) | Instruction::Store(v) => Some(v as i32),
            Instruction::IfCmpEq(a)
            | Instruction::IfCmpNe(a)
            | Instruction::IfCmpLe(a)
            | Instruction::IfCmpGe(a)
            | Instruction::Goto(a)
            | Instruction::Call(a) => Some(a as i32),
            _ => None,
        }
    }

    /// Number of words this instruction occupies in the flat stream.
    pub fn width(&self) -> usize {
        if self.operand().is_some() {
            2
        } else {
            1
        }
    }

    /// Jump target, for instructions that transfer control to an address.
    pub fn target(&self) -> Option<usize> {
        match *self {
            Instruction::IfCmpEq(a)
            | Instruction::IfCmpNe(a)
            | Instruction::IfCmpLe(a)
            | Instruction::IfCmpGe(a)
            | Instruction::Goto(a)
            | Instruction::Call(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn target_mut(&mut self) -> Option<&mut usize> {
        match self {
            Instruction::IfCmpEq(a)
            | Instruction::IfCmpNe(a)
            | Instruction::IfCmpLe(a)
            | Instruction::IfCmpGe(a)
            | Instruction::Goto(a)
            | Instruction::Call(a) => Some(a),
            _ => None,
        }
    }

    pub fn encode(&self, out: &mut Vec<i32>) {
        out.push(self.opcode());
        if let Some(operand) = self.operand() {
            out.push(operand);
        }
    }

    /// Decode the instruction starting at word `addr` of `code`.
    pub fn decode(code: &[i32], addr: usize) -> Result<Self> {
        let op = *code
            .get(addr)
            .ok_or_else(|| Error::illegal(addr, "instruction pointer outside code"))?;

        let operand = || -> Result<i32> {
            code.get(addr + 1)
                .copied()
                .ok_or_else(|| Error::illegal(addr, format!("missing operand for opcode {}", op)))
        };
        let address = || -> Result<usize> {
            let word = operand()?;
            usize::try_from(word)
                .map_err(|_| Error::illegal(addr, format!("negative operand {}", word)))
        };

        let instruction = match op {
            opcode::NOP => Instruction::Nop,
            opcode::PUSH => Instruction::Push(operand()?),
            opcode::LOAD => Instruction::Load(address()?),
            opcode::STORE => Instruction::Store(address()?),
            opcode::ADD => Instruction::Add,
            opcode::SUB => Instruction::Sub,
            opcode::MUL => Instruction::Mul,
            opcode::DIV => Instruction::Div,
            opcode::IF_CMPEQ => Instruction::IfCmpEq(address()?),
            opcode::IF_CMPNE => Instruction::IfCmpNe(address()?),
            opcode::IF_CMPLE => Instruction::IfCmpLe(address()?),
            opcode::IF_CMPGE => Instruction::IfCmpGe(address()?),
            opcode::GOTO => Instruction::Goto(address()?),
            opcode::CALL => Instruction::Call(address()?),
            opcode::RETURN => Instruction::Return,
            opcode::STOP => Instruction::Stop,
            op => return Err(Error::illegal(addr, format!("unknown opcode {}", op))),
        };

        Ok(instruction)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Nop => "NOP",
            Instruction::Push(_) => "PUSH",
            Instruction::Load(_) => "LOAD",
            Instruction::Store(_) => "STORE",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::IfCmpEq(_) => "IF_CMPEQ",
            Instruction::IfCmpNe(_) => "IF_CMPNE",
            Instruction::IfCmpLe(_) => "IF_CMPLE",
            Instruction::IfCmpGe(_) => "IF_CMPGE",
            Instruction::Goto(_) => "GOTO",
            Instruction::Call(_) => "CALL",
            Instruction::Return => "RETURN",
            Instruction::Stop => "STOP",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(operand) => write!(f, "{} {}", self.mnemonic(), operand),
            None => f.write_str(self.mnemonic()),
        }
    }
}

/// Output of the compiler: one function plus the prologue that calls it.
#[derive(Debug, Clone)]
pub struct Bytecode {
    /// Instructions from top to bottom
    pub instructions: Vec<Instruction>,
    /// Address of the first instruction of the function body
    pub start_addr: usize,
    /// Slot the function's parameter lives in
    pub param_slot: usize,
    /// Names of every slot of a call frame
    pub symbols: SymbolTable,
}

impl Bytecode {
    /// Number of local slots in every call frame.
    pub fn frame_size(&self) -> usize {
        self.symbols.len()
    }

    /// Length of the flat stream in words.
    pub fn word_count(&self) -> usize {
        self.instructions.iter().map(Instruction::width).sum()
    }

    /// Flatten into the word stream the virtual machine executes.
    pub fn words(&self) -> Vec<i32> {
        let mut words = Vec::with_capacity(self.word_count());
        for instruction in &self.instructions {
            instruction.encode(&mut words);
        }
        words
    }

    /// Instructions paired with their addresses.
    pub fn addressed(&self) -> impl Iterator<Item = (usize, &Instruction)> + '_ {
        self.instructions.iter().scan(0, |addr, instruction| {
            let at = *addr;
            *addr += instruction.width();
            Some((at, instruction))
        })
    }

    /// Human readable listing: the frame layout followed by one instruction per line.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (slot, name) in self.symbols.iter() {
            let role = if slot == self.param_slot { "  parameter" } else { "" };
            out.push_str(&format!("slot {}: {}{}\n", slot, name, role));
        }
        for (addr, instruction) in self.addressed() {
            out.push_str(&format!("{:4}  {}", addr, instruction));
            if let Instruction::Load(slot) | Instruction::Store(slot) = instruction {
                if let Some(name) = self.symbols.name(*slot) {
                    out.push_str(&format!("  ({})", name));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Bytecode {
    /// Words separated by spaces, each followed by one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.words() {
            write!(f, "{} ", word)?;
        }
        Ok(())
    }
}
