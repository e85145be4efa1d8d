//! Single pass compiler: a recursive descent parser that emits bytecode while it
//! recognises the source. No syntax tree is built.
//!
//! Every grammar rule has a method of the same name. Forward jumps are emitted
//! with a placeholder target of `0` and patched once the target is known.

use log::{debug, trace};

use crate::{
    bytecode::{Bytecode, Instruction},
    config::Config,
    error::{Error, Result},
    lexer::Lexer,
    symtab::SymbolTable,
    token::{Keyword, Token},
};

/// Address of the function body: right after `CALL start; STOP`.
const PROLOGUE_LEN: usize = 3;

/// Compile `program` into bytecode.
pub fn compile(program: &str, config: &Config) -> Result<Bytecode> {
    Compiler::new(program, config.code_capacity).compile()
}

/// Handle to an emitted instruction whose jump target is patched later.
#[derive(Debug, Clone, Copy)]
struct Patch(usize);

pub struct Compiler<'a> {
    lexer: Lexer<'a>,
    symbols: SymbolTable,
    token: Token<'a>,
    instructions: Vec<Instruction>,
    /// Address of the next instruction, in words
    pc: usize,
    start_addr: usize,
    capacity: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(program: &'a str, capacity: usize) -> Self {
        Compiler {
            lexer: Lexer::new(program),
            symbols: SymbolTable::new(),
            token: Token::Eof,
            instructions: Vec::new(),
            pc: 0,
            start_addr: PROLOGUE_LEN,
            capacity,
        }
    }

    /// Parse the whole program and return the generated code.
    pub fn compile(mut self) -> Result<Bytecode> {
        self.advance()?;
        self.emit(Instruction::Call(PROLOGUE_LEN))?;
        self.emit(Instruction::Stop)?;
        self.start_addr = self.pc;

        let param_slot = self.function()?;
        self.expect(Token::Eof, "end of file")?;

        debug!(
            "compiled {} words, frame size {}, parameter slot {}",
            self.pc,
            self.symbols.len(),
            param_slot
        );

        Ok(Bytecode {
            instructions: self.instructions,
            start_addr: self.start_addr,
            param_slot,
            symbols: self.symbols,
        })
    }

    /// Function = identifier "(" identifier ")" Block
    fn function(&mut self) -> Result<usize> {
        self.ident("function name")?;
        self.expect(Token::LParen, "'('")?;
        let param_slot = self.ident("parameter name")?;
        self.expect(Token::RParen, "')'")?;
        self.block()?;
        self.emit(Instruction::Nop)?;
        Ok(param_slot)
    }

    /// Block = "{" {Statement} "}"
    fn block(&mut self) -> Result<()> {
        self.expect(Token::LBrace, "'{'")?;
        self.statements()?;
        self.expect(Token::RBrace, "'}'")
    }

    fn statements(&mut self) -> Result<()> {
        while self.token != Token::RBrace {
            self.statement()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<()> {
        match self.token {
            Token::Ident { slot, .. } => {
                self.advance()?;
                self.expect(Token::Assign, "'='")?;
                self.expression()?;
                self.emit(Instruction::Store(slot))?;
                self.expect(Token::Semicolon, "';'")
            }
            Token::Keyword(Keyword::If) => {
                self.advance()?;
                let skip_then = self.condition()?;
                self.statement()?;
                let skip_else = self.emit_jump(Instruction::Goto(0))?;
                self.expect(Token::Keyword(Keyword::Else), "'else'")?;
                self.patch(skip_then);
                self.statement()?;
                self.patch(skip_else);
                Ok(())
            }
            Token::Keyword(Keyword::While) => {
                self.advance()?;
                let top = self.pc;
                let exit = self.condition()?;
                self.statement()?;
                self.emit(Instruction::Goto(top))?;
                self.patch(exit);
                Ok(())
            }
            Token::Keyword(Keyword::Return) => {
                self.advance()?;
                self.expression()?;
                self.emit(Instruction::Return)?;
                self.expect(Token::Semicolon, "';'")
            }
            Token::LBrace => self.block(),
            Token::Semicolon => self.advance(),
            _ => Err(self.syntax_error("statement")),
        }
    }

    /// Condition = "(" Expression ("=="|"!="|">"|"<") Expression ")"
    ///
    /// Emits the negated comparison so the jump is taken when the condition is false.
    fn condition(&mut self) -> Result<Patch> {
        self.expect(Token::LParen, "'('")?;
        self.expression()?;
        let skip = match self.token {
            Token::Eq => Instruction::IfCmpNe(0),
            Token::Ne => Instruction::IfCmpEq(0),
            Token::Greater => Instruction::IfCmpLe(0),
            Token::Less => Instruction::IfCmpGe(0),
            _ => return Err(self.syntax_error("relational operator")),
        };
        self.advance()?;
        self.expression()?;
        self.expect(Token::RParen, "')'")?;
        self.emit_jump(skip)
    }

    /// Expression = Term {("+"|"-") Term}
    fn expression(&mut self) -> Result<()> {
        self.term()?;
        loop {
            let op = match self.token {
                Token::Plus => Instruction::Add,
                Token::Minus => Instruction::Sub,
                _ => return Ok(()),
            };
            self.advance()?;
            self.term()?;
            self.emit(op)?;
        }
    }

    /// Term = Factor {("*"|"/") Factor}
    ///
    /// The right operand is parsed as a whole term, so `a / b / c` computes `a / (b / c)`.
    fn term(&mut self) -> Result<()> {
        self.factor()?;
        loop {
            let op = match self.token {
                Token::Star => Instruction::Mul,
                Token::Slash => Instruction::Div,
                _ => return Ok(()),
            };
            self.advance()?;
            self.term()?;
            self.emit(op)?;
        }
    }

    /// Factor = number | identifier | "(" Expression ")" | identifier "(" Expression ")"
    fn factor(&mut self) -> Result<()> {
        match self.token {
            Token::Number(value) => {
                self.emit(Instruction::Push(value))?;
                self.advance()
            }
            Token::Ident { slot, .. } => {
                self.advance()?;
                if self.token == Token::LParen {
                    // Any call is a call of the one function there is.
                    self.advance()?;
                    self.expression()?;
                    self.expect(Token::RParen, "')'")?;
                    self.emit(Instruction::Call(self.start_addr))
                } else {
                    self.emit(Instruction::Load(slot))
                }
            }
            Token::LParen => {
                self.advance()?;
                self.expression()?;
                self.expect(Token::RParen, "')'")
            }
            _ => Err(self.syntax_error("expression")),
        }
    }

    /// Consume an identifier and return its slot.
    fn ident(&mut self, what: &str) -> Result<usize> {
        match self.token {
            Token::Ident { slot, .. } => {
                self.advance()?;
                Ok(slot)
            }
            _ => Err(self.syntax_error(what)),
        }
    }

    fn expect(&mut self, expected: Token<'_>, what: &str) -> Result<()> {
        if self.token == expected {
            self.advance()
        } else {
            Err(self.syntax_error(what))
        }
    }

    fn advance(&mut self) -> Result<()> {
        self.token = self.lexer.next_token(&mut self.symbols)?;
        Ok(())
    }

    fn emit(&mut self, instruction: Instruction) -> Result<()> {
        let width = instruction.width();
        if self.pc + width > self.capacity {
            return Err(Error::CodeOverflow {
                capacity: self.capacity,
            });
        }

        trace!("{:4}  {}", self.pc, instruction);
        self.instructions.push(instruction);
        self.pc += width;
        Ok(())
    }

    fn emit_jump(&mut self, jump: Instruction) -> Result<Patch> {
        self.emit(jump)?;
        Ok(Patch(self.instructions.len() - 1))
    }

    /// Point a previously emitted jump at the current address.
    fn patch(&mut self, Patch(index): Patch) {
        let pc = self.pc;
        if let Some(target) = self.instructions[index].target_mut() {
            *target = pc;
        }
    }

    fn syntax_error(&self, expected: &str) -> Error {
        let (line, col) = self.lexer.position();
        Error::Syntax {
            line,
            col,
            expected: expected.to_string(),
            found: self.token.to_string(),
        }
    }
}
