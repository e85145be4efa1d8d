//! Virtual machine that runs the bytecode
//!
//! # Calling convention
//!
//! The caller leaves the argument on top of the stack and executes `CALL`.
//! The machine then pushes the return address and the caller's frame pointer
//! and reserves one slot per symbol for the callee's frame:
//!
//! ```text
//! | ... | arg | ret addr | caller fp | slot 0 | slot 1 | ... | operands ...
//!                                    ^ fp
//! ```
//!
//! The argument is copied into the parameter slot. On `RETURN` the top of stack
//! overwrites the argument slot, so the caller finds the result where the
//! argument used to be.

use log::{debug, trace};

use crate::{
    bytecode::{Bytecode, Instruction},
    config::Config,
    error::{Error, Result},
};

/// Virtual machine representation
pub struct MiniVm {
    code: Vec<i32>,
    ip: usize,           // instruction pointer
    sp: usize,           // stack pointer, next free slot
    fp: usize,           // frame pointer
    frame_size: usize,   // local slots per call frame
    param_slot: usize,   // slot receiving the argument
    pub halted: bool,    // set by `STOP`
    stack: Vec<i32>,     // grows on demand up to `capacity`
    capacity: usize,
}

impl MiniVm {
    /// Build a machine for compiled bytecode.
    pub fn load(bytecode: &Bytecode, config: &Config) -> Self {
        MiniVm::new(
            bytecode.words(),
            bytecode.frame_size(),
            bytecode.param_slot,
            config.stack_capacity,
        )
    }

    /// Build a machine for a raw word stream.
    pub fn new(code: Vec<i32>, frame_size: usize, param_slot: usize, capacity: usize) -> Self {
        MiniVm {
            code,
            ip: 0,
            sp: 0,
            fp: 0,
            frame_size,
            param_slot,
            halted: false,
            stack: Vec::new(),
            capacity,
        }
    }

    /// Run the program from address 0 with `arg` bound to the parameter and
    /// return the value left in stack slot 0.
    pub fn run(&mut self, arg: i32) -> Result<i32> {
        self.reset(arg)?;
        debug!(
            "running {} words, frame size {}, stack capacity {}",
            self.code.len(),
            self.frame_size,
            self.capacity
        );

        while !self.halted {
            self.next_instruction()?;
        }

        let result = self.read(0)?;
        debug!("halted with result {}", result);
        Ok(result)
    }

    /// Prepare a fresh run: the argument is the only value on the stack.
    pub fn reset(&mut self, arg: i32) -> Result<()> {
        self.ip = 0;
        self.sp = 0;
        self.fp = 0;
        self.halted = false;
        self.stack.clear();
        self.push_stack(arg)
    }

    /// Execute a single instruction.
    pub fn next_instruction(&mut self) -> Result<()> {
        if self.ip == self.code.len() {
            // Falling through the trailing `NOP` of the body lands here.
            return Err(Error::illegal(self.ip, "function ended without return"));
        }

        let instruction = Instruction::decode(&self.code, self.ip)?;
        trace!(
            "{:4}  {:<12} sp={} fp={}",
            self.ip,
            instruction.to_string(),
            self.sp,
            self.fp
        );

        let next = self.ip + instruction.width();
        match instruction {
            Instruction::Nop => self.ip = next,
            Instruction::Push(value) => {
                self.push_stack(value)?;
                self.ip = next;
            }
            Instruction::Load(slot) => {
                let value = self.read(self.fp + slot)?;
                self.push_stack(value)?;
                self.ip = next;
            }
            Instruction::Store(slot) => {
                let value = self.pop_stack()?;
                self.write(self.fp + slot, value)?;
                self.ip = next;
            }
            Instruction::Add => self.ins_arith(next, |lhs, rhs| Ok(lhs.wrapping_add(rhs)))?,
            Instruction::Sub => self.ins_arith(next, |lhs, rhs| Ok(lhs.wrapping_sub(rhs)))?,
            Instruction::Mul => self.ins_arith(next, |lhs, rhs| Ok(lhs.wrapping_mul(rhs)))?,
            Instruction::Div => {
                let ip = self.ip;
                self.ins_arith(next, |lhs, rhs| {
                    if rhs == 0 {
                        Err(Error::DivisionByZero { ip })
                    } else {
                        Ok(lhs.wrapping_div(rhs))
                    }
                })?
            }
            Instruction::IfCmpEq(addr) => self.ins_jump_if(next, addr, |lhs, rhs| lhs == rhs)?,
            Instruction::IfCmpNe(addr) => self.ins_jump_if(next, addr, |lhs, rhs| lhs != rhs)?,
            Instruction::IfCmpLe(addr) => self.ins_jump_if(next, addr, |lhs, rhs| lhs <= rhs)?,
            Instruction::IfCmpGe(addr) => self.ins_jump_if(next, addr, |lhs, rhs| lhs >= rhs)?,
            Instruction::Goto(addr) => self.ip = addr,
            Instruction::Call(addr) => self.ins_call(next, addr)?,
            Instruction::Return => self.ins_return()?,
            Instruction::Stop => self.halted = true,
        }

        Ok(())
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn fp(&self) -> usize {
        self.fp
    }

    /// Live part of the operand stack, bottom first.
    pub fn stack(&self) -> Vec<i32> {
        (0..self.sp)
            .map(|i| self.stack.get(i).copied().unwrap_or(0))
            .collect()
    }

    /// Pop two values and push `second <op> top`
    fn ins_arith<F>(&mut self, next: usize, op: F) -> Result<()>
    where
        F: FnOnce(i32, i32) -> Result<i32>,
    {
        let rhs = self.pop_stack()?;
        let lhs = self.pop_stack()?;
        self.push_stack(op(lhs, rhs)?)?;
        self.ip = next;
        Ok(())
    }

    /// Pop two values and jump to `addr` if `second <rel> top` holds
    fn ins_jump_if<F>(&mut self, next: usize, addr: usize, rel: F) -> Result<()>
    where
        F: FnOnce(i32, i32) -> bool,
    {
        let rhs = self.pop_stack()?;
        let lhs = self.pop_stack()?;
        self.ip = if rel(lhs, rhs) { addr } else { next };
        Ok(())
    }

    // Call the function at `addr`
    fn ins_call(&mut self, ret_addr: usize, addr: usize) -> Result<()> {
        let arg_slot = self
            .sp
            .checked_sub(1)
            .ok_or(Error::StackUnderflow { ip: self.ip })?;
        let fp = self.sp + 2;
        let sp = fp + self.frame_size;
        if sp > self.capacity {
            return Err(self.overflow());
        }

        let ret_addr = self.word(ret_addr)?;
        let caller_fp = self.word(self.fp)?;
        self.write(self.sp, ret_addr)?;
        self.write(self.sp + 1, caller_fp)?;
        for slot in fp..sp {
            self.write(slot, 0)?;
        }
        let arg = self.read(arg_slot)?;
        self.write(fp + self.param_slot, arg)?;

        self.fp = fp;
        self.sp = sp;
        self.ip = addr;
        Ok(())
    }

    /// Return from the function, leaving the result in the argument slot
    fn ins_return(&mut self) -> Result<()> {
        let underflow = Error::StackUnderflow { ip: self.ip };
        let arg_slot = match self.fp.checked_sub(3) {
            Some(slot) => slot,
            None => return Err(underflow),
        };

        let result = self.read(self.sp.checked_sub(1).ok_or(underflow)?)?;
        self.write(arg_slot, result)?;

        self.sp = self.fp - 2;
        self.fp = self.address(self.read(self.sp + 1)?)?;
        self.ip = self.address(self.read(self.sp)?)?;
        Ok(())
    }

    fn pop_stack(&mut self) -> Result<i32> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow { ip: self.ip });
        }

        self.sp -= 1;
        self.read(self.sp)
    }

    fn push_stack(&mut self, data: i32) -> Result<()> {
        self.write(self.sp, data)?;
        self.sp += 1;
        Ok(())
    }

    fn read(&self, index: usize) -> Result<i32> {
        if index >= self.capacity {
            return Err(self.overflow());
        }
        Ok(self.stack.get(index).copied().unwrap_or(0))
    }

    fn write(&mut self, index: usize, data: i32) -> Result<()> {
        if index >= self.capacity {
            return Err(self.overflow());
        }
        if index >= self.stack.len() {
            self.stack.resize(index + 1, 0);
        }
        self.stack[index] = data;
        Ok(())
    }

    /// A saved register as a stack word
    fn word(&self, register: usize) -> Result<i32> {
        i32::try_from(register)
            .map_err(|_| Error::illegal(self.ip, format!("address {} does not fit a word", register)))
    }

    /// A stack word as a saved register
    fn address(&self, word: i32) -> Result<usize> {
        usize::try_from(word)
            .map_err(|_| Error::illegal(self.ip, format!("corrupt frame: saved register {}", word)))
    }

    fn overflow(&self) -> Error {
        Error::StackOverflow {
            ip: self.ip,
            capacity: self.capacity,
        }
    }
}
