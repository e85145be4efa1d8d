//! Capacities for the compiler and the virtual machine.

/// Default number of words the generated code may occupy.
pub const DEFAULT_CODE_CAPACITY: usize = 1000;
/// Default number of operand stack slots.
pub const DEFAULT_STACK_CAPACITY: usize = 10000;

/// Limits applied to a single compile+run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum length of the flat instruction stream, in words.
    pub code_capacity: usize,
    /// Maximum number of operand stack slots, frames included.
    pub stack_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            code_capacity: DEFAULT_CODE_CAPACITY,
            stack_capacity: DEFAULT_STACK_CAPACITY,
        }
    }
}

impl Config {
    pub fn with_code_capacity(mut self, words: usize) -> Self {
        self.code_capacity = words;
        self
    }

    pub fn with_stack_capacity(mut self, slots: usize) -> Self {
        self.stack_capacity = slots;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = Config::default().with_stack_capacity(64);
        assert_eq!(config.stack_capacity, 64);
        assert_eq!(config.code_capacity, DEFAULT_CODE_CAPACITY);
    }
}
