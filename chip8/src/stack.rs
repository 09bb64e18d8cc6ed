//! Call stack.
use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Stack of return pointers used for jumping when a routine call finishes.
pub struct CallStack {
    stack: Box<[Address; STACK_SIZE]>,
    /// Stack pointer, the number of addresses currently on the stack.
    sp: usize,
}

impl Default for CallStack {
    fn default() -> Self {
        Self {
            stack: Box::new([0; STACK_SIZE]),
            sp: 0,
        }
    }
}

impl CallStack {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, pc: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow);
        }

        self.stack[self.sp] = pc;
        self.sp += 1;

        Ok(())
    }

    pub fn pop(&mut self) -> Chip8Result<Address> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }

        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    pub fn clear(&mut self) {
        self.stack.fill(0);
        self.sp = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = CallStack::new();
        assert!(stack.is_empty());

        stack.push(0x202).unwrap();
        stack.push(0x30A).unwrap();
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop().unwrap(), 0x30A);
        assert_eq!(stack.pop().unwrap(), 0x202);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_underflow() {
        let mut stack = CallStack::new();
        assert!(matches!(stack.pop(), Err(Chip8Error::StackUnderflow)));
    }

    #[test]
    fn test_overflow() {
        let mut stack = CallStack::new();
        for i in 0..STACK_SIZE {
            stack.push(i as Address * 2).unwrap();
        }
        assert!(matches!(stack.push(0x200), Err(Chip8Error::StackOverflow)));
        // Failed push leaves the stack intact.
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.pop().unwrap(), (STACK_SIZE as Address - 1) * 2);
    }
}
