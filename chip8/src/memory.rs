//! Main memory.
use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Byte addressable storage for both program and data.
///
/// Every access is bounds checked. An address outside of the
/// address space means the program counter or index register
/// was corrupted, so it is reported instead of being wrapped.
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            ram: Box::new([0; MEM_SIZE]),
        }
    }
}

impl Memory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Copy the given bytes into memory, starting at `at`.
    pub fn load(&mut self, bytes: &[u8], at: usize) -> Chip8Result<()> {
        if at > MEM_SIZE {
            return Err(Chip8Error::OutOfBounds { address: at });
        }

        let capacity = MEM_SIZE.saturating_sub(at);
        if bytes.len() > capacity {
            return Err(Chip8Error::LargeProgram {
                size: bytes.len(),
                capacity,
            });
        }

        self.ram[at..at + bytes.len()].copy_from_slice(bytes);

        Ok(())
    }

    /// Copy a program into memory at the conventional start address.
    ///
    /// Fails without touching memory when the program doesn't fit.
    #[inline]
    pub fn load_program(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        self.load(bytecode, MEM_START)
    }

    #[inline]
    pub fn read_byte(&self, addr: usize) -> Chip8Result<u8> {
        self.ram
            .get(addr)
            .copied()
            .ok_or(Chip8Error::OutOfBounds { address: addr })
    }

    #[inline]
    pub fn write_byte(&mut self, addr: usize, value: u8) -> Chip8Result<()> {
        match self.ram.get_mut(addr) {
            Some(byte) => {
                *byte = value;
                Ok(())
            }
            None => Err(Chip8Error::OutOfBounds { address: addr }),
        }
    }

    /// Fetch the two bytes of the instruction located at `addr`.
    #[inline]
    pub fn read_word(&self, addr: usize) -> Chip8Result<[u8; 2]> {
        Ok([self.read_byte(addr)?, self.read_byte(addr + 1)?])
    }

    /// Borrow `len` bytes starting at `addr`.
    pub fn slice(&self, addr: usize, len: usize) -> Chip8Result<&[u8]> {
        let end = addr + len;
        if end > MEM_SIZE {
            // Report the first address that falls outside.
            return Err(Chip8Error::OutOfBounds {
                address: addr.max(MEM_SIZE),
            });
        }
        Ok(&self.ram[addr..end])
    }

    /// Mutably borrow `len` bytes starting at `addr`.
    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Chip8Result<&mut [u8]> {
        let end = addr + len;
        if end > MEM_SIZE {
            return Err(Chip8Error::OutOfBounds {
                address: addr.max(MEM_SIZE),
            });
        }
        Ok(&mut self.ram[addr..end])
    }

    /// Erase the whole address space.
    pub fn clear(&mut self) {
        self.ram.fill(0);
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &*self.ram
    }
}

/// Check whether the program fits in the memory space after the reserved area.
#[inline]
pub fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= MEM_SIZE - MEM_START
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_program() {
        let mut memory = Memory::new();
        memory.load_program(&[0x00, 0xE0, 0x12, 0x00]).unwrap();

        assert_eq!(memory.read_byte(MEM_START).unwrap(), 0x00);
        assert_eq!(memory.read_byte(MEM_START + 1).unwrap(), 0xE0);
        assert_eq!(memory.read_word(MEM_START + 2).unwrap(), [0x12, 0x00]);
        // Reserved area is untouched.
        assert!(memory.as_slice()[..MEM_START].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_load_program_too_large() {
        let mut memory = Memory::new();

        let fits = vec![0xAB; MEM_SIZE - MEM_START];
        assert!(memory.load_program(&fits).is_ok());
        assert_eq!(memory.read_byte(MEM_SIZE - 1).unwrap(), 0xAB);

        let too_large = vec![0; MEM_SIZE - MEM_START + 1];
        match memory.load_program(&too_large) {
            Err(Chip8Error::LargeProgram { size, capacity }) => {
                assert_eq!(size, MEM_SIZE - MEM_START + 1);
                assert_eq!(capacity, MEM_SIZE - MEM_START);
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_bounds_checked_access() {
        let mut memory = Memory::new();

        assert!(memory.write_byte(MEM_SIZE - 1, 7).is_ok());
        assert_eq!(memory.read_byte(MEM_SIZE - 1).unwrap(), 7);

        assert!(matches!(
            memory.read_byte(MEM_SIZE),
            Err(Chip8Error::OutOfBounds { address: MEM_SIZE })
        ));
        assert!(matches!(
            memory.write_byte(0x2000, 1),
            Err(Chip8Error::OutOfBounds { address: 0x2000 })
        ));
        // Second byte of the word falls outside.
        assert!(matches!(
            memory.read_word(MEM_SIZE - 1),
            Err(Chip8Error::OutOfBounds { address: MEM_SIZE })
        ));
        assert!(memory.slice(MEM_SIZE - 2, 2).is_ok());
        assert!(memory.slice(MEM_SIZE - 2, 3).is_err());
    }

    #[test]
    fn test_load_past_end() {
        let mut memory = Memory::new();

        // Empty load at the very end is a no-op.
        assert!(memory.load(&[], MEM_SIZE).is_ok());

        assert!(matches!(
            memory.load(&[], MEM_SIZE + 1),
            Err(Chip8Error::OutOfBounds { address }) if address == MEM_SIZE + 1
        ));
        assert!(matches!(
            memory.load(&[1, 2], 0x2000),
            Err(Chip8Error::OutOfBounds { address: 0x2000 })
        ));
    }
}
