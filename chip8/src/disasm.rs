//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use log::info;

use crate::{
    constants::MEM_START,
    opcode::{Op, Opcode},
};

/// Converts bytecode into a human readable listing.
///
/// Words that don't decode to an instruction are listed as raw data,
/// since sprites and other data are commonly interleaved with code.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    /// Address where the first byte would be loaded.
    base: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            base: MEM_START,
        }
    }

    /// Override the load address used for the listing.
    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn print_bytecode(&self) -> fmt::Result {
        let mut s = String::new();
        self.disassemble(&mut s)?;
        info!("disassembled {} bytes", self.bytecode.len());
        println!("{}", s.trim_end());
        Ok(())
    }

    /// Write the whole listing to the given writer, one line per word.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        for (i, chunk) in self.bytecode.chunks(2).enumerate() {
            let address = self.base + i * 2;

            match *chunk {
                [a, b] => self.dis_word(w, address, [a, b])?,
                [a] => writeln!(w, "0x{address:04X} {a:02X}   0x{a:02X}")?,
                _ => {}
            }
        }

        Ok(())
    }

    fn dis_word<W: FmtWrite>(&self, w: &mut W, address: usize, bytes: [u8; 2]) -> fmt::Result {
        let opcode = Opcode::from_bytes(bytes);
        let code = opcode.to_u16();

        match Op::try_from(opcode) {
            Ok(op) => writeln!(w, "0x{address:04X} {code:04X} {op}"),
            Err(_) => writeln!(w, "0x{address:04X} {code:04X} 0x{code:04X}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn listing(bytecode: &[u8]) -> String {
        let mut s = String::new();
        Disassembler::new(bytecode).disassemble(&mut s).unwrap();
        s
    }

    #[test]
    fn test_disassemble() {
        let s = listing(&[0x00, 0xE0, 0x12, 0x04, 0xD0, 0x14]);
        let lines: Vec<&str> = s.lines().collect();

        assert_eq!(
            lines,
            vec![
                "0x0200 00E0 CLS",
                "0x0202 1204 JP 0x204",
                "0x0204 D014 DRW v0, v1, 4",
            ]
        );
    }

    #[test]
    fn test_data_words() {
        // Sprite data is not valid code.
        let s = listing(&[0xFF, 0xFF, 0x80, 0x0F, 0x3C]);
        let lines: Vec<&str> = s.lines().collect();

        assert_eq!(
            lines,
            vec!["0x0200 FFFF 0xFFFF", "0x0202 800F 0x800F", "0x0204 3C   0x3C",]
        );
    }

    #[test]
    fn test_base_address() {
        let mut s = String::new();
        Disassembler::new(&[0x00, 0xEE])
            .with_base(0x300)
            .disassemble(&mut s)
            .unwrap();
        assert_eq!(s, "0x0300 00EE RET\n");
    }

    #[test]
    fn test_empty() {
        assert_eq!(listing(&[]), "");
    }
}
