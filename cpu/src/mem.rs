// SPDX-License-Identifier: MPL-2.0

//! The memory image.
//!
//! The whole of guest memory is one little-endian byte array, fixed in size when it is created,
//! covering the addresses `base..base + size`.

use std::{fmt, ops::Range};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// An access of `len` bytes at `addr` fell, at least partly, outside of the image.
    OutOfRange { addr: u32, len: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { addr, len } => {
                write!(f, "{}-byte access at {:08x} is out of range", len, addr)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Memory {
    /// Creates a zero-filled image of `size` bytes starting at `base`.
    pub fn new(base: u32, size: usize) -> Self {
        Self::from_bytes(base, vec![0; size])
    }

    pub fn from_bytes(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes: bytes.into_boxed_slice() }
    }
}

#[derive(Clone)]
pub struct Memory {
    base: u32,
    bytes: Box<[u8]>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("base", &format_args!("{:#010x}", self.base))
            .field("size", &self.bytes.len())
            .finish()
    }
}

macro_rules! def_read_write {
    ($($read_name:ident $write_name:ident $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads the `", stringify!($ty), "` at the given address.")]
            pub fn $read_name(&self, addr: u32) -> Result<$ty, Error> {
                let mut buf = [0; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(self.slice(addr, std::mem::size_of::<$ty>() as u32)?);

                Ok(<$ty>::from_le_bytes(buf))
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` to the given address.")]
            pub fn $write_name(&mut self, addr: u32, value: $ty) -> Result<(), Error> {
                self.slice_mut(addr, std::mem::size_of::<$ty>() as u32)?
                    .copy_from_slice(&value.to_le_bytes());

                Ok(())
            }
        )*
    };
}

impl Memory {
    def_read_write! {
        read_8 write_8 u8,
        read_16 write_16 u16,
        read_32 write_32 u32,
        read_64 write_64 u64,
        read_128 write_128 u128,
    }
}

impl Memory {
    /// The lowest address in the image.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// The size, in bytes, of the image.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// One past the highest address in the image.
    pub fn top(&self) -> u32 {
        self.base.wrapping_add(self.bytes.len() as u32)
    }

    pub fn contains(&self, addr: u32, len: u32) -> bool {
        self.range(addr, len).is_ok()
    }

    fn range(&self, addr: u32, len: u32) -> Result<Range<usize>, Error> {
        let start = addr.wrapping_sub(self.base) as usize;
        match start.checked_add(len as usize) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(Error::OutOfRange { addr, len }),
        }
    }

    pub fn slice(&self, addr: u32, len: u32) -> Result<&[u8], Error> {
        let range = self.range(addr, len)?;

        Ok(&self.bytes[range])
    }

    pub fn slice_mut(&mut self, addr: u32, len: u32) -> Result<&mut [u8], Error> {
        let range = self.range(addr, len)?;

        Ok(&mut self.bytes[range])
    }

    /// Copies `bytes` into the image at `addr`.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> Result<(), Error> {
        self.slice_mut(addr, bytes.len() as u32)?.copy_from_slice(bytes);

        Ok(())
    }

    /// Reads an unsigned little-endian integer of `len` bytes, where `len` is at most 8.
    pub fn read_uint(&self, addr: u32, len: u32) -> Result<u64, Error> {
        let bytes = self.slice(addr, len)?;

        Ok(bytes.iter().rev().fold(0, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    /// Writes the low `len` bytes of `value`, where `len` is at most 8.
    pub fn write_uint(&mut self, addr: u32, len: u32, value: u64) -> Result<(), Error> {
        let bytes = value.to_le_bytes();
        let len_bytes = (len as usize).min(bytes.len());
        self.slice_mut(addr, len)?.copy_from_slice(&bytes[..len_bytes]);

        Ok(())
    }

    /// Reads `len` bytes starting at `addr` as a string, replacing anything that is not UTF-8.
    pub fn read_string(&self, addr: u32, len: u32) -> Result<String, Error> {
        Ok(String::from_utf8_lossy(self.slice(addr, len)?).into_owned())
    }
}

impl<'a> Cursor<'a> {
    pub fn new(mem: &'a Memory, pos: u32) -> Self {
        Self { mem, pos }
    }
}

/// A read position within a [`Memory`] image that advances as bytes are fetched.
///
/// Both the disassembler and the interpreter fetch instruction streams through a `Cursor`.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    mem: &'a Memory,
    pos: u32,
}

impl Cursor<'_> {
    /// The address of the next byte to be fetched.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn fetch_8(&mut self) -> Result<u8, Error> {
        let value = self.mem.read_8(self.pos)?;
        self.pos = self.pos.wrapping_add(1);

        Ok(value)
    }

    pub fn fetch_16(&mut self) -> Result<u16, Error> {
        let value = self.mem.read_16(self.pos)?;
        self.pos = self.pos.wrapping_add(2);

        Ok(value)
    }

    pub fn fetch_32(&mut self) -> Result<u32, Error> {
        let value = self.mem.read_32(self.pos)?;
        self.pos = self.pos.wrapping_add(4);

        Ok(value)
    }

    /// Fetches a signed displacement of 1, 2, or 4 bytes.
    pub fn fetch_disp(&mut self, len: u32) -> Result<i32, Error> {
        match len {
            1 => self.fetch_8().map(|it| i32::from(it as i8)),
            2 => self.fetch_16().map(|it| i32::from(it as i16)),
            _ => self.fetch_32().map(|it| it as i32),
        }
    }

    /// Fetches an unsigned little-endian integer of up to 16 bytes.
    pub fn fetch_wide(&mut self, len: u32) -> Result<u128, Error> {
        let bytes = self.mem.slice(self.pos, len)?;
        let value = bytes.iter().rev().fold(0, |acc, byte| (acc << 8) | u128::from(*byte));
        self.pos = self.pos.wrapping_add(len);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x8000_0000;
    const SIZE: usize = 0x1000;

    macro_rules! def_read_write_test {
        ($fn_name:ident, $ty:ty, $read_name:ident, $write_name:ident $(,)?) => {
            #[test]
            fn $fn_name() {
                let mut mem = Memory::new(BASE, SIZE);
                let width = std::mem::size_of::<$ty>() as u32;
                for addr in (BASE..BASE + SIZE as u32 - width).step_by(61) {
                    let written: $ty = rand::random();
                    mem.$write_name(addr, written).unwrap();

                    assert_eq!(written, mem.$read_name(addr).unwrap(), "failed at {:#010x}", addr);
                }
            }
        };
    }

    def_read_write_test!(read_write_8, u8, read_8, write_8);
    def_read_write_test!(read_write_16, u16, read_16, write_16);
    def_read_write_test!(read_write_32, u32, read_32, write_32);
    def_read_write_test!(read_write_64, u64, read_64, write_64);

    #[test]
    fn is_little_endian() {
        let mut mem = Memory::new(0, 8);
        mem.write_32(0, 0x1234_5678).unwrap();

        assert_eq!(mem.slice(0, 4).unwrap(), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(mem.read_uint(1, 2).unwrap(), 0x3456);
    }

    #[test]
    fn rejects_out_of_range_access() {
        let mut mem = Memory::new(BASE, SIZE);

        assert_eq!(mem.read_8(BASE - 1), Err(Error::OutOfRange { addr: BASE - 1, len: 1 }));
        assert_eq!(
            mem.write_32(BASE + SIZE as u32 - 2, 0),
            Err(Error::OutOfRange { addr: BASE + SIZE as u32 - 2, len: 4 }),
        );
        assert!(mem.read_16(BASE + SIZE as u32 - 2).is_ok());
    }

    #[test]
    fn cursor_sign_extends_displacements() {
        let mem = Memory::from_bytes(0, vec![0xfc, 0xfe, 0xff, 0x10]);
        let mut cursor = Cursor::new(&mem, 0);

        assert_eq!(cursor.fetch_disp(1), Ok(-4));
        assert_eq!(cursor.fetch_disp(2), Ok(-2));
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.fetch_wide(1), Ok(0x10));
        assert!(cursor.fetch_8().is_err());
    }
}
