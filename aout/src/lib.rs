// SPDX-License-Identifier: MPL-2.0

//! The VAX a.out executable container.
//!
//! A container begins with a fixed 32-byte header of eight little-endian words, followed by the
//! text segment, the data segment, the (optional) relocation tables, and the symbol table. Files
//! that do not begin with [`MAGIC`] are not rejected; they are loaded as a raw blob of text with
//! neither an entry point nor symbols, which is enough for disassembly.

mod sym;

use std::{fmt, fs, io::{self, Read}, ops::Range, path::Path};

pub use sym::{kind, Symbol, SymbolTable};

/// The magic number of an executable this crate understands (`0410`, impure text).
pub const MAGIC: u32 = 0x108;

/// The size, in bytes, of the container header.
pub const HEADER_LEN: usize = 32;

/// The base address of programs whose entry point has its sign bit set.
pub const HIGH_BASE: u32 = 0x8000_0000;

/// The alignment of the data segment in memory.
pub const DATA_ALIGN: u32 = 0x200;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// The header promised more bytes than the file holds.
    Truncated { segment: Segment },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read executable: {}", e),
            Self::Truncated { segment } => write!(f, "executable is truncated in its {}", segment),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Truncated { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A region of the container following the header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment {
    Text,
    Data,
    Relocations,
    Symbols,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text segment",
            Self::Data => "data segment",
            Self::Relocations => "relocation tables",
            Self::Symbols => "symbol table",
        })
    }
}

/// The container header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    pub magic: u32,
    /// The size, in bytes, of the text segment.
    pub text: u32,
    /// The size, in bytes, of the data segment.
    pub data: u32,
    /// The size, in bytes, of the zero-initialized segment following the data segment.
    pub bss: u32,
    /// The size, in bytes, of the symbol table.
    pub syms: u32,
    pub entry: u32,
    /// The size, in bytes, of the text relocation table.
    pub trsize: u32,
    /// The size, in bytes, of the data relocation table.
    pub drsize: u32,
}

impl Header {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let word = |idx: usize| {
            let start = idx * 4;

            u32::from_le_bytes([bytes[start], bytes[start + 1], bytes[start + 2], bytes[start + 3]])
        };

        Self {
            magic: word(0),
            text: word(1),
            data: word(2),
            bss: word(3),
            syms: word(4),
            entry: word(5),
            trsize: word(6),
            drsize: word(7),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0; HEADER_LEN];
        let words = [
            self.magic,
            self.text,
            self.data,
            self.bss,
            self.syms,
            self.entry,
            self.trsize,
            self.drsize,
        ];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        bytes
    }

    /// The base address at which the program expects to be loaded.
    ///
    /// An entry address with its sign bit set means every address in the program lives in the
    /// upper half of the address space.
    pub fn base(&self) -> u32 {
        if self.entry & HIGH_BASE != 0 {
            HIGH_BASE
        } else {
            0
        }
    }

    /// The offset of the data segment from the base address.
    pub fn data_offset(&self) -> u32 {
        self.text.wrapping_add(DATA_ALIGN - 1) & !(DATA_ALIGN - 1)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "magic = {:08x}, text  = {:08x}, data   = {:08x}, bss    = {:08x}",
            self.magic, self.text, self.data, self.bss,
        )?;
        write!(
            f,
            "syms  = {:08x}, entry = {:08x}, trsize = {:08x}, drsize = {:08x}",
            self.syms, self.entry, self.trsize, self.drsize,
        )
    }
}

impl AOut {
    /// Reads the container at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_reader(io::BufReader::new(fs::File::open(path)?))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let header = bytes
            .get(..HEADER_LEN)
            .and_then(|it| <&[u8; HEADER_LEN]>::try_from(it).ok())
            .map(Header::parse);

        match header {
            Some(header) if header.magic == MAGIC => {
                tracing::debug!("a.out header:\n{}", header);

                Self::parse_executable(header, &bytes[HEADER_LEN..])
            }
            header => {
                tracing::warn!(
                    "unknown format: {:08x}; treating the file as raw text",
                    header.map_or(0, |it| it.magic),
                );

                Ok(Self::raw(bytes.to_vec()))
            }
        }
    }

    /// Creates a container without a header, holding nothing but text.
    pub fn raw(text: Vec<u8>) -> Self {
        Self {
            header: None,
            text,
            data: Vec::new(),
            symbols: SymbolTable::default(),
        }
    }

    fn parse_executable(header: Header, body: &[u8]) -> Result<Self, Error> {
        let mut input = Input::new(body);
        let text = input.take(header.text, Segment::Text)?.to_vec();
        let data = input.take(header.data, Segment::Data)?.to_vec();

        let symbols = if header.syms > 0 {
            // Relocations are never applied; the program is loaded where it was linked.
            input.take(header.trsize.wrapping_add(header.drsize), Segment::Relocations)?;
            let table = input.take(header.syms, Segment::Symbols)?;

            SymbolTable::parse(table, header.base())
        } else {
            SymbolTable::default()
        };
        tracing::debug!("retained {} symbols", symbols.len());

        Ok(Self { header: Some(header), text, data, symbols })
    }
}

/// A loaded container.
#[derive(Clone, Debug)]
pub struct AOut {
    /// The header, or `None` if the file was not an executable.
    pub header: Option<Header>,
    pub text: Vec<u8>,
    pub data: Vec<u8>,
    pub symbols: SymbolTable,
}

impl AOut {
    /// Whether or not this container can be executed.
    pub fn is_executable(&self) -> bool {
        self.header.is_some()
    }

    pub fn entry(&self) -> Option<u32> {
        self.header.map(|it| it.entry)
    }

    pub fn base(&self) -> u32 {
        self.header.map_or(0, |it| it.base())
    }

    /// The address range occupied by the text segment once loaded.
    pub fn text_range(&self) -> Range<u32> {
        let base = self.base();

        base..base.wrapping_add(self.text.len() as u32)
    }

    /// The address at which the data segment is loaded.
    pub fn data_addr(&self) -> u32 {
        self.base().wrapping_add(self.header.map_or(0, |it| it.data_offset()))
    }

    pub fn bss_len(&self) -> u32 {
        self.header.map_or(0, |it| it.bss)
    }

    /// Serializes this container into the on-disk format.
    ///
    /// Relocation tables are never written.
    pub fn to_bytes(&self) -> Vec<u8> {
        let Some(header) = self.header else {
            return self.text.clone();
        };

        let symbols = self.symbols.to_bytes();
        let header = Header {
            text: self.text.len() as u32,
            data: self.data.len() as u32,
            syms: symbols.len() as u32,
            trsize: 0,
            drsize: 0,
            ..header
        };

        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&self.text);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(&symbols);

        bytes
    }
}

impl<'a> Input<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

/// The unread remainder of a container.
struct Input<'a> {
    bytes: &'a [u8],
}

impl<'a> Input<'a> {
    fn take(&mut self, len: u32, segment: Segment) -> Result<&'a [u8], Error> {
        let len = len as usize;
        if len > self.bytes.len() {
            return Err(Error::Truncated { segment });
        }
        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;

        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executable(entry: u32, symbols: Vec<Symbol>) -> AOut {
        AOut {
            header: Some(Header { magic: MAGIC, bss: 0x40, entry, ..Header::default() }),
            text: vec![0x00, 0x00, 0xd0, 0x51, 0x52, 0x04],
            data: vec![0xaa; 3],
            symbols: SymbolTable::from_symbols(symbols),
        }
    }

    #[test]
    fn reads_segments_and_header() {
        let aout = AOut::from_bytes(&executable(0, vec![]).to_bytes()).unwrap();
        let header = aout.header.unwrap();

        assert_eq!(header.text, 6);
        assert_eq!(header.data, 3);
        assert_eq!(header.bss, 0x40);
        assert_eq!(aout.text, [0x00, 0x00, 0xd0, 0x51, 0x52, 0x04]);
        assert_eq!(aout.data, [0xaa; 3]);
        assert_eq!(aout.data_addr(), 0x200);
        assert_eq!(aout.entry(), Some(0));
        assert!(aout.symbols.is_empty());
    }

    #[test]
    fn reads_from_any_reader() {
        let bytes = executable(0, vec![]).to_bytes();
        let aout = AOut::from_reader(&bytes[..]).unwrap();

        assert_eq!(aout.bss_len(), 0x40);
        assert_eq!(aout.text.len(), 6);
    }

    #[test]
    fn falls_back_to_raw_text_on_bad_magic() {
        let bytes = [0x11, 0x05, 0x01, 0x01];
        let aout = AOut::from_bytes(&bytes).unwrap();

        assert!(!aout.is_executable());
        assert_eq!(aout.text, bytes);
        assert_eq!(aout.entry(), None);
        assert_eq!(aout.text_range(), 0..4);
    }

    #[test]
    fn rejects_truncated_segments() {
        let mut bytes = executable(0, vec![]).to_bytes();
        bytes.truncate(HEADER_LEN + 4);

        assert!(matches!(
            AOut::from_bytes(&bytes),
            Err(Error::Truncated { segment: Segment::Text }),
        ));
    }

    #[test]
    fn skips_relocation_tables() {
        let aout = executable(0, vec![Symbol::new("_main", kind::TEXT_EXT, 2)]);
        let mut bytes = aout.to_bytes();
        // Splice in 8 bytes of relocations ahead of the symbol table.
        let mut header = Header::parse(bytes[..HEADER_LEN].try_into().unwrap());
        header.trsize = 8;
        bytes[..HEADER_LEN].copy_from_slice(&header.to_bytes());
        let symbols_at = HEADER_LEN + 6 + 3;
        bytes.splice(symbols_at..symbols_at, [0xee; 8]);

        let aout = AOut::from_bytes(&bytes).unwrap();
        assert_eq!(aout.symbols.procedure_at(2), Some("_main"));
    }

    #[test]
    fn high_entry_rebases_symbols() {
        let aout = executable(
            0x8000_0000,
            vec![Symbol::new("_main", kind::TEXT_EXT, 0x8000_0002)],
        );
        let aout = AOut::from_bytes(&aout.to_bytes()).unwrap();

        assert_eq!(aout.base(), HIGH_BASE);
        assert_eq!(aout.text_range(), 0x8000_0000..0x8000_0006);
        assert_eq!(aout.data_addr(), 0x8000_0200);
        assert_eq!(aout.symbols.procedure_at(0x8000_0002), Some("_main"));
    }
}
