// SPDX-License-Identifier: MPL-2.0

//! The symbol table.

use std::{collections::HashMap, fmt};

/// The size, in bytes, of one symbol-table record.
pub const RECORD_LEN: usize = 16;

/// The length of the zero-padded name field.
const NAME_LEN: usize = 8;

pub mod kind {
    //! Symbol type codes.
    //!
    //! Each even code has an external counterpart one greater than it.

    pub const UNDEF: u8 = 0;
    pub const UNDEF_EXT: u8 = 1;
    pub const ABS: u8 = 2;
    pub const ABS_EXT: u8 = 3;
    pub const TEXT: u8 = 4;
    pub const TEXT_EXT: u8 = 5;
    pub const DATA: u8 = 6;
    pub const DATA_EXT: u8 = 7;
    pub const BSS: u8 = 8;
    pub const BSS_EXT: u8 = 9;

    /// The letters with which `nm` renders each code.
    pub(super) const LETTERS: &[u8; 10] = b"uUaAtTdDbB";
}

impl Symbol {
    /// Creates a new `Symbol` located at `addr`.
    pub fn new(name: impl Into<String>, kind: u8, addr: u32) -> Self {
        Self { name: name.into(), kind, other: 0, desc: 0, value: addr, addr }
    }

    fn parse(record: &[u8], base: u32) -> Self {
        let name = &record[..NAME_LEN];
        let name_len = name.iter().position(|it| *it == 0).unwrap_or(NAME_LEN);
        let value = u32::from_le_bytes([record[12], record[13], record[14], record[15]]);

        Self {
            name: String::from_utf8_lossy(&name[..name_len]).into_owned(),
            kind: record[8],
            other: record[9],
            desc: u16::from_le_bytes([record[10], record[11]]),
            value,
            addr: base | (value & 0x7fff_ffff),
        }
    }
}

/// One entry of the symbol table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// The type code. See [`kind`].
    pub kind: u8,
    pub other: u8,
    pub desc: u16,
    /// The value as stored in the container.
    pub value: u32,
    /// The value rebased to the address at which the program is loaded.
    pub addr: u32,
}

impl Symbol {
    /// Whether or not this symbol names a compilation unit rather than a procedure or variable.
    pub fn is_unit(&self) -> bool {
        self.name.ends_with(".o")
    }

    /// Whether or not the table keeps this symbol.
    ///
    /// Only text, data, and bss symbols are kept, whether or not they are external.
    pub fn is_retained(&self) -> bool {
        (kind::TEXT..=kind::BSS_EXT).contains(&self.kind)
    }

    pub fn kind_letter(&self) -> char {
        kind::LETTERS
            .get(usize::from(self.kind))
            .map_or('?', |it| char::from(*it))
    }

    fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut record = [0; RECORD_LEN];
        let name = self.name.as_bytes();
        let name_len = name.len().min(NAME_LEN);
        record[..name_len].copy_from_slice(&name[..name_len]);
        record[8] = self.kind;
        record[9] = self.other;
        record[10..12].copy_from_slice(&self.desc.to_le_bytes());
        record[12..].copy_from_slice(&self.value.to_le_bytes());

        record
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x} {} {}", self.addr, self.kind_letter(), self.name)
    }
}

/// The retained symbols of a container, in ascending address order.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Procedure and variable names by address.
    procedures: HashMap<u32, String>,
}

impl SymbolTable {
    /// Parses a flat array of symbol records, keeping only text, data, and bss symbols.
    ///
    /// A trailing partial record is ignored.
    pub fn parse(table: &[u8], base: u32) -> Self {
        let mut discarded = 0;
        let symbols = table
            .chunks_exact(RECORD_LEN)
            .map(|record| Symbol::parse(record, base))
            .filter(|it| {
                let retained = it.is_retained();
                if !retained {
                    discarded += 1;
                }

                retained
            })
            .collect::<Vec<_>>();
        tracing::trace!("discarded {} symbols", discarded);

        Self::from_symbols(symbols)
    }

    /// Creates a table from `symbols`, which need not be sorted.
    ///
    /// Symbols are not filtered.
    pub fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        // At equal addresses, compilation units precede the procedures they contain. The sort is
        // stable, so ties otherwise keep their file order.
        symbols.sort_by_key(|it| (it.addr, !it.is_unit()));

        let procedures = symbols
            .iter()
            .filter(|it| !it.is_unit())
            .map(|it| (it.addr, it.name.clone()))
            .collect();

        Self { symbols, procedures }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The name of the procedure or variable located exactly at `addr`.
    ///
    /// When several share an address, the last one in the table wins.
    pub fn procedure_at(&self, addr: u32) -> Option<&str> {
        self.procedures.get(&addr).map(String::as_str)
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        self.symbols.iter().flat_map(|it| it.to_bytes()).collect()
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ty: u8, value: u32) -> [u8; RECORD_LEN] {
        Symbol { value, ..Symbol::new(name, ty, 0) }.to_bytes()
    }

    fn table(records: &[[u8; RECORD_LEN]]) -> Vec<u8> {
        records.iter().flatten().copied().collect()
    }

    #[test]
    fn keeps_only_text_data_and_bss() {
        let table = SymbolTable::parse(
            &table(&[
                record("_undef", kind::UNDEF_EXT, 0),
                record("_abs", kind::ABS, 0x10),
                record("_main", kind::TEXT_EXT, 0x20),
                record("_buf", kind::BSS, 0x400),
                record("_stab", 0x24, 0x20),
                record("_errno", kind::DATA_EXT, 0x300),
            ]),
            0,
        );

        let names = table.iter().map(|it| it.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["_main", "_errno", "_buf"]);
    }

    #[test]
    fn units_sort_before_procedures_at_equal_addresses() {
        let table = SymbolTable::parse(
            &table(&[
                record("_exit", kind::TEXT_EXT, 0x40),
                record("_start", kind::TEXT, 0),
                record("exit.o", kind::TEXT, 0x40),
                record("crt0.o", kind::TEXT, 0),
            ]),
            0,
        );

        let names = table.iter().map(|it| it.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["crt0.o", "_start", "exit.o", "_exit"]);
        assert_eq!(table.procedure_at(0x40), Some("_exit"));
        assert_eq!(table.procedure_at(0), Some("_start"));
    }

    #[test]
    fn sequence_is_sorted() {
        let records = (0..64)
            .map(|i| {
                let name = if rand::random::<bool>() { format!("u{}.o", i) } else { format!("_p{}", i) };

                record(&name, kind::TEXT + rand::random::<u8>() % 6, u32::from(rand::random::<u8>() % 16))
            })
            .collect::<Vec<_>>();
        let table = SymbolTable::parse(&table(&records), 0);

        for pair in table.as_slice().windows(2) {
            assert!(pair[0].addr <= pair[1].addr);
            if pair[0].addr == pair[1].addr {
                assert!(pair[0].is_unit() || !pair[1].is_unit(), "{} before {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn names_fill_all_eight_bytes() {
        let table = SymbolTable::parse(&record("_longnam", kind::TEXT, 2), 0);

        assert_eq!(table.procedure_at(2), Some("_longnam"));
    }

    #[test]
    fn values_are_rebased() {
        let table = SymbolTable::parse(&record("_main", kind::TEXT, 0x8000_0124), 0x8000_0000);
        let main = &table.as_slice()[0];

        assert_eq!(main.value, 0x8000_0124);
        assert_eq!(main.addr, 0x8000_0124);
        assert_eq!(main.to_string(), "80000124 t _main");
    }
}
