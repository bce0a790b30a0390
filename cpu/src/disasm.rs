// SPDX-License-Identifier: MPL-2.0

//! The symbolic disassembler.

use std::{collections::VecDeque, fmt};

use vaxrun_aout::SymbolTable;
use vaxrun_util::Int;

use crate::{
    instr::{self, Instr, Op, Opcode},
    mem::{self, Cursor},
    Memory,
};

impl<'a> Disassembler<'a> {
    /// Creates a new `Disassembler` over `mem`.
    ///
    /// `entry` is the program entry point, which begins with a register mask rather than an
    /// instruction.
    pub fn new(mem: &'a Memory, symbols: &'a SymbolTable, entry: Option<u32>) -> Self {
        Self { mem, symbols, entry }
    }
}

#[derive(Clone, Copy)]
pub struct Disassembler<'a> {
    mem: &'a Memory,
    symbols: &'a SymbolTable,
    entry: Option<u32>,
}

/// One instruction, or one directive standing in for an instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decoded {
    pub addr: u32,
    pub len: u32,
    pub text: String,
    /// Addresses referred to by the instruction.
    pub targets: Vec<u32>,
    /// The jump table that follows a `case` instruction.
    pub table: Option<CaseTable>,
}

impl Decoded {
    pub fn next_addr(&self) -> u32 {
        self.addr.wrapping_add(self.len)
    }
}

/// The inline table of word displacements that follows `caseb`, `casew`, and `casel`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CaseTable {
    /// The address of the first entry, which is also the origin of every displacement.
    pub base: u32,
    pub entries: u32,
}

impl<'a> Disassembler<'a> {
    /// Decodes the instruction at `addr`.
    ///
    /// Opcodes missing from the catalog decode as a raw `.word`.
    pub fn decode_one(&self, addr: u32) -> Result<Decoded, mem::Error> {
        let mut cursor = Cursor::new(self.mem, addr);
        let desc = match instr::catalog().decode(&mut cursor)? {
            Opcode::Known(desc) => desc,
            raw @ Opcode::Raw(_) => {
                return Ok(Decoded {
                    addr,
                    len: 2,
                    text: raw.to_string(),
                    targets: Vec::new(),
                    table: None,
                });
            }
        };
        let instr = Instr::decode(addr, desc, &mut cursor)?;

        Ok(Decoded {
            addr,
            len: instr.len,
            text: instr.render(self.symbols),
            targets: instr.targets().collect(),
            table: case_table(&instr),
        })
    }

    /// Decodes the 2-byte register mask at the entry of a procedure.
    pub fn decode_mask(&self, addr: u32) -> Result<Decoded, mem::Error> {
        let mask = self.mem.read_16(addr)?;

        Ok(Decoded {
            addr,
            len: 2,
            text: format!(".word {}", Int::from(mask)),
            targets: Vec::new(),
            table: None,
        })
    }

    /// Lists `start..end`, interleaving labels with instructions.
    pub fn decode_range(&self, start: u32, end: u32) -> Listing<'a> {
        let marks = self
            .symbols
            .iter()
            .map(|it| Mark {
                addr: it.addr,
                kind: if it.is_unit() {
                    MarkKind::Unit(it.name.clone())
                } else {
                    MarkKind::Procedure(it.name.clone())
                },
            })
            .collect();

        Listing {
            dis: *self,
            pos: start,
            end,
            marks,
            table: None,
            is_mask: false,
            state: State::Decoding,
        }
    }
}

fn case_table(instr: &Instr) -> Option<CaseTable> {
    if !matches!(instr.op(), Op::Caseb | Op::Casew | Op::Casel) {
        return None;
    }
    let limit = instr.operands.last()?.spec.constant()?;

    Some(CaseTable {
        base: instr.next_addr(),
        entries: u32::try_from(limit).ok()?.checked_add(1)?,
    })
}

/// A line of a listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// The start of a compilation unit.
    Section { addr: u32, name: String },
    /// The start of a procedure or variable.
    Label { addr: u32, name: String },
    Instr { addr: u32, bytes: Vec<u8>, text: String },
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section { name, .. } => write!(f, "[{}]", name),
            Self::Label { name, .. } => write!(f, "{}:", name),
            Self::Instr { addr, bytes, text } => {
                vaxrun_util::write_listing(f, *addr, bytes, text)
            }
        }
    }
}

#[derive(Clone, Debug)]
struct Mark {
    addr: u32,
    kind: MarkKind,
}

#[derive(Clone, Debug)]
enum MarkKind {
    Unit(String),
    Procedure(String),
    /// A branch or data target with no symbol of its own.
    Label,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// At the start of a line; marks behind the cursor are discarded.
    Decoding,
    /// Emitting the marks located at the cursor, then deciding what follows them.
    EmittingLabel,
    /// Emitting bytes that would otherwise have hidden a mark.
    EmittingRawBytes { len: u32 },
    /// Emitting one entry of a pending case table.
    ConsumingTableEntry,
}

#[derive(Clone, Copy, Debug)]
struct PendingTable {
    base: u32,
    remaining: u32,
}

/// An iterator over the [`Line`]s of an address range.
///
/// Decoding never stops at bad data. Instead, bytes that cannot be decoded, or whose decoding would
/// run past the next label or the end of the range, are listed as `.byte` directives.
pub struct Listing<'a> {
    dis: Disassembler<'a>,
    pos: u32,
    end: u32,
    /// Symbols and branch targets ahead of the cursor, in address order.
    marks: VecDeque<Mark>,
    table: Option<PendingTable>,
    /// Whether the next entry is a procedure's register mask.
    is_mask: bool,
    state: State,
}

impl Listing<'_> {
    /// Records a branch target, after any mark already at the same address.
    fn add_label(&mut self, addr: u32) {
        let idx = self.marks.partition_point(|it| it.addr <= addr);
        self.marks.insert(idx, Mark { addr, kind: MarkKind::Label });
    }

    /// The address at which the entry beginning at the cursor must end at the latest.
    fn limit(&self) -> u32 {
        self.marks.front().map_or(self.end, |it| it.addr.min(self.end))
    }

    fn emit(&mut self, addr: u32, len: u32, text: String) -> Option<Line> {
        let bytes = self.dis.mem.slice(addr, len).ok()?.to_vec();
        self.pos = addr.wrapping_add(len);
        self.state = State::Decoding;

        Some(Line::Instr { addr, bytes, text })
    }

    fn decode_instr(&mut self) -> Option<Line> {
        let decoded = if self.is_mask {
            self.dis.decode_mask(self.pos)
        } else {
            self.dis.decode_one(self.pos)
        };

        match decoded {
            Ok(decoded) if decoded.next_addr() <= self.limit() => {
                let next = decoded.next_addr();
                for target in decoded.targets.iter().filter(|it| **it >= next) {
                    self.add_label(*target);
                }
                self.table = decoded
                    .table
                    .map(|it| PendingTable { base: it.base, remaining: it.entries });

                self.emit(decoded.addr, decoded.len, decoded.text)
            }
            _ => {
                self.state = State::EmittingRawBytes { len: self.limit().wrapping_sub(self.pos) };

                self.next()
            }
        }
    }

    fn consume_table_entry(&mut self, mut table: PendingTable) -> Option<Line> {
        let entry = match self.dis.mem.read_16(self.pos) {
            Ok(entry) if self.pos.wrapping_add(2) <= self.limit() => entry,
            _ => {
                self.table = None;
                self.state = State::EmittingRawBytes { len: self.limit().wrapping_sub(self.pos) };

                return self.next();
            }
        };

        let target = table.base.wrapping_add(entry as i16 as u32);
        self.add_label(target);
        table.remaining -= 1;
        self.table = Some(table).filter(|it| it.remaining > 0);

        self.emit(self.pos, 2, format!(".word {:#x}-{:#x}", target, table.base))
    }
}

impl Iterator for Listing<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            match self.state {
                State::Decoding => {
                    if self.pos >= self.end {
                        return None;
                    }
                    while self.marks.front().map_or(false, |it| it.addr < self.pos) {
                        self.marks.pop_front();
                    }
                    self.is_mask = self.dis.entry == Some(self.pos);
                    self.state = State::EmittingLabel;
                }
                State::EmittingLabel => {
                    if self.marks.front().map_or(false, |it| it.addr == self.pos) {
                        let Some(mark) = self.marks.pop_front() else {
                            continue;
                        };
                        match mark.kind {
                            MarkKind::Unit(name) => {
                                return Some(Line::Section { addr: mark.addr, name });
                            }
                            MarkKind::Procedure(name) => {
                                self.is_mask = true;

                                return Some(Line::Label { addr: mark.addr, name });
                            }
                            MarkKind::Label => continue,
                        }
                    }

                    if self.table.is_some() {
                        self.state = State::ConsumingTableEntry;
                    } else {
                        return self.decode_instr();
                    }
                }
                State::EmittingRawBytes { len } => {
                    let len = len.max(1).min(self.end.wrapping_sub(self.pos));
                    let bytes = self.dis.mem.slice(self.pos, len).ok()?;
                    let text = format!(
                        ".byte {}",
                        bytes
                            .iter()
                            .map(|byte| format!("{:#04x}", byte))
                            .collect::<Vec<String>>()
                            .join(", "),
                    );

                    return self.emit(self.pos, len, text);
                }
                State::ConsumingTableEntry => {
                    let Some(table) = self.table else {
                        self.state = State::Decoding;
                        continue;
                    };

                    return self.consume_table_entry(table);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use vaxrun_aout::{kind, Symbol};

    use super::*;

    fn listing(bytes: &[u8], symbols: Vec<Symbol>, entry: Option<u32>) -> String {
        let mem = Memory::from_bytes(0, bytes.to_vec());
        let symbols = SymbolTable::from_symbols(symbols);
        let dis = Disassembler::new(&mem, &symbols, entry);

        dis.decode_range(0, bytes.len() as u32)
            .map(|line| format!("{}\n", line))
            .collect()
    }

    fn decode_one(addr: u32, bytes: &[u8]) -> Decoded {
        let mem = Memory::from_bytes(addr, bytes.to_vec());
        let symbols = SymbolTable::default();

        Disassembler::new(&mem, &symbols, None).decode_one(addr).unwrap()
    }

    #[test]
    fn decodes_register_move() {
        let decoded = decode_one(0, &[0xd0, 0x51, 0x52]);

        assert_eq!(decoded.text, "movl r1,r2");
        assert_eq!(decoded.len, 3);
    }

    #[test]
    fn decodes_byte_branch() {
        let decoded = decode_one(0x1000, &[0x11, 0x05]);

        assert_eq!(decoded.text, "brb 0x1007");
        assert_eq!(decoded.len, 2);
        assert_eq!(decoded.targets, [0x1007]);
    }

    #[test]
    fn decodes_unknown_opcode_as_word() {
        let decoded = decode_one(0, &[0x57, 0x11]);

        assert_eq!(decoded.text, ".word 0x5711");
        assert_eq!(decoded.len, 2);
    }

    #[test]
    fn reports_case_tables() {
        let decoded = decode_one(0x100, &[0xcf, 0x50, 0x00, 0x8f, 0x02, 0x00, 0x00, 0x00]);

        assert_eq!(decoded.text, "casel r0,$0,$2");
        assert_eq!(decoded.table, Some(CaseTable { base: 0x108, entries: 3 }));
    }

    #[test]
    fn cursor_advances_past_every_operand() {
        // Each instruction is followed by padding that must not be consumed.
        let cases: &[(&[u8], u32)] = &[
            (&[0x01], 1),
            (&[0xd0, 0x8f, 1, 2, 3, 4, 0x50], 7),
            (&[0xc1, 0xa0, 0x04, 0xc1, 0x00, 0x01, 0x41, 0x62], 8),
            (&[0x31, 0x00, 0x01], 3),
            (&[0xfb, 0x02, 0xef, 0x10, 0x00, 0x00, 0x00], 7),
            (&[0xfd, 0x7d, 0x50, 0x52], 4),
            (&[0xe0, 0x03, 0x50, 0x10], 4),
        ];
        for (bytes, len) in cases {
            let mut padded = bytes.to_vec();
            padded.extend([0; 8]);
            let decoded = decode_one(0, &padded);

            assert_eq!(decoded.len, *len, "{}", decoded.text);
        }
    }

    #[test]
    fn lists_procedures_with_entry_masks() {
        let symbols = vec![
            Symbol::new("_main", kind::TEXT_EXT, 0),
            Symbol::new("crt0.o", kind::TEXT, 0),
        ];
        let bytes = [0x00, 0x00, 0xd0, 0x01, 0x50, 0x04];

        assert_eq!(
            listing(&bytes, symbols, Some(0)),
            indoc! {"
                [crt0.o]
                _main:
                00000000: 00 00                    .word 0
                00000002: d0 01 50                 movl $1,r0
                00000005: 04                       ret
            "},
        );
    }

    #[test]
    fn lists_case_tables() {
        let bytes = [0xcf, 0x50, 0x00, 0x01, 0x04, 0x00, 0x06, 0x00, 0x04, 0x01, 0x00];

        assert_eq!(
            listing(&bytes, vec![], None),
            indoc! {"
                00000000: cf 50 00 01              casel r0,$0,$1
                00000004: 04 00                    .word 0x8-0x4
                00000006: 06 00                    .word 0xa-0x4
                00000008: 04                       ret
                00000009: 01                       nop
                0000000a: 00                       halt
            "},
        );
    }

    #[test]
    fn resynchronizes_at_branch_targets() {
        let bytes = [0x11, 0x01, 0xd0, 0x50, 0x51, 0x52];

        assert_eq!(
            listing(&bytes, vec![], None),
            indoc! {"
                00000000: 11 01                    brb 0x3
                00000002: d0                       .byte 0xd0
                00000003: 50 51 52                 movf r1,r2
            "},
        );
    }

    #[test]
    fn resynchronizes_at_symbols() {
        let symbols = vec![Symbol::new("_buf", kind::DATA, 2)];
        let bytes = [0x01, 0xd0, 0x50, 0x51, 0x04];

        assert_eq!(
            listing(&bytes, symbols, None),
            indoc! {"
                00000000: 01                       nop
                00000001: d0                       .byte 0xd0
                _buf:
                00000002: 50 51                    .word 0x5150
                00000004: 04                       ret
            "},
        );
    }

    #[test]
    fn truncated_tail_is_listed_as_bytes() {
        let bytes = [0x04, 0xd0, 0x50];

        assert_eq!(
            listing(&bytes, vec![], None),
            indoc! {"
                00000000: 04                       ret
                00000001: d0 50                    .byte 0xd0, 0x50
            "},
        );
    }

    #[test]
    fn long_instructions_wrap() {
        let bytes = [0xd0, 0x8f, 0x78, 0x56, 0x34, 0x12, 0xef, 0x00, 0x01, 0x00, 0x00];
        let mut padded = bytes.to_vec();
        padded.extend([0; 0x110]);
        let text = listing(&padded, vec![], None);

        assert!(text.starts_with(indoc! {"
            00000000: d0 8f 78 56 34 12 ef 00  movl $0x12345678,0x10b
            00000008: 01 00 00
        "}));
    }
}
