// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text formatting shared by the disassembler, the interpreter's diagnostics, and the command-line
//! interface.

use std::fmt;

/// The number of instruction bytes shown on one row of a listing.
pub const ROW_LEN: usize = 8;

/// An integer as it appears in assembly text.
///
/// Values below ten are written in decimal and everything else in hexadecimal with an `0x` prefix.
/// Negative values carry a leading `-` rather than being shown in two's complement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Int(pub i128);

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();

        if magnitude < 10 {
            write!(f, "{}{}", sign, magnitude)
        } else {
            write!(f, "{}{:#x}", sign, magnitude)
        }
    }
}

macro_rules! impl_from_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Int {
                fn from(value: $ty) -> Self {
                    Self(i128::from(value))
                }
            }
        )*
    };
}

impl_from_for_int!(i8, i16, i32, i64, u8, u16, u32, u64);

/// Writes one listing entry: `bytes`, as located at `addr`, followed by `text`.
///
/// Bytes are shown eight to a row, each row prefixed by its address. `text` follows the first row,
/// which is padded to full width when shorter; further rows hold only bytes.
pub fn write_listing(
    w: &mut impl fmt::Write,
    addr: u32,
    bytes: &[u8],
    text: &str,
) -> fmt::Result {
    if bytes.is_empty() {
        return write!(w, "{:08x}:{:pad$}  {}", addr, "", text, pad = ROW_LEN * 3);
    }

    for (row_idx, row) in bytes.chunks(ROW_LEN).enumerate() {
        if row_idx > 0 {
            writeln!(w)?;
        }

        write!(w, "{:08x}:", addr.wrapping_add((row_idx * ROW_LEN) as u32))?;
        for byte in row {
            write!(w, " {:02x}", byte)?;
        }

        if row_idx == 0 {
            let pad = (ROW_LEN - row.len()) * 3;
            write!(w, "{:pad$}  {}", "", text, pad = pad)?;
        }
    }

    Ok(())
}

/// Like [`write_listing`], but to a fresh `String`.
pub fn listing(addr: u32, bytes: &[u8], text: &str) -> String {
    let mut out = String::new();
    // Writing to a `String` cannot fail.
    let _ = write_listing(&mut out, addr, bytes, text);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! def_int_test {
        ($fn_name:ident, $value:expr, $expected:literal $(,)?) => {
            #[test]
            fn $fn_name() {
                assert_eq!(Int::from($value).to_string(), $expected);
            }
        };
    }

    def_int_test!(int_zero, 0u8, "0");
    def_int_test!(int_nine, 9i32, "9");
    def_int_test!(int_ten, 10u32, "0xa");
    def_int_test!(int_negative_small, -4i8, "-4");
    def_int_test!(int_negative_large, -0x20i16, "-0x20");
    def_int_test!(int_min, i32::MIN, "-0x80000000");
    def_int_test!(int_wide, u64::MAX, "0xffffffffffffffff");

    #[test]
    fn short_entry_is_padded() {
        assert_eq!(
            listing(0x1000, &[0xd0, 0x51, 0x52], "movl r1,r2"),
            "00001000: d0 51 52                 movl r1,r2",
        );
    }

    #[test]
    fn full_row_is_not_padded() {
        assert_eq!(
            listing(0, &[0; 8], "x"),
            "00000000: 00 00 00 00 00 00 00 00  x",
        );
    }

    #[test]
    fn long_entry_continues_on_further_rows() {
        let bytes = (0..11).collect::<Vec<u8>>();

        assert_eq!(
            listing(0x20, &bytes, "movc3 ..."),
            "00000020: 00 01 02 03 04 05 06 07  movc3 ...\n00000028: 08 09 0a",
        );
    }
}
