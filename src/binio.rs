//! Positioned, little-endian binary I/O over a disk file handle.
//!
//! Every on-disk record in this crate implements [`Record`] by hand —
//! never via `repr(C, packed)` + pointer reinterpretation — so that byte
//! layout is independent of host endianness and struct padding rules.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// A fixed-size on-disk record with an explicit byte layout.
pub trait Record: Sized {
    /// Encoded size in bytes; must match `to_bytes().len()` exactly.
    const SIZE: usize;

    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(buf: &[u8]) -> Self;
}

pub fn read_record<T: Record>(file: &mut File, offset: u64) -> io::Result<T> {
    let mut buf = vec![0u8; T::SIZE];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(T::from_bytes(&buf))
}

pub fn write_record<T: Record>(file: &mut File, offset: u64, value: &T) -> io::Result<()> {
    let buf = value.to_bytes();
    debug_assert_eq!(buf.len(), T::SIZE);
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&buf)?;
    Ok(())
}

/// Reads `n` bytes at `offset`. Short reads past end-of-file are
/// zero-filled rather than erroring.
pub fn read_bytes(file: &mut File, offset: u64, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    file.seek(SeekFrom::Start(offset))?;
    let mut read_total = 0;
    loop {
        match file.read(&mut buf[read_total..]) {
            Ok(0) => break,
            Ok(k) => read_total += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        if read_total == n {
            break;
        }
    }
    Ok(buf)
}

pub fn write_bytes(file: &mut File, offset: u64, bytes: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)
}

/// `convert_to_bytes(n, unit)`: `B`=1, `K`=1024, `M`=1024*1024.
pub fn convert_to_bytes(n: i64, unit: char) -> Option<i64> {
    let factor = match unit.to_ascii_uppercase() {
        'B' => 1,
        'K' => 1024,
        'M' => 1024 * 1024,
        _ => return None,
    };
    n.checked_mul(factor)
}

/// Copies `src` into a fixed-width, NUL-padded byte array of length `LEN`.
/// Truncates silently if `src` is longer than `LEN`.
pub fn pack_fixed_str(src: &str, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let bytes = src.as_bytes();
    let n = bytes.len().min(len);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// Reads a NUL-padded fixed-width byte array back into a trimmed `String`.
pub fn unpack_fixed_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::tempfile;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: i32,
        b: i64,
    }

    impl Record for Pair {
        const SIZE: usize = 12;
        fn to_bytes(&self) -> Vec<u8> {
            let mut buf = Vec::with_capacity(Self::SIZE);
            buf.extend_from_slice(&self.a.to_le_bytes());
            buf.extend_from_slice(&self.b.to_le_bytes());
            buf
        }
        fn from_bytes(buf: &[u8]) -> Self {
            let a = i32::from_le_bytes(buf[0..4].try_into().unwrap());
            let b = i64::from_le_bytes(buf[4..12].try_into().unwrap());
            Pair { a, b }
        }
    }

    #[test]
    fn round_trips_a_record_at_an_offset() {
        let mut f = tempfile().unwrap();
        f.write_all(&[0u8; 32]).unwrap();
        let p = Pair { a: -7, b: 123456789 };
        write_record(&mut f, 8, &p).unwrap();
        let back: Pair = read_record(&mut f, 8).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn zero_fills_short_reads_past_eof() {
        let mut f = tempfile().unwrap();
        f.write_all(&[1, 2, 3]).unwrap();
        let buf = read_bytes(&mut f, 0, 8).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn converts_units() {
        assert_eq!(convert_to_bytes(5, 'M'), Some(5 * 1024 * 1024));
        assert_eq!(convert_to_bytes(2, 'K'), Some(2048));
        assert_eq!(convert_to_bytes(9, 'B'), Some(9));
    }

    #[test]
    fn packs_and_unpacks_fixed_strings() {
        let packed = pack_fixed_str("P1", 16);
        assert_eq!(packed.len(), 16);
        assert_eq!(unpack_fixed_str(&packed), "P1");
    }
}
