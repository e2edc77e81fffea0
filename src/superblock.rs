//! Superblock sizing, layout, and bitmap operations.
//!
//! Grounded on the teacher's `mkfs::ext2::{Superblock, fill_bitmap}` —
//! same sizing-arithmetic shape, generalized from ext2 block groups to
//! this design's single sized region, and from a bit-per-bit bitmap to
//! the byte-per-bit (`'0'`/`'1'` ASCII) scheme the design mandates.

use crate::binio::{read_bytes, write_bytes, Record};
use crate::error::FsError;
use crate::inode::Inode;
use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

pub const FS_TYPE: i32 = 2;
pub const MAGIC: i32 = 0xEF53;
pub const BLOCK_SIZE: usize = 64;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub fs_type: i32,
    pub inodes_count: i32,
    pub blocks_count: i32,
    pub free_inodes_count: i32,
    pub free_blocks_count: i32,
    pub mtime: i64,
    pub umtime: i64,
    pub mnt_count: i32,
    pub magic: i32,
    pub inode_size: i32,
    pub block_size: i32,
    pub next_inode_hint: i32,
    pub next_block_hint: i32,
    pub bm_inode_start: i32,
    pub bm_block_start: i32,
    pub inode_table_start: i32,
    pub block_table_start: i32,
}

impl Record for SuperBlock {
    const SIZE: usize = 4 * 15 + 8 * 2;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.fs_type.to_le_bytes());
        buf.extend_from_slice(&self.inodes_count.to_le_bytes());
        buf.extend_from_slice(&self.blocks_count.to_le_bytes());
        buf.extend_from_slice(&self.free_inodes_count.to_le_bytes());
        buf.extend_from_slice(&self.free_blocks_count.to_le_bytes());
        buf.extend_from_slice(&self.mtime.to_le_bytes());
        buf.extend_from_slice(&self.umtime.to_le_bytes());
        buf.extend_from_slice(&self.mnt_count.to_le_bytes());
        buf.extend_from_slice(&self.magic.to_le_bytes());
        buf.extend_from_slice(&self.inode_size.to_le_bytes());
        buf.extend_from_slice(&self.block_size.to_le_bytes());
        buf.extend_from_slice(&self.next_inode_hint.to_le_bytes());
        buf.extend_from_slice(&self.next_block_hint.to_le_bytes());
        buf.extend_from_slice(&self.bm_inode_start.to_le_bytes());
        buf.extend_from_slice(&self.bm_block_start.to_le_bytes());
        buf.extend_from_slice(&self.inode_table_start.to_le_bytes());
        buf.extend_from_slice(&self.block_table_start.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        fn i32_at(buf: &[u8], off: usize) -> i32 {
            i32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
        }
        fn i64_at(buf: &[u8], off: usize) -> i64 {
            i64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
        }
        SuperBlock {
            fs_type: i32_at(buf, 0),
            inodes_count: i32_at(buf, 4),
            blocks_count: i32_at(buf, 8),
            free_inodes_count: i32_at(buf, 12),
            free_blocks_count: i32_at(buf, 16),
            mtime: i64_at(buf, 20),
            umtime: i64_at(buf, 28),
            mnt_count: i32_at(buf, 36),
            magic: i32_at(buf, 40),
            inode_size: i32_at(buf, 44),
            block_size: i32_at(buf, 48),
            next_inode_hint: i32_at(buf, 52),
            next_block_hint: i32_at(buf, 56),
            bm_inode_start: i32_at(buf, 60),
            bm_block_start: i32_at(buf, 64),
            inode_table_start: i32_at(buf, 68),
            block_table_start: i32_at(buf, 72),
        }
    }
}

impl SuperBlock {
    /// Sizing: `n = floor((P - sizeof(SuperBlock)) / (4 + sizeof(Inode) + 3*sizeof(FileBlock)))`.
    /// Total inodes = n, total blocks = 3n. Offsets are relative to the
    /// partition start (caller adds the partition's absolute start).
    pub fn new_for_partition(partition_size: i32) -> Result<Self, FsError> {
        let denom = 4 + Inode::SIZE as i64 + 3 * BLOCK_SIZE as i64;
        let available = partition_size as i64 - Self::SIZE as i64;
        if available <= 0 {
            return Err(FsError::state("partition too small to format"));
        }
        let n = (available / denom) as i32;
        if n <= 0 {
            return Err(FsError::state("partition too small to hold any inodes"));
        }
        let inodes_count = n;
        let blocks_count = 3 * n;

        let bm_inode_start = Self::SIZE as i32;
        let bm_block_start = bm_inode_start + inodes_count;
        let inode_table_start = bm_block_start + blocks_count;
        let block_table_start = inode_table_start + inodes_count * Inode::SIZE as i32;

        let now = now_unix();
        Ok(SuperBlock {
            fs_type: FS_TYPE,
            inodes_count,
            blocks_count,
            free_inodes_count: inodes_count,
            free_blocks_count: blocks_count,
            mtime: now,
            umtime: now,
            mnt_count: 0,
            magic: MAGIC,
            inode_size: Inode::SIZE as i32,
            block_size: BLOCK_SIZE as i32,
            next_inode_hint: 0,
            next_block_hint: 0,
            bm_inode_start,
            bm_block_start,
            inode_table_start,
            block_table_start,
        })
    }

    pub fn is_formatted(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn read_inode_bitmap(&self, file: &mut File, part_start: i64) -> Result<Vec<u8>, FsError> {
        Ok(read_bytes(
            file,
            (part_start + self.bm_inode_start as i64) as u64,
            self.inodes_count as usize,
        )?)
    }

    pub fn read_block_bitmap(&self, file: &mut File, part_start: i64) -> Result<Vec<u8>, FsError> {
        Ok(read_bytes(
            file,
            (part_start + self.bm_block_start as i64) as u64,
            self.blocks_count as usize,
        )?)
    }

    pub fn inode_offset(&self, part_start: i64, index: i32) -> u64 {
        (part_start + self.inode_table_start as i64 + index as i64 * self.inode_size as i64) as u64
    }

    pub fn block_offset(&self, part_start: i64, index: i32) -> u64 {
        (part_start + self.block_table_start as i64 + index as i64 * self.block_size as i64) as u64
    }

    /// Zero-fills (ASCII `'0'`) both bitmaps.
    pub fn initialize_bitmaps(&self, file: &mut File, part_start: i64) -> Result<(), FsError> {
        let inode_bm = vec![b'0'; self.inodes_count as usize];
        let block_bm = vec![b'0'; self.blocks_count as usize];
        write_bytes(file, (part_start + self.bm_inode_start as i64) as u64, &inode_bm)?;
        write_bytes(file, (part_start + self.bm_block_start as i64) as u64, &block_bm)?;
        Ok(())
    }

    /// Linear scan starting at the stored hint, wrapping modulo size.
    /// Advances the hint past the returned index on success.
    pub fn get_free_inode_index(&mut self, file: &mut File, part_start: i64) -> Result<i32, FsError> {
        let idx = Self::scan_bitmap(
            file,
            (part_start + self.bm_inode_start as i64) as u64,
            self.inodes_count,
            self.next_inode_hint,
        )?;
        self.next_inode_hint = (idx + 1) % self.inodes_count.max(1);
        Ok(idx)
    }

    pub fn get_free_block_index(&mut self, file: &mut File, part_start: i64) -> Result<i32, FsError> {
        let idx = Self::scan_bitmap(
            file,
            (part_start + self.bm_block_start as i64) as u64,
            self.blocks_count,
            self.next_block_hint,
        )?;
        self.next_block_hint = (idx + 1) % self.blocks_count.max(1);
        Ok(idx)
    }

    fn scan_bitmap(file: &mut File, bm_offset: u64, count: i32, hint: i32) -> Result<i32, FsError> {
        let bm = read_bytes(file, bm_offset, count as usize)?;
        for k in 0..count {
            let i = (hint + k) % count;
            if bm[i as usize] == b'0' {
                return Ok(i);
            }
        }
        Err(FsError::state("no free index in bitmap"))
    }

    pub fn update_inode_bitmap(&mut self, file: &mut File, part_start: i64, i: i32, used: bool) -> Result<(), FsError> {
        self.update_bitmap(file, (part_start + self.bm_inode_start as i64) as u64, i, used, true)
    }

    pub fn update_block_bitmap(&mut self, file: &mut File, part_start: i64, i: i32, used: bool) -> Result<(), FsError> {
        self.update_bitmap(file, (part_start + self.bm_block_start as i64) as u64, i, used, false)
    }

    fn update_bitmap(
        &mut self,
        file: &mut File,
        bm_offset: u64,
        i: i32,
        used: bool,
        is_inode: bool,
    ) -> Result<(), FsError> {
        let byte = if used { b'1' } else { b'0' };
        write_bytes(file, bm_offset + i as u64, &[byte])?;
        let delta: i32 = if used { -1 } else { 1 };
        if is_inode {
            self.free_inodes_count += delta;
        } else {
            self.free_blocks_count += delta;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::tempfile;

    #[test]
    fn sizing_respects_invariant_3() {
        let sb = SuperBlock::new_for_partition(1_000_000).unwrap();
        assert_eq!(sb.blocks_count, 3 * sb.inodes_count);
        assert_eq!(sb.free_inodes_count, sb.inodes_count);
        assert_eq!(sb.free_blocks_count, sb.blocks_count);
        assert_eq!(sb.magic, MAGIC);
    }

    #[test]
    fn bitmap_scan_wraps_and_advances_hint() {
        let mut sb = SuperBlock::new_for_partition(1_000_000).unwrap();
        let mut f = tempfile().unwrap();
        let total = sb.bm_block_start as usize + sb.blocks_count as usize;
        f.write_all(&vec![0u8; total]).unwrap();
        sb.initialize_bitmaps(&mut f, 0).unwrap();

        let first = sb.get_free_inode_index(&mut f, 0).unwrap();
        assert_eq!(first, 0);
        sb.update_inode_bitmap(&mut f, 0, first, true).unwrap();
        assert_eq!(sb.free_inodes_count, sb.inodes_count - 1);

        let second = sb.get_free_inode_index(&mut f, 0).unwrap();
        assert_eq!(second, 1);
    }

    #[test]
    fn fails_when_bitmap_exhausted() {
        let mut sb = SuperBlock::new_for_partition(1_000_000).unwrap();
        let mut f = tempfile().unwrap();
        let total = sb.bm_block_start as usize + sb.blocks_count as usize;
        f.write_all(&vec![b'1'; total]).unwrap();
        let err = sb.get_free_inode_index(&mut f, 0).unwrap_err();
        assert!(matches!(err, FsError::State(_)));
    }
}
