//! Inode, folder/file/pointer block records.
//!
//! Grounded on the teacher's `mkfs::ext2::INode` (same direct + single/
//! double/triple indirect pointer shape, scaled to 15 total slots) and
//! `original_source`'s `structures/block.go` for the block variants.

use crate::binio::{pack_fixed_str, unpack_fixed_str, Record};
use std::time::{SystemTime, UNIX_EPOCH};

pub const POINTER_COUNT: usize = 15;
pub const DIRECT_POINTERS: usize = 12;
pub const SINGLE_INDIRECT: usize = 12;
pub const DOUBLE_INDIRECT: usize = 13;
pub const TRIPLE_INDIRECT: usize = 14;
pub const POINTERS_PER_BLOCK: usize = 16;
pub const FOLDER_ENTRIES: usize = 4;
pub const FOLDER_NAME_LEN: usize = 12;
pub const FILE_BLOCK_BYTES: usize = 64;
pub const NULL_PTR: i32 = -1;

pub const INODE_TYPE_DIR: u8 = 0;
pub const INODE_TYPE_FILE: u8 = 1;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub uid: i32,
    pub gid: i32,
    pub size: i32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
    pub pointers: [i32; POINTER_COUNT],
    pub itype: u8,
    pub perm: [u8; 3],
}

impl Inode {
    pub fn new(uid: i32, gid: i32, size: i32, itype: u8, perm: [u8; 3]) -> Self {
        let now = now_unix();
        Inode {
            uid,
            gid,
            size,
            atime: now,
            ctime: now,
            mtime: now,
            pointers: [NULL_PTR; POINTER_COUNT],
            itype,
            perm,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.itype == INODE_TYPE_DIR
    }

    pub fn is_file(&self) -> bool {
        self.itype == INODE_TYPE_FILE
    }

    pub fn touch_mtime(&mut self) {
        self.mtime = now_unix();
    }

    /// Places `block_index` in the first `-1` slot, direct slots first.
    /// Errors if all 15 slots are occupied.
    pub fn push_block(&mut self, block_index: i32) -> Result<(), crate::error::FsError> {
        for slot in self.pointers.iter_mut() {
            if *slot == NULL_PTR {
                *slot = block_index;
                return Ok(());
            }
        }
        Err(crate::error::FsError::state("inode has no free pointer slot"))
    }
}

impl Record for Inode {
    const SIZE: usize = 4 + 4 + 4 + 8 + 8 + 8 + 4 * POINTER_COUNT + 1 + 3;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.uid.to_le_bytes());
        buf.extend_from_slice(&self.gid.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&self.atime.to_le_bytes());
        buf.extend_from_slice(&self.ctime.to_le_bytes());
        buf.extend_from_slice(&self.mtime.to_le_bytes());
        for p in &self.pointers {
            buf.extend_from_slice(&p.to_le_bytes());
        }
        buf.push(self.itype);
        buf.extend_from_slice(&self.perm);
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let uid = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let gid = i32::from_le_bytes(buf[4..8].try_into().unwrap());
        let size = i32::from_le_bytes(buf[8..12].try_into().unwrap());
        let atime = i64::from_le_bytes(buf[12..20].try_into().unwrap());
        let ctime = i64::from_le_bytes(buf[20..28].try_into().unwrap());
        let mtime = i64::from_le_bytes(buf[28..36].try_into().unwrap());
        let mut pointers = [0i32; POINTER_COUNT];
        let mut off = 36;
        for p in pointers.iter_mut() {
            *p = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
            off += 4;
        }
        let itype = buf[off];
        let perm = [buf[off + 1], buf[off + 2], buf[off + 3]];
        Inode {
            uid,
            gid,
            size,
            atime,
            ctime,
            mtime,
            pointers,
            itype,
            perm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: [u8; FOLDER_NAME_LEN],
    pub inode: i32,
}

impl FolderEntry {
    pub fn empty() -> Self {
        FolderEntry {
            name: pack_name("-"),
            inode: NULL_PTR,
        }
    }

    pub fn name_str(&self) -> String {
        unpack_fixed_str(&self.name)
    }
}

fn pack_name(s: &str) -> [u8; FOLDER_NAME_LEN] {
    let mut out = [0u8; FOLDER_NAME_LEN];
    let packed = pack_fixed_str(s, FOLDER_NAME_LEN);
    out.copy_from_slice(&packed);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderBlock {
    pub entries: [FolderEntry; FOLDER_ENTRIES],
}

impl FolderBlock {
    pub fn empty() -> Self {
        FolderBlock {
            entries: [FolderEntry::empty(); FOLDER_ENTRIES],
        }
    }

    pub fn set(&mut self, slot: usize, name: &str, inode: i32) {
        self.entries[slot] = FolderEntry {
            name: pack_name(name),
            inode,
        };
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.inode == NULL_PTR)
    }
}

impl Record for FolderBlock {
    const SIZE: usize = FOLDER_ENTRIES * (FOLDER_NAME_LEN + 4);

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        for e in &self.entries {
            buf.extend_from_slice(&e.name);
            buf.extend_from_slice(&e.inode.to_le_bytes());
        }
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mut entries = [FolderEntry::empty(); FOLDER_ENTRIES];
        let mut off = 0;
        for e in entries.iter_mut() {
            let mut name = [0u8; FOLDER_NAME_LEN];
            name.copy_from_slice(&buf[off..off + FOLDER_NAME_LEN]);
            let inode = i32::from_le_bytes(
                buf[off + FOLDER_NAME_LEN..off + FOLDER_NAME_LEN + 4]
                    .try_into()
                    .unwrap(),
            );
            *e = FolderEntry { name, inode };
            off += FOLDER_NAME_LEN + 4;
        }
        FolderBlock { entries }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub bytes: [u8; FILE_BLOCK_BYTES],
}

impl FileBlock {
    pub fn empty() -> Self {
        FileBlock {
            bytes: [0u8; FILE_BLOCK_BYTES],
        }
    }

    pub fn from_slice(src: &[u8]) -> Self {
        let mut bytes = [0u8; FILE_BLOCK_BYTES];
        let n = src.len().min(FILE_BLOCK_BYTES);
        bytes[..n].copy_from_slice(&src[..n]);
        FileBlock { bytes }
    }
}

impl Record for FileBlock {
    const SIZE: usize = FILE_BLOCK_BYTES;

    fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mut bytes = [0u8; FILE_BLOCK_BYTES];
        bytes.copy_from_slice(&buf[..FILE_BLOCK_BYTES]);
        FileBlock { bytes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerBlock {
    pub pointers: [i32; POINTERS_PER_BLOCK],
}

impl PointerBlock {
    pub fn empty() -> Self {
        PointerBlock {
            pointers: [NULL_PTR; POINTERS_PER_BLOCK],
        }
    }
}

impl Record for PointerBlock {
    const SIZE: usize = 4 * POINTERS_PER_BLOCK;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        for p in &self.pointers {
            buf.extend_from_slice(&p.to_le_bytes());
        }
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mut pointers = [0i32; POINTERS_PER_BLOCK];
        let mut off = 0;
        for p in pointers.iter_mut() {
            *p = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
            off += 4;
        }
        PointerBlock { pointers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inode_push_block_fills_direct_slots_first() {
        let mut inode = Inode::new(1, 1, 0, INODE_TYPE_FILE, *b"664");
        inode.push_block(7).unwrap();
        assert_eq!(inode.pointers[0], 7);
    }

    #[test]
    fn inode_errors_when_all_slots_full() {
        let mut inode = Inode::new(1, 1, 0, INODE_TYPE_FILE, *b"664");
        for i in 0..POINTER_COUNT {
            inode.push_block(i as i32).unwrap();
        }
        assert!(inode.push_block(99).is_err());
    }

    #[test]
    fn folder_block_round_trips() {
        let mut fb = FolderBlock::empty();
        fb.set(0, ".", 5);
        fb.set(1, "..", 2);
        let bytes = fb.to_bytes();
        let back = FolderBlock::from_bytes(&bytes);
        assert_eq!(back.entries[0].name_str(), ".");
        assert_eq!(back.entries[0].inode, 5);
        assert_eq!(back.entries[1].name_str(), "..");
        assert_eq!(back.first_free_slot(), Some(2));
    }
}
