//! The filesystem service: path resolution, directory and file
//! operations, block allocation/free across the indirection hierarchy,
//! and the `mkfs` bootstrap. Operates on a single (open file handle,
//! in-memory superblock, partition start offset) triple for the
//! lifetime of one command — nothing here is cached across commands,
//! matching the single-writer, re-read-every-time policy.

use crate::binio::{read_record, write_record};
use crate::error::FsError;
use crate::inode::{
    FileBlock, FolderBlock, Inode, PointerBlock, DOUBLE_INDIRECT, FILE_BLOCK_BYTES, INODE_TYPE_DIR,
    INODE_TYPE_FILE, NULL_PTR, POINTERS_PER_BLOCK, POINTER_COUNT, SINGLE_INDIRECT, TRIPLE_INDIRECT,
};
use crate::superblock::{SuperBlock, BLOCK_SIZE};
use std::collections::HashMap;
use std::fs::File;

pub const USERS_FILE_NAME: &str = "users.txt";
pub const USERS_FILE_BOOTSTRAP: &str = "1,G,root\n1,U,root,root,123\n";

pub struct Ext2Like<'a> {
    pub file: &'a mut File,
    pub sb: SuperBlock,
    pub part_start: i64,
}

impl<'a> Ext2Like<'a> {
    pub fn new(file: &'a mut File, sb: SuperBlock, part_start: i64) -> Self {
        Ext2Like { file, sb, part_start }
    }

    fn read_inode(&mut self, index: i32) -> Result<Inode, FsError> {
        let off = self.sb.inode_offset(self.part_start, index);
        Ok(read_record(self.file, off)?)
    }

    fn write_inode(&mut self, index: i32, inode: &Inode) -> Result<(), FsError> {
        let off = self.sb.inode_offset(self.part_start, index);
        Ok(write_record(self.file, off, inode)?)
    }

    fn read_folder_block(&mut self, index: i32) -> Result<FolderBlock, FsError> {
        let off = self.sb.block_offset(self.part_start, index);
        Ok(read_record(self.file, off)?)
    }

    fn write_folder_block(&mut self, index: i32, fb: &FolderBlock) -> Result<(), FsError> {
        let off = self.sb.block_offset(self.part_start, index);
        Ok(write_record(self.file, off, fb)?)
    }

    fn alloc_block(&mut self) -> Result<i32, FsError> {
        let idx = self.sb.get_free_block_index(self.file, self.part_start)?;
        self.sb.update_block_bitmap(self.file, self.part_start, idx, true)?;
        Ok(idx)
    }

    fn alloc_inode(&mut self) -> Result<i32, FsError> {
        let idx = self.sb.get_free_inode_index(self.file, self.part_start)?;
        self.sb.update_inode_bitmap(self.file, self.part_start, idx, true)?;
        Ok(idx)
    }

    /// Collapses `..`/`.` and duplicate `/`.
    pub fn normalize(path: &str) -> String {
        let mut stack: Vec<&str> = Vec::new();
        for comp in path.split('/') {
            match comp {
                "" | "." => continue,
                ".." => {
                    stack.pop();
                }
                other => stack.push(other),
            }
        }
        format!("/{}", stack.join("/"))
    }

    /// Scans only the direct folder-block pointers of `dir` (all 15
    /// slots — directories in this design never interpret a pointer
    /// slot as an indirect tree, per the resolved cap decision).
    /// Returns `-1` for not found.
    pub fn get_inode_index_by_name(&mut self, dir: &Inode, name: &str) -> Result<i32, FsError> {
        for &p in dir.pointers.iter() {
            if p == NULL_PTR {
                continue;
            }
            let fb = self.read_folder_block(p)?;
            for entry in fb.entries.iter() {
                if entry.inode != NULL_PTR && entry.name_str() == name {
                    return Ok(entry.inode);
                }
            }
        }
        Ok(NULL_PTR)
    }

    /// Lists every occupied entry of a directory inode, in block/slot
    /// order, for `rep -name=ls` and tree rendering.
    pub fn list_dir_entries(&mut self, dir: &Inode) -> Result<Vec<(String, i32)>, FsError> {
        let mut out = Vec::new();
        for &p in dir.pointers.iter() {
            if p == NULL_PTR {
                continue;
            }
            let fb = self.read_folder_block(p)?;
            for entry in fb.entries.iter() {
                if entry.inode != NULL_PTR {
                    out.push((entry.name_str(), entry.inode));
                }
            }
        }
        Ok(out)
    }

    pub fn read_inode_pub(&mut self, index: i32) -> Result<Inode, FsError> {
        self.read_inode(index)
    }

    /// `get_inode_by_path(p)`: root/`.`/empty resolve to inode 0;
    /// otherwise walks components, erroring on a missing component or
    /// a non-directory intermediate.
    pub fn get_inode_by_path(&mut self, path: &str) -> Result<(Inode, i32), FsError> {
        let normalized = Self::normalize(path);
        let mut current_index = 0i32;
        let mut current = self.read_inode(0)?;
        if normalized == "/" {
            return Ok((current, current_index));
        }
        for part in normalized.trim_start_matches('/').split('/') {
            if !current.is_dir() {
                return Err(FsError::lookup(format!(
                    "path component is not a directory: {part}"
                )));
            }
            let idx = self.get_inode_index_by_name(&current, part)?;
            if idx == NULL_PTR {
                return Err(FsError::lookup(format!("path component not found: {part}")));
            }
            current_index = idx;
            current = self.read_inode(idx)?;
        }
        Ok((current, current_index))
    }

    /// Allocates a free inode and block, writes a directory inode with
    /// `.`/`..` entries, flips both bitmap bits.
    pub fn create_new_folder(&mut self, parent_index: i32, uid: i32, gid: i32) -> Result<i32, FsError> {
        let inode_idx = self.alloc_inode()?;
        let block_idx = self.alloc_block()?;

        let mut inode = Inode::new(uid, gid, 0, INODE_TYPE_DIR, *b"664");
        inode.push_block(block_idx)?;

        let mut fb = FolderBlock::empty();
        fb.set(0, ".", inode_idx);
        fb.set(1, "..", parent_index);

        self.write_folder_block(block_idx, &fb)?;
        self.write_inode(inode_idx, &inode)?;
        Ok(inode_idx)
    }

    /// Finds the first `-1` slot in any existing folder block owned by
    /// `parent_index` and writes the entry there; allocates a new block
    /// if none has room; fails with "directory full" if all 15 pointer
    /// slots are occupied by full blocks.
    pub fn add_entry_to_parent(
        &mut self,
        parent_index: i32,
        name: &str,
        child_index: i32,
    ) -> Result<(), FsError> {
        let mut parent = self.read_inode(parent_index)?;

        for &p in parent.pointers.iter() {
            if p == NULL_PTR {
                continue;
            }
            let mut fb = self.read_folder_block(p)?;
            if let Some(slot) = fb.first_free_slot() {
                fb.set(slot, name, child_index);
                self.write_folder_block(p, &fb)?;
                parent.touch_mtime();
                self.write_inode(parent_index, &parent)?;
                return Ok(());
            }
        }

        let free_slot = parent.pointers.iter().position(|&p| p == NULL_PTR);
        match free_slot {
            Some(_) => {
                let block_idx = self.alloc_block()?;
                let mut fb = FolderBlock::empty();
                fb.set(0, name, child_index);
                self.write_folder_block(block_idx, &fb)?;
                parent.push_block(block_idx)?;
                parent.touch_mtime();
                self.write_inode(parent_index, &parent)?;
                Ok(())
            }
            None => Err(FsError::state("directory full")),
        }
    }

    /// Walks each path component, creating any missing directory along
    /// the way. Fails if a non-directory is encountered midway.
    pub fn ensure_path_exist(&mut self, path: &str, uid: i32, gid: i32) -> Result<(Inode, i32), FsError> {
        let normalized = Self::normalize(path);
        let mut current_index = 0i32;
        let mut current = self.read_inode(0)?;
        if normalized == "/" {
            return Ok((current, current_index));
        }
        for part in normalized.trim_start_matches('/').split('/') {
            if !current.is_dir() {
                return Err(FsError::lookup("path component is not a directory"));
            }
            let idx = self.get_inode_index_by_name(&current, part)?;
            if idx == NULL_PTR {
                let new_idx = self.create_new_folder(current_index, uid, gid)?;
                self.add_entry_to_parent(current_index, part, new_idx)?;
                current_index = new_idx;
                current = self.read_inode(new_idx)?;
            } else {
                current_index = idx;
                current = self.read_inode(idx)?;
            }
        }
        Ok((current, current_index))
    }

    fn read_level(&mut self, block_index: i32, level: u32, remaining: &mut i32, out: &mut Vec<u8>) -> Result<(), FsError> {
        if block_index == NULL_PTR || *remaining <= 0 {
            return Ok(());
        }
        if level == 0 {
            let off = self.sb.block_offset(self.part_start, block_index);
            let fb: FileBlock = read_record(self.file, off)?;
            let take = (*remaining as usize).min(FILE_BLOCK_BYTES);
            out.extend_from_slice(&fb.bytes[..take]);
            *remaining -= take as i32;
        } else {
            let off = self.sb.block_offset(self.part_start, block_index);
            let pb: PointerBlock = read_record(self.file, off)?;
            for &child in pb.pointers.iter() {
                if *remaining <= 0 {
                    break;
                }
                self.read_level(child, level - 1, remaining, out)?;
            }
        }
        Ok(())
    }

    /// Reads the full content of a file inode across direct and
    /// indirect pointers; errors if the accumulated byte count does
    /// not match `inode.size` exactly.
    pub fn read_file_content(&mut self, inode: &Inode) -> Result<Vec<u8>, FsError> {
        let mut out = Vec::with_capacity(inode.size.max(0) as usize);
        let mut remaining = inode.size;

        for i in 0..crate::inode::DIRECT_POINTERS {
            if remaining <= 0 {
                break;
            }
            self.read_level(inode.pointers[i], 0, &mut remaining, &mut out)?;
        }
        self.read_level(inode.pointers[SINGLE_INDIRECT], 1, &mut remaining, &mut out)?;
        self.read_level(inode.pointers[DOUBLE_INDIRECT], 2, &mut remaining, &mut out)?;
        self.read_level(inode.pointers[TRIPLE_INDIRECT], 3, &mut remaining, &mut out)?;

        if remaining != 0 {
            return Err(FsError::invariant("file read did not match declared size"));
        }
        Ok(out)
    }

    /// Writes `content` across direct + single/double/triple indirect
    /// pointer trees, lazily allocating pointer blocks and caching them
    /// in memory, flushing the cache in one pass at the end.
    pub fn allocate_file_blocks(&mut self, content: &[u8]) -> Result<[i32; POINTER_COUNT], FsError> {
        let needed = content.len().div_ceil(BLOCK_SIZE) as i32;
        if needed > self.sb.free_blocks_count {
            return Err(FsError::state("not enough free blocks"));
        }

        let mut pointers = [NULL_PTR; POINTER_COUNT];
        let mut cache: HashMap<i32, PointerBlock> = HashMap::new();

        const SIMPLE_END: i32 = 12 + 16;
        const DOUBLE_END: i32 = SIMPLE_END + 256;

        for i in 0..needed {
            let block_idx = self.alloc_block()?;
            let start = i as usize * BLOCK_SIZE;
            let end = ((i as usize + 1) * BLOCK_SIZE).min(content.len());
            let fb = FileBlock::from_slice(&content[start..end]);
            let off = self.sb.block_offset(self.part_start, block_idx);
            write_record(self.file, off, &fb)?;

            if i < 12 {
                pointers[i as usize] = block_idx;
            } else if i < SIMPLE_END {
                let l1_table = Self::lazy_table(self, &mut pointers, &mut cache, SINGLE_INDIRECT)?;
                cache.get_mut(&l1_table).unwrap().pointers[(i - 12) as usize] = block_idx;
            } else if i < DOUBLE_END {
                let idx_in_double = i - SIMPLE_END;
                let l1 = (idx_in_double / 16) as usize;
                let l2 = (idx_in_double % 16) as usize;
                let l1_table = Self::lazy_table(self, &mut pointers, &mut cache, DOUBLE_INDIRECT)?;
                let l2_table = Self::lazy_child(self, l1_table, l1, &mut cache)?;
                cache.get_mut(&l2_table).unwrap().pointers[l2] = block_idx;
            } else {
                let idx_in_triple = i - DOUBLE_END;
                let l1 = (idx_in_triple / 256) as usize;
                let rem = idx_in_triple % 256;
                let l2 = (rem / 16) as usize;
                let l3 = (rem % 16) as usize;
                let l1_table = Self::lazy_table(self, &mut pointers, &mut cache, TRIPLE_INDIRECT)?;
                let l2_table = Self::lazy_child(self, l1_table, l1, &mut cache)?;
                let l3_table = Self::lazy_child(self, l2_table, l2, &mut cache)?;
                cache.get_mut(&l3_table).unwrap().pointers[l3] = block_idx;
            }
        }

        for (&idx, pb) in cache.iter() {
            let off = self.sb.block_offset(self.part_start, idx);
            write_record(self.file, off, pb)?;
        }

        Ok(pointers)
    }

    fn lazy_table(
        this: &mut Self,
        pointers: &mut [i32; POINTER_COUNT],
        cache: &mut HashMap<i32, PointerBlock>,
        slot: usize,
    ) -> Result<i32, FsError> {
        if pointers[slot] == NULL_PTR {
            let idx = this.alloc_block()?;
            pointers[slot] = idx;
            cache.insert(idx, PointerBlock::empty());
        }
        Ok(pointers[slot])
    }

    fn lazy_child(
        this: &mut Self,
        table: i32,
        slot: usize,
        cache: &mut HashMap<i32, PointerBlock>,
    ) -> Result<i32, FsError> {
        let existing = cache.get(&table).unwrap().pointers[slot];
        if existing != NULL_PTR {
            return Ok(existing);
        }
        let idx = this.alloc_block()?;
        cache.get_mut(&table).unwrap().pointers[slot] = idx;
        cache.insert(idx, PointerBlock::empty());
        Ok(idx)
    }

    fn free_level(&mut self, block_index: i32, level: u32) -> Result<(), FsError> {
        if block_index == NULL_PTR {
            return Ok(());
        }
        if level == 0 {
            self.sb.update_block_bitmap(self.file, self.part_start, block_index, false)?;
        } else {
            let off = self.sb.block_offset(self.part_start, block_index);
            let pb: PointerBlock = read_record(self.file, off)?;
            for &child in pb.pointers.iter() {
                self.free_level(child, level - 1)?;
            }
            self.sb.update_block_bitmap(self.file, self.part_start, block_index, false)?;
        }
        Ok(())
    }

    /// Frees every block reachable from `inode_index` (direct and
    /// indirect, post-order for pointer blocks), then resets the
    /// inode's pointers and size.
    pub fn free_file_inode(&mut self, inode_index: i32) -> Result<(), FsError> {
        let mut inode = self.read_inode(inode_index)?;
        for i in 0..crate::inode::DIRECT_POINTERS {
            self.free_level(inode.pointers[i], 0)?;
        }
        self.free_level(inode.pointers[SINGLE_INDIRECT], 1)?;
        self.free_level(inode.pointers[DOUBLE_INDIRECT], 2)?;
        self.free_level(inode.pointers[TRIPLE_INDIRECT], 3)?;

        inode.pointers = [NULL_PTR; POINTER_COUNT];
        inode.size = 0;
        self.write_inode(inode_index, &inode)?;
        Ok(())
    }

    /// Allocates blocks for `content`, allocates a file inode, writes
    /// both, and returns the new inode index.
    pub fn create_new_file(&mut self, uid: i32, gid: i32, content: &[u8]) -> Result<i32, FsError> {
        let pointers = self.allocate_file_blocks(content)?;
        let inode_idx = self.alloc_inode()?;
        let mut inode = Inode::new(uid, gid, content.len() as i32, INODE_TYPE_FILE, *b"664");
        inode.pointers = pointers;
        self.write_inode(inode_idx, &inode)?;
        Ok(inode_idx)
    }

    /// Frees an existing file inode's blocks and reallocates fresh ones
    /// for `new_content`, used by the `users.txt` mini-database commands
    /// that append or tombstone a line.
    pub fn rewrite_file(&mut self, inode_index: i32, new_content: &[u8]) -> Result<(), FsError> {
        self.free_file_inode(inode_index)?;
        let pointers = self.allocate_file_blocks(new_content)?;
        let mut inode = self.read_inode(inode_index)?;
        inode.size = new_content.len() as i32;
        inode.pointers = pointers;
        inode.touch_mtime();
        self.write_inode(inode_index, &inode)?;
        Ok(())
    }

    /// `mkfs` bootstrap: root directory (inode 0) with `.`, `..` and a
    /// `users.txt` entry pointing at a freshly-allocated file inode
    /// containing the immutable root group/user bootstrap lines.
    pub fn create_users_file(&mut self) -> Result<(), FsError> {
        let root_idx = self.alloc_inode()?;
        let root_block_idx = self.alloc_block()?;

        let content = USERS_FILE_BOOTSTRAP.as_bytes();
        let users_idx = self.alloc_inode()?;
        let users_block_idx = self.alloc_block()?;

        let mut users_inode = Inode::new(1, 1, content.len() as i32, INODE_TYPE_FILE, *b"777");
        users_inode.push_block(users_block_idx)?;
        let fb_content = FileBlock::from_slice(content);
        let content_off = self.sb.block_offset(self.part_start, users_block_idx);
        write_record(self.file, content_off, &fb_content)?;
        self.write_inode(users_idx, &users_inode)?;

        let mut root = Inode::new(1, 1, 0, INODE_TYPE_DIR, *b"777");
        root.push_block(root_block_idx)?;

        let mut root_block = FolderBlock::empty();
        root_block.set(0, ".", root_idx);
        root_block.set(1, "..", root_idx);
        root_block.set(2, USERS_FILE_NAME, users_idx);
        self.write_folder_block(root_block_idx, &root_block)?;
        self.write_inode(root_idx, &root)?;

        Ok(())
    }

    pub fn write_superblock(&mut self, offset: u64) -> Result<(), FsError> {
        Ok(write_record(self.file, offset, &self.sb)?)
    }
}

/// Generates the repeating `0123456789` content pattern used by
/// `mkfile -size=N` when no `-cont` source file is given.
pub fn generated_cycle(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'0' + (i % 10) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempfile;

    fn formatted_partition(size: i32) -> (File, SuperBlock) {
        let mut file = tempfile().unwrap();
        file.set_len(size as u64).unwrap();
        let mut sb = SuperBlock::new_for_partition(size).unwrap();
        sb.initialize_bitmaps(&mut file, 0).unwrap();
        (file, sb)
    }

    #[test]
    fn normalizes_dot_and_dotdot() {
        assert_eq!(Ext2Like::normalize("/a/b/../c"), "/a/c");
        assert_eq!(Ext2Like::normalize("/a/./b/"), "/a/b");
        assert_eq!(Ext2Like::normalize(""), "/");
        assert_eq!(Ext2Like::normalize("."), "/");
    }

    #[test]
    fn bootstrap_creates_root_with_users_file() {
        let (mut file, sb) = formatted_partition(500_000);
        let mut fs = Ext2Like::new(&mut file, sb, 0);
        fs.create_users_file().unwrap();

        let (root, idx) = fs.get_inode_by_path("/").unwrap();
        assert_eq!(idx, 0);
        assert!(root.is_dir());
        assert_eq!(root.perm, *b"777");

        let (users, _) = fs.get_inode_by_path("/users.txt").unwrap();
        assert!(users.is_file());
        let content = fs.read_file_content(&users).unwrap();
        assert_eq!(content, USERS_FILE_BOOTSTRAP.as_bytes());
    }

    #[test]
    fn ensure_path_exist_creates_intermediate_directories() {
        let (mut file, sb) = formatted_partition(500_000);
        let mut fs = Ext2Like::new(&mut file, sb, 0);
        fs.create_users_file().unwrap();

        let (_, idx) = fs.ensure_path_exist("/a/b/c", 1, 1).unwrap();
        assert!(idx != 0);
        let (resolved, resolved_idx) = fs.get_inode_by_path("/a/b/c").unwrap();
        assert_eq!(resolved_idx, idx);
        assert!(resolved.is_dir());
    }

    #[test]
    fn file_round_trips_across_indirection_boundaries() {
        let (mut file, sb) = formatted_partition(5_000_000);
        let mut fs = Ext2Like::new(&mut file, sb, 0);
        fs.create_users_file().unwrap();

        for &size in &[10 * 64, 13 * 64, (12 + 16) * 64 + 1, (12 + 16 + 256) * 64 + 1] {
            let content = generated_cycle(size);
            let pointers = fs.allocate_file_blocks(&content).unwrap();
            let mut inode = Inode::new(1, 1, size as i32, INODE_TYPE_FILE, *b"664");
            inode.pointers = pointers;
            let read_back_size = size;
            let read = {
                let idx = fs.alloc_inode().unwrap();
                let off = fs.sb.inode_offset(fs.part_start, idx);
                write_record(fs.file, off, &inode).unwrap();
                let reread: Inode = read_record(fs.file, off).unwrap();
                fs.read_file_content(&reread).unwrap()
            };
            assert_eq!(read.len(), read_back_size);
            assert_eq!(read, content);
        }
    }

    #[test]
    fn free_file_inode_resets_pointers_and_bitmap() {
        let (mut file, sb) = formatted_partition(500_000);
        let mut fs = Ext2Like::new(&mut file, sb, 0);
        fs.create_users_file().unwrap();

        let content = generated_cycle(200);
        let pointers = fs.allocate_file_blocks(&content).unwrap();
        let idx = fs.alloc_inode().unwrap();
        let mut inode = Inode::new(1, 1, content.len() as i32, INODE_TYPE_FILE, *b"664");
        inode.pointers = pointers;
        fs.write_inode(idx, &inode).unwrap();

        let before_free = fs.sb.free_blocks_count;
        fs.free_file_inode(idx).unwrap();
        assert!(fs.sb.free_blocks_count > before_free);
        let reread = fs.read_inode(idx).unwrap();
        assert_eq!(reread.size, 0);
        assert!(reread.pointers.iter().all(|&p| p == NULL_PTR));
    }

    #[test]
    fn directory_lookup_returns_null_ptr_when_missing() {
        let (mut file, sb) = formatted_partition(500_000);
        let mut fs = Ext2Like::new(&mut file, sb, 0);
        fs.create_users_file().unwrap();
        let (root, _) = fs.get_inode_by_path("/").unwrap();
        let found = fs.get_inode_index_by_name(&root, "nope").unwrap();
        assert_eq!(found, NULL_PTR);
    }
}
