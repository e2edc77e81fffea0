//! Mount registry: synthesizes and tracks partition mount ids.
//!
//! Modeled as a plain struct threaded through the dispatcher rather than
//! a `lazy_static`/global, per the design's explicit-context note —
//! the teacher's kernel-facing code reaches for real global statics
//! because it has no request boundary; a command dispatcher does, so
//! state is owned by a value passed through instead.

use crate::error::FsError;
use crate::mbr::Partition;
use std::collections::HashMap;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone)]
pub struct MountedPartition {
    pub disk_path: String,
    pub partition: Partition,
}

#[derive(Debug, Clone)]
pub struct MountedDisk {
    pub letter: char,
    pub partition_count: i32,
}

#[derive(Debug, Default)]
pub struct Registry {
    pub mounted_partitions: HashMap<String, MountedPartition>,
    pub mounted_disks: HashMap<String, MountedDisk>,
    next_letter_index: usize,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// On first mount for `path`, assigns the next alphabet letter; on
    /// subsequent mounts for the same path, increments its partition
    /// counter. Fails once the alphabet is exhausted.
    pub fn allocate_mount_id(&mut self, path: &str) -> Result<(char, i32), FsError> {
        if let Some(disk) = self.mounted_disks.get_mut(path) {
            disk.partition_count += 1;
            return Ok((disk.letter, disk.partition_count));
        }
        if self.next_letter_index >= ALPHABET.len() {
            return Err(FsError::state("mount letters exhausted"));
        }
        let letter = ALPHABET[self.next_letter_index] as char;
        self.next_letter_index += 1;
        self.mounted_disks.insert(
            path.to_string(),
            MountedDisk {
                letter,
                partition_count: 1,
            },
        );
        Ok((letter, 1))
    }

    /// Minted id format: literal `"69"` + counter + letter, e.g. `691A`.
    pub fn mint_id(counter: i32, letter: char) -> String {
        format!("69{counter}{letter}")
    }

    pub fn register(&mut self, id: &str, disk_path: &str, partition: Partition) {
        self.mounted_partitions.insert(
            id.to_string(),
            MountedPartition {
                disk_path: disk_path.to_string(),
                partition,
            },
        );
    }

    pub fn get(&self, id: &str) -> Result<&MountedPartition, FsError> {
        self.mounted_partitions
            .get(id)
            .ok_or_else(|| FsError::lookup(format!("no mounted partition with id {id}")))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut MountedPartition, FsError> {
        self.mounted_partitions
            .get_mut(id)
            .ok_or_else(|| FsError::lookup(format!("no mounted partition with id {id}")))
    }

    /// Purges every mount entry referencing `path` (used by `rmdisk`).
    pub fn purge_path(&mut self, path: &str) {
        self.mounted_partitions
            .retain(|_, m| m.disk_path != path);
        self.mounted_disks.remove(path);
    }

    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.mounted_partitions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_reuses_letter_and_increments_counter() {
        let mut reg = Registry::new();
        let (l1, c1) = reg.allocate_mount_id("/tmp/a.mia").unwrap();
        let (l2, c2) = reg.allocate_mount_id("/tmp/a.mia").unwrap();
        assert_eq!(l1, l2);
        assert_eq!((c1, c2), (1, 2));
    }

    #[test]
    fn different_paths_get_different_letters_in_order() {
        let mut reg = Registry::new();
        let (l1, _) = reg.allocate_mount_id("/tmp/a.mia").unwrap();
        let (l2, _) = reg.allocate_mount_id("/tmp/b.mia").unwrap();
        assert_eq!(l1, 'A');
        assert_eq!(l2, 'B');
    }

    #[test]
    fn purge_removes_all_entries_for_a_path() {
        let mut reg = Registry::new();
        reg.allocate_mount_id("/tmp/a.mia").unwrap();
        reg.register("691A", "/tmp/a.mia", Partition::empty());
        reg.purge_path("/tmp/a.mia");
        assert!(reg.get("691A").is_err());
        assert!(reg.mounted_disks.is_empty());
    }
}
