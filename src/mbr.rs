//! MBR / partition / EBR records and partition-layout operations.
//!
//! Grounded on the teacher's `fdisk::partition::{MBRPartition, MBRTable}`
//! read/write pair, generalized from "read a real block device" to
//! "populate in memory, persist to a disk image file".

use crate::binio::{pack_fixed_str, read_record, unpack_fixed_str, write_record, Record};
use crate::error::FsError;
use rand::Rng;
use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PARTITION_COUNT: usize = 4;
pub const PARTITION_NAME_LEN: usize = 16;
pub const EBR_NAME_LEN: usize = 16;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    First,
    Best,
    Worst,
}

impl Fit {
    pub fn code(self) -> u8 {
        match self {
            Fit::First => b'F',
            Fit::Best => b'B',
            Fit::Worst => b'W',
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            b'B' => Fit::Best,
            b'W' => Fit::Worst,
            _ => Fit::First,
        }
    }

    pub fn parse(s: &str) -> Result<Self, FsError> {
        match s.to_ascii_uppercase().as_str() {
            "FF" => Ok(Fit::First),
            "BF" => Ok(Fit::Best),
            "WF" => Ok(Fit::Worst),
            other => Err(FsError::argument(format!("invalid fit code: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Primary,
    Extended,
    Logical,
}

impl PartType {
    pub fn code(self) -> u8 {
        match self {
            PartType::Primary => b'P',
            PartType::Extended => b'E',
            PartType::Logical => b'L',
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'P' => Some(PartType::Primary),
            b'E' => Some(PartType::Extended),
            b'L' => Some(PartType::Logical),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, FsError> {
        match s.to_ascii_uppercase().as_str() {
            "P" => Ok(PartType::Primary),
            "E" => Ok(PartType::Extended),
            "L" => Ok(PartType::Logical),
            other => Err(FsError::argument(format!("invalid partition type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub status: u8,
    pub part_type: u8,
    pub fit: u8,
    pub start: i32,
    pub size: i32,
    pub name: String,
    pub correlative: i32,
    pub id: String,
}

impl Partition {
    pub fn empty() -> Self {
        Partition {
            status: 0,
            part_type: 0,
            fit: 0,
            start: 0,
            size: 0,
            name: String::new(),
            correlative: 0,
            id: String::new(),
        }
    }

    pub fn is_empty_slot(&self) -> bool {
        self.size <= 0
    }
}

impl Record for Partition {
    const SIZE: usize = 1 + 1 + 1 + 4 + 4 + PARTITION_NAME_LEN + 4 + 4;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(self.status);
        buf.push(self.part_type);
        buf.push(self.fit);
        buf.extend_from_slice(&self.start.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&pack_fixed_str(&self.name, PARTITION_NAME_LEN));
        buf.extend_from_slice(&self.correlative.to_le_bytes());
        buf.extend_from_slice(&pack_fixed_str(&self.id, 4));
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let status = buf[0];
        let part_type = buf[1];
        let fit = buf[2];
        let start = i32::from_le_bytes(buf[3..7].try_into().unwrap());
        let size = i32::from_le_bytes(buf[7..11].try_into().unwrap());
        let name = unpack_fixed_str(&buf[11..11 + PARTITION_NAME_LEN]);
        let off = 11 + PARTITION_NAME_LEN;
        let correlative = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        let id = unpack_fixed_str(&buf[off + 4..off + 8]);
        Partition {
            status,
            part_type,
            fit,
            start,
            size,
            name,
            correlative,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbr {
    pub total_size: i32,
    pub creation_time: i64,
    pub signature: i32,
    pub fit: u8,
    pub partitions: [Partition; PARTITION_COUNT],
}

impl Mbr {
    pub const HEADER_SIZE: usize = 4 + 8 + 4 + 1;

    /// `new_mbr(size, fit)`: size, timestamp, random signature, empty slots.
    pub fn new(size: i32, fit: Fit) -> Self {
        let signature: i32 = rand::thread_rng().gen();
        Mbr {
            total_size: size,
            creation_time: now_unix(),
            signature,
            fit: fit.code(),
            partitions: [
                Partition::empty(),
                Partition::empty(),
                Partition::empty(),
                Partition::empty(),
            ],
        }
    }

    pub fn used_bytes(&self) -> i64 {
        self.partitions
            .iter()
            .filter(|p| !p.is_empty_slot())
            .map(|p| p.size as i64)
            .sum()
    }

    /// Scans left-to-right for the first empty slot, computes its start,
    /// and rejects names already in use or sizes overflowing the disk.
    /// Only one extended partition may exist at a time.
    pub fn add_partition(
        &mut self,
        part_type: PartType,
        fit: Fit,
        size: i32,
        name: &str,
    ) -> Result<usize, FsError> {
        if self
            .partitions
            .iter()
            .any(|p| !p.is_empty_slot() && p.name == name)
        {
            return Err(FsError::state(format!(
                "partition name already in use: {name}"
            )));
        }
        if part_type == PartType::Extended
            && self.partitions.iter().any(|p| {
                !p.is_empty_slot() && PartType::from_code(p.part_type) == Some(PartType::Extended)
            })
        {
            return Err(FsError::state("extended partition already exists"));
        }

        let slot = self
            .partitions
            .iter()
            .position(|p| p.is_empty_slot())
            .ok_or_else(|| FsError::state("no free primary/extended partition slot"))?;

        let start = Self::SIZE as i32
            + self
                .partitions
                .iter()
                .filter(|p| !p.is_empty_slot())
                .map(|p| p.size)
                .sum::<i32>();

        if (start as i64) + (size as i64) > self.total_size as i64 {
            return Err(FsError::state("partition does not fit in disk"));
        }

        self.partitions[slot] = Partition {
            status: 0,
            part_type: part_type.code(),
            fit: fit.code(),
            start,
            size,
            name: name.to_string(),
            correlative: slot as i32 + 1,
            id: String::new(),
        };
        Ok(slot)
    }

    /// Trims trailing NUL/space from stored names; matches only
    /// non-empty slots.
    pub fn get_partition_by_name(&self, name: &str) -> Option<usize> {
        self.partitions
            .iter()
            .position(|p| !p.is_empty_slot() && p.name.trim_end() == name.trim_end())
    }

    pub fn extended_partition(&self) -> Option<usize> {
        self.partitions
            .iter()
            .position(|p| !p.is_empty_slot() && PartType::from_code(p.part_type) == Some(PartType::Extended))
    }
}

impl Record for Mbr {
    const SIZE: usize = Mbr::HEADER_SIZE + PARTITION_COUNT * Partition::SIZE;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.total_size.to_le_bytes());
        buf.extend_from_slice(&self.creation_time.to_le_bytes());
        buf.extend_from_slice(&self.signature.to_le_bytes());
        buf.push(self.fit);
        for p in &self.partitions {
            buf.extend_from_slice(&p.to_bytes());
        }
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let total_size = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let creation_time = i64::from_le_bytes(buf[4..12].try_into().unwrap());
        let signature = i32::from_le_bytes(buf[12..16].try_into().unwrap());
        let fit = buf[16];
        let mut partitions = [
            Partition::empty(),
            Partition::empty(),
            Partition::empty(),
            Partition::empty(),
        ];
        let mut off = Mbr::HEADER_SIZE;
        for p in partitions.iter_mut() {
            *p = Partition::from_bytes(&buf[off..off + Partition::SIZE]);
            off += Partition::SIZE;
        }
        Mbr {
            total_size,
            creation_time,
            signature,
            fit,
            partitions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ebr {
    pub mount_flag: u8,
    pub fit: u8,
    pub start: i32,
    pub size: i32,
    pub next: i32,
    pub name: String,
}

impl Ebr {
    pub const NEXT_NONE: i32 = -1;

    pub fn empty() -> Self {
        Ebr {
            mount_flag: 0,
            fit: Fit::First.code(),
            start: -1,
            size: 0,
            next: Self::NEXT_NONE,
            name: String::new(),
        }
    }
}

impl Record for Ebr {
    const SIZE: usize = 1 + 1 + 4 + 4 + 4 + EBR_NAME_LEN;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(self.mount_flag);
        buf.push(self.fit);
        buf.extend_from_slice(&self.start.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&self.next.to_le_bytes());
        buf.extend_from_slice(&pack_fixed_str(&self.name, EBR_NAME_LEN));
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mount_flag = buf[0];
        let fit = buf[1];
        let start = i32::from_le_bytes(buf[2..6].try_into().unwrap());
        let size = i32::from_le_bytes(buf[6..10].try_into().unwrap());
        let next = i32::from_le_bytes(buf[10..14].try_into().unwrap());
        let name = unpack_fixed_str(&buf[14..14 + EBR_NAME_LEN]);
        Ebr {
            mount_flag,
            fit,
            start,
            size,
            next,
            name,
        }
    }
}

/// Walks the EBR chain starting at `extended.start`, appending a new
/// logical partition per the algorithm in the design: find the end of
/// the chain, compute the new EBR's offset, verify it fits inside the
/// extended partition, write it, and patch the previous EBR's `next`.
pub fn add_logical_partition(
    file: &mut File,
    extended: &Partition,
    fit: Fit,
    size: i32,
    name: &str,
) -> Result<i32, FsError> {
    let mut prev_offset: Option<i32> = None;
    let mut cursor = extended.start;
    let mut last_ebr = Ebr::empty();
    let mut found_non_empty = false;

    loop {
        let ebr: Ebr = read_record(file, cursor as u64)?;
        if ebr.size <= 0 && ebr.name.is_empty() && prev_offset.is_none() && !found_non_empty {
            // empty chain: first EBR slot unused
            break;
        }
        found_non_empty = true;
        last_ebr = ebr.clone();
        prev_offset = Some(cursor);
        if ebr.next == Ebr::NEXT_NONE {
            break;
        }
        cursor = ebr.next;
    }

    let new_offset = match prev_offset {
        None => extended.start,
        Some(_) => last_ebr.start + last_ebr.size,
    };

    if (new_offset as i64) + (Ebr::SIZE as i64) + (size as i64)
        > (extended.start as i64) + (extended.size as i64)
    {
        return Err(FsError::state("logical partition does not fit in extended partition"));
    }

    let new_ebr = Ebr {
        mount_flag: 0,
        fit: fit.code(),
        start: new_offset + Ebr::SIZE as i32,
        size,
        next: Ebr::NEXT_NONE,
        name: name.to_string(),
    };
    write_record(file, new_offset as u64, &new_ebr)?;

    if let Some(prev_off) = prev_offset {
        let mut prev = last_ebr;
        prev.next = new_offset;
        write_record(file, prev_off as u64, &prev)?;
    }

    Ok(new_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_mbr_with_partitions() {
        let mut mbr = Mbr::new(1024 * 1024, Fit::First);
        let slot = mbr
            .add_partition(PartType::Primary, Fit::First, 4096, "P1")
            .unwrap();
        assert_eq!(slot, 0);
        let bytes = mbr.to_bytes();
        let back = Mbr::from_bytes(&bytes);
        assert_eq!(mbr, back);
    }

    #[test]
    fn rejects_duplicate_partition_names() {
        let mut mbr = Mbr::new(1024 * 1024, Fit::First);
        mbr.add_partition(PartType::Primary, Fit::First, 4096, "P1")
            .unwrap();
        let err = mbr
            .add_partition(PartType::Primary, Fit::First, 4096, "P1")
            .unwrap_err();
        assert!(matches!(err, FsError::State(_)));
    }

    #[test]
    fn only_one_extended_partition_allowed() {
        let mut mbr = Mbr::new(1024 * 1024, Fit::First);
        mbr.add_partition(PartType::Extended, Fit::First, 4096, "E1")
            .unwrap();
        let err = mbr
            .add_partition(PartType::Extended, Fit::First, 4096, "E2")
            .unwrap_err();
        assert!(matches!(err, FsError::State(_)));
    }

    #[test]
    fn finds_partition_by_trimmed_name() {
        let mut mbr = Mbr::new(1024 * 1024, Fit::First);
        mbr.add_partition(PartType::Primary, Fit::First, 4096, "DATA")
            .unwrap();
        assert_eq!(mbr.get_partition_by_name("DATA"), Some(0));
        assert_eq!(mbr.get_partition_by_name("missing"), None);
    }
}
