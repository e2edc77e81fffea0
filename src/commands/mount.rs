use crate::args::Args;
use crate::binio::{read_record, write_record};
use crate::commands::require_absolute;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::mbr::Mbr;
use crate::registry::Registry;
use crate::superblock::SuperBlock;
use std::fs::OpenOptions;

const STATUS_MOUNTED: u8 = 1;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Particion no montada.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;
    let name = args.require("name")?;

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut mbr: Mbr = read_record(&mut file, 0)?;
    let slot = mbr
        .get_partition_by_name(name)
        .ok_or_else(|| FsError::lookup(format!("partition not found: {name}")))?;

    let (letter, counter) = ctx.registry.allocate_mount_id(path)?;
    let id = Registry::mint_id(counter, letter);

    mbr.partitions[slot].status = STATUS_MOUNTED;
    mbr.partitions[slot].id = id.clone();
    write_record(&mut file, 0, &mbr)?;

    let partition = mbr.partitions[slot].clone();
    let mut sb: SuperBlock = read_record(&mut file, partition.start as u64)?;
    if sb.is_formatted() {
        sb.mnt_count += 1;
        write_record(&mut file, partition.start as u64, &sb)?;
    }

    ctx.registry.register(&id, path, partition);

    tracing::info!(path, name, id, "mounted partition");
    Ok(format!("Particion {name} montada con id {id}."))
}
