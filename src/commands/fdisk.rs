use crate::args::Args;
use crate::binio::{convert_to_bytes, read_record, write_record};
use crate::commands::require_absolute;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::mbr::{add_logical_partition, Fit, Mbr, PartType};
use std::fs::OpenOptions;

pub fn run(_ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(raw_args).map_err(|e| CommandError::new("Particion no creada.", e))
}

fn run_inner(raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;
    let name = args.require("name")?;
    let size_value = args.require_i64("size")?;
    let unit = args.get_or("unit", "K").chars().next().unwrap_or('K');
    let fit = Fit::parse(&args.get_or("fit", "WF"))?;
    let part_type = PartType::parse(&args.get_or("type", "P"))?;

    let size_bytes = convert_to_bytes(size_value, unit)
        .ok_or_else(|| FsError::argument("invalid unit for -unit"))?;

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut mbr: Mbr = read_record(&mut file, 0)?;

    match part_type {
        PartType::Logical => {
            let ext_slot = mbr
                .extended_partition()
                .ok_or_else(|| FsError::state("no extended partition"))?;
            let extended = mbr.partitions[ext_slot].clone();
            add_logical_partition(&mut file, &extended, fit, size_bytes as i32, name)?;
        }
        _ => {
            mbr.add_partition(part_type, fit, size_bytes as i32, name)?;
            write_record(&mut file, 0, &mbr)?;
        }
    }

    tracing::info!(path, name, size_bytes, "created partition");
    Ok(format!("Particion {name} creada en {path}."))
}
