use crate::args::Args;
use crate::binio::{convert_to_bytes, write_record};
use crate::commands::{require_absolute, require_mia_extension};
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::mbr::{Fit, Mbr};
use std::fs::OpenOptions;
use std::io::Write as _;

pub fn run(_ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(raw_args).map_err(|e| CommandError::new("Disco no creado.", e))
}

fn run_inner(raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;
    require_mia_extension(path)?;

    let size_value = args.require_i64("size")?;
    let unit = args.get_or("unit", "M").chars().next().unwrap_or('M');
    let fit = Fit::parse(&args.get_or("fit", "FF"))?;

    let size_bytes = convert_to_bytes(size_value, unit)
        .ok_or_else(|| FsError::argument("invalid unit for -unit"))?;
    if size_bytes <= 0 {
        return Err(FsError::argument("size must be positive"));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(&vec![0u8; size_bytes as usize])?;

    let mbr = Mbr::new(size_bytes as i32, fit);
    write_record(&mut file, 0, &mbr)?;

    tracing::info!(path, size_bytes, "created disk");
    Ok(format!("Disco creado en {path}."))
}
