use crate::args::Args;
use crate::binio::write_record;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::Ext2Like;
use crate::superblock::SuperBlock;
use std::fs::OpenOptions;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Sistema de archivos no creado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let id = args.require("id")?;
    let _fs_type = args.get_or("type", "full");

    let mount = ctx.registry.get(id)?.clone();
    let mut file = OpenOptions::new().read(true).write(true).open(&mount.disk_path)?;

    let mut sb = SuperBlock::new_for_partition(mount.partition.size)?;
    let part_start = mount.partition.start as i64;
    sb.initialize_bitmaps(&mut file, part_start)?;

    let mut fs = Ext2Like::new(&mut file, sb, part_start);
    fs.create_users_file()?;
    write_record(fs.file, part_start as u64, &fs.sb)?;

    tracing::info!(id, "formatted partition");
    Ok(format!("Sistema de archivos creado en particion {id}."))
}
