use crate::args::Args;
use crate::commands::{open_mounted, require_absolute, require_session, split_parent};
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::{generated_cycle, Ext2Like};
use std::fs;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Archivo no creado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;
    let create_intermediates = args.has("r");
    let (id, uid, gid) = require_session(ctx)?;

    let content = match args.get("cont") {
        Some(cont_path) => fs::read(cont_path)?,
        None => {
            let size: usize = args
                .get_or("size", "0")
                .parse()
                .map_err(|_| FsError::argument("invalid -size"))?;
            generated_cycle(size)
        }
    };

    let normalized = Ext2Like::normalize(path);
    let (parent_path, leaf) = split_parent(&normalized);

    let (mut file, sb, part_start) = open_mounted(ctx, &id)?;
    let mut service = Ext2Like::new(&mut file, sb, part_start);

    if service.get_inode_by_path(&normalized).is_ok() {
        return Err(FsError::state("file already exists"));
    }

    let parent_idx = if create_intermediates {
        let (_, idx) = service.ensure_path_exist(&parent_path, uid, gid)?;
        idx
    } else {
        let (parent_inode, idx) = service
            .get_inode_by_path(&parent_path)
            .map_err(|_| FsError::lookup("parent does not exist"))?;
        if !parent_inode.is_dir() {
            return Err(FsError::lookup("parent is not a directory"));
        }
        idx
    };

    let file_idx = service.create_new_file(uid, gid, &content)?;
    service.add_entry_to_parent(parent_idx, &leaf, file_idx)?;
    service.write_superblock(part_start as u64)?;

    tracing::info!(path, bytes = content.len(), "created file");
    Ok(format!("Archivo {path} creado."))
}
