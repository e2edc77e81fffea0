use crate::args::Args;
use crate::commands::{open_mounted, require_absolute, require_session, split_parent};
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::Ext2Like;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Directorio no creado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;
    let create_intermediates = args.has("p");
    let (id, uid, gid) = require_session(ctx)?;

    let normalized = Ext2Like::normalize(path);
    if normalized == "/" {
        return Err(FsError::state("cannot create the root directory"));
    }

    let (mut file, sb, part_start) = open_mounted(ctx, &id)?;
    let mut fs = Ext2Like::new(&mut file, sb, part_start);

    if fs.get_inode_by_path(&normalized).is_ok() {
        return Err(FsError::state("directory already exists"));
    }

    if create_intermediates {
        fs.ensure_path_exist(&normalized, uid, gid)?;
    } else {
        let (parent_path, leaf) = split_parent(&normalized);
        let (parent_inode, parent_idx) = fs
            .get_inode_by_path(&parent_path)
            .map_err(|_| FsError::lookup("parent does not exist"))?;
        if !parent_inode.is_dir() {
            return Err(FsError::lookup("parent is not a directory"));
        }
        let new_idx = fs.create_new_folder(parent_idx, uid, gid)?;
        fs.add_entry_to_parent(parent_idx, &leaf, new_idx)?;
    }

    fs.write_superblock(part_start as u64)?;
    tracing::info!(path, "created directory");
    Ok(format!("Directorio {path} creado."))
}
