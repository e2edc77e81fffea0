//! One module per user verb, following the teacher's per-command layout
//! (`fdisk`, `mkfs`, `mount`, `login`, …), generalized from "route
//! argv[0] to a handler" to "route the first token of a script line".

pub mod cat;
pub mod chgrp;
pub mod fdisk;
pub mod login;
pub mod logout;
pub mod mkdir;
pub mod mkdisk;
pub mod mkfile;
pub mod mkfs;
pub mod mkgrp;
pub mod mkusr;
pub mod mount;
pub mod mounted;
pub mod rep;
pub mod rmdisk;
pub mod rmgrp;
pub mod rmusr;

use crate::context::Context;
use crate::error::{CommandError, FsError};

pub fn dispatch(keyword: &str, ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    match keyword {
        "mkdisk" => mkdisk::run(ctx, raw_args),
        "rmdisk" => rmdisk::run(ctx, raw_args),
        "fdisk" => fdisk::run(ctx, raw_args),
        "mount" => mount::run(ctx, raw_args),
        "mounted" => mounted::run(ctx, raw_args),
        "mkfs" => mkfs::run(ctx, raw_args),
        "mkdir" => mkdir::run(ctx, raw_args),
        "mkfile" => mkfile::run(ctx, raw_args),
        "cat" => cat::run(ctx, raw_args),
        "login" => login::run(ctx, raw_args),
        "logout" => logout::run(ctx, raw_args),
        "mkgrp" => mkgrp::run(ctx, raw_args),
        "rmgrp" => rmgrp::run(ctx, raw_args),
        "mkusr" => mkusr::run(ctx, raw_args),
        "rmusr" => rmusr::run(ctx, raw_args),
        "chgrp" => chgrp::run(ctx, raw_args),
        "rep" => rep::run(ctx, raw_args),
        other => Err(CommandError::new(
            "Comando no reconocido.",
            FsError::argument(format!("unknown command: {other}")),
        )),
    }
}

/// Shared path-flag validation: all paths must be absolute.
pub fn require_absolute(path: &str) -> Result<(), FsError> {
    if !path.starts_with('/') {
        return Err(FsError::argument(format!("path must be absolute: {path}")));
    }
    Ok(())
}

/// Disk paths must end with `.mia`.
pub fn require_mia_extension(path: &str) -> Result<(), FsError> {
    if !path.ends_with(".mia") {
        return Err(FsError::argument(format!("disk path must end with .mia: {path}")));
    }
    Ok(())
}

/// Splits a normalized absolute path into (parent, leaf). `/a/b/c` ->
/// (`/a/b`, `c`); `/c` -> (`/`, `c`).
pub fn split_parent(normalized: &str) -> (String, String) {
    let trimmed = normalized.trim_start_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, leaf)) => (format!("/{parent}"), leaf.to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// Requires an active login session and returns (partition id, uid, gid).
pub fn require_session(ctx: &Context) -> Result<(String, i32, i32), FsError> {
    if !ctx.session.logged_in {
        return Err(FsError::state("no active session"));
    }
    Ok((ctx.session.partition_id.clone(), ctx.session.uid, ctx.session.gid))
}

/// Opens the disk file backing a mounted partition id and reads its
/// superblock, returning everything needed to build an [`crate::fs::Ext2Like`].
pub fn open_mounted(
    ctx: &Context,
    id: &str,
) -> Result<(std::fs::File, crate::superblock::SuperBlock, i64), FsError> {
    let mount = ctx.registry.get(id)?;
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&mount.disk_path)?;
    let part_start = mount.partition.start as i64;
    let sb: crate::superblock::SuperBlock = crate::binio::read_record(&mut file, part_start as u64)?;
    if !sb.is_formatted() {
        return Err(FsError::lookup("partition is not formatted"));
    }
    Ok((file, sb, part_start))
}

/// Opens `/users.txt` on the mounted partition `id`, lets `mutate`
/// modify a parsed [`crate::users_db::UsersDb`] in place, then rewrites
/// the file and persists the superblock. Shared by every command that
/// touches the group/user mini-database.
pub fn with_users_db<F>(ctx: &Context, id: &str, mutate: F) -> Result<(), FsError>
where
    F: FnOnce(&mut crate::users_db::UsersDb) -> Result<(), FsError>,
{
    let (mut file, sb, part_start) = open_mounted(ctx, id)?;
    let mut fs = crate::fs::Ext2Like::new(&mut file, sb, part_start);
    let (_, users_idx) = fs.get_inode_by_path("/users.txt")?;
    let users_inode = {
        let (inode, _) = fs.get_inode_by_path("/users.txt")?;
        inode
    };
    let content = fs.read_file_content(&users_inode)?;
    let text = String::from_utf8_lossy(&content).to_string();
    let mut db = crate::users_db::UsersDb::parse(&text);
    mutate(&mut db)?;
    let rendered = db.render();
    fs.rewrite_file(users_idx, rendered.as_bytes())?;
    fs.write_superblock((part_start) as u64)?;
    Ok(())
}
