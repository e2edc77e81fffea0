use crate::args::Args;
use crate::commands::{open_mounted, require_session};
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::Ext2Like;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Archivo no leido.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let (id, _uid, _gid) = require_session(ctx)?;

    if !args.has("file1") {
        return Err(FsError::argument("at least one -fileN flag is required"));
    }

    let (mut file, sb, part_start) = open_mounted(ctx, &id)?;
    let mut service = Ext2Like::new(&mut file, sb, part_start);

    let mut out = String::new();
    let mut n = 1;
    loop {
        let key = format!("file{n}");
        let Some(path) = args.get(&key) else { break };
        let (inode, _) = service.get_inode_by_path(path)?;
        if !inode.is_file() {
            return Err(FsError::lookup(format!("{path} is not a file")));
        }
        let content = service.read_file_content(&inode)?;
        out.push_str(&String::from_utf8_lossy(&content));
        n += 1;
    }

    Ok(out)
}
