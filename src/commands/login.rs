use crate::args::Args;
use crate::commands::open_mounted;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use crate::fs::Ext2Like;
use crate::users_db::UsersDb;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Login fallido.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let user = args.require("user")?;
    let pass = args.require("pass")?;
    let id = args.require("id")?;

    if ctx.session.logged_in {
        if ctx.session.partition_id == id {
            return Err(FsError::state("a session is already active on this partition"));
        }
        return Err(FsError::state("a session is already active on another partition"));
    }

    let (mut file, sb, part_start) = open_mounted(ctx, id)?;
    let mut fs = Ext2Like::new(&mut file, sb, part_start);
    let (users_inode, _) = fs.get_inode_by_path("/users.txt")?;
    let content = fs.read_file_content(&users_inode)?;
    let text = String::from_utf8_lossy(&content).to_string();
    let db = UsersDb::parse(&text);
    let (uid, gid) = db.authenticate(user, pass)?;

    ctx.session.logged_in = true;
    ctx.session.username = user.to_string();
    ctx.session.uid = uid as i32;
    ctx.session.gid = gid as i32;
    ctx.session.partition_id = id.to_string();

    tracing::info!(user, id, uid, gid, "login");
    Ok(format!("Sesion iniciada para {user} (UID={uid}, GID={gid})."))
}
