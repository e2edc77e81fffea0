use crate::args::Args;
use crate::commands::{require_session, with_users_db};
use crate::context::Context;
use crate::error::CommandError;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Grupo de usuario no cambiado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, crate::error::FsError> {
    let args = Args::parse(raw_args);
    let user = args.require("user")?;
    let grp = args.require("grp")?;
    let (id, _uid, _gid) = require_session(ctx)?;
    with_users_db(ctx, &id, |db| db.change_group(user, grp))?;
    Ok(format!("Usuario {user} movido al grupo {grp}."))
}
