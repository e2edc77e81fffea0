use crate::args::Args;
use crate::commands::require_absolute;
use crate::context::Context;
use crate::error::{CommandError, FsError};
use std::fs;

pub fn run(ctx: &mut Context, raw_args: &str) -> Result<String, CommandError> {
    run_inner(ctx, raw_args).map_err(|e| CommandError::new("Disco no eliminado.", e))
}

fn run_inner(ctx: &mut Context, raw_args: &str) -> Result<String, FsError> {
    let args = Args::parse(raw_args);
    let path = args.require("path")?;
    require_absolute(path)?;

    fs::remove_file(path)?;
    ctx.registry.purge_path(path);

    tracing::info!(path, "removed disk");
    Ok(format!("Disco {path} eliminado."))
}
