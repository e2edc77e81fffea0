use crate::context::Context;
use crate::error::CommandError;

pub fn run(ctx: &mut Context, _raw_args: &str) -> Result<String, CommandError> {
    ctx.session.logout();
    Ok("Sesion cerrada.".to_string())
}
