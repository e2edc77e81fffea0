use crate::context::Context;
use crate::error::CommandError;

pub fn run(ctx: &mut Context, _raw_args: &str) -> Result<String, CommandError> {
    let ids = ctx.registry.list_ids();
    if ids.is_empty() {
        Ok("No hay particiones montadas.".to_string())
    } else {
        Ok(format!("Particiones montadas: {}", ids.join(", ")))
    }
}
