//! The explicit context value threaded through every command, in place
//! of the process-wide globals a kernel-facing tool would reach for.

use crate::registry::Registry;
use crate::session::Session;

#[derive(Debug, Default)]
pub struct Context {
    pub registry: Registry,
    pub session: Session,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }
}
