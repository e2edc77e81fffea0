//! Authenticated-user session context, mutated by login/logout and
//! read by every privileged command.

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub logged_in: bool,
    pub username: String,
    pub uid: i32,
    pub gid: i32,
    pub partition_id: String,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn logout(&mut self) {
        *self = Session::default();
    }
}
