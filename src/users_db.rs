//! `users.txt` mini-database: a CSV-like text file of group and user
//! rows, with tombstone deletion (id set to `0`, row kept forever).

use crate::error::FsError;

pub const ROOT_GROUP: &str = "root";
pub const ROOT_USER: &str = "root";

#[derive(Debug, Clone)]
pub enum Row {
    Group { id: i64, name: String },
    User { id: i64, group: String, user: String, pass: String },
}

impl Row {
    pub fn parse(line: &str) -> Option<Row> {
        let fields: Vec<&str> = line.split(',').collect();
        match fields.as_slice() {
            [id, kind, name] if kind.eq_ignore_ascii_case("g") => {
                Some(Row::Group { id: id.parse().ok()?, name: name.to_string() })
            }
            [id, kind, group, user, pass] if kind.eq_ignore_ascii_case("u") => Some(Row::User {
                id: id.parse().ok()?,
                group: group.to_string(),
                user: user.to_string(),
                pass: pass.to_string(),
            }),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Row::Group { id, name } => format!("{id},G,{name}"),
            Row::User { id, group, user, pass } => format!("{id},U,{group},{user},{pass}"),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Row::Group { id, .. } => *id,
            Row::User { id, .. } => *id,
        }
    }

    pub fn is_tombstoned(&self) -> bool {
        self.id() == 0
    }
}

pub struct UsersDb {
    pub rows: Vec<Row>,
}

impl UsersDb {
    pub fn parse(content: &str) -> Self {
        let rows = content.lines().filter_map(Row::parse).collect();
        UsersDb { rows }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.render());
            out.push('\n');
        }
        out
    }

    pub fn next_group_id(&self) -> i64 {
        self.rows
            .iter()
            .filter_map(|r| match r {
                Row::Group { id, .. } => Some(*id),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn next_user_id(&self) -> i64 {
        self.rows
            .iter()
            .filter_map(|r| match r {
                Row::User { id, .. } => Some(*id),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn group_exists(&self, name: &str) -> bool {
        self.rows.iter().any(|r| match r {
            Row::Group { name: n, .. } if !r.is_tombstoned() => n.eq_ignore_ascii_case(name),
            _ => false,
        })
    }

    pub fn group_name_taken(&self, name: &str) -> bool {
        self.rows.iter().any(|r| match r {
            Row::Group { name: n, .. } => n.eq_ignore_ascii_case(name),
            _ => false,
        })
    }

    pub fn username_taken(&self, name: &str) -> bool {
        self.rows.iter().any(|r| match r {
            Row::User { user, .. } => user.eq_ignore_ascii_case(name),
            _ => false,
        })
    }

    pub fn add_group(&mut self, name: &str) -> Result<(), FsError> {
        if self.group_name_taken(name) {
            return Err(FsError::state("group already exists"));
        }
        let id = self.next_group_id();
        self.rows.push(Row::Group { id, name: name.to_string() });
        Ok(())
    }

    pub fn remove_group(&mut self, name: &str) -> Result<(), FsError> {
        if name.eq_ignore_ascii_case(ROOT_GROUP) {
            return Err(FsError::state("cannot remove root group"));
        }
        let row = self.rows.iter_mut().find(|r| matches!(r, Row::Group { name: n, .. } if n.eq_ignore_ascii_case(name) ) );
        match row {
            Some(Row::Group { id, .. }) if *id != 0 => {
                *id = 0;
                Ok(())
            }
            Some(_) => Err(FsError::lookup("group already removed")),
            None => Err(FsError::lookup("group does not exist")),
        }
    }

    pub fn add_user(&mut self, user: &str, pass: &str, group: &str) -> Result<(), FsError> {
        if !self.group_exists(group) {
            return Err(FsError::lookup("group does not exist"));
        }
        if self.username_taken(user) {
            return Err(FsError::state("user already exists"));
        }
        let id = self.next_user_id();
        self.rows.push(Row::User {
            id,
            group: group.to_string(),
            user: user.to_string(),
            pass: pass.to_string(),
        });
        Ok(())
    }

    pub fn remove_user(&mut self, user: &str) -> Result<(), FsError> {
        if user.eq_ignore_ascii_case(ROOT_USER) {
            return Err(FsError::state("cannot remove root user"));
        }
        let row = self
            .rows
            .iter_mut()
            .find(|r| matches!(r, Row::User { user: u, .. } if u.eq_ignore_ascii_case(user)));
        match row {
            Some(Row::User { id, .. }) if *id != 0 => {
                *id = 0;
                Ok(())
            }
            Some(_) => Err(FsError::lookup("user already removed")),
            None => Err(FsError::lookup("user does not exist")),
        }
    }

    pub fn change_group(&mut self, user: &str, group: &str) -> Result<(), FsError> {
        if user.eq_ignore_ascii_case(ROOT_USER) {
            return Err(FsError::state("cannot change root user's group"));
        }
        if !self.group_exists(group) {
            return Err(FsError::lookup("group does not exist"));
        }
        let row = self
            .rows
            .iter_mut()
            .find(|r| matches!(r, Row::User { user: u, id, .. } if u.eq_ignore_ascii_case(user) && *id != 0));
        match row {
            Some(Row::User { group: g, .. }) => {
                *g = group.to_string();
                Ok(())
            }
            _ => Err(FsError::lookup("user does not exist")),
        }
    }

    /// Authenticates against an active (non-tombstoned) user row with
    /// matching username and password; resolves its group's gid.
    pub fn authenticate(&self, user: &str, pass: &str) -> Result<(i64, i64), FsError> {
        let matched = self.rows.iter().find_map(|r| match r {
            Row::User { id, group, user: u, pass: p } if *id != 0 && u == user && p == pass => {
                Some((*id, group.clone()))
            }
            _ => None,
        });
        let (uid, group) = matched.ok_or_else(|| FsError::lookup("invalid username or password"))?;
        let gid = self
            .rows
            .iter()
            .find_map(|r| match r {
                Row::Group { id, name } if *id != 0 && name.eq_ignore_ascii_case(&group) => Some(*id),
                _ => None,
            })
            .ok_or_else(|| FsError::lookup("user's group no longer exists"))?;
        Ok((uid, gid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_parses_root_rows() {
        let db = UsersDb::parse("1,G,root\n1,U,root,root,123\n");
        assert_eq!(db.rows.len(), 2);
        assert!(db.group_exists("root"));
        assert_eq!(db.authenticate("root", "123").unwrap(), (1, 1));
    }

    #[test]
    fn tombstone_keeps_the_line_but_zeroes_the_id() {
        let mut db = UsersDb::parse("1,G,root\n1,U,root,root,123\n");
        db.add_group("admins").unwrap();
        db.add_user("alice", "x", "admins").unwrap();
        let before_lines = db.render().lines().count();
        db.remove_user("alice").unwrap();
        let after_lines = db.render().lines().count();
        assert_eq!(before_lines, after_lines);
        assert!(db.render().contains("0,U,admins,alice,x"));
    }

    #[test]
    fn duplicate_group_name_is_case_insensitive() {
        let mut db = UsersDb::parse("1,G,root\n1,U,root,root,123\n");
        db.add_group("admins").unwrap();
        assert!(db.add_group("ADMINS").is_err());
    }

    #[test]
    fn cannot_remove_or_change_root() {
        let mut db = UsersDb::parse("1,G,root\n1,U,root,root,123\n");
        assert!(db.remove_user("root").is_err());
        assert!(db.remove_group("root").is_err());
        assert!(db.change_group("root", "root").is_err());
    }

    #[test]
    fn next_group_id_reuses_a_tombstoned_max_id() {
        let mut db = UsersDb::parse("1,G,root\n1,U,root,root,123\n");
        db.add_group("g1").unwrap();
        db.add_group("g2").unwrap();
        db.remove_group("g2").unwrap();
        assert_eq!(db.next_group_id(), 3);
    }
}
