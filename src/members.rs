use crate::error::RosterError;
use crate::network::UserRecord;

/// Member pane next to the roster. Shows the users of the active group.
#[derive(Debug, Default)]
pub struct MemberList {
    pub gid: Option<String>,
    pub users: Vec<UserRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

impl MemberList {
    pub fn empty(&mut self) {
        self.gid = None;
        self.users.clear();
        self.loading = false;
        self.error = None;
    }

    pub fn begin(&mut self, gid: &str) {
        self.gid = Some(gid.to_string());
        self.loading = true;
    }

    /// Stores a fetch result unless the pane moved on to another group meanwhile.
    pub fn apply(&mut self, gid: &str, result: Result<Vec<UserRecord>, RosterError>) -> bool {
        if self.gid.as_deref() != Some(gid) {
            tracing::debug!(gid, "dropping stale member list");
            return false;
        }
        self.loading = false;
        match result {
            Ok(users) => {
                self.users = users;
                self.error = None;
            }
            Err(err) => {
                self.users.clear();
                self.error = Some(err.user_message());
            }
        }
        true
    }

    pub fn label(user: &UserRecord) -> &str {
        user.displayname.as_deref().filter(|d| !d.is_empty()).unwrap_or(&user.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserRecord {
        UserRecord { name: name.into(), displayname: None }
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut list = MemberList::default();
        list.begin("ops");
        list.empty();
        list.begin("dev");
        assert!(!list.apply("ops", Ok(vec![user("alice")])));
        assert!(list.users.is_empty());
        assert!(list.loading);

        assert!(list.apply("dev", Ok(vec![user("bob")])));
        assert_eq!(list.users, vec![user("bob")]);
        assert!(!list.loading);
    }

    #[test]
    fn display_name_falls_back_to_login() {
        let named = UserRecord { name: "a1".into(), displayname: Some("Ann".into()) };
        let blank = UserRecord { name: "b2".into(), displayname: Some(String::new()) };
        assert_eq!(MemberList::label(&named), "Ann");
        assert_eq!(MemberList::label(&blank), "b2");
    }
}
