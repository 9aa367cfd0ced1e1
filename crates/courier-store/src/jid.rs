//! JID construction for bare phone numbers and group ids.

/// Server suffix for individual accounts.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Server suffix for group conversations (`<creator>-<timestamp>` ids).
pub const GROUP_SERVER: &str = "g.us";

/// Turn a bare id into a full JID. Ids that already carry a server are
/// returned unchanged.
pub fn normalize(id: &str) -> String {
    if id.contains('@') {
        id.to_string()
    } else if id.contains('-') {
        format!("{id}@{GROUP_SERVER}")
    } else {
        format!("{id}@{USER_SERVER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_gets_user_server() {
        assert_eq!(normalize("15551234567"), "15551234567@s.whatsapp.net");
    }

    #[test]
    fn group_id_gets_group_server() {
        assert_eq!(normalize("15551234567-1400000000"), "15551234567-1400000000@g.us");
    }

    #[test]
    fn full_jid_is_untouched() {
        assert_eq!(normalize("123@broadcast"), "123@broadcast");
    }
}
