use web_sys::{window, Storage};

const TOKEN_KEY: &str = "token";
const USER_ID_KEY: &str = "user_id";
const USER_EMAIL_KEY: &str = "user_email";

/// Signed-in user as stored in local storage after login.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

fn storage() -> Option<Storage> {
    window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

impl Session {
    pub fn load() -> Option<Session> {
        let storage = storage()?;
        let access_token = storage.get_item(TOKEN_KEY).ok().flatten()?;
        let user_id = storage.get_item(USER_ID_KEY).ok().flatten()?;
        if access_token.is_empty() || user_id.is_empty() {
            return None;
        }
        let email = storage
            .get_item(USER_EMAIL_KEY)
            .ok()
            .flatten()
            .unwrap_or_default();
        Some(Session { access_token, user_id, email })
    }

    pub fn store(&self) -> bool {
        match storage() {
            Some(storage) => {
                storage.set_item(TOKEN_KEY, &self.access_token).is_ok()
                    && storage.set_item(USER_ID_KEY, &self.user_id).is_ok()
                    && storage.set_item(USER_EMAIL_KEY, &self.email).is_ok()
            }
            None => false,
        }
    }

    pub fn clear() {
        if let Some(storage) = storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_ID_KEY);
            let _ = storage.remove_item(USER_EMAIL_KEY);
        }
    }
}

pub fn is_logged_in() -> bool {
    Session::load().is_some()
}
