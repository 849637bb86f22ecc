use crate::error::StoreError;
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;

pub const TOKEN: &str = "token";
pub const USER: &str = "user";

pub trait SessionStore {
    type Error;
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
    fn remove_all(&self) -> Result<(), Self::Error>;
}

const SESSION: &'static [u8] = b"session";

impl SessionStore for sled::Db {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let session = self.open_tree(SESSION)?;
        match session.get(key)? {
            Some(value) => String::from_utf8(value.to_vec())
                .map(Some)
                .map_err(|_| StoreError::Encoding(key.to_owned())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let session = self.open_tree(SESSION)?;
        session.insert(key, value.as_bytes())?;
        session.flush()?;
        Ok(())
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        let session = self.open_tree(SESSION)?;
        session.clear()?;
        session.flush()?;
        Ok(())
    }
}

/// Non-persistent store, lost when dropped.
#[cfg(test)]
#[derive(Default, Debug)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

#[cfg(test)]
impl SessionStore for MemoryStore {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_all(&self) -> Result<(), Self::Error> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

/// Snapshot of the store, handed to every authenticated request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    pub fn new<T: Into<String>, U: Into<String>>(token: T, username: U) -> Self {
        Session {
            token: Some(token.into()),
            username: Some(username.into()),
        }
    }

    pub fn load<S: SessionStore>(store: &S) -> Result<Self, S::Error> {
        Ok(Session {
            token: store.get(TOKEN)?,
            username: store.get(USER)?,
        })
    }

    pub fn save<S: SessionStore>(&self, store: &S) -> Result<(), S::Error> {
        if let Some(token) = &self.token {
            store.set(TOKEN, token)?;
        }
        if let Some(username) = &self.username {
            store.set(USER, username)?;
        }
        Ok(())
    }

    pub fn clear<S: SessionStore>(store: &S) -> Result<(), S::Error> {
        store.remove_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temporary_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn sled_round_trip() {
        let db = temporary_db();
        assert_eq!(Session::load(&db).unwrap(), Session::default());
        Session::new("T1", "alice").save(&db).unwrap();
        assert_eq!(SessionStore::get(&db, TOKEN).unwrap().as_deref(), Some("T1"));
        assert_eq!(SessionStore::get(&db, USER).unwrap().as_deref(), Some("alice"));
        assert_eq!(Session::load(&db).unwrap(), Session::new("T1", "alice"));
    }

    #[test]
    fn sled_remove_all() {
        let db = temporary_db();
        Session::new("T1", "alice").save(&db).unwrap();
        Session::clear(&db).unwrap();
        assert_eq!(Session::load(&db).unwrap(), Session::default());
    }

    #[test]
    fn save_keeps_fields_not_in_snapshot() {
        let store = MemoryStore::default();
        Session::new("T1", "alice").save(&store).unwrap();
        let renamed = Session {
            token: None,
            username: Some("alicia".to_owned()),
        };
        renamed.save(&store).unwrap();
        assert_eq!(Session::load(&store).unwrap(), Session::new("T1", "alicia"));
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::default();
        store.set(USER, "bob").unwrap();
        assert_eq!(store.get(USER).unwrap().as_deref(), Some("bob"));
        assert_eq!(store.get(TOKEN).unwrap(), None);
        store.remove_all().unwrap();
        assert_eq!(store.get(USER).unwrap(), None);
        assert_eq!(Session::load(&store).unwrap().token, None);
    }
}
