use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::backend::{BackendConfig, InMemoryBackend, StoreBackend};
use crate::models::{Category, ChatThread, PassEntry, Room, UnlockedMatch, UserProfile};
use crate::StoreError;

/// Key layout. One record per key, JSON encoded.
pub mod keys {
    use crate::models::Category;

    pub const ROOM_PREFIX: &str = "room:";
    pub const MATCH_PREFIX: &str = "match:";
    pub const PROFILE_PREFIX: &str = "profile:";

    /// Secondary index entries are empty records under these prefixes.
    pub fn rooms_by_user_prefix(user_id: &str) -> String {
        format!("room_by_user:{user_id}:")
    }

    pub fn room_by_user(user_id: &str, room_id: &str) -> String {
        format!("{}{room_id}", rooms_by_user_prefix(user_id))
    }

    pub fn matches_by_user_prefix(user_id: &str) -> String {
        format!("match_by_user:{user_id}:")
    }

    pub fn match_by_user(user_id: &str, room_id: &str) -> String {
        format!("{}{room_id}", matches_by_user_prefix(user_id))
    }

    pub fn profile(user_id: &str) -> String {
        format!("{PROFILE_PREFIX}{user_id}")
    }

    pub fn pass(user_id: &str, day_key: &str) -> String {
        format!("pass:{user_id}:{day_key}")
    }

    pub fn room(room_id: &str) -> String {
        format!("{ROOM_PREFIX}{room_id}")
    }

    pub fn queue(category: Category) -> String {
        format!("queue:{}", category.as_str())
    }

    /// Unlocked matches are keyed by their originating room.
    pub fn unlocked_match(room_id: &str) -> String {
        format!("{MATCH_PREFIX}{room_id}")
    }

    pub fn thread(match_id: &str) -> String {
        format!("thread:{match_id}")
    }

    pub fn config(key: &str) -> String {
        format!("config:{key}")
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Typed access to every Chat Night record on top of a [`StoreBackend`].
pub struct ChatNightStore {
    backend: Box<dyn StoreBackend>,
}

impl ChatNightStore {
    /// Build the configured backend and wrap it.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        Ok(Self::with_backend(config.build()?))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(InMemoryBackend::new()))
    }

    /// Wrap a custom backend.
    pub fn with_backend(backend: Box<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.backend.flush()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.backend
            .get(key)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.backend.put(key, &encode(value)?)
    }

    /// Atomic read-modify-write of one typed record. `f` returns the
    /// replacement (or `None` to keep the stored value) and a result.
    fn modify<T, R, F>(&self, key: &str, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Result<(Option<T>, R), StoreError>,
    {
        let mut f = Some(f);
        let mut out = None;
        self.backend.update(key, &mut |current| {
            let f = f
                .take()
                .ok_or_else(|| StoreError::backend("update callback invoked twice"))?;
            let decoded = current.map(decode::<T>).transpose()?;
            let (next, result) = f(decoded)?;
            out = Some(result);
            next.as_ref().map(encode).transpose()
        })?;
        out.ok_or_else(|| StoreError::backend("update callback not invoked"))
    }

    fn insert_new<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let payload = encode(value)?;
        let mut payload = Some(payload);
        self.backend.update(key, &mut |current| {
            if current.is_some() {
                return Err(StoreError::AlreadyExists(key.to_string()));
            }
            Ok(payload.take())
        })
    }

    /// Index entries carry the id of the primary record as their value.
    fn indexed_ids(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        self.backend.scan_prefix(prefix, &mut |_, bytes| {
            ids.push(decode(bytes)?);
            Ok(())
        })?;
        Ok(ids)
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        self.backend.scan_prefix(prefix, &mut |_, bytes| {
            out.push(decode(bytes)?);
            Ok(())
        })?;
        Ok(out)
    }

    // Profiles

    pub fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.read(&keys::profile(user_id))
    }

    pub fn put_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.write(&keys::profile(&profile.id), profile)
    }

    pub fn profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.scan(keys::PROFILE_PREFIX)
    }

    // Passes

    pub fn pass(&self, user_id: &str, day_key: &str) -> Result<Option<PassEntry>, StoreError> {
        self.read(&keys::pass(user_id, day_key))
    }

    pub fn modify_pass<R, F>(&self, user_id: &str, day_key: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(Option<PassEntry>) -> Result<(Option<PassEntry>, R), StoreError>,
    {
        self.modify(&keys::pass(user_id, day_key), f)
    }

    // Rooms

    pub fn room(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        self.read(&keys::room(room_id))
    }

    /// Fails with [`StoreError::AlreadyExists`] if the id is taken.
    ///
    /// Index entries are written first. An entry whose room is missing is
    /// skipped on read.
    pub fn insert_room(&self, room: &Room) -> Result<(), StoreError> {
        for user_id in [&room.man_user_id, &room.woman_user_id] {
            self.write(&keys::room_by_user(user_id, &room.room_id), &room.room_id)?;
        }
        self.insert_new(&keys::room(&room.room_id), room)?;
        debug!(room_id = %room.room_id, "room stored");
        Ok(())
    }

    pub fn modify_room<R, F>(&self, room_id: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(Option<Room>) -> Result<(Option<Room>, R), StoreError>,
    {
        self.modify(&keys::room(room_id), f)
    }

    pub fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.scan(keys::ROOM_PREFIX)
    }

    /// Rooms the user took part in, ordered by room id. Reads only the
    /// user's own index entries.
    pub fn rooms_for_user(&self, user_id: &str) -> Result<Vec<Room>, StoreError> {
        let mut rooms = Vec::new();
        for room_id in self.indexed_ids(&keys::rooms_by_user_prefix(user_id))? {
            // A user id containing ':' can share a prefix with another user.
            if let Some(room) = self.room(&room_id)?.filter(|r: &Room| r.involves(user_id)) {
                rooms.push(room);
            }
        }
        Ok(rooms)
    }

    // Queues

    /// Snapshot of one FIFO queue, oldest first.
    pub fn queue(&self, category: Category) -> Result<Vec<String>, StoreError> {
        Ok(self.read(&keys::queue(category))?.unwrap_or_default())
    }

    /// Mutate one queue atomically. The queue is always written back.
    pub fn modify_queue<R, F>(&self, category: Category, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<String>) -> R,
    {
        self.modify(&keys::queue(category), |current: Option<Vec<String>>| {
            let mut queue = current.unwrap_or_default();
            let result = f(&mut queue);
            Ok((Some(queue), result))
        })
    }

    // Unlocked matches

    /// Insert unless the room already produced a match. Returns whether
    /// this call created it.
    pub fn insert_match_if_absent(&self, unlocked: &UnlockedMatch) -> Result<bool, StoreError> {
        for user_id in &unlocked.user_ids {
            self.write(
                &keys::match_by_user(user_id, &unlocked.room_id),
                &unlocked.room_id,
            )?;
        }
        match self.insert_new(&keys::unlocked_match(&unlocked.room_id), unlocked) {
            Ok(()) => Ok(true),
            Err(StoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn match_for_room(&self, room_id: &str) -> Result<Option<UnlockedMatch>, StoreError> {
        self.read(&keys::unlocked_match(room_id))
    }

    pub fn matches_for_user(&self, user_id: &str) -> Result<Vec<UnlockedMatch>, StoreError> {
        let mut matches = Vec::new();
        for room_id in self.indexed_ids(&keys::matches_by_user_prefix(user_id))? {
            let found = self
                .match_for_room(&room_id)?
                .filter(|m| m.user_ids.iter().any(|u| u == user_id));
            matches.extend(found);
        }
        Ok(matches)
    }

    // Threads

    pub fn thread(&self, match_id: &str) -> Result<Option<ChatThread>, StoreError> {
        self.read(&keys::thread(match_id))
    }

    /// Fails with [`StoreError::AlreadyExists`] if the match has a thread.
    pub fn insert_thread(&self, thread: &ChatThread) -> Result<(), StoreError> {
        self.insert_new(&keys::thread(&thread.match_id), thread)
    }

    // Runtime configuration

    pub fn config_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(&keys::config(key))
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(&keys::config(key), &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomState;
    use chrono::{Duration, TimeZone, Utc};

    fn room(id: &str, man: &str, woman: &str) -> Room {
        let start = Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap();
        Room {
            room_id: id.into(),
            man_user_id: man.into(),
            woman_user_id: woman.into(),
            starts_at: start,
            ends_at: start + Duration::minutes(5),
            state: RoomState::Active,
            engage_man: false,
            engage_woman: false,
            engaged_at: None,
        }
    }

    fn unlocked(room_id: &str, users: [&str; 2]) -> UnlockedMatch {
        UnlockedMatch {
            match_id: format!("m-{room_id}"),
            user_ids: users.iter().map(|u| u.to_string()).collect(),
            source: "chat_night".into(),
            room_id: room_id.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profiles_roundtrip() {
        let store = ChatNightStore::in_memory();
        let profile = UserProfile {
            id: "u1".into(),
            first_name: Some("Asha".into()),
            ..Default::default()
        };
        store.put_profile(&profile).unwrap();
        assert_eq!(store.profile("u1").unwrap(), Some(profile));
        assert_eq!(store.profile("missing").unwrap(), None);
        assert_eq!(store.profiles().unwrap().len(), 1);
    }

    #[test]
    fn room_insert_is_unique() {
        let store = ChatNightStore::in_memory();
        store.insert_room(&room("r1", "m", "w")).unwrap();
        let err = store.insert_room(&room("r1", "m2", "w2")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.room("r1").unwrap().unwrap().man_user_id, "m");
    }

    #[test]
    fn modify_room_returns_callback_result() {
        let store = ChatNightStore::in_memory();
        store.insert_room(&room("r1", "m", "w")).unwrap();
        let changed = store
            .modify_room("r1", |current| {
                let mut room = current.unwrap();
                room.engage_man = true;
                Ok((Some(room), true))
            })
            .unwrap();
        assert!(changed);
        assert!(store.room("r1").unwrap().unwrap().engage_man);

        let missing = store
            .modify_room("nope", |current| Ok((None, current.is_none())))
            .unwrap();
        assert!(missing);
        assert!(store.room("nope").unwrap().is_none());
    }

    #[test]
    fn rooms_for_user_filters_participants() {
        let store = ChatNightStore::in_memory();
        store.insert_room(&room("r1", "m1", "w1")).unwrap();
        store.insert_room(&room("r2", "m2", "w1")).unwrap();
        store.insert_room(&room("r3", "m2", "w2")).unwrap();
        let ids: Vec<_> = store
            .rooms_for_user("w1")
            .unwrap()
            .into_iter()
            .map(|r| r.room_id)
            .collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn user_lookups_skip_unrelated_records() {
        let store = ChatNightStore::in_memory();
        store.insert_room(&room("r1", "m1", "w1")).unwrap();
        assert!(store.insert_match_if_absent(&unlocked("r1", ["m1", "w1"])).unwrap());

        // Records of other users that no longer decode must not be read.
        store.backend.put(&keys::room("r9"), b"{broken").unwrap();
        store
            .backend
            .put(&keys::unlocked_match("r9"), b"{broken")
            .unwrap();

        let rooms = store.rooms_for_user("w1").unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, "r1");
        assert_eq!(store.matches_for_user("m1").unwrap().len(), 1);
        assert!(store.rooms_for_user("m9").unwrap().is_empty());
        assert!(store.rooms().is_err());
    }

    #[test]
    fn dangling_index_entries_are_skipped() {
        let store = ChatNightStore::in_memory();
        store
            .backend
            .put(&keys::room_by_user("m1", "gone"), b"\"gone\"")
            .unwrap();
        store.insert_room(&room("r1", "m1", "w1")).unwrap();
        let ids: Vec<_> = store
            .rooms_for_user("m1")
            .unwrap()
            .into_iter()
            .map(|r| r.room_id)
            .collect();
        assert_eq!(ids, vec!["r1"]);
    }

    #[test]
    fn user_index_does_not_leak_across_prefixed_ids() {
        let store = ChatNightStore::in_memory();
        store.insert_room(&room("r1", "a:b", "w")).unwrap();
        store.insert_room(&room("r2", "a", "w")).unwrap();
        let ids: Vec<_> = store
            .rooms_for_user("a")
            .unwrap()
            .into_iter()
            .map(|r| r.room_id)
            .collect();
        assert_eq!(ids, vec!["r2"]);
    }

    #[test]
    fn queues_are_per_category() {
        let store = ChatNightStore::in_memory();
        store
            .modify_queue(Category::Man, |q| q.push("m1".into()))
            .unwrap();
        store
            .modify_queue(Category::Man, |q| q.push("m2".into()))
            .unwrap();
        assert_eq!(store.queue(Category::Man).unwrap(), vec!["m1", "m2"]);
        assert!(store.queue(Category::Woman).unwrap().is_empty());

        let removed = store
            .modify_queue(Category::Man, |q| {
                let before = q.len();
                q.retain(|u| u != "m1");
                before - q.len()
            })
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.queue(Category::Man).unwrap(), vec!["m2"]);
    }

    #[test]
    fn match_insert_is_once_per_room() {
        let store = ChatNightStore::in_memory();
        assert!(store.insert_match_if_absent(&unlocked("r1", ["a", "b"])).unwrap());
        assert!(!store.insert_match_if_absent(&unlocked("r1", ["a", "b"])).unwrap());
        assert!(store.insert_match_if_absent(&unlocked("r2", ["a", "c"])).unwrap());

        assert_eq!(store.matches_for_user("a").unwrap().len(), 2);
        assert_eq!(store.matches_for_user("b").unwrap().len(), 1);
        assert_eq!(
            store.match_for_room("r2").unwrap().unwrap().match_id,
            "m-r2"
        );
    }

    #[test]
    fn thread_insert_detects_duplicates() {
        let store = ChatNightStore::in_memory();
        let thread = ChatThread {
            thread_id: "t1".into(),
            match_id: "m1".into(),
            participants: vec!["a".into(), "b".into()],
            last_message_at: None,
            last_message_text: None,
            created_at: Utc::now(),
        };
        store.insert_thread(&thread).unwrap();
        assert!(matches!(
            store.insert_thread(&thread),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.thread("m1").unwrap(), Some(thread));
    }

    #[test]
    fn config_values() {
        let store = ChatNightStore::in_memory();
        assert_eq!(store.config_value("K").unwrap(), None);
        store.set_config_value("K", "40").unwrap();
        assert_eq!(store.config_value("K").unwrap().as_deref(), Some("40"));
    }

    #[test]
    fn pass_modify_creates_then_updates() {
        let store = ChatNightStore::in_memory();
        let now = Utc::now();
        let used = store
            .modify_pass("u", "2026-02-13", |current| {
                let mut entry = current.unwrap_or(PassEntry {
                    user_id: "u".into(),
                    day_key: "2026-02-13".into(),
                    passes_total: 1,
                    passes_used: 0,
                    updated_at: now,
                });
                entry.passes_used += 1;
                let used = entry.passes_used;
                Ok((Some(entry), used))
            })
            .unwrap();
        assert_eq!(used, 1);
        assert_eq!(store.pass("u", "2026-02-13").unwrap().unwrap().passes_used, 1);
        assert!(store.pass("u", "2026-02-14").unwrap().is_none());
    }

    #[cfg(feature = "backend-redb")]
    #[test]
    fn redb_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.redb");
        let config = BackendConfig::redb(path.to_string_lossy().to_string());
        {
            let store = ChatNightStore::new(&config).unwrap();
            store.insert_room(&room("r1", "m", "w")).unwrap();
        }
        let store = ChatNightStore::new(&config).unwrap();
        assert_eq!(store.rooms().unwrap().len(), 1);
    }
}
