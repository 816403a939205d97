use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maximum number of live menu entries a page may own.
pub const MENU_ENTRY_LIMIT: usize = 100;
/// Keeps page-chosen ids away from reserved property names on the host side.
pub const MENU_KEY_PREFIX: &str = "entry_";
/// Key used when an id sanitizes to nothing.
pub const DEFAULT_MENU_ID: &str = "mist_defaultId";

pub type MenuCallback = Arc<dyn Fn() + Send + Sync>;

/// Strip everything outside `[a-zA-Z0-9_-]`.
pub fn sanitize_menu_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// The identity key for a page-supplied id.
pub fn menu_key(raw: Option<&str>) -> String {
    let sanitized = sanitize_menu_id(raw.unwrap_or_default());
    if sanitized.is_empty() {
        DEFAULT_MENU_ID.to_string()
    } else {
        format!("{MENU_KEY_PREFIX}{sanitized}")
    }
}

/// Options for `menu.add` / `menu.update`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MenuOptions {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub badge: Option<Value>,
}

impl MenuOptions {
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_badge(mut self, badge: Value) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// The host-facing record of a menu entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    pub id: String,
    pub position: Option<f64>,
    pub selected: bool,
    pub name: String,
    pub badge: Option<Value>,
}

/// One queued mutation, flushed to the host in batches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum MenuChange {
    #[serde(rename = "addMenu")]
    Add { entry: MenuEntry },
    /// The host reads the key of a removal from `filteredId`.
    #[serde(rename = "removeMenu")]
    Remove {
        #[serde(rename = "filteredId")]
        id: String,
    },
    #[serde(rename = "selectMenu")]
    Select { id: String },
    #[serde(rename = "clearMenu")]
    Clear,
}

struct StoredEntry {
    entry: MenuEntry,
    callback: Option<MenuCallback>,
}

/// Local mirror of the page's menu entries.
#[derive(Default)]
pub struct MenuRegistry {
    entries: HashMap<String, StoredEntry>,
}

impl fmt::Debug for MenuRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, &v.entry)))
            .finish()
    }
}

impl MenuRegistry {
    /// Insert or overwrite an entry. `None` when `name` is missing or the
    /// entry limit would be exceeded by a new key.
    pub fn add(&mut self, options: MenuOptions, callback: Option<MenuCallback>) -> Option<MenuChange> {
        let Some(name) = options.name else {
            tracing::debug!("menu entry rejected: missing name");
            return None;
        };
        let key = menu_key(options.id.as_deref());
        if !self.entries.contains_key(&key) && self.entries.len() >= MENU_ENTRY_LIMIT {
            tracing::debug!(key = %key, limit = MENU_ENTRY_LIMIT, "menu entry rejected: limit reached");
            return None;
        }
        let entry = MenuEntry {
            id: key.clone(),
            position: options.position,
            selected: options.selected,
            name,
            badge: options.badge,
        };
        self.entries.insert(
            key,
            StoredEntry {
                entry: entry.clone(),
                callback,
            },
        );
        Some(MenuChange::Add { entry })
    }

    pub fn remove(&mut self, id: &str) -> MenuChange {
        let key = menu_key(Some(id));
        self.entries.remove(&key);
        MenuChange::Remove { id: key }
    }

    /// Mark exactly the targeted entry as selected, clearing all others.
    pub fn select(&mut self, id: &str) -> MenuChange {
        let key = menu_key(Some(id));
        for (k, stored) in self.entries.iter_mut() {
            stored.entry.selected = *k == key;
        }
        MenuChange::Select { id: key }
    }

    pub fn clear(&mut self) -> MenuChange {
        self.entries.clear();
        MenuChange::Clear
    }

    pub fn get(&self, key: &str) -> Option<&MenuEntry> {
        self.entries.get(key).map(|stored| &stored.entry)
    }

    pub fn callback(&self, key: &str) -> Option<MenuCallback> {
        self.entries.get(key).and_then(|stored| stored.callback.clone())
    }

    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.entries.values().map(|stored| &stored.entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn filled(count: usize) -> MenuRegistry {
        let mut menu = MenuRegistry::default();
        for i in 0..count {
            assert!(menu.add(MenuOptions::named(format!("item{i}"), "Item"), None).is_some());
        }
        menu
    }

    #[test]
    fn sanitizing_strips_and_is_idempotent() {
        assert_eq!(sanitize_menu_id("a!@#b"), "ab");
        assert_eq!(sanitize_menu_id("chat-room_42"), "chat-room_42");
        assert_eq!(sanitize_menu_id("ü<script>"), "script");
        for raw in ["a!@#b", "__proto__", "x y z", "", "Ω≈ç"] {
            let once = sanitize_menu_id(raw);
            assert_eq!(sanitize_menu_id(&once), once);
        }
    }

    #[test]
    fn keys_are_prefixed_with_default_fallback() {
        assert_eq!(menu_key(Some("home")), "entry_home");
        assert_eq!(menu_key(Some("__proto__")), "entry___proto__");
        assert_eq!(menu_key(Some("!!!")), DEFAULT_MENU_ID);
        assert_eq!(menu_key(None), DEFAULT_MENU_ID);
    }

    #[test]
    fn add_requires_a_name() {
        let mut menu = MenuRegistry::default();
        let options = MenuOptions {
            id: Some("home".to_string()),
            ..MenuOptions::default()
        };
        assert!(menu.add(options, None).is_none());
        assert!(menu.is_empty());
    }

    #[test]
    fn add_records_the_entry_and_the_change() {
        let mut menu = MenuRegistry::default();
        let change = menu
            .add(
                MenuOptions::named("tkrzU", "My Entry")
                    .with_badge(json!(50))
                    .with_position(1.0)
                    .selected(),
                None,
            )
            .expect("entry accepted");
        let expected = MenuEntry {
            id: "entry_tkrzU".to_string(),
            position: Some(1.0),
            selected: true,
            name: "My Entry".to_string(),
            badge: Some(json!(50)),
        };
        assert_eq!(change, MenuChange::Add { entry: expected.clone() });
        assert_eq!(menu.get("entry_tkrzU"), Some(&expected));
    }

    #[test]
    fn limit_applies_to_new_ids_only() {
        let mut menu = filled(MENU_ENTRY_LIMIT);
        assert!(menu.add(MenuOptions::named("one-too-many", "Nope"), None).is_none());
        assert_eq!(menu.len(), MENU_ENTRY_LIMIT);
        assert!(menu.get("entry_one-too-many").is_none());

        let change = menu.add(MenuOptions::named("item7", "Renamed"), None);
        assert!(change.is_some());
        assert_eq!(menu.len(), MENU_ENTRY_LIMIT);
        assert_eq!(menu.get("entry_item7").map(|e| e.name.as_str()), Some("Renamed"));
    }

    #[test]
    fn select_is_exclusive() {
        let mut menu = MenuRegistry::default();
        menu.add(MenuOptions::named("a", "A").selected(), None);
        menu.add(MenuOptions::named("b", "B").selected(), None);
        menu.add(MenuOptions::named("c", "C"), None);

        assert_eq!(menu.select("b!"), MenuChange::Select { id: "entry_b".to_string() });
        let selected: Vec<_> = menu.entries().filter(|e| e.selected).map(|e| e.id.clone()).collect();
        assert_eq!(selected, vec!["entry_b".to_string()]);

        menu.select("missing");
        assert!(menu.entries().all(|e| !e.selected));
    }

    #[test]
    fn remove_and_clear() {
        let mut menu = filled(3);
        assert_eq!(menu.remove("item1"), MenuChange::Remove { id: "entry_item1".to_string() });
        assert_eq!(menu.remove("item1"), MenuChange::Remove { id: "entry_item1".to_string() });
        assert_eq!(menu.len(), 2);
        assert_eq!(menu.clear(), MenuChange::Clear);
        assert!(menu.is_empty());
    }

    #[test]
    fn update_replaces_the_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut menu = MenuRegistry::default();
        menu.add(MenuOptions::named("home", "Home"), None);
        assert!(menu.callback("entry_home").is_none());

        let cb: MenuCallback = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        menu.add(MenuOptions::named("home", "Home"), Some(cb));
        (menu.callback("entry_home").expect("callback stored"))();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn changes_serialize_to_the_host_record_shape() {
        let add = MenuChange::Add {
            entry: MenuEntry {
                id: "entry_home".to_string(),
                position: None,
                selected: false,
                name: "Home".to_string(),
                badge: None,
            },
        };
        assert_eq!(
            serde_json::to_value(add).expect("serialize add"),
            json!({
                "action": "addMenu",
                "entry": {"id": "entry_home", "position": null, "selected": false, "name": "Home", "badge": null}
            })
        );
        assert_eq!(
            serde_json::to_value(MenuChange::Clear).expect("serialize clear"),
            json!({"action": "clearMenu"})
        );
        assert_eq!(
            serde_json::to_value(MenuChange::Remove { id: "entry_x".to_string() })
                .expect("serialize remove"),
            json!({"action": "removeMenu", "filteredId": "entry_x"})
        );
    }
}
