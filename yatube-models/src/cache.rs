use sha2::{Digest, Sha256};

/// The listing a fragment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Group(i32),
    Author(i32),
    /// The feed of the follower with this id.
    Feed(i32),
}

impl Scope {
    pub fn fragment_name(self) -> &'static str {
        match self {
            Scope::Global => "index_page",
            Scope::Group(_) => "group_page",
            Scope::Author(_) => "profile_page",
            Scope::Feed(_) => "follow_page",
        }
    }

    fn vary_on(self, page: i64) -> Vec<String> {
        match self {
            Scope::Global => vec![page.to_string()],
            Scope::Group(id) | Scope::Author(id) | Scope::Feed(id) => {
                vec![id.to_string(), page.to_string()]
            }
        }
    }
}

/// Key under which the post list of a page is cached.
pub fn cache_key(scope: Scope, page: i64) -> String {
    let mut hasher = Sha256::new();
    for value in scope.vary_on(page) {
        hasher.update(value.as_bytes());
        hasher.update(b":");
    }
    format!(
        "template.cache.{}.{}",
        scope.fragment_name(),
        hex::encode(hasher.finalize())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deterministic() {
        for scope in [Scope::Global, Scope::Group(3), Scope::Author(3), Scope::Feed(3)].iter() {
            assert_eq!(cache_key(*scope, 2), cache_key(*scope, 2));
        }
    }

    #[test]
    fn key_format() {
        let key = cache_key(Scope::Group(1), 1);
        assert!(key.starts_with("template.cache.group_page."));
        let digest = key.trim_start_matches("template.cache.group_page.");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn no_collisions() {
        let mut keys = HashSet::new();
        let mut total = 0;
        for page in 1..5 {
            keys.insert(cache_key(Scope::Global, page));
            total += 1;
            for id in 1..5 {
                for scope in [Scope::Group(id), Scope::Author(id), Scope::Feed(id)].iter() {
                    keys.insert(cache_key(*scope, page));
                    total += 1;
                }
            }
        }
        assert_eq!(keys.len(), total);
        // "1:12:" and "11:2:" must not meet
        assert_ne!(cache_key(Scope::Group(1), 12), cache_key(Scope::Group(11), 2));
    }
}
