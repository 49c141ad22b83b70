use {
    super::remote::ChatRemote,
    std::{collections::HashMap, sync::Arc},
};

/// Registry of all available chat remotes, keyed by backend id.
pub struct RemoteRegistry {
    remotes: HashMap<String, Arc<dyn ChatRemote>>,
}

impl Default for RemoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self {
            remotes: HashMap::new(),
        }
    }

    pub fn register(&mut self, remote: Arc<dyn ChatRemote>) {
        self.remotes.insert(remote.id().to_string(), remote);
    }

    /// Look up the remote configured as `chat_application` (case-insensitive).
    pub fn get(&self, id: &str) -> Option<Arc<dyn ChatRemote>> {
        self.remotes.get(&id.to_lowercase()).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.remotes.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}
