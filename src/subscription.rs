//! Daily push subscribers, persisted as `sub.json`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error reading or writing `sub.json`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubscriptionError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid subscriptions in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where a push goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberKind {
    Group,
    Private,
}

impl fmt::Display for SubscriberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberKind::Group => f.write_str("group"),
            SubscriberKind::Private => f.write_str("private"),
        }
    }
}

/// Contents of `sub.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriptions {
    #[serde(rename = "群组", default)]
    pub groups: Vec<i64>,
    #[serde(rename = "私聊", default)]
    pub private: Vec<i64>,
}

impl Subscriptions {
    pub fn list(&self, kind: SubscriberKind) -> &[i64] {
        match kind {
            SubscriberKind::Group => &self.groups,
            SubscriberKind::Private => &self.private,
        }
    }

    fn list_mut(&mut self, kind: SubscriberKind) -> &mut Vec<i64> {
        match kind {
            SubscriberKind::Group => &mut self.groups,
            SubscriberKind::Private => &mut self.private,
        }
    }

    /// Every target in push order: groups first, then private chats.
    pub fn targets(&self) -> impl Iterator<Item = (SubscriberKind, i64)> + '_ {
        self.groups
            .iter()
            .map(|id| (SubscriberKind::Group, *id))
            .chain(self.private.iter().map(|id| (SubscriberKind::Private, *id)))
    }
}

/// Read-modify-write access to `sub.json`.
#[derive(Debug, Clone)]
pub struct SubscriptionStore {
    path: PathBuf,
}

impl SubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load subscribers, creating an empty file on first use.
    pub fn load(&self) -> Result<Subscriptions, SubscriptionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| SubscriptionError::Json { path: self.path.clone(), source }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let subs = Subscriptions::default();
                self.save(&subs)?;
                Ok(subs)
            }
            Err(source) => Err(SubscriptionError::Io { path: self.path.clone(), source }),
        }
    }

    fn save(&self, subs: &Subscriptions) -> Result<(), SubscriptionError> {
        let io_err = |source: io::Error| SubscriptionError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(subs)
            .map_err(|source| SubscriptionError::Json { path: self.path.clone(), source })?;
        std::fs::write(&self.path, text).map_err(io_err)
    }

    /// Subscribe a target; returns the reply for the user.
    pub fn add(&self, kind: SubscriberKind, id: i64) -> Result<String, SubscriptionError> {
        let mut subs = self.load()?;
        let list = subs.list_mut(kind);
        if list.contains(&id) {
            return Ok(match kind {
                SubscriberKind::Group => "本群已经订阅过原神每日材料啦".to_string(),
                SubscriberKind::Private => "你已经订阅过原神每日材料啦".to_string(),
            });
        }
        list.push(id);
        self.save(&subs)?;
        tracing::info!(kind = %kind, id, "Subscription added");
        Ok(match kind {
            SubscriberKind::Group => "已启用本群原神每日材料订阅".to_string(),
            SubscriberKind::Private => "已启用原神每日材料私聊订阅".to_string(),
        })
    }

    /// Unsubscribe a target; returns the reply for the user.
    pub fn remove(&self, kind: SubscriberKind, id: i64) -> Result<String, SubscriptionError> {
        let mut subs = self.load()?;
        let list = subs.list_mut(kind);
        let before = list.len();
        list.retain(|existing| *existing != id);
        if list.len() == before {
            return Ok(match kind {
                SubscriberKind::Group => "本群还没有订阅原神每日材料哦".to_string(),
                SubscriberKind::Private => "你还没有订阅原神每日材料哦".to_string(),
            });
        }
        self.save(&subs)?;
        tracing::info!(kind = %kind, id, "Subscription removed");
        Ok(match kind {
            SubscriberKind::Group => "已删除本群原神每日材料订阅".to_string(),
            SubscriberKind::Private => "已删除原神每日材料私聊订阅".to_string(),
        })
    }
}
