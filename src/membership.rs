//! Membership resolution - maps configured display names to draft members.
//!
//! The draft core validates every configured participant against this port
//! at session creation; an unresolvable name fails the session before any
//! state mutates.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Scope inside which display names are resolved (a channel, a workspace).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelScope(pub String);

impl ChannelScope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }
}

/// Resolves display names to opaque member identities.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Look up `display_name` inside `scope`. `Ok(None)` means the name is
    /// not known there.
    async fn find_participant(
        &self,
        scope: &ChannelScope,
        display_name: &str,
    ) -> Result<Option<String>>;
}

/// Fixed name -> member table; backs the console surface and tests.
#[derive(Debug, Default)]
pub struct StaticMembership {
    members: HashMap<String, String>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table where every given name resolves to a derived member id.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let members = names
            .iter()
            .map(|name| {
                let name = name.as_ref().to_string();
                let member = format!("member-{name}");
                (name, member)
            })
            .collect();
        Self { members }
    }

    /// Add a single member entry.
    pub fn insert(&mut self, name: impl Into<String>, member: impl Into<String>) {
        self.members.insert(name.into(), member.into());
    }
}

#[async_trait]
impl MembershipResolver for StaticMembership {
    async fn find_participant(
        &self,
        _scope: &ChannelScope,
        display_name: &str,
    ) -> Result<Option<String>> {
        Ok(self.members.get(display_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_membership_resolves_known_name() {
        let membership = StaticMembership::from_names(&["alice", "bob"]);
        let scope = ChannelScope::new("draft-channel");
        let member = membership.find_participant(&scope, "alice").await.unwrap();
        assert_eq!(member, Some("member-alice".to_string()));
    }

    #[tokio::test]
    async fn test_static_membership_unknown_name_is_none() {
        let membership = StaticMembership::from_names(&["alice"]);
        let scope = ChannelScope::new("draft-channel");
        let member = membership.find_participant(&scope, "mallory").await.unwrap();
        assert!(member.is_none());
    }

    #[tokio::test]
    async fn test_insert_overrides_member_id() {
        let mut membership = StaticMembership::new();
        membership.insert("carol", "u-1234");
        let scope = ChannelScope::new("any");
        let member = membership.find_participant(&scope, "carol").await.unwrap();
        assert_eq!(member, Some("u-1234".to_string()));
    }
}
