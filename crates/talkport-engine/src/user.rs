//! User migration.

use tracing::{debug, info};
use uuid::Uuid;

use talkport_store::{
    NotificationSettings, Profile, SourceUser, TargetUser, UserStatus, UsernameHistoryEntry,
};

use crate::migrator::require_user;
use crate::{EntityKind, MigrateError, Migrator, Outcome};

impl Migrator {
    /// Migrate one source user.
    ///
    /// Without `update` this is a no-op once the target user exists.
    #[tracing::instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub async fn migrate_user(
        &self,
        source_user_id: &str,
        update: bool,
    ) -> Result<Outcome, MigrateError> {
        let user = require_user(self.source.as_ref(), source_user_id).await?;

        let mapping = self.mapper.map_user(source_user_id).await?;
        let target_id = mapping
            .target_id
            .ok_or_else(|| MigrateError::unmappable(EntityKind::User, source_user_id))?;

        if !update && self.target.user(&target_id).await?.is_some() {
            debug!(target_id = %target_id, "user already migrated");
            return Ok(Outcome::Skipped);
        }

        let document = build_user(&self.config.tenant_id, &user, &target_id, mapping.display_name);
        self.dump(EntityKind::User, source_user_id, &document);

        if self.config.dry_run {
            return Ok(Outcome::Previewed);
        }

        self.target.upsert_user(&document).await?;
        info!(target_id = %target_id, role = ?document.role, "migrated user");
        Ok(Outcome::Written)
    }
}

/// Build the v6 user for a v4 user.
///
/// Everyone gets an `sso` profile. Elevated users also keep a `local`
/// profile, a verified email, and a first username history entry.
fn build_user(
    tenant_id: &str,
    user: &SourceUser,
    target_id: &str,
    username: Option<String>,
) -> TargetUser {
    let mut profiles = vec![Profile::Sso {
        id: target_id.to_string(),
        last_issued_at: user.created_at,
    }];
    let mut status = UserStatus::default();
    let mut email_verified = None;

    if user.role.is_elevated() {
        profiles.push(Profile::Local {
            id: user.id.clone(),
        });
        email_verified = Some(true);
        status.username.history.push(UsernameHistoryEntry {
            id: Uuid::new_v4().to_string(),
            username: username.clone(),
            created_by: target_id.to_string(),
            created_at: user.first_username_at().unwrap_or(user.created_at),
        });
    }

    TargetUser {
        id: target_id.to_string(),
        tenant_id: tenant_id.to_string(),
        email: user.id.clone(),
        username,
        role: user.role,
        email_verified,
        status,
        notifications: NotificationSettings::default(),
        profiles,
        created_at: user.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, at, user};
    use talkport_store::{DigestFrequency, SourceUsernameChange, UserRole};

    #[test]
    fn test_commenter_gets_single_sso_profile() {
        let source = user("alice@example.com", UserRole::Commenter);
        let doc = build_user("tenant", &source, "alice@example.com", Some("Alice".to_string()));

        assert_eq!(
            doc.profiles,
            vec![Profile::Sso {
                id: "alice@example.com".to_string(),
                last_issued_at: source.created_at,
            }]
        );
        assert_eq!(doc.email_verified, None);
        assert!(doc.status.username.history.is_empty());
        assert_eq!(doc.notifications.digest_frequency, DigestFrequency::None);
        assert!(!doc.notifications.on_reply);
        assert!(!doc.status.ban.active);
    }

    #[test]
    fn test_moderator_gets_local_profile_and_history() {
        let mut source = user("mod@example.com", UserRole::Moderator);
        source.status.username.history.push(SourceUsernameChange {
            username: Some("mod".to_string()),
            created_at: at(30),
        });

        let doc = build_user("tenant", &source, "7", Some("Mod".to_string()));

        assert_eq!(doc.profiles.len(), 2);
        assert_eq!(
            doc.profiles[1],
            Profile::Local {
                id: "mod@example.com".to_string()
            }
        );
        assert_eq!(doc.email_verified, Some(true));
        let entry = &doc.status.username.history[0];
        assert_eq!(entry.username.as_deref(), Some("Mod"));
        assert_eq!(entry.created_by, "7");
        assert_eq!(entry.created_at, at(30));
    }

    #[test]
    fn test_moderator_without_history_uses_creation_time() {
        let source = user("mod@example.com", UserRole::Moderator);
        let doc = build_user("tenant", &source, "7", None);
        assert_eq!(doc.status.username.history[0].created_at, source.created_at);
    }

    #[test]
    fn test_admin_is_not_treated_as_moderator() {
        let source = user("root@example.com", UserRole::Admin);
        let doc = build_user("tenant", &source, "root@example.com", None);

        assert_eq!(doc.role, UserRole::Admin);
        assert_eq!(doc.profiles.len(), 1);
        assert_eq!(doc.email_verified, None);
        assert!(doc.status.username.history.is_empty());
    }

    #[tokio::test]
    async fn test_migrate_user_is_idempotent_without_update() {
        let fx = Fixture::new();
        fx.add_user("alice@example.com", UserRole::Commenter);
        let migrator = fx.migrator();

        let first = migrator.migrate_user("alice@example.com", false).await.unwrap();
        let second = migrator.migrate_user("alice@example.com", false).await.unwrap();

        assert_eq!(first, Outcome::Written);
        assert_eq!(second, Outcome::Skipped);
        assert_eq!(fx.target.snapshot().users.len(), 1);
    }

    #[tokio::test]
    async fn test_migrate_user_update_rewrites() {
        let fx = Fixture::new();
        fx.add_user("alice@example.com", UserRole::Commenter);
        let migrator = fx.migrator();

        migrator.migrate_user("alice@example.com", false).await.unwrap();
        let again = migrator.migrate_user("alice@example.com", true).await.unwrap();

        assert_eq!(again, Outcome::Written);
        assert_eq!(fx.target.snapshot().users.len(), 1);
    }

    #[tokio::test]
    async fn test_migrate_user_missing_source() {
        let fx = Fixture::new();
        let err = fx
            .migrator()
            .migrate_user("ghost@example.com", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::SourceNotFound { kind: EntityKind::User, .. }
        ));
    }

    #[tokio::test]
    async fn test_migrate_user_unmappable() {
        let fx = Fixture::new();
        fx.add_user("ghost-writer@example.com", UserRole::Commenter);
        fx.unmap_user("ghost-writer@example.com");

        let err = fx
            .migrator()
            .migrate_user("ghost-writer@example.com", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::UnmappableIdentity { kind: EntityKind::User, .. }
        ));
        assert!(fx.target.snapshot().users.is_empty());
    }

    #[tokio::test]
    async fn test_migrate_user_dry_run_writes_nothing() {
        let fx = Fixture::new();
        fx.add_user("mod@example.com", UserRole::Moderator);

        let outcome = fx
            .dry_run_migrator()
            .migrate_user("mod@example.com", false)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Previewed);
        assert!(fx.target.snapshot().users.is_empty());
    }
}
