//! Run configuration.

use serde::Serialize;

use crate::MigrateError;

/// Settings shared by every migrator in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationConfig {
    /// Tenant the target documents belong to.
    pub tenant_id: String,
    /// Site the target stories and comments belong to.
    pub site_id: String,
    /// Dump every document built at debug level.
    pub debug: bool,
    /// Rewrite users that already exist in the target store.
    pub update_users: bool,
    /// Build documents but never write them.
    pub dry_run: bool,
}

impl MigrationConfig {
    /// Create a validated configuration with all flags off.
    pub fn new(
        tenant_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Result<Self, MigrateError> {
        let config = Self {
            tenant_id: tenant_id.into(),
            site_id: site_id.into(),
            debug: false,
            update_users: false,
            dry_run: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_update_users(mut self, update_users: bool) -> Self {
        self.update_users = update_users;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check that the required identifiers are present.
    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.tenant_id.trim().is_empty() {
            return Err(MigrateError::ConfigInvalid(
                "tenant id must be configured".to_string(),
            ));
        }
        if self.site_id.trim().is_empty() {
            return Err(MigrateError::ConfigInvalid(
                "site id must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = MigrationConfig::new("tenant", "site").unwrap().with_dry_run(true);
        assert!(config.dry_run);
        assert!(!config.update_users);
        assert!(!config.debug);
    }

    #[test]
    fn test_empty_tenant_rejected() {
        let err = MigrationConfig::new("", "site").unwrap_err();
        assert!(matches!(err, MigrateError::ConfigInvalid(msg) if msg.contains("tenant")));
    }

    #[test]
    fn test_blank_site_rejected() {
        let err = MigrationConfig::new("tenant", "   ").unwrap_err();
        assert!(matches!(err, MigrateError::ConfigInvalid(msg) if msg.contains("site")));
    }

    #[test]
    fn test_validate_catches_mutation() {
        let mut config = MigrationConfig::new("tenant", "site").unwrap();
        config.tenant_id.clear();
        assert!(config.validate().is_err());
    }
}
