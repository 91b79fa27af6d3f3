//! Versioned evolution of the persisted wallet record.
//!
//! The persisted [`MigrationRecord`] tracks the application version that last
//! wrote storage and which scripts have been applied. A pass computes a
//! [`Plan`] and executes it under the wallet write lock. Progress on
//! `completed` is persisted after every step, so an interrupted pass never
//! re-applies a finished script.

pub mod plan;
pub mod scripts;
pub mod version;

pub use plan::{plan, Direction, Plan};
pub use scripts::{MigrationContext, MigrationScript, Registry};
pub use version::{compare_versions, Version};

use kura_store::{keys, load, save};
use kura_types::MigrationRecord;
use serde::Serialize;

use crate::state::WalletState;
use crate::WalletError;

/// One step of a pass, reported for dry runs too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: Version,
    pub info: String,
}

pub struct Migrator {
    state: WalletState,
    registry: Registry,
}

impl Migrator {
    pub fn new(state: WalletState) -> Self {
        Self::with_registry(state, Registry::builtin())
    }

    pub fn with_registry(state: WalletState, registry: Registry) -> Self {
        Self { state, registry }
    }

    fn running(&self) -> Result<Version, WalletError> {
        self.state.app_version().parse()
    }

    async fn record(&self) -> Result<Option<MigrationRecord>, WalletError> {
        Ok(load(self.state.storage(), keys::MIGRATION).await?)
    }

    /// Whether storage was last written by another version. Creates the
    /// record for the running version on first run.
    pub async fn need_upgrade(&self) -> Result<bool, WalletError> {
        let _guard = self.state.write_lock().await;
        match self.record().await? {
            Some(record) => Ok(record.version != self.state.app_version()),
            None => {
                let record = MigrationRecord::new(self.state.app_version());
                save(self.state.storage(), keys::MIGRATION, &record).await?;
                tracing::debug!(version = %record.version, "migration record initialised");
                Ok(false)
            }
        }
    }

    /// Whether the pending pass contains a script that needs the password.
    pub async fn need_password(&self) -> Result<bool, WalletError> {
        let pending = self.migrate(true, None).await?;
        Ok(pending.iter().any(|step| {
            self.registry
                .get(&step.version)
                .is_some_and(|s| s.password_required())
        }))
    }

    /// Persisted version is not newer than the running one.
    pub async fn is_upgrade(&self) -> Result<bool, WalletError> {
        let running = self.running()?;
        match self.record().await? {
            Some(record) => Ok(record.version.parse::<Version>()? <= running),
            None => Ok(true),
        }
    }

    /// Move storage to the running version.
    ///
    /// A dry run reports the steps without executing or persisting anything.
    /// A real run refuses to start when a scheduled script needs a password
    /// that was not given, and finally stamps the running version even when
    /// no step ran.
    pub async fn migrate(
        &self,
        dry_run: bool,
        password: Option<&str>,
    ) -> Result<Vec<AppliedMigration>, WalletError> {
        let _guard = self.state.write_lock().await;
        let running = self.running()?;
        let mut record = self
            .record()
            .await?
            .unwrap_or_else(|| MigrationRecord::new(running.to_string()));
        let persisted: Version = record.version.parse()?;
        let mut completed = record
            .completed
            .iter()
            .map(|v| v.parse())
            .collect::<Result<Vec<Version>, _>>()?;

        let plan = plan(&self.registry.versions(), &persisted, &running, &completed);

        if !dry_run && password.is_none() {
            if let Some(step) = plan.steps.iter().find(|v| {
                self.registry
                    .get(v)
                    .is_some_and(|s| s.password_required())
            }) {
                return Err(WalletError::PasswordRequired {
                    version: step.to_string(),
                });
            }
        }

        let ctx = MigrationContext {
            storage: self.state.storage(),
            password,
        };
        let mut applied = Vec::with_capacity(plan.steps.len());
        for version in &plan.steps {
            let Some(script) = self.registry.get(version) else {
                continue;
            };
            match plan.direction {
                Direction::Down => {
                    if completed.last() != Some(version) {
                        return Err(WalletError::MigrationOrder {
                            version: version.to_string(),
                            tail: completed.last().map(ToString::to_string),
                        });
                    }
                    if !dry_run {
                        script.down(&ctx).await?;
                    }
                    completed.pop();
                }
                Direction::Up => {
                    if !dry_run {
                        script.up(&ctx).await?;
                    }
                    completed.push(version.clone());
                }
            }
            if !dry_run {
                record.completed = completed.iter().map(ToString::to_string).collect();
                save(self.state.storage(), keys::MIGRATION, &record).await?;
            }
            tracing::info!(
                version = %version,
                direction = %plan.direction,
                dry_run,
                "storage migration applied"
            );
            applied.push(AppliedMigration {
                version: version.clone(),
                info: script.info().to_string(),
            });
        }

        if !dry_run {
            record.version = running.to_string();
            record.completed = completed.iter().map(ToString::to_string).collect();
            save(self.state.storage(), keys::MIGRATION, &record).await?;
        }
        Ok(applied)
    }
}
