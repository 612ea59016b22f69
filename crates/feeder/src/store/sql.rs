use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use super::{BookkeepingStore, OutcomeRecord, Result, StoreError, StoreSummary};
use crate::entity::prelude::*;
use crate::error::FailureCategory;

/// Bookkeeping store backed by a SeaORM connection.
///
/// Outcomes are keyed by `owner/repo`; inserts use `ON CONFLICT DO NOTHING`
/// and a zero row count is reported as [`StoreError::AlreadyRecorded`].
#[derive(Debug)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn insert_outcome(&self, model: FeederRepoActiveModel, key: &str) -> Result<()> {
        let inserted = FeederRepo::insert(model)
            .on_conflict(
                OnConflict::column(FeederRepoColumn::OwnerRepo)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            return Err(StoreError::AlreadyRecorded {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Failed items, oldest first.
    pub async fn failures(&self) -> Result<Vec<OutcomeRecord>> {
        let models = FeederRepo::find()
            .filter(FeederRepoColumn::Status.eq(OutcomeStatus::Failed))
            .order_by_asc(FeederRepoColumn::RecordedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(OutcomeRecord::from).collect())
    }

    /// Declared organization names, sorted.
    pub async fn organizations(&self) -> Result<Vec<String>> {
        let models = FeederOrg::find()
            .order_by_asc(FeederOrgColumn::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }
}

impl From<FeederRepoModel> for OutcomeRecord {
    fn from(model: FeederRepoModel) -> Self {
        Self {
            item: model.owner_repo,
            status: model.status,
            category: model.failure_category,
            organization: model.organization,
            recorded_at: model.recorded_at.with_timezone(&Utc),
        }
    }
}

#[async_trait]
impl BookkeepingStore for SqlStore {
    async fn declare_organization(&self, name: &str) -> Result<()> {
        let model = FeederOrgActiveModel {
            name: Set(name.to_string()),
            declared_at: Set(Utc::now().fixed_offset()),
        };

        FeederOrg::insert(model)
            .on_conflict(
                OnConflict::column(FeederOrgColumn::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn record_success(&self, item_key: &str, org: Option<&str>) -> Result<()> {
        let model = FeederRepoActiveModel {
            owner_repo: Set(item_key.to_string()),
            status: Set(OutcomeStatus::Succeeded),
            failure_category: Set(None),
            organization: Set(org.map(str::to_string)),
            recorded_at: Set(Utc::now().fixed_offset()),
        };
        self.insert_outcome(model, item_key).await
    }

    async fn record_failure(&self, item_key: &str, category: FailureCategory) -> Result<()> {
        let model = FeederRepoActiveModel {
            owner_repo: Set(item_key.to_string()),
            status: Set(OutcomeStatus::Failed),
            failure_category: Set(Some(category)),
            organization: Set(None),
            recorded_at: Set(Utc::now().fixed_offset()),
        };
        self.insert_outcome(model, item_key).await
    }

    async fn is_recorded(&self, item_key: &str) -> Result<bool> {
        let found = FeederRepo::find_by_id(item_key.to_string())
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let mut summary = StoreSummary {
            succeeded: FeederRepo::find()
                .filter(FeederRepoColumn::Status.eq(OutcomeStatus::Succeeded))
                .count(&self.db)
                .await?,
            organizations: FeederOrg::find().count(&self.db).await?,
            ..Default::default()
        };

        for category in [
            FailureCategory::Clone,
            FailureCategory::Api,
            FailureCategory::Push,
        ] {
            let count = FeederRepo::find()
                .filter(FeederRepoColumn::Status.eq(OutcomeStatus::Failed))
                .filter(FeederRepoColumn::FailureCategory.eq(category))
                .count(&self.db)
                .await?;
            summary.add_failures(category, count);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    #[test]
    fn outcome_insert_ignores_conflicting_key() {
        let model = FeederRepoActiveModel {
            owner_repo: Set("octocat/hello".to_string()),
            status: Set(OutcomeStatus::Succeeded),
            failure_category: Set(None),
            organization: Set(None),
            recorded_at: Set(Utc::now().fixed_offset()),
        };
        let sql = FeederRepo::insert(model)
            .on_conflict(
                OnConflict::column(FeederRepoColumn::OwnerRepo)
                    .do_nothing()
                    .to_owned(),
            )
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("ON CONFLICT (\"owner_repo\") DO NOTHING"), "{sql}");
    }

    #[tokio::test]
    async fn zero_inserted_rows_is_already_recorded() {
        use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 0,
                last_insert_id: 0,
            }])
            .into_connection();
        let store = SqlStore::new(db);

        let err = store
            .record_failure("octocat/hello", FailureCategory::Push)
            .await
            .expect_err("conflicting insert should be rejected");
        assert!(matches!(err, StoreError::AlreadyRecorded { ref key } if key == "octocat/hello"));
    }

    #[cfg(feature = "migrate")]
    mod with_db {
        use super::*;
        use crate::db::connect_and_migrate;

        async fn store() -> SqlStore {
            let db = connect_and_migrate("sqlite::memory:")
                .await
                .expect("in-memory database should migrate");
            SqlStore::new(db)
        }

        #[tokio::test]
        async fn records_outcomes_and_summarizes() {
            let store = store().await;
            store.declare_organization("brave-turing-5").await.unwrap();
            store
                .record_success("octocat/hello", Some("brave-turing-5"))
                .await
                .unwrap();
            store
                .record_failure("octocat/broken", FailureCategory::Clone)
                .await
                .unwrap();
            store
                .record_failure("octocat/stuck", FailureCategory::Push)
                .await
                .unwrap();

            let summary = store.summary().await.unwrap();
            assert_eq!(summary.succeeded, 1);
            assert_eq!(summary.clone_failures, 1);
            assert_eq!(summary.api_failures, 0);
            assert_eq!(summary.push_failures, 1);
            assert_eq!(summary.organizations, 1);

            assert!(store.is_recorded("octocat/hello").await.unwrap());
            assert!(!store.is_recorded("octocat/missing").await.unwrap());

            let failures = store.failures().await.unwrap();
            assert_eq!(failures.len(), 2);
            assert!(failures.iter().all(|r| r.status == OutcomeStatus::Failed));
        }

        #[tokio::test]
        async fn second_outcome_for_same_item_is_rejected() {
            let store = store().await;
            store.record_success("octocat/hello", None).await.unwrap();

            let err = store
                .record_failure("octocat/hello", FailureCategory::Api)
                .await
                .expect_err("duplicate outcome");
            assert!(matches!(err, StoreError::AlreadyRecorded { ref key } if key == "octocat/hello"));

            let summary = store.summary().await.unwrap();
            assert_eq!(summary.succeeded, 1);
            assert_eq!(summary.failed(), 0);
        }

        #[tokio::test]
        async fn declaring_an_organization_twice_is_harmless() {
            let store = store().await;
            store.declare_organization("zen-knuth-9").await.unwrap();
            store.declare_organization("zen-knuth-9").await.unwrap();
            store.declare_organization("epic-hopper-12").await.unwrap();

            assert_eq!(
                store.organizations().await.unwrap(),
                vec!["epic-hopper-12".to_string(), "zen-knuth-9".to_string()]
            );
        }
    }
}
