//! Key statistic service
//!
//! A release carries an ordered list of key statistics, either free text
//! or backed by a data-block version. Updates are variant-checked: the
//! wrong-variant path reports not-found rather than a type error.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::model::{KeyStatKind, KeyStatistic};
use crate::error::{Result, StatDeskError, ValidationCode};

use super::data_blocks::DataBlockService;
use super::ordering::{dense_orders, validate_reorder};

pub struct KeyStatService {
    db: Arc<Database>,
    data_blocks: Arc<DataBlockService>,
}

pub struct TextKeyStatInput {
    pub title: String,
    pub statistic: String,
    pub trend: Option<String>,
    pub guidance_title: Option<String>,
    pub guidance_text: Option<String>,
}

pub struct DataBlockKeyStatInput {
    pub data_block_version_id: Uuid,
    pub trend: Option<String>,
    pub guidance_title: Option<String>,
    pub guidance_text: Option<String>,
}

/// Fields updatable on a data-block key statistic; the version reference
/// itself is fixed at creation.
pub struct KeyStatGuidanceUpdate {
    pub trend: Option<String>,
    pub guidance_title: Option<String>,
    pub guidance_text: Option<String>,
}

impl KeyStatService {
    pub fn new(db: Arc<Database>, data_blocks: Arc<DataBlockService>) -> Self {
        Self { db, data_blocks }
    }

    pub async fn list(&self, release_id: Uuid) -> Result<Vec<KeyStatistic>> {
        self.require_release(release_id)?;
        self.db.list_key_statistics(release_id)
    }

    /// Append a free-text key statistic at the end of the current order.
    pub async fn create_text(
        &self,
        release_id: Uuid,
        input: TextKeyStatInput,
    ) -> Result<KeyStatistic> {
        self.require_release(release_id)?;
        let stat = KeyStatistic {
            id: Uuid::new_v4(),
            release_id,
            ord: self.db.list_key_statistics(release_id)?.len() as i64,
            trend: input.trend,
            guidance_title: input.guidance_title,
            guidance_text: input.guidance_text,
            kind: KeyStatKind::Text {
                title: input.title,
                statistic: input.statistic,
            },
        };
        self.db.insert_key_statistic(&stat)?;
        info!("Created text key statistic {} on release {}", stat.id, release_id);
        Ok(stat)
    }

    /// Append a data-block key statistic. The referenced version must not
    /// already be attached anywhere in the release's content.
    pub async fn create_data_block(
        &self,
        release_id: Uuid,
        input: DataBlockKeyStatInput,
    ) -> Result<KeyStatistic> {
        self.require_release(release_id)?;
        if !self
            .data_blocks
            .is_unattached(release_id, input.data_block_version_id)
            .await?
        {
            return Err(StatDeskError::validation(
                ValidationCode::DataBlockShouldBeUnattached,
            ));
        }
        let stat = KeyStatistic {
            id: Uuid::new_v4(),
            release_id,
            ord: self.db.list_key_statistics(release_id)?.len() as i64,
            trend: input.trend,
            guidance_title: input.guidance_title,
            guidance_text: input.guidance_text,
            kind: KeyStatKind::DataBlock {
                data_block_version_id: input.data_block_version_id,
            },
        };
        self.db.insert_key_statistic(&stat)?;
        info!(
            "Created data-block key statistic {} on release {}",
            stat.id, release_id
        );
        Ok(stat)
    }

    /// Update a text key statistic. Aiming this at a data-block statistic
    /// is a not-found.
    pub async fn update_text(
        &self,
        release_id: Uuid,
        stat_id: Uuid,
        input: TextKeyStatInput,
    ) -> Result<KeyStatistic> {
        let mut stat = self.require_stat(release_id, stat_id)?;
        match stat.kind {
            KeyStatKind::Text { .. } => {}
            KeyStatKind::DataBlock { .. } => return Err(StatDeskError::NotFound),
        }
        stat.trend = input.trend;
        stat.guidance_title = input.guidance_title;
        stat.guidance_text = input.guidance_text;
        stat.kind = KeyStatKind::Text {
            title: input.title,
            statistic: input.statistic,
        };
        self.db.update_key_statistic(&stat)?;
        Ok(stat)
    }

    /// Update trend/guidance of a data-block key statistic. Aiming this at
    /// a text statistic is a not-found.
    pub async fn update_data_block(
        &self,
        release_id: Uuid,
        stat_id: Uuid,
        update: KeyStatGuidanceUpdate,
    ) -> Result<KeyStatistic> {
        let mut stat = self.require_stat(release_id, stat_id)?;
        match stat.kind {
            KeyStatKind::DataBlock { .. } => {}
            KeyStatKind::Text { .. } => return Err(StatDeskError::NotFound),
        }
        stat.trend = update.trend;
        stat.guidance_title = update.guidance_title;
        stat.guidance_text = update.guidance_text;
        self.db.update_key_statistic(&stat)?;
        Ok(stat)
    }

    pub async fn reorder(&self, release_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<KeyStatistic>> {
        self.require_release(release_id)?;
        let actual: Vec<Uuid> = self
            .db
            .list_key_statistics(release_id)?
            .iter()
            .map(|s| s.id)
            .collect();
        validate_reorder(&ids, &actual, ValidationCode::KeyStatisticIdsDifferFromActual)?;
        self.db.set_key_statistic_orders(&dense_orders(&ids))?;
        self.db.list_key_statistics(release_id)
    }

    /// Remove one key statistic and close the ordering gap.
    pub async fn delete(&self, release_id: Uuid, stat_id: Uuid) -> Result<()> {
        self.require_stat(release_id, stat_id)?;
        self.db.delete_key_statistic(release_id, stat_id)?;
        info!("Deleted key statistic {} from release {}", stat_id, release_id);
        Ok(())
    }

    fn require_release(&self, release_id: Uuid) -> Result<()> {
        self.db
            .get_release(release_id)?
            .map(|_| ())
            .ok_or(StatDeskError::NotFound)
    }

    fn require_stat(&self, release_id: Uuid, stat_id: Uuid) -> Result<KeyStatistic> {
        self.db
            .get_key_statistic(release_id, stat_id)?
            .ok_or(StatDeskError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::content::ContentService;
    use crate::core::services::data_blocks::DataBlockInput;
    use crate::core::test_support::{content_db, seed_publication, seed_release};

    struct Fixture {
        service: KeyStatService,
        content: ContentService,
        data_blocks: Arc<DataBlockService>,
        release_id: Uuid,
        page_id: Uuid,
    }

    fn fixture() -> Fixture {
        let db = content_db();
        let publication = seed_publication(&db);
        let release = seed_release(&db, &publication);
        let page_id = db.get_release_page(release.id).unwrap().unwrap().id;
        let data_blocks = Arc::new(DataBlockService::new(db.clone()));
        Fixture {
            service: KeyStatService::new(db.clone(), data_blocks.clone()),
            content: ContentService::new(db),
            data_blocks,
            release_id: release.id,
            page_id,
        }
    }

    fn text_input(title: &str) -> TextKeyStatInput {
        TextKeyStatInput {
            title: title.to_string(),
            statistic: "42%".to_string(),
            trend: None,
            guidance_title: None,
            guidance_text: None,
        }
    }

    async fn seed_data_block(fixture: &Fixture) -> Uuid {
        fixture
            .data_blocks
            .create(
                fixture.release_id,
                DataBlockInput {
                    name: "Absence by term".to_string(),
                    heading: None,
                    source: None,
                    query: "{}".to_string(),
                    table_config: "{}".to_string(),
                    chart_config: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_text_appends_at_end() {
        let fixture = fixture();
        let first = fixture
            .service
            .create_text(fixture.release_id, text_input("First"))
            .await
            .unwrap();
        let second = fixture
            .service
            .create_text(fixture.release_id, text_input("Second"))
            .await
            .unwrap();

        assert_eq!(first.ord, 0);
        assert_eq!(second.ord, 1);
    }

    #[tokio::test]
    async fn test_create_data_block_requires_unattached_version() {
        let fixture = fixture();
        let version_id = seed_data_block(&fixture).await;

        // Attach the version to content first.
        let section = fixture
            .content
            .add_section(fixture.page_id, None, "Data")
            .await
            .unwrap();
        fixture
            .content
            .attach_data_block(fixture.page_id, section.id, None, version_id)
            .await
            .unwrap();

        let err = fixture
            .service
            .create_data_block(
                fixture.release_id,
                DataBlockKeyStatInput {
                    data_block_version_id: version_id,
                    trend: None,
                    guidance_title: None,
                    guidance_text: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::DataBlockShouldBeUnattached]
        );
    }

    #[tokio::test]
    async fn test_create_data_block_succeeds_then_blocks_reuse() {
        let fixture = fixture();
        let version_id = seed_data_block(&fixture).await;

        let stat = fixture
            .service
            .create_data_block(
                fixture.release_id,
                DataBlockKeyStatInput {
                    data_block_version_id: version_id,
                    trend: Some("down".to_string()),
                    guidance_title: None,
                    guidance_text: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            stat.kind,
            KeyStatKind::DataBlock {
                data_block_version_id: version_id
            }
        );

        // The version is attached now; a second key statistic may not take it.
        let err = fixture
            .service
            .create_data_block(
                fixture.release_id,
                DataBlockKeyStatInput {
                    data_block_version_id: version_id,
                    trend: None,
                    guidance_title: None,
                    guidance_text: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::DataBlockShouldBeUnattached]
        );
    }

    #[tokio::test]
    async fn test_update_is_variant_checked() {
        let fixture = fixture();
        let version_id = seed_data_block(&fixture).await;
        let text = fixture
            .service
            .create_text(fixture.release_id, text_input("Text"))
            .await
            .unwrap();
        let data = fixture
            .service
            .create_data_block(
                fixture.release_id,
                DataBlockKeyStatInput {
                    data_block_version_id: version_id,
                    trend: None,
                    guidance_title: None,
                    guidance_text: None,
                },
            )
            .await
            .unwrap();

        let err = fixture
            .service
            .update_text(fixture.release_id, data.id, text_input("Nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = fixture
            .service
            .update_data_block(
                fixture.release_id,
                text.id,
                KeyStatGuidanceUpdate {
                    trend: None,
                    guidance_title: None,
                    guidance_text: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let updated = fixture
            .service
            .update_text(fixture.release_id, text.id, text_input("Renamed"))
            .await
            .unwrap();
        match updated.kind {
            KeyStatKind::Text { title, .. } => assert_eq!(title, "Renamed"),
            other => panic!("expected text variant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reorder_rejects_mismatch_and_applies_permutation() {
        let fixture = fixture();
        let first = fixture
            .service
            .create_text(fixture.release_id, text_input("First"))
            .await
            .unwrap();
        let second = fixture
            .service
            .create_text(fixture.release_id, text_input("Second"))
            .await
            .unwrap();

        let err = fixture
            .service
            .reorder(fixture.release_id, vec![first.id, Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::KeyStatisticIdsDifferFromActual]
        );

        let stats = fixture
            .service
            .reorder(fixture.release_id, vec![second.id, first.id])
            .await
            .unwrap();
        assert_eq!(stats.iter().map(|s| s.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert_eq!(stats.iter().map(|s| s.ord).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_delete_closes_ordering_gap() {
        let fixture = fixture();
        let first = fixture
            .service
            .create_text(fixture.release_id, text_input("First"))
            .await
            .unwrap();
        let second = fixture
            .service
            .create_text(fixture.release_id, text_input("Second"))
            .await
            .unwrap();
        let third = fixture
            .service
            .create_text(fixture.release_id, text_input("Third"))
            .await
            .unwrap();

        fixture.service.delete(fixture.release_id, second.id).await.unwrap();

        let stats = fixture.service.list(fixture.release_id).await.unwrap();
        assert_eq!(stats.iter().map(|s| s.id).collect::<Vec<_>>(), vec![first.id, third.id]);
        assert_eq!(stats.iter().map(|s| s.ord).collect::<Vec<_>>(), vec![0, 1]);
    }
}
