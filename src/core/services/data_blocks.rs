//! Data visualization lookups and creation
//!
//! A data block is a parent lineage plus one version per release. This
//! service is the collaborator other services use to ask which versions
//! are still unattached to any content.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::model::{DataBlockParent, DataBlockVersion, FeaturedTable};
use crate::error::{Result, StatDeskError};

pub struct DataBlockService {
    db: Arc<Database>,
}

/// Fields of a new data block version.
pub struct DataBlockInput {
    pub name: String,
    pub heading: Option<String>,
    pub source: Option<String>,
    pub query: String,
    pub table_config: String,
    pub chart_config: Option<String>,
}

impl DataBlockService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new lineage with its first version on the given release.
    pub async fn create(&self, release_id: Uuid, input: DataBlockInput) -> Result<DataBlockVersion> {
        let release = self
            .db
            .get_release(release_id)?
            .ok_or(StatDeskError::NotFound)?;

        let parent = DataBlockParent {
            id: Uuid::new_v4(),
            publication_id: release.publication_id,
            name: input.name.clone(),
        };
        self.db.insert_data_block_parent(&parent)?;

        let version = DataBlockVersion {
            id: Uuid::new_v4(),
            parent_id: parent.id,
            release_id,
            name: input.name,
            heading: input.heading,
            source: input.source,
            query: input.query,
            table_config: input.table_config,
            chart_config: input.chart_config,
            version: 1,
        };
        self.db.insert_data_block_version(&version)?;
        info!("Created data block {} ({})", version.name, version.id);
        Ok(version)
    }

    pub async fn list(&self, release_id: Uuid) -> Result<Vec<DataBlockVersion>> {
        self.db.list_data_block_versions(release_id)
    }

    /// Versions of a release referenced by no content block, key statistic
    /// or featured table.
    pub async fn list_unattached(&self, release_id: Uuid) -> Result<Vec<DataBlockVersion>> {
        let mut unattached = Vec::new();
        for version in self.db.list_data_block_versions(release_id)? {
            if self.db.count_version_references(release_id, version.id)? == 0 {
                unattached.push(version);
            }
        }
        Ok(unattached)
    }

    pub async fn is_unattached(&self, release_id: Uuid, version_id: Uuid) -> Result<bool> {
        if self.db.get_data_block_version(version_id)?.is_none() {
            return Err(StatDeskError::NotFound);
        }
        Ok(self.db.count_version_references(release_id, version_id)? == 0)
    }

    /// Highlight a data-block version on the publication's table tool.
    pub async fn create_featured_table(
        &self,
        release_id: Uuid,
        name: &str,
        description: Option<String>,
        data_block_version_id: Uuid,
    ) -> Result<FeaturedTable> {
        if self.db.get_release(release_id)?.is_none()
            || self.db.get_data_block_version(data_block_version_id)?.is_none()
        {
            return Err(StatDeskError::NotFound);
        }
        let table = FeaturedTable {
            id: Uuid::new_v4(),
            release_id,
            ord: self.db.list_featured_tables(release_id)?.len() as i64,
            name: name.to_string(),
            description,
            data_block_version_id,
        };
        self.db.insert_featured_table(&table)?;
        info!("Created featured table {} ({})", table.name, table.id);
        Ok(table)
    }
}
