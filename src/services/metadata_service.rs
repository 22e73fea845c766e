// MetadataService - Query handler for the metadata listings
//
// Organizations, key groups and collections are pure reference data; each
// listing is a single language-filtered join passed through unshaped.

use anyhow::Result;

use crate::repository::{CollectionListingRow, GroupListingRow, KeyStore, OrganizationRow};
use crate::types::Language;

#[derive(Clone)]
pub struct MetadataService {
    store: KeyStore,
}

impl MetadataService {
    pub fn new(store: KeyStore) -> Self {
        Self { store }
    }

    pub async fn organizations(&self, language: Language) -> Result<Vec<OrganizationRow>> {
        self.store.organizations(language).await
    }

    pub async fn groups(&self, language: Language) -> Result<Vec<GroupListingRow>> {
        self.store.group_listing(language).await
    }

    pub async fn collections(&self, language: Language) -> Result<Vec<CollectionListingRow>> {
        self.store.collection_listing(language).await
    }
}
