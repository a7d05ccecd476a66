use std::sync::Arc;

use async_trait::async_trait;
use rearch::CapsuleHandle;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter,
};
use tracing::instrument;

use crate::{config::db_conn_capsule, orm::url};

pub fn url_repository_capsule(
    CapsuleHandle { mut get, .. }: CapsuleHandle,
) -> Arc<dyn UrlRepository> {
    let db = get.as_ref(db_conn_capsule).clone();
    Arc::new(UrlRepositoryImpl { db })
}

#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Point query by the exact (case-sensitive) original URL.
    /// First match wins when duplicate rows exist.
    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<url::Model>, DbErr>;

    async fn find_by_short_code(&self, short_code: i32) -> Result<Option<url::Model>, DbErr>;

    /// Inserts and commits a new mapping row, returning it with its assigned id.
    async fn insert_url(
        &self,
        original_url: String,
        short_code: i32,
    ) -> Result<url::Model, DbErr>;
}

struct UrlRepositoryImpl {
    db: DbConn,
}

#[async_trait]
impl UrlRepository for UrlRepositoryImpl {
    #[instrument(skip(self))]
    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<url::Model>, DbErr> {
        url::Entity::find()
            .filter(url::Column::OriginalUrl.eq(original_url))
            .one(&self.db)
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_short_code(&self, short_code: i32) -> Result<Option<url::Model>, DbErr> {
        url::Entity::find()
            .filter(url::Column::ShortCode.eq(short_code))
            .one(&self.db)
            .await
    }

    #[instrument(skip(self))]
    async fn insert_url(
        &self,
        original_url: String,
        short_code: i32,
    ) -> Result<url::Model, DbErr> {
        let to_insert = url::ActiveModel {
            id: NotSet,
            original_url: Set(original_url),
            short_code: Set(short_code),
        };
        to_insert.insert(&self.db).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn url_row(id: i64, original_url: &str, short_code: i32) -> url::Model {
        url::Model {
            id,
            original_url: original_url.to_owned(),
            short_code,
        }
    }

    #[tokio::test]
    async fn find_by_original_url_returns_first_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                url_row(1, "https://example.com", 0x7074_7468),
                url_row(2, "https://example.com", 0x7074_7468),
            ]])
            .into_connection();

        let repo = UrlRepositoryImpl { db };
        let found = repo
            .find_by_original_url("https://example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 1);
    }

    #[tokio::test]
    async fn find_by_original_url_returns_none_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<url::Model>::new()])
            .into_connection();

        let repo = UrlRepositoryImpl { db };
        let found = repo.find_by_original_url("https://unseen.test").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_by_short_code_returns_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![url_row(7, "https://example.com/a", 0x7074_7468)]])
            .into_connection();

        let repo = UrlRepositoryImpl { db };
        let found = repo.find_by_short_code(0x7074_7468).await.unwrap().unwrap();
        assert_eq!(found.original_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn insert_url_returns_inserted_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![url_row(42, "https://example.com", 0x7074_7468)]])
            .into_connection();

        let repo = UrlRepositoryImpl { db };
        let inserted = repo
            .insert_url("https://example.com".to_owned(), 0x7074_7468)
            .await
            .unwrap();
        assert_eq!(inserted.id, 42);
        assert_eq!(inserted.short_code, 0x7074_7468);
    }
}
