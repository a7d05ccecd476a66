use std::sync::Arc;

use async_trait::async_trait;
use rearch::CapsuleHandle;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::codec::{ShortCodeCodec, short_code_codec_capsule};
use crate::url_repo::{UrlRepository, url_repository_capsule};

#[derive(Deserialize)]
pub struct CreateUrlPayload {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenedUrl {
    pub token: String,
}

pub fn url_shorten_service_capsule(
    CapsuleHandle { mut get, .. }: CapsuleHandle,
) -> Arc<dyn UrlShortenService> {
    let url_repo = Arc::clone(get.as_ref(url_repository_capsule));
    let codec = Arc::clone(get.as_ref(short_code_codec_capsule));
    Arc::new(UrlShortenServiceImpl { url_repo, codec })
}

#[async_trait]
pub trait UrlShortenService: Send + Sync {
    /// Returns the public token for `url`, creating the mapping on first use.
    async fn create_short_url(&self, url: &str) -> Result<String, CreateShortUrlError>;

    /// Looks a token back up to the original URL it was created for.
    async fn resolve_url(&self, token: &str) -> Result<String, ResolveUrlError>;
}

/// All validation rule failures for the `url` field, in rule order.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {field}: {}", .failures.join(" "))]
pub struct UrlValidationError {
    pub field: &'static str,
    pub failures: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CreateShortUrlError {
    #[error(transparent)]
    Validation(#[from] UrlValidationError),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum ResolveUrlError {
    #[error("no URL found for token")]
    NotFound,
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Derives the stored short code from the URL's first 4 UTF-8 bytes,
/// read little-endian. Truncating and collision-prone on purpose: any two
/// URLs sharing a 4-byte prefix map to the same code, and nothing detects
/// that. The sub-4-byte sentinel of 0 is unreachable once validation has
/// required an authority.
#[must_use]
pub fn derive_short_code(url: &str) -> i32 {
    match url.as_bytes().first_chunk::<4>() {
        Some(prefix) => i32::from_le_bytes(*prefix),
        None => 0,
    }
}

fn validate_url(url: &str) -> Result<(), UrlValidationError> {
    let rules: [(fn(&str) -> bool, &str); 2] = [
        (is_present, "Url is required."),
        (is_well_formed, "Url is not valid."),
    ];

    let failures: Vec<String> = rules
        .into_iter()
        .filter(|(passes, _)| !passes(url))
        .map(|(_, message)| message.to_owned())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(UrlValidationError {
            field: "url",
            failures,
        })
    }
}

fn is_present(url: &str) -> bool {
    !url.is_empty()
}

// Guarded on presence so an empty value reports only the missing-field rule.
fn is_well_formed(url: &str) -> bool {
    url.is_empty() || Url::parse(url).is_ok_and(|parsed| parsed.has_authority())
}

struct UrlShortenServiceImpl {
    url_repo: Arc<dyn UrlRepository>,
    codec: Arc<dyn ShortCodeCodec>,
}

#[async_trait]
impl UrlShortenService for UrlShortenServiceImpl {
    #[instrument(skip(self))]
    async fn create_short_url(&self, url: &str) -> Result<String, CreateShortUrlError> {
        validate_url(url)?;

        if let Some(existing) = self.url_repo.find_by_original_url(url).await? {
            return Ok(self.codec.encode(existing.short_code));
        }

        // NOTE: not atomic with the lookup above. Two concurrent first
        // requests for the same URL can both land here and both insert;
        // the duplicate rows still yield identical tokens.
        let short_code = derive_short_code(url);
        let inserted = self.url_repo.insert_url(url.to_owned(), short_code).await?;
        Ok(self.codec.encode(inserted.short_code))
    }

    #[instrument(skip(self))]
    async fn resolve_url(&self, token: &str) -> Result<String, ResolveUrlError> {
        let Some(short_code) = self.codec.decode(token) else {
            return Err(ResolveUrlError::NotFound);
        };
        match self.url_repo.find_by_short_code(short_code).await? {
            Some(record) => Ok(record.original_url),
            None => Err(ResolveUrlError::NotFound),
        }
    }
}
