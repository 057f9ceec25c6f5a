//! SSRF-guarded fetcher wrapper.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::security::UrlValidator;
use crate::traits::fetcher::{PageFetcher, PageText};

/// A fetcher that validates every URL (including its DNS answers) before
/// the inner fetcher sees it.
pub struct ValidatedFetcher<F: PageFetcher> {
    inner: F,
    validator: UrlValidator,
}

impl<F: PageFetcher> ValidatedFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_validator(fetcher, UrlValidator::new())
    }

    pub fn with_validator(fetcher: F, validator: UrlValidator) -> Self {
        Self {
            inner: fetcher,
            validator,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ValidatedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<PageText> {
        if let Err(e) = self.validator.validate_with_dns(url).await {
            tracing::warn!(url = %url, error = %e, "Blocked page fetch");
            return Err(e.into());
        }
        self.inner.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::testing::MockPageFetcher;

    #[tokio::test]
    async fn test_blocked_url_never_reaches_inner() {
        let inner = MockPageFetcher::new().with_page("http://169.254.169.254/latest", "secrets");
        let fetcher = ValidatedFetcher::new(inner);

        let err = fetcher.fetch("http://169.254.169.254/latest").await.unwrap_err();
        assert!(matches!(err, FetchError::Security(_)));
        assert!(fetcher.inner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_literal_public_ip_passes_through() {
        let inner = MockPageFetcher::new().with_page("http://93.184.216.34/", "page");
        let fetcher = ValidatedFetcher::new(inner);

        assert_eq!(fetcher.fetch("http://93.184.216.34/").await.unwrap().text, "page");
    }
}
