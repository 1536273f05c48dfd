/// Instrument dump lifecycle: staleness check and refresh
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use reqwest::Method;
use tracing::info;

use crate::broker::endpoints;
use crate::broker::transport::{Payload, Transport};
use crate::error::{KiteError, Result};
use crate::instruments::catalog::InstrumentCatalog;

/// Today's refresh cutoff: 08:30 IST on the current calendar day.
///
/// Always today's date, even when the current time is still before 08:30;
/// the cutoff then lies ahead of now but behind yesterday's dump.
pub fn refresh_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let now_ist = now.with_timezone(&Kolkata);
    Kolkata
        .with_ymd_and_hms(now_ist.year(), now_ist.month(), now_ist.day(), 8, 30, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Once-per-day refresh policy anchored to the pre-market cutoff.
pub fn should_refresh(last_modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_modified {
        None => true,
        Some(modified) => modified < refresh_cutoff(now),
    }
}

/// Durable home of the instrument dump file.
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        DatasetStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last-modified timestamp of the dump, `None` when absent.
    pub async fn last_modified(&self) -> Option<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        let modified = metadata.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    pub async fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        should_refresh(self.last_modified().await, now)
    }

    /// Fetch the dump and replace the file.
    pub async fn download<T: Transport>(&self, transport: &T) -> Result<()> {
        let url = endpoints::resolve(endpoints::INSTRUMENTS, &[]);
        let raw = transport.request_raw(Method::GET, &url, Payload::None).await?;
        if raw.status != 200 {
            return Err(KiteError::BrokerApiError {
                status: raw.status,
                message: "instrument dump fetch failed".to_string(),
            });
        }
        tokio::fs::write(&self.path, &raw.body).await?;
        info!(bytes = raw.body.len(), path = %self.path.display(), "Instrument dump downloaded");
        Ok(())
    }

    /// Download only when the staleness rule says the dump is old.
    pub async fn ensure_fresh<T: Transport>(
        &self,
        transport: &T,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.needs_refresh(now).await {
            self.download(transport).await?;
        }
        Ok(())
    }

    /// Parse the on-disk dump into a fresh catalog snapshot.
    pub async fn load_catalog(&self) -> Result<InstrumentCatalog> {
        InstrumentCatalog::load(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::transport::RawResponse;
    use async_trait::async_trait;

    fn ist(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Kolkata
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_missing_dump_needs_refresh() {
        assert!(should_refresh(None, ist(2024, 6, 10, 10, 0)));
    }

    #[test]
    fn test_yesterdays_dump_is_stale_before_market() {
        // file from yesterday 23:00, checked today 07:00: cutoff is today
        // 08:30, which the file predates
        let last_modified = ist(2024, 6, 9, 23, 0);
        let now = ist(2024, 6, 10, 7, 0);
        assert!(should_refresh(Some(last_modified), now));
    }

    #[test]
    fn test_todays_post_cutoff_dump_is_fresh() {
        let last_modified = ist(2024, 6, 10, 9, 0);
        let now = ist(2024, 6, 10, 10, 0);
        assert!(!should_refresh(Some(last_modified), now));
    }

    #[test]
    fn test_todays_pre_cutoff_dump_is_stale() {
        let last_modified = ist(2024, 6, 10, 8, 0);
        let now = ist(2024, 6, 10, 8, 10);
        assert!(should_refresh(Some(last_modified), now));
    }

    struct DumpTransport;

    #[async_trait]
    impl Transport for DumpTransport {
        async fn request_raw(
            &self,
            _method: Method,
            url: &str,
            _payload: Payload,
        ) -> Result<RawResponse> {
            assert_eq!(url, "https://api.kite.trade/instruments");
            Ok(RawResponse {
                status: 200,
                set_cookies: vec![],
                body: "tradingsymbol,name,strike\nACME24JUN100CE,ACME,100\n".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_download_then_load_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("instruments.csv"));

        assert!(store.last_modified().await.is_none());
        store.download(&DumpTransport).await.unwrap();
        assert!(store.last_modified().await.is_some());

        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.instruments()[0].strike, Some(100.0));
    }

    #[tokio::test]
    async fn test_ensure_fresh_skips_recent_dump() {
        struct PanicTransport;

        #[async_trait]
        impl Transport for PanicTransport {
            async fn request_raw(
                &self,
                _method: Method,
                _url: &str,
                _payload: Payload,
            ) -> Result<RawResponse> {
                panic!("fresh dump must not be re-downloaded");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("instruments.csv"));
        store.download(&DumpTransport).await.unwrap();

        // the file was just written, so any same-day post-cutoff check skips
        let now = Utc::now() + chrono::Duration::minutes(1);
        if !should_refresh(store.last_modified().await, now) {
            store.ensure_fresh(&PanicTransport, now).await.unwrap();
        }
    }
}
