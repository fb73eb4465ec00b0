use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Datelike;
use tracing::{debug, info};

use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::services::holiday_api::{Holiday, HolidaySource};

pub const DEFAULT_BASE_URL: &str = "https://date.nager.at";

/// Client for the public Nager.Date holiday API.
pub struct NagerDateClient<C = BasicClient> {
    base_url: String,
    http: C,
}

impl NagerDateClient<BasicClient> {
    /// Uses `HOLIDAY_API_BASE_URL` when set, otherwise [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("HOLIDAY_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_client(base_url, BasicClient::new()?))
    }
}

impl<C: HttpClient> NagerDateClient<C> {
    pub fn with_client(base_url: impl Into<String>, http: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn holidays_url(&self, year: i32, country: &str) -> String {
        format!("{}/api/v3/PublicHolidays/{}/{}", self.base_url, year, country)
    }
}

/// Decodes the `PublicHolidays` JSON array.
pub fn parse_holidays(bytes: &[u8]) -> Result<Vec<Holiday>> {
    Ok(serde_json::from_slice(bytes)?)
}

#[async_trait]
impl<C: HttpClient> HolidaySource for NagerDateClient<C> {
    async fn list_holidays(&self, year: i32, country: &str) -> Result<Vec<Holiday>> {
        let url = self.holidays_url(year, country);
        debug!(%url, "Requesting public holidays");

        let bytes = fetch_bytes(&self.http, &url)
            .await
            .with_context(|| format!("holiday request failed for {country} {year}"))?;
        let holidays: Vec<Holiday> = parse_holidays(&bytes)
            .with_context(|| format!("failed to parse holiday response for {country} {year}"))?
            .into_iter()
            .filter(|h| h.date.year() == year)
            .collect();

        info!(year, country, count = holidays.len(), "Holidays fetched");
        Ok(holidays)
    }
}
