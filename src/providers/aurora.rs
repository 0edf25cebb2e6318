/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error,
    crypto::hmac_sha256,
    domain::ChallengeName,
    http::{HttpClient, HttpClientBuilder, check_credential},
    providers::{DnsRecordRef, TXT, Zone, ZoneProvider},
};

pub const DEFAULT_API_ENDPOINT: &str = "https://api.auroradns.eu";

const DATE_HEADER: &str = "X-AuroraDNS-Date";
const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Aurora DNS (PCextreme). Every request carries an HMAC-SHA256 signature
/// over the method, the request path and the `X-AuroraDNS-Date` timestamp.
#[derive(Clone)]
pub struct AuroraProvider {
    client: HttpClientBuilder,
    endpoint: String,
    api_key: String,
    secret_key: String,
}

#[derive(Deserialize, Debug)]
pub struct AuroraZone {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct AuroraRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CreateRecordParams<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
}

impl AuroraProvider {
    pub(crate) fn new(
        api_key: impl AsRef<str>,
        secret_key: impl AsRef<str>,
        timeout: Option<Duration>,
    ) -> crate::Result<Self> {
        check_credential("Aurora API key", api_key.as_ref())?;
        check_credential("Aurora secret key", secret_key.as_ref())?;

        Ok(Self {
            client: HttpClientBuilder::default().with_timeout(timeout),
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: api_key.as_ref().to_string(),
            secret_key: secret_key.as_ref().to_string(),
        })
    }

    pub fn with_endpoint(self, endpoint: impl AsRef<str>) -> Self {
        Self {
            endpoint: endpoint.as_ref().trim_end_matches('/').to_string(),
            ..self
        }
    }

    /// `AuroraDNSv1 base64("<api key>:" + base64(hmac(secret, method + path + timestamp)))`
    pub(crate) fn authorization(&self, method: &str, path: &str, timestamp: &str) -> String {
        let signature = STANDARD.encode(hmac_sha256(
            self.secret_key.as_bytes(),
            format!("{method}{path}{timestamp}").as_bytes(),
        ));
        format!(
            "AuroraDNSv1 {}",
            STANDARD.encode(format!("{}:{signature}", self.api_key))
        )
    }

    fn signed(&self, method: Method, path: &str) -> HttpClient {
        let timestamp = Utc::now().format(DATE_FORMAT).to_string();
        let authorization = self.authorization(method.as_str(), path, &timestamp);

        self.client
            .build(method, format!("{}{path}", self.endpoint))
            .with_header(DATE_HEADER, &timestamp)
            .with_header("Authorization", authorization)
    }

    async fn get_record(&self, zone: &Zone, record_id: &str) -> crate::Result<AuroraRecord> {
        self.signed(
            Method::GET,
            &format!("/zones/{}/records/{record_id}", zone.id),
        )
        .send::<AuroraRecord>()
        .await
    }
}

impl ZoneProvider for AuroraProvider {
    fn name(&self) -> &'static str {
        "aurora"
    }

    fn record_name(&self, challenge: &ChallengeName) -> String {
        challenge.record_name().to_string()
    }

    async fn find_zone(&self, domain: &str) -> crate::Result<Zone> {
        match self
            .signed(Method::GET, &format!("/zones/{domain}"))
            .send::<AuroraZone>()
            .await
        {
            Ok(zone) => Ok(Zone {
                id: zone.id,
                name: zone.name,
            }),
            Err(Error::Status { code: 404, .. }) => Err(Error::ZoneNotFound(domain.to_string())),
            Err(err) => Err(err),
        }
    }

    async fn list_records(&self, zone: &Zone, _record_name: &str) -> crate::Result<Vec<DnsRecordRef>> {
        debug!(zone = %zone.name, "Listing Aurora DNS records");
        self.signed(Method::GET, &format!("/zones/{}/records", zone.id))
            .send::<Vec<AuroraRecord>>()
            .await
            .map(|records| records.into_iter().map(Into::into).collect())
    }

    async fn create_txt_record(
        &self,
        zone: &Zone,
        record_name: &str,
        content: &str,
    ) -> crate::Result<()> {
        self.signed(Method::POST, &format!("/zones/{}/records", zone.id))
            .with_body(CreateRecordParams {
                record_type: TXT,
                name: record_name,
                content,
            })?
            .send_raw()
            .await
            .map(|_| ())
    }

    /// Re-fetches the record by id before deleting it.
    async fn delete_record(&self, zone: &Zone, record: &DnsRecordRef) -> crate::Result<()> {
        let record = self.get_record(zone, &record.id).await?;
        self.signed(
            Method::DELETE,
            &format!("/zones/{}/records/{}", zone.id, record.id),
        )
        .send_raw()
        .await
        .map(|_| ())
    }
}

impl From<AuroraRecord> for DnsRecordRef {
    fn from(record: AuroraRecord) -> Self {
        DnsRecordRef {
            id: record.id,
            name: record.name.unwrap_or_default(),
            record_type: record.record_type,
            content: record.content.unwrap_or_default(),
        }
    }
}
