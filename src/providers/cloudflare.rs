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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    Error, IntoFqdn,
    domain::ChallengeName,
    http::{HttpClientBuilder, check_credential},
    providers::{DnsRecordRef, TXT, Zone, ZoneProvider},
};

pub const DEFAULT_API_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/";

#[derive(Clone)]
pub struct CloudflareProvider {
    client: HttpClientBuilder,
    endpoint: String,
    zone_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct IdMap {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct CloudflareRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct Query<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    record_type: Option<&'a str>,
    name: &'a str,
}

#[derive(Serialize, Clone, Debug)]
pub struct CreateDnsRecordParams<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize, Serialize, Debug)]
struct ApiResult<T> {
    errors: Vec<ApiError>,
    success: bool,
    result: T,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl CloudflareProvider {
    /// With an `email` the secret is sent as a global API key
    /// (`X-Auth-Email` / `X-Auth-Key`), otherwise as a bearer token.
    pub(crate) fn new(
        secret: impl AsRef<str>,
        email: Option<impl AsRef<str>>,
        timeout: Option<Duration>,
    ) -> crate::Result<Self> {
        check_credential("Cloudflare API key", secret.as_ref())?;
        if let Some(email) = &email {
            check_credential("Cloudflare account email", email.as_ref())?;
        }

        let client = if let Some(email) = email {
            HttpClientBuilder::default()
                .with_header("X-Auth-Email", email.as_ref())
                .with_header("X-Auth-Key", secret.as_ref())
        } else {
            HttpClientBuilder::default()
                .with_header("Authorization", format!("Bearer {}", secret.as_ref()))
        }
        .with_timeout(timeout);

        Ok(Self {
            client,
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            zone_id: None,
        })
    }

    /// Uses a fixed zone instead of looking it up by name.
    pub fn with_zone_id(self, zone_id: impl AsRef<str>) -> Self {
        Self {
            zone_id: Some(zone_id.as_ref().to_string()),
            ..self
        }
    }

    pub fn with_endpoint(self, endpoint: impl AsRef<str>) -> Self {
        let endpoint = endpoint.as_ref();
        let endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        Self { endpoint, ..self }
    }

    async fn obtain_zone_id(&self, origin: &str) -> crate::Result<String> {
        self.client
            .get(format!(
                "{}zones?{}",
                self.endpoint,
                Query::name(origin).serialize()?
            ))
            .send::<ApiResult<Vec<IdMap>>>()
            .await
            .and_then(|r| r.unwrap_response("list zones"))
            .and_then(|result| {
                result
                    .into_iter()
                    .find(|zone| zone.name == origin)
                    .map(|zone| zone.id)
                    .ok_or_else(|| Error::ZoneNotFound(origin.to_string()))
            })
    }
}

impl ZoneProvider for CloudflareProvider {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn record_name(&self, challenge: &ChallengeName) -> String {
        challenge.fqdn()
    }

    async fn find_zone(&self, domain: &str) -> crate::Result<Zone> {
        let id = match &self.zone_id {
            Some(zone_id) => zone_id.clone(),
            None => self.obtain_zone_id(domain).await?,
        };
        Ok(Zone {
            id,
            name: domain.to_string(),
        })
    }

    async fn list_records(&self, zone: &Zone, record_name: &str) -> crate::Result<Vec<DnsRecordRef>> {
        let query = Query::txt(record_name).serialize()?;
        debug!(zone = %zone.id, %query, "Listing Cloudflare DNS records");
        self.client
            .get(format!(
                "{}zones/{}/dns_records?{query}",
                self.endpoint, zone.id
            ))
            .send::<ApiResult<Vec<CloudflareRecord>>>()
            .await
            .and_then(|r| r.unwrap_response("list DNS records"))
            .map(|records| records.into_iter().map(Into::into).collect())
    }

    async fn create_txt_record(
        &self,
        zone: &Zone,
        record_name: &str,
        content: &str,
    ) -> crate::Result<()> {
        self.client
            .post(format!("{}zones/{}/dns_records", self.endpoint, zone.id))
            .with_body(CreateDnsRecordParams {
                record_type: TXT,
                name: record_name.into_fqdn().as_ref(),
                content,
            })?
            .send::<ApiResult<Value>>()
            .await
            .and_then(|r| r.unwrap_response("create DNS record"))
            .map(|_| ())
    }

    async fn delete_record(&self, zone: &Zone, record: &DnsRecordRef) -> crate::Result<()> {
        self.client
            .delete(format!(
                "{}zones/{}/dns_records/{}",
                self.endpoint, zone.id, record.id
            ))
            .send::<ApiResult<Value>>()
            .await
            .and_then(|r| r.unwrap_response("delete DNS record"))
            .map(|_| ())
    }
}

impl<T> ApiResult<T> {
    fn unwrap_response(self, action_name: &str) -> crate::Result<T> {
        if self.success {
            Ok(self.result)
        } else {
            Err(Error::Api(format!(
                "Failed to {action_name}: {:?}",
                self.errors
            )))
        }
    }
}

impl<'a> Query<'a> {
    pub fn name(name: &'a str) -> Self {
        Self {
            record_type: None,
            name,
        }
    }

    pub fn txt(name: &'a str) -> Self {
        Self {
            record_type: Some(TXT),
            name,
        }
    }

    pub fn serialize(&self) -> crate::Result<String> {
        serde_urlencoded::to_string(self)
            .map_err(|err| Error::Serialize(format!("Failed to encode query: {err}")))
    }
}

impl From<CloudflareRecord> for DnsRecordRef {
    fn from(record: CloudflareRecord) -> Self {
        DnsRecordRef {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            content: record.content,
        }
    }
}
