#![doc = include_str!("../README.md")]
/*
 * Copyright Stalwart Labs LLC See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use tracing::{error, info};

use providers::{
    DnsRecordRef, TXT, Zone, ZoneProvider, aurora::AuroraProvider,
    cloudflare::CloudflareProvider,
};

pub use config::ProviderConfig;
pub use domain::{ChallengeName, split, strip_wildcard};

pub mod config;
mod crypto;
pub mod domain;
pub mod http;
pub mod providers;
#[cfg(test)]
mod tests;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// Invalid domain name or configuration value.
    Parse(String),
    /// Timeout or connection failure.
    Transport(String),
    /// Non-success HTTP status, with the response body.
    Status { code: u16, body: String },
    /// The provider reported a failure inside a successful response.
    Api(String),
    Serialize(String),
    Unauthorized,
    /// No zone at the provider for this registrable domain.
    ZoneNotFound(String),
    /// The challenge record could not be written.
    RecordCreate { name: String, cause: Box<Error> },
}

pub type Result<T> = std::result::Result<T, Error>;

/// The DNS hosting service that holds the challenge records.
#[derive(Clone)]
#[non_exhaustive]
pub enum ChallengeProvider {
    Cloudflare(CloudflareProvider),
    Aurora(AuroraProvider),
}

/// Creates and removes `_acme-challenge` TXT records through a
/// [`ZoneProvider`].
///
/// Creating is strict: any failure is returned so that the ACME flow stops
/// before asking the CA to validate a record that does not exist. Deleting
/// is best effort: provider failures are logged and never returned.
#[derive(Clone)]
pub struct Dns01Solver<P> {
    provider: P,
}

pub trait IntoFqdn<'x> {
    fn into_fqdn(self) -> Cow<'x, str>;
    fn into_name(self) -> Cow<'x, str>;
}

impl ChallengeProvider {
    /// Create a new challenge provider using the Cloudflare API.
    ///
    /// With `email` the secret is a global API key, otherwise an API token.
    pub fn new_cloudflare(
        secret: impl AsRef<str>,
        email: Option<impl AsRef<str>>,
        zone_id: Option<impl AsRef<str>>,
        timeout: Option<Duration>,
    ) -> crate::Result<Self> {
        let provider = CloudflareProvider::new(secret, email, timeout)?;
        Ok(ChallengeProvider::Cloudflare(match zone_id {
            Some(zone_id) => provider.with_zone_id(zone_id),
            None => provider,
        }))
    }

    /// Create a new challenge provider using the Aurora DNS API.
    pub fn new_aurora(
        api_key: impl AsRef<str>,
        secret_key: impl AsRef<str>,
        timeout: Option<Duration>,
    ) -> crate::Result<Self> {
        Ok(ChallengeProvider::Aurora(AuroraProvider::new(
            api_key, secret_key, timeout,
        )?))
    }

    pub fn from_config(config: &ProviderConfig) -> crate::Result<Self> {
        let timeout = config.timeout();
        match config {
            ProviderConfig::Cloudflare {
                api_key,
                email,
                zone_id,
                endpoint,
                ..
            } => {
                let mut provider = CloudflareProvider::new(api_key, email.as_ref(), timeout)?;
                if let Some(zone_id) = zone_id {
                    provider = provider.with_zone_id(zone_id);
                }
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Ok(ChallengeProvider::Cloudflare(provider))
            }
            ProviderConfig::Aurora {
                api_key,
                secret_key,
                endpoint,
                ..
            } => {
                let provider = AuroraProvider::new(api_key, secret_key, timeout)?;
                Ok(ChallengeProvider::Aurora(match endpoint {
                    Some(endpoint) => provider.with_endpoint(endpoint),
                    None => provider,
                }))
            }
        }
    }
}

impl ZoneProvider for ChallengeProvider {
    fn name(&self) -> &'static str {
        match self {
            ChallengeProvider::Cloudflare(provider) => provider.name(),
            ChallengeProvider::Aurora(provider) => provider.name(),
        }
    }

    fn record_name(&self, challenge: &ChallengeName) -> String {
        match self {
            ChallengeProvider::Cloudflare(provider) => provider.record_name(challenge),
            ChallengeProvider::Aurora(provider) => provider.record_name(challenge),
        }
    }

    async fn find_zone(&self, domain: &str) -> crate::Result<Zone> {
        match self {
            ChallengeProvider::Cloudflare(provider) => provider.find_zone(domain).await,
            ChallengeProvider::Aurora(provider) => provider.find_zone(domain).await,
        }
    }

    async fn list_records(&self, zone: &Zone, record_name: &str) -> crate::Result<Vec<DnsRecordRef>> {
        match self {
            ChallengeProvider::Cloudflare(provider) => provider.list_records(zone, record_name).await,
            ChallengeProvider::Aurora(provider) => provider.list_records(zone, record_name).await,
        }
    }

    async fn create_txt_record(
        &self,
        zone: &Zone,
        record_name: &str,
        content: &str,
    ) -> crate::Result<()> {
        match self {
            ChallengeProvider::Cloudflare(provider) => {
                provider.create_txt_record(zone, record_name, content).await
            }
            ChallengeProvider::Aurora(provider) => {
                provider.create_txt_record(zone, record_name, content).await
            }
        }
    }

    async fn delete_record(&self, zone: &Zone, record: &DnsRecordRef) -> crate::Result<()> {
        match self {
            ChallengeProvider::Cloudflare(provider) => provider.delete_record(zone, record).await,
            ChallengeProvider::Aurora(provider) => provider.delete_record(zone, record).await,
        }
    }
}

impl<P: ZoneProvider> Dns01Solver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Publishes `key_authorization` as the TXT record at
    /// `_acme-challenge.<domain_name>`, replacing any stale record first.
    pub async fn create_challenge_record(
        &self,
        domain_name: &str,
        key_authorization: &str,
    ) -> crate::Result<()> {
        let domain_name = strip_wildcard(domain_name);
        let provider = self.provider.name();
        info!(provider, domain = domain_name, "Creating DNS-01 challenge record");

        self.delete_challenge_record(domain_name, key_authorization)
            .await?;

        let challenge = split(domain_name)?;
        let zone = self.provider.find_zone(challenge.zone()).await?;
        let record_name = self.provider.record_name(&challenge);

        if let Err(err) = self
            .provider
            .create_txt_record(&zone, &record_name, key_authorization)
            .await
        {
            error!(provider, record = %challenge, error = %err, "Failed to create challenge record");
            return Err(Error::RecordCreate {
                name: challenge.fqdn(),
                cause: Box::new(err),
            });
        }

        info!(provider, record = %challenge, zone = %zone.id, "Created challenge record");
        Ok(())
    }

    /// Removes every TXT record at the challenge name. Only a domain that
    /// cannot be split is reported as an error.
    pub async fn delete_challenge_record(
        &self,
        domain_name: &str,
        _key_authorization: &str,
    ) -> crate::Result<()> {
        let challenge = split(domain_name)?;
        self.purge(&challenge).await;
        Ok(())
    }

    /// Deletes the matching records and returns how many were found.
    pub(crate) async fn purge(&self, challenge: &ChallengeName) -> usize {
        let provider = self.provider.name();
        info!(provider, record = %challenge, "Deleting DNS-01 challenge record");

        let zone = match self.provider.find_zone(challenge.zone()).await {
            Ok(zone) => zone,
            Err(err) => {
                error!(provider, record = %challenge, error = %err, "Failed to resolve zone, nothing deleted");
                return 0;
            }
        };

        let record_name = self.provider.record_name(challenge);
        let records = match self.provider.list_records(&zone, &record_name).await {
            Ok(records) => records,
            Err(err) => {
                error!(provider, record = %challenge, error = %err, "Failed to list records, nothing deleted");
                return 0;
            }
        };

        let mut found = 0;
        for record in records
            .iter()
            .filter(|record| record.name == record_name && record.record_type == TXT)
        {
            found += 1;
            info!(provider, record = %challenge, record_id = %record.id, "Found challenge record");

            match self.provider.delete_record(&zone, record).await {
                Ok(()) => {
                    info!(provider, record = %challenge, record_id = %record.id, "Deleted challenge record")
                }
                Err(err) => {
                    error!(provider, record = %challenge, record_id = %record.id, error = %err, "Failed to delete challenge record")
                }
            }
        }

        if found == 0 {
            info!(provider, record = %challenge, "Challenge record not found, no record to delete");
        }

        found
    }
}

impl<'x> IntoFqdn<'x> for &'x str {
    fn into_fqdn(self) -> Cow<'x, str> {
        if self.ends_with('.') {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(format!("{}.", self))
        }
    }

    fn into_name(self) -> Cow<'x, str> {
        if let Some(name) = self.strip_suffix('.') {
            Cow::Borrowed(name)
        } else {
            Cow::Borrowed(self)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Status { code, body } => {
                write!(f, "status_code={} response={}", code, body)
            }
            Error::Api(e) => write!(f, "API error: {}", e),
            Error::Serialize(e) => write!(f, "Serialize error: {}", e),
            Error::Unauthorized => write!(f, "Unauthorized"),
            Error::ZoneNotFound(e) => write!(f, "Zone {} not found", e),
            Error::RecordCreate { name, cause } => {
                write!(f, "Error creating DNS record {}: {}", name, cause)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RecordCreate { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
