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

use std::future::Future;

use crate::domain::ChallengeName;

pub mod aurora;
pub mod cloudflare;

/// Record type used for DNS-01 challenges.
pub const TXT: &str = "TXT";

/// A DNS zone as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A DNS record as reported by the provider. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordRef {
    pub id: String,
    pub name: String,
    pub record_type: String,
    pub content: String,
}

/// Zone and record operations of a DNS hosting service.
///
/// Implementations issue one request per call (or a fixed sequence of
/// them) and never retry. An empty record list is a normal result; transport
/// failures and non-success statuses are errors.
pub trait ZoneProvider: Send + Sync {
    /// Short provider name used in log output.
    fn name(&self) -> &'static str;

    /// The record name this provider stores and reports for `challenge`.
    fn record_name(&self, challenge: &ChallengeName) -> String;

    /// Resolves the hosted zone for a registrable domain.
    fn find_zone(&self, domain: &str) -> impl Future<Output = crate::Result<Zone>> + Send;

    /// Lists records of `zone`. Providers that support server-side filtering
    /// restrict the listing to TXT records named `record_name`; others may
    /// return the whole zone.
    fn list_records(
        &self,
        zone: &Zone,
        record_name: &str,
    ) -> impl Future<Output = crate::Result<Vec<DnsRecordRef>>> + Send;

    fn create_txt_record(
        &self,
        zone: &Zone,
        record_name: &str,
        content: &str,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    fn delete_record(
        &self,
        zone: &Zone,
        record: &DnsRecordRef,
    ) -> impl Future<Output = crate::Result<()>> + Send;
}
