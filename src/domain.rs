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

use std::fmt::{self, Display, Formatter};

use crate::{Error, IntoFqdn};

/// Label under which ACME DNS-01 challenge records live.
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

/// Location of a DNS-01 challenge record: the registrable domain that
/// hosts it and the record name relative to that domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeName {
    zone: String,
    record_name: String,
}

impl ChallengeName {
    /// Registrable domain, e.g. `example.co.uk`.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Zone-relative record name, e.g. `_acme-challenge.www`.
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Fully qualified record name without the trailing dot.
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.record_name, self.zone)
    }
}

impl Display for ChallengeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record_name, self.zone)
    }
}

/// Removes a leading `*.` wildcard marker.
///
/// Only the first marker is removed, so `*.*.example.com` keeps its second
/// `*` label and is passed to the provider as-is.
pub fn strip_wildcard(domain: &str) -> &str {
    domain.strip_prefix("*.").unwrap_or(domain)
}

/// Splits `domain` into its registrable domain and the challenge record
/// name relative to it, using the ICANN section of the public suffix list.
///
/// `*.www.example.com` and `www.example.com` both yield
/// (`example.com`, `_acme-challenge.www`); `example.com` yields
/// (`example.com`, `_acme-challenge`). Private suffixes such as `github.io`
/// are not registry boundaries here, so `foo.github.io` yields
/// (`github.io`, `_acme-challenge.foo`).
pub fn split(domain: &str) -> crate::Result<ChallengeName> {
    let name = strip_wildcard(domain.trim()).into_name().to_ascii_lowercase();
    if name.is_empty() {
        return Err(Error::Parse("Empty domain name".to_string()));
    }

    let suffix = icann_suffix(&name)
        .ok_or_else(|| Error::Parse(format!("No public suffix in {name}")))?;
    let (subdomain, zone) = name
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|rest| !rest.is_empty())
        .map(|rest| match rest.rsplit_once('.') {
            Some((subdomain, label)) => (subdomain, format!("{label}.{suffix}")),
            None => ("", format!("{rest}.{suffix}")),
        })
        .ok_or_else(|| Error::Parse(format!("No registrable domain in {name}")))?;

    let record_name = if subdomain.is_empty() {
        CHALLENGE_LABEL.to_string()
    } else {
        format!("{CHALLENGE_LABEL}.{subdomain}")
    };

    Ok(ChallengeName { zone, record_name })
}

/// Longest public suffix of `name` that is not a private registration.
fn icann_suffix(name: &str) -> Option<&str> {
    let mut candidate = name;
    loop {
        let suffix = psl::suffix(candidate.as_bytes())?.trim();
        let len = suffix.as_bytes().len();
        let parent = candidate[candidate.len() - len..].split_once('.');
        match (suffix.typ(), parent) {
            (Some(psl::Type::Private), Some((_, parent))) => candidate = parent,
            _ => return Some(&name[name.len() - len..]),
        }
    }
}
