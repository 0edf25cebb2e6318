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

use serde::Deserialize;

/// Provider credentials as found in a configuration file, e.g.
///
/// ```json
/// { "provider": "cloudflare", "api_key": "...", "zone_id": "...", "timeout": 30 }
/// ```
#[derive(Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    Cloudflare {
        api_key: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        zone_id: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        timeout: Option<u64>,
    },
    Aurora {
        api_key: String,
        secret_key: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Request timeout, in seconds in the configuration.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            ProviderConfig::Cloudflare { timeout, .. } | ProviderConfig::Aurora { timeout, .. } => {
                timeout.map(Duration::from_secs)
            }
        }
    }
}
