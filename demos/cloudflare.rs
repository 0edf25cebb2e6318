use acme_dns01::{ChallengeProvider, Dns01Solver, ProviderConfig};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let domain = env::var("ACME_DOMAIN").expect("Envvar ACME_DOMAIN should be set with DNS domain");
    let config: ProviderConfig = match env::var("ACME_DNS_CONFIG") {
        Ok(config) => serde_json::from_str(&config)?,
        Err(_) => ProviderConfig::Cloudflare {
            api_key: env::var("CLOUDFLARE_API_TOKEN")
                .expect("Envvar CLOUDFLARE_API_TOKEN should be set with valid token"),
            email: None,
            zone_id: env::var("CLOUDFLARE_ZONE_ID").ok(),
            endpoint: None,
            timeout: Some(120),
        },
    };

    let solver = Dns01Solver::new(ChallengeProvider::from_config(&config)?);

    // Publish a dummy key authorization
    let create_result = solver
        .create_challenge_record(&domain, "LoqXcYV8q5ONbJQxbmR7SCTNo3tiAXDfowyjxAjEuX0")
        .await;
    println!("create result={:?}", create_result);

    let delete_result = solver
        .delete_challenge_record(&domain, "LoqXcYV8q5ONbJQxbmR7SCTNo3tiAXDfowyjxAjEuX0")
        .await;
    println!("delete result={:?}", delete_result);

    Ok(())
}
