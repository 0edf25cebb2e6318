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

#[cfg(test)]
mod tests {
    use crate::{
        ChallengeProvider, Dns01Solver, Error, providers::cloudflare::CloudflareProvider,
    };
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;
    use std::time::Duration;

    const TIMEOUT: Option<Duration> = Some(Duration::from_secs(1));
    const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
    const RECORD_NAME: &str = "_acme-challenge.sub.example.com";
    const AUTH: &str = "LoqXcYV8q5ONbJQxbmR7SCTNo3tiAXDfowyjxAjEuX0";

    fn setup_solver(server: &ServerGuard) -> Dns01Solver<CloudflareProvider> {
        Dns01Solver::new(
            CloudflareProvider::new("cf-api-key", Some("admin@example.com"), TIMEOUT)
                .unwrap()
                .with_zone_id(ZONE_ID)
                .with_endpoint(server.url()),
        )
    }

    fn records_body(ids: &[&str]) -> String {
        let result = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "type": "TXT",
                    "name": RECORD_NAME,
                    "content": "stale",
                    "proxied": false,
                    "ttl": 1
                })
            })
            .collect::<Vec<_>>();
        json!({ "success": true, "errors": [], "messages": [], "result": result }).to_string()
    }

    async fn mock_list(server: &mut ServerGuard, ids: &[&str], hits: usize) -> Mock {
        server
            .mock("GET", format!("/zones/{ZONE_ID}/dns_records").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "TXT".into()),
                Matcher::UrlEncoded("name".into(), RECORD_NAME.into()),
            ]))
            .match_header("x-auth-email", "admin@example.com")
            .match_header("x-auth-key", "cf-api-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(records_body(ids))
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_delete(server: &mut ServerGuard, id: &str, status: usize) -> Mock {
        let body = if status == 200 {
            json!({ "success": true, "errors": [], "messages": [], "result": { "id": id } })
        } else {
            json!({ "success": false, "errors": [{ "code": 1000, "message": "Internal error" }], "messages": [], "result": null })
        };
        server
            .mock("DELETE", format!("/zones/{ZONE_ID}/dns_records/{id}").as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_create_record_success() {
        let mut server = Server::new_async().await;
        let list = mock_list(&mut server, &["stale-record"], 1).await;
        let delete = mock_delete(&mut server, "stale-record", 200).await;
        let create = server
            .mock("POST", format!("/zones/{ZONE_ID}/dns_records").as_str())
            .match_header("x-auth-email", "admin@example.com")
            .match_header("x-auth-key", "cf-api-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "type": "TXT",
                "name": "_acme-challenge.sub.example.com.",
                "content": AUTH
            })))
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "errors": [],
                    "messages": [],
                    "result": { "id": "new-record", "type": "TXT", "name": RECORD_NAME, "content": AUTH }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let result = setup_solver(&server)
            .create_challenge_record("*.sub.example.com", AUTH)
            .await;

        assert_eq!(result, Ok(()));
        list.assert_async().await;
        delete.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_record_failure_reports_status() {
        let mut server = Server::new_async().await;
        let list = mock_list(&mut server, &[], 1).await;
        let create = server
            .mock("POST", format!("/zones/{ZONE_ID}/dns_records").as_str())
            .with_status(400)
            .with_body(r#"{"success":false,"errors":[{"code":81057,"message":"Record already exists."}]}"#)
            .expect(1)
            .create_async()
            .await;

        let result = setup_solver(&server)
            .create_challenge_record("sub.example.com", AUTH)
            .await;

        let err = result.expect_err("create must fail");
        match &err {
            Error::RecordCreate { name, cause } => {
                assert_eq!(name, RECORD_NAME);
                assert!(matches!(cause.as_ref(), Error::Status { code: 400, body } if body.contains("81057")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("status_code=400"));
        list.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_record_api_failure() {
        let mut server = Server::new_async().await;
        let _list = mock_list(&mut server, &[], 1).await;
        let _create = server
            .mock("POST", format!("/zones/{ZONE_ID}/dns_records").as_str())
            .with_status(200)
            .with_body(r#"{"success":false,"errors":[{"code":9005,"message":"Content for TXT record is invalid"}],"result":null}"#)
            .create_async()
            .await;

        let result = setup_solver(&server)
            .create_challenge_record("sub.example.com", AUTH)
            .await;

        assert!(matches!(
            result,
            Err(Error::RecordCreate { cause, .. }) if matches!(*cause, Error::Api(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_record_swallows_failures() {
        let mut server = Server::new_async().await;
        let list = mock_list(&mut server, &["first", "second"], 1).await;
        let first = mock_delete(&mut server, "first", 500).await;
        let second = mock_delete(&mut server, "second", 200).await;

        let result = setup_solver(&server)
            .delete_challenge_record("sub.example.com", AUTH)
            .await;

        assert_eq!(result, Ok(()));
        list.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_record_twice() {
        let mut server = Server::new_async().await;
        let list = mock_list(&mut server, &[], 2).await;
        let solver = setup_solver(&server);

        assert_eq!(
            solver.delete_challenge_record("sub.example.com", AUTH).await,
            Ok(())
        );
        assert_eq!(
            solver.delete_challenge_record("sub.example.com", AUTH).await,
            Ok(())
        );
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_zone_lookup_by_name() {
        let mut server = Server::new_async().await;
        let zones = server
            .mock("GET", "/zones")
            .match_query(Matcher::UrlEncoded("name".into(), "example.com".into()))
            .match_header("authorization", "Bearer cf-api-token")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "errors": [],
                    "result": [
                        { "id": "other-zone", "name": "example.com.au" },
                        { "id": "zone-1", "name": "example.com" }
                    ]
                })
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/zones/zone-1/dns_records")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"success":true,"errors":[],"result":[]}"#)
            .expect(1)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/zones/zone-1/dns_records")
            .match_header("authorization", "Bearer cf-api-token")
            .match_body(Matcher::PartialJson(json!({ "name": "_acme-challenge.example.com." })))
            .with_status(200)
            .with_body(r#"{"success":true,"errors":[],"result":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let solver = Dns01Solver::new(
            CloudflareProvider::new("cf-api-token", None::<&str>, TIMEOUT)
                .unwrap()
                .with_endpoint(format!("{}/", server.url())),
        );
        assert_eq!(
            solver.create_challenge_record("example.com", AUTH).await,
            Ok(())
        );

        zones.assert_async().await;
        list.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_zone_not_found() {
        let mut server = Server::new_async().await;
        let _zones = server
            .mock("GET", "/zones")
            .match_query(Matcher::UrlEncoded("name".into(), "example.com".into()))
            .with_status(200)
            .with_body(r#"{"success":true,"errors":[],"result":[]}"#)
            .create_async()
            .await;

        let solver = Dns01Solver::new(
            CloudflareProvider::new("cf-api-token", None::<&str>, TIMEOUT)
                .unwrap()
                .with_endpoint(server.url()),
        );

        assert_eq!(
            solver.create_challenge_record("www.example.com", AUTH).await,
            Err(Error::ZoneNotFound("example.com".to_string()))
        );
        assert_eq!(
            solver.delete_challenge_record("www.example.com", AUTH).await,
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_transport_error_on_create() {
        let solver = Dns01Solver::new(
            CloudflareProvider::new("cf-api-key", Some("admin@example.com"), TIMEOUT)
                .unwrap()
                .with_zone_id(ZONE_ID)
                .with_endpoint("http://127.0.0.1:1"),
        );

        let result = solver.create_challenge_record("sub.example.com", AUTH).await;

        assert!(matches!(
            result,
            Err(Error::RecordCreate { cause, .. }) if matches!(*cause, Error::Transport(_))
        ));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            CloudflareProvider::new("", None::<&str>, None),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_credentials_rejected() {
        assert!(matches!(
            CloudflareProvider::new("cf-api-token\n", None::<&str>, None),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            CloudflareProvider::new(" cf-api-key", Some("admin@example.com"), None),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            CloudflareProvider::new("cf-api-key", Some("admin@example.com\r\n"), None),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            ChallengeProvider::new_cloudflare("cf-api-token\n", None::<&str>, None::<&str>, None),
            Err(Error::Parse(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires Cloudflare API credentials and a test domain"]
    async fn integration_test() {
        let api_token = std::env::var("CLOUDFLARE_API_TOKEN").unwrap_or_default();
        let zone_id = std::env::var("CLOUDFLARE_ZONE_ID").unwrap_or_default();
        let domain = std::env::var("CLOUDFLARE_DOMAIN").unwrap_or_default();

        assert!(
            !api_token.is_empty(),
            "Please configure your Cloudflare API token in the integration test"
        );
        assert!(
            !domain.is_empty(),
            "Please configure your domain in the integration test"
        );

        let provider = ChallengeProvider::new_cloudflare(
            api_token,
            None::<&str>,
            (!zone_id.is_empty()).then_some(zone_id),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        let solver = Dns01Solver::new(provider);

        assert!(solver.create_challenge_record(&domain, AUTH).await.is_ok());
        assert!(solver.delete_challenge_record(&domain, AUTH).await.is_ok());
    }
}
