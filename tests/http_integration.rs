// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the wallbox HTTP client using wiremock.

use std::sync::Arc;
use std::time::Duration;

use alfen_lib::error::{DeviceError, ProtocolError};
use alfen_lib::types::Category;
use alfen_lib::{Coordinator, Device, EntryOptions, Error, HttpConfig, RefreshOutcome};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn prop(id: &str, value: Value, cat: &str) -> Value {
    json!({ "id": id, "access": 1, "type": 5, "len": 0, "cat": cat, "value": value })
}

fn page(properties: &[Value], total: usize) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "version": 2,
        "properties": properties,
        "offset": 0,
        "total": total,
    }))
}

fn device(server: &MockServer, categories: &[Category]) -> Device {
    let config = HttpConfig::new(server.address().to_string())
        .without_https()
        .with_credentials("admin", "secret");
    Device::http_config(config)
        .with_name("garage")
        .with_refresh_categories(categories.iter().copied())
        .build_without_probe()
        .unwrap()
}

/// Answers every category nobody else claims with an empty page.
async fn mount_empty_categories(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/prop"))
        .respond_with(page(&[], 0))
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

// ============================================================================
// Paged fetch
// ============================================================================

mod paging {
    use super::*;

    #[tokio::test]
    async fn fetches_total_items_in_ceil_pages() {
        let server = MockServer::start().await;

        let all: Vec<Value> = (0..5)
            .map(|i| prop(&format!("2{i:03}_0"), json!(i), "generic"))
            .collect();
        for (offset, chunk) in [(0, &all[0..2]), (2, &all[2..4]), (4, &all[4..5])] {
            Mock::given(method("GET"))
                .and(path("/api/prop"))
                .and(query_param("cat", "generic"))
                .and(query_param("offset", offset.to_string()))
                .respond_with(page(chunk, 5))
                .expect(1)
                .mount(&server)
                .await;
        }

        let device = device(&server, &[Category::Generic]);
        let properties = device
            .fetch_category_properties(Category::Generic)
            .await
            .unwrap();

        assert_eq!(properties.len(), 5);
        assert_eq!(properties[4].id, "2004_0");
    }

    #[tokio::test]
    async fn empty_page_stops_before_total() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("offset", "0"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 10))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("offset", "1"))
            .respond_with(page(&[], 10))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        let properties = device
            .fetch_category_properties(Category::Generic)
            .await
            .unwrap();
        assert_eq!(properties.len(), 1);
    }

    #[tokio::test]
    async fn single_failure_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        let properties = device
            .fetch_category_properties(Category::Generic)
            .await
            .unwrap();
        assert_eq!(properties.len(), 1);
    }

    #[tokio::test]
    async fn three_failures_abort_and_clear_properties() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "generic"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic]);
        device.refresh().await.unwrap();
        assert_eq!(device.state().properties().len(), 1);

        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "generic"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let result = device.refresh().await;
        assert!(matches!(
            result,
            Err(Error::Device(DeviceError::RefreshAborted { attempts: 3, .. }))
        ));
        assert!(device.state().properties().is_empty());
    }

    #[tokio::test]
    async fn static_categories_fetched_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "generic"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "accelero"))
            .respond_with(page(&[prop("2099_0", json!(0), "accelero")], 1))
            .expect(1)
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic]);
        assert_eq!(
            device.refresh().await.unwrap(),
            RefreshOutcome::Updated { properties: 2 }
        );
        assert_eq!(
            device.refresh().await.unwrap(),
            RefreshOutcome::Updated { properties: 2 }
        );

        // Static values survive in the snapshot.
        assert!(device.state().property("2099_0").is_some());
    }

    #[tokio::test]
    async fn category_change_refetches_static() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "accelero"))
            .respond_with(page(&[], 0))
            .expect(2)
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic]);
        device.refresh().await.unwrap();
        device.set_dynamic_categories(vec![Category::Generic, Category::Meter1]);
        device.refresh().await.unwrap();
    }
}

// ============================================================================
// Sessions
// ============================================================================

mod session {
    use super::*;

    #[tokio::test]
    async fn unauthorized_triggers_one_login_and_retry() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("id", "2129_0"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("id", "2129_0"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        let property = device.get_value("2129_0").await.unwrap().unwrap();
        assert_eq!(property.as_i64(), Some(16));
    }

    #[tokio::test]
    async fn unauthorized_retry_is_terminal() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        let result = device.get_value("2129_0").await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::AuthenticationFailed))
        ));
    }

    #[tokio::test]
    async fn login_sends_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(json!({
                "username": "admin",
                "password": "secret",
                "displayName": "ha",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        device.login().await.unwrap();
    }

    #[tokio::test]
    async fn logout_suppresses_relogin_until_login() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/api/logout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        device.logout().await.unwrap();
        assert!(device.is_logged_out());

        // Refresh sends nothing while logged out.
        assert_eq!(device.refresh().await.unwrap(), RefreshOutcome::Skipped);

        // A 401 is not answered with a login.
        let result = device.get_value("2129_0").await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::AuthenticationFailed))
        ));

        device.login().await.unwrap();
        assert!(!device.is_logged_out());
    }
}

// ============================================================================
// Values and commands
// ============================================================================

mod values {
    use super::*;

    #[tokio::test]
    async fn current_limit_out_of_range_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        assert!(matches!(
            device.set_current_limit(0).await,
            Err(Error::Value(_))
        ));
        assert!(matches!(
            device.set_current_limit(33).await,
            Err(Error::Value(_))
        ));
    }

    #[tokio::test]
    async fn current_limit_sends_one_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/prop"))
            .and(body_json(json!({ "2129_0": { "id": "2129_0", "value": "16" } })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        device.set_current_limit(16).await.unwrap();
    }

    #[tokio::test]
    async fn set_value_patches_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "generic"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        device.refresh().await.unwrap();
        device.set_current_limit(10).await.unwrap();

        assert_eq!(device.state().value("2129_0"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn get_value_patches_known_property() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("id", "2129_0"))
            .respond_with(page(&[prop("2129_0", json!(6), "generic")], 1))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/prop"))
            .and(query_param("cat", "generic"))
            .respond_with(page(&[prop("2129_0", json!(16), "generic")], 1))
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic]);
        device.refresh().await.unwrap();
        device.get_value("2129_0").await.unwrap();

        assert_eq!(device.state().value("2129_0"), Some(&json!(6)));
    }

    #[tokio::test]
    async fn reboot_accepts_trailing_comma() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/cmd"))
            .and(body_json(json!({ "command": "reboot" })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":"ok",}"#))
            .expect(1)
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        device.reboot().await.unwrap();
    }

    #[tokio::test]
    async fn reboot_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/cmd"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        assert!(matches!(
            device.reboot().await,
            Err(Error::Device(DeviceError::CommandRejected(_)))
        ));
    }

    #[tokio::test]
    async fn post_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/prop"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        assert_eq!(device.post("prop", None).await.unwrap(), None);
    }
}

// ============================================================================
// Identity
// ============================================================================

mod identity {
    use super::*;

    #[tokio::test]
    async fn connect_reads_info() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Identity": "ACE0123456",
                "FWVersion": "6.4.0-4210",
                "Model": "NG910-60023",
                "ObjectId": "1",
                "Type": "2",
            })))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        assert!(device.connect().await.unwrap());

        let info = device.info();
        assert_eq!(info.identity, "ACE0123456");
        assert_eq!(info.model, "Eve Single Pro-line");
        assert_eq!(info.firmware_version, "6.4.0-4210");
    }

    #[tokio::test]
    async fn missing_info_falls_back_to_generic() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let device = device(&server, &[Category::Generic]);
        assert!(!device.connect().await.unwrap());
        assert!(device.info().is_generic());
    }
}

// ============================================================================
// Transaction log
// ============================================================================

mod transactions {
    use super::*;

    const LOG: &str = "\
23_txstart2: id 0x0000000000000017, socket 1, 2024-03-01 18:02:11 1523.120kWh 04A2B3C4D5 3 1 y
24_mv: socket 1, 2024-03-01 18:17:11 1525.404
25_txstop2: id 0x0000000000000017, socket 1, 2024-03-01 21:40:02 1541.877kWh 04A2B3C4D5 2 y
0_Empty
";

    #[tokio::test]
    async fn refresh_follows_log() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/transactions"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOG))
            .expect(1)
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic, Category::Transactions]);
        device.refresh().await.unwrap();

        let state = device.state();
        assert_eq!(state.transactions().offset(), 25);
        let socket = state.transactions().socket("socket 1").unwrap();
        assert!((socket.last_start.as_ref().unwrap().kwh - 1523.12).abs() < 1e-9);
        assert!((socket.meter_value.as_ref().unwrap().kwh - 1525.404).abs() < 1e-9);
        assert!((socket.last_session_kwh().unwrap() - 18.757).abs() < 1e-6);
    }

    #[tokio::test]
    async fn transactions_not_requested_unless_selected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOG))
            .expect(0)
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic]);
        device.refresh().await.unwrap();
        assert!(device.state().transactions().sockets().is_empty());
    }

    /// Serves one meter value per page, slowly, so a long log cannot be
    /// read within one poll.
    fn slow_endless_log(request: &Request) -> ResponseTemplate {
        let offset: u64 = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "offset")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0);
        ResponseTemplate::new(200)
            .set_body_string(format!(
                "{}_mv: socket 1, 2024-03-01 18:00:00 {}.000",
                offset + 1,
                1000 + offset
            ))
            .set_delay(Duration::from_millis(300))
    }

    #[tokio::test]
    async fn timed_out_poll_keeps_log_progress() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/transactions"))
            .respond_with(slow_endless_log)
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let categories = [Category::Generic, Category::Transactions];
        let coordinator = Coordinator::new(
            Arc::new(device(&server, &categories)),
            EntryOptions {
                scan_interval: 1,
                timeout: 1,
                refresh_categories: categories.to_vec(),
            },
        );
        let offset = || coordinator.device().with_state(|s| s.transactions().offset());

        assert!(matches!(
            coordinator.refresh().await,
            Err(Error::UpdateFailed(_))
        ));
        let first = offset();
        assert!(first > 0);

        assert!(coordinator.refresh().await.is_err());
        let second = offset();
        assert!(second > first);

        let requested: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/api/transactions")
            .map(|r| r.url.query().unwrap_or_default().to_string())
            .collect();
        // The second poll resumes where the first one stopped.
        assert_eq!(
            requested.iter().filter(|q| *q == "offset=0").count(),
            1
        );
    }

    #[tokio::test]
    async fn log_failure_does_not_fail_refresh() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/transactions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_empty_categories(&server).await;

        let device = device(&server, &[Category::Generic, Category::Transactions]);
        assert!(device.refresh().await.is_ok());
    }
}
