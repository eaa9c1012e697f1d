#![cfg(all(feature = "reqwest", feature = "test"))]

// std
use std::net::TcpListener;
// crates.io
use httpmock::prelude::*;
// self
use request_gateway::{
	_preludet::*,
	config::GatewayConfig,
	event::GatewayEvent,
	message::DEFAULT_ERROR_MESSAGE,
	refresh::RefreshPhase,
	request::{ContentType, RequestOptions},
	result::ApiStatus,
	session::{SessionStore, TokenSecret},
};

const STATUS_PATH: &str = "TSC/1.0/sensors/status";

fn unreachable_base_url() -> String {
	let listener =
		TcpListener::bind("127.0.0.1:0").expect("Ephemeral port should be available for tests.");
	let port = listener.local_addr().expect("Listener should expose its address.").port();

	drop(listener);

	format!("http://127.0.0.1:{port}/")
}

#[tokio::test]
async fn success_attaches_bearer_and_reports_response_message() {
	let server = MockServer::start_async().await;
	let (gateway, session, events) = build_reqwest_test_gateway(&server.base_url());

	session
		.set_tokens(TokenSecret::new("access-current"), Some(TokenSecret::new("refresh-current")))
		.expect("Seeding the session should succeed.");

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/TSC/1.0/sensors/status")
				.header("authorization", "Bearer access-current");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Response\":\"ok\",\"Data\":{\"online\":3}}");
		})
		.await;
	let result = gateway.get(STATUS_PATH, RequestOptions::default()).await;

	mock.assert_async().await;

	assert!(result.is_success());
	assert_eq!(result.message.as_deref(), Some("ok"));
	assert_eq!(result.into_data_payload().data, Some(serde_json::json!({ "online": 3 })));
	assert!(events.snapshot().is_empty());
}

#[tokio::test]
async fn anonymous_requests_omit_authorization() {
	let server = MockServer::start_async().await;
	let (gateway, _session, _events) = build_reqwest_test_gateway(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/TSC/1.0/public").header_missing("authorization");
			then.status(200).body("{}");
		})
		.await;
	let result = gateway.get("TSC/1.0/public", RequestOptions::default()).await;

	mock.assert_async().await;

	assert!(result.is_success());
	assert_eq!(result.message.as_deref(), Some("Success"));
}

#[tokio::test]
async fn application_errors_carry_extracted_message() {
	let server = MockServer::start_async().await;
	let (gateway, _session, events) = build_reqwest_test_gateway(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/TSC/1.0/devices");
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"ErrorDescription\":null,\"Response\":\"name is required\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/TSC/1.0/devices/7");
			then.status(500);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(PUT).path("/TSC/1.0/devices/7");
			then.status(400).body("<html>bad request</html>");
		})
		.await;

	let created = gateway
		.post("TSC/1.0/devices", Some(serde_json::json!({})), RequestOptions::default())
		.await;

	assert_eq!(created.status, ApiStatus::Error);
	assert_eq!(created.message.as_deref(), Some("name is required"));
	assert!(!created.handled);

	let deleted = gateway.delete("TSC/1.0/devices/7", RequestOptions::default()).await;

	assert_eq!(deleted.message.as_deref(), Some("Request failed with status code 500"));
	assert!(!deleted.handled);

	let body = serde_json::json!({ "name": "x" });
	let updated = gateway.put("TSC/1.0/devices/7", Some(body), RequestOptions::default()).await;

	assert_eq!(updated.message.as_deref(), Some(DEFAULT_ERROR_MESSAGE));
	assert!(events.snapshot().is_empty());
}

#[tokio::test]
async fn insufficient_permissions_is_translated() {
	let server = MockServer::start_async().await;
	let (gateway, _session, _events) = build_reqwest_test_gateway(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(PATCH).path("/TSC/1.0/users/2");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"error\":\"insufficient_permissions\"}");
		})
		.await;

	let body = serde_json::json!({ "role": "ADMIN" });
	let result = gateway.patch("TSC/1.0/users/2", Some(body), RequestOptions::default()).await;

	assert_eq!(result.message.as_deref(), Some(GatewayConfig::INSUFFICIENT_PERMISSIONS_MESSAGE));
	assert!(!result.handled);
}

#[tokio::test]
async fn network_failure_emits_one_event_and_is_handled() {
	let (gateway, session, events) = build_reqwest_test_gateway(&unreachable_base_url());

	session
		.set_tokens(TokenSecret::new("access"), Some(TokenSecret::new("refresh")))
		.expect("Seeding the session should succeed.");

	let result = gateway.get(STATUS_PATH, RequestOptions::default()).await;

	assert_eq!(result.status, ApiStatus::Error);
	assert!(result.handled);
	assert_eq!(events.snapshot(), vec![GatewayEvent::NetworkError]);
	assert_eq!(gateway.refresh.metrics().attempts(), 0);
	assert_eq!(gateway.refresh_phase(), RefreshPhase::Idle);
	assert!(
		session.access_token().expect("Session read should succeed.").is_some(),
		"Network failures must not touch the session."
	);
}

#[tokio::test]
async fn form_bodies_and_query_parameters_are_encoded() {
	let server = MockServer::start_async().await;
	let (gateway, _session, _events) = build_reqwest_test_gateway(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/php/modules.php")
				.query_param("module", "report")
				.query_param("filter", "{\"site\":\"A\"}")
				.header("content-type", "application/x-www-form-urlencoded")
				.body("action=export&limit=10");
			then.status(200).body("{\"Response\":\"queued\"}");
		})
		.await;
	let mut filter = serde_json::Map::new();

	filter.insert("site".into(), Value::String("A".into()));

	let options = RequestOptions::default()
		.with_content_type(ContentType::FormUrlEncoded)
		.with_query("module", "report")
		.with_filter(&filter);
	let result = gateway
		.post(
			"php/modules.php",
			Some(serde_json::json!({ "action": "export", "limit": 10 })),
			options,
		)
		.await;

	mock.assert_async().await;

	assert!(result.is_success());
	assert_eq!(result.message.as_deref(), Some("queued"));
}

#[tokio::test]
async fn multipart_bodies_send_each_field_as_a_part() {
	let server = MockServer::start_async().await;
	let (gateway, session, _events) = build_reqwest_test_gateway(&server.base_url());

	session
		.set_tokens(TokenSecret::new("access"), None)
		.expect("Seeding the session should succeed.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/TSC/1.0/files/upload")
				.header("authorization", "Bearer access")
				.header_includes("content-type", "multipart/form-data")
				.body_includes("name=\"a\"")
				.body_includes("name=\"label\"")
				.body_includes("pump-7");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Response\":\"uploaded\"}");
		})
		.await;
	let result = gateway
		.post(
			"TSC/1.0/files/upload",
			Some(serde_json::json!({ "a": 1, "label": "pump-7" })),
			RequestOptions::default().with_content_type(ContentType::Multipart),
		)
		.await;

	mock.assert_calls_async(1).await;

	assert!(result.is_success());
	assert_eq!(result.message.as_deref(), Some("uploaded"));
}
