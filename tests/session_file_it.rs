#![cfg(all(feature = "reqwest", feature = "test"))]

// std
use std::{env, fs, path::PathBuf};
// crates.io
use httpmock::prelude::*;
// self
use request_gateway::{
	_preludet::*,
	event::NoopEventSink,
	gateway::Gateway,
	request::RequestOptions,
	session::{FileSessionStore, SessionStore, TokenSecret},
};

fn temp_path(label: &str) -> PathBuf {
	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
	let pid = std::process::id();

	env::temp_dir().join(format!("request-gateway-it-{label}-{pid}-{nanos}.json"))
}

#[tokio::test]
async fn rotated_tokens_survive_a_reopen() {
	let server = MockServer::start_async().await;
	let path = temp_path("rotate");
	let store = FileSessionStore::open(&path).expect("Session file should open.");

	store
		.set_tokens(TokenSecret::new("oldToken"), Some(TokenSecret::new("refresh-old")))
		.expect("Seeding the session should succeed.");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/TSC/1.0/reports").header("authorization", "Bearer oldToken");
			then.status(401).body("{\"error\":\"token_expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/TSC/1.0/reports").header("authorization", "Bearer newToken");
			then.status(200).body("{\"Response\":\"ok\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/TSC/1.0/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Data\":{\"access_token\":\"newToken\",\"refresh_token\":\"refresh-new\"}}");
		})
		.await;

	let gateway: ReqwestTestGateway = Gateway::with_http_client(
		test_config(&server.base_url()),
		Arc::new(store),
		Arc::new(NoopEventSink),
		test_reqwest_http_client(),
	);
	let result = gateway.get("TSC/1.0/reports", RequestOptions::default()).await;

	assert!(result.is_success());

	let reopened = FileSessionStore::open(&path).expect("Session file should reopen.");
	let stored = reopened
		.credentials()
		.expect("Reopened session read should succeed.")
		.expect("Rotated credentials should be persisted.");

	assert_eq!(stored.access_token.expose(), "newToken");
	assert_eq!(stored.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-new"));

	fs::remove_file(&path).expect("Temporary session snapshot should be removable.");
}

#[tokio::test]
async fn failed_refresh_clears_the_persisted_session() {
	let server = MockServer::start_async().await;
	let path = temp_path("expire");
	let store = FileSessionStore::open(&path).expect("Session file should open.");

	store
		.set_tokens(TokenSecret::new("oldToken"), Some(TokenSecret::new("refresh-old")))
		.expect("Seeding the session should succeed.");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/TSC/1.0/reports");
			then.status(401).body("{\"error\":\"token_expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/TSC/1.0/auth/refresh");
			then.status(500);
		})
		.await;

	let gateway: ReqwestTestGateway = Gateway::with_http_client(
		test_config(&server.base_url()),
		Arc::new(store),
		Arc::new(NoopEventSink),
		test_reqwest_http_client(),
	);
	let result = gateway.get("TSC/1.0/reports", RequestOptions::default()).await;

	assert!(result.handled);

	let reopened = FileSessionStore::open(&path).expect("Session file should reopen.");

	assert!(reopened.credentials().expect("Reopened session read should succeed.").is_none());

	fs::remove_file(&path).expect("Temporary session snapshot should be removable.");
}
