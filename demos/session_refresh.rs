//! Demonstrates logging in, recovering from an expired access token through the coordinated
//! refresh, and reacting to gateway events, all against a local mock backend.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use request_gateway::{
	config::{ApiTarget, GatewayConfig},
	event::{EventBus, EventSink},
	gateway::Gateway,
	request::RequestOptions,
	session::{MemorySessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/mock/api/TSC/1.0/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"Response\":\"success\",\"Data\":{\"user_id\":2,\"fullname\":\"Admin\",\"user_roles\":[\"ADMIN\"],\"login_time\":\"2025-08-24 10:02:33\",\"tokens\":{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":1800,\"token_type\":\"Bearer\"}}}",
			);
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/mock/api/TSC/1.0/sensors/status")
				.header("authorization", "Bearer demo-access");
			then.status(401).body("{\"error\":\"token_expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/mock/api/TSC/1.0/auth/refresh")
				.header("authorization", "Bearer demo-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Data\":{\"access_token\":\"demo-rotated\",\"expires_in\":1800}}");
		})
		.await;
	let status_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/mock/api/TSC/1.0/sensors/status")
				.header("authorization", "Bearer demo-rotated");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Response\":\"ok\",\"Data\":{\"online\":12}}");
		})
		.await;
	let config = GatewayConfig::builder(ApiTarget::Mock { origin: Url::parse(&server.base_url())? })
		.login_path("TSC/1.0/auth/login")
		.logout_path("TSC/1.0/auth/logout")
		.build()?;
	let session = Arc::new(MemorySessionStore::default());
	let bus = EventBus::default();

	bus.subscribe(|event| println!("Gateway event: {event}."));

	let events: Arc<dyn EventSink> = Arc::new(bus);
	let gateway = Gateway::new(config, session.clone(), events)?;
	let user = gateway.login("admin", "demo-password").await?;

	println!("Logged in as {} with roles {:?}.", user.fullname, user.user_roles);

	let status =
		gateway.get("TSC/1.0/sensors/status", RequestOptions::default()).await.into_result()?;

	println!("Sensor status after refresh: {:?}.", status.into_data_payload().data);
	println!("Refresh attempts so far: {}.", gateway.refresh.metrics().attempts());

	gateway.logout(true).await?;

	println!("Session cleared: {}.", session.credentials()?.is_none());

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	status_mock.assert_async().await;

	Ok(())
}
