#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_autorefresh::{
	_preludet::*,
	authority::{OAuth2Authority, TokenAuthority},
	config::{ClientAuthMethod, ConnectionConfig},
	error::AuthError,
};

const TOKEN_PATH: &str = "/v2/token";

async fn mock_full_renewal<'a>(
	server: &'a MockServer,
	access: &str,
	refresh: Option<&str>,
) -> httpmock::Mock<'a> {
	let body = token_response_body(access, refresh);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

async fn mock_refresh<'a>(
	server: &'a MockServer,
	expected_refresh: &str,
	access: &str,
	rotated_refresh: Option<&str>,
) -> httpmock::Mock<'a> {
	let body = token_response_body(access, rotated_refresh);
	let expected_refresh = expected_refresh.to_owned();

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", expected_refresh);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

fn current_access_token(authority: &OAuth2Authority) -> Option<String> {
	authority.access_token().map(|token| token.expose().to_owned())
}

#[tokio::test]
async fn connect_requests_initial_pair_with_client_credentials() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("scope", "data_extensions_read")
				.form_urlencoded_tuple("account_id", "5150");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body("access-initial", Some("refresh-initial")));
		})
		.await;
	let config = ConnectionConfig::builder(TEST_CLIENT_ID)
		.client_secret(TEST_CLIENT_SECRET)
		.auth_endpoint(Url::parse(&server.url(TOKEN_PATH))?)
		.scope("data_extensions_read")
		.extra_param("account_id", "5150")
		.build()?;
	let authority = connect_test_authority(config).await;

	mock.assert_async().await;
	assert_eq!(current_access_token(&authority).as_deref(), Some("access-initial"));
	assert!(authority.has_refresh_token());
	assert!(authority.access_token_expires_at().is_some());

	Ok(())
}

#[tokio::test]
async fn client_secret_post_sends_credentials_in_body() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("client_secret", TEST_CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body("access-post", Some("refresh-post")));
		})
		.await;
	let config = ConnectionConfig::builder(TEST_CLIENT_ID)
		.client_secret(TEST_CLIENT_SECRET)
		.auth_endpoint(Url::parse(&server.url(TOKEN_PATH))?)
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.build()?;

	connect_test_authority(config).await;
	mock.assert_async().await;

	Ok(())
}

#[tokio::test]
async fn refresh_keeps_refresh_token_when_not_rotated() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let initial = mock_full_renewal(&server, "access-initial", Some("refresh-initial")).await;
	let refresh = mock_refresh(&server, "refresh-initial", "access-refreshed", None).await;
	let authority = connect_test_authority(test_connection_config(&server.url(TOKEN_PATH))).await;

	for _ in 0..2 {
		let token = authority.refresh_access_token().await?;

		assert_eq!(token.expose(), "access-refreshed");
	}

	initial.assert_calls_async(1).await;
	refresh.assert_calls_async(2).await;
	assert!(authority.has_refresh_token());

	Ok(())
}

#[tokio::test]
async fn refresh_follows_rotated_refresh_token() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let _initial = mock_full_renewal(&server, "access-initial", Some("refresh-initial")).await;
	let first =
		mock_refresh(&server, "refresh-initial", "access-first", Some("refresh-rotated")).await;
	let second = mock_refresh(&server, "refresh-rotated", "access-second", None).await;
	let authority = connect_test_authority(test_connection_config(&server.url(TOKEN_PATH))).await;

	assert_eq!(authority.refresh_access_token().await?.expose(), "access-first");
	assert_eq!(authority.refresh_access_token().await?.expose(), "access-second");
	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn full_renewal_replaces_both_secrets() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let initial = mock_full_renewal(&server, "access-initial", Some("refresh-initial")).await;
	let authority = connect_test_authority(test_connection_config(&server.url(TOKEN_PATH))).await;

	initial.delete_async().await;

	let renewed = mock_full_renewal(&server, "access-renewed", Some("refresh-renewed")).await;
	let refresh = mock_refresh(&server, "refresh-renewed", "access-after", None).await;

	authority.request_full_renewal().await?;
	assert_eq!(current_access_token(&authority).as_deref(), Some("access-renewed"));
	assert_eq!(authority.refresh_access_token().await?.expose(), "access-after");
	renewed.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn invalid_grant_maps_to_auth_error() {
	let server = MockServer::start_async().await;
	let _initial = mock_full_renewal(&server, "access-initial", Some("refresh-initial")).await;
	let _refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Refresh token expired.\"}",
			);
		})
		.await;
	let authority = connect_test_authority(test_connection_config(&server.url(TOKEN_PATH))).await;
	let err =
		authority.refresh_access_token().await.expect_err("Expired refresh token should fail.");

	match err {
		AuthError::InvalidGrant { reason } => assert!(reason.contains("Refresh token expired.")),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn rejected_client_fails_to_connect() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = OAuth2Authority::with_http_client(
		test_connection_config(&server.url(TOKEN_PATH)),
		test_reqwest_client(),
	)
	.await
	.expect_err("Rejected credentials should fail to connect.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidClient { .. })));
}

#[tokio::test]
async fn refresh_without_refresh_token_never_hits_endpoint() {
	let server = MockServer::start_async().await;
	let _initial = mock_full_renewal(&server, "access-initial", None).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body("access-unexpected", None));
		})
		.await;
	let authority = connect_test_authority(test_connection_config(&server.url(TOKEN_PATH))).await;
	let err = authority.refresh_access_token().await.expect_err("Refresh should require a token.");

	assert!(matches!(err, AuthError::MissingRefreshToken));
	assert!(!authority.has_refresh_token());
	refresh.assert_calls_async(0).await;
}
