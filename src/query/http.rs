//! reqwest-backed [`ResourceService`] authorized by an [`AutoRefreshClient`].

// std
use std::marker::PhantomData;
// crates.io
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	authority::TokenAuthority,
	error::ServiceError,
	lifecycle::AutoRefreshClient,
	query::{Filter, Resource, ResourceService, ServiceFuture},
};

const BODY_PREVIEW_CHARS: usize = 256;

#[derive(Deserialize)]
struct ResourcePage<R> {
	#[serde(default = "Vec::new")]
	items: Vec<R>,
}

/// Queries a REST collection with `GET <collection>?filter=Field=value`.
///
/// Every request first asks the lifecycle client for an access token, so forced renewals
/// happen transparently. The service expects `{"items": [...]}` and returns the first item;
/// an empty page or a `404` means no match.
pub struct HttpResourceService<A, R = Resource>
where
	A: ?Sized + TokenAuthority,
{
	client: Arc<AutoRefreshClient<A>>,
	http_client: ReqwestClient,
	collection: Url,
	_resource: PhantomData<fn() -> R>,
}
impl<A, R> HttpResourceService<A, R>
where
	A: ?Sized + TokenAuthority,
	R: 'static + Send + DeserializeOwned,
{
	/// Creates a service for `collection` with a default reqwest client.
	pub fn new(client: Arc<AutoRefreshClient<A>>, collection: Url) -> Self {
		Self::with_http_client(client, collection, ReqwestClient::default())
	}

	/// Creates a service for `collection` that reuses `http_client`.
	pub fn with_http_client(
		client: Arc<AutoRefreshClient<A>>,
		collection: Url,
		http_client: ReqwestClient,
	) -> Self {
		Self { client, http_client, collection, _resource: PhantomData }
	}

	/// Returns the queried collection URL.
	pub fn collection(&self) -> &Url {
		&self.collection
	}

	async fn fetch(&self, filter: &Filter) -> Result<Option<R>> {
		let token = self.client.refresh_access_token().await?;
		let response = self
			.http_client
			.get(self.collection.clone())
			.bearer_auth(token.expose())
			.query(&[("filter", filter.to_string())])
			.send()
			.await
			.map_err(ServiceError::transport)?;
		let status = response.status();

		if status == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let body = response.bytes().await.map_err(ServiceError::transport)?;

		if !status.is_success() {
			let message = String::from_utf8_lossy(&body).chars().take(BODY_PREVIEW_CHARS).collect();

			return Err(ServiceError::Status { status: status.as_u16(), message }.into());
		}

		let mut de = serde_json::Deserializer::from_slice(&body);
		let page: ResourcePage<R> = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ServiceError::Decode { source })?;

		Ok(page.items.into_iter().next())
	}
}
impl<A, R> ResourceService for HttpResourceService<A, R>
where
	A: ?Sized + TokenAuthority,
	R: 'static + Send + DeserializeOwned,
{
	type Resource = R;

	fn retrieve<'a>(&'a self, filter: &'a Filter) -> ServiceFuture<'a, Option<R>> {
		Box::pin(self.fetch(filter))
	}
}
impl<A, R> Debug for HttpResourceService<A, R>
where
	A: ?Sized + TokenAuthority,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpResourceService")
			.field("collection", &self.collection.as_str())
			.field("client", &self.client)
			.finish()
	}
}
