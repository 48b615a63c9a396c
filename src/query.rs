//! Named-resource lookups over a pluggable backing service.
//!
//! [`QueryFacade::lookup_named_resource`] turns a resource name into a `Name=<name>` equality
//! [`Filter`] and hands it to a [`ResourceService`]. The facade holds no state of its own.

#[cfg(feature = "reqwest")] pub mod http;

#[cfg(feature = "reqwest")] pub use http::HttpResourceService;

// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Field matched by [`QueryFacade::lookup_named_resource`].
pub const NAME_FIELD: &str = "Name";

/// Boxed future returned by [`ResourceService::retrieve`].
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Backing service that resolves a filter to at most one resource.
pub trait ResourceService
where
	Self: Send + Sync,
{
	/// Resource type produced by the service.
	type Resource: Send;

	/// Retrieves the first resource matching `filter`, or `None` when nothing matches.
	fn retrieve<'a>(&'a self, filter: &'a Filter) -> ServiceFuture<'a, Option<Self::Resource>>;
}

/// Single-field equality filter, rendered as `Field=value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
	field: String,
	value: String,
}
impl Filter {
	/// Builds a filter matching `field` equal to `value`.
	pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self { field: field.into(), value: value.into() }
	}

	/// Returns the filtered field name.
	pub fn field(&self) -> &str {
		&self.field
	}

	/// Returns the expected value.
	pub fn value(&self) -> &str {
		&self.value
	}
}
impl Display for Filter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}={}", self.field, self.value)
	}
}
impl FromStr for Filter {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (field, value) = s.split_once('=').ok_or_else(|| Error::InvalidArgument {
			reason: format!("filter `{s}` is not of the form Field=value"),
		})?;
		let field = field.trim();

		if field.is_empty() {
			return Err(Error::InvalidArgument { reason: format!("filter `{s}` names no field") });
		}

		Ok(Self::equals(field, value))
	}
}

/// Generic resource shape: a name, an optional external key, and every other attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
	/// Display name, matched by named lookups.
	#[serde(alias = "Name")]
	pub name: String,
	/// External key assigned by the service, when present.
	#[serde(default, alias = "CustomerKey", skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
	/// Remaining attributes, untouched.
	#[serde(flatten)]
	pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Stateless facade for retrieving resources by name.
#[derive(Clone, Debug)]
pub struct QueryFacade<S>
where
	S: ResourceService,
{
	service: S,
}
impl<S> QueryFacade<S>
where
	S: ResourceService,
{
	/// Wraps a backing service.
	pub fn new(service: S) -> Self {
		Self { service }
	}

	/// Returns the backing service.
	pub fn service(&self) -> &S {
		&self.service
	}

	/// Retrieves the resource whose name equals `name`.
	///
	/// Empty names are rejected with [`Error::InvalidArgument`] before the service is called;
	/// a lookup that matches nothing yields [`Error::NotFound`].
	pub async fn lookup_named_resource(&self, name: &str) -> Result<S::Resource> {
		const KIND: FlowKind = FlowKind::Lookup;

		if name.is_empty() {
			return Err(Error::InvalidArgument { reason: "resource name cannot be empty".into() });
		}

		let span = FlowSpan::new(KIND, "lookup_named_resource");
		let filter = Filter::equals(NAME_FIELD, name);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		obs::lookup_issued(&filter);

		let result = span
			.instrument(async {
				self.service
					.retrieve(&filter)
					.await?
					.ok_or_else(|| Error::NotFound { filter: filter.to_string() })
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
