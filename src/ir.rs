//! # Intermediate Representation
//!
//! Typed, immutable structures for a validated EDL document. The IR carries
//! no behavior beyond invariants: it is constructed once by document
//! validation ([`crate::document`]) and consumed read-only by the dependency
//! resolver and the code generator.
//!
//! Key ordering is semantic throughout: API tables and field mappings use
//! [`IndexMap`] so that generated output is byte-stable and the dependency
//! resolver can tie-break on definition order.
//!
//! ## Example
//!
//! ```rust
//! use edlc::ir::{FieldMapping, IteratorMode};
//!
//! let mapping = FieldMapping::Compute {
//!     expr: "({last} - {open}) / {open}".to_string(),
//!     deps: Vec::new(),
//! };
//! assert!(matches!(mapping, FieldMapping::Compute { .. }));
//! assert_eq!(IteratorMode::default(), IteratorMode::None);
//! ```

use indexmap::IndexMap;
use serde_json::Value;

/// A fully validated EDL document.
///
/// Owned exclusively by the compile call that produced it; never mutated
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub exchange: ExchangeMeta,
    /// Capability table, canonical location after legacy-alias merging
    pub has: IndexMap<String, HasFlagValue>,
    pub urls: IndexMap<String, Value>,
    /// Credential names the exchange requires (apiKey, secret, ...)
    pub required_credentials: IndexMap<String, bool>,
    pub auth: Option<AuthConfig>,
    pub api: ApiDefinition,
    pub parsers: IndexMap<String, ParserDefinition>,
    /// Websocket channel table, carried through as metadata
    pub ws: IndexMap<String, WsChannel>,
}

/// Exchange identity block.
#[derive(Debug, Clone, Default)]
pub struct ExchangeMeta {
    pub id: String,
    pub name: String,
    pub countries: Vec<String>,
    /// Default request cost interval in milliseconds
    pub rate_limit: Option<u64>,
    pub version: Option<String>,
}

/// Authentication configuration (strategy name plus free-form settings).
///
/// The strategy catalog itself is an external lookup table; the compiler
/// only threads the configuration through to the generated `sign` stub.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub strategy: String,
    pub settings: IndexMap<String, Value>,
}

/// Category name -> per-HTTP-method endpoint tables.
#[derive(Debug, Clone, Default)]
pub struct ApiDefinition {
    pub categories: IndexMap<String, ApiCategory>,
}

/// The HTTP methods an endpoint table distinguishes, in emission order.
pub const HTTP_METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

/// One API category (e.g. `public`, `private`): endpoint tables keyed by
/// endpoint name, per HTTP method. Endpoint names are unique within
/// (category, method).
#[derive(Debug, Clone, Default)]
pub struct ApiCategory {
    pub get: IndexMap<String, EndpointDefinition>,
    pub post: IndexMap<String, EndpointDefinition>,
    pub put: IndexMap<String, EndpointDefinition>,
    pub delete: IndexMap<String, EndpointDefinition>,
    pub patch: IndexMap<String, EndpointDefinition>,
}

impl ApiCategory {
    /// Endpoint table for an HTTP method name, if it is one we model.
    pub fn method(&self, method: &str) -> Option<&IndexMap<String, EndpointDefinition>> {
        match method {
            "get" => Some(&self.get),
            "post" => Some(&self.post),
            "put" => Some(&self.put),
            "delete" => Some(&self.delete),
            "patch" => Some(&self.patch),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, method: &str) -> Option<&mut IndexMap<String, EndpointDefinition>> {
        match method {
            "get" => Some(&mut self.get),
            "post" => Some(&mut self.post),
            "put" => Some(&mut self.put),
            "delete" => Some(&mut self.delete),
            "patch" => Some(&mut self.patch),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.get.is_empty()
            && self.post.is_empty()
            && self.put.is_empty()
            && self.delete.is_empty()
            && self.patch.is_empty()
    }
}

/// One declared endpoint.
#[derive(Debug, Clone, Default)]
pub struct EndpointDefinition {
    /// Request path; defaults to the endpoint name when absent
    pub path: Option<String>,
    /// Request cost in rate-limit units
    pub cost: Option<f64>,
    pub rate_limit: Option<RateLimitOverride>,
    pub params: IndexMap<String, ParamDefinition>,
}

/// Per-endpoint rate-limit override.
#[derive(Debug, Clone, Default)]
pub struct RateLimitOverride {
    pub cost: Option<f64>,
    pub limit: Option<u64>,
    pub interval: Option<String>,
}

/// Declared type of a request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    /// Millisecond timestamp
    Timestamp,
    /// Second-resolution timestamp
    TimestampSeconds,
    Object,
    Array,
}

impl ParamType {
    /// Parses the EDL spelling of a parameter type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ParamType::String),
            "int" | "integer" => Some(ParamType::Int),
            "float" | "number" => Some(ParamType::Float),
            "bool" | "boolean" => Some(ParamType::Bool),
            "timestamp" | "timestamp_ms" => Some(ParamType::Timestamp),
            "timestamp_s" | "timestamp_seconds" => Some(ParamType::TimestampSeconds),
            "object" => Some(ParamType::Object),
            "array" => Some(ParamType::Array),
            _ => None,
        }
    }
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamLocation {
    #[default]
    Query,
    Body,
    Path,
    Header,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(ParamLocation::Query),
            "body" => Some(ParamLocation::Body),
            "path" => Some(ParamLocation::Path),
            "header" => Some(ParamLocation::Header),
            _ => None,
        }
    }
}

/// One request parameter rule.
#[derive(Debug, Clone)]
pub struct ParamDefinition {
    pub param_type: ParamType,
    pub required: bool,
    /// Boolean expression making the parameter conditionally required
    pub required_if: Option<String>,
    pub default: Option<Value>,
    /// Allowed literal values
    pub enum_values: Vec<Value>,
    /// Alternative spellings accepted for this parameter
    pub aliases: Vec<String>,
    pub location: ParamLocation,
    /// Other parameter names this one's validity depends on
    pub depends_on: Vec<String>,
    pub validate: Option<String>,
    pub transform: Option<String>,
}

impl Default for ParamDefinition {
    fn default() -> Self {
        Self {
            param_type: ParamType::String,
            required: false,
            required_if: None,
            default: None,
            enum_values: Vec::new(),
            aliases: Vec::new(),
            location: ParamLocation::default(),
            depends_on: Vec::new(),
            validate: None,
            transform: None,
        }
    }
}

/// How a parser iterates its source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IteratorMode {
    /// Single-record build, no iteration
    #[default]
    None,
    /// Iterate a sequence, coercing non-array sources
    Array,
    /// Iterate an object's key/value pairs
    Entries,
}

impl IteratorMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(IteratorMode::None),
            "array" => Some(IteratorMode::Array),
            "entries" => Some(IteratorMode::Entries),
            _ => None,
        }
    }
}

/// One parser definition: where the raw data comes from and how each output
/// field is produced.
#[derive(Debug, Clone, Default)]
pub struct ParserDefinition {
    /// Endpoint reference, dot-, slash-, or category-prefixed
    pub source: String,
    /// Extraction path into the raw response
    pub path: Option<String>,
    pub iterator: IteratorMode,
    /// Ordered output-field rules; insertion order is the dependency
    /// tie-break
    pub mapping: IndexMap<String, FieldMapping>,
}

/// How one output field is produced. Exactly one variant per mapping entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMapping {
    /// A constant value
    Literal(Value),
    /// Extraction from the item being parsed
    Path {
        path: String,
        transform: Option<String>,
        default: Option<Value>,
    },
    /// A variable from the surrounding parse context (market, key, value...)
    FromContext {
        name: String,
        transform: Option<String>,
    },
    /// A placeholder-interpolated expression over sibling fields
    Compute {
        expr: String,
        /// Explicit dependency names, unioned with extracted references
        deps: Vec<String>,
    },
}

impl FieldMapping {
    pub fn is_compute(&self) -> bool {
        matches!(self, FieldMapping::Compute { .. })
    }
}

/// Resolved value of one capability flag.
#[derive(Debug, Clone, PartialEq)]
pub enum HasFlagValue {
    Bool(bool),
    /// Explicitly unsupported, distinct from unknown
    Null,
    /// Supported via client-side emulation, not a native API capability
    Emulated,
    PerMarket(MarketOverrides),
}

/// Per-market-type capability overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketOverrides {
    /// Fallback when a specific market type is unspecified
    pub default: Option<Box<HasFlagValue>>,
    pub spot: Option<Box<HasFlagValue>>,
    pub margin: Option<Box<HasFlagValue>>,
    pub swap: Option<Box<HasFlagValue>>,
    pub future: Option<Box<HasFlagValue>>,
    pub option: Option<Box<HasFlagValue>>,
    pub index: Option<Box<HasFlagValue>>,
}

/// The market-type keys an override object may carry, in emission order.
pub const MARKET_TYPES: [&str; 6] = ["spot", "margin", "swap", "future", "option", "index"];

impl MarketOverrides {
    pub fn get(&self, market_type: &str) -> Option<&HasFlagValue> {
        let slot = match market_type {
            "spot" => &self.spot,
            "margin" => &self.margin,
            "swap" => &self.swap,
            "future" => &self.future,
            "option" => &self.option,
            "index" => &self.index,
            _ => return None,
        };
        slot.as_deref()
    }
}

/// One websocket channel declaration, carried through as metadata.
#[derive(Debug, Clone, Default)]
pub struct WsChannel {
    pub topic: Option<String>,
    pub parser: Option<String>,
    pub settings: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_type_spellings() {
        assert_eq!(ParamType::parse("integer"), Some(ParamType::Int));
        assert_eq!(ParamType::parse("timestamp_ms"), Some(ParamType::Timestamp));
        assert_eq!(ParamType::parse("nope"), None);
    }

    #[test]
    fn market_override_lookup() {
        let overrides = MarketOverrides {
            spot: Some(Box::new(HasFlagValue::Bool(true))),
            ..Default::default()
        };
        assert_eq!(overrides.get("spot"), Some(&HasFlagValue::Bool(true)));
        assert_eq!(overrides.get("swap"), None);
        assert_eq!(overrides.get("not-a-market"), None);
    }

    #[test]
    fn api_category_method_lookup_rejects_unknown() {
        let cat = ApiCategory::default();
        assert!(cat.method("get").is_some());
        assert!(cat.method("options").is_none());
        assert!(cat.is_empty());
    }
}
