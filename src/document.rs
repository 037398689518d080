//! # Document Validation
//!
//! Builds the typed IR from a parsed raw document (a mapping-of-maps of
//! native JSON values — the YAML/text front-end is an external concern).
//!
//! Validation is error-accumulating, not fail-fast: every structural
//! problem (missing exchange id, malformed capability value, unknown
//! parameter type, unresolved endpoint source) is collected into the
//! returned [`Diagnostics`]. Only input that is not shaped like a document
//! at all — a non-mapping root — suppresses the IR.

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::expr::{is_array_operation, validate_array_operation};
use crate::ir::*;
use indexmap::IndexMap;
use serde_json::Value;

/// Capability keys the taxonomy knows about. Unknown keys warn with a
/// nearest-key suggestion since they are usually typos.
pub const KNOWN_CAPABILITIES: [&str; 34] = [
    "spot",
    "margin",
    "swap",
    "future",
    "option",
    "index",
    "fetchMarkets",
    "fetchCurrencies",
    "fetchTicker",
    "fetchTickers",
    "fetchOrderBook",
    "fetchOrderBooks",
    "fetchTrades",
    "fetchOHLCV",
    "fetchBalance",
    "fetchStatus",
    "fetchTime",
    "createOrder",
    "createOrders",
    "cancelOrder",
    "cancelOrders",
    "cancelAllOrders",
    "editOrder",
    "fetchOrder",
    "fetchOrders",
    "fetchOpenOrders",
    "fetchClosedOrders",
    "fetchMyTrades",
    "fetchDepositAddress",
    "fetchDeposits",
    "fetchWithdrawals",
    "withdraw",
    "fetchFundingRate",
    "fetchPositions",
];

/// Capabilities a complete exchange definition is expected to declare.
const EXPECTED_CAPABILITIES: [&str; 3] = ["fetchTicker", "fetchOrderBook", "fetchTrades"];

/// Builds a [`Document`] from a raw value, accumulating diagnostics.
/// Returns `None` for the document only when the root is structurally
/// unusable.
pub fn build_document(raw: &Value, diags: &mut Diagnostics) -> Option<Document> {
    let root = match raw.as_object() {
        Some(obj) => obj,
        None => {
            diags.error("document root must be a mapping");
            return None;
        }
    };

    let mut doc = Document::default();

    let exchange_value = root.get("exchange");
    let exchange = exchange_value.and_then(Value::as_object);
    if exchange_value.is_some() && exchange.is_none() {
        diags.error("exchange section must be a mapping");
    }

    if let Some(exchange) = exchange {
        doc.exchange.id = match exchange.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                diags.error("exchange id is required");
                String::new()
            }
        };
        doc.exchange.name = exchange
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&doc.exchange.id)
            .to_string();
        doc.exchange.countries = exchange
            .get("countries")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        doc.exchange.rate_limit = exchange
            .get("rateLimit")
            .or_else(|| exchange.get("rate_limit"))
            .and_then(Value::as_u64);
        doc.exchange.version = exchange
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);
    } else {
        diags.error("exchange id is required");
    }

    // Legacy alias: a root-level has: table merges under the exchange, with
    // the exchange-scoped table winning per key
    let mut raw_has: IndexMap<String, Value> = IndexMap::new();
    if let Some(top) = root.get("has").and_then(Value::as_object) {
        for (key, value) in top {
            raw_has.insert(key.clone(), value.clone());
        }
    }
    if let Some(scoped) = exchange
        .and_then(|e| e.get("has"))
        .and_then(Value::as_object)
    {
        for (key, value) in scoped {
            raw_has.insert(key.clone(), value.clone());
        }
    }
    doc.has = build_has_table(&raw_has, diags);

    for expected in EXPECTED_CAPABILITIES {
        if !doc.has.contains_key(expected) {
            diags.warning(format!("expected capability '{}' is not declared", expected));
        }
    }

    if let Some(urls) = root.get("urls").and_then(Value::as_object) {
        doc.urls = urls
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
    }

    if let Some(creds) = root
        .get("requiredCredentials")
        .or_else(|| root.get("required_credentials"))
        .and_then(Value::as_object)
    {
        for (name, value) in creds {
            doc.required_credentials
                .insert(name.clone(), value.as_bool().unwrap_or(false));
        }
    }

    if let Some(auth) = root.get("auth").and_then(Value::as_object) {
        let strategy = auth
            .get("strategy")
            .or_else(|| auth.get("type"))
            .and_then(Value::as_str);
        match strategy {
            Some(strategy) => {
                let settings = auth
                    .iter()
                    .filter(|(k, _)| k.as_str() != "strategy" && k.as_str() != "type")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                doc.auth = Some(AuthConfig {
                    strategy: strategy.to_string(),
                    settings,
                });
            }
            None => diags.error("auth section requires a strategy"),
        }
    }

    if let Some(api) = root.get("api") {
        doc.api = build_api(api, diags);
    }

    if let Some(parsers) = root.get("parsers").and_then(Value::as_object) {
        for (name, value) in parsers {
            if let Some(parser) = build_parser(name, value, &doc.api, diags) {
                doc.parsers.insert(name.clone(), parser);
            }
        }
    }

    if let Some(ws) = root.get("ws").and_then(Value::as_object) {
        for (name, value) in ws {
            doc.ws.insert(name.clone(), build_ws_channel(name, value, diags));
        }
    }

    log::debug!(
        "document '{}': {} api categories, {} parsers, {} capabilities",
        doc.exchange.id,
        doc.api.categories.len(),
        doc.parsers.len(),
        doc.has.len()
    );

    Some(doc)
}

fn build_has_table(
    raw: &IndexMap<String, Value>,
    diags: &mut Diagnostics,
) -> IndexMap<String, HasFlagValue> {
    let mut table = IndexMap::new();
    for (key, value) in raw {
        if !KNOWN_CAPABILITIES.contains(&key.as_str()) {
            let mut warning = Diagnostic::warning(format!("unknown capability key '{}'", key));
            if let Some(suggestion) = nearest_capability(key) {
                warning = warning.with_help(format!("did you mean '{}'?", suggestion));
            }
            diags.push(warning);
        }
        match parse_has_flag(value) {
            Some(flag) => {
                table.insert(key.clone(), flag);
            }
            None => diags.error(format!("malformed capability value for '{}'", key)),
        }
    }
    table
}

/// Parses one capability value. `None` means the shape is not a legal flag.
pub fn parse_has_flag(value: &Value) -> Option<HasFlagValue> {
    match value {
        Value::Bool(b) => Some(HasFlagValue::Bool(*b)),
        Value::Null => Some(HasFlagValue::Null),
        Value::String(s) if s == "emulated" => Some(HasFlagValue::Emulated),
        Value::Object(obj) => {
            let mut overrides = MarketOverrides::default();
            for (key, inner) in obj {
                let parsed = Box::new(parse_has_flag(inner)?);
                match key.as_str() {
                    "default" => overrides.default = Some(parsed),
                    "spot" => overrides.spot = Some(parsed),
                    "margin" => overrides.margin = Some(parsed),
                    "swap" => overrides.swap = Some(parsed),
                    "future" => overrides.future = Some(parsed),
                    "option" => overrides.option = Some(parsed),
                    "index" => overrides.index = Some(parsed),
                    _ => return None,
                }
            }
            Some(HasFlagValue::PerMarket(overrides))
        }
        _ => None,
    }
}

/// Nearest known capability key within a small edit distance.
pub fn nearest_capability(key: &str) -> Option<&'static str> {
    KNOWN_CAPABILITIES
        .iter()
        .map(|known| (edit_distance(key, known), *known))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, known)| known)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut previous = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous + usize::from(ca != cb);
            previous = row[j + 1];
            row[j + 1] = substitution.min(previous + 1).min(row[j] + 1);
        }
    }
    row[b.len()]
}

fn build_api(value: &Value, diags: &mut Diagnostics) -> ApiDefinition {
    let mut api = ApiDefinition::default();
    let categories = match value.as_object() {
        Some(obj) => obj,
        None => {
            diags.error("api section must be a mapping");
            return api;
        }
    };

    for (category_name, category_value) in categories {
        let mut category = ApiCategory::default();
        let methods = match category_value.as_object() {
            Some(obj) => obj,
            None => {
                diags.error(format!("api category '{}' must be a mapping", category_name));
                continue;
            }
        };
        for (method_name, endpoints_value) in methods {
            let table = match category.method_mut(method_name) {
                Some(table) => table,
                None => {
                    diags.error(format!(
                        "unknown HTTP method '{}' in api category '{}'",
                        method_name, category_name
                    ));
                    continue;
                }
            };
            let endpoints = match endpoints_value.as_object() {
                Some(obj) => obj,
                None => {
                    diags.error(format!(
                        "endpoint table '{}.{}' must be a mapping",
                        category_name, method_name
                    ));
                    continue;
                }
            };
            for (endpoint_name, endpoint_value) in endpoints {
                let endpoint = build_endpoint(
                    &format!("{}.{}.{}", category_name, method_name, endpoint_name),
                    endpoint_value,
                    diags,
                );
                table.insert(endpoint_name.clone(), endpoint);
            }
        }
        api.categories.insert(category_name.clone(), category);
    }
    api
}

fn build_endpoint(context: &str, value: &Value, diags: &mut Diagnostics) -> EndpointDefinition {
    let mut endpoint = EndpointDefinition::default();
    match value {
        // String shorthand: the request path
        Value::String(path) => {
            endpoint.path = Some(path.clone());
        }
        Value::Null => {}
        Value::Object(obj) => {
            endpoint.path = obj.get("path").and_then(Value::as_str).map(str::to_string);
            endpoint.cost = obj.get("cost").and_then(Value::as_f64);
            if let Some(rate) = obj
                .get("rateLimit")
                .or_else(|| obj.get("rate_limit"))
                .and_then(Value::as_object)
            {
                endpoint.rate_limit = Some(RateLimitOverride {
                    cost: rate.get("cost").and_then(Value::as_f64),
                    limit: rate.get("limit").and_then(Value::as_u64),
                    interval: rate
                        .get("interval")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
            if let Some(params) = obj.get("params").and_then(Value::as_object) {
                for (param_name, param_value) in params {
                    let param = build_param(context, param_name, param_value, diags);
                    endpoint.params.insert(param_name.clone(), param);
                }
            }
        }
        _ => diags.error(format!("endpoint '{}' must be a mapping or path string", context)),
    }
    endpoint
}

fn build_param(
    context: &str,
    name: &str,
    value: &Value,
    diags: &mut Diagnostics,
) -> ParamDefinition {
    let mut param = ParamDefinition::default();

    let obj = match value {
        // String shorthand: just the type
        Value::String(type_name) => {
            match ParamType::parse(type_name) {
                Some(param_type) => param.param_type = param_type,
                None => diags.error(format!(
                    "unknown parameter type '{}' for parameter '{}' in '{}'",
                    type_name, name, context
                )),
            }
            return param;
        }
        Value::Object(obj) => obj,
        _ => {
            diags.error(format!(
                "parameter '{}' in '{}' must be a mapping or type string",
                name, context
            ));
            return param;
        }
    };

    if let Some(type_name) = obj.get("type").and_then(Value::as_str) {
        match ParamType::parse(type_name) {
            Some(param_type) => param.param_type = param_type,
            None => diags.error(format!(
                "unknown parameter type '{}' for parameter '{}' in '{}'",
                type_name, name, context
            )),
        }
    }
    param.required = obj.get("required").and_then(Value::as_bool).unwrap_or(false);
    param.required_if = obj
        .get("required_if")
        .and_then(Value::as_str)
        .map(str::to_string);
    param.default = obj.get("default").cloned();
    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        param.enum_values = values.clone();
    }
    if let Some(alias) = obj.get("alias").and_then(Value::as_str) {
        param.aliases.push(alias.to_string());
    }
    if let Some(aliases) = obj.get("aliases").and_then(Value::as_array) {
        param.aliases.extend(
            aliases
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string),
        );
    }
    if let Some(location) = obj
        .get("location")
        .or_else(|| obj.get("in"))
        .and_then(Value::as_str)
    {
        match ParamLocation::parse(location) {
            Some(parsed) => param.location = parsed,
            None => diags.error(format!(
                "unknown parameter location '{}' for parameter '{}' in '{}'",
                location, name, context
            )),
        }
    }
    if let Some(deps) = obj
        .get("depends_on")
        .or_else(|| obj.get("dependsOn"))
        .and_then(Value::as_array)
    {
        param.depends_on = deps
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    param.validate = obj.get("validate").and_then(Value::as_str).map(str::to_string);
    param.transform = obj
        .get("transform")
        .and_then(Value::as_str)
        .map(str::to_string);
    param
}

fn build_parser(
    name: &str,
    value: &Value,
    api: &ApiDefinition,
    diags: &mut Diagnostics,
) -> Option<ParserDefinition> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            diags.error(format!("parser '{}' must be a mapping", name));
            return None;
        }
    };

    let mut parser = ParserDefinition::default();
    match obj.get("source").and_then(Value::as_str) {
        Some(source) => {
            parser.source = source.to_string();
            if resolve_source(api, source).is_none() {
                diags.error(format!(
                    "parser '{}': unresolved endpoint source '{}'",
                    name, source
                ));
            }
        }
        None => diags.error(format!("parser '{}' requires a source", name)),
    }
    parser.path = obj.get("path").and_then(Value::as_str).map(str::to_string);

    if let Some(iterator) = obj.get("iterator").and_then(Value::as_str) {
        match IteratorMode::parse(iterator) {
            Some(mode) => parser.iterator = mode,
            None => diags.error(format!(
                "parser '{}': unknown iterator mode '{}'",
                name, iterator
            )),
        }
    }

    if let Some(mapping) = obj.get("mapping").and_then(Value::as_object) {
        for (field, field_value) in mapping {
            if let Some(parsed) = build_field_mapping(name, field, field_value, diags) {
                parser.mapping.insert(field.clone(), parsed);
            }
        }
    }

    Some(parser)
}

fn build_field_mapping(
    parser: &str,
    field: &str,
    value: &Value,
    diags: &mut Diagnostics,
) -> Option<FieldMapping> {
    let obj = match value {
        // String shorthand: a path extraction
        Value::String(path) => {
            return Some(FieldMapping::Path {
                path: path.clone(),
                transform: None,
                default: None,
            });
        }
        Value::Object(obj) => obj,
        other => {
            // Bare scalars read as literals
            return Some(FieldMapping::Literal(other.clone()));
        }
    };

    let transform = obj
        .get("transform")
        .and_then(Value::as_str)
        .map(str::to_string);
    let variants = ["literal", "path", "from_context", "fromContext", "compute"]
        .iter()
        .filter(|key| obj.contains_key(**key))
        .count();
    if variants != 1 {
        diags.error(format!(
            "parser '{}': field '{}' must have exactly one of literal, path, from_context, compute",
            parser, field
        ));
        return None;
    }

    if let Some(literal) = obj.get("literal") {
        return Some(FieldMapping::Literal(literal.clone()));
    }
    if let Some(path) = obj.get("path").and_then(Value::as_str) {
        return Some(FieldMapping::Path {
            path: path.to_string(),
            transform,
            default: obj.get("default").cloned(),
        });
    }
    if let Some(context_name) = obj
        .get("from_context")
        .or_else(|| obj.get("fromContext"))
        .and_then(Value::as_str)
    {
        return Some(FieldMapping::FromContext {
            name: context_name.to_string(),
            transform,
        });
    }
    if let Some(expr) = obj.get("compute").and_then(Value::as_str) {
        let deps = obj
            .get("deps")
            .or_else(|| obj.get("dependencies"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        return Some(FieldMapping::Compute {
            expr: expr.to_string(),
            deps,
        });
    }

    diags.error(format!(
        "parser '{}': field '{}' has a malformed mapping value",
        parser, field
    ));
    None
}

fn build_ws_channel(name: &str, value: &Value, diags: &mut Diagnostics) -> WsChannel {
    let mut channel = WsChannel::default();
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return channel,
    };
    channel.topic = obj.get("topic").and_then(Value::as_str).map(str::to_string);
    channel.parser = obj.get("parser").and_then(Value::as_str).map(str::to_string);
    for (key, setting) in obj {
        if key == "topic" || key == "parser" {
            continue;
        }
        // Embedded array operations validate here so a malformed transform
        // surfaces at compile time
        if is_array_operation(setting) {
            for message in validate_array_operation(setting) {
                diags.error(format!("ws channel '{}': {}", name, message));
            }
        }
        channel.settings.insert(key.clone(), setting.clone());
    }
    channel
}

/// A resolved endpoint reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    pub category: String,
    pub method: String,
    pub endpoint: String,
}

/// Resolves a parser `source` against the API table. Accepts dot- and
/// slash-separated forms (`public.get.ticker`, `public/get/ticker`),
/// two-part forms searched across HTTP methods (`public.ticker`), and
/// category-prefixed camelCase forms (`publicGetTicker`).
pub fn resolve_source(api: &ApiDefinition, source: &str) -> Option<EndpointRef> {
    let parts: Vec<&str> = if source.contains('/') {
        source.split('/').collect()
    } else {
        source.split('.').collect()
    };

    match parts.as_slice() {
        [category, method, endpoint] => {
            let table = api.categories.get(*category)?.method(method)?;
            table.contains_key(*endpoint).then(|| EndpointRef {
                category: category.to_string(),
                method: method.to_string(),
                endpoint: endpoint.to_string(),
            })
        }
        [category, endpoint] => {
            let cat = api.categories.get(*category)?;
            HTTP_METHODS.iter().find_map(|method| {
                cat.method(method)?.contains_key(*endpoint).then(|| EndpointRef {
                    category: category.to_string(),
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                })
            })
        }
        [single] => resolve_camel_case(api, single),
        _ => None,
    }
}

/// Resolves `publicGetTicker`-style references: a defined category name,
/// followed by a capitalized HTTP method, followed by the endpoint name.
fn resolve_camel_case(api: &ApiDefinition, source: &str) -> Option<EndpointRef> {
    for (category_name, category) in &api.categories {
        let Some(rest) = source.strip_prefix(category_name.as_str()) else {
            continue;
        };
        for method in HTTP_METHODS {
            let capitalized = capitalize(method);
            let Some(endpoint_part) = rest.strip_prefix(capitalized.as_str()) else {
                continue;
            };
            if endpoint_part.is_empty() {
                continue;
            }
            let endpoint = decapitalize(endpoint_part);
            let table = category.method(method).expect("method from the closed set");
            if table.contains_key(&endpoint) {
                return Some(EndpointRef {
                    category: category_name.clone(),
                    method: method.to_string(),
                    endpoint,
                });
            }
        }
    }
    None
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
