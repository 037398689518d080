//! # Code Generation Module
//!
//! Emits TypeScript exchange-client source from a validated [`Document`].
//!
//! Determinism is a hard requirement: given the same IR, the generator
//! produces byte-identical output on every call, because downstream
//! consumers diff generated text against checked-in reference output. All
//! iteration follows IR insertion order and nothing here touches a
//! hash-ordered container.
//!
//! Responsibilities:
//! - one `describe()` with exchange metadata, resolved capability flags,
//!   URL map and the api structure
//! - one async accessor per (category, method, endpoint) with required /
//!   enum / conditionally-required parameter checks ahead of the generic
//!   `request` delegation
//! - one parser function per parser definition, with the three iterator
//!   modes and compute fields assigned in resolved dependency order
//!
//! A parser whose dependency analysis reports a cycle is skipped with an
//! error diagnostic; the remaining parsers still compile.

use crate::diagnostic::Diagnostics;
use crate::document::{capitalize, resolve_source};
use crate::ir::*;
use crate::resolver;
use crate::template::Template;
use serde_json::Value;
use thiserror::Error;

/// Code generation errors. These are programming-contract violations; data
/// problems travel as diagnostics instead.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// Parser source did not resolve against the API table
    #[error("Unresolved endpoint source: {0}")]
    UnresolvedSource(String),
}

/// Generator configuration.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Emit doc comments above generated accessors
    pub include_comments: bool,
    /// Override the generated class name (defaults to the exchange id)
    pub class_name: Option<String>,
}

const INDENT: &str = "    ";

/// Transforms whose generated form reads a key directly off an object:
/// `this.safeNumber (data, 'lastPrice')`.
const DIRECT_ACCESS_TRANSFORMS: [&str; 6] = [
    "safeString",
    "safeNumber",
    "safeInteger",
    "safeTimestamp",
    "safeBoolean",
    "safeValue",
];

/// TypeScript source generator. Accumulates output lines and diagnostics;
/// one instance per compile call.
pub struct Generator {
    options: GeneratorOptions,
    lines: Vec<String>,
    diagnostics: Diagnostics,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Generates the full module for a document. The code is present iff no
    /// error diagnostic was produced.
    pub fn generate(mut self, doc: &Document) -> (Option<String>, Diagnostics) {
        let class_name = self
            .options
            .class_name
            .clone()
            .unwrap_or_else(|| doc.exchange.id.clone());

        self.push(0, "import Exchange from './base/Exchange.js';");
        self.push(0, "import type { Dict, Market } from './base/types.js';");
        self.blank();
        self.push(0, format!("export default class {} extends Exchange {{", class_name));

        self.generate_describe(doc);

        if let Some(auth) = &doc.auth {
            self.blank();
            self.generate_sign(auth);
        }

        for (category_name, category) in &doc.api.categories {
            for method in HTTP_METHODS {
                let table = category.method(method).expect("method from the closed set");
                for (endpoint_name, endpoint) in table {
                    self.blank();
                    self.generate_accessor(category_name, method, endpoint_name, endpoint);
                }
            }
        }

        for (parser_name, parser) in &doc.parsers {
            let analysis = resolver::analyze(&parser.mapping);
            if !analysis.cycles.is_empty() {
                for cycle in &analysis.cycles {
                    self.diagnostics.error(format!(
                        "parser '{}': cyclic compute dependency: {}",
                        parser_name,
                        cycle.join(" -> ")
                    ));
                }
                log::debug!("skipping parser '{}' due to cycle", parser_name);
                continue;
            }
            self.blank();
            if let Err(err) = self.generate_parser(parser_name, parser, doc, &analysis) {
                self.diagnostics
                    .error(format!("parser '{}': {}", parser_name, err));
            }
        }

        self.push(0, "}");

        let diagnostics = self.diagnostics;
        if diagnostics.success() {
            let mut code = self.lines.join("\n");
            code.push('\n');
            (Some(code), diagnostics)
        } else {
            (None, diagnostics)
        }
    }

    fn push(&mut self, depth: usize, text: impl AsRef<str>) {
        self.lines.push(format!("{}{}", INDENT.repeat(depth), text.as_ref()));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    // ------------------------------------------------------------------
    // describe()

    fn generate_describe(&mut self, doc: &Document) {
        self.blank();
        self.push(1, "describe () {");
        self.push(2, "return this.deepExtend (super.describe (), {");
        self.push(3, format!("'id': {},", quote(&doc.exchange.id)));
        self.push(3, format!("'name': {},", quote(&doc.exchange.name)));
        let countries = doc
            .exchange
            .countries
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        self.push(3, format!("'countries': [ {} ],", countries));
        if let Some(rate_limit) = doc.exchange.rate_limit {
            self.push(3, format!("'rateLimit': {},", rate_limit));
        }
        if let Some(version) = &doc.exchange.version {
            self.push(3, format!("'version': {},", quote(version)));
        }
        if !doc.urls.is_empty() {
            let urls = render_object(
                doc.urls.iter().map(|(k, v)| (k.as_str(), render_value(v))),
                3,
            );
            self.push(3, format!("'urls': {},", urls));
        }
        if !doc.api.categories.is_empty() {
            let api = self.render_api_structure(doc);
            self.push(3, format!("'api': {},", api));
        }
        if !doc.has.is_empty() {
            let has = render_object(
                doc.has
                    .iter()
                    .map(|(k, v)| (k.as_str(), render_has_flag(v, 4))),
                3,
            );
            self.push(3, format!("'has': {},", has));
        }
        if !doc.required_credentials.is_empty() {
            let creds = render_object(
                doc.required_credentials
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_string())),
                3,
            );
            self.push(3, format!("'requiredCredentials': {},", creds));
        }
        if !doc.ws.is_empty() {
            let ws = render_object(
                doc.ws.iter().map(|(name, channel)| {
                    (name.as_str(), render_ws_channel(channel, 4))
                }),
                3,
            );
            self.push(3, format!("'ws': {},", ws));
        }
        self.push(2, "});");
        self.push(1, "}");
    }

    fn render_api_structure(&self, doc: &Document) -> String {
        // category -> method -> list of endpoint names
        let mut out = String::from("{\n");
        for (category_name, category) in &doc.api.categories {
            out.push_str(&format!("{}{}: {{\n", INDENT.repeat(4), quote(category_name)));
            for method in HTTP_METHODS {
                let table = category.method(method).expect("method from the closed set");
                if table.is_empty() {
                    continue;
                }
                out.push_str(&format!("{}{}: [\n", INDENT.repeat(5), quote(method)));
                for endpoint_name in table.keys() {
                    out.push_str(&format!("{}{},\n", INDENT.repeat(6), quote(endpoint_name)));
                }
                out.push_str(&format!("{}],\n", INDENT.repeat(5)));
            }
            out.push_str(&format!("{}}},\n", INDENT.repeat(4)));
        }
        out.push_str(&format!("{}}}", INDENT.repeat(3)));
        out
    }

    // ------------------------------------------------------------------
    // sign()

    fn generate_sign(&mut self, auth: &AuthConfig) {
        self.push(1, "sign (path: string, api: string = 'public', method: string = 'GET', params: Dict = {}, headers: any = undefined, body: any = undefined) {");
        let settings = render_object(
            auth.settings
                .iter()
                .map(|(k, v)| (k.as_str(), render_value(v))),
            2,
        );
        self.push(
            2,
            format!(
                "return this.applyAuthStrategy ({}, path, api, method, params, headers, body, {});",
                quote(&auth.strategy),
                settings
            ),
        );
        self.push(1, "}");
    }

    // ------------------------------------------------------------------
    // endpoint accessors

    fn generate_accessor(
        &mut self,
        category: &str,
        method: &str,
        endpoint_name: &str,
        endpoint: &EndpointDefinition,
    ) {
        let method_name = accessor_name(category, method, endpoint_name);
        let http_method = method.to_uppercase();
        let path = endpoint.path.clone().unwrap_or_else(|| endpoint_name.to_string());

        if self.options.include_comments {
            self.push(
                1,
                format!(
                    "/** Calls the {} {} {} endpoint. */",
                    category, http_method, endpoint_name
                ),
            );
        }
        self.push(
            1,
            format!(
                "async {} (params: Dict = {{}}, context: Dict = {{}}): Promise<any> {{",
                method_name
            ),
        );

        for (param_name, param) in &endpoint.params {
            self.generate_param_checks(&method_name, param_name, param);
        }

        let config = render_endpoint_config(endpoint);
        self.push(
            2,
            format!(
                "return await this.request ({}, {}, {}, params, undefined, undefined, {}, context);",
                quote(&path),
                quote(category),
                quote(&http_method),
                config
            ),
        );
        self.push(1, "}");
    }

    fn generate_param_checks(&mut self, method_name: &str, param_name: &str, param: &ParamDefinition) {
        let access = format!("params[{}]", quote(param_name));
        let enum_list = if param.enum_values.is_empty() {
            String::new()
        } else {
            let values = param
                .enum_values
                .iter()
                .map(render_value)
                .collect::<Vec<_>>()
                .join(", ");
            format!(", [ {} ]", values)
        };
        let check = format!(
            "this.checkRequiredArgument ({}, {}, {}{});",
            quote(method_name),
            access,
            quote(param_name),
            enum_list
        );

        if param.required {
            self.push(2, check.clone());
        } else if !param.enum_values.is_empty() {
            // Enum membership only matters when the value is present
            self.push(2, format!("if ({} !== undefined) {{", access));
            self.push(3, check.clone());
            self.push(2, "}");
        }

        if let Some(required_if) = &param.required_if {
            let guard = render_required_if(required_if);
            self.push(2, format!("if ({}) {{", guard));
            self.push(3, check);
            self.push(2, "}");
        }
    }

    // ------------------------------------------------------------------
    // parsers

    fn generate_parser(
        &mut self,
        name: &str,
        parser: &ParserDefinition,
        doc: &Document,
        analysis: &resolver::DependencyAnalysis,
    ) -> Result<(), CodeGenError> {
        let endpoint = resolve_source(&doc.api, &parser.source)
            .ok_or_else(|| CodeGenError::UnresolvedSource(parser.source.clone()))?;
        let accessor = accessor_name(&endpoint.category, &endpoint.method, &endpoint.endpoint);
        let method_name = format!("parse{}", capitalize(name));

        // Fetch wrapper: call the resolved accessor, then parse
        self.push(
            1,
            format!(
                "async fetch{} (params: Dict = {{}}, context: Dict = {{}}): Promise<any> {{",
                capitalize(name)
            ),
        );
        self.push(
            2,
            format!("const response = await this.{} (params, context);", accessor),
        );
        self.push(2, format!("return this.{} (response);", method_name));
        self.push(1, "}");
        self.blank();

        if self.options.include_comments {
            self.push(
                1,
                format!("/** Parses a {} response from {}. */", name, accessor),
            );
        }
        self.push(
            1,
            format!(
                "{} (response: any, market: Market = undefined) {{",
                method_name
            ),
        );

        // Extraction path into the raw response
        match &parser.path {
            Some(path) => self.push(
                2,
                format!("const data = {};", render_path_access("response", path, None, None)),
            ),
            None => self.push(2, "const data = response;"),
        }

        match parser.iterator {
            IteratorMode::None => self.generate_single_record(parser, analysis, "data", "result", 2),
            IteratorMode::Array => {
                // Coerce a possibly-non-array source into a sequence
                self.push(
                    2,
                    "const items = Array.isArray (data) ? data : ((data === undefined || data === null) ? [] : [ data ]);",
                );
                self.push(2, "const result = [];");
                self.push(2, "for (let i = 0; i < items.length; i++) {");
                self.push(3, "const item = items[i];");
                self.generate_single_record(parser, analysis, "item", "entry", 3);
                self.push(3, "result.push (entry);");
                self.push(2, "}");
            }
            IteratorMode::Entries => {
                let key_var = entries_key_var(&parser.mapping);
                self.push(2, "const result = [];");
                self.push(2, "const keys = Object.keys (data);");
                self.push(2, "for (let i = 0; i < keys.length; i++) {");
                self.push(3, format!("const {} = keys[i];", key_var));
                self.push(3, format!("const value = data[{}];", key_var));
                self.generate_single_record(parser, analysis, "value", "entry", 3);
                self.push(3, "result.push (entry);");
                self.push(2, "}");
            }
        }

        self.push(2, "return result;");
        self.push(1, "}");
        log::trace!("emitted parser method {}", method_name);
        Ok(())
    }

    /// Builds one output record: an object literal with every non-compute
    /// field, followed by compute assignments in resolved dependency order.
    fn generate_single_record(
        &mut self,
        parser: &ParserDefinition,
        analysis: &resolver::DependencyAnalysis,
        item_var: &str,
        result_var: &str,
        depth: usize,
    ) {
        let key_var = entries_key_var(&parser.mapping);
        self.push(depth, format!("const {}: Dict = {{", result_var));
        for (field, mapping) in &parser.mapping {
            if mapping.is_compute() {
                continue;
            }
            let value = render_field_value(mapping, item_var, &key_var, parser.iterator);
            self.push(depth + 1, format!("{}: {},", quote(field), value));
        }
        self.push(depth, "};");

        for field in analysis.emission_order() {
            let mapping = &parser.mapping[&field];
            if let FieldMapping::Compute { expr, .. } = mapping {
                let template = Template::parse(expr);
                let rendered = template.render(|reference| {
                    if parser.mapping.contains_key(reference) {
                        format!("{}[{}]", result_var, quote(reference))
                    } else {
                        // External lookup on the item being parsed
                        format!("this.safeValue ({}, {})", item_var, quote(reference))
                    }
                });
                self.push(
                    depth,
                    format!("{}[{}] = {};", result_var, quote(&field), rendered),
                );
            }
        }
    }
}

// ----------------------------------------------------------------------
// rendering helpers

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Renders a JSON value as a TypeScript literal.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "undefined".to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let inner = items.iter().map(render_value).collect::<Vec<_>>().join(", ");
            format!("[ {} ]", inner)
        }
        Value::Object(obj) => {
            let inner = obj
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), render_value(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {} }}", inner)
        }
        other => other.to_string(),
    }
}

/// Renders a multi-line object literal at the given indent depth.
fn render_object<'a>(
    entries: impl Iterator<Item = (&'a str, String)>,
    depth: usize,
) -> String {
    let mut out = String::from("{\n");
    for (key, value) in entries {
        out.push_str(&format!("{}{}: {},\n", INDENT.repeat(depth + 1), quote(key), value));
    }
    out.push_str(&format!("{}}}", INDENT.repeat(depth)));
    out
}

/// Resolves a capability flag to its emitted form. Per-market objects carry
/// every market type, falling back to the declared default and then false.
fn render_has_flag(flag: &HasFlagValue, depth: usize) -> String {
    match flag {
        HasFlagValue::Bool(b) => b.to_string(),
        HasFlagValue::Null => "null".to_string(),
        HasFlagValue::Emulated => "'emulated'".to_string(),
        HasFlagValue::PerMarket(overrides) => {
            const ABSENT: HasFlagValue = HasFlagValue::Bool(false);
            let mut out = String::from("{\n");
            for market_type in MARKET_TYPES {
                let resolved = overrides
                    .get(market_type)
                    .or(overrides.default.as_deref())
                    .unwrap_or(&ABSENT);
                out.push_str(&format!(
                    "{}{}: {},\n",
                    INDENT.repeat(depth + 1),
                    quote(market_type),
                    render_has_flag(resolved, depth + 1)
                ));
            }
            out.push_str(&format!("{}}}", INDENT.repeat(depth)));
            out
        }
    }
}

fn render_ws_channel(channel: &WsChannel, depth: usize) -> String {
    let mut entries: Vec<(&str, String)> = Vec::new();
    if let Some(topic) = &channel.topic {
        entries.push(("topic", quote(topic)));
    }
    if let Some(parser) = &channel.parser {
        entries.push(("parser", quote(parser)));
    }
    for (key, value) in &channel.settings {
        entries.push((key.as_str(), render_value(value)));
    }
    render_object(entries.into_iter(), depth)
}

fn render_endpoint_config(endpoint: &EndpointDefinition) -> String {
    let mut entries: Vec<(&str, String)> = Vec::new();
    let cost = endpoint
        .rate_limit
        .as_ref()
        .and_then(|r| r.cost)
        .or(endpoint.cost);
    if let Some(cost) = cost {
        entries.push(("cost", render_number(cost)));
    }
    if let Some(rate) = &endpoint.rate_limit {
        if let Some(limit) = rate.limit {
            entries.push(("limit", limit.to_string()));
        }
        if let Some(interval) = &rate.interval {
            entries.push(("interval", quote(interval)));
        }
    }
    if entries.is_empty() {
        return "{}".to_string();
    }
    let inner = entries
        .iter()
        .map(|(k, v)| format!("{}: {}", quote(k), v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", inner)
}

fn render_number(f: f64) -> String {
    if f.fract() == 0.0 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Translates a `required_if` expression into a target boolean guard.
/// Placeholder references read from the parameter bag.
fn render_required_if(expr: &str) -> String {
    Template::parse(expr).render(|name| format!("params[{}]", quote(name)))
}

/// Renders a path extraction, chaining `safeValue` through dot segments and
/// applying the transform (and default) on the final access.
fn render_path_access(
    source_var: &str,
    path: &str,
    transform: Option<&str>,
    default: Option<&Value>,
) -> String {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, prefix) = segments.split_last().expect("path is non-empty");

    let mut base = source_var.to_string();
    for segment in prefix {
        base = format!("this.safeValue ({}, {})", base, quote(segment));
    }

    let method = transform.map(transform_method);
    match method {
        Some(method) if DIRECT_ACCESS_TRANSFORMS.contains(&method.as_str()) => {
            match default {
                Some(default) => format!(
                    "this.{} ({}, {}, {})",
                    method,
                    base,
                    quote(last),
                    render_value(default)
                ),
                None => format!("this.{} ({}, {})", method, base, quote(last)),
            }
        }
        Some(method) => {
            // Value-wrapping transform over a safeValue access
            let access = format!("this.safeValue ({}, {})", base, quote(last));
            let wrapped = format!("this.{} ({})", method, access);
            match default {
                Some(default) => format!("({} ?? {})", wrapped, render_value(default)),
                None => wrapped,
            }
        }
        None => {
            let access = format!("this.safeValue ({}, {})", base, quote(last));
            match default {
                Some(default) => format!("({} ?? {})", access, render_value(default)),
                None => access,
            }
        }
    }
}

/// Maps an EDL transform name onto the runtime helper it compiles to.
/// Unknown names pass through as `this.<name> (...)` calls.
fn transform_method(name: &str) -> String {
    match name {
        "string" | "safeString" | "safe_string" => "safeString".to_string(),
        "number" | "float" | "safeNumber" | "safe_number" => "safeNumber".to_string(),
        "integer" | "int" | "safeInteger" | "safe_integer" => "safeInteger".to_string(),
        "timestamp" | "safeTimestamp" | "safe_timestamp" => "safeTimestamp".to_string(),
        "boolean" | "bool" | "safeBoolean" | "safe_boolean" => "safeBoolean".to_string(),
        "lowercase" => "toLowerCase".to_string(),
        "uppercase" => "toUpperCase".to_string(),
        other => other.to_string(),
    }
}

/// Key variable name for entries iteration: the first mapping field that
/// pulls an `Id`-suffixed name from context names the key, `key` otherwise.
/// `marketId` and `orderId` are reserved for the market/order context and
/// never name the key.
fn entries_key_var(mapping: &indexmap::IndexMap<String, FieldMapping>) -> String {
    for field_mapping in mapping.values() {
        if let FieldMapping::FromContext { name, .. } = field_mapping {
            if name.ends_with("Id") && name != "marketId" && name != "orderId" {
                return name.clone();
            }
        }
    }
    "key".to_string()
}

/// Renders the value expression for one non-compute field.
fn render_field_value(
    mapping: &FieldMapping,
    item_var: &str,
    key_var: &str,
    iterator: IteratorMode,
) -> String {
    match mapping {
        FieldMapping::Literal(value) => render_value(value),
        FieldMapping::Path {
            path,
            transform,
            default,
        } => render_path_access(item_var, path, transform.as_deref(), default.as_ref()),
        FieldMapping::FromContext { name, transform } => {
            let ident = match name.as_str() {
                "rawData" => "response".to_string(),
                "value" => item_var.to_string(),
                "key" => key_var.to_string(),
                other if iterator == IteratorMode::Entries && other == key_var => {
                    key_var.to_string()
                }
                other => other.to_string(),
            };
            match transform {
                Some(transform) => format!("this.{} ({})", transform_method(transform), ident),
                None => ident,
            }
        }
        FieldMapping::Compute { .. } => unreachable!("compute fields are assigned separately"),
    }
}

/// Accessor method name for an endpoint: `publicGetTicker`.
pub fn accessor_name(category: &str, method: &str, endpoint: &str) -> String {
    format!(
        "{}{}{}",
        category,
        capitalize(method),
        capitalize(&path_to_camel_case(endpoint))
    )
}

/// `api/v3/ticker-price` -> `apiV3TickerPrice`.
fn path_to_camel_case(path: &str) -> String {
    let mut out = String::new();
    let mut first = true;
    for part in path.split(['/', '-', '_']) {
        if part.is_empty() {
            continue;
        }
        if first {
            out.push_str(part);
            first = false;
        } else {
            out.push_str(&capitalize(part));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_names_camel_case_paths() {
        assert_eq!(accessor_name("public", "get", "ticker"), "publicGetTicker");
        assert_eq!(
            accessor_name("private", "post", "order/cancel-all"),
            "privatePostOrderCancelAll"
        );
        assert_eq!(
            accessor_name("public", "get", "api/v3/depth"),
            "publicGetApiV3Depth"
        );
    }

    #[test]
    fn path_access_chains_through_dots() {
        assert_eq!(
            render_path_access("data", "a.b.c", None, None),
            "this.safeValue (this.safeValue (this.safeValue (data, 'a'), 'b'), 'c')"
        );
        assert_eq!(
            render_path_access("item", "lastPrice", Some("number"), None),
            "this.safeNumber (item, 'lastPrice')"
        );
        assert_eq!(
            render_path_access("item", "qty", None, Some(&Value::from(0))),
            "(this.safeValue (item, 'qty') ?? 0)"
        );
    }

    #[test]
    fn unknown_transform_passes_through() {
        assert_eq!(transform_method("omitZero"), "omitZero");
        assert_eq!(
            render_path_access("item", "size", Some("omitZero"), None),
            "this.omitZero (this.safeValue (item, 'size'))"
        );
    }

    #[test]
    fn has_flag_rendering_falls_back_to_default_then_false() {
        let flag = HasFlagValue::PerMarket(MarketOverrides {
            default: Some(Box::new(HasFlagValue::Bool(true))),
            swap: Some(Box::new(HasFlagValue::Null)),
            ..Default::default()
        });
        let rendered = render_has_flag(&flag, 0);
        assert!(rendered.contains("'spot': true"));
        assert!(rendered.contains("'swap': null"));

        let bare = HasFlagValue::PerMarket(MarketOverrides {
            spot: Some(Box::new(HasFlagValue::Emulated)),
            ..Default::default()
        });
        let rendered = render_has_flag(&bare, 0);
        assert!(rendered.contains("'spot': 'emulated'"));
        assert!(rendered.contains("'margin': false"));
    }

    #[test]
    fn entries_key_skips_reserved_context_ids() {
        let mut mapping: indexmap::IndexMap<String, FieldMapping> = indexmap::IndexMap::new();
        mapping.insert(
            "marketId".to_string(),
            FieldMapping::FromContext {
                name: "marketId".to_string(),
                transform: None,
            },
        );
        assert_eq!(entries_key_var(&mapping), "key");

        mapping.insert(
            "currencyId".to_string(),
            FieldMapping::FromContext {
                name: "currencyId".to_string(),
                transform: None,
            },
        );
        assert_eq!(entries_key_var(&mapping), "currencyId");
    }

    #[test]
    fn required_if_renders_param_guards() {
        assert_eq!(
            render_required_if("{type} == 'limit'"),
            "params['type'] == 'limit'"
        );
    }
}
