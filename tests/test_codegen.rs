use edlc::{compile, CompileOptions};
use pretty_assertions::assert_eq;
use serde_json::json;

fn compile_ok(doc: serde_json::Value) -> String {
    let output = compile(&doc, &CompileOptions::default());
    assert!(
        output.result.success,
        "unexpected errors: {:?}",
        output.result.errors
    );
    output.code.expect("code is present on success")
}

fn ticker_document() -> serde_json::Value {
    json!({
        "exchange": {
            "id": "demo",
            "name": "Demo",
            "countries": ["JP"],
            "rateLimit": 50,
            "version": "v1",
            "has": {"fetchTicker": true, "fetchOrderBook": true, "fetchTrades": true},
        },
        "api": {
            "public": {
                "get": {
                    "ticker": {
                        "path": "/ticker",
                        "cost": 2,
                        "params": {
                            "symbol": {"type": "string", "required": true},
                        },
                    },
                },
            },
        },
        "parsers": {
            "ticker": {
                "source": "public.get.ticker",
                "mapping": {
                    "last": {"path": "lastPrice", "transform": "number"},
                    "open": {"path": "openPrice", "transform": "number"},
                    "change": {"compute": "{last} - {open}"},
                    "changePercent": {"compute": "({change} / {open}) * 100"},
                },
            },
        },
    })
}

#[test]
fn output_is_byte_identical_across_calls() {
    let doc = ticker_document();
    let first = compile_ok(doc.clone());
    let second = compile_ok(doc);
    assert_eq!(first, second);
}

#[test]
fn emits_class_describe_and_accessor() {
    let code = compile_ok(ticker_document());
    assert!(code.contains("export default class demo extends Exchange {"));
    assert!(code.contains("return this.deepExtend (super.describe (), {"));
    assert!(code.contains("'id': 'demo',"));
    assert!(code.contains("'rateLimit': 50,"));
    assert!(code.contains("'fetchTicker': true,"));
    assert!(code.contains(
        "async publicGetTicker (params: Dict = {}, context: Dict = {}): Promise<any> {"
    ));
    assert!(code.contains(
        "this.checkRequiredArgument ('publicGetTicker', params['symbol'], 'symbol');"
    ));
    assert!(code.contains(
        "return await this.request ('/ticker', 'public', 'GET', params, undefined, undefined, { 'cost': 2 }, context);"
    ));
    assert!(code.contains("async fetchTicker (params: Dict = {}, context: Dict = {}): Promise<any> {"));
    assert!(code.contains("const response = await this.publicGetTicker (params, context);"));
    assert!(code.contains("return this.parseTicker (response);"));
}

#[test]
fn compute_assignments_follow_their_source_fields() {
    let code = compile_ok(ticker_document());
    let last = code.find("'last': this.safeNumber (data, 'lastPrice'),").unwrap();
    let open = code.find("'open': this.safeNumber (data, 'openPrice'),").unwrap();
    let change = code
        .find("result['change'] = result['last'] - result['open'];")
        .unwrap();
    let change_percent = code
        .find("result['changePercent'] = (result['change'] / result['open']) * 100;")
        .unwrap();
    assert!(last < change);
    assert!(open < change);
    assert!(change < change_percent);
}

#[test]
fn missing_references_fall_back_to_item_lookups() {
    let mut doc = ticker_document();
    doc["parsers"]["ticker"]["mapping"]["normalized"] =
        json!({"compute": "{last} / {divider}"});
    let code = compile_ok(doc);
    assert!(code.contains(
        "result['normalized'] = result['last'] / this.safeValue (data, 'divider');"
    ));
    // Fully-resolved fields still assign before externally-blocked ones
    let change = code.find("result['change']").unwrap();
    let normalized = code.find("result['normalized']").unwrap();
    assert!(change < normalized);
}

#[test]
fn array_iterator_coerces_non_array_sources() {
    let mut doc = ticker_document();
    doc["parsers"]["trades"] = json!({
        "source": "publicGetTicker",
        "path": "data",
        "iterator": "array",
        "mapping": {
            "price": {"path": "p", "transform": "number"},
            "amount": {"path": "q", "transform": "number"},
            "cost": {"compute": "{price} * {amount}"},
        },
    });
    let code = compile_ok(doc);
    assert!(code.contains("parseTrades (response: any, market: Market = undefined) {"));
    assert!(code.contains("const data = this.safeValue (response, 'data');"));
    assert!(code.contains(
        "const items = Array.isArray (data) ? data : ((data === undefined || data === null) ? [] : [ data ]);"
    ));
    assert!(code.contains("entry['cost'] = entry['price'] * entry['amount'];"));
    assert!(code.contains("result.push (entry);"));
}

#[test]
fn entries_iterator_names_the_key_from_context() {
    let mut doc = ticker_document();
    doc["parsers"]["markets"] = json!({
        "source": "public/get/ticker",
        "iterator": "entries",
        "mapping": {
            "currencyId": {"from_context": "currencyId"},
            "symbol": {"path": "symbol"},
        },
    });
    let code = compile_ok(doc);
    assert!(code.contains("const keys = Object.keys (data);"));
    assert!(code.contains("const currencyId = keys[i];"));
    assert!(code.contains("const value = data[currencyId];"));
    assert!(code.contains("'currencyId': currencyId,"));
    assert!(code.contains("'symbol': this.safeValue (value, 'symbol'),"));
}

#[test]
fn market_and_order_ids_never_name_the_entries_key() {
    let mut doc = ticker_document();
    doc["parsers"]["balances"] = json!({
        "source": "public.get.ticker",
        "iterator": "entries",
        "mapping": {
            "marketId": {"from_context": "marketId"},
            "currencyId": {"from_context": "currencyId"},
            "free": {"path": "available"},
        },
    });
    let code = compile_ok(doc.clone());
    // marketId stays a context identifier; currencyId names the key
    assert!(code.contains("const currencyId = keys[i];"));
    assert!(code.contains("const value = data[currencyId];"));
    assert!(code.contains("'marketId': marketId,"));

    // With only reserved ids in the mapping the key falls back to `key`
    doc["parsers"]["balances"]["mapping"]
        .as_object_mut()
        .unwrap()
        .remove("currencyId");
    let code = compile_ok(doc);
    assert!(code.contains("const key = keys[i];"));
    assert!(code.contains("const value = data[key];"));
}

#[test]
fn per_market_capability_flags_resolve_default_then_false() {
    let mut doc = ticker_document();
    doc["exchange"]["has"]["fetchOHLCV"] = json!({"default": true, "swap": false});
    doc["exchange"]["has"]["fetchFundingRate"] = json!({"swap": true});
    let code = compile_ok(doc);
    assert!(code.contains("'fetchOHLCV': {"));
    assert!(code.contains("'spot': true,"));
    assert!(code.contains("'swap': false,"));
    // No default declared: unspecified market types read false
    assert!(code.contains("'fetchFundingRate': {"));
    assert!(code.contains("'margin': false,"));
}

#[test]
fn cyclic_compute_fields_fail_only_their_parser() {
    let mut doc = ticker_document();
    doc["parsers"]["broken"] = json!({
        "source": "public.get.ticker",
        "mapping": {
            "a": {"compute": "{b}"},
            "b": {"compute": "{a}"},
        },
    });
    let output = compile(&doc, &CompileOptions::default());
    assert!(!output.result.success);
    assert!(output.code.is_none());
    assert_eq!(
        output.result.errors,
        vec!["parser 'broken': cyclic compute dependency: a -> b -> a"]
    );
}

#[test]
fn enum_and_conditional_requirements_generate_guards() {
    let mut doc = ticker_document();
    doc["api"]["private"] = json!({
        "post": {
            "order": {
                "path": "/order",
                "params": {
                    "type": {"type": "string", "enum": ["limit", "market"]},
                    "price": {"type": "float", "required_if": "{type} == 'limit'"},
                },
            },
        },
    });
    let code = compile_ok(doc);
    assert!(code.contains("async privatePostOrder"));
    assert!(code.contains("if (params['type'] !== undefined) {"));
    assert!(code.contains(
        "this.checkRequiredArgument ('privatePostOrder', params['type'], 'type', [ 'limit', 'market' ]);"
    ));
    assert!(code.contains("if (params['type'] == 'limit') {"));
    assert!(code.contains(
        "this.checkRequiredArgument ('privatePostOrder', params['price'], 'price');"
    ));
}

#[test]
fn class_name_override_and_comments() {
    let doc = ticker_document();
    let output = compile(
        &doc,
        &CompileOptions {
            include_comments: true,
            class_name: Some("DemoExchange".to_string()),
        },
    );
    let code = output.code.unwrap();
    assert!(code.contains("export default class DemoExchange extends Exchange {"));
    assert!(code.contains("/** Calls the public GET ticker endpoint. */"));
    assert!(code.contains("/** Parses a ticker response from publicGetTicker. */"));
}

#[test]
fn unresolved_parser_source_is_a_validation_error() {
    let mut doc = ticker_document();
    doc["parsers"]["ghost"] = json!({"source": "private.get.nothing", "mapping": {}});
    let output = compile(&doc, &CompileOptions::default());
    assert!(!output.result.success);
    assert!(output.code.is_none());
    assert!(output.result.errors.iter().any(|e| {
        e.contains("parser 'ghost': unresolved endpoint source 'private.get.nothing'")
    }));
}
