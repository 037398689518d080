//! End-to-end compiles from YAML-authored documents, the way definitions
//! are written in practice.

use edlc::{compile, CompileOptions};
use serde_json::Value;

const KRAKENLIKE: &str = r#"
exchange:
  id: krakenlike
  name: Krakenlike
  countries: [US]
  rateLimit: 100
  version: "0"
  has:
    fetchTicker: true
    fetchOrderBook: true
    fetchTrades: true
    fetchOHLCV:
      default: true
      option: false

urls:
  api: https://api.krakenlike.example
  doc: https://docs.krakenlike.example

requiredCredentials:
  apiKey: true
  secret: true

auth:
  strategy: hmac
  algorithm: sha512

api:
  public:
    get:
      Ticker: /0/public/Ticker
      Trades:
        path: /0/public/Trades
        cost: 1
        params:
          pair:
            type: string
            required: true
          since: timestamp
  private:
    post:
      AddOrder:
        path: /0/private/AddOrder
        rateLimit:
          cost: 2
          limit: 60
          interval: 1m
        params:
          ordertype:
            type: string
            enum: [limit, market]
          price:
            type: float
            required_if: "{ordertype} == 'limit'"

parsers:
  trades:
    source: public.get.Trades
    path: result
    iterator: array
    mapping:
      price:
        path: "0"
        transform: number
      amount:
        path: "1"
        transform: number
      timestamp:
        path: "2"
        transform: timestamp
      cost:
        compute: "{price} * {amount}"
"#;

fn parse(yaml: &str) -> Value {
    serde_yaml::from_str(yaml).expect("fixture parses")
}

#[test]
fn yaml_document_compiles_cleanly() {
    let output = compile(&parse(KRAKENLIKE), &CompileOptions::default());
    assert!(
        output.result.success,
        "errors: {:?}",
        output.result.errors
    );
    assert!(output.result.warnings.is_empty());

    let code = output.code.unwrap();
    assert!(code.contains("export default class krakenlike extends Exchange {"));
    assert!(code.contains("'apiKey': true,"));
    assert!(code.contains("this.applyAuthStrategy ('hmac',"));
    assert!(code.contains("async publicGetTicker"));
    assert!(code.contains("async publicGetTrades"));
    assert!(code.contains("async privatePostAddOrder"));
    assert!(code.contains(
        "{ 'cost': 2, 'limit': 60, 'interval': '1m' }"
    ));
    assert!(code.contains("parseTrades (response: any, market: Market = undefined) {"));
    assert!(code.contains("entry['cost'] = entry['price'] * entry['amount'];"));
}

#[test]
fn all_problems_surface_in_one_pass() {
    let yaml = r#"
exchange:
  has:
    fetchTicker: maybe
api:
  public:
    fetch:
      thing: {}
parsers:
  orphan:
    mapping:
      x:
        path: a
        literal: 1
"#;
    let output = compile(&parse(yaml), &CompileOptions::default());
    assert!(!output.result.success);
    assert!(output.code.is_none());
    let errors = output.result.errors;
    assert!(errors.iter().any(|e| e.contains("exchange id is required")));
    assert!(errors.iter().any(|e| e.contains("malformed capability value for 'fetchTicker'")));
    assert!(errors.iter().any(|e| e.contains("unknown HTTP method 'fetch'")));
    assert!(errors.iter().any(|e| e.contains("parser 'orphan' requires a source")));
    assert!(errors.iter().any(|e| e.contains("exactly one of")));
    assert!(errors.len() >= 5);
}

#[test]
fn warnings_do_not_block_compilation() {
    let yaml = r#"
exchange:
  id: tiny
  has:
    fetchTickr: true
api:
  public:
    get:
      time: /time
"#;
    let output = compile(&parse(yaml), &CompileOptions::default());
    assert!(output.result.success);
    assert!(output.code.is_some());
    assert!(output
        .result
        .warnings
        .iter()
        .any(|w| w.contains("unknown capability key 'fetchTickr'")));
    // Expected capabilities absent from a minimal document
    assert!(output
        .result
        .warnings
        .iter()
        .any(|w| w.contains("expected capability 'fetchOrderBook' is not declared")));
}

#[test]
fn non_mapping_root_reports_without_panicking() {
    let output = compile(&serde_json::json!(["not", "a", "document"]), &CompileOptions::default());
    assert!(!output.result.success);
    assert!(output.code.is_none());
    assert_eq!(output.result.errors, vec!["document root must be a mapping"]);
}
