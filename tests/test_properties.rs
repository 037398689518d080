use edlc::expr::EvalContext;
use edlc::ir::FieldMapping;
use edlc::resolver::analyze;
use edlc::template::{extract_field_references, Template};
use indexmap::IndexMap;
use quickcheck::quickcheck;
use serde_json::{json, Value};

fn slice(items: &[i64], start: i64, end: Option<i64>, step: Option<i64>) -> Vec<i64> {
    let mut ctx = EvalContext::with_variables([(
        "xs".to_string(),
        Value::Array(items.iter().map(|&i| json!(i)).collect()),
    )]);
    let mut op = json!({"op": "slice", "array": "xs", "start": start});
    if let Some(end) = end {
        op["end"] = json!(end);
    }
    if let Some(step) = step {
        op["step"] = json!(step);
    }
    ctx.eval_expr(&op)
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

// Restrict arbitrary strings to identifier shape
fn ident(seed: &str, fallback: &str) -> String {
    let cleaned: String = seed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("f_{}", fallback)
    } else {
        cleaned
    }
}

quickcheck! {
    fn full_slice_is_identity(items: Vec<i64>) -> bool {
        slice(&items, 0, None, None) == items
    }

    fn negative_unit_step_reverses(items: Vec<i64>) -> bool {
        let mut reversed = items.clone();
        reversed.reverse();
        slice(&items, -1, None, Some(-1)) == reversed
    }

    fn slice_never_grows(items: Vec<i64>, start: i8, end: Option<i8>, step: i8) -> bool {
        let step = if step == 0 { 1 } else { step };
        let out = slice(
            &items,
            start as i64,
            end.map(|e| e as i64),
            Some(step as i64),
        );
        out.len() <= items.len()
    }

    fn positive_step_preserves_relative_order(items: Vec<i64>, start: i8, step: u8) -> bool {
        let step = (step as i64 % 4) + 1;
        let out = slice(&items, start as i64, None, Some(step));
        // Every selected element appears in the source at increasing indices
        let mut cursor = 0;
        out.iter().all(|x| {
            match items[cursor..].iter().position(|y| y == x) {
                Some(offset) => {
                    cursor += offset + 1;
                    true
                }
                None => false,
            }
        })
    }

    fn extraction_matches_rendered_placeholders(names: Vec<String>) -> bool {
        let idents: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, n)| ident(n, &i.to_string()))
            .collect();
        let expr = idents
            .iter()
            .map(|n| format!("{{{}}}", n))
            .collect::<Vec<_>>()
            .join(" + ");
        extract_field_references(&expr) == idents
    }

    fn render_with_braces_roundtrips(names: Vec<String>) -> bool {
        let idents: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, n)| ident(n, &i.to_string()))
            .collect();
        let expr = idents
            .iter()
            .map(|n| format!("({} - {{{}}})", n.len(), n))
            .collect::<Vec<_>>()
            .join(" / ");
        Template::parse(&expr).render(|name| format!("{{{}}}", name)) == expr
    }

    fn reversed_chain_still_orders_dependencies_first(length: u8) -> bool {
        // f0 <- f1 <- ... <- fn, inserted dependents-first
        let length = (length as usize % 8) + 2;
        let mut mapping: IndexMap<String, FieldMapping> = IndexMap::new();
        for i in (0..length).rev() {
            let expr = if i == 0 {
                "{base}".to_string()
            } else {
                format!("{{f{}}}", i - 1)
            };
            mapping.insert(
                format!("f{}", i),
                FieldMapping::Compute { expr, deps: Vec::new() },
            );
        }
        mapping.insert(
            "base".to_string(),
            FieldMapping::Path {
                path: "base".to_string(),
                transform: None,
                default: None,
            },
        );
        let analysis = analyze(&mapping);
        let expected: Vec<String> = (0..length).map(|i| format!("f{}", i)).collect();
        analysis.ordered == expected && analysis.cycles.is_empty()
    }
}
