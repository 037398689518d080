//! # Expression & Array-Operation Language
//!
//! The restricted expression language used by compute fields and websocket
//! transforms: lambdas, binary/conditional/switch expressions, and five
//! array operations (`map`, `filter`, `reduce`, `slice`, `flatMap`).
//!
//! Three layers:
//!
//! 1. **Shape predicates** ([`is_array_operation`], [`is_lambda_expression`])
//!    — total over any [`Value`], including null and non-objects.
//! 2. **Structural validation** ([`validate_array_operation`]) — never
//!    panics; returns a list of human-readable messages naming each
//!    missing or conflicting field. Empty list means valid.
//! 3. **Typed AST + reference evaluator** ([`ArrayOp`], [`EvalContext`]) —
//!    the validated raw node parses into a closed set of variants consumed
//!    by exhaustive matches; the evaluator is used for constant folding and
//!    test harnesses.
//!
//! The language is deliberately restricted: no loops, no user-defined
//! functions, no mutable state. Lambda parameters shadow outer bindings for
//! the duration of the body only.

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation errors. These indicate a malformed program reaching the
/// evaluator (validation should have caught structural problems) or a
/// runtime shape mismatch in the data being folded.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// An array operand did not evaluate to a sequence
    #[error("Expected array, got {0}")]
    ExpectedArray(String),

    /// slice step of zero would never terminate
    #[error("slice step cannot be zero")]
    ZeroStep,

    /// Dispatch on an op tag outside the closed set
    #[error("Unknown array operation: {0}")]
    UnknownOperation(String),

    /// Call of a function not in the registry
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Binary operator outside the supported set
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// switch matched no case and declared no default
    #[error("switch expression matched no case and has no default")]
    SwitchNoMatch,
}

const ARRAY_OPS: [&str; 5] = ["map", "filter", "reduce", "slice", "flatMap"];

/// True iff `value` is shaped like an array operation: an object whose `op`
/// field names one of the five operations. Total over any input.
pub fn is_array_operation(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => matches!(obj.get("op"), Some(Value::String(op)) if ARRAY_OPS.contains(&op.as_str())),
        None => false,
    }
}

/// True iff `value` is shaped like a lambda: an object carrying a `body`
/// plus exactly one of `param`/`params`. Total over any input.
pub fn is_lambda_expression(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            obj.contains_key("body")
                && (obj.contains_key("param") ^ obj.contains_key("params"))
        }
        None => false,
    }
}

/// Structural validation of a lambda slot. `context` names the field being
/// validated (e.g. "transform") so messages locate the problem.
fn validate_lambda(value: &Value, context: &str, errors: &mut Vec<String>) {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            errors.push(format!("{} must be a lambda expression", context));
            return;
        }
    };

    let has_param = obj.contains_key("param");
    let has_params = obj.contains_key("params");
    if has_param && has_params {
        errors.push(format!("{}: lambda cannot have both param and params", context));
    } else if !has_param && !has_params {
        errors.push(format!("{}: lambda requires param or params", context));
    }
    if has_param && !obj.get("param").map_or(false, Value::is_string) {
        errors.push(format!("{}: lambda param must be a string", context));
    }
    if has_params {
        match obj.get("params").and_then(Value::as_array) {
            Some(params) => {
                if !params.iter().all(Value::is_string) {
                    errors.push(format!("{}: lambda params must all be strings", context));
                }
            }
            None => errors.push(format!("{}: lambda params must be an array", context)),
        }
    }
    if !obj.contains_key("body") {
        errors.push(format!("{}: lambda requires body", context));
    }
}

/// Validates an array-operation node, accumulating every structural problem.
/// Returns an empty list for a valid node. Never panics, whatever the input.
pub fn validate_array_operation(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            errors.push("array operation must be an object".to_string());
            return errors;
        }
    };

    let op = match obj.get("op").and_then(Value::as_str) {
        Some(op) if ARRAY_OPS.contains(&op) => op,
        Some(op) => {
            errors.push(format!("unknown array operation: {}", op));
            return errors;
        }
        None => {
            errors.push("array operation requires op".to_string());
            return errors;
        }
    };

    match obj.get("array") {
        None => errors.push(format!("{} operation requires array", op)),
        // Nested operations validate recursively; strings and literal
        // sequences are resolved at evaluation time
        Some(nested) if is_array_operation(nested) => {
            errors.extend(validate_array_operation(nested));
        }
        Some(_) => {}
    }

    match op {
        "map" | "flatMap" => match obj.get("transform") {
            Some(lambda) => validate_lambda(lambda, "transform", &mut errors),
            None => errors.push(format!("{} operation requires transform", op)),
        },
        "filter" => match obj.get("predicate") {
            Some(lambda) => validate_lambda(lambda, "predicate", &mut errors),
            None => errors.push("filter operation requires predicate".to_string()),
        },
        "reduce" => {
            match obj.get("reducer") {
                Some(lambda) => validate_lambda(lambda, "reducer", &mut errors),
                None => errors.push("reduce operation requires reducer".to_string()),
            }
            // No implicit seed from the first element
            if !obj.contains_key("initial") {
                errors.push("reduce operation requires initial value".to_string());
            }
        }
        "slice" => {
            match obj.get("start") {
                Some(start) if start.is_number() => {}
                Some(_) => errors.push("slice operation requires numeric start".to_string()),
                None => errors.push("slice operation requires start".to_string()),
            }
            if let Some(end) = obj.get("end") {
                if !end.is_number() {
                    errors.push("slice end must be numeric".to_string());
                }
            }
            if let Some(step) = obj.get("step") {
                if !step.is_number() {
                    errors.push("slice step must be numeric".to_string());
                }
            }
        }
        _ => unreachable!("op checked against the closed set above"),
    }

    errors
}

/// A lambda after parsing: parameter names plus the raw body expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Value,
}

impl Lambda {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let params = if let Some(param) = obj.get("param").and_then(Value::as_str) {
            vec![param.to_string()]
        } else {
            obj.get("params")?
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        };
        Some(Lambda {
            params,
            body: obj.get("body")?.clone(),
        })
    }
}

/// The `array` operand of an operation: a variable/path name, a literal
/// sequence, or a nested operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySource {
    Name(String),
    Literal(Vec<Value>),
    Op(Box<ArrayOp>),
}

/// The closed set of array-operation kinds. Adding a variant forces every
/// consumer to handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOp {
    Map {
        array: ArraySource,
        transform: Lambda,
    },
    Filter {
        array: ArraySource,
        predicate: Lambda,
    },
    Reduce {
        array: ArraySource,
        reducer: Lambda,
        initial: Value,
    },
    Slice {
        array: ArraySource,
        start: i64,
        end: Option<i64>,
        step: Option<i64>,
    },
    FlatMap {
        array: ArraySource,
        transform: Lambda,
    },
}

impl ArrayOp {
    /// Parses a raw node into the typed AST. Returns the accumulated
    /// validation messages when the node is malformed.
    pub fn from_value(value: &Value) -> Result<Self, Vec<String>> {
        let errors = validate_array_operation(value);
        if !errors.is_empty() {
            return Err(errors);
        }
        // Shape guaranteed by validation from here on
        let obj = value.as_object().unwrap();
        let op = obj.get("op").and_then(Value::as_str).unwrap();
        let array = Self::parse_source(obj.get("array").unwrap())?;

        let lambda = |key: &str| Lambda::from_value(obj.get(key).unwrap()).unwrap();
        let int = |key: &str| obj.get(key).and_then(Value::as_f64).map(|f| f as i64);

        Ok(match op {
            "map" => ArrayOp::Map {
                array,
                transform: lambda("transform"),
            },
            "filter" => ArrayOp::Filter {
                array,
                predicate: lambda("predicate"),
            },
            "reduce" => ArrayOp::Reduce {
                array,
                reducer: lambda("reducer"),
                initial: obj.get("initial").unwrap().clone(),
            },
            "slice" => ArrayOp::Slice {
                array,
                start: int("start").unwrap(),
                end: int("end"),
                step: int("step"),
            },
            "flatMap" => ArrayOp::FlatMap {
                array,
                transform: lambda("transform"),
            },
            _ => unreachable!("validated op tag"),
        })
    }

    fn parse_source(value: &Value) -> Result<ArraySource, Vec<String>> {
        Ok(match value {
            Value::String(name) => ArraySource::Name(name.clone()),
            Value::Array(items) => ArraySource::Literal(items.clone()),
            nested if is_array_operation(nested) => {
                ArraySource::Op(Box::new(ArrayOp::from_value(nested)?))
            }
            other => ArraySource::Name(other.to_string()),
        })
    }
}

/// A registered evaluation function.
pub type EvalFn = fn(&[Value]) -> Result<Value, EvalError>;

/// Evaluation context: a scope stack of variable bindings plus a function
/// registry. Lambda application pushes a scope; leaving the body pops it,
/// restoring any shadowed outer binding.
pub struct EvalContext {
    scopes: Vec<HashMap<String, Value>>,
    functions: HashMap<String, EvalFn>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            functions: builtin_functions(),
        }
    }

    /// Builds a context with an initial set of variable bindings.
    pub fn with_variables(vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut ctx = Self::new();
        ctx.scopes[0].extend(vars);
        ctx
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.into(), value);
    }

    /// Registers a function. Builtins cannot be overridden; returns false
    /// when the name is already taken.
    pub fn register_function(&mut self, name: impl Into<String>, f: EvalFn) -> bool {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return false;
        }
        self.functions.insert(name, f);
        true
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Innermost binding for a bare name.
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Dot-path lookup (`item.price`) starting from a bound variable.
    /// Missing segments resolve to null, mirroring safe access in the
    /// generated code.
    fn lookup_path(&self, path: &str) -> Value {
        let mut parts = path.split('.');
        let root = parts.next().unwrap_or_default();
        let mut current = match self.lookup(root) {
            Some(value) => value.clone(),
            None => return Value::Null,
        };
        for part in parts {
            current = match current.get(part) {
                Some(value) => value.clone(),
                None => return Value::Null,
            };
        }
        current
    }

    /// Evaluates an array operation to its result value.
    pub fn eval_op(&mut self, op: &ArrayOp) -> Result<Value, EvalError> {
        match op {
            ArrayOp::Map { array, transform } => {
                let items = self.eval_source(array)?;
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    out.push(self.apply_lambda(transform, &[item, Value::from(index)])?);
                }
                Ok(Value::Array(out))
            }
            ArrayOp::Filter { array, predicate } => {
                let items = self.eval_source(array)?;
                let mut out = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    let keep =
                        self.apply_lambda(predicate, &[item.clone(), Value::from(index)])?;
                    if truthy(&keep) {
                        out.push(item);
                    }
                }
                Ok(Value::Array(out))
            }
            ArrayOp::Reduce {
                array,
                reducer,
                initial,
            } => {
                let items = self.eval_source(array)?;
                let mut acc = initial.clone();
                for (index, item) in items.into_iter().enumerate() {
                    acc = self.apply_lambda(reducer, &[acc, item, Value::from(index)])?;
                }
                Ok(acc)
            }
            ArrayOp::Slice {
                array,
                start,
                end,
                step,
            } => {
                let items = self.eval_source(array)?;
                slice_sequence(&items, *start, *end, *step)
            }
            ArrayOp::FlatMap { array, transform } => {
                let items = self.eval_source(array)?;
                let mut out = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    let mapped = self.apply_lambda(transform, &[item, Value::from(index)])?;
                    match mapped {
                        // Flatten exactly one level
                        Value::Array(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                Ok(Value::Array(out))
            }
        }
    }

    /// Parses and evaluates a raw operation node in one step. Malformed
    /// nodes surface the op tag (or the first validation message).
    pub fn eval_op_value(&mut self, value: &Value) -> Result<Value, EvalError> {
        if let Some(op) = value.get("op").and_then(Value::as_str) {
            if !ARRAY_OPS.contains(&op) {
                return Err(EvalError::UnknownOperation(op.to_string()));
            }
        }
        let op = ArrayOp::from_value(value)
            .map_err(|errors| EvalError::UnknownOperation(errors.join("; ")))?;
        self.eval_op(&op)
    }

    fn eval_source(&mut self, source: &ArraySource) -> Result<Vec<Value>, EvalError> {
        let value = match source {
            ArraySource::Name(name) => self.lookup_path(name),
            ArraySource::Literal(items) => return Ok(items.clone()),
            ArraySource::Op(nested) => self.eval_op(nested)?,
        };
        match value {
            Value::Array(items) => Ok(items),
            other => Err(EvalError::ExpectedArray(type_name(&other).to_string())),
        }
    }

    /// Applies a lambda: binds each declared parameter to the corresponding
    /// argument (extra arguments — e.g. the element index — are bound only
    /// when a parameter is declared for them), evaluates the body, pops the
    /// scope.
    pub fn apply_lambda(&mut self, lambda: &Lambda, args: &[Value]) -> Result<Value, EvalError> {
        self.push_scope();
        for (param, arg) in lambda.params.iter().zip(args.iter()) {
            self.set_variable(param.clone(), arg.clone());
        }
        let result = self.eval_expr(&lambda.body);
        self.pop_scope();
        result
    }

    /// Evaluates a general expression node.
    ///
    /// Strings are dot-path lookups against the bindings; numbers, booleans
    /// and null are themselves; objects dispatch on shape (binary,
    /// conditional, switch, function call, array operation) and otherwise
    /// evaluate as literal objects.
    pub fn eval_expr(&mut self, expr: &Value) -> Result<Value, EvalError> {
        match expr {
            Value::String(path) => Ok(self.lookup_path(path)),
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(expr.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_expr(item)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(obj) => self.eval_object(obj),
        }
    }

    fn eval_object(&mut self, obj: &Map<String, Value>) -> Result<Value, EvalError> {
        if obj.contains_key("op") && (obj.contains_key("left") || obj.contains_key("right")) {
            return self.eval_binary(obj);
        }
        if obj.contains_key("op") && obj.contains_key("array") {
            return self.eval_op_value(&Value::Object(obj.clone()));
        }
        if obj.contains_key("if") && obj.contains_key("then") {
            return self.eval_conditional(obj);
        }
        if obj.contains_key("switch") && obj.contains_key("cases") {
            return self.eval_switch(obj);
        }
        if obj.contains_key("call") {
            return self.eval_call(obj);
        }
        // A plain object literal: evaluate each value
        let mut out = Map::new();
        for (key, value) in obj {
            out.insert(key.clone(), self.eval_expr(value)?);
        }
        Ok(Value::Object(out))
    }

    fn eval_binary(&mut self, obj: &Map<String, Value>) -> Result<Value, EvalError> {
        let op = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| EvalError::UnknownOperator("<missing>".to_string()))?;
        let left = self.eval_expr(obj.get("left").unwrap_or(&Value::Null))?;

        // Short-circuit forms evaluate the right operand lazily
        match op {
            "&&" => {
                return if truthy(&left) {
                    self.eval_expr(obj.get("right").unwrap_or(&Value::Null))
                } else {
                    Ok(left)
                };
            }
            "||" => {
                return if truthy(&left) {
                    Ok(left)
                } else {
                    self.eval_expr(obj.get("right").unwrap_or(&Value::Null))
                };
            }
            "??" => {
                return if left.is_null() {
                    self.eval_expr(obj.get("right").unwrap_or(&Value::Null))
                } else {
                    Ok(left)
                };
            }
            _ => {}
        }

        let right = self.eval_expr(obj.get("right").unwrap_or(&Value::Null))?;
        match op {
            "+" => Ok(add_values(&left, &right)),
            "-" => Ok(num_value(as_number(&left) - as_number(&right))),
            "*" => Ok(num_value(as_number(&left) * as_number(&right))),
            "/" => Ok(num_value(as_number(&left) / as_number(&right))),
            "%" => Ok(num_value(as_number(&left) % as_number(&right))),
            "==" | "===" => Ok(Value::Bool(left == right)),
            "!=" | "!==" => Ok(Value::Bool(left != right)),
            "<" => Ok(Value::Bool(as_number(&left) < as_number(&right))),
            "<=" => Ok(Value::Bool(as_number(&left) <= as_number(&right))),
            ">" => Ok(Value::Bool(as_number(&left) > as_number(&right))),
            ">=" => Ok(Value::Bool(as_number(&left) >= as_number(&right))),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }

    fn eval_conditional(&mut self, obj: &Map<String, Value>) -> Result<Value, EvalError> {
        let test = self.eval_expr(obj.get("if").unwrap_or(&Value::Null))?;
        if truthy(&test) {
            self.eval_expr(obj.get("then").unwrap_or(&Value::Null))
        } else {
            match obj.get("else") {
                Some(alt) => self.eval_expr(alt),
                None => Ok(Value::Null),
            }
        }
    }

    fn eval_switch(&mut self, obj: &Map<String, Value>) -> Result<Value, EvalError> {
        let subject = self.eval_expr(obj.get("switch").unwrap_or(&Value::Null))?;
        let key = case_key(&subject);
        let cases = obj
            .get("cases")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if let Some(matched) = cases.get(&key) {
            return self.eval_expr(matched);
        }
        match obj.get("default") {
            Some(default) => self.eval_expr(default),
            // An explicit outcome, never a silent null
            None => Err(EvalError::SwitchNoMatch),
        }
    }

    fn eval_call(&mut self, obj: &Map<String, Value>) -> Result<Value, EvalError> {
        let name = obj
            .get("call")
            .and_then(Value::as_str)
            .ok_or_else(|| EvalError::UnknownFunction("<missing>".to_string()))?;
        let f = *self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        let raw_args = obj
            .get("args")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut args = Vec::with_capacity(raw_args.len());
        for arg in &raw_args {
            args.push(self.eval_expr(arg)?);
        }
        f(&args)
    }
}

/// Python-style slice over a value sequence.
fn slice_sequence(
    items: &[Value],
    start: i64,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Value, EvalError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::ZeroStep);
    }
    let len = items.len() as i64;
    let normalize = |i: i64| if i < 0 { i + len } else { i };

    let mut out = Vec::new();
    if step > 0 {
        let from = normalize(start).clamp(0, len);
        let to = normalize(end.unwrap_or(len)).clamp(0, len);
        let mut i = from;
        while i < to {
            out.push(items[i as usize].clone());
            i += step;
        }
    } else {
        let from = normalize(start).min(len - 1);
        // No end means walk all the way down to index 0 inclusive
        let to = end.map(normalize).map(|e| e.max(-1)).unwrap_or(-1);
        let mut i = from;
        while i > to && i >= 0 {
            out.push(items[i as usize].clone());
            i += step;
        }
    }
    Ok(Value::Array(out))
}

/// JS-style truthiness: null, false, 0, NaN and "" are falsy; every array
/// and object is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Wraps an f64 result, preferring integer representation for whole values.
/// Non-finite results become null since JSON cannot carry them.
fn num_value(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

fn add_values(left: &Value, right: &Value) -> Value {
    // String concatenation when either side is a string, numeric addition
    // otherwise
    match (left, right) {
        (Value::String(l), r) => Value::String(format!("{}{}", l, value_text(r))),
        (l, Value::String(r)) => Value::String(format!("{}{}", value_text(l), r)),
        (l, r) => num_value(as_number(l) + as_number(r)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn case_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn builtin_functions() -> HashMap<String, EvalFn> {
    fn unary(args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
        Ok(num_value(f(args.first().map(as_number).unwrap_or(f64::NAN))))
    }

    let mut table: HashMap<String, EvalFn> = HashMap::new();
    table.insert("abs".into(), |args| unary(args, f64::abs));
    table.insert("ceil".into(), |args| unary(args, f64::ceil));
    table.insert("floor".into(), |args| unary(args, f64::floor));
    table.insert("round".into(), |args| unary(args, f64::round));
    table.insert("sqrt".into(), |args| unary(args, f64::sqrt));
    table.insert("min".into(), |args| {
        Ok(num_value(
            args.iter().map(as_number).fold(f64::INFINITY, f64::min),
        ))
    });
    table.insert("max".into(), |args| {
        Ok(num_value(
            args.iter()
                .map(as_number)
                .fold(f64::NEG_INFINITY, f64::max),
        ))
    });
    table.insert("pow".into(), |args| {
        let base = args.first().map(as_number).unwrap_or(f64::NAN);
        let exp = args.get(1).map(as_number).unwrap_or(f64::NAN);
        Ok(num_value(base.powf(exp)))
    });
    table.insert("concat".into(), |args| {
        Ok(Value::String(args.iter().map(value_text).collect()))
    });
    table.insert("length".into(), |args| {
        let len = match args.first() {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(a)) => a.len(),
            _ => 0,
        };
        Ok(Value::from(len))
    });
    table.insert("lowercase".into(), |args| {
        Ok(Value::String(
            args.first().map(value_text).unwrap_or_default().to_lowercase(),
        ))
    });
    table.insert("uppercase".into(), |args| {
        Ok(Value::String(
            args.first().map(value_text).unwrap_or_default().to_uppercase(),
        ))
    });
    table
}
