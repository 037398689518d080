//! # edlc
//!
//! Compiler for Exchange Definition Language (EDL) documents. An EDL
//! document declares an exchange's REST API surface, capability flags and
//! response parsers as data; this crate validates the document, resolves
//! compute-field dependencies and emits a deterministic TypeScript exchange
//! class.
//!
//! ## Pipeline
//!
//! 1. [`document`] — builds the typed IR from raw JSON, accumulating
//!    diagnostics instead of failing fast
//! 2. [`resolver`] — orders compute fields per parser and detects cycles
//! 3. [`codegen`] — emits the TypeScript module
//!
//! ## Example
//!
//! ```rust
//! use edlc::{compile, CompileOptions};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "exchange": { "id": "demo", "name": "Demo" },
//!     "api": { "public": { "get": { "ticker": "/ticker" } } },
//! });
//! let output = compile(&doc, &CompileOptions::default());
//! assert!(output.result.success);
//! assert!(output.code.unwrap().contains("publicGetTicker"));
//! ```

pub mod codegen;
pub mod diagnostic;
pub mod document;
pub mod expr;
pub mod ir;
pub mod resolver;
pub mod template;

pub use codegen::{CodeGenError, Generator, GeneratorOptions};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use document::{build_document, resolve_source, EndpointRef};
pub use expr::{EvalContext, EvalError};
pub use ir::Document;
pub use resolver::{analyze, DependencyAnalysis};
pub use template::{extract_field_references, Template};

use serde_json::Value;

/// Compile-call configuration.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Emit doc comments above generated accessors
    pub include_comments: bool,
    /// Override the generated class name (defaults to the exchange id)
    pub class_name: Option<String>,
}

/// Outcome summary of one compile call.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// True iff no error diagnostic was produced; warnings do not count
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<&Diagnostics> for CompileResult {
    fn from(diagnostics: &Diagnostics) -> Self {
        Self {
            success: diagnostics.success(),
            errors: diagnostics.errors(),
            warnings: diagnostics.warnings(),
        }
    }
}

/// Full output of one compile call. `code` is present iff
/// `result.success`.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub code: Option<String>,
    pub result: CompileResult,
}

/// Compiles a raw EDL document into TypeScript source.
///
/// Never panics on malformed input: every data problem surfaces as a
/// diagnostic. Only a root value that is not a JSON object aborts before
/// validation completes, and even that is reported through `result`.
pub fn compile(source: &Value, options: &CompileOptions) -> CompileOutput {
    let mut diagnostics = Diagnostics::new();

    let Some(doc) = document::build_document(source, &mut diagnostics) else {
        return CompileOutput {
            code: None,
            result: CompileResult::from(&diagnostics),
        };
    };

    if !diagnostics.success() {
        log::debug!(
            "skipping code generation: {} validation errors",
            diagnostics.errors().len()
        );
        return CompileOutput {
            code: None,
            result: CompileResult::from(&diagnostics),
        };
    }

    let generator = Generator::new(GeneratorOptions {
        include_comments: options.include_comments,
        class_name: options.class_name.clone(),
    });
    let (code, generation_diagnostics) = generator.generate(&doc);
    diagnostics.extend(generation_diagnostics);

    CompileOutput {
        code,
        result: CompileResult::from(&diagnostics),
    }
}
