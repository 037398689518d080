use anyhow::{bail, Context, Result};
use edlc::{compile, CompileOptions};
use std::env;
use std::fs;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output_path = None;
    let mut options = CompileOptions::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                output_path = Some(
                    args.get(i)
                        .context("missing path after --output")?
                        .clone(),
                );
            }
            "--comments" => options.include_comments = true,
            "--class-name" => {
                i += 1;
                options.class_name = Some(
                    args.get(i)
                        .context("missing name after --class-name")?
                        .clone(),
                );
            }
            other if input.is_none() => input = Some(other.to_string()),
            other => bail!("unexpected argument: {}", other),
        }
        i += 1;
    }

    let Some(input) = input else {
        eprintln!("Usage: {} <definition.yaml> [-o out.ts] [--comments] [--class-name Name]", args[0]);
        process::exit(1);
    };

    let source = fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input))?;
    let raw: serde_json::Value = if input.ends_with(".yaml") || input.ends_with(".yml") {
        serde_yaml::from_str(&source).with_context(|| format!("parsing {}", input))?
    } else {
        serde_json::from_str(&source).with_context(|| format!("parsing {}", input))?
    };

    let compiled = compile(&raw, &options);
    for warning in &compiled.result.warnings {
        eprintln!("warning: {}", warning);
    }
    for error in &compiled.result.errors {
        eprintln!("error: {}", error);
    }

    match compiled.code {
        Some(code) => match output_path {
            Some(path) => fs::write(&path, code)
                .with_context(|| format!("writing {}", path))?,
            None => print!("{}", code),
        },
        None => bail!(
            "compilation failed with {} error(s)",
            compiled.result.errors.len()
        ),
    }
    Ok(())
}
