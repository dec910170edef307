// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! typewire-inspect - Dump the content of a typewire blob
//!
//! Prints the frame header, the schema carried by the envelope, the
//! transforms and the payload tree, without needing any of the types.

use clap::Parser;
use colored::*;
use std::io::Read;
use std::path::PathBuf;
use typewire::codec::{self, Value};
use typewire::encoding::{self, HEADER_LEN};
use typewire::schema::{descriptors, Schema, TypeNotation};
use typewire::{open_envelope, Envelope, Transform};

/// Dump a typewire blob
#[derive(Parser, Debug)]
#[command(name = "typewire-inspect")]
#[command(version)]
#[command(about = "Dump the schema, transforms and payload of a typewire blob")]
struct Args {
    /// Blob to read ("-" for stdin)
    file: PathBuf,

    /// Only print the schema and transforms
    #[arg(long, conflicts_with = "payload_only")]
    schema_only: bool,

    /// Only print the payload tree
    #[arg(long)]
    payload_only: bool,

    /// Print the raw decoded value instead of the structured view
    #[arg(long)]
    raw: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(&args.file)?;

    if args.raw {
        let (_, body) = encoding::unframe(&bytes)?;
        let value = codec::decode(&body)?;
        print_value(&value, None, 0);
        return Ok(());
    }

    let (enc, envelope) = open_envelope(&bytes)?;
    if !args.payload_only {
        println!();
        println!("{}", "=== typewire blob ===".bold());
        println!(
            "  {} {} bytes, header {} bytes, encoding {}",
            "Frame:".cyan().bold(),
            bytes.len(),
            HEADER_LEN,
            enc.to_string().yellow()
        );
        println!();
        print_schema(&envelope.schema);
        print_transforms(&envelope);
    }
    if !args.schema_only {
        println!("{}", "Payload:".cyan().bold());
        print_value(&envelope.payload, Some(&envelope.schema), 1);
        println!();
    }
    Ok(())
}

fn read_input(path: &PathBuf) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

fn print_schema(schema: &Schema) {
    println!("{} {} type(s)", "Schema:".cyan().bold(), schema.len());
    println!();

    for (i, notation) in schema.types.iter().enumerate() {
        let kind = match notation {
            TypeNotation::Composite(_) => "composite".to_string(),
            TypeNotation::Restricted(r) => r.source.as_str().to_string(),
        };
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).yellow(),
            notation.name().green().bold(),
            format!("({})", kind).dimmed()
        );
        println!("      Descriptor: {}", notation.descriptor().name);
        if !notation.provides().is_empty() {
            println!("      Provides: {}", notation.provides().join(", "));
        }

        match notation {
            TypeNotation::Composite(c) => {
                for field in &c.fields {
                    let mut extra = Vec::new();
                    if !field.mandatory {
                        extra.push("nullable".to_string());
                    }
                    if let Some(default) = &field.default {
                        extra.push(format!("default={}", default));
                    }
                    if !field.requires.is_empty() {
                        extra.push(format!("requires={}", field.requires.join("|")));
                    }
                    println!(
                        "        {} {}: {} {}",
                        "F".green(),
                        field.name,
                        field.type_name.blue(),
                        extra.join(" ").dimmed()
                    );
                }
            }
            TypeNotation::Restricted(r) => {
                for choice in &r.choices {
                    println!("        {} {} = {}", "C".blue(), choice.name, choice.value);
                }
            }
        }
        println!();
    }
}

fn print_transforms(envelope: &Envelope) {
    if envelope.transforms.is_empty() {
        return;
    }
    println!("{}", "Transforms:".cyan().bold());
    for (type_name, rules) in envelope.transforms.iter() {
        println!("  {}", type_name.green());
        for rule in rules {
            match rule {
                Transform::Rename { from, to } => println!("      rename {} -> {}", from, to),
                Transform::EnumDefault { old, new } => println!("      enum-default {} -> {}", old, new),
            }
        }
    }
    println!();
}

/// Label of a described value: internal descriptor name, type name from
/// the schema, or the bare token.
fn descriptor_label(descriptor: &Value, schema: Option<&Schema>) -> String {
    match descriptor {
        Value::ULong(code) => match descriptors::describe(*code) {
            Some(name) => format!("<{}>", name),
            None => format!("<{:#x}>", code),
        },
        Value::Symbol(token) => schema
            .and_then(|s| s.find(token))
            .map(|n| n.name().to_string())
            .unwrap_or_else(|| token.clone()),
        other => format!("{:?}", other),
    }
}

fn print_value(value: &Value, schema: Option<&Schema>, depth: usize) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Described(descriptor, body) => {
            if let Some(index) = descriptors::reference_index(value) {
                println!("{}{} #{}", pad, "ref".magenta(), index);
                return;
            }
            println!("{}{}", pad, descriptor_label(descriptor, schema).green());
            print_value(body, schema, depth + 1);
        }
        Value::List(items) => {
            println!("{}{} ({})", pad, "[".dimmed(), items.len());
            for item in items {
                print_value(item, schema, depth + 1);
            }
            println!("{}{}", pad, "]".dimmed());
        }
        Value::Map(entries) => {
            println!("{}{} ({})", pad, "{".dimmed(), entries.len());
            for (key, value) in entries {
                print_value(key, schema, depth + 1);
                print_value(value, schema, depth + 2);
            }
            println!("{}{}", pad, "}".dimmed());
        }
        Value::Null => println!("{}{}", pad, "null".dimmed()),
        Value::String(s) => println!("{}{:?}", pad, s),
        Value::Symbol(s) => println!("{}:{}", pad, s),
        Value::Binary(b) => println!("{}{} bytes {}", pad, b.len(), hex_preview(b).dimmed()),
        other => println!("{}{} {}", pad, scalar_text(other), other.kind_name().dimmed()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::UByte(v) => v.to_string(),
        Value::UShort(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::ULong(v) => v.to_string(),
        Value::Byte(v) => v.to_string(),
        Value::Short(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Char(v) => format!("{:?}", v),
        Value::Timestamp(ms) => format!("{}ms", ms),
        other => format!("{:?}", other),
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    if bytes.len() > 16 {
        format!("{} ..", shown.join(" "))
    } else {
        shown.join(" ")
    }
}
