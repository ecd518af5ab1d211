use formkit_rust::json::from_json;
use formkit_rust::{
    decode_query, encode_query, CodecError, Form, MemorySurface, Options, RecordingTransport,
    Settings,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use std::io::{self, Read};
use std::process::ExitCode;

const USAGE: &str = "usage: formkit <encode|decode|check> < input";

/// Input of `formkit check`: a form description plus optional settings.
#[derive(Deserialize)]
struct CheckInput {
    #[serde(default)]
    settings: Settings,
    #[serde(flatten)]
    form: MemorySurface,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let command = match std::env::args().nth(1) {
        Some(c) => c,
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("cannot read stdin: {}", e);
        return ExitCode::from(2);
    }

    let result = match command.as_str() {
        "encode" => encode_query(&input).map(|tree| {
            println!("{}", tree.to_json_pretty());
            true
        }),
        "decode" => from_json(&input)
            .and_then(|tree| decode_query(&tree))
            .map(|query| {
                println!("{}", query);
                true
            }),
        "check" => check(&input),
        other => {
            eprintln!("unknown command \"{}\"\n{}", other, USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("ERROR [{}]: {}", err.code(), err);
            ExitCode::from(1)
        }
    }
}

/// Validate every field of the described form and print the error map.
fn check(input: &str) -> Result<bool, CodecError> {
    let parsed: CheckInput = serde_json::from_str(input)?;
    let options = Options::with_settings(parsed.settings);
    let mut form = Form::attach(parsed.form, RecordingTransport::default(), options);

    let valid = form.validate();

    let mut errors = Map::new();
    for id in form.errors() {
        let detail = match form.field_errors(id).first() {
            Some(error) => serde_json::to_value(error)?,
            None => Value::Null,
        };
        errors.insert(id.clone(), detail);
    }
    println!(
        "{:#}",
        json!({ "valid": valid, "errors": Value::Object(errors) })
    );
    Ok(valid)
}
