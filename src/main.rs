use clap::Parser;
use djson::Processor;
use serde_json::Value;

/// Render or check a djson template file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Template file (JSON with @djson directives)
    template: String,
    /// Data context file (JSON object); empty context if omitted
    #[arg(long)]
    data: Option<String>,
    /// Pretty-print the rendered output
    #[arg(long)]
    pretty: bool,
    /// Validate the template instead of rendering it
    #[arg(long)]
    check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let processor = Processor::new();

    let template = match std::fs::read_to_string(&args.template) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Cannot read {}: {e}", args.template);
            std::process::exit(1);
        }
    };

    if args.check {
        let errors = processor.validate_str(&template);
        for e in &errors {
            eprintln!("{e}");
        }
        std::process::exit(if errors.is_empty() { 0 } else { 1 });
    }

    let data: Value = match args.data.as_deref() {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Invalid data JSON: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Cannot read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Value::Object(Default::default()),
    };

    match processor.process_to_json(&template, &data, args.pretty) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
