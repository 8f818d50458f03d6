use clap::Parser;
use proc_graph::prelude::*;
use proc_graph_examples::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "script-eval")]
#[command(about = "Evaluate an expression-language snippet and print its value")]
struct Cli {
    /// Source to evaluate; a built-in demo runs when omitted
    source: Option<String>,

    /// Seed for the `random` built-ins
    #[arg(long, default_value = "0")]
    seed: u64,
}

const DEMO: &str = r#"
function fib(n) {
    if (n < 2) { return n; }
    return fib(n - 1) + fib(n - 2);
}
var offset = Vector3(1, 2, 3) * 0.5;
print("fib(10) = " + fib(10));
print("offset = " + offset);
return fib(10) + offset.z;
"#;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut interpreter = Interpreter::with_config(InterpreterConfig::new().with_seed(cli.seed))
        .with_sink(FnOutputSink::new(|line: &str| println!("> {line}")));
    let source = cli.source.as_deref().unwrap_or(DEMO);

    match interpreter.run(source)? {
        Some(value) => println!("{value} ({})", value.type_name()),
        None => println!("no value"),
    }
    Ok(())
}
