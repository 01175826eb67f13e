use anyhow::{Context, Result};
use clap::Parser;
use rpncalc::builtinops::OperatorTable;
use rpncalc::{Engine, EngineConfig, OutputStyle, Session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "?";

#[derive(Parser, Debug)]
#[command(name = "rpncalc", version, about = "Exact rational RPN calculator")]
struct Args {
    /// Lines to evaluate instead of starting the interactive prompt
    #[arg(value_name = "EXPRESSION")]
    expression: Option<String>,

    /// Starting radix, 2 to 36
    #[arg(short, long, default_value_t = 10)]
    base: u32,

    /// Start with radix-point display instead of fractions
    #[arg(short, long)]
    decimal: bool,

    /// Digits shown after the radix point
    #[arg(short, long, default_value_t = rpncalc::engine::DEFAULT_PRECISION)]
    precision: usize,

    /// Echo each input line after the prompt
    #[arg(long)]
    echo: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let engine = Engine::with_config(EngineConfig {
        base: args.base,
        fraction_display: !args.decimal,
        precision: args.precision,
        ..EngineConfig::default()
    })
    .context("invalid --base")?;
    let mut session = Session::new(engine);

    match &args.expression {
        Some(expression) => {
            for line in expression.lines() {
                if args.echo {
                    println!("{}{}", PROMPT, line);
                }
                println!("{}", session.run_line(line).render(OutputStyle::Simple));
            }
            Ok(())
        }
        None => interactive(&mut session, args.echo),
    }
}

fn interactive(session: &mut Session, echo: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if echo {
                    println!("{}{}", PROMPT, line);
                }

                match line.trim() {
                    "\\help" => {
                        print_help();
                        continue;
                    }
                    "\\env" => {
                        print_environment(session);
                        continue;
                    }
                    "\\ops" => {
                        print_operators(session.engine().operators());
                        continue;
                    }
                    "\\quit" => break,
                    _ => {}
                }

                println!("{}", session.run_line(&line).render(OutputStyle::Full));
                println!();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn print_help() {
    println!("Tokens are separated by spaces, statements by ';', and '#' starts a comment.");
    println!("  3 4 +        numbers in the current radix, exact fractions like 1/3");
    println!("  :name        push a symbol");
    println!("  16 b / :hex b  switch radix");
    println!("  f            toggle fraction / radix-point display");
    println!("  x= x?        set / get a variable");
    println!("  +$ *.        fold / map an operator over the stack");
    println!("  ( ... )      work on a fresh stack, then spread it back");
    println!();
    println!("Commands:");
    println!("  \\help   show this message");
    println!("  \\env    list variables");
    println!("  \\ops    list operators and their aliases");
    println!("  \\quit   leave (Ctrl+D also works)");
}

fn print_environment(session: &Session) {
    let engine = session.engine();
    let env = engine.environment();
    if env.is_empty() {
        println!("no variables set");
        return;
    }
    for (name, value) in env.iter_sorted() {
        println!("  {} = {}", name, engine.display_token(value));
    }
}

fn print_operators(operators: &OperatorTable) {
    for name in operators.names() {
        let aliases = operators.aliases_of(name);
        if aliases.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {} [{}]", name, aliases.join(" "));
        }
    }
}
