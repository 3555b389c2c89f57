use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use intercept_core::{init_subscriber, LogFormat, NullSink, Proxy, ProxyConfig, ProxyFactory};
use intercept_core::demo::{BasicCalculator, Calculator};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

fn cli() -> Command {
    let operand = |name: &'static str| {
        Arg::new(name)
            .required(true)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64))
    };

    Command::new("intercept-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Call a traced calculator proxy; traces go to stderr, results to stdout")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML proxy configuration"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Trace output format"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Also show debug events"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Discard trace events"),
        )
        .subcommand(
            Command::new("add")
                .about("Add two integers")
                .arg(operand("a"))
                .arg(operand("b")),
        )
        .subcommand(
            Command::new("divide")
                .about("Divide two integers")
                .arg(operand("a"))
                .arg(operand("b")),
        )
        .subcommand(
            Command::new("call")
                .about("Call any method by name with JSON arguments")
                .arg(Arg::new("method").required(true))
                .arg(
                    Arg::new("args")
                        .num_args(0..)
                        .allow_hyphen_values(true)
                        .help("Arguments; values that are not valid JSON are passed as strings"),
                ),
        )
        .subcommand(Command::new("methods").about("List methods available to `call`"))
}

fn load_config(matches: &ArgMatches) -> Result<ProxyConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => ProxyConfig::load(path).with_context(|| format!("loading {path}")),
        None => Ok(ProxyConfig::default()),
    }
}

fn build_proxy(matches: &ArgMatches) -> Result<Proxy<BasicCalculator>> {
    let mut factory = ProxyFactory::new().with_config(load_config(matches)?);
    if matches.get_flag("quiet") {
        factory = factory.with_sink(Arc::new(NullSink));
    }
    factory
        .create(Arc::new(BasicCalculator::new()))
        .context("building calculator proxy")
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let proxy = build_proxy(matches)?;

    match matches.subcommand() {
        Some(("add", sub)) => {
            let (a, b) = operands(sub);
            writeln!(out, "{}", proxy.add(a, b))?;
        }
        Some(("divide", sub)) => {
            let (a, b) = operands(sub);
            let quotient = proxy.divide(a, b)?;
            writeln!(out, "{quotient}")?;
        }
        Some(("call", sub)) => {
            let method = sub
                .get_one::<String>("method")
                .context("missing method name")?;
            let args = sub
                .get_many::<String>("args")
                .map(|values| values.map(|v| parse_arg(v)).collect())
                .unwrap_or_default();
            let value = proxy.invoke(method, args)?;
            writeln!(out, "{value}")?;
        }
        Some(("methods", _)) => {
            for signature in proxy.method_table().signatures() {
                writeln!(out, "{signature}")?;
            }
        }
        other => anyhow::bail!("unknown command: {other:?}"),
    }
    Ok(())
}

fn operands(sub: &ArgMatches) -> (i64, i64) {
    let a = sub.get_one::<i64>("a").copied().unwrap_or_default();
    let b = sub.get_one::<i64>("b").copied().unwrap_or_default();
    (a, b)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let format = match matches.get_one::<String>("log-format").map(String::as_str) {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };
    let fallback = if matches.get_flag("verbose") { "debug" } else { "info" };
    init_subscriber(format, fallback)?;
    tracing::debug!("intercept-demo starting");

    let stdout = std::io::stdout();
    run(&matches, &mut stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String> {
        let matches = cli().try_get_matches_from(args)?;
        let mut out = Vec::new();
        run(&matches, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn add_prints_sum() {
        assert_eq!(run_args(&["intercept-demo", "-q", "add", "2", "3"]).unwrap(), "5\n");
    }

    #[test]
    fn negative_operands() {
        assert_eq!(run_args(&["intercept-demo", "-q", "add", "-2", "-3"]).unwrap(), "-5\n");
    }

    #[test]
    fn divide_by_zero_surfaces_target_error() {
        let err = run_args(&["intercept-demo", "-q", "divide", "1", "0"]).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn call_dispatches_by_kind() {
        let out = run_args(&["intercept-demo", "-q", "call", "add", "0.5", "1.5"]).unwrap();
        assert_eq!(out, "2.0\n");

        let out = run_args(&["intercept-demo", "-q", "call", "parse_add", "40", "2"]).unwrap_err();
        assert!(out.to_string().contains("no overload"));
    }

    #[test]
    fn call_with_string_argument() {
        let out = run_args(&["intercept-demo", "-q", "call", "parse_add", "\"40\"", "2"]).unwrap();
        assert_eq!(out, "42\n");
    }

    #[test]
    fn methods_lists_overloads() {
        let out = run_args(&["intercept-demo", "-q", "methods"]).unwrap();
        assert!(out.contains("add(int, int)"));
        assert!(out.contains("add(float, float)"));
        assert!(out.contains("clear()"));
    }

    #[test]
    fn config_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.toml");
        std::fs::write(&path, "include_arguments = true\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let matches = cli()
            .try_get_matches_from(["intercept-demo", "--config", path.as_str(), "methods"])
            .unwrap();
        assert!(load_config(&matches).unwrap().include_arguments);
    }

    #[test]
    fn missing_config_is_reported() {
        let matches = cli()
            .try_get_matches_from(["intercept-demo", "--config", "/nonexistent.toml", "methods"])
            .unwrap();
        let err = load_config(&matches).unwrap_err();
        assert!(err.to_string().contains("/nonexistent.toml"));
    }

    #[test]
    fn parse_arg_falls_back_to_string() {
        assert_eq!(parse_arg("3"), serde_json::json!(3));
        assert_eq!(parse_arg("hello"), serde_json::json!("hello"));
    }
}
