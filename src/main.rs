mod debug_report;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use clap::{Parser, ValueEnum};
use rbnf::{Capitalization, FormatRequest, Number, ParseRequest, RoundingMode, RuleBasedNumberFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rbnf", version, about = "Format numbers as words with rule-based number formats, and parse them back")]
struct Cli {
    /// Values to format (integers, decimals, `inf`, `-inf` or `nan`)
    #[arg(allow_negative_numbers = true)]
    values: Vec<String>,

    /// Read the rule description from a file instead of a built-in one
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Built-in English rules to use when no file is given
    #[arg(short, long, value_enum, default_value_t = Builtin::Spellout)]
    builtin: Builtin,

    /// Locale for plural categories and display names
    #[arg(long, default_value = "en")]
    locale: String,

    /// Public rule set to use instead of the default one
    #[arg(short = 's', long)]
    rule_set: Option<String>,

    /// Parse this text instead of formatting values
    #[arg(short, long, value_name = "TEXT")]
    parse: Option<String>,

    /// Tolerate delimiter and case differences while parsing
    #[arg(long)]
    lenient: bool,

    /// Print the compiled rule sets
    #[arg(long)]
    dump: bool,

    /// Round values before formatting
    #[arg(long, value_enum)]
    rounding: Option<Rounding>,

    /// Fraction digits kept when rounding
    #[arg(long, default_value_t = 3)]
    max_fraction_digits: u32,

    /// Capitalize the first letter of the result
    #[arg(long)]
    capitalize: bool,

    /// Force ANSI color output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Builtin {
    Spellout,
    Ordinal,
    Duration,
}

#[derive(Clone, Copy, ValueEnum)]
enum Rounding {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

impl From<Rounding> for RoundingMode {
    fn from(value: Rounding) -> Self {
        match value {
            Rounding::Up => RoundingMode::Up,
            Rounding::Down => RoundingMode::Down,
            Rounding::Ceiling => RoundingMode::Ceiling,
            Rounding::Floor => RoundingMode::Floor,
            Rounding::HalfUp => RoundingMode::HalfUp,
            Rounding::HalfDown => RoundingMode::HalfDown,
            Rounding::HalfEven => RoundingMode::HalfEven,
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("RBNF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let cli = Cli::parse();
    let color = if cli.no_color { false } else { cli.color || io::stdout().is_terminal() };

    let formatter = match build_formatter(&cli) {
        Ok(formatter) => formatter,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if cli.dump {
        debug_report::print_rule_sets(&formatter, &cli.locale, color);
    }

    if let Some(text) = &cli.parse {
        let mut request = ParseRequest::new(text.as_str()).lenient(cli.lenient);
        if let Some(name) = &cli.rule_set {
            request = request.rule_set(name.as_str());
        }
        return match formatter.parse_with(&request) {
            Ok(outcome) => {
                debug_report::print_parse(text, &outcome, color);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(1)
            }
        };
    }

    if cli.values.is_empty() {
        if cli.dump {
            return ExitCode::SUCCESS;
        }
        eprintln!("error: no values to format (pass values, --parse <TEXT> or --dump)");
        return ExitCode::from(2);
    }

    let mut status = ExitCode::SUCCESS;
    for raw in &cli.values {
        let value = match parse_value(raw) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::from(2);
            }
        };
        let mut request = FormatRequest::new(value);
        if let Some(name) = &cli.rule_set {
            request = request.rule_set(name.as_str());
        }
        if let Some(mode) = cli.rounding {
            request = request.rounding(mode.into(), cli.max_fraction_digits);
        }
        if cli.capitalize {
            request = request.capitalization(Capitalization::BeginningOfSentence);
        }
        match formatter.format_with(&request) {
            Ok(text) => debug_report::print_format(raw, &text, color),
            Err(err) => {
                eprintln!("error: {raw}: {err}");
                status = ExitCode::from(1);
            }
        }
    }
    status
}

fn build_formatter(cli: &Cli) -> Result<RuleBasedNumberFormat, String> {
    let formatter = match &cli.rules {
        Some(path) => {
            let description = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
            RuleBasedNumberFormat::new(&description, &cli.locale)
        }
        None => match cli.builtin {
            Builtin::Spellout => RuleBasedNumberFormat::spellout(),
            Builtin::Ordinal => RuleBasedNumberFormat::ordinal(),
            Builtin::Duration => RuleBasedNumberFormat::duration(),
        },
    }
    .map_err(|err| err.to_string())?;
    Ok(formatter.with_lenient_parse(cli.lenient))
}

fn parse_value(raw: &str) -> Result<Number, String> {
    match raw.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" => return Ok(Number::Double(f64::INFINITY)),
        "-inf" | "-infinity" => return Ok(Number::Double(f64::NEG_INFINITY)),
        "nan" => return Ok(Number::Double(f64::NAN)),
        _ => {}
    }
    let cleaned = raw.replace('_', "");
    if let Ok(i) = cleaned.parse::<i64>() {
        return Ok(Number::Integer(i));
    }
    BigDecimal::from_str(&cleaned)
        .map(Number::Decimal)
        .map_err(|_| format!("error: '{raw}' is not a number"))
}
