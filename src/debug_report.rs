use rbnf::{ParseOutcome, RuleBasedNumberFormat};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Table of every compiled rule set, then the description as it prints back.
pub fn print_rule_sets(formatter: &RuleBasedNumberFormat, locale: &str, color: bool) {
    let palette = ansi::Palette::new(color);
    let rules = formatter.rules();

    println!("\n{}", palette.paint("━━━ Rule sets ━━━", ansi::GRAY));
    let width = rules.info().iter().map(|info| info.name.chars().count()).max().unwrap_or(0);
    for info in rules.info() {
        let is_default = info.name == formatter.default_rule_set_name();
        let marker = if is_default { palette.paint("*", ansi::GREEN) } else { " ".to_string() };
        let name = format!("{:width$}", info.name);
        let name = if info.public { palette.bold(palette.paint(name, ansi::BLUE)) } else { palette.dim(name) };

        let mut flags = Vec::new();
        if info.fraction {
            flags.push("fraction");
        }
        if !info.parseable {
            flags.push("noparse");
        }
        let display = if info.public {
            palette.paint(format!("\"{}\"", formatter.display_name(&info.name, Some(locale))), ansi::CYAN)
        } else {
            String::new()
        };

        println!(
            "  {} {} {} {}  {} {}",
            marker,
            name,
            palette.dim("│"),
            palette.paint(format!("{:>3} rules", info.rule_count), ansi::YELLOW),
            palette.dim(flags.join(" ")),
            display,
        );
    }

    let locales = formatter.display_name_locales();
    if !locales.is_empty() {
        println!("  {} {}", palette.dim("display names:"), locales.join(", "));
    }

    println!("\n{}", palette.paint("━━━ Description ━━━", ansi::GRAY));
    for line in formatter.to_string().lines() {
        println!("  {}", palette.dim(line));
    }
    println!();
}

pub fn print_format(input: &str, text: &str, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("{} {} {}", palette.paint(input, ansi::YELLOW), palette.dim("→"), palette.bold(palette.paint(text, ansi::GREEN)));
}

pub fn print_parse(input: &str, outcome: &ParseOutcome, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Parsing: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    println!("  {}", palette.bold(palette.paint(outcome.value.to_string(), ansi::GREEN)));
    println!(
        "      {} {}  {} {}",
        palette.dim("rule set:"),
        palette.paint(&outcome.rule_set, ansi::BLUE),
        palette.dim("│ matched:"),
        palette.paint(format!("\"{}\"", input.get(..outcome.consumed).unwrap_or(input)), ansi::CYAN)
    );
    if outcome.consumed < input.len() {
        let rest = input.get(outcome.consumed..).unwrap_or_default();
        println!("      {} {}", palette.dim("unparsed:"), palette.paint(format!("\"{rest}\""), ansi::YELLOW));
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", outcome.elapsed), ansi::GREEN));
    println!();
}
