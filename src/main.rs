use std::io::{self, Read};
use std::sync::Arc;

use kousei::token::UnavailableTokenizer;
use kousei::{CorrectionConfig, Document, Linter, Mode, Severity};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).with_target(false).init();

    let mut correction = CorrectionConfig::default();
    correction.mode = config.mode;

    // The demo binary has no morphological analyzer attached; pattern and
    // document rules still run, token rules are skipped.
    let mut linter = Linter::with_default_rules(Arc::new(UnavailableTokenizer));
    let doc = Document::new(&config.input);
    let report = linter.lint(&doc, &correction);

    if config.json {
        match serde_json::to_string_pretty(&report.issues) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: failed to serialize report: {err}");
                std::process::exit(1);
            }
        }
    } else {
        print_report(&doc, &report);
    }

    for fault in &report.faults {
        if let Some(rule) = fault.rule_id {
            eprintln!("note: rule {rule} failed: {}", fault.detail);
        }
    }

    if report.issues.iter().any(|i| i.severity == Severity::Error) {
        std::process::exit(1);
    }
}

fn print_report(doc: &Document, report: &kousei::LintReport) {
    if report.issues.is_empty() {
        println!("no issues found");
        return;
    }
    for issue in &report.issues {
        let excerpt = doc
            .paragraph(issue.paragraph)
            .map(|p| kousei::segment::slice(p.text(), issue.span))
            .unwrap_or("");
        println!(
            "{}:{}-{} [{}] {}: {}",
            issue.paragraph + 1,
            issue.span.from,
            issue.span.to,
            severity_label(issue.severity),
            issue.rule_id,
            issue.message_ja,
        );
        if !excerpt.is_empty() {
            println!("    「{excerpt}」");
        }
        if let Some(fix) = &issue.fix {
            println!("    → {}: 「{}」", fix.label, fix.replacement);
        }
    }
    println!("{} issue(s)", report.issues.len());
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

struct CliConfig {
    input: String,
    mode: Mode,
    json: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut mode = Mode::Novel;
    let mut json = false;
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("kousei {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--json" => json = true,
            "--mode" => {
                let value = args.next().ok_or_else(|| "error: --mode expects a value".to_string())?;
                mode = parse_mode(&value)?;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--mode=") => {
                mode = parse_mode(arg.trim_start_matches("--mode="))?;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(arg);
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, mode, json })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    match value {
        "novel" => Ok(Mode::Novel),
        "official" => Ok(Mode::Official),
        "blog" => Ok(Mode::Blog),
        "academic" => Ok(Mode::Academic),
        "sns" => Ok(Mode::Sns),
        other => Err(format!("error: invalid --mode '{other}' (expected novel|official|blog|academic|sns)")),
    }
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "kousei {}: Japanese prose linter

USAGE:
    kousei [OPTIONS] [TEXT]
    kousei < draft.txt

ARGS:
    TEXT                  Text to lint; read from stdin when omitted

OPTIONS:
    -i, --input <TEXT>    Text to lint (alternative to the positional form)
        --mode <MODE>     Writing mode: novel|official|blog|academic|sns [default: novel]
        --json            Print issues as JSON instead of the report view
    -h, --help            Print this help
    -V, --version         Print the version

Exit status is 1 when any error-severity issue is found, 2 on usage errors.",
        env!("CARGO_PKG_VERSION")
    )
}
