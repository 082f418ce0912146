#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a lint rule.
///
/// The `kind` arm selects one of the four execution shapes; the function it
/// names must match that shape's signature (see `PatternFn` and friends).
///
/// ```ignore
/// lint_rule! {
///     id: "doubled-punctuation",
///     name: "Doubled punctuation",
///     name_ja: "句読点の重複",
///     severity: Severity::Warning,
///     options: { "max_run" => 1 },
///     guideline: Guideline::JtfStyle,
///     standard: ("JTF日本語標準スタイルガイド", "2.1.3"),
///     kind: pattern(check_doubled_punctuation),
/// }
/// ```
#[macro_export]
macro_rules! lint_rule {
    (
        id: $id:expr,
        name: $name:expr,
        name_ja: $name_ja:expr,
        severity: $severity:expr
        $(, options: { $($opt_key:expr => $opt_val:expr),* $(,)? })?
        $(, modes: [ $($mode:expr),* $(,)? ])?
        $(, guideline: $guideline:expr)?
        $(, standard: ($std_name:expr, $std_section:expr))?
        $(, needs_validation: $needs_validation:expr)?
        , kind: $kind:ident($func:expr)
        $(,)?
    ) => {{
        $crate::Rule {
            id: $id,
            name: $name,
            name_ja: $name_ja,
            kind: $crate::lint_rule!(@kind $kind, $func),
            modes: &[ $($($mode),*)? ],
            guideline: $crate::lint_rule!(@opt $($guideline)?),
            standard: $crate::lint_rule!(@standard $( ($std_name, $std_section) )?),
            needs_validation: { false $(|| $needs_validation)? },
            default_config: || $crate::config::RuleConfig {
                enabled: true,
                severity: $severity,
                options: {
                    #[allow(unused_mut)]
                    let mut map = serde_json::Map::new();
                    $( $( map.insert(($opt_key).to_string(), serde_json::json!($opt_val)); )* )?
                    map
                },
            },
        }
    }};

    (@kind pattern, $func:expr) => { $crate::RuleKind::Pattern($func) };
    (@kind token, $func:expr) => { $crate::RuleKind::Token($func) };
    (@kind document, $func:expr) => { $crate::RuleKind::Document($func) };
    (@kind token_document, $func:expr) => { $crate::RuleKind::TokenDocument($func) };

    (@opt) => { None };
    (@opt $value:expr) => { Some($value) };

    (@standard) => { None };
    (@standard ($name:expr, $section:expr)) => {
        Some($crate::StandardRef { name: $name, section: $section })
    };
}
