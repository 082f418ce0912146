//! Correction configuration: what runs, how, and what a change invalidates.
//!
//! [`CorrectionConfig`] is the single source of truth for a lint pass. It is
//! persisted by the host's settings store and passed in on every pass along
//! with a classified [`ChangeReason`] describing why it differs from the
//! previous one. The reason, not the field that changed, is the contract
//! that determines cache lifetime:
//!
//! ```text
//! change reason        issue cache   verdict cache   re-run
//! -------------        -----------   -------------   ------
//! text-edit            (hash-keyed)  kept            affected paragraphs
//! rule-config-change   dropped       kept            everything
//! mode-change          dropped       dropped         everything
//! manual-refresh       dropped       dropped         everything
//! guideline-change     dropped       dropped         everything
//! model-change         kept          dropped         validation only
//! ignored-correction   kept          kept            nothing
//! ```
//!
//! Any new configuration field must be assigned one of these reasons before
//! it can safely affect cached state; [`classify_change`] is the one place
//! that assignment lives.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Rule, Severity, Span};

// --- Modes and guidelines ----------------------------------------------------

/// User-selectable writing context. Rules may restrict themselves to a
/// subset of modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Novel,
    Official,
    Blog,
    Academic,
    Sns,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Novel
    }
}

/// A named style standard the author can activate. A guideline-bound rule
/// only runs while its guideline is in [`CorrectionConfig::guidelines`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Guideline {
    /// JTF日本語標準スタイルガイド.
    JtfStyle,
    /// 公用文作成の考え方 (government writing conventions).
    Koyobun,
    /// 記者ハンドブック (news style).
    KishaHandbook,
}

// --- Per-rule configuration --------------------------------------------------

/// Effective configuration of one rule: whether it runs, at which severity,
/// and its free-form options (thresholds and the like). Each rule defines a
/// default; user overrides are merged on top by [`CorrectionConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub enabled: bool,
    pub severity: Severity,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// A user's partial override of one rule's configuration. `None` fields
/// keep the rule default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Option entries merged over the rule's default options.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

// --- LLM and ignored corrections ---------------------------------------------

/// Settings of the LLM second-opinion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Identifier of the judging model, as understood by the inference
    /// backend.
    pub model_id: String,
    /// Minimum quiet time after an edit before validation is attempted.
    pub cooldown_ms: u64,
    /// Master switch for the validation layer.
    pub validation_enabled: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            model_id: "qwen2.5:7b-instruct".to_string(),
            cooldown_ms: 1500,
            validation_enabled: true,
        }
    }
}

/// A finding the author chose to keep as intentional. Matching is by rule,
/// span and paragraph content hash, so an edit to the paragraph naturally
/// un-ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredCorrection {
    pub rule_id: String,
    pub paragraph: usize,
    pub from: usize,
    pub to: usize,
    pub paragraph_hash: u64,
}

// --- The configuration root --------------------------------------------------

/// Single source of truth for a lint pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Master switch; `false` yields an empty report without running rules.
    pub enabled: bool,
    pub mode: Mode,
    /// Active style standards.
    pub guidelines: BTreeSet<Guideline>,
    /// Per-rule partial overrides, keyed by rule id.
    #[serde(default)]
    pub rule_overrides: HashMap<String, RuleOverride>,
    pub llm: LlmConfig,
    /// Findings the author accepted as intentional.
    #[serde(default)]
    pub ignored: Vec<IgnoredCorrection>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        CorrectionConfig {
            enabled: true,
            mode: Mode::default(),
            guidelines: BTreeSet::from([Guideline::JtfStyle, Guideline::Koyobun]),
            rule_overrides: HashMap::new(),
            llm: LlmConfig::default(),
            ignored: Vec::new(),
        }
    }
}

impl CorrectionConfig {
    /// Resolve the effective configuration of `rule` under this config.
    ///
    /// Returns `None` when the rule does not run at all: engine disabled,
    /// mode not covered, guideline inactive, or disabled by default/override.
    pub fn resolve(&self, rule: &Rule) -> Option<RuleConfig> {
        if !self.enabled {
            return None;
        }
        if !rule.modes.is_empty() && !rule.modes.contains(&self.mode) {
            return None;
        }
        if let Some(guideline) = rule.guideline {
            if !self.guidelines.contains(&guideline) {
                return None;
            }
        }

        let mut config = (rule.default_config)();
        if let Some(over) = self.rule_overrides.get(rule.id) {
            if let Some(enabled) = over.enabled {
                config.enabled = enabled;
            }
            if let Some(severity) = over.severity {
                config.severity = severity;
            }
            for (key, value) in &over.options {
                config.options.insert(key.clone(), value.clone());
            }
        }

        config.enabled.then_some(config)
    }

    /// True when the author has marked an equivalent finding as intentional.
    pub fn is_ignored(&self, issue: &crate::LintIssue, paragraph_hash: u64) -> bool {
        self.ignored.iter().any(|ig| {
            ig.rule_id == issue.rule_id
                && ig.paragraph == issue.paragraph
                && Span::new(ig.from, ig.to) == issue.span
                && ig.paragraph_hash == paragraph_hash
        })
    }
}

// --- Change classification ---------------------------------------------------

bitflags::bitflags! {
    /// Which caches a configuration change invalidates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CacheScope: u8 {
        /// The per-paragraph issue cache.
        const ISSUES = 1 << 0;
        /// The LLM verdict cache.
        const VERDICTS = 1 << 1;
    }
}

/// How much of the document must be re-linted after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerunScope {
    /// Nothing to re-run (presentation-only change).
    None,
    /// Only paragraphs whose content changed; unchanged paragraphs are
    /// served from the issue cache by content hash.
    AffectedParagraphs,
    /// Every paragraph.
    All,
}

/// Closed classification of *why* the configuration (or text) changed.
/// Each reason carries a fixed invalidation contract; see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeReason {
    TextEdit,
    RuleConfigChange,
    ModeChange,
    ManualRefresh,
    GuidelineChange,
    ModelChange,
    IgnoredCorrection,
}

impl ChangeReason {
    /// Caches dropped by this change.
    pub fn invalidates(self) -> CacheScope {
        match self {
            // Hash-keyed issue entries for edited paragraphs miss naturally;
            // nothing needs an explicit drop.
            ChangeReason::TextEdit => CacheScope::empty(),
            ChangeReason::RuleConfigChange => CacheScope::ISSUES,
            ChangeReason::ModeChange | ChangeReason::ManualRefresh | ChangeReason::GuidelineChange => {
                CacheScope::ISSUES | CacheScope::VERDICTS
            }
            // The judging model changed, not the issues themselves.
            ChangeReason::ModelChange => CacheScope::VERDICTS,
            ChangeReason::IgnoredCorrection => CacheScope::empty(),
        }
    }

    /// Lint scope required after this change.
    pub fn rerun(self) -> RerunScope {
        match self {
            ChangeReason::TextEdit => RerunScope::AffectedParagraphs,
            ChangeReason::RuleConfigChange
            | ChangeReason::ModeChange
            | ChangeReason::ManualRefresh
            | ChangeReason::GuidelineChange => RerunScope::All,
            // Issues stand; only validation verdicts must be recomputed.
            ChangeReason::ModelChange => RerunScope::None,
            ChangeReason::IgnoredCorrection => RerunScope::None,
        }
    }
}

/// Classify the difference between two configurations into the strongest
/// applicable [`ChangeReason`].
///
/// Returns `None` when the configs are identical, and also when they differ
/// only in scheduling fields (validation cooldown/toggle) that no cached
/// state depends on. Text edits are not visible here (the text is not part
/// of the config); hosts report those as [`ChangeReason::TextEdit`]
/// directly.
pub fn classify_change(old: &CorrectionConfig, new: &CorrectionConfig) -> Option<ChangeReason> {
    if old.mode != new.mode {
        return Some(ChangeReason::ModeChange);
    }
    if old.guidelines != new.guidelines {
        return Some(ChangeReason::GuidelineChange);
    }
    if old.enabled != new.enabled || old.rule_overrides != new.rule_overrides {
        return Some(ChangeReason::RuleConfigChange);
    }
    if old.llm.model_id != new.llm.model_id {
        return Some(ChangeReason::ModelChange);
    }
    if old.ignored != new.ignored {
        return Some(ChangeReason::IgnoredCorrection);
    }
    // Remaining fields (cooldown, validation toggle) affect scheduling, not
    // cached state: nothing to invalidate, nothing to re-run.
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RuleContext, Severity};

    fn noop_pattern(
        _ctx: &RuleContext,
        _text: &str,
    ) -> anyhow::Result<Vec<crate::LintIssue>> {
        Ok(Vec::new())
    }

    fn sample_rule() -> Rule {
        lint_rule! {
            id: "sample",
            name: "Sample",
            name_ja: "サンプル",
            severity: Severity::Info,
            options: { "threshold" => 3 },
            modes: [Mode::Novel, Mode::Blog],
            guideline: Guideline::JtfStyle,
            kind: pattern(noop_pattern),
        }
    }

    #[test]
    fn resolve_applies_mode_and_guideline_gating() {
        let rule = sample_rule();

        let config = CorrectionConfig::default();
        assert!(config.resolve(&rule).is_some());

        let mut official = config.clone();
        official.mode = Mode::Official;
        assert!(official.resolve(&rule).is_none());

        let mut no_guideline = config.clone();
        no_guideline.guidelines.remove(&Guideline::JtfStyle);
        assert!(no_guideline.resolve(&rule).is_none());

        let mut disabled = config.clone();
        disabled.enabled = false;
        assert!(disabled.resolve(&rule).is_none());
    }

    #[test]
    fn resolve_merges_overrides_over_defaults() {
        let rule = sample_rule();
        let mut config = CorrectionConfig::default();
        config.rule_overrides.insert(
            "sample".to_string(),
            RuleOverride {
                enabled: None,
                severity: Some(Severity::Error),
                options: serde_json::Map::from_iter([(
                    "threshold".to_string(),
                    serde_json::json!(5),
                )]),
            },
        );

        let effective = config.resolve(&rule).unwrap();
        assert_eq!(effective.severity, Severity::Error);
        assert_eq!(effective.options.get("threshold"), Some(&serde_json::json!(5)));

        config.rule_overrides.insert(
            "sample".to_string(),
            RuleOverride { enabled: Some(false), ..Default::default() },
        );
        assert!(config.resolve(&rule).is_none());
    }

    #[test]
    fn invalidation_contract_matches_reason() {
        use ChangeReason::*;

        assert_eq!(TextEdit.invalidates(), CacheScope::empty());
        assert_eq!(RuleConfigChange.invalidates(), CacheScope::ISSUES);
        assert_eq!(ModeChange.invalidates(), CacheScope::ISSUES | CacheScope::VERDICTS);
        assert_eq!(ManualRefresh.invalidates(), CacheScope::ISSUES | CacheScope::VERDICTS);
        assert_eq!(GuidelineChange.invalidates(), CacheScope::ISSUES | CacheScope::VERDICTS);
        assert_eq!(ModelChange.invalidates(), CacheScope::VERDICTS);
        assert_eq!(IgnoredCorrection.invalidates(), CacheScope::empty());

        assert_eq!(TextEdit.rerun(), RerunScope::AffectedParagraphs);
        assert_eq!(ModeChange.rerun(), RerunScope::All);
        assert_eq!(ModelChange.rerun(), RerunScope::None);
        assert_eq!(IgnoredCorrection.rerun(), RerunScope::None);
    }

    #[test]
    fn classify_change_picks_strongest_reason() {
        let base = CorrectionConfig::default();
        assert_eq!(classify_change(&base, &base), None);

        let mut mode = base.clone();
        mode.mode = Mode::Official;
        // Mode wins even when other fields changed too.
        mode.llm.model_id = "other".to_string();
        assert_eq!(classify_change(&base, &mode), Some(ChangeReason::ModeChange));

        let mut guideline = base.clone();
        guideline.guidelines.insert(Guideline::KishaHandbook);
        assert_eq!(classify_change(&base, &guideline), Some(ChangeReason::GuidelineChange));

        let mut rules = base.clone();
        rules
            .rule_overrides
            .insert("sample".to_string(), RuleOverride { enabled: Some(false), ..Default::default() });
        assert_eq!(classify_change(&base, &rules), Some(ChangeReason::RuleConfigChange));

        let mut model = base.clone();
        model.llm.model_id = "other".to_string();
        assert_eq!(classify_change(&base, &model), Some(ChangeReason::ModelChange));

        let mut ignored = base.clone();
        ignored.ignored.push(IgnoredCorrection {
            rule_id: "sample".to_string(),
            paragraph: 0,
            from: 0,
            to: 1,
            paragraph_hash: 42,
        });
        assert_eq!(classify_change(&base, &ignored), Some(ChangeReason::IgnoredCorrection));
    }

    #[test]
    fn scheduling_only_changes_invalidate_nothing() {
        let base = CorrectionConfig::default();

        let mut cooldown = base.clone();
        cooldown.llm.cooldown_ms = 3000;
        assert_eq!(classify_change(&base, &cooldown), None);

        let mut toggled = base.clone();
        toggled.llm.validation_enabled = false;
        assert_eq!(classify_change(&base, &toggled), None);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = CorrectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: CorrectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
