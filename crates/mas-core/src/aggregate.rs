//! Complex risk aggregation.
//!
//! Combines per-typology Bayesian scores, contextual multipliers and
//! news-context suppression into one overall risk score with a full
//! audit breakdown. This layer is best-effort on top of an already
//! valid posterior: malformed or missing context degrades to a neutral
//! multiplier with a warning, never to a failed request.

use mas_common::{RiskLevel, Typology};
use mas_config::aggregation::{Timeframe, TraderRole};
use mas_config::AggregationConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::warn;

/// How much of the observed price move contemporaneous public news
/// explains. Derived from the ratio of material events whose direction
/// and magnitude match the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NewsContext {
    FullyExplained,
    PartiallyExplained,
    Unexplained,
}

/// Classify a matched-event ratio in [0,1] into a news context.
/// Out-of-range or non-finite input degrades to `Unexplained`.
pub fn classify_news_context(explained_ratio: f64) -> NewsContext {
    if !explained_ratio.is_finite() || !(0.0..=1.0).contains(&explained_ratio) {
        warn!(ratio = explained_ratio, "news ratio out of range, treating move as unexplained");
        return NewsContext::Unexplained;
    }
    if explained_ratio >= 0.8 {
        NewsContext::FullyExplained
    } else if explained_ratio >= 0.4 {
        NewsContext::PartiallyExplained
    } else {
        NewsContext::Unexplained
    }
}

/// Processed contextual data for one scoring request. Every field is
/// optional; a missing field yields a neutral multiplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TradingContext {
    pub role: Option<TraderRole>,
    /// Traded volume relative to the account's historical baseline.
    pub volume_ratio: Option<f64>,
    pub timeframe: Option<Timeframe>,
    /// Realized volatility of the instrument over the window, in [0,1].
    pub volatility: Option<f64>,
    /// Market liquidity over the window, in [0,1].
    pub liquidity: Option<f64>,
    /// Count of independent insider indicators observed.
    pub insider_indicator_count: usize,
    pub pre_event_trading: bool,
    pub timing_concentration: bool,
    pub cancellation_ratio: Option<f64>,
}

/// Every intermediate value behind an overall score, for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskBreakdown {
    /// Per-typology scores after news suppression, as aggregated.
    pub suppressed_scores: BTreeMap<Typology, f64>,
    pub base_score: f64,
    pub role_multiplier: f64,
    pub volume_multiplier: f64,
    pub timeframe_multiplier: f64,
    pub market_conditions_multiplier: f64,
    pub behavioral_multiplier: f64,
    /// Product of the five contextual multipliers.
    pub contextual_multiplier: f64,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

/// Aggregates validated Bayesian scores with request context.
#[derive(Debug, Clone)]
pub struct RiskAggregator {
    config: AggregationConfig,
}

impl RiskAggregator {
    pub fn new(config: AggregationConfig) -> RiskAggregator {
        RiskAggregator { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Scale a raw typology score for its news context. Applied to the
    /// Bayesian score before aggregation, never after.
    pub fn suppress(&self, raw_score: f64, news: NewsContext) -> f64 {
        let factors = &self.config.news_suppression;
        let factor = match news {
            NewsContext::FullyExplained => factors.fully_explained,
            NewsContext::PartiallyExplained => factors.partially_explained,
            NewsContext::Unexplained => factors.unexplained,
        };
        (raw_score * factor).clamp(0.0, 1.0)
    }

    /// Overall risk in [0,1] for already-suppressed typology scores.
    pub fn calculate_overall_risk(
        &self,
        typology_scores: &BTreeMap<Typology, f64>,
        context: &TradingContext,
    ) -> f64 {
        self.calculate_risk_breakdown(typology_scores, context)
            .overall_score
    }

    /// Full audit breakdown for one request.
    pub fn calculate_risk_breakdown(
        &self,
        typology_scores: &BTreeMap<Typology, f64>,
        context: &TradingContext,
    ) -> RiskBreakdown {
        let mut base_score = 0.0;
        for (typology, score) in typology_scores {
            match self.config.typology_weights.get(typology) {
                Some(weight) => base_score += score.clamp(0.0, 1.0) * weight,
                None => {
                    warn!(%typology, "no aggregation weight configured, score ignored");
                }
            }
        }

        let role_multiplier = self.role_multiplier(context.role);
        let volume_multiplier = self.volume_multiplier(context.volume_ratio);
        let timeframe_multiplier = self.timeframe_multiplier(context.timeframe);
        let market_conditions_multiplier =
            self.market_conditions_multiplier(context.volatility, context.liquidity);
        let behavioral_multiplier = self.behavioral_multiplier(context);

        let contextual_multiplier = role_multiplier
            * volume_multiplier
            * timeframe_multiplier
            * market_conditions_multiplier
            * behavioral_multiplier;

        let overall_score = (base_score * contextual_multiplier).min(1.0).max(0.0);
        let (medium, high) = self.config.risk_thresholds;
        let risk_level = RiskLevel::from_score(overall_score, medium, high);

        let mut breakdown = RiskBreakdown {
            suppressed_scores: typology_scores.clone(),
            base_score,
            role_multiplier,
            volume_multiplier,
            timeframe_multiplier,
            market_conditions_multiplier,
            behavioral_multiplier,
            contextual_multiplier,
            overall_score,
            risk_level,
            explanation: String::new(),
        };
        breakdown.explanation = explain(&breakdown);
        breakdown
    }

    fn role_multiplier(&self, role: Option<TraderRole>) -> f64 {
        let Some(role) = role else {
            warn!("trader role missing, neutral role multiplier");
            return 1.0;
        };
        match self.config.role_multipliers.get(&role) {
            Some(multiplier) => *multiplier,
            None => {
                warn!(?role, "role has no configured multiplier, using neutral");
                1.0
            }
        }
    }

    fn volume_multiplier(&self, ratio: Option<f64>) -> f64 {
        let Some(ratio) = ratio else {
            warn!("volume ratio missing, neutral volume multiplier");
            return 1.0;
        };
        if !ratio.is_finite() || ratio < 0.0 {
            warn!(ratio, "malformed volume ratio, neutral volume multiplier");
            return 1.0;
        }
        for step in &self.config.volume_steps {
            if ratio >= step.threshold {
                return step.multiplier;
            }
        }
        1.0
    }

    fn timeframe_multiplier(&self, timeframe: Option<Timeframe>) -> f64 {
        let Some(timeframe) = timeframe else {
            warn!("timeframe missing, neutral timeframe multiplier");
            return 1.0;
        };
        match self.config.timeframe_multipliers.get(&timeframe) {
            Some(multiplier) => *multiplier,
            None => {
                warn!(?timeframe, "timeframe has no configured multiplier, using neutral");
                1.0
            }
        }
    }

    fn market_conditions_multiplier(&self, volatility: Option<f64>, liquidity: Option<f64>) -> f64 {
        let (Some(volatility), Some(liquidity)) = (volatility, liquidity) else {
            warn!("market conditions incomplete, neutral market multiplier");
            return 1.0;
        };
        if !volatility.is_finite()
            || !liquidity.is_finite()
            || !(0.0..=1.0).contains(&volatility)
            || !(0.0..=1.0).contains(&liquidity)
        {
            warn!(volatility, liquidity, "malformed market conditions, neutral market multiplier");
            return 1.0;
        }
        let raw = ((1.0 + 5.0 * volatility) + (1.0 + 0.3 * (1.0 - liquidity))) / 2.0;
        let (lo, hi) = self.config.market_conditions_clamp;
        raw.clamp(lo, hi)
    }

    fn behavioral_multiplier(&self, context: &TradingContext) -> f64 {
        let bumps = &self.config.behavioral;
        let mut multiplier = 1.0;
        let indicators = context
            .insider_indicator_count
            .min(bumps.max_insider_indicators);
        multiplier += bumps.per_insider_indicator * indicators as f64;
        if context.pre_event_trading {
            multiplier += bumps.pre_event_trading;
        }
        if context.timing_concentration {
            multiplier += bumps.timing_concentration;
        }
        match context.cancellation_ratio {
            Some(ratio) if ratio.is_finite() && ratio >= bumps.cancellation_threshold => {
                multiplier += bumps.high_cancellation_ratio;
            }
            Some(ratio) if !ratio.is_finite() => {
                warn!(ratio, "malformed cancellation ratio, bump skipped");
            }
            _ => {}
        }
        multiplier.min(bumps.cap)
    }
}

fn explain(b: &RiskBreakdown) -> String {
    let mut out = String::new();
    let _ = write!(out, "base {:.3} (", b.base_score);
    let mut first = true;
    for (typology, score) in &b.suppressed_scores {
        if !first {
            out.push_str(", ");
        }
        let _ = write!(out, "{typology}={score:.3}");
        first = false;
    }
    let _ = write!(
        out,
        "); context x{:.3} [role x{:.2}, volume x{:.2}, timeframe x{:.2}, market x{:.2}, behavior x{:.2}]; overall {:.3} ({})",
        b.contextual_multiplier,
        b.role_multiplier,
        b.volume_multiplier,
        b.timeframe_multiplier,
        b.market_conditions_multiplier,
        b.behavioral_multiplier,
        b.overall_score,
        b.risk_level,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> RiskAggregator {
        RiskAggregator::new(AggregationConfig::default())
    }

    fn scores(insider: f64, spoofing: f64) -> BTreeMap<Typology, f64> {
        let mut scores = BTreeMap::new();
        scores.insert(Typology::InsiderDealing, insider);
        scores.insert(Typology::Spoofing, spoofing);
        scores
    }

    #[test]
    fn empty_context_is_fully_neutral() {
        let breakdown =
            aggregator().calculate_risk_breakdown(&scores(0.5, 0.5), &TradingContext::default());
        assert_eq!(breakdown.contextual_multiplier, 1.0);
        assert!((breakdown.overall_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn base_is_the_weighted_typology_sum() {
        let breakdown =
            aggregator().calculate_risk_breakdown(&scores(0.8, 0.2), &TradingContext::default());
        assert!((breakdown.base_score - (0.8 * 0.6 + 0.2 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn overall_capped_at_one() {
        let context = TradingContext {
            role: Some(TraderRole::Executive),
            volume_ratio: Some(10.0),
            timeframe: Some(Timeframe::Intraday),
            volatility: Some(1.0),
            liquidity: Some(0.0),
            insider_indicator_count: 5,
            pre_event_trading: true,
            timing_concentration: true,
            cancellation_ratio: Some(0.9),
        };
        let breakdown = aggregator().calculate_risk_breakdown(&scores(1.0, 1.0), &context);
        assert_eq!(breakdown.overall_score, 1.0);
        assert_eq!(breakdown.risk_level, RiskLevel::High);
    }

    #[test]
    fn fully_explained_news_halves_the_raw_score() {
        let aggregator = aggregator();
        let raw = 0.8;
        let suppressed = aggregator.suppress(raw, NewsContext::FullyExplained);
        assert!((suppressed - raw / 2.0).abs() < 1e-12);
        assert_eq!(aggregator.suppress(raw, NewsContext::Unexplained), raw);
        assert!((aggregator.suppress(raw, NewsContext::PartiallyExplained) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn news_classification_thresholds() {
        assert_eq!(classify_news_context(1.0), NewsContext::FullyExplained);
        assert_eq!(classify_news_context(0.8), NewsContext::FullyExplained);
        assert_eq!(classify_news_context(0.5), NewsContext::PartiallyExplained);
        assert_eq!(classify_news_context(0.1), NewsContext::Unexplained);
        assert_eq!(classify_news_context(f64::NAN), NewsContext::Unexplained);
        assert_eq!(classify_news_context(1.5), NewsContext::Unexplained);
    }

    #[test]
    fn market_conditions_formula_and_clamp() {
        let aggregator = aggregator();
        let m = aggregator.market_conditions_multiplier(Some(0.1), Some(0.5));
        let expected = ((1.0 + 0.5) + (1.0 + 0.3 * 0.5)) / 2.0;
        assert!((m - expected).abs() < 1e-12);
        // Pathological volatility hits the upper clamp.
        assert_eq!(aggregator.market_conditions_multiplier(Some(1.0), Some(0.0)), 2.0);
    }

    #[test]
    fn malformed_market_data_degrades_to_neutral() {
        let aggregator = aggregator();
        assert_eq!(aggregator.market_conditions_multiplier(Some(f64::NAN), Some(0.5)), 1.0);
        assert_eq!(aggregator.market_conditions_multiplier(Some(0.2), None), 1.0);
        assert_eq!(aggregator.volume_multiplier(Some(-3.0)), 1.0);
    }

    #[test]
    fn behavioral_bumps_add_and_cap() {
        let aggregator = aggregator();
        let context = TradingContext {
            insider_indicator_count: 2,
            pre_event_trading: true,
            cancellation_ratio: Some(0.75),
            ..TradingContext::default()
        };
        let m = aggregator.behavioral_multiplier(&context);
        assert!((m - (1.0 + 0.30 + 0.20 + 0.20)).abs() < 1e-12);

        let extreme = TradingContext {
            insider_indicator_count: 10,
            pre_event_trading: true,
            timing_concentration: true,
            cancellation_ratio: Some(1.0),
            ..TradingContext::default()
        };
        assert_eq!(aggregator.behavioral_multiplier(&extreme), 2.0);
    }

    #[test]
    fn volume_steps_pick_highest_matching() {
        let aggregator = aggregator();
        assert_eq!(aggregator.volume_multiplier(Some(6.0)), 1.4);
        assert_eq!(aggregator.volume_multiplier(Some(3.0)), 1.2);
        assert_eq!(aggregator.volume_multiplier(Some(1.0)), 1.0);
    }

    #[test]
    fn explanation_names_every_multiplier() {
        let breakdown =
            aggregator().calculate_risk_breakdown(&scores(0.7, 0.3), &TradingContext::default());
        for needle in ["base", "role", "volume", "timeframe", "market", "behavior", "overall"] {
            assert!(breakdown.explanation.contains(needle), "missing {needle}");
        }
    }
}
