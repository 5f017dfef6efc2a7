//! The five in-scope attribution models (§4.4).
//!
//! Grounded on `examples/original_source/attribution/services/attribution/engine.go`'s
//! `FirstTouchModel`/`LastTouchModel`/`LinearModel`/`TimeDecayModel`/
//! `PositionBasedModel`. The revenue-remainder rule (assign the last
//! touchpoint the leftover so `Σrevenue == total_revenue` within 1e-6) is not
//! in that source; it is required here and applied uniformly.

use std::collections::HashMap;

use attribution_core::{AttributionData, AttributionResult, CoreError, Journey, Touchpoint};

/// A pure, deterministic mapping from a journey to an attribution result.
/// Implementors carry their own parameters (decay rate, position shares);
/// the registry only ever calls `name()` and `calculate()`.
pub trait AttributionModel: Send + Sync {
    fn name(&self) -> &'static str;
    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError>;
}

/// Touchpoints in ascending-timestamp order, ties broken by id, so every
/// model sees a deterministic ordering (§4.4, §8 "Position permutation").
fn sorted_touchpoints(journey: &Journey) -> Vec<&Touchpoint> {
    let mut sorted: Vec<&Touchpoint> = journey.touchpoints.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    sorted
}

fn time_delta_ms(conversion_ts: i64, touchpoint_ts: i64) -> i64 {
    conversion_ts - touchpoint_ts
}

/// Forces `Σrevenue == total_revenue` by handing the touchpoint with the
/// highest `position` whatever is left after the others are paid from their
/// provisional `credit * total_revenue` share.
fn assign_remainder(attribution: &mut HashMap<String, AttributionData>, total_revenue: f64) {
    let Some(last_id) = attribution
        .values()
        .max_by_key(|d| d.position)
        .map(|d| d.touchpoint_id.clone())
    else {
        return;
    };
    let others: f64 = attribution
        .values()
        .filter(|d| d.touchpoint_id != last_id)
        .map(|d| d.revenue)
        .sum();
    if let Some(last) = attribution.get_mut(&last_id) {
        last.revenue = total_revenue - others;
    }
}

fn envelope(
    journey: &Journey,
    model_name: &'static str,
    attribution: HashMap<String, AttributionData>,
) -> AttributionResult {
    AttributionResult {
        user_id: journey.user_id.clone(),
        session_id: journey.session_id.clone(),
        app_id: journey.app_id.clone(),
        model_type: model_name.to_string(),
        attribution,
        total_revenue: journey.total_revenue,
        calculated_at: journey.journey_end,
        journey_length: journey.touchpoints.len(),
        time_to_convert: journey.journey_end - journey.journey_start,
    }
}

fn datum(touch: &Touchpoint, credit: f64, revenue: f64, position: usize, conversion_ts: i64) -> AttributionData {
    AttributionData {
        touchpoint_id: touch.id.clone(),
        campaign_id: touch.campaign_id.clone(),
        network_id: touch.network_id.clone(),
        credit,
        revenue,
        position,
        time_delta: time_delta_ms(conversion_ts, touch.timestamp),
    }
}

/// Earliest touchpoint gets all credit and revenue; others are absent from
/// the result map.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstTouchModel;

impl AttributionModel for FirstTouchModel {
    fn name(&self) -> &'static str {
        "first_touch"
    }

    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError> {
        let sorted = sorted_touchpoints(journey);
        let first = sorted[0];
        let mut attribution = HashMap::new();
        attribution.insert(
            first.id.clone(),
            datum(first, 1.0, journey.total_revenue, 1, journey.journey_end),
        );
        Ok(envelope(journey, self.name(), attribution))
    }
}

/// Latest touchpoint gets all credit and revenue.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastTouchModel;

impl AttributionModel for LastTouchModel {
    fn name(&self) -> &'static str {
        "last_touch"
    }

    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError> {
        let sorted = sorted_touchpoints(journey);
        let last = *sorted.last().expect("non-empty journey");
        let mut attribution = HashMap::new();
        attribution.insert(
            last.id.clone(),
            datum(
                last,
                1.0,
                journey.total_revenue,
                sorted.len(),
                journey.journey_end,
            ),
        );
        Ok(envelope(journey, self.name(), attribution))
    }
}

/// Every touchpoint gets equal credit `1/N` and equal revenue share.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearModel;

impl AttributionModel for LinearModel {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError> {
        let sorted = sorted_touchpoints(journey);
        let n = sorted.len() as f64;
        let credit = 1.0 / n;
        let revenue_per_touch = journey.total_revenue / n;

        let mut attribution = HashMap::new();
        for (i, touch) in sorted.iter().enumerate() {
            attribution.insert(
                touch.id.clone(),
                datum(touch, credit, revenue_per_touch, i + 1, journey.journey_end),
            );
        }
        assign_remainder(&mut attribution, journey.total_revenue);
        Ok(envelope(journey, self.name(), attribution))
    }
}

/// Exponential time decay: `weight_i = exp(-decay_rate * hours_i)` where
/// `hours_i` is the hours between the touchpoint and the conversion.
/// `decay_rate <= 0` substitutes the default of 0.1/hour.
#[derive(Debug, Clone, Copy)]
pub struct TimeDecayModel {
    decay_rate: f64,
}

impl TimeDecayModel {
    pub const DEFAULT_DECAY_RATE: f64 = 0.1;

    #[must_use]
    pub fn new(decay_rate: f64) -> Self {
        let decay_rate = if decay_rate > 0.0 {
            decay_rate
        } else {
            Self::DEFAULT_DECAY_RATE
        };
        Self { decay_rate }
    }
}

impl Default for TimeDecayModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DECAY_RATE)
    }
}

impl AttributionModel for TimeDecayModel {
    fn name(&self) -> &'static str {
        "time_decay"
    }

    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError> {
        let sorted = sorted_touchpoints(journey);

        let weights: Vec<f64> = sorted
            .iter()
            .map(|touch| {
                let hours = (journey.journey_end - touch.timestamp) as f64 / 3600_000.0;
                (-self.decay_rate * hours).exp()
            })
            .collect();
        let total_weight: f64 = weights.iter().sum();

        let mut attribution = HashMap::new();
        for (i, (touch, weight)) in sorted.iter().zip(weights.iter()).enumerate() {
            let credit = weight / total_weight;
            let revenue = credit * journey.total_revenue;
            attribution.insert(
                touch.id.clone(),
                datum(touch, credit, revenue, i + 1, journey.journey_end),
            );
        }
        assign_remainder(&mut attribution, journey.total_revenue);
        Ok(envelope(journey, self.name(), attribution))
    }
}

/// Position-based ("U-shaped") attribution. `first + last + middle` must sum
/// to `1.0 ± 1e-9`. `N == 1` gives the sole touchpoint full credit; `N == 2`
/// forces an even 0.5/0.5 split regardless of the configured shares (§4.4,
/// §9 documented corner case); `N >= 3` gives first/last their configured
/// shares and splits `middle` equally across the touchpoints between them.
#[derive(Debug, Clone, Copy)]
pub struct PositionBasedModel {
    first: f64,
    last: f64,
    middle: f64,
}

impl PositionBasedModel {
    pub const DEFAULT_FIRST: f64 = 0.4;
    pub const DEFAULT_LAST: f64 = 0.4;
    pub const DEFAULT_MIDDLE: f64 = 0.2;

    pub fn new(first: f64, last: f64, middle: f64) -> Result<Self, CoreError> {
        let sum = first + last + middle;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(CoreError::InvalidParameters(format!(
                "first + last + middle must sum to 1.0, got {sum}"
            )));
        }
        Ok(Self {
            first,
            last,
            middle,
        })
    }
}

impl Default for PositionBasedModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIRST, Self::DEFAULT_LAST, Self::DEFAULT_MIDDLE)
            .expect("default shares sum to 1.0")
    }
}

impl AttributionModel for PositionBasedModel {
    fn name(&self) -> &'static str {
        "position_based"
    }

    fn calculate(&self, journey: &Journey) -> Result<AttributionResult, CoreError> {
        let sorted = sorted_touchpoints(journey);
        let n = sorted.len();
        let mut attribution = HashMap::new();

        if n == 1 {
            let touch = sorted[0];
            attribution.insert(
                touch.id.clone(),
                datum(touch, 1.0, journey.total_revenue, 1, journey.journey_end),
            );
        } else if n == 2 {
            let (first_credit, last_credit) = (0.5, 0.5);
            attribution.insert(
                sorted[0].id.clone(),
                datum(
                    sorted[0],
                    first_credit,
                    first_credit * journey.total_revenue,
                    1,
                    journey.journey_end,
                ),
            );
            attribution.insert(
                sorted[1].id.clone(),
                datum(
                    sorted[1],
                    last_credit,
                    last_credit * journey.total_revenue,
                    2,
                    journey.journey_end,
                ),
            );
        } else {
            let first_touch = sorted[0];
            attribution.insert(
                first_touch.id.clone(),
                datum(
                    first_touch,
                    self.first,
                    self.first * journey.total_revenue,
                    1,
                    journey.journey_end,
                ),
            );

            let last_touch = sorted[n - 1];
            attribution.insert(
                last_touch.id.clone(),
                datum(
                    last_touch,
                    self.last,
                    self.last * journey.total_revenue,
                    n,
                    journey.journey_end,
                ),
            );

            let middle = &sorted[1..n - 1];
            let middle_credit = self.middle / middle.len() as f64;
            let middle_revenue = middle_credit * journey.total_revenue;
            for (i, touch) in middle.iter().enumerate() {
                attribution.insert(
                    touch.id.clone(),
                    datum(touch, middle_credit, middle_revenue, i + 2, journey.journey_end),
                );
            }
        }

        assign_remainder(&mut attribution, journey.total_revenue);
        Ok(envelope(journey, self.name(), attribution))
    }
}
