//! Narrative context for countries, shown next to audit numbers.
//!
//! Purely presentational: nothing here feeds the score.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Intel {
    pub headline: String,
    pub context: String,
    /// Strategic verdict; `{roi}` is replaced by the score being audited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
}

/// Placeholder for the live ROI score inside a verdict
pub const ROI_PLACEHOLDER: &str = "{roi}";

impl Intel {
    fn new(headline: &str, context: &str, verdict: &str) -> Self {
        Self {
            headline: headline.to_string(),
            context: context.to_string(),
            verdict: Some(verdict.to_string()),
        }
    }

    /// The verdict with the formatted score filled in
    pub fn render_verdict(&self, roi: &str) -> Option<String> {
        self.verdict
            .as_deref()
            .map(|v| v.replace(ROI_PLACEHOLDER, roi))
    }
}

/// Entry returned for countries without a narrative of their own
pub fn fallback_intel() -> Intel {
    Intel::new(
        "Organic Growth Phase",
        "Growth is driven by domestic purchasing power and steady charging build-out. \
         No major policy shock or tariff disruption is on record for this snapshot.",
        "An ROI of {roi} is the plain balance of purchasing power against the market room \
         still untapped.",
    )
}

/// Case-insensitive lookup from country name to narrative
#[derive(Debug, Clone, Default)]
pub struct IntelTable {
    entries: HashMap<String, Intel>,
}

impl IntelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the markets that have a known policy story
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.insert(
            "Germany",
            Intel::new(
                "Subsidy Cliff",
                "The purchase bonus ended abruptly in late 2023 and sales fell sharply in early 2024. \
                 Export tariffs add pressure on the domestic automotive base.",
                "At {roi} the score is held down by policy volatility. Growth was subsidy-led, \
                 not structural, so wealth alone does not earn capital here.",
            ),
        );
        let us = Intel::new(
            "Protected Market",
            "Tariffs on imported EVs shield domestic pricing, and federal tax credits plus the \
             national charging programme lock in demand through the end of the decade.",
            "An ROI of {roi} with growth locked in by long-dated credits. No subsidy cliff is \
             in sight before 2030.",
        );
        table.insert("USA", us.clone());
        table.insert("United States", us);
        table.insert(
            "China",
            Intel::new(
                "Post-Subsidy Price War",
                "National subsidies are gone and OEMs compete on price. Demand holds up without \
                 state aid, but tier-1 city charging is close to saturation.",
                "At {roi} this is a maintenance market. Saturated infrastructure cuts the margin \
                 per new charger.",
            ),
        );
        table.insert(
            "Norway",
            Intel::new(
                "Saturation Trap",
                "Adoption is near the top of the S-curve. Little market room is left, so new \
                 capital here is a maintenance play.",
                "Fully resilient, yet the ROI is only {roi}. Without market room a new fund earns \
                 maintenance yields.",
            ),
        );
        table.insert(
            "Mexico",
            Intel::new(
                "Nearshoring Demand",
                "Commercial fleets electrify to meet supply-chain requirements of US buyers, so \
                 growth does not hinge on consumer subsidies.",
                "An ROI of {roi} driven by industrial necessity. Wide market room makes this a \
                 prime deployment target.",
            ),
        );
        table.insert(
            "India",
            Intel::new(
                "Emerging Growth",
                "Manufacturing incentives and a large unconverted market point to a long runway \
                 with policy tailwinds.",
                "At {roi} the growth trajectory is high and policy supports it.",
            ),
        );
        table.insert(
            "Australia",
            Intel::new(
                "Efficiency Standard Shield",
                "New vehicle efficiency standards protect EV growth independently of purchase \
                 incentives.",
                "An ROI of {roi} with growth protected by regulation rather than rebates.",
            ),
        );
        table
    }

    pub fn insert(&mut self, country: &str, intel: Intel) {
        self.entries.insert(country.trim().to_lowercase(), intel);
    }

    /// Add or replace entries, e.g. from the config file
    pub fn extend(&mut self, overrides: &HashMap<String, Intel>) {
        for (country, intel) in overrides {
            self.insert(country, intel.clone());
        }
    }

    /// Narrative for a country, or the fallback entry
    pub fn lookup(&self, country: &str) -> Intel {
        self.get(country).cloned().unwrap_or_else(fallback_intel)
    }

    pub fn get(&self, country: &str) -> Option<&Intel> {
        self.entries.get(&country.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
