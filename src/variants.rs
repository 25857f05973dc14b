//! A/B variant generation.
//!
//! Both requests run concurrently and settle independently: one slot failing
//! never discards the other slot's image.

use std::fmt;

use futures::future::join;
use serde::Serialize;

use crate::{
    error::StudioError,
    gemini::ImageClient,
    models::{GenerationResult, ImageGenerationRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariantSlot {
    A,
    B,
}

impl VariantSlot {
    pub fn label(&self) -> &'static str {
        match self {
            VariantSlot::A => "Variant A",
            VariantSlot::B => "Variant B",
        }
    }
}

impl fmt::Display for VariantSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug)]
pub struct VariantOutcome {
    pub slot: VariantSlot,
    pub result: Result<GenerationResult, StudioError>,
}

#[derive(Debug)]
pub struct VariantComparison {
    pub outcomes: [VariantOutcome; 2],
}

impl VariantComparison {
    pub fn successes(&self) -> impl Iterator<Item = (VariantSlot, &GenerationResult)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().map(|r| (outcome.slot, r)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (VariantSlot, &StudioError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|e| (outcome.slot, e)))
    }

    pub fn get(&self, slot: VariantSlot) -> &VariantOutcome {
        match slot {
            VariantSlot::A => &self.outcomes[0],
            VariantSlot::B => &self.outcomes[1],
        }
    }

    pub fn all_failed(&self) -> bool {
        self.successes().next().is_none()
    }
}

/// A keeps the caller's settings, B flips the colour style.
pub fn style_pair(base: ImageGenerationRequest) -> [ImageGenerationRequest; 2] {
    let mut b = base.clone();
    b.config.monochrome = !base.config.monochrome;
    [
        base.with_label(VariantSlot::A.label()),
        b.with_label(VariantSlot::B.label()),
    ]
}

pub async fn generate_ab(
    client: &ImageClient,
    requests: [ImageGenerationRequest; 2],
) -> VariantComparison {
    let [a, b] = requests;
    log::info!("Generating A/B variants");

    let (result_a, result_b) = join(client.generate_variant(a), client.generate_variant(b)).await;

    for (slot, result) in [(VariantSlot::A, &result_a), (VariantSlot::B, &result_b)] {
        if let Err(e) = result {
            log::warn!("{} failed: {}", slot, e);
        }
    }

    VariantComparison {
        outcomes: [
            VariantOutcome {
                slot: VariantSlot::A,
                result: result_a,
            },
            VariantOutcome {
                slot: VariantSlot::B,
                result: result_b,
            },
        ],
    }
}
