use crate::domain::payment::Processor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSummary {
    #[serde(rename = "totalRequests")]
    pub count: u64,
    #[serde(rename = "totalAmount", with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// Settled volume per processor, optionally scoped to a `[from, to)` window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryView {
    pub default: ProcessorSummary,
    pub fallback: ProcessorSummary,
}

impl SummaryView {
    pub fn get(&self, processor: Processor) -> &ProcessorSummary {
        match processor {
            Processor::Default => &self.default,
            Processor::Fallback => &self.fallback,
        }
    }

    pub fn get_mut(&mut self, processor: Processor) -> &mut ProcessorSummary {
        match processor {
            Processor::Default => &mut self.default,
            Processor::Fallback => &mut self.fallback,
        }
    }

    pub fn add(&mut self, processor: Processor, amount: Decimal) {
        let entry = self.get_mut(processor);
        entry.count += 1;
        entry.total_amount += amount;
    }

    pub fn total_count(&self) -> u64 {
        self.default.count + self.fallback.count
    }
}
