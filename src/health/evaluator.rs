use crate::domain::payment::Processor;
use crate::health::state::HealthSnapshot;

/// Default wins unless it is unhealthy and fallback is not. With both down, `tie_break` wins.
pub fn choose(snapshot: &HealthSnapshot, tie_break: Processor) -> Processor {
    match (snapshot.default.healthy, snapshot.fallback.healthy) {
        (true, _) => Processor::Default,
        (false, true) => Processor::Fallback,
        (false, false) => tie_break,
    }
}

/// Processors in the order one settlement round should try them.
pub fn attempt_order(snapshot: &HealthSnapshot, tie_break: Processor) -> [Processor; 2] {
    let first = choose(snapshot, tie_break);
    [first, first.other()]
}
