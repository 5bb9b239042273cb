// Job matching engine: text similarity ranking, the reports-to hierarchy rule,
// grade-factor aggregation and the cascading factor lookup.
// Everything here works on a borrowed catalog snapshot and keeps no state.

pub mod factors;
pub mod handlers;
pub mod hierarchy;
pub mod lookup;
pub mod ranker;
pub mod search;
