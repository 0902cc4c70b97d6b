pub mod decision;
pub mod defaults;
pub mod pattern;
pub mod rule;
pub mod rules_file;

pub use decision::DecisionReason;
pub use rule::RuleSet;
