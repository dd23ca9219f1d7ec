pub mod analyzer;
pub mod cache;
pub mod date;
pub mod features;
pub mod garble;
pub mod matching;
pub mod normalize;
pub mod roles;
pub mod scoring;
pub mod spec;

pub use analyzer::{analyze, AnalyzeInput, CandidateAnalysis};
pub use date::{MonthInterval, YearMonth};
pub use features::CandidateFeatures;
pub use scoring::ScoreResult;
pub use spec::{ProjectSpec, RoleSkill, RoleSpec};
