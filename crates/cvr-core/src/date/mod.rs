pub mod extract;
pub mod interval;
pub mod tokens;

pub use extract::{extract_intervals, extract_line_intervals};
pub use interval::{merge_intervals, months_to_years, total_months, MonthInterval, YearMonth};
pub use tokens::{month_from_token, normalize_year};
