pub mod time;

pub use time::{format_date, parse_date, today, Clock, TokioClock, DATE_FORMAT};
