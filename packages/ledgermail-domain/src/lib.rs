pub mod body;
pub mod dates;
pub mod money;
pub mod schedule;
pub mod transaction;
