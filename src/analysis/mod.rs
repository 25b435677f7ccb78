//! Survey statistics engine.
//!
//! Classification of question elements, tallying of answer records and
//! collection of free-text answers.

pub mod aggregator;
pub mod classifier;
pub mod tally;
pub mod text_answers;

pub use aggregator::*;
