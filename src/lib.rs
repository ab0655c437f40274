//! Rebuilds structured company records from OCR'd table rows.
//!
//! [`parser::Engine`] turns one `|`-joined row into an
//! [`parser::record::ExtractedRecord`] plus QA flags; [`pipeline`] drives
//! batches of stored rows through it; [`layout`] turns raw OCR detections
//! into row texts.

pub mod db;
pub mod error;
pub mod export;
pub mod layout;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod settings;
