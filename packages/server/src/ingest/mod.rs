//! Component evidence ingestion: one multipart submission in, one component
//! row plus its evidence files and rows out.

pub mod category;
pub mod classifier;
pub mod extract;
pub mod folders;
pub mod layout;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod reconcile;
pub mod response;
pub mod uploader;

pub use pipeline::{IngestError, IngestPipeline, Stage};
