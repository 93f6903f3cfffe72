//! Data models for SustainLens.

mod analysis;

pub use analysis::{
    AnalysisRequest, AnalysisResult, FileUpload, ResultShapeError, SdgChartEntry,
    StoredClassifications,
};
