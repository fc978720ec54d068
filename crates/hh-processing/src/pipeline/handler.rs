//! The closed set of preprocessing stages.
//!
//! Each concrete handler implements [`Transform`]; [`Handler`] wraps them in
//! one enum so a chain is a plain `Vec<Handler>` dispatched with a `match`.

use crate::error::Result;
use crate::handlers::{
    Assembler, CarOwnershipParser, CategoricalEncoder, ColumnCleaner, DemographicsParser,
    EducationParser, ExperienceParser, JobCategoryParser, Loader, LocationParser,
    MultiLabelEncoder, RowCleaner, TargetExtractor,
};
use crate::pipeline::context::Context;

/// One preprocessing concern.
///
/// Implementations take the context by value and hand it back transformed, or
/// fail with the first [`DataError`](crate::error::DataError) they detect.
/// Handlers keep no state between calls.
pub trait Transform {
    fn transform(&self, ctx: Context) -> Result<Context>;
}

/// A stage of the chain.
#[derive(Debug, Clone)]
pub enum Handler {
    Load(Loader),
    CleanColumns(ColumnCleaner),
    CleanRows(RowCleaner),
    ExtractTarget(TargetExtractor),
    Location(LocationParser),
    Demographics(DemographicsParser),
    Experience(ExperienceParser),
    Education(EducationParser),
    JobCategory(JobCategoryParser),
    CarOwnership(CarOwnershipParser),
    MultiLabel(MultiLabelEncoder),
    EncodeCategorical(CategoricalEncoder),
    Assemble(Assembler),
}

impl Handler {
    /// Stable snake_case name used in logs and progress updates.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load(_) => "loader",
            Self::CleanColumns(_) => "column_cleaner",
            Self::CleanRows(_) => "row_cleaner",
            Self::ExtractTarget(_) => "target_extractor",
            Self::Location(_) => "location",
            Self::Demographics(_) => "demographics",
            Self::Experience(_) => "experience",
            Self::Education(_) => "education",
            Self::JobCategory(_) => "job_category",
            Self::CarOwnership(_) => "car_ownership",
            Self::MultiLabel(_) => "multi_label_encoder",
            Self::EncodeCategorical(_) => "categorical_encoder",
            Self::Assemble(_) => "assembler",
        }
    }
}

impl Transform for Handler {
    fn transform(&self, ctx: Context) -> Result<Context> {
        match self {
            Self::Load(h) => h.transform(ctx),
            Self::CleanColumns(h) => h.transform(ctx),
            Self::CleanRows(h) => h.transform(ctx),
            Self::ExtractTarget(h) => h.transform(ctx),
            Self::Location(h) => h.transform(ctx),
            Self::Demographics(h) => h.transform(ctx),
            Self::Experience(h) => h.transform(ctx),
            Self::Education(h) => h.transform(ctx),
            Self::JobCategory(h) => h.transform(ctx),
            Self::CarOwnership(h) => h.transform(ctx),
            Self::MultiLabel(h) => h.transform(ctx),
            Self::EncodeCategorical(h) => h.transform(ctx),
            Self::Assemble(h) => h.transform(ctx),
        }
    }
}
