//! The fixed order of preprocessing stages.

use crate::config::PipelineConfig;
use crate::handlers::{
    Assembler, CarOwnershipParser, CategoricalEncoder, ColumnCleaner, DemographicsParser,
    EducationParser, ExperienceParser, JobCategoryParser, Loader, LocationParser,
    MultiLabelEncoder, RowCleaner, TargetExtractor,
};
use crate::pipeline::handler::Handler;

/// Declares the chain.
///
/// This is the only place the processing order is written down. Building is
/// pure: no I/O, and two chains built from equal configs behave identically.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    config: PipelineConfig,
}

impl ChainBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Ordered handlers, from loading the file to assembling the arrays.
    pub fn build(&self) -> Vec<Handler> {
        let c = &self.config;
        vec![
            // The config only accepts ASCII separators.
            Handler::Load(Loader::with_separator(c.separator as u8)),
            Handler::CleanColumns(ColumnCleaner),
            Handler::CleanRows(RowCleaner::new(
                &c.salary_column,
                c.fx_rates.clone(),
                &c.missing_category,
                c.numeric_fill,
            )),
            Handler::ExtractTarget(TargetExtractor::new(
                &c.salary_column,
                c.fx_rates.clone(),
            )),
            Handler::Location(LocationParser::new(&c.missing_category)),
            Handler::Demographics(DemographicsParser::new(&c.missing_category, c.numeric_fill)),
            Handler::Experience(ExperienceParser::new(c.numeric_fill)),
            Handler::Education(EducationParser::new(&c.missing_category, c.numeric_fill)),
            Handler::JobCategory(JobCategoryParser::new(&c.missing_category)),
            Handler::CarOwnership(CarOwnershipParser),
            Handler::MultiLabel(MultiLabelEncoder::new(
                c.multi_label_columns.clone(),
                &c.missing_category,
            )),
            Handler::EncodeCategorical(CategoricalEncoder::new(
                c.categorical_columns.iter().cloned(),
                &c.missing_category,
            )),
            Handler::Assemble(Assembler),
        ]
    }
}
