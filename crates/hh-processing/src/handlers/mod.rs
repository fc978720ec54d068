//! Concrete preprocessing stages.
//!
//! One module per concern. Every stage implements
//! [`Transform`](crate::pipeline::handler::Transform) and is wrapped in a
//! [`Handler`](crate::pipeline::handler::Handler) variant by the chain builder.

pub mod assembler;
pub mod car;
pub mod columns;
pub mod demographics;
pub mod education;
pub mod encoder;
pub mod experience;
pub mod job_category;
pub mod loader;
pub mod location;
pub mod multi_label;
pub mod rows;
pub mod salary;

pub use assembler::Assembler;
pub use car::CarOwnershipParser;
pub use columns::ColumnCleaner;
pub use demographics::DemographicsParser;
pub use education::EducationParser;
pub use encoder::CategoricalEncoder;
pub use experience::{EXPERIENCE_COLUMN, ExperienceParser};
pub use job_category::{JobCategoryParser, categorize_job_title};
pub use loader::Loader;
pub use location::LocationParser;
pub use multi_label::MultiLabelEncoder;
pub use rows::RowCleaner;
pub use salary::{
    CURRENCY_COLUMN, ParsedSalary, SalaryParser, SalaryRejection, TARGET_COLUMN, TargetExtractor,
};
