//! Record storage port trait.

use crate::domain::error::GradError;
use crate::domain::funding::{FundingRecord, FundingSource};
use crate::domain::student::GraduateStudent;

/// Read access to the stored student and funding records.
///
/// Implementations return records as stored; cross-record validation
/// happens in [`crate::domain::records::RecordSet::load`].
pub trait RecordsPort {
    fn load_students(&self) -> Result<Vec<GraduateStudent>, GradError>;

    fn load_sources(&self) -> Result<Vec<FundingSource>, GradError>;

    fn load_funding(&self) -> Result<Vec<FundingRecord>, GradError>;
}
