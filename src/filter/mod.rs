//! Filter model and filter values.

mod criteria;
mod model;

pub use criteria::{parse_list, parse_number, Bounds, Criteria, Criterion, Filter, PageRequest};
pub use model::{FieldMapping, FilterField, FilterModel, Operator};
