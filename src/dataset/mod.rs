pub mod loader;
pub mod sample;
pub mod types;

pub use loader::{load_dataset, Dataset};
pub use sample::{sample_dataset, SAMPLE_SNAPSHOT};
pub use types::{CountryRecord, RawCountryRecord};
