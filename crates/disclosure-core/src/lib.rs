pub mod department;
pub mod error;
pub mod fetch;
pub mod fiscal;
pub mod html;
pub mod normalize;
pub mod record;
pub mod run;
pub mod settings;
pub mod transforms;
pub mod vendor;

pub use department::{Department, DepartmentBuilder, RawRecord};
pub use error::{CoreError, FetchError};
pub use fetch::Fetch;
pub use normalize::{NormalizeWarning, Normalized, RecordNormalizer};
pub use record::{ContractRecord, SCHEMA_KEYS, Sidecar};
pub use run::{FetchSummary, FiscalContext, ParseSummary, RunContext};
pub use settings::{DumpStage, Limit, Settings};
pub use vendor::{IdentityVendors, VendorLookup, VendorTable};
