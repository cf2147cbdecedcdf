pub mod country;
pub mod diagnostics;
pub mod extractor;
pub mod locator;
pub mod publisher;
pub mod store;

pub use country::extract_country_code;
pub use diagnostics::Diagnostics;
pub use extractor::{DocumentStatus, Extraction, ExtractionStats, LeaderboardExtractor};
pub use locator::{FieldLocator, LocatorTable};
pub use publisher::{DestinationOutcome, PublishReport, SnapshotPublisher};
pub use store::{FirebaseStore, MemoryStore, SnapshotStore};
