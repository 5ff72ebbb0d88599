//! Fitted encoders and the registry that holds them

mod catalog;
mod label;
mod onehot;
mod registry;
mod scaler;
mod store;
mod target;

pub use catalog::ValueCatalog;
pub use label::{LabelEncoder, LabelEncoders};
pub use onehot::{OneHotEncoder, UnknownCategoryPolicy};
pub use registry::{EncoderRegistry, GroupEncoder};
pub use scaler::{MinMaxScaler, RobustScaler};
pub use store::{compute_checksum, keys, ArtifactFiles, ArtifactStore, Manifest, MANIFEST_FILE};
pub use target::TargetEncoder;
