mod account;
mod asset;
mod position;

pub use account::{accounts_from_values, id_from_value, Account, AccountCategory, AccountError};
pub use asset::{AssetType, ParseAssetTypeError};
pub use position::Position;

pub(crate) use position::percent_of;
