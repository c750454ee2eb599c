pub mod vatcomply;

pub use vatcomply::VatComplyProvider;
