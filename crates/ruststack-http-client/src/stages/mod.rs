//! The standard stages.

pub mod build;
pub mod finalize;
pub mod serialize;
pub mod sign;

pub use build::{ContentLengthStage, ContentTypeStage, HostStage, PortStage, ProtocolStage};
pub use finalize::{ClientErrorStage, ErrorDetails, JsonTypedErrorStage, RetryStage};
pub use serialize::{AdditionalHeadersStage, JsonBodyStage, QueryItemsStage, UrlPathStage};
pub use sign::SigV4SigningStage;
