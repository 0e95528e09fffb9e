pub mod claim;
pub mod factory;
pub mod token_codec;

pub use claim::{Claim, Role};
pub use factory::build_token_codec;
pub use token_codec::{CodecError, TokenCodec};
