/*!
 * Core publish operations
 */

pub mod checksum;
pub mod provider;
pub mod publish;

pub use checksum::{calculate_checksum, HashingReader, StreamingHasher};
pub use provider::provider_for_builder;
pub use publish::Publisher;
