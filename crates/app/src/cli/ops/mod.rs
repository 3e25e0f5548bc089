pub mod init;
pub mod inspect;
pub mod pull;
pub mod push;

pub use init::Init;
pub use inspect::Inspect;
pub use pull::Pull;
pub use push::Push;
