pub mod plan;
pub mod publish;
pub mod status;
pub mod target;
pub mod watch;
