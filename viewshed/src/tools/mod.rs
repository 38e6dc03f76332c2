pub mod compute;
pub mod describe;
