pub mod request;
pub mod storage;
