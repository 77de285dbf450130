pub mod extraction;
pub mod analysis;
pub mod storage;
pub mod batch;
