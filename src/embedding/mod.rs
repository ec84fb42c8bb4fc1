// Text embedding backends and the vector math the correlator relies on.

pub mod download;
pub mod http;
pub mod onnx;
pub mod rate_limiter;
pub mod similarity;
pub mod traits;
