pub mod matrix;
pub mod vector;

pub use matrix::DenseMatrix;
pub use vector::ZeroSpVec;
