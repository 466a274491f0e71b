pub mod common_io;
pub mod dmatrix_io;
pub mod membership;
pub mod mtx_io;
pub mod traits;
pub mod utils;
