#![allow(dead_code)]

pub use log::{debug, info, warn};

pub use fnv::FnvHashMap as HashMap;
pub use fnv::FnvHashSet as HashSet;

pub type Mat = nalgebra::DMatrix<f32>;
pub type CountMat = nalgebra::DMatrix<usize>;
