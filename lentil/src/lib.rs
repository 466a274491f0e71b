pub mod catalog;
pub mod catalog_filter;
pub mod cluster_labels;
pub mod cluster_pairs;
pub mod cluster_stat;
pub mod common;
pub mod expression;
pub mod permutation;
pub mod result_matrix;
pub mod results;
pub mod run_lentil;
pub mod run_sim;
pub mod scoring;
pub mod simulate;
