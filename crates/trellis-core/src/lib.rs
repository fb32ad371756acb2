pub mod access;
pub mod catalog;
pub mod criteria;
pub mod describe;
pub mod graph;
pub mod node;
