// crates/mf_physics/src/numerics/mod.rs

//! 数值计算基础设施

pub mod linear_algebra;
