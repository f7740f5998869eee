#![doc = include_str!("../README.md")]

pub use jm_mapper as mapper;
pub use jm_reflect as reflect;
pub use jm_utils as utils;
