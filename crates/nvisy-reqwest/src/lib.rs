#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod error;
mod service;

pub use crate::connect::{DEFAULT_TIMEOUT, ReqwestClient, ReqwestConfig, TRACING_TARGET};
pub use crate::error::{Error, Result};
