//! Candidate selection and pruning utilities.
//!
//! Includes Top-K collection and spatial non-maximum suppression, used by
//! the coarse-to-fine pyramid search.

pub(crate) mod nms;
pub(crate) mod topk;
